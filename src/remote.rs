//! Remote repository indexing via the GitHub contents API.
//!
//! One listing request per directory: GET
//! `https://api.github.com/repos/{owner}/{repo}/contents/{path}?ref={branch}`
//! returns the immediate children as entries with `name`, `type` and, for
//! directories, a `url` to recurse into. The builders mirror the local
//! scanner's recursion; only the listing source differs.
//!
//! The [`ListSource`] trait is the seam between the builders and the network.
//! [`GitHubSource`] is the production implementation — a blocking client that
//! paces requests with a fixed delay and retries each listing a bounded
//! number of times. A directory that fails every attempt degrades to an empty
//! subtree with a stderr warning; the run is never aborted by the network.

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::config::{IndexConfig, RemoteConfig};
use crate::types::{CURRENT_DIR_KEY, Node};

const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Fixed pause between attempts of one failing listing request.
const RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP client setup error: {0}")]
    Client(#[from] reqwest::Error),
}

/// One entry of a directory listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Listing URL of a subdirectory. Directories without one cannot be
    /// recursed into and are skipped.
    #[serde(default)]
    pub url: Option<String>,
}

/// Entry type reported by the API. Symlinks and submodules land in `Other`
/// and are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    #[serde(other)]
    Other,
}

/// A source of directory listings.
///
/// Returns `None` when the listing could not be fetched; callers treat that
/// directory as empty. The production implementation is [`GitHubSource`];
/// tests substitute a canned source.
pub trait ListSource {
    fn list(&self, url: &str) -> Option<Vec<Entry>>;
}

/// Blocking GitHub contents API client.
pub struct GitHubSource {
    client: Client,
    auth_token: Option<String>,
    request_delay: Duration,
    retry_count: u32,
    /// Flips on the first request so the delay applies to every later one.
    paced: Cell<bool>,
}

impl GitHubSource {
    pub fn new(remote: &RemoteConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("bg-index/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            auth_token: remote.auth_token.clone(),
            request_delay: Duration::from_secs_f64(remote.request_delay_secs),
            retry_count: remote.retry_count,
            paced: Cell::new(false),
        })
    }

    fn pace(&self) {
        if self.paced.replace(true) && !self.request_delay.is_zero() {
            thread::sleep(self.request_delay);
        }
    }

    fn request(&self, url: &str) -> Result<Vec<Entry>, reqwest::Error> {
        let mut request = self.client.get(url).header(ACCEPT, ACCEPT_HEADER);
        if let Some(token) = &self.auth_token {
            request = request.header(AUTHORIZATION, format!("token {token}"));
        }
        request.send()?.error_for_status()?.json()
    }
}

impl ListSource for GitHubSource {
    fn list(&self, url: &str) -> Option<Vec<Entry>> {
        self.pace();
        let entries = with_retries(url, self.retry_count, RETRY_DELAY, || self.request(url));
        if entries.is_none() {
            eprintln!(
                "bg-index: warning: treating {url} as empty after {} failed attempts",
                self.retry_count
            );
        }
        entries
    }
}

/// Run `op` up to `attempts` times, sleeping `delay` between failures.
/// Every failure is reported on stderr; `None` means all attempts failed.
fn with_retries<T, E: fmt::Display>(
    label: &str,
    attempts: u32,
    delay: Duration,
    mut op: impl FnMut() -> Result<T, E>,
) -> Option<T> {
    for attempt in 1..=attempts {
        match op() {
            Ok(value) => return Some(value),
            Err(err) => {
                eprintln!("bg-index: warning: {label}: {err} (attempt {attempt} of {attempts})");
                if attempt < attempts {
                    thread::sleep(delay);
                }
            }
        }
    }
    None
}

/// Build the nested index for a remote subtree rooted at `url`.
///
/// Same merge rule as the local scanner: no subdirectories → leaf (sorted);
/// otherwise a branch with direct images under `"."` and every subdirectory
/// whose subtree holds at least one image.
pub fn build_structure(source: &dyn ListSource, config: &IndexConfig, url: &str) -> Node {
    let entries = source.list(url).unwrap_or_default();
    let (mut images, dirs) = partition_entries(&entries, config);
    images.sort();

    if dirs.is_empty() {
        return Node::Leaf(images);
    }

    let mut children = BTreeMap::new();
    if !images.is_empty() {
        children.insert(CURRENT_DIR_KEY.to_string(), Node::Leaf(images));
    }
    for entry in dirs {
        let Some(listing_url) = &entry.url else {
            continue;
        };
        let child = build_structure(source, config, listing_url);
        if !child.is_empty() {
            children.insert(entry.name.clone(), child);
        }
    }
    Node::Branch(children)
}

/// Build the flat index for a remote subtree rooted at `url`, preserving the
/// API listing order: images at each level first, then each subdirectory.
pub fn build_flat(source: &dyn ListSource, config: &IndexConfig, url: &str) -> Vec<String> {
    let mut images = Vec::new();
    flatten_dir(source, config, url, "", &mut images);
    images
}

fn flatten_dir(
    source: &dyn ListSource,
    config: &IndexConfig,
    url: &str,
    prefix: &str,
    out: &mut Vec<String>,
) {
    let entries = source.list(url).unwrap_or_default();
    let (images, dirs) = partition_entries(&entries, config);

    for name in images {
        out.push(format!("{prefix}{name}"));
    }
    for entry in dirs {
        if let Some(listing_url) = &entry.url {
            flatten_dir(
                source,
                config,
                listing_url,
                &format!("{prefix}{}/", entry.name),
                out,
            );
        }
    }
}

/// Split a listing into image filenames and directory entries. The local
/// exclusion set does not apply here — remote trees never contain the index
/// or config file of the machine running the scan.
fn partition_entries<'a>(
    entries: &'a [Entry],
    config: &IndexConfig,
) -> (Vec<String>, Vec<&'a Entry>) {
    let mut images = Vec::new();
    let mut dirs = Vec::new();
    for entry in entries {
        match entry.kind {
            EntryKind::File if config.matches_extension(&entry.name) => {
                images.push(entry.name.clone());
            }
            EntryKind::Dir => dirs.push(entry),
            _ => {}
        }
    }
    (images, dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use std::cell::RefCell;
    use std::collections::{BTreeSet, HashMap};

    /// Canned listing source: URL → entries, recording every request.
    /// URLs without an entry behave like a listing that failed all attempts.
    struct FakeSource {
        listings: HashMap<String, Vec<Entry>>,
        requests: RefCell<Vec<String>>,
    }

    impl FakeSource {
        fn new(listings: &[(&str, Vec<Entry>)]) -> Self {
            Self {
                listings: listings
                    .iter()
                    .map(|(url, entries)| (url.to_string(), entries.clone()))
                    .collect(),
                requests: RefCell::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<String> {
            self.requests.borrow().clone()
        }
    }

    impl ListSource for FakeSource {
        fn list(&self, url: &str) -> Option<Vec<Entry>> {
            self.requests.borrow_mut().push(url.to_string());
            self.listings.get(url).cloned()
        }
    }

    fn file(name: &str) -> Entry {
        Entry {
            name: name.to_string(),
            kind: EntryKind::File,
            url: None,
        }
    }

    fn dir(name: &str, url: &str) -> Entry {
        Entry {
            name: name.to_string(),
            kind: EntryKind::Dir,
            url: Some(url.to_string()),
        }
    }

    #[test]
    fn images_only_listing_is_a_sorted_leaf() {
        let source = FakeSource::new(&[(
            "root",
            vec![file("b.jpg"), file("a.png"), file("notes.txt")],
        )]);

        let node = build_structure(&source, &default_config(), "root");
        assert_eq!(leaf_names(&node), vec!["a.png", "b.jpg"]);
    }

    #[test]
    fn direct_images_go_under_the_dot_key() {
        let source = FakeSource::new(&[
            ("root", vec![file("a.png"), dir("sub", "sub-url")]),
            ("sub-url", vec![file("b.jpg")]),
        ]);

        let node = build_structure(&source, &default_config(), "root");
        assert_eq!(
            node,
            branch(&[(".", leaf(&["a.png"])), ("sub", leaf(&["b.jpg"]))])
        );
    }

    #[test]
    fn failed_subdirectory_is_absent_from_both_shapes() {
        let listings = [
            (
                "root",
                vec![file("a.png"), dir("gone", "gone-url"), dir("ok", "ok-url")],
            ),
            // "gone-url" has no listing: every fetch attempt failed.
            ("ok-url", vec![file("b.jpg")]),
        ];

        let source = FakeSource::new(&listings);
        let node = build_structure(&source, &default_config(), "root");
        assert_eq!(branch_keys(&node), vec![".", "ok"]);

        let source = FakeSource::new(&listings);
        let flat = build_flat(&source, &default_config(), "root");
        assert_eq!(flat, vec!["a.png", "ok/b.jpg"]);
    }

    #[test]
    fn failed_root_listing_yields_an_empty_index() {
        let source = FakeSource::new(&[]);
        let node = build_structure(&source, &default_config(), "root");
        assert_eq!(node, leaf(&[]));
        assert_eq!(build_flat(&source, &default_config(), "root"), Vec::<String>::new());
    }

    #[test]
    fn image_free_subtree_is_omitted_entirely() {
        let source = FakeSource::new(&[
            ("root", vec![dir("empty", "empty-url"), dir("full", "full-url")]),
            ("empty-url", vec![file("readme.md")]),
            ("full-url", vec![file("c.webp")]),
        ]);

        let node = build_structure(&source, &default_config(), "root");
        assert_eq!(branch_keys(&node), vec!["full"]);
    }

    #[test]
    fn only_empty_subdirectories_yield_an_empty_mapping() {
        let source = FakeSource::new(&[
            ("root", vec![dir("a", "a-url"), dir("b", "b-url")]),
            ("a-url", vec![]),
            ("b-url", vec![file("notes.txt")]),
        ]);

        let node = build_structure(&source, &default_config(), "root");
        assert_eq!(node, branch(&[]));
        assert_eq!(node.count(), 0);
    }

    #[test]
    fn non_file_entry_kinds_are_skipped() {
        let source = FakeSource::new(&[(
            "root",
            vec![
                file("a.png"),
                Entry {
                    name: "link.png".to_string(),
                    kind: EntryKind::Other,
                    url: None,
                },
            ],
        )]);

        let node = build_structure(&source, &default_config(), "root");
        assert_eq!(node, leaf(&["a.png"]));
    }

    #[test]
    fn directory_without_listing_url_is_skipped() {
        let source = FakeSource::new(&[(
            "root",
            vec![
                file("a.png"),
                Entry {
                    name: "odd".to_string(),
                    kind: EntryKind::Dir,
                    url: None,
                },
            ],
        )]);

        let node = build_structure(&source, &default_config(), "root");
        assert_eq!(node, branch(&[(".", leaf(&["a.png"]))]));
        // No request was issued for the unlistable directory.
        assert_eq!(source.requested(), vec!["root"]);
    }

    #[test]
    fn flat_build_preserves_listing_order() {
        let source = FakeSource::new(&[
            (
                "root",
                vec![file("z.png"), file("a.jpg"), dir("sub", "sub-url")],
            ),
            ("sub-url", vec![file("m.webp"), file("b.png")]),
        ]);

        let flat = build_flat(&source, &default_config(), "root");
        assert_eq!(flat, vec!["z.png", "a.jpg", "sub/m.webp", "sub/b.png"]);
    }

    #[test]
    fn flat_build_matches_flattened_structure() {
        let listings = [
            (
                "root",
                vec![file("top.png"), dir("nature", "nature-url"), dir("city", "city-url")],
            ),
            (
                "nature-url",
                vec![file("forest.jpg"), dir("sea", "sea-url")],
            ),
            ("sea-url", vec![file("wave.webp")]),
            ("city-url", vec![file("night.jpeg"), file("notes.txt")]),
        ];

        let source = FakeSource::new(&listings);
        let flat: BTreeSet<String> = build_flat(&source, &default_config(), "root")
            .into_iter()
            .collect();
        let source = FakeSource::new(&listings);
        let from_nested: BTreeSet<String> = build_structure(&source, &default_config(), "root")
            .flatten()
            .into_iter()
            .collect();
        assert_eq!(flat, from_nested);
    }

    #[test]
    fn each_directory_is_listed_once() {
        let source = FakeSource::new(&[
            ("root", vec![dir("a", "a-url"), dir("b", "b-url")]),
            ("a-url", vec![file("1.png")]),
            ("b-url", vec![file("2.png")]),
        ]);

        build_structure(&source, &default_config(), "root");
        assert_eq!(source.requested(), vec!["root", "a-url", "b-url"]);
    }

    // =========================================================================
    // Entry deserialization
    // =========================================================================

    #[test]
    fn entry_deserializes_from_api_json() {
        let json = r#"{"name": "sea", "type": "dir", "url": "https://api.github.com/x"}"#;
        let entry: Entry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.name, "sea");
        assert_eq!(entry.kind, EntryKind::Dir);
        assert_eq!(entry.url.as_deref(), Some("https://api.github.com/x"));
    }

    #[test]
    fn unknown_entry_type_becomes_other() {
        let json = r#"{"name": "link", "type": "symlink"}"#;
        let entry: Entry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.kind, EntryKind::Other);
        assert!(entry.url.is_none());
    }

    // =========================================================================
    // Retry helper
    // =========================================================================

    #[test]
    fn with_retries_returns_first_success() {
        let mut calls = 0;
        let result = with_retries("op", 3, Duration::ZERO, || {
            calls += 1;
            Ok::<_, &str>(42)
        });
        assert_eq!(result, Some(42));
        assert_eq!(calls, 1);
    }

    #[test]
    fn with_retries_recovers_after_failures() {
        let mut calls = 0;
        let result = with_retries("op", 3, Duration::ZERO, || {
            calls += 1;
            if calls < 3 { Err("boom") } else { Ok(calls) }
        });
        assert_eq!(result, Some(3));
    }

    #[test]
    fn with_retries_gives_up_after_the_configured_attempts() {
        let mut calls = 0;
        let result: Option<()> = with_retries("op", 3, Duration::ZERO, || {
            calls += 1;
            Err("boom")
        });
        assert_eq!(result, None);
        assert_eq!(calls, 3);
    }
}
