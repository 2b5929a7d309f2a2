//! Index document types shared by the local and remote builders.
//!
//! A [`Node`] is the nested representation of one directory: a `Leaf` when the
//! directory has no subdirectories (just its image filenames), a `Branch`
//! otherwise. Images sitting directly in a branch directory live under the
//! reserved [`CURRENT_DIR_KEY`]. The wire format is positional, not tagged —
//! a leaf serializes as a JSON array, a branch as a JSON object — so the
//! consuming rotator can walk the tree with plain `Array`/`Object` checks.
//!
//! An [`IndexDocument`] wraps either shape with the schema version and a
//! generation timestamp:
//!
//! ```text
//! {"version": 2, "lastUpdate": "2026-08-05T12:30:00Z", "structure": {...}}
//! {"version": 2, "lastUpdate": "2026-08-05T12:30:00Z", "images": [...]}
//! ```

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Schema version written into every generated document.
pub const SCHEMA_VERSION: u32 = 2;

/// Reserved branch key for images living directly in a directory that also
/// has subdirectories.
pub const CURRENT_DIR_KEY: &str = ".";

/// One node of the nested index tree.
///
/// `BTreeMap` keeps branch keys in lexicographic order, which is also the
/// serialized key order. `"."` sorts before any plain directory name, so
/// direct images always precede subdirectories when walking a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Node {
    /// Image filenames, ordered by name.
    Leaf(Vec<String>),
    /// Child name (subdirectory, or `"."`) to child node.
    Branch(BTreeMap<String, Node>),
}

impl Node {
    /// An empty leaf and an empty branch are both "empty" — a parent omits
    /// either one entirely rather than storing an empty entry.
    pub fn is_empty(&self) -> bool {
        match self {
            Node::Leaf(images) => images.is_empty(),
            Node::Branch(children) => children.is_empty(),
        }
    }

    /// Total image count across all leaves.
    pub fn count(&self) -> usize {
        match self {
            Node::Leaf(images) => images.len(),
            Node::Branch(children) => children.values().map(Node::count).sum(),
        }
    }

    /// Re-express the tree as slash-joined relative paths, depth-first.
    ///
    /// The `"."` key contributes bare filenames at its own level rather than
    /// a `./` path segment.
    pub fn flatten(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.flatten_into("", &mut paths);
        paths
    }

    fn flatten_into(&self, prefix: &str, out: &mut Vec<String>) {
        match self {
            Node::Leaf(images) => {
                out.extend(images.iter().map(|name| format!("{prefix}{name}")));
            }
            Node::Branch(children) => {
                for (name, child) in children {
                    if name == CURRENT_DIR_KEY {
                        child.flatten_into(prefix, out);
                    } else {
                        child.flatten_into(&format!("{prefix}{name}/"), out);
                    }
                }
            }
        }
    }
}

/// The shape-specific body of a generated document. The variant name is the
/// JSON member name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IndexBody {
    #[serde(rename = "structure")]
    Structure(Node),
    #[serde(rename = "images")]
    Images(Vec<String>),
}

/// A complete index document, ready to serialize.
#[derive(Debug, Clone, Serialize)]
pub struct IndexDocument {
    pub version: u32,
    /// Generation time, ISO-8601 UTC with a `Z` suffix.
    #[serde(rename = "lastUpdate")]
    pub last_update: String,
    #[serde(flatten)]
    pub body: IndexBody,
}

impl IndexDocument {
    /// Wrap a nested tree, stamped with the current time.
    pub fn nested(structure: Node) -> Self {
        Self {
            version: SCHEMA_VERSION,
            last_update: utc_timestamp(),
            body: IndexBody::Structure(structure),
        }
    }

    /// Wrap a flat path list, stamped with the current time.
    pub fn flat(images: Vec<String>) -> Self {
        Self {
            version: SCHEMA_VERSION,
            last_update: utc_timestamp(),
            body: IndexBody::Images(images),
        }
    }

    /// Number of indexed images, regardless of shape.
    pub fn count(&self) -> usize {
        match &self.body {
            IndexBody::Structure(node) => node.count(),
            IndexBody::Images(paths) => paths.len(),
        }
    }
}

fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
