//! # bg-index
//!
//! JSON index generator for background image collections. Your filesystem —
//! or a GitHub repository subtree — is the data source: the tool walks the
//! tree, collects filenames carrying a recognized image extension, and writes
//! a `bg_index.json` document the site's background rotator consumes. Only
//! filenames are ever read, never image content.
//!
//! # Two Shapes, One Walk
//!
//! Both output shapes come from the same depth-first traversal; they differ
//! only in how results merge:
//!
//! ```text
//! nested   {"version":2, "lastUpdate":"...Z", "structure": {".": ["a.png"], "sub": ["b.jpg"]}}
//! flat     {"version":2, "lastUpdate":"...Z", "images": ["a.png", "sub/b.jpg"]}
//! ```
//!
//! The nested shape mirrors the folder hierarchy: a directory with no
//! subdirectories is a plain filename array, anything else is an object with
//! direct images under the reserved `"."` key. Directories whose whole
//! subtree holds no images are omitted outright, so consumers never see
//! empty nodes. The flat shape is the same set of images as slash-joined
//! relative paths.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `bg-index.toml` loading, merging, validation, the stock config |
//! | [`scan`] | Local mode — walks the source directory with `fs::read_dir` |
//! | [`remote`] | Remote mode — GitHub contents API client behind the [`remote::ListSource`] seam |
//! | [`types`] | `Node` tree, `IndexDocument`, schema constants |
//! | [`output`] | Atomic index writing and console summary formatting |
//!
//! # Design Decisions
//!
//! ## Sequential By Construction
//!
//! The whole run is single-threaded and synchronous. Remote listings are
//! fetched one at a time through a blocking client with an enforced
//! inter-request delay — the GitHub rate limit is the bottleneck, not the
//! walk, so there is nothing to parallelize and no async runtime to carry.
//!
//! ## Degrade, Don't Abort
//!
//! A remote listing that fails all of its bounded retries degrades that
//! subtree to empty with a stderr warning. A half-reachable repository still
//! produces a valid, smaller index; local filesystem errors, in contrast,
//! fail the run outright.
//!
//! ## Fresh Document Every Run
//!
//! No incremental updates: each run rebuilds the full document and atomically
//! replaces the previous index (temp file + rename). The index is derived
//! state; the tree is the source of truth.

pub mod config;
pub mod output;
pub mod remote;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
