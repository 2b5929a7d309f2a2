//! Shared test utilities for the bg-index test suite.
//!
//! Fixture trees are built with [`write_tree`] rather than checked-in files:
//! the scanner only ever reads names, so a few bytes of fake image data per
//! file is all a test needs.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! write_tree(tmp.path(), &["a.png", "sub/b.jpg", "empty/"]);
//!
//! let node = scan::build_structure(tmp.path(), &default_config()).unwrap();
//! assert_eq!(node, branch(&[(".", leaf(&["a.png"])), ("sub", leaf(&["b.jpg"]))]));
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::config::IndexConfig;
use crate::types::Node;

/// Stock config for tests. Alias so call sites read as intent, not mechanism.
pub fn default_config() -> IndexConfig {
    IndexConfig::default()
}

/// Materialize a fixture tree under `root`.
///
/// Entries ending in `/` become (possibly empty) directories; everything else
/// becomes a file containing fake image bytes. Parent directories are created
/// as needed, so `"sub/b.jpg"` alone is enough to get both.
pub fn write_tree(root: &Path, entries: &[&str]) {
    for entry in entries {
        let path = root.join(entry.trim_end_matches('/'));
        if entry.ends_with('/') {
            fs::create_dir_all(&path).unwrap();
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, "fake image").unwrap();
        }
    }
}

/// Leaf node from string literals.
pub fn leaf(names: &[&str]) -> Node {
    Node::Leaf(names.iter().map(|name| name.to_string()).collect())
}

/// Branch node from (name, child) pairs.
pub fn branch(children: &[(&str, Node)]) -> Node {
    Node::Branch(
        children
            .iter()
            .map(|(name, child)| (name.to_string(), child.clone()))
            .collect::<BTreeMap<_, _>>(),
    )
}

// =========================================================================
// Node accessors — panic with a clear message on shape mismatch
// =========================================================================

/// Branch keys in serialized order. Panics if the node is a leaf.
pub fn branch_keys(node: &Node) -> Vec<&str> {
    match node {
        Node::Branch(children) => children.keys().map(String::as_str).collect(),
        Node::Leaf(_) => panic!("expected a branch, got a leaf: {node:?}"),
    }
}

/// Child node under `name`. Panics if the node is a leaf or the key is absent.
pub fn child<'a>(node: &'a Node, name: &str) -> &'a Node {
    match node {
        Node::Branch(children) => children.get(name).unwrap_or_else(|| {
            let keys: Vec<&str> = children.keys().map(String::as_str).collect();
            panic!("child '{name}' not found. Available: {keys:?}")
        }),
        Node::Leaf(_) => panic!("expected a branch, got a leaf: {node:?}"),
    }
}

/// Leaf filenames. Panics if the node is a branch.
pub fn leaf_names(node: &Node) -> Vec<&str> {
    match node {
        Node::Leaf(images) => images.iter().map(String::as_str).collect(),
        Node::Branch(_) => panic!("expected a leaf, got a branch: {node:?}"),
    }
}
