//! Local filesystem scanning.
//!
//! Walks the source directory depth-first and builds either index shape. At
//! every directory the entries are partitioned into image files (recognized
//! extension, not excluded) and subdirectories; the two shapes differ only in
//! how the recursion merges results:
//!
//! - **Nested**: a directory without subdirectories becomes a plain list of
//!   its images; one with subdirectories becomes a mapping, direct images
//!   under `"."`, and every subdirectory whose subtree holds at least one
//!   image under its own name. Image-free subtrees are omitted entirely.
//! - **Flat**: every image appends `prefix + filename`; recursion extends the
//!   prefix with `dirname + "/"`.
//!
//! ```text
//! bg/
//! ├── a.png            ┐  nested: {".": ["a.png"], "sub": ["b.jpg"]}
//! ├── notes.txt        │  flat:   ["a.png", "sub/b.jpg"]
//! └── sub/             │
//!     └── b.jpg        ┘
//! ```
//!
//! Entry order is lexicographic at every level. Dot-prefixed entries are
//! skipped, as are the index file, the config file, and any configured
//! extra exclusions. Filesystem errors are fatal and propagate to the caller.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::IndexConfig;
use crate::types::{CURRENT_DIR_KEY, Node};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Build the nested index for a local directory tree.
pub fn build_structure(root: &Path, config: &IndexConfig) -> Result<Node, ScanError> {
    ensure_dir(root)?;
    build_dir(root, config)
}

/// Build the flat index for a local directory tree.
pub fn build_flat(root: &Path, config: &IndexConfig) -> Result<Vec<String>, ScanError> {
    ensure_dir(root)?;
    let mut images = Vec::new();
    flatten_dir(root, "", config, &mut images)?;
    Ok(images)
}

fn ensure_dir(root: &Path) -> Result<(), ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    Ok(())
}

fn build_dir(path: &Path, config: &IndexConfig) -> Result<Node, ScanError> {
    let (images, dirs) = partition_entries(path, config)?;

    if dirs.is_empty() {
        return Ok(Node::Leaf(images));
    }

    let mut children = BTreeMap::new();
    if !images.is_empty() {
        children.insert(CURRENT_DIR_KEY.to_string(), Node::Leaf(images));
    }
    for (name, dir_path) in dirs {
        let child = build_dir(&dir_path, config)?;
        if !child.is_empty() {
            children.insert(name, child);
        }
    }
    Ok(Node::Branch(children))
}

fn flatten_dir(
    path: &Path,
    prefix: &str,
    config: &IndexConfig,
    out: &mut Vec<String>,
) -> Result<(), ScanError> {
    let (images, dirs) = partition_entries(path, config)?;

    for name in images {
        out.push(format!("{prefix}{name}"));
    }
    for (name, dir_path) in dirs {
        flatten_dir(&dir_path, &format!("{prefix}{name}/"), config, out)?;
    }
    Ok(())
}

/// List one directory and split it into image filenames and subdirectories,
/// both sorted by name. Hidden entries and excluded filenames are dropped
/// here so neither builder sees them.
fn partition_entries(
    path: &Path,
    config: &IndexConfig,
) -> Result<(Vec<String>, Vec<(String, PathBuf)>), ScanError> {
    let mut entries: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    entries.sort();

    let mut images = Vec::new();
    let mut dirs = Vec::new();
    for entry in entries {
        let Some(name) = entry.file_name() else {
            continue;
        };
        let name = name.to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        if entry.is_dir() {
            dirs.push((name, entry));
        } else if entry.is_file() && config.matches_extension(&name) && !config.is_ignored(&name) {
            images.push(name);
        }
    }
    Ok((images, dirs))
}
