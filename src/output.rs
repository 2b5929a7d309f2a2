//! Index serialization and console output.
//!
//! The document is pretty-printed with stable key order (struct field order
//! plus `BTreeMap` branch keys) and UTF-8 filenames left unescaped, then
//! written atomically: a temp file in the target directory, renamed over the
//! index so a crashed run never leaves a half-written file behind.
//!
//! Console output follows the format/print split: `format_*` functions are
//! pure and return strings, `print_*` wrappers write to stdout. A run prints
//! exactly one summary line:
//!
//! ```text
//! Indexed 42 images → bg_index.json
//! ```

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::types::IndexDocument;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize `document` and write it to `path`, replacing any previous index.
pub fn write_index(path: &Path, document: &IndexDocument) -> Result<(), OutputError> {
    let mut json = serde_json::to_string_pretty(document)?;
    json.push('\n');

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Completion summary for an index run.
pub fn format_summary(document: &IndexDocument, output_file: &str) -> String {
    format!("Indexed {} images \u{2192} {}", document.count(), output_file)
}

/// Print the completion summary to stdout.
pub fn print_summary(document: &IndexDocument, output_file: &str) {
    println!("{}", format_summary(document, output_file));
}

/// Image count line for the `check` command, which writes nothing.
pub fn format_check_summary(document: &IndexDocument) -> String {
    format!("Found {} images (index not written)", document.count())
}

/// Print the check summary to stdout.
pub fn print_check_summary(document: &IndexDocument) {
    println!("{}", format_check_summary(document));
}
