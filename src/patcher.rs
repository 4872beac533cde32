//! File-level patching: load, rewrite, save in place.
//!
//! The file path read from always equals the file path written to; there is
//! no backup copy. Writes go through a tempfile in the target's directory,
//! an fsync, and an atomic rename, so a crashed run leaves either the old
//! or the new content, never a torn file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::rules::RuleSet;

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("UTF-8 validation error on {path}: {source}")]
    Encoding {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Result of patching a file in place.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchOutcome should be checked for patched/unchanged"]
pub enum PatchOutcome {
    /// At least one rule matched and the file was rewritten.
    Patched { rules_matched: usize },
    /// No rule changed the buffer; the file was not rewritten.
    Unchanged,
}

/// Read the entire file as UTF-8 text.
pub fn load(path: impl AsRef<Path>) -> Result<String, PatchError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| PatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|source| PatchError::Encoding {
        path: path.to_path_buf(),
        source,
    })
}

/// Overwrite the file at `path` with `text`, truncating prior content.
pub fn save(path: impl AsRef<Path>, text: &str) -> Result<(), PatchError> {
    let path = path.as_ref();
    atomic_write(path, text.as_bytes()).map_err(|source| PatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    // The rename carries the tempfile's timestamps; restamp the target.
    let now = filetime::FileTime::now();
    filetime::set_file_mtime(path, now).map_err(|source| PatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

/// Apply a rule set to the file at `path` and persist the result to the
/// same path.
///
/// Each rule is applied in order, replacing every non-overlapping match;
/// the output of one rule is the input of the next. When no rule changes
/// the buffer the file is left untouched on disk.
pub fn patch_in_place(path: impl AsRef<Path>, set: &RuleSet) -> Result<PatchOutcome, PatchError> {
    let path = path.as_ref();
    let original = load(path)?;

    let mut buffer = original.clone();
    let mut rules_matched = 0;
    for rule in set.rules() {
        if rule.match_count(&buffer) > 0 {
            rules_matched += 1;
        }
        buffer = rule.apply(&buffer);
    }

    if buffer == original {
        return Ok(PatchOutcome::Unchanged);
    }

    save(path, &buffer)?;
    Ok(PatchOutcome::Patched { rules_matched })
}

/// Atomic file write: tempfile + fsync + rename.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    // Tempfile in the same directory so the rename stays on one filesystem.
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path has no parent directory",
        )
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
