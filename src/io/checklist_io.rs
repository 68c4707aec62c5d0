use std::fs;
use std::path::{Path, PathBuf};

use crate::io::recovery::{RecoveryCategory, RecoveryEntry, atomic_write, log_recovery};
use crate::model::checklist::{Checklist, CleanupMode};
use crate::parse::{FormatError, parse_outline, serialize_outline};

/// Error type for loading and saving list files
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("malformed list {path}: {source}")]
    Format {
        path: PathBuf,
        source: FormatError,
    },
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Load a checklist from `path`. A missing file is an empty list.
pub fn load_checklist(path: &Path) -> Result<Checklist, StoreError> {
    if !path.exists() {
        return Ok(Checklist::new());
    }
    let text = fs::read_to_string(path).map_err(|e| StoreError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let entries = parse_outline(&text).map_err(|e| StoreError::Format {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Checklist::from_entries(entries))
}

/// Load a checklist, moving a malformed file out of the way instead of
/// failing. The file is renamed to `<file>.bak` and its text goes to the
/// recovery log; the returned list is empty and the backup path is reported.
pub fn load_or_set_aside(path: &Path) -> Result<(Checklist, Option<PathBuf>), StoreError> {
    match load_checklist(path) {
        Ok(checklist) => Ok((checklist, None)),
        Err(StoreError::Format { path, source }) => {
            let backup = set_aside_malformed(&path, &source)?;
            Ok((Checklist::new(), Some(backup)))
        }
        Err(e) => Err(e),
    }
}

fn set_aside_malformed(path: &Path, error: &FormatError) -> Result<PathBuf, StoreError> {
    let text = fs::read_to_string(path).unwrap_or_default();
    let mut backup = path.as_os_str().to_owned();
    backup.push(".bak");
    let backup = PathBuf::from(backup);

    fs::rename(path, &backup).map_err(|e| StoreError::Write {
        path: backup.clone(),
        source: e,
    })?;
    log_recovery(
        path.parent().unwrap_or(Path::new(".")),
        RecoveryEntry::new(RecoveryCategory::Parser, "malformed list set aside")
            .field("Source", path.display().to_string())
            .field("Backup", backup.display().to_string())
            .field("Error", error.to_string())
            .body(text),
    );
    Ok(backup)
}

/// Render the file content `save_checklist` would write, after normalizing.
pub fn render_checklist(checklist: &mut Checklist) -> String {
    checklist.cleanup(CleanupMode::Normalize);
    serialize_outline(&checklist.sorted_items())
}

/// Normalize and write a checklist to `path` in canonical order.
///
/// Parent directories are created as needed. The write goes through a temp
/// file and rename. On failure the content is appended to the recovery log
/// in the file's directory and the checklist stays dirty.
pub fn save_checklist(path: &Path, checklist: &mut Checklist) -> Result<(), StoreError> {
    let content = render_checklist(checklist);
    let dir = path.parent().unwrap_or(Path::new("."));

    let result = fs::create_dir_all(dir).and_then(|_| atomic_write(path, content.as_bytes()));
    if let Err(e) = result {
        log_recovery(
            dir,
            RecoveryEntry::new(RecoveryCategory::Write, "list write failed")
                .field("Target", path.display().to_string())
                .field("Error", e.to_string())
                .body(content),
        );
        return Err(StoreError::Write {
            path: path.to_path_buf(),
            source: e,
        });
    }

    checklist.mark_saved();
    Ok(())
}
