use std::fmt::{self, Write as _};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tempfile::NamedTempFile;

/// Default number of days before entries are prunable.
pub const PRUNE_AGE_DAYS: i64 = 30;

const LOG_FILE_NAME: &str = ".recovery.log";

/// Past this size, appending first drops the oldest entries
const MAX_LOG_SIZE: u64 = 1_048_576;

/// Closes every entry
const ENTRY_SEPARATOR: &str = "---";

/// Self-documenting header written at the top of a new recovery log.
const FILE_HEADER: &str = "\
<!-- i4check recovery log: append-only error recovery data
     This file captures list contents that could not be saved normally,
     lists that failed to parse, and lists that were deleted.
     View with: i4c recovery
     Prune old entries: i4c recovery prune
     Safe to delete if empty or stale. -->

---
";

/// Why an entry was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// A malformed list file was set aside
    Parser,
    /// A save failed; the body is what should have been written
    Write,
    /// A list was deleted; the body is its last content
    Delete,
}

impl RecoveryCategory {
    pub fn label(self) -> &'static str {
        match self {
            RecoveryCategory::Parser => "parser",
            RecoveryCategory::Write => "write",
            RecoveryCategory::Delete => "delete",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        [
            RecoveryCategory::Parser,
            RecoveryCategory::Write,
            RecoveryCategory::Delete,
        ]
        .into_iter()
        .find(|c| c.label() == s)
    }
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One block of the recovery log.
///
/// ~~~text
/// ## 2026-02-10T14:32:05Z — write: list write failed
///
/// Target: /home/me/.local/share/i4check/groceries.org
/// Error: Permission denied (os error 13)
///
/// ```text
/// * ALL
/// ** NEEDED
///    - [ ] milk
/// ```
///
/// ---
/// ~~~
#[derive(Debug, Clone)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    /// `Key: value` lines, in insertion order
    pub fields: Vec<(String, String)>,
    /// Saved file content (trailing newline dropped on read)
    pub body: String,
}

/// Path of the recovery log inside a storage directory
pub fn recovery_log_path(storage_dir: &Path) -> PathBuf {
    storage_dir.join(LOG_FILE_NAME)
}

/// Write `content` to `path` via a temp file in the same directory and a rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl RecoveryEntry {
    pub fn new(category: RecoveryCategory, description: impl Into<String>) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            description: description.into(),
            fields: Vec::new(),
            body: String::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    fn timestamp_str(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Render as a markdown block, separator included
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        // fmt::Write on a String cannot fail
        let _ = writeln!(
            out,
            "## {} — {}: {}\n",
            self.timestamp_str(),
            self.category,
            self.description
        );
        for (key, value) in &self.fields {
            let _ = writeln!(out, "{}: {}", key, value);
        }
        if !self.body.is_empty() {
            let body = self.body.strip_suffix('\n').unwrap_or(&self.body);
            let _ = writeln!(out, "\n```text\n{}\n```", body);
        }
        let _ = writeln!(out, "\n{}", ENTRY_SEPARATOR);
        out
    }

    /// JSON shape used by `i4c recovery --json`
    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone().into()))
            .collect();

        serde_json::json!({
            "timestamp": self.timestamp_str(),
            "category": self.category.label(),
            "description": self.description,
            "fields": fields,
            "body": self.body,
        })
    }
}

/// Append an entry to the log in `storage_dir`.
///
/// Never fails: the log is the last resort, so a problem writing it is only
/// reported on stderr.
pub fn log_recovery(storage_dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = append_entry(storage_dir, &entry) {
        eprintln!("warning: could not write to recovery log: {}", e);
    }
}

fn append_entry(storage_dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    append_entry_capped(storage_dir, entry, MAX_LOG_SIZE)
}

/// Append `entry`. A log over `max_size` is first cut down to the newest
/// entries fitting in half of it, so a save that keeps failing cannot grow
/// the log without bound.
fn append_entry_capped(
    storage_dir: &Path,
    entry: &RecoveryEntry,
    max_size: u64,
) -> io::Result<()> {
    fs::create_dir_all(storage_dir)?;
    let path = recovery_log_path(storage_dir);
    if fs::metadata(&path).is_ok_and(|m| m.len() > max_size) {
        trim_oldest(&path, max_size / 2)?;
    }
    let fresh = fs::metadata(&path).map_or(true, |m| m.len() == 0);

    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if fresh {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())
}

fn trim_oldest(path: &Path, budget: u64) -> io::Result<()> {
    let entries = parse_entries(&fs::read_to_string(path)?);
    let mut used = FILE_HEADER.len() as u64;
    let mut keep = entries.len();
    for entry in entries.iter().rev() {
        used += entry.to_markdown().len() as u64;
        if used > budget {
            break;
        }
        keep -= 1;
    }
    write_log(path, &entries[keep..])
}

/// Rewrite the whole log with `entries` under a fresh header
fn write_log(path: &Path, entries: &[RecoveryEntry]) -> io::Result<()> {
    let content: String = std::iter::once(FILE_HEADER.to_string())
        .chain(entries.iter().map(RecoveryEntry::to_markdown))
        .collect();
    atomic_write(path, content.as_bytes())
}

/// Read entries newest first, keeping at most `limit` of them.
/// A missing or unreadable log has no entries.
pub fn read_recovery_entries(storage_dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let Ok(content) = fs::read_to_string(recovery_log_path(storage_dir)) else {
        return Vec::new();
    };
    let mut entries = parse_entries(&content);
    entries.reverse();
    if let Some(n) = limit {
        entries.truncate(n);
    }
    entries
}

/// Parse every well-formed entry in file (oldest first) order.
/// Unrecognized blocks, such as the file header, are skipped.
fn parse_entries(content: &str) -> Vec<RecoveryEntry> {
    let mut entries = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    let mut in_body = false;

    for line in content.lines() {
        if line.starts_with("```") {
            in_body = !in_body;
        }
        if line == ENTRY_SEPARATOR && !in_body {
            entries.extend(parse_block(&block));
            block.clear();
        } else {
            block.push(line);
        }
    }
    entries.extend(parse_block(&block));
    entries
}

/// Parse the lines between two separators
fn parse_block(lines: &[&str]) -> Option<RecoveryEntry> {
    let start = lines.iter().position(|l| l.starts_with("## "))?;
    let (timestamp, category, description) = parse_entry_header(&lines[start][3..])?;
    let mut entry = RecoveryEntry {
        timestamp,
        category,
        description,
        fields: Vec::new(),
        body: String::new(),
    };

    let mut in_body = false;
    let mut body = Vec::new();
    for &line in &lines[start + 1..] {
        if line.starts_with("```") {
            if in_body {
                break;
            }
            in_body = true;
        } else if in_body {
            body.push(line);
        } else if let Some((key, value)) = line.trim().split_once(": ") {
            entry.fields.push((key.to_string(), value.to_string()));
        }
    }
    entry.body = body.join("\n");
    Some(entry)
}

/// `<rfc3339> — <category>: <description>`
fn parse_entry_header(header: &str) -> Option<(DateTime<Utc>, RecoveryCategory, String)> {
    let (timestamp, rest) = header.split_once(" — ")?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp).ok()?.with_timezone(&Utc);
    let (category, description) = rest.split_once(": ")?;
    let category = RecoveryCategory::from_label(category)?;
    Some((timestamp, category, description.to_string()))
}

/// Drop entries older than `before` (default: [`PRUNE_AGE_DAYS`] ago) and
/// rewrite the log. Returns the number of entries removed.
pub fn prune_recovery(storage_dir: &Path, before: Option<DateTime<Utc>>) -> io::Result<usize> {
    let path = recovery_log_path(storage_dir);
    if !path.exists() {
        return Ok(0);
    }

    let cutoff = before.unwrap_or_else(|| Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS));
    let mut entries = parse_entries(&fs::read_to_string(&path)?);
    let before_count = entries.len();
    entries.retain(|e| e.timestamp >= cutoff);
    write_log(&path, &entries)?;
    Ok(before_count - entries.len())
}
