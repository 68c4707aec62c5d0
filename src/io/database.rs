use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

/// Name used when the storage directory holds no lists yet
pub const DEFAULT_DATABASE: &str = "default";

static VALID_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"));

/// A rejected database name. Never leaves the registry modified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid characters")]
    InvalidCharacters(String),
    #[error("already exists")]
    AlreadyExists(String),
}

/// Error type for registry operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("database name {name:?}: {source}")]
    Validation {
        name: String,
        source: ValidationError,
    },
    #[error("could not access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<ValidationError> for DatabaseError {
    fn from(e: ValidationError) -> Self {
        let name = match &e {
            ValidationError::InvalidCharacters(n) | ValidationError::AlreadyExists(n) => n.clone(),
        };
        DatabaseError::Validation { name, source: e }
    }
}

/// The set of named lists in one storage directory
#[derive(Debug, Clone)]
pub struct DatabaseRegistry {
    dir: PathBuf,
    extension: String,
    /// Sorted, never empty
    names: Vec<String>,
    current: String,
}

impl DatabaseRegistry {
    /// Scan `dir` for list files and pick the current database.
    ///
    /// A valid `preferred` name (usually the persisted preference) becomes
    /// current even when its file does not exist yet: that is a list selected
    /// but never saved. Invalid names are ignored and the first database is
    /// selected.
    pub fn open(
        dir: &Path,
        extension: &str,
        preferred: Option<&str>,
    ) -> Result<Self, DatabaseError> {
        let mut names = scan_databases(dir, extension, None)?;
        let preferred = preferred.filter(|p| validate_name(p).is_ok());
        if let Some(name) = preferred
            && let Err(pos) = names.binary_search_by(|n| n.as_str().cmp(name))
        {
            names.insert(pos, name.to_string());
        }
        if names.is_empty() {
            names.push(DEFAULT_DATABASE.to_string());
        }
        let current = match preferred {
            Some(name) => name.to_string(),
            None => names[0].clone(),
        };
        Ok(DatabaseRegistry {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
            names,
            current,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Known database names, sorted
    pub fn list_databases(&self) -> &[String] {
        &self.names
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.binary_search_by(|n| n.as_str().cmp(name)).is_ok()
    }

    /// File backing `name`
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, self.extension))
    }

    pub fn current_path(&self) -> PathBuf {
        self.path_for(&self.current)
    }

    /// Make `name` current, adding it to the known set if new.
    /// The file is not created until the list is first saved.
    pub fn select(&mut self, name: &str) {
        if let Err(pos) = self.names.binary_search_by(|n| n.as_str().cmp(name)) {
            self.names.insert(pos, name.to_string());
        }
        self.current = name.to_string();
    }

    /// Check a name for a new database without changing anything
    pub fn validate_new(&self, name: &str) -> Result<(), ValidationError> {
        validate_name(name)?;
        if self.contains(name) {
            return Err(ValidationError::AlreadyExists(name.to_string()));
        }
        Ok(())
    }

    /// Validate and select a new database. Returns its file path.
    pub fn create_database(&mut self, name: &str) -> Result<PathBuf, ValidationError> {
        self.validate_new(name)?;
        self.select(name);
        Ok(self.path_for(name))
    }

    /// Remove the current database's file (if any), rescan, and select the
    /// first remaining database. Returns the deleted name.
    pub fn delete_current(&mut self) -> Result<String, DatabaseError> {
        let deleted = self.current.clone();
        let path = self.current_path();
        if path.exists() {
            fs::remove_file(&path).map_err(|e| DatabaseError::Io {
                path: path.clone(),
                source: e,
            })?;
        }
        self.names = scan_databases(&self.dir, &self.extension, Some(&deleted))?;
        if self.names.is_empty() {
            self.names.push(DEFAULT_DATABASE.to_string());
        }
        self.current = self.names[0].clone();
        Ok(deleted)
    }
}

/// Database names are file stems: letters, digits, `_` and `-` only
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if VALID_NAME.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::InvalidCharacters(name.to_string()))
    }
}

/// Sorted stems of regular, non-hidden `*.{extension}` files in `dir`.
/// Empty when there are none.
fn scan_databases(
    dir: &Path,
    extension: &str,
    skip: Option<&str>,
) -> Result<Vec<String>, DatabaseError> {
    let mut names = Vec::new();

    if dir.is_dir() {
        let io_err = |e| DatabaseError::Io {
            path: dir.to_path_buf(),
            source: e,
        };
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            if !entry.file_type().map_err(io_err)?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.starts_with('.') || Some(stem) == skip {
                continue;
            }
            names.push(stem.to_string());
        }
    }

    names.sort();
    names.dedup();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, file: &str) {
        fs::write(dir.join(file), "* ALL\n** NEEDED\n").unwrap();
    }

    #[test]
    fn test_empty_dir_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let reg = DatabaseRegistry::open(tmp.path(), "org", None).unwrap();
        assert_eq!(reg.list_databases(), ["default"]);
        assert_eq!(reg.current(), "default");
    }

    #[test]
    fn test_missing_dir_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let reg = DatabaseRegistry::open(&tmp.path().join("nope"), "org", None).unwrap();
        assert_eq!(reg.list_databases(), ["default"]);
    }

    #[test]
    fn test_lists_sorted_list_files_only() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "hardware.org");
        touch(tmp.path(), "groceries.org");
        touch(tmp.path(), "notes.txt");
        touch(tmp.path(), ".hidden.org");
        fs::create_dir(tmp.path().join("subdir.org")).unwrap();
        fs::write(tmp.path().join(".recovery.log"), "").unwrap();

        let reg = DatabaseRegistry::open(tmp.path(), "org", None).unwrap();
        assert_eq!(reg.list_databases(), ["groceries", "hardware"]);
        assert_eq!(reg.current(), "groceries");
    }

    #[test]
    fn test_preferred_is_reconciled() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "groceries.org");
        touch(tmp.path(), "hardware.org");

        let reg = DatabaseRegistry::open(tmp.path(), "org", Some("hardware")).unwrap();
        assert_eq!(reg.current(), "hardware");

        let reg = DatabaseRegistry::open(tmp.path(), "org", Some("../etc/passwd")).unwrap();
        assert_eq!(reg.current(), "groceries");
        assert_eq!(reg.list_databases(), ["groceries", "hardware"]);
    }

    #[test]
    fn test_preferred_without_file_stays_current() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "groceries.org");

        let reg = DatabaseRegistry::open(tmp.path(), "org", Some("camping")).unwrap();
        assert_eq!(reg.current(), "camping");
        assert_eq!(reg.list_databases(), ["camping", "groceries"]);
        assert!(!reg.current_path().exists());
    }

    #[test]
    fn test_preferred_in_empty_dir_replaces_default() {
        let tmp = TempDir::new().unwrap();
        let reg = DatabaseRegistry::open(&tmp.path().join("nope"), "org", Some("x")).unwrap();
        assert_eq!(reg.list_databases(), ["x"]);
        assert_eq!(reg.current(), "x");
    }

    #[test]
    fn test_select_new_name_keeps_sorted_without_file() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "b.org");
        let mut reg = DatabaseRegistry::open(tmp.path(), "org", None).unwrap();
        reg.select("a");
        assert_eq!(reg.list_databases(), ["a", "b"]);
        assert_eq!(reg.current(), "a");
        assert!(!reg.current_path().exists());
    }

    #[test]
    fn test_create_database_validation() {
        let tmp = TempDir::new().unwrap();
        let mut reg = DatabaseRegistry::open(tmp.path(), "org", None).unwrap();

        assert_eq!(
            reg.create_database("My List"),
            Err(ValidationError::InvalidCharacters("My List".into()))
        );
        assert_eq!(reg.create_database(""), Err(ValidationError::InvalidCharacters("".into())));
        assert_eq!(
            reg.create_database("default"),
            Err(ValidationError::AlreadyExists("default".into()))
        );
        assert_eq!(reg.list_databases(), ["default"]);
        assert_eq!(reg.current(), "default");

        let path = reg.create_database("my-list_2").unwrap();
        assert_eq!(path, tmp.path().join("my-list_2.org"));
        assert_eq!(reg.current(), "my-list_2");
        assert_eq!(reg.list_databases(), ["default", "my-list_2"]);
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::InvalidCharacters("a b".into()).to_string(),
            "invalid characters"
        );
        assert_eq!(ValidationError::AlreadyExists("a".into()).to_string(), "already exists");
    }

    #[test]
    fn test_delete_current_selects_first_remaining() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.org");
        touch(tmp.path(), "b.org");
        touch(tmp.path(), "c.org");
        let mut reg = DatabaseRegistry::open(tmp.path(), "org", Some("b")).unwrap();

        assert_eq!(reg.delete_current().unwrap(), "b");
        assert!(!tmp.path().join("b.org").exists());
        assert_eq!(reg.list_databases(), ["a", "c"]);
        assert_eq!(reg.current(), "a");
    }

    #[test]
    fn test_delete_last_database_without_file() {
        let tmp = TempDir::new().unwrap();
        let mut reg = DatabaseRegistry::open(tmp.path(), "org", None).unwrap();
        reg.select("scratch");
        assert_eq!(reg.delete_current().unwrap(), "scratch");
        assert_eq!(reg.list_databases(), ["default"]);
        assert_eq!(reg.current(), "default");
    }

    #[test]
    fn test_delete_default_database() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "default.org");
        let mut reg = DatabaseRegistry::open(tmp.path(), "org", None).unwrap();
        reg.delete_current().unwrap();
        assert!(!tmp.path().join("default.org").exists());
        assert_eq!(reg.list_databases(), ["default"]);
    }
}
