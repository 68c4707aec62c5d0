use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::io::config_io::ConfigError;
use crate::io::recovery::atomic_write;

/// User preferences persisted across sessions (preferences.toml)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub database: DatabasePrefs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabasePrefs {
    /// Last selected list (`database.current`)
    #[serde(default)]
    pub current: Option<String>,
}

/// Preferences bound to their file
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
    pub prefs: Preferences,
}

impl PreferenceStore {
    /// Read preferences from `path`.
    /// A missing file yields defaults; a corrupted one is backed up as
    /// `.bak` and replaced by defaults.
    pub fn load(path: &Path) -> Self {
        PreferenceStore {
            path: path.to_path_buf(),
            prefs: read_preferences(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current_database(&self) -> Option<&str> {
        self.prefs.database.current.as_deref()
    }

    pub fn set_current_database(&mut self, name: &str) {
        self.prefs.database.current = Some(name.to_string());
    }

    /// Write `database.current` back, preserving the rest of the file
    pub fn save(&self) -> Result<(), ConfigError> {
        let existing = fs::read_to_string(&self.path).unwrap_or_default();
        let mut doc: toml_edit::DocumentMut = existing.parse().unwrap_or_default();
        if let Some(current) = &self.prefs.database.current {
            set_current_database(&mut doc, current);
        }

        let write_err = |e| ConfigError::Write {
            path: self.path.clone(),
            source: e,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        atomic_write(&self.path, doc.to_string().as_bytes()).map_err(write_err)
    }
}

fn read_preferences(path: &Path) -> Preferences {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return Preferences::default(),
    };
    match toml::from_str::<Preferences>(&content) {
        Ok(prefs) => prefs,
        Err(e) => {
            // Corrupted: back up and start fresh
            let bak = path.with_extension("toml.bak");
            let _ = fs::copy(path, &bak);
            eprintln!(
                "warning: could not parse {} (backed up as {}): {}",
                path.display(),
                bak.display(),
                e
            );
            Preferences::default()
        }
    }
}

/// Update `database.current` in a preferences document
pub fn set_current_database(doc: &mut toml_edit::DocumentMut, name: &str) {
    if !doc.contains_key("database") {
        doc["database"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["database"]["current"] = toml_edit::value(name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_preferences() {
        let tmp = TempDir::new().unwrap();
        let store = PreferenceStore::load(&tmp.path().join("preferences.toml"));
        assert_eq!(store.current_database(), None);
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("i4check/preferences.toml");
        let mut store = PreferenceStore::load(&path);
        store.set_current_database("groceries");
        store.save().unwrap();

        let loaded = PreferenceStore::load(&path);
        assert_eq!(loaded.current_database(), Some("groceries"));
    }

    #[test]
    fn test_save_replaces_file_without_leftovers() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("preferences.toml");
        fs::write(&path, "[database]\ncurrent = \"old\"\n").unwrap();

        let mut store = PreferenceStore::load(&path);
        store.set_current_database("new");
        store.save().unwrap();

        let names: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, ["preferences.toml"]);
        let loaded = PreferenceStore::load(&path);
        assert_eq!(loaded.current_database(), Some("new"));
    }

    #[test]
    fn test_save_preserves_comments_and_other_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("preferences.toml");
        fs::write(
            &path,
            "# remembered between runs\n[database]\ncurrent = \"old\"\n\n[window]\nwidth = 40\n",
        )
        .unwrap();

        let mut store = PreferenceStore::load(&path);
        assert_eq!(store.current_database(), Some("old"));
        store.set_current_database("new");
        store.save().unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# remembered between runs\n"));
        assert!(written.contains("current = \"new\""));
        assert!(written.contains("width = 40"));
    }

    #[test]
    fn test_corrupted_preferences_backup() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("preferences.toml");
        fs::write(&path, "not valid toml [[[").unwrap();

        let store = PreferenceStore::load(&path);
        assert_eq!(store.prefs, Preferences::default());
        assert!(path.with_extension("toml.bak").exists());
    }

    #[test]
    fn test_set_current_database_creates_table() {
        let mut doc = toml_edit::DocumentMut::new();
        set_current_database(&mut doc, "hardware");
        let prefs: Preferences = toml::from_str(&doc.to_string()).unwrap();
        assert_eq!(prefs.database.current.as_deref(), Some("hardware"));
    }
}
