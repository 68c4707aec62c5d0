use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use crate::io::checklist_io::{StoreError, load_checklist, load_or_set_aside, save_checklist};
use crate::io::config_io::ConfigError;
use crate::io::database::{DatabaseError, DatabaseRegistry, validate_name};
use crate::io::preferences::PreferenceStore;
use crate::io::recovery::{RecoveryCategory, RecoveryEntry, log_recovery};
use crate::model::checklist::{Checklist, ChecklistError, CleanupMode, FilterMode};
use crate::model::config::AppConfig;
use crate::model::item::Status;
use crate::ops::autosave::{AutosavePolicy, Fired};
use crate::ops::view::SortedFilteredView;

/// Error type for session intents
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Checklist(#[from] ChecklistError),
    #[error("no item at row {0}")]
    NoSuchRow(usize),
}

/// One display row, as read back by the presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    /// Store index (stable until the next insert or cleanup)
    #[serde(skip)]
    pub index: usize,
    pub status: Status,
    pub title: String,
}

/// The intent surface a front end drives: one checklist bound to the
/// current database, its view, the autosave deadlines, and the registry.
#[derive(Debug)]
pub struct Session {
    registry: DatabaseRegistry,
    prefs: PreferenceStore,
    checklist: Checklist,
    view: SortedFilteredView,
    autosave: AutosavePolicy,
}

impl Session {
    /// Open the preferred (or first) database in `storage_dir`.
    /// A malformed list file is an error.
    pub fn open(
        config: &AppConfig,
        storage_dir: &Path,
        prefs_path: &Path,
    ) -> Result<Self, SessionError> {
        let (registry, prefs) = open_registry(config, storage_dir, prefs_path)?;
        let checklist = load_checklist(&registry.current_path())?;
        Ok(Self::bound(registry, prefs, checklist, config))
    }

    /// Like [`Session::open`], but a malformed list is moved aside (see
    /// [`load_or_set_aside`]) and the session starts empty. Returns the
    /// backup path when that happened.
    pub fn open_recovering(
        config: &AppConfig,
        storage_dir: &Path,
        prefs_path: &Path,
    ) -> Result<(Self, Option<PathBuf>), SessionError> {
        let (registry, prefs) = open_registry(config, storage_dir, prefs_path)?;
        let (checklist, backup) = load_or_set_aside(&registry.current_path())?;
        Ok((Self::bound(registry, prefs, checklist, config), backup))
    }

    fn bound(
        registry: DatabaseRegistry,
        prefs: PreferenceStore,
        checklist: Checklist,
        config: &AppConfig,
    ) -> Self {
        let mut session = Session {
            registry,
            prefs,
            checklist: Checklist::new(),
            view: SortedFilteredView::default(),
            autosave: AutosavePolicy::from_config(&config.autosave),
        };
        session.bind(checklist);
        session
    }

    /// Replace the bound checklist and pick the default filter for it
    fn bind(&mut self, checklist: Checklist) {
        self.checklist = checklist;
        self.autosave.cancel();
        self.view.invalidate();
        self.view.set_mode(if self.checklist.needs_attention() {
            FilterMode::NeededOnly
        } else {
            FilterMode::All
        });
    }

    // -----------------------------------------------------------------------
    // Read-back
    // -----------------------------------------------------------------------

    pub fn checklist(&self) -> &Checklist {
        &self.checklist
    }

    pub fn filter(&self) -> FilterMode {
        self.view.mode()
    }

    pub fn needs_attention(&self) -> bool {
        self.checklist.needs_attention()
    }

    pub fn current_database(&self) -> &str {
        self.registry.current()
    }

    pub fn databases(&self) -> &[String] {
        self.registry.list_databases()
    }

    pub fn storage_dir(&self) -> &Path {
        self.registry.dir()
    }

    pub fn current_path(&self) -> PathBuf {
        self.registry.current_path()
    }

    pub fn autosave(&self) -> &AutosavePolicy {
        &self.autosave
    }

    /// Visible rows in display order
    pub fn rows(&mut self) -> Vec<Row> {
        let items = self.checklist.items();
        self.view
            .rows(&self.checklist)
            .iter()
            .map(|&index| Row {
                index,
                status: items[index].status,
                title: items[index].title.clone(),
            })
            .collect()
    }

    pub fn row_count(&mut self) -> usize {
        self.view.len(&self.checklist)
    }

    /// Display row of a store index, if visible
    pub fn row_of(&mut self, index: usize) -> Option<usize> {
        self.view.row_of(&self.checklist, index)
    }

    fn index_of(&mut self, row: usize) -> Result<usize, SessionError> {
        self.view
            .item_index(&self.checklist, row)
            .ok_or(SessionError::NoSuchRow(row))
    }

    // -----------------------------------------------------------------------
    // Item intents
    // -----------------------------------------------------------------------

    pub fn toggle_item(&mut self, row: usize, now: Instant) -> Result<Status, SessionError> {
        let index = self.index_of(row)?;
        let status = self.checklist.toggle(index, self.view.mode())?;
        self.autosave.arm(now);
        Ok(status)
    }

    pub fn edit_title(&mut self, row: usize, text: &str, now: Instant) -> Result<(), SessionError> {
        let index = self.index_of(row)?;
        self.edit_item_title(index, text, now)
    }

    /// Rename by store index (used for items that are not visible yet)
    pub fn edit_item_title(
        &mut self,
        index: usize,
        text: &str,
        now: Instant,
    ) -> Result<(), SessionError> {
        self.checklist.set_title(index, text)?;
        self.autosave.arm(now);
        Ok(())
    }

    /// Insert a fresh item at the front and return its store index.
    ///
    /// Pending autosave and cleanup are cancelled until the item is titled
    /// (or discarded) and another mutation re-arms them.
    pub fn new_item(&mut self) -> usize {
        self.autosave.cancel();
        self.checklist.insert_new()
    }

    /// The user abandoned editing a fresh item; let cleanup prune it
    pub fn discard_new_item(&mut self, now: Instant) {
        self.autosave.schedule_cleanup(now);
    }

    pub fn select_filter(&mut self, mode: FilterMode) {
        self.view.set_mode(mode);
    }

    /// Bulk reset of checked items. Returns true if anything changed.
    pub fn checkout(&mut self, now: Instant) -> bool {
        let changed = self.checklist.cleanup(CleanupMode::Checkout);
        if changed {
            self.autosave.arm(now);
        }
        changed
    }

    // -----------------------------------------------------------------------
    // Timers and persistence
    // -----------------------------------------------------------------------

    /// Run whatever deferred work is due at `now`.
    ///
    /// A failed save is returned once; the deadline is already cleared, so it
    /// is retried only after the next mutation or an explicit flush.
    pub fn tick(&mut self, now: Instant) -> Result<Fired, SessionError> {
        let fired = self.autosave.fire(now);
        if fired.cleanup {
            self.checklist.cleanup(CleanupMode::Normalize);
        }
        if fired.save {
            self.save()?;
        }
        Ok(fired)
    }

    /// Save now if there are unsaved changes. Returns true if it wrote.
    pub fn flush(&mut self) -> Result<bool, SessionError> {
        if !self.checklist.is_dirty() {
            return Ok(false);
        }
        self.autosave.cancel();
        self.save()?;
        Ok(true)
    }

    /// Write the current list even when clean, so a newly created database
    /// has a file behind it.
    pub fn write_current(&mut self) -> Result<(), SessionError> {
        self.autosave.cancel();
        self.save()
    }

    fn save(&mut self) -> Result<(), SessionError> {
        let path = self.registry.current_path();
        save_checklist(&path, &mut self.checklist)?;
        Ok(())
    }

    fn persist_selection(&mut self) -> Result<(), SessionError> {
        self.prefs.set_current_database(self.registry.current());
        self.prefs.save()?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Database intents
    // -----------------------------------------------------------------------

    /// Switch databases, saving the current one first.
    ///
    /// A name not in the registry is added and bound to an empty list; its
    /// file is written by the first save. If a known target fails to load,
    /// the session stays where it was.
    pub fn select_database(&mut self, name: &str) -> Result<(), SessionError> {
        if name == self.registry.current() {
            return Ok(());
        }
        let checklist = if self.registry.contains(name) {
            self.flush()?;
            load_checklist(&self.registry.path_for(name))?
        } else {
            validate_name(name).map_err(DatabaseError::from)?;
            self.flush()?;
            Checklist::new()
        };
        self.registry.select(name);
        self.bind(checklist);
        self.persist_selection()
    }

    /// Validate, save the current list, and switch to a new empty one.
    pub fn create_database(&mut self, name: &str) -> Result<(), SessionError> {
        self.registry
            .validate_new(name)
            .map_err(DatabaseError::from)?;
        self.flush()?;
        self.registry
            .create_database(name)
            .map_err(DatabaseError::from)?;
        self.bind(Checklist::new());
        self.persist_selection()
    }

    /// Delete the current database and switch to the first remaining one.
    ///
    /// The deleted list's last on-disk content goes to the recovery log.
    /// Returns the deleted name and, if the next list was malformed and had
    /// to be set aside, its backup path.
    pub fn delete_current_database(&mut self) -> Result<(String, Option<PathBuf>), SessionError> {
        let path = self.registry.current_path();
        if let Ok(content) = fs::read_to_string(&path) {
            log_recovery(
                self.registry.dir(),
                RecoveryEntry::new(
                    RecoveryCategory::Delete,
                    format!("list {} deleted", self.registry.current()),
                )
                .field("List", self.registry.current())
                .field("Path", path.display().to_string())
                .body(content),
            );
        }

        self.autosave.cancel();
        let deleted = self.registry.delete_current()?;
        let (checklist, backup) = match load_or_set_aside(&self.registry.current_path()) {
            Ok(loaded) => loaded,
            Err(e) => {
                self.bind(Checklist::new());
                return Err(e.into());
            }
        };
        self.bind(checklist);
        self.persist_selection()?;
        Ok((deleted, backup))
    }
}

fn open_registry(
    config: &AppConfig,
    storage_dir: &Path,
    prefs_path: &Path,
) -> Result<(DatabaseRegistry, PreferenceStore), SessionError> {
    let prefs = PreferenceStore::load(prefs_path);
    let registry = DatabaseRegistry::open(
        storage_dir,
        &config.storage.extension,
        prefs.current_database(),
    )?;
    Ok((registry, prefs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        tmp: TempDir,
        config: AppConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                tmp: TempDir::new().unwrap(),
                config: AppConfig::default(),
            }
        }

        fn lists(&self) -> PathBuf {
            self.tmp.path().join("lists")
        }

        fn prefs(&self) -> PathBuf {
            self.tmp.path().join("config/preferences.toml")
        }

        fn write_list(&self, name: &str, content: &str) {
            fs::create_dir_all(self.lists()).unwrap();
            fs::write(self.lists().join(format!("{}.org", name)), content).unwrap();
        }

        fn read_list(&self, name: &str) -> String {
            fs::read_to_string(self.lists().join(format!("{}.org", name))).unwrap()
        }

        fn open(&self) -> Session {
            Session::open(&self.config, &self.lists(), &self.prefs()).unwrap()
        }
    }

    const GROCERIES: &str = "\
* ALL
  - [ ] pepper
  - [ ] salt
** NEEDED
   - [ ] milk
   - [X] bread
";

    fn titles(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn default_filter_follows_needs_attention() {
        let f = Fixture::new();
        f.write_list("groceries", GROCERIES);
        f.write_list("pantry", "* ALL\n  - [ ] rice\n** NEEDED\n");

        let mut s = f.open();
        assert_eq!(s.current_database(), "groceries");
        assert_eq!(s.filter(), FilterMode::NeededOnly);
        assert_eq!(titles(&s.rows()), vec!["milk", "bread"]);

        s.select_database("pantry").unwrap();
        assert_eq!(s.filter(), FilterMode::All);
        assert_eq!(titles(&s.rows()), vec!["rice"]);
    }

    #[test]
    fn toggle_arms_autosave_and_tick_saves() {
        let f = Fixture::new();
        f.write_list("groceries", GROCERIES);
        let mut s = f.open();
        let t0 = Instant::now();

        assert_eq!(s.toggle_item(0, t0).unwrap(), Status::Checked); // milk
        assert!(s.autosave().is_armed());
        assert_eq!(f.read_list("groceries"), GROCERIES);

        let fired = s.tick(t0 + Duration::from_millis(10)).unwrap();
        assert_eq!(fired, Fired { cleanup: true, save: false });
        assert_eq!(f.read_list("groceries"), GROCERIES);

        let fired = s.tick(t0 + Duration::from_millis(3000)).unwrap();
        assert!(fired.save);
        assert_eq!(
            f.read_list("groceries"),
            "* ALL\n  - [ ] pepper\n  - [ ] salt\n** NEEDED\n   - [X] bread\n   - [X] milk\n"
        );
        assert!(!s.checklist().is_dirty());
    }

    #[test]
    fn new_item_cancels_pending_save() {
        let f = Fixture::new();
        f.write_list("groceries", GROCERIES);
        let mut s = f.open();
        let t0 = Instant::now();

        s.toggle_item(0, t0).unwrap();
        let idx = s.new_item();
        assert!(!s.autosave().is_armed());
        assert!(!s.tick(t0 + Duration::from_secs(10)).unwrap().any());
        assert_eq!(s.checklist().items()[idx].status, Status::Fresh);

        let t1 = t0 + Duration::from_secs(11);
        s.edit_item_title(idx, "eggs", t1).unwrap();
        s.tick(t1 + Duration::from_millis(10)).unwrap();
        assert_eq!(s.checklist().items()[idx].status, Status::Needed);
        assert!(s.tick(t1 + Duration::from_secs(3)).unwrap().save);
        assert!(f.read_list("groceries").contains("   - [ ] eggs\n"));
    }

    #[test]
    fn discarded_new_item_is_pruned_without_saving() {
        let f = Fixture::new();
        f.write_list("groceries", GROCERIES);
        let mut s = f.open();
        let t0 = Instant::now();

        s.new_item();
        s.discard_new_item(t0);
        let fired = s.tick(t0 + Duration::from_millis(10)).unwrap();
        assert_eq!(fired, Fired { cleanup: true, save: false });
        assert_eq!(s.checklist().len(), 4);
        assert_eq!(f.read_list("groceries"), GROCERIES);
    }

    #[test]
    fn edit_title_to_empty_removes_item() {
        let f = Fixture::new();
        f.write_list("groceries", GROCERIES);
        let mut s = f.open();
        s.edit_title(1, "  ", Instant::now()).unwrap(); // bread
        s.flush().unwrap();
        assert!(!f.read_list("groceries").contains("bread"));
    }

    #[test]
    fn multi_line_title_reloads() {
        let f = Fixture::new();
        f.write_list("groceries", GROCERIES);
        let mut s = f.open();
        let idx = s.new_item();
        s.edit_item_title(idx, "oat\nmilk", Instant::now()).unwrap();
        s.flush().unwrap();

        let mut reopened = f.open();
        assert_eq!(
            titles(&reopened.rows()),
            vec!["milk", "oat milk", "bread"]
        );
    }

    #[test]
    fn no_such_row() {
        let f = Fixture::new();
        let mut s = f.open();
        assert!(matches!(
            s.toggle_item(0, Instant::now()),
            Err(SessionError::NoSuchRow(0))
        ));
    }

    #[test]
    fn checkout_resets_checked_and_saves_on_flush() {
        let f = Fixture::new();
        f.write_list("groceries", GROCERIES);
        let mut s = f.open();
        assert!(s.checkout(Instant::now()));
        assert!(!s.checkout(Instant::now()));
        assert!(s.flush().unwrap());
        assert_eq!(
            f.read_list("groceries"),
            "* ALL\n  - [ ] bread\n  - [ ] pepper\n  - [ ] salt\n** NEEDED\n   - [ ] milk\n"
        );
    }

    #[test]
    fn flush_without_changes_writes_nothing() {
        let f = Fixture::new();
        let mut s = f.open();
        assert!(!s.flush().unwrap());
        assert!(!f.lists().join("default.org").exists());
    }

    #[test]
    fn switching_databases_flushes_first_and_persists_choice() {
        let f = Fixture::new();
        f.write_list("groceries", GROCERIES);
        f.write_list("hardware", "* ALL\n** NEEDED\n   - [ ] nails\n");
        let mut s = f.open();

        s.toggle_item(0, Instant::now()).unwrap(); // milk -> Checked
        s.select_database("hardware").unwrap();
        assert!(f.read_list("groceries").contains("   - [X] milk\n"));
        assert_eq!(titles(&s.rows()), vec!["nails"]);

        let reopened = f.open();
        assert_eq!(reopened.current_database(), "hardware");
    }

    #[test]
    fn select_new_database_defers_the_file() {
        let f = Fixture::new();
        f.write_list("groceries", GROCERIES);
        let mut s = f.open();
        s.toggle_item(0, Instant::now()).unwrap(); // milk -> Checked

        s.select_database("camping").unwrap();
        assert!(f.read_list("groceries").contains("   - [X] milk\n"));
        assert_eq!(s.current_database(), "camping");
        assert_eq!(s.databases(), ["camping", "groceries"]);
        assert!(s.checklist().is_empty());
        assert!(!s.current_path().exists());

        let mut reopened = f.open();
        assert_eq!(reopened.current_database(), "camping");
        assert!(!reopened.current_path().exists());

        let idx = reopened.new_item();
        reopened.edit_item_title(idx, "tent", Instant::now()).unwrap();
        reopened.flush().unwrap();
        assert_eq!(
            f.read_list("camping"),
            "* ALL\n** NEEDED\n   - [ ] tent\n"
        );
    }

    #[test]
    fn select_invalid_database_name_is_an_error() {
        let f = Fixture::new();
        let mut s = f.open();
        assert!(matches!(
            s.select_database("no way"),
            Err(SessionError::Database(DatabaseError::Validation { .. }))
        ));
        assert_eq!(s.current_database(), "default");
        assert_eq!(s.databases(), ["default"]);
    }

    #[test]
    fn select_malformed_database_stays_put() {
        let f = Fixture::new();
        f.write_list("groceries", GROCERIES);
        f.write_list("junk", "hello\n");
        let mut s = f.open();
        assert!(matches!(
            s.select_database("junk"),
            Err(SessionError::Store(StoreError::Format { .. }))
        ));
        assert_eq!(s.current_database(), "groceries");
        assert_eq!(s.checklist().len(), 4);
    }

    #[test]
    fn create_database_validates_and_switches() {
        let f = Fixture::new();
        f.write_list("groceries", GROCERIES);
        let mut s = f.open();

        assert!(s.create_database("My List").is_err());
        assert!(s.create_database("groceries").is_err());
        assert_eq!(s.current_database(), "groceries");

        s.create_database("my-list_2").unwrap();
        assert_eq!(s.current_database(), "my-list_2");
        assert_eq!(s.databases(), ["groceries", "my-list_2"]);
        assert!(s.checklist().is_empty());
        assert_eq!(s.filter(), FilterMode::All);
        // Not written until something is saved
        assert!(!f.lists().join("my-list_2.org").exists());

        let idx = s.new_item();
        s.edit_item_title(idx, "first", Instant::now()).unwrap();
        s.flush().unwrap();
        assert_eq!(f.read_list("my-list_2"), "* ALL\n** NEEDED\n   - [ ] first\n");
    }

    #[test]
    fn write_current_persists_an_empty_database() {
        let f = Fixture::new();
        f.write_list("groceries", GROCERIES);
        let mut s = f.open();
        s.create_database("hardware").unwrap();
        s.write_current().unwrap();

        assert_eq!(f.read_list("hardware"), "* ALL\n** NEEDED\n");
        let reopened = f.open();
        assert_eq!(reopened.current_database(), "hardware");
        assert_eq!(reopened.databases(), ["groceries", "hardware"]);
    }

    #[test]
    fn delete_current_database_logs_and_moves_on() {
        let f = Fixture::new();
        f.write_list("groceries", GROCERIES);
        f.write_list("hardware", "* ALL\n** NEEDED\n   - [ ] nails\n");
        let mut s = f.open();
        s.toggle_item(0, Instant::now()).unwrap();

        let (deleted, backup) = s.delete_current_database().unwrap();
        assert_eq!(deleted, "groceries");
        assert!(backup.is_none());
        assert!(!f.lists().join("groceries.org").exists());
        assert_eq!(s.current_database(), "hardware");
        assert_eq!(s.databases(), ["hardware"]);
        assert!(!s.autosave().is_armed());

        let entries = crate::io::recovery::read_recovery_entries(&f.lists(), None);
        assert_eq!(entries[0].category, RecoveryCategory::Delete);
        assert_eq!(entries[0].body, GROCERIES.trim_end());

        assert_eq!(f.open().current_database(), "hardware");
    }

    #[test]
    fn open_recovering_sets_malformed_list_aside() {
        let f = Fixture::new();
        f.write_list("default", "not an outline\n");
        assert!(matches!(
            Session::open(&f.config, &f.lists(), &f.prefs()),
            Err(SessionError::Store(StoreError::Format { .. }))
        ));

        let (s, backup) = Session::open_recovering(&f.config, &f.lists(), &f.prefs()).unwrap();
        assert_eq!(backup, Some(f.lists().join("default.org.bak")));
        assert!(s.checklist().is_empty());
        assert_eq!(s.current_database(), "default");
    }
}
