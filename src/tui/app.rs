use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::io::config_io::AppPaths;
use crate::model::config::AppConfig;
use crate::ops::session::{Session, SessionError};

use super::input;
use super::render;
use super::theme::Theme;

/// Longest the event loop sleeps when no deadline is pending
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    Edit,
    Confirm,
}

/// What the line editor is editing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    /// An item title, by store index. `is_new` for items added with `a`.
    Item { index: usize, is_new: bool },
    /// The name for a new database
    DatabaseName,
}

/// Single-line text input with a byte-offset cursor on a grapheme boundary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineInput {
    pub buffer: String,
    pub cursor: usize,
}

impl LineInput {
    pub fn with_text(text: &str) -> Self {
        LineInput {
            buffer: text.to_string(),
            cursor: text.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EditState {
    pub target: EditTarget,
    pub input: LineInput,
}

/// Actions that need a y/n before running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteDatabase,
    Checkout,
}

/// Main application state
pub struct App {
    pub session: Session,
    pub mode: Mode,
    pub should_quit: bool,
    pub theme: Theme,
    pub show_key_hints: bool,
    /// Cursor as a display row
    pub cursor: usize,
    /// First visible row
    pub scroll_offset: usize,
    pub edit: Option<EditState>,
    pub confirm: Option<ConfirmAction>,
    /// One-shot message for the status row, cleared on the next key
    pub status_message: Option<String>,
    pub status_is_error: bool,
}

impl App {
    pub fn new(session: Session, config: &AppConfig) -> Self {
        App {
            session,
            mode: Mode::Navigate,
            should_quit: false,
            theme: Theme::from_config(&config.ui),
            show_key_hints: config.ui.show_key_hints,
            cursor: 0,
            scroll_offset: 0,
            edit: None,
            confirm: None,
            status_message: None,
            status_is_error: false,
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_is_error = false;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_is_error = true;
    }

    /// Show a session error in the status row
    pub fn report(&mut self, err: SessionError) {
        self.set_error(err.to_string());
    }

    /// Keep the cursor inside the visible rows
    pub fn clamp_cursor(&mut self) {
        let count = self.session.row_count();
        self.cursor = self.cursor.min(count.saturating_sub(1));
    }

    /// Move the cursor to wherever the item at `index` is shown now
    pub fn follow_item(&mut self, index: usize) {
        if let Some(row) = self.session.row_of(index) {
            self.cursor = row;
        }
        self.clamp_cursor();
    }

    /// Reset the cursor after the bound list changed
    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
        self.scroll_offset = 0;
    }

    /// Store index under the cursor, if any
    pub fn selected_index(&mut self) -> Option<usize> {
        let row = self.cursor;
        self.session.rows().get(row).map(|r| r.index)
    }

    /// Run due autosave work
    pub fn tick(&mut self, now: Instant) {
        match self.session.tick(now) {
            Ok(fired) if fired.cleanup => self.clamp_cursor(),
            Ok(_) => {}
            Err(e) => self.set_error(format!("save failed: {}", e)),
        }
    }

    /// How long the event loop may block before the next deadline
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        match self.session.autosave().next_deadline() {
            Some(at) => at.saturating_duration_since(now).min(IDLE_POLL),
            None => IDLE_POLL,
        }
    }
}

/// Run the TUI application
pub fn run(config: &AppConfig, paths: &AppPaths) -> Result<(), Box<dyn std::error::Error>> {
    let (session, backup) =
        Session::open_recovering(config, &paths.storage_dir, &paths.preferences_file)?;
    let mut app = App::new(session, config);
    if let Some(backup) = backup {
        app.set_error(format!(
            "list could not be parsed; moved to {}",
            backup.display()
        ));
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Unsaved edits are written even if the loop failed
    let flushed = app.session.flush();
    result?;
    flushed?;
    Ok(())
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(app.poll_timeout(Instant::now()))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }

        app.tick(Instant::now());

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
