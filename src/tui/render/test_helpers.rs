use std::fs;

use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use tempfile::TempDir;

use crate::model::config::AppConfig;
use crate::ops::session::Session;
use crate::tui::app::App;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// A list with every status on disk
pub const GROCERIES: &str = "\
* ALL
  - [ ] pepper
  - [ ] salt
** NEEDED
   - [ ] milk
   - [X] bread
";

/// Write `<name>.org` into the test storage directory
pub fn write_list(tmp: &TempDir, name: &str, content: &str) {
    let dir = tmp.path().join("lists");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{}.org", name)), content).unwrap();
}

/// Build an App bound to a single "groceries" list with the given content.
/// The TempDir must outlive the App.
pub fn app_with_list(content: &str) -> (TempDir, App) {
    let tmp = TempDir::new().unwrap();
    write_list(&tmp, "groceries", content);
    let config = AppConfig::default();
    let session = Session::open(
        &config,
        &tmp.path().join("lists"),
        &tmp.path().join("config/preferences.toml"),
    )
    .unwrap();
    let app = App::new(session, &config);
    (tmp, app)
}
