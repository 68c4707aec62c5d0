use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::{App, EditTarget, LineInput, Mode};
use crate::util::unicode;

pub(super) fn handle_edit(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (_, KeyCode::Enter) => commit(app),
        (_, KeyCode::Esc) => cancel(app),
        _ => {
            if let Some(edit) = &mut app.edit {
                edit_line(&mut edit.input, key);
            }
        }
    }
}

/// Apply a single editing key to a line input
fn edit_line(input: &mut LineInput, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('w') if ctrl => {
            let start = unicode::word_boundary_left(&input.buffer, input.cursor);
            input.buffer.replace_range(start..input.cursor, "");
            input.cursor = start;
        }
        KeyCode::Char('u') if ctrl => {
            input.buffer.replace_range(..input.cursor, "");
            input.cursor = 0;
        }
        KeyCode::Char('a') if ctrl => input.cursor = 0,
        KeyCode::Char('e') if ctrl => input.cursor = input.buffer.len(),
        KeyCode::Char(c) if !ctrl => {
            input.buffer.insert(input.cursor, c);
            input.cursor += c.len_utf8();
        }
        KeyCode::Backspace => {
            if let Some(prev) = unicode::prev_grapheme_boundary(&input.buffer, input.cursor) {
                input.buffer.replace_range(prev..input.cursor, "");
                input.cursor = prev;
            }
        }
        KeyCode::Delete => {
            if let Some(next) = unicode::next_grapheme_boundary(&input.buffer, input.cursor) {
                input.buffer.replace_range(input.cursor..next, "");
            }
        }
        KeyCode::Left => {
            if let Some(prev) = unicode::prev_grapheme_boundary(&input.buffer, input.cursor) {
                input.cursor = prev;
            }
        }
        KeyCode::Right => {
            if let Some(next) = unicode::next_grapheme_boundary(&input.buffer, input.cursor) {
                input.cursor = next;
            }
        }
        KeyCode::Home => input.cursor = 0,
        KeyCode::End => input.cursor = input.buffer.len(),
        _ => {}
    }
}

fn commit(app: &mut App) {
    let Some(edit) = app.edit.take() else {
        app.mode = Mode::Navigate;
        return;
    };
    let now = Instant::now();

    match edit.target {
        EditTarget::Item { index, is_new } => {
            app.mode = Mode::Navigate;
            if is_new && edit.input.buffer.trim().is_empty() {
                app.session.discard_new_item(now);
                return;
            }
            match app.session.edit_item_title(index, &edit.input.buffer, now) {
                Ok(()) => app.follow_item(index),
                Err(e) => app.report(e),
            }
        }
        EditTarget::DatabaseName => {
            let name = edit.input.buffer.trim().to_string();
            match app.session.create_database(&name) {
                Ok(()) => {
                    app.mode = Mode::Navigate;
                    app.reset_cursor();
                    match app.session.write_current() {
                        Ok(()) => app.set_status(format!("created {}", name)),
                        Err(e) => app.report(e),
                    }
                }
                Err(e) => {
                    // Keep the prompt open so the name can be fixed
                    app.report(e);
                    app.edit = Some(edit);
                }
            }
        }
    }
}

fn cancel(app: &mut App) {
    if let Some(edit) = app.edit.take()
        && let EditTarget::Item { is_new: true, .. } = edit.target
    {
        app.session.discard_new_item(Instant::now());
    }
    app.mode = Mode::Navigate;
    app.clamp_cursor();
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::item::Status;
    use crate::tui::input::handle_key;
    use crate::tui::input::test_keys::*;
    use crate::tui::render::test_helpers::*;

    fn input(text: &str, cursor: usize) -> LineInput {
        LineInput {
            buffer: text.to_string(),
            cursor,
        }
    }

    #[test]
    fn line_editing_keys() {
        let mut li = input("olive oil", 9);
        edit_line(&mut li, KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CONTROL));
        assert_eq!(li, input("olive ", 6));

        edit_line(&mut li, key(KeyCode::Left));
        edit_line(&mut li, key(KeyCode::Backspace));
        assert_eq!(li, input("oliv ", 4));

        edit_line(&mut li, key(KeyCode::Char('e')));
        edit_line(&mut li, key(KeyCode::End));
        edit_line(&mut li, key(KeyCode::Char('!')));
        assert_eq!(li, input("olive !", 7));

        edit_line(&mut li, key(KeyCode::Home));
        edit_line(&mut li, key(KeyCode::Delete));
        assert_eq!(li, input("live !", 0));
    }

    #[test]
    fn backspace_removes_whole_grapheme() {
        let mut li = input("cafe\u{0301}", 6);
        edit_line(&mut li, key(KeyCode::Backspace));
        assert_eq!(li, input("caf", 3));
    }

    #[test]
    fn new_item_is_titled_and_needed() {
        let (_tmp, mut app) = app_with_list(GROCERIES);
        press_char(&mut app, 'a');
        assert_eq!(app.mode, Mode::Edit);
        type_text(&mut app, "eggs");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Navigate);

        app.tick(Instant::now() + Duration::from_millis(50));
        let rows = app.session.rows();
        let eggs = rows.iter().position(|r| r.title == "eggs").unwrap();
        assert_eq!(rows[eggs].status, Status::Needed);
        assert_eq!(app.cursor, eggs);
    }

    #[test]
    fn escape_on_new_item_discards_it() {
        let (_tmp, mut app) = app_with_list(GROCERIES);
        let before = app.session.checklist().len();
        press_char(&mut app, 'a');
        type_text(&mut app, "half typed");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Navigate);
        assert!(!app.session.autosave().is_armed());
        assert!(app.session.autosave().cleanup_pending());

        app.tick(Instant::now() + Duration::from_millis(50));
        assert_eq!(app.session.checklist().len(), before);
        assert!(!app.session.autosave().is_armed());
    }

    #[test]
    fn edit_existing_title() {
        let (_tmp, mut app) = app_with_list(GROCERIES);
        press_char(&mut app, 'e');
        assert_eq!(app.edit.as_ref().unwrap().input, LineInput::with_text("milk"));
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL),
        );
        type_text(&mut app, "oat milk");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session.rows()[app.cursor].title, "oat milk");
    }

    #[test]
    fn invalid_database_name_keeps_prompt_open() {
        let (tmp, mut app) = app_with_list(GROCERIES);
        press_char(&mut app, 'N');
        type_text(&mut app, "my list");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Edit);
        assert!(app.status_is_error);
        assert!(app.status_message.as_ref().unwrap().contains("invalid characters"));

        press(&mut app, KeyCode::Home);
        press(&mut app, KeyCode::Delete);
        press(&mut app, KeyCode::Delete);
        press(&mut app, KeyCode::Delete);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Navigate);
        assert_eq!(app.session.current_database(), "list");
        assert!(tmp.path().join("lists/list.org").exists());
    }
}
