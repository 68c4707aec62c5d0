use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::{App, ConfirmAction, EditState, EditTarget, LineInput, Mode};

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Movement
        KeyCode::Char('j') | KeyCode::Down => move_cursor(app, 1),
        KeyCode::Char('k') | KeyCode::Up => move_cursor(app, -1),
        KeyCode::Char('g') | KeyCode::Home => app.cursor = 0,
        KeyCode::Char('G') | KeyCode::End => {
            app.cursor = app.session.row_count().saturating_sub(1);
        }

        // Items
        KeyCode::Char(' ') | KeyCode::Enter => toggle_selected(app),
        KeyCode::Char('a') => begin_new_item(app),
        KeyCode::Char('e') => begin_edit_selected(app),
        KeyCode::Tab => {
            let mode = app.session.filter().other();
            app.session.select_filter(mode);
            app.clamp_cursor();
        }

        // Databases
        KeyCode::Char('[') => cycle_database(app, -1),
        KeyCode::Char(']') => cycle_database(app, 1),
        KeyCode::Char('N') => {
            app.edit = Some(EditState {
                target: EditTarget::DatabaseName,
                input: LineInput::default(),
            });
            app.mode = Mode::Edit;
        }
        KeyCode::Char('D') => ask(app, ConfirmAction::DeleteDatabase),
        KeyCode::Char('C') => ask(app, ConfirmAction::Checkout),
        _ => {}
    }
}

fn move_cursor(app: &mut App, delta: isize) {
    let count = app.session.row_count();
    if count == 0 {
        app.cursor = 0;
        return;
    }
    app.cursor = app.cursor.saturating_add_signed(delta).min(count - 1);
}

fn toggle_selected(app: &mut App) {
    let Some(index) = app.selected_index() else {
        return;
    };
    match app.session.toggle_item(app.cursor, Instant::now()) {
        Ok(_) => app.follow_item(index),
        Err(e) => app.report(e),
    }
}

fn begin_new_item(app: &mut App) {
    let index = app.session.new_item();
    app.follow_item(index);
    app.edit = Some(EditState {
        target: EditTarget::Item { index, is_new: true },
        input: LineInput::default(),
    });
    app.mode = Mode::Edit;
}

fn begin_edit_selected(app: &mut App) {
    let Some(index) = app.selected_index() else {
        return;
    };
    let title = app
        .session
        .checklist()
        .get(index)
        .map(|i| i.title.clone())
        .unwrap_or_default();
    app.edit = Some(EditState {
        target: EditTarget::Item {
            index,
            is_new: false,
        },
        input: LineInput::with_text(&title),
    });
    app.mode = Mode::Edit;
}

/// Switch to the previous/next database, wrapping around
fn cycle_database(app: &mut App, delta: isize) {
    let names = app.session.databases();
    if names.len() < 2 {
        return;
    }
    let current = names
        .iter()
        .position(|n| n == app.session.current_database())
        .unwrap_or(0);
    let next = (current as isize + delta).rem_euclid(names.len() as isize) as usize;
    let name = names[next].clone();

    match app.session.select_database(&name) {
        Ok(()) => app.reset_cursor(),
        Err(e) => app.report(e),
    }
}

fn ask(app: &mut App, action: ConfirmAction) {
    app.confirm = Some(action);
    app.mode = Mode::Confirm;
}
