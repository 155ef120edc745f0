//! Keyboard input dispatch: overlay, then the open editor, then global and form keys.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, Overlay};

/// Handle a key event. Sets `app.running = false` to quit.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // A message lasts until the next key.
    app.status_message = None;

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.quit();
        return;
    }

    // 1. Overlays consume input first.
    if app.overlay == Overlay::Help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.overlay = Overlay::None;
        }
        return;
    }

    // 2. An open number editor takes text keys.
    if app.editor.is_some() {
        handle_editor_key(app, key);
        return;
    }

    // 3. Global and form keys.
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('?') => app.overlay = Overlay::Help,
        KeyCode::Tab => app.switch_tool(app.tool.next()),
        KeyCode::BackTab => app.switch_tool(app.tool.prev()),
        KeyCode::Char('[') => app.back(),
        KeyCode::Char(']') => app.forward(),
        KeyCode::Left if key.modifiers.contains(KeyModifiers::ALT) => app.back(),
        KeyCode::Right if key.modifiers.contains(KeyModifiers::ALT) => app.forward(),
        KeyCode::Char('j') | KeyCode::Down => app.move_cursor(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_cursor(-1),
        KeyCode::Char('h') | KeyCode::Left => app.cycle_choice(-1),
        KeyCode::Char('l') | KeyCode::Right => app.cycle_choice(1),
        KeyCode::Enter | KeyCode::Char(' ') => app.activate(),
        KeyCode::Backspace | KeyCode::Delete => app.clear_selected(),
        KeyCode::Char('a') => app.append_entry(),
        KeyCode::Char('x') => app.remove_entry(),
        KeyCode::Char('y') => {
            let url = app.share_url();
            app.set_status(format!("link: {url}"));
        }
        KeyCode::Char(c) if c.is_ascii_digit() || c == '.' || c == '-' => app.type_char(c),
        _ => {}
    }
}

fn handle_editor_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => app.finish_edit(),
        KeyCode::Tab | KeyCode::Down => app.move_cursor(1),
        KeyCode::BackTab | KeyCode::Up => app.move_cursor(-1),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Char(c) => app.type_char(c),
        _ => {}
    }
}
