//! Help overlay: keyboard shortcuts.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::theme;

pub fn render(f: &mut Frame, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();

    section(&mut lines, "Tools");
    key(&mut lines, "Tab / Shift+Tab", "Next / previous calculator (opens a new page)");
    key(&mut lines, "[ / ]", "Back / forward through visited pages");
    key(&mut lines, "y", "Show the shareable link");
    key(&mut lines, "q", "Quit and print the link");
    lines.push(Line::from(""));

    section(&mut lines, "Fields");
    key(&mut lines, "j / k", "Move between fields");
    key(&mut lines, "0-9 .", "Start typing a number");
    key(&mut lines, "Enter", "Edit number, flip toggle, cycle menu");
    key(&mut lines, "h / l", "Previous / next menu entry");
    key(&mut lines, "Backspace", "Clear the field back to its placeholder");
    lines.push(Line::from(""));

    section(&mut lines, "While typing");
    key(&mut lines, "Enter / Esc", "Commit; partial numbers are cleared");
    key(&mut lines, "Up / Down", "Commit and move");
    lines.push(Line::from(""));

    section(&mut lines, "Lists");
    key(&mut lines, "a", "Add a trailing stop or dip level");
    key(&mut lines, "x", "Remove the entry under the cursor");

    f.render_widget(Paragraph::new(lines), area);
}

fn section(lines: &mut Vec<Line<'_>>, title: &str) {
    lines.push(Line::from(Span::styled(title.to_string(), theme::accent_bold())));
}

fn key(lines: &mut Vec<Line<'_>>, keys: &str, desc: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {:>16}  ", keys), theme::accent()),
        Span::styled(desc.to_string(), theme::muted()),
    ]));
}
