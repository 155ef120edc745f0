//! Bottom status bar: key hints, the last status message, the live URL.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{App, StatusLevel};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let mut spans: Vec<Span> = Vec::new();

    let hints = if app.editor.is_some() {
        " Enter:commit Esc:done Bksp:delete"
    } else {
        " Tab:tool [ ]:back/fwd a/x:add/remove y:link ?:help q:quit"
    };
    spans.push(Span::styled(hints, theme::muted()));
    spans.push(Span::raw(" | "));

    match &app.status_message {
        Some((msg, level)) => {
            let style = match level {
                StatusLevel::Info => theme::accent(),
                StatusLevel::Warning => theme::warning(),
            };
            spans.push(Span::styled(msg.clone(), style));
        }
        None => spans.push(Span::styled(app.share_url(), theme::secondary())),
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
