//! Form panel: one line per input, the cursor row reversed.

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tradecalc_core::input::canonical;
use tradecalc_core::tools::{FieldValue, FieldView};

use crate::app::{App, Editor};
use crate::theme;

const LABEL_WIDTH: usize = 26;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let mut lines: Vec<Line> = Vec::new();

    for (i, field) in app.fields.iter().enumerate() {
        let is_cursor = i == app.cursor;
        let editor = app.editor.as_ref().filter(|e| e.id == field.id);
        let mut line = field_line(field, editor);
        if is_cursor {
            line = line.patch_style(ratatui::style::Style::default().add_modifier(Modifier::REVERSED));
        }
        lines.push(line);
    }

    // Keep the cursor row visible on short terminals.
    let height = area.height as usize;
    let scroll = app.cursor.saturating_sub(height.saturating_sub(1));
    let para = Paragraph::new(lines).scroll((scroll as u16, 0));
    f.render_widget(para, area);
}

fn field_line<'a>(field: &'a FieldView, editor: Option<&'a Editor>) -> Line<'a> {
    let label = Span::styled(format!(" {:<LABEL_WIDTH$}", field.label), theme::text());
    let value = match (&field.value, editor) {
        (FieldValue::Number { .. }, Some(editor)) => {
            Span::styled(format!("{}_", editor.field.raw()), theme::accent_bold())
        }
        (FieldValue::Number { value: Some(v), .. }, None) => Span::styled(canonical(*v), theme::accent()),
        (FieldValue::Number { value: None, placeholder, .. }, None) => {
            Span::styled(canonical(*placeholder), theme::muted())
        }
        (FieldValue::Toggle(on), _) => {
            if *on {
                Span::styled("[x]", theme::accent())
            } else {
                Span::styled("[ ]", theme::muted())
            }
        }
        (FieldValue::Choice { selected, options }, _) => {
            let current = options.get(*selected).map(String::as_str).unwrap_or("?");
            Span::styled(format!("< {current} >"), theme::neutral())
        }
    };
    Line::from(vec![label, value])
}
