//! Top-level UI layout: tool tabs, form and results side by side, status bar.

pub mod form_panel;
pub mod help_panel;
pub mod results_panel;
pub mod status_bar;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;
use tradecalc_core::tools::Tool;

use crate::app::{App, Overlay};
use crate::theme;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());

    draw_tabs(f, chunks[0], app);

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);

    let form_block = panel_block(app.tool.title(), true);
    let inner = form_block.inner(panels[0]);
    f.render_widget(form_block, panels[0]);
    form_panel::render(f, inner, app);

    let results_block = panel_block("Results", false);
    let inner = results_block.inner(panels[1]);
    f.render_widget(results_block, panels[1]);
    results_panel::render(f, inner, app);

    status_bar::render(f, chunks[2], app);

    if app.overlay == Overlay::Help {
        let area = centered_rect(70, 80, chunks[1]);
        f.render_widget(Clear, area);
        let block = panel_block("Help", true);
        let inner = block.inner(area);
        f.render_widget(block, area);
        help_panel::render(f, inner);
    }
}

fn panel_block(title: &str, focused: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(focused))
        .title(format!(" {title} "))
        .title_style(theme::panel_title(focused))
}

fn draw_tabs(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();
    for tool in Tool::ALL {
        let style = if tool == app.tool {
            theme::accent_bold()
        } else {
            theme::muted()
        };
        spans.push(Span::styled(format!(" {} ", tool.title()), style));
        spans.push(Span::raw("|"));
    }
    spans.pop();
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Compute a centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
