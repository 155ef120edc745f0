//! Results panel: headline, then each report section as an aligned table.

use std::time::Instant;

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;
use tradecalc_core::tools::{Section, ToolReport};

use crate::app::App;
use crate::theme::{self, Theme};

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let lines = match &app.report {
        Ok(report) => report_lines(report, app.highlight.is_active(Instant::now())),
        Err(err) => vec![
            Line::from(Span::styled("Check your numbers", theme::negative())),
            Line::from(""),
            Line::from(Span::styled(err.to_string(), theme::muted())),
        ],
    };
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn report_lines(report: &ToolReport, highlighted: bool) -> Vec<Line<'static>> {
    let headline_style = if highlighted {
        theme::highlight()
    } else {
        match report {
            ToolReport::PositionSizing { report, .. } => {
                ratatui::style::Style::default().fg(Theme::default().grade_color(report.grade()))
            }
            _ => theme::accent_bold(),
        }
    };

    let mut lines = vec![Line::from(Span::styled(report.headline(), headline_style))];
    for section in report.sections() {
        lines.push(Line::from(""));
        lines.extend(section_lines(&section));
    }
    lines
}

fn section_lines(section: &Section) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(section.title.to_string(), theme::accent_bold()))];
    if section.rows.is_empty() {
        lines.push(Line::from(Span::styled("  (none)", theme::muted())));
        return lines;
    }

    let facts = section.columns == ["item", "value"];
    let widths: Vec<usize> = (0..section.columns.len())
        .map(|i| {
            let header = if facts { 0 } else { section.columns[i].chars().count() };
            section
                .rows
                .iter()
                .map(|row| row.get(i).map_or(0, |c| c.chars().count()))
                .max()
                .unwrap_or(0)
                .max(header)
        })
        .collect();

    if !facts {
        lines.push(Line::from(Span::styled(
            padded(section.columns.iter().copied(), &widths),
            theme::secondary(),
        )));
    }
    for row in &section.rows {
        if facts {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<w$}  ", row[0], w = widths[0]), theme::muted()),
                Span::styled(row[1].clone(), theme::text()),
            ]));
        } else {
            lines.push(Line::from(Span::styled(
                padded(row.iter().map(String::as_str), &widths),
                theme::text(),
            )));
        }
    }
    lines
}

fn padded<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let cells: Vec<String> = cells
        .zip(widths.iter().copied())
        .map(|(cell, w)| format!("{cell:<w$}"))
        .collect();
    format!("  {}", cells.join("  ").trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_align_under_headers() {
        let section = Section {
            title: "Dip orders",
            columns: vec!["#", "price"],
            rows: vec![vec!["1".into(), "95".into()], vec!["10".into(), "85.5".into()]],
        };
        let lines = section_lines(&section);
        let text: Vec<String> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert_eq!(text[1], "  #   price");
        assert_eq!(text[2], "  1   95");
        assert_eq!(text[3], "  10  85.5");
    }

    #[test]
    fn empty_section_says_none() {
        let section = Section {
            title: "Targets",
            columns: vec!["level"],
            rows: vec![],
        };
        assert_eq!(section_lines(&section).len(), 2);
    }
}
