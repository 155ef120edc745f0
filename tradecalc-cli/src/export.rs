//! Report rendering: text, JSON and CSV.
//!
//! - **Text**: titled sections with aligned columns, for the terminal
//! - **JSON**: the full report with the URL it was evaluated from
//! - **CSV**: one record per table row, prefixed by the section title

use anyhow::{Context, Result};
use serde::Serialize;
use tradecalc_core::tools::{Section, Tool, ToolReport};

#[derive(Serialize)]
struct JsonReport<'a> {
    url: &'a str,
    #[serde(flatten)]
    report: &'a ToolReport,
}

/// Pretty JSON with the source URL alongside the report fields.
pub fn export_json(url: &str, report: &ToolReport) -> Result<String> {
    serde_json::to_string_pretty(&JsonReport { url, report }).context("failed to serialize report to JSON")
}

/// Every section as CSV. Each section starts with a header record
/// (`section`, then its column names); rows follow with the title repeated.
pub fn export_csv(report: &ToolReport) -> Result<String> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(vec![]);
    for section in report.sections() {
        let mut header = vec!["section"];
        header.extend(section.columns.iter().copied());
        wtr.write_record(&header)?;
        for row in &section.rows {
            let mut record = vec![section.title];
            record.extend(row.iter().map(String::as_str));
            wtr.write_record(&record)?;
        }
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Human-readable report.
pub fn render_text(tool: Tool, url: &str, report: &ToolReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} ===\n", tool.title()));
    out.push_str(&format!("{}\n", report.headline()));
    out.push_str(&format!("Link: {url}\n"));
    for section in report.sections() {
        out.push('\n');
        out.push_str(&render_section(&section));
    }
    out
}

fn render_section(section: &Section) -> String {
    let mut out = format!("--- {} ---\n", section.title);
    if section.rows.is_empty() {
        out.push_str("(none)\n");
        return out;
    }

    let facts = section.columns == ["item", "value"];
    let widths: Vec<usize> = (0..section.columns.len())
        .map(|i| {
            let header = if facts { 0 } else { section.columns[i].len() };
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
        out.push_str(&aligned(section.columns.iter().copied(), &widths));
        let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        out.push_str(&format!("{}\n", "-".repeat(total)));
    }
    for row in &section.rows {
        out.push_str(&aligned(row.iter().map(String::as_str), &widths));
    }
    out
}

fn aligned<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths.iter().copied())
        .map(|(cell, w)| format!("{cell:<w$}"))
        .collect();
    format!("{}\n", padded.join("  ").trim_end())
}
