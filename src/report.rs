//! Plain-text rendering of dashboard pages for the terminal

use std::io::{self, Write};

use crate::charts::{Chart, PieChart, Treemap};
use crate::views::PageView;

const WIDTH: usize = 70;

pub fn write_page<W: Write>(out: &mut W, view: &PageView) -> io::Result<()> {
    writeln!(out, "\n{}", "=".repeat(WIDTH))?;
    writeln!(out, "  {}", view.title.to_uppercase())?;
    writeln!(out, "{}", "=".repeat(WIDTH))?;

    for section in &view.sections {
        writeln!(out)?;
        if let Some(caption) = &section.caption {
            writeln!(out, "{}", caption)?;
            writeln!(out, "{}", "-".repeat(WIDTH))?;
        }
        match &section.chart {
            Chart::Pie(pie) => write_pie(out, pie)?,
            Chart::Treemap(map) => write_treemap(out, map)?,
            Chart::Table(table) => {
                writeln!(out, "  {}", table.columns.join(" | "))?;
                for row in &table.rows {
                    let cells: Vec<String> = table
                        .columns
                        .iter()
                        .map(|c| match &row[c] {
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect();
                    writeln!(out, "  {}", cells.join(" | "))?;
                }
            }
            Chart::Placeholder { message } => writeln!(out, "  ({})", message)?,
        }
    }

    writeln!(out)
}

fn write_pie<W: Write>(out: &mut W, pie: &PieChart) -> io::Result<()> {
    let total = pie.total();
    for (label, value) in pie.labels.iter().zip(&pie.values) {
        let pct = if total > 0.0 { value / total * 100.0 } else { 0.0 };
        let bar = "#".repeat((pct / 2.0) as usize);
        writeln!(out, "  {:32} {:>16} ({:>5.1}%) {}", truncate(label, 32), value, pct, bar)?;
    }
    Ok(())
}

fn write_treemap<W: Write>(out: &mut W, map: &Treemap) -> io::Result<()> {
    let Some(root) = map.ids.first() else {
        return Ok(());
    };
    writeln!(out, "  {} ({})", map.labels[0], map.values[0])?;

    // manufacturers only; leaves are too many for a terminal
    for (i, parent) in map.parents.iter().enumerate() {
        if parent == root {
            writeln!(out, "    {:30} {:>10}", truncate(&map.labels[i], 30), map.values[i])?;
        }
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SessionRecord, SessionTable};
    use crate::views::{render, Page};

    #[test]
    fn test_report_lists_slices() {
        let table = SessionTable::new(vec![
            SessionRecord {
                handset_manufacturer: Some("Apple".into()),
                handset_type: Some("Apple iPhone 6S (A1688)".into()),
                google_volume: Some(20.0),
                ..Default::default()
            };
            3
        ]);

        let mut out = Vec::new();
        write_page(&mut out, &render(Page::Handsets, &table)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("HANDSETS OF USERS"));
        assert!(text.contains("Handset Manufacturers (3)"));
        assert!(text.contains("Other Handset Manufacturers"));

        let mut out = Vec::new();
        write_page(&mut out, &render(Page::Applications, &table)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Google"));
        assert!(text.contains("100.0%"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Samsung Galaxy S8", 10), "Samsung...");
        assert_eq!(truncate("Apple", 10), "Apple");
    }
}
