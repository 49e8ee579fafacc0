//! Table and JSON rendering.

use adminctl_types::Page;
use anyhow::{Context, Result};
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

/// Rendering mode chosen by `--json`.
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value).context("serialize output")?;
        println!("{text}");
        Ok(())
    }

    /// Prints a list page as a table followed by a page summary.
    pub fn page<T: Serialize>(
        &self,
        page: &Page<T>,
        header: &[&str],
        row: impl Fn(&T) -> Vec<String>,
        empty: &str,
    ) -> Result<()> {
        if self.json {
            return Self::json(page);
        }
        if page.items.is_empty() {
            println!("{empty}");
            return Ok(());
        }

        let rows: Vec<Vec<String>> = page.items.iter().map(row).collect();
        println!("{}", table(header, &rows));
        println!("{}", page.summary());
        Ok(())
    }

    /// Prints one record as a two-column table.
    pub fn record<T: Serialize + ?Sized>(
        &self,
        value: &T,
        fields: Vec<(&str, String)>,
    ) -> Result<()> {
        if self.json {
            return Self::json(value);
        }
        let rows: Vec<Vec<String>> = fields
            .into_iter()
            .map(|(label, value)| vec![label.to_string(), value])
            .collect();
        println!("{}", table(&[], &rows));
        Ok(())
    }

    /// Acknowledges a mutation.
    pub fn done(&self, reply: &Value, message: &str) -> Result<()> {
        if self.json {
            return Self::json(reply);
        }
        println!("✓ {message}");
        Ok(())
    }
}

pub fn table(header: &[&str], rows: &[Vec<String>]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    if !header.is_empty() {
        table.set_header(header);
    }
    for row in rows {
        table.add_row(row);
    }
    table
}

pub fn or_dash(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

pub fn money(amount: f64) -> String {
    format!("{amount:.2}")
}

/// Shortens backend timestamps to `YYYY-MM-DD HH:MM`.
pub fn date(timestamp: &str) -> String {
    let trimmed = timestamp.trim();
    if trimmed.is_empty() {
        return "-".to_string();
    }
    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(parsed) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    trimmed.to_string()
}

/// Cuts `text` to `max` chars, marking the cut with `…`.
pub fn clip(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_formats() {
        assert_eq!(date("2026-03-01T09:30:00Z"), "2026-03-01 09:30");
        assert_eq!(date("2026-03-01T09:30:00.123456"), "2026-03-01 09:30");
        assert_eq!(date("yesterday"), "yesterday");
        assert_eq!(date(""), "-");
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("a rather long comment", 8), "a rathe…");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(None), "-");
        assert_eq!(or_dash(Some("  ")), "-");
        assert_eq!(or_dash(Some("Lagos")), "Lagos");
    }

    #[test]
    fn test_table_renders_header_and_rows() {
        let rendered = table(
            &["ID", "Name"],
            &[vec!["1".to_string(), "Ada".to_string()]],
        )
        .to_string();
        assert!(rendered.contains("ID"));
        assert!(rendered.contains("Ada"));
    }
}
