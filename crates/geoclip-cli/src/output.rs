//! Terminal output for the geoclip commands.
//!
//! Every command writes through [`OutputWriter`], which renders either
//! styled human output or JSON documents when `--json` is set. Warnings go
//! to stderr in both modes so piped JSON stays parseable.

use console::style;
use serde::Serialize;
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};

pub struct OutputWriter {
    json: bool,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn success(&self, message: impl Display) {
        self.status("success", format!("{}", style("✓").green().bold()), message, false);
    }

    pub fn info(&self, message: impl Display) {
        self.status("info", format!("{}", style("ℹ").blue().bold()), message, false);
    }

    pub fn warning(&self, message: impl Display) {
        self.status("warning", format!("{}", style("⚠").yellow().bold()), message, true);
    }

    fn status(&self, status: &str, glyph: String, message: impl Display, to_stderr: bool) {
        let line = if self.json {
            pretty(&serde_json::json!({
                "status": status,
                "message": message.to_string(),
            }))
        } else {
            format!("{} {}", glyph, message)
        };
        if to_stderr {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }

    /// A labelled value: `Source: fws_wetlands`, or a one-key JSON object.
    pub fn kv(&self, key: impl Display, value: impl Display) {
        if self.json {
            println!(
                "{}",
                pretty(&serde_json::json!({ key.to_string(): value.to_string() }))
            );
        } else {
            println!("{}: {}", style(key).bold(), value);
        }
    }

    /// A section heading. Suppressed in JSON mode, where the data that
    /// follows speaks for itself.
    pub fn section(&self, title: impl Display) {
        if !self.json {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    pub fn table<T: Tabled + Serialize>(&self, rows: Vec<T>) {
        if self.json {
            println!("{}", pretty(&serde_json::json!({ "data": rows })));
        } else if rows.is_empty() {
            println!("{}", style("(no rows)").dim());
        } else {
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
    }

    /// The command's primary result document.
    pub fn result<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        let body = if self.json {
            serde_json::json!({ "status": "success", "data": data })
        } else {
            serde_json::to_value(data)?
        };
        println!("{}", serde_json::to_string_pretty(&body)?);
        Ok(())
    }
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_tracks_the_json_flag() {
        assert!(OutputWriter::new(true).is_json());
        assert!(!OutputWriter::new(false).is_json());
    }

    #[test]
    fn test_pretty_renders_objects() {
        let text = pretty(&serde_json::json!({ "status": "info" }));
        assert!(text.contains("\"status\": \"info\""));
    }
}
