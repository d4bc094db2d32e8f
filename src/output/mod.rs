use colored::Colorize;
use serde::Serialize;

use crate::gallery::{Gallery, VisibleEntry};
use crate::records::RecordSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageReport {
    pub owner: Option<String>,
    pub page: usize,
    pub last_page: usize,
    pub record_count: usize,
    pub can_go_prev: bool,
    pub can_go_next: bool,
    pub entries: Vec<VisibleEntry>,
}

impl PageReport {
    /// `None` while the gallery has no visible slice.
    pub fn from_gallery<S: RecordSource>(gallery: &Gallery<S>) -> Option<Self> {
        let entries = gallery.visible_slice()?.to_vec();
        Some(Self {
            owner: gallery.owner().map(|o| o.to_string()),
            page: gallery.current_page(),
            last_page: gallery.last_page(),
            record_count: gallery.record_count(),
            can_go_prev: gallery.can_go_prev(),
            can_go_next: gallery.can_go_next(),
            entries,
        })
    }
}

pub fn render(report: &PageReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => render_text(report),
        OutputFormat::Json => render_json(report),
    }
}

pub fn render_text(report: &PageReport) -> String {
    let mut out = String::new();
    if report.entries.is_empty() {
        out.push_str(&format!("{}\n", "no NFTs to show".yellow()));
    }
    for entry in &report.entries {
        let name = if entry.name.is_empty() {
            "(unnamed)".to_string()
        } else {
            entry.name.clone()
        };
        out.push_str(&format!(
            "{} {}\n",
            format!("#{}", entry.index + 1).bold().white(),
            name.bold().cyan()
        ));
        out.push_str(&format!("   {:<6}: {}\n", "mint", entry.mint));
        let image = if entry.image_is_fallback {
            entry.image.dimmed().to_string()
        } else {
            entry.image.blue().to_string()
        };
        out.push_str(&format!("   {:<6}: {}\n", "image", image));
        if let Some(error) = &entry.error {
            out.push_str(&format!("   {:<6}: {}\n", "error", error.red()));
        }
    }
    out.push_str(&format!(
        ":: page {}/{} :: {} NFTs ::\n",
        report.page, report.last_page, report.record_count
    ));
    out
}

pub fn render_json(report: &PageReport) -> String {
    let mut out = serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
    out.push('\n');
    out
}
