//! Output formatting for CLI

use indicatif::ProgressBar;
use serde::Serialize;
use std::io::{self, Write};
use tabled::{settings::Style, Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Text,
        }
    }
}

/// Serialize as pretty JSON
pub fn to_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// Render rows as a rounded table
pub fn to_table<T: Tabled>(rows: &[T]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Log writer that hides the progress bar while a line is written
#[derive(Debug, Clone)]
pub struct ProgressWriter {
    bar: ProgressBar,
}

impl ProgressWriter {
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl Write for ProgressWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bar.suspend(|| io::stderr().write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// `mm:ss.t` for a millisecond offset
pub fn clock(ms: u64) -> String {
    let seconds = ms / 1000;
    format!("{:02}:{:02}.{}", seconds / 60, seconds % 60, (ms % 1000) / 100)
}
