//
//  enterprise-cli
//  output/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Output Module
//!
//! Renders normalized records in one of four formats:
//!
//! - **summary**: one compact line per record (the default)
//! - **table**: fixed columns with a header row
//! - **keys**: only the identity field, one per line
//! - **full**: every field as pretty-printed JSON, never truncated
//!
//! [`render`] is pure: the same records and format always give the same
//! text, and an empty slice is never an error. [`OutputWriter`] puts the
//! text on stdout and status messages on stderr.
//!
//! ## Example
//!
//! ```rust
//! use enterprise_cli::api::common::Record;
//! use enterprise_cli::api::operation::EntityKind;
//! use enterprise_cli::output::{render, OutputFormat};
//!
//! let issues = vec![Record::new().with("key", "PROJ-1").with("summary", "Fix login")];
//! assert_eq!(render(&issues, EntityKind::Issue, OutputFormat::Keys), "PROJ-1");
//! assert_eq!(render(&[], EntityKind::Issue, OutputFormat::Full), "[]");
//! ```

pub mod json;
pub mod layout;
pub mod table;

use std::fmt;
use std::io::{self, Write};

use crate::api::common::Record;
use crate::api::operation::EntityKind;

/// The available output formats.
///
/// # Variants
///
/// | Variant | Output | Empty input |
/// |---------|--------|-------------|
/// | `Summary` | one line per record | nothing |
/// | `Table` | header row plus one row per record | header only |
/// | `Keys` | identity field per line | nothing |
/// | `Full` | pretty JSON array | `[]` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One compact line per record
    #[default]
    Summary,
    /// Fixed-column table
    Table,
    /// Identity fields only
    Keys,
    /// Every field as JSON
    Full,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Summary => "summary",
            Self::Table => "table",
            Self::Keys => "keys",
            Self::Full => "full",
        };
        f.write_str(name)
    }
}

/// Renders records of one kind in a format, without color.
pub fn render(records: &[Record], kind: EntityKind, format: OutputFormat) -> String {
    render_styled(records, kind, format, false)
}

/// Renders records, coloring table status cells and headers when `color` is set.
pub fn render_styled(records: &[Record], kind: EntityKind, format: OutputFormat, color: bool) -> String {
    match format {
        OutputFormat::Summary => records
            .iter()
            .map(|record| layout::summary_line(record, kind))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Table => table::render_table(records, kind, color),
        OutputFormat::Keys => json::render_keys(records, kind),
        OutputFormat::Full => json::render_full(records),
    }
}

/// Writes rendered records to stdout and status messages to stderr.
///
/// Color is detected from the terminal and disabled when output is piped.
pub struct OutputWriter {
    format: OutputFormat,
    color: bool,
}

impl OutputWriter {
    /// Creates a writer for a format.
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            color: console::colors_enabled(),
        }
    }

    /// The writer's format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Whether color output is enabled.
    pub fn color_enabled(&self) -> bool {
        self.color
    }

    /// Renders and prints records.
    ///
    /// An empty `summary` prints `No results found` on stderr so stdout
    /// stays empty.
    ///
    /// # Errors
    ///
    /// Returns an error if stdout cannot be written.
    pub fn write_records(&self, records: &[Record], kind: EntityKind) -> anyhow::Result<()> {
        if records.is_empty() && self.format == OutputFormat::Summary {
            self.write_info("No results found");
            return Ok(());
        }

        let text = render_styled(records, kind, self.format, self.color);
        if text.is_empty() {
            return Ok(());
        }
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", text)?;
        handle.flush()?;
        Ok(())
    }

    /// Writes an error message to stderr.
    pub fn write_error(&self, msg: &str) {
        if self.color {
            eprintln!("{} {}", console::style("error:").red().bold(), msg);
        } else {
            eprintln!("error: {}", msg);
        }
    }

    /// Writes a success message to stderr.
    pub fn write_success(&self, msg: &str) {
        if self.color {
            eprintln!("{} {}", console::style("✓").green(), msg);
        } else {
            eprintln!("✓ {}", msg);
        }
    }

    /// Writes a warning to stderr.
    pub fn write_warning(&self, msg: &str) {
        if self.color {
            eprintln!("{} {}", console::style("warning:").yellow().bold(), msg);
        } else {
            eprintln!("warning: {}", msg);
        }
    }

    /// Writes an informational message to stderr.
    pub fn write_info(&self, msg: &str) {
        if self.color {
            eprintln!("{}", console::style(msg).dim());
        } else {
            eprintln!("{}", msg);
        }
    }
}

impl Default for OutputWriter {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn issues() -> Vec<Record> {
        vec![
            Record::new()
                .with("key", "PROJ-1")
                .with("summary", "Fix login")
                .with("status", "Done"),
            Record::new()
                .with("key", "PROJ-2")
                .with("summary", "Write docs")
                .with("status", "To Do"),
        ]
    }

    #[test]
    fn test_empty_input_for_every_format() {
        for format in [
            OutputFormat::Summary,
            OutputFormat::Table,
            OutputFormat::Keys,
            OutputFormat::Full,
        ] {
            let rendered = render(&[], EntityKind::Issue, format);
            match format {
                OutputFormat::Summary | OutputFormat::Keys => assert!(rendered.is_empty()),
                OutputFormat::Table => assert!(rendered.contains("KEY")),
                OutputFormat::Full => assert_eq!(rendered, "[]"),
            }
        }
    }

    #[test]
    fn test_keys_is_projection_of_full() {
        let records = issues();
        let keys: Vec<String> = render(&records, EntityKind::Issue, OutputFormat::Keys)
            .lines()
            .map(str::to_string)
            .collect();
        let full: Value = serde_json::from_str(&render(&records, EntityKind::Issue, OutputFormat::Full)).unwrap();
        let from_full: Vec<String> = full
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["key"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(keys, from_full);
    }

    #[test]
    fn test_summary_one_line_per_record() {
        let rendered = render(&issues(), EntityKind::Issue, OutputFormat::Summary);
        assert_eq!(rendered, "PROJ-1: Fix login [Done]\nPROJ-2: Write docs [To Do]");
    }

    #[test]
    fn test_render_is_deterministic() {
        let records = issues();
        for format in [OutputFormat::Summary, OutputFormat::Table, OutputFormat::Full] {
            assert_eq!(
                render(&records, EntityKind::Issue, format),
                render(&records, EntityKind::Issue, format)
            );
        }
    }
}
