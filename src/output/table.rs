//
//  enterprise-cli
//  output/table.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Table Output Formatting
//!
//! Fixed-column tables rendered with `comfy_table`. The columns for each
//! entity kind come from [`layout::columns`](super::layout::columns).
//!
//! ## Example
//!
//! ```rust
//! use enterprise_cli::output::table::TableBuilder;
//!
//! let table = TableBuilder::new()
//!     .color(false)
//!     .headers(["KEY", "STATUS"])
//!     .row(["PROJ-1", "Done"])
//!     .render();
//! assert!(table.contains("PROJ-1"));
//! ```

use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use super::layout::{cell, columns};
use crate::api::common::Record;
use crate::api::operation::EntityKind;

/// Creates a table with the standard preset.
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Builder for tables with an optional colored header row.
pub struct TableBuilder {
    table: Table,
    color: bool,
}

impl TableBuilder {
    /// Creates a builder; color follows the terminal's capabilities.
    pub fn new() -> Self {
        Self {
            table: create_table(),
            color: console::colors_enabled(),
        }
    }

    /// Overrides color output.
    pub fn color(mut self, enabled: bool) -> Self {
        self.color = enabled;
        self
    }

    /// Sets the header row.
    pub fn headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        if self.color {
            let cells: Vec<Cell> = headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)).collect();
            self.table.set_header(cells);
        } else {
            self.table.set_header(headers);
        }
        self
    }

    /// Appends a row.
    pub fn row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row: Vec<String> = cells.into_iter().map(Into::into).collect();
        self.table.add_row(row);
        self
    }

    /// Renders the table to a string.
    pub fn render(self) -> String {
        self.table.to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Colors a status value by its meaning.
pub fn format_status(status: &str, color: bool) -> String {
    if !color {
        return status.to_string();
    }

    use console::style;
    match status.to_lowercase().as_str() {
        "opened" | "active" | "running" | "in progress" | "created" => style(status).green().to_string(),
        "merged" | "done" | "success" | "closed" | "resolved" => style(status).blue().to_string(),
        "failed" | "canceled" | "blocked" => style(status).red().to_string(),
        "pending" | "future" | "to do" | "manual" => style(status).yellow().to_string(),
        _ => status.to_string(),
    }
}

/// Renders records of one kind as a table. An empty slice yields the header row only.
pub fn render_table(records: &[Record], kind: EntityKind, color: bool) -> String {
    let columns = columns(kind);
    let mut builder = TableBuilder::new()
        .color(color)
        .headers(columns.iter().map(|c| c.header));

    for record in records {
        builder = builder.row(columns.iter().map(|column| {
            let text = cell(record, column);
            match column.field {
                "status" | "state" => format_status(&text, color),
                _ => text,
            }
        }));
    }
    builder.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table_has_header_only() {
        let rendered = render_table(&[], EntityKind::Issue, false);
        for header in ["KEY", "STATUS", "ASSIGNEE", "SUMMARY"] {
            assert!(rendered.contains(header));
        }
        assert!(!rendered.contains("PROJ"));
    }

    #[test]
    fn test_rows_follow_columns() {
        let records = vec![
            Record::new().with("iid", 7).with("state", "opened").with("title", "Add retries"),
            Record::new().with("iid", 8).with("state", "merged").with("title", "Fix docs"),
        ];
        let rendered = render_table(&records, EntityKind::MergeRequest, false);
        assert!(rendered.contains("IID"));
        assert!(rendered.contains("Add retries"));
        assert!(rendered.find("Add retries") < rendered.find("Fix docs"));
    }

    #[test]
    fn test_format_status_plain() {
        assert_eq!(format_status("failed", false), "failed");
    }
}
