//
//  enterprise-cli
//  output/layout.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Display Layouts
//!
//! Per-entity presentation rules: which field identifies a record, how a
//! record collapses into one summary line, and which columns a table shows.
//!
//! | Entity | Identity | Summary line |
//! |--------|----------|--------------|
//! | Issue | `key` | `KEY: summary [status] @assignee` |
//! | Transition | `id` | `id: name -> to` |
//! | Comment | `id` | `[created] author: body` |
//! | User | `id` | `name <email> (id)` |
//! | Project | `key` | `KEY: name` |
//! | Board | `id` | `id: name (type)` |
//! | Sprint | `id` | `id: name [state] start ~ end` |
//! | Page | `id` | `[id] title (space)` |
//! | Space | `key` | `KEY: name (type)` |
//! | Channel | `id` | `#name (id) N members` |
//! | Message | `id` | `id @user: text` |
//! | Merge request | `iid` | `!iid: title [state] source -> target` |
//! | Pipeline | `id` | `#id ref [status]` |
//! | Job | `id` | `id stage/name [status]` |
//! | Branch | `name` | `name (merged, protected)` |
//! | Priority | `id` | `id: name` |
//! | Link type | `name` | `name (outward / inward)` |
//! | Result | `id` | `id: message` |

use crate::api::common::Record;
use crate::api::operation::EntityKind;
use crate::util::{collapse_whitespace, short_date, truncate};

/// One table column: header, record field and maximum cell width.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    /// Header text
    pub header: &'static str,
    /// Record field rendered in this column
    pub field: &'static str,
    /// Cells longer than this are truncated
    pub width: usize,
}

const fn col(header: &'static str, field: &'static str, width: usize) -> Column {
    Column { header, field, width }
}

/// The field that addresses a record of `kind` in a follow-up operation.
pub fn identity_field(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Issue | EntityKind::Project | EntityKind::Space => "key",
        EntityKind::MergeRequest => "iid",
        EntityKind::Branch | EntityKind::LinkType => "name",
        _ => "id",
    }
}

const ISSUE_COLUMNS: &[Column] = &[
    col("KEY", "key", 20),
    col("STATUS", "status", 20),
    col("ASSIGNEE", "assignee", 25),
    col("SUMMARY", "summary", 80),
];

const TRANSITION_COLUMNS: &[Column] = &[
    col("ID", "id", 10),
    col("NAME", "name", 40),
    col("TO", "to", 40),
];

const COMMENT_COLUMNS: &[Column] = &[
    col("ID", "id", 12),
    col("AUTHOR", "author", 25),
    col("CREATED", "created", 12),
    col("BODY", "body", 80),
];

const USER_COLUMNS: &[Column] = &[
    col("ID", "id", 40),
    col("NAME", "name", 30),
    col("EMAIL", "email", 40),
    col("ACTIVE", "active", 6),
];

const PROJECT_COLUMNS: &[Column] = &[
    col("KEY", "key", 15),
    col("NAME", "name", 50),
    col("TYPE", "type", 15),
];

const BOARD_COLUMNS: &[Column] = &[
    col("ID", "id", 10),
    col("NAME", "name", 50),
    col("TYPE", "type", 10),
];

const SPRINT_COLUMNS: &[Column] = &[
    col("ID", "id", 10),
    col("NAME", "name", 40),
    col("STATE", "state", 10),
    col("START", "start", 12),
    col("END", "end", 12),
];

const PAGE_COLUMNS: &[Column] = &[
    col("ID", "id", 15),
    col("TITLE", "title", 80),
    col("SPACE", "space", 15),
    col("TYPE", "type", 10),
];

const SPACE_COLUMNS: &[Column] = &[
    col("KEY", "key", 15),
    col("NAME", "name", 50),
    col("TYPE", "type", 15),
];

const CHANNEL_COLUMNS: &[Column] = &[
    col("ID", "id", 15),
    col("NAME", "name", 40),
    col("MEMBERS", "members", 8),
    col("TOPIC", "topic", 60),
];

const MESSAGE_COLUMNS: &[Column] = &[
    col("ID", "id", 20),
    col("USER", "user", 15),
    col("CHANNEL", "channel", 20),
    col("TEXT", "text", 80),
];

const MERGE_REQUEST_COLUMNS: &[Column] = &[
    col("IID", "iid", 8),
    col("STATE", "state", 10),
    col("AUTHOR", "author", 20),
    col("SOURCE", "source", 30),
    col("TARGET", "target", 20),
    col("TITLE", "title", 60),
];

const PIPELINE_COLUMNS: &[Column] = &[
    col("ID", "id", 12),
    col("STATUS", "status", 12),
    col("REF", "ref", 30),
    col("SHA", "sha", 10),
];

const JOB_COLUMNS: &[Column] = &[
    col("ID", "id", 12),
    col("STAGE", "stage", 20),
    col("NAME", "name", 40),
    col("STATUS", "status", 12),
];

const BRANCH_COLUMNS: &[Column] = &[
    col("NAME", "name", 60),
    col("MERGED", "merged", 6),
    col("PROTECTED", "protected", 9),
];

const PRIORITY_COLUMNS: &[Column] = &[
    col("ID", "id", 10),
    col("NAME", "name", 30),
    col("DESCRIPTION", "description", 80),
];

const LINK_TYPE_COLUMNS: &[Column] = &[
    col("NAME", "name", 30),
    col("OUTWARD", "outward", 30),
    col("INWARD", "inward", 30),
];

const ACK_COLUMNS: &[Column] = &[
    col("ID", "id", 30),
    col("MESSAGE", "message", 80),
];

/// Table columns for `kind`.
pub fn columns(kind: EntityKind) -> &'static [Column] {
    match kind {
        EntityKind::Issue => ISSUE_COLUMNS,
        EntityKind::Transition => TRANSITION_COLUMNS,
        EntityKind::Comment => COMMENT_COLUMNS,
        EntityKind::User => USER_COLUMNS,
        EntityKind::Project => PROJECT_COLUMNS,
        EntityKind::Board => BOARD_COLUMNS,
        EntityKind::Sprint => SPRINT_COLUMNS,
        EntityKind::Page => PAGE_COLUMNS,
        EntityKind::Space => SPACE_COLUMNS,
        EntityKind::Channel => CHANNEL_COLUMNS,
        EntityKind::Message => MESSAGE_COLUMNS,
        EntityKind::MergeRequest => MERGE_REQUEST_COLUMNS,
        EntityKind::Pipeline => PIPELINE_COLUMNS,
        EntityKind::Job => JOB_COLUMNS,
        EntityKind::Branch => BRANCH_COLUMNS,
        EntityKind::Priority => PRIORITY_COLUMNS,
        EntityKind::LinkType => LINK_TYPE_COLUMNS,
        EntityKind::Ack => ACK_COLUMNS,
    }
}

/// A table cell: single-line and truncated to the column width.
pub fn cell(record: &Record, column: &Column) -> String {
    let text = match column.field {
        "created" | "start" | "end" => short_date(&record.text(column.field)),
        field => record.text(field),
    };
    truncate(&collapse_whitespace(&text), column.width)
}

/// Wraps a value as ` <open>value<close>`, or nothing when it is empty.
fn part(open: &str, value: &str, close: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        format!(" {}{}{}", open, value, close)
    }
}

/// Single-line text of a field, truncated.
fn line_text(record: &Record, field: &str, max: usize) -> String {
    truncate(&collapse_whitespace(&record.text(field)), max)
}

/// One compact line for a record of `kind`.
pub fn summary_line(record: &Record, kind: EntityKind) -> String {
    let t = |field: &str| record.text(field);
    match kind {
        EntityKind::Issue => format!(
            "{}: {}{}{}",
            t("key"),
            line_text(record, "summary", 80),
            part("[", &t("status"), "]"),
            part("@", &t("assignee"), "")
        ),
        EntityKind::Transition => format!("{}: {} -> {}", t("id"), t("name"), t("to")),
        EntityKind::Comment => format!(
            "[{}] {}: {}",
            short_date(&t("created")),
            t("author"),
            line_text(record, "body", 100)
        ),
        EntityKind::User => format!("{}{} ({})", t("name"), part("<", &t("email"), ">"), t("id")),
        EntityKind::Project => format!("{}: {}", t("key"), t("name")),
        EntityKind::Board => format!("{}: {}{}", t("id"), t("name"), part("(", &t("type"), ")")),
        EntityKind::Sprint => {
            let (start, end) = (short_date(&t("start")), short_date(&t("end")));
            let dates = if start.is_empty() && end.is_empty() {
                String::new()
            } else {
                format!(" {} ~ {}", start, end)
            };
            format!("{}: {}{}{}", t("id"), t("name"), part("[", &t("state"), "]"), dates)
        }
        EntityKind::Page => format!(
            "[{}] {}{}",
            t("id"),
            line_text(record, "title", 80),
            part("(", &t("space"), ")")
        ),
        EntityKind::Space => format!("{}: {}{}", t("key"), t("name"), part("(", &t("type"), ")")),
        EntityKind::Channel => format!(
            "#{} ({}){}",
            t("name"),
            t("id"),
            part("", &t("members"), " members")
        ),
        EntityKind::Message => format!("{} @{}: {}", t("id"), t("user"), line_text(record, "text", 100)),
        EntityKind::MergeRequest => format!(
            "!{}: {}{} {} -> {}",
            t("iid"),
            line_text(record, "title", 80),
            part("[", &t("state"), "]"),
            t("source"),
            t("target")
        ),
        EntityKind::Pipeline => format!("#{} {}{}", t("id"), t("ref"), part("[", &t("status"), "]")),
        EntityKind::Job => format!("{} {}/{}{}", t("id"), t("stage"), t("name"), part("[", &t("status"), "]")),
        EntityKind::Branch => {
            let flags: Vec<&str> = ["merged", "protected"]
                .into_iter()
                .filter(|flag| t(flag) == "true")
                .collect();
            format!("{}{}", t("name"), part("(", &flags.join(", "), ")"))
        }
        EntityKind::Priority => format!("{}: {}", t("id"), t("name")),
        EntityKind::LinkType => format!("{} ({} / {})", t("name"), t("outward"), t("inward")),
        EntityKind::Ack => format!("{}: {}", t("id"), t("message")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_summary_line() {
        let record = Record::new()
            .with("key", "PROJ-1")
            .with("summary", "Fix login\nredirect")
            .with("status", "In Progress")
            .with("assignee", "Ada");
        assert_eq!(
            summary_line(&record, EntityKind::Issue),
            "PROJ-1: Fix login redirect [In Progress] @Ada"
        );

        let unassigned = Record::new().with("key", "PROJ-2").with("summary", "Docs").with("status", "To Do");
        assert_eq!(summary_line(&unassigned, EntityKind::Issue), "PROJ-2: Docs [To Do]");
    }

    #[test]
    fn test_branch_flags() {
        let record = Record::new().with("name", "main").with("merged", false).with("protected", true);
        assert_eq!(summary_line(&record, EntityKind::Branch), "main (protected)");
        let plain = Record::new().with("name", "dev").with("merged", false).with("protected", false);
        assert_eq!(summary_line(&plain, EntityKind::Branch), "dev");
    }

    #[test]
    fn test_sprint_dates_are_shortened() {
        let record = Record::new()
            .with("id", 12)
            .with("name", "Sprint 4")
            .with("state", "active")
            .with("start", "2024-01-15T10:30:00.000Z")
            .with("end", "2024-01-29T10:30:00.000Z");
        assert_eq!(
            summary_line(&record, EntityKind::Sprint),
            "12: Sprint 4 [active] 2024-01-15 ~ 2024-01-29"
        );
    }

    #[test]
    fn test_channel_and_merge_request_lines() {
        let channel = Record::new().with("id", "C1").with("name", "ops").with("members", 42);
        assert_eq!(summary_line(&channel, EntityKind::Channel), "#ops (C1) 42 members");

        let mr = Record::new()
            .with("iid", 7)
            .with("title", "Add retries")
            .with("state", "opened")
            .with("source", "feature/retries")
            .with("target", "main");
        assert_eq!(
            summary_line(&mr, EntityKind::MergeRequest),
            "!7: Add retries [opened] feature/retries -> main"
        );
    }

    #[test]
    fn test_identity_fields() {
        assert_eq!(identity_field(EntityKind::Issue), "key");
        assert_eq!(identity_field(EntityKind::MergeRequest), "iid");
        assert_eq!(identity_field(EntityKind::Branch), "name");
        assert_eq!(identity_field(EntityKind::Message), "id");
    }

    #[test]
    fn test_every_kind_has_columns() {
        for kind in EntityKind::ALL {
            let table = columns(kind);
            assert!(!table.is_empty(), "{} has no columns", kind);
            assert!(table.iter().all(|c| c.width > 0 && !c.header.is_empty()));
        }
        assert_eq!(columns(EntityKind::Issue)[0].field, "key");
        assert_eq!(columns(EntityKind::LinkType)[0].field, identity_field(EntityKind::LinkType));
    }

    #[test]
    fn test_priority_and_link_type_lines() {
        let priority = Record::new().with("id", "2").with("name", "High");
        assert_eq!(summary_line(&priority, EntityKind::Priority), "2: High");

        let blocks = Record::new()
            .with("name", "Blocks")
            .with("outward", "blocks")
            .with("inward", "is blocked by");
        assert_eq!(
            summary_line(&blocks, EntityKind::LinkType),
            "Blocks (blocks / is blocked by)"
        );
    }

    #[test]
    fn test_cell_truncates() {
        let record = Record::new().with("summary", "x".repeat(200));
        let column = col("SUMMARY", "summary", 80);
        assert_eq!(cell(&record, &column).chars().count(), 80);
    }
}
