//
//  enterprise-cli
//  util/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Utility Module
//!
//! Text helpers shared by the service adapters and the response formatter.
//!
//! ## Categories
//!
//! - **String Utilities**: [`truncate`], [`collapse_whitespace`]
//! - **Markup Utilities**: [`html_to_text`], [`adf_to_text`], [`adf_document`]
//! - **Time Utilities**: [`short_date`], [`format_epoch`]
//!
//! ## Example
//!
//! ```rust
//! use enterprise_cli::util::{html_to_text, truncate};
//!
//! let text = html_to_text("<p>Hello <b>world</b></p>");
//! assert_eq!(text, "Hello world");
//! assert_eq!(truncate("hello world", 8), "hello...");
//! ```

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag pattern"));

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Truncates a string to a maximum number of characters, appending `...`
/// when anything was cut.
///
/// Counting is done in characters rather than bytes, so multi-byte text
/// (accented names, emoji in chat messages) never splits a code point.
///
/// # Parameters
///
/// * `s` - The string to truncate.
/// * `max_len` - The maximum number of characters in the result.
///
/// # Returns
///
/// The original string when it fits, otherwise the first `max_len - 3`
/// characters followed by `...`.
///
/// # Example
///
/// ```rust
/// use enterprise_cli::util::truncate;
///
/// assert_eq!(truncate("hello", 10), "hello");
/// assert_eq!(truncate("hello world", 8), "hello...");
/// ```
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    } else {
        s.chars().take(max_len).collect()
    }
}

/// Collapses every run of whitespace (including newlines) into one space and
/// trims both ends. Used so that multi-line text fits a single summary line.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RE.replace_all(s, " ").trim().to_string()
}

/// Converts an HTML fragment (Confluence storage or view format) into plain text.
///
/// Tags are removed, the handful of entities Confluence emits most often are
/// decoded and whitespace is collapsed.
///
/// # Parameters
///
/// * `html` - The HTML fragment.
///
/// # Returns
///
/// Plain text with single spaces between words.
pub fn html_to_text(html: &str) -> String {
    let stripped = TAG_RE.replace_all(html, " ");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    collapse_whitespace(&decoded)
}

/// Extracts the plain text of an Atlassian Document Format (ADF) value.
///
/// Jira returns descriptions and comment bodies as ADF trees. Text nodes are
/// concatenated in document order; block nodes (paragraphs, headings, list
/// items) are separated by newlines. A plain JSON string is returned as-is so
/// that older API responses still render.
///
/// # Parameters
///
/// * `node` - The ADF document or any sub-node.
///
/// # Returns
///
/// The document's text, or an empty string for `null`.
pub fn adf_to_text(node: &Value) -> String {
    let mut blocks = Vec::new();
    collect_adf_blocks(node, &mut blocks);
    blocks
        .into_iter()
        .filter(|b| !b.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_adf_blocks(node: &Value, blocks: &mut Vec<String>) {
    match node {
        Value::String(s) => blocks.push(s.clone()),
        Value::Object(map) => {
            let node_type = map.get("type").and_then(Value::as_str).unwrap_or("");
            let children = map.get("content").and_then(Value::as_array);
            match node_type {
                "text" => {
                    if let Some(text) = map.get("text").and_then(Value::as_str) {
                        push_inline(blocks, text);
                    }
                }
                "hardBreak" => push_inline(blocks, "\n"),
                "paragraph" | "heading" | "codeBlock" => {
                    blocks.push(String::new());
                    for child in children.into_iter().flatten() {
                        collect_adf_blocks(child, blocks);
                    }
                }
                _ => {
                    for child in children.into_iter().flatten() {
                        collect_adf_blocks(child, blocks);
                    }
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_adf_blocks(item, blocks);
            }
        }
        _ => {}
    }
}

fn push_inline(blocks: &mut Vec<String>, text: &str) {
    match blocks.last_mut() {
        Some(last) => last.push_str(text),
        None => blocks.push(text.to_string()),
    }
}

/// Wraps plain text into a minimal ADF document: one paragraph per line.
///
/// # Example
///
/// ```rust
/// use enterprise_cli::util::adf_document;
///
/// let doc = adf_document("Steps to reproduce");
/// assert_eq!(doc["type"], "doc");
/// assert_eq!(doc["content"][0]["content"][0]["text"], "Steps to reproduce");
/// ```
pub fn adf_document(text: &str) -> Value {
    let paragraphs: Vec<Value> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            json!({
                "type": "paragraph",
                "content": [{ "type": "text", "text": line }]
            })
        })
        .collect();

    json!({
        "type": "doc",
        "version": 1,
        "content": paragraphs
    })
}

/// Shortens an ISO-8601 timestamp to its `YYYY-MM-DD` date.
///
/// Accepts RFC 3339 (`2024-01-15T10:30:00Z`), Jira's offset form without a
/// colon (`2024-01-15T10:30:00.000+0000`) and bare dates. Anything else is
/// returned unchanged.
pub fn short_date(s: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    s.to_string()
}

/// Formats a Slack-style epoch timestamp (`"1700000000.123456"`) as a UTC
/// `YYYY-MM-DD HH:MM:SS` string. Returns `None` when the input is not numeric.
pub fn format_epoch(ts: &str) -> Option<String> {
    let secs: f64 = ts.parse().ok()?;
    let dt = DateTime::from_timestamp(secs.trunc() as i64, 0)?;
    Some(dt.format("%Y-%m-%d %H:%M:%S").to_string())
}
