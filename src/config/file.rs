//
//  enterprise-cli
//  config/file.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Configuration File I/O Module
//!
//! Low-level reading of the two files the CLI consumes. Both are read-only
//! from this crate's point of view; setting them up is the user's job.
//!
//! | File | Format | Reader |
//! |------|--------|--------|
//! | `~/.enterprise-tools/credentials.env` | `KEY=VALUE` lines | [`read_credential_file`] |
//! | `<config dir>/ent/config.toml` | TOML | [`read_config_file`] |
//!
//! ## Credential File Grammar
//!
//! ```text
//! # Jira
//! JIRA_BASE_URL=https://example.atlassian.net
//! JIRA_EMAIL="dev@example.com"
//! JIRA_API_TOKEN='abc123'
//! ```
//!
//! - Surrounding whitespace on each line, key and value is trimmed
//! - Blank lines, lines starting with `#` and lines without `=` are skipped
//! - One pair of matching single or double quotes around a value is removed
//! - A later line with the same key replaces an earlier one

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};

/// Reads a text configuration file into a string.
pub fn read_config_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file {}", path.display()))
}

/// Checks whether a configuration file exists.
pub fn config_exists(path: &Path) -> bool {
    path.is_file()
}

/// Parses credential-file content into a key/value map.
///
/// # Parameters
///
/// * `content` - The raw file content
///
/// # Returns
///
/// Every well-formed `KEY=VALUE` pair. Malformed lines are skipped silently
/// so that a stray line never hides the rest of the file.
///
/// # Example
///
/// ```rust
/// use enterprise_cli::config::parse_credential_file;
///
/// let vars = parse_credential_file("# comment\nSLACK_BOT_TOKEN=\"xoxb-1\"\nnot a pair\n");
/// assert_eq!(vars.get("SLACK_BOT_TOKEN").map(String::as_str), Some("xoxb-1"));
/// assert_eq!(vars.len(), 1);
/// ```
pub fn parse_credential_file(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        vars.insert(key.to_string(), unquote(value.trim()).to_string());
    }

    vars
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Reads and parses the credential file.
///
/// # Returns
///
/// `Ok(None)` when the file does not exist, which is not an error: the
/// environment may supply everything.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn read_credential_file(path: &Path) -> Result<Option<HashMap<String, String>>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(parse_credential_file(&content))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e)
            .with_context(|| format!("Failed to read credential file {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_skips_comments_and_malformed_lines() {
        let vars = parse_credential_file(
            "# header\n\nJIRA_EMAIL = dev@example.com \n   # indented comment\ngarbage\n=novalue\n",
        );
        assert_eq!(vars.len(), 1);
        assert_eq!(vars["JIRA_EMAIL"], "dev@example.com");
    }

    #[test]
    fn test_parse_strips_quotes_and_keeps_inner_equals() {
        let vars = parse_credential_file("A=\"quoted\"\nB='single'\nC=abc==\nD=\"\n");
        assert_eq!(vars["A"], "quoted");
        assert_eq!(vars["B"], "single");
        assert_eq!(vars["C"], "abc==");
        assert_eq!(vars["D"], "\"");
    }

    #[test]
    fn test_parse_later_duplicate_wins() {
        let vars = parse_credential_file("TOKEN=first\nTOKEN=second\n");
        assert_eq!(vars["TOKEN"], "second");
    }

    #[test]
    fn test_read_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_credential_file(&dir.path().join("absent.env")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_read_existing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "GITLAB_TOKEN=glpat-123").unwrap();
        let vars = read_credential_file(file.path()).unwrap().unwrap();
        assert_eq!(vars["GITLAB_TOKEN"], "glpat-123");
        assert!(config_exists(file.path()));
    }
}
