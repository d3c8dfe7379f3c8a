//
//  enterprise-cli
//  output/json.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # JSON Output Formatting
//!
//! The `full` format: every record as a pretty-printed JSON object, nested
//! values included, fields in the order the adapter inserted them.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`render_full`] | Pretty-printed array of records |
//! | [`render_keys`] | Identity field of each record, one per line |

use serde_json::Value;

use super::layout::identity_field;
use crate::api::common::Record;
use crate::api::operation::EntityKind;

/// Renders records as a pretty-printed JSON array. An empty slice is `[]`.
pub fn render_full(records: &[Record]) -> String {
    let array = Value::Array(
        records
            .iter()
            .map(|record| {
                Value::Object(
                    record
                        .fields()
                        .map(|(key, value)| (key.clone(), value.clone()))
                        .collect(),
                )
            })
            .collect(),
    );
    format!("{:#}", array)
}

/// Renders the identity field of each record, one per line.
pub fn render_keys(records: &[Record], kind: EntityKind) -> String {
    let field = identity_field(kind);
    records
        .iter()
        .map(|record| record.text(field))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_is_untruncated_and_ordered() {
        let long = "word ".repeat(100);
        let record = Record::new()
            .with("key", "PROJ-1")
            .with("description", long.as_str())
            .with("labels", json!(["a", "b"]));
        let rendered = render_full(&[record]);

        let parsed: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed[0]["description"], json!(long));
        assert!(rendered.find("\"key\"") < rendered.find("\"description\""));
    }

    #[test]
    fn test_empty_full_is_empty_array() {
        assert_eq!(render_full(&[]), "[]");
    }

    #[test]
    fn test_keys_keep_order() {
        let records = vec![
            Record::new().with("key", "PROJ-2"),
            Record::new().with("key", "PROJ-1"),
        ];
        assert_eq!(render_keys(&records, EntityKind::Issue), "PROJ-2\nPROJ-1");
    }
}
