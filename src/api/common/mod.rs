//
//  enterprise-cli
//  api/common/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Common API Types for all four services
//!
//! This module provides the types shared by the HTTP client, the pagination
//! engine and every service adapter. Nothing in here knows about a specific
//! service's wire format.
//!
//! # Overview
//!
//! - [`Service`] - Which SaaS product an operation targets
//! - [`ApiError`] - The error taxonomy every failure is classified into
//! - [`ApiRequest`] - A stateless description of one HTTP request
//! - [`ApiResponse`] - The raw outcome of a successful request
//! - [`Record`] - A normalized, ordered entity independent of the native schema
//! - Pagination types (re-exported from [`pagination`] submodule)
//!
//! # Example
//!
//! ```rust
//! use enterprise_cli::api::common::{ApiError, ClientErrorKind};
//!
//! fn describe(result: Result<(), ApiError>) -> i32 {
//!     match result {
//!         Ok(()) => 0,
//!         Err(e) => e.exit_code(),
//!     }
//! }
//!
//! let missing = ApiError::client(ClientErrorKind::NotFound, "Issue does not exist");
//! assert_eq!(describe(Err(missing)), 2);
//! ```

use std::fmt;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::exit_codes;

mod pagination;

pub use pagination::*;

/// The four services reachable through this CLI.
///
/// # Variants
///
/// | Variant | Product | Auth scheme |
/// |---------|---------|-------------|
/// | `Jira` | Issue tracker | Basic (email + API token) |
/// | `Confluence` | Wiki | Basic (email + API token) |
/// | `Slack` | Messaging | Bearer (bot token) |
/// | `Gitlab` | Forge / CI | Bearer (personal access token) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Service {
    /// Jira Cloud REST v3 and Agile v1.0
    Jira,
    /// Confluence Cloud REST API
    Confluence,
    /// Slack Web API
    Slack,
    /// GitLab REST v4
    Gitlab,
}

impl Service {
    /// Every service, in the order `doctor` checks them.
    pub const ALL: [Service; 4] = [
        Service::Jira,
        Service::Confluence,
        Service::Slack,
        Service::Gitlab,
    ];

    /// Lowercase service name as used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Jira => "jira",
            Self::Confluence => "confluence",
            Self::Slack => "slack",
            Self::Gitlab => "gitlab",
        }
    }

    /// Human-readable product name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Jira => "Jira",
            Self::Confluence => "Confluence",
            Self::Slack => "Slack",
            Self::Gitlab => "GitLab",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Sub-classification of a [`ApiError::Client`] failure.
///
/// `Unauthorized` is split out because it maps to the credential exit code
/// rather than the generic request-error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    /// 400, or a request the service rejected as malformed (bad JQL/CQL)
    BadRequest,
    /// 401, or a messaging-service auth error code
    Unauthorized,
    /// 403
    Forbidden,
    /// 404, or an entity the adapter could not locate
    NotFound,
    /// 409, or a state change that is not currently available
    Conflict,
    /// Any other 4xx
    Rejected,
}

impl ClientErrorKind {
    /// Maps a 4xx status code (other than 429) to its kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 | 410 => Self::NotFound,
            409 => Self::Conflict,
            _ => Self::Rejected,
        }
    }
}

impl fmt::Display for ClientErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BadRequest => "Bad request",
            Self::Unauthorized => "Authentication failed",
            Self::Forbidden => "Permission denied",
            Self::NotFound => "Not found",
            Self::Conflict => "Conflict",
            Self::Rejected => "Request rejected",
        };
        f.write_str(label)
    }
}

/// Unified error type for every operation in the CLI.
///
/// Each failure is classified exactly once, at the layer that observes it,
/// and carries enough context to be reported without re-inspection.
///
/// # Variants
///
/// | Variant | Raised by | Retried | Exit code |
/// |---------|-----------|---------|-----------|
/// | `CredentialMissing` | credential resolver | never | 1 |
/// | `Validation` | operation validation | never | 2 |
/// | `Client` | HTTP client / adapters | never | 1 (`Unauthorized`) or 2 |
/// | `RateLimited` | HTTP client (429) | yes | 3 |
/// | `Server` | HTTP client (5xx) | yes | 3 |
/// | `Network` | HTTP client (connect/timeout) | yes | 3 |
/// | `Decode` | adapters (unexpected 2xx body) | never | 3 |
/// | `Context` | adapters (wraps another error) | inherited | inherited |
///
/// # Example
///
/// ```rust
/// use enterprise_cli::api::common::{ApiError, ClientErrorKind};
///
/// let err = ApiError::client(ClientErrorKind::NotFound, "Issue does not exist")
///     .with_context("get NOPE-999");
///
/// assert!(err.is_not_found());
/// assert_eq!(err.exit_code(), 2);
/// assert_eq!(err.to_string(), "get NOPE-999: Not found: Issue does not exist");
/// ```
#[derive(Error, Debug)]
pub enum ApiError {
    /// No source supplied the minimum credential fields for a service.
    ///
    /// # Parameters
    ///
    /// - `service` - The service whose credentials were requested
    /// - `missing` - Names of the keys that no source supplied
    #[error("{service} credentials are not configured (missing {})", .missing.join(", "))]
    CredentialMissing {
        /// The service whose credentials were requested
        service: Service,
        /// Keys absent from every source
        missing: Vec<String>,
    },

    /// Malformed operation input, detected before any network call.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A terminal 4xx failure (other than 429), or an equivalent condition an
    /// adapter detected itself (unknown channel, unavailable transition).
    #[error("{kind}: {message}")]
    Client {
        /// HTTP status when the failure came from a response
        status: Option<u16>,
        /// Sub-classification
        kind: ClientErrorKind,
        /// The service's own explanation
        message: String,
    },

    /// 429 responses persisted through every attempt.
    #[error("Rate limit exceeded after {attempts} attempt(s)")]
    RateLimited {
        /// Attempts made before giving up
        attempts: u32,
        /// The last retry-after hint the service sent
        retry_after: Option<Duration>,
    },

    /// 5xx responses persisted through every attempt.
    #[error("Server error ({status}) after {attempts} attempt(s): {message}")]
    Server {
        /// The last 5xx status observed
        status: u16,
        /// Attempts made before giving up
        attempts: u32,
        /// Message extracted from the last response body
        message: String,
    },

    /// Connection failures or timeouts persisted through every attempt.
    #[error("Network failure after {attempts} attempt(s): {message}")]
    Network {
        /// Attempts made before giving up
        attempts: u32,
        /// Description of the last transport error
        message: String,
    },

    /// A successful response whose body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Another error, annotated with the operation that produced it.
    #[error("{context}: {inner}")]
    Context {
        /// Verb plus entity key or query
        context: String,
        /// The classified failure
        inner: Box<ApiError>,
    },
}

impl ApiError {
    /// Creates a [`ApiError::Client`] without an HTTP status.
    pub fn client(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self::Client {
            status: None,
            kind,
            message: message.into(),
        }
    }

    /// Creates a not-found [`ApiError::Client`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::client(ClientErrorKind::NotFound, message)
    }

    /// Creates a [`ApiError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Wraps this error with the identifying context of the operation
    /// (verb, entity key or query).
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            inner: Box::new(self),
        }
    }

    /// Returns the innermost classified error, looking through any
    /// [`ApiError::Context`] layers.
    pub fn root(&self) -> &ApiError {
        match self {
            Self::Context { inner, .. } => inner.root(),
            other => other,
        }
    }

    /// Whether the HTTP client may retry after this failure.
    ///
    /// Only rate limiting, server errors and network failures are transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.root(),
            Self::RateLimited { .. } | Self::Server { .. } | Self::Network { .. }
        )
    }

    /// Whether this is a client error classified as not-found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.root(),
            Self::Client {
                kind: ClientErrorKind::NotFound,
                ..
            }
        )
    }

    /// The stable process exit code for this failure.
    ///
    /// # Returns
    ///
    /// | Code | Errors |
    /// |------|--------|
    /// | `1` | `CredentialMissing`, `Client` with kind `Unauthorized` |
    /// | `2` | `Validation`, any other `Client` |
    /// | `3` | `RateLimited`, `Server`, `Network`, `Decode` |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Context { inner, .. } => inner.exit_code(),
            Self::CredentialMissing { .. } => exit_codes::AUTH_ERROR,
            Self::Client {
                kind: ClientErrorKind::Unauthorized,
                ..
            } => exit_codes::AUTH_ERROR,
            Self::Validation(_) | Self::Client { .. } => exit_codes::REQUEST_ERROR,
            Self::RateLimited { .. }
            | Self::Server { .. }
            | Self::Network { .. }
            | Self::Decode(_) => exit_codes::NETWORK_ERROR,
        }
    }
}

/// Extracts a human-readable message from a service's JSON error body.
///
/// The four services report errors in different shapes:
///
/// ```json
/// {"errorMessages": ["Issue does not exist"], "errors": {}}      // Jira
/// {"errors": {"summary": "You must specify a summary"}}          // Jira field errors
/// {"message": "Page not found", "statusCode": 404}               // Confluence
/// {"message": "404 Project Not Found"}                           // GitLab
/// {"message": {"title": ["can't be blank"]}}                     // GitLab validation
/// {"error": "invalid_token", "error_description": "expired"}    // GitLab OAuth
/// {"ok": false, "error": "channel_not_found"}                    // Slack
/// ```
///
/// If none match, the trimmed raw body (or the status line when empty) is used.
pub fn extract_error_message(status: u16, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(messages) = json.get("errorMessages").and_then(Value::as_array) {
            let joined: Vec<&str> = messages.iter().filter_map(Value::as_str).collect();
            if !joined.is_empty() {
                return joined.join("; ");
            }
        }

        if let Some(errors) = json.get("errors").and_then(Value::as_object) {
            let joined: Vec<String> = errors
                .iter()
                .map(|(field, msg)| format!("{}: {}", field, value_text(msg)))
                .collect();
            if !joined.is_empty() {
                return joined.join("; ");
            }
        }

        match json.get("message") {
            Some(Value::String(message)) => return message.clone(),
            Some(Value::Object(fields)) => {
                let joined: Vec<String> = fields
                    .iter()
                    .map(|(field, msg)| format!("{}: {}", field, value_text(msg)))
                    .collect();
                return joined.join("; ");
            }
            _ => {}
        }

        if let Some(error) = json.get("error").and_then(Value::as_str) {
            return match json.get("error_description").and_then(Value::as_str) {
                Some(description) => format!("{}: {}", error, description),
                None => error.to_string(),
            };
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status)
    } else {
        crate::util::truncate(trimmed, 300)
    }
}

/// Renders a JSON value as display text: strings unquoted, scalars via
/// `to_string`, arrays joined with `, `, `null` as empty.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// Builds an endpoint URL by appending path segments to a base URL.
///
/// Each segment is percent-encoded on its own, so a GitLab project path such
/// as `group/project` becomes the single segment `group%2Fproject`.
///
/// # Example
///
/// ```rust
/// use enterprise_cli::api::common::endpoint;
/// use url::Url;
///
/// let base = Url::parse("https://gitlab.example.com/").unwrap();
/// let url = endpoint(&base, &["api", "v4", "projects", "group/project"]);
/// assert_eq!(url.as_str(), "https://gitlab.example.com/api/v4/projects/group%2Fproject");
/// ```
pub fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty();
        path.extend(segments);
    }
    url
}

/// Inspects a 2xx response for a failure reported in the body.
///
/// Services such as Slack answer `200 OK` with an error payload. A check
/// lets the HTTP client classify those before deciding whether to retry.
#[derive(Clone, Copy)]
pub struct BodyCheck(pub fn(&ApiResponse) -> Result<(), ApiError>);

impl fmt::Debug for BodyCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BodyCheck")
    }
}

/// A stateless description of one HTTP request.
///
/// Adapters build these; the HTTP client executes them, applying the
/// credential's auth header on every attempt. Requests are cloned freely,
/// which is how the pagination engine derives one request per page.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL including query parameters
    pub url: Url,
    /// Extra headers (the auth header is not stored here)
    pub headers: Vec<(String, String)>,
    /// Optional JSON body
    pub body: Option<Value>,
    /// Whether a transport failure after the connection was established may
    /// be retried. `false` for `POST` and `PATCH` unless marked otherwise.
    pub replayable: bool,
    /// Check applied to every 2xx response before it counts as a success
    pub body_check: Option<BodyCheck>,
}

impl ApiRequest {
    /// Creates a request with no body and no extra headers.
    pub fn new(method: Method, url: Url) -> Self {
        let replayable = method != Method::POST && method != Method::PATCH;
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
            replayable,
            body_check: None,
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Shorthand for a `POST` request.
    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    /// Shorthand for a `PUT` request.
    pub fn put(url: Url) -> Self {
        Self::new(Method::PUT, url)
    }

    /// Appends a query parameter.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.url.query_pairs_mut().append_pair(key, &value.to_string());
        self
    }

    /// Appends a query parameter only when a value is present.
    pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    /// Replaces (or sets) a query parameter, keeping every other pair in order.
    pub fn set_query(mut self, key: &str, value: impl ToString) -> Self {
        let pairs: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(k, _)| k != key)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        {
            let mut query = self.url.query_pairs_mut();
            query.clear();
            for (k, v) in &pairs {
                query.append_pair(k, v);
            }
            query.append_pair(key, &value.to_string());
        }
        self
    }

    /// Sets the JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds an extra header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Marks a `POST` that only reads (a search, an identity check) as safe
    /// to resend after a dropped connection.
    pub fn replayable(mut self) -> Self {
        self.replayable = true;
        self
    }

    /// Sets the check run against each 2xx response.
    pub fn check_body(mut self, check: BodyCheck) -> Self {
        self.body_check = Some(check);
        self
    }

    /// `METHOD scheme://host/path` for log lines. The query string is left
    /// out so free-text queries are not echoed at debug level.
    pub fn describe(&self) -> String {
        let mut url = self.url.clone();
        url.set_query(None);
        format!("{} {}", self.method, url)
    }
}

/// The raw result of a request that completed with a 2xx status.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw response body
    pub body: String,
    /// How many attempts the HTTP client made to obtain this response
    pub attempts: u32,
}

impl ApiResponse {
    /// Parses the body as JSON. An empty body (e.g. `204 No Content`) is `null`.
    pub fn json(&self) -> Result<Value, ApiError> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&self.body)
            .map_err(|e| ApiError::Decode(format!("invalid JSON body: {}", e)))
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A normalized representation of one remote entity.
///
/// Records are ordered maps from field name to JSON value. Adapters build
/// them from native payloads; the formatter only ever sees records. Field
/// order is insertion order, which is also the order of the `full` output.
///
/// # Example
///
/// ```rust
/// use enterprise_cli::api::common::Record;
///
/// let record = Record::new()
///     .with("key", "PROJ-1")
///     .with("summary", "Fix login")
///     .with("labels", vec!["auth", "urgent"]);
///
/// assert_eq!(record.text("key"), "PROJ-1");
/// assert_eq!(record.text("labels"), "auth, urgent");
/// assert_eq!(record.text("missing"), "");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Inserts a field, replacing any previous value.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Returns a field's raw value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns a field's display text (see [`value_text`]); missing fields are empty.
    pub fn text(&self, key: &str) -> String {
        self.0.get(key).map(value_text).unwrap_or_default()
    }

    /// Iterates over fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Reads a string at a JSON pointer, returning an empty string when absent
/// or not a string. Numbers are stringified.
pub fn str_at(value: &Value, pointer: &str) -> String {
    match value.pointer(pointer) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Reads the value at a JSON pointer, or `null`.
pub fn value_at(value: &Value, pointer: &str) -> Value {
    value.pointer(pointer).cloned().unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exit_codes_by_variant() {
        let missing = ApiError::CredentialMissing {
            service: Service::Jira,
            missing: vec!["JIRA_API_TOKEN".to_string()],
        };
        assert_eq!(missing.exit_code(), 1);
        assert_eq!(ApiError::validation("bad").exit_code(), 2);
        assert_eq!(ApiError::not_found("gone").exit_code(), 2);
        assert_eq!(
            ApiError::client(ClientErrorKind::Unauthorized, "bad token").exit_code(),
            1
        );
        assert_eq!(
            ApiError::RateLimited {
                attempts: 3,
                retry_after: None
            }
            .exit_code(),
            3
        );
        assert_eq!(
            ApiError::Network {
                attempts: 3,
                message: "timed out".into()
            }
            .exit_code(),
            3
        );
    }

    #[test]
    fn test_context_is_transparent_for_classification() {
        let err = ApiError::Server {
            status: 503,
            attempts: 3,
            message: "unavailable".into(),
        }
        .with_context("search project = X");

        assert!(err.is_retryable());
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().starts_with("search project = X: Server error (503)"));
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        assert!(!ApiError::not_found("x").is_retryable());
        assert!(!ApiError::validation("x").is_retryable());
    }

    #[test]
    fn test_credential_missing_message() {
        let err = ApiError::CredentialMissing {
            service: Service::Confluence,
            missing: vec!["CONFLUENCE_EMAIL".into(), "CONFLUENCE_API_TOKEN".into()],
        };
        assert_eq!(
            err.to_string(),
            "Confluence credentials are not configured (missing CONFLUENCE_EMAIL, CONFLUENCE_API_TOKEN)"
        );
    }

    #[test]
    fn test_extract_error_message_shapes() {
        assert_eq!(
            extract_error_message(404, r#"{"errorMessages":["Issue does not exist"],"errors":{}}"#),
            "Issue does not exist"
        );
        assert_eq!(
            extract_error_message(400, r#"{"errorMessages":[],"errors":{"summary":"required"}}"#),
            "summary: required"
        );
        assert_eq!(
            extract_error_message(404, r#"{"message":"404 Project Not Found"}"#),
            "404 Project Not Found"
        );
        assert_eq!(
            extract_error_message(200, r#"{"ok":false,"error":"channel_not_found"}"#),
            "channel_not_found"
        );
        assert_eq!(extract_error_message(502, "  "), "HTTP 502");
        assert_eq!(extract_error_message(502, "Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let base = Url::parse("https://example.atlassian.net").unwrap();
        let url = endpoint(&base, &["rest", "api", "3", "issue", "PROJ-1"]);
        assert_eq!(url.as_str(), "https://example.atlassian.net/rest/api/3/issue/PROJ-1");

        let nested = Url::parse("https://git.example.com/gitlab/").unwrap();
        let url = endpoint(&nested, &["api", "v4", "projects", "a/b"]);
        assert_eq!(url.as_str(), "https://git.example.com/gitlab/api/v4/projects/a%2Fb");
    }

    #[test]
    fn test_request_set_query_replaces_value() {
        let url = Url::parse("https://example.com/items").unwrap();
        let request = ApiRequest::get(url)
            .query("limit", 10)
            .query("start", 0)
            .set_query("start", 10);
        assert_eq!(request.url.query(), Some("limit=10&start=10"));
        assert_eq!(request.describe(), "GET https://example.com/items");
    }

    #[test]
    fn test_record_preserves_field_order() {
        let record = Record::new()
            .with("zeta", 1)
            .with("alpha", json!({"nested": true}));
        let keys: Vec<&String> = record.fields().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(record.text("zeta"), "1");
    }

    #[test]
    fn test_str_at() {
        let value = json!({"fields": {"status": {"name": "Done"}, "count": 3}});
        assert_eq!(str_at(&value, "/fields/status/name"), "Done");
        assert_eq!(str_at(&value, "/fields/count"), "3");
        assert_eq!(str_at(&value, "/fields/assignee/displayName"), "");
    }
}
