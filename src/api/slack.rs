//
//  enterprise-cli
//  api/slack.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Slack Adapter
//!
//! Slack Web API methods (`https://slack.com/api/<method>`) with a bot token.
//!
//! Slack answers most failures with HTTP 200 and `{"ok": false, "error": "<code>"}`,
//! so every response body goes through [`check_ok`] before it is used:
//!
//! | Error code | Classified as |
//! |------------|---------------|
//! | `*_not_found` | `Client` / `NotFound` |
//! | `invalid_auth`, `not_authed`, `token_revoked`, `account_inactive` | `Client` / `Unauthorized` |
//! | `missing_scope`, `not_in_channel`, `restricted_action` | `Client` / `Forbidden` |
//! | `ratelimited` | `RateLimited` |
//! | anything else | `Client` / `BadRequest` |
//!
//! Channel and user names are resolved to IDs by walking the paginated
//! `conversations.list` / `users.list` until a match is found.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::adapter::{ack, single, Connection, Outcome, ServiceAdapter};
use super::common::{
    str_at, value_at, ApiError, ApiRequest, ApiResponse, BodyCheck, ClientErrorKind, Page,
    PageCursor, PageSource, Paginator, Record, Service,
};
use super::operation::{EntityKind, Operation, Verb};
use super::retry::parse_retry_after;
use crate::util::format_epoch;

static CHANNEL_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[CGD][A-Z0-9]{8,}$").expect("valid channel id pattern"));

static USER_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[UW][A-Z0-9]{8,}$").expect("valid user id pattern"));

/// Page size used while resolving names; the Web API allows up to 1000.
const RESOLVE_PAGE_SIZE: u32 = 200;

const CHANNEL_TYPES: &str = "public_channel,private_channel";

/// Adapter for the Slack Web API.
pub struct SlackAdapter {
    conn: Connection,
}

impl SlackAdapter {
    /// Creates the adapter over an established connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    fn method(&self, name: &str) -> ApiRequest {
        ApiRequest::get(self.conn.url(&[name])).check_body(OK_FLAG)
    }

    fn post(&self, name: &str) -> ApiRequest {
        ApiRequest::post(self.conn.url(&[name])).check_body(OK_FLAG)
    }

    /// Executes a Web API call and checks its `ok` flag.
    async fn call(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let response = self.conn.send(request).await?;
        check_ok(&response)
    }

    async fn run<'a>(&'a self, op: &Operation) -> Result<Outcome<'a>, ApiError> {
        match (op.verb, op.entity) {
            (Verb::Send, EntityKind::Message) => Ok(single(EntityKind::Ack, self.send(op).await?)),
            (Verb::List, EntityKind::Channel) => {
                let source = SlackListing {
                    request: self.channel_list_request(),
                    items: "channels",
                    channel: String::new(),
                    project: |channel, _| channel_record(channel),
                };
                Ok(self.conn.listing(op, EntityKind::Channel, source, Some(100)))
            }
            (Verb::List, EntityKind::Message) => {
                let channel = self.resolve_channel(&op.require("channel")?).await?;
                let source = SlackListing {
                    request: self.method("conversations.history").query("channel", &channel),
                    items: "messages",
                    channel,
                    project: message_record,
                };
                Ok(self.conn.listing(op, EntityKind::Message, source, Some(20)))
            }
            (Verb::Search, EntityKind::Message) => {
                let mut query = op.require("query")?;
                if let Some(channel) = op.str("in_channel") {
                    query = format!("in:#{} {}", channel.trim_start_matches('#'), query);
                }
                let limit = self.conn.listing_limit(op, Some(20));
                let source = SearchListing {
                    request: self.method("search.messages").query("query", query),
                    per_page: self.conn.page_size.min(limit.max(1) as u32),
                };
                Ok(self.conn.listing(op, EntityKind::Message, source, Some(20)))
            }
            (verb, entity) => Err(ApiError::validation(format!(
                "Slack does not support '{} {}'",
                verb, entity
            ))),
        }
    }

    async fn send(&self, op: &Operation) -> Result<Record, ApiError> {
        let text = op.require("message")?;
        let (channel, destination) = match (op.str("channel"), op.str("user")) {
            (Some(channel), None) => (self.resolve_channel(channel).await?, channel.to_string()),
            (None, Some(user)) => (self.open_direct(user).await?, user.to_string()),
            _ => {
                return Err(ApiError::validation(
                    "exactly one of '--channel', '--user' is required",
                ))
            }
        };

        let mut payload = Map::new();
        payload.insert("channel".into(), json!(channel));
        payload.insert("text".into(), json!(text));
        if let Some(thread) = op.str("thread_ts") {
            payload.insert("thread_ts".into(), json!(thread));
        }
        if let Some(raw) = op.text("blocks") {
            let blocks: Value = serde_json::from_str(&raw)
                .map_err(|e| ApiError::validation(format!("'--blocks' is not valid JSON: {}", e)))?;
            if !blocks.is_array() {
                return Err(ApiError::validation("'--blocks' must be a JSON array"));
            }
            payload.insert("blocks".into(), blocks);
        }

        let posted = self
            .call(self.post("chat.postMessage").json(Value::Object(payload)))
            .await?;
        let channel = match str_at(&posted, "/channel") {
            c if c.is_empty() => channel,
            c => c,
        };
        Ok(ack(str_at(&posted, "/ts"), format!("Message sent to {}", destination)).with("channel", channel))
    }

    fn channel_list_request(&self) -> ApiRequest {
        self.method("conversations.list")
            .query("types", CHANNEL_TYPES)
            .query("exclude_archived", true)
    }

    /// Resolves `#name`, `name` or an ID to a channel ID.
    async fn resolve_channel(&self, channel: &str) -> Result<String, ApiError> {
        if CHANNEL_ID_RE.is_match(channel) {
            return Ok(channel.to_string());
        }
        let name = channel.trim_start_matches('#');
        let source = SlackListing {
            request: self.channel_list_request(),
            items: "channels",
            channel: String::new(),
            project: |channel, _| channel_record(channel),
        };

        let mut channels = Paginator::new(&self.conn.client, source, RESOLVE_PAGE_SIZE);
        while let Some(record) = channels.next().await? {
            if record.text("name") == name {
                debug!(channel = name, pages = channels.pages_fetched(), "Resolved channel");
                return Ok(record.text("id"));
            }
        }
        Err(ApiError::not_found(format!("channel '#{}' not found", name)))
    }

    /// Resolves `@name`, a display name or an ID to a user ID.
    async fn resolve_user(&self, user: &str) -> Result<String, ApiError> {
        if USER_ID_RE.is_match(user) {
            return Ok(user.to_string());
        }
        let name = user.trim_start_matches('@').to_lowercase();
        let source = SlackListing {
            request: self.method("users.list"),
            items: "members",
            channel: String::new(),
            project: |member, _| user_record(member),
        };

        let mut members = Paginator::new(&self.conn.client, source, RESOLVE_PAGE_SIZE);
        while let Some(record) = members.next().await? {
            let matches = ["name", "display_name", "real_name"]
                .iter()
                .any(|field| record.text(field).to_lowercase() == name);
            if matches {
                return Ok(record.text("id"));
            }
        }
        Err(ApiError::not_found(format!("user '@{}' not found", name)))
    }

    async fn open_direct(&self, user: &str) -> Result<String, ApiError> {
        let user_id = self.resolve_user(user).await?;
        let opened = self
            .call(self.post("conversations.open").json(json!({ "users": user_id })).replayable())
            .await?;
        match str_at(&opened, "/channel/id") {
            id if id.is_empty() => Err(ApiError::Decode("conversations.open returned no channel".into())),
            id => Ok(id),
        }
    }
}

#[async_trait]
impl ServiceAdapter for SlackAdapter {
    fn service(&self) -> Service {
        Service::Slack
    }

    async fn perform<'a>(&'a self, op: &Operation) -> Result<Outcome<'a>, ApiError> {
        self.run(op).await.map_err(|e| e.with_context(op.describe()))
    }

    async fn check(&self) -> Result<Record, ApiError> {
        let identity = self.call(self.post("auth.test").replayable()).await?;
        Ok(Record::new()
            .with("id", str_at(&identity, "/user_id"))
            .with("name", str_at(&identity, "/user"))
            .with("team", str_at(&identity, "/team"))
            .with("url", str_at(&identity, "/url")))
    }
}

/// Lets the HTTP client retry `"ok": false, "error": "ratelimited"` answers.
const OK_FLAG: BodyCheck = BodyCheck(ok_flag);

fn ok_flag(response: &ApiResponse) -> Result<(), ApiError> {
    check_ok(response).map(|_| ())
}

/// Parses a Web API response and fails on `"ok": false`.
fn check_ok(response: &ApiResponse) -> Result<Value, ApiError> {
    let body = response.json()?;
    if body.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(body);
    }
    let code = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown_error");
    match classify_error(code, &body, response.attempts) {
        ApiError::RateLimited { attempts, .. } => Err(ApiError::RateLimited {
            attempts,
            retry_after: response.header("retry-after").and_then(parse_retry_after),
        }),
        other => Err(other),
    }
}

/// Maps a Slack error code onto the error taxonomy.
fn classify_error(code: &str, body: &Value, attempts: u32) -> ApiError {
    let kind = match code {
        "ratelimited" => {
            return ApiError::RateLimited {
                attempts,
                retry_after: None,
            }
        }
        c if c.ends_with("_not_found") => ClientErrorKind::NotFound,
        "invalid_auth" | "not_authed" | "token_revoked" | "account_inactive" => {
            ClientErrorKind::Unauthorized
        }
        "missing_scope" | "not_in_channel" | "restricted_action" => ClientErrorKind::Forbidden,
        _ => ClientErrorKind::BadRequest,
    };
    let message = match body.get("needed").and_then(Value::as_str) {
        Some(scope) => format!("{} (needs {})", code, scope),
        None => code.to_string(),
    };
    ApiError::client(kind, message)
}

/// `conversations.*` and `users.list` listings, continued by
/// `response_metadata.next_cursor`.
struct SlackListing {
    request: ApiRequest,
    items: &'static str,
    /// Channel ID stamped onto message records
    channel: String,
    project: fn(&Value, &str) -> Record,
}

impl PageSource for SlackListing {
    fn request(&self, cursor: Option<&PageCursor>, page_size: u32) -> ApiRequest {
        let request = self.request.clone().set_query("limit", page_size);
        match cursor {
            Some(PageCursor::Token(token)) => request.set_query("cursor", token),
            _ => request,
        }
    }

    fn extract(&self, response: &ApiResponse, _: Option<&PageCursor>) -> Result<Page, ApiError> {
        let body = check_ok(response)?;
        let records = body
            .get(self.items)
            .and_then(Value::as_array)
            .ok_or_else(|| ApiError::Decode(format!("response has no '{}' array", self.items)))?
            .iter()
            .map(|item| (self.project)(item, &self.channel))
            .collect();
        let next = body
            .pointer("/response_metadata/next_cursor")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .map(|c| PageCursor::Token(c.to_string()));
        Ok(Page::new(records, next))
    }

    fn stops_on_short_page(&self) -> bool {
        false
    }
}

/// `search.messages`, continued by page number.
struct SearchListing {
    request: ApiRequest,
    /// Fixed so that page numbers keep addressing the same slices
    per_page: u32,
}

impl PageSource for SearchListing {
    fn request(&self, cursor: Option<&PageCursor>, _: u32) -> ApiRequest {
        let page = match cursor {
            Some(PageCursor::Page(page)) => *page,
            _ => 1,
        };
        self.request
            .clone()
            .set_query("count", self.per_page)
            .set_query("page", page)
    }

    fn extract(&self, response: &ApiResponse, _: Option<&PageCursor>) -> Result<Page, ApiError> {
        let body = check_ok(response)?;
        let records = body
            .pointer("/messages/matches")
            .and_then(Value::as_array)
            .ok_or_else(|| ApiError::Decode("response has no 'messages.matches' array".into()))?
            .iter()
            .map(search_record)
            .collect();
        let page = body.pointer("/messages/paging/page").and_then(Value::as_u64).unwrap_or(1);
        let pages = body.pointer("/messages/paging/pages").and_then(Value::as_u64).unwrap_or(1);
        let next = (page < pages).then_some(PageCursor::Page(page + 1));
        Ok(Page::new(records, next))
    }
}

fn channel_record(channel: &Value) -> Record {
    Record::new()
        .with("id", str_at(channel, "/id"))
        .with("name", str_at(channel, "/name"))
        .with("members", value_at(channel, "/num_members"))
        .with("topic", str_at(channel, "/topic/value"))
        .with("purpose", str_at(channel, "/purpose/value"))
        .with("private", channel.get("is_private").and_then(Value::as_bool).unwrap_or(false))
}

fn user_record(member: &Value) -> Record {
    Record::new()
        .with("id", str_at(member, "/id"))
        .with("name", str_at(member, "/name"))
        .with("display_name", str_at(member, "/profile/display_name"))
        .with("real_name", str_at(member, "/real_name"))
}

fn author(message: &Value) -> String {
    ["/user", "/username", "/bot_id"]
        .iter()
        .map(|p| str_at(message, p))
        .find(|a| !a.is_empty())
        .unwrap_or_else(|| "bot".to_string())
}

fn message_record(message: &Value, channel: &str) -> Record {
    let ts = str_at(message, "/ts");
    Record::new()
        .with("id", ts.as_str())
        .with("user", author(message))
        .with("channel", channel)
        .with("text", str_at(message, "/text"))
        .with("time", format_epoch(&ts).unwrap_or_default())
        .with("thread_ts", str_at(message, "/thread_ts"))
        .with("replies", value_at(message, "/reply_count"))
}

fn search_record(found: &Value) -> Record {
    let ts = str_at(found, "/ts");
    Record::new()
        .with("id", ts.as_str())
        .with("user", author(found))
        .with("channel", str_at(found, "/channel/name"))
        .with("text", str_at(found, "/text"))
        .with("time", format_epoch(&ts).unwrap_or_default())
        .with("permalink", str_at(found, "/permalink"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::adapter::test_connection;
    use crate::api::client::HttpClient;
    use crate::api::retry::RetryPolicy;
    use crate::auth::AuthMaterial;
    use mockito::{Matcher, Server, ServerGuard};
    use std::time::Duration;

    fn adapter(server: &ServerGuard, page_size: u32) -> SlackAdapter {
        SlackAdapter::new(test_connection(Service::Slack, &server.url(), page_size))
    }

    /// An adapter whose client retries up to `max_attempts` times with 1ms backoff.
    fn retrying_adapter(server: &ServerGuard, max_attempts: u32) -> SlackAdapter {
        let mut conn = test_connection(Service::Slack, &server.url(), 50);
        let policy = RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(5),
        };
        conn.client = HttpClient::new(AuthMaterial::bearer("test-token"), Duration::from_secs(5), policy).unwrap();
        SlackAdapter::new(conn)
    }

    fn send_op() -> Operation {
        Operation::new(Service::Slack, Verb::Send, EntityKind::Message).with("message", "Deploy finished")
    }

    async fn records(adapter: &SlackAdapter, op: &Operation) -> Result<Vec<Record>, ApiError> {
        adapter.perform(op).await?.into_records().await
    }

    #[tokio::test]
    async fn test_send_resolves_channel_across_pages() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/conversations.list")
            .match_query(Matcher::Regex("limit=200$".into()))
            .with_status(200)
            .with_body(
                json!({
                    "ok": true,
                    "channels": [{ "id": "C00000001", "name": "general" }],
                    "response_metadata": { "next_cursor": "dGVhbTpD" }
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/conversations.list")
            .match_query(Matcher::UrlEncoded("cursor".into(), "dGVhbTpD".into()))
            .with_status(200)
            .with_body(
                json!({
                    "ok": true,
                    "channels": [{ "id": "C00000002", "name": "deploys" }],
                    "response_metadata": { "next_cursor": "" }
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        let post = server
            .mock("POST", "/chat.postMessage")
            .match_header("authorization", "Bearer test-token")
            .match_body(Matcher::Json(json!({ "channel": "C00000002", "text": "Deploy finished" })))
            .with_status(200)
            .with_body(r#"{"ok":true,"channel":"C00000002","ts":"1700000000.000100"}"#)
            .expect(1)
            .create_async()
            .await;

        let slack = adapter(&server, 50);
        let result = records(&slack, &send_op().with("channel", "#deploys")).await.unwrap();

        assert_eq!(result[0].text("id"), "1700000000.000100");
        assert_eq!(result[0].text("channel"), "C00000002");
        first.assert_async().await;
        second.assert_async().await;
        post.assert_async().await;
    }

    #[tokio::test]
    async fn test_unknown_channel_posts_nothing() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/conversations.list")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"ok":true,"channels":[],"response_metadata":{"next_cursor":""}}"#)
            .create_async()
            .await;
        let post = server
            .mock("POST", "/chat.postMessage")
            .expect(0)
            .create_async()
            .await;

        let slack = adapter(&server, 50);
        let err = records(&slack, &send_op().with("channel", "nowhere")).await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.exit_code(), 2);
        post.assert_async().await;
    }

    #[tokio::test]
    async fn test_ok_false_codes_are_classified() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat.postMessage")
            .with_status(200)
            .with_body(r#"{"ok":false,"error":"invalid_auth"}"#)
            .create_async()
            .await;

        let slack = adapter(&server, 50);
        let err = records(&slack, &send_op().with("channel", "C12345678"))
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("invalid_auth"));
    }

    #[test]
    fn test_classify_error() {
        let body = json!({});
        assert!(classify_error("channel_not_found", &body, 1).is_not_found());
        assert!(matches!(
            classify_error("ratelimited", &body, 3),
            ApiError::RateLimited { attempts: 3, .. }
        ));
        assert!(matches!(
            classify_error("not_in_channel", &body, 1),
            ApiError::Client { kind: ClientErrorKind::Forbidden, .. }
        ));
        assert!(matches!(
            classify_error("too_many_attachments", &body, 1),
            ApiError::Client { kind: ClientErrorKind::BadRequest, .. }
        ));
        let scoped = classify_error("missing_scope", &json!({ "needed": "chat:write" }), 1);
        assert!(scoped.to_string().contains("needs chat:write"));
    }

    #[tokio::test]
    async fn test_direct_message_opens_conversation() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users.list")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({
                    "ok": true,
                    "members": [
                        { "id": "U00000001", "name": "alice", "profile": { "display_name": "Alice" } },
                        { "id": "U00000002", "name": "bob", "profile": { "display_name": "Bobby" } }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let open = server
            .mock("POST", "/conversations.open")
            .match_body(Matcher::Json(json!({ "users": "U00000002" })))
            .with_status(200)
            .with_body(r#"{"ok":true,"channel":{"id":"D00000009"}}"#)
            .expect(1)
            .create_async()
            .await;
        let post = server
            .mock("POST", "/chat.postMessage")
            .match_body(Matcher::PartialJson(json!({ "channel": "D00000009" })))
            .with_status(200)
            .with_body(r#"{"ok":true,"channel":"D00000009","ts":"1700000001.000200"}"#)
            .expect(1)
            .create_async()
            .await;

        let slack = adapter(&server, 50);
        let result = records(&slack, &send_op().with("user", "@bobby")).await.unwrap();

        assert_eq!(result[0].text("id"), "1700000001.000200");
        open.assert_async().await;
        post.assert_async().await;
    }

    #[tokio::test]
    async fn test_blocks_are_sent_as_json() {
        let mut server = Server::new_async().await;
        let post = server
            .mock("POST", "/chat.postMessage")
            .match_body(Matcher::PartialJson(json!({
                "thread_ts": "1700000000.000100",
                "blocks": [{ "type": "divider" }]
            })))
            .with_status(200)
            .with_body(r#"{"ok":true,"channel":"C12345678","ts":"1700000002.000300"}"#)
            .expect(1)
            .create_async()
            .await;

        let slack = adapter(&server, 50);
        let op = send_op()
            .with("channel", "C12345678")
            .with("thread_ts", "1700000000.000100")
            .with("blocks", r#"[{"type":"divider"}]"#);
        records(&slack, &op).await.unwrap();

        post.assert_async().await;
    }

    #[tokio::test]
    async fn test_history_tolerates_short_pages() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/conversations.history")
            .match_query(Matcher::Regex("limit=3$".into()))
            .with_status(200)
            .with_body(
                json!({
                    "ok": true,
                    "messages": [{ "ts": "1700000000.000001", "user": "U1", "text": "one" }],
                    "response_metadata": { "next_cursor": "next" }
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        server
            .mock("GET", "/conversations.history")
            .match_query(Matcher::UrlEncoded("cursor".into(), "next".into()))
            .with_status(200)
            .with_body(
                json!({
                    "ok": true,
                    "messages": [{ "ts": "1700000000.000002", "bot_id": "B1", "text": "two" }]
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let slack = adapter(&server, 3);
        let op = Operation::new(Service::Slack, Verb::List, EntityKind::Message)
            .with("channel", "C12345678")
            .with("limit", 3i64);
        let result = records(&slack, &op).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].text("channel"), "C12345678");
        assert_eq!(result[1].text("user"), "B1");
    }

    #[tokio::test]
    async fn test_search_pages_by_number() {
        let mut server = Server::new_async().await;
        let second = server
            .mock("GET", "/search.messages")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_body(
                json!({
                    "ok": true,
                    "messages": {
                        "matches": [{ "ts": "3.0", "user": "U3", "text": "c", "channel": { "name": "ops" } }],
                        "paging": { "page": 2, "pages": 2 }
                    }
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        let first = server
            .mock("GET", "/search.messages")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query".into(), "in:#ops outage".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "ok": true,
                    "messages": {
                        "matches": [
                            { "ts": "1.0", "user": "U1", "text": "a", "channel": { "name": "ops" } },
                            { "ts": "2.0", "user": "U2", "text": "b", "channel": { "name": "ops" } }
                        ],
                        "paging": { "page": 1, "pages": 2 }
                    }
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let slack = adapter(&server, 2);
        let op = Operation::new(Service::Slack, Verb::Search, EntityKind::Message)
            .with("query", "outage")
            .with("in_channel", "#ops");
        let result = records(&slack, &op).await.unwrap();

        let ids: Vec<String> = result.iter().map(|r| r.text("id")).collect();
        assert_eq!(ids, vec!["1.0", "2.0", "3.0"]);
        assert_eq!(result[0].text("channel"), "ops");
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_ratelimited_body_is_retried_then_sent() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("POST", "/chat.postMessage")
            .with_status(200)
            .with_header("Retry-After", "0")
            .with_body(r#"{"ok":false,"error":"ratelimited"}"#)
            .expect(2)
            .create_async()
            .await;
        let posted = server
            .mock("POST", "/chat.postMessage")
            .with_status(200)
            .with_body(r#"{"ok":true,"channel":"C12345678","ts":"1700000000.000200"}"#)
            .expect(1)
            .create_async()
            .await;

        let slack = retrying_adapter(&server, 3);
        let result = records(&slack, &send_op().with("channel", "C12345678")).await.unwrap();

        assert_eq!(result[0].text("id"), "1700000000.000200");
        limited.assert_async().await;
        posted.assert_async().await;
    }

    #[tokio::test]
    async fn test_persistent_ratelimited_body_exits_three() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("GET", "/conversations.list")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"ok":false,"error":"ratelimited"}"#)
            .expect(2)
            .create_async()
            .await;

        let slack = retrying_adapter(&server, 2);
        let op = Operation::new(Service::Slack, Verb::List, EntityKind::Channel);
        let err = records(&slack, &op).await.unwrap_err();

        assert!(matches!(err.root(), ApiError::RateLimited { attempts: 2, .. }));
        assert_eq!(err.exit_code(), 3);
        limited.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_without_matches_array_is_decode_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/search.messages")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"ok":true,"messages":{"total":0}}"#)
            .create_async()
            .await;

        let slack = adapter(&server, 20);
        let op = Operation::new(Service::Slack, Verb::Search, EntityKind::Message).with("query", "outage");
        let err = records(&slack, &op).await.unwrap_err();

        assert!(matches!(err.root(), ApiError::Decode(_)));
        assert_eq!(err.exit_code(), 3);
    }
}
