//
//  enterprise-cli
//  api/jira.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Jira Adapter
//!
//! Jira Cloud REST API v3 (`/rest/api/3`) and Agile API 1.0
//! (`/rest/agile/1.0`), authenticated with an account email and API token.
//!
//! ## Operations
//!
//! | Verb | Entity | Wire |
//! |------|--------|------|
//! | search | issue | `POST /search/jql` (`nextPageToken` cursor) |
//! | get | issue | `GET /issue/{key}` |
//! | create | issue | `POST /issue` |
//! | update | issue | `PUT /issue/{key}`, assignee and comment calls |
//! | transition | issue | `GET` then `POST /issue/{key}/transitions` |
//! | list | transition | `GET /issue/{key}/transitions` |
//! | list / create | comment | `/issue/{key}/comment` |
//! | assign | issue | `PUT /issue/{key}/assignee` |
//! | search | user | `GET /user/search` |
//! | list | project | `GET /project/search` |
//! | link | issue | `POST /issueLink` |
//! | list | board / sprint | Agile `board`, `board/{id}/sprint` |
//! | update | sprint | Agile `POST /sprint/{id}/issue` |
//!
//! Descriptions and comment bodies are sent and read as Atlassian Document
//! Format; records carry their plain text.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;
use url::Url;

use super::adapter::{ack, single, Connection, Outcome, ServiceAdapter};
use super::common::{
    str_at, value_at, ApiError, ApiRequest, ApiResponse, ClientErrorKind, Page, PageCursor,
    PageSource, Record, Service,
};
use super::operation::{EntityKind, Operation, Verb};
use crate::util::{adf_document, adf_to_text};

/// Jira's conventional "Start date" custom field.
const START_DATE_FIELD: &str = "customfield_10015";

/// Fields requested by `search` when none are given.
const DEFAULT_SEARCH_FIELDS: &[&str] = &[
    "summary", "status", "assignee", "priority", "issuetype", "labels", "created", "updated",
];

/// Fields requested by `get`.
const DETAIL_FIELDS: &str = "summary,status,assignee,reporter,priority,issuetype,labels,created,updated,duedate,description,parent,project,customfield_10015";

/// Assignee values that mean "remove the assignee".
const UNASSIGN: &[&str] = &["none", "unassigned", "-"];

/// Adapter for Jira Cloud.
pub struct JiraAdapter {
    conn: Connection,
}

impl JiraAdapter {
    /// Creates the adapter over an established connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    fn api(&self, path: &[&str]) -> Url {
        let mut segments = vec!["rest", "api", "3"];
        segments.extend_from_slice(path);
        self.conn.url(&segments)
    }

    fn agile(&self, path: &[&str]) -> Url {
        let mut segments = vec!["rest", "agile", "1.0"];
        segments.extend_from_slice(path);
        self.conn.url(&segments)
    }

    fn browse_url(&self, key: &str) -> String {
        self.conn.url(&["browse", key]).to_string()
    }

    async fn run<'a>(&'a self, op: &Operation) -> Result<Outcome<'a>, ApiError> {
        match (op.verb, op.entity) {
            (Verb::Search, EntityKind::Issue) => self.search_issues(op),
            (Verb::Get, EntityKind::Issue) => {
                Ok(single(EntityKind::Issue, self.get_issue(&op.require("issue")?).await?))
            }
            (Verb::Create, EntityKind::Issue) => Ok(single(EntityKind::Issue, self.create_issue(op).await?)),
            (Verb::Update, EntityKind::Issue) => Ok(single(EntityKind::Ack, self.update_issue(op).await?)),
            (Verb::Transition, EntityKind::Issue) => {
                Ok(single(EntityKind::Ack, self.transition_issue(op).await?))
            }
            (Verb::List, EntityKind::Transition) => {
                let source = FixedListing {
                    url: self.api(&["issue", &op.require("issue")?, "transitions"]),
                    items: Some("transitions"),
                    project: transition_record,
                };
                Ok(self.conn.listing(op, EntityKind::Transition, source, None))
            }
            (Verb::List, EntityKind::Priority) => {
                let source = FixedListing {
                    url: self.api(&["priority"]),
                    items: None,
                    project: priority_record,
                };
                Ok(self.conn.listing(op, EntityKind::Priority, source, None))
            }
            (Verb::List, EntityKind::LinkType) => {
                let source = FixedListing {
                    url: self.api(&["issueLinkType"]),
                    items: Some("issueLinkTypes"),
                    project: link_type_record,
                };
                Ok(self.conn.listing(op, EntityKind::LinkType, source, None))
            }
            (Verb::List, EntityKind::Comment) => {
                let url = self.api(&["issue", &op.require("issue")?, "comment"]);
                let source = OffsetListing {
                    request: ApiRequest::get(url).query("orderBy", "-created"),
                    items: Some("comments"),
                    project: comment_record,
                };
                Ok(self.conn.listing(op, EntityKind::Comment, source, Some(20)))
            }
            (Verb::Create, EntityKind::Comment) => {
                let key = op.require("issue")?;
                let created = self.add_comment(&key, &op.require("body")?).await?;
                Ok(single(EntityKind::Comment, comment_record(&created)))
            }
            (Verb::Assign, EntityKind::Issue) => {
                let key = op.require("issue")?;
                let user = op.require("user")?;
                let message = self.assign(&key, &user).await?;
                Ok(single(EntityKind::Ack, ack(key, message)))
            }
            (Verb::Search, EntityKind::User) => {
                let source = OffsetListing {
                    request: ApiRequest::get(self.api(&["user", "search"])).query("query", op.require("query")?),
                    items: None,
                    project: user_record,
                };
                Ok(self.conn.listing(op, EntityKind::User, source, Some(10)))
            }
            (Verb::List, EntityKind::Project) => {
                let source = OffsetListing {
                    request: ApiRequest::get(self.api(&["project", "search"])).query("orderBy", "key"),
                    items: Some("values"),
                    project: project_record,
                };
                Ok(self.conn.listing(op, EntityKind::Project, source, None))
            }
            (Verb::Link, EntityKind::Issue) => Ok(single(EntityKind::Ack, self.link_issues(op).await?)),
            (Verb::List, EntityKind::Board) => {
                let source = OffsetListing {
                    request: ApiRequest::get(self.agile(&["board"])),
                    items: Some("values"),
                    project: board_record,
                };
                Ok(self.conn.listing(op, EntityKind::Board, source, None))
            }
            (Verb::List, EntityKind::Sprint) => {
                let board = op.require("board")?;
                let state = op
                    .text("state")
                    .unwrap_or_else(|| "active,future".to_string());
                let source = OffsetListing {
                    request: ApiRequest::get(self.agile(&["board", &board, "sprint"])).query("state", state),
                    items: Some("values"),
                    project: sprint_record,
                };
                Ok(self.conn.listing(op, EntityKind::Sprint, source, None))
            }
            (Verb::Update, EntityKind::Sprint) => {
                let sprint = op.require("sprint")?;
                let key = op.require("issue")?;
                let request = ApiRequest::post(self.agile(&["sprint", &sprint, "issue"]))
                    .json(json!({ "issues": [&key] }));
                self.conn.send(request).await?;
                Ok(single(
                    EntityKind::Ack,
                    ack(key.clone(), format!("Moved {} to sprint {}", key, sprint)),
                ))
            }
            (verb, entity) => Err(ApiError::validation(format!(
                "Jira does not support '{} {}'",
                verb, entity
            ))),
        }
    }

    fn search_issues<'a>(&'a self, op: &Operation) -> Result<Outcome<'a>, ApiError> {
        let mut jql = op.require("jql")?;
        if let Some(order_by) = op.str("order_by") {
            if !jql.to_lowercase().contains("order by") {
                jql = format!("{} ORDER BY {}", jql, order_by);
            }
        }

        let requested = op.list("fields");
        let mut fields: Vec<String> = DEFAULT_SEARCH_FIELDS.iter().map(|f| f.to_string()).collect();
        let mut extra = Vec::new();
        for field in requested {
            if field != "key" && !fields.contains(&field) {
                fields.push(field.clone());
                extra.push(field);
            }
        }

        let source = IssueSearch {
            url: self.api(&["search", "jql"]),
            jql,
            fields,
            extra,
        };
        Ok(self.conn.listing(op, EntityKind::Issue, source, Some(50)))
    }

    async fn get_issue(&self, key: &str) -> Result<Record, ApiError> {
        let request = ApiRequest::get(self.api(&["issue", key])).query("fields", DETAIL_FIELDS);
        let body = self.conn.send_json(request).await?;
        if body.get("key").and_then(Value::as_str).is_none() {
            return Err(ApiError::Decode("issue response has no key".into()));
        }

        let mut record = issue_record(&body);
        record.insert("reporter", str_at(&body, "/fields/reporter/displayName"));
        record.insert("parent", str_at(&body, "/fields/parent/key"));
        record.insert("project", str_at(&body, "/fields/project/key"));
        record.insert("start", value_at(&body, &format!("/fields/{}", START_DATE_FIELD)));
        record.insert("due", value_at(&body, "/fields/duedate"));
        record.insert("description", adf_to_text(&value_at(&body, "/fields/description")));
        record.insert("url", self.browse_url(&str_at(&body, "/key")));
        Ok(record)
    }

    async fn create_issue(&self, op: &Operation) -> Result<Record, ApiError> {
        let summary = op.require("summary")?;
        let mut fields = Map::new();
        fields.insert("project".into(), json!({ "key": op.require("project")? }));
        fields.insert("issuetype".into(), json!({ "name": op.require("type")? }));
        fields.insert("summary".into(), json!(summary));
        if let Some(description) = op.str("description") {
            fields.insert("description".into(), adf_document(description));
        }
        let labels = op.list("labels");
        if !labels.is_empty() {
            fields.insert("labels".into(), json!(labels));
        }
        if let Some(epic) = op.str("epic") {
            fields.insert("parent".into(), json!({ "key": epic }));
        }
        if let Some(assignee) = op.str("assignee") {
            let account_id = self.account_id(assignee).await?;
            fields.insert("assignee".into(), json!({ "accountId": account_id }));
        }

        let request = ApiRequest::post(self.api(&["issue"])).json(json!({ "fields": fields }));
        let created = self.conn.send_json(request).await?;
        let key = str_at(&created, "/key");
        if key.is_empty() {
            return Err(ApiError::Decode("create response has no issue key".into()));
        }
        debug!(key = %key, "Issue created");

        Ok(Record::new()
            .with("key", key.clone())
            .with("id", str_at(&created, "/id"))
            .with("summary", summary)
            .with("url", self.browse_url(&key)))
    }

    async fn update_issue(&self, op: &Operation) -> Result<Record, ApiError> {
        let key = op.require("issue")?;
        let mut changed = Vec::new();

        let mut fields = Map::new();
        if let Some(summary) = op.str("summary") {
            fields.insert("summary".into(), json!(summary));
            changed.push("summary");
        }
        if let Some(description) = op.str("description") {
            fields.insert("description".into(), adf_document(description));
            changed.push("description");
        }
        if let Some(priority) = op.str("priority") {
            fields.insert("priority".into(), json!({ "name": priority }));
            changed.push("priority");
        }
        if let Some(due) = op.str("due") {
            fields.insert("duedate".into(), json!(due));
            changed.push("due date");
        }
        if let Some(start) = op.str("start") {
            fields.insert(START_DATE_FIELD.into(), json!(start));
            changed.push("start date");
        }
        if let Some(epic) = op.str("epic") {
            fields.insert("parent".into(), json!({ "key": epic }));
            changed.push("epic");
        }

        let mut label_ops: Vec<Value> = op
            .list("add_labels")
            .into_iter()
            .map(|label| json!({ "add": label }))
            .collect();
        label_ops.extend(
            op.list("remove_labels")
                .into_iter()
                .map(|label| json!({ "remove": label })),
        );
        if !label_ops.is_empty() {
            changed.push("labels");
        }

        if !fields.is_empty() || !label_ops.is_empty() {
            let mut body = Map::new();
            if !fields.is_empty() {
                body.insert("fields".into(), Value::Object(fields));
            }
            if !label_ops.is_empty() {
                body.insert("update".into(), json!({ "labels": label_ops }));
            }
            let request = ApiRequest::put(self.api(&["issue", &key])).json(Value::Object(body));
            self.conn.send(request).await?;
        }

        if let Some(assignee) = op.str("assignee") {
            self.assign(&key, assignee).await?;
            changed.push("assignee");
        }
        if let Some(comment) = op.str("comment") {
            self.add_comment(&key, comment).await?;
            changed.push("comment");
        }

        Ok(ack(key.clone(), format!("Updated {} ({})", key, changed.join(", "))))
    }

    async fn transitions(&self, key: &str) -> Result<Vec<Record>, ApiError> {
        let body = self
            .conn
            .send_json(ApiRequest::get(self.api(&["issue", key, "transitions"])))
            .await?;
        let transitions = body
            .get("transitions")
            .and_then(Value::as_array)
            .ok_or_else(|| ApiError::Decode("response has no 'transitions' array".into()))?;
        Ok(transitions.iter().map(transition_record).collect())
    }

    async fn transition_issue(&self, op: &Operation) -> Result<Record, ApiError> {
        let key = op.require("issue")?;
        let label = op.require("to")?;

        let available = self.transitions(&key).await?;
        let chosen = available
            .iter()
            .find(|t| t.text("name").eq_ignore_ascii_case(&label))
            .ok_or_else(|| {
                let names: Vec<String> = available.iter().map(|t| t.text("name")).collect();
                ApiError::client(
                    ClientErrorKind::Conflict,
                    format!(
                        "transition '{}' is not available for {} (available: {})",
                        label,
                        key,
                        if names.is_empty() { "none".to_string() } else { names.join(", ") }
                    ),
                )
            })?;

        let request = ApiRequest::post(self.api(&["issue", &key, "transitions"]))
            .json(json!({ "transition": { "id": chosen.text("id") } }));
        self.conn.send(request).await?;

        if let Some(comment) = op.str("comment") {
            self.add_comment(&key, comment).await?;
        }

        Ok(ack(
            key.clone(),
            format!("Transitioned {} via '{}'", key, chosen.text("name")),
        ))
    }

    async fn add_comment(&self, key: &str, body: &str) -> Result<Value, ApiError> {
        let request = ApiRequest::post(self.api(&["issue", key, "comment"]))
            .json(json!({ "body": adf_document(body) }));
        self.conn.send_json(request).await
    }

    /// Resolves a name or email to an account id via user search.
    async fn account_id(&self, query: &str) -> Result<String, ApiError> {
        let request = ApiRequest::get(self.api(&["user", "search"]))
            .query("query", query)
            .query("maxResults", 1);
        let users = self.conn.send_json(request).await?;
        users
            .as_array()
            .and_then(|list| list.first())
            .map(|user| str_at(user, "/accountId"))
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::not_found(format!("no Jira user matches '{}'", query)))
    }

    async fn assign(&self, key: &str, user: &str) -> Result<String, ApiError> {
        let (account_id, message) = if UNASSIGN.contains(&user.to_lowercase().as_str()) {
            (Value::Null, format!("Unassigned {}", key))
        } else {
            let id = self.account_id(user).await?;
            (json!(id), format!("Assigned {} to {}", key, user))
        };

        let request = ApiRequest::put(self.api(&["issue", key, "assignee"]))
            .json(json!({ "accountId": account_id }));
        self.conn.send(request).await?;
        Ok(message)
    }

    async fn link_issues(&self, op: &Operation) -> Result<Record, ApiError> {
        let from = op.require("from")?;
        let to = op.require("to")?;
        let link_type = op.require("link_type")?;

        let request = ApiRequest::post(self.api(&["issueLink"])).json(json!({
            "type": { "name": link_type },
            "inwardIssue": { "key": from },
            "outwardIssue": { "key": to },
        }));
        self.conn.send(request).await?;

        Ok(ack(from.clone(), format!("Linked {} -> {} ({})", from, to, link_type)))
    }
}

#[async_trait]
impl ServiceAdapter for JiraAdapter {
    fn service(&self) -> Service {
        Service::Jira
    }

    async fn perform<'a>(&'a self, op: &Operation) -> Result<Outcome<'a>, ApiError> {
        self.run(op).await.map_err(|e| e.with_context(op.describe()))
    }

    async fn check(&self) -> Result<Record, ApiError> {
        let me = self
            .conn
            .send_json(ApiRequest::get(self.api(&["myself"])))
            .await?;
        Ok(Record::new()
            .with("id", str_at(&me, "/accountId"))
            .with("name", str_at(&me, "/displayName"))
            .with("email", str_at(&me, "/emailAddress")))
    }
}

/// `POST /search/jql`, continued with `nextPageToken`.
struct IssueSearch {
    url: Url,
    jql: String,
    fields: Vec<String>,
    /// Requested fields outside the normalized set, copied raw
    extra: Vec<String>,
}

impl PageSource for IssueSearch {
    fn request(&self, cursor: Option<&PageCursor>, page_size: u32) -> ApiRequest {
        let mut body = Map::new();
        body.insert("jql".into(), json!(self.jql));
        body.insert("fields".into(), json!(self.fields));
        body.insert("maxResults".into(), json!(page_size));
        if let Some(PageCursor::Token(token)) = cursor {
            body.insert("nextPageToken".into(), json!(token));
        }
        ApiRequest::post(self.url.clone()).json(Value::Object(body)).replayable()
    }

    fn extract(&self, response: &ApiResponse, _: Option<&PageCursor>) -> Result<Page, ApiError> {
        let body = response.json()?;
        let issues = body
            .get("issues")
            .and_then(Value::as_array)
            .ok_or_else(|| ApiError::Decode("search response has no 'issues' array".into()))?;

        let records = issues
            .iter()
            .map(|issue| {
                let mut record = issue_record(issue);
                for field in &self.extra {
                    record.insert(field, value_at(issue, &format!("/fields/{}", field)));
                }
                record
            })
            .collect();

        let is_last = body.get("isLast").and_then(Value::as_bool).unwrap_or(false);
        let next = match body.get("nextPageToken").and_then(Value::as_str) {
            Some(token) if !is_last && !token.is_empty() => Some(PageCursor::Token(token.to_string())),
            _ => None,
        };
        Ok(Page::new(records, next))
    }
}

/// `startAt`/`maxResults` listings.
struct OffsetListing {
    request: ApiRequest,
    /// Key of the item array, or `None` when the body is the array
    items: Option<&'static str>,
    project: fn(&Value) -> Record,
}

impl PageSource for OffsetListing {
    fn request(&self, cursor: Option<&PageCursor>, page_size: u32) -> ApiRequest {
        let start = match cursor {
            Some(PageCursor::Offset(start)) => *start,
            _ => 0,
        };
        self.request
            .clone()
            .set_query("startAt", start)
            .set_query("maxResults", page_size)
    }

    fn extract(&self, response: &ApiResponse, cursor: Option<&PageCursor>) -> Result<Page, ApiError> {
        let body = response.json()?;
        let items = match self.items {
            Some(key) => body.get(key).and_then(Value::as_array),
            None => body.as_array(),
        }
        .ok_or_else(|| ApiError::Decode("listing response has no item array".into()))?;

        let records: Vec<Record> = items.iter().map(self.project).collect();
        let start = body.get("startAt").and_then(Value::as_u64).unwrap_or(0);
        let past_total = body
            .get("total")
            .and_then(Value::as_u64)
            .is_some_and(|total| start + records.len() as u64 >= total);
        let is_last = body.get("isLast").and_then(Value::as_bool).unwrap_or(false) || past_total;
        Ok(Page::offset(records, cursor, is_last))
    }
}

/// A single unpaginated response: the transitions of one issue, the
/// priorities, the issue link types.
struct FixedListing {
    url: Url,
    /// Key of the item array, or `None` when the body is the array
    items: Option<&'static str>,
    project: fn(&Value) -> Record,
}

impl PageSource for FixedListing {
    fn request(&self, _: Option<&PageCursor>, _: u32) -> ApiRequest {
        ApiRequest::get(self.url.clone())
    }

    fn extract(&self, response: &ApiResponse, _: Option<&PageCursor>) -> Result<Page, ApiError> {
        let body = response.json()?;
        let items = match self.items {
            Some(key) => body.get(key).and_then(Value::as_array),
            None => body.as_array(),
        }
        .ok_or_else(|| {
            ApiError::Decode(format!("response has no '{}' array", self.items.unwrap_or("item")))
        })?;
        Ok(Page::new(items.iter().map(self.project).collect(), None))
    }

    fn stops_on_short_page(&self) -> bool {
        false
    }
}

fn issue_record(issue: &Value) -> Record {
    Record::new()
        .with("key", str_at(issue, "/key"))
        .with("id", str_at(issue, "/id"))
        .with("summary", str_at(issue, "/fields/summary"))
        .with("status", str_at(issue, "/fields/status/name"))
        .with("assignee", str_at(issue, "/fields/assignee/displayName"))
        .with("priority", str_at(issue, "/fields/priority/name"))
        .with("type", str_at(issue, "/fields/issuetype/name"))
        .with("labels", value_at(issue, "/fields/labels"))
        .with("created", str_at(issue, "/fields/created"))
        .with("updated", str_at(issue, "/fields/updated"))
}

fn transition_record(transition: &Value) -> Record {
    Record::new()
        .with("id", str_at(transition, "/id"))
        .with("name", str_at(transition, "/name"))
        .with("to", str_at(transition, "/to/name"))
}

fn priority_record(priority: &Value) -> Record {
    Record::new()
        .with("id", str_at(priority, "/id"))
        .with("name", str_at(priority, "/name"))
        .with("description", str_at(priority, "/description"))
}

fn link_type_record(link_type: &Value) -> Record {
    Record::new()
        .with("id", str_at(link_type, "/id"))
        .with("name", str_at(link_type, "/name"))
        .with("inward", str_at(link_type, "/inward"))
        .with("outward", str_at(link_type, "/outward"))
}

fn comment_record(comment: &Value) -> Record {
    Record::new()
        .with("id", str_at(comment, "/id"))
        .with("author", str_at(comment, "/author/displayName"))
        .with("created", str_at(comment, "/created"))
        .with("body", adf_to_text(&value_at(comment, "/body")))
}

fn user_record(user: &Value) -> Record {
    Record::new()
        .with("id", str_at(user, "/accountId"))
        .with("name", str_at(user, "/displayName"))
        .with("email", str_at(user, "/emailAddress"))
        .with("active", user.get("active").and_then(Value::as_bool).unwrap_or(false))
}

fn project_record(project: &Value) -> Record {
    Record::new()
        .with("key", str_at(project, "/key"))
        .with("id", str_at(project, "/id"))
        .with("name", str_at(project, "/name"))
        .with("type", str_at(project, "/projectTypeKey"))
}

fn board_record(board: &Value) -> Record {
    Record::new()
        .with("id", value_at(board, "/id"))
        .with("name", str_at(board, "/name"))
        .with("type", str_at(board, "/type"))
        .with("project", str_at(board, "/location/projectKey"))
}

fn sprint_record(sprint: &Value) -> Record {
    Record::new()
        .with("id", value_at(sprint, "/id"))
        .with("name", str_at(sprint, "/name"))
        .with("state", str_at(sprint, "/state"))
        .with("start", str_at(sprint, "/startDate"))
        .with("end", str_at(sprint, "/endDate"))
        .with("goal", str_at(sprint, "/goal"))
}
