//
//  enterprise-cli
//  api/confluence.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Confluence Adapter
//!
//! Confluence Cloud REST API under `/wiki/rest/api`, authenticated with an
//! account email and API token.
//!
//! Listings return `{"results": [...], "start": n, "size": n, "_links": {"next": "..."}}`.
//! The `next` link carries either a `cursor` (content search) or a `start`
//! offset; its absence ends the listing.
//!
//! Page bodies are written in the storage representation (XHTML) and read
//! back as plain text.

use async_trait::async_trait;
use serde_json::{json, Value};
use url::Url;

use super::adapter::{single, Connection, Outcome, ServiceAdapter};
use super::common::{
    str_at, value_at, ApiError, ApiRequest, ApiResponse, Page, PageCursor, PageSource, Record,
    Service,
};
use super::operation::{EntityKind, Operation, Verb};
use crate::util::{html_to_text, truncate};

/// Adapter for Confluence Cloud.
pub struct ConfluenceAdapter {
    conn: Connection,
}

impl ConfluenceAdapter {
    /// Creates the adapter over an established connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    fn api(&self, path: &[&str]) -> Url {
        let mut segments = vec!["wiki", "rest", "api"];
        segments.extend_from_slice(path);
        self.conn.url(&segments)
    }

    async fn run<'a>(&'a self, op: &Operation) -> Result<Outcome<'a>, ApiError> {
        match (op.verb, op.entity) {
            (Verb::Search, EntityKind::Page) => {
                let mut cql = op.require("cql")?;
                if let Some(order_by) = op.str("order_by") {
                    if !cql.to_lowercase().contains("order by") {
                        cql = format!("{} order by {}", cql, order_by);
                    }
                }
                let source = ConfluenceListing {
                    request: ApiRequest::get(self.api(&["content", "search"]))
                        .query("cql", cql)
                        .query("expand", "space,body.view"),
                    project: search_record,
                    site: self.conn.base_url.clone(),
                };
                Ok(self.conn.listing(op, EntityKind::Page, source, Some(25)))
            }
            (Verb::Get, EntityKind::Page) => {
                let page = self.get_page(&op.require("page_id")?).await?;
                Ok(single(EntityKind::Page, page_record(&page, &self.conn.base_url)))
            }
            (Verb::Create, EntityKind::Page) => Ok(single(EntityKind::Page, self.create_page(op).await?)),
            (Verb::Update, EntityKind::Page) => Ok(single(EntityKind::Page, self.update_page(op).await?)),
            (Verb::List, EntityKind::Space) => {
                let source = ConfluenceListing {
                    request: ApiRequest::get(self.api(&["space"])),
                    project: space_record,
                    site: self.conn.base_url.clone(),
                };
                Ok(self.conn.listing(op, EntityKind::Space, source, Some(50)))
            }
            (verb, entity) => Err(ApiError::validation(format!(
                "Confluence does not support '{} {}'",
                verb, entity
            ))),
        }
    }

    async fn get_page(&self, id: &str) -> Result<Value, ApiError> {
        let request = ApiRequest::get(self.api(&["content", id])).query("expand", "body.storage,space,version");
        let page = self.conn.send_json(request).await?;
        if page.get("id").is_none() {
            return Err(ApiError::Decode("page response has no id".into()));
        }
        Ok(page)
    }

    async fn create_page(&self, op: &Operation) -> Result<Record, ApiError> {
        let mut body = json!({
            "type": "page",
            "title": op.require("title")?,
            "space": { "key": op.require("space")? },
            "body": {
                "storage": {
                    "value": op.require("content")?,
                    "representation": "storage"
                }
            }
        });
        if let (Some(parent), Some(fields)) = (op.text("parent_id"), body.as_object_mut()) {
            fields.insert("ancestors".into(), json!([{ "id": parent }]));
        }

        let created = self
            .conn
            .send_json(ApiRequest::post(self.api(&["content"])).json(body))
            .await?;
        Ok(page_record(&created, &self.conn.base_url))
    }

    async fn update_page(&self, op: &Operation) -> Result<Record, ApiError> {
        let id = op.require("page_id")?;
        let current = self.get_page(&id).await?;
        let version = current
            .pointer("/version/number")
            .and_then(Value::as_u64)
            .unwrap_or(1);
        let title = op
            .str("title")
            .map(str::to_string)
            .unwrap_or_else(|| str_at(&current, "/title"));

        let request = ApiRequest::put(self.api(&["content", &id])).json(json!({
            "id": id,
            "type": "page",
            "title": title,
            "body": {
                "storage": {
                    "value": op.require("content")?,
                    "representation": "storage"
                }
            },
            "version": { "number": version + 1 }
        }));
        let updated = self.conn.send_json(request).await?;
        Ok(page_record(&updated, &self.conn.base_url))
    }
}

#[async_trait]
impl ServiceAdapter for ConfluenceAdapter {
    fn service(&self) -> Service {
        Service::Confluence
    }

    async fn perform<'a>(&'a self, op: &Operation) -> Result<Outcome<'a>, ApiError> {
        self.run(op).await.map_err(|e| e.with_context(op.describe()))
    }

    async fn check(&self) -> Result<Record, ApiError> {
        let me = self
            .conn
            .send_json(ApiRequest::get(self.api(&["user", "current"])))
            .await?;
        Ok(Record::new()
            .with("id", str_at(&me, "/accountId"))
            .with("name", str_at(&me, "/displayName"))
            .with("email", str_at(&me, "/email")))
    }
}

/// Listings continued through `_links.next`.
struct ConfluenceListing {
    request: ApiRequest,
    project: fn(&Value, &Url) -> Record,
    site: Url,
}

impl PageSource for ConfluenceListing {
    fn request(&self, cursor: Option<&PageCursor>, page_size: u32) -> ApiRequest {
        let request = self.request.clone().set_query("limit", page_size);
        match cursor {
            Some(PageCursor::Token(token)) => request.set_query("cursor", token),
            Some(PageCursor::Offset(start)) => request.set_query("start", start),
            _ => request,
        }
    }

    fn extract(&self, response: &ApiResponse, cursor: Option<&PageCursor>) -> Result<Page, ApiError> {
        let body = response.json()?;
        let results = body
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| ApiError::Decode("listing response has no 'results' array".into()))?;
        let records: Vec<Record> = results.iter().map(|r| (self.project)(r, &self.site)).collect();

        let next = body
            .pointer("/_links/next")
            .and_then(Value::as_str)
            .and_then(|link| next_cursor(&self.request.url, link, cursor, records.len()));
        Ok(Page::new(records, next))
    }
}

/// Derives the next cursor from a `_links.next` value.
fn next_cursor(
    base: &Url,
    link: &str,
    cursor: Option<&PageCursor>,
    received: usize,
) -> Option<PageCursor> {
    let next = base.join(link).ok()?;
    let mut start = None;
    for (key, value) in next.query_pairs() {
        match key.as_ref() {
            "cursor" if !value.is_empty() => return Some(PageCursor::Token(value.into_owned())),
            "start" => start = value.parse().ok(),
            _ => {}
        }
    }
    let current = match cursor {
        Some(PageCursor::Offset(start)) => *start,
        _ => 0,
    };
    Some(PageCursor::Offset(start.unwrap_or(current + received as u64)))
}

fn web_url(site: &Url, content: &Value) -> String {
    let webui = str_at(content, "/_links/webui");
    if webui.is_empty() {
        return String::new();
    }
    format!("{}/wiki{}", site.as_str().trim_end_matches('/'), webui)
}

fn search_record(result: &Value, site: &Url) -> Record {
    let view = str_at(result, "/body/view/value");
    Record::new()
        .with("id", str_at(result, "/id"))
        .with("title", str_at(result, "/title"))
        .with("space", str_at(result, "/space/key"))
        .with("type", str_at(result, "/type"))
        .with("excerpt", truncate(&html_to_text(&view), 200))
        .with("url", web_url(site, result))
}

fn page_record(page: &Value, site: &Url) -> Record {
    let storage = str_at(page, "/body/storage/value");
    Record::new()
        .with("id", str_at(page, "/id"))
        .with("title", str_at(page, "/title"))
        .with("space", str_at(page, "/space/key"))
        .with("type", str_at(page, "/type"))
        .with("version", value_at(page, "/version/number"))
        .with("content", html_to_text(&storage))
        .with("url", web_url(site, page))
}

fn space_record(space: &Value, _: &Url) -> Record {
    Record::new()
        .with("key", str_at(space, "/key"))
        .with("id", value_at(space, "/id"))
        .with("name", str_at(space, "/name"))
        .with("type", str_at(space, "/type"))
}
