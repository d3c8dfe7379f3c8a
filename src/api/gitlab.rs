//
//  enterprise-cli
//  api/gitlab.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # GitLab Adapter
//!
//! GitLab REST v4 (`/api/v4`) with a personal access token.
//!
//! Projects are addressed by path or numeric ID; a path such as
//! `group/sub/app` is percent-encoded into a single segment.
//!
//! Listings use `page`/`per_page` and continue while the `X-Next-Page`
//! header names a page.

use async_trait::async_trait;
use serde_json::{json, Value};
use url::Url;

use super::adapter::{single, Connection, Outcome, ServiceAdapter};
use super::common::{
    str_at, value_at, ApiError, ApiRequest, ApiResponse, ClientErrorKind, Page, PageCursor,
    PageSource, Record, Service,
};
use super::operation::{EntityKind, Operation, Verb};
use crate::util::short_date;

/// Adapter for GitLab.
pub struct GitlabAdapter {
    conn: Connection,
}

impl GitlabAdapter {
    /// Creates the adapter over an established connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    fn project_url(&self, project: &str, path: &[&str]) -> Url {
        let mut segments = vec!["api", "v4", "projects", project];
        segments.extend_from_slice(path);
        self.conn.url(&segments)
    }

    fn listing<'a>(
        &'a self,
        op: &Operation,
        kind: EntityKind,
        request: ApiRequest,
        project: fn(&Value) -> Record,
        default_limit: Option<usize>,
    ) -> Outcome<'a> {
        let limit = self.conn.listing_limit(op, default_limit);
        let source = GitlabListing {
            request,
            per_page: self.conn.page_size.min(limit.max(1) as u32),
            project,
        };
        self.conn.listing(op, kind, source, default_limit)
    }

    async fn run<'a>(&'a self, op: &Operation) -> Result<Outcome<'a>, ApiError> {
        let project = op.require("project")?;
        match (op.verb, op.entity) {
            (Verb::List, EntityKind::MergeRequest) => {
                let request = ApiRequest::get(self.project_url(&project, &["merge_requests"]))
                    .query("state", op.str("state").unwrap_or("opened"))
                    .query_opt("search", op.str("search"))
                    .query_opt("order_by", op.str("order_by"));
                Ok(self.listing(op, EntityKind::MergeRequest, request, mr_record, Some(20)))
            }
            (Verb::Get, EntityKind::MergeRequest) => {
                let mr = self.get_mr(&project, &op.require("mr_id")?).await?;
                Ok(single(EntityKind::MergeRequest, mr_detail(&mr)))
            }
            (Verb::Create, EntityKind::MergeRequest) => {
                let request = ApiRequest::post(self.project_url(&project, &["merge_requests"])).json(json!({
                    "source_branch": op.require("source")?,
                    "target_branch": op.require("target")?,
                    "title": op.require("title")?,
                    "description": op.str("description").unwrap_or_default(),
                }));
                let mr = self.conn.send_json(request).await?;
                Ok(single(EntityKind::MergeRequest, mr_record(&mr)))
            }
            (Verb::Merge, EntityKind::MergeRequest) => {
                let iid = op.require("mr_id")?;
                let request = ApiRequest::put(self.project_url(&project, &["merge_requests", &iid, "merge"]))
                    .json(json!({
                        "squash": op.flag("squash"),
                        "should_remove_source_branch": op.flag("delete_source"),
                    }));
                let mr = self.conn.send_json(request).await?;
                Ok(single(EntityKind::MergeRequest, mr_record(&mr)))
            }
            (Verb::Transition, EntityKind::MergeRequest) => {
                let mr = self.change_state(&project, &op.require("mr_id")?, &op.require("to")?).await?;
                Ok(single(EntityKind::MergeRequest, mr_record(&mr)))
            }
            (Verb::List, EntityKind::Pipeline) => {
                let request = ApiRequest::get(self.project_url(&project, &["pipelines"]))
                    .query_opt("status", op.str("status"))
                    .query_opt("ref", op.str("ref"));
                Ok(self.listing(op, EntityKind::Pipeline, request, pipeline_record, Some(20)))
            }
            (Verb::Get, EntityKind::Pipeline) => {
                let id = op.require("pipeline_id")?;
                let pipeline = self
                    .conn
                    .send_json(ApiRequest::get(self.project_url(&project, &["pipelines", &id])))
                    .await?;
                Ok(single(EntityKind::Pipeline, pipeline_detail(&pipeline)))
            }
            (Verb::List, EntityKind::Job) => {
                let id = op.require("pipeline_id")?;
                let request = ApiRequest::get(self.project_url(&project, &["pipelines", &id, "jobs"]))
                    .query_opt("scope[]", op.str("status"));
                Ok(self.listing(op, EntityKind::Job, request, job_record, None))
            }
            (Verb::Rerun, EntityKind::Pipeline) => {
                let id = op.require("pipeline_id")?;
                let pipeline = self
                    .conn
                    .send_json(ApiRequest::post(self.project_url(&project, &["pipelines", &id, "retry"])))
                    .await?;
                Ok(single(EntityKind::Pipeline, pipeline_record(&pipeline)))
            }
            (Verb::List, EntityKind::Branch) => {
                let request = ApiRequest::get(self.project_url(&project, &["repository", "branches"]))
                    .query_opt("search", op.str("search"));
                Ok(self.listing(op, EntityKind::Branch, request, branch_record, Some(20)))
            }
            (verb, entity) => Err(ApiError::validation(format!(
                "GitLab does not support '{} {}'",
                verb, entity
            ))),
        }
    }

    async fn get_mr(&self, project: &str, iid: &str) -> Result<Value, ApiError> {
        let mr = self
            .conn
            .send_json(ApiRequest::get(self.project_url(project, &["merge_requests", iid])))
            .await?;
        if mr.get("iid").is_none() {
            return Err(ApiError::Decode("merge request response has no iid".into()));
        }
        Ok(mr)
    }

    /// Closes or reopens a merge request after checking the change is
    /// available from its current state.
    async fn change_state(&self, project: &str, iid: &str, to: &str) -> Result<Value, ApiError> {
        let mr = self.get_mr(project, iid).await?;
        let state = str_at(&mr, "/state");
        let available = available_state_events(&state);
        let wanted = to.trim().to_lowercase();

        let event = available
            .iter()
            .find(|event| **event == wanted)
            .ok_or_else(|| {
                ApiError::client(
                    ClientErrorKind::Conflict,
                    format!(
                        "cannot {} !{} in state '{}' (available: {})",
                        wanted,
                        iid,
                        state,
                        if available.is_empty() { "none".to_string() } else { available.join(", ") }
                    ),
                )
            })?;

        let request = ApiRequest::put(self.project_url(project, &["merge_requests", iid]))
            .json(json!({ "state_event": event }));
        self.conn.send_json(request).await
    }
}

#[async_trait]
impl ServiceAdapter for GitlabAdapter {
    fn service(&self) -> Service {
        Service::Gitlab
    }

    async fn perform<'a>(&'a self, op: &Operation) -> Result<Outcome<'a>, ApiError> {
        self.run(op).await.map_err(|e| e.with_context(op.describe()))
    }

    async fn check(&self) -> Result<Record, ApiError> {
        let user = self
            .conn
            .send_json(ApiRequest::get(self.conn.url(&["api", "v4", "user"])))
            .await?;
        Ok(Record::new()
            .with("id", value_at(&user, "/id"))
            .with("name", str_at(&user, "/username"))
            .with("display_name", str_at(&user, "/name"))
            .with("email", str_at(&user, "/email")))
    }
}

/// State events a merge request in `state` accepts.
fn available_state_events(state: &str) -> &'static [&'static str] {
    match state {
        "opened" => &["close"],
        "closed" => &["reopen"],
        _ => &[],
    }
}

/// Page-numbered listings continued by `X-Next-Page`.
struct GitlabListing {
    request: ApiRequest,
    /// Fixed so that page numbers keep addressing the same slices
    per_page: u32,
    project: fn(&Value) -> Record,
}

impl PageSource for GitlabListing {
    fn request(&self, cursor: Option<&PageCursor>, _: u32) -> ApiRequest {
        let page = match cursor {
            Some(PageCursor::Page(page)) => *page,
            _ => 1,
        };
        self.request
            .clone()
            .set_query("per_page", self.per_page)
            .set_query("page", page)
    }

    fn extract(&self, response: &ApiResponse, _: Option<&PageCursor>) -> Result<Page, ApiError> {
        let body = response.json()?;
        let records = body
            .as_array()
            .ok_or_else(|| ApiError::Decode("listing response is not an array".into()))?
            .iter()
            .map(self.project)
            .collect();
        let next = response
            .header("x-next-page")
            .and_then(|page| page.trim().parse().ok())
            .map(PageCursor::Page);
        Ok(Page::new(records, next))
    }
}

fn mr_record(mr: &Value) -> Record {
    Record::new()
        .with("iid", value_at(mr, "/iid"))
        .with("title", str_at(mr, "/title"))
        .with("state", str_at(mr, "/state"))
        .with("author", str_at(mr, "/author/username"))
        .with("source", str_at(mr, "/source_branch"))
        .with("target", str_at(mr, "/target_branch"))
        .with("url", str_at(mr, "/web_url"))
}

fn mr_detail(mr: &Value) -> Record {
    let merge_status = match str_at(mr, "/detailed_merge_status") {
        s if s.is_empty() => str_at(mr, "/merge_status"),
        s => s,
    };
    let mut record = mr_record(mr);
    record.insert("description", str_at(mr, "/description"));
    record.insert("merge_status", merge_status);
    record.insert(
        "has_conflicts",
        mr.get("has_conflicts").and_then(Value::as_bool).unwrap_or(false),
    );
    record.insert("created", short_date(&str_at(mr, "/created_at")));
    record
}

fn pipeline_record(pipeline: &Value) -> Record {
    let sha: String = str_at(pipeline, "/sha").chars().take(8).collect();
    Record::new()
        .with("id", value_at(pipeline, "/id"))
        .with("status", str_at(pipeline, "/status"))
        .with("ref", str_at(pipeline, "/ref"))
        .with("sha", sha)
        .with("source", str_at(pipeline, "/source"))
        .with("created", short_date(&str_at(pipeline, "/created_at")))
        .with("url", str_at(pipeline, "/web_url"))
}

fn pipeline_detail(pipeline: &Value) -> Record {
    let mut record = pipeline_record(pipeline);
    record.insert("user", str_at(pipeline, "/user/username"));
    record.insert("duration", value_at(pipeline, "/duration"));
    record.insert("finished", short_date(&str_at(pipeline, "/finished_at")));
    record
}

fn job_record(job: &Value) -> Record {
    Record::new()
        .with("id", value_at(job, "/id"))
        .with("stage", str_at(job, "/stage"))
        .with("name", str_at(job, "/name"))
        .with("status", str_at(job, "/status"))
        .with("duration", value_at(job, "/duration"))
        .with("url", str_at(job, "/web_url"))
}

fn branch_record(branch: &Value) -> Record {
    let flag = |key: &str| branch.get(key).and_then(Value::as_bool).unwrap_or(false);
    Record::new()
        .with("name", str_at(branch, "/name"))
        .with("merged", flag("merged"))
        .with("protected", flag("protected"))
        .with("default", flag("default"))
        .with("commit", str_at(branch, "/commit/short_id"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::adapter::test_connection;
    use mockito::{Matcher, Server, ServerGuard};

    fn adapter(server: &ServerGuard, page_size: u32) -> GitlabAdapter {
        GitlabAdapter::new(test_connection(Service::Gitlab, &server.url(), page_size))
    }

    fn op(verb: Verb, entity: EntityKind) -> Operation {
        Operation::new(Service::Gitlab, verb, entity).with("project", "42")
    }

    async fn records(adapter: &GitlabAdapter, op: &Operation) -> Result<Vec<Record>, ApiError> {
        adapter.perform(op).await?.into_records().await
    }

    fn mr_body(iid: u64, state: &str) -> String {
        json!({
            "iid": iid,
            "title": "Add retries",
            "state": state,
            "author": { "username": "dev" },
            "source_branch": "feature/retries",
            "target_branch": "main",
            "web_url": format!("https://gitlab.example.com/g/app/-/merge_requests/{}", iid)
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_project_path_is_one_segment() {
        let mut server = Server::new_async().await;
        let list = server
            .mock(
                "GET",
                Matcher::Regex(r"^/api/v4/projects/group(%2F|/)app/merge_requests$".into()),
            )
            .match_query(Matcher::UrlEncoded("state".into(), "opened".into()))
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_body(format!("[{}]", mr_body(7, "opened")))
            .expect(1)
            .create_async()
            .await;

        let gitlab = adapter(&server, 20);
        let op = Operation::new(Service::Gitlab, Verb::List, EntityKind::MergeRequest).with("project", "group/app");
        let result = records(&gitlab, &op).await.unwrap();

        assert_eq!(result[0].text("iid"), "7");
        assert_eq!(result[0].text("source"), "feature/retries");
        list.assert_async().await;
    }

    #[tokio::test]
    async fn test_listing_follows_next_page_header() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/api/v4/projects/42/repository/branches")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(200)
            .with_header("x-next-page", "2")
            .with_body(r#"[{"name":"main","protected":true},{"name":"dev"}]"#)
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/api/v4/projects/42/repository/branches")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("per_page".into(), "2".into()),
            ]))
            .with_status(200)
            .with_header("x-next-page", "")
            .with_body(r#"[{"name":"old","merged":true}]"#)
            .expect(1)
            .create_async()
            .await;

        let gitlab = adapter(&server, 2);
        let result = records(&gitlab, &op(Verb::List, EntityKind::Branch)).await.unwrap();

        let names: Vec<String> = result.iter().map(|r| r.text("name")).collect();
        assert_eq!(names, vec!["main", "dev", "old"]);
        assert_eq!(result[0].text("protected"), "true");
        assert_eq!(result[2].text("merged"), "true");
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_reopen_merged_mr_is_rejected_without_update() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v4/projects/42/merge_requests/5")
            .with_status(200)
            .with_body(mr_body(5, "merged"))
            .create_async()
            .await;
        let update = server
            .mock("PUT", "/api/v4/projects/42/merge_requests/5")
            .expect(0)
            .create_async()
            .await;

        let gitlab = adapter(&server, 20);
        let err = records(
            &gitlab,
            &op(Verb::Transition, EntityKind::MergeRequest).with("mr_id", 5i64).with("to", "reopen"),
        )
        .await
        .unwrap_err();

        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("available: none"));
        update.assert_async().await;
    }

    #[tokio::test]
    async fn test_close_open_mr() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v4/projects/42/merge_requests/5")
            .with_status(200)
            .with_body(mr_body(5, "opened"))
            .create_async()
            .await;
        let update = server
            .mock("PUT", "/api/v4/projects/42/merge_requests/5")
            .match_body(Matcher::Json(json!({ "state_event": "close" })))
            .with_status(200)
            .with_body(mr_body(5, "closed"))
            .expect(1)
            .create_async()
            .await;

        let gitlab = adapter(&server, 20);
        let result = records(
            &gitlab,
            &op(Verb::Transition, EntityKind::MergeRequest).with("mr_id", 5i64).with("to", "Close"),
        )
        .await
        .unwrap();

        assert_eq!(result[0].text("state"), "closed");
        update.assert_async().await;
    }

    #[tokio::test]
    async fn test_merge_sends_options() {
        let mut server = Server::new_async().await;
        let merge = server
            .mock("PUT", "/api/v4/projects/42/merge_requests/9/merge")
            .match_body(Matcher::Json(json!({ "squash": true, "should_remove_source_branch": false })))
            .with_status(200)
            .with_body(mr_body(9, "merged"))
            .expect(1)
            .create_async()
            .await;

        let gitlab = adapter(&server, 20);
        let result = records(
            &gitlab,
            &op(Verb::Merge, EntityKind::MergeRequest).with("mr_id", 9i64).with_flag("squash", true),
        )
        .await
        .unwrap();

        assert_eq!(result[0].text("state"), "merged");
        merge.assert_async().await;
    }

    #[tokio::test]
    async fn test_unmergeable_mr_is_request_error() {
        let mut server = Server::new_async().await;
        server
            .mock("PUT", "/api/v4/projects/42/merge_requests/9/merge")
            .with_status(405)
            .with_body(r#"{"message":"405 Method Not Allowed"}"#)
            .create_async()
            .await;

        let gitlab = adapter(&server, 20);
        let err = records(&gitlab, &op(Verb::Merge, EntityKind::MergeRequest).with("mr_id", 9i64))
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().starts_with("merge merge request 9"));
    }

    #[tokio::test]
    async fn test_pipeline_and_jobs() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v4/projects/42/pipelines/1001")
            .with_status(200)
            .with_body(
                json!({
                    "id": 1001,
                    "status": "failed",
                    "ref": "main",
                    "sha": "0123456789abcdef",
                    "user": { "username": "ci-bot" },
                    "duration": 312
                })
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", "/api/v4/projects/42/pipelines/1001/jobs")
            .match_query(Matcher::UrlEncoded("scope[]".into(), "failed".into()))
            .with_status(200)
            .with_body(r#"[{"id":1,"stage":"test","name":"unit","status":"failed"}]"#)
            .create_async()
            .await;

        let gitlab = adapter(&server, 20);
        let pipeline = records(&gitlab, &op(Verb::Get, EntityKind::Pipeline).with("pipeline_id", 1001i64))
            .await
            .unwrap();
        assert_eq!(pipeline[0].text("sha"), "01234567");
        assert_eq!(pipeline[0].text("user"), "ci-bot");

        let jobs = records(
            &gitlab,
            &op(Verb::List, EntityKind::Job).with("pipeline_id", 1001i64).with("status", "failed"),
        )
        .await
        .unwrap();
        assert_eq!(jobs[0].text("name"), "unit");
    }

    #[tokio::test]
    async fn test_jobs_default_to_every_job() {
        let mut server = Server::new_async().await;
        let jobs = |range: std::ops::Range<u32>| {
            range
                .map(|i| json!({ "id": i, "stage": "test", "name": format!("job-{}", i), "status": "success" }))
                .collect::<Vec<_>>()
        };
        let first = server
            .mock("GET", "/api/v4/projects/42/pipelines/1001/jobs")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(200)
            .with_header("x-next-page", "2")
            .with_body(json!(jobs(0..20)).to_string())
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/api/v4/projects/42/pipelines/1001/jobs")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_header("x-next-page", "")
            .with_body(json!(jobs(20..25)).to_string())
            .expect(1)
            .create_async()
            .await;

        let gitlab = adapter(&server, 20);
        let result = records(&gitlab, &op(Verb::List, EntityKind::Job).with("pipeline_id", 1001i64))
            .await
            .unwrap();

        assert_eq!(result.len(), 25);
        assert_eq!(result[24].text("name"), "job-24");
        first.assert_async().await;
        second.assert_async().await;
    }

    #[test]
    fn test_available_state_events() {
        assert_eq!(available_state_events("opened"), &["close"]);
        assert_eq!(available_state_events("closed"), &["reopen"]);
        assert!(available_state_events("merged").is_empty());
    }
}
