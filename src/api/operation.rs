//
//  enterprise-cli
//  api/operation.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Operations
//!
//! An [`Operation`] is the service-agnostic description of one thing the user
//! asked for: a service, a [`Verb`], the [`EntityKind`] it acts on and a map
//! of named parameters. The command line builds operations; adapters perform
//! them.
//!
//! Every supported `(service, verb, entity)` combination has an
//! [`OperationSpec`] listing its parameter rules. [`Operation::validate`]
//! checks those rules so malformed input is rejected before any credential
//! is resolved or request sent.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use super::common::{ApiError, Service};

/// What an operation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Query in the service's own query language
    Search,
    /// Enumerate entities under simple filters
    List,
    /// Fetch one entity by identity
    Get,
    /// Create an entity
    Create,
    /// Change fields of an entity
    Update,
    /// Move an entity to a named state
    Transition,
    /// Change an entity's assignee
    Assign,
    /// Link two entities
    Link,
    /// Post a message
    Send,
    /// Merge a merge request
    Merge,
    /// Re-run a pipeline
    Rerun,
}

impl Verb {
    /// Lowercase verb name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::List => "list",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Transition => "transition",
            Self::Assign => "assign",
            Self::Link => "link",
            Self::Send => "send",
            Self::Merge => "merge",
            Self::Rerun => "retry",
        }
    }

    /// Whether the verb produces a paginated listing.
    pub fn is_listing(&self) -> bool {
        matches!(self, Self::Search | Self::List)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The kind of entity a record represents.
///
/// The output layer picks identity field, summary line and table columns by
/// entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Issue,
    Transition,
    Comment,
    User,
    Project,
    Board,
    Sprint,
    Page,
    Space,
    Channel,
    Message,
    MergeRequest,
    Pipeline,
    Job,
    Branch,
    Priority,
    LinkType,
    /// Acknowledgment of an action with no natural return entity
    Ack,
}

impl EntityKind {
    /// Every entity kind, in declaration order.
    pub const ALL: [EntityKind; 18] = [
        Self::Issue,
        Self::Transition,
        Self::Comment,
        Self::User,
        Self::Project,
        Self::Board,
        Self::Sprint,
        Self::Page,
        Self::Space,
        Self::Channel,
        Self::Message,
        Self::MergeRequest,
        Self::Pipeline,
        Self::Job,
        Self::Branch,
        Self::Priority,
        Self::LinkType,
        Self::Ack,
    ];

    /// Lowercase, human-readable entity name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Transition => "transition",
            Self::Comment => "comment",
            Self::User => "user",
            Self::Project => "project",
            Self::Board => "board",
            Self::Sprint => "sprint",
            Self::Page => "page",
            Self::Space => "space",
            Self::Channel => "channel",
            Self::Message => "message",
            Self::MergeRequest => "merge request",
            Self::Pipeline => "pipeline",
            Self::Job => "job",
            Self::Branch => "branch",
            Self::Priority => "priority",
            Self::LinkType => "link type",
            Self::Ack => "result",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<String>),
}

impl ParamValue {
    fn is_blank(&self) -> bool {
        match self {
            Self::Str(s) => s.trim().is_empty(),
            Self::List(items) => items.iter().all(|i| i.trim().is_empty()),
            Self::Int(_) | Self::Bool(_) => false,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{}", i),
            Self::Bool(b) => write!(f, "{}", b),
            Self::List(items) => f.write_str(&items.join(",")),
        }
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        Self::Int(value as i64)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// A validated-on-demand request for one adapter action.
///
/// # Example
///
/// ```rust
/// use enterprise_cli::api::common::Service;
/// use enterprise_cli::api::operation::{EntityKind, Operation, Verb};
///
/// let op = Operation::new(Service::Jira, Verb::Get, EntityKind::Issue).with("issue", "PROJ-1");
///
/// assert!(op.validate().is_ok());
/// assert_eq!(op.describe(), "get issue PROJ-1");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Target service
    pub service: Service,
    /// What to do
    pub verb: Verb,
    /// What it is done to
    pub entity: EntityKind,
    /// Named parameters
    pub params: BTreeMap<String, ParamValue>,
}

/// Parameters whose value identifies what an operation is about, in the
/// order they are tried when describing it.
const IDENTIFYING_PARAMS: &[&str] = &[
    "issue", "page_id", "mr_id", "pipeline_id", "sprint", "board", "jql", "cql", "query", "channel",
    "user", "title", "project", "space",
];

impl Operation {
    /// Creates an operation with no parameters.
    pub fn new(service: Service, verb: Verb, entity: EntityKind) -> Self {
        Self {
            service,
            verb,
            entity,
            params: BTreeMap::new(),
        }
    }

    /// Builder-style parameter insert.
    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Inserts a parameter only when a value is present.
    pub fn with_opt<T: Into<ParamValue>>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    /// Inserts a list parameter only when it is not empty.
    pub fn with_list(self, key: &str, values: Vec<String>) -> Self {
        if values.is_empty() {
            self
        } else {
            self.with(key, values)
        }
    }

    /// Inserts a boolean parameter only when set.
    pub fn with_flag(self, key: &str, flag: bool) -> Self {
        if flag {
            self.with(key, true)
        } else {
            self
        }
    }

    /// A string parameter, trimmed. Integers are not coerced.
    pub fn str(&self, key: &str) -> Option<&str> {
        match self.params.get(key) {
            Some(ParamValue::Str(s)) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    /// A parameter rendered as text, whatever its type.
    pub fn text(&self, key: &str) -> Option<String> {
        self.params
            .get(key)
            .filter(|v| !v.is_blank())
            .map(|v| v.to_string())
    }

    /// An integer parameter.
    pub fn int(&self, key: &str) -> Option<i64> {
        match self.params.get(key) {
            Some(ParamValue::Int(i)) => Some(*i),
            Some(ParamValue::Str(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// A boolean parameter; absent is `false`.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.params.get(key), Some(ParamValue::Bool(true)))
    }

    /// A list parameter; absent is empty. Blank items are dropped.
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.params.get(key) {
            Some(ParamValue::List(items)) => items
                .iter()
                .map(|i| i.trim().to_string())
                .filter(|i| !i.is_empty())
                .collect(),
            Some(ParamValue::Str(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => Vec::new(),
        }
    }

    /// A required string parameter.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] when absent or blank.
    pub fn require(&self, key: &str) -> Result<String, ApiError> {
        self.text(key)
            .map(|v| v.trim().to_string())
            .ok_or_else(|| ApiError::validation(format!("missing required argument '{}'", flag_name(key))))
    }

    /// The requested result limit, if any.
    pub fn limit(&self) -> Option<usize> {
        self.int("limit").and_then(|l| usize::try_from(l).ok())
    }

    /// Verb, entity and the most identifying parameter, for error context.
    pub fn describe(&self) -> String {
        let subject = IDENTIFYING_PARAMS
            .iter()
            .find_map(|key| self.text(key));
        match subject {
            Some(subject) => format!("{} {} {}", self.verb, self.entity, subject),
            None => format!("{} {}", self.verb, self.entity),
        }
    }

    /// The parameter rules for this operation's combination, if supported.
    pub fn spec(&self) -> Option<&'static OperationSpec> {
        OPERATION_SPECS
            .iter()
            .find(|s| s.service == self.service && s.verb == self.verb && s.entity == self.entity)
    }

    /// Checks the operation against its [`OperationSpec`].
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] when the combination is unsupported, a
    /// required parameter is missing, a choice is violated, a JSON parameter
    /// does not parse, or `limit` is not positive.
    pub fn validate(&self) -> Result<(), ApiError> {
        let spec = self.spec().ok_or_else(|| {
            ApiError::validation(format!(
                "{} does not support '{} {}'",
                self.service, self.verb, self.entity
            ))
        })?;

        for key in spec.required {
            self.require(key)?;
        }

        if !spec.exactly_one.is_empty() {
            let present = spec
                .exactly_one
                .iter()
                .filter(|key| self.text(key).is_some())
                .count();
            if present != 1 {
                return Err(ApiError::validation(format!(
                    "exactly one of {} is required",
                    flag_list(spec.exactly_one)
                )));
            }
        }

        if !spec.at_least_one.is_empty()
            && !spec.at_least_one.iter().any(|key| self.text(key).is_some())
        {
            return Err(ApiError::validation(format!(
                "at least one of {} is required",
                flag_list(spec.at_least_one)
            )));
        }

        for key in spec.json_arrays {
            if let Some(raw) = self.text(key) {
                match serde_json::from_str::<Value>(&raw) {
                    Ok(Value::Array(_)) => {}
                    _ => {
                        return Err(ApiError::validation(format!(
                            "'{}' must be a JSON array",
                            flag_name(key)
                        )))
                    }
                }
            }
        }

        if let Some(limit) = self.int("limit") {
            if limit < 1 {
                return Err(ApiError::validation("'--limit' must be at least 1"));
            }
        }

        Ok(())
    }
}

fn flag_name(key: &str) -> String {
    format!("--{}", key.replace('_', "-"))
}

fn flag_list(keys: &[&str]) -> String {
    keys.iter().map(|k| flag_name(k)).collect::<Vec<_>>().join(", ")
}

/// Parameter rules for one `(service, verb, entity)` combination.
#[derive(Debug)]
pub struct OperationSpec {
    pub service: Service,
    pub verb: Verb,
    pub entity: EntityKind,
    /// Every one of these must be present and non-blank
    pub required: &'static [&'static str],
    /// At least one of these must be present
    pub at_least_one: &'static [&'static str],
    /// Exactly one of these must be present
    pub exactly_one: &'static [&'static str],
    /// These must parse as JSON arrays when present
    pub json_arrays: &'static [&'static str],
}

const fn spec(
    service: Service,
    verb: Verb,
    entity: EntityKind,
    required: &'static [&'static str],
) -> OperationSpec {
    OperationSpec {
        service,
        verb,
        entity,
        required,
        at_least_one: &[],
        exactly_one: &[],
        json_arrays: &[],
    }
}

use self::EntityKind as E;
use self::Verb as V;
use super::common::Service as S;

/// Every supported operation.
pub static OPERATION_SPECS: &[OperationSpec] = &[
    // Jira
    spec(S::Jira, V::Search, E::Issue, &["jql"]),
    spec(S::Jira, V::Get, E::Issue, &["issue"]),
    spec(S::Jira, V::Create, E::Issue, &["project", "type", "summary"]),
    OperationSpec {
        at_least_one: &[
            "summary",
            "description",
            "assignee",
            "priority",
            "add_labels",
            "remove_labels",
            "due",
            "start",
            "epic",
            "comment",
        ],
        ..spec(S::Jira, V::Update, E::Issue, &["issue"])
    },
    spec(S::Jira, V::Transition, E::Issue, &["issue", "to"]),
    spec(S::Jira, V::List, E::Transition, &["issue"]),
    spec(S::Jira, V::List, E::Comment, &["issue"]),
    spec(S::Jira, V::Create, E::Comment, &["issue", "body"]),
    spec(S::Jira, V::Assign, E::Issue, &["issue", "user"]),
    spec(S::Jira, V::Search, E::User, &["query"]),
    spec(S::Jira, V::List, E::Project, &[]),
    spec(S::Jira, V::Link, E::Issue, &["from", "to", "link_type"]),
    spec(S::Jira, V::List, E::LinkType, &[]),
    spec(S::Jira, V::List, E::Priority, &[]),
    spec(S::Jira, V::List, E::Board, &[]),
    spec(S::Jira, V::List, E::Sprint, &["board"]),
    spec(S::Jira, V::Update, E::Sprint, &["sprint", "issue"]),
    // Confluence
    spec(S::Confluence, V::Search, E::Page, &["cql"]),
    spec(S::Confluence, V::Get, E::Page, &["page_id"]),
    spec(S::Confluence, V::Create, E::Page, &["space", "title", "content"]),
    spec(S::Confluence, V::Update, E::Page, &["page_id", "content"]),
    spec(S::Confluence, V::List, E::Space, &[]),
    // Slack
    OperationSpec {
        exactly_one: &["channel", "user"],
        json_arrays: &["blocks"],
        ..spec(S::Slack, V::Send, E::Message, &["message"])
    },
    spec(S::Slack, V::List, E::Channel, &[]),
    spec(S::Slack, V::List, E::Message, &["channel"]),
    spec(S::Slack, V::Search, E::Message, &["query"]),
    // GitLab
    spec(S::Gitlab, V::List, E::MergeRequest, &["project"]),
    spec(S::Gitlab, V::Get, E::MergeRequest, &["project", "mr_id"]),
    spec(S::Gitlab, V::Create, E::MergeRequest, &["project", "source", "target", "title"]),
    spec(S::Gitlab, V::Merge, E::MergeRequest, &["project", "mr_id"]),
    spec(S::Gitlab, V::Transition, E::MergeRequest, &["project", "mr_id", "to"]),
    spec(S::Gitlab, V::List, E::Pipeline, &["project"]),
    spec(S::Gitlab, V::Get, E::Pipeline, &["project", "pipeline_id"]),
    spec(S::Gitlab, V::List, E::Job, &["project", "pipeline_id"]),
    spec(S::Gitlab, V::Rerun, E::Pipeline, &["project", "pipeline_id"]),
    spec(S::Gitlab, V::List, E::Branch, &["project"]),
];
