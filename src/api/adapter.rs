//
//  enterprise-cli
//  api/adapter.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Service Adapters
//!
//! One polymorphic capability, [`ServiceAdapter::perform`], with one
//! implementation per service. Adapters translate an [`Operation`] into wire
//! requests and project native payloads into [`Record`]s; the dispatcher,
//! pagination engine and formatter never see a service-specific shape.
//!
//! | Service | Adapter | API |
//! |---------|---------|-----|
//! | Jira | [`JiraAdapter`](super::jira::JiraAdapter) | REST v3, Agile 1.0 |
//! | Confluence | [`ConfluenceAdapter`](super::confluence::ConfluenceAdapter) | `/wiki/rest/api` |
//! | Slack | [`SlackAdapter`](super::slack::SlackAdapter) | Web API |
//! | GitLab | [`GitlabAdapter`](super::gitlab::GitlabAdapter) | REST v4 |
//!
//! Adapters never retry; that is the [`HttpClient`]'s job. They do attach
//! the operation's identifying context to every failure they return.

use async_trait::async_trait;
use url::Url;

use super::client::HttpClient;
use super::common::{endpoint, ApiError, ApiRequest, ApiResponse, PageSource, Paginator, Record, Service};
use super::confluence::ConfluenceAdapter;
use super::gitlab::GitlabAdapter;
use super::jira::JiraAdapter;
use super::operation::{EntityKind, Operation};
use super::slack::SlackAdapter;
use crate::auth::Credential;
use crate::config::Config;

/// What an adapter produced for an operation.
pub enum Outcome<'a> {
    /// A lazily paginated listing
    Listing {
        /// Entity kind of every record
        kind: EntityKind,
        /// The record sequence
        records: Paginator<'a>,
        /// Identifying context attached to pagination failures
        context: String,
    },
    /// One entity (or an acknowledgment)
    Single {
        /// Entity kind of the record
        kind: EntityKind,
        /// The record
        record: Record,
    },
}

impl Outcome<'_> {
    /// Entity kind of the records this outcome yields.
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Listing { kind, .. } | Self::Single { kind, .. } => *kind,
        }
    }

    /// Drains the outcome into records.
    ///
    /// # Errors
    ///
    /// Any page request failure, wrapped with the operation's context.
    pub async fn into_records(self) -> Result<Vec<Record>, ApiError> {
        match self {
            Self::Listing {
                records, context, ..
            } => records
                .collect_all()
                .await
                .map_err(|e| e.with_context(context)),
            Self::Single { record, .. } => Ok(vec![record]),
        }
    }
}

/// The per-service capability behind every command.
///
/// # Example
///
/// ```rust,no_run
/// use enterprise_cli::api::adapter::adapter_for;
/// use enterprise_cli::api::common::Service;
/// use enterprise_cli::api::operation::{EntityKind, Operation, Verb};
/// use enterprise_cli::auth::CredentialResolver;
/// use enterprise_cli::config::Config;
///
/// # async fn example() -> Result<(), enterprise_cli::api::common::ApiError> {
/// let config = Config::default();
/// let credential = CredentialResolver::from_environment().resolve(Service::Jira)?;
/// let adapter = adapter_for(&credential, &config)?;
///
/// let op = Operation::new(Service::Jira, Verb::Get, EntityKind::Issue).with("issue", "PROJ-1");
/// let records = adapter.perform(&op).await?.into_records().await?;
/// println!("{}", records[0].text("summary"));
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ServiceAdapter: Send + Sync {
    /// The service this adapter talks to.
    fn service(&self) -> Service;

    /// Performs an operation.
    ///
    /// Listing verbs return [`Outcome::Listing`] without issuing any request
    /// yet; every other verb completes its requests before returning.
    ///
    /// # Errors
    ///
    /// Classified [`ApiError`]s wrapped with the operation's context.
    async fn perform<'a>(&'a self, op: &Operation) -> Result<Outcome<'a>, ApiError>;

    /// Verifies the credential with a cheap identity call.
    async fn check(&self) -> Result<Record, ApiError>;
}

/// Builds the adapter for a resolved credential.
pub fn adapter_for(credential: &Credential, config: &Config) -> Result<Box<dyn ServiceAdapter>, ApiError> {
    let connection = Connection::new(credential, config)?;
    Ok(match credential.service {
        Service::Jira => Box::new(JiraAdapter::new(connection)),
        Service::Confluence => Box::new(ConfluenceAdapter::new(connection)),
        Service::Slack => Box::new(SlackAdapter::new(connection)),
        Service::Gitlab => Box::new(GitlabAdapter::new(connection)),
    })
}

/// Everything an adapter needs to reach its service.
pub struct Connection {
    /// Authenticated client
    pub client: HttpClient,
    /// Service base URL
    pub base_url: Url,
    /// Records per page
    pub page_size: u32,
    /// Overall cap on any listing
    pub max_results_cap: usize,
}

impl Connection {
    /// Creates a connection from a credential and the settings.
    pub fn new(credential: &Credential, config: &Config) -> Result<Self, ApiError> {
        Ok(Self {
            client: HttpClient::new(credential.auth.clone(), config.timeout(), config.retry_policy())?,
            base_url: credential.base_url.clone(),
            page_size: config.pagination.page_size.max(1),
            max_results_cap: config.pagination.max_results_cap,
        })
    }

    /// Endpoint URL under the base URL.
    pub fn url(&self, segments: &[&str]) -> Url {
        endpoint(&self.base_url, segments)
    }

    /// Executes a request.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.client.execute(&request).await
    }

    /// Executes a request and parses the JSON body.
    pub async fn send_json(&self, request: ApiRequest) -> Result<serde_json::Value, ApiError> {
        self.send(request).await?.json()
    }

    /// The effective record limit for a listing: the operation's `limit`
    /// (or `default`) clamped to the overall cap.
    pub fn listing_limit(&self, op: &Operation, default: Option<usize>) -> usize {
        op.limit()
            .or(default)
            .unwrap_or(self.max_results_cap)
            .min(self.max_results_cap)
    }

    /// Builds a listing outcome over a page source.
    pub fn listing<'a>(
        &'a self,
        op: &Operation,
        kind: EntityKind,
        source: impl PageSource + 'a,
        default_limit: Option<usize>,
    ) -> Outcome<'a> {
        let limit = self.listing_limit(op, default_limit);
        Outcome::Listing {
            kind,
            records: Paginator::new(&self.client, source, self.page_size).limit(Some(limit)),
            context: op.describe(),
        }
    }
}

/// Wraps a single-record result as an outcome.
pub fn single<'a>(kind: EntityKind, record: Record) -> Outcome<'a> {
    Outcome::Single { kind, record }
}

/// Builds an acknowledgment record.
pub fn ack(id: impl Into<serde_json::Value>, message: impl Into<String>) -> Record {
    Record::new().with("id", id).with("message", message.into())
}

/// A connection to a mock server with single-attempt retries, for adapter tests.
#[cfg(test)]
pub(crate) fn test_connection(service: Service, base_url: &str, page_size: u32) -> Connection {
    use crate::auth::{AuthMaterial, CredentialSource};

    let auth = match service {
        Service::Jira | Service::Confluence => AuthMaterial::basic("dev@example.com", "api-token"),
        Service::Slack | Service::Gitlab => AuthMaterial::bearer("test-token"),
    };
    let credential = Credential {
        service,
        base_url: Url::parse(base_url).unwrap(),
        auth,
        source: CredentialSource::Environment,
    };
    let mut config = Config::default();
    config.http.max_attempts = 1;
    config.pagination.page_size = page_size;
    Connection::new(&credential, &config).unwrap()
}
