//
//  enterprise-cli
//  api/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # API Client Layer
//!
//! HTTP plumbing and the per-service adapters.
//!
//! ## Supported Services
//!
//! - **Jira**: REST v3 and Agile v1.0
//! - **Confluence**: `/wiki/rest/api`
//! - **Slack**: Web API methods
//! - **GitLab**: REST v4
//!
//! ## Architecture
//!
//! - [`operation`]: The service-independent description of what to do
//! - [`adapter`]: The [`ServiceAdapter`] capability and the adapter factory
//! - [`client`]: Authenticated HTTP client with retry
//! - [`retry`]: Backoff schedule and retry-after parsing
//! - [`common`]: Error taxonomy, requests, responses, records and pagination
//!
//! ## Usage
//!
//! ```rust,no_run
//! use enterprise_cli::api::{adapter_for, Operation, Verb, EntityKind};
//! use enterprise_cli::api::common::Service;
//! use enterprise_cli::auth::CredentialResolver;
//! use enterprise_cli::config::Config;
//!
//! # async fn example() -> Result<(), enterprise_cli::api::ApiError> {
//! let credential = CredentialResolver::from_environment().resolve(Service::Gitlab)?;
//! let adapter = adapter_for(&credential, &Config::default())?;
//!
//! let op = Operation::new(Service::Gitlab, Verb::List, EntityKind::MergeRequest)
//!     .with("project", "group/app");
//! for mr in adapter.perform(&op).await?.into_records().await? {
//!     println!("!{} {}", mr.text("iid"), mr.text("title"));
//! }
//! # Ok(())
//! # }
//! ```

/// The [`ServiceAdapter`] trait and adapter factory.
pub mod adapter;

/// Authenticated HTTP client with retry.
pub mod client;

/// Shared types: errors, requests, records, pagination.
pub mod common;

/// Confluence adapter.
pub mod confluence;

/// GitLab adapter.
pub mod gitlab;

/// Jira adapter.
pub mod jira;

/// Operations and their parameter rules.
pub mod operation;

/// Retry policy.
pub mod retry;

/// Slack adapter.
pub mod slack;

pub use adapter::{adapter_for, Outcome, ServiceAdapter};
pub use client::HttpClient;
pub use common::{ApiError, ApiRequest, ApiResponse, Record, Service};
pub use operation::{EntityKind, Operation, ParamValue, Verb};
pub use retry::RetryPolicy;
