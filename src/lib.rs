//
//  enterprise-cli
//  lib.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Enterprise CLI Library
//!
//! One command-line interface for four enterprise services: Jira,
//! Confluence, Slack and GitLab.
//!
//! ## Overview
//!
//! Every command becomes an [`Operation`](api::operation::Operation) that
//! flows through the same pipeline:
//!
//! ```text
//! CLI args -> Operation -> CredentialResolver -> ServiceAdapter
//!          -> HttpClient (retry) -> Paginator -> Record -> render -> stdout
//! ```
//!
//! Failures are classified into one [`ApiError`](api::common::ApiError)
//! taxonomy and mapped to a stable process exit code (see [`exit_codes`]).
//!
//! ## Module Structure
//!
//! - [`cli`]: Command-line interface definitions and dispatch
//! - [`api`]: HTTP client, retry, pagination and the four service adapters
//! - [`auth`]: Credential resolution and masking
//! - [`config`]: Settings file, environment overrides and the credential file
//! - [`output`]: Summary, table, keys and full renderers
//! - [`util`]: Text helpers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use enterprise_cli::api::common::Service;
//! use enterprise_cli::auth::CredentialResolver;
//!
//! let resolver = CredentialResolver::from_environment();
//! match resolver.resolve(Service::Gitlab) {
//!     Ok(credential) => println!("GitLab at {}", credential.base_url),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```
//!
//! ## Services
//!
//! | Service | Binary | Auth | API |
//! |---------|--------|------|-----|
//! | Jira | `jira-cli` | Basic (email + API token) | REST v3, Agile 1.0 |
//! | Confluence | `confluence-cli` | Basic (email + API token) | `/wiki/rest/api` |
//! | Slack | `slack-cli` | Bearer (bot token) | Web API |
//! | GitLab | `gitlab-cli` | Bearer (access token) | REST v4 |

/// Command-line interface definitions.
///
/// Contains the `ent` command tree, the per-service subcommands shared with
/// the standalone binaries, and the dispatcher that runs them.
pub mod cli;

/// API client and service adapters.
///
/// The HTTP client handles authentication, retries and timeouts; the
/// adapters translate operations into each service's wire format.
pub mod api;

/// Credential resolution.
///
/// Credentials come from the environment first, then the credential file.
/// Secret values are never logged and are masked when displayed.
pub mod auth;

/// Configuration management.
///
/// Settings are stored in platform-specific locations:
/// - Linux: `~/.config/ent/config.toml`
/// - macOS: `~/Library/Application Support/ent/config.toml`
/// - Windows: `%APPDATA%\ent\config.toml`
pub mod config;

/// Output formatting.
pub mod output;

/// Utility functions.
pub mod util;

pub use cli::Cli;
pub use config::Config;

/// Application name constant.
///
/// The name of the umbrella binary, used for display purposes and
/// configuration paths.
pub const APP_NAME: &str = "ent";

/// Application version constant.
///
/// ```rust
/// use enterprise_cli::VERSION;
///
/// println!("ent version {}", VERSION);
/// ```
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit codes for the CLI.
///
/// The mapping is stable so scripts can branch on the exit code alone.
///
/// | Code | Meaning |
/// |------|---------|
/// | `0` | success |
/// | `1` | authentication or credential failure |
/// | `2` | request error (validation, not found, rejected, usage) |
/// | `3` | network or transport failure after retries |
///
/// # Example
///
/// ```rust,no_run
/// use enterprise_cli::exit_codes;
/// use std::process;
///
/// process::exit(exit_codes::AUTH_ERROR);
/// ```
pub mod exit_codes {
    use crate::api::common::ApiError;

    /// Successful execution.
    pub const SUCCESS: i32 = 0;

    /// Missing credentials or an authentication failure.
    ///
    /// Check `ent credentials` for which keys are missing.
    pub const AUTH_ERROR: i32 = 1;

    /// The request itself was wrong.
    ///
    /// Invalid arguments, a not-found entity, or an action the service
    /// refused. Retrying the same command will fail the same way.
    pub const REQUEST_ERROR: i32 = 2;

    /// The service could not be reached or kept failing.
    ///
    /// Connection failures, timeouts, persistent 5xx or 429 responses and
    /// unexpected response bodies. A later retry may succeed.
    pub const NETWORK_ERROR: i32 = 3;

    /// Maps a command failure to its exit code.
    ///
    /// Classified [`ApiError`]s use [`ApiError::exit_code`]; clap usage
    /// errors use clap's own code; anything else is a request error.
    pub fn for_error(error: &anyhow::Error) -> i32 {
        if let Some(api) = error.downcast_ref::<ApiError>() {
            return api.exit_code();
        }
        if let Some(usage) = error.downcast_ref::<clap::Error>() {
            return usage.exit_code();
        }
        REQUEST_ERROR
    }

}
