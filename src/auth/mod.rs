//
//  enterprise-cli
//  auth/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Authentication Module
//!
//! Credential types and resolution for the four services.
//!
//! ## Supported Authentication Methods
//!
//! - **Basic**: Atlassian account email plus API token (Jira, Confluence)
//! - **Bearer**: bot token (Slack) or personal access token (GitLab)
//!
//! ## Module Structure
//!
//! - [`resolver`]: Layered lookup of credentials (environment, then credential file)
//!
//! ## Secret Handling
//!
//! Secrets never appear in logs or `Debug` output. Anything shown to the user
//! goes through [`mask_secret`], which keeps only the last four characters.
//!
//! ## Example
//!
//! ```rust
//! use enterprise_cli::auth::AuthMaterial;
//!
//! let auth = AuthMaterial::basic("dev@example.com", "api-token-1234");
//! assert_eq!(auth.masked(), "Basic dev@example.com:****1234");
//! assert!(auth.header_value().starts_with("Basic "));
//! ```

mod resolver;

pub use resolver::*;

use std::fmt;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;
use url::Url;

use crate::api::common::Service;

/// Authentication secret(s) for one service.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMaterial {
    /// HTTP Basic with an account email and API token.
    Basic {
        /// Account email
        email: String,
        /// API token
        token: String,
    },
    /// Bearer token.
    Bearer {
        /// Bot or personal access token
        token: String,
    },
}

impl AuthMaterial {
    /// Creates Basic auth material.
    pub fn basic(email: impl Into<String>, token: impl Into<String>) -> Self {
        Self::Basic {
            email: email.into(),
            token: token.into(),
        }
    }

    /// Creates Bearer auth material.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// The `Authorization` header value.
    pub fn header_value(&self) -> String {
        match self {
            Self::Basic { email, token } => {
                format!("Basic {}", STANDARD.encode(format!("{}:{}", email, token)))
            }
            Self::Bearer { token } => format!("Bearer {}", token),
        }
    }

    /// Sets the `Authorization` header on a request builder.
    pub fn apply_to_request(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, self.header_value())
    }

    /// Scheme name (`Basic` or `Bearer`).
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Basic { .. } => "Basic",
            Self::Bearer { .. } => "Bearer",
        }
    }

    /// Display form with the token masked.
    pub fn masked(&self) -> String {
        match self {
            Self::Basic { email, token } => format!("Basic {}:{}", email, mask_secret(token)),
            Self::Bearer { token } => format!("Bearer {}", mask_secret(token)),
        }
    }
}

impl fmt::Debug for AuthMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

/// Where a resolved credential came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Process environment variables
    Environment,
    /// The credential file at this path
    File(PathBuf),
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment => f.write_str("environment"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Resolved, immutable credential for one service.
///
/// Created once per invocation by the [`CredentialResolver`] and passed
/// explicitly to the adapter that needs it.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    /// The service this credential addresses
    pub service: Service,
    /// API base URL without trailing slash
    pub base_url: Url,
    /// Authentication material
    pub auth: AuthMaterial,
    /// Which source supplied it
    pub source: CredentialSource,
}

/// Masks a secret, keeping only its last four characters.
///
/// Secrets of four characters or fewer are masked completely.
///
/// # Example
///
/// ```rust
/// use enterprise_cli::auth::mask_secret;
///
/// assert_eq!(mask_secret("xoxb-123456789"), "****6789");
/// assert_eq!(mask_secret("abc"), "****");
/// ```
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{}", tail)
}
