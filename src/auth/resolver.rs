//
//  enterprise-cli
//  auth/resolver.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Credential resolution
//!
//! Sources are consulted in order and the first *complete* one is used as a
//! whole; fields are never mixed between sources:
//!
//! 1. Process environment variables
//! 2. The credential file (`~/.enterprise-tools/credentials.env`)
//!
//! | Service | Base URL key | Auth keys | Default base URL |
//! |---------|--------------|-----------|------------------|
//! | Jira | `JIRA_BASE_URL` | `JIRA_EMAIL`, `JIRA_API_TOKEN` | none |
//! | Confluence | `CONFLUENCE_BASE_URL` | `CONFLUENCE_EMAIL`, `CONFLUENCE_API_TOKEN` | none |
//! | Slack | `SLACK_BASE_URL` | `SLACK_BOT_TOKEN` | `https://slack.com/api` |
//! | GitLab | `GITLAB_BASE_URL` | `GITLAB_TOKEN` | `https://gitlab.com` |

use std::collections::HashMap;
use std::path::PathBuf;

use reqwest::header::HeaderValue;
use tracing::{debug, warn};
use url::Url;

use super::{AuthMaterial, Credential, CredentialSource};
use crate::api::common::{ApiError, Service};
use crate::config::{credentials_path, read_credential_file};

/// Variable names that make up one service's credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceKeys {
    /// Base URL variable
    pub base_url: &'static str,
    /// Account email variable, for Basic auth services
    pub email: Option<&'static str>,
    /// Token variable
    pub token: &'static str,
    /// Base URL used when the variable is absent
    pub default_base_url: Option<&'static str>,
}

impl ServiceKeys {
    /// Keys for a service.
    pub fn for_service(service: Service) -> Self {
        match service {
            Service::Jira => Self {
                base_url: "JIRA_BASE_URL",
                email: Some("JIRA_EMAIL"),
                token: "JIRA_API_TOKEN",
                default_base_url: None,
            },
            Service::Confluence => Self {
                base_url: "CONFLUENCE_BASE_URL",
                email: Some("CONFLUENCE_EMAIL"),
                token: "CONFLUENCE_API_TOKEN",
                default_base_url: None,
            },
            Service::Slack => Self {
                base_url: "SLACK_BASE_URL",
                email: None,
                token: "SLACK_BOT_TOKEN",
                default_base_url: Some("https://slack.com/api"),
            },
            Service::Gitlab => Self {
                base_url: "GITLAB_BASE_URL",
                email: None,
                token: "GITLAB_TOKEN",
                default_base_url: Some("https://gitlab.com"),
            },
        }
    }

    /// Keys that must be present for a source to be complete.
    pub fn required(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.default_base_url.is_none() {
            keys.push(self.base_url);
        }
        if let Some(email) = self.email {
            keys.push(email);
        }
        keys.push(self.token);
        keys
    }
}

/// Resolves per-service credentials from layered sources.
///
/// The environment is captured once at construction, which keeps resolution
/// deterministic and lets tests inject their own variables.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use enterprise_cli::api::common::Service;
/// use enterprise_cli::auth::CredentialResolver;
///
/// let env = HashMap::from([("SLACK_BOT_TOKEN".to_string(), "xoxb-1234".to_string())]);
/// let resolver = CredentialResolver::new(env, None);
///
/// let credential = resolver.resolve(Service::Slack).unwrap();
/// assert_eq!(credential.base_url.as_str(), "https://slack.com/api");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    env: HashMap<String, String>,
    file: Option<PathBuf>,
}

impl CredentialResolver {
    /// Creates a resolver over an explicit environment and credential file.
    pub fn new(env: HashMap<String, String>, file: Option<PathBuf>) -> Self {
        Self { env, file }
    }

    /// Creates a resolver over the process environment and the default
    /// credential file location.
    pub fn from_environment() -> Self {
        Self::new(std::env::vars().collect(), credentials_path())
    }

    /// The credential file this resolver reads, if any.
    pub fn file_path(&self) -> Option<&PathBuf> {
        self.file.as_ref()
    }

    /// Resolves the credential for a service.
    ///
    /// # Errors
    ///
    /// - [`ApiError::CredentialMissing`] when no source is complete
    /// - [`ApiError::Validation`] when the chosen source's base URL is not an
    ///   absolute http(s) URL, or its token cannot be sent as a header
    pub fn resolve(&self, service: Service) -> Result<Credential, ApiError> {
        let keys = ServiceKeys::for_service(service);

        if let Some(credential) =
            Self::from_source(service, &keys, &self.env, CredentialSource::Environment)?
        {
            debug!(service = service.name(), "Credentials resolved from environment");
            return Ok(credential);
        }

        let file_vars = self.read_file();
        if let (Some(vars), Some(path)) = (&file_vars, &self.file) {
            if let Some(credential) =
                Self::from_source(service, &keys, vars, CredentialSource::File(path.clone()))?
            {
                debug!(service = service.name(), "Credentials resolved from credential file");
                return Ok(credential);
            }
        }

        let env_missing = missing_keys(&keys, &self.env);
        let mut missing: Vec<String> = env_missing
            .iter()
            .filter(|key| match &file_vars {
                Some(vars) => lookup(vars, key).is_none(),
                None => true,
            })
            .map(|key| key.to_string())
            .collect();
        if missing.is_empty() {
            missing = env_missing.iter().map(|key| key.to_string()).collect();
        }

        Err(ApiError::CredentialMissing { service, missing })
    }

    fn read_file(&self) -> Option<HashMap<String, String>> {
        let path = self.file.as_ref()?;
        match read_credential_file(path) {
            Ok(vars) => vars,
            Err(e) => {
                warn!("Ignoring unreadable credential file: {:#}", e);
                None
            }
        }
    }

    fn from_source(
        service: Service,
        keys: &ServiceKeys,
        vars: &HashMap<String, String>,
        source: CredentialSource,
    ) -> Result<Option<Credential>, ApiError> {
        if !missing_keys(keys, vars).is_empty() {
            return Ok(None);
        }

        let raw_base = lookup(vars, keys.base_url)
            .or(keys.default_base_url)
            .unwrap_or_default();
        let base_url = parse_base_url(keys.base_url, raw_base)?;

        let token = lookup(vars, keys.token).unwrap_or_default().to_string();
        let auth = match keys.email.and_then(|key| lookup(vars, key)) {
            Some(email) => AuthMaterial::basic(email, token),
            None => AuthMaterial::bearer(token),
        };
        if HeaderValue::from_str(&auth.header_value()).is_err() {
            return Err(ApiError::validation(format!(
                "{} contains characters that are not allowed in an HTTP header",
                keys.token
            )));
        }

        Ok(Some(Credential {
            service,
            base_url,
            auth,
            source,
        }))
    }
}

fn lookup<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn missing_keys(keys: &ServiceKeys, vars: &HashMap<String, String>) -> Vec<&'static str> {
    keys.required()
        .into_iter()
        .filter(|key| lookup(vars, key).is_none())
        .collect()
}

fn parse_base_url(key: &str, raw: &str) -> Result<Url, ApiError> {
    let trimmed = raw.trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| ApiError::validation(format!("{} is not a valid URL: {}", key, e)))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ApiError::validation(format!(
            "{} must be an http(s) URL, got '{}'",
            key, trimmed
        )));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn credential_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_environment_beats_file_for_same_key() {
        let file = credential_file(
            "JIRA_BASE_URL=https://file.atlassian.net\nJIRA_EMAIL=file@example.com\nJIRA_API_TOKEN=file-token\n",
        );
        let resolver = CredentialResolver::new(
            env(&[
                ("JIRA_BASE_URL", "https://env.atlassian.net/"),
                ("JIRA_EMAIL", "env@example.com"),
                ("JIRA_API_TOKEN", "env-token"),
            ]),
            Some(file.path().to_path_buf()),
        );

        let credential = resolver.resolve(Service::Jira).unwrap();
        assert_eq!(credential.base_url.as_str(), "https://env.atlassian.net/");
        assert_eq!(credential.auth, AuthMaterial::basic("env@example.com", "env-token"));
        assert_eq!(credential.source, CredentialSource::Environment);
    }

    #[test]
    fn test_file_used_as_a_whole_when_environment_incomplete() {
        let file = credential_file(
            "# confluence\nCONFLUENCE_BASE_URL=\"https://wiki.example.com\"\nCONFLUENCE_EMAIL=file@example.com\nCONFLUENCE_API_TOKEN='tok-5678'\n",
        );
        let resolver = CredentialResolver::new(
            env(&[("CONFLUENCE_EMAIL", "env@example.com")]),
            Some(file.path().to_path_buf()),
        );

        let credential = resolver.resolve(Service::Confluence).unwrap();
        assert_eq!(credential.auth, AuthMaterial::basic("file@example.com", "tok-5678"));
        assert_eq!(
            credential.source,
            CredentialSource::File(file.path().to_path_buf())
        );
    }

    #[test]
    fn test_missing_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = CredentialResolver::new(
            env(&[("JIRA_EMAIL", "")]),
            Some(dir.path().join("credentials.env")),
        );

        match resolver.resolve(Service::Jira).unwrap_err() {
            ApiError::CredentialMissing { service, missing } => {
                assert_eq!(service, Service::Jira);
                assert_eq!(missing, vec!["JIRA_BASE_URL", "JIRA_EMAIL", "JIRA_API_TOKEN"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bearer_services_use_default_base_url() {
        let resolver = CredentialResolver::new(env(&[("GITLAB_TOKEN", "glpat-abcd")]), None);
        let credential = resolver.resolve(Service::Gitlab).unwrap();
        assert_eq!(credential.base_url.as_str(), "https://gitlab.com/");
        assert_eq!(credential.auth, AuthMaterial::bearer("glpat-abcd"));
    }

    #[test]
    fn test_invalid_base_url_is_validation_error() {
        let resolver = CredentialResolver::new(
            env(&[("SLACK_BOT_TOKEN", "xoxb-1"), ("SLACK_BASE_URL", "ftp://slack")]),
            None,
        );
        assert!(matches!(
            resolver.resolve(Service::Slack),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_token_with_control_characters_is_rejected() {
        let resolver = CredentialResolver::new(
            env(&[("SLACK_BOT_TOKEN", "xoxb-12\n34-secret")]),
            None,
        );
        let err = resolver.resolve(Service::Slack).unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("SLACK_BOT_TOKEN"));
        assert!(!err.to_string().contains("secret"));
    }

    #[test]
    fn test_required_keys() {
        assert_eq!(
            ServiceKeys::for_service(Service::Slack).required(),
            vec!["SLACK_BOT_TOKEN"]
        );
        assert_eq!(
            ServiceKeys::for_service(Service::Jira).required(),
            vec!["JIRA_BASE_URL", "JIRA_EMAIL", "JIRA_API_TOKEN"]
        );
    }
}
