//
//  enterprise-cli
//  api/client.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Authenticated HTTP Client
//!
//! This module executes [`ApiRequest`]s against the four services. It is the
//! only place in the crate that talks to the network.
//!
//! ## Features
//!
//! - `Authorization` header applied on every attempt
//! - Per-attempt timeout (connect, response and body read)
//! - Outcome classification into the shared [`ApiError`] taxonomy
//! - Bounded exponential backoff for transient failures, honouring `Retry-After`
//! - Custom User-Agent header
//!
//! ## Classification
//!
//! | Outcome | Result | Retried |
//! |---------|--------|---------|
//! | 2xx | [`ApiResponse`] | n/a |
//! | 2xx rejected by the request's [`BodyCheck`] | the check's error | if transient |
//! | 429 | [`ApiError::RateLimited`] | yes |
//! | 5xx | [`ApiError::Server`] | yes |
//! | connect failure | [`ApiError::Network`] | yes |
//! | timeout / reset / body read | [`ApiError::Network`] | only if the request is replayable |
//! | any other status | [`ApiError::Client`] | never |
//! | request cannot be built (e.g. bad header value) | [`ApiError::Validation`] | never |
//!
//! A `POST` or `PATCH` that reached the server may already have been applied,
//! so it is resent only when the connection was never established, unless
//! the adapter marked it [`ApiRequest::replayable`].

use std::time::Duration;

use reqwest::header::{ACCEPT, RETRY_AFTER};
use reqwest::Client;
use tracing::{debug, warn};

use super::common::{
    extract_error_message, ApiError, ApiRequest, ApiResponse, BodyCheck, ClientErrorKind,
};
use super::retry::{parse_retry_after, RetryPolicy};
use crate::auth::AuthMaterial;

/// Result of a single attempt, before the retry decision.
enum Attempt {
    Success(ApiResponse),
    Terminal(ApiError),
    Transient {
        error: ApiError,
        retry_after: Option<Duration>,
    },
}

/// HTTP client bound to one service's credential.
///
/// The client owns a `reqwest::Client` (connection pool, timeout, user agent),
/// the auth material to apply and the default retry policy.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use enterprise_cli::api::client::HttpClient;
/// use enterprise_cli::api::common::ApiRequest;
/// use enterprise_cli::api::retry::RetryPolicy;
/// use enterprise_cli::auth::AuthMaterial;
/// use url::Url;
///
/// # async fn example() -> Result<(), enterprise_cli::api::common::ApiError> {
/// let client = HttpClient::new(
///     AuthMaterial::bearer("glpat-xxxx"),
///     Duration::from_secs(30),
///     RetryPolicy::default(),
/// )?;
///
/// let url = Url::parse("https://gitlab.com/api/v4/user").unwrap();
/// let response = client.execute(&ApiRequest::get(url)).await?;
/// println!("{} after {} attempt(s)", response.status, response.attempts);
/// # Ok(())
/// # }
/// ```
pub struct HttpClient {
    http: Client,
    auth: AuthMaterial,
    policy: RetryPolicy,
}

impl HttpClient {
    /// Creates a client.
    ///
    /// # Parameters
    ///
    /// * `auth` - Authentication material applied to every attempt
    /// * `timeout` - Timeout for a single attempt
    /// * `policy` - Default retry policy for [`HttpClient::execute`]
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the TLS backend cannot be initialised.
    pub fn new(auth: AuthMaterial, timeout: Duration, policy: RetryPolicy) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network {
                attempts: 0,
                message: format!("failed to initialise HTTP client: {}", e),
            })?;

        Ok(Self { http, auth, policy })
    }

    /// The default retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Executes a request with the client's default retry policy.
    pub async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.execute_with(request, &self.policy).await
    }

    /// Executes a request with an explicit retry policy.
    ///
    /// # Returns
    ///
    /// The first 2xx response, with [`ApiResponse::attempts`] set to the
    /// number of attempts it took.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Client`] immediately for any non-429 4xx
    /// - [`ApiError::RateLimited`], [`ApiError::Server`] or [`ApiError::Network`]
    ///   once `policy.max_attempts` attempts have all failed transiently; the
    ///   last failure is the one returned
    pub async fn execute_with(
        &self,
        request: &ApiRequest,
        policy: &RetryPolicy,
    ) -> Result<ApiResponse, ApiError> {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!(attempt, max_attempts, request = %request.describe(), "Sending request");

            match self.attempt(request, attempt).await {
                Attempt::Success(response) => {
                    debug!(status = response.status, attempt, "Request succeeded");
                    return Ok(response);
                }
                Attempt::Terminal(error) => return Err(error),
                Attempt::Transient { error, retry_after } => {
                    if attempt >= max_attempts {
                        return Err(error);
                    }
                    let delay = policy.delay_before(attempt + 1, retry_after);
                    warn!(
                        "{} (attempt {}/{}), retrying in {}ms",
                        error,
                        attempt,
                        max_attempts,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(&self, request: &ApiRequest, attempt: u32) -> Attempt {
        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .header(ACCEPT, "application/json");
        builder = self.auth.apply_to_request(builder);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return network_failure(request, attempt, &e),
        };

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return network_failure(request, attempt, &e),
        };

        match status {
            200..=299 => {
                let response = ApiResponse {
                    status,
                    headers,
                    body,
                    attempts: attempt,
                };
                match request.body_check {
                    Some(check) => checked(check, response),
                    None => Attempt::Success(response),
                }
            }
            429 => {
                let retry_after = headers
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_retry_after);
                Attempt::Transient {
                    error: ApiError::RateLimited {
                        attempts: attempt,
                        retry_after,
                    },
                    retry_after,
                }
            }
            500..=599 => Attempt::Transient {
                error: ApiError::Server {
                    status,
                    attempts: attempt,
                    message: extract_error_message(status, &body),
                },
                retry_after: None,
            },
            _ => Attempt::Terminal(ApiError::Client {
                status: Some(status),
                kind: ClientErrorKind::from_status(status),
                message: extract_error_message(status, &body),
            }),
        }
    }
}

fn checked(check: BodyCheck, response: ApiResponse) -> Attempt {
    match (check.0)(&response) {
        Ok(()) => Attempt::Success(response),
        Err(error) if error.is_retryable() => {
            let retry_after = match &error {
                ApiError::RateLimited { retry_after, .. } => *retry_after,
                _ => None,
            };
            Attempt::Transient { error, retry_after }
        }
        Err(error) => Attempt::Terminal(error),
    }
}

fn network_failure(request: &ApiRequest, attempt: u32, error: &reqwest::Error) -> Attempt {
    if error.is_builder() {
        return Attempt::Terminal(ApiError::validation(format!(
            "{} could not be built: {}",
            request.describe(),
            error
        )));
    }
    let message = if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    };
    let failure = ApiError::Network {
        attempts: attempt,
        message,
    };
    if !error.is_connect() && !request.replayable {
        warn!(request = %request.describe(), "Transport failure after the request was sent, not retrying");
        return Attempt::Terminal(failure);
    }
    Attempt::Transient {
        error: failure,
        retry_after: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use url::Url;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(5),
        }
    }

    fn client(policy: RetryPolicy) -> HttpClient {
        HttpClient::new(AuthMaterial::bearer("xoxb-test-1234"), Duration::from_secs(5), policy).unwrap()
    }

    fn url(server: &Server, path: &str) -> Url {
        Url::parse(&format!("{}{}", server.url(), path)).unwrap()
    }

    #[tokio::test]
    async fn test_rate_limited_twice_then_success() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("GET", "/issue")
            .with_status(429)
            .with_header("Retry-After", "0")
            .expect(2)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/issue")
            .with_status(200)
            .with_body(r#"{"key":"PROJ-1"}"#)
            .expect(1)
            .create_async()
            .await;

        let response = client(fast_policy(3))
            .execute(&ApiRequest::get(url(&server, "/issue")))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.attempts, 3);
        assert_eq!(response.json().unwrap()["key"], "PROJ-1");
        limited.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_retry_after_hint_is_honoured() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("GET", "/slow")
            .with_status(429)
            .with_header("Retry-After", "1")
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/slow")
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let started = Instant::now();
        let response = client(fast_policy(3))
            .execute(&ApiRequest::get(url(&server, "/slow")))
            .await
            .unwrap();

        assert_eq!(response.attempts, 2);
        assert!(started.elapsed() >= Duration::from_secs(1));
        limited.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let mut server = Server::new_async().await;
        let missing = server
            .mock("GET", "/rest/api/3/issue/NOPE-999")
            .with_status(404)
            .with_body(r#"{"errorMessages":["Issue does not exist or you do not have permission to see it."],"errors":{}}"#)
            .expect(1)
            .create_async()
            .await;

        let err = client(fast_policy(3))
            .execute(&ApiRequest::get(url(&server, "/rest/api/3/issue/NOPE-999")))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("Issue does not exist"));
        missing.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth_exit_code() {
        let mut server = Server::new_async().await;
        let denied = server
            .mock("GET", "/api/v4/user")
            .with_status(401)
            .with_body(r#"{"message":"401 Unauthorized"}"#)
            .expect(1)
            .create_async()
            .await;

        let err = client(fast_policy(3))
            .execute(&ApiRequest::get(url(&server, "/api/v4/user")))
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 1);
        denied.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_exhausts_attempts() {
        let mut server = Server::new_async().await;
        let failing = server
            .mock("GET", "/flaky")
            .with_status(503)
            .with_body(r#"{"message":"maintenance"}"#)
            .expect(3)
            .create_async()
            .await;

        let err = client(fast_policy(3))
            .execute(&ApiRequest::get(url(&server, "/flaky")))
            .await
            .unwrap_err();

        match err {
            ApiError::Server {
                status,
                attempts,
                message,
            } => {
                assert_eq!(status, 503);
                assert_eq!(attempts, 3);
                assert_eq!(message, "maintenance");
            }
            other => panic!("unexpected error: {other}"),
        }
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_persistent_rate_limit_surfaces_rate_limited() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("GET", "/limited")
            .with_status(429)
            .expect(2)
            .create_async()
            .await;

        let err = client(fast_policy(2))
            .execute(&ApiRequest::get(url(&server, "/limited")))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::RateLimited { attempts: 2, .. }));
        assert_eq!(err.exit_code(), 3);
        limited.assert_async().await;
    }

    #[tokio::test]
    async fn test_auth_header_and_body_sent() {
        let mut server = Server::new_async().await;
        let post = server
            .mock("POST", "/chat.postMessage")
            .match_header("authorization", "Bearer xoxb-test-1234")
            .match_header("x-extra", "1")
            .match_body(Matcher::PartialJson(serde_json::json!({"channel": "C1"})))
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .expect(1)
            .create_async()
            .await;

        let request = ApiRequest::post(url(&server, "/chat.postMessage"))
            .header("x-extra", "1")
            .json(serde_json::json!({"channel": "C1", "text": "hi"}));
        client(fast_policy(1)).execute(&request).await.unwrap();

        post.assert_async().await;
    }

    /// Accepts connections, reads whatever arrives and hangs up without
    /// answering. Returns the URL to hit and the accepted-connection count.
    async fn hang_up_server() -> (Url, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                drop(socket);
            }
        });
        let url = Url::parse(&format!("http://{}/rest/api/3/issue", addr)).unwrap();
        (url, accepted)
    }

    #[tokio::test]
    async fn test_dropped_post_is_not_resent() {
        let (url, accepted) = hang_up_server().await;
        let request = ApiRequest::post(url).json(serde_json::json!({"fields": {"summary": "x"}}));

        let err = client(fast_policy(3)).execute(&request).await.unwrap_err();

        assert!(matches!(err, ApiError::Network { attempts: 1, .. }));
        assert_eq!(err.exit_code(), 3);
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_get_is_resent() {
        let (url, accepted) = hang_up_server().await;

        let err = client(fast_policy(3))
            .execute(&ApiRequest::get(url))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Network { attempts: 3, .. }));
        assert_eq!(accepted.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_dropped_replayable_post_is_resent() {
        let (url, accepted) = hang_up_server().await;
        let request = ApiRequest::post(url).json(serde_json::json!({"jql": "project = X"})).replayable();

        let err = client(fast_policy(2)).execute(&request).await.unwrap_err();

        assert!(matches!(err, ApiError::Network { attempts: 2, .. }));
        assert_eq!(accepted.load(Ordering::SeqCst), 2);
    }

    fn reject_ok_false(response: &ApiResponse) -> Result<(), ApiError> {
        match response.json()?["ok"].as_bool() {
            Some(true) => Ok(()),
            _ => Err(ApiError::RateLimited {
                attempts: response.attempts,
                retry_after: None,
            }),
        }
    }

    fn reject_always(_: &ApiResponse) -> Result<(), ApiError> {
        Err(ApiError::client(ClientErrorKind::BadRequest, "invalid_blocks"))
    }

    #[tokio::test]
    async fn test_body_check_failure_is_retried_when_transient() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("POST", "/chat.postMessage")
            .with_status(200)
            .with_body(r#"{"ok":false,"error":"ratelimited"}"#)
            .expect(2)
            .create_async()
            .await;
        let ok = server
            .mock("POST", "/chat.postMessage")
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .expect(1)
            .create_async()
            .await;

        let request = ApiRequest::post(url(&server, "/chat.postMessage"))
            .json(serde_json::json!({"channel": "C1", "text": "hi"}))
            .check_body(BodyCheck(reject_ok_false));
        let response = client(fast_policy(3)).execute(&request).await.unwrap();

        assert_eq!(response.attempts, 3);
        limited.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_body_check_client_error_is_terminal() {
        let mut server = Server::new_async().await;
        let rejected = server
            .mock("POST", "/chat.postMessage")
            .with_status(200)
            .with_body(r#"{"ok":false,"error":"invalid_blocks"}"#)
            .expect(1)
            .create_async()
            .await;

        let request =
            ApiRequest::post(url(&server, "/chat.postMessage")).check_body(BodyCheck(reject_always));
        let err = client(fast_policy(3)).execute(&request).await.unwrap_err();

        assert_eq!(err.exit_code(), 2);
        rejected.assert_async().await;
    }

    #[tokio::test]
    async fn test_unsendable_header_is_validation_error() {
        let (url, accepted) = hang_up_server().await;
        let request = ApiRequest::get(url).header("x-extra", "line\nbreak");

        let err = client(fast_policy(3)).execute(&request).await.unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(accepted.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_failure() {
        let request = ApiRequest::get(Url::parse("http://127.0.0.1:1/unreachable").unwrap());
        let err = client(fast_policy(2)).execute(&request).await.unwrap_err();

        assert!(matches!(err, ApiError::Network { attempts: 2, .. }));
        assert_eq!(err.exit_code(), 3);
    }
}
