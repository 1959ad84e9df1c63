// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Retry classification for requests made by [`ReqwestTransport`].
//!
//! Requests fall into two scopes, told apart by the URL path:
//!
//! - **PlatformApi**: REST calls under `/api`. Server errors (5xx), 408
//!   Request Timeout, 429 Too Many Requests and transport failures are
//!   retried. 401 and 403 are returned immediately so that the session can
//!   re-authenticate or report the failure.
//! - **Authentication**: the login and sign-out flows. Credentials are never
//!   replayed after the server answered, so only transport failures (no
//!   response at all) and explicit back-off requests (429, 503) are retried.
//!
//! The retry count comes from [`ServerConfig::max_retries`] and can be
//! overridden with `GETI_MAX_RETRIES`.
//!
//! ```rust
//! use geti_client::{RetryScope, classify_url};
//!
//! assert_eq!(
//!     classify_url("https://geti.example.com/api/v1/workspaces"),
//!     RetryScope::PlatformApi
//! );
//! assert_eq!(
//!     classify_url("https://geti.example.com/dex/auth/regular/login"),
//!     RetryScope::Authentication
//! );
//! ```
//!
//! [`ReqwestTransport`]: crate::ReqwestTransport
//! [`ServerConfig::max_retries`]: crate::ServerConfig::max_retries

use crate::ServerConfig;
use url::Url;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetryScope {
    /// REST calls under `/api`.
    PlatformApi,
    /// Login, sign-out and anything else outside the REST API.
    Authentication,
}

/// Classifies a request URL into its [`RetryScope`].
///
/// The path must be exactly `/api` or start with `/api/`; `/apis` or
/// `/dex/api` do not qualify. Unparsable URLs are treated as
/// [`RetryScope::Authentication`], the more conservative scope.
pub fn classify_url(url: &str) -> RetryScope {
    if let Ok(parsed) = Url::parse(url)
        && (parsed.scheme() == "http" || parsed.scheme() == "https")
    {
        let path = parsed.path();
        if path == "/api" || path.starts_with("/api/") {
            return RetryScope::PlatformApi;
        }
    }

    RetryScope::Authentication
}

/// The retry count: `GETI_MAX_RETRIES` when set and valid, otherwise the
/// configured value.
pub fn max_retries(config: &ServerConfig) -> u32 {
    std::env::var("GETI_MAX_RETRIES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(config.max_retries)
}

/// Creates a reqwest retry policy that applies the classification above to
/// every request.
pub fn create_retry_policy(config: &ServerConfig) -> reqwest::retry::Builder {
    reqwest::retry::for_host("*")
        .max_retries_per_request(max_retries(config))
        .classify_fn(|req_rep| {
            let url = req_rep.uri().to_string();

            match classify_url(&url) {
                RetryScope::PlatformApi => match req_rep.status() {
                    Some(status) => match status.as_u16() {
                        401 | 403 => req_rep.success(),
                        408 | 429 | 500..=599 => req_rep.retryable(),
                        _ => req_rep.success(),
                    },
                    None if req_rep.error().is_some() => req_rep.retryable(),
                    None => req_rep.success(),
                },
                RetryScope::Authentication => match req_rep.status() {
                    Some(status) => match status.as_u16() {
                        429 | 503 => req_rep.retryable(),
                        _ => req_rep.success(),
                    },
                    None if req_rep.error().is_some() => req_rep.retryable(),
                    None => req_rep.success(),
                },
            }
        })
}

pub fn log_retry_configuration(config: &ServerConfig) {
    log::debug!(
        "Retry configuration - max_retries={}, timeout={}s",
        max_retries(config),
        config.timeout
    );
}
