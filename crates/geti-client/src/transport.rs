// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! HTTP transport used by the [`Session`](crate::Session).
//!
//! The session does not talk to reqwest directly. It builds an
//! [`HttpRequest`], hands it to an [`HttpTransport`] and reads status,
//! headers, cookies and body back from the [`HttpResponse`]. The production
//! implementation is [`ReqwestTransport`]; tests substitute an in-memory
//! transport.
//!
//! The transport does not keep a cookie store. Cookies set by the server are
//! reported per response and the session owns the jar, which lets it
//! invalidate individual cookies on logout.

use std::time::{Duration, SystemTime};

use crate::{
    Error, ServerConfig,
    retry::{create_retry_policy, log_retry_configuration},
};
use futures::future::BoxFuture;
use log::{Level, log_enabled, trace};
use reqwest::{Method, StatusCode, header::HeaderMap};
use serde_json::Value;

/// Body of an outgoing request.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    Json(Value),
    /// `application/x-www-form-urlencoded` fields.
    Form(Vec<(String, String)>),
}

#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
}

/// A cookie set by a response. A `value` of `None` means the server removed
/// the cookie (empty value, `Max-Age=0` or an expiry in the past).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseCookie {
    pub name: String,
    pub value: Option<String>,
}

impl ResponseCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        ResponseCookie {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn removed(name: impl Into<String>) -> Self {
        ResponseCookie {
            name: name.into(),
            value: None,
        }
    }

    /// Builds a cookie from its `Set-Cookie` attributes relative to `now`.
    pub fn from_attributes(
        name: &str,
        value: &str,
        max_age: Option<Duration>,
        expires: Option<SystemTime>,
        now: SystemTime,
    ) -> Self {
        let removed = value.is_empty()
            || max_age.is_some_and(|age| age.is_zero())
            || expires.is_some_and(|expires| expires <= now);
        if removed {
            ResponseCookie::removed(name)
        } else {
            ResponseCookie::new(name, value)
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub cookies: Vec<ResponseCookie>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: StatusCode) -> Self {
        HttpResponse {
            status,
            headers: HeaderMap::new(),
            cookies: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_json(mut self, body: &Value) -> Self {
        self.body = body.to_string().into_bytes();
        self
    }

    pub fn with_cookie(mut self, cookie: ResponseCookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// The body as text, for error reporting.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends HTTP requests on behalf of a session.
///
/// Implementations must be thread-safe (`Send + Sync`) as a transport is
/// shared between clones of a session.
pub trait HttpTransport: Send + Sync {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, Error>>;
}

/// [`HttpTransport`] backed by a reqwest client.
///
/// Redirects are not followed so that the cookies of every hop of the login
/// flow reach the session.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ServerConfig) -> Result<Self, Error> {
        log_retry_configuration(config);

        if !config.verify_certificate {
            log::warn!(
                "TLS certificate verification is disabled for {}",
                config.host
            );
        }

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout))
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(!config.verify_certificate)
            .retry(create_retry_policy(config))
            .build()?;

        Ok(ReqwestTransport { http })
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, Error>> {
        Box::pin(async move {
            let mut builder = self
                .http
                .request(request.method, &request.url)
                .headers(request.headers);
            builder = match request.body {
                Some(RequestBody::Json(body)) => builder.json(&body),
                Some(RequestBody::Form(fields)) => builder.form(&fields),
                None => builder,
            };

            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let now = SystemTime::now();
            let cookies = response
                .cookies()
                .map(|cookie| {
                    ResponseCookie::from_attributes(
                        cookie.name(),
                        cookie.value(),
                        cookie.max_age(),
                        cookie.expires(),
                        now,
                    )
                })
                .collect();
            let body = response.bytes().await?.to_vec();

            if log_enabled!(Level::Trace) {
                trace!(
                    "{} {} -> {} ({} bytes)",
                    request.url.split('?').next().unwrap_or_default(),
                    status,
                    status.canonical_reason().unwrap_or_default(),
                    body.len()
                );
            }

            Ok(HttpResponse {
                status,
                headers,
                cookies,
                body,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_with_value_is_present() {
        let now = SystemTime::now();
        let cookie = ResponseCookie::from_attributes(
            "geti-cookie",
            "abc",
            Some(Duration::from_secs(3600)),
            Some(now + Duration::from_secs(3600)),
            now,
        );
        assert_eq!(cookie, ResponseCookie::new("geti-cookie", "abc"));
    }

    #[test]
    fn test_cookie_removal_attributes() {
        let now = SystemTime::now();
        assert_eq!(
            ResponseCookie::from_attributes("a", "", None, None, now).value,
            None
        );
        assert_eq!(
            ResponseCookie::from_attributes("a", "x", Some(Duration::ZERO), None, now).value,
            None
        );
        assert_eq!(
            ResponseCookie::from_attributes(
                "a",
                "x",
                None,
                Some(now - Duration::from_secs(1)),
                now
            )
            .value,
            None
        );
    }

    #[test]
    fn test_response_builders() {
        let response = HttpResponse::new(StatusCode::OK)
            .with_json(&serde_json::json!({"ok": true}))
            .with_cookie(ResponseCookie::new("c", "1"));
        assert_eq!(response.text(), r#"{"ok":true}"#);
        assert_eq!(response.cookies.len(), 1);
    }

    #[test]
    fn test_reqwest_transport_builds() {
        let config = ServerConfig::new("https://geti.example.com", "user", "pw");
        assert!(ReqwestTransport::new(&config).is_ok());
    }
}
