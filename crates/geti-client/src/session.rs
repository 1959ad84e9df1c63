// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use std::{collections::HashMap, sync::Arc};

use crate::{
    Error, PlatformVersion, ServerConfig,
    transport::{HttpRequest, HttpResponse, HttpTransport, RequestBody, ReqwestTransport, ResponseCookie},
};
use itertools::Itertools as _;
use log::{Level, debug, error, info, log_enabled, trace, warn};
use reqwest::{
    Method, StatusCode,
    header::{
        ACCEPT, ACCEPT_LANGUAGE, CONNECTION, COOKIE, HeaderMap, HeaderName, HeaderValue,
        UPGRADE_INSECURE_REQUESTS, USER_AGENT,
    },
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::sync::RwLock;

/// Login endpoint, relative to the host.
pub const LOGIN_PATH: &str = "dex/auth/regular/login";
/// Sign-out endpoint, relative to the host.
pub const LOGOUT_PATH: &str = "oauth2/sign_out";
/// Product information endpoint, relative to the host.
pub const PRODUCT_INFO_PATH: &str = "api/v1/product_info";

const PRODUCT_VERSION_KEY: &str = "product-version";

/// Headers every session starts with and returns to on logout.
pub fn initial_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("Geti Client/", env!("CARGO_PKG_VERSION"))),
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/html;q=0.9, */*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    LoggedOut,
}

/// State of a cookie name the session has seen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CookieValue {
    Present(String),
    /// Removed by the server or by logout. The name stays tracked.
    Invalidated,
}

/// Cookies of a session.
///
/// A name is either never seen (absent from the jar), present with a value,
/// or invalidated. [`CookieJar::len`] counts present cookies only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CookieJar {
    entries: HashMap<String, CookieValue>,
}

impl CookieJar {
    /// Number of cookies that currently have a value.
    pub fn len(&self) -> usize {
        self.present().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value of a present cookie.
    pub fn get(&self, name: &str) -> Option<&str> {
        match self.entries.get(name) {
            Some(CookieValue::Present(value)) => Some(value),
            _ => None,
        }
    }

    /// Tracked state of `name`; `None` if the name was never seen.
    pub fn state(&self, name: &str) -> Option<&CookieValue> {
        self.entries.get(name)
    }

    /// Names of all tracked cookies, present or invalidated.
    pub fn tracked_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Present cookies as `(name, value)` pairs, sorted by name.
    pub fn present(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(name, value)| match value {
                CookieValue::Present(value) => Some((name.as_str(), value.as_str())),
                CookieValue::Invalidated => None,
            })
            .sorted()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(name.into(), CookieValue::Present(value.into()));
    }

    pub fn invalidate(&mut self, name: impl Into<String>) {
        self.entries.insert(name.into(), CookieValue::Invalidated);
    }

    pub fn invalidate_all(&mut self) {
        for value in self.entries.values_mut() {
            *value = CookieValue::Invalidated;
        }
    }

    /// Applies the cookies set by a response.
    pub fn merge(&mut self, cookies: &[ResponseCookie]) {
        for cookie in cookies {
            match &cookie.value {
                Some(value) => self.set(cookie.name.clone(), value.clone()),
                None => self.invalidate(cookie.name.clone()),
            }
        }
    }

    /// Value of the `Cookie` request header, if any cookie is present.
    pub fn header_value(&self) -> Option<String> {
        let value = self
            .present()
            .map(|(name, value)| format!("{}={}", name, value))
            .join("; ");
        (!value.is_empty()).then_some(value)
    }
}

#[derive(Deserialize)]
struct WorkspaceList {
    #[serde(default)]
    items: Vec<Workspace>,
}

#[derive(Deserialize)]
struct Workspace {
    id: String,
    #[serde(default)]
    name: String,
}

/// An authenticated connection to the platform.
///
/// A session owns the cookies and headers sent with every request. It is
/// created unauthenticated by [`Session::new`]; [`Session::connect`] also
/// logs in and reads the platform version. `Session` is cheap to clone and
/// clones share their state.
///
/// # Examples
///
/// ```rust,no_run
/// use geti_client::{Error, ServerConfig, Session};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Error> {
/// let config = ServerConfig::new("https://geti.example.com", "annotator", "secret");
/// let session = Session::with_reqwest(config)?;
/// session.authenticate().await?;
///
/// let workspace_id = session.workspace_id().await?;
/// println!("Connected to workspace {}", workspace_id);
///
/// session.logout().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    config: ServerConfig,
    transport: Arc<dyn HttpTransport>,
    state: Arc<RwLock<SessionState>>,
    cookies: Arc<RwLock<CookieJar>>,
    headers: Arc<RwLock<HeaderMap>>,
    version: Arc<RwLock<PlatformVersion>>,
    workspace_id: Arc<RwLock<Option<String>>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.config.host)
            .field("username", &self.config.username)
            .finish()
    }
}

impl Session {
    pub fn new(config: ServerConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Session {
            config,
            transport,
            state: Arc::new(RwLock::new(SessionState::Unauthenticated)),
            cookies: Arc::new(RwLock::new(CookieJar::default())),
            headers: Arc::new(RwLock::new(initial_headers())),
            version: Arc::new(RwLock::new(PlatformVersion::UNKNOWN)),
            workspace_id: Arc::new(RwLock::new(None)),
        }
    }

    /// Unauthenticated session using [`ReqwestTransport`].
    pub fn with_reqwest(config: ServerConfig) -> Result<Self, Error> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    /// Creates a session, logs in and reads the platform version.
    pub async fn connect(
        config: ServerConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, Error> {
        let session = Self::new(config, transport);
        session.authenticate().await?;
        session.negotiate_version().await?;
        Ok(session)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    pub async fn cookies(&self) -> CookieJar {
        self.cookies.read().await.clone()
    }

    pub async fn headers(&self) -> HeaderMap {
        self.headers.read().await.clone()
    }

    /// Adds a header sent with every subsequent request. Logout drops it.
    pub async fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.headers.write().await.insert(name, value);
    }

    pub async fn version(&self) -> PlatformVersion {
        *self.version.read().await
    }

    /// Logs in with the configured credentials.
    ///
    /// Fails with [`Error::Authentication`] when the host cannot be reached,
    /// the credentials are rejected, or the server does not issue a session
    /// cookie.
    #[cfg_attr(feature = "profiling", tracing::instrument(skip_all))]
    pub async fn authenticate(&self) -> Result<(), Error> {
        let url = self.config.url_for(LOGIN_PATH);
        let form = vec![
            ("login".to_string(), self.config.username.clone()),
            ("password".to_string(), self.config.password.clone()),
        ];

        let response = self
            .send(Method::POST, &url, Some(RequestBody::Form(form)))
            .await
            .map_err(|err| {
                Error::Authentication(format!("unable to reach {}: {}", self.config.host, err))
            })?;

        match response.status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(Error::Authentication(format!(
                    "invalid credentials for user '{}'",
                    self.config.username
                )));
            }
            status if !(status.is_success() || status.is_redirection()) => {
                return Err(Error::Authentication(format!(
                    "login to {} returned HTTP {}",
                    self.config.host, status
                )));
            }
            _ => {}
        }

        if !response.cookies.iter().any(|cookie| cookie.value.is_some()) {
            return Err(Error::Authentication(format!(
                "{} did not issue a session cookie",
                self.config.host
            )));
        }

        *self.state.write().await = SessionState::Authenticated;
        info!(
            "Authenticated on host {} as user {}",
            self.config.host, self.config.username
        );
        Ok(())
    }

    /// Reads the platform version from the product information endpoint.
    ///
    /// A server that does not report its version yields
    /// [`PlatformVersion::UNKNOWN`].
    pub async fn negotiate_version(&self) -> Result<PlatformVersion, Error> {
        let url = self.config.url_for(PRODUCT_INFO_PATH);
        let response = self.send(Method::GET, &url, None).await?;

        let version = if response.status.is_success() {
            serde_json::from_slice::<Value>(&response.body)
                .ok()
                .and_then(|info| {
                    info.get(PRODUCT_VERSION_KEY)
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .and_then(|text| match text.parse::<PlatformVersion>() {
                    Ok(version) => Some(version),
                    Err(err) => {
                        warn!("Unrecognised platform version '{}': {}", text, err);
                        None
                    }
                })
                .unwrap_or(PlatformVersion::UNKNOWN)
        } else {
            debug!(
                "Product information not available (HTTP {})",
                response.status
            );
            PlatformVersion::UNKNOWN
        };

        debug!("Platform version: {}", version);
        *self.version.write().await = version;
        Ok(version)
    }

    /// Signs out and clears the local session state.
    ///
    /// Afterwards no cookie is present (invalidated names stay tracked), the
    /// headers are exactly [`initial_headers`] and the state is
    /// [`SessionState::LoggedOut`]. The local state is cleared even if the
    /// sign-out request fails.
    #[cfg_attr(feature = "profiling", tracing::instrument(skip_all))]
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.config.url_for(LOGOUT_PATH);
        match self.send(Method::GET, &url, None).await {
            Ok(response) if !(response.status.is_success() || response.status.is_redirection()) => {
                warn!("Sign out returned HTTP {}", response.status);
            }
            Ok(_) => {}
            Err(err) => warn!("Sign out request failed: {}", err),
        }

        self.cookies.write().await.invalidate_all();
        *self.headers.write().await = initial_headers();
        *self.workspace_id.write().await = None;
        *self.state.write().await = SessionState::LoggedOut;
        info!("Logged out of {}", self.config.host);
        Ok(())
    }

    /// Resolves `url` against the REST API root. Absolute URLs pass through
    /// and paths starting with `/` are taken relative to the host.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            self.config.url_for(url)
        } else {
            self.config.api_url(url)
        }
    }

    /// Sends a JSON request to the REST API and decodes the JSON response.
    ///
    /// An empty response body decodes from JSON `null`, so `Option<R>` reads
    /// it as `None`. On 401 the session logs in again once and repeats the
    /// request. Other non-success statuses fail with [`Error::HttpStatus`].
    #[cfg_attr(feature = "profiling", tracing::instrument(skip(self, body)))]
    pub async fn rest<B, R>(&self, method: Method, url: &str, body: Option<&B>) -> Result<R, Error>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = body.map(serde_json::to_value).transpose()?;

        if log_enabled!(Level::Trace)
            && let Some(body) = &body
        {
            trace!("{} {} request: {}", method, url, body);
        }

        let response = self.send_authenticated(method, url, body).await?;

        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_value(Value::Null)?);
        }

        if log_enabled!(Level::Trace) {
            trace!("{} response: {}", url, response.text());
        }

        match serde_json::from_slice(&response.body) {
            Ok(result) => Ok(result),
            Err(err) => {
                error!("Invalid JSON Response: {}", response.text());
                Err(err.into())
            }
        }
    }

    pub async fn get<R: DeserializeOwned>(&self, url: &str) -> Result<R, Error> {
        self.rest::<Value, R>(Method::GET, url, None).await
    }

    /// Id of the first workspace of the user, fetched once per login.
    pub async fn workspace_id(&self) -> Result<String, Error> {
        if let Some(id) = self.workspace_id.read().await.clone() {
            return Ok(id);
        }

        let workspaces: WorkspaceList = self.get("workspaces").await?;
        let workspace = workspaces
            .items
            .into_iter()
            .next()
            .ok_or(Error::InvalidResponse)?;
        debug!("Using workspace {} ({})", workspace.name, workspace.id);

        *self.workspace_id.write().await = Some(workspace.id.clone());
        Ok(workspace.id)
    }

    async fn send_authenticated(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> Result<HttpResponse, Error> {
        if self.state().await != SessionState::Authenticated {
            return Err(Error::NotAuthenticated);
        }

        let url = self.resolve_url(url);
        let mut response = self
            .send(method.clone(), &url, body.clone().map(RequestBody::Json))
            .await?;

        if response.status == StatusCode::UNAUTHORIZED {
            debug!("Session expired, logging in again");
            self.authenticate().await?;
            response = self
                .send(method, &url, body.map(RequestBody::Json))
                .await?;
        }

        if !response.status.is_success() {
            return Err(Error::HttpStatus(response.status.as_u16(), response.text()));
        }

        Ok(response)
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<RequestBody>,
    ) -> Result<HttpResponse, Error> {
        let mut headers = self.headers().await;
        if let Some(cookie) = self.cookies.read().await.header_value() {
            let value = HeaderValue::from_str(&cookie)
                .map_err(|err| Error::InvalidParameters(format!("invalid cookie: {}", err)))?;
            headers.insert(COOKIE, value);
        }

        debug!("{} {}", method, url);
        let response = self
            .transport
            .send(HttpRequest {
                method,
                url: url.to_string(),
                headers,
                body,
            })
            .await?;

        self.cookies.write().await.merge(&response.cookies);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_headers() {
        let headers = initial_headers();
        assert_eq!(headers.len(), 5);
        assert_eq!(headers[CONNECTION], "keep-alive");
        assert!(
            headers[USER_AGENT]
                .to_str()
                .unwrap()
                .starts_with("Geti Client/")
        );
    }

    #[test]
    fn test_cookie_jar_tri_state() {
        let mut jar = CookieJar::default();
        assert_eq!(jar.state("geti-cookie"), None);

        jar.merge(&[
            ResponseCookie::new("geti-cookie", "abc"),
            ResponseCookie::new("oauth2_proxy", "def"),
        ]);
        assert_eq!(jar.len(), 2);
        assert_eq!(jar.get("geti-cookie"), Some("abc"));

        jar.merge(&[ResponseCookie::removed("oauth2_proxy")]);
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.state("oauth2_proxy"), Some(&CookieValue::Invalidated));
        assert_eq!(jar.get("oauth2_proxy"), None);
        assert_eq!(jar.tracked_names().count(), 2);

        jar.invalidate_all();
        assert!(jar.is_empty());
        assert_eq!(jar.tracked_names().count(), 2);
        assert_eq!(jar.header_value(), None);
    }

    #[test]
    fn test_cookie_header_value() {
        let mut jar = CookieJar::default();
        jar.set("b", "2");
        jar.set("a", "1");
        jar.invalidate("c");
        assert_eq!(jar.header_value().as_deref(), Some("a=1; b=2"));
    }

    #[test]
    fn test_resolve_url() {
        let config = ServerConfig::new("https://geti.example.com", "user", "pw");
        let transport = Arc::new(ReqwestTransport::new(&config).unwrap());
        let session = Session::new(config, transport);
        assert_eq!(
            session.resolve_url("workspaces"),
            "https://geti.example.com/api/v1/workspaces"
        );
        assert_eq!(
            session.resolve_url("/api/v1/workspaces/w/projects?skip=2"),
            "https://geti.example.com/api/v1/workspaces/w/projects?skip=2"
        );
        assert_eq!(
            session.resolve_url("https://other.example.com/x"),
            "https://other.example.com/x"
        );
    }

    #[tokio::test]
    async fn test_rest_requires_authentication() {
        let config = ServerConfig::new("https://geti.example.com", "user", "pw");
        let transport = Arc::new(ReqwestTransport::new(&config).unwrap());
        let session = Session::new(config, transport);
        assert_eq!(session.state().await, SessionState::Unauthenticated);
        assert!(matches!(
            session.get::<Value>("workspaces").await,
            Err(Error::NotAuthenticated)
        ));
    }
}
