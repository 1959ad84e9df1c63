// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Server connection settings.
//!
//! Settings are read from an optional configuration file and then overridden
//! by `GETI_*` environment variables:
//!
//! | Key | Environment | Default |
//! |-----|-------------|---------|
//! | `host` | `GETI_HOST` | required |
//! | `username` | `GETI_USERNAME` | required |
//! | `password` | `GETI_PASSWORD` | empty |
//! | `verify_certificate` | `GETI_VERIFY_CERTIFICATE` | `true` |
//! | `timeout` | `GETI_TIMEOUT` | `30` seconds |
//! | `max_retries` | `GETI_MAX_RETRIES` | `3` |
//! | `api_version` | `GETI_API_VERSION` | `v1` |
//!
//! The default configuration file is `config.toml` in the user's
//! configuration directory, for example `~/.config/geticlient/config.toml` on
//! Linux.

use std::path::{Path, PathBuf};

use crate::Error;
use directories::ProjectDirs;
use serde::Deserialize;
use url::Url;

fn default_verify_certificate() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_api_version() -> String {
    "v1".to_string()
}

#[derive(Clone, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Base address of the platform, e.g. `https://geti.example.com`.
    pub host: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_verify_certificate")]
    pub verify_certificate: bool,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("verify_certificate", &self.verify_certificate)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl ServerConfig {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        ServerConfig {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            verify_certificate: default_verify_certificate(),
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            api_version: default_api_version(),
        }
        .normalized()
    }

    /// Loads the configuration from `path`, or from the default configuration
    /// file when `path` is `None`, with environment overrides applied.
    ///
    /// An explicitly given file must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let mut builder = ::config::Config::builder();

        let file = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path(),
        };
        if let Some(file) = file {
            log::debug!("Loading server configuration from {:?}", file);
            builder = builder.add_source(::config::File::from(file).required(path.is_some()));
        }

        let config: ServerConfig = builder
            .add_source(::config::Environment::with_prefix("GETI").try_parsing(true))
            .build()?
            .try_deserialize()?;

        if config.host.trim().is_empty() {
            return Err(Error::InvalidParameters("host must not be empty".to_string()));
        }

        Ok(config.normalized())
    }

    /// Location of the default configuration file, if the platform has a
    /// configuration directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("ai", "Geti", "Geti Client")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// The host with a scheme and without trailing slash.
    fn normalized(mut self) -> Self {
        let host = self.host.trim().trim_end_matches('/');
        self.host = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };
        self
    }

    pub fn host_url(&self) -> Result<Url, Error> {
        Ok(Url::parse(&self.host)?)
    }

    /// Absolute URL of a path relative to the host, e.g. the login endpoint.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.host, path.trim_start_matches('/'))
    }

    /// Absolute URL of a REST endpoint relative to the versioned API root.
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/api/{}/{}",
            self.host,
            self.api_version,
            path.trim_start_matches('/')
        )
    }
}
