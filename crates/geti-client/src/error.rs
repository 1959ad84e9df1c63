// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

/// Error type for all Geti client operations.
///
/// Covers coercion of wire values, image decoding, authentication, media
/// type preconditions of the annotation manager, and the transport and
/// serialization failures underneath them.
#[derive(Debug)]
pub enum Error {
    /// An I/O error occurred during file operations.
    IoError(std::io::Error),
    /// Configuration parsing or loading error.
    ConfigError(::config::ConfigError),
    /// JSON serialization or deserialization error.
    JsonError(serde_json::Error),
    /// HTTP request error from the reqwest client.
    HttpError(reqwest::Error),
    /// URL parsing error.
    UrlParseError(url::ParseError),
    /// Integer parsing error.
    ParseIntError(std::num::ParseIntError),
    /// A wire value could not be converted into the requested type.
    InvalidValue(String),
    /// Bytes could not be decoded as an image.
    Decode(String),
    /// Login failed: bad credentials or unreachable host.
    Authentication(String),
    /// Operation applied to the wrong kind of media item. Carries the item
    /// name.
    UnsupportedMediaType(String),
    /// A request was made on a session that is not authenticated.
    NotAuthenticated,
    /// Server answered with a non-success status code and body.
    HttpStatus(u16, String),
    /// Server returned an invalid or unexpected response.
    InvalidResponse,
    /// Invalid parameters provided to an operation.
    InvalidParameters(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<::config::ConfigError> for Error {
    fn from(err: ::config::ConfigError) -> Self {
        Error::ConfigError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonError(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::HttpError(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::UrlParseError(err)
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Self {
        Error::ParseIntError(err)
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Decode(err.to_string())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "I/O error: {}", e),
            Error::ConfigError(e) => write!(f, "Configuration error: {}", e),
            Error::JsonError(e) => write!(f, "JSON error: {}", e),
            Error::HttpError(e) => write!(f, "HTTP error: {}", e),
            Error::UrlParseError(e) => write!(f, "URL parse error: {}", e),
            Error::ParseIntError(e) => write!(f, "Integer parse error: {}", e),
            Error::InvalidValue(s) => write!(f, "Invalid value: {}", s),
            Error::Decode(s) => write!(f, "Image decode error: {}", s),
            Error::Authentication(s) => write!(f, "Authentication failed: {}", s),
            Error::UnsupportedMediaType(name) => write!(
                f,
                "Unsupported media type for media item '{}': only images and video frames \
                 are supported, use the video methods for whole videos",
                name
            ),
            Error::NotAuthenticated => write!(f, "Session is not authenticated"),
            Error::HttpStatus(code, body) => write!(f, "HTTP status {}: {}", code, body),
            Error::InvalidResponse => write!(f, "Invalid server response"),
            Error::InvalidParameters(s) => write!(f, "Invalid parameters: {}", s),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            Error::ConfigError(e) => Some(e),
            Error::JsonError(e) => Some(e),
            Error::HttpError(e) => Some(e),
            Error::UrlParseError(e) => Some(e),
            Error::ParseIntError(e) => Some(e),
            _ => None,
        }
    }
}
