// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! # Geti Client Library
//!
//! A Rust client for the Geti vision annotation platform. The library logs in
//! to a platform instance, models its projects, media and annotation scenes,
//! and moves annotations between the platform and local files.
//!
//! ## Features
//!
//! - **Session**: Cookie based login and logout, platform version detection
//!   and a generic JSON REST call with transparent re-authentication
//! - **Data Models**: Typed projects, datasets, labels, images, videos, frames
//!   and annotation scenes, with identifier scrubbing for re-upload
//! - **Annotation Management**: Upload local annotations per image or video
//!   frame (overwrite or append) and download the latest annotations
//! - **Conversions**: Enum and timestamp coercion, float rounding of
//!   annotation files and image decoding
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use geti_client::{AnnotationManager, Error, Project, ServerConfig, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let config = ServerConfig::new("https://geti.example.com", "annotator", "secret");
//!     let session = Session::with_reqwest(config)?;
//!     session.authenticate().await?;
//!     println!("Platform version {}", session.negotiate_version().await?);
//!
//!     let workspace_id = session.workspace_id().await?;
//!     let project: Project = session
//!         .get(&format!("workspaces/{}/projects/{}", workspace_id, "6372ab"))
//!         .await?;
//!
//!     let count = AnnotationManager::new(&session, &project)
//!         .download_all_annotations(Path::new("backup"))
//!         .await?;
//!     println!("Saved {} annotation files", count);
//!
//!     session.logout().await
//! }
//! ```
//!
//! ## Optional Features
//!
//! - `profiling`: Emits `tracing` spans for authentication, REST calls and
//!   video annotation requests

mod annotation_manager;
mod config;
mod convert;
mod error;
mod identifiers;
mod models;
mod reader;
mod retry;
mod session;
mod transport;
mod version;

pub use crate::{
    annotation_manager::{AnnotationManager, frame_index_from_filename},
    config::ServerConfig,
    convert::{
        AttributeValue, Coercible, DEFAULT_DECIMAL_PLACES, WireEnum, attribute_to_wire,
        coerce_enum, datetime_to_wire, enum_converter, image_from_buffer, round_dictionary,
        str_to_annotation_kind, str_to_datetime, str_to_media_type, str_to_shape_type,
        str_to_task_type,
    },
    error::Error,
    identifiers::{Identifiable, deidentify},
    models::{
        Annotation, AnnotationKind, AnnotationScene, Dataset, Image, Label, MediaIdentifier,
        MediaInformation, MediaItem, MediaType, Pipeline, Point, Project, ScoredLabel, Shape,
        ShapeType, Task, TaskType, Video, VideoFrame,
    },
    reader::{AnnotationReader, AnnotationWriter, FileAnnotationWriter, FolderAnnotationReader},
    retry::{RetryScope, classify_url},
    session::{
        CookieJar, CookieValue, LOGIN_PATH, LOGOUT_PATH, PRODUCT_INFO_PATH, Session, SessionState,
        initial_headers,
    },
    transport::{
        HttpRequest, HttpResponse, HttpTransport, RequestBody, ReqwestTransport, ResponseCookie,
    },
    version::{PlatformVersion, SC11_VERSION, SC12_VERSION},
};

pub use reqwest::{
    Method, StatusCode,
    header::{HeaderMap, HeaderName, HeaderValue},
};
