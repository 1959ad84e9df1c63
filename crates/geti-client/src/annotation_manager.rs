// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Upload and download of annotations for the media of a project.
//!
//! The [`AnnotationManager`] works on the training dataset of one project. It
//! reads local annotations through an [`AnnotationReader`], uploads them per
//! image or video frame, and saves the latest annotations of the platform
//! through an [`AnnotationWriter`] under `<folder>/annotations/`.
//!
//! Local annotation files are named after the media item they belong to:
//! `<image_name>` for images and `<video_name>_frame_<index>` for frames.
//!
//! Batches are processed one item at a time. A media item without local
//! annotations, or for which the platform returns nothing, is skipped and not
//! counted; any error aborts the batch and is returned.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::{path::Path, sync::Arc};
//!
//! use geti_client::{
//!     AnnotationManager, Error, FolderAnnotationReader, Project, ServerConfig, Session,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Error> {
//! let session = Session::with_reqwest(ServerConfig::load(None)?)?;
//! session.authenticate().await?;
//!
//! let workspace_id = session.workspace_id().await?;
//! let project: Project = session
//!     .get(&format!("workspaces/{}/projects/{}", workspace_id, "6372ab"))
//!     .await?;
//!
//! let manager = AnnotationManager::new(&session, &project)
//!     .with_reader(Arc::new(FolderAnnotationReader::new("dataset/annotations")));
//! let uploaded = manager.upload_annotations_for_all_media(false).await?;
//! println!("{} annotations uploaded", uploaded);
//!
//! manager.download_all_annotations(Path::new("backup")).await?;
//! # Ok(())
//! # }
//! ```

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use crate::{
    Error, Session,
    models::{Annotation, AnnotationScene, Image, MediaItem, Project, Video, VideoFrame},
    reader::{AnnotationReader, AnnotationWriter, FileAnnotationWriter},
};
use log::{debug, info, warn};
use reqwest::Method;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

const ANNOTATIONS_FOLDER: &str = "annotations";

/// A page of a media listing.
#[derive(Deserialize)]
struct MediaPage<T> {
    #[serde(default = "Vec::new")]
    media: Vec<T>,
    #[serde(default)]
    next_page: Option<String>,
}

/// Frame index encoded in a local frame annotation name: the number after
/// the last `_`.
///
/// Only canonical decimal numbers are accepted (no sign, no leading zeros),
/// so that the index maps back to the same file name.
pub fn frame_index_from_filename(filename: &str) -> Option<u32> {
    let token = filename.rsplit('_').next()?;
    let canonical = !token.is_empty()
        && token.bytes().all(|b| b.is_ascii_digit())
        && (token == "0" || !token.starts_with('0'));
    if !canonical {
        return None;
    }
    token.parse().ok()
}

/// Uploads and downloads annotations for the media of a project.
pub struct AnnotationManager<'a> {
    session: &'a Session,
    project: &'a Project,
    reader: Option<Arc<dyn AnnotationReader>>,
    writer: Arc<dyn AnnotationWriter>,
}

impl<'a> AnnotationManager<'a> {
    /// A manager without annotation reader, writing downloads with a
    /// [`FileAnnotationWriter`].
    pub fn new(session: &'a Session, project: &'a Project) -> Self {
        AnnotationManager {
            session,
            project,
            reader: None,
            writer: Arc::new(FileAnnotationWriter::default()),
        }
    }

    /// Source of local annotations, required for uploads.
    pub fn with_reader(mut self, reader: Arc<dyn AnnotationReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn with_writer(mut self, writer: Arc<dyn AnnotationWriter>) -> Self {
        self.writer = writer;
        self
    }

    fn reader(&self) -> Result<&dyn AnnotationReader, Error> {
        self.reader.as_deref().ok_or_else(|| {
            Error::InvalidParameters("no annotation reader was configured".to_string())
        })
    }

    async fn dataset_url(&self) -> Result<String, Error> {
        let workspace_id = self.session.workspace_id().await?;
        let project_id = self.project.id.as_deref().ok_or_else(|| {
            Error::InvalidParameters(format!("project '{}' has no id", self.project.name))
        })?;
        let dataset = self.project.training_dataset()?;
        let dataset_id = dataset.id.as_deref().ok_or_else(|| {
            Error::InvalidParameters(format!("dataset '{}' has no id", dataset.name))
        })?;

        Ok(format!(
            "workspaces/{}/projects/{}/datasets/{}",
            workspace_id, project_id, dataset_id
        ))
    }

    async fn list_media<T: DeserializeOwned>(&self, media_url: &str) -> Result<Vec<T>, Error> {
        let mut url = media_url.to_string();
        let mut media = Vec::new();
        loop {
            let page: MediaPage<T> = self.session.get(&url).await?;
            media.extend(page.media);
            match page.next_page {
                Some(next) if !next.is_empty() => url = next,
                _ => break,
            }
        }
        Ok(media)
    }

    /// All images of the training dataset.
    pub async fn images(&self) -> Result<Vec<Image>, Error> {
        let media_url = format!("{}/media/images", self.dataset_url().await?);
        let images: Vec<Image> = self.list_media(&media_url).await?;
        Ok(images
            .into_iter()
            .map(|image| match image.id.clone() {
                Some(id) => image.with_base_url(format!("{}/{}", media_url, id)),
                None => image,
            })
            .collect())
    }

    /// All videos of the training dataset.
    pub async fn videos(&self) -> Result<Vec<Video>, Error> {
        let media_url = format!("{}/media/videos", self.dataset_url().await?);
        let videos: Vec<Video> = self.list_media(&media_url).await?;
        Ok(videos
            .into_iter()
            .map(|video| match video.id.clone() {
                Some(id) => video.with_base_url(format!("{}/{}", media_url, id)),
                None => video,
            })
            .collect())
    }

    /// The latest annotation scenes of all frames of `video`.
    #[cfg_attr(feature = "profiling", tracing::instrument(skip_all))]
    pub async fn get_latest_annotations_for_video(
        &self,
        video: &Video,
    ) -> Result<Vec<AnnotationScene>, Error> {
        let url = format!(
            "{}/annotations/latest",
            MediaItem::Video(video.clone()).base_url()?
        );
        match self
            .session
            .get::<Option<Vec<AnnotationScene>>>(&url)
            .await
        {
            Ok(scenes) => Ok(scenes.unwrap_or_default()),
            Err(Error::HttpStatus(404, _)) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    /// Uploads the local annotations of every frame of `video` found by the
    /// reader. With `append_annotations` the local annotations are added to
    /// the ones already on the platform, otherwise they replace them.
    ///
    /// Returns the number of frames for which the platform returned an
    /// annotation scene.
    pub async fn upload_annotations_for_video(
        &self,
        video: &Video,
        append_annotations: bool,
    ) -> Result<usize, Error> {
        let prefix = format!("{}_frame_", video.name);
        let frame_indices: Vec<u32> = self
            .reader()?
            .data_filenames()?
            .into_iter()
            .filter(|name| name.starts_with(&prefix))
            .filter_map(|name| {
                let index = frame_index_from_filename(&name);
                if index.is_none() {
                    warn!("Skipping annotation file '{}': no frame index", name);
                }
                index
            })
            .collect();

        let mut upload_count = 0;
        for frame_index in frame_indices {
            let frame = MediaItem::VideoFrame(VideoFrame::from_video(video, frame_index));
            let response = if append_annotations {
                self.append_annotation_for_2d_media_item(&frame).await?
            } else {
                self.upload_annotation_for_2d_media_item(&frame, None)
                    .await?
            };
            if response.is_some() {
                upload_count += 1;
            }
        }
        Ok(upload_count)
    }

    pub async fn upload_annotations_for_videos(
        &self,
        videos: &[Video],
        append_annotations: bool,
    ) -> Result<usize, Error> {
        info!("Starting video annotation upload...");
        let mut upload_count = 0;
        for video in videos {
            upload_count += self
                .upload_annotations_for_video(video, append_annotations)
                .await?;
        }
        if upload_count > 0 {
            info!(
                "Upload complete. Uploaded {} new video frame annotations",
                upload_count
            );
        } else {
            info!("No new video frame annotations were found.");
        }
        Ok(upload_count)
    }

    pub async fn upload_annotations_for_images(
        &self,
        images: &[Image],
        append_annotations: bool,
    ) -> Result<usize, Error> {
        info!("Starting image annotation upload...");
        let mut upload_count = 0;
        for image in images {
            let media_item = MediaItem::Image(image.clone());
            let response = if append_annotations {
                self.append_annotation_for_2d_media_item(&media_item)
                    .await?
            } else {
                self.upload_annotation_for_2d_media_item(&media_item, None)
                    .await?
            };
            if response.is_some() {
                upload_count += 1;
            }
        }
        if upload_count > 0 {
            info!(
                "Upload complete. Uploaded {} new image annotations",
                upload_count
            );
        } else {
            info!("No new image annotations were found.");
        }
        Ok(upload_count)
    }

    /// Saves the latest annotations of every annotated frame of `video` to
    /// `<folder>/annotations/<video_name>_frame_<index>.json`.
    ///
    /// Returns the number of files written; nothing is written when the video
    /// has no annotations.
    pub async fn download_annotations_for_video(
        &self,
        video: &Video,
        folder: &Path,
    ) -> Result<usize, Error> {
        let scenes = self.get_latest_annotations_for_video(video).await?;

        let mut download_count = 0;
        for scene in scenes {
            let Some(frame_index) = scene.media_identifier.frame_index() else {
                debug!("Ignoring scene of video {} without frame index", video.name);
                continue;
            };
            let frame = VideoFrame::from_video(video, frame_index);
            self.write_annotation(folder, &frame.name(), &scene)?;
            download_count += 1;
        }
        Ok(download_count)
    }

    pub async fn download_annotations_for_images(
        &self,
        images: &[Image],
        folder: &Path,
    ) -> Result<usize, Error> {
        let start = Instant::now();
        info!(
            "Starting annotation download... saving annotations for {} images to folder {}",
            images.len(),
            annotations_folder(folder).display()
        );

        let mut download_count = 0;
        for image in images {
            let media_item = MediaItem::Image(image.clone());
            if let Some(scene) = self.latest_annotation_for_2d_media_item(&media_item).await? {
                self.write_annotation(folder, &media_item.annotation_filename(), &scene)?;
                download_count += 1;
            }
        }

        info!(
            "Downloaded {} image annotations in {:.1} seconds.",
            download_count,
            start.elapsed().as_secs_f64()
        );
        Ok(download_count)
    }

    pub async fn download_annotations_for_videos(
        &self,
        videos: &[Video],
        folder: &Path,
    ) -> Result<usize, Error> {
        let start = Instant::now();
        info!(
            "Starting annotation download... saving annotations for {} videos to folder {}",
            videos.len(),
            annotations_folder(folder).display()
        );

        let mut download_count = 0;
        for video in videos {
            download_count += self.download_annotations_for_video(video, folder).await?;
        }

        info!(
            "Video annotation download finished in {:.1} seconds.",
            start.elapsed().as_secs_f64()
        );
        Ok(download_count)
    }

    /// Saves the latest annotations of all images and videos of the project.
    /// Returns the total number of files written.
    pub async fn download_all_annotations(&self, folder: &Path) -> Result<usize, Error> {
        let images = self.images().await?;
        let videos = self.videos().await?;

        let mut download_count = 0;
        if !images.is_empty() {
            download_count += self.download_annotations_for_images(&images, folder).await?;
        }
        if !videos.is_empty() {
            download_count += self.download_annotations_for_videos(&videos, folder).await?;
        }
        Ok(download_count)
    }

    /// Uploads the local annotations of all images and videos of the project.
    pub async fn upload_annotations_for_all_media(
        &self,
        append_annotations: bool,
    ) -> Result<usize, Error> {
        let images = self.images().await?;
        let videos = self.videos().await?;

        let mut upload_count = 0;
        if !images.is_empty() {
            upload_count += self
                .upload_annotations_for_images(&images, append_annotations)
                .await?;
        }
        if !videos.is_empty() {
            upload_count += self
                .upload_annotations_for_videos(&videos, append_annotations)
                .await?;
        }
        Ok(upload_count)
    }

    /// Uploads `scene` as the annotation of an image or video frame,
    /// replacing its current annotation.
    ///
    /// Fails with [`Error::UnsupportedMediaType`] for whole videos; use
    /// [`upload_annotations_for_video`](Self::upload_annotations_for_video)
    /// instead.
    pub async fn upload_annotation(
        &self,
        media_item: &MediaItem,
        scene: &AnnotationScene,
    ) -> Result<Option<AnnotationScene>, Error> {
        ensure_2d_media(media_item)?;
        self.upload_annotation_for_2d_media_item(media_item, Some(scene.clone()))
            .await
    }

    /// The latest annotation of an image or video frame, `None` if it has
    /// none.
    ///
    /// Fails with [`Error::UnsupportedMediaType`] for whole videos; use
    /// [`get_latest_annotations_for_video`](Self::get_latest_annotations_for_video)
    /// instead.
    pub async fn get_annotation(
        &self,
        media_item: &MediaItem,
    ) -> Result<Option<AnnotationScene>, Error> {
        ensure_2d_media(media_item)?;
        self.latest_annotation_for_2d_media_item(media_item).await
    }

    async fn latest_annotation_for_2d_media_item(
        &self,
        media_item: &MediaItem,
    ) -> Result<Option<AnnotationScene>, Error> {
        let url = format!("{}/annotations/latest", media_item.base_url()?);
        match self.session.get::<Option<Value>>(&url).await {
            Ok(reply) => scene_from_reply(reply),
            Err(Error::HttpStatus(404, _)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Uploads `scene`, or the local annotations of the item when `scene` is
    /// `None`. Returns `None` when there was nothing to upload or the
    /// platform answered with an empty body.
    async fn upload_annotation_for_2d_media_item(
        &self,
        media_item: &MediaItem,
        scene: Option<AnnotationScene>,
    ) -> Result<Option<AnnotationScene>, Error> {
        let annotations = match scene {
            Some(scene) => scene.annotations,
            None => match self.local_annotations(media_item)? {
                Some(annotations) => annotations,
                None => return Ok(None),
            },
        };
        self.post_annotations(media_item, annotations).await
    }

    async fn append_annotation_for_2d_media_item(
        &self,
        media_item: &MediaItem,
    ) -> Result<Option<AnnotationScene>, Error> {
        let Some(local) = self.local_annotations(media_item)? else {
            return Ok(None);
        };

        let mut annotations = self
            .latest_annotation_for_2d_media_item(media_item)
            .await?
            .map(|scene| scene.annotations)
            .unwrap_or_default();
        annotations.extend(local);

        self.post_annotations(media_item, annotations).await
    }

    fn local_annotations(&self, media_item: &MediaItem) -> Result<Option<Vec<Annotation>>, Error> {
        let filename = media_item.annotation_filename();
        let annotations = self.reader()?.read(&filename)?;
        if annotations.is_none() {
            debug!("No local annotations for {}", filename);
        }
        Ok(annotations)
    }

    async fn post_annotations(
        &self,
        media_item: &MediaItem,
        annotations: Vec<Annotation>,
    ) -> Result<Option<AnnotationScene>, Error> {
        let scene = AnnotationScene::new(media_item.identifier()?, annotations).deidentified();
        let scene = self.apply_project_labels(scene);
        if !scene.has_data() {
            debug!("No annotations with known labels for {}", media_item.name());
            return Ok(None);
        }

        let url = format!("{}/annotations", media_item.base_url()?);
        let reply = self
            .session
            .rest::<AnnotationScene, Option<Value>>(Method::POST, &url, Some(&scene))
            .await?;
        scene_from_reply(reply)
    }

    /// Points the labels of `scene` at the project's labels of the same name.
    /// Labels unknown to the project are dropped, and with them annotations
    /// left without labels.
    fn apply_project_labels(&self, mut scene: AnnotationScene) -> AnnotationScene {
        let labels = self.project.labels_by_name();

        scene.annotations.retain_mut(|annotation| {
            annotation.labels.retain_mut(|scored| match labels.get(scored.name.as_str()) {
                Some(label) => {
                    scored.id = label.id.clone();
                    if scored.color.is_empty() {
                        scored.color = label.color.clone();
                    }
                    true
                }
                None => {
                    warn!(
                        "Label '{}' is not defined in project '{}', skipping it",
                        scored.name, self.project.name
                    );
                    false
                }
            });
            !annotation.labels.is_empty()
        });
        scene
    }

    fn write_annotation(
        &self,
        folder: &Path,
        name: &str,
        scene: &AnnotationScene,
    ) -> Result<(), Error> {
        let path = annotation_path(folder, name);
        debug!("Writing annotation to {:?}", path);
        self.writer.write(&path, scene)
    }
}

/// Decodes an annotation reply. Empty replies (`null`, `{}`, `[]`, `""`,
/// `false`, `0`) mean the platform has no scene for the item.
fn scene_from_reply(reply: Option<Value>) -> Result<Option<AnnotationScene>, Error> {
    let empty = match &reply {
        None | Some(Value::Null) => true,
        Some(Value::Bool(flag)) => !flag,
        Some(Value::Number(number)) => number.as_f64() == Some(0.0),
        Some(Value::String(text)) => text.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(fields)) => fields.is_empty(),
    };
    match reply {
        Some(value) if !empty => Ok(Some(serde_json::from_value(value)?)),
        _ => Ok(None),
    }
}

fn annotations_folder(folder: &Path) -> PathBuf {
    folder.join(ANNOTATIONS_FOLDER)
}

/// File of the annotation named `name` in `<folder>/annotations`. Path
/// separators in media names are replaced so the file stays in that folder.
fn annotation_path(folder: &Path, name: &str) -> PathBuf {
    let filename: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    annotations_folder(folder).join(format!("{}.json", filename))
}

fn ensure_2d_media(media_item: &MediaItem) -> Result<(), Error> {
    match media_item {
        MediaItem::Image(_) | MediaItem::VideoFrame(_) => Ok(()),
        MediaItem::Video(video) => Err(Error::UnsupportedMediaType(video.name.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_index_from_filename() {
        assert_eq!(frame_index_from_filename("vid1_frame_0"), Some(0));
        assert_eq!(frame_index_from_filename("my_video_frame_125"), Some(125));
        assert_eq!(frame_index_from_filename("vid1_frame_"), None);
        assert_eq!(frame_index_from_filename("vid1_frame_x"), None);
        assert_eq!(frame_index_from_filename("vid1_frame_-3"), None);
        assert_eq!(frame_index_from_filename("vid1_frame_+5"), None);
        assert_eq!(frame_index_from_filename("vid1_frame_05"), None);
        assert_eq!(frame_index_from_filename("vid1_frame_00"), None);
        assert_eq!(frame_index_from_filename("vid1_frame_50"), Some(50));
        assert_eq!(frame_index_from_filename("vid1_frame_99999999999"), None);
    }

    #[test]
    fn test_ensure_2d_media() {
        let video: Video = serde_json::from_value(serde_json::json!({"name": "clip"})).unwrap();
        let err = ensure_2d_media(&MediaItem::Video(video.clone())).unwrap_err();
        assert!(matches!(err, Error::UnsupportedMediaType(ref name) if name == "clip"));

        let frame = VideoFrame::from_video(&video, 3);
        assert!(ensure_2d_media(&MediaItem::VideoFrame(frame)).is_ok());
    }

    #[test]
    fn test_scene_from_empty_reply() {
        for reply in [
            None,
            Some(Value::Null),
            Some(serde_json::json!({})),
            Some(serde_json::json!([])),
            Some(serde_json::json!("")),
            Some(serde_json::json!(false)),
            Some(serde_json::json!(0)),
        ] {
            assert_eq!(scene_from_reply(reply).unwrap(), None);
        }

        let scene = scene_from_reply(Some(serde_json::json!({
            "id": "s1",
            "media_identifier": {"type": "image", "image_id": "i1"}
        })))
        .unwrap()
        .unwrap();
        assert_eq!(scene.id.as_deref(), Some("s1"));

        // A non-empty reply that is not a scene is still an error
        assert!(matches!(
            scene_from_reply(Some(serde_json::json!({"message": "ok"}))),
            Err(Error::JsonError(_))
        ));
    }

    #[test]
    fn test_annotation_path_stays_in_folder() {
        let folder = Path::new("/tmp/out");
        assert_eq!(
            annotation_path(folder, "vid1_frame_3"),
            PathBuf::from("/tmp/out/annotations/vid1_frame_3.json")
        );
        assert_eq!(
            annotation_path(folder, "../../etc/passwd"),
            PathBuf::from("/tmp/out/annotations/.._.._etc_passwd.json")
        );
        assert_eq!(
            annotation_path(folder, "..\\up"),
            PathBuf::from("/tmp/out/annotations/.._up.json")
        );
        assert_eq!(
            annotation_path(folder, ".."),
            PathBuf::from("/tmp/out/annotations/...json")
        );
        assert_eq!(
            annotation_path(folder, "/abs").parent(),
            Some(Path::new("/tmp/out/annotations"))
        );
    }

    #[test]
    fn test_annotations_folder() {
        assert_eq!(
            annotations_folder(Path::new("/tmp/out")),
            PathBuf::from("/tmp/out/annotations")
        );
    }
}
