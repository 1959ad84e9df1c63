// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use std::collections::HashMap;

use crate::{
    Error,
    convert::{deserialize_datetime, deserialize_lenient_f64, serialize_datetime, wire_enum},
    identifiers::{deidentify, identifier_fields},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

wire_enum! {
    /// Type of a task in a project pipeline.
    ///
    /// `Dataset` and `Crop` are auxiliary tasks used to connect trainable
    /// tasks; every other variant is trainable.
    ///
    /// ```rust
    /// use geti_client::TaskType;
    ///
    /// let task_type: TaskType = "instance_segmentation".parse().unwrap();
    /// assert_eq!(task_type, TaskType::InstanceSegmentation);
    /// assert_eq!(task_type.to_string(), "instance_segmentation");
    /// ```
    pub enum TaskType {
        Dataset => "dataset",
        Crop => "crop",
        Classification => "classification",
        Detection => "detection",
        Segmentation => "segmentation",
        InstanceSegmentation => "instance_segmentation",
        RotatedDetection => "rotated_detection",
        AnomalyClassification => "anomaly_classification",
        AnomalyDetection => "anomaly_detection",
        AnomalySegmentation => "anomaly_segmentation",
    }
}

wire_enum! {
    /// Kind of media item stored in a dataset.
    pub enum MediaType {
        Image => "image",
        Video => "video",
        VideoFrame => "video_frame",
    }
}

wire_enum! {
    /// Geometry kind of an annotation shape.
    pub enum ShapeType {
        Rectangle => "RECTANGLE",
        Ellipse => "ELLIPSE",
        Polygon => "POLYGON",
        RotatedRectangle => "ROTATED_RECTANGLE",
    }
}

wire_enum! {
    /// Whether an annotation scene was drawn by a user or produced by a model.
    pub enum AnnotationKind {
        Annotation => "annotation",
        Prediction => "prediction",
    }
}

fn default_image_type() -> MediaType {
    MediaType::Image
}

fn default_video_type() -> MediaType {
    MediaType::Video
}

fn default_annotation_kind() -> AnnotationKind {
    AnnotationKind::Annotation
}

fn default_probability() -> f64 {
    1.0
}

/// A project on the platform.
///
/// The first dataset of a project is its training dataset, which is the media
/// source used by the annotation manager.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Project {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(
        default,
        deserialize_with = "deserialize_datetime",
        serialize_with = "serialize_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
    #[serde(default)]
    pub datasets: Vec<Dataset>,
    #[serde(default)]
    pub pipeline: Pipeline,
}

impl Project {
    /// The dataset holding the project's training media.
    pub fn training_dataset(&self) -> Result<&Dataset, Error> {
        self.datasets.first().ok_or_else(|| {
            Error::InvalidParameters(format!("project '{}' has no datasets", self.name))
        })
    }

    /// All labels of all tasks in the pipeline.
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.pipeline.tasks.iter().flat_map(|task| task.labels.iter())
    }

    /// Labels indexed by name. When two tasks define a label with the same
    /// name the first one wins.
    pub fn labels_by_name(&self) -> HashMap<&str, &Label> {
        let mut labels = HashMap::new();
        for label in self.labels() {
            labels.entry(label.name.as_str()).or_insert(label);
        }
        labels
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Dataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(
        default,
        deserialize_with = "deserialize_datetime",
        serialize_with = "serialize_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub use_for_training: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Pipeline {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub task_type: TaskType,
    #[serde(default)]
    pub labels: Vec<Label>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Label {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub is_empty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<String>,
}

/// Size and, for videos, timing information of a media item.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct MediaInformation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_url: Option<String>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_stride: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,
}

/// An image in a dataset.
///
/// `base_url` is not part of the payload; it is the REST path of the image,
/// filled in when the image is listed through the annotation manager.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Image {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type", default = "default_image_type")]
    pub media_type: MediaType,
    #[serde(
        default,
        deserialize_with = "deserialize_datetime",
        serialize_with = "serialize_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub upload_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader_id: Option<String>,
    #[serde(default)]
    pub media_information: MediaInformation,
    #[serde(skip)]
    pub base_url: Option<String>,
}

impl Image {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// A video in a dataset. See [`Image`] for the meaning of `base_url`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Video {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type", default = "default_video_type")]
    pub media_type: MediaType,
    #[serde(
        default,
        deserialize_with = "deserialize_datetime",
        serialize_with = "serialize_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub upload_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader_id: Option<String>,
    #[serde(default)]
    pub media_information: MediaInformation,
    #[serde(skip)]
    pub base_url: Option<String>,
}

impl Video {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// A single frame of a video, addressed by its index in the video.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFrame {
    pub video_id: Option<String>,
    pub video_name: String,
    pub frame_index: u32,
    pub media_information: MediaInformation,
    pub base_url: Option<String>,
}

impl VideoFrame {
    /// The frame at `frame_index` of `video`. Its REST path is derived from
    /// the video's one.
    pub fn from_video(video: &Video, frame_index: u32) -> Self {
        VideoFrame {
            video_id: video.id.clone(),
            video_name: video.name.clone(),
            frame_index,
            media_information: video.media_information.clone(),
            base_url: video
                .base_url
                .as_ref()
                .map(|base| format!("{}/frames/{}", base, frame_index)),
        }
    }

    pub fn name(&self) -> String {
        format!("{}_frame_{}", self.video_name, self.frame_index)
    }
}

/// Any media item that can carry annotations.
#[derive(Clone, Debug, PartialEq)]
pub enum MediaItem {
    Image(Image),
    Video(Video),
    VideoFrame(VideoFrame),
}

impl From<Image> for MediaItem {
    fn from(image: Image) -> Self {
        MediaItem::Image(image)
    }
}

impl From<Video> for MediaItem {
    fn from(video: Video) -> Self {
        MediaItem::Video(video)
    }
}

impl From<VideoFrame> for MediaItem {
    fn from(frame: VideoFrame) -> Self {
        MediaItem::VideoFrame(frame)
    }
}

impl MediaItem {
    pub fn media_type(&self) -> MediaType {
        match self {
            MediaItem::Image(_) => MediaType::Image,
            MediaItem::Video(_) => MediaType::Video,
            MediaItem::VideoFrame(_) => MediaType::VideoFrame,
        }
    }

    /// Display name of the item. Frames are named after their video.
    pub fn name(&self) -> String {
        match self {
            MediaItem::Image(image) => image.name.clone(),
            MediaItem::Video(video) => video.name.clone(),
            MediaItem::VideoFrame(frame) => frame.name(),
        }
    }

    /// Name of the local annotation file for this item, without extension:
    /// `<image_name>` or `<video_name>_frame_<index>`.
    pub fn annotation_filename(&self) -> String {
        self.name()
    }

    pub fn base_url(&self) -> Result<&str, Error> {
        let base_url = match self {
            MediaItem::Image(image) => image.base_url.as_deref(),
            MediaItem::Video(video) => video.base_url.as_deref(),
            MediaItem::VideoFrame(frame) => frame.base_url.as_deref(),
        };
        base_url.ok_or_else(|| {
            Error::InvalidParameters(format!("media item '{}' has no base url", self.name()))
        })
    }

    /// The identifier that targets an annotation scene at this item.
    pub fn identifier(&self) -> Result<MediaIdentifier, Error> {
        let missing_id =
            || Error::InvalidParameters(format!("media item '{}' has no id", self.name()));
        Ok(match self {
            MediaItem::Image(image) => MediaIdentifier::Image {
                image_id: image.id.clone().ok_or_else(missing_id)?,
            },
            MediaItem::Video(video) => MediaIdentifier::Video {
                video_id: video.id.clone().ok_or_else(missing_id)?,
            },
            MediaItem::VideoFrame(frame) => MediaIdentifier::VideoFrame {
                video_id: frame.video_id.clone().ok_or_else(missing_id)?,
                frame_index: frame.frame_index,
            },
        })
    }
}

/// Reference from an annotation scene to the media item it annotates.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaIdentifier {
    Image { image_id: String },
    Video { video_id: String },
    VideoFrame { video_id: String, frame_index: u32 },
}

impl MediaIdentifier {
    pub fn media_type(&self) -> MediaType {
        match self {
            MediaIdentifier::Image { .. } => MediaType::Image,
            MediaIdentifier::Video { .. } => MediaType::Video,
            MediaIdentifier::VideoFrame { .. } => MediaType::VideoFrame,
        }
    }

    pub fn frame_index(&self) -> Option<u32> {
        match self {
            MediaIdentifier::VideoFrame { frame_index, .. } => Some(*frame_index),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Point {
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub x: f64,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub y: f64,
}

/// Geometry of an annotation, in pixel coordinates.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum Shape {
    #[serde(rename = "RECTANGLE")]
    Rectangle {
        #[serde(deserialize_with = "deserialize_lenient_f64")]
        x: f64,
        #[serde(deserialize_with = "deserialize_lenient_f64")]
        y: f64,
        #[serde(deserialize_with = "deserialize_lenient_f64")]
        width: f64,
        #[serde(deserialize_with = "deserialize_lenient_f64")]
        height: f64,
    },
    #[serde(rename = "ELLIPSE")]
    Ellipse {
        #[serde(deserialize_with = "deserialize_lenient_f64")]
        x: f64,
        #[serde(deserialize_with = "deserialize_lenient_f64")]
        y: f64,
        #[serde(deserialize_with = "deserialize_lenient_f64")]
        width: f64,
        #[serde(deserialize_with = "deserialize_lenient_f64")]
        height: f64,
    },
    #[serde(rename = "POLYGON")]
    Polygon { points: Vec<Point> },
    #[serde(rename = "ROTATED_RECTANGLE")]
    RotatedRectangle {
        #[serde(deserialize_with = "deserialize_lenient_f64")]
        x: f64,
        #[serde(deserialize_with = "deserialize_lenient_f64")]
        y: f64,
        #[serde(deserialize_with = "deserialize_lenient_f64")]
        width: f64,
        #[serde(deserialize_with = "deserialize_lenient_f64")]
        height: f64,
        #[serde(deserialize_with = "deserialize_lenient_f64")]
        angle: f64,
    },
}

impl Shape {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Shape::Rectangle { .. } => ShapeType::Rectangle,
            Shape::Ellipse { .. } => ShapeType::Ellipse,
            Shape::Polygon { .. } => ShapeType::Polygon,
            Shape::RotatedRectangle { .. } => ShapeType::RotatedRectangle,
        }
    }
}

/// A label attached to an annotation, with its confidence.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScoredLabel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(
        default = "default_probability",
        deserialize_with = "deserialize_lenient_f64"
    )]
    pub probability: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<serde_json::Value>,
}

impl ScoredLabel {
    pub fn new(name: impl Into<String>) -> Self {
        ScoredLabel {
            id: None,
            name: name.into(),
            color: String::new(),
            probability: default_probability(),
            source: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Annotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub labels: Vec<ScoredLabel>,
    pub shape: Shape,
    #[serde(
        default,
        deserialize_with = "deserialize_datetime",
        serialize_with = "serialize_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels_to_revisit: Vec<String>,
}

/// The annotations of one media item.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AnnotationScene {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default = "default_annotation_kind")]
    pub kind: AnnotationKind,
    pub media_identifier: MediaIdentifier,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(
        default,
        deserialize_with = "deserialize_datetime",
        serialize_with = "serialize_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels_to_revisit_full_scene: Vec<String>,
}

impl AnnotationScene {
    pub fn new(media_identifier: MediaIdentifier, annotations: Vec<Annotation>) -> Self {
        AnnotationScene {
            id: None,
            kind: AnnotationKind::Annotation,
            media_identifier,
            annotations,
            modified: None,
            labels_to_revisit_full_scene: Vec::new(),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.annotations.is_empty()
    }

    /// The scene with all server-assigned identifiers removed from the scene,
    /// its annotations and their labels, ready to be uploaded.
    pub fn deidentified(mut self) -> Self {
        deidentify(&mut self);
        for annotation in &mut self.annotations {
            deidentify(annotation);
            for label in &mut annotation.labels {
                deidentify(label);
            }
        }
        self
    }
}

identifier_fields!(Project {
    id,
    creation_time,
    creator_id
});
identifier_fields!(Dataset { id, creation_time });
identifier_fields!(Label { id });
identifier_fields!(Image {
    id,
    upload_time,
    uploader_id
});
identifier_fields!(Video {
    id,
    upload_time,
    uploader_id
});
identifier_fields!(ScoredLabel { id });
identifier_fields!(Annotation { id, modified });
identifier_fields!(AnnotationScene { id, modified });

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project_json() -> serde_json::Value {
        json!({
            "id": "p1",
            "name": "Dogs",
            "creation_time": "2022-05-06T07:08:09.123000+00:00",
            "creator_id": "u1",
            "datasets": [
                {"id": "d1", "name": "Training dataset", "use_for_training": true},
                {"id": "d2", "name": "Testing set"}
            ],
            "pipeline": {
                "tasks": [
                    {"id": "t0", "title": "Dataset", "task_type": "dataset"},
                    {
                        "id": "t1",
                        "title": "Detection task",
                        "task_type": "detection",
                        "labels": [
                            {"id": "l1", "name": "dog", "color": "#ff0000ff", "group": "default"},
                            {"id": "l2", "name": "cat", "color": "#00ff00ff", "group": "default"}
                        ]
                    }
                ]
            }
        })
    }

    #[test]
    fn test_project_deserialization() {
        let project: Project = serde_json::from_value(project_json()).unwrap();
        assert_eq!(project.id.as_deref(), Some("p1"));
        assert!(project.creation_time.is_some());
        assert_eq!(project.training_dataset().unwrap().id.as_deref(), Some("d1"));
        assert_eq!(project.pipeline.tasks[1].task_type, TaskType::Detection);
        assert_eq!(project.labels().count(), 2);
        assert_eq!(
            project.labels_by_name().get("cat").and_then(|l| l.id.as_deref()),
            Some("l2")
        );
    }

    #[test]
    fn test_project_with_unknown_task_type_fails() {
        let mut value = project_json();
        value["pipeline"]["tasks"][1]["task_type"] = json!("keypoint_detection");
        let err = serde_json::from_value::<Project>(value).unwrap_err();
        assert!(err.to_string().contains("TaskType"));
    }

    #[test]
    fn test_project_without_datasets() {
        let project: Project = serde_json::from_value(json!({"name": "empty"})).unwrap();
        assert!(matches!(
            project.training_dataset(),
            Err(Error::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_project_deidentify() {
        let mut project: Project = serde_json::from_value(project_json()).unwrap();
        deidentify(&mut project);
        assert_eq!(project.id, None);
        assert_eq!(project.creation_time, None);
        assert_eq!(project.creator_id, None);
        assert_eq!(project.name, "Dogs");
        // Nested objects are not touched by a shallow scrub
        assert_eq!(project.datasets[0].id.as_deref(), Some("d1"));
    }

    fn scene_json() -> serde_json::Value {
        json!({
            "id": "s1",
            "kind": "annotation",
            "modified": "2022-05-06T07:08:09+00:00",
            "media_identifier": {"type": "video_frame", "video_id": "v1", "frame_index": 5},
            "annotations": [
                {
                    "id": "a1",
                    "modified": "2022-05-06T07:08:09+00:00",
                    "labels": [{"id": "l1", "name": "dog", "probability": 0.9}],
                    "shape": {"type": "RECTANGLE", "x": 1.0, "y": 2, "width": "3.500", "height": 4}
                },
                {
                    "id": "a2",
                    "labels": [{"name": "cat"}],
                    "shape": {"type": "POLYGON", "points": [{"x": 0, "y": 0}, {"x": 1.5, "y": "2.25"}]}
                }
            ]
        })
    }

    #[test]
    fn test_annotation_scene_deserialization() {
        let scene: AnnotationScene = serde_json::from_value(scene_json()).unwrap();
        assert_eq!(scene.media_identifier.frame_index(), Some(5));
        assert_eq!(scene.media_identifier.media_type(), MediaType::VideoFrame);
        assert_eq!(scene.annotations.len(), 2);
        assert_eq!(
            scene.annotations[0].shape,
            Shape::Rectangle {
                x: 1.0,
                y: 2.0,
                width: 3.5,
                height: 4.0
            }
        );
        assert_eq!(scene.annotations[1].shape.shape_type(), ShapeType::Polygon);
        assert_eq!(scene.annotations[1].labels[0].probability, 1.0);
    }

    #[test]
    fn test_annotation_scene_deidentified() {
        let scene: AnnotationScene = serde_json::from_value(scene_json()).unwrap();
        let scrubbed = scene.clone().deidentified();

        assert_eq!(scrubbed.id, None);
        assert_eq!(scrubbed.modified, None);
        for annotation in &scrubbed.annotations {
            assert_eq!(annotation.id, None);
            assert_eq!(annotation.modified, None);
            assert!(annotation.labels.iter().all(|l| l.id.is_none()));
        }

        // Non-identifier content is preserved
        assert_eq!(scrubbed.media_identifier, scene.media_identifier);
        assert_eq!(scrubbed.annotations[0].shape, scene.annotations[0].shape);

        // Idempotent
        assert_eq!(scrubbed.clone().deidentified(), scrubbed);

        // Scrubbed identifiers are omitted from the payload
        let payload = serde_json::to_value(&scrubbed).unwrap();
        assert!(payload.get("id").is_none());
        assert!(payload["annotations"][0].get("id").is_none());
    }

    #[test]
    fn test_media_identifier_wire_format() {
        let identifier = MediaIdentifier::Image {
            image_id: "i1".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&identifier).unwrap(),
            json!({"type": "image", "image_id": "i1"})
        );
    }

    #[test]
    fn test_video_frame_from_video() {
        let video: Video = serde_json::from_value(json!({
            "id": "v1",
            "name": "vid1",
            "type": "video",
            "media_information": {"width": 640, "height": 480, "frame_count": 100, "frame_stride": 1}
        }))
        .unwrap();
        let video = video.with_base_url("workspaces/w/projects/p/datasets/d/media/videos/v1");

        let frame = VideoFrame::from_video(&video, 12);
        assert_eq!(frame.name(), "vid1_frame_12");
        assert_eq!(
            frame.base_url.as_deref(),
            Some("workspaces/w/projects/p/datasets/d/media/videos/v1/frames/12")
        );

        let item = MediaItem::from(frame);
        assert_eq!(item.media_type(), MediaType::VideoFrame);
        assert_eq!(item.annotation_filename(), "vid1_frame_12");
        assert_eq!(
            item.identifier().unwrap(),
            MediaIdentifier::VideoFrame {
                video_id: "v1".to_string(),
                frame_index: 12
            }
        );
    }

    #[test]
    fn test_media_item_without_base_url() {
        let image: Image = serde_json::from_value(json!({"name": "img"})).unwrap();
        assert_eq!(image.media_type, MediaType::Image);
        let item = MediaItem::from(image);
        assert!(matches!(item.base_url(), Err(Error::InvalidParameters(_))));
        assert!(matches!(item.identifier(), Err(Error::InvalidParameters(_))));
    }

    #[test]
    fn test_image_datetime_round_trip() {
        let image: Image = serde_json::from_value(json!({
            "id": "i1",
            "name": "img",
            "upload_time": "2022-01-02T03:04:05",
            "uploader_id": "u1"
        }))
        .unwrap();
        let payload = serde_json::to_value(&image).unwrap();
        assert_eq!(payload["upload_time"], json!("2022-01-02T03:04:05+00:00"));
        assert_eq!(payload["type"], json!("image"));
        assert!(payload.get("base_url").is_none());
    }
}
