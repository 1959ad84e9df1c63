// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Local annotation files.
//!
//! The annotation manager reads local annotations through an
//! [`AnnotationReader`] and saves downloaded scenes through an
//! [`AnnotationWriter`]. Both are traits so that other layouts or formats can
//! be plugged in; the implementations here use one JSON file per media item:
//!
//! ```text
//! <folder>/
//!   street.json           <- image "street"
//!   traffic_frame_0.json  <- frame 0 of video "traffic"
//!   traffic_frame_25.json
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    Error,
    convert::{DEFAULT_DECIMAL_PLACES, round_dictionary},
    models::{Annotation, AnnotationScene},
};
use log::debug;
use serde::Deserialize;
use walkdir::WalkDir;

/// Source of local annotations, addressed by file name without extension.
pub trait AnnotationReader: Send + Sync {
    /// Names of all available annotation files, without extension.
    fn data_filenames(&self) -> Result<Vec<String>, Error>;

    /// The annotations stored under `filename`, or `None` if there is no such
    /// file.
    fn read(&self, filename: &str) -> Result<Option<Vec<Annotation>>, Error>;
}

/// Destination for downloaded annotation scenes.
pub trait AnnotationWriter: Send + Sync {
    fn write(&self, path: &Path, scene: &AnnotationScene) -> Result<(), Error>;
}

#[derive(Deserialize)]
struct AnnotationFile {
    #[serde(default)]
    annotations: Vec<Annotation>,
}

/// Reads `<folder>/<filename>.json` files holding an `annotations` array, as
/// written by [`FileAnnotationWriter`].
#[derive(Clone, Debug)]
pub struct FolderAnnotationReader {
    folder: PathBuf,
}

impl FolderAnnotationReader {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        FolderAnnotationReader {
            folder: folder.into(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }
}

impl AnnotationReader for FolderAnnotationReader {
    fn data_filenames(&self) -> Result<Vec<String>, Error> {
        if !self.folder.is_dir() {
            debug!("Annotation folder {:?} does not exist", self.folder);
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&self.folder)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry.path();
            if entry.file_type().is_file()
                && path.extension().is_some_and(|ext| ext == "json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.push(stem.to_string());
            }
        }
        Ok(names)
    }

    fn read(&self, filename: &str) -> Result<Option<Vec<Annotation>>, Error> {
        let path = self.folder.join(format!("{}.json", filename));
        if !path.is_file() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)?;
        let file: AnnotationFile = serde_json::from_str(&contents)?;
        Ok(Some(file.annotations))
    }
}

/// Writes scenes as pretty-printed JSON with floats rounded to a fixed number
/// of decimals, creating parent folders as needed.
#[derive(Clone, Debug)]
pub struct FileAnnotationWriter {
    decimal_places: usize,
}

impl Default for FileAnnotationWriter {
    fn default() -> Self {
        FileAnnotationWriter {
            decimal_places: DEFAULT_DECIMAL_PLACES,
        }
    }
}

impl FileAnnotationWriter {
    pub fn with_decimal_places(decimal_places: usize) -> Self {
        FileAnnotationWriter { decimal_places }
    }
}

impl AnnotationWriter for FileAnnotationWriter {
    fn write(&self, path: &Path, scene: &AnnotationScene) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let value = round_dictionary(serde_json::to_value(scene)?, self.decimal_places);
        fs::write(path, serde_json::to_string_pretty(&value)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaIdentifier, ScoredLabel, Shape};

    fn scene() -> AnnotationScene {
        AnnotationScene::new(
            MediaIdentifier::Image {
                image_id: "i1".to_string(),
            },
            vec![Annotation {
                id: None,
                labels: vec![ScoredLabel::new("dog")],
                shape: Shape::Rectangle {
                    x: 10.5,
                    y: 20.0,
                    width: 30.125,
                    height: 40.333333,
                },
                modified: None,
                labels_to_revisit: Vec::new(),
            }],
        )
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotations").join("street.json");

        FileAnnotationWriter::default()
            .write(&path, &scene())
            .unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"40.333\""));

        let reader = FolderAnnotationReader::new(dir.path().join("annotations"));
        assert_eq!(reader.data_filenames().unwrap(), vec!["street".to_string()]);

        let annotations = reader.read("street").unwrap().unwrap();
        assert_eq!(annotations.len(), 1);
        assert_eq!(
            annotations[0].shape,
            Shape::Rectangle {
                x: 10.5,
                y: 20.0,
                width: 30.125,
                height: 40.333
            }
        );
        assert_eq!(annotations[0].labels[0].name, "dog");
    }

    #[test]
    fn test_data_filenames_only_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("vid_frame_2.json"), "{}").unwrap();
        fs::write(dir.path().join("vid_frame_1.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        let reader = FolderAnnotationReader::new(dir.path());
        assert_eq!(
            reader.data_filenames().unwrap(),
            vec!["vid_frame_1".to_string(), "vid_frame_2".to_string()]
        );
        assert_eq!(reader.read("vid_frame_1").unwrap(), Some(Vec::new()));
        assert_eq!(reader.read("missing").unwrap(), None);
    }

    #[test]
    fn test_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let reader = FolderAnnotationReader::new(dir.path().join("absent"));
        assert!(reader.data_filenames().unwrap().is_empty());
        assert_eq!(reader.read("anything").unwrap(), None);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        let reader = FolderAnnotationReader::new(dir.path());
        assert!(matches!(reader.read("broken"), Err(Error::JsonError(_))));
    }
}
