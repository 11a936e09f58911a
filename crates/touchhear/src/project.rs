//! Region projects stored as `<root>/<project_id>/config.json`.

use crate::regions::{AuthoringCanvas, Region, RegionFrame, RegionLayout};
use crate::sheet::PhysicalSheet;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const PROJECT_FILE: &str = "config.json";

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("project {0:?} not found")]
    NotFound(String),
    #[error("invalid project id {0:?}")]
    InvalidId(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Contents of a project file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// File name inside the project directory.
    #[serde(default)]
    pub background_image: Option<String>,
    /// Records that cannot be read are skipped with a warning.
    #[serde(default, deserialize_with = "deserialize_regions")]
    pub rois: Vec<Region>,
}

fn deserialize_regions<'de, D>(deserializer: D) -> Result<Vec<Region>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let records = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match parse_region(record) {
            Ok(region) => Some(region),
            Err(e) => {
                warn!("skipping region #{index}: {e}");
                None
            }
        })
        .collect())
}

/// Circles saved with only a `width`/`height` box get the inscribed radius.
fn parse_region(mut record: serde_json::Value) -> Result<Region, serde_json::Error> {
    if let Some(fields) = record.as_object_mut() {
        let is_circle = fields.get("type").and_then(|t| t.as_str()) == Some("circle");
        if is_circle && !fields.contains_key("radius") {
            let side = ["width", "height"]
                .iter()
                .filter_map(|key| fields.get(*key).and_then(|v| v.as_f64()))
                .fold(f64::INFINITY, f64::min);
            if side.is_finite() {
                fields.insert("radius".to_string(), serde_json::Value::from(side / 2.0));
            }
        }
    }
    Region::deserialize(record)
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoadedProject {
    pub id: String,
    pub project: Project,
    pub base_dir: PathBuf,
    /// Native `(width, height)` of the background image, when it could be read.
    pub background_size: Option<(u32, u32)>,
}

impl LoadedProject {
    /// Regions ready for hit-testing; audio resolves inside the project dir.
    pub fn layout(&self, canvas: AuthoringCanvas, sheet: PhysicalSheet) -> RegionLayout {
        RegionLayout::new(
            self.project.rois.clone(),
            RegionFrame::new(canvas, self.background_size, sheet),
        )
        .with_audio_dir(&self.base_dir)
    }
}

pub trait ProjectStore {
    fn load(&self, project_id: &str) -> Result<LoadedProject, ProjectError>;

    /// Ids of every loadable project, sorted.
    fn list(&self) -> Result<Vec<String>, ProjectError>;
}

/// One sub-directory per project under `root`.
#[derive(Clone, Debug)]
pub struct DirectoryProjectStore {
    root: PathBuf,
}

impl DirectoryProjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn project_dir(&self, project_id: &str) -> Result<PathBuf, ProjectError> {
        let valid = !project_id.is_empty()
            && project_id != "."
            && project_id != ".."
            && !project_id.contains(['/', '\\']);
        if !valid {
            return Err(ProjectError::InvalidId(project_id.to_string()));
        }
        Ok(self.root.join(project_id))
    }
}

impl ProjectStore for DirectoryProjectStore {
    fn load(&self, project_id: &str) -> Result<LoadedProject, ProjectError> {
        let base_dir = self.project_dir(project_id)?;
        let file = base_dir.join(PROJECT_FILE);
        if !file.is_file() {
            return Err(ProjectError::NotFound(project_id.to_string()));
        }
        let project: Project = serde_json::from_str(&fs::read_to_string(&file)?)?;

        let background_size = project
            .background_image
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .and_then(|name| {
                let path = base_dir.join(name);
                match image::image_dimensions(&path) {
                    Ok(size) => Some(size),
                    Err(e) => {
                        warn!(
                            "project {project_id:?}: background {} unreadable ({e}); using the canvas",
                            path.display()
                        );
                        None
                    }
                }
            });
        debug!(
            "project {project_id:?}: {} regions, background {:?}",
            project.rois.len(),
            background_size
        );

        Ok(LoadedProject {
            id: project_id.to_string(),
            project,
            base_dir,
            background_size,
        })
    }

    fn list(&self) -> Result<Vec<String>, ProjectError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.path().join(PROJECT_FILE).is_file() {
                if let Some(id) = entry.file_name().to_str() {
                    ids.push(id.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::RegionShape;
    use image::{Rgb, RgbImage};

    const PROJECT_JSON: &str = r#"{
        "name": "Farm animals",
        "created_at": "2024-03-01T10:00:00",
        "background_image": "farm.png",
        "rois": [
            {"id": "a1", "name": "Cow", "type": "rectangle",
             "x": 100, "y": 100, "width": 50, "height": 50, "audio_file": "cow.mp3"},
            {"id": "b2", "name": "Duck", "type": "circle",
             "x": 300, "y": 200, "radius": 40, "audio_file": ""}
        ]
    }"#;

    fn write_project(root: &Path, id: &str, json: &str) -> PathBuf {
        let dir = root.join(id);
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join(PROJECT_FILE), json).expect("write project");
        dir
    }

    #[test]
    fn loads_regions_and_background_size() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = write_project(root.path(), "farm", PROJECT_JSON);
        RgbImage::from_pixel(400, 300, Rgb([255, 255, 255]))
            .save(dir.join("farm.png"))
            .expect("save background");

        let store = DirectoryProjectStore::new(root.path());
        let loaded = store.load("farm").expect("load");
        assert_eq!(loaded.project.name, "Farm animals");
        assert_eq!(loaded.background_size, Some((400, 300)));
        assert_eq!(loaded.project.rois.len(), 2);
        assert_eq!(
            loaded.project.rois[1].shape,
            RegionShape::Circle {
                x: 300.0,
                y: 200.0,
                radius: 40.0
            }
        );
        assert_eq!(loaded.project.rois[1].audio(), None);

        let layout = loaded.layout(AuthoringCanvas::default(), PhysicalSheet::A4);
        assert_eq!(layout.audio_dir.as_deref(), Some(dir.as_path()));
        assert!(layout.frame.background.is_some());
    }

    #[test]
    fn missing_background_falls_back_to_canvas() {
        let root = tempfile::tempdir().expect("tempdir");
        write_project(root.path(), "farm", PROJECT_JSON);
        let loaded = DirectoryProjectStore::new(root.path())
            .load("farm")
            .expect("load");
        assert_eq!(loaded.background_size, None);
    }

    #[test]
    fn unknown_and_malformed_ids() {
        let root = tempfile::tempdir().expect("tempdir");
        let store = DirectoryProjectStore::new(root.path());
        assert!(matches!(store.load("nope"), Err(ProjectError::NotFound(_))));
        assert!(matches!(store.load("../etc"), Err(ProjectError::InvalidId(_))));
        assert!(matches!(store.load(""), Err(ProjectError::InvalidId(_))));
    }

    #[test]
    fn unreadable_regions_are_skipped_and_the_rest_kept() {
        let root = tempfile::tempdir().expect("tempdir");
        write_project(
            root.path(),
            "mixed",
            r#"{
                "name": "Mixed",
                "rois": [
                    {"id": "r1", "type": "rectangle",
                     "x": 10, "y": 10, "width": 50, "height": 50, "audio_file": "a.wav"},
                    {"id": "c1", "type": "circle",
                     "x": 100, "y": 100, "width": 40, "height": 30, "audio_file": null},
                    {"id": "t1", "type": "triangle", "x": 0, "y": 0},
                    {"id": "r2", "type": "rectangle", "x": 5},
                    "not a region"
                ]
            }"#,
        );

        let loaded = DirectoryProjectStore::new(root.path())
            .load("mixed")
            .expect("load");
        let ids: Vec<_> = loaded.project.rois.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "c1"]);
        assert_eq!(
            loaded.project.rois[1].shape,
            RegionShape::Circle {
                x: 100.0,
                y: 100.0,
                radius: 15.0
            }
        );
    }

    #[test]
    fn lists_only_directories_with_a_project_file() {
        let root = tempfile::tempdir().expect("tempdir");
        write_project(root.path(), "b", r#"{"name": "B"}"#);
        write_project(root.path(), "a", r#"{"name": "A"}"#);
        fs::create_dir_all(root.path().join("empty")).expect("mkdir");

        let store = DirectoryProjectStore::new(root.path());
        assert_eq!(store.list().expect("list"), vec!["a", "b"]);
        assert!(store.load("a").expect("load").project.rois.is_empty());
    }
}
