// tour.rs: scenes, info points and the tour data file
//
// The file is either a bare array of tour entries or `{ "locations": [...] }`.
// Saving writes the layout the file was read with, keeps fields this crate does
// not model and keeps the `title`/`imagePath` spelling of older entries.

use crate::coords::{Spherical, DEFAULT_POINT_DISTANCE};
use crate::error::TourError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Icon category of an info point. Unknown names draw as [`Icon::Generic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Building,
    Mountain,
    Store,
    Generic,
}

impl Icon {
    pub const ALL: [Icon; 4] = [Icon::Generic, Icon::Building, Icon::Mountain, Icon::Store];

    pub fn from_name(name: &str) -> Self {
        match name {
            "building" => Icon::Building,
            "mountain" => Icon::Mountain,
            "store" => Icon::Store,
            _ => Icon::Generic,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Icon::Building => "building",
            Icon::Mountain => "mountain",
            Icon::Store => "store",
            Icon::Generic => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoPointKind {
    Info,
    SceneLink { link_to: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "InfoPointRecord", into = "InfoPointRecord")]
pub struct InfoPoint {
    pub id: String,
    pub position: Spherical,
    pub title: String,
    pub description: String,
    pub details: String,
    /// Raw icon name as stored; see [`InfoPoint::icon_kind`].
    pub icon: String,
    pub kind: InfoPointKind,
    /// Fields of the stored point that are not modelled above, written back
    /// unchanged on save.
    pub extra: Map<String, Value>,
}

impl InfoPoint {
    pub fn icon_kind(&self) -> Icon {
        Icon::from_name(&self.icon)
    }

    pub fn link_target(&self) -> Option<&str> {
        match &self.kind {
            InfoPointKind::SceneLink { link_to } => Some(link_to),
            InfoPointKind::Info => None,
        }
    }
}

/// On-disk shape of an info point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfoPointRecord {
    id: String,
    #[serde(serialize_with = "write_number")]
    yaw: f32,
    #[serde(serialize_with = "write_number")]
    pitch: f32,
    #[serde(default = "default_distance", serialize_with = "write_number")]
    distance: f32,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(default)]
    icon: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    link_to: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

const INFO_POINT_KEYS: [&str; 10] = [
    "id",
    "yaw",
    "pitch",
    "distance",
    "title",
    "description",
    "details",
    "icon",
    "type",
    "linkTo",
];

fn default_distance() -> f32 {
    DEFAULT_POINT_DISTANCE
}

/// Whole numbers go out as JSON integers, the way the web tools wrote them.
fn write_number<S: serde::Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 1.0e9 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f32(*value)
    }
}

impl From<InfoPointRecord> for InfoPoint {
    fn from(r: InfoPointRecord) -> Self {
        let mut extra = r.extra;
        let kind = match (r.kind, r.link_to) {
            (Some(kind), Some(link_to)) if kind == "scene" && !link_to.is_empty() => {
                InfoPointKind::SceneLink { link_to }
            }
            (kind, link_to) => {
                // an info point keeps whatever type/linkTo it was stored with
                if let Some(kind) = kind {
                    extra.insert("type".to_owned(), Value::String(kind));
                }
                if let Some(link_to) = link_to {
                    extra.insert("linkTo".to_owned(), Value::String(link_to));
                }
                InfoPointKind::Info
            }
        };
        let details = match r.details {
            Some(details) if details.is_empty() => {
                extra.insert("details".to_owned(), Value::String(details));
                String::new()
            }
            details => details.unwrap_or_default(),
        };
        let distance = if r.distance > 0.0 {
            r.distance
        } else {
            DEFAULT_POINT_DISTANCE
        };
        InfoPoint {
            id: r.id,
            position: Spherical::new(r.yaw, r.pitch, distance).normalized(),
            title: r.title,
            description: r.description,
            details,
            icon: r.icon,
            kind,
            extra,
        }
    }
}

impl From<InfoPoint> for InfoPointRecord {
    fn from(p: InfoPoint) -> Self {
        let mut extra = p.extra;
        let (kind, link_to) = match p.kind {
            InfoPointKind::Info => (None, None),
            InfoPointKind::SceneLink { link_to } => (Some("scene".to_owned()), Some(link_to)),
        };
        let details = (!p.details.is_empty()).then_some(p.details);
        // keys written from the typed fields must not appear twice
        for key in INFO_POINT_KEYS {
            let written = match key {
                "details" => details.is_some(),
                "type" => kind.is_some(),
                "linkTo" => link_to.is_some(),
                _ => true,
            };
            if written {
                extra.remove(key);
            }
        }
        InfoPointRecord {
            id: p.id,
            yaw: p.position.yaw,
            pitch: p.position.pitch,
            distance: p.position.distance,
            title: p.title,
            description: p.description,
            details,
            icon: p.icon,
            kind,
            link_to,
            extra,
        }
    }
}

/// Which spelling an entry used for its name and image keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneKeys {
    /// `title` instead of `name`.
    pub title: bool,
    /// `imagePath` instead of `image`.
    pub image_path: bool,
}

/// One panorama plus its info points. Point order is draw order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SceneRecord", into = "SceneRecord")]
pub struct Scene {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image: String,
    pub info_points: Vec<InfoPoint>,
    pub keys: SceneKeys,
    /// Entry fields such as `location` or `createdAt`, kept for saving.
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneRecord {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_path: Option<String>,
    #[serde(default)]
    info_points: Vec<InfoPoint>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// The preferred key wins; the other spelling, if also present, stays in `extra`.
fn take_key(
    preferred: Option<String>,
    legacy: Option<String>,
    legacy_key: &str,
    extra: &mut Map<String, Value>,
) -> (Option<String>, bool) {
    match (preferred, legacy) {
        (Some(value), Some(other)) => {
            extra.insert(legacy_key.to_owned(), Value::String(other));
            (Some(value), false)
        }
        (Some(value), None) => (Some(value), false),
        (None, Some(value)) => (Some(value), true),
        (None, None) => (None, false),
    }
}

impl TryFrom<SceneRecord> for Scene {
    type Error = String;

    fn try_from(r: SceneRecord) -> Result<Self, Self::Error> {
        let mut extra = r.extra;
        let (name, title) = take_key(r.name, r.title, "title", &mut extra);
        let (image, image_path) = take_key(r.image, r.image_path, "imagePath", &mut extra);
        let image = image.ok_or_else(|| format!("scene {} has no image or imagePath", r.id))?;
        Ok(Scene {
            id: r.id,
            name: name.unwrap_or_default(),
            description: r.description,
            image,
            info_points: r.info_points,
            keys: SceneKeys { title, image_path },
            extra,
        })
    }
}

impl From<Scene> for SceneRecord {
    fn from(s: Scene) -> Self {
        let mut extra = s.extra;
        let (name_key, image_key) = (
            if s.keys.title { "title" } else { "name" },
            if s.keys.image_path { "imagePath" } else { "image" },
        );
        for key in ["id", name_key, "description", image_key, "infoPoints"] {
            extra.remove(key);
        }
        let (name, title) = if s.keys.title {
            (None, Some(s.name))
        } else {
            (Some(s.name), None)
        };
        let (image, image_path) = if s.keys.image_path {
            (None, Some(s.image))
        } else {
            (Some(s.image), None)
        };
        SceneRecord {
            id: s.id,
            name,
            title,
            description: s.description,
            image,
            image_path,
            info_points: s.info_points,
            extra,
        }
    }
}

impl Scene {
    pub fn info_point(&self, id: &str) -> Option<&InfoPoint> {
        self.info_points.iter().find(|p| p.id == id)
    }

    /// Next free id of the form `point-N`.
    pub fn next_point_id(&self) -> String {
        let highest = self
            .info_points
            .iter()
            .filter_map(|p| p.id.strip_prefix("point-")?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        format!("point-{}", highest + 1)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TourFile {
    Wrapped {
        locations: Vec<Scene>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    Flat(Vec<Scene>),
}

#[derive(Serialize)]
struct WrappedRef<'a> {
    locations: &'a [Scene],
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

/// Top-level shape of a tour file.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TourLayout {
    /// A bare array of entries, as the upload API writes it.
    #[default]
    Flat,
    /// `{ "locations": [...] }` plus any other top-level keys.
    Locations(Map<String, Value>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tour {
    pub scenes: Vec<Scene>,
    pub layout: TourLayout,
}

impl Tour {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        Ok(match serde_json::from_str::<TourFile>(text)? {
            TourFile::Wrapped { locations, extra } => Self {
                scenes: locations,
                layout: TourLayout::Locations(extra),
            },
            TourFile::Flat(scenes) => Self {
                scenes,
                layout: TourLayout::Flat,
            },
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        match &self.layout {
            TourLayout::Flat => serde_json::to_string_pretty(&self.scenes),
            TourLayout::Locations(extra) => serde_json::to_string_pretty(&WrappedRef {
                locations: &self.scenes,
                extra,
            }),
        }
    }

    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    fn scene_mut(&mut self, id: &str) -> Result<&mut Scene, TourError> {
        self.scenes
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| TourError::UnknownScene(id.to_string()))
    }

    /// Scene-link points whose target is not in this tour, as `(scene, point, target)`.
    pub fn dangling_links(&self) -> Vec<(&str, &str, &str)> {
        self.scenes
            .iter()
            .flat_map(|scene| {
                scene.info_points.iter().filter_map(move |p| {
                    let target = p.link_target()?;
                    if self.scene(target).is_none() {
                        Some((scene.id.as_str(), p.id.as_str(), target))
                    } else {
                        None
                    }
                })
            })
            .collect()
    }

    pub fn add_info_point(&mut self, scene_id: &str, point: InfoPoint) -> Result<(), TourError> {
        let scene = self.scene_mut(scene_id)?;
        if scene.info_point(&point.id).is_some() {
            return Err(TourError::DuplicateInfoPoint {
                scene: scene_id.to_string(),
                point: point.id,
            });
        }
        scene.info_points.push(point);
        Ok(())
    }

    pub fn update_info_point(&mut self, scene_id: &str, point: InfoPoint) -> Result<(), TourError> {
        let scene = self.scene_mut(scene_id)?;
        let slot = scene
            .info_points
            .iter_mut()
            .find(|p| p.id == point.id)
            .ok_or_else(|| TourError::UnknownInfoPoint {
                scene: scene_id.to_string(),
                point: point.id.clone(),
            })?;
        *slot = point;
        Ok(())
    }

    /// Renames a scene and replaces its description.
    pub fn update_scene_text(&mut self, scene_id: &str, name: &str, description: &str) -> Result<(), TourError> {
        let scene = self.scene_mut(scene_id)?;
        scene.name = name.trim().to_string();
        scene.description = description.to_string();
        Ok(())
    }

    pub fn remove_info_point(&mut self, scene_id: &str, point_id: &str) -> Result<InfoPoint, TourError> {
        let scene = self.scene_mut(scene_id)?;
        let index = scene
            .info_points
            .iter()
            .position(|p| p.id == point_id)
            .ok_or_else(|| TourError::UnknownInfoPoint {
                scene: scene_id.to_string(),
                point: point_id.to_string(),
            })?;
        Ok(scene.info_points.remove(index))
    }
}

/// A tour bound to the file it was read from.
#[derive(Debug)]
pub struct TourStore {
    path: PathBuf,
    pub tour: Tour,
}

impl TourStore {
    /// Reads the tour file, creating an empty one if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TourError> {
        let path = path.into();
        if !path.exists() {
            log::info!("tour file {} missing, starting empty", path.display());
            let store = Self {
                path,
                tour: Tour::default(),
            };
            store.save()?;
            return Ok(store);
        }

        let text = std::fs::read_to_string(&path).map_err(|source| TourError::Io {
            path: path.clone(),
            source,
        })?;
        let tour = Tour::from_json(&text).map_err(|source| TourError::Json {
            path: path.clone(),
            source,
        })?;
        for (scene, point, target) in tour.dangling_links() {
            log::warn!("info point {point} in scene {scene} links to missing scene {target}");
        }
        log::info!("loaded {} scenes from {}", tour.scenes.len(), path.display());
        Ok(Self { path, tour })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<(), TourError> {
        let io_err = |source| TourError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let text = self.tour.to_json().map_err(|source| TourError::Json {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, text).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLAT: &str = r#"[
      {
        "id": "a",
        "title": "Old Town",
        "description": "square",
        "location": "Brasov",
        "imagePath": "/images/tours/a.jpg",
        "createdAt": "2024-01-01T00:00:00Z",
        "infoPoints": [
          { "id": "1", "yaw": 190, "pitch": 120, "title": "Tower", "description": "d", "icon": "building" },
          { "id": "2", "yaw": 10, "pitch": 0, "distance": 300, "title": "Go", "description": "", "icon": "arrow",
            "type": "scene", "linkTo": "b" },
          { "id": "3", "yaw": 0, "pitch": 0, "title": "Empty link", "description": "", "icon": "store",
            "type": "scene", "linkTo": "" }
        ]
      },
      { "id": "b", "title": "Hill", "description": "", "imagePath": "/images/tours/b.jpg", "infoPoints": [] }
    ]"#;

    fn point(id: &str) -> InfoPoint {
        InfoPoint {
            id: id.to_string(),
            position: Spherical::new(0.0, 0.0, 400.0),
            title: "t".into(),
            description: String::new(),
            details: String::new(),
            icon: "store".into(),
            kind: InfoPointKind::Info,
            extra: Map::new(),
        }
    }

    #[test]
    fn parses_flat_data_file() {
        let tour = Tour::from_json(FLAT).unwrap();
        assert_eq!(tour.scenes.len(), 2);
        let a = &tour.scenes[0];
        assert_eq!(a.name, "Old Town");
        assert_eq!(a.image, "/images/tours/a.jpg");

        let tower = &a.info_points[0];
        assert_eq!(tower.position, Spherical::new(-170.0, 90.0, 400.0));
        assert_eq!(tower.icon_kind(), Icon::Building);
        assert_eq!(tower.kind, InfoPointKind::Info);

        let go = &a.info_points[1];
        assert_eq!(go.link_target(), Some("b"));
        assert_eq!(go.position.distance, 300.0);
        assert_eq!(go.icon_kind(), Icon::Generic);

        assert_eq!(a.info_points[2].kind, InfoPointKind::Info);
        assert!(tour.dangling_links().is_empty());
    }

    #[test]
    fn parses_wrapped_locations() {
        let text = r#"{ "locations": [ { "id": "x", "name": "X", "description": "", "image": "x.jpg",
            "infoPoints": [ { "id": "p", "yaw": 0, "pitch": 0, "title": "", "description": "", "icon": "",
            "type": "scene", "linkTo": "nowhere" } ] } ] }"#;
        let tour = Tour::from_json(text).unwrap();
        assert_eq!(tour.scenes[0].name, "X");
        assert_eq!(tour.dangling_links(), vec![("x", "p", "nowhere")]);
    }

    #[test]
    fn saved_json_reads_back() {
        let tour = Tour::from_json(FLAT).unwrap();
        let again = Tour::from_json(&tour.to_json().unwrap()).unwrap();
        assert_eq!(tour, again);
    }

    #[test]
    fn saving_keeps_upload_api_entries_intact() {
        let text = r#"[
          {
            "id": "a",
            "title": "Old Town",
            "description": "square",
            "location": "Brasov",
            "imagePath": "/images/tours/a.jpg",
            "createdAt": "2024-01-01T00:00:00Z",
            "infoPoints": [
              { "id": "1", "yaw": 10, "pitch": 5, "distance": 400, "title": "Tower", "description": "",
                "details": "", "icon": "building", "type": "info", "linkTo": "", "color": "red" },
              { "id": "2", "yaw": -20, "pitch": 0, "distance": 300, "title": "Go", "description": "d",
                "icon": "arrow", "type": "scene", "linkTo": "b" }
            ]
          },
          { "id": "b", "name": "Hill", "description": "", "image": "/images/tours/b.jpg", "infoPoints": [] }
        ]"#;
        let tour = Tour::from_json(text).unwrap();
        assert_eq!(tour.scenes[0].name, "Old Town");
        assert!(tour.scenes[0].keys.title && tour.scenes[0].keys.image_path);
        assert_eq!(tour.scenes[0].info_points[1].link_target(), Some("b"));

        let saved: Value = serde_json::from_str(&tour.to_json().unwrap()).unwrap();
        let original: Value = serde_json::from_str(text).unwrap();
        assert_eq!(saved, original);
    }

    #[test]
    fn edited_entry_keeps_its_key_spelling() {
        let mut tour = Tour::from_json(FLAT).unwrap();
        tour.update_scene_text("a", "New Town", "renamed").unwrap();
        tour.add_info_point("a", point("p9")).unwrap();

        let saved: Value = serde_json::from_str(&tour.to_json().unwrap()).unwrap();
        let entry = &saved[0];
        assert_eq!(entry["title"], "New Town");
        assert_eq!(entry["description"], "renamed");
        assert_eq!(entry["createdAt"], "2024-01-01T00:00:00Z");
        assert_eq!(entry["location"], "Brasov");
        assert!(entry.get("name").is_none());
        assert!(entry.get("image").is_none());
        assert_eq!(entry["infoPoints"].as_array().unwrap().len(), 4);
        assert!(matches!(
            tour.update_scene_text("zzz", "x", ""),
            Err(TourError::UnknownScene(_))
        ));
    }

    #[test]
    fn locations_layout_is_written_back() {
        let text = r#"{ "version": 2, "locations": [ { "id": "x", "name": "X", "description": "",
            "image": "x.jpg", "infoPoints": [] } ] }"#;
        let tour = Tour::from_json(text).unwrap();
        let saved: Value = serde_json::from_str(&tour.to_json().unwrap()).unwrap();
        assert_eq!(saved, serde_json::from_str::<Value>(text).unwrap());
    }

    #[test]
    fn entry_without_image_is_rejected() {
        assert!(Tour::from_json(r#"[{ "id": "a", "name": "A", "infoPoints": [] }]"#).is_err());
    }

    #[test]
    fn edits_info_points() {
        let mut tour = Tour::from_json(FLAT).unwrap();
        tour.add_info_point("b", point("p1")).unwrap();
        assert!(matches!(
            tour.add_info_point("b", point("p1")),
            Err(TourError::DuplicateInfoPoint { .. })
        ));
        assert!(matches!(
            tour.add_info_point("zzz", point("p2")),
            Err(TourError::UnknownScene(_))
        ));

        let mut changed = point("p1");
        changed.title = "renamed".into();
        tour.update_info_point("b", changed).unwrap();
        assert_eq!(tour.scene("b").unwrap().info_points[0].title, "renamed");

        let removed = tour.remove_info_point("b", "p1").unwrap();
        assert_eq!(removed.id, "p1");
        assert!(matches!(
            tour.remove_info_point("b", "p1"),
            Err(TourError::UnknownInfoPoint { .. })
        ));
    }

    #[test]
    fn next_point_id_skips_taken() {
        let mut scene = Tour::from_json(FLAT).unwrap().scenes.remove(1);
        assert_eq!(scene.next_point_id(), "point-1");
        scene.info_points.push(point("point-7"));
        scene.info_points.push(point("custom"));
        assert_eq!(scene.next_point_id(), "point-8");
    }

    #[test]
    fn store_creates_missing_file() {
        let dir = std::env::temp_dir().join(format!("panorama_tour_store_{}", std::process::id()));
        let path = dir.join("tour-data.json");
        let _ = std::fs::remove_dir_all(&dir);

        let mut store = TourStore::open(&path).unwrap();
        assert!(path.exists());
        assert!(store.tour.scenes.is_empty());

        store.tour = Tour::from_json(FLAT).unwrap();
        store.save().unwrap();
        let reopened = TourStore::open(&path).unwrap();
        assert_eq!(reopened.tour, store.tour);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn bundled_sample_tour_is_consistent() {
        let tour = Tour::from_json(include_str!("../data/tour-data.json")).unwrap();
        assert_eq!(tour.scenes.len(), 2);
        assert!(tour.dangling_links().is_empty());
        let plaza = tour.scene("plaza").unwrap();
        assert_eq!(plaza.info_point("point-2").unwrap().position.distance, DEFAULT_POINT_DISTANCE);
        assert_eq!(plaza.info_point("point-3").unwrap().link_target(), Some("viewpoint"));

        let data = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
        for scene in &tour.scenes {
            let image = crate::loader::resolve_image_path(&data, &scene.image);
            assert!(image.exists(), "missing sample panorama {}", image.display());
        }
    }
}
