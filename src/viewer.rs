// viewer.rs: per-session viewer controller
//
// Owns the camera orientation, the scene list snapshot handed in by the host,
// the panorama source and the markers of the last frame. It never edits scene
// data; hosts persist changes and hand back a fresh list via `set_scenes`.

use crate::coords::{pick_spherical, Camera, Spherical, Viewport};
use crate::error::ViewerError;
use crate::loader::{LoadTicket, PanoramaSource};
use crate::panorama::{Orientation, PanoramaView};
use crate::settings::ViewerSettings;
use crate::tour::{Icon, InfoPoint, InfoPointKind, Scene};
use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerState {
    /// Waiting for the first frame with the initial panorama.
    Loading,
    Ready,
    /// A new scene was chosen and its panorama is still loading.
    Transitioning,
}

/// Coordinates picked by a double-click, for the host to turn into a point.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub scene_id: String,
    pub position: Spherical,
}

/// An info point as drawn in the last frame. Only visible points get one.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub point_id: String,
    pub title: String,
    pub icon: Icon,
    pub scene_link: bool,
    /// Pixels, origin top-left.
    pub position: Vec2,
    pub scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRotation {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Default)]
struct Callbacks {
    placed: Option<Box<dyn FnMut(Placement)>>,
    selected: Option<Box<dyn FnMut(&str)>>,
    navigation: Option<Box<dyn FnMut(&str)>>,
    navigation_failed: Option<Box<dyn FnMut(&ViewerError)>>,
    scene_loaded: Option<Box<dyn FnMut(&str)>>,
}

pub struct ViewerController<S: PanoramaSource> {
    settings: ViewerSettings,
    view: PanoramaView,
    scenes: Vec<Scene>,
    current: Option<String>,
    state: ViewerState,
    source: S,
    generation: u64,
    /// Generation of the load whose result will be applied.
    pending: Option<u64>,
    markers: Vec<Marker>,
    selected: Option<String>,
    callbacks: Callbacks,
}

impl<S: PanoramaSource> ViewerController<S> {
    /// Starts loading `initial` (or the first scene when it is absent or unknown).
    pub fn new(settings: ViewerSettings, scenes: Vec<Scene>, initial: Option<&str>, source: S) -> Self {
        let view = PanoramaView::new(
            settings.fov,
            settings.near_plane,
            settings.far_plane,
            settings.sensitivity_scale,
        );

        let start = match initial {
            Some(id) if scenes.iter().any(|s| s.id == id) => Some(id.to_string()),
            Some(id) => {
                log::warn!("initial scene {id} not in tour, starting at the first scene");
                scenes.first().map(|s| s.id.clone())
            }
            None => scenes.first().map(|s| s.id.clone()),
        };

        let mut viewer = Self {
            settings,
            view,
            scenes,
            current: None,
            state: ViewerState::Loading,
            source,
            generation: 0,
            pending: None,
            markers: Vec::new(),
            selected: None,
            callbacks: Callbacks::default(),
        };
        match start {
            Some(id) => viewer.load_scene(id),
            None => log::warn!("tour has no scenes"),
        }
        viewer
    }

    pub fn on_info_point_placed(&mut self, f: impl FnMut(Placement) + 'static) {
        self.callbacks.placed = Some(Box::new(f));
    }

    pub fn on_info_point_selected(&mut self, f: impl FnMut(&str) + 'static) {
        self.callbacks.selected = Some(Box::new(f));
    }

    pub fn on_scene_navigation_requested(&mut self, f: impl FnMut(&str) + 'static) {
        self.callbacks.navigation = Some(Box::new(f));
    }

    pub fn on_navigation_failed(&mut self, f: impl FnMut(&ViewerError) + 'static) {
        self.callbacks.navigation_failed = Some(Box::new(f));
    }

    pub fn on_scene_loaded(&mut self, f: impl FnMut(&str) + 'static) {
        self.callbacks.scene_loaded = Some(Box::new(f));
    }

    pub fn placement_enabled(&self) -> bool {
        self.callbacks.placed.is_some()
    }

    pub fn state(&self) -> ViewerState {
        self.state
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn view(&self) -> &PanoramaView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut PanoramaView {
        &mut self.view
    }

    pub fn orientation(&self) -> Orientation {
        self.view.orientation
    }

    pub fn camera(&self, viewport: Viewport) -> Camera {
        self.view.camera(viewport)
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        let id = self.current.as_deref()?;
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// The `info` point whose details are open.
    pub fn selected_info_point(&self) -> Option<&InfoPoint> {
        let id = self.selected.as_deref()?;
        self.current_scene()?.info_point(id)
    }

    pub fn close_details(&mut self) {
        self.selected = None;
    }

    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.view.orientation.rotate(delta_yaw, delta_pitch);
    }

    pub fn drag(&mut self, dx: f32, dy: f32, viewport: Viewport) {
        self.view.drag(dx, dy, viewport);
    }

    pub fn key_rotate(&mut self, key: KeyRotation) {
        let step = self.settings.key_step;
        match key {
            KeyRotation::Left => self.rotate(-step, 0.0),
            KeyRotation::Right => self.rotate(step, 0.0),
            KeyRotation::Up => self.rotate(0.0, step),
            KeyRotation::Down => self.rotate(0.0, -step),
        }
    }

    pub fn reset_view(&mut self) {
        self.view.orientation.reset();
    }

    /// One frame: applies the latest finished panorama and re-projects markers.
    ///
    /// Returns the image the renderer should upload, if one arrived.
    pub fn tick(&mut self, viewport: Viewport) -> Option<S::Image> {
        let mut applied = None;
        while let Some(outcome) = self.source.poll() {
            if self.pending != Some(outcome.generation) {
                log::debug!(
                    "discarding stale panorama {} (generation {})",
                    outcome.source,
                    outcome.generation
                );
                continue;
            }
            self.pending = None;
            self.state = ViewerState::Ready;
            match outcome.result {
                Ok(image) => {
                    log::info!("panorama {} ready", outcome.source);
                    applied = Some(image);
                    if let (Some(id), Some(cb)) = (self.current.as_deref(), self.callbacks.scene_loaded.as_mut()) {
                        cb(id);
                    }
                }
                Err(e) => log::error!("panorama load failed, keeping previous image: {e}"),
            }
        }

        if self.state == ViewerState::Loading && self.pending.is_none() {
            // nothing to wait for: an empty tour
            self.state = ViewerState::Ready;
        }

        self.refresh_markers(viewport);
        applied
    }

    fn refresh_markers(&mut self, viewport: Viewport) {
        self.markers.clear();
        if self.state != ViewerState::Ready || viewport.is_empty() {
            return;
        }
        let Some(scene) = self
            .current
            .as_deref()
            .and_then(|id| self.scenes.iter().find(|s| s.id == id))
        else {
            return;
        };

        let camera = self.view.camera(viewport);
        for point in &scene.info_points {
            let screen = camera.project(
                viewport,
                point.position.to_cartesian(),
                self.settings.marker_scale_reference,
            );
            if !screen.visible {
                continue;
            }
            self.markers.push(Marker {
                point_id: point.id.clone(),
                title: point.title.clone(),
                icon: point.icon_kind(),
                scene_link: matches!(point.kind, InfoPointKind::SceneLink { .. }),
                position: Vec2::new(screen.x, screen.y),
                scale: screen.scale,
            });
        }
    }

    /// Top-most marker under the pointer. Later points draw on top.
    pub fn hit_test(&self, pointer: Vec2) -> Option<&Marker> {
        self.markers
            .iter()
            .rev()
            .find(|m| m.position.distance(pointer) <= self.settings.marker_radius_px * m.scale)
    }

    /// Picks spherical coordinates under the pointer and reports them to the
    /// placement callback. Does nothing unless that callback is registered.
    pub fn place_info_point(&mut self, pointer: Vec2, viewport: Viewport) -> Option<Placement> {
        if self.callbacks.placed.is_none() {
            log::debug!("placement ignored: no placement handler");
            return None;
        }
        if self.state != ViewerState::Ready {
            return None;
        }
        let scene_id = self.current.clone()?;

        let camera = self.view.camera(viewport);
        let Some(position) = pick_spherical(
            &camera,
            viewport,
            pointer,
            self.settings.sphere_radius,
            self.settings.calibration,
            self.settings.default_point_distance,
        ) else {
            log::debug!("placement ray missed the panorama sphere");
            return None;
        };
        log::info!(
            "placing info point in {scene_id} at yaw {:.2}, pitch {:.2}",
            position.yaw,
            position.pitch
        );

        let placement = Placement { scene_id, position };
        if let Some(cb) = self.callbacks.placed.as_mut() {
            cb(placement.clone());
        }
        Some(placement)
    }

    /// Scene links navigate; plain points open their details.
    pub fn select_info_point(&mut self, id: &str) -> Result<(), ViewerError> {
        let scene = self.current_scene().ok_or(ViewerError::NoScene)?;
        let Some(point) = scene.info_point(id) else {
            log::warn!("selected info point {id} is not in scene {}", scene.id);
            return Err(ViewerError::UnknownInfoPoint(id.to_string()));
        };
        let kind = point.kind.clone();

        if let Some(cb) = self.callbacks.selected.as_mut() {
            cb(id);
        }

        match kind {
            InfoPointKind::SceneLink { link_to } => self.navigate_to(&link_to),
            InfoPointKind::Info => {
                self.selected = Some(id.to_string());
                Ok(())
            }
        }
    }

    /// Moves to another scene. Unknown targets leave everything as it was and
    /// are reported through the navigation-failed callback.
    pub fn navigate_to(&mut self, target: &str) -> Result<(), ViewerError> {
        if self.current.as_deref() == Some(target) {
            return Ok(());
        }
        if !self.scenes.iter().any(|s| s.id == target) {
            let err = ViewerError::UnknownScene(target.to_string());
            log::error!("{err}");
            if let Some(cb) = self.callbacks.navigation_failed.as_mut() {
                cb(&err);
            }
            return Err(err);
        }

        log::info!("navigating to scene {target}");
        self.load_scene(target.to_string());
        if let Some(cb) = self.callbacks.navigation.as_mut() {
            cb(target);
        }
        Ok(())
    }

    /// Replaces the scene snapshot after the host edited the tour.
    pub fn set_scenes(&mut self, scenes: Vec<Scene>) {
        let previous_image = self.current_scene().map(|s| s.image.clone());
        self.scenes = scenes;
        let current_image = self.current_scene().map(|s| s.image.clone());

        match (self.current.clone(), current_image) {
            (Some(id), Some(image)) => {
                if previous_image.as_deref() != Some(image.as_str()) {
                    log::info!("panorama of scene {id} changed, reloading");
                    self.load_scene(id);
                }
            }
            _ => {
                self.current = None;
                self.markers.clear();
                match self.scenes.first().map(|s| s.id.clone()) {
                    Some(first) => {
                        log::warn!("current scene was removed, moving to {first}");
                        self.load_scene(first);
                    }
                    None => {
                        // nothing left to show; a load still in flight is stale
                        self.pending = None;
                        if self.state == ViewerState::Transitioning {
                            self.state = ViewerState::Ready;
                        }
                    }
                }
            }
        }

        if self.selected_info_point().is_none() {
            self.selected = None;
        }
    }

    fn load_scene(&mut self, id: String) {
        let Some(image) = self.scenes.iter().find(|s| s.id == id).map(|s| s.image.clone()) else {
            return;
        };
        self.generation += 1;
        self.pending = Some(self.generation);
        if self.state != ViewerState::Loading {
            self.state = ViewerState::Transitioning;
        }
        self.view.orientation.reset();
        self.selected = None;
        self.markers.clear();
        self.current = Some(id);
        self.source.request(LoadTicket {
            generation: self.generation,
            source: image,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::loader::LoadOutcome;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::rc::Rc;

    /// Loads complete only when the test says so.
    #[derive(Clone, Default)]
    struct ManualSource {
        requests: Rc<RefCell<Vec<LoadTicket>>>,
        done: Rc<RefCell<VecDeque<LoadOutcome<String>>>>,
    }

    impl ManualSource {
        fn finish(&self, generation: u64, ok: bool) {
            let ticket = self
                .requests
                .borrow()
                .iter()
                .find(|t| t.generation == generation)
                .cloned()
                .unwrap();
            let result = if ok {
                Ok(ticket.source.clone())
            } else {
                Err(LoadError::Decode {
                    path: PathBuf::from(&ticket.source),
                    message: "corrupt".into(),
                })
            };
            self.done.borrow_mut().push_back(LoadOutcome {
                generation,
                source: ticket.source,
                result,
            });
        }
    }

    impl PanoramaSource for ManualSource {
        type Image = String;

        fn request(&mut self, ticket: LoadTicket) {
            self.requests.borrow_mut().push(ticket);
        }

        fn poll(&mut self) -> Option<LoadOutcome<String>> {
            self.done.borrow_mut().pop_front()
        }
    }

    fn point(id: &str, yaw: f32, pitch: f32, kind: InfoPointKind) -> InfoPoint {
        InfoPoint {
            id: id.into(),
            position: Spherical::new(yaw, pitch, 400.0),
            title: id.to_uppercase(),
            description: String::new(),
            details: String::new(),
            icon: "building".into(),
            kind,
            extra: Default::default(),
        }
    }

    fn scene(id: &str, points: Vec<InfoPoint>) -> Scene {
        Scene {
            id: id.into(),
            name: id.into(),
            description: String::new(),
            image: format!("{id}.jpg"),
            info_points: points,
            ..Scene::default()
        }
    }

    fn tour() -> Vec<Scene> {
        vec![
            scene(
                "a",
                vec![
                    point("front", 0.0, 0.0, InfoPointKind::Info),
                    point("back", 180.0, 0.0, InfoPointKind::Info),
                    point("door", 5.0, 0.0, InfoPointKind::SceneLink { link_to: "b".into() }),
                ],
            ),
            scene("b", vec![point("x", 0.0, 0.0, InfoPointKind::Info)]),
        ]
    }

    const VIEWPORT: Viewport = Viewport {
        width: 1280.0,
        height: 720.0,
    };

    fn ready_viewer() -> (ViewerController<ManualSource>, ManualSource) {
        let source = ManualSource::default();
        let mut viewer = ViewerController::new(ViewerSettings::default(), tour(), Some("a"), source.clone());
        source.finish(1, true);
        assert_eq!(viewer.tick(VIEWPORT).as_deref(), Some("a.jpg"));
        (viewer, source)
    }

    #[test]
    fn starts_loading_until_first_image_settles() {
        let source = ManualSource::default();
        let mut viewer = ViewerController::new(ViewerSettings::default(), tour(), None, source.clone());
        assert_eq!(viewer.state(), ViewerState::Loading);
        assert_eq!(viewer.current_scene().unwrap().id, "a");
        assert!(viewer.tick(VIEWPORT).is_none());
        assert_eq!(viewer.state(), ViewerState::Loading);
        assert!(viewer.markers().is_empty());

        source.finish(1, true);
        assert!(viewer.tick(VIEWPORT).is_some());
        assert_eq!(viewer.state(), ViewerState::Ready);
        assert!(!viewer.markers().is_empty());
    }

    #[test]
    fn failed_initial_load_still_becomes_ready() {
        let source = ManualSource::default();
        let mut viewer = ViewerController::new(ViewerSettings::default(), tour(), Some("a"), source.clone());
        source.finish(1, false);
        assert!(viewer.tick(VIEWPORT).is_none());
        assert_eq!(viewer.state(), ViewerState::Ready);
    }

    #[test]
    fn empty_tour_is_ready_after_first_tick() {
        let mut viewer = ViewerController::new(ViewerSettings::default(), Vec::new(), None, ManualSource::default());
        viewer.tick(VIEWPORT);
        assert_eq!(viewer.state(), ViewerState::Ready);
        assert!(viewer.current_scene().is_none());
        assert_eq!(viewer.select_info_point("x"), Err(ViewerError::NoScene));
    }

    #[test]
    fn unknown_initial_scene_falls_back_to_first() {
        let viewer = ViewerController::new(ViewerSettings::default(), tour(), Some("zzz"), ManualSource::default());
        assert_eq!(viewer.current_scene().unwrap().id, "a");
    }

    #[test]
    fn markers_behind_camera_are_omitted() {
        let (mut viewer, _) = ready_viewer();
        let ids: Vec<_> = viewer.markers().iter().map(|m| m.point_id.as_str()).collect();
        assert_eq!(ids, ["front", "door"]);

        viewer.rotate(180.0, 0.0);
        viewer.tick(VIEWPORT);
        let ids: Vec<_> = viewer.markers().iter().map(|m| m.point_id.as_str()).collect();
        assert_eq!(ids, ["back"]);
    }

    #[test]
    fn later_markers_win_hit_test() {
        let (viewer, _) = ready_viewer();
        let front = viewer.markers()[0].position;
        // "door" at yaw 5 overlaps "front" at default marker size
        let between = (front + viewer.markers()[1].position) * 0.5;
        assert_eq!(viewer.hit_test(between).unwrap().point_id, "door");
        assert!(viewer.hit_test(Vec2::new(10.0, 10.0)).is_none());
    }

    #[test]
    fn selecting_info_point_opens_details() {
        let (mut viewer, _) = ready_viewer();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        viewer.on_info_point_selected(move |id| sink.borrow_mut().push(id.to_string()));

        viewer.select_info_point("front").unwrap();
        assert_eq!(viewer.selected_info_point().unwrap().id, "front");
        assert_eq!(*seen.borrow(), ["front"]);
        viewer.close_details();
        assert!(viewer.selected_info_point().is_none());

        assert_eq!(
            viewer.select_info_point("nope"),
            Err(ViewerError::UnknownInfoPoint("nope".into()))
        );
    }

    #[test]
    fn transition_resets_view_and_hides_markers() {
        let (mut viewer, source) = ready_viewer();
        viewer.rotate(40.0, 10.0);
        viewer.select_info_point("door").unwrap();
        assert_eq!(viewer.state(), ViewerState::Transitioning);
        assert_eq!(viewer.orientation(), Orientation::default());
        assert_eq!(viewer.current_scene().unwrap().id, "b");

        viewer.tick(VIEWPORT);
        assert!(viewer.markers().is_empty());

        source.finish(2, true);
        assert_eq!(viewer.tick(VIEWPORT).as_deref(), Some("b.jpg"));
        assert_eq!(viewer.state(), ViewerState::Ready);
        assert_eq!(viewer.markers()[0].point_id, "x");
    }

    #[test]
    fn later_navigation_wins_over_slow_load() {
        let (mut viewer, source) = ready_viewer();
        viewer.navigate_to("b").unwrap();
        viewer.navigate_to("a").unwrap();

        // the load for "b" finishes after "a" was requested
        source.finish(2, true);
        assert!(viewer.tick(VIEWPORT).is_none());
        assert_eq!(viewer.state(), ViewerState::Transitioning);

        source.finish(3, true);
        assert_eq!(viewer.tick(VIEWPORT).as_deref(), Some("a.jpg"));
        assert_eq!(viewer.state(), ViewerState::Ready);
        assert_eq!(viewer.current_scene().unwrap().id, "a");
    }

    #[test]
    fn failed_transition_load_returns_to_ready() {
        let (mut viewer, source) = ready_viewer();
        viewer.navigate_to("b").unwrap();
        source.finish(2, false);
        assert!(viewer.tick(VIEWPORT).is_none());
        assert_eq!(viewer.state(), ViewerState::Ready);
        assert_eq!(viewer.current_scene().unwrap().id, "b");
    }

    #[test]
    fn navigating_to_current_scene_is_noop() {
        let (mut viewer, source) = ready_viewer();
        viewer.rotate(30.0, 0.0);
        viewer.navigate_to("a").unwrap();
        assert_eq!(viewer.state(), ViewerState::Ready);
        assert_eq!(viewer.orientation().yaw, 30.0);
        assert_eq!(source.requests.borrow().len(), 1);
    }

    #[test]
    fn placement_needs_a_handler() {
        let (mut viewer, _) = ready_viewer();
        assert!(!viewer.placement_enabled());
        assert!(viewer.place_info_point(VIEWPORT.center(), VIEWPORT).is_none());

        let placed = Rc::new(RefCell::new(Vec::new()));
        let sink = placed.clone();
        viewer.on_info_point_placed(move |p| sink.borrow_mut().push(p));
        let placement = viewer.place_info_point(VIEWPORT.center(), VIEWPORT).unwrap();
        assert_eq!(placement.scene_id, "a");
        assert!(placement.position.yaw.abs() < 1e-3);
        assert!((placement.position.pitch + 2.5).abs() < 1e-3);
        assert_eq!(placement.position.distance, 400.0);
        assert_eq!(*placed.borrow(), [placement]);
    }

    #[test]
    fn key_rotation_uses_step() {
        let (mut viewer, _) = ready_viewer();
        let step = viewer.settings().key_step;
        viewer.key_rotate(KeyRotation::Right);
        viewer.key_rotate(KeyRotation::Up);
        assert!((viewer.orientation().yaw - step).abs() < 1e-4);
        assert!((viewer.orientation().pitch - step).abs() < 1e-4);
        viewer.key_rotate(KeyRotation::Left);
        viewer.key_rotate(KeyRotation::Down);
        assert!(viewer.orientation().yaw.abs() < 1e-4);
        viewer.rotate(12.0, -3.0);
        viewer.reset_view();
        assert_eq!(viewer.orientation(), Orientation::default());
        assert_eq!(viewer.current_scene().unwrap().id, "a");
    }

    #[test]
    fn set_scenes_handles_removed_current_scene() {
        let (mut viewer, source) = ready_viewer();
        viewer.select_info_point("front").unwrap();

        let mut edited = tour();
        edited[0].info_points.retain(|p| p.id != "front");
        viewer.set_scenes(edited);
        assert_eq!(viewer.state(), ViewerState::Ready);
        assert!(viewer.selected_info_point().is_none());
        assert_eq!(source.requests.borrow().len(), 1);

        viewer.set_scenes(vec![scene("b", Vec::new())]);
        assert_eq!(viewer.current_scene().unwrap().id, "b");
        assert_eq!(viewer.state(), ViewerState::Transitioning);
        assert_eq!(source.requests.borrow().last().unwrap().source, "b.jpg");
    }

    #[test]
    fn far_info_point_still_gets_a_marker() {
        let source = ManualSource::default();
        let mut far = point("far", 0.0, 0.0, InfoPointKind::Info);
        far.position.distance = 1500.0;
        let mut viewer = ViewerController::new(
            ViewerSettings::default(),
            vec![scene("a", vec![far])],
            None,
            source.clone(),
        );
        source.finish(1, true);
        viewer.tick(VIEWPORT);
        viewer.tick(VIEWPORT);

        assert_eq!(viewer.markers().len(), 1);
        let marker = &viewer.markers()[0];
        assert!((marker.position.x - VIEWPORT.width / 2.0).abs() < 0.5);
        assert!((marker.position.y - VIEWPORT.height / 2.0).abs() < 0.5);
        assert_eq!(marker.scale, crate::coords::MIN_MARKER_SCALE);
    }

    fn record_loaded(viewer: &mut ViewerController<ManualSource>) -> Rc<RefCell<Vec<String>>> {
        let loaded = Rc::new(RefCell::new(Vec::new()));
        let sink = loaded.clone();
        viewer.on_scene_loaded(move |id| sink.borrow_mut().push(id.to_string()));
        loaded
    }

    #[test]
    fn scene_loaded_fires_once_per_successful_load() {
        let source = ManualSource::default();
        let mut viewer = ViewerController::new(ViewerSettings::default(), tour(), Some("a"), source.clone());
        let loaded = record_loaded(&mut viewer);

        viewer.tick(VIEWPORT);
        assert!(loaded.borrow().is_empty());
        source.finish(1, true);
        viewer.tick(VIEWPORT);
        viewer.tick(VIEWPORT);
        assert_eq!(*loaded.borrow(), ["a"]);

        viewer.navigate_to("b").unwrap();
        source.finish(2, true);
        viewer.tick(VIEWPORT);
        assert_eq!(*loaded.borrow(), ["a", "b"]);
    }

    #[test]
    fn scene_loaded_skips_failed_loads() {
        let (mut viewer, source) = ready_viewer();
        let loaded = record_loaded(&mut viewer);

        viewer.navigate_to("b").unwrap();
        source.finish(2, false);
        viewer.tick(VIEWPORT);
        assert_eq!(viewer.state(), ViewerState::Ready);
        assert!(loaded.borrow().is_empty());
    }

    #[test]
    fn scene_loaded_skips_stale_generations() {
        let (mut viewer, source) = ready_viewer();
        let loaded = record_loaded(&mut viewer);

        viewer.navigate_to("b").unwrap();
        viewer.navigate_to("a").unwrap();
        source.finish(2, true);
        viewer.tick(VIEWPORT);
        assert!(loaded.borrow().is_empty());

        source.finish(3, true);
        viewer.tick(VIEWPORT);
        assert_eq!(*loaded.borrow(), ["a"]);
    }

    #[test]
    fn emptied_tour_drops_the_load_in_flight() {
        let (mut viewer, source) = ready_viewer();
        let loaded = record_loaded(&mut viewer);
        viewer.navigate_to("b").unwrap();
        assert_eq!(viewer.state(), ViewerState::Transitioning);

        viewer.set_scenes(Vec::new());
        assert_eq!(viewer.state(), ViewerState::Ready);
        assert!(viewer.current_scene().is_none());

        source.finish(2, true);
        assert!(viewer.tick(VIEWPORT).is_none());
        assert!(loaded.borrow().is_empty());
        assert!(viewer.markers().is_empty());
    }
}
