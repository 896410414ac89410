use crate::coords::{Calibration, DEFAULT_POINT_DISTANCE, MARKER_SCALE_REFERENCE, PANORAMA_RADIUS};

use serde::{Deserialize, Serialize};

pub const CONFY_APP_NAME: &str = "panorama-tour";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// Vertical field of view, degrees.
    pub fov: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub sphere_radius: f32,
    pub marker_scale_reference: f32,
    /// Distance stored on newly placed info points.
    pub default_point_distance: f32,
    pub sensitivity_scale: f32,
    /// Arrow-key rotation step, degrees.
    pub key_step: f32,
    pub double_click_ms: u64,
    /// Max pointer travel, in pixels, for a press/release to count as a click.
    pub click_slop_px: f32,
    /// Marker hit radius at scale 1.0, in pixels.
    pub marker_radius_px: f32,
    pub language: String,
    // tables go last so the toml serializer accepts the layout
    pub calibration: Calibration,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near_plane: 0.1,
            far_plane: 1000.0,
            sphere_radius: PANORAMA_RADIUS,
            marker_scale_reference: MARKER_SCALE_REFERENCE,
            default_point_distance: DEFAULT_POINT_DISTANCE,
            sensitivity_scale: 1.0,
            key_step: 0.1f32.to_degrees(),
            double_click_ms: 400,
            click_slop_px: 6.0,
            marker_radius_px: 24.0,
            language: "en".to_string(),
            calibration: Calibration::default(),
        }
    }
}

impl ViewerSettings {
    pub fn load() -> Self {
        match confy::load(CONFY_APP_NAME, "viewer") {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("cannot read viewer settings, using defaults: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        if let Err(e) = confy::store(CONFY_APP_NAME, "viewer", self) {
            log::warn!("cannot store viewer settings: {e}");
        }
    }
}
