// panorama.rs: camera orientation and view parameters

use crate::coords::{clamp_pitch, normalize_yaw, Camera, Viewport};

/// Camera orientation in degrees. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    /// Wraps at ±180.
    pub yaw: f32,
    /// Clamped to ±90 so the view never flips over the pole.
    pub pitch: f32,
}

impl Orientation {
    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw = normalize_yaw(self.yaw + delta_yaw);
        self.pitch = clamp_pitch(self.pitch + delta_pitch);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Heading for a compass display, 0..=359.
    pub fn compass_heading(&self) -> u16 {
        (self.yaw.round() as i32).rem_euclid(360) as u16
    }
}

/// View parameters of one viewer session.
#[derive(Debug, Clone)]
pub struct PanoramaView {
    pub orientation: Orientation,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub sensitivity_scale: f32,
    pub is_fullscreen: bool,
}

impl PanoramaView {
    pub fn new(fov: f32, near: f32, far: f32, sensitivity_scale: f32) -> Self {
        Self {
            orientation: Orientation::default(),
            fov,
            near,
            far,
            sensitivity_scale,
            is_fullscreen: false,
        }
    }

    pub fn camera(&self, viewport: Viewport) -> Camera {
        let aspect = if viewport.is_empty() { 1.0 } else { viewport.aspect() };
        Camera {
            yaw: self.orientation.yaw,
            pitch: self.orientation.pitch,
            fov: self.fov,
            aspect,
            near: self.near,
            far: self.far,
        }
    }

    /// Turns a pointer drag in pixels into a rotation, one screen width
    /// covering the horizontal field of view. Dragging right looks left.
    pub fn drag(&mut self, dx: f32, dy: f32, viewport: Viewport) {
        if viewport.is_empty() {
            return;
        }
        let v_f = self.fov.to_radians();
        let h_f = 2.0 * ((v_f / 2.0).tan() * viewport.aspect()).atan();

        let yaw_per_px_deg = (h_f / viewport.width).to_degrees();
        let pitch_per_px_deg = (v_f / viewport.height).to_degrees();

        self.orientation.rotate(
            -dx * yaw_per_px_deg * self.sensitivity_scale,
            dy * pitch_per_px_deg * self.sensitivity_scale,
        );
    }
}
