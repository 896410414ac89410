// coords.rs: spherical / cartesian / screen conversions and pointer picking
//
// View space is left-handed: +X right, +Y up, +Z forward.
// yaw turns right (compass direction), pitch turns up. Both in degrees.

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Radius of the panorama sphere the viewer sits inside.
pub const PANORAMA_RADIUS: f32 = 500.0;
/// Distance given to newly placed info points.
pub const DEFAULT_POINT_DISTANCE: f32 = 400.0;
/// Numerator of the marker scale heuristic.
pub const MARKER_SCALE_REFERENCE: f32 = 500.0;
pub const MIN_MARKER_SCALE: f32 = 0.5;
pub const MAX_MARKER_SCALE: f32 = 1.5;

/// A direction plus radial distance, angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spherical {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
}

impl Spherical {
    pub fn new(yaw: f32, pitch: f32, distance: f32) -> Self {
        Self { yaw, pitch, distance }
    }

    /// Same point with yaw wrapped into [-180, 180) and pitch clamped.
    pub fn normalized(self) -> Self {
        Self {
            yaw: normalize_yaw(self.yaw),
            pitch: clamp_pitch(self.pitch),
            distance: self.distance,
        }
    }

    pub fn to_cartesian(self) -> Vec3 {
        spherical_to_cartesian(self.yaw, self.pitch, self.distance)
    }
}

/// Wraps a yaw angle into [-180, 180). Values already in range come back untouched.
pub fn normalize_yaw(yaw: f32) -> f32 {
    if (-180.0..180.0).contains(&yaw) {
        return yaw;
    }
    let wrapped = (yaw + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid may round up to exactly 360 for tiny negative inputs
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

pub fn clamp_pitch(pitch: f32) -> f32 {
    pitch.clamp(-90.0, 90.0)
}

pub fn spherical_to_cartesian(yaw: f32, pitch: f32, distance: f32) -> Vec3 {
    let yaw = yaw.to_radians();
    let pitch = pitch.to_radians();
    Vec3::new(
        distance * pitch.cos() * yaw.sin(),
        distance * pitch.sin(),
        distance * pitch.cos() * yaw.cos(),
    )
}

/// Inverse of [`spherical_to_cartesian`] through the unit vector.
///
/// Yaw comes from `atan2(x, z)`, pitch is `90° - angle from +Y`. At the poles
/// yaw is numerically meaningless; only pitch is reliable there.
pub fn cartesian_to_spherical(v: Vec3) -> Spherical {
    let distance = v.length();
    let unit = v.normalize_or_zero();
    let yaw = unit.x.atan2(unit.z).to_degrees();
    let pitch = 90.0 - unit.y.clamp(-1.0, 1.0).acos().to_degrees();
    Spherical {
        yaw: normalize_yaw(yaw),
        pitch: clamp_pitch(pitch),
        distance,
    }
}

/// Presentation scale for a marker: closer markers draw larger.
pub fn marker_scale(position: Vec3, reference: f32) -> f32 {
    (reference / position.length()).clamp(MIN_MARKER_SCALE, MAX_MARKER_SCALE)
}

/// Render surface size in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Pixel position (origin top-left, y down) to normalized device coordinates.
    pub fn to_ndc(&self, pointer: Vec2) -> Vec2 {
        Vec2::new(
            pointer.x / self.width * 2.0 - 1.0,
            -(pointer.y / self.height) * 2.0 + 1.0,
        )
    }
}

/// Where a 3D point lands on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    pub visible: bool,
    pub scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Nearest non-negative intersection of a ray with a sphere.
pub fn intersect_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<Vec3> {
    let oc = ray.origin - center;
    let a = ray.direction.dot(ray.direction);
    if a <= f32::EPSILON {
        return None;
    }
    let b = 2.0 * oc.dot(ray.direction);
    let c = oc.dot(oc) - radius * radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_disc = discriminant.sqrt();
    let t1 = (-b - sqrt_disc) / (2.0 * a);
    let t2 = (-b + sqrt_disc) / (2.0 * a);
    let t = if t1 >= 0.0 {
        t1
    } else if t2 >= 0.0 {
        t2
    } else {
        return None;
    };

    Some(ray.at(t))
}

/// Fixed correction applied to picked coordinates so a marker anchor sits
/// where the pointer was. Empirical; depends on marker size and fov.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub yaw_offset: f32,
    pub pitch_offset: f32,
}

impl Calibration {
    pub const NONE: Calibration = Calibration {
        yaw_offset: 0.0,
        pitch_offset: 0.0,
    };
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            yaw_offset: 0.0,
            pitch_offset: -2.5,
        }
    }
}

/// Perspective camera sitting at the sphere center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn position(&self) -> Vec3 {
        Vec3::ZERO
    }

    /// Camera-to-world rotation: pitch about X first, then yaw about Y.
    pub fn rotation(&self) -> Mat4 {
        Mat4::from_rotation_y(self.yaw.to_radians())
            * Mat4::from_rotation_x(-clamp_pitch(self.pitch).to_radians())
    }

    pub fn forward(&self) -> Vec3 {
        spherical_to_cartesian(self.yaw, clamp_pitch(self.pitch), 1.0)
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.rotation().transpose() * Mat4::from_translation(-self.position())
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_lh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Projects a world position to pixels. Points behind the camera come
    /// back with `visible == false`; their x/y are not meaningful.
    ///
    /// Visibility ignores the far plane: an info point's distance only sets
    /// its marker scale, not a depth to clip against.
    pub fn project(&self, viewport: Viewport, position: Vec3, scale_reference: f32) -> ScreenPoint {
        let clip = self.view_projection() * position.extend(1.0);
        let ndc = clip.truncate() / clip.w;

        ScreenPoint {
            x: (ndc.x * 0.5 + 0.5) * viewport.width,
            y: (ndc.y * -0.5 + 0.5) * viewport.height,
            visible: clip.w > 0.0,
            scale: marker_scale(position, scale_reference),
        }
    }

    /// Ray from the camera through a pixel of the viewport.
    pub fn ray_through(&self, viewport: Viewport, pointer: Vec2) -> Option<Ray> {
        if viewport.is_empty() {
            return None;
        }
        let ndc = viewport.to_ndc(pointer);
        let inverse = self.view_projection().inverse();
        let target = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 0.5));
        let origin = self.position();
        let direction = (target - origin).normalize_or_zero();
        if direction == Vec3::ZERO || !direction.is_finite() {
            return None;
        }
        Some(Ray { origin, direction })
    }
}

/// Pointer position to spherical coordinates on the panorama sphere.
///
/// The returned point carries `distance`; only yaw and pitch come from the hit.
pub fn pick_spherical(
    camera: &Camera,
    viewport: Viewport,
    pointer: Vec2,
    sphere_radius: f32,
    calibration: Calibration,
    distance: f32,
) -> Option<Spherical> {
    let ray = camera.ray_through(viewport, pointer)?;
    let hit = intersect_sphere(&ray, Vec3::ZERO, sphere_radius)?;
    let picked = cartesian_to_spherical(hit);

    Some(
        Spherical {
            yaw: picked.yaw + calibration.yaw_offset,
            pitch: picked.pitch + calibration.pitch_offset,
            distance,
        }
        .normalized(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn camera(yaw: f32, pitch: f32) -> Camera {
        Camera {
            yaw,
            pitch,
            fov: 75.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }

    const VIEWPORT: Viewport = Viewport {
        width: 1280.0,
        height: 720.0,
    };

    #[test]
    fn yaw_normalization() {
        assert_eq!(normalize_yaw(190.0), -170.0);
        assert_eq!(normalize_yaw(-190.0), 170.0);
        assert_eq!(normalize_yaw(180.0), -180.0);
        assert_eq!(normalize_yaw(540.0), -180.0);
        assert_eq!(normalize_yaw(725.0), 5.0);
        assert!(normalize_yaw(-1e-9 - 180.0) < 180.0);
    }

    #[test]
    fn yaw_normalization_is_idempotent() {
        for yaw in [-180.0, -179.9, -90.5, -0.1, 0.0, 0.1, 33.3, 179.99] {
            assert_eq!(normalize_yaw(yaw), yaw);
            assert_eq!(normalize_yaw(normalize_yaw(yaw + 720.0)), normalize_yaw(yaw + 720.0));
        }
    }

    #[test]
    fn pitch_clamping() {
        assert_eq!(clamp_pitch(120.0), 90.0);
        assert_eq!(clamp_pitch(-120.0), -90.0);
        assert_eq!(clamp_pitch(45.0), 45.0);
    }

    #[test]
    fn forward_mapping_axes() {
        let forward = spherical_to_cartesian(0.0, 0.0, 400.0);
        assert_abs_diff_eq!(forward.z, 400.0, epsilon = 1e-3);
        assert_abs_diff_eq!(forward.x, 0.0, epsilon = 1e-3);

        let right = spherical_to_cartesian(90.0, 0.0, 1.0);
        assert_abs_diff_eq!(right.x, 1.0, epsilon = 1e-6);

        let up = spherical_to_cartesian(0.0, 90.0, 1.0);
        assert_abs_diff_eq!(up.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn round_trip_recovers_angles() {
        let mut yaw = -180.0;
        while yaw < 180.0 {
            let mut pitch = -85.0;
            while pitch <= 85.0 {
                for distance in [1.0, 400.0, 2500.0] {
                    let back = cartesian_to_spherical(spherical_to_cartesian(yaw, pitch, distance));
                    let dyaw = normalize_yaw(back.yaw - yaw);
                    assert_abs_diff_eq!(dyaw, 0.0, epsilon = 1e-2);
                    assert_abs_diff_eq!(back.pitch, pitch, epsilon = 1e-2);
                    assert_abs_diff_eq!(back.distance, distance, epsilon = distance * 1e-4);
                }
                pitch += 17.0;
            }
            yaw += 15.0;
        }
    }

    #[test]
    fn round_trip_at_poles_keeps_pitch() {
        for yaw in [-120.0, 0.0, 75.0] {
            let up = cartesian_to_spherical(spherical_to_cartesian(yaw, 90.0, 400.0));
            assert_abs_diff_eq!(up.pitch, 90.0, epsilon = 1e-2);
            let down = cartesian_to_spherical(spherical_to_cartesian(yaw, -90.0, 400.0));
            assert_abs_diff_eq!(down.pitch, -90.0, epsilon = 1e-2);
        }
    }

    #[test]
    fn marker_scale_is_monotone_and_bounded() {
        let mut previous = f32::INFINITY;
        for step in 0..200 {
            let d = 50.0 + step as f32 * 10.0;
            let s = marker_scale(Vec3::new(0.0, 0.0, d), MARKER_SCALE_REFERENCE);
            assert!((MIN_MARKER_SCALE..=MAX_MARKER_SCALE).contains(&s));
            assert!(s <= previous);
            previous = s;
        }
        assert_eq!(marker_scale(Vec3::ZERO, MARKER_SCALE_REFERENCE), MAX_MARKER_SCALE);
        assert_abs_diff_eq!(
            marker_scale(spherical_to_cartesian(10.0, 5.0, 400.0), MARKER_SCALE_REFERENCE),
            1.25,
            epsilon = 1e-4
        );
    }

    #[test]
    fn ray_sphere_from_inside_hits_once() {
        let ray = Ray {
            origin: Vec3::ZERO,
            direction: Vec3::new(0.0, 0.0, 1.0),
        };
        let hit = intersect_sphere(&ray, Vec3::ZERO, PANORAMA_RADIUS).unwrap();
        assert_abs_diff_eq!(hit.z, PANORAMA_RADIUS, epsilon = 1e-3);
    }

    #[test]
    fn ray_sphere_miss() {
        let ray = Ray {
            origin: Vec3::new(0.0, 1000.0, 0.0),
            direction: Vec3::new(0.0, 0.0, 1.0),
        };
        assert!(intersect_sphere(&ray, Vec3::ZERO, PANORAMA_RADIUS).is_none());

        let behind = Ray {
            origin: Vec3::new(0.0, 0.0, 1000.0),
            direction: Vec3::new(0.0, 0.0, 1.0),
        };
        assert!(intersect_sphere(&behind, Vec3::ZERO, PANORAMA_RADIUS).is_none());
    }

    #[test]
    fn center_pointer_picks_forward() {
        let cam = camera(0.0, 0.0);
        let raw = pick_spherical(&cam, VIEWPORT, VIEWPORT.center(), PANORAMA_RADIUS, Calibration::NONE, 400.0)
            .unwrap();
        assert_abs_diff_eq!(raw.yaw, 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(raw.pitch, 0.0, epsilon = 1e-3);
        assert_eq!(raw.distance, 400.0);

        let calibrated = pick_spherical(
            &cam,
            VIEWPORT,
            VIEWPORT.center(),
            PANORAMA_RADIUS,
            Calibration::default(),
            400.0,
        )
        .unwrap();
        assert_abs_diff_eq!(calibrated.yaw, 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(calibrated.pitch, -2.5, epsilon = 1e-3);
    }

    #[test]
    fn center_pointer_follows_camera() {
        let cam = camera(135.0, 20.0);
        let picked = pick_spherical(&cam, VIEWPORT, VIEWPORT.center(), PANORAMA_RADIUS, Calibration::NONE, 400.0)
            .unwrap();
        assert_abs_diff_eq!(picked.yaw, 135.0, epsilon = 1e-2);
        assert_abs_diff_eq!(picked.pitch, 20.0, epsilon = 1e-2);
    }

    #[test]
    fn calibration_result_stays_in_domain() {
        let cam = camera(0.0, 89.0);
        let cal = Calibration {
            yaw_offset: 200.0,
            pitch_offset: 5.0,
        };
        let picked = pick_spherical(&cam, VIEWPORT, VIEWPORT.center(), PANORAMA_RADIUS, cal, 400.0).unwrap();
        assert!((-180.0..180.0).contains(&picked.yaw));
        assert_eq!(picked.pitch, 90.0);
    }

    #[test]
    fn projection_then_pick_round_trips() {
        let cam = camera(-30.0, 10.0);
        for (yaw, pitch) in [(-30.0, 10.0), (-50.0, 0.0), (-10.0, 25.0), (-40.0, -5.0)] {
            let p = spherical_to_cartesian(yaw, pitch, 400.0);
            let screen = cam.project(VIEWPORT, p, MARKER_SCALE_REFERENCE);
            assert!(screen.visible);
            let picked = pick_spherical(
                &cam,
                VIEWPORT,
                Vec2::new(screen.x, screen.y),
                PANORAMA_RADIUS,
                Calibration::NONE,
                400.0,
            )
            .unwrap();
            assert_abs_diff_eq!(picked.yaw, yaw, epsilon = 0.05);
            assert_abs_diff_eq!(picked.pitch, pitch, epsilon = 0.05);
        }
    }

    #[test]
    fn left_below_point_projects_left_below() {
        let cam = camera(0.0, 0.0);
        let p = spherical_to_cartesian(-60.0, -10.0, 400.0);
        let screen = cam.project(VIEWPORT, p, MARKER_SCALE_REFERENCE);
        assert!(screen.visible);
        assert!(screen.x < VIEWPORT.width / 2.0);
        assert!(screen.y > VIEWPORT.height / 2.0);
    }

    #[test]
    fn point_beyond_far_plane_stays_visible() {
        let cam = camera(0.0, 0.0);
        let p = spherical_to_cartesian(0.0, 0.0, 1500.0);
        let screen = cam.project(VIEWPORT, p, MARKER_SCALE_REFERENCE);
        assert!(screen.visible);
        assert_abs_diff_eq!(screen.x, VIEWPORT.width / 2.0, epsilon = 1e-2);
        assert_abs_diff_eq!(screen.y, VIEWPORT.height / 2.0, epsilon = 1e-2);
        assert_eq!(screen.scale, MIN_MARKER_SCALE);
    }

    #[test]
    fn point_behind_is_hidden() {
        let cam = camera(0.0, 0.0);
        let p = spherical_to_cartesian(180.0, 0.0, 400.0);
        assert!(!cam.project(VIEWPORT, p, MARKER_SCALE_REFERENCE).visible);
    }

    #[test]
    fn degenerate_viewport_has_no_ray() {
        let cam = camera(0.0, 0.0);
        assert!(cam.ray_through(Viewport::new(0.0, 720.0), Vec2::ZERO).is_none());
    }
}
