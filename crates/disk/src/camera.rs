//! Perspective camera that slowly drifts while always looking at the origin.

use backdrop_core::glam::{DMat4, DVec2, DVec3};

/// Vertical field of view in degrees.
pub const FOV_Y_DEGREES: f64 = 75.0;
pub const NEAR: f64 = 0.1;
pub const FAR: f64 = 1000.0;
/// Resting position before any drift is applied.
pub const HOME: DVec3 = DVec3::new(0.0, 1.0, 5.0);

const DRIFT_RATE: f64 = 0.1;
const DRIFT_X: f64 = 0.5;
const DRIFT_Y: f64 = 0.2;

/// A point mapped to surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub screen: DVec2,
    /// Distance in front of the camera along its view axis.
    pub depth: f64,
}

#[derive(Debug, Clone)]
pub struct Camera {
    position: DVec3,
    aspect: f64,
}

impl Camera {
    pub fn new(aspect: f64) -> Self {
        Self {
            position: HOME,
            aspect,
        }
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn aspect(&self) -> f64 {
        self.aspect
    }

    pub fn set_aspect(&mut self, aspect: f64) {
        self.aspect = aspect;
    }

    /// Places the camera on its drift path at `elapsed_secs`; z never moves.
    pub fn drift(&mut self, elapsed_secs: f64) {
        let phase = elapsed_secs * DRIFT_RATE;
        self.position.x = phase.sin() * DRIFT_X;
        self.position.y = HOME.y + phase.cos() * DRIFT_Y;
    }

    pub fn view(&self) -> DMat4 {
        DMat4::look_at_rh(self.position, DVec3::ZERO, DVec3::Y)
    }

    pub fn projection(&self) -> DMat4 {
        DMat4::perspective_rh_gl(FOV_Y_DEGREES.to_radians(), self.aspect, NEAR, FAR)
    }

    /// Maps a world point to pixel coordinates on a `width` x `height`
    /// surface. `None` when the point is outside the near/far range.
    pub fn project(&self, point: DVec3, width: usize, height: usize) -> Option<Projected> {
        let eye = self.view().transform_point3(point);
        let depth = -eye.z;
        if !(NEAR..=FAR).contains(&depth) {
            return None;
        }
        let ndc = self.projection().project_point3(eye);
        Some(Projected {
            screen: DVec2::new(
                (ndc.x + 1.0) * 0.5 * width as f64,
                (1.0 - ndc.y) * 0.5 * height as f64,
            ),
            depth,
        })
    }

    /// On-screen radius in pixels of a sphere of `radius` at `center`.
    pub fn sphere_screen_radius(&self, center: DVec3, radius: f64, height: usize) -> f64 {
        let distance = self.position.distance(center);
        if distance <= radius {
            return f64::INFINITY;
        }
        let s = radius / distance;
        let tan_angular = s / (1.0 - s * s).sqrt();
        tan_angular / (FOV_Y_DEGREES.to_radians() * 0.5).tan() * height as f64 * 0.5
    }

    /// Whether the sight line from the camera to `point` passes through the
    /// sphere of `radius` at the origin before reaching the point.
    pub fn occluded_by_sphere(&self, point: DVec3, radius: f64) -> bool {
        let to_point = point - self.position;
        let length = to_point.length();
        if length == 0.0 {
            return false;
        }
        let dir = to_point / length;
        let c = self.position.length_squared() - radius * radius;
        if c <= 0.0 {
            return true;
        }
        let b = self.position.dot(dir);
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return false;
        }
        let entry = -b - discriminant.sqrt();
        entry > 0.0 && entry < length
    }
}
