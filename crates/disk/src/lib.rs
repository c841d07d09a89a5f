#![deny(unsafe_code)]
//! Accretion disk: a ring of particles spiralling into a dark central sphere.
//!
//! Each particle orbits the origin in the xz-plane at a fixed small height.
//! Every tick it advances its polar angle and shrinks its radius, both scaled
//! by a multiplier that grows toward the center, so inner particles whirl
//! faster. Once a particle falls inside the horizon sphere it is reborn at
//! the outer edge at a fresh random angle, which keeps the disk density
//! steady. Color runs along a radial gradient from a hot inner color to a
//! dark outer one.
//!
//! The scene is a translucent glow shell, an opaque occluding sphere and the
//! particle cloud drawn additively, seen through a camera that drifts on a
//! slow ellipse.
//!
//! Integration uses a fixed step per tick rather than measured frame time,
//! so the disk turns faster on faster displays.

pub mod camera;
pub mod cloud;

use backdrop_core::color::{linear_to_srgb, srgb_to_linear, LinearRgb, Srgb};
use backdrop_core::error::EffectError;
use backdrop_core::glam::{DVec2, DVec3};
use backdrop_core::params::{check_range, param_color, param_f64, param_usize};
use backdrop_core::prng::Xorshift64;
use backdrop_core::seed::validate_dimensions;
use backdrop_core::surface::{BlendMode, Surface};
use backdrop_core::Effect;
use serde_json::{json, Value};

pub use camera::Camera;
pub use cloud::PointCloud;

const DEFAULT_PARTICLE_COUNT: usize = 5000;
const MAX_PARTICLE_COUNT: usize = 100_000;
const DEFAULT_SPAWN_RADIUS_MIN: f64 = 1.5;
const DEFAULT_SPAWN_RADIUS_SPAN: f64 = 4.0;
const DEFAULT_RESET_RADIUS: f64 = 5.5;
/// Radius of the occluding sphere; particles inside it are recycled.
const DEFAULT_HORIZON_RADIUS: f64 = 1.2;
const DEFAULT_GLOW_RADIUS: f64 = 1.3;
const DEFAULT_SPEED_MIN: f64 = 0.02;
const DEFAULT_SPEED_MAX: f64 = 0.07;
const DEFAULT_Y_JITTER: f64 = 0.1;
const DEFAULT_ANGULAR_STEP: f64 = 0.01;
const DEFAULT_RADIAL_STEP: f64 = 0.003;
const DEFAULT_SPEED_FALLOFF: f64 = 0.5;
/// World-space point diameter before perspective attenuation.
const DEFAULT_POINT_SIZE: f64 = 0.02;
const DEFAULT_POINT_OPACITY: f64 = 0.8;
const DEFAULT_GLOW_OPACITY: f64 = 0.15;
const DEFAULT_INNER_COLOR: &str = "#ff5500";
const DEFAULT_OUTER_COLOR: &str = "#000000";
const DEFAULT_GLOW_COLOR: &str = "#ffaa00";
const DEFAULT_HORIZON_COLOR: &str = "#000000";

/// Tunable constants of the disk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskParams {
    pub particle_count: usize,
    /// Smallest spawn radius; also where the color gradient starts.
    pub spawn_radius_min: f64,
    /// Spawn radii cover `[min, min + span)`; the gradient spans the same width.
    pub spawn_radius_span: f64,
    /// Radius a recycled particle restarts at.
    pub reset_radius: f64,
    pub horizon_radius: f64,
    pub glow_radius: f64,
    pub speed_min: f64,
    pub speed_max: f64,
    /// Heights are drawn from `[-y_jitter, y_jitter)`.
    pub y_jitter: f64,
    pub angular_step: f64,
    pub radial_step: f64,
    /// Extra speed per unit of radius below `reset_radius`.
    pub speed_falloff: f64,
    pub point_size: f64,
    pub point_opacity: f64,
    pub glow_opacity: f64,
    pub inner_color: Srgb,
    pub outer_color: Srgb,
    pub glow_color: Srgb,
    pub horizon_color: Srgb,
}

impl Default for DiskParams {
    fn default() -> Self {
        Self {
            particle_count: DEFAULT_PARTICLE_COUNT,
            spawn_radius_min: DEFAULT_SPAWN_RADIUS_MIN,
            spawn_radius_span: DEFAULT_SPAWN_RADIUS_SPAN,
            reset_radius: DEFAULT_RESET_RADIUS,
            horizon_radius: DEFAULT_HORIZON_RADIUS,
            glow_radius: DEFAULT_GLOW_RADIUS,
            speed_min: DEFAULT_SPEED_MIN,
            speed_max: DEFAULT_SPEED_MAX,
            y_jitter: DEFAULT_Y_JITTER,
            angular_step: DEFAULT_ANGULAR_STEP,
            radial_step: DEFAULT_RADIAL_STEP,
            speed_falloff: DEFAULT_SPEED_FALLOFF,
            point_size: DEFAULT_POINT_SIZE,
            point_opacity: DEFAULT_POINT_OPACITY,
            glow_opacity: DEFAULT_GLOW_OPACITY,
            inner_color: Srgb::from_rgb8(0xff, 0x55, 0x00),
            outer_color: Srgb::BLACK,
            glow_color: Srgb::from_rgb8(0xff, 0xaa, 0x00),
            horizon_color: Srgb::BLACK,
        }
    }
}

impl DiskParams {
    /// Reads overrides from a JSON object, falling back to defaults.
    ///
    /// Fails on unparseable colors, values outside their schema bounds and
    /// inconsistent ranges.
    pub fn from_json(params: &Value) -> Result<Self, EffectError> {
        let p = Self {
            particle_count: param_usize(params, "particle_count", DEFAULT_PARTICLE_COUNT),
            spawn_radius_min: param_f64(params, "spawn_radius_min", DEFAULT_SPAWN_RADIUS_MIN),
            spawn_radius_span: param_f64(params, "spawn_radius_span", DEFAULT_SPAWN_RADIUS_SPAN),
            reset_radius: param_f64(params, "reset_radius", DEFAULT_RESET_RADIUS),
            horizon_radius: param_f64(params, "horizon_radius", DEFAULT_HORIZON_RADIUS),
            glow_radius: param_f64(params, "glow_radius", DEFAULT_GLOW_RADIUS),
            speed_min: param_f64(params, "speed_min", DEFAULT_SPEED_MIN),
            speed_max: param_f64(params, "speed_max", DEFAULT_SPEED_MAX),
            y_jitter: param_f64(params, "y_jitter", DEFAULT_Y_JITTER),
            angular_step: param_f64(params, "angular_step", DEFAULT_ANGULAR_STEP),
            radial_step: param_f64(params, "radial_step", DEFAULT_RADIAL_STEP),
            speed_falloff: param_f64(params, "speed_falloff", DEFAULT_SPEED_FALLOFF),
            point_size: param_f64(params, "point_size", DEFAULT_POINT_SIZE),
            point_opacity: param_f64(params, "point_opacity", DEFAULT_POINT_OPACITY),
            glow_opacity: param_f64(params, "glow_opacity", DEFAULT_GLOW_OPACITY),
            inner_color: param_color(params, "inner_color", DEFAULT_INNER_COLOR)?,
            outer_color: param_color(params, "outer_color", DEFAULT_OUTER_COLOR)?,
            glow_color: param_color(params, "glow_color", DEFAULT_GLOW_COLOR)?,
            horizon_color: param_color(params, "horizon_color", DEFAULT_HORIZON_COLOR)?,
        };
        p.validate()?;
        Ok(p)
    }

    /// Checks every value against its schema bounds, then the relations the
    /// update loop depends on.
    pub fn validate(&self) -> Result<(), EffectError> {
        let out_of_range = |name: &str, reason: &str| {
            Err(EffectError::ParamOutOfRange {
                name: name.to_owned(),
                reason: reason.to_owned(),
            })
        };
        if self.particle_count > MAX_PARTICLE_COUNT {
            return out_of_range(
                "particle_count",
                &format!("must be at most {MAX_PARTICLE_COUNT}, got {}", self.particle_count),
            );
        }
        for (name, value, min, max) in [
            ("spawn_radius_min", self.spawn_radius_min, 0.0, 10.0),
            ("spawn_radius_span", self.spawn_radius_span, 0.0, 10.0),
            ("reset_radius", self.reset_radius, 0.0, 20.0),
            ("horizon_radius", self.horizon_radius, 0.0, 10.0),
            ("glow_radius", self.glow_radius, 0.0, 10.0),
            ("speed_min", self.speed_min, 0.0, 1.0),
            ("speed_max", self.speed_max, 0.0, 1.0),
            ("y_jitter", self.y_jitter, 0.0, 1.0),
            ("angular_step", self.angular_step, 0.0, 1.0),
            ("radial_step", self.radial_step, 0.0, 0.1),
            ("speed_falloff", self.speed_falloff, 0.0, 5.0),
            ("point_size", self.point_size, 0.0, 1.0),
            ("point_opacity", self.point_opacity, 0.0, 1.0),
            ("glow_opacity", self.glow_opacity, 0.0, 1.0),
        ] {
            check_range(name, value, min, max)?;
        }
        if !(self.horizon_radius > 0.0) {
            return out_of_range("horizon_radius", "must be positive");
        }
        if !(self.reset_radius > self.horizon_radius) {
            return out_of_range("reset_radius", "must exceed horizon_radius");
        }
        if !(self.spawn_radius_span > 0.0) {
            return out_of_range("spawn_radius_span", "must be positive");
        }
        // Keeps the speed multiplier at or above one for every live particle.
        if self.spawn_radius_min + self.spawn_radius_span > self.reset_radius {
            return out_of_range(
                "spawn_radius_span",
                "spawn_radius_min + spawn_radius_span must not exceed reset_radius",
            );
        }
        if self.speed_max < self.speed_min {
            return out_of_range("speed_max", "must be at least speed_min");
        }
        Ok(())
    }
}

/// Orbit state of one disk particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskParticle {
    /// Polar angle in radians; grows without wrapping.
    pub angle: f64,
    pub radius: f64,
    /// Radius at spawn. Kept for inspection, never read by the update.
    pub initial_radius: f64,
    /// Base angular speed, fixed for the particle's lifetime.
    pub speed: f64,
    /// Height above the disk plane, fixed for the particle's lifetime.
    pub y_offset: f64,
}

/// Linear-RGB gradient over radius, unclamped at both ends.
#[derive(Debug, Clone, Copy)]
struct RadialGradient {
    inner: LinearRgb,
    outer: LinearRgb,
    start: f64,
    span: f64,
}

impl RadialGradient {
    fn new(params: &DiskParams) -> Self {
        Self {
            inner: srgb_to_linear(params.inner_color),
            outer: srgb_to_linear(params.outer_color),
            start: params.spawn_radius_min,
            span: params.spawn_radius_span,
        }
    }

    fn at(&self, radius: f64) -> LinearRgb {
        self.inner.lerp(self.outer, gradient_position(radius, self.start, self.span))
    }
}

/// Normalized gradient coordinate for `radius`. Not clamped.
pub fn gradient_position(radius: f64, start: f64, span: f64) -> f64 {
    (radius - start) / span
}

/// Accretion disk effect.
pub struct DiskField {
    params: DiskParams,
    particles: Vec<DiskParticle>,
    cloud: PointCloud,
    gradient: RadialGradient,
    camera: Camera,
    rng: Xorshift64,
    width: usize,
    height: usize,
    recycled: u64,
}

impl DiskField {
    /// Spawns every particle and builds the initial buffers.
    ///
    /// Returns `EffectError::InvalidDimensions` for a zero-sized viewport.
    pub fn new(
        width: usize,
        height: usize,
        seed: u64,
        params: DiskParams,
    ) -> Result<Self, EffectError> {
        validate_dimensions(width, height)?;
        params.validate()?;
        let mut rng = Xorshift64::new(seed);
        let gradient = RadialGradient::new(&params);
        let mut cloud = PointCloud::new(params.particle_count);
        let particles: Vec<DiskParticle> = (0..params.particle_count)
            .map(|i| {
                let angle = rng.next_angle();
                let radius = rng.next_range(
                    params.spawn_radius_min,
                    params.spawn_radius_min + params.spawn_radius_span,
                );
                let speed = rng.next_range(params.speed_min, params.speed_max);
                let y_offset = rng.next_signed(params.y_jitter);
                let particle = DiskParticle {
                    angle,
                    radius,
                    initial_radius: radius,
                    speed,
                    y_offset,
                };
                let (x, z) = orbit_xz(angle, radius);
                cloud.set_position(i, [x, y_offset as f32, z]);
                cloud.set_color(i, gradient.at(radius).to_f32_array());
                particle
            })
            .collect();
        tracing::debug!(
            particles = particles.len(),
            width,
            height,
            seed,
            "disk field created"
        );
        Ok(Self {
            params,
            particles,
            cloud,
            gradient,
            camera: Camera::new(width as f64 / height as f64),
            rng,
            width,
            height,
            recycled: 0,
        })
    }

    /// Builds a disk from a JSON params object.
    pub fn from_json(
        width: usize,
        height: usize,
        seed: u64,
        json_params: &Value,
    ) -> Result<Self, EffectError> {
        Self::new(width, height, seed, DiskParams::from_json(json_params)?)
    }

    pub fn particles(&self) -> &[DiskParticle] {
        &self.particles
    }

    pub fn point_cloud(&self) -> &PointCloud {
        &self.cloud
    }

    /// Clears the buffer dirty flags after a renderer consumed them.
    pub fn mark_uploaded(&mut self) {
        self.cloud.mark_uploaded();
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn disk_params(&self) -> &DiskParams {
        &self.params
    }

    /// Total recycles since creation.
    pub fn recycled(&self) -> u64 {
        self.recycled
    }

    /// Color the gradient assigns to `radius`, in linear RGB.
    pub fn color_at(&self, radius: f64) -> LinearRgb {
        self.gradient.at(radius)
    }

    fn step_particles(&mut self) -> u64 {
        let p = &self.params;
        let mut recycled = 0;
        for (i, particle) in self.particles.iter_mut().enumerate() {
            let multiplier = 1.0 + (p.reset_radius - particle.radius) * p.speed_falloff;
            particle.angle += particle.speed * multiplier * p.angular_step;
            particle.radius -= p.radial_step * multiplier;

            if particle.radius < p.horizon_radius {
                particle.radius = p.reset_radius;
                particle.angle = self.rng.next_angle();
                recycled += 1;
            }

            let (x, z) = orbit_xz(particle.angle, particle.radius);
            self.cloud.set_orbit_position(i, x, z);
            self.cloud
                .set_color(i, self.gradient.at(particle.radius).to_f32_array());
        }
        self.cloud.mark_dirty();
        recycled
    }
}

impl Effect for DiskField {
    fn update(&mut self, elapsed_secs: f64) {
        let recycled = self.step_particles();
        self.recycled += recycled;
        self.camera.drift(elapsed_secs);
        tracing::trace!(recycled, elapsed_secs, "disk tick");
    }

    fn draw(&self, surface: &mut dyn Surface) {
        let (w, h) = (surface.width(), surface.height());
        surface.clear();

        if let Some(center) = self.camera.project(DVec3::ZERO, w, h) {
            let p = &self.params;
            surface.set_blend_mode(BlendMode::Normal);
            let glow = self
                .camera
                .sphere_screen_radius(DVec3::ZERO, p.glow_radius, h);
            surface.fill_circle(center.screen, glow, p.glow_color.with_alpha(p.glow_opacity));
            let horizon = self
                .camera
                .sphere_screen_radius(DVec3::ZERO, p.horizon_radius, h);
            surface.fill_circle(center.screen, horizon, p.horizon_color.with_alpha(1.0));
        }

        surface.set_blend_mode(BlendMode::Additive);
        let half_height = h as f64 * 0.5;
        for (position, color) in self.cloud.positions().iter().zip(self.cloud.colors()) {
            let world = DVec3::new(position[0] as f64, position[1] as f64, position[2] as f64);
            if self
                .camera
                .occluded_by_sphere(world, self.params.horizon_radius)
            {
                continue;
            }
            let Some(projected) = self.camera.project(world, w, h) else {
                continue;
            };
            let diameter = self.params.point_size * half_height / projected.depth;
            let srgb = linear_to_srgb(LinearRgb::from_f32_array(*color));
            surface.fill_circle(
                projected.screen,
                diameter * 0.5,
                srgb.with_alpha(self.params.point_opacity),
            );
        }
    }

    fn resize(&mut self, width: usize, height: usize) -> Result<(), EffectError> {
        validate_dimensions(width, height)?;
        self.width = width;
        self.height = height;
        self.camera.set_aspect(width as f64 / height as f64);
        tracing::debug!(width, height, "disk field resized");
        Ok(())
    }

    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn params(&self) -> Value {
        let p = &self.params;
        json!({
            "particle_count": p.particle_count,
            "spawn_radius_min": p.spawn_radius_min,
            "spawn_radius_span": p.spawn_radius_span,
            "reset_radius": p.reset_radius,
            "horizon_radius": p.horizon_radius,
            "glow_radius": p.glow_radius,
            "speed_min": p.speed_min,
            "speed_max": p.speed_max,
            "y_jitter": p.y_jitter,
            "angular_step": p.angular_step,
            "radial_step": p.radial_step,
            "speed_falloff": p.speed_falloff,
            "point_size": p.point_size,
            "point_opacity": p.point_opacity,
            "glow_opacity": p.glow_opacity,
            "inner_color": p.inner_color.to_hex(),
            "outer_color": p.outer_color.to_hex(),
            "glow_color": p.glow_color.to_hex(),
            "horizon_color": p.horizon_color.to_hex(),
        })
    }

    fn param_schema(&self) -> Value {
        json!({
            "particle_count": {
                "type": "integer",
                "default": DEFAULT_PARTICLE_COUNT,
                "min": 0,
                "max": MAX_PARTICLE_COUNT,
                "description": "Number of orbiting particles"
            },
            "spawn_radius_min": {
                "type": "number",
                "default": DEFAULT_SPAWN_RADIUS_MIN,
                "min": 0.0,
                "max": 10.0,
                "description": "Inner spawn radius and start of the color gradient"
            },
            "spawn_radius_span": {
                "type": "number",
                "default": DEFAULT_SPAWN_RADIUS_SPAN,
                "min": 0.0,
                "max": 10.0,
                "description": "Width of the spawn band and of the color gradient"
            },
            "reset_radius": {
                "type": "number",
                "default": DEFAULT_RESET_RADIUS,
                "min": 0.0,
                "max": 20.0,
                "description": "Radius at which recycled particles re-enter"
            },
            "horizon_radius": {
                "type": "number",
                "default": DEFAULT_HORIZON_RADIUS,
                "min": 0.0,
                "max": 10.0,
                "description": "Radius of the occluding sphere; particles inside are recycled"
            },
            "glow_radius": {
                "type": "number",
                "default": DEFAULT_GLOW_RADIUS,
                "min": 0.0,
                "max": 10.0,
                "description": "Radius of the translucent glow shell"
            },
            "speed_min": {
                "type": "number",
                "default": DEFAULT_SPEED_MIN,
                "min": 0.0,
                "max": 1.0,
                "description": "Lower bound of per-particle angular speed"
            },
            "speed_max": {
                "type": "number",
                "default": DEFAULT_SPEED_MAX,
                "min": 0.0,
                "max": 1.0,
                "description": "Upper bound (exclusive) of per-particle angular speed"
            },
            "y_jitter": {
                "type": "number",
                "default": DEFAULT_Y_JITTER,
                "min": 0.0,
                "max": 1.0,
                "description": "Half-height of the disk"
            },
            "angular_step": {
                "type": "number",
                "default": DEFAULT_ANGULAR_STEP,
                "min": 0.0,
                "max": 1.0,
                "description": "Angle advance per tick, scaled by speed and multiplier"
            },
            "radial_step": {
                "type": "number",
                "default": DEFAULT_RADIAL_STEP,
                "min": 0.0,
                "max": 0.1,
                "description": "Inward drift per tick, scaled by multiplier"
            },
            "speed_falloff": {
                "type": "number",
                "default": DEFAULT_SPEED_FALLOFF,
                "min": 0.0,
                "max": 5.0,
                "description": "Speed-up per unit of radius below reset_radius"
            },
            "point_size": {
                "type": "number",
                "default": DEFAULT_POINT_SIZE,
                "min": 0.0,
                "max": 1.0,
                "description": "World-space point diameter before perspective"
            },
            "point_opacity": {
                "type": "number",
                "default": DEFAULT_POINT_OPACITY,
                "min": 0.0,
                "max": 1.0,
                "description": "Opacity of each particle"
            },
            "glow_opacity": {
                "type": "number",
                "default": DEFAULT_GLOW_OPACITY,
                "min": 0.0,
                "max": 1.0,
                "description": "Opacity of the glow shell"
            },
            "inner_color": {
                "type": "color",
                "default": DEFAULT_INNER_COLOR,
                "description": "Gradient color at spawn_radius_min"
            },
            "outer_color": {
                "type": "color",
                "default": DEFAULT_OUTER_COLOR,
                "description": "Gradient color at spawn_radius_min + spawn_radius_span"
            },
            "glow_color": {
                "type": "color",
                "default": DEFAULT_GLOW_COLOR,
                "description": "Color of the glow shell"
            },
            "horizon_color": {
                "type": "color",
                "default": DEFAULT_HORIZON_COLOR,
                "description": "Color of the occluding sphere"
            }
        })
    }
}

fn orbit_xz(angle: f64, radius: f64) -> (f32, f32) {
    let v = DVec2::from_angle(angle) * radius;
    (v.x as f32, v.y as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop_core::raster::Raster;
    use backdrop_core::surface::DisplayList;
    use std::f64::consts::TAU;

    fn small_params() -> DiskParams {
        DiskParams {
            particle_count: 500,
            ..DiskParams::default()
        }
    }

    fn disk(seed: u64) -> DiskField {
        DiskField::new(800, 600, seed, small_params()).unwrap()
    }

    fn approx(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    // ---- Construction ----

    #[test]
    fn default_params_match_reference_disk() {
        let p = DiskParams::default();
        assert_eq!(p.particle_count, 5000);
        assert_eq!(p.inner_color.to_hex(), "#ff5500");
        assert_eq!(p.outer_color.to_hex(), "#000000");
        assert_eq!(p.glow_color.to_hex(), "#ffaa00");
    }

    #[test]
    fn new_rejects_zero_dimensions() {
        assert!(DiskField::new(0, 600, 1, small_params()).is_err());
        assert!(DiskField::new(800, 0, 1, small_params()).is_err());
    }

    #[test]
    fn spawn_samples_stay_in_their_ranges() {
        let d = disk(42);
        assert_eq!(d.particles().len(), 500);
        for p in d.particles() {
            assert!((0.0..TAU).contains(&p.angle), "angle {}", p.angle);
            assert!((1.5..5.5).contains(&p.radius), "radius {}", p.radius);
            assert!((0.02..0.07).contains(&p.speed), "speed {}", p.speed);
            assert!((-0.1..0.1).contains(&p.y_offset), "y {}", p.y_offset);
            assert_eq!(p.initial_radius, p.radius);
        }
    }

    #[test]
    fn initial_positions_follow_polar_coordinates() {
        let d = disk(3);
        for (p, pos) in d.particles().iter().zip(d.point_cloud().positions()) {
            assert!(approx(pos[0] as f64, p.angle.cos() * p.radius, 1e-5));
            assert!(approx(pos[1] as f64, p.y_offset, 1e-6));
            assert!(approx(pos[2] as f64, p.angle.sin() * p.radius, 1e-5));
        }
    }

    #[test]
    fn from_json_reads_overrides() {
        let d = DiskField::from_json(
            100,
            100,
            1,
            &json!({"particle_count": 10, "inner_color": "#00ff00", "radial_step": 0.01}),
        )
        .unwrap();
        assert_eq!(d.particles().len(), 10);
        assert_eq!(d.disk_params().inner_color.to_hex(), "#00ff00");
        assert!(approx(d.disk_params().radial_step, 0.01, 1e-15));
    }

    #[test]
    fn from_json_rejects_bad_color() {
        let err = DiskField::from_json(100, 100, 1, &json!({"glow_color": "orange"}));
        assert!(matches!(err, Err(EffectError::InvalidColor(_))));
    }

    #[test]
    fn from_json_rejects_inverted_radii() {
        let err = DiskField::from_json(
            100,
            100,
            1,
            &json!({"horizon_radius": 6.0, "reset_radius": 5.5}),
        );
        assert!(matches!(err, Err(EffectError::ParamOutOfRange { .. })));
    }

    fn rejected_field(overrides: Value) -> String {
        match DiskField::from_json(100, 100, 1, &overrides) {
            Err(EffectError::ParamOutOfRange { name, .. }) => name,
            Err(other) => panic!("{overrides}: unexpected error {other}"),
            Ok(_) => panic!("{overrides}: accepted"),
        }
    }

    #[test]
    fn from_json_rejects_negative_radial_step() {
        assert_eq!(rejected_field(json!({"radial_step": -0.01})), "radial_step");
    }

    #[test]
    fn from_json_rejects_negative_speed_falloff() {
        assert_eq!(rejected_field(json!({"speed_falloff": -0.5})), "speed_falloff");
    }

    #[test]
    fn from_json_rejects_negative_angular_step() {
        assert_eq!(rejected_field(json!({"angular_step": -0.1})), "angular_step");
    }

    #[test]
    fn from_json_rejects_too_many_particles() {
        assert_eq!(
            rejected_field(json!({"particle_count": 100_001})),
            "particle_count"
        );
        let d = DiskField::from_json(10, 10, 1, &json!({"particle_count": 100_000})).unwrap();
        assert_eq!(d.particles().len(), 100_000);
    }

    #[test]
    fn from_json_rejects_spawn_band_beyond_reset() {
        assert_eq!(
            rejected_field(json!({"spawn_radius_span": 4.5})),
            "spawn_radius_span"
        );
    }

    #[test]
    fn every_schema_bound_is_enforced() {
        let schema = disk(1).param_schema();
        for (key, entry) in schema.as_object().unwrap() {
            let (Some(min), Some(max)) = (entry["min"].as_f64(), entry["max"].as_f64()) else {
                continue;
            };
            if entry["type"] == "integer" {
                let above = entry["max"].as_u64().unwrap() + 1;
                assert_eq!(rejected_field(json!({ key.as_str(): above })), *key);
                continue;
            }
            assert_eq!(rejected_field(json!({ key.as_str(): max + 1.0 })), *key);
            assert_eq!(rejected_field(json!({ key.as_str(): min - 1.0 })), *key);
        }
    }

    // ---- Update ----

    #[test]
    fn one_tick_advances_angle_and_shrinks_radius() {
        let mut d = disk(5);
        let before = d.particles().to_vec();
        d.update(0.0);
        for (b, a) in before.iter().zip(d.particles()) {
            if a.radius == 5.5 {
                continue;
            }
            let multiplier = 1.0 + (5.5 - b.radius) * 0.5;
            assert!(approx(a.angle, b.angle + b.speed * multiplier * 0.01, 1e-12));
            assert!(approx(a.radius, b.radius - 0.003 * multiplier, 1e-12));
        }
    }

    #[test]
    fn particle_below_horizon_is_recycled() {
        let mut d = disk(8);
        d.particles[0].radius = 1.19;
        let speed = d.particles[0].speed;
        let y = d.particles[0].y_offset;
        d.update(0.0);
        let p = d.particles()[0];
        assert_eq!(p.radius, 5.5);
        assert!((0.0..TAU).contains(&p.angle));
        assert_eq!(p.speed, speed);
        assert_eq!(p.y_offset, y);
        assert!(d.recycled() >= 1);
    }

    #[test]
    fn particle_just_outside_horizon_step_is_kept() {
        let mut d = disk(8);
        d.particles[0].radius = 2.0;
        d.update(0.0);
        assert!(d.particles()[0].radius < 2.0);
        assert!(d.particles()[0].radius > 1.2);
    }

    #[test]
    fn height_never_changes() {
        let mut d = disk(11);
        let heights: Vec<f32> = d.point_cloud().positions().iter().map(|p| p[1]).collect();
        for i in 0..300 {
            d.update(i as f64 / 60.0);
        }
        for (h, p) in heights.iter().zip(d.point_cloud().positions()) {
            assert_eq!(*h, p[1]);
        }
    }

    #[test]
    fn update_marks_buffers_dirty() {
        let mut d = disk(1);
        d.mark_uploaded();
        assert!(!d.point_cloud().positions_dirty());
        d.update(0.0);
        assert!(d.point_cloud().positions_dirty());
        assert!(d.point_cloud().colors_dirty());
    }

    #[test]
    fn update_drifts_camera() {
        let mut d = disk(1);
        d.update(20.0);
        let cam = d.camera().position();
        assert!(approx(cam.x, 2.0_f64.sin() * 0.5, 1e-12));
        assert!(approx(cam.y, 1.0 + 2.0_f64.cos() * 0.2, 1e-12));
    }

    #[test]
    fn same_seed_same_disk_after_many_ticks() {
        let mut a = disk(77);
        let mut b = disk(77);
        for i in 0..200 {
            a.update(i as f64 / 60.0);
            b.update(i as f64 / 60.0);
        }
        assert_eq!(a.particles(), b.particles());
    }

    // ---- Color ----

    #[test]
    fn color_at_inner_radius_is_inner_color() {
        let d = disk(1);
        let c = linear_to_srgb(d.color_at(1.5));
        assert_eq!(c.to_hex(), "#ff5500");
    }

    #[test]
    fn color_darkens_toward_outer_radius() {
        let d = disk(1);
        let radii = [1.5, 2.5, 3.5, 4.5, 5.5];
        let reds: Vec<f64> = radii.iter().map(|&r| d.color_at(r).r).collect();
        for pair in reds.windows(2) {
            assert!(pair[1] < pair[0], "gradient not monotonic: {reds:?}");
        }
        assert!(d.color_at(5.5).r.abs() < 1e-12);
    }

    #[test]
    fn gradient_position_is_unclamped() {
        assert!(approx(gradient_position(1.5, 1.5, 4.0), 0.0, 1e-15));
        assert!(approx(gradient_position(5.5, 1.5, 4.0), 1.0, 1e-15));
        assert!(gradient_position(1.2, 1.5, 4.0) < 0.0);
        // Below the gradient start the inner color is extrapolated past itself.
        let d = disk(1);
        assert!(d.color_at(1.2).g > d.color_at(1.5).g);
    }

    #[test]
    fn cloud_colors_track_radius_after_update() {
        let mut d = disk(4);
        d.update(0.0);
        for (p, c) in d.particles().iter().zip(d.point_cloud().colors()) {
            let expected = d.color_at(p.radius).to_f32_array();
            assert_eq!(*c, expected);
        }
    }

    // ---- Resize and draw ----

    #[test]
    fn resize_updates_aspect_and_keeps_particles() {
        let mut d = disk(9);
        let before = d.particles().to_vec();
        d.resize(1920, 1080).unwrap();
        assert_eq!(d.size(), (1920, 1080));
        assert!(approx(d.camera().aspect(), 1920.0 / 1080.0, 1e-12));
        assert_eq!(d.particles(), before.as_slice());
    }

    #[test]
    fn resize_rejects_zero() {
        let mut d = disk(9);
        assert!(d.resize(0, 10).is_err());
        assert_eq!(d.size(), (800, 600));
    }

    #[test]
    fn draw_emits_glow_horizon_then_points() {
        let d = disk(2);
        let mut list = DisplayList::new(800, 600);
        d.draw(&mut list);
        let circles: Vec<_> = list.circles().collect();
        assert!(circles.len() > 2);
        let (glow_center, glow_r, glow_color) = circles[0];
        let (_, horizon_r, horizon_color) = circles[1];
        assert!(glow_r > horizon_r);
        assert!(approx(glow_color.alpha, 0.15, 1e-12));
        assert!(approx(horizon_color.alpha, 1.0, 1e-12));
        assert!(approx(glow_center.x, 400.0, 1e-6));
        // Some particles sit behind the sphere and are not drawn.
        assert!(circles.len() - 2 < 500);
    }

    #[test]
    fn draw_onto_raster_lights_pixels() {
        let d = DiskField::new(160, 120, 2, small_params()).unwrap();
        let mut raster = Raster::new(160, 120).unwrap();
        d.draw(&mut raster);
        assert!(raster.covered_pixels() > 0);
    }

    #[test]
    fn params_round_trip_through_json() {
        let d = disk(1);
        let again = DiskParams::from_json(&d.params()).unwrap();
        assert_eq!(again, *d.disk_params());
    }

    #[test]
    fn schema_lists_every_param() {
        let d = disk(1);
        let params = d.params();
        let schema = d.param_schema();
        for key in params.as_object().unwrap().keys() {
            let entry = &schema[key];
            assert!(entry.get("type").is_some(), "{key} missing type");
            assert!(entry.get("default").is_some(), "{key} missing default");
            assert!(entry.get("description").is_some(), "{key} missing description");
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn radius_stays_within_recycle_bounds(seed: u64, ticks in 1_usize..400) {
                let params = DiskParams { particle_count: 64, ..DiskParams::default() };
                let mut d = DiskField::new(64, 64, seed, params).unwrap();
                for i in 0..ticks {
                    d.update(i as f64 / 60.0);
                    for p in d.particles() {
                        prop_assert!(
                            (1.2..=5.5).contains(&p.radius),
                            "radius {} escaped after tick {i}", p.radius
                        );
                    }
                }
            }

            #[test]
            fn heights_are_fixed(seed: u64, ticks in 1_usize..200) {
                let params = DiskParams { particle_count: 32, ..DiskParams::default() };
                let mut d = DiskField::new(64, 64, seed, params).unwrap();
                let before: Vec<f64> = d.particles().iter().map(|p| p.y_offset).collect();
                for i in 0..ticks {
                    d.update(i as f64);
                }
                for (y, p) in before.iter().zip(d.particles()) {
                    prop_assert_eq!(*y, p.y_offset);
                }
            }
        }
    }
}
