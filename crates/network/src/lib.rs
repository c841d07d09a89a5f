#![deny(unsafe_code)]
//! Particle network: drifting points joined by faint lines, pulled toward
//! the pointer.
//!
//! Particle count scales with surface area. Each tick a particle within
//! reach of the pointer gets a small impulse toward it, then moves, loses a
//! little speed to friction and bounces softly off the surface edges. Nearby
//! particles are joined by lines that fade with distance, and particles near
//! the pointer are joined to it the same way. A resize throws the whole
//! collection away and spawns a fresh one.

pub mod pointer;

use backdrop_core::color::Srgb;
use backdrop_core::error::EffectError;
use backdrop_core::glam::DVec2;
use backdrop_core::params::{check_range, param_color, param_f64};
use backdrop_core::prng::Xorshift64;
use backdrop_core::seed::validate_dimensions;
use backdrop_core::surface::{BlendMode, Surface};
use backdrop_core::Effect;
use serde_json::{json, Value};

pub use pointer::{Pointer, PointerCell};

/// Surface pixels per particle.
const DEFAULT_DENSITY: f64 = 15000.0;
const DEFAULT_MAX_SPEED: f64 = 0.25;
const DEFAULT_SIZE_MIN: f64 = 1.0;
const DEFAULT_SIZE_MAX: f64 = 3.0;
const DEFAULT_OPACITY_MIN: f64 = 0.2;
const DEFAULT_OPACITY_MAX: f64 = 0.7;
const DEFAULT_ATTRACTION_RADIUS: f64 = 200.0;
const DEFAULT_ATTRACTION_STRENGTH: f64 = 0.01;
const DEFAULT_FRICTION: f64 = 0.99;
/// Fraction of speed kept, reversed, after hitting an edge.
const DEFAULT_RESTITUTION: f64 = 0.5;
const DEFAULT_LINK_DISTANCE: f64 = 100.0;
const DEFAULT_LINK_OPACITY: f64 = 0.3;
const DEFAULT_LINK_WIDTH: f64 = 0.5;
const DEFAULT_POINTER_LINK_DISTANCE: f64 = 150.0;
const DEFAULT_POINTER_LINK_OPACITY: f64 = 0.8;
const DEFAULT_POINTER_LINK_WIDTH: f64 = 1.0;
const DEFAULT_PARTICLE_COLOR: &str = "#00d4ff";
const DEFAULT_LINK_COLOR: &str = "#ffffff";
const DEFAULT_POINTER_LINK_COLOR: &str = "#00d4ff";

/// Tunable constants of the network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkParams {
    pub density: f64,
    /// Initial velocity components are drawn from `[-max_speed, max_speed)`.
    pub max_speed: f64,
    pub size_min: f64,
    pub size_max: f64,
    pub opacity_min: f64,
    pub opacity_max: f64,
    pub attraction_radius: f64,
    pub attraction_strength: f64,
    pub friction: f64,
    pub restitution: f64,
    pub link_distance: f64,
    pub link_opacity: f64,
    pub link_width: f64,
    pub pointer_link_distance: f64,
    pub pointer_link_opacity: f64,
    pub pointer_link_width: f64,
    pub particle_color: Srgb,
    pub link_color: Srgb,
    pub pointer_link_color: Srgb,
}

impl Default for NetworkParams {
    fn default() -> Self {
        let cyan = Srgb::from_rgb8(0x00, 0xd4, 0xff);
        Self {
            density: DEFAULT_DENSITY,
            max_speed: DEFAULT_MAX_SPEED,
            size_min: DEFAULT_SIZE_MIN,
            size_max: DEFAULT_SIZE_MAX,
            opacity_min: DEFAULT_OPACITY_MIN,
            opacity_max: DEFAULT_OPACITY_MAX,
            attraction_radius: DEFAULT_ATTRACTION_RADIUS,
            attraction_strength: DEFAULT_ATTRACTION_STRENGTH,
            friction: DEFAULT_FRICTION,
            restitution: DEFAULT_RESTITUTION,
            link_distance: DEFAULT_LINK_DISTANCE,
            link_opacity: DEFAULT_LINK_OPACITY,
            link_width: DEFAULT_LINK_WIDTH,
            pointer_link_distance: DEFAULT_POINTER_LINK_DISTANCE,
            pointer_link_opacity: DEFAULT_POINTER_LINK_OPACITY,
            pointer_link_width: DEFAULT_POINTER_LINK_WIDTH,
            particle_color: cyan,
            link_color: Srgb::WHITE,
            pointer_link_color: cyan,
        }
    }
}

impl NetworkParams {
    /// Reads overrides from a JSON object, falling back to defaults.
    pub fn from_json(params: &Value) -> Result<Self, EffectError> {
        let p = Self {
            density: param_f64(params, "density", DEFAULT_DENSITY),
            max_speed: param_f64(params, "max_speed", DEFAULT_MAX_SPEED),
            size_min: param_f64(params, "size_min", DEFAULT_SIZE_MIN),
            size_max: param_f64(params, "size_max", DEFAULT_SIZE_MAX),
            opacity_min: param_f64(params, "opacity_min", DEFAULT_OPACITY_MIN),
            opacity_max: param_f64(params, "opacity_max", DEFAULT_OPACITY_MAX),
            attraction_radius: param_f64(params, "attraction_radius", DEFAULT_ATTRACTION_RADIUS),
            attraction_strength: param_f64(
                params,
                "attraction_strength",
                DEFAULT_ATTRACTION_STRENGTH,
            ),
            friction: param_f64(params, "friction", DEFAULT_FRICTION),
            restitution: param_f64(params, "restitution", DEFAULT_RESTITUTION),
            link_distance: param_f64(params, "link_distance", DEFAULT_LINK_DISTANCE),
            link_opacity: param_f64(params, "link_opacity", DEFAULT_LINK_OPACITY),
            link_width: param_f64(params, "link_width", DEFAULT_LINK_WIDTH),
            pointer_link_distance: param_f64(
                params,
                "pointer_link_distance",
                DEFAULT_POINTER_LINK_DISTANCE,
            ),
            pointer_link_opacity: param_f64(
                params,
                "pointer_link_opacity",
                DEFAULT_POINTER_LINK_OPACITY,
            ),
            pointer_link_width: param_f64(
                params,
                "pointer_link_width",
                DEFAULT_POINTER_LINK_WIDTH,
            ),
            particle_color: param_color(params, "particle_color", DEFAULT_PARTICLE_COLOR)?,
            link_color: param_color(params, "link_color", DEFAULT_LINK_COLOR)?,
            pointer_link_color: param_color(
                params,
                "pointer_link_color",
                DEFAULT_POINTER_LINK_COLOR,
            )?,
        };
        p.validate()?;
        Ok(p)
    }

    /// Checks every value against its schema bounds, then the pairwise
    /// relations between them.
    pub fn validate(&self) -> Result<(), EffectError> {
        let out_of_range = |name: &str, reason: &str| {
            Err(EffectError::ParamOutOfRange {
                name: name.to_owned(),
                reason: reason.to_owned(),
            })
        };
        for (name, value, min, max) in [
            ("density", self.density, 1.0, 1_000_000.0),
            ("max_speed", self.max_speed, 0.0, 10.0),
            ("size_min", self.size_min, 0.0, 50.0),
            ("size_max", self.size_max, 0.0, 50.0),
            ("opacity_min", self.opacity_min, 0.0, 1.0),
            ("opacity_max", self.opacity_max, 0.0, 1.0),
            ("attraction_radius", self.attraction_radius, 0.0, 2000.0),
            ("attraction_strength", self.attraction_strength, 0.0, 1.0),
            ("friction", self.friction, 0.0, 1.0),
            ("restitution", self.restitution, 0.0, 1.0),
            ("link_distance", self.link_distance, 0.0, 1000.0),
            ("link_opacity", self.link_opacity, 0.0, 1.0),
            ("link_width", self.link_width, 0.0, 10.0),
            ("pointer_link_distance", self.pointer_link_distance, 0.0, 1000.0),
            ("pointer_link_opacity", self.pointer_link_opacity, 0.0, 1.0),
            ("pointer_link_width", self.pointer_link_width, 0.0, 10.0),
        ] {
            check_range(name, value, min, max)?;
        }
        if self.size_max < self.size_min {
            return out_of_range("size_max", "must be at least size_min");
        }
        if self.opacity_max < self.opacity_min {
            return out_of_range("opacity_max", "must be at least opacity_min");
        }
        if !(self.attraction_radius > 0.0) {
            return out_of_range("attraction_radius", "must be positive");
        }
        if !(self.link_distance > 0.0) {
            return out_of_range("link_distance", "must be positive");
        }
        if !(self.pointer_link_distance > 0.0) {
            return out_of_range("pointer_link_distance", "must be positive");
        }
        Ok(())
    }
}

/// One point of the network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkParticle {
    pub position: DVec2,
    pub velocity: DVec2,
    /// Circle radius in pixels.
    pub size: f64,
    pub opacity: f64,
}

/// Opacity of a link of length `distance`: `peak` at zero, fading linearly
/// to nothing at `max`. `None` from `max` on, so no line is drawn.
pub fn link_opacity(distance: f64, max: f64, peak: f64) -> Option<f64> {
    (distance < max).then(|| (max - distance) / max * peak)
}

/// Particle count for a surface: one per `density` pixels, rounded down.
pub fn particle_count(width: usize, height: usize, density: f64) -> usize {
    ((width as f64 * height as f64) / density).floor() as usize
}

/// Pointer-reactive particle network effect.
pub struct NetworkField {
    params: NetworkParams,
    particles: Vec<NetworkParticle>,
    pointer: PointerCell,
    rng: Xorshift64,
    width: usize,
    height: usize,
}

impl NetworkField {
    /// Spawns a population sized to the surface.
    pub fn new(
        width: usize,
        height: usize,
        seed: u64,
        params: NetworkParams,
    ) -> Result<Self, EffectError> {
        validate_dimensions(width, height)?;
        params.validate()?;
        let mut field = Self {
            params,
            particles: Vec::new(),
            pointer: PointerCell::new(),
            rng: Xorshift64::new(seed),
            width,
            height,
        };
        field.spawn();
        tracing::debug!(
            particles = field.particles.len(),
            width,
            height,
            seed,
            "network field created"
        );
        Ok(field)
    }

    pub fn from_json(
        width: usize,
        height: usize,
        seed: u64,
        json_params: &Value,
    ) -> Result<Self, EffectError> {
        Self::new(width, height, seed, NetworkParams::from_json(json_params)?)
    }

    pub fn particles(&self) -> &[NetworkParticle] {
        &self.particles
    }

    pub fn network_params(&self) -> &NetworkParams {
        &self.params
    }

    /// A handle for input handlers; moves through it are seen next tick.
    pub fn pointer_handle(&self) -> PointerCell {
        self.pointer.clone()
    }

    fn spawn(&mut self) {
        let count = particle_count(self.width, self.height, self.params.density);
        let (w, h) = (self.width as f64, self.height as f64);
        let p = self.params;
        let rng = &mut self.rng;
        self.particles = (0..count)
            .map(|_| NetworkParticle {
                position: DVec2::new(rng.next_range(0.0, w), rng.next_range(0.0, h)),
                velocity: DVec2::new(rng.next_signed(p.max_speed), rng.next_signed(p.max_speed)),
                size: rng.next_range(p.size_min, p.size_max),
                opacity: rng.next_range(p.opacity_min, p.opacity_max),
            })
            .collect();
    }
}

impl Effect for NetworkField {
    fn update(&mut self, _elapsed_secs: f64) {
        let p = self.params;
        let pointer = self.pointer.get().position();
        let (w, h) = (self.width as f64, self.height as f64);

        for particle in &mut self.particles {
            if let Some(target) = pointer {
                let delta = target - particle.position;
                let distance = delta.length();
                if distance < p.attraction_radius {
                    let force =
                        (p.attraction_radius - distance) / p.attraction_radius * p.attraction_strength;
                    let angle = delta.y.atan2(delta.x);
                    particle.velocity += DVec2::from_angle(angle) * force;
                }
            }

            particle.position += particle.velocity;
            particle.velocity *= p.friction;

            if particle.position.x < 0.0 || particle.position.x > w {
                particle.velocity.x *= -p.restitution;
                particle.position.x = particle.position.x.clamp(0.0, w);
            }
            if particle.position.y < 0.0 || particle.position.y > h {
                particle.velocity.y *= -p.restitution;
                particle.position.y = particle.position.y.clamp(0.0, h);
            }
        }
    }

    fn draw(&self, surface: &mut dyn Surface) {
        let p = &self.params;
        let pointer = self.pointer.get().position();
        surface.clear();
        surface.set_blend_mode(BlendMode::Normal);

        for (i, a) in self.particles.iter().enumerate() {
            if let Some(target) = pointer {
                let distance = a.position.distance(target);
                if let Some(opacity) =
                    link_opacity(distance, p.pointer_link_distance, p.pointer_link_opacity)
                {
                    surface.stroke_line(
                        a.position,
                        target,
                        p.pointer_link_width,
                        p.pointer_link_color.with_alpha(opacity),
                    );
                }
            }

            for b in &self.particles[i + 1..] {
                let distance = a.position.distance(b.position);
                if let Some(opacity) = link_opacity(distance, p.link_distance, p.link_opacity) {
                    surface.stroke_line(
                        a.position,
                        b.position,
                        p.link_width,
                        p.link_color.with_alpha(opacity),
                    );
                }
            }
        }

        for particle in &self.particles {
            surface.fill_circle(
                particle.position,
                particle.size,
                p.particle_color.with_alpha(particle.opacity),
            );
        }
    }

    fn resize(&mut self, width: usize, height: usize) -> Result<(), EffectError> {
        validate_dimensions(width, height)?;
        self.width = width;
        self.height = height;
        self.spawn();
        tracing::debug!(
            width,
            height,
            particles = self.particles.len(),
            "network field resized"
        );
        Ok(())
    }

    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn pointer_moved(&mut self, x: f64, y: f64) {
        self.pointer.move_to(x, y);
    }

    fn pointer_left(&mut self) {
        self.pointer.leave();
    }

    fn params(&self) -> Value {
        let p = &self.params;
        json!({
            "density": p.density,
            "max_speed": p.max_speed,
            "size_min": p.size_min,
            "size_max": p.size_max,
            "opacity_min": p.opacity_min,
            "opacity_max": p.opacity_max,
            "attraction_radius": p.attraction_radius,
            "attraction_strength": p.attraction_strength,
            "friction": p.friction,
            "restitution": p.restitution,
            "link_distance": p.link_distance,
            "link_opacity": p.link_opacity,
            "link_width": p.link_width,
            "pointer_link_distance": p.pointer_link_distance,
            "pointer_link_opacity": p.pointer_link_opacity,
            "pointer_link_width": p.pointer_link_width,
            "particle_color": p.particle_color.to_hex(),
            "link_color": p.link_color.to_hex(),
            "pointer_link_color": p.pointer_link_color.to_hex(),
        })
    }

    fn param_schema(&self) -> Value {
        json!({
            "density": {
                "type": "number",
                "default": DEFAULT_DENSITY,
                "min": 1.0,
                "max": 1000000.0,
                "description": "Surface pixels per particle"
            },
            "max_speed": {
                "type": "number",
                "default": DEFAULT_MAX_SPEED,
                "min": 0.0,
                "max": 10.0,
                "description": "Bound on each initial velocity component"
            },
            "size_min": {
                "type": "number",
                "default": DEFAULT_SIZE_MIN,
                "min": 0.0,
                "max": 50.0,
                "description": "Smallest particle radius in pixels"
            },
            "size_max": {
                "type": "number",
                "default": DEFAULT_SIZE_MAX,
                "min": 0.0,
                "max": 50.0,
                "description": "Largest particle radius in pixels (exclusive)"
            },
            "opacity_min": {
                "type": "number",
                "default": DEFAULT_OPACITY_MIN,
                "min": 0.0,
                "max": 1.0,
                "description": "Lowest particle opacity"
            },
            "opacity_max": {
                "type": "number",
                "default": DEFAULT_OPACITY_MAX,
                "min": 0.0,
                "max": 1.0,
                "description": "Highest particle opacity (exclusive)"
            },
            "attraction_radius": {
                "type": "number",
                "default": DEFAULT_ATTRACTION_RADIUS,
                "min": 0.0,
                "max": 2000.0,
                "description": "Pointer distance below which particles are pulled in"
            },
            "attraction_strength": {
                "type": "number",
                "default": DEFAULT_ATTRACTION_STRENGTH,
                "min": 0.0,
                "max": 1.0,
                "description": "Impulse per tick at zero distance from the pointer"
            },
            "friction": {
                "type": "number",
                "default": DEFAULT_FRICTION,
                "min": 0.0,
                "max": 1.0,
                "description": "Velocity multiplier applied every tick"
            },
            "restitution": {
                "type": "number",
                "default": DEFAULT_RESTITUTION,
                "min": 0.0,
                "max": 1.0,
                "description": "Speed kept after bouncing off an edge"
            },
            "link_distance": {
                "type": "number",
                "default": DEFAULT_LINK_DISTANCE,
                "min": 0.0,
                "max": 1000.0,
                "description": "Particles closer than this are joined by a line"
            },
            "link_opacity": {
                "type": "number",
                "default": DEFAULT_LINK_OPACITY,
                "min": 0.0,
                "max": 1.0,
                "description": "Opacity of a particle link at zero length"
            },
            "link_width": {
                "type": "number",
                "default": DEFAULT_LINK_WIDTH,
                "min": 0.0,
                "max": 10.0,
                "description": "Particle link width in pixels"
            },
            "pointer_link_distance": {
                "type": "number",
                "default": DEFAULT_POINTER_LINK_DISTANCE,
                "min": 0.0,
                "max": 1000.0,
                "description": "Particles closer than this to the pointer are joined to it"
            },
            "pointer_link_opacity": {
                "type": "number",
                "default": DEFAULT_POINTER_LINK_OPACITY,
                "min": 0.0,
                "max": 1.0,
                "description": "Opacity of a pointer link at zero length"
            },
            "pointer_link_width": {
                "type": "number",
                "default": DEFAULT_POINTER_LINK_WIDTH,
                "min": 0.0,
                "max": 10.0,
                "description": "Pointer link width in pixels"
            },
            "particle_color": {
                "type": "color",
                "default": DEFAULT_PARTICLE_COLOR,
                "description": "Fill color of particles"
            },
            "link_color": {
                "type": "color",
                "default": DEFAULT_LINK_COLOR,
                "description": "Color of particle-to-particle links"
            },
            "pointer_link_color": {
                "type": "color",
                "default": DEFAULT_POINTER_LINK_COLOR,
                "description": "Color of particle-to-pointer links"
            }
        })
    }
}
