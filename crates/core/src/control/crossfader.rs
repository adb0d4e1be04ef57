use std::f32::consts::PI;

use super::autopilot::{self, AutopilotTarget, EnergyState, REST_Z};
use crate::types::{ControlMode, HybridControlState, InputVector};

/// Orbit radius of the human-driven camera.
const HUMAN_ORBIT_RADIUS: f32 = 3.0;
/// Pitch range for full stick deflection.
const HUMAN_PITCH_RANGE: f32 = PI / 2.5;

/// Smoothed autopilot camera position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(0.0, 0.0, REST_Z)
    }
}

/// Human-derived control target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HumanTarget {
    pub cam_x: f32,
    pub cam_y: f32,
    pub cam_z: f32,
    pub scale: f32,
    pub intensity: f32,
    pub glitch: f32,
}

/// Spherical orbit from the left stick, zoom from the right stick,
/// intensity from the triggers (LT fades, RT blows out).
pub fn human_target(input: &InputVector) -> HumanTarget {
    let yaw = input.orbital_x * PI;
    let pitch = input.orbital_y * HUMAN_PITCH_RANGE;
    HumanTarget {
        cam_x: yaw.sin() * pitch.cos() * HUMAN_ORBIT_RADIUS,
        cam_y: pitch.sin() * HUMAN_ORBIT_RADIUS,
        cam_z: yaw.cos() * pitch.cos() * HUMAN_ORBIT_RADIUS + REST_Z,
        scale: input.zoom * 2.0,
        intensity: 1.0 - input.int_fade + input.int_blow * 10.0,
        glitch: input.glitch,
    }
}

/// One-pole low-pass step.
pub fn smooth(current: f32, target: f32, factor: f32) -> f32 {
    current + (target - current) * factor
}

/// Crossfade; exact at both endpoints (`w == 0` → `a`, `w == 1` → `b`).
pub fn mix(a: f32, b: f32, w: f32) -> f32 {
    a * (1.0 - w) + b * w
}

/// Owns the smoothed autopilot position and blends it with human input.
#[derive(Debug, Clone, Default)]
pub struct Crossfader {
    smoothed: Position,
    last_target: Option<AutopilotTarget>,
}

impl Crossfader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn smoothed(&self) -> Position {
        self.smoothed
    }

    /// Hard-cut the smoothed position (chaos injection).
    pub fn cut_to(&mut self, pos: Position) {
        self.smoothed = pos;
    }

    pub fn last_target(&self) -> Option<AutopilotTarget> {
        self.last_target
    }

    /// Advance the autopilot one tick and blend with `input` weighted by `confidence`.
    /// Smoothing runs every tick regardless of confidence.
    pub fn tick(
        &mut self,
        genre: &str,
        t: f64,
        energy: &EnergyState,
        input: &InputVector,
        confidence: f32,
    ) -> HybridControlState {
        let target = autopilot::target(genre, t, energy);
        let factor = autopilot::profile(genre).smoothing;

        self.smoothed.x = smooth(self.smoothed.x, target.cam_x, factor);
        self.smoothed.y = smooth(self.smoothed.y, target.cam_y, factor);
        self.smoothed.z = smooth(self.smoothed.z, target.cam_z, factor);
        self.last_target = Some(target);

        blend(&self.smoothed, &target, &human_target(input), confidence)
    }
}

/// Linear blend of every channel; confidence 0 is pure autopilot, 1 pure human.
pub fn blend(
    smoothed: &Position,
    auto: &AutopilotTarget,
    human: &HumanTarget,
    confidence: f32,
) -> HybridControlState {
    let c = confidence.clamp(0.0, 1.0);
    HybridControlState {
        cam_x: mix(smoothed.x, human.cam_x, c),
        cam_y: mix(smoothed.y, human.cam_y, c),
        cam_z: mix(smoothed.z, human.cam_z, c),
        scale: mix(auto.scale, human.scale, c),
        intensity: mix(auto.intensity, human.intensity, c),
        glitch: mix(auto.glitch, human.glitch, c),
        mode: if c > 0.0 { ControlMode::Manual } else { ControlMode::Autopilot },
        confidence: c,
    }
}
