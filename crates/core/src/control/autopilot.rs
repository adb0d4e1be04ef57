//! Procedural camera trajectories, one per genre.
//!
//! Every trajectory is a closed-form function of time and band energy, so the
//! same inputs always yield the same target.

use crate::types::GlobalState;

/// State label that forces maximum glitch regardless of genre.
pub const CHAOTIC_STATE: &str = "Chaos";
/// Resting camera depth every trajectory orbits around.
pub const REST_Z: f32 = -3.0;

/// Procedural control target before smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutopilotTarget {
    pub cam_x: f32,
    pub cam_y: f32,
    pub cam_z: f32,
    pub scale: f32,
    pub glitch: f32,
    pub intensity: f32,
}

impl Default for AutopilotTarget {
    fn default() -> Self {
        Self {
            cam_x: 0.0,
            cam_y: 0.0,
            cam_z: REST_Z,
            scale: 0.0,
            glitch: 0.0,
            intensity: 1.0,
        }
    }
}

/// The telemetry slice trajectories react to.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergyState {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
    pub chaotic: bool,
}

impl From<&GlobalState> for EnergyState {
    fn from(s: &GlobalState) -> Self {
        Self {
            low: s.low_energy,
            mid: s.mid_energy,
            high: s.high_energy,
            chaotic: s.state == CHAOTIC_STATE,
        }
    }
}

pub type Trajectory = fn(f64, &EnergyState) -> AutopilotTarget;

/// Per-genre behavior: trajectory plus one-pole smoothing factor.
#[derive(Debug, Clone, Copy)]
pub struct GenreProfile {
    pub name: &'static str,
    pub trajectory: Trajectory,
    pub smoothing: f32,
}

static PROFILES: &[GenreProfile] = &[
    GenreProfile { name: "DnB", trajectory: drum_and_bass, smoothing: 0.4 },
    GenreProfile { name: "Techno", trajectory: techno, smoothing: 0.1 },
    GenreProfile { name: "Ambient", trajectory: ambient, smoothing: 0.02 },
    GenreProfile { name: "Dubstep", trajectory: dubstep, smoothing: 0.4 },
];

static FALLBACK: GenreProfile = GenreProfile { name: "Unknown", trajectory: drift, smoothing: 0.05 };

/// Look up the profile for a genre label; unknown labels get a minimal drift.
pub fn profile(genre: &str) -> &'static GenreProfile {
    PROFILES.iter().find(|p| p.name == genre).unwrap_or(&FALLBACK)
}

/// Autopilot target for `genre` at `t` seconds since engine start.
pub fn target(genre: &str, t: f64, energy: &EnergyState) -> AutopilotTarget {
    let mut out = (profile(genre).trajectory)(t, energy);
    if energy.chaotic {
        out.glitch = 1.0;
    }
    out
}

fn drum_and_bass(t: f64, e: &EnergyState) -> AutopilotTarget {
    let mut glitch = if (t * 10.0).sin() > 0.8 { 0.3 } else { 0.0 };
    if e.low > 0.8 {
        glitch = 1.0;
    }
    AutopilotTarget {
        cam_x: ((t * 2.0).sin() * 0.5) as f32,
        cam_y: ((t * 3.0).cos() * 0.2) as f32,
        glitch,
        ..AutopilotTarget::default()
    }
}

fn techno(t: f64, e: &EnergyState) -> AutopilotTarget {
    AutopilotTarget {
        cam_x: ((t * 0.5).sin() * 2.0) as f32,
        cam_z: REST_Z + (t * 0.5).cos() as f32,
        intensity: if e.high > 0.7 { 1.5 } else { 1.0 },
        ..AutopilotTarget::default()
    }
}

fn ambient(t: f64, _: &EnergyState) -> AutopilotTarget {
    AutopilotTarget {
        cam_x: ((t * 0.1).sin() * 1.5) as f32,
        cam_y: ((t * 0.15).sin() * 0.8) as f32,
        cam_z: REST_Z + ((t * 0.05).sin() * 2.0) as f32,
        scale: ((t * 0.05).sin() * 0.5) as f32,
        intensity: 0.8,
        ..AutopilotTarget::default()
    }
}

fn dubstep(t: f64, e: &EnergyState) -> AutopilotTarget {
    if e.low > 0.6 {
        AutopilotTarget {
            cam_x: jitter(t, 1.0) * 0.4,
            cam_y: jitter(t, 2.0) * 0.4,
            glitch: 0.8,
            ..AutopilotTarget::default()
        }
    } else {
        AutopilotTarget {
            cam_x: (t * 0.5).sin() as f32,
            ..AutopilotTarget::default()
        }
    }
}

fn drift(t: f64, _: &EnergyState) -> AutopilotTarget {
    AutopilotTarget {
        cam_x: ((t * 0.2).sin() * 0.2) as f32,
        ..AutopilotTarget::default()
    }
}

/// Hash-based noise in [-0.5, 0.5), a pure function of `t` and `seed`.
fn jitter(t: f64, seed: f64) -> f32 {
    let v = ((t * 12.9898 + seed * 78.233).sin() * 43_758.545_3).abs();
    (v - v.floor()) as f32 - 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calm() -> EnergyState {
        EnergyState::default()
    }

    #[test]
    fn unknown_genre_falls_back_to_drift() {
        assert_eq!(profile("Polka").name, "Unknown");
        assert_eq!(profile("OFFLINE").smoothing, 0.05);
        let t = target("Polka", 3.0, &calm());
        assert_eq!(t.cam_y, 0.0);
        assert_eq!(t.cam_z, REST_Z);
        assert!(t.cam_x.abs() <= 0.2);
    }

    #[test]
    fn smoothing_factors_per_genre() {
        assert_eq!(profile("DnB").smoothing, 0.4);
        assert_eq!(profile("Dubstep").smoothing, 0.4);
        assert_eq!(profile("Techno").smoothing, 0.1);
        assert_eq!(profile("Ambient").smoothing, 0.02);
    }

    #[test]
    fn deterministic_for_same_inputs() {
        let e = EnergyState { low: 0.9, mid: 0.2, high: 0.1, chaotic: false };
        for genre in ["DnB", "Techno", "Ambient", "Dubstep", "Other"] {
            for t in [0.0, 1.3, 17.25, 900.0] {
                assert_eq!(target(genre, t, &e), target(genre, t, &e));
            }
        }
    }

    #[test]
    fn dnb_spikes_glitch_on_heavy_low_band() {
        let heavy = EnergyState { low: 0.85, ..calm() };
        assert_eq!(target("DnB", 0.0, &heavy).glitch, 1.0);
        assert_eq!(target("DnB", 0.0, &calm()).glitch, 0.0);
    }

    #[test]
    fn techno_boosts_intensity_on_high_band() {
        let bright = EnergyState { high: 0.75, ..calm() };
        assert_eq!(target("Techno", 1.0, &bright).intensity, 1.5);
        assert_eq!(target("Techno", 1.0, &calm()).intensity, 1.0);
    }

    #[test]
    fn ambient_has_reduced_intensity() {
        assert_eq!(target("Ambient", 5.0, &calm()).intensity, 0.8);
    }

    #[test]
    fn dubstep_jitter_stays_near_origin() {
        let heavy = EnergyState { low: 0.7, ..calm() };
        for i in 0..200 {
            let t = target("Dubstep", i as f64 * 0.016, &heavy);
            assert!(t.cam_x.abs() <= 0.2 && t.cam_y.abs() <= 0.2);
            assert_eq!(t.glitch, 0.8);
        }
        let sweep = target("Dubstep", 1.0, &calm());
        assert_eq!(sweep.glitch, 0.0);
        assert!((sweep.cam_x - (0.5_f64).sin() as f32).abs() < 1e-6);
    }

    #[test]
    fn chaotic_state_overrides_glitch() {
        let chaos = EnergyState { chaotic: true, ..calm() };
        for genre in ["DnB", "Techno", "Ambient", "Dubstep", "Other"] {
            assert_eq!(target(genre, 2.0, &chaos).glitch, 1.0);
        }
    }

    #[test]
    fn energy_state_from_global() {
        let mut s = GlobalState::offline();
        s.low_energy = 0.4;
        s.state = CHAOTIC_STATE.into();
        let e = EnergyState::from(&s);
        assert_eq!(e.low, 0.4);
        assert!(e.chaotic);
    }
}
