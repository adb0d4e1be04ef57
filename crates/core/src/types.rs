use serde::{Deserialize, Serialize};

// ── Wire types ─────────────────────────────────────────────────

/// Genre label the gateway reports while no backend data is flowing.
pub const OFFLINE_GENRE: &str = "OFFLINE";

/// Host-level telemetry block nested in every state frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemStats {
    pub cpu_usage: f32,
    pub memory_used: u64,
    pub memory_total: u64,
    pub uptime: u64,
}

/// Capture device descriptor nested in every state frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioMeta {
    pub device_name: String,
    pub sample_rate: u32,
    pub channels: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rms: Option<f32>,
}

/// Full analysis snapshot pushed by the backend. Always replaced wholesale.
///
/// `genre`, `state`, `bpm` and the three band energies are required so that
/// frames of another shape (welcome banners, acks) never decode as a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalState {
    pub bpm: f32,
    #[serde(default)]
    pub phase: f32,
    #[serde(default)]
    pub energy: f32,
    pub low_energy: f32,
    pub mid_energy: f32,
    pub high_energy: f32,
    #[serde(default)]
    pub spectral_flux: f32,
    #[serde(default)]
    pub glitch_factor: f32,
    pub genre: String,
    pub state: String,
    #[serde(default)]
    pub ai_theme: String,
    #[serde(default)]
    pub ai_primary_color: String,
    #[serde(default)]
    pub ai_secondary_color: String,
    #[serde(default)]
    pub ai_directive: String,
    #[serde(default)]
    pub system_stats: SystemStats,
    #[serde(default)]
    pub audio_meta: AudioMeta,
}

impl GlobalState {
    /// The fixed state every consumer falls back to when the link is down.
    pub fn offline() -> Self {
        Self {
            bpm: 0.0,
            phase: 0.0,
            energy: 0.0,
            low_energy: 0.0,
            mid_energy: 0.0,
            high_energy: 0.0,
            spectral_flux: 0.0,
            glitch_factor: 0.0,
            genre: OFFLINE_GENRE.into(),
            state: "DISCONNECTED".into(),
            ai_theme: "OFFLINE".into(),
            ai_primary_color: "#1a1a1a".into(),
            ai_secondary_color: "#0a0a0a".into(),
            ai_directive: "AWAITING_UPLINK".into(),
            system_stats: SystemStats::default(),
            audio_meta: AudioMeta {
                device_name: "NONE".into(),
                ..AudioMeta::default()
            },
        }
    }

    pub fn is_offline(&self) -> bool {
        self.genre == OFFLINE_GENRE
    }
}

impl Default for GlobalState {
    fn default() -> Self {
        Self::offline()
    }
}

/// Outbound frame from the engine: `{ "boredom_score": <0..1> }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoredomMessage {
    pub boredom_score: f32,
}

impl BoredomMessage {
    pub fn new(score: f32) -> Self {
        Self {
            boredom_score: score.clamp(0.0, 1.0),
        }
    }

    /// Decode a text frame, returning `None` for anything that is not a boredom report.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

// ── Control types ──────────────────────────────────────────────

/// Normalized human input, rewritten once per input-poll tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputVector {
    /// Left stick X after deadzone, [-1, 1].
    pub orbital_x: f32,
    /// Left stick Y after deadzone (up is positive), [-1, 1].
    pub orbital_y: f32,
    /// Right stick Y after deadzone, [-1, 1].
    pub zoom: f32,
    /// Left trigger, [0, 1].
    pub int_fade: f32,
    /// Right trigger, [0, 1].
    pub int_blow: f32,
    /// 1.0 while GLITCH is held.
    pub glitch: f32,
    pub swap: bool,
    pub hud: bool,
    pub chaos: bool,
}

/// Which source dominates the final control vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMode {
    Autopilot,
    Manual,
}

/// Final per-frame control vector handed to the render consumer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HybridControlState {
    pub cam_x: f32,
    pub cam_y: f32,
    pub cam_z: f32,
    pub scale: f32,
    pub intensity: f32,
    pub glitch: f32,
    pub mode: ControlMode,
    pub confidence: f32,
}

/// Uplink connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Reconnecting,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "DISCONNECTED"),
            Self::Connected => write!(f, "CONNECTED"),
            Self::Reconnecting => write!(f, "RECONNECTING"),
        }
    }
}

/// Frame-rate report posted to the gateway's visual telemetry endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualMetrics {
    pub fps: f32,
    pub resolution: String,
}

impl Default for VisualMetrics {
    fn default() -> Self {
        Self {
            fps: 0.0,
            resolution: "0x0".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_state_is_renderable_default() {
        let s = GlobalState::default();
        assert!(s.is_offline());
        assert_eq!(s.low_energy, 0.0);
        assert_eq!(s.mid_energy, 0.0);
        assert_eq!(s.high_energy, 0.0);
        assert_eq!(s.ai_directive, "AWAITING_UPLINK");
    }

    #[test]
    fn backend_frame_decodes_with_missing_optional_fields() {
        let json = r##"{
            "state": "Build", "genre": "Techno", "bpm": 128.0,
            "glitch_factor": 0.2, "low_energy": 0.5, "mid_energy": 0.3,
            "high_energy": 0.8, "spectral_flux": 0.1, "energy_trend": "RISING",
            "ai_theme": "NEON", "ai_primary_color": "#ff00ff",
            "ai_secondary_color": "#00ffff", "ai_directive": "HOLD",
            "system_stats": {"cpu_usage": 12.5, "memory_used": 1, "memory_total": 2, "uptime": 3},
            "audio_meta": {"device_name": "Loopback", "sample_rate": 48000, "channels": 2}
        }"##;
        let s: GlobalState = serde_json::from_str(json).unwrap();
        assert_eq!(s.genre, "Techno");
        assert_eq!(s.phase, 0.0);
        assert_eq!(s.audio_meta.sample_rate, 48000);
    }

    #[test]
    fn welcome_frame_is_not_a_state() {
        let json = r#"{"type":"WELCOME","message":"VIBES WS GATEWAY ACTIVE"}"#;
        assert!(serde_json::from_str::<GlobalState>(json).is_err());
    }

    #[test]
    fn boredom_message_wire_shape() {
        let text = serde_json::to_string(&BoredomMessage::new(0.25)).unwrap();
        assert_eq!(text, r#"{"boredom_score":0.25}"#);
        assert_eq!(BoredomMessage::parse(&text), Some(BoredomMessage::new(0.25)));
        assert!(BoredomMessage::parse(r#"{"bpm":120}"#).is_none());
    }

    #[test]
    fn boredom_score_is_clamped() {
        assert_eq!(BoredomMessage::new(3.0).boredom_score, 1.0);
        assert_eq!(BoredomMessage::new(-1.0).boredom_score, 0.0);
    }
}
