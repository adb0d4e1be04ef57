use super::mapping::{Action, ButtonMapping};
use crate::types::InputVector;

/// Stick radius inside which input reads as zero.
pub const DEADZONE: f32 = 0.15;
/// Post-deadzone magnitude above which a stick or trigger counts as activity.
pub const ACTIVITY_EPSILON: f32 = 0.01;
/// Raw face (A, B, X, Y), view/menu and d-pad up/down buttons.
pub const ACTIVITY_BUTTONS: [usize; 8] = [0, 1, 2, 3, 8, 9, 12, 13];
/// Raw index of the confirm face button used by the exit dialog.
pub const CONFIRM_BUTTON: usize = 0;

/// One raw controller sample as delivered by the device layer.
/// Stick Y axes use device convention (down is positive).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSample {
    pub left_x: f32,
    pub left_y: f32,
    pub right_y: f32,
    pub left_trigger: f32,
    pub right_trigger: f32,
    pub buttons: Vec<bool>,
}

/// Pressed state of every logical action plus the confirm button for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionSnapshot {
    pressed: [bool; Action::COUNT],
    confirm: bool,
}

impl ActionSnapshot {
    pub fn capture(buttons: &[bool], mapping: &ButtonMapping) -> Self {
        let mut pressed = [false; Action::COUNT];
        for (slot, action) in Action::ALL.into_iter().enumerate() {
            pressed[slot] = mapping.is_pressed(action, buttons);
        }
        Self {
            pressed,
            confirm: buttons.get(CONFIRM_BUTTON).copied().unwrap_or(false),
        }
    }

    pub fn is_pressed(&self, action: Action) -> bool {
        self.pressed[action as usize]
    }

    pub fn confirm(&self) -> bool {
        self.confirm
    }
}

/// Previous/current snapshot pair; answers press transitions only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Edges {
    pub prev: ActionSnapshot,
    pub curr: ActionSnapshot,
}

impl Edges {
    pub fn new(prev: ActionSnapshot, curr: ActionSnapshot) -> Self {
        Self { prev, curr }
    }

    /// True only on the released → pressed transition.
    pub fn rising(&self, action: Action) -> bool {
        self.curr.is_pressed(action) && !self.prev.is_pressed(action)
    }

    pub fn confirm_rising(&self) -> bool {
        self.curr.confirm && !self.prev.confirm
    }
}

/// Output of one normalization pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized {
    pub input: InputVector,
    pub snapshot: ActionSnapshot,
    pub activity: bool,
}

/// Deadzone-correct a 2-D stick. Returns the rescaled vector, preserving direction.
pub fn normalize_stick(x: f32, y: f32) -> (f32, f32) {
    let mag = x.hypot(y);
    if mag <= DEADZONE {
        return (0.0, 0.0);
    }
    let rescaled = rescale(mag);
    let k = rescaled / mag;
    (x * k, y * k)
}

/// Deadzone-correct a 1-D axis, preserving sign.
pub fn normalize_axis(v: f32) -> f32 {
    let mag = v.abs();
    if mag <= DEADZONE {
        return 0.0;
    }
    rescale(mag).copysign(v)
}

/// Map (DEADZONE, 1] onto (0, 1], saturating beyond full scale.
fn rescale(mag: f32) -> f32 {
    if mag >= 1.0 {
        return 1.0;
    }
    (mag - DEADZONE) / (1.0 - DEADZONE)
}

/// Normalize a raw sample into an [`InputVector`], an action snapshot, and an activity flag.
/// Edge-triggered fields of the vector are left false; the caller fills them from [`Edges`].
pub fn normalize(sample: &RawSample, mapping: &ButtonMapping) -> Normalized {
    let (lx, ly) = normalize_stick(sample.left_x, -sample.left_y);
    let zoom = normalize_axis(-sample.right_y);
    let lt = sample.left_trigger.clamp(0.0, 1.0);
    let rt = sample.right_trigger.clamp(0.0, 1.0);
    let snapshot = ActionSnapshot::capture(&sample.buttons, mapping);

    let moved = lx.hypot(ly) > ACTIVITY_EPSILON
        || zoom.abs() > ACTIVITY_EPSILON
        || lt > ACTIVITY_EPSILON
        || rt > ACTIVITY_EPSILON;
    let pressed = ACTIVITY_BUTTONS
        .iter()
        .any(|&i| sample.buttons.get(i).copied().unwrap_or(false));

    let input = InputVector {
        orbital_x: lx,
        orbital_y: ly,
        zoom,
        int_fade: lt,
        int_blow: rt,
        glitch: if snapshot.is_pressed(Action::Glitch) { 1.0 } else { 0.0 },
        ..InputVector::default()
    };

    Normalized {
        input,
        snapshot,
        activity: moved || pressed,
    }
}
