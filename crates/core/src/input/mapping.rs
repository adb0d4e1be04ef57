/// Logical controller actions. The set is closed, so every lookup resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Glitch,
    Swap,
    HudToggle,
    Chaos,
    ExitModal,
    SettingsModal,
    Cancel,
}

impl Action {
    pub const COUNT: usize = 7;

    pub const ALL: [Action; Self::COUNT] = [
        Action::Glitch,
        Action::Swap,
        Action::HudToggle,
        Action::Chaos,
        Action::ExitModal,
        Action::SettingsModal,
        Action::Cancel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Glitch => "GLITCH",
            Self::Swap => "SWAP",
            Self::HudToggle => "HUD_TOGGLE",
            Self::Chaos => "CHAOS",
            Self::ExitModal => "EXIT_MODAL",
            Self::SettingsModal => "SETTINGS_MODAL",
            Self::Cancel => "CANCEL",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action → physical button index. Only a completed remap session mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonMapping {
    indices: [usize; Action::COUNT],
}

impl Default for ButtonMapping {
    /// Standard layout: A, X, d-pad up, d-pad down, menu, view, B.
    fn default() -> Self {
        let mut indices = [0; Action::COUNT];
        indices[Action::Glitch.slot()] = 0;
        indices[Action::Swap.slot()] = 2;
        indices[Action::HudToggle.slot()] = 12;
        indices[Action::Chaos.slot()] = 13;
        indices[Action::ExitModal.slot()] = 9;
        indices[Action::SettingsModal.slot()] = 8;
        indices[Action::Cancel.slot()] = 1;
        Self { indices }
    }
}

impl ButtonMapping {
    pub fn index(&self, action: Action) -> usize {
        self.indices[action.slot()]
    }

    pub fn set(&mut self, action: Action, index: usize) {
        self.indices[action.slot()] = index;
    }

    /// Whether the button bound to `action` is down in `buttons`.
    /// Indices past the end of the sample read as released.
    pub fn is_pressed(&self, action: Action, buttons: &[bool]) -> bool {
        buttons.get(self.index(action)).copied().unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Action, usize)> + '_ {
        Action::ALL.into_iter().map(|a| (a, self.index(a)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let m = ButtonMapping::default();
        assert_eq!(m.index(Action::Glitch), 0);
        assert_eq!(m.index(Action::Cancel), 1);
        assert_eq!(m.index(Action::Swap), 2);
        assert_eq!(m.index(Action::SettingsModal), 8);
        assert_eq!(m.index(Action::ExitModal), 9);
        assert_eq!(m.index(Action::HudToggle), 12);
        assert_eq!(m.index(Action::Chaos), 13);
    }

    #[test]
    fn names_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::from_name(action.as_str()), Some(action));
        }
        assert_eq!(Action::from_name("JUMP"), None);
    }

    #[test]
    fn short_button_arrays_read_released() {
        let m = ButtonMapping::default();
        assert!(!m.is_pressed(Action::Chaos, &[true, true]));
        assert!(m.is_pressed(Action::Glitch, &[true, false]));
    }
}
