use super::mapping::{Action, ButtonMapping};

/// Remap session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemapState {
    #[default]
    Idle,
    Capturing(Action),
}

/// Result of polling the session for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemapOutcome {
    /// No capture in progress; dispatch proceeds normally.
    Idle,
    /// Capturing, nothing pressed yet.
    Waiting(Action),
    /// `action` was rebound to `index`; the session is idle again.
    Captured { action: Action, index: usize },
}

impl RemapOutcome {
    /// Gameplay dispatch is skipped for any tick spent capturing.
    pub fn suppresses_dispatch(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Modal capture of the next raw button press.
#[derive(Debug, Default)]
pub struct RemapSession {
    state: RemapState,
}

impl RemapSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RemapState {
        self.state
    }

    /// Start capturing for `action`; requesting the action already being captured cancels.
    pub fn toggle(&mut self, action: Action) {
        self.state = match self.state {
            RemapState::Capturing(current) if current == action => RemapState::Idle,
            _ => RemapState::Capturing(action),
        };
    }

    pub fn cancel(&mut self) {
        self.state = RemapState::Idle;
    }

    /// Scan `buttons` in ascending order; bind the first pressed index.
    pub fn poll(&mut self, buttons: &[bool], mapping: &mut ButtonMapping) -> RemapOutcome {
        let RemapState::Capturing(action) = self.state else {
            return RemapOutcome::Idle;
        };
        match buttons.iter().position(|&pressed| pressed) {
            Some(index) => {
                mapping.set(action, index);
                self.state = RemapState::Idle;
                tracing::info!(action = %action, index, "button remapped");
                RemapOutcome::Captured { action, index }
            }
            None => RemapOutcome::Waiting(action),
        }
    }
}
