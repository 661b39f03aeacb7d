use crate::error::SessionError;
use serde::{Deserialize, Serialize};

/// Progress of one session, owned by whoever drives the timeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub practice_completed: bool,
    pub main_trials_completed: usize,
    pub total_trials: usize,
}

impl SessionState {
    pub fn new(total_trials: usize) -> Self {
        Self {
            total_trials,
            ..Default::default()
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Called when the practice debrief screen finishes
    pub fn on_practice_debrief_finished(&mut self) {
        self.practice_completed = true;
    }

    /// Called when a main (non-practice) trial finishes
    pub fn on_main_trial_finished(&mut self) -> Result<(), SessionError> {
        if self.main_trials_completed >= self.total_trials {
            return Err(SessionError::TrialOverflow {
                total: self.total_trials,
            });
        }
        self.main_trials_completed += 1;
        Ok(())
    }

    pub fn remaining_trials(&self) -> usize {
        self.total_trials.saturating_sub(self.main_trials_completed)
    }

    pub fn is_complete(&self) -> bool {
        self.practice_completed && self.main_trials_completed == self.total_trials
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_is_idempotent() {
        let mut state = SessionState::new(60);
        state.on_practice_debrief_finished();
        state.on_main_trial_finished().unwrap();

        state.reset();
        let first = state.clone();
        state.reset();
        assert_eq!(first, state);
        assert_eq!(state, SessionState::default());
        assert_eq!(state.total_trials, 0);
    }

    #[test]
    fn main_trials_never_exceed_total() {
        let mut state = SessionState::new(2);
        state.on_main_trial_finished().unwrap();
        state.on_main_trial_finished().unwrap();
        assert_eq!(state.remaining_trials(), 0);

        assert_eq!(
            state.on_main_trial_finished(),
            Err(SessionError::TrialOverflow { total: 2 })
        );
        assert_eq!(state.main_trials_completed, 2);
    }

    #[test]
    fn remaining_is_zero_for_inconsistent_loaded_state() {
        let state: SessionState = serde_json::from_str(
            r#"{"practice_completed": true, "main_trials_completed": 9, "total_trials": 4}"#,
        )
        .unwrap();
        assert_eq!(state.remaining_trials(), 0);
    }

    #[test]
    fn complete_requires_practice_and_all_trials() {
        let mut state = SessionState::new(1);
        state.on_main_trial_finished().unwrap();
        assert!(!state.is_complete());
        state.on_practice_debrief_finished();
        assert!(state.is_complete());
    }
}
