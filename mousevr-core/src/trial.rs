use crate::log::TrialLog;
use crate::state::{Choice, TrialState};

/// Live bookkeeping for the running session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialRecord {
    pub state: TrialState,
    pub trial: u32,
    pub correct: u32,
    /// Total reward delivered in µL
    pub reward_ul: u32,
    pub target: Choice,
    pub choice: Choice,
    pub note: String,
}

impl TrialRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores start-of-session defaults
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self) -> TrialLog {
        TrialLog {
            state: self.state,
            trial: self.trial,
            correct: self.correct,
            target: self.target,
            choice: self.choice,
            reward_ul: self.reward_ul,
            note: self.note.clone(),
        }
    }
}
