use serde::{Deserialize, Serialize};

/// Behavioral phase of the current trial
#[derive(Copy, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrialState {
    Standby = 0,
    /// Start of the trial; alternation waits here for a door choice
    Start = 1,
    Delay = 2,
    Cue = 3,
    Success = 4,
    Failure = 5,
    FailureEnd = 6,
    Other = 7,
}

impl Default for TrialState {
    fn default() -> Self {
        TrialState::Standby
    }
}

impl TrialState {
    pub fn index(&self) -> u8 {
        *self as u8
    }
}

/// Side of the maze, used for both the rewarded target and the animal's choice
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    None = 0,
    Left = 1,
    Right = 2,
}

impl Default for Choice {
    fn default() -> Self {
        Choice::None
    }
}

impl Choice {
    /// Side to reward after this choice. No choice yet keeps the target open.
    pub fn opposite(&self) -> Choice {
        match self {
            Choice::Left => Choice::Right,
            Choice::Right => Choice::Left,
            Choice::None => Choice::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_are_totally_ordered() {
        assert!(TrialState::Standby < TrialState::Start);
        assert!(TrialState::FailureEnd < TrialState::Other);
        assert_eq!(TrialState::Cue.index(), 3);
    }

    #[test]
    fn opposite_alternates_between_sides() {
        assert_eq!(Choice::Left.opposite(), Choice::Right);
        assert_eq!(Choice::Right.opposite(), Choice::Left);
        assert_eq!(Choice::None.opposite(), Choice::None);
    }
}
