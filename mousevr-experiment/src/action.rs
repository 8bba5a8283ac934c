use mousevr_core::TrialLog;

/// Side effects requested by the trial controller, applied by the session
#[derive(Debug, Clone, PartialEq)]
pub enum TaskAction {
    Teleport(String),
    /// Move the cue into view at the player's depth
    ShowCue,
    HideCue,
    Reward,
    PunishmentOn,
    PunishmentOff,
    Log(TrialLog),
    Quit,
}

/// Deferred transitions of the avoidance task, tagged with the trial that
/// scheduled them
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum Deferred {
    CueOn { trial: u32 },
    SuccessWindowClosed { trial: u32 },
    TrialWindowClosed { trial: u32 },
}
