use crate::session::{SessionParameters, TaskKind};
use crate::state::{Choice, TrialState};
use serde::{Deserialize, Serialize};

/// Snapshot of the trial record, written on every transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialLog {
    pub state: TrialState,
    pub trial: u32,
    pub correct: u32,
    pub target: Choice,
    pub choice: Choice,
    pub reward_ul: u32,
    pub note: String,
}

/// Written once at session start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterLog {
    pub subject: String,
    pub task: TaskKind,
    pub trial_budget: u32,
    pub reward_ul: u32,
    pub note: String,
}

impl From<&SessionParameters> for ParameterLog {
    fn from(params: &SessionParameters) -> Self {
        Self {
            subject: params.subject.clone(),
            task: params.task.clone(),
            trial_budget: params.trial_budget,
            reward_ul: params.reward_ul,
            note: params.note.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogEntry {
    Trial(TrialLog),
    Parameters(ParameterLog),
}

/// Destination for structured session records
pub trait LogSink {
    fn record(&mut self, entry: LogEntry);
}

impl LogSink for Vec<LogEntry> {
    fn record(&mut self, entry: LogEntry) {
        self.push(entry);
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn record(&mut self, entry: LogEntry) {
        (**self).record(entry)
    }
}
