use serde::{Deserialize, Serialize};
use std::fmt;

/// Task variant selected for the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskKind {
    Alternation,
    Avoidance,
    /// Unknown task names are kept for the log but ignore zone events
    Other(String),
}

impl From<String> for TaskKind {
    fn from(name: String) -> Self {
        match name.trim().to_lowercase().as_str() {
            "alternation" => TaskKind::Alternation,
            "avoidance" => TaskKind::Avoidance,
            _ => TaskKind::Other(name),
        }
    }
}

impl From<&str> for TaskKind {
    fn from(name: &str) -> Self {
        TaskKind::from(name.to_string())
    }
}

impl From<TaskKind> for String {
    fn from(kind: TaskKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Alternation => f.write_str("alternation"),
            TaskKind::Avoidance => f.write_str("avoidance"),
            TaskKind::Other(name) => f.write_str(name),
        }
    }
}

/// Parameters fixed at session start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionParameters {
    pub subject: String,
    pub task: TaskKind,
    pub trial_budget: u32,
    pub reward_ul: u32,
    pub note: String,
}

impl Default for SessionParameters {
    fn default() -> Self {
        Self {
            subject: String::new(),
            task: TaskKind::Other(String::new()),
            trial_budget: 100,
            reward_ul: 10,
            note: String::new(),
        }
    }
}
