#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtocolError {
    #[error("failed to parse {0}")]
    Unrecognized(String),

    #[error("invalid number {text:?} in {command}")]
    Number { command: String, text: String },

    #[error("no object named {0}")]
    UnknownObject(String),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
