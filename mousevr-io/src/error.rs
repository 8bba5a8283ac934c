use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("no peer has contacted the channel yet")]
    NoPeer,

    #[error("channel io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("{path} is not available: {source}")]
    Open {
        path: String,
        #[source]
        source: serialport::Error,
    },

    #[error("device write failed: {0}")]
    Write(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("log io error: {0}")]
    Io(#[from] io::Error),

    #[error("log encoding error: {0}")]
    Json(#[from] serde_json::Error),
}
