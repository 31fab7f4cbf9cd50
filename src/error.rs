use thiserror::Error;

/// Errors raised while talking to a bridge.
#[derive(Error, Debug)]
pub enum Error {
    /// TCP connect, reset or refused. Never retried.
    #[error("bridge connection failed: {0}")]
    Connectivity(#[from] std::io::Error),

    /// Framing mismatch: missing/unexpected prompt, unterminated response or a malformed status line.
    #[error("bridge protocol error: {0}")]
    Protocol(String),

    /// The response terminator was not seen within the read timeout.
    #[error("timed out waiting for bridge response")]
    Timeout,

    /// Caller supplied an out-of-domain value, or the bridge rejected it as unsupported.
    #[error("{0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
