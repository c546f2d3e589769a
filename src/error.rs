//! Error types.
//!
//! Adapter failures ([`ObdError`]) are always recovered inside the polling
//! loop; configuration and startup failures ([`ConfigError`], [`DashError`])
//! end the process with a message and exit code 1.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure talking to a diagnostics adapter.
#[derive(Debug, Error)]
pub enum ObdError {
    /// Transport read/write failed.
    #[error("adapter I/O error: {0}")]
    Io(#[from] io::Error),

    /// No prompt arrived within the transport's read timeout.
    #[error("adapter timed out waiting for a response")]
    Timeout,

    /// The transport reached end-of-stream.
    #[error("adapter connection closed")]
    Closed,

    /// The adapter answered with an error line (`?`, `CAN ERROR`, ...).
    #[error("adapter reported '{0}'")]
    Adapter(String),

    /// The response could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The blocking worker running the query panicked or was cancelled.
    #[error("adapter worker failed: {0}")]
    Worker(String),
}

impl ObdError {
    /// Classify a transport error, folding read timeouts into [`ObdError::Timeout`].
    pub fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout,
            io::ErrorKind::UnexpectedEof => Self::Closed,
            _ => Self::Io(err),
        }
    }
}

/// Failure loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Top-level startup failure.
#[derive(Debug, Error)]
pub enum DashError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("failed to start polling worker: {0}")]
    WorkerSpawn(#[source] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_timeout() {
        let err = ObdError::from_io(io::Error::new(io::ErrorKind::WouldBlock, "slow"));
        assert!(matches!(err, ObdError::Timeout));
        let err = ObdError::from_io(io::Error::new(io::ErrorKind::TimedOut, "slow"));
        assert!(matches!(err, ObdError::Timeout));
    }

    #[test]
    fn test_from_io_other() {
        let err = ObdError::from_io(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert!(matches!(err, ObdError::Io(_)));
        let err = ObdError::from_io(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
        assert!(matches!(err, ObdError::Closed));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ObdError::Adapter("CAN ERROR".into()).to_string(),
            "adapter reported 'CAN ERROR'"
        );
        assert_eq!(
            DashError::from(ConfigError::Invalid("width must be > 0".into())).to_string(),
            "configuration error: invalid setting: width must be > 0"
        );
    }
}
