use std::io;
use std::time::Duration;
use thiserror::Error;

/// Custom error type for the sysmoni sampling engine
#[derive(Error, Debug)]
pub enum SysmoniError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Command failed: {0}")]
    Command(String),

    #[error("Command `{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("procfs error: {0}")]
    Procfs(#[from] procfs::ProcError),
}

/// Result type alias for sysmoni
pub type Result<T> = std::result::Result<T, SysmoniError>;

impl SysmoniError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        SysmoniError::Config(msg.into())
    }

    /// Create an external command error
    pub fn command<S: Into<String>>(msg: S) -> Self {
        SysmoniError::Command(msg.into())
    }

    pub fn timeout<S: Into<String>>(command: S, timeout: Duration) -> Self {
        SysmoniError::Timeout {
            command: command.into(),
            timeout,
        }
    }

    pub fn parse<S: Into<String>>(msg: S) -> Self {
        SysmoniError::Parse(msg.into())
    }

    /// True when the error came from an external command hitting its deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, SysmoniError::Timeout { .. })
    }
}
