use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HydraError {
    #[error("Could not resolve a session identity for this rerun")]
    MissingSession,

    #[error("Session has no attribute '{0}'")]
    MissingKey(String),

    #[error("Session attribute '{key}' is not a valid {expected}")]
    InvalidSessionValue { key: String, expected: &'static str },

    #[error("An app titled '{0}' is already registered")]
    DuplicateApp(String),

    #[error("'{0}' is a reserved navigation id and cannot be used as an app title")]
    ReservedTitle(String),

    #[error("Invalid app: {0}")]
    InvalidApp(String),

    #[error("No app registered under '{0}'")]
    UnknownApp(String),

    #[error("Access gate requires a login app but none is registered")]
    MissingLoginApp,

    #[error("Guest access requested but no unsecure app is registered")]
    MissingUnsecureApp,

    #[error("Error triggered from app '{app}': {source}")]
    AppFailed {
        app: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] crate::config::ConfigError),

    #[error("GUI error: {0}")]
    GuiError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HydraError>;
