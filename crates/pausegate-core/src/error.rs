//! Core error types for pausegate-core.
//!
//! Every error here is locally recoverable: navigation errors leave the stack
//! untouched, session errors leave the session untouched, and the controller
//! can always fall back to the first `home` frame.

use std::path::PathBuf;
use thiserror::Error;

use crate::navigation::{Category, FrameId};
use crate::session::SessionStep;

/// Core error type for pausegate-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Navigation stack errors
    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    /// Session state machine errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Frame catalog errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the navigation stack.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// The requested frame is not registered in the catalog.
    #[error("unknown frame: {0}")]
    UnknownFrame(FrameId),

    /// Pop was requested on a stack holding only the root entry.
    #[error("cannot pop the root frame; use an explicit exit instead")]
    StackUnderflow,

    /// The current frame declares no link with this label.
    #[error("frame {frame} has no link labelled '{label}'")]
    UnknownLink { frame: FrameId, label: String },
}

/// Errors raised by the intervention session machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The input has no transition defined in the current step.
    #[error("'{input}' is not valid in the {step} step")]
    InvalidTransition {
        step: SessionStep,
        input: &'static str,
    },

    /// A session input arrived while no session is open.
    #[error("no active session for '{input}'")]
    NoActiveSession { input: &'static str },

    /// Only one session may be open at a time.
    #[error("a session is already active")]
    AlreadyActive,
}

/// Errors found while building or validating the frame catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// A category is declared with no frames.
    #[error("category '{0}' has no frames")]
    EmptyCategory(Category),

    /// A category required by the session flow is missing.
    #[error("required category '{0}' is missing")]
    MissingCategory(Category),

    /// The same frame id appears more than once.
    #[error("frame {frame} is listed more than once (in '{first}' and '{second}')")]
    DuplicateFrame {
        frame: FrameId,
        first: Category,
        second: Category,
    },

    /// A link starts from a frame that is not in the catalog.
    #[error("link '{label}' starts from unknown frame {from}")]
    DanglingLink { from: FrameId, label: String },

    /// The catalog document could not be parsed.
    #[error("failed to parse catalog: {0}")]
    Parse(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// The data directory could not be created
    #[error("Failed to prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<toml::de::Error> for CatalogError {
    fn from(err: toml::de::Error) -> Self {
        CatalogError::Parse(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
