//! Error types for the datagrid launcher
//!
//! `ApiError` covers everything that can go wrong talking to the datagrid
//! backend. `DataGridError` is what the public flows return; user-visible
//! failures have already been alerted by the time one of these reaches the
//! caller, so callers usually only log them.

use serde::Deserialize;
use thiserror::Error;

/// Marker the backend puts in `info` when the database connection dropped.
pub const CONNECTION_LOST: &str = "CONNECTION_LOST";

/// Errors from the datagrid HTTP backend
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status} {status_text}")]
    Status {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Structured error body returned by the backend on failure
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ErrorBody {
    #[serde(default)]
    pub errormsg: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
}

impl ApiError {
    /// HTTP status, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Parse the response body as the backend's structured error payload
    pub fn error_body(&self) -> Option<ErrorBody> {
        match self {
            ApiError::Status { body, .. } => serde_json::from_str(body).ok(),
            _ => None,
        }
    }

    /// 503 with `info == CONNECTION_LOST`
    pub fn is_connection_lost(&self) -> bool {
        self.status() == Some(503)
            && self
                .error_body()
                .and_then(|b| b.info)
                .is_some_and(|info| info == CONNECTION_LOST)
    }

    /// Best-effort human readable detail: the structured `errormsg` when the
    /// body carries one, otherwise the transport status text.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { status_text, .. } => self
                .error_body()
                .and_then(|b| b.errormsg)
                .unwrap_or_else(|| status_text.clone()),
            ApiError::Transport(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        ApiError::Transport(error.to_string())
    }
}

/// Errors surfaced by the datagrid flows
#[derive(Error, Debug)]
pub enum DataGridError {
    #[error("No object selected")]
    NoObjectSelected,

    #[error("Selected object is missing {0} context")]
    MissingContext(&'static str),

    #[error("Action is not available for node type '{0}'")]
    ActionUnavailable(String),

    #[error("Filter dialog is busy with a previous request")]
    FilterBusy,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Session creation failed: {0}")]
    SessionFailed(String),

    #[error("Docking error: {0}")]
    Docking(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<url::ParseError> for DataGridError {
    fn from(error: url::ParseError) -> Self {
        DataGridError::Api(ApiError::Url(error))
    }
}

pub type Result<T> = std::result::Result<T, DataGridError>;
