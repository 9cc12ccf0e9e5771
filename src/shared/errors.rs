//! Error handling for the application

use thiserror::Error;

/// Streaming handshake errors. Never fatal: the caller turns them into "no payload".
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0}")]
    Status(reqwest::StatusCode),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Open packet carried no session id")]
    MissingSession,

    #[error("Empty handshake response")]
    EmptyResponse,

    #[error("Event '{event}' not received after {attempts} polls")]
    EventNotFound { event: String, attempts: u32 },
}

/// Page fetching errors
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0}")]
    Status(reqwest::StatusCode),

    #[error("Renderer unavailable: {0}")]
    RendererUnavailable(String),

    #[error("Renderer failed: {0}")]
    RendererFailed(String),

    #[error("Renderer timed out after {0}s")]
    RendererTimeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a price source produced nothing usable
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("No event payload received")]
    NoPayload,

    #[error("Payload had no usable result")]
    NoResult,

    #[error("Page fetch failed: {0}")]
    Fetch(String),

    #[error("Markup had no usable prices")]
    NoData,

    #[error("Timed out after {0}s")]
    Timeout(u64),
}

/// Notification delivery errors
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Delivery rejected: {0}")]
    Rejected(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(&'static str),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl From<StreamError> for SourceError {
    fn from(_: StreamError) -> Self {
        SourceError::NoPayload
    }
}

impl From<FetchError> for SourceError {
    fn from(err: FetchError) -> Self {
        SourceError::Fetch(err.to_string())
    }
}
