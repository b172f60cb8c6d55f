use thiserror::Error;

/// Faults raised by a single page primitive.
///
/// The injection engine absorbs these one step at a time; they never reach
/// a command reply.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("Element {0} is stale (removed from DOM)")]
    Stale(crate::protocol::ElementRef),

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Errors raised while launching or talking to a page backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Page script failed: {0}")]
    Script(String),

    #[error("Connection lost")]
    ConnectionLost,

    #[error("Timeout")]
    Timeout,

    #[error("Not ready")]
    NotReady,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other: {0}")]
    Other(String),
}

/// Reasons a site profile is rejected by the registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Site profile '{key}' declares no input selectors")]
    EmptySelectors { key: String },

    #[error("Site profile has an empty hostname key")]
    EmptyKey,
}

/// The two failures a command reply can carry.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("Input element not found")]
    InputNotFound,

    #[error("Target not found")]
    TargetNotFound,
}
