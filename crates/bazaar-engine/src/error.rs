//! # Engine Error Types
//!
//! Error types for configuration loading, persistence and engine setup.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Engine Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Payload             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Transport      │  │  Malformed              │ │
//! │  │  InvalidUrl     │  │  Status         │  │  Serialization          │ │
//! │  │  ConfigLoad...  │  │  Timeout        │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │    Storage      │  │    Internal     │                              │
//! │  │                 │  │                 │                              │
//! │  │  Storage        │  │  TaskFailed     │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Transport and payload errors never escape `ConfigLoader::load`; they are
//! logged and answered with a fallback.

use bazaar_core::{ConfigKind, PricingError};
use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error type.
#[derive(Debug, Error)]
pub enum EngineError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid engine configuration.
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// Invalid configuration service URL.
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),

    /// Failed to load the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The configuration service could not be reached.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The configuration service answered with a non-success status.
    #[error("{kind} fetch returned HTTP {status}")]
    Status { kind: ConfigKind, status: u16 },

    /// The request did not complete in time.
    #[error("Request timed out")]
    Timeout,

    // =========================================================================
    // Payload Errors
    // =========================================================================
    /// The payload did not have the expected shape.
    #[error(transparent)]
    Malformed(#[from] PricingError),

    /// JSON encoding or decoding failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// Cart persistence failed.
    #[error("Storage error: {0}")]
    Storage(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// A background load task ended without reporting.
    #[error("Load task for {0} ended unexpectedly")]
    TaskFailed(ConfigKind),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for EngineError {
    fn from(err: url::ParseError) -> Self {
        EngineError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Storage(err.to_string())
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EngineError::Timeout
        } else if err.is_decode() {
            EngineError::Serialization(err.to_string())
        } else {
            EngineError::Transport(err.to_string())
        }
    }
}

impl EngineError {
    /// Returns true if the failure came from the network rather than the
    /// payload.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            EngineError::Transport(_) | EngineError::Status { .. } | EngineError::Timeout
        )
    }
}
