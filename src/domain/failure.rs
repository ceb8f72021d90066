//! Failure taxonomy for simulated runs.
//!
//! A failure is never thrown across the runner boundary. It is carried as
//! the value of a run's terminal `Failed` status.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a step or a whole run failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Designed-in transport failure
    #[error("NetworkError: Failed to fetch data")]
    NetworkError,

    /// Designed-in credential rejection
    #[error("AuthError: Credentials rejected")]
    AuthError,

    /// Designed-in input validation failure
    #[error("ValidationError: {0}")]
    ValidationError(String),

    /// Designed-in server-side failure with an HTTP-like status
    #[error("ServerError: status {0}")]
    ServerError(u16),

    /// A timeout race was lost
    #[error("Request timed out after {limit_ms}ms")]
    Timeout { limit_ms: u64 },

    /// Retry with backoff gave up
    #[error("Failed after {attempts} attempts: {last}")]
    ExhaustedRetries {
        attempts: u32,
        last: Box<FailureKind>,
    },
}

impl FailureKind {
    /// Short name used by displays
    pub fn label(&self) -> &'static str {
        match self {
            Self::NetworkError => "NetworkError",
            Self::AuthError => "AuthError",
            Self::ValidationError(_) => "ValidationError",
            Self::ServerError(_) => "ServerError",
            Self::Timeout { .. } => "Timeout",
            Self::ExhaustedRetries { .. } => "ExhaustedRetries",
        }
    }
}
