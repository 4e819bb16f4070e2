//! Shared error types across the exporter crates.

use thiserror::Error;

use chrono::{DateTime, Utc};

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Webhook body could not be decoded.
    MalformedEvent,
    /// Accumulator is not accepting updates (starting up or shutting down).
    Unavailable,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::MalformedEvent => "MALFORMED_EVENT",
            ClientCode::Unavailable => "UNAVAILABLE",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, DoraError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Error)]
pub enum DoraError {
    #[error("malformed event: {0}")]
    MalformedEvent(String),
    #[error("config: {0}")]
    Config(String),
    #[error("snapshot not found: {0}")]
    SnapshotAbsent(String),
    #[error("snapshot unparsable: line {line}: {reason}")]
    SnapshotUnparsable { line: usize, reason: String },
    #[error("labels do not match schema of {family}: {detail}")]
    LabelSchema { family: &'static str, detail: String },
    #[error("{family} is a {actual}, not a {expected}")]
    KindMismatch {
        family: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("{op} rejected while accumulator is {state}")]
    InvalidState {
        op: &'static str,
        state: &'static str,
    },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl DoraError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            DoraError::MalformedEvent(_) => ClientCode::MalformedEvent,
            DoraError::InvalidState { .. } => ClientCode::Unavailable,
            DoraError::Config(_)
            | DoraError::SnapshotAbsent(_)
            | DoraError::SnapshotUnparsable { .. }
            | DoraError::LabelSchema { .. }
            | DoraError::KindMismatch { .. }
            | DoraError::Io(_) => ClientCode::Internal,
        }
    }

    /// Cold-start conditions: no usable prior snapshot exists.
    pub fn is_cold_start(&self) -> bool {
        matches!(
            self,
            DoraError::SnapshotAbsent(_) | DoraError::SnapshotUnparsable { .. }
        )
    }
}

/// Failure while deriving the lead time of a deployed commit.
///
/// Never surfaced to webhook senders; the ingestor degrades the duration metric.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("fetch failed: {0}")]
    FetchFailed(String),
    #[error("decode failed: {0}")]
    DecodeFailed(String),
    /// The referenced pull request has no commits. `commit_authored_at` is the
    /// deployed commit's own author timestamp, usable as a fallback origin.
    #[error("pull request #{number} has no commits")]
    EmptyPullRequest {
        number: u64,
        commit_authored_at: DateTime<Utc>,
    },
}

impl ResolutionError {
    pub fn kind(&self) -> &'static str {
        match self {
            ResolutionError::FetchFailed(_) => "fetch_failed",
            ResolutionError::DecodeFailed(_) => "decode_failed",
            ResolutionError::EmptyPullRequest { .. } => "empty_pull_request",
        }
    }
}
