use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use hunter_core::RemoteStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The bundle is not staged yet. An expected outcome, not a defect.
    #[error("bundle not ready: {0}")]
    NotReady(String),
    #[error("{kind}: {message}")]
    Transport { kind: TransportKind, message: String },
}

impl ClientError {
    pub(crate) fn transport(kind: TransportKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    pub fn is_not_ready(&self) -> bool {
        matches!(self, ClientError::NotReady(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportKind {
    InvalidUrl,
    InvalidRequest,
    HttpStatus(u16),
    Timeout,
    Network,
    /// A success response whose body did not match the contract.
    Decode,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::InvalidUrl => write!(f, "invalid url"),
            TransportKind::InvalidRequest => write!(f, "invalid request"),
            TransportKind::HttpStatus(code) => write!(f, "http status {code}"),
            TransportKind::Timeout => write!(f, "timeout"),
            TransportKind::Network => write!(f, "network error"),
            TransportKind::Decode => write!(f, "malformed response"),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct KeywordRequest<'a> {
    pub keyword: &'a str,
    pub max_num: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponse {
    pub job_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusResponse {
    pub status: WireStatus,
    #[serde(default)]
    pub msg: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum WireStatus {
    Running,
    Done,
    Error,
}

impl From<WireStatus> for RemoteStatus {
    fn from(status: WireStatus) -> Self {
        match status {
            WireStatus::Running => RemoteStatus::Running,
            WireStatus::Done => RemoteStatus::Done,
            WireStatus::Error => RemoteStatus::Error,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DownloadResponse {
    pub url: String,
}

/// Error body shape used by the service (`{"detail": "..."}`).
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: String,
}
