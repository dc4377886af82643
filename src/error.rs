//! Error kinds for a single flow round trip.

use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can stop a question from turning into a history entry.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Blank or whitespace-only message. Nothing is sent.
    #[error("message is empty")]
    EmptyInput,

    /// A request for this session is still outstanding.
    #[error("a request is already in flight for this session")]
    Busy,

    /// An answer for a question this session is not waiting on.
    #[error("reply does not match an outstanding question")]
    Stale,

    /// Connection, TLS, timeout or body-read failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The flow API answered with a non-2xx status.
    #[error("flow API returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The response body is not JSON.
    #[error("response is not valid JSON: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

impl FlowError {
    /// Network failures and non-2xx answers share one user-facing kind.
    pub fn is_transport(&self) -> bool {
        matches!(self, FlowError::Transport(_) | FlowError::Status { .. })
    }

    /// Errors the UI swallows without telling the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, FlowError::EmptyInput | FlowError::Busy | FlowError::Stale)
    }

    /// Text shown in the status line or on stderr.
    pub fn user_message(&self) -> String {
        format!("❌ Error: {}", self)
    }
}
