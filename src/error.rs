//! Error taxonomy for the route pipeline.
//!
//! Solver errors propagate to the session driver and end the session in a
//! visible failure state. Directions errors are absorbed per leg by the
//! animation controller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    /// Connection failure, timeout, or non-success HTTP status.
    #[error("{endpoint} request failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The response body did not have the expected shape.
    #[error("malformed {endpoint} response: {reason}")]
    MalformedResponse {
        endpoint: &'static str,
        reason: String,
    },

    /// Inputs the pipeline cannot work with, such as non-finite coordinates.
    #[error("degenerate input: {reason}")]
    DegenerateInput { reason: String },
}

impl RouteError {
    pub(crate) fn transport(endpoint: &'static str, source: reqwest::Error) -> Self {
        RouteError::Transport { endpoint, source }
    }

    pub(crate) fn malformed(endpoint: &'static str, reason: impl Into<String>) -> Self {
        RouteError::MalformedResponse {
            endpoint,
            reason: reason.into(),
        }
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        RouteError::DegenerateInput {
            reason: reason.into(),
        }
    }

    /// Only transport failures are worth retrying.
    pub fn is_transport(&self) -> bool {
        matches!(self, RouteError::Transport { .. })
    }
}
