//! Error taxonomy for the dispatch layer.

use thiserror::Error;

/// Errors surfaced to callers of
/// [`ServiceDispatcher::submit`](crate::ServiceDispatcher::submit).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A required payload field is missing or empty. No request was created.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The dispatcher has not been initialized, or has been stopped.
    #[error("dispatcher is not running")]
    NotRunning,

    /// The request could not be encoded for transport. No pending entry was
    /// left behind.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl DispatchError {
    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument { reason: reason.into() }
    }
}

/// Frame encode/decode failures at the worker boundary.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed request frame: {0}")]
    BadRequestFrame(#[source] serde_json::Error),

    #[error("malformed response frame: {0}")]
    BadResponseFrame(#[source] serde_json::Error),

    #[error("message could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Failure to hand a request frame to the worker endpoint.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The endpoint's intake queue is closed; the worker is gone.
    #[error("worker endpoint is closed")]
    Closed,
}

/// Faults inside the response delivery path. These are logged and dropped,
/// never surfaced to callers.
#[derive(Debug, Error)]
pub(crate) enum DeliveryError {
    /// A response arrived whose id has no pending entry, e.g. after `stop`
    /// cleared the table or a worker double-delivered.
    #[error("no pending request matches response id {request_id}")]
    Unmatched { request_id: u64 },

    #[error(transparent)]
    Frame(#[from] CodecError),
}
