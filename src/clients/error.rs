//! Error types for the request layer.

use thiserror::Error;

use crate::storage::StorageError;
use crate::transport::TransportError;

/// Why a logical request failed.
///
/// `Display` yields the message shown to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Every attempt ran past the attempt timeout.
    #[error("The server took too long to respond.")]
    Timeout,

    /// No response could be obtained at all.
    #[error("Cannot reach the server: {0}")]
    NetworkUnreachable(String),

    /// HTTP 401. Never retried; the caller should re-authenticate.
    #[error("Your session has expired. Please sign in again.")]
    Unauthorized,

    /// Any other HTTP status ≥ 400.
    #[error("{}", rejection_message(.status, .message))]
    ServerRejected {
        status: u16,
        message: Option<String>,
    },

    /// The request was refused locally before anything was sent.
    #[error("{0}")]
    Validation(String),

    /// The payload parsed but lacks what the endpoint promises.
    #[error("Unexpected response from server: {0}")]
    UnexpectedPayload(String),
}

fn rejection_message(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(m) => m.clone(),
        None => format!("HTTP {status}"),
    }
}

impl ApiError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Timeout | ApiError::NetworkUnreachable(_) => true,
            ApiError::ServerRejected { status, .. } => *status >= 500,
            ApiError::Unauthorized | ApiError::Validation(_) | ApiError::UnexpectedPayload(_) => {
                false
            }
        }
    }

    /// Whether the caller should send the user through sign-in again.
    pub fn requires_reauth(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

impl From<TransportError> for ApiError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::TimedOut => ApiError::Timeout,
            TransportError::Unreachable(reason) => ApiError::NetworkUnreachable(reason),
        }
    }
}

/// Errors from sign-in and sign-out.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The credential could not be written to or removed from the store.
    #[error("Could not update stored credentials: {0}")]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(status: u16) -> ApiError {
        ApiError::ServerRejected {
            status,
            message: None,
        }
    }

    #[test]
    fn test_retry_classification() {
        assert!(ApiError::Timeout.is_retryable());
        assert!(ApiError::NetworkUnreachable("refused".into()).is_retryable());
        assert!(rejected(503).is_retryable());
        assert!(!rejected(404).is_retryable());
        assert!(!ApiError::Unauthorized.is_retryable());
        assert!(ApiError::Unauthorized.requires_reauth());
    }

    #[test]
    fn test_user_facing_messages() {
        let err = ApiError::ServerRejected {
            status: 409,
            message: Some("Item sold out".into()),
        };
        assert_eq!(err.to_string(), "Item sold out");
        assert_eq!(rejected(502).to_string(), "HTTP 502");
    }
}
