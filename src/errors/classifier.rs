//! Error classification.
//!
//! Maps whatever a data-fetching call failed with onto an [`ApiError`].
//! Known error types are recognized by downcasting (auth and missing token
//! as auth, transport as network, undecodable bodies as server, unbuildable
//! requests as validation); everything else is sorted by keywords in its
//! message. The first matching category wins:
//!
//! ```text
//! auth        authentication, token, unauthorized, 401, 403   retryable
//! network     fetch, network, timeout, connection             retryable
//! validation  validation, invalid, 400                        not retryable
//! server      500, 502, 503, 504                              retryable
//! (none)      server, original message                        retryable
//! ```

use std::error::Error as StdError;
use std::sync::Arc;

use crate::errors::types::{ApiError, AuthenticationError, ErrorKind, FetchError};

const AUTH_KEYWORDS: &[&str] = &["authentication", "token", "unauthorized", "401", "403"];
const NETWORK_KEYWORDS: &[&str] = &["fetch", "network", "timeout", "connection"];
const VALIDATION_KEYWORDS: &[&str] = &["validation", "invalid", "400"];
const SERVER_KEYWORDS: &[&str] = &["500", "502", "503", "504"];

pub const AUTH_MESSAGE: &str = "Your session has expired. Please sign in again.";
pub const NETWORK_MESSAGE: &str = "Unable to reach the server. Please check your connection.";
pub const VALIDATION_MESSAGE: &str = "The request was invalid. Please check your input.";
pub const SERVER_MESSAGE: &str = "The server encountered an error. Please try again later.";
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred.";

/// Classify an error. `None` stands for a failure that carried no error
/// value at all and always yields the non-retryable "unexpected" error.
///
/// Total and deterministic: equal inputs give equal outputs.
pub fn classify(error: Option<&(dyn StdError + 'static)>) -> ApiError {
    let Some(error) = error else {
        return ApiError::new(ErrorKind::Server, UNEXPECTED_MESSAGE, false);
    };

    let status = status_of(error);

    if is_auth_error(error) {
        return ApiError::new(ErrorKind::Auth, AUTH_MESSAGE, true).with_status(status);
    }
    match error.downcast_ref::<FetchError>() {
        Some(FetchError::Network(_)) => {
            return ApiError::new(ErrorKind::Network, NETWORK_MESSAGE, true).with_status(status);
        }
        // A 2xx body of the wrong shape is the backend's fault, not the caller's.
        Some(FetchError::Decode(_)) => {
            return ApiError::new(ErrorKind::Server, SERVER_MESSAGE, true).with_status(status);
        }
        Some(FetchError::Request(_)) | Some(FetchError::InvalidUrl(_)) => {
            return ApiError::new(ErrorKind::Validation, VALIDATION_MESSAGE, false);
        }
        _ => {}
    }

    let message = error.to_string();
    let lowered = message.to_lowercase();
    let contains_any = |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));

    let classified = if contains_any(AUTH_KEYWORDS) {
        ApiError::new(ErrorKind::Auth, AUTH_MESSAGE, true)
    } else if contains_any(NETWORK_KEYWORDS) {
        ApiError::new(ErrorKind::Network, NETWORK_MESSAGE, true)
    } else if contains_any(VALIDATION_KEYWORDS) {
        ApiError::new(ErrorKind::Validation, VALIDATION_MESSAGE, false)
    } else if contains_any(SERVER_KEYWORDS) {
        ApiError::new(ErrorKind::Server, SERVER_MESSAGE, true)
    } else {
        ApiError::new(ErrorKind::Server, message, true)
    };

    classified.with_status(status)
}

/// Classify an owned error and keep it attached for logging.
pub fn handle_api_error<E>(error: E) -> ApiError
where
    E: StdError + Send + Sync + 'static,
{
    let classified = classify(Some(&error));
    classified.with_original(Arc::new(error))
}

fn is_auth_error(error: &(dyn StdError + 'static)) -> bool {
    if error.is::<AuthenticationError>() {
        return true;
    }
    matches!(
        error.downcast_ref::<FetchError>(),
        Some(FetchError::Auth(_)) | Some(FetchError::MissingToken)
    )
}

fn status_of(error: &(dyn StdError + 'static)) -> Option<u16> {
    if let Some(auth) = error.downcast_ref::<AuthenticationError>() {
        return Some(auth.status);
    }
    error.downcast_ref::<FetchError>().and_then(FetchError::status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::types::AuthFailureReason;
    use std::fmt;

    #[derive(Debug)]
    struct Plain(&'static str);

    impl fmt::Display for Plain {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl StdError for Plain {}

    fn classify_message(message: &'static str) -> ApiError {
        classify(Some(&Plain(message)))
    }

    #[test]
    fn test_no_error_value_is_unexpected() {
        let err = classify(None);
        assert_eq!(err.kind, ErrorKind::Server);
        assert_eq!(err.message, UNEXPECTED_MESSAGE);
        assert!(!err.retryable);
    }

    #[test]
    fn test_authentication_error_instance() {
        let err = classify(Some(&AuthenticationError {
            reason: AuthFailureReason::Unauthorized,
            status: 401,
            origin: Some("/orders".to_string()),
        }));
        assert_eq!(err.kind, ErrorKind::Auth);
        assert_eq!(err.status_code, Some(401));
        assert!(err.retryable);

        let err = classify(Some(&FetchError::MissingToken));
        assert_eq!(err.kind, ErrorKind::Auth);
        assert_eq!(err.status_code, None);
    }

    #[test]
    fn test_keyword_categories() {
        let cases = [
            ("Token expired", ErrorKind::Auth, true),
            ("Request returned 403", ErrorKind::Auth, true),
            ("Failed to fetch", ErrorKind::Network, true),
            ("Connection reset by peer", ErrorKind::Network, true),
            ("Validation failed: name is required", ErrorKind::Validation, false),
            ("Invalid product id", ErrorKind::Validation, false),
            ("Request failed with status 400", ErrorKind::Validation, false),
            ("Upstream returned 503", ErrorKind::Server, true),
        ];

        for (message, kind, retryable) in cases {
            let err = classify_message(message);
            assert_eq!(err.kind, kind, "{}", message);
            assert_eq!(err.retryable, retryable, "{}", message);
        }
    }

    #[test]
    fn test_keyword_priority() {
        assert_eq!(classify_message("Unauthorized (500)").kind, ErrorKind::Auth);
        assert_eq!(classify_message("gateway timeout 504").kind, ErrorKind::Network);
        assert_eq!(classify_message("invalid response 502").kind, ErrorKind::Validation);
    }

    #[test]
    fn test_unrecognized_message_keeps_original() {
        let err = classify_message("Product is out of stock");
        assert_eq!(err.kind, ErrorKind::Server);
        assert_eq!(err.message, "Product is out of stock");
        assert!(err.retryable);
    }

    #[test]
    fn test_classification_is_deterministic() {
        for message in ["", "Token expired", "boom", "TIMEOUT", "503"] {
            assert_eq!(classify_message(message), classify_message(message));
        }
        assert_eq!(classify(None), classify(None));
    }

    #[test]
    fn test_decode_error_is_server_side() {
        let err = classify(Some(&FetchError::Decode(
            "invalid type: string \"7\", expected u32 at line 1 column 10".to_string(),
        )));
        assert_eq!(err.kind, ErrorKind::Server);
        assert_eq!(err.message, SERVER_MESSAGE);
        assert!(err.retryable);
    }

    #[test]
    fn test_invalid_url_is_validation() {
        let err = classify(Some(&FetchError::InvalidUrl("http://[::1".to_string())));
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(!err.retryable);
    }

    #[test]
    fn test_status_error_carries_code() {
        let err = classify(Some(&FetchError::Status {
            status: 500,
            message: "Request failed with status 500".to_string(),
        }));
        assert_eq!(err.kind, ErrorKind::Server);
        assert_eq!(err.status_code, Some(500));
        assert_eq!(err.message, SERVER_MESSAGE);

        let err = classify(Some(&FetchError::Status {
            status: 404,
            message: "Order not found".to_string(),
        }));
        assert_eq!(err.kind, ErrorKind::Server);
        assert_eq!(err.message, "Order not found");
        assert_eq!(err.status_code, Some(404));
    }

    #[test]
    fn test_handle_api_error_keeps_original() {
        let err = handle_api_error(FetchError::Decode("expected value".to_string()));
        assert_eq!(err.kind, ErrorKind::Server);
        let original = err.original_error.as_ref().unwrap();
        assert!(original.to_string().contains("expected value"));
    }
}
