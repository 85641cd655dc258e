//! Degraded-but-non-throwing response shapes.
//!
//! Every data-fetching operation hands UI code a [`SafeApiResponse`]; a
//! failure becomes `success: false` plus the caller's default payload
//! instead of an error the renderer would have to handle.

use serde::{Deserialize, Serialize};

use crate::errors::types::ApiError;

/// Uniform result shape for UI consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<ApiError>,
}

impl<T> SafeApiResponse<T> {
    /// Successful response carrying real data.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Wrap a default payload and an optional classified error into the
/// failure shape. `data` is exactly `default_value`.
pub fn create_safe_api_response<T>(default_value: T, error: Option<ApiError>) -> SafeApiResponse<T> {
    SafeApiResponse {
        success: false,
        data: default_value,
        error,
    }
}

/// Page metadata as returned by list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// A page of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    /// Empty page with pagination zeroed out.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            pagination: Pagination::default(),
        }
    }
}

impl<T> Default for Paginated<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::types::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_safe_response_keeps_default_value() {
        let default = json!({ "orders": [], "pagination": { "page": 0, "total": 0 } });
        let err = ApiError::new(ErrorKind::Auth, "expired", true).with_status(Some(401));

        let response = create_safe_api_response(default.clone(), Some(err.clone()));
        assert!(!response.success);
        assert_eq!(response.data, default);
        assert_eq!(response.error, Some(err));

        let response = create_safe_api_response(default.clone(), None);
        assert!(!response.is_success());
        assert_eq!(response.data, default);
        assert!(response.error.is_none());
    }

    #[test]
    fn test_empty_page_shape() {
        let response = create_safe_api_response(
            Paginated::<String>::empty(),
            Some(ApiError::new(ErrorKind::Network, "offline", true)),
        );
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "success": false,
                "data": {
                    "data": [],
                    "pagination": { "page": 0, "limit": 0, "total": 0, "totalPages": 0 }
                },
                "error": { "type": "network", "message": "offline", "retryable": true }
            })
        );
    }

    #[test]
    fn test_page_parses_without_pagination() {
        let page: Paginated<u32> = serde_json::from_value(json!({ "data": [1, 2, 3] })).unwrap();
        assert_eq!(page.data, vec![1, 2, 3]);
        assert_eq!(page.pagination, Pagination::default());
    }
}
