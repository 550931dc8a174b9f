use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Envelope returned by every JSON API route.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let value = serde_json::to_value(ApiResponse::success(3)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "success": true, "data": 3, "message": null })
        );
    }

    #[test]
    fn test_error_envelope_has_no_data() {
        let response: ApiResponse<()> = ApiResponse::error("collection not found");
        assert!(!response.is_success());
        assert!(response.data().is_none());
        assert_eq!(response.message(), Some("collection not found"));
    }
}
