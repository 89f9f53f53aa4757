//! ============================================================================
//! Errors - What a client action can fail with
//! ============================================================================
//! Nothing here is retried. Callers show the message to the user and stop.
//! ============================================================================

use thiserror::Error;

/// Failure of a single backend call or of the local checks before it
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401 from the backend. Stored tokens are already cleared.
    #[error("Session expired. Please log in again.")]
    Unauthorized,

    /// Non-success status with the backend-supplied message
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// Blocked locally before any request was sent
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Token storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Build an HTTP error from a response body, preferring the backend's
    /// `message`, then `detail`, then `error` field.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["message", "detail", "error"]
                    .iter()
                    .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
            })
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    format!("Request failed with status {}", status)
                } else {
                    trimmed.to_string()
                }
            });

        ApiError::Http { status, message }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Client-side form checks that block submission
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("At least one split is required")]
    NoSplits,

    #[error("Please fill all fields for split {index}")]
    IncompleteSplit { index: usize },

    #[error("Split {index} has an invalid quantity")]
    InvalidSplitQuantity { index: usize },

    #[error("Total split quantity ({total} kg) cannot exceed parent batch quantity ({parent} kg)")]
    SplitExceedsParent { total: String, parent: String },

    #[error("Total split quantity ({total} kg) must exactly match parent batch quantity ({parent} kg)")]
    SplitMismatch { total: String, parent: String },

    #[error("Please select a {0}")]
    MissingSelection(&'static str),

    #[error("{field} must be a non-negative number")]
    InvalidAmount { field: &'static str },

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Please fill all required fields")]
    RequiredFields,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("{field} must be a date in YYYY-MM-DD format")]
    InvalidDate { field: &'static str },

    #[error("Please enter a valid quantity greater than 0")]
    InvalidQuantity,

    #[error("Cannot sell more than available ({available} kg)")]
    ExceedsAvailable { available: String },

    #[error("Cannot read report file {path}: {reason}")]
    ReportFile { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_field_preferred() {
        let err = ApiError::from_response(400, r#"{"success": false, "message": "Batch not found"}"#);
        assert_eq!(err.to_string(), "Batch not found");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_detail_fallback() {
        let err = ApiError::from_response(403, r#"{"detail": "You do not have permission."}"#);
        assert_eq!(err.to_string(), "You do not have permission.");
    }

    #[test]
    fn test_plain_body_fallback() {
        let err = ApiError::from_response(502, "Bad Gateway");
        assert_eq!(err.to_string(), "Bad Gateway");

        let err = ApiError::from_response(500, "");
        assert_eq!(err.to_string(), "Request failed with status 500");
    }

    #[test]
    fn test_validation_passthrough() {
        let err: ApiError = ValidationError::IncompleteSplit { index: 2 }.into();
        assert_eq!(err.to_string(), "Please fill all fields for split 2");
        assert!(!err.is_unauthorized());
    }
}
