//! API client error types

use thiserror::Error;

/// Errors returned by [`crate::PrismaClient`]
///
/// Everything except [`ApiError::Status`] is a local failure. `Status` is the
/// remote API answering with a status code of 400 or above.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("failed to marshal request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to create request: {0}")]
    Build(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to read response body: {0}")]
    ReadBody(#[source] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Prisma API error (status {status}): {message}")]
    Status {
        status: u16,
        message: String,
        body: String,
    },
}

impl ApiError {
    /// HTTP status code of a remote error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body of a remote error
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status_code(), Some(401) | Some(403))
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = ApiError::Status {
            status: 404,
            message: "Not Found".to_string(),
            body: r#"{"error": "resource not found"}"#.to_string(),
        };

        assert_eq!(err.to_string(), "Prisma API error (status 404): Not Found");
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.body(), Some(r#"{"error": "resource not found"}"#));
        assert!(err.is_not_found());
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_decode_error_has_no_status() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let err = ApiError::Decode(json_err);

        assert!(err.to_string().starts_with("failed to decode response"));
        assert_eq!(err.status_code(), None);
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_unauthorized() {
        for status in [401, 403] {
            let err = ApiError::Status {
                status,
                message: String::new(),
                body: String::new(),
            };
            assert!(err.is_unauthorized());
        }
    }
}
