use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::error::{Error, Result as StoreResult};
use crate::types::Tier;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }
}

/// Remediation data attached to quota errors.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuotaDetails {
    pub tier: Tier,
    pub count: i64,
    pub limit: i64,
}

/// API error that converts to a proper HTTP response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub quota: Option<QuotaDetails>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            quota: None,
        }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    #[must_use]
    pub fn quota_exceeded(tier: Tier, count: i64, limit: i64) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: format!(
                "Content limit reached: {count} of {limit} items on the {tier} tier. Upgrade to upload more."
            ),
            quota: Some(QuotaDetails { tier, count, limit }),
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::NotFound => ApiError::not_found("Not found"),
            Error::AlreadyExists => ApiError::conflict("Already exists"),
            Error::Unauthorized => ApiError::unauthorized("Invalid credentials"),
            Error::InvalidTokenFormat => ApiError::unauthorized("Invalid token"),
            Error::TokenExpired => ApiError::unauthorized("Token expired"),
            Error::Forbidden => ApiError::forbidden("Not permitted"),
            Error::Validation(message) => ApiError::bad_request(message),
            Error::QuotaExceeded { tier, count, limit } => {
                ApiError::quota_exceeded(tier, count, limit)
            }
            e @ (Error::Database(_)
            | Error::Io(_)
            | Error::Config(_)
            | Error::Storage(_)
            | Error::TokenLookupCollision) => {
                tracing::error!("Internal error: {e}");
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.quota {
            Some(q) => json!({
                "data": null,
                "error": self.message,
                "tier": q.tier,
                "count": q.count,
                "limit": q.limit,
            }),
            None => json!({ "data": null, "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

/// Extension trait for converting store results to API errors.
///
/// Expected outcomes (not found, conflicts, validation, quota) keep their
/// own status. Anything unexpected becomes a 500 with `message`.
pub trait StoreResultExt<T> {
    fn api_err(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreResultExt<T> for StoreResult<T> {
    fn api_err(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| match e {
            Error::Database(_) | Error::Io(_) | Error::Config(_) | Error::Storage(_) => {
                tracing::error!("{message}: {e}");
                ApiError::internal(message)
            }
            e => ApiError::from(e),
        })
    }
}

/// Extension for Option types from store operations.
pub trait StoreOptionExt<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreOptionExt<T> for Option<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::not_found(message))
    }
}

/// Maps `NotFound` to a resource-specific message.
pub trait NotFoundExt<T> {
    fn not_found_as(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> NotFoundExt<T> for StoreResult<T> {
    fn not_found_as(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| match e {
            Error::NotFound => ApiError::not_found(message),
            e => ApiError::from(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        assert_eq!(ApiError::from(Error::NotFound).status, StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(Error::AlreadyExists).status, StatusCode::CONFLICT);
        assert_eq!(ApiError::from(Error::Forbidden).status, StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::from(Error::Validation("title is required".into())).message,
            "title is required"
        );

        let internal = ApiError::from(Error::Storage("disk on fire".into()));
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!internal.message.contains("disk"));
    }

    #[test]
    fn test_quota_error_carries_details() {
        let err = ApiError::from(Error::QuotaExceeded {
            tier: Tier::Free,
            count: 20,
            limit: 20,
        });
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        let quota = err.quota.unwrap();
        assert_eq!(quota.count, 20);
        assert_eq!(quota.limit, 20);
    }

    #[test]
    fn test_not_found_as() {
        let result: StoreResult<()> = Err(Error::NotFound);
        let err = result.not_found_as("Story not found").unwrap_err();
        assert_eq!(err.message, "Story not found");
    }
}
