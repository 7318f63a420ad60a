//! Boundary error type: every failure a handler can produce, folded into one
//! `{"detail": ...}` response.

use std::any::Any;

use axum::Json;
use axum::extract::rejection::{FormRejection, JsonRejection, QueryRejection};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use stockroom_auth::{AccountError, TokenError};
use stockroom_core::{FieldViolation, ValidationErrors};
use stockroom_products::CatalogError;

const INTERNAL_ERROR: &str = "Internal Server Error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("email already registered")]
    DuplicateIdentity,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token rejected: {0}")]
    TokenInvalid(&'static str),

    #[error(transparent)]
    Validation(ValidationErrors),

    #[error("invalid product id")]
    InvalidId,

    #[error("product not found")]
    ProductNotFound,

    #[error("account not found")]
    AccountNotFound,

    #[error("access to this product is forbidden")]
    Forbidden,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Unhandled(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::DuplicateIdentity | Self::InvalidId => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::TokenInvalid(_) => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ProductNotFound | Self::AccountNotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unhandled(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn challenges(&self) -> bool {
        matches!(self, Self::InvalidCredentials | Self::TokenInvalid(_))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            Self::DuplicateIdentity => json!("Email already registered"),
            Self::InvalidCredentials => json!("Invalid credentials"),
            Self::TokenInvalid(detail) => json!(detail),
            Self::Validation(errors) => json!(errors),
            Self::InvalidId => json!("Invalid product id"),
            Self::ProductNotFound => json!("Product not found"),
            Self::AccountNotFound => json!("User not found"),
            Self::Forbidden => json!("Access to this product is forbidden"),
            Self::Unavailable(reason) => {
                tracing::warn!(%reason, "store unavailable");
                json!("Database connection failed")
            }
            Self::Unhandled(err) => {
                tracing::error!(error = ?err, "unhandled error");
                json!(INTERNAL_ERROR)
            }
        };

        let body = Json(json!({ "detail": detail }));
        if self.challenges() {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<TokenError> for ApiError {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::MissingCredentials => Self::TokenInvalid("Not authenticated"),
            TokenError::MissingSubject => Self::TokenInvalid("Token payload invalid"),
            TokenError::Malformed
            | TokenError::BadSignature
            | TokenError::InvalidSubject
            | TokenError::Window(_) => Self::TokenInvalid("Invalid token or expired token"),
            // Issuing-side failures are server faults, not caller faults.
            TokenError::InvalidTtl | TokenError::Signing(_) => Self::Unhandled(value.into()),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(value: AccountError) -> Self {
        match value {
            AccountError::Validation(errors) => Self::Validation(errors),
            AccountError::DuplicateIdentity => Self::DuplicateIdentity,
            AccountError::InvalidCredentials => Self::InvalidCredentials,
            other => Self::Unhandled(other.into()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::Validation(errors) => Self::Validation(errors),
            CatalogError::NotFound => Self::ProductNotFound,
            CatalogError::Forbidden => Self::Forbidden,
            CatalogError::Store(e) => Self::Unhandled(e.into()),
        }
    }
}

fn malformed_input(location: &str, msg: String) -> ApiError {
    ApiError::Validation(ValidationErrors::single(FieldViolation {
        loc: vec![location.to_string()],
        msg,
        kind: "value_error".to_string(),
    }))
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        malformed_input("body", value.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(value: FormRejection) -> Self {
        malformed_input("body", value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        malformed_input("query", value.body_text())
    }
}

/// Response for a handler that panicked; used by `CatchPanicLayer`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    ApiError::Unhandled(anyhow::anyhow!("handler panicked: {message}")).into_response()
}
