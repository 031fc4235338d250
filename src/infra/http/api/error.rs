use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::application::accounts::AccountError;
use crate::application::auth::AuthError;
use crate::application::catalog::CatalogError;
use crate::application::error::ErrorReport;
use crate::application::listings::ListingError;
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

/// JSON error body. `code` repeats the HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub message: String,
    pub request_id: String,
    pub code: u16,
}

impl ErrorEnvelope {
    pub fn with_request_id(mut self, request_id: &str) -> Self {
        self.request_id = request_id.to_string();
        self
    }
}

/// Machine-readable kinds recorded in the error report.
pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const VALIDATION: &str = "validation";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const FORBIDDEN: &str = "forbidden";
    pub const NOT_FOUND: &str = "not_found";
    pub const CONFLICT: &str = "conflict";
    pub const DUPLICATE: &str = "duplicate";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const INTEGRITY: &str = "integrity_error";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const TIMEOUT: &str = "timeout";
    pub const REPO: &str = "repo_error";
    pub const SIGNING: &str = "signing_error";
    pub const PASSWORD: &str = "password_error";
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    detail: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: impl Into<String>,
        detail: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            detail,
        }
    }

    pub fn bad_request(message: impl Into<String>, detail: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, detail)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn timeout(limit: Duration) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::TIMEOUT,
            "request timed out",
            Some(format!("exceeded {} ms", limit.as_millis())),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = ErrorEnvelope {
            message: self.message.clone(),
            request_id: String::new(),
            code: self.status.as_u16(),
        };
        let mut response = (self.status, Json(envelope.clone())).into_response();
        response.extensions_mut().insert(envelope);
        ErrorReport::from_message(
            "infra::http::api",
            self.status,
            format!(
                "{}: {}",
                self.code,
                self.detail.as_deref().unwrap_or(&self.message)
            ),
        )
        .attach(&mut response);
        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Signing(_) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::SIGNING,
                "failed to issue token",
                Some(err.to_string()),
            ),
            AuthError::InsufficientRole { .. } => ApiError::new(
                StatusCode::UNAUTHORIZED,
                codes::FORBIDDEN,
                "insufficient role",
                Some(err.to_string()),
            ),
            AuthError::Missing => ApiError::new(
                StatusCode::UNAUTHORIZED,
                codes::UNAUTHORIZED,
                "invalid token",
                Some(err.to_string()),
            ),
            _ => ApiError::new(
                StatusCode::UNAUTHORIZED,
                codes::UNAUTHORIZED,
                "bad token",
                Some(err.to_string()),
            ),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let detail = Some(err.to_string());
        match err {
            DomainError::NotFound { entity } => ApiError::new(
                StatusCode::NOT_FOUND,
                codes::NOT_FOUND,
                format!("{entity} not found"),
                detail,
            ),
            DomainError::Validation { field, message } => ApiError::new(
                StatusCode::BAD_REQUEST,
                codes::VALIDATION,
                format!("field {field} {message}"),
                detail,
            ),
            DomainError::Conflict { message } => {
                ApiError::new(StatusCode::CONFLICT, codes::CONFLICT, message, detail)
            }
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate { constraint } => ApiError::new(
                StatusCode::CONFLICT,
                codes::DUPLICATE,
                "duplicate record",
                Some(constraint),
            ),
            RepoError::NotFound => ApiError::not_found("resource not found"),
            RepoError::InvalidInput { message } => ApiError::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_INPUT,
                "invalid input",
                Some(message),
            ),
            RepoError::Integrity { message } => ApiError::new(
                StatusCode::CONFLICT,
                codes::INTEGRITY,
                "integrity constraint violated",
                Some(message),
            ),
            RepoError::Timeout => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::DB_TIMEOUT,
                "database timeout",
                None,
            ),
            RepoError::Persistence(message) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::REPO,
                "persistence error",
                Some(message),
            ),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Domain(domain) => domain.into(),
            CatalogError::Repo(repo) => repo.into(),
            CatalogError::Listing(ListingError::Fetch { source, .. }) => source.into(),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Domain(domain) => domain.into(),
            AccountError::EmailTaken => ApiError::new(
                StatusCode::CONFLICT,
                codes::DUPLICATE,
                "user with this email already exists",
                None,
            ),
            AccountError::InvalidCredentials => ApiError::new(
                StatusCode::UNAUTHORIZED,
                codes::UNAUTHORIZED,
                "invalid credentials",
                None,
            ),
            AccountError::Auth(auth) => auth.into(),
            AccountError::Password(password) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::PASSWORD,
                "failed to process password",
                Some(password.to_string()),
            ),
            AccountError::Repo(repo) => repo.into(),
        }
    }
}
