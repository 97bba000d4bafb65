use async_graphql::ErrorExtensions;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rusqlite::ffi;

/// Which entity an operation could not find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Athlete,
    Coach,
    Post,
    Feedback,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Entity::User => "user",
            Entity::Athlete => "athlete",
            Entity::Coach => "coach",
            Entity::Post => "post",
            Entity::Feedback => "feedback",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0} {1} not found")]
    NotFound(Entity, i64),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Referenced record does not exist: {0}")]
    ForeignKeyViolation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Insufficient coins: {needed} required, {available} available")]
    InsufficientFunds { needed: i64, available: i64 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Role mismatch: {0}")]
    RoleMismatch(String),

    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Credential error: {0}")]
    Credential(#[from] bcrypt::BcryptError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code, exposed as the GraphQL `code` extension.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(..) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::ForeignKeyViolation(_) => "FOREIGN_KEY_VIOLATION",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            AppError::Validation(_) => "VALIDATION",
            AppError::RoleMismatch(_) => "ROLE_MISMATCH",
            AppError::Database(_)
            | AppError::Pool(_)
            | AppError::Credential(_)
            | AppError::Internal(_) => "INTERNAL",
        }
    }

    fn is_internal(&self) -> bool {
        self.code() == "INTERNAL"
    }

    /// Message safe to show a caller; storage details stay in the logs.
    fn public_message(&self) -> String {
        if self.is_internal() {
            tracing::error!("{}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

// Constraint violations become domain errors, everything else stays a storage error
impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, ref message) = err {
            let detail = message
                .clone()
                .unwrap_or_else(|| "constraint failed".to_string());
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return AppError::Conflict(detail)
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return AppError::ForeignKeyViolation(detail)
                }
                ffi::SQLITE_CONSTRAINT_CHECK | ffi::SQLITE_CONSTRAINT_NOTNULL => {
                    return AppError::Validation(detail)
                }
                _ => {}
            }
        }
        AppError::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::InvalidState(_) => StatusCode::CONFLICT,
            AppError::ForeignKeyViolation(_) | AppError::Validation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::RoleMismatch(_) => StatusCode::BAD_REQUEST,
            AppError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
            AppError::Database(_)
            | AppError::Pool(_)
            | AppError::Credential(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.public_message()).into_response()
    }
}

impl ErrorExtensions for AppError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.code();
        async_graphql::Error::new(self.public_message())
            .extend_with(|_, e| e.set("code", code.to_string()))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn response_status(err: AppError) -> StatusCode {
        let response = err.into_response();
        response.status()
    }

    fn constraint_error(extended_code: i32, message: &str) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            ffi::Error::new(extended_code),
            Some(message.to_string()),
        )
    }

    #[test]
    fn not_found_returns_404() {
        assert_eq!(
            response_status(AppError::NotFound(Entity::Feedback, 1)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn insufficient_funds_returns_402() {
        assert_eq!(
            response_status(AppError::InsufficientFunds {
                needed: 50,
                available: 10
            }),
            StatusCode::PAYMENT_REQUIRED
        );
    }

    #[test]
    fn internal_returns_500() {
        assert_eq!(
            response_status(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let err: AppError =
            constraint_error(ffi::SQLITE_CONSTRAINT_UNIQUE, "UNIQUE constraint failed: users.email")
                .into();
        assert!(matches!(err, AppError::Conflict(ref m) if m.contains("users.email")));
    }

    #[test]
    fn foreign_key_violation_is_translated() {
        let err: AppError =
            constraint_error(ffi::SQLITE_CONSTRAINT_FOREIGNKEY, "FOREIGN KEY constraint failed")
                .into();
        assert_eq!(err.code(), "FOREIGN_KEY_VIOLATION");
    }

    #[test]
    fn other_sqlite_errors_stay_internal() {
        let err: AppError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(err.code(), "INTERNAL");
    }

    #[test]
    fn graphql_error_carries_code_extension() {
        let gql = AppError::InvalidState("feedback 3 is accepted".into()).extend();
        let code = gql
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .cloned();
        assert_eq!(code, Some(async_graphql::Value::from("INVALID_STATE".to_string())));
    }

    #[test]
    fn graphql_error_hides_internal_details() {
        let gql = AppError::Internal("disk on fire".into()).extend();
        assert_eq!(gql.message, "Internal server error");
    }
}
