use async_graphql::ErrorExtensions;

/// Domain errors surfaced through the GraphQL boundary. Each variant carries a
/// machine-readable `code` extension; validation errors additionally carry the
/// offending argument name so the UI can highlight the field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    InputValidation {
        message: String,
        field: Option<String>,
    },

    #[error("You must be logged in")]
    Authentication,

    #[error("You are not allowed to perform this action")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Something went wrong")]
    Unknown,
}

impl ApiError {
    pub fn input(message: impl Into<String>) -> Self {
        ApiError::InputValidation {
            message: message.into(),
            field: None,
        }
    }

    pub fn input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        ApiError::InputValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InputValidation { .. } => "BAD_USER_INPUT",
            ApiError::Authentication => "UNAUTHENTICATED",
            ApiError::Forbidden => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unknown => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| {
            e.set("code", self.code());
            if let ApiError::InputValidation {
                field: Some(field), ..
            } = self
            {
                e.set("field", field.as_str());
            }
        })
    }
}

impl From<r2d2::Error> for ApiError {
    fn from(err: r2d2::Error) -> Self {
        tracing::error!("Pool error: {}", err);
        ApiError::Unknown
    }
}

/// Translate storage errors at the controller boundary. Uniqueness violations
/// on known constraints become conflicts; everything else is logged and
/// surfaced as a generic error that never exposes storage internals.
pub fn translate_db_error(err: rusqlite::Error) -> ApiError {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(msg))
            if e.code == rusqlite::ErrorCode::ConstraintViolation && msg.contains("UNIQUE") =>
        {
            if msg.contains("users.username") {
                ApiError::Conflict("Username is already taken".to_string())
            } else if msg.contains("communities.name") {
                ApiError::Conflict("Community name is already taken".to_string())
            } else {
                ApiError::Conflict("Already exists".to_string())
            }
        }
        other => {
            tracing::error!("Database error: {}", other);
            ApiError::Unknown
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
