use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("movie {0} not found")]
    NotFound(String),

    #[error("\"{0}\" is already in your list")]
    Conflict(String),

    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("the movie database could not be reached: {0}")]
    Upstream(#[source] reqwest::Error),

    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream(err)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Upstream(_) => {
                "The movie database could not be reached. Please try again in a moment.".to_string()
            },
            AppError::Database(_) | AppError::Internal(_) => "Something went wrong.".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
            },
            AppError::Upstream(_) => tracing::warn!(error = %self, "upstream request failed"),
            _ => tracing::debug!(error = %self, "request rejected"),
        }

        let retryable = matches!(self, AppError::Upstream(_));
        let body = crate::templates::error_page(status, &self.user_message(), retryable);
        (status, Html(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
