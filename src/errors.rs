use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error; // Use thiserror for cleaner error definitions

pub const RESOLVE_FAILED_MESSAGE: &str = "Failed to fetch meme";
pub const RESOLVE_FAILED_DETAILS: &str = "All meme APIs are currently unavailable";

// --- Upstream/Resolver Errors ---

/// One upstream source failed to produce a usable record (a "miss").
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream responded with status {0}")]
    Status(reqwest::StatusCode),

    #[error("could not decode upstream payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unusable upstream payload: {0}")]
    Unusable(String),
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Failed to fetch meme")]
    Exhausted { details: Option<String> },
}

// --- Viewer Errors ---

/// The call from the viewer to the resolver endpoint failed.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Failed to fetch meme. Try again. ({0})")]
    Transport(#[from] reqwest::Error),

    #[error("{error}")]
    Rejected {
        status: u16,
        error: String,
        details: Option<String>,
    },
}

/// Download/share failures. Reported to the user, never fatal.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("No meme selected")]
    NothingSelected,

    #[error("Download failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Download failed: image server responded with status {0}")]
    Status(reqwest::StatusCode),

    #[error("Could not save image: {0}")]
    Io(#[from] std::io::Error),

    #[error("Share failed: {0}")]
    Share(String),

    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),
}

// --- Web Layer Error ---

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    // Configuration / Startup errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Initialization error: {0}")]
    InitError(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<crate::config::ConfigError> for AppError {
    fn from(err: crate::config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

// --- Axum Response Implementation ---

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Resolve(ResolveError::Exhausted { details }) => {
                let details = details.as_deref().unwrap_or(RESOLVE_FAILED_DETAILS);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": RESOLVE_FAILED_MESSAGE, "details": details }),
                )
            }
            AppError::ConfigError(msg) | AppError::InitError(msg) => {
                tracing::error!("Server setup error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "Server configuration error" }),
                )
            }
            AppError::Io(e) => {
                tracing::error!(error = %e, "I/O error while serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "An internal server error occurred" }),
                )
            }
        };

        tracing::error!(error.status = %status, error.detail = %self, "Responding with error");

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn exhausted_maps_to_error_body_with_details() {
        let err = AppError::from(ResolveError::Exhausted {
            details: Some("imgflip: upstream responded with status 503".into()),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], RESOLVE_FAILED_MESSAGE);
        assert_eq!(body["details"], "imgflip: upstream responded with status 503");
        assert!(body.get("image").is_none());
    }

    #[tokio::test]
    async fn exhausted_without_details_uses_generic_text() {
        let response = AppError::from(ResolveError::Exhausted { details: None }).into_response();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["details"], RESOLVE_FAILED_DETAILS);
    }
}
