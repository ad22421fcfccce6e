use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nongjeong_core::NongjeongError;
use nongjeong_core::sites::SOURCE_KEYS_MESSAGE;
use serde_json::json;

/// Error rendered as `{ "error": "<message>" }`.
#[derive(Debug)]
pub enum ApiError {
    /// The caller asked for something that does not exist.
    BadRequest(String),
    /// A news site or feed could not be scraped.
    Upstream(String),
    Internal(String),
}

impl ApiError {
    pub fn unknown_source() -> Self {
        ApiError::BadRequest(SOURCE_KEYS_MESSAGE.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(message) | ApiError::Upstream(message) | ApiError::Internal(message) => message,
        }
    }
}

impl From<NongjeongError> for ApiError {
    fn from(err: NongjeongError) -> Self {
        match err {
            NongjeongError::UnknownSource(_) => ApiError::unknown_source(),
            NongjeongError::InvalidUrl(_) | NongjeongError::HtmlParse(_) => ApiError::Internal(err.to_string()),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(%status, error = self.message(), "request failed");
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nongjeong_core::Source;

    #[test]
    fn test_error_mapping() {
        let failure = NongjeongError::SiteFailure { site: Source::Nongmin, message: "down".to_string() };
        assert_eq!(ApiError::from(failure).status(), StatusCode::BAD_GATEWAY);

        let unknown = ApiError::from(NongjeongError::UnknownSource("x".to_string()));
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
        assert_eq!(unknown.message(), SOURCE_KEYS_MESSAGE);

        let bad_url = ApiError::from(NongjeongError::InvalidUrl("::".to_string()));
        assert_eq!(bad_url.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
