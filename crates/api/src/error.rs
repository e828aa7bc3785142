use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tradepulse_core::llm::error::LlmDiagnosticsError;

const OPAQUE_MESSAGE: &str = "see server logs";

#[derive(Debug)]
pub enum ApiError {
    /// 400, caller input is unusable.
    BadRequest(&'static str),

    /// 500, news provider answered with a non-success status.
    NewsUpstream(u16),

    /// 500, the summary model call failed.
    SummaryFailed(String),

    /// 503, a backing store is not configured.
    Unavailable(&'static str),

    /// 500, anything else.
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
}

impl ApiError {
    pub fn internal(err: anyhow::Error, expose_details: bool) -> Self {
        ApiError::Internal(report(&err, "request failed", expose_details))
    }

    pub fn summary_failed(err: anyhow::Error, expose_details: bool) -> Self {
        ApiError::SummaryFailed(report(&err, "week summary model call failed", expose_details))
    }
}

/// Logs and captures `err`, returning the text the caller gets to see. Raw error
/// text leaves the process only when `expose_details` is set; otherwise the
/// caller gets the Sentry event id to quote.
fn report(err: &anyhow::Error, what: &'static str, expose_details: bool) -> String {
    let event_id = sentry_anyhow::capture_anyhow(err);
    tracing::error!(
        error = %format!("{err:#}"),
        raw_output = LlmDiagnosticsError::raw_output_of(err).unwrap_or(""),
        %event_id,
        "{what}"
    );

    if expose_details {
        format!("{err:#}")
    } else if event_id.is_nil() {
        OPAQUE_MESSAGE.to_string()
    } else {
        format!("reference {event_id}")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(error) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error,
                    message: None,
                    status_code: None,
                },
            ),
            ApiError::NewsUpstream(code) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "Failed to fetch news",
                    message: None,
                    status_code: Some(code),
                },
            ),
            ApiError::SummaryFailed(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "Failed to generate summary",
                    message: Some(message),
                    status_code: None,
                },
            ),
            ApiError::Unavailable(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    error: "Service unavailable",
                    message: Some(message.to_string()),
                    status_code: None,
                },
            ),
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "Internal server error",
                    message: Some(message),
                    status_code: None,
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}
