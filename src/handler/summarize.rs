use crate::app::AppState;
use crate::domain::ArticleRequest;
use crate::error::SummarizerError;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn status_for(err: &SummarizerError) -> StatusCode {
    match err {
        SummarizerError::InvalidArticle(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SummarizerError::Inference(_) => StatusCode::BAD_GATEWAY,
        SummarizerError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
        SummarizerError::Persistence { .. }
        | SummarizerError::Store(_)
        | SummarizerError::Config(_)
        | SummarizerError::Bind { .. }
        | SummarizerError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Handler for POST /summarize
///
/// Body is a JSON array of articles; the response is the array of summaries
/// in the same order.
pub async fn summarize_handler(
    State(state): State<AppState>,
    payload: Result<Json<Vec<ArticleRequest>>, JsonRejection>,
) -> Response {
    let articles = match payload {
        Ok(Json(articles)) => articles,
        Err(rejection) => {
            warn!("Rejected summarize request: {}", rejection.body_text());
            return error_response(rejection.status(), rejection.body_text());
        }
    };
    info!("Received summarize request with {} articles", articles.len());

    match state.correlator.summarize(&articles).await {
        Ok(summaries) => (StatusCode::OK, Json(summaries)).into_response(),
        Err(e) => {
            error!("Summarize request failed: {e}");
            error_response(status_for(&e), e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&SummarizerError::Inference("x".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&SummarizerError::Connection("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&SummarizerError::Persistence {
                written: 1,
                total: 2,
                message: "x".into()
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&SummarizerError::InvalidArticle("x".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
