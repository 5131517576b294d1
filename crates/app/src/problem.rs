use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use glossary_core::ValidationError;
use glossary_storage::TermError;

/// Error document returned with `application/problem+json`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProblemDetails {
    /// Machine readable code such as `term_not_found`.
    #[serde(rename = "type")]
    #[schema(example = "term_not_found")]
    problem_type: &'static str,
    #[schema(example = "Not Found")]
    title: &'static str,
    #[schema(example = "Term not found")]
    detail: String,
}

/// RFC 7807 error body returned by every failing endpoint.
#[derive(Debug)]
pub struct ProblemResponse {
    status: StatusCode,
    body: ProblemDetails,
}

impl ProblemResponse {
    pub fn new<S: Into<String>>(status: StatusCode, problem_type: &'static str, detail: S) -> Self {
        Self {
            status,
            body: ProblemDetails {
                problem_type,
                title: status.canonical_reason().unwrap_or("error"),
                detail: detail.into(),
            },
        }
    }

    pub fn invalid_input<S: Into<String>>(detail: S) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "invalid_input", detail)
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Short label used for the `result` dimension of request counters.
    pub fn metric_label(&self) -> &'static str {
        match self.body.problem_type {
            "term_not_found" => "not_found",
            "term_exists" => "duplicate",
            "invalid_input" | "invalid_body" => "invalid",
            _ => "error",
        }
    }
}

impl From<TermError> for ProblemResponse {
    fn from(err: TermError) -> Self {
        match err {
            TermError::NotFound => {
                Self::new(StatusCode::NOT_FOUND, "term_not_found", "Term not found")
            }
            // 400 rather than 409 keeps the established API contract.
            TermError::Duplicate => {
                Self::new(StatusCode::BAD_REQUEST, "term_exists", "Term already exists")
            }
            TermError::Database(err) => {
                error!(stage = "storage", error = %err, "term query failed");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    "failed to access the term store",
                )
            }
        }
    }
}

impl From<ValidationError> for ProblemResponse {
    fn from(err: ValidationError) -> Self {
        Self::invalid_input(err.to_string())
    }
}

impl From<JsonRejection> for ProblemResponse {
    fn from(rejection: JsonRejection) -> Self {
        match &rejection {
            // Body could not be read at all (e.g. over the size limit); keep axum's status.
            JsonRejection::BytesRejection(_) => {
                Self::new(rejection.status(), "invalid_body", rejection.body_text())
            }
            _ => Self::invalid_input(rejection.body_text()),
        }
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let mut response = Json(self.body).into_response();
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}
