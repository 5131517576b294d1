//! HTTP handlers for the `/terms` resource.
//!
//! Request bodies are parsed as untyped JSON first and then validated into
//! the domain payloads, so malformed input never reaches the store and is
//! answered with `422 invalid_input`. Bodies that cannot be read at all keep
//! the status axum assigns them (413 past the body size limit).

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use glossary_core::{
    validate_new_term, validate_term_update, NewTerm, Term, TermUpdate, ValidationError,
};
use metrics::counter;
use serde_json::Value;
use tracing::info;

use crate::problem::{ProblemDetails, ProblemResponse};
use crate::router::AppState;

const REQUESTS_METRIC: &str = "api_terms_requests_total";

#[utoipa::path(
    get, path = "/terms", tag = "terms",
    responses(
        (status = 200, description = "All terms", body = [Term]),
        (status = 500, description = "Store failure", body = ProblemDetails)
    )
)]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Term>>, ProblemResponse> {
    let terms = track("list", state.storage().terms().list().await)?;
    Ok(Json(terms))
}

#[utoipa::path(
    get, path = "/terms/{name}", tag = "terms",
    params(("name" = String, Path, description = "Term name")),
    responses(
        (status = 200, description = "Matching term", body = Term),
        (status = 404, description = "Term not found", body = ProblemDetails)
    )
)]
pub async fn fetch(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Term>, ProblemResponse> {
    let term = track("get", state.storage().terms().fetch_by_name(&name).await)?;
    Ok(Json(term))
}

#[utoipa::path(
    post, path = "/terms", tag = "terms",
    request_body = NewTerm,
    responses(
        (status = 201, description = "Term created", body = Term),
        (status = 400, description = "Term already exists", body = ProblemDetails),
        (status = 422, description = "Invalid payload", body = ProblemDetails)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Term>), ProblemResponse> {
    let new_term = parse_payload("create", payload, validate_new_term)?;
    let term = track("create", state.storage().terms().create(&new_term).await)?;

    info!(stage = "api", term = %term.name, id = term.id, "term created");
    Ok((StatusCode::CREATED, Json(term)))
}

#[utoipa::path(
    put, path = "/terms/{name}", tag = "terms",
    params(("name" = String, Path, description = "Term name")),
    request_body = TermUpdate,
    responses(
        (status = 200, description = "Description updated", body = Term),
        (status = 404, description = "Term not found", body = ProblemDetails),
        (status = 422, description = "Invalid payload", body = ProblemDetails)
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Term>, ProblemResponse> {
    let update = parse_payload("update", payload, validate_term_update)?;
    let term = track(
        "update",
        state
            .storage()
            .terms()
            .update_description(&name, &update)
            .await,
    )?;

    info!(stage = "api", term = %term.name, id = term.id, "term description updated");
    Ok(Json(term))
}

#[utoipa::path(
    delete, path = "/terms/{name}", tag = "terms",
    params(("name" = String, Path, description = "Term name")),
    responses(
        (status = 204, description = "Term deleted"),
        (status = 404, description = "Term not found", body = ProblemDetails)
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ProblemResponse> {
    track("delete", state.storage().terms().delete(&name).await)?;

    info!(stage = "api", term = %name, "term deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn parse_payload<T>(
    op: &'static str,
    payload: Result<Json<Value>, JsonRejection>,
    validate: fn(&Value) -> Result<T, ValidationError>,
) -> Result<T, ProblemResponse> {
    let parsed = payload
        .map_err(ProblemResponse::from)
        .and_then(|Json(value)| validate(&value).map_err(ProblemResponse::from));
    track(op, parsed)
}

/// Records the outcome of a term operation and converts storage errors into
/// problem responses.
fn track<T, E>(op: &'static str, result: Result<T, E>) -> Result<T, ProblemResponse>
where
    E: Into<ProblemResponse>,
{
    let result = result.map_err(Into::into);
    let label = match &result {
        Ok(_) => "ok",
        Err(problem) => problem.metric_label(),
    };
    counter!(REQUESTS_METRIC, "op" => op, "result" => label).increment(1);
    result
}
