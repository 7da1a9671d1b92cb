use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::term::{CreateTermRequest, TermResponse},
    error::AppError,
    services::term_service,
    state::SharedState,
};

/// Term catalogue endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/jank/terms", get(list_terms).post(create_term))
        .route("/api/jank/terms/{id}", delete(delete_term))
}

/// List every catalogued term.
#[utoipa::path(
    get,
    path = "/api/jank/terms",
    tag = "terms",
    responses((status = 200, description = "Catalogued terms", body = [TermResponse]))
)]
pub async fn list_terms(
    State(state): State<SharedState>,
) -> Result<Json<Vec<TermResponse>>, AppError> {
    Ok(Json(term_service::list_terms(&state).await?))
}

/// Add a term to the catalogue.
#[utoipa::path(
    post,
    path = "/api/jank/terms",
    tag = "terms",
    request_body = CreateTermRequest,
    responses(
        (status = 200, description = "Term added, or the existing entry for the same value", body = TermResponse),
        (status = 400, description = "Invalid term value")
    )
)]
pub async fn create_term(
    State(state): State<SharedState>,
    Json(payload): Json<CreateTermRequest>,
) -> Result<Json<TermResponse>, AppError> {
    payload.validate()?;
    Ok(Json(term_service::add_term(&state, payload).await?))
}

/// Remove a term from the catalogue.
#[utoipa::path(
    delete,
    path = "/api/jank/terms/{id}",
    tag = "terms",
    params(("id" = Uuid, Path, description = "Term identifier")),
    responses(
        (status = 204, description = "Term deleted"),
        (status = 404, description = "Unknown term")
    )
)]
pub async fn delete_term(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    term_service::delete_term(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
