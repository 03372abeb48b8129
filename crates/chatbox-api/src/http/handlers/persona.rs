//! Persona CRUD handlers for the REST API.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use chatbox_types::persona::{Persona, PersonaDraft, PersonaPatch};

use crate::http::error::AppError;
use crate::http::extract::ApiJson;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// POST /api/personas - Create a persona.
pub async fn create_persona(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PersonaDraft>,
) -> Result<(StatusCode, Json<ApiResponse<Persona>>), AppError> {
    let timer = RequestTimer::start();
    let persona = state.persona_service.create(body).await?;
    Ok((StatusCode::CREATED, Json(timer.finish(persona))))
}

/// GET /api/personas - List personas ordered by role name.
pub async fn list_personas(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Persona>>>, AppError> {
    let timer = RequestTimer::start();
    let personas = state.persona_service.list().await?;
    Ok(Json(timer.finish(personas)))
}

/// GET /api/personas/{id}
pub async fn get_persona(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Persona>>, AppError> {
    let timer = RequestTimer::start();
    let persona = state.persona_service.get(id).await?;
    Ok(Json(timer.finish(persona)))
}

/// PUT /api/personas/{id} - Partial update; absent fields are kept.
pub async fn update_persona(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(patch): ApiJson<PersonaPatch>,
) -> Result<Json<ApiResponse<Persona>>, AppError> {
    let timer = RequestTimer::start();
    let persona = state.persona_service.update(id, patch).await?;
    Ok(Json(timer.finish(persona)))
}

/// DELETE /api/personas/{id} - Refused with 409 while sessions use the persona.
pub async fn delete_persona(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.persona_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
