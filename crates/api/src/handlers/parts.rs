//! Handlers for the `/parts` catalog resource.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use partlist_core::composition::{validate_part_code, validate_part_name};
use partlist_core::pagination::contains_pattern;
use partlist_db::models::part::{CreatePart, Part};
use partlist_db::repositories::PartRepo;

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::query::SearchParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/parts
///
/// List catalog parts ordered by code. `?q=` filters on code or name.
pub async fn list_parts(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<DataResponse<Vec<Part>>>> {
    let pattern = contains_pattern(params.q.as_deref());
    let parts = PartRepo::list(&state.pool, pattern.as_deref()).await?;
    Ok(Json(DataResponse { data: parts }))
}

/// POST /api/v1/parts
///
/// Register a part. A duplicate code is rejected with 409 by `uq_parts_code`.
pub async fn create_part(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreatePart>,
) -> AppResult<(StatusCode, Json<DataResponse<Part>>)> {
    validate_part_code(&input.code)?;
    validate_part_name(&input.name)?;

    let part = PartRepo::create(&state.pool, &input).await?;
    tracing::info!(part_id = part.id, code = %part.code, "Part created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: part })))
}
