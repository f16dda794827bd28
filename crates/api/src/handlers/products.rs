//! Handlers for the `/products` resource: product roots, their trees, node
//! edits and undo/redo.
//!
//! Every edit handler delegates to one `CompositionEditor` call, which runs
//! the whole edit (history included) in a single transaction.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use partlist_core::composition::InsertPosition;
use partlist_core::history::UndoRedoStatus;
use partlist_core::pagination::{
    clamp_limit, clamp_offset, contains_pattern, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use partlist_core::types::DbId;
use partlist_db::editor::{CompositionEditor, NodeDeleted, NodeInserted, ProductCreated};
use partlist_db::history;
use partlist_db::models::composition::ProductPage;
use partlist_db::repositories::CompositionRepo;
use partlist_db::tree_reader::{read_product_tree, ProductTree};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::query::SearchParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// Body of `POST /products`.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub part_code: String,
}

/// Body of `POST /products/bulk-delete`.
#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<DbId>,
}

/// Result of a bulk delete.
#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub deleted_nodes: u64,
}

/// Body of the sibling/child insert endpoints and of quantity modification.
#[derive(Debug, Deserialize)]
pub struct NodeInput {
    pub part_code: String,
    pub quantity: i32,
}

/// Body of `POST /products/{id}/nodes/{node_id}/move`.
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub target_id: DbId,
    pub position: InsertPosition,
}

/// Outcome of an edit that returns no new entity.
#[derive(Debug, Serialize)]
pub struct EditApplied {
    pub success: bool,
    #[serde(flatten)]
    pub status: UndoRedoStatus,
}

impl From<UndoRedoStatus> for EditApplied {
    fn from(status: UndoRedoStatus) -> Self {
        Self {
            success: true,
            status,
        }
    }
}

// ---------------------------------------------------------------------------
// Product roots
// ---------------------------------------------------------------------------

/// GET /api/v1/products
///
/// Page through product roots ordered by id. `?q=` matches the root part's
/// code or name case-insensitively.
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<DataResponse<ProductPage>>> {
    let pattern = contains_pattern(params.q.as_deref());
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let offset = clamp_offset(params.offset);

    let items =
        CompositionRepo::list_products(&state.pool, pattern.as_deref(), limit, offset).await?;
    let total_count = CompositionRepo::count_products(&state.pool, pattern.as_deref()).await?;

    Ok(Json(DataResponse {
        data: ProductPage { items, total_count },
    }))
}

/// POST /api/v1/products
///
/// Creation is not an undoable edit, so `can_undo` is always `false` here.
pub async fn create_product(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ProductCreated>>)> {
    let created = CompositionEditor::create_product(&state.pool, &input.part_code).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// POST /api/v1/products/bulk-delete
///
/// Delete the listed products with their trees and history. All-or-nothing.
pub async fn bulk_delete(
    State(state): State<AppState>,
    AppJson(input): AppJson<BulkDeleteRequest>,
) -> AppResult<Json<DataResponse<BulkDeleteResponse>>> {
    let deleted_nodes = CompositionEditor::delete_products(&state.pool, &input.ids).await?;
    Ok(Json(DataResponse {
        data: BulkDeleteResponse { deleted_nodes },
    }))
}

// ---------------------------------------------------------------------------
// Tree reads
// ---------------------------------------------------------------------------

/// GET /api/v1/products/{id}/tree
pub async fn get_tree(
    State(state): State<AppState>,
    Path(product_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProductTree>>> {
    let tree = read_product_tree(&state.pool, product_id).await?;
    Ok(Json(DataResponse { data: tree }))
}

/// GET /api/v1/products/{id}/history-status
pub async fn history_status(
    State(state): State<AppState>,
    Path(product_id): Path<DbId>,
) -> AppResult<Json<DataResponse<UndoRedoStatus>>> {
    let status = history::status(&state.pool, product_id).await?;
    Ok(Json(DataResponse { data: status }))
}

// ---------------------------------------------------------------------------
// Node edits
// ---------------------------------------------------------------------------

/// POST /api/v1/products/{id}/nodes/{node_id}/siblings
///
/// Insert a new node before `node_id`.
pub async fn insert_sibling(
    State(state): State<AppState>,
    Path((product_id, node_id)): Path<(DbId, DbId)>,
    AppJson(input): AppJson<NodeInput>,
) -> AppResult<(StatusCode, Json<DataResponse<NodeInserted>>)> {
    let inserted = CompositionEditor::insert_sibling(
        &state.pool,
        product_id,
        node_id,
        &input.part_code,
        input.quantity,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: inserted })))
}

/// POST /api/v1/products/{id}/nodes/{node_id}/children
///
/// Append a new node as the last child of `node_id`.
pub async fn insert_child(
    State(state): State<AppState>,
    Path((product_id, node_id)): Path<(DbId, DbId)>,
    AppJson(input): AppJson<NodeInput>,
) -> AppResult<(StatusCode, Json<DataResponse<NodeInserted>>)> {
    let inserted = CompositionEditor::insert_child(
        &state.pool,
        product_id,
        node_id,
        &input.part_code,
        input.quantity,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: inserted })))
}

/// PUT /api/v1/products/{id}/nodes/{node_id}
///
/// Change a node's quantity.
pub async fn modify_quantity(
    State(state): State<AppState>,
    Path((product_id, node_id)): Path<(DbId, DbId)>,
    AppJson(input): AppJson<NodeInput>,
) -> AppResult<Json<DataResponse<EditApplied>>> {
    let status = CompositionEditor::modify_quantity(
        &state.pool,
        product_id,
        node_id,
        &input.part_code,
        input.quantity,
    )
    .await?;
    Ok(Json(DataResponse {
        data: status.into(),
    }))
}

/// DELETE /api/v1/products/{id}/nodes/{node_id}
///
/// Delete a node and its subtree. Targeting the product root deletes the
/// whole product without recording history.
pub async fn delete_node(
    State(state): State<AppState>,
    Path((product_id, node_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<NodeDeleted>>> {
    let deleted = CompositionEditor::delete_node(&state.pool, product_id, node_id).await?;
    Ok(Json(DataResponse { data: deleted }))
}

/// POST /api/v1/products/{id}/nodes/{node_id}/move
///
/// Drop `node_id` before or after `target_id`.
pub async fn move_node(
    State(state): State<AppState>,
    Path((product_id, node_id)): Path<(DbId, DbId)>,
    AppJson(input): AppJson<MoveRequest>,
) -> AppResult<Json<DataResponse<EditApplied>>> {
    let status = CompositionEditor::move_node(
        &state.pool,
        product_id,
        node_id,
        input.target_id,
        input.position,
    )
    .await?;
    Ok(Json(DataResponse {
        data: status.into(),
    }))
}

// ---------------------------------------------------------------------------
// Undo / redo
// ---------------------------------------------------------------------------

/// POST /api/v1/products/{id}/undo
///
/// Returns the refreshed tree. A no-op when there is nothing to undo.
pub async fn undo(
    State(state): State<AppState>,
    Path(product_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProductTree>>> {
    let tree = history::undo(&state.pool, product_id).await?;
    Ok(Json(DataResponse { data: tree }))
}

/// POST /api/v1/products/{id}/redo
///
/// Returns the refreshed tree. A no-op when there is nothing to redo.
pub async fn redo(
    State(state): State<AppState>,
    Path(product_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProductTree>>> {
    let tree = history::redo(&state.pool, product_id).await?;
    Ok(Json(DataResponse { data: tree }))
}
