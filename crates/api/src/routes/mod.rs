pub mod health;
pub mod parts;
pub mod products;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /parts                                           list, create
/// /products                                        list, create
/// /products/bulk-delete                            delete many roots
/// /products/{id}/tree                              materialized tree
/// /products/{id}/history-status                    can_undo / can_redo
/// /products/{id}/undo                              undo
/// /products/{id}/redo                              redo
/// /products/{id}/nodes/{node_id}                   modify quantity, delete
/// /products/{id}/nodes/{node_id}/siblings          insert before node
/// /products/{id}/nodes/{node_id}/children          append child
/// /products/{id}/nodes/{node_id}/move              drag/drop
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/parts", parts::router())
        .nest("/products", products::router())
}
