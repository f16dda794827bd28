//! Route definitions for product trees and their edit history.

use axum::Router;
use axum::routing::{get, post, put};

use crate::handlers::products;
use crate::state::AppState;

/// Product routes mounted at `/products`.
///
/// ```text
/// GET    /                                  -> list_products
/// POST   /                                  -> create_product
/// POST   /bulk-delete                       -> bulk_delete
/// GET    /{id}/tree                         -> get_tree
/// GET    /{id}/history-status               -> history_status
/// POST   /{id}/undo                         -> undo
/// POST   /{id}/redo                         -> redo
/// PUT    /{id}/nodes/{node_id}              -> modify_quantity
/// DELETE /{id}/nodes/{node_id}              -> delete_node
/// POST   /{id}/nodes/{node_id}/siblings     -> insert_sibling
/// POST   /{id}/nodes/{node_id}/children     -> insert_child
/// POST   /{id}/nodes/{node_id}/move         -> move_node
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(products::list_products).post(products::create_product),
        )
        .route("/bulk-delete", post(products::bulk_delete))
        .route("/{id}/tree", get(products::get_tree))
        .route("/{id}/history-status", get(products::history_status))
        .route("/{id}/undo", post(products::undo))
        .route("/{id}/redo", post(products::redo))
        .route(
            "/{id}/nodes/{node_id}",
            put(products::modify_quantity).delete(products::delete_node),
        )
        .route("/{id}/nodes/{node_id}/siblings", post(products::insert_sibling))
        .route("/{id}/nodes/{node_id}/children", post(products::insert_child))
        .route("/{id}/nodes/{node_id}/move", post(products::move_node))
}
