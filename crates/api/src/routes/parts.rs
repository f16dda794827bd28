use axum::Router;
use axum::routing::get;

use crate::handlers::parts;
use crate::state::AppState;

/// Part catalog routes mounted at `/parts`.
///
/// ```text
/// GET    /    -> list_parts
/// POST   /    -> create_part
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(parts::list_parts).post(parts::create_part))
}
