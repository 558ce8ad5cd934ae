use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod model;
pub mod placement;
pub mod token;
pub mod workflow;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::order_routes())
}
