use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod model;
pub mod session;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::cart_routes())
}
