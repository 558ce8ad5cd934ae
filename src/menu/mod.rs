use crate::state::AppState;
use axum::Router;

pub mod catalog;
pub mod handlers;
pub mod model;
pub mod search;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::menu_routes())
        .merge(handlers::staff_menu_routes())
}
