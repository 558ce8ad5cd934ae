use crate::state::AppState;
use axum::Router;

mod claims;
pub mod dto;
pub mod failure;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod provider;

pub use jwt::AuthUser;
pub use password::StaffAccess;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
        .merge(handlers::staff_routes())
}
