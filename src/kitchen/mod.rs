//! Kitchen dashboard: the live order queue, status buttons, receipts and
//! the daily sales report. Staff only.

use crate::state::AppState;
use axum::Router;

pub mod board;
pub mod handlers;
pub mod receipt;
pub mod report;
pub mod sync;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::kitchen_routes())
}
