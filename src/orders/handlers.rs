use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::{
    auth::AuthUser,
    notice::{Notice, WithNotice},
    orders::{
        model::Order,
        placement::{place_order, Checkout, PlacementError},
    },
    state::AppState,
    store::{ChangeKind, FeedFilter, Table},
};

const DEFAULT_WAIT_SECS: u64 = 25;
const MAX_WAIT_SECS: u64 = 60;

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/mine", get(my_orders))
        .route("/orders/mine/changes", get(my_order_changes))
}

impl PlacementError {
    pub fn status(&self) -> StatusCode {
        match self {
            PlacementError::InProgress => StatusCode::CONFLICT,
            PlacementError::Remote(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[instrument(skip(state, user, checkout), fields(user_id = %user.id))]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(checkout): Json<Checkout>,
) -> Result<(StatusCode, Json<WithNotice<Order>>), (StatusCode, String)> {
    let order = place_order(&state.sessions, state.orders.as_ref(), user.id, &user.email, &checkout)
        .await
        .map_err(|e| (e.status(), e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(WithNotice { data: order, notice: Notice::success("Order placed!") }),
    ))
}

async fn fetch_mine(state: &AppState, user: &AuthUser) -> Result<Vec<Order>, (StatusCode, String)> {
    state.orders.list_orders_for(&user.email).await.map_err(|e| {
        error!(error = %e, "fetching order history failed");
        (StatusCode::BAD_GATEWAY, e.to_string())
    })
}

/// The signed-in customer's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Order>>, (StatusCode, String)> {
    Ok(Json(fetch_mine(&state, &user).await?))
}

#[derive(Debug, Deserialize)]
pub struct WaitParams {
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct TrackingUpdate {
    /// False when the wait timed out without a status change.
    pub changed: bool,
    pub orders: Vec<Order>,
}

/// Long-poll: waits for a status update on one of the caller's orders, then
/// returns the re-fetched history.
#[instrument(skip(state, user, params), fields(user_id = %user.id))]
pub async fn my_order_changes(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<WaitParams>,
) -> Result<Json<TrackingUpdate>, (StatusCode, String)> {
    let wait = Duration::from_secs(params.timeout_secs.unwrap_or(DEFAULT_WAIT_SECS).min(MAX_WAIT_SECS));
    let mut sub = state.feed.subscribe(
        FeedFilter::all(Table::Orders).only(ChangeKind::Update).for_user(user.email.clone()),
    );

    let changed = matches!(tokio::time::timeout(wait, sub.next()).await, Ok(Some(_)));
    debug!(changed, "tracking wait finished");

    let orders = fetch_mine(&state, &user).await?;
    Ok(Json(TrackingUpdate { changed, orders }))
}
