use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    auth::AuthUser,
    cart::{model::CartLine, session::CustomerSession},
    notice::{Notice, WithNotice},
    orders::{model::DELIVERY_FEE, placement::Placement},
    state::AppState,
};

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_item))
        .route("/cart/items/:id", delete(remove_item))
}

/// Cart as the checkout screen shows it.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total_quantity: u32,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub total: i64,
    pub placement: Placement,
}

impl From<&CustomerSession> for CartView {
    fn from(session: &CustomerSession) -> Self {
        let cart = &session.cart;
        let subtotal = cart.subtotal();
        let delivery_fee = if cart.is_empty() { 0 } else { DELIVERY_FEE };
        Self {
            lines: cart.lines().to_vec(),
            total_quantity: cart.total_quantity(),
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
            placement: session.placement,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub item_id: String,
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_cart(State(state): State<AppState>, user: AuthUser) -> Json<CartView> {
    Json(CartView::from(&state.sessions.snapshot(user.id)))
}

/// Adds one unit of a dish as it currently appears on the menu.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddItemRequest>,
) -> Result<Json<WithNotice<CartView>>, (StatusCode, String)> {
    let item = state.catalog.find(&payload.item_id).await.ok_or_else(|| {
        warn!(item_id = %payload.item_id, "add to cart: unknown item");
        (StatusCode::NOT_FOUND, "Item not found".to_string())
    })?;

    state.sessions.with(user.id, |session| -> Result<_, (StatusCode, String)> {
        let notice = session.add(&item).map_err(|e| {
            info!(item_id = %item.id, "add to cart refused: out of stock");
            (StatusCode::CONFLICT, e.to_string())
        })?;
        Ok(Json(WithNotice { data: CartView::from(&*session), notice }))
    })
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<String>,
) -> Json<CartView> {
    state.sessions.with(user.id, |session| {
        session.cart.remove(&item_id);
        Json(CartView::from(&*session))
    })
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear_cart(State(state): State<AppState>, user: AuthUser) -> Json<WithNotice<CartView>> {
    state.sessions.with(user.id, |session| {
        session.cart.clear();
        Json(WithNotice { data: CartView::from(&*session), notice: Notice::info("Cart cleared") })
    })
}
