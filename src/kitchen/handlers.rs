use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::StaffAccess,
    kitchen::{
        board::{is_printable, BoardError, QueueEntry, Summary},
        receipt::render_receipt,
        report::{build_report, ReportError},
    },
    notice::{Notice, WithNotice},
    orders::{model::OrderStatus, token::TokenBook, workflow::KitchenAction},
    state::AppState,
};

pub fn kitchen_routes() -> Router<AppState> {
    Router::new()
        .route("/staff/kitchen/orders", get(queue))
        .route("/staff/kitchen/summary", get(summary))
        .route("/staff/kitchen/refresh", post(refresh))
        .route("/staff/kitchen/orders/:id/accept", post(accept))
        .route("/staff/kitchen/orders/:id/ready", post(mark_ready))
        .route("/staff/kitchen/orders/:id/deliver", post(confirm_delivered))
        .route("/staff/kitchen/orders/:id/receipt", get(receipt))
        .route("/staff/kitchen/report", get(report))
}

impl BoardError {
    pub fn rejection(&self) -> (StatusCode, String) {
        let status = match self {
            BoardError::NotFound => StatusCode::NOT_FOUND,
            BoardError::NotAvailable { .. } => StatusCode::CONFLICT,
            BoardError::Store(_) => StatusCode::BAD_GATEWAY,
        };
        (status, self.to_string())
    }
}

#[instrument(skip(state, _staff))]
pub async fn queue(State(state): State<AppState>, _staff: StaffAccess) -> Json<Vec<QueueEntry>> {
    Json(state.kitchen.queue().await)
}

#[instrument(skip(state, _staff))]
pub async fn summary(State(state): State<AppState>, _staff: StaffAccess) -> Json<Summary> {
    Json(state.kitchen.summary(OffsetDateTime::now_utc().date()).await)
}

#[instrument(skip(state, _staff))]
pub async fn refresh(State(state): State<AppState>, _staff: StaffAccess) -> Json<Vec<QueueEntry>> {
    state.kitchen.refresh().await;
    Json(state.kitchen.queue().await)
}

async fn advance(
    state: &AppState,
    id: Uuid,
    action: KitchenAction,
) -> Result<Json<WithNotice<OrderStatus>>, (StatusCode, String)> {
    let status = state.kitchen.advance(id, action).await.map_err(|e| {
        warn!(order_id = %id, ?action, error = %e, "kitchen action refused");
        e.rejection()
    })?;
    Ok(Json(WithNotice { data: status, notice: Notice::success(format!("Order is now {status}")) }))
}

#[instrument(skip(state, staff), fields(user_id = %staff.0.id))]
pub async fn accept(
    State(state): State<AppState>,
    staff: StaffAccess,
    Path(id): Path<Uuid>,
) -> Result<Json<WithNotice<OrderStatus>>, (StatusCode, String)> {
    advance(&state, id, KitchenAction::Accept).await
}

#[instrument(skip(state, staff), fields(user_id = %staff.0.id))]
pub async fn mark_ready(
    State(state): State<AppState>,
    staff: StaffAccess,
    Path(id): Path<Uuid>,
) -> Result<Json<WithNotice<OrderStatus>>, (StatusCode, String)> {
    advance(&state, id, KitchenAction::MarkReady).await
}

#[instrument(skip(state, staff), fields(user_id = %staff.0.id))]
pub async fn confirm_delivered(
    State(state): State<AppState>,
    staff: StaffAccess,
    Path(id): Path<Uuid>,
) -> Result<Json<WithNotice<OrderStatus>>, (StatusCode, String)> {
    advance(&state, id, KitchenAction::ConfirmDelivered).await
}

#[instrument(skip(state, _staff))]
pub async fn receipt(
    State(state): State<AppState>,
    _staff: StaffAccess,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, (StatusCode, String)> {
    let orders = state.kitchen.orders().await;
    let order = orders
        .iter()
        .find(|o| o.id == id)
        .ok_or((StatusCode::NOT_FOUND, "Order not found".to_string()))?;
    if !is_printable(order.status) {
        return Err((StatusCode::CONFLICT, format!("No bill for an order that is {}", order.status)));
    }
    let token = TokenBook::build(&orders).token(id);
    Ok(Html(render_receipt(order, token)))
}

#[instrument(skip(state, _staff))]
pub async fn report(
    State(state): State<AppState>,
    _staff: StaffAccess,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let now = OffsetDateTime::now_utc();
    let orders = state.kitchen.orders().await;
    let report = build_report(&orders, now.date(), now).map_err(|e| match e {
        ReportError::NoSales => (StatusCode::NOT_FOUND, e.to_string()),
        ReportError::Format(_) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    })?;
    info!(filename = %report.filename, "sales report generated");

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", report.filename)),
        ],
        report.body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::AuthUser, orders::token::tests::order_at};

    fn staff() -> StaffAccess {
        StaffAccess(AuthUser { id: Uuid::new_v4(), email: "cook@x.in".into(), access_token: "t".into() })
    }

    #[tokio::test]
    async fn actions_map_to_http_statuses() {
        let (state, store) = AppState::fake();
        let order = order_at(OffsetDateTime::now_utc());
        store.seed_order(order.clone());
        state.kitchen.refresh().await;

        let err = mark_ready(State(state.clone()), staff(), Path(order.id)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);

        let Json(resp) = accept(State(state.clone()), staff(), Path(order.id)).await.unwrap();
        assert_eq!(resp.data, OrderStatus::Preparing);
        assert_eq!(resp.notice.message, "Order is now Preparing");

        let err = accept(State(state), staff(), Path(Uuid::new_v4())).await.unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn receipts_only_once_accepted() {
        let (state, store) = AppState::fake();
        let order = order_at(OffsetDateTime::now_utc());
        store.seed_order(order.clone());
        state.kitchen.refresh().await;

        let err = receipt(State(state.clone()), staff(), Path(order.id)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);

        accept(State(state.clone()), staff(), Path(order.id)).await.unwrap();
        let Html(html) = receipt(State(state), staff(), Path(order.id)).await.unwrap();
        assert!(html.contains("TOKEN: 1"));
    }

    #[tokio::test]
    async fn report_without_sales_is_not_found() {
        let (state, _) = AppState::fake();
        let err = report(State(state), staff()).await.err().unwrap();
        assert_eq!(err, (StatusCode::NOT_FOUND, "No sales data available for today yet.".into()));
    }
}
