//! Live view of every order, as the kitchen dashboard shows it.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use serde::Serialize;
use thiserror::Error;
use time::Date;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    orders::{
        model::{Order, OrderStatus},
        token::{day_key, TokenBook},
        workflow::KitchenAction,
    },
    store::{OrderStore, StoreError},
};

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Order not found")]
    NotFound,
    #[error("Order is {status}; `{}` is not available", .action.label())]
    NotAvailable { status: OrderStatus, action: KitchenAction },
    #[error("Status update failed: {0}")]
    Store(#[from] StoreError),
}

/// One card on the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct QueueEntry {
    pub token: Option<u32>,
    pub order: Order,
    pub action: Option<KitchenAction>,
    pub printable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub today_revenue: i64,
    pub pending: usize,
    pub delivered: usize,
    pub orders: usize,
    /// Bumped on every new order; a change tells the dashboard to chime.
    pub alert_seq: u64,
}

/// Whether a receipt can be printed for an order in `status`.
pub fn is_printable(status: OrderStatus) -> bool {
    !matches!(status, OrderStatus::PendingAcceptance | OrderStatus::Cancelled)
}

/// Revenue for `day`: same-day totals, cancelled orders excluded.
pub fn revenue_on(orders: &[Order], day: Date) -> i64 {
    orders
        .iter()
        .filter(|o| day_key(o.created_at) == day && o.status != OrderStatus::Cancelled)
        .map(|o| o.total_amount)
        .sum()
}

pub struct KitchenBoard {
    orders: RwLock<Vec<Order>>,
    store: Arc<dyn OrderStore>,
    alert_seq: AtomicU64,
}

impl KitchenBoard {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { orders: RwLock::new(Vec::new()), store, alert_seq: AtomicU64::new(0) }
    }

    /// Full re-fetch. On failure the previous view stays up.
    pub async fn refresh(&self) {
        match self.store.list_orders().await {
            Ok(orders) => *self.orders.write().await = orders,
            Err(e) => warn!(error = %e, "order fetch failed, keeping previous view"),
        }
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.orders.read().await.clone()
    }

    pub async fn find(&self, id: Uuid) -> Option<Order> {
        self.orders.read().await.iter().find(|o| o.id == id).cloned()
    }

    /// Newest first, each with its daily token and the one action it offers.
    pub async fn queue(&self) -> Vec<QueueEntry> {
        let orders = self.orders.read().await;
        let tokens = TokenBook::build(&orders);
        orders
            .iter()
            .map(|o| QueueEntry {
                token: tokens.token(o.id),
                order: o.clone(),
                action: KitchenAction::available_for(o.status),
                printable: is_printable(o.status),
            })
            .collect()
    }

    pub async fn summary(&self, today: Date) -> Summary {
        let orders = self.orders.read().await;
        Summary {
            today_revenue: revenue_on(&orders, today),
            pending: orders.iter().filter(|o| o.status == OrderStatus::PendingAcceptance).count(),
            delivered: orders.iter().filter(|o| o.status == OrderStatus::Delivered).count(),
            orders: orders.len(),
            alert_seq: self.alert_seq.load(Ordering::SeqCst),
        }
    }

    pub fn bump_alert(&self) -> u64 {
        self.alert_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Moves an order one step forward.
    ///
    /// The check runs against the loaded view only; the store write itself
    /// is unconditional, so two dashboards racing on one order both succeed.
    pub async fn advance(&self, id: Uuid, action: KitchenAction) -> Result<OrderStatus, BoardError> {
        let order = self.find(id).await.ok_or(BoardError::NotFound)?;
        if order.status != action.requires() || !order.status.can_become(action.target()) {
            return Err(BoardError::NotAvailable { status: order.status, action });
        }

        let target = action.target();
        self.store.update_order_status(id, target).await.map_err(|e| {
            warn!(order_id = %id, error = %e, "status update failed");
            BoardError::from(e)
        })?;
        info!(order_id = %id, from = %order.status, to = %target, "order advanced");
        self.refresh().await;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{orders::token::tests::order_at, store::memory::MemoryStore};
    use time::macros::{date, datetime};

    fn board_with(orders: Vec<Order>) -> (Arc<MemoryStore>, KitchenBoard) {
        let store = Arc::new(MemoryStore::new());
        for o in orders {
            store.seed_order(o);
        }
        let board = KitchenBoard::new(store.clone());
        (store, board)
    }

    fn with_status(mut o: Order, status: OrderStatus, total: i64) -> Order {
        o.status = status;
        o.total_amount = total;
        o
    }

    #[tokio::test]
    async fn revenue_counts_today_and_skips_cancelled() {
        let orders = vec![
            with_status(order_at(datetime!(2025-03-10 09:00 UTC)), OrderStatus::Delivered, 210),
            with_status(order_at(datetime!(2025-03-10 10:00 UTC)), OrderStatus::Cancelled, 500),
            with_status(order_at(datetime!(2025-03-10 11:00 UTC)), OrderStatus::PendingAcceptance, 90),
            with_status(order_at(datetime!(2025-03-09 23:00 UTC)), OrderStatus::Delivered, 1000),
        ];
        let (_, board) = board_with(orders);
        board.refresh().await;

        let s = board.summary(date!(2025-03-10)).await;
        assert_eq!(s.today_revenue, 300);
        assert_eq!(s.pending, 1);
        assert_eq!(s.delivered, 2);
        assert_eq!(s.orders, 4);
    }

    #[tokio::test]
    async fn queue_is_newest_first_with_tokens() {
        let first = order_at(datetime!(2025-03-10 09:00:01 UTC));
        let second = order_at(datetime!(2025-03-10 09:00:05 UTC));
        let (_, board) = board_with(vec![second.clone(), first.clone()]);
        board.refresh().await;

        let queue = board.queue().await;
        assert_eq!(queue[0].order.id, second.id);
        assert_eq!(queue[0].token, Some(2));
        assert_eq!(queue[1].token, Some(1));
        assert_eq!(queue[1].action, Some(KitchenAction::Accept));
        assert!(!queue[1].printable);
    }

    #[tokio::test]
    async fn advance_walks_forward_only() {
        let order = order_at(datetime!(2025-03-10 09:00 UTC));
        let (_, board) = board_with(vec![order.clone()]);
        board.refresh().await;

        let err = board.advance(order.id, KitchenAction::MarkReady).await.unwrap_err();
        assert!(matches!(err, BoardError::NotAvailable { status: OrderStatus::PendingAcceptance, .. }));

        for (action, expected) in [
            (KitchenAction::Accept, OrderStatus::Preparing),
            (KitchenAction::MarkReady, OrderStatus::Ready),
            (KitchenAction::ConfirmDelivered, OrderStatus::Delivered),
        ] {
            assert_eq!(board.advance(order.id, action).await.unwrap(), expected);
            assert_eq!(board.find(order.id).await.unwrap().status, expected);
        }
        assert!(board.advance(order.id, KitchenAction::ConfirmDelivered).await.is_err());
        assert!(matches!(board.advance(Uuid::new_v4(), KitchenAction::Accept).await, Err(BoardError::NotFound)));
    }

    #[tokio::test]
    async fn cancelled_orders_take_no_action() {
        let order = with_status(order_at(datetime!(2025-03-10 09:00 UTC)), OrderStatus::Cancelled, 90);
        let (_, board) = board_with(vec![order.clone()]);
        board.refresh().await;

        for action in [KitchenAction::Accept, KitchenAction::MarkReady, KitchenAction::ConfirmDelivered] {
            let err = board.advance(order.id, action).await.unwrap_err();
            assert!(matches!(err, BoardError::NotAvailable { status: OrderStatus::Cancelled, .. }));
        }
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_view() {
        let (store, board) = board_with(vec![order_at(datetime!(2025-03-10 09:00 UTC))]);
        board.refresh().await;
        store.set_offline(true);
        board.refresh().await;
        assert_eq!(board.orders().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_status_write_is_reported() {
        let order = order_at(datetime!(2025-03-10 09:00 UTC));
        let (store, board) = board_with(vec![order.clone()]);
        board.refresh().await;
        store.set_offline(true);
        let err = board.advance(order.id, KitchenAction::Accept).await.unwrap_err();
        assert!(matches!(err, BoardError::Store(_)));
        assert_eq!(board.find(order.id).await.unwrap().status, OrderStatus::PendingAcceptance);
    }
}
