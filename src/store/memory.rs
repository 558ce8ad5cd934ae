use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    ChangeEvent, ChangeFeed, ChangeKind, FeedFilter, FeedHub, OrderStore, ProductStore, StoreError,
    Subscription, Table,
};
use crate::{
    menu::model::{FoodItem, FoodItemPatch, NewFoodItem},
    orders::model::{NewOrder, Order, OrderStatus},
};

/// In-process store used for offline runs and tests.
///
/// Rows are kept newest first. `set_offline` makes every call fail as if the
/// backend were unreachable; `drop_products_table` makes product calls
/// report a missing table.
#[derive(Default)]
pub struct MemoryStore {
    products: Mutex<Vec<FoodItem>>,
    orders: Mutex<Vec<Order>>,
    hub: FeedHub,
    offline: AtomicBool,
    products_missing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn drop_products_table(&self) {
        self.products_missing.store(true, Ordering::SeqCst);
    }

    /// Puts an order in as-is, keeping newest-first order. Publishes an insert.
    pub fn seed_order(&self, order: Order) {
        let event = order_event(ChangeKind::Insert, &order);
        {
            let mut orders = self.orders.lock().unwrap_or_else(|e| e.into_inner());
            orders.push(order);
            orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        self.hub.publish(event);
    }

    fn reachable(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }

    fn products_reachable(&self) -> Result<(), StoreError> {
        self.reachable()?;
        if self.products_missing.load(Ordering::SeqCst) {
            return Err(StoreError::TableMissing("products"));
        }
        Ok(())
    }
}

fn product_event(kind: ChangeKind, id: &str) -> ChangeEvent {
    ChangeEvent { table: Table::Products, kind, id: Some(id.to_string()), user_email: None }
}

fn order_event(kind: ChangeKind, order: &Order) -> ChangeEvent {
    ChangeEvent {
        table: Table::Orders,
        kind,
        id: Some(order.id.to_string()),
        user_email: Some(order.user_email.clone()),
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list_products(&self) -> Result<Vec<FoodItem>, StoreError> {
        self.products_reachable()?;
        Ok(self.products.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn insert_product(&self, item: &NewFoodItem) -> Result<FoodItem, StoreError> {
        self.products_reachable()?;
        let row = item.clone().into_item(Uuid::new_v4().to_string());
        self.products
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(0, row.clone());
        self.hub.publish(product_event(ChangeKind::Insert, &row.id));
        Ok(row)
    }

    async fn update_product(&self, id: &str, patch: &FoodItemPatch) -> Result<(), StoreError> {
        self.products_reachable()?;
        {
            let mut products = self.products.lock().unwrap_or_else(|e| e.into_inner());
            let row = products.iter_mut().find(|p| p.id == id).ok_or(StoreError::NotFound)?;
            patch.apply(row);
        }
        self.hub.publish(product_event(ChangeKind::Update, id));
        Ok(())
    }

    async fn delete_product(&self, id: &str) -> Result<(), StoreError> {
        self.products_reachable()?;
        {
            let mut products = self.products.lock().unwrap_or_else(|e| e.into_inner());
            let before = products.len();
            products.retain(|p| p.id != id);
            if products.len() == before {
                return Err(StoreError::NotFound);
            }
        }
        self.hub.publish(product_event(ChangeKind::Delete, id));
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        self.reachable()?;
        Ok(self.orders.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn list_orders_for(&self, email: &str) -> Result<Vec<Order>, StoreError> {
        self.reachable()?;
        Ok(self
            .orders
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|o| o.user_email == email)
            .cloned()
            .collect())
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<Order, StoreError> {
        self.reachable()?;
        let row = order.clone().into_order(Uuid::new_v4(), OffsetDateTime::now_utc());
        self.orders
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(0, row.clone());
        self.hub.publish(order_event(ChangeKind::Insert, &row));
        Ok(row)
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> Result<(), StoreError> {
        self.reachable()?;
        let event = {
            let mut orders = self.orders.lock().unwrap_or_else(|e| e.into_inner());
            let row = orders.iter_mut().find(|o| o.id == id).ok_or(StoreError::NotFound)?;
            row.status = status;
            order_event(ChangeKind::Update, row)
        };
        self.hub.publish(event);
        Ok(())
    }
}

impl ChangeFeed for MemoryStore {
    fn subscribe(&self, filter: FeedFilter) -> Subscription {
        self.hub.subscribe(filter)
    }
}
