//! Hosted data store: the `products` and `orders` collections and their
//! change feed. Nothing here is transactional; the last write wins.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    menu::model::{FoodItem, FoodItemPatch, NewFoodItem},
    orders::model::{NewOrder, Order, OrderStatus},
};

pub mod feed;
pub mod memory;
pub mod postgres;

pub use feed::{ChangeEvent, ChangeKind, FeedFilter, FeedHub, Subscription, Table};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table `{0}` does not exist")]
    TableMissing(&'static str),
    #[error("row not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed row: {0}")]
    Decode(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Newest first.
    async fn list_products(&self) -> Result<Vec<FoodItem>, StoreError>;
    async fn insert_product(&self, item: &NewFoodItem) -> Result<FoodItem, StoreError>;
    async fn update_product(&self, id: &str, patch: &FoodItemPatch) -> Result<(), StoreError>;
    async fn delete_product(&self, id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError>;
    /// Newest first, only the orders placed under `email`.
    async fn list_orders_for(&self, email: &str) -> Result<Vec<Order>, StoreError>;
    async fn insert_order(&self, order: &NewOrder) -> Result<Order, StoreError>;
    /// Plain column write; no check of the current status.
    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> Result<(), StoreError>;
}

pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self, filter: FeedFilter) -> Subscription;
}
