use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgListener, types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    ChangeEvent, ChangeFeed, FeedFilter, FeedHub, OrderStore, ProductStore, StoreError,
    Subscription,
};
use crate::{
    cart::model::CartLine,
    menu::model::{FoodItem, FoodItemPatch, NewFoodItem},
    orders::model::{NewOrder, Order, OrderStatus},
};

/// Channel the `notify_row_change` trigger publishes on.
pub const CHANGE_CHANNEL: &str = "row_changes";
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

const UNDEFINED_TABLE: &str = "42P01";

#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    name: String,
    price: i64,
    image: String,
    description: String,
    category: String,
    in_stock: bool,
}

impl TryFrom<ProductRow> for FoodItem {
    type Error = StoreError;

    fn try_from(r: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            category: r.category.parse().map_err(StoreError::Decode)?,
            id: r.id,
            name: r.name,
            price: r.price,
            image: r.image,
            description: r.description,
            in_stock: r.in_stock,
        })
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    created_at: OffsetDateTime,
    user_id: Uuid,
    user_email: String,
    phone: String,
    location: String,
    items: Json<Vec<CartLine>>,
    total_amount: i64,
    status: String,
    payment_method: String,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(r: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            created_at: r.created_at,
            user_id: r.user_id,
            user_email: r.user_email,
            phone: r.phone,
            location: r.location.parse().map_err(StoreError::Decode)?,
            items: r.items.0,
            total_amount: r.total_amount,
            status: r.status.parse().map_err(StoreError::Decode)?,
            payment_method: r.payment_method.parse().map_err(StoreError::Decode)?,
        })
    }
}

/// Maps a driver error, recognising a missing table.
fn classify(table: &'static str, err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNDEFINED_TABLE) => {
            StoreError::TableMissing(table)
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Database(err),
    }
}

const ORDER_COLUMNS: &str = "id, created_at, user_id, user_email, phone, location, items, \
                             total_amount, status, payment_method";

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
    hub: FeedHub,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db, hub: FeedHub::default() }
    }

    /// Forwards trigger notifications into the hub, reconnecting forever.
    pub fn spawn_listener(&self) -> JoinHandle<()> {
        let db = self.db.clone();
        let hub = self.hub.clone();
        tokio::spawn(async move {
            loop {
                match listen(&db, &hub).await {
                    Ok(()) => info!("change listener stopped"),
                    Err(e) => warn!(error = %e, "change listener failed; reconnecting"),
                }
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        })
    }
}

async fn listen(db: &PgPool, hub: &FeedHub) -> anyhow::Result<()> {
    let mut listener = PgListener::connect_with(db).await.context("connect listener")?;
    listener.listen(CHANGE_CHANNEL).await.context("LISTEN")?;
    info!(channel = CHANGE_CHANNEL, "subscribed to row changes");
    loop {
        let notification = listener.recv().await.context("recv notification")?;
        match serde_json::from_str::<ChangeEvent>(notification.payload()) {
            Ok(event) => {
                debug!(table = ?event.table, kind = ?event.kind, "row change");
                hub.publish(event);
            }
            Err(e) => warn!(error = %e, payload = notification.payload(), "unparseable change payload"),
        }
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn list_products(&self) -> Result<Vec<FoodItem>, StoreError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, price, image, description, category, in_stock
            FROM products
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(|e| classify("products", e))?;
        rows.into_iter().map(FoodItem::try_from).collect()
    }

    async fn insert_product(&self, item: &NewFoodItem) -> Result<FoodItem, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (name, price, image, description, category, in_stock)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING id, name, price, image, description, category, in_stock
            "#,
        )
        .bind(&item.name)
        .bind(item.price)
        .bind(&item.image)
        .bind(&item.description)
        .bind(item.category.as_str())
        .fetch_one(&self.db)
        .await
        .map_err(|e| classify("products", e))?;
        row.try_into()
    }

    async fn update_product(&self, id: &str, patch: &FoodItemPatch) -> Result<(), StoreError> {
        let done = sqlx::query(
            r#"
            UPDATE products
               SET name        = COALESCE($2, name),
                   price       = COALESCE($3, price),
                   image       = COALESCE($4, image),
                   description = COALESCE($5, description),
                   category    = COALESCE($6, category),
                   in_stock    = COALESCE($7, in_stock)
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(patch.name.as_deref())
        .bind(patch.price)
        .bind(patch.image.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.category.map(|c| c.as_str()))
        .bind(patch.in_stock)
        .execute(&self.db)
        .await
        .map_err(|e| classify("products", e))?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_product(&self, id: &str) -> Result<(), StoreError> {
        let done = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| classify("products", e))?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await
        .map_err(|e| classify("orders", e))?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn list_orders_for(&self, email: &str) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_email = $1 ORDER BY created_at DESC"
        ))
        .bind(email)
        .fetch_all(&self.db)
        .await
        .map_err(|e| classify("orders", e))?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<Order, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO orders (user_id, user_email, phone, location, items,
                                total_amount, status, payment_method)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order.user_id)
        .bind(&order.user_email)
        .bind(&order.phone)
        .bind(order.location.as_str())
        .bind(Json(&order.items))
        .bind(order.total_amount)
        .bind(order.status.as_str())
        .bind(order.payment_method.as_str())
        .fetch_one(&self.db)
        .await
        .map_err(|e| classify("orders", e))?;
        row.try_into()
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> Result<(), StoreError> {
        let done = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.db)
            .await
            .map_err(|e| classify("orders", e))?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

impl ChangeFeed for PgStore {
    fn subscribe(&self, filter: FeedFilter) -> Subscription {
        self.hub.subscribe(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::model::Category;

    #[test]
    fn product_row_with_unknown_category_is_rejected() {
        let row = ProductRow {
            id: "x".into(),
            name: "Mystery".into(),
            price: 10,
            image: String::new(),
            description: String::new(),
            category: "Desserts".into(),
            in_stock: true,
        };
        assert!(matches!(FoodItem::try_from(row), Err(StoreError::Decode(_))));
    }

    #[test]
    fn product_row_maps_to_item() {
        let row = ProductRow {
            id: "x".into(),
            name: "Egg Rice".into(),
            price: 140,
            image: "img".into(),
            description: String::new(),
            category: "Rice".into(),
            in_stock: false,
        };
        let item = FoodItem::try_from(row).unwrap();
        assert_eq!(item.category, Category::Rice);
        assert!(!item.in_stock);
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(classify("orders", sqlx::Error::RowNotFound), StoreError::NotFound));
        assert!(matches!(classify("orders", sqlx::Error::PoolTimedOut), StoreError::Unavailable(_)));
    }
}
