//! In-memory menu shared by every request.
//!
//! Remote writes are best-effort: each mutation first tries the store and
//! then applies the same change locally whatever the outcome, so the menu
//! always reflects what staff asked for. When a remote write fails the two
//! copies drift apart until the next successful refresh.

use std::sync::Arc;

use rand::{distributions::Alphanumeric, Rng};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::model::{default_items, FoodItem, FoodItemPatch, NewFoodItem};
use crate::{
    notice::Notice,
    store::{ChangeFeed, FeedFilter, ProductStore, StoreError, Table},
};

const LOCAL_ID_LEN: usize = 9;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Item not found")]
    NotFound,
    #[error("Name is required and price must be positive")]
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuStatus {
    /// The store has no `products` table; edits stay on this server.
    pub table_missing: bool,
}

/// Menu contents plus what the last refresh learned about the backing table.
#[derive(Debug, Clone, Default)]
pub struct MenuState {
    items: Vec<FoodItem>,
    table_missing: bool,
}

impl MenuState {
    pub fn items(&self) -> &[FoodItem] {
        &self.items
    }

    pub fn status(&self) -> MenuStatus {
        MenuStatus { table_missing: self.table_missing }
    }

    pub fn find(&self, id: &str) -> Option<&FoodItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn apply_fetch(&mut self, fetched: Result<Vec<FoodItem>, StoreError>) {
        match fetched {
            Ok(rows) => {
                self.table_missing = false;
                self.items = if rows.is_empty() { default_items() } else { rows };
            }
            Err(e) => {
                if matches!(e, StoreError::TableMissing(_)) {
                    self.table_missing = true;
                }
                warn!(error = %e, "menu fetch failed, keeping current items");
                if self.items.is_empty() {
                    self.items = default_items();
                }
            }
        }
    }

    pub fn prepend(&mut self, item: FoodItem) {
        self.items.insert(0, item);
    }

    pub fn patch(&mut self, id: &str, patch: &FoodItemPatch) {
        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
            patch.apply(item);
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.items.retain(|i| i.id != id);
    }
}

pub struct Catalog {
    state: RwLock<MenuState>,
    store: Arc<dyn ProductStore>,
}

impl Catalog {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { state: RwLock::new(MenuState::default()), store }
    }

    pub async fn items(&self) -> Vec<FoodItem> {
        self.state.read().await.items().to_vec()
    }

    pub async fn find(&self, id: &str) -> Option<FoodItem> {
        self.state.read().await.find(id).cloned()
    }

    pub async fn status(&self) -> MenuStatus {
        self.state.read().await.status()
    }

    pub async fn refresh(&self) {
        let fetched = self.store.list_products().await;
        self.state.write().await.apply_fetch(fetched);
    }

    pub async fn create(&self, item: NewFoodItem) -> Result<(FoodItem, Notice), CatalogError> {
        let item = item.normalized();
        if item.name.is_empty() || item.price <= 0 {
            return Err(CatalogError::Invalid);
        }

        let (row, notice) = match self.store.insert_product(&item).await {
            Ok(row) => {
                info!(id = %row.id, name = %row.name, "menu item saved");
                let notice = Notice::success(format!("{} saved!", row.name));
                (row, notice)
            }
            Err(e) => {
                warn!(error = %e, name = %item.name, "menu insert failed, keeping item locally");
                let row = item.into_item(local_id());
                (row, Notice::info("Table missing - item saved locally"))
            }
        };
        self.state.write().await.prepend(row.clone());
        Ok((row, notice))
    }

    pub async fn update(&self, id: &str, patch: FoodItemPatch) -> Result<(FoodItem, Notice), CatalogError> {
        if self.find(id).await.is_none() {
            return Err(CatalogError::NotFound);
        }
        let patch = patch.normalized();
        if patch.name.as_deref().is_some_and(str::is_empty) || patch.price.is_some_and(|p| p <= 0) {
            return Err(CatalogError::Invalid);
        }

        let notice = match self.store.update_product(id, &patch).await {
            Ok(()) => Notice::success("Updated successfully"),
            Err(e) => {
                warn!(error = %e, %id, "menu update failed, applying locally");
                Notice::info("Update failed - local only")
            }
        };
        self.apply_local(id, &patch, notice).await
    }

    pub async fn toggle_stock(&self, id: &str) -> Result<(FoodItem, Notice), CatalogError> {
        let item = self.find(id).await.ok_or(CatalogError::NotFound)?;
        let in_stock = !item.in_stock;
        let patch = FoodItemPatch::stock(in_stock);

        let notice = match self.store.update_product(id, &patch).await {
            Ok(()) => Notice::info(format!(
                "{} is now {}",
                item.name,
                if in_stock { "In Stock" } else { "Out of Stock" }
            )),
            Err(e) => {
                warn!(error = %e, %id, "stock update failed, applying locally");
                Notice::info("Stock update failed - local only")
            }
        };
        self.apply_local(id, &patch, notice).await
    }

    pub async fn delete(&self, id: &str) -> Result<Notice, CatalogError> {
        if self.find(id).await.is_none() {
            return Err(CatalogError::NotFound);
        }
        let notice = match self.store.delete_product(id).await {
            Ok(()) => Notice::success("Item removed"),
            Err(e) => {
                warn!(error = %e, %id, "menu delete failed, removing locally");
                Notice::info("Delete failed - local only")
            }
        };
        self.state.write().await.remove(id);
        Ok(notice)
    }

    async fn apply_local(
        &self,
        id: &str,
        patch: &FoodItemPatch,
        notice: Notice,
    ) -> Result<(FoodItem, Notice), CatalogError> {
        let mut state = self.state.write().await;
        state.patch(id, patch);
        // A refresh may have replaced the list in between.
        let item = state.find(id).cloned().ok_or(CatalogError::NotFound)?;
        Ok((item, notice))
    }
}

fn local_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(LOCAL_ID_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Re-reads the menu whenever a product row changes.
pub fn spawn_catalog_sync(catalog: Arc<Catalog>, feed: Arc<dyn ChangeFeed>) -> tokio::task::JoinHandle<()> {
    let mut sub = feed.subscribe(FeedFilter::all(Table::Products));
    tokio::spawn(async move {
        while let Some(event) = sub.next().await {
            info!(kind = ?event.kind, id = ?event.id, "product change, refreshing menu");
            catalog.refresh().await;
        }
        warn!("product change feed closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{menu::model::Category, store::memory::MemoryStore};

    fn dish(name: &str, price: i64) -> NewFoodItem {
        NewFoodItem {
            name: name.into(),
            price,
            image: String::new(),
            description: "house special".into(),
            category: Category::Specials,
        }
    }

    fn catalog() -> (Arc<MemoryStore>, Catalog) {
        let store = Arc::new(MemoryStore::new());
        let catalog = Catalog::new(store.clone());
        (store, catalog)
    }

    #[tokio::test]
    async fn empty_table_falls_back_to_bundled_menu() {
        let (_, catalog) = catalog();
        catalog.refresh().await;
        assert_eq!(catalog.items().await.len(), 8);
        assert!(!catalog.status().await.table_missing);
    }

    #[tokio::test]
    async fn missing_table_is_flagged_separately() {
        let (store, catalog) = catalog();
        store.drop_products_table();
        catalog.refresh().await;
        assert_eq!(catalog.items().await.len(), 8);
        assert!(catalog.status().await.table_missing);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_current_items() {
        let (store, catalog) = catalog();
        store.insert_product(&dish("Idli", 60)).await.unwrap();
        catalog.refresh().await;
        assert_eq!(catalog.items().await.len(), 1);

        store.set_offline(true);
        catalog.refresh().await;
        let items = catalog.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Idli");
    }

    #[tokio::test]
    async fn create_saves_remotely_when_possible() {
        let (store, catalog) = catalog();
        let (row, notice) = catalog.create(dish("Mutton Biryani", 260)).await.unwrap();
        assert_eq!(notice, Notice::success("Mutton Biryani saved!"));
        assert!(row.in_stock);
        assert_eq!(store.list_products().await.unwrap()[0].id, row.id);
        assert_eq!(catalog.items().await[0].id, row.id);
    }

    #[tokio::test]
    async fn create_falls_back_to_local_id() {
        let (store, catalog) = catalog();
        store.set_offline(true);
        let (row, notice) = catalog.create(dish("Ghee Roast", 120)).await.unwrap();
        assert_eq!(notice.message, "Table missing - item saved locally");
        assert_eq!(row.id.len(), 9);
        assert!(row.id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_eq!(catalog.items().await[0].name, "Ghee Roast");
    }

    #[tokio::test]
    async fn create_rejects_invalid_input() {
        let (_, catalog) = catalog();
        assert_eq!(catalog.create(dish("  ", 10)).await.unwrap_err(), CatalogError::Invalid);
        assert_eq!(catalog.create(dish("Tea", 0)).await.unwrap_err(), CatalogError::Invalid);
    }

    #[tokio::test]
    async fn toggle_stock_flips_locally_when_remote_fails() {
        let (store, catalog) = catalog();
        catalog.refresh().await; // bundled items, not in the store
        store.set_offline(true);

        let (item, notice) = catalog.toggle_stock("5").await.unwrap();
        assert!(!item.in_stock);
        assert_eq!(notice.message, "Stock update failed - local only");
        assert!(!catalog.find("5").await.unwrap().in_stock);
    }

    #[tokio::test]
    async fn toggle_stock_reports_new_state() {
        let (_, catalog) = catalog();
        let (row, _) = catalog.create(dish("Lime Soda", 35)).await.unwrap();
        let (_, notice) = catalog.toggle_stock(&row.id).await.unwrap();
        assert_eq!(notice.message, "Lime Soda is now Out of Stock");
        let (_, notice) = catalog.toggle_stock(&row.id).await.unwrap();
        assert_eq!(notice.message, "Lime Soda is now In Stock");
    }

    #[tokio::test]
    async fn update_and_delete_apply_regardless_of_remote() {
        let (store, catalog) = catalog();
        catalog.refresh().await;
        store.set_offline(true);

        let patch = FoodItemPatch { price: Some(199), ..Default::default() };
        let (item, notice) = catalog.update("1", patch).await.unwrap();
        assert_eq!(item.price, 199);
        assert_eq!(notice.message, "Update failed - local only");

        let notice = catalog.delete("1").await.unwrap();
        assert_eq!(notice.message, "Delete failed - local only");
        assert!(catalog.find("1").await.is_none());
        assert_eq!(catalog.delete("1").await.unwrap_err(), CatalogError::NotFound);
    }

    #[tokio::test]
    async fn update_trims_names_like_create() {
        let (_, catalog) = catalog();
        catalog.refresh().await;

        let patch = FoodItemPatch { name: Some("  Egg Rice  ".into()), ..Default::default() };
        let (item, _) = catalog.update("1", patch).await.unwrap();
        assert_eq!(item.name, "Egg Rice");
        assert_eq!(catalog.find("1").await.unwrap().name, "Egg Rice");

        let blank = FoodItemPatch { name: Some("   ".into()), ..Default::default() };
        assert_eq!(catalog.update("1", blank).await.unwrap_err(), CatalogError::Invalid);
    }

    #[tokio::test]
    async fn sync_task_refreshes_on_product_changes() {
        let store = Arc::new(MemoryStore::new());
        let catalog = Arc::new(Catalog::new(store.clone()));
        catalog.refresh().await;
        let handle = spawn_catalog_sync(catalog.clone(), store.clone());

        store.insert_product(&dish("Pepper Chicken", 210)).await.unwrap();
        let mut seen = false;
        for _ in 0..50 {
            if catalog.items().await.iter().any(|i| i.name == "Pepper Chicken") {
                seen = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        handle.abort();
        assert!(seen);
    }
}
