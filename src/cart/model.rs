use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{menu::model::FoodItem, notice::Notice};

/// Snapshot of a dish at the time it was put in the cart, plus a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub item: FoodItem,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> i64 {
        self.item.price * i64::from(self.quantity)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("{0} is out of stock!")]
    OutOfStock(String),
}

/// Lines in insertion order. Every line has `quantity >= 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn add(&mut self, item: &FoodItem) -> Result<Notice, CartError> {
        if !item.in_stock {
            return Err(CartError::OutOfStock(item.name.clone()));
        }
        match self.lines.iter_mut().find(|l| l.item.id == item.id) {
            Some(line) => line.quantity += 1,
            None => self.lines.push(CartLine { item: item.clone(), quantity: 1 }),
        }
        Ok(Notice::success(format!("{} added!", item.name)))
    }

    /// Takes one unit off the line; the line goes away with its last unit.
    pub fn remove(&mut self, item_id: &str) {
        let Some(pos) = self.lines.iter().position(|l| l.item.id == item_id) else {
            return;
        };
        if self.lines[pos].quantity > 1 {
            self.lines[pos].quantity -= 1;
        } else {
            self.lines.remove(pos);
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn subtotal(&self) -> i64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}
