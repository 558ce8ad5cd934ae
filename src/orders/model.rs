use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::cart::model::CartLine;

pub use super::workflow::OrderStatus;

/// Flat fee added to every order, in rupees.
pub const DELIVERY_FEE: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryZone {
    #[serde(rename = "S-block")]
    SBlock,
    #[serde(rename = "G-block")]
    GBlock,
    #[serde(rename = "IST Building")]
    IstBuilding,
}

impl DeliveryZone {
    pub const ALL: [DeliveryZone; 3] =
        [DeliveryZone::SBlock, DeliveryZone::GBlock, DeliveryZone::IstBuilding];

    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryZone::SBlock => "S-block",
            DeliveryZone::GBlock => "G-block",
            DeliveryZone::IstBuilding => "IST Building",
        }
    }
}

impl fmt::Display for DeliveryZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeliveryZone::ALL
            .into_iter()
            .find(|z| z.as_str() == s)
            .ok_or_else(|| format!("unknown delivery zone `{s}`"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "COD")]
    CashOnDelivery,
    /// Listed at checkout but not accepted yet.
    #[serde(rename = "GPay")]
    GPay,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "COD",
            PaymentMethod::GPay => "GPay",
        }
    }

    pub fn is_enabled(self) -> bool {
        matches!(self, PaymentMethod::CashOnDelivery)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COD" => Ok(PaymentMethod::CashOnDelivery),
            "GPay" => Ok(PaymentMethod::GPay),
            other => Err(format!("unknown payment method `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub user_id: Uuid,
    pub user_email: String,
    pub phone: String,
    pub location: DeliveryZone,
    pub items: Vec<CartLine>,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
}

/// Row written when an order is placed. Items are frozen copies of the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub user_email: String,
    pub phone: String,
    pub location: DeliveryZone,
    pub items: Vec<CartLine>,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
}

impl NewOrder {
    pub fn into_order(self, id: Uuid, created_at: OffsetDateTime) -> Order {
        Order {
            id,
            created_at,
            user_id: self.user_id,
            user_email: self.user_email,
            phone: self.phone,
            location: self.location,
            items: self.items,
            total_amount: self.total_amount,
            status: self.status,
            payment_method: self.payment_method,
        }
    }
}

/// Sum of line totals plus the delivery fee.
pub fn order_total(items: &[CartLine]) -> i64 {
    items.iter().map(CartLine::line_total).sum::<i64>() + DELIVERY_FEE
}
