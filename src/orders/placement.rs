//! Checkout: turn a customer's cart into a `Pending Acceptance` order.
//!
//! Every field is validated before the store is touched. The cart is only
//! cleared once the insert has succeeded; on failure it stays as it was so
//! the customer can retry.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::model::{order_total, DeliveryZone, NewOrder, Order, OrderStatus, PaymentMethod};
use crate::{cart::session::Sessions, store::OrderStore};

/// Where the customer's most recent checkout stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    #[default]
    Idle,
    Processing,
    Success,
}

/// Checkout form as submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct Checkout {
    #[serde(default)]
    pub phone: String,
    pub location: String,
    pub payment_method: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("Please enter a valid 10-digit mobile number")]
    InvalidPhone,
    #[error("Please choose a delivery location")]
    UnknownZone,
    #[error("GPay is currently being configured. Please use COD for now.")]
    PaymentUnavailable,
    #[error("An order is already being placed")]
    InProgress,
    #[error("Order failed: {0}")]
    Remote(String),
}

pub(crate) fn is_valid_phone(phone: &str) -> bool {
    lazy_static! {
        static ref PHONE_RE: Regex = Regex::new(r"^[0-9]{10}$").unwrap();
    }
    PHONE_RE.is_match(phone)
}

impl Checkout {
    /// Local checks only; nothing here talks to the store.
    pub fn validate(&self) -> Result<(String, DeliveryZone, PaymentMethod), PlacementError> {
        let payment = self
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|_| PlacementError::PaymentUnavailable)?;
        if !payment.is_enabled() {
            return Err(PlacementError::PaymentUnavailable);
        }
        let phone = self.phone.trim();
        if !is_valid_phone(phone) {
            return Err(PlacementError::InvalidPhone);
        }
        let zone = self.location.parse::<DeliveryZone>().map_err(|_| PlacementError::UnknownZone)?;
        Ok((phone.to_string(), zone, payment))
    }
}

/// Holds a session in `Processing`. Dropping it without `succeed()`, including
/// when the request future itself is dropped, puts the session back to `Idle`.
struct InFlight<'a> {
    sessions: &'a Sessions,
    user_id: Uuid,
    settled: bool,
}

impl InFlight<'_> {
    fn succeed(mut self) {
        self.settled = true;
        self.sessions.with(self.user_id, |s| {
            s.cart.clear();
            s.placement = Placement::Success;
        });
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.sessions.with(self.user_id, |s| {
                if s.placement == Placement::Processing {
                    s.placement = Placement::Idle;
                }
            });
        }
    }
}

/// Places the user's cart as a new order.
pub async fn place_order(
    sessions: &Sessions,
    store: &dyn OrderStore,
    user_id: Uuid,
    user_email: &str,
    checkout: &Checkout,
) -> Result<Order, PlacementError> {
    let (phone, location, payment_method) = checkout.validate().map_err(|e| {
        warn!(%user_id, error = %e, "checkout rejected");
        e
    })?;

    let items = sessions.with(user_id, |s| {
        if s.placement == Placement::Processing {
            return Err(PlacementError::InProgress);
        }
        if s.cart.is_empty() {
            return Err(PlacementError::EmptyCart);
        }
        s.placement = Placement::Processing;
        Ok(s.cart.lines().to_vec())
    })?;
    let in_flight = InFlight { sessions, user_id, settled: false };

    let new_order = NewOrder {
        user_id,
        user_email: user_email.to_string(),
        phone,
        location,
        total_amount: order_total(&items),
        items,
        status: OrderStatus::INITIAL,
        payment_method,
    };

    match store.insert_order(&new_order).await {
        Ok(order) => {
            in_flight.succeed();
            info!(order_id = %order.id, total = order.total_amount, "order placed");
            Ok(order)
        }
        Err(e) => {
            drop(in_flight);
            error!(%user_id, error = %e, "order insert failed");
            Err(PlacementError::Remote(e.to_string()))
        }
    }
}
