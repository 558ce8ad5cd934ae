//! Order lifecycle.
//!
//! `Pending Acceptance -> Preparing -> Ready -> Delivered`, with `Cancelled`
//! reachable from any state that is not terminal. The kitchen moves orders
//! forward one step at a time through [`KitchenAction`]s. The store itself
//! does not enforce any of this: a status update is a plain column write.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Pending Acceptance")]
    PendingAcceptance,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const INITIAL: OrderStatus = OrderStatus::PendingAcceptance;

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::PendingAcceptance => "Pending Acceptance",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::Ready => "Ready",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Forward successor, if any.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::PendingAcceptance => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn can_become(self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == OrderStatus::Cancelled || self.next() == Some(next)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            OrderStatus::PendingAcceptance,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ]
        .into_iter()
        .find(|st| st.as_str() == s)
        .ok_or_else(|| format!("unknown order status `{s}`"))
    }
}

/// Buttons on the kitchen dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KitchenAction {
    Accept,
    MarkReady,
    ConfirmDelivered,
}

impl KitchenAction {
    pub fn requires(self) -> OrderStatus {
        match self {
            KitchenAction::Accept => OrderStatus::PendingAcceptance,
            KitchenAction::MarkReady => OrderStatus::Preparing,
            KitchenAction::ConfirmDelivered => OrderStatus::Ready,
        }
    }

    pub fn target(self) -> OrderStatus {
        match self {
            KitchenAction::Accept => OrderStatus::Preparing,
            KitchenAction::MarkReady => OrderStatus::Ready,
            KitchenAction::ConfirmDelivered => OrderStatus::Delivered,
        }
    }

    /// The single action offered for an order in `status`.
    pub fn available_for(status: OrderStatus) -> Option<KitchenAction> {
        match status {
            OrderStatus::PendingAcceptance => Some(KitchenAction::Accept),
            OrderStatus::Preparing => Some(KitchenAction::MarkReady),
            OrderStatus::Ready => Some(KitchenAction::ConfirmDelivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            KitchenAction::Accept => "Accept Order",
            KitchenAction::MarkReady => "Mark as Ready",
            KitchenAction::ConfirmDelivered => "Confirm Delivered",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 5] = [
        OrderStatus::PendingAcceptance,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    fn rank(s: OrderStatus) -> usize {
        [
            OrderStatus::PendingAcceptance,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivered,
        ]
        .iter()
        .position(|x| *x == s)
        .unwrap_or(usize::MAX)
    }

    #[test]
    fn walks_forward_to_delivered() {
        let mut status = OrderStatus::INITIAL;
        let mut seen = vec![status];
        while let Some(action) = KitchenAction::available_for(status) {
            assert_eq!(action.requires(), status);
            assert!(status.can_become(action.target()));
            status = action.target();
            seen.push(status);
        }
        assert_eq!(
            seen,
            vec![
                OrderStatus::PendingAcceptance,
                OrderStatus::Preparing,
                OrderStatus::Ready,
                OrderStatus::Delivered
            ]
        );
    }

    #[test]
    fn no_action_regresses_a_status() {
        for status in ALL {
            if let Some(action) = KitchenAction::available_for(status) {
                assert_eq!(rank(action.target()), rank(status) + 1);
            }
        }
    }

    #[test]
    fn no_skipping_and_no_backwards() {
        assert!(!OrderStatus::PendingAcceptance.can_become(OrderStatus::Ready));
        assert!(!OrderStatus::Ready.can_become(OrderStatus::Preparing));
        assert!(!OrderStatus::Delivered.can_become(OrderStatus::Cancelled));
        assert!(OrderStatus::Preparing.can_become(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_become(OrderStatus::PendingAcceptance));
    }

    #[test]
    fn wire_names_round_trip() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::PendingAcceptance).unwrap(),
            "\"Pending Acceptance\""
        );
        for status in ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
    }
}
