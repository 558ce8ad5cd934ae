//! Daily token numbers shown on the kitchen queue and printed on receipts.
//!
//! A token is the 1-based position of an order among all orders created on
//! the same UTC calendar day, oldest first. Tokens are derived from whatever
//! order set is loaded and are never stored.

use std::collections::HashMap;

use time::{Date, OffsetDateTime, UtcOffset};
use uuid::Uuid;

use super::model::Order;

pub fn day_key(created_at: OffsetDateTime) -> Date {
    created_at.to_offset(UtcOffset::UTC).date()
}

#[derive(Debug, Clone, Default)]
pub struct TokenBook {
    tokens: HashMap<Uuid, u32>,
}

impl TokenBook {
    pub fn build(orders: &[Order]) -> Self {
        let mut sorted: Vec<&Order> = orders.iter().collect();
        // Ties on the timestamp fall back to id so the numbering is stable.
        sorted.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let mut tokens = HashMap::with_capacity(sorted.len());
        let mut current: Option<Date> = None;
        let mut rank = 0u32;
        for order in sorted {
            let day = day_key(order.created_at);
            if current != Some(day) {
                current = Some(day);
                rank = 0;
            }
            rank += 1;
            tokens.insert(order.id, rank);
        }
        Self { tokens }
    }

    pub fn token(&self, order_id: Uuid) -> Option<u32> {
        self.tokens.get(&order_id).copied()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::orders::model::{DeliveryZone, OrderStatus, PaymentMethod};
    use time::macros::datetime;

    pub(crate) fn order_at(created_at: OffsetDateTime) -> Order {
        Order {
            id: Uuid::new_v4(),
            created_at,
            user_id: Uuid::new_v4(),
            user_email: "guest@example.com".into(),
            phone: "9876543210".into(),
            location: DeliveryZone::SBlock,
            items: Vec::new(),
            total_amount: 30,
            status: OrderStatus::PendingAcceptance,
            payment_method: PaymentMethod::CashOnDelivery,
        }
    }

    #[test]
    fn tokens_follow_creation_time_not_insertion_order() {
        let later = order_at(datetime!(2025-03-10 09:00:05 UTC));
        let earlier = order_at(datetime!(2025-03-10 09:00:01 UTC));
        let orders = vec![later.clone(), earlier.clone()];

        let book = TokenBook::build(&orders);
        assert_eq!(book.token(earlier.id), Some(1));
        assert_eq!(book.token(later.id), Some(2));
    }

    #[test]
    fn numbering_restarts_each_utc_day() {
        let orders = vec![
            order_at(datetime!(2025-03-11 00:10:00 UTC)),
            order_at(datetime!(2025-03-10 23:59:00 UTC)),
            order_at(datetime!(2025-03-10 08:00:00 UTC)),
            // 02:00 on the 11th in +05:30 is still the 10th in UTC.
            order_at(datetime!(2025-03-11 02:00:00 +05:30)),
        ];
        let book = TokenBook::build(&orders);
        assert_eq!(book.token(orders[0].id), Some(1));
        assert_eq!(book.token(orders[2].id), Some(1));
        assert_eq!(book.token(orders[3].id), Some(2));
        assert_eq!(book.token(orders[1].id), Some(3));
    }

    #[test]
    fn same_day_tokens_are_a_bijection() {
        let base = datetime!(2025-03-12 10:00:00 UTC);
        let mut orders: Vec<Order> = (0..25)
            .map(|i| order_at(base + time::Duration::seconds((i * 37 % 25) as i64)))
            .collect();
        orders.reverse();
        let book = TokenBook::build(&orders);

        let mut tokens: Vec<u32> = orders.iter().filter_map(|o| book.token(o.id)).collect();
        tokens.sort_unstable();
        assert_eq!(tokens, (1..=25).collect::<Vec<_>>());

        for a in &orders {
            for b in &orders {
                if a.created_at < b.created_at {
                    assert!(book.token(a.id) < book.token(b.id));
                }
            }
        }
    }

    #[test]
    fn unknown_order_has_no_token() {
        let orders = vec![order_at(datetime!(2025-03-10 09:00:00 UTC))];
        let stranger = order_at(datetime!(2025-03-10 09:30:00 UTC));
        assert_eq!(TokenBook::build(&orders).token(stranger.id), None);
    }
}
