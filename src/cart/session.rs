//! Per-customer state: the cart and where the last checkout got to.

use std::{collections::HashMap, sync::Mutex};

use serde::Serialize;
use uuid::Uuid;

use super::model::{Cart, CartError};
use crate::{menu::model::FoodItem, notice::Notice, orders::placement::Placement};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CustomerSession {
    pub cart: Cart,
    pub placement: Placement,
}

impl CustomerSession {
    /// Adding anything after a successful order starts a fresh checkout.
    pub fn add(&mut self, item: &FoodItem) -> Result<Notice, CartError> {
        let notice = self.cart.add(item)?;
        if self.placement == Placement::Success {
            self.placement = Placement::Idle;
        }
        Ok(notice)
    }
}

/// Every signed-in customer's session, keyed by auth user id.
#[derive(Default)]
pub struct Sessions {
    inner: Mutex<HashMap<Uuid, CustomerSession>>,
}

impl Sessions {
    /// Runs `f` against the user's session, creating an empty one first if needed.
    pub fn with<R>(&self, user: Uuid, f: impl FnOnce(&mut CustomerSession) -> R) -> R {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(map.entry(user).or_default())
    }

    pub fn snapshot(&self, user: Uuid) -> CustomerSession {
        let map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.get(&user).cloned().unwrap_or_default()
    }

    pub fn end(&self, user: Uuid) {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(&user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::model::default_items;

    #[test]
    fn sessions_are_isolated_per_user() {
        let sessions = Sessions::default();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let items = default_items();
        sessions.with(a, |s| s.add(&items[0])).unwrap();
        sessions.with(b, |s| s.add(&items[1])).unwrap();
        sessions.with(b, |s| s.add(&items[1])).unwrap();

        assert_eq!(sessions.snapshot(a).cart.total_quantity(), 1);
        assert_eq!(sessions.snapshot(b).cart.total_quantity(), 2);
        sessions.end(a);
        assert!(sessions.snapshot(a).cart.is_empty());
        assert_eq!(sessions.snapshot(Uuid::new_v4()), CustomerSession::default());
    }

    #[test]
    fn adding_after_success_resets_placement() {
        let mut session = CustomerSession { placement: Placement::Success, ..Default::default() };
        session.add(&default_items()[0]).unwrap();
        assert_eq!(session.placement, Placement::Idle);

        session.placement = Placement::Processing;
        session.add(&default_items()[0]).unwrap();
        assert_eq!(session.placement, Placement::Processing);
    }
}
