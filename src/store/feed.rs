//! Row-level change feed.
//!
//! Store backends publish one [`ChangeEvent`] per inserted, updated or
//! deleted row into a [`FeedHub`]; consumers subscribe with a [`FeedFilter`]
//! and re-fetch whatever they display when something relevant changes.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

const HUB_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Products,
    Orders,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
}

/// `*`, or a single event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
    Any,
    Only(ChangeKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFilter {
    pub table: Table,
    pub event: EventFilter,
    pub user_email: Option<String>,
}

impl FeedFilter {
    pub fn all(table: Table) -> Self {
        Self { table, event: EventFilter::Any, user_email: None }
    }

    pub fn only(mut self, kind: ChangeKind) -> Self {
        self.event = EventFilter::Only(kind);
        self
    }

    pub fn for_user(mut self, email: impl Into<String>) -> Self {
        self.user_email = Some(email.into());
        self
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if event.table != self.table {
            return false;
        }
        if let EventFilter::Only(kind) = self.event {
            if event.kind != kind {
                return false;
            }
        }
        match &self.user_email {
            Some(email) => event.user_email.as_deref() == Some(email.as_str()),
            None => true,
        }
    }
}

pub struct Subscription {
    rx: broadcast::Receiver<ChangeEvent>,
    filter: FeedFilter,
}

impl Subscription {
    /// Waits for the next event matching the filter. `None` once the feed is gone.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, table = ?self.filter.table, "change feed subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// In-process fan-out shared by every subscriber of one backend.
#[derive(Clone)]
pub struct FeedHub {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for FeedHub {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(HUB_CAPACITY);
        Self { tx }
    }
}

impl FeedHub {
    pub fn publish(&self, event: ChangeEvent) {
        if self.tx.send(event).is_err() {
            debug!("change event dropped, no subscribers");
        }
    }

    pub fn subscribe(&self, filter: FeedFilter) -> Subscription {
        Subscription { rx: self.tx.subscribe(), filter }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_event(kind: ChangeKind, email: &str) -> ChangeEvent {
        ChangeEvent {
            table: Table::Orders,
            kind,
            id: Some("o1".into()),
            user_email: Some(email.into()),
        }
    }

    #[test]
    fn filter_by_table_event_and_user() {
        let f = FeedFilter::all(Table::Orders).only(ChangeKind::Update).for_user("a@x.in");
        assert!(f.matches(&order_event(ChangeKind::Update, "a@x.in")));
        assert!(!f.matches(&order_event(ChangeKind::Insert, "a@x.in")));
        assert!(!f.matches(&order_event(ChangeKind::Update, "b@x.in")));
        assert!(FeedFilter::all(Table::Orders).matches(&order_event(ChangeKind::Delete, "b@x.in")));
        assert!(!FeedFilter::all(Table::Products).matches(&order_event(ChangeKind::Insert, "a@x.in")));
    }

    #[test]
    fn parses_trigger_payload() {
        let raw = r#"{"table":"orders","type":"INSERT","id":"42","user_email":"a@x.in"}"#;
        let ev: ChangeEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(ev.kind, ChangeKind::Insert);
        assert_eq!(ev.table, Table::Orders);

        let raw = r#"{"table":"products","type":"DELETE","id":"7","user_email":null}"#;
        let ev: ChangeEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(ev.user_email, None);
    }

    #[tokio::test]
    async fn subscription_skips_non_matching_events() {
        let hub = FeedHub::default();
        let mut sub = hub.subscribe(FeedFilter::all(Table::Orders).only(ChangeKind::Insert));
        hub.publish(order_event(ChangeKind::Update, "a@x.in"));
        hub.publish(order_event(ChangeKind::Insert, "a@x.in"));
        let ev = sub.next().await.unwrap();
        assert_eq!(ev.kind, ChangeKind::Insert);
    }
}
