use std::{io::Write, sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info, warn};

use super::board::KitchenBoard;
use crate::store::{ChangeFeed, ChangeKind, FeedFilter, Table};

/// Audible cue for a new order. Best effort: a failure is logged and the
/// dashboard carries on.
pub trait Chime: Send + Sync {
    fn ring(&self) -> std::io::Result<()>;
}

/// Rings the terminal bell on stderr.
pub struct TerminalBell;

impl Chime for TerminalBell {
    fn ring(&self) -> std::io::Result<()> {
        let mut err = std::io::stderr();
        err.write_all(b"\x07")?;
        err.flush()
    }
}

/// Keeps the board current: every order change and every poll tick triggers
/// a re-fetch, and inserts also ring the chime.
pub fn spawn_kitchen_sync(
    board: Arc<KitchenBoard>,
    feed: Arc<dyn ChangeFeed>,
    chime: Arc<dyn Chime>,
    poll_every: Duration,
) -> JoinHandle<()> {
    let mut sub = feed.subscribe(FeedFilter::all(Table::Orders));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; the initial load already happened.
        ticker.tick().await;

        loop {
            tokio::select! {
                event = sub.next() => {
                    let Some(event) = event else {
                        warn!("order change feed closed, falling back to polling only");
                        break;
                    };
                    debug!(kind = ?event.kind, id = ?event.id, "order change");
                    board.refresh().await;
                    if event.kind == ChangeKind::Insert {
                        let seq = board.bump_alert();
                        info!(alert_seq = seq, "new order received");
                        if let Err(e) = chime.ring() {
                            warn!(error = %e, "new-order chime failed");
                        }
                    }
                }
                _ = ticker.tick() => {
                    debug!("kitchen poll tick");
                    board.refresh().await;
                }
            }
        }

        loop {
            ticker.tick().await;
            board.refresh().await;
        }
    })
}
