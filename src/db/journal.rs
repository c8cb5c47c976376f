//! Write-behind handle over the journal database.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::Database;
use crate::models::{Position, Trade};

/// Something the desk did that the journal should keep.
#[derive(Debug, Clone)]
pub enum JournalEvent {
    /// A successful fill and the position it left behind
    Fill {
        trade: Trade,
        position: Option<Position>,
    },
    /// A day boundary with the fresh opening balances
    DayReset {
        start_balance_a: Decimal,
        start_balance_b: Decimal,
    },
}

/// Sender side of the journal. Cheap to clone; writes happen on a background task.
#[derive(Debug, Clone)]
pub struct Journal {
    tx: mpsc::UnboundedSender<JournalEvent>,
}

impl Journal {
    /// Start the writer task. The task ends once every `Journal` clone is dropped.
    pub fn spawn(db: Arc<Database>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<JournalEvent>();

        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = write_event(&db, &event).await {
                    warn!("Journal write failed: {:#}", e);
                }
            }
            debug!("Journal writer stopped");
        });

        (Self { tx }, handle)
    }

    /// Queue an event. Never blocks and never fails the caller.
    pub fn notify(&self, event: JournalEvent) {
        if self.tx.send(event).is_err() {
            warn!("Journal writer is gone; event dropped");
        }
    }
}

async fn write_event(db: &Database, event: &JournalEvent) -> anyhow::Result<()> {
    match event {
        JournalEvent::Fill { trade, position } => {
            db.record_trade(trade).await?;
            if let Some(position) = position {
                db.save_position(position).await?;
            }
        }
        JournalEvent::DayReset {
            start_balance_a,
            start_balance_b,
        } => {
            db.record_reset(*start_balance_a, *start_balance_b).await?;
        }
    }
    Ok(())
}
