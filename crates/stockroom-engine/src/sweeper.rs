//! # Reservation Sweeper
//!
//! Background task that returns stock held by reservations nobody
//! committed or released (a crashed request, a failed compensation).
//!
//! ```text
//!   every `interval`:  held reservations older than `ttl` ──► released
//!   shutdown():        loop exits after the current pass
//! ```

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::ledger::InventoryLedger;

#[derive(Debug, Clone, Copy)]
pub struct SweeperConfig {
    /// Age after which a held reservation is released.
    pub ttl: Duration,
    /// Time between passes.
    pub interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        SweeperConfig {
            ttl: Duration::from_secs(15 * 60),
            interval: Duration::from_secs(60),
        }
    }
}

pub struct ReservationSweeper {
    ledger: InventoryLedger,
    config: SweeperConfig,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping a running sweeper.
#[derive(Clone)]
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl SweeperHandle {
    /// Asks the sweeper to stop. A sweeper that already stopped is fine.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl ReservationSweeper {
    pub fn new(ledger: InventoryLedger, config: SweeperConfig) -> (Self, SweeperHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        (
            ReservationSweeper {
                ledger,
                config,
                shutdown_rx,
            },
            SweeperHandle { shutdown_tx },
        )
    }

    /// Creates a sweeper and spawns its loop.
    pub fn spawn(ledger: InventoryLedger, config: SweeperConfig) -> (SweeperHandle, JoinHandle<()>) {
        let (sweeper, handle) = ReservationSweeper::new(ledger, config);
        (handle, tokio::spawn(sweeper.run()))
    }

    pub async fn run(mut self) {
        info!(
            ttl_secs = self.config.ttl.as_secs(),
            interval_secs = self.config.interval.as_secs(),
            "Reservation sweeper starting"
        );

        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.ledger.release_expired(self.config.ttl).await {
                        error!(error = %e, "Reservation sweep failed");
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Reservation sweeper shutting down");
                    break;
                }
            }
        }

        info!("Reservation sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{db, stock_of, with_product};

    #[tokio::test]
    async fn test_sweeper_releases_stale_holds_and_stops() {
        let db = db().await;
        let p = with_product(&db, "Cable", 100, 3).await;
        let ledger = InventoryLedger::new(db.clone());
        ledger.reserve(&p.id, 3).await.unwrap();

        let config = SweeperConfig {
            ttl: Duration::from_millis(1),
            interval: Duration::from_millis(10),
        };
        let (handle, task) = ReservationSweeper::spawn(ledger, config);

        let mut restored = false;
        for _ in 0..100 {
            if stock_of(&db, &p.id).await == 3 {
                restored = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(restored, "sweeper never released the hold");

        handle.shutdown().await;
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
