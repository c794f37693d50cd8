//! Watch mode: the long-running auto-sync driver.
//!
//! Periodically re-derives repository status (debounced, so a burst of
//! ticks collapses to one check) and optionally runs the full sync
//! pipeline on each tick.

use crate::error::Result;
use crate::pipeline::{ops, SyncContext};
use crate::services::sched::Debouncer;
use std::sync::Arc;

/// Periodic status-check / sync driver
pub struct AutoSync {
    ctx: Arc<SyncContext>,
    debouncer: Debouncer,
}

impl AutoSync {
    pub fn new(ctx: Arc<SyncContext>) -> Self {
        let debouncer = Debouncer::new(ctx.config.timing.debounce_window());
        Self { ctx, debouncer }
    }

    /// Run until the surrounding task is cancelled
    pub async fn run(&self) -> Result<()> {
        if self.ctx.config.watch.check_synced {
            if let Err(error) = ops::check_synced(&self.ctx).await {
                tracing::warn!("Startup sync check failed: {}", error);
            }
        }

        let mut ticker = tokio::time::interval(self.ctx.config.watch.interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if self.ctx.config.watch.auto_sync {
                match ops::sync(&self.ctx).await {
                    Ok(manager) => {
                        if !manager.lock().await.success() {
                            tracing::warn!("Sync pipeline failed; retry is scheduled");
                        }
                    }
                    Err(error) => tracing::warn!("Sync pipeline error: {}", error),
                }
            } else {
                let ctx = Arc::clone(&self.ctx);
                self.debouncer.call(async move {
                    ops::check(&ctx).await.map(|_| ())
                });
            }
        }
    }
}
