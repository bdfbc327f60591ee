//! Background poll loop
//!
//! Runs one engine cycle, then sleeps for the engine's *current* poll period,
//! so `/poll` takes effect on the next tick. Stops when the shutdown flag flips.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::core::engine::TradeMachine;

/// Spawn the loop; flip the paired `watch::Sender` to `true` to stop it
pub fn spawn(engine: Arc<TradeMachine>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("⏱️ Scheduler started (poll={}s)", engine.poll_seconds());
        loop {
            if *shutdown.borrow() {
                break;
            }
            engine.run_cycle().await;

            let wait = Duration::from_secs(engine.poll_seconds());
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                changed = shutdown.changed() => {
                    // sender dropped counts as shutdown too
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("⏹️ Scheduler stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::EngineSettings;
    use crate::models::types::{Chain, PairQuote};
    use crate::providers::market::MarketData;
    use crate::telegram::notifier::LogNotifier;
    use async_trait::async_trait;

    struct NoMarket;

    #[async_trait]
    impl MarketData for NoMarket {
        async fn best_pair(&self, _token: &str) -> Option<PairQuote> {
            None
        }
        async fn base_price_usd(&self, _chain: Chain) -> Option<f64> {
            None
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_and_stops() {
        let engine = Arc::new(TradeMachine::new(
            EngineSettings::default(),
            Arc::new(NoMarket),
            Arc::new(LogNotifier),
        ));
        engine.set_poll(10);
        let (tx, rx) = watch::channel(false);
        let handle = spawn(engine.clone(), rx);

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(engine.cycle(), 3);

        tx.send(true).unwrap();
        handle.await.unwrap();
        let after = engine.cycle();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(engine.cycle(), after);
    }
}
