//! Session sweeper — periodic removal of sessions the host never cleaned up.
//!
//! Hosts are expected to call `cleanup` when a render finishes. When one
//! does not, its session would live until process exit; the sweeper bounds
//! that by dropping sessions older than `SweepConfig::max_age_secs`. It is a
//! liveness net, not part of the correctness contract, and is off by default.

use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{debug, info};

use crate::config::SweepConfig;
use crate::session::RenderSessionRegistry;

// ─────────────────────────────────────────────
// SessionSweeper
// ─────────────────────────────────────────────

/// Background task that periodically sweeps expired sessions.
pub struct SessionSweeper {
    registry: Arc<RenderSessionRegistry>,
    config: SweepConfig,
    /// Shutdown signal.
    shutdown: Arc<Notify>,
}

impl SessionSweeper {
    /// Create a sweeper for `registry`.
    pub fn new(registry: Arc<RenderSessionRegistry>, config: SweepConfig) -> Self {
        Self {
            registry,
            config,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Run the sweep loop until `stop()` is called.
    pub async fn start(&self) {
        if !self.config.enabled {
            info!("session sweeper disabled");
            // Park until shutdown
            self.shutdown.notified().await;
            return;
        }

        info!(
            interval_s = self.config.interval_secs,
            max_age_s = self.config.max_age_secs,
            "session sweeper started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.config.interval()) => {
                    self.tick();
                }
                _ = self.shutdown.notified() => {
                    info!("session sweeper shutting down");
                    return;
                }
            }
        }
    }

    /// Stop the sweep loop.
    pub fn stop(&self) {
        info!("stopping session sweeper");
        self.shutdown.notify_one();
    }

    /// Run a single sweep, returning how many sessions were removed.
    pub fn tick(&self) -> usize {
        let removed = self.registry.sweep_older_than(self.config.max_age());
        if removed > 0 {
            info!(removed, remaining = self.registry.len(), "swept expired render sessions");
        } else {
            debug!("sweep: no expired render sessions");
        }
        removed
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sweep_config(enabled: bool, max_age_secs: u64) -> SweepConfig {
        SweepConfig {
            enabled,
            interval_secs: 1,
            max_age_secs,
        }
    }

    #[test]
    fn test_tick_removes_expired() {
        let registry = Arc::new(RenderSessionRegistry::new());
        let id = registry.create();
        std::thread::sleep(Duration::from_millis(30));

        let sweeper = SessionSweeper::new(registry.clone(), sweep_config(true, 0));
        assert_eq!(sweeper.tick(), 1);
        assert!(!registry.contains(&id));
    }

    #[test]
    fn test_tick_keeps_fresh() {
        let registry = Arc::new(RenderSessionRegistry::new());
        registry.create();

        let sweeper = SessionSweeper::new(registry.clone(), sweep_config(true, 3600));
        assert_eq!(sweeper.tick(), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_tick_with_unbounded_max_age() {
        let registry = Arc::new(RenderSessionRegistry::new());
        registry.create();

        let sweeper = SessionSweeper::new(registry.clone(), sweep_config(true, u64::MAX));
        assert_eq!(sweeper.tick(), 0);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_stop_exits_loop() {
        let registry = Arc::new(RenderSessionRegistry::new());
        let sweeper = Arc::new(SessionSweeper::new(registry, sweep_config(true, 20)));

        let svc = sweeper.clone();
        let handle = tokio::spawn(async move { svc.start().await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        sweeper.stop();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_disabled_parks_until_stop() {
        let registry = Arc::new(RenderSessionRegistry::new());
        let sweeper = Arc::new(SessionSweeper::new(registry, sweep_config(false, 20)));

        let svc = sweeper.clone();
        let handle = tokio::spawn(async move { svc.start().await });
        sweeper.stop();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_loop_sweeps_expired_sessions() {
        let registry = Arc::new(RenderSessionRegistry::new());
        registry.create();
        let sweeper = Arc::new(SessionSweeper::new(registry.clone(), sweep_config(true, 0)));

        let svc = sweeper.clone();
        let handle = tokio::spawn(async move { svc.start().await });

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(registry.is_empty());

        sweeper.stop();
        handle.await.unwrap();
    }
}
