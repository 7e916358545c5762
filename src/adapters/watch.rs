//! Order File Watch - Recompute When the Order Document Changes
//!
//! Periodically re-reads the order document and compares a hash of its
//! contents with the last one seen. On change the workbench re-imports
//! and recomputes in the calling thread, so one pass always finishes
//! before the next poll and results can never arrive out of order.
//!
//! Polling rather than a filesystem watcher keeps behaviour identical
//! across Linux/macOS/Docker volumes.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::persistence::JsonFileStore;
use crate::config::WatchConfig;
use crate::usecases::{SettlementResult, Workbench};

/// Polls one order document and drives recalculations.
pub struct OrderWatcher {
    store: JsonFileStore,
    interval: Duration,
    /// Hash of the last contents seen (`None` when the file was unreadable).
    last_hash: Option<u64>,
    /// Whether anything has been polled yet.
    primed: bool,
}

impl OrderWatcher {
    pub fn new(path: impl AsRef<Path>, config: &WatchConfig) -> Self {
        Self {
            store: JsonFileStore::new(path),
            interval: Duration::from_millis(config.poll_interval_ms),
            last_hash: None,
            primed: false,
        }
    }

    /// Check once. Returns a fresh result only when the file changed and
    /// imported cleanly; a failed import keeps the workbench as it was.
    pub fn poll(&mut self, bench: &mut Workbench) -> Option<SettlementResult> {
        let hash = self.compute_hash();
        if self.primed && hash == self.last_hash {
            debug!("Order file unchanged");
            return None;
        }
        self.primed = true;
        self.last_hash = hash;

        match bench.import(&self.store) {
            Ok(makers) => {
                info!(makers, "Order file change detected, recomputed");
                Some(bench.compute())
            }
            Err(e) => {
                warn!(
                    error = %format!("{e:#}"),
                    "Failed to reload orders, keeping previous result"
                );
                None
            }
        }
    }

    /// Poll forever, handing every fresh result to `on_result`.
    pub fn run(&mut self, bench: &mut Workbench, mut on_result: impl FnMut(&SettlementResult)) -> ! {
        info!(
            path = %self.store.path().display(),
            interval_ms = self.interval_ms(),
            "Order watcher started"
        );

        loop {
            if let Some(result) = self.poll(bench) {
                on_result(&result);
            }
            thread::sleep(self.interval);
        }
    }

    pub fn interval_ms(&self) -> u64 {
        u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX)
    }

    fn compute_hash(&self) -> Option<u64> {
        let content = self.store.read_raw().ok()?;
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        Some(hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LimitsConfig;
    use tempfile::TempDir;

    const VALID: &str = r#"{
        "takerOrder": {"side": "BUY", "token": "YES", "makerAmount": 50, "takerAmount": 100, "making": 50},
        "makerOrders": [{"side": "SELL", "token": "YES", "makerAmount": 100, "takerAmount": 50, "making": 100}]
    }"#;

    #[test]
    fn test_recomputes_only_on_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("orders.json");
        std::fs::write(&path, VALID).unwrap();

        let mut bench = Workbench::new(&LimitsConfig::default());
        let mut watcher = OrderWatcher::new(&path, &WatchConfig::default());

        let first = watcher.poll(&mut bench).unwrap();
        assert!(first.is_success());
        assert!(watcher.poll(&mut bench).is_none());

        std::fs::write(&path, VALID.replace("\"making\": 50", "\"making\": 0")).unwrap();
        let second = watcher.poll(&mut bench).unwrap();
        assert!(second.summary.is_none());
    }

    #[test]
    fn test_interval_reported_without_truncation() {
        let config = WatchConfig {
            poll_interval_ms: u64::MAX,
        };
        let watcher = OrderWatcher::new("orders.json", &config);
        assert_eq!(watcher.interval_ms(), u64::MAX);
        assert_eq!(OrderWatcher::new("orders.json", &WatchConfig::default()).interval_ms(), 500);
    }

    #[test]
    fn test_bad_document_keeps_workbench() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("orders.json");
        std::fs::write(&path, VALID).unwrap();

        let mut bench = Workbench::new(&LimitsConfig::default());
        let mut watcher = OrderWatcher::new(&path, &WatchConfig::default());
        watcher.poll(&mut bench).unwrap();

        std::fs::write(&path, r#"{"takerOrder": {"side": "BUY", "token": "YES"}}"#).unwrap();
        assert!(watcher.poll(&mut bench).is_none());
        assert_eq!(bench.makers().len(), 1);
        assert!(bench.compute().is_success());
    }
}
