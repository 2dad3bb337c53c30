//! Periodic expiry sweep over both stores.

use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::medium::StorageMedium;
use crate::stores::{LinkStore, ResourceStore};
use crate::table::PurgeStats;

/// What one sweep did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub links: PurgeStats,
    /// Link token length after recalculation
    pub link_token_length: usize,
    pub files: PurgeStats,
}

/// Entry point for the periodic trigger
///
/// Each sweep runs, in order: link purge, link token-length recalculation,
/// file purge.
pub struct Sweeper<M> {
    links: LinkStore,
    files: ResourceStore<M>,
}

impl<M> Clone for Sweeper<M> {
    fn clone(&self) -> Self {
        Self {
            links: self.links.clone(),
            files: self.files.clone(),
        }
    }
}

impl<M: StorageMedium> Sweeper<M> {
    pub fn new(links: LinkStore, files: ResourceStore<M>) -> Self {
        Self { links, files }
    }

    /// Runs one sweep, treating `now` as the current time
    pub async fn sweep_at(&self, now: Instant) -> SweepReport {
        let links = self.links.purge_at(now);
        let link_token_length = self.links.recalculate_length();
        let files = self.files.purge_at(now).await;

        tracing::info!(
            "links: time: {:?}, loops: {}, deleted: {}, token length: {}",
            links.elapsed,
            links.scanned,
            links.deleted,
            link_token_length
        );
        tracing::info!(
            "files: time: {:?}, loops: {}, deleted: {}, delete failures: {}",
            files.elapsed,
            files.scanned,
            files.deleted,
            files.delete_failures
        );

        SweepReport {
            links,
            link_token_length,
            files,
        }
    }

    pub async fn sweep(&self) -> SweepReport {
        self.sweep_at(Instant::now()).await
    }

    /// Spawns a background task that sweeps every `interval`
    ///
    /// The first sweep happens one full interval after spawning. The task
    /// stops when the returned handle is shut down or dropped.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context.
    pub fn spawn(self, interval: Duration) -> SweeperHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(interval, shutdown_rx));
        SweeperHandle { shutdown_tx, task }
    }

    async fn run(self, interval: Duration, mut shutdown_rx: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Skip the immediate first tick
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        tracing::debug!("sweeper stopped");
                        break;
                    }
                }
            }
        }
    }
}

/// Handle to a running background sweep
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals the background task to stop after its current sweep
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::medium::DiskMedium;
    use std::sync::Arc;

    struct Fixture {
        _dir: tempfile::TempDir,
        links: LinkStore,
        files: ResourceStore<DiskMedium>,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::default();
        let medium = Arc::new(DiskMedium::new(dir.path()));
        Fixture {
            links: LinkStore::new(&config),
            files: ResourceStore::new(&config, medium),
            _dir: dir,
        }
    }

    fn file(fx: &Fixture, key: &str, ttl: Duration) -> String {
        std::fs::write(fx.files.medium().root().join(key), b"data").unwrap();
        let metadata = crate::FileMetadata {
            storage_key: key.to_string(),
            original_name: format!("{key}.txt"),
            mime_type: "text/plain".to_string(),
        };
        fx.files.create(metadata, Some(ttl)).unwrap().0.token().to_string()
    }

    #[tokio::test]
    async fn test_sweep_purges_both_stores() {
        let fx = fixture();
        fx.links.create("https://a.io", Some(Duration::from_millis(1))).unwrap();
        let (live_link, _) = fx.links.create("https://b.io", None).unwrap();
        file(&fx, "old", Duration::from_millis(1));
        let live_file = file(&fx, "fresh", Duration::from_secs(60));

        let sweeper = Sweeper::new(fx.links.clone(), fx.files.clone());
        let report = sweeper.sweep_at(Instant::now() + Duration::from_secs(1)).await;

        assert_eq!(report.links.scanned, 2);
        assert_eq!(report.links.deleted, 1);
        assert_eq!(report.files.deleted, 1);
        assert_eq!(report.files.delete_failures, 0);
        assert_eq!(report.link_token_length, 3);

        assert!(fx.links.find(live_link.token()).is_ok());
        assert!(fx.files.find(&live_file).await.is_ok());
        assert!(!fx.files.medium().root().join("old").exists());
    }

    #[tokio::test]
    async fn test_sweep_recalculates_link_length_after_purge() {
        let fx = fixture();
        for _ in 0..1300 {
            fx.links.create("https://x.io", Some(Duration::from_millis(1))).unwrap();
        }
        assert_eq!(fx.links.recalculate_length(), 4);

        // Purge runs before recalculation, so the emptied table shrinks back.
        let sweeper = Sweeper::new(fx.links.clone(), fx.files.clone());
        let report = sweeper.sweep_at(Instant::now() + Duration::from_secs(1)).await;
        assert_eq!(report.links.deleted, 1300);
        assert_eq!(report.link_token_length, 3);
    }

    #[tokio::test]
    async fn test_background_sweep_runs() {
        let fx = fixture();
        fx.links.create("https://a.io", Some(Duration::from_millis(1))).unwrap();
        fx.links.create("https://b.io", None).unwrap();

        let handle = Sweeper::new(fx.links.clone(), fx.files.clone()).spawn(Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(fx.links.table().len(), 1);
        handle.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_stops_background_task() {
        let fx = fixture();
        let handle = Sweeper::new(fx.links.clone(), fx.files.clone()).spawn(Duration::from_millis(10));

        handle.shutdown();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_finished());

        // Nothing sweeps once stopped.
        fx.links.create("https://a.io", Some(Duration::from_millis(1))).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fx.links.table().len(), 1);
    }
}
