//! Background sync scheduling.
//!
//! Mirrors the web client's online/offline listeners and `setInterval`
//! sync pump: a periodic flush of the offline queue while online, an
//! immediate flush-then-refresh when connectivity returns, and a
//! staleness-gated refresh when the app regains focus.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::backoff::ExponentialBackoff;
use crate::config::{Config, REFRESH_INTERVAL, SYNC_INTERVAL};
use crate::queue::OfflineQueue;
use crate::stores::DataStores;

/// Watchable online/offline state.
///
/// The host application feeds this from whatever connectivity signal it
/// has; everything downstream just watches the boolean.
#[derive(Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    /// Start in the online state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(true);
        Self { tx: Arc::new(tx) }
    }

    pub fn set_online(&self) {
        self.tx.send_replace(true);
    }

    pub fn set_offline(&self) {
        self.tx.send_replace(false);
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives periodic queue flushes and staleness-based refreshes.
///
/// A flush pass that leaves failures behind opens an exponential backoff
/// window; periodic ticks inside the window are skipped so a broken
/// backend is not hammered every interval. A connectivity transition
/// always attempts a flush regardless of the window.
#[derive(Clone)]
pub struct SyncScheduler {
    queue: OfflineQueue,
    stores: Arc<DataStores>,
    connectivity: Connectivity,
    sync_interval: Duration,
    refresh_interval: Duration,
    last_refresh: Arc<Mutex<Instant>>,
    backoff: Arc<Mutex<ExponentialBackoff>>,
}

/// Keeps the background task alive; dropping it stops the scheduler.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop the scheduler and wait for its task to finish.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        let _ = (&mut self.task).await;
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl SyncScheduler {
    /// Build a scheduler with the default intervals.
    pub fn new(queue: OfflineQueue, stores: Arc<DataStores>, connectivity: Connectivity) -> Self {
        Self::with_intervals(queue, stores, connectivity, SYNC_INTERVAL, REFRESH_INTERVAL)
    }

    /// Build a scheduler with the intervals from `config`.
    pub fn from_config(
        config: &Config,
        queue: OfflineQueue,
        stores: Arc<DataStores>,
        connectivity: Connectivity,
    ) -> Self {
        Self::with_intervals(
            queue,
            stores,
            connectivity,
            config.sync_interval,
            config.refresh_interval,
        )
    }

    /// Build a scheduler with custom intervals.
    pub fn with_intervals(
        queue: OfflineQueue,
        stores: Arc<DataStores>,
        connectivity: Connectivity,
        sync_interval: Duration,
        refresh_interval: Duration,
    ) -> Self {
        // One failed pass delays the next attempt by a tick; the cap
        // keeps a long outage down to one attempt per eight ticks.
        let backoff = ExponentialBackoff::with_config(sync_interval, sync_interval * 8);
        Self {
            queue,
            stores,
            connectivity,
            sync_interval,
            refresh_interval,
            last_refresh: Arc::new(Mutex::new(Instant::now())),
            backoff: Arc::new(Mutex::new(backoff)),
        }
    }

    /// Record a flush outcome against the backoff window.
    fn note_flush_outcome(&self, failed: usize) {
        let mut backoff = self.backoff.lock().unwrap();
        if failed > 0 {
            backoff.record_failure();
            tracing::warn!(
                "Flush left {} mutation(s) pending ({} consecutive failed pass(es))",
                failed,
                backoff.failure_count()
            );
        } else {
            backoff.reset();
        }
    }

    /// Periodic flush: skipped while a previous failure's backoff window
    /// is still open.
    async fn flush_pending(&self) {
        {
            let backoff = self.backoff.lock().unwrap();
            if backoff.is_in_backoff() {
                tracing::debug!(
                    "Skipping flush, next attempt in {:?}",
                    backoff.time_until_retry()
                );
                return;
            }
        }
        let report = self.queue.process(self.stores.client()).await;
        self.note_flush_outcome(report.failed);
        tracing::debug!(
            "Periodic flush: {} delivered, {} failed",
            report.delivered,
            report.failed
        );
    }

    /// Flush pending writes, then refetch every store. Runs regardless of
    /// the backoff window; the outcome still feeds it.
    pub async fn flush_and_refresh(&self) {
        let report = self.queue.process(self.stores.client()).await;
        self.note_flush_outcome(report.failed);
        if self.stores.refresh_all().await.is_ok() {
            *self.last_refresh.lock().unwrap() = Instant::now();
        }
    }

    /// Refresh the stores when the last refresh is older than the
    /// staleness window. Call when the app regains focus.
    pub async fn handle_focus(&self) {
        let stale = {
            let last = self.last_refresh.lock().unwrap();
            last.elapsed() >= self.refresh_interval
        };
        if !stale || !self.connectivity.is_online() {
            return;
        }
        tracing::debug!("Focus refresh (data stale)");
        if self.stores.refresh_all().await.is_ok() {
            *self.last_refresh.lock().unwrap() = Instant::now();
        }
    }

    /// Spawn the background loop. The returned handle stops the loop when
    /// dropped or when [`SchedulerHandle::shutdown`] is awaited.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let mut online_rx = self.connectivity.subscribe();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.sync_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick resolves immediately; the loop body handles
            // ticks, so consume it here.
            ticker.tick().await;

            let mut was_online = self.connectivity.is_online();
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if self.connectivity.is_online() && !self.queue.is_empty() {
                            self.flush_pending().await;
                        }
                    }
                    changed = online_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let online = *online_rx.borrow_and_update();
                        if online && !was_online {
                            tracing::info!("Back online, flushing queue");
                            self.flush_and_refresh().await;
                        }
                        was_online = online;
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
        });

        SchedulerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::adapters::MemoryStorage;
    use crate::backend::SupabaseClient;
    use crate::cache::CacheStore;
    use crate::queue::MutationKind;
    use crate::traits::Response;
    use bytes::Bytes;

    fn fixture(http: MockHttpClient) -> (OfflineQueue, Arc<DataStores>) {
        let storage = Arc::new(MemoryStorage::new());
        let client = SupabaseClient::new("https://p.supabase.co", "anon", Arc::new(http));
        let stores = Arc::new(DataStores::new(
            client,
            CacheStore::new(storage.clone()),
        ));
        (OfflineQueue::new(storage), stores)
    }

    fn queue_roadmap_update(queue: &OfflineQueue) {
        queue.enqueue(MutationKind::UpdateRoadmapProgress {
            roadmap_id: "r1".to_string(),
            progress: 30.0,
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_flush_when_online() {
        let http = MockHttpClient::new();
        http.set_response(
            "https://p.supabase.co/rest/v1/roadmaps",
            MockResponse::Success(Response::new(204, Bytes::new())),
        );

        let (queue, stores) = fixture(http);
        queue_roadmap_update(&queue);

        let scheduler = SyncScheduler::with_intervals(
            queue.clone(),
            stores,
            Connectivity::new(),
            Duration::from_secs(120),
            Duration::from_secs(300),
        );
        let handle = scheduler.spawn();

        tokio::time::sleep(Duration::from_secs(121)).await;
        assert!(queue.is_empty());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_flush_while_offline() {
        let http = MockHttpClient::new();
        http.set_response(
            "https://p.supabase.co/rest/v1/roadmaps",
            MockResponse::Success(Response::new(204, Bytes::new())),
        );

        let (queue, stores) = fixture(http);
        queue_roadmap_update(&queue);

        let connectivity = Connectivity::new();
        connectivity.set_offline();

        let scheduler = SyncScheduler::with_intervals(
            queue.clone(),
            stores,
            connectivity,
            Duration::from_secs(120),
            Duration::from_secs(300),
        );
        let handle = scheduler.spawn();

        tokio::time::sleep(Duration::from_secs(250)).await;
        assert_eq!(queue.len(), 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_online_transition_flushes_immediately() {
        let http = MockHttpClient::new();
        http.set_response(
            "https://p.supabase.co/rest/v1/roadmaps",
            MockResponse::Success(Response::new(204, Bytes::new())),
        );

        let (queue, stores) = fixture(http);
        queue_roadmap_update(&queue);

        let connectivity = Connectivity::new();
        connectivity.set_offline();

        let scheduler = SyncScheduler::with_intervals(
            queue.clone(),
            stores,
            connectivity.clone(),
            Duration::from_secs(120),
            Duration::from_secs(300),
        );
        let handle = scheduler.spawn();

        // Well before the first periodic tick.
        tokio::time::sleep(Duration::from_secs(5)).await;
        connectivity.set_online();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(queue.is_empty());
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_flush_backs_off_before_retrying() {
        // No mocked endpoint, so every replay attempt errors.
        let (queue, stores) = fixture(MockHttpClient::new());
        queue_roadmap_update(&queue);

        let scheduler = SyncScheduler::with_intervals(
            queue.clone(),
            stores,
            Connectivity::new(),
            Duration::from_secs(120),
            Duration::from_secs(300),
        );
        let handle = scheduler.spawn();

        // First tick attempts the flush and fails.
        tokio::time::sleep(Duration::from_secs(121)).await;
        assert_eq!(queue.pending()[0].attempts, 1);

        // The next tick lands inside the backoff window and is skipped.
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(queue.pending()[0].attempts, 1);

        // The window has closed by the tick after that.
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(queue.pending()[0].attempts, 2);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_refresh_only_when_stale() {
        let http = MockHttpClient::new();
        http.set_response(
            "https://p.supabase.co/rest/v1/courses",
            MockResponse::Success(Response::new(200, Bytes::from("[]"))),
        );

        let (queue, stores) = fixture(http.clone());
        stores.set_user(Some("u1".to_string()));

        let scheduler = SyncScheduler::with_intervals(
            queue,
            stores,
            Connectivity::new(),
            Duration::from_secs(120),
            Duration::from_secs(300),
        );

        // Fresh: focus does nothing.
        scheduler.handle_focus().await;
        assert!(http.get_requests().is_empty());

        // Stale: focus refreshes the stores.
        tokio::time::sleep(Duration::from_secs(301)).await;
        scheduler.handle_focus().await;
        assert!(!http.get_requests().is_empty());
    }
}
