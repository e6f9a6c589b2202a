// Cache refresher module
// Periodically recomputes the payload and republishes it into the cache slot

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use super::slot::CacheSlot;
use crate::error::SnapshotError;
use crate::observer::ServerObserver;
use crate::server::Shutdown;

/// Produces the bytes served to every client.
///
/// Any `FnMut() -> Result<Vec<u8>, SnapshotError>` closure is a source.
pub trait SnapshotSource: Send + 'static {
    fn snapshot(&mut self) -> impl Future<Output = Result<Vec<u8>, SnapshotError>> + Send;

    /// Called once when the refresher exits; release held resources here.
    fn close(&mut self) {}
}

impl<F> SnapshotSource for F
where
    F: FnMut() -> Result<Vec<u8>, SnapshotError> + Send + 'static,
{
    fn snapshot(&mut self) -> impl Future<Output = Result<Vec<u8>, SnapshotError>> + Send {
        std::future::ready(self())
    }
}

/// Requests an immediate refresh tick (e.g. on SIGHUP).
#[derive(Debug, Clone, Default)]
pub struct RefreshTrigger {
    notify: Arc<Notify>,
}

impl RefreshTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wake the refresher. A request made during a running tick starts
    /// the next tick right after it, never in parallel.
    pub fn refresh_now(&self) {
        self.notify.notify_one();
    }

    async fn requested(&self) {
        self.notify.notified().await;
    }
}

pub struct CacheRefresher<S> {
    source: S,
    slot: Arc<CacheSlot>,
    interval: Duration,
    trigger: RefreshTrigger,
    observer: Arc<dyn ServerObserver>,
}

impl<S: SnapshotSource> CacheRefresher<S> {
    pub fn new(
        source: S,
        slot: Arc<CacheSlot>,
        interval: Duration,
        trigger: RefreshTrigger,
        observer: Arc<dyn ServerObserver>,
    ) -> Self {
        Self {
            source,
            slot,
            interval,
            trigger,
            observer,
        }
    }

    /// Run one tick: compute outside any lock, then swap the result in.
    /// On failure the previously published payload stays in place.
    pub async fn tick(&mut self) -> bool {
        match self.source.snapshot().await {
            Ok(payload) => {
                let len = payload.len();
                self.slot.publish(payload).await;
                self.observer.on_refreshed(len);
                true
            }
            Err(e) => {
                self.observer.on_refresh_failed(&e);
                false
            }
        }
    }

    /// Tick until shutdown is requested. The next tick is scheduled only
    /// after the previous one finished; an in-flight snapshot always runs
    /// to completion before shutdown is observed.
    pub async fn run(mut self, shutdown: Arc<Shutdown>) {
        while !shutdown.is_requested() {
            self.tick().await;

            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                () = self.trigger.requested() => {}
                () = shutdown.wait() => break,
            }
        }
        self.source.close();
    }
}
