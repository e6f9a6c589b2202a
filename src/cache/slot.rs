// Cache slot module
// Single published payload, replaced whole by the refresher

use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::RwLock;

/// One computed payload and when it was computed.
#[derive(Debug, Default)]
pub struct CachedPayload {
    pub payload: Vec<u8>,
    /// `None` until the first successful refresh.
    pub computed_at: Option<DateTime<Local>>,
}

/// Single-writer, many-reader cell holding the latest payload.
///
/// Readers get an `Arc` to an immutable payload and release the lock
/// immediately, so the write path only ever holds the lock for a pointer
/// swap and a reader can never see a mix of two payloads.
#[derive(Debug, Default)]
pub struct CacheSlot {
    current: RwLock<Arc<CachedPayload>>,
}

impl CacheSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current payload.
    pub async fn load(&self) -> Arc<CachedPayload> {
        Arc::clone(&*self.current.read().await)
    }

    /// Install a new payload, discarding the previous one.
    pub async fn publish(&self, payload: Vec<u8>) {
        let next = Arc::new(CachedPayload {
            payload,
            computed_at: Some(Local::now()),
        });
        *self.current.write().await = next;
    }
}
