// Cache module entry point
// Published payload slot and the periodic task that refills it

mod refresher;
mod slot;

pub use refresher::{CacheRefresher, RefreshTrigger, SnapshotSource};
pub use slot::{CachedPayload, CacheSlot};
