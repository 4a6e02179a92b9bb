//! Infrastructure: the pending queue and the result cache.

pub mod cache;
pub mod queue;

pub use cache::{fingerprint, CacheEntry, ResultCache};
pub use queue::{PendingQueue, QueuedTask};
