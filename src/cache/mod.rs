//! Persistent TTL cache with a stale-while-revalidate fetch protocol.
//!
//! - `storage`: async key/value backends (SQLite, memory, no-op)
//! - `ttl`: `{storedAt, ttlMs, value}` envelope and the freshness predicate
//! - `layer`: cache-aside and SWR fetches with detached background refresh

mod clock;
mod layer;
mod storage;
mod traits;
mod ttl;

pub use clock::{Clock, SystemClock};
pub use layer::CacheLayer;
pub use storage::{KvStore, MemoryStore, NoopStore, SqliteStore};
pub use traits::{CacheEntry, CacheResult, CacheSource, FetchOptions, UpdateCallback};
pub use ttl::TtlCache;
