//! Response caching and rate limiting for outbound provider calls.
//!
//! Responses live in a `CacheStore` (SQLite file or Redis). The
//! `CachedFetcher` serves repeated identical requests from it, and the
//! `RateLimiter` keeps fixed-window counters in the same backend.

pub mod fetcher;
pub mod key;
pub mod limiter;
pub mod redis;
pub mod response;
pub mod sqlite;
pub mod store;

pub use self::fetcher::{CachedFetcher, FetchError};
pub use self::key::OutboundRequest;
pub use self::limiter::RateLimiter;
pub use self::redis::RedisCacheStore;
pub use self::response::{CacheError, CacheResult, CachedResponse};
pub use self::sqlite::SqliteCacheStore;
pub use self::store::CacheStore;
