//! # recycle_pool
//!
//! Single-threaded object pool that recycles expensive-to-construct
//! instances instead of dropping and rebuilding them.
//!
//! ## Features
//!
//! - FIFO recycling: the oldest released instance is handed out first
//! - Acquire and release hooks to prepare and reset instances
//! - Eager preloading at construction
//! - Generational handles: double, stale and foreign releases are rejected
//! - Automatic release via RAII guard (Drop trait)
//! - Metrics snapshot and Prometheus export (`metrics` feature)
//! - Serializable configuration (`serde` feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use recycle_pool::ObjectPool;
//!
//! let mut pool = ObjectPool::builder()
//!     .factory(|| vec![0u8; 1024])
//!     .on_release(|buf: &mut Vec<u8>| buf.fill(0))
//!     .preload(2)
//!     .build()
//!     .unwrap();
//!
//! let handle = pool.acquire().unwrap();
//! pool.get_mut(handle).unwrap()[0] = 42;
//! pool.release(handle).unwrap();
//!
//! assert_eq!(pool.pool_size(), 2);
//! assert_eq!(pool.active_count(), 0);
//! ```

mod config;
mod errors;
mod handle;
mod metrics;
mod pool;

pub use config::PoolConfiguration;
pub use errors::{BoxError, HookStage, PoolError, PoolResult};
pub use handle::PoolHandle;
#[cfg(feature = "metrics")]
pub use metrics::MetricsExporter;
pub use metrics::PoolMetrics;
pub use pool::{ObjectPool, PoolBuilder, PooledObject};
