//! wg-core: shared foundation for wecgrid.
//!
//! Contains:
//! - ids (device identifiers used as store keys)
//! - numeric (Real + tolerances + float helpers)
//! - timeline (synthetic snapshot timestamps)
//! - timing (wall-clock stopwatch for service summaries)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod timeline;
pub mod timing;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use timeline::{SAMPLE_INTERVAL_MINUTES, sample_interval, snapshot_timeline};
pub use timing::Timer;
