//! Shared application service layer for wecgrid.
//!
//! This crate owns the WEC device entity and the services around it:
//! resolving a device's output through the store or the engine, project
//! loading, cache administration, and queries over resolved output.

pub mod cache_service;
pub mod context;
pub mod error;
pub mod locks;
pub mod progress;
pub mod project_service;
pub mod query;
pub mod resolve_service;
pub mod wec;

// Re-export key types for convenience
pub use cache_service::{CachedDevice, import_csv, invalidate, list_cached};
pub use context::RunContext;
pub use error::{AppError, AppResult};
pub use locks::DeviceLocks;
pub use progress::{ResolveProgressEvent, ResolveStage};
pub use project_service::{
    DeviceSummary, build_engine, get_device, list_devices, load_project, open_store,
    project_paths, validate_project,
};
pub use query::{OutputSummary, extract_series, get_output_summary, read_output_csv, write_csv};
pub use resolve_service::{
    OutputSource, ResolveOptions, ResolveRequest, ResolveTiming, ResolvedOutput, Resolver,
};
pub use wec::{DEFAULT_MBASE, PowerBounds, Wec, WecOutput, WecSpec};
