//! The narrow engine interface the device service depends on.

use std::path::Path;

use wg_core::DeviceId;

use crate::error::EngineResult;
use crate::model::WecModel;
use crate::params::SimParams;

/// Everything one simulation run needs.
#[derive(Debug, Clone, Copy)]
pub struct SimRequest<'a> {
    pub device_id: DeviceId,
    pub model: &'a WecModel,
    pub params: &'a SimParams,
    /// Store the engine's formatter writes the output table into.
    pub store_location: &'a Path,
}

/// An external simulator that produces a device's output table.
///
/// `run` blocks until the simulator has finished and its formatter has
/// written the table; it returns nothing because the output lands in the
/// store, not in memory. Each call uses a fresh engine session.
pub trait SimulationEngine: Send + Sync {
    fn run(&self, request: &SimRequest<'_>) -> EngineResult<()>;
}
