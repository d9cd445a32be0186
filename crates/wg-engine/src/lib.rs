//! wg-engine: adapter layer around the external hydrodynamic simulator.
//!
//! The rest of the workspace only sees [`SimulationEngine::run`]; how
//! parameters reach the simulator (workspace variables, a batch script,
//! working directories) is an implementation detail of the adapters here.

pub mod engine;
pub mod error;
pub mod matlab;
pub mod model;
pub mod params;
pub mod script;
pub mod session;

pub use engine::{SimRequest, SimulationEngine};
pub use error::{EngineError, EngineResult};
pub use matlab::{MatlabEngine, MatlabEngineConfig};
pub use model::{FORMATTER_ROUTINE, GENERIC_ENTRY_POINT, LUPA_ENTRY_POINT, LUPA_MODEL_NAME, WecModel};
pub use params::{ParamValue, SeedPolicy, SimParams};
pub use session::EngineSession;
