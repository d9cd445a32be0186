//! Project loading, validation, and wiring of the store and engine.

use std::path::Path;

use wg_core::DeviceId;
use wg_engine::{MatlabEngine, MatlabEngineConfig};
use wg_project::{DeviceDef, PathsConfig, Project, ProjectError};
use wg_results::SqliteStore;

use crate::error::{AppError, AppResult};

/// Summary of a device for listing.
#[derive(Debug, Clone)]
pub struct DeviceSummary {
    pub id: DeviceId,
    pub model: String,
    pub entry_point: &'static str,
    pub bus_location: String,
    pub param_count: usize,
}

/// Load, migrate and validate a project from a YAML file.
pub fn load_project(path: &Path) -> AppResult<Project> {
    wg_project::load_yaml(path).map_err(|e| match e {
        ProjectError::Io(source) => AppError::ProjectFileRead {
            path: path.to_path_buf(),
            message: source.to_string(),
        },
        other => other.into(),
    })
}

/// Validate a project already in memory.
pub fn validate_project(project: &Project) -> AppResult<()> {
    wg_project::validate_project(project)?;
    Ok(())
}

/// List all devices in the project with summaries.
pub fn list_devices(project: &Project) -> Vec<DeviceSummary> {
    project
        .devices
        .iter()
        .map(|device| DeviceSummary {
            id: device.id,
            model: device.model.name().to_string(),
            entry_point: device.model.entry_point(),
            bus_location: device.bus_location.to_string(),
            param_count: device.config.len(),
        })
        .collect()
}

/// Get a specific device by id.
pub fn get_device(project: &Project, device_id: DeviceId) -> AppResult<&DeviceDef> {
    project
        .device(device_id)
        .ok_or(AppError::DeviceNotFound(device_id))
}

/// Project paths with relative entries resolved against the folder
/// holding the project file.
pub fn project_paths(project: &Project, project_file: &Path) -> PathsConfig {
    let base = project_file.parent().unwrap_or_else(|| Path::new("."));
    project.paths.rebased(base)
}

/// Open the output store named by the project paths.
pub fn open_store(paths: &PathsConfig) -> AppResult<SqliteStore> {
    Ok(SqliteStore::open(paths.database.clone())?)
}

/// Build the batch engine adapter for a project.
pub fn build_engine(project: &Project, paths: &PathsConfig) -> MatlabEngine {
    let mut config = MatlabEngineConfig::new(paths.wec_model.clone(), paths.wec_sim.clone());
    config.program = project.engine.program.clone();
    config.extra_args = project.engine.extra_args.clone();
    MatlabEngine::new(config)
}
