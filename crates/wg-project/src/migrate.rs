//! Schema migration framework.

use crate::ProjectError;
use crate::schema::Project;

pub const LATEST_VERSION: u32 = 1;

pub fn migrate_to_latest(mut project: Project) -> Result<Project, ProjectError> {
    while project.version < LATEST_VERSION {
        project = migrate_one_version(project)?;
    }
    Ok(project)
}

fn migrate_one_version(project: Project) -> Result<Project, ProjectError> {
    match project.version {
        0 => migrate_v0_to_v1(project),
        v => Err(ProjectError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

/// Version 0 files spelled the positional parameters out in long form
/// (`simulationLength`, `sampleResolution`); version 1 uses the names the
/// engine entry points take.
fn migrate_v0_to_v1(mut project: Project) -> Result<Project, ProjectError> {
    use wg_engine::params::{SAMPLE_RESOLUTION, SIM_LENGTH};

    for device in &mut project.devices {
        for (old, new) in [
            ("simulationLength", SIM_LENGTH),
            ("sampleResolution", SAMPLE_RESOLUTION),
        ] {
            if device.config.get(new).is_some() {
                continue;
            }
            if let Some(value) = device.config.remove(old) {
                device.config.insert(new, value);
            }
        }
    }
    project.version = 1;
    Ok(project)
}
