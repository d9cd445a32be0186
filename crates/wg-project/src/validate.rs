//! Project validation logic.

use std::collections::HashSet;

use wg_core::ensure_finite;
use wg_engine::params::{POSITIONAL_KEYS, WAVE_SEED};

use crate::schema::{DeviceDef, Project};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    if project.engine.program.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "engine.program".to_string(),
            value: String::new(),
            reason: "must not be empty".to_string(),
        });
    }

    let mut device_ids = HashSet::new();
    for device in &project.devices {
        if !device_ids.insert(device.id) {
            return Err(ValidationError::DuplicateId {
                id: device.id.to_string(),
                context: "devices".to_string(),
            });
        }
        validate_device(device)?;
    }

    Ok(())
}

fn validate_device(device: &DeviceDef) -> Result<(), ValidationError> {
    let field = |name: &str| format!("devices[{}].{}", device.id, name);

    if device.model.name().trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: field("model"),
            value: String::new(),
            reason: "model name must not be empty".to_string(),
        });
    }

    for (name, value) in [
        ("pmax", device.pmax),
        ("pmin", device.pmin),
        ("qmax", device.qmax),
        ("qmin", device.qmin),
        ("mbase", device.mbase),
    ] {
        if let Some(v) = value {
            ensure_finite(v, "device bound").map_err(|e| ValidationError::InvalidValue {
                field: field(name),
                value: v.to_string(),
                reason: e.to_string(),
            })?;
        }
    }

    if let (Some(pmin), Some(pmax)) = (device.pmin, device.pmax) {
        if pmin > pmax {
            return Err(ValidationError::InvalidValue {
                field: field("pmin"),
                value: pmin.to_string(),
                reason: format!("exceeds pmax {pmax}"),
            });
        }
    }
    if let (Some(qmin), Some(qmax)) = (device.qmin, device.qmax) {
        if qmin > qmax {
            return Err(ValidationError::InvalidValue {
                field: field("qmin"),
                value: qmin.to_string(),
                reason: format!("exceeds qmax {qmax}"),
            });
        }
    }
    if let Some(mbase) = device.mbase {
        if mbase <= 0.0 {
            return Err(ValidationError::InvalidValue {
                field: field("mbase"),
                value: mbase.to_string(),
                reason: "must be positive".to_string(),
            });
        }
    }

    // Only shape is checked here; whether the engine needs a key is the
    // engine's call.
    for key in POSITIONAL_KEYS {
        if let Some(value) = device.config.get(key) {
            if value.as_f64().is_none() {
                return Err(ValidationError::InvalidValue {
                    field: field(&format!("config.{key}")),
                    value: format!("{value:?}"),
                    reason: "must be numeric".to_string(),
                });
            }
        }
    }
    if let Err(e) = device.config.seed_policy() {
        return Err(ValidationError::InvalidValue {
            field: field(&format!("config.{WAVE_SEED}")),
            value: format!("{:?}", device.config.get(WAVE_SEED)),
            reason: e.to_string(),
        });
    }

    Ok(())
}
