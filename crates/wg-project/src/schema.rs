//! Project schema definitions.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use wg_core::DeviceId;
use wg_engine::{SimParams, WecModel};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    pub paths: PathsConfig,
    #[serde(default)]
    pub engine: EngineDef,
    pub context: ContextDef,
    #[serde(default)]
    pub devices: Vec<DeviceDef>,
}

impl Project {
    pub fn device(&self, id: DeviceId) -> Option<&DeviceDef> {
        self.devices.iter().find(|d| d.id == id)
    }
}

/// Filesystem locations the engine and store need.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathsConfig {
    /// Folder with one sub-folder per model name.
    pub wec_model: PathBuf,
    /// WEC-Sim installation root.
    pub wec_sim: PathBuf,
    /// SQLite database holding the output tables.
    pub database: PathBuf,
}

impl PathsConfig {
    /// Resolve relative entries against `base` (usually the project folder).
    pub fn rebased(&self, base: &Path) -> PathsConfig {
        let rebase = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        };
        PathsConfig {
            wec_model: rebase(&self.wec_model),
            wec_sim: rebase(&self.wec_sim),
            database: rebase(&self.database),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineDef {
    #[serde(default = "default_engine_program")]
    pub program: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_args: Vec<String>,
}

impl Default for EngineDef {
    fn default() -> Self {
        Self {
            program: default_engine_program(),
            extra_args: Vec::new(),
        }
    }
}

fn default_engine_program() -> String {
    wg_engine::matlab::DEFAULT_PROGRAM.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextDef {
    pub start_time: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceDef {
    pub id: DeviceId,
    pub model: WecModel,
    pub bus_location: BusLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmax: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmin: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qmax: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qmin: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mbase: Option<f64>,
    #[serde(default, skip_serializing_if = "SimParams::is_empty")]
    pub config: SimParams,
}

/// Grid bus the device connects to. Opaque to wecgrid; either a bus
/// number or a name depending on the grid model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum BusLocation {
    Number(i64),
    Name(String),
}

impl fmt::Display for BusLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusLocation::Number(n) => write!(f, "{n}"),
            BusLocation::Name(name) => f.write_str(name),
        }
    }
}
