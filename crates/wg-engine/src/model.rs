//! Simulation model selection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Model name reserved for the LUPA device, which has its own entry point.
pub const LUPA_MODEL_NAME: &str = "LUPA";
pub const LUPA_ENTRY_POINT: &str = "w2gSim_LUPA";
pub const GENERIC_ENTRY_POINT: &str = "w2gSim";
/// Post-processing routine that reshapes raw solver output and writes it
/// to the store. Takes no arguments.
pub const FORMATTER_ROUTINE: &str = "WECsim_to_PSSe_dataFormatter";

/// Which external simulation variant a device runs.
///
/// Resolved once from the configured model name; everything downstream
/// matches on the variant instead of comparing strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WecModel {
    /// LUPA device with its dedicated entry point.
    Lupa,
    /// Any other model folder, run through the generic entry point.
    Generic { name: String },
}

impl WecModel {
    pub fn from_name(name: &str) -> Self {
        if name == LUPA_MODEL_NAME {
            WecModel::Lupa
        } else {
            WecModel::Generic {
                name: name.to_string(),
            }
        }
    }

    /// Model name, which is also the model's folder under the model root.
    pub fn name(&self) -> &str {
        match self {
            WecModel::Lupa => LUPA_MODEL_NAME,
            WecModel::Generic { name } => name,
        }
    }

    pub fn entry_point(&self) -> &'static str {
        match self {
            WecModel::Lupa => LUPA_ENTRY_POINT,
            WecModel::Generic { .. } => GENERIC_ENTRY_POINT,
        }
    }
}

impl From<String> for WecModel {
    fn from(name: String) -> Self {
        WecModel::from_name(&name)
    }
}

impl From<WecModel> for String {
    fn from(model: WecModel) -> Self {
        model.name().to_string()
    }
}

impl fmt::Display for WecModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
