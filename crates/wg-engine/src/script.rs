//! Batch script rendering for the MATLAB adapter.
//!
//! The script reproduces one interactive engine session: change into the
//! model folder, extend the search path, bind workspace variables, call
//! the entry point and then the formatter.

use std::path::Path;

use crate::engine::SimRequest;
use crate::error::{EngineError, EngineResult};
use crate::model::FORMATTER_ROUTINE;
use crate::params::{POSITIONAL_KEYS, ParamValue};

pub const DEVICE_ID_VARIABLE: &str = "wecId";
pub const STORE_LOCATION_VARIABLE: &str = "DB_PATH";
pub const OUTPUT_VARIABLE: &str = "m2g_out";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineScript {
    statements: Vec<String>,
}

impl EngineScript {
    pub fn for_request(
        request: &SimRequest<'_>,
        model_dir: &Path,
        wec_sim_root: &Path,
    ) -> EngineResult<Self> {
        let mut statements = vec![
            format!("cd({})", matlab_string(&model_dir.to_string_lossy())),
            format!(
                "addpath(genpath({}))",
                matlab_string(&wec_sim_root.to_string_lossy())
            ),
            format!("{DEVICE_ID_VARIABLE} = {}", request.device_id),
        ];

        for (name, value) in request.params.workspace_bindings() {
            ensure_variable_name(&name)?;
            statements.push(format!("{name} = {}", matlab_literal(&value)));
        }

        statements.push(format!(
            "{STORE_LOCATION_VARIABLE} = {}",
            matlab_string(&request.store_location.to_string_lossy())
        ));

        let mut args = vec![DEVICE_ID_VARIABLE];
        args.extend(POSITIONAL_KEYS);
        statements.push(format!(
            "{OUTPUT_VARIABLE} = {}({})",
            request.model.entry_point(),
            args.join(",")
        ));
        statements.push(FORMATTER_ROUTINE.to_string());

        Ok(Self { statements })
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Single-line form accepted by `matlab -batch`.
    pub fn render(&self) -> String {
        self.statements
            .iter()
            .map(|s| format!("{s};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn ensure_variable_name(name: &str) -> EngineResult<()> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid && name != DEVICE_ID_VARIABLE && name != STORE_LOCATION_VARIABLE {
        Ok(())
    } else {
        Err(EngineError::InvalidVariable {
            name: name.to_string(),
        })
    }
}

fn matlab_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn matlab_literal(value: &ParamValue) -> String {
    match value {
        ParamValue::Bool(b) => b.to_string(),
        ParamValue::Int(i) => i.to_string(),
        ParamValue::Float(f) if f.is_nan() => "NaN".to_string(),
        ParamValue::Float(f) if f.is_infinite() && *f > 0.0 => "Inf".to_string(),
        ParamValue::Float(f) if f.is_infinite() => "-Inf".to_string(),
        ParamValue::Float(f) => f.to_string(),
        ParamValue::Text(s) => matlab_string(s),
    }
}
