//! MATLAB batch adapter for WEC-Sim models.

use std::path::PathBuf;
use std::process::Command;

use crate::engine::{SimRequest, SimulationEngine};
use crate::error::{EngineError, EngineResult};
use crate::model::WecModel;
use crate::params::SeedPolicy;
use crate::script::EngineScript;
use crate::session::EngineSession;

pub const DEFAULT_PROGRAM: &str = "matlab";

#[derive(Debug, Clone, PartialEq)]
pub struct MatlabEngineConfig {
    /// Engine executable, looked up on `PATH` when not absolute.
    pub program: String,
    /// Arguments placed before `-batch <script>`.
    pub extra_args: Vec<String>,
    /// Folder holding one sub-folder per model name.
    pub model_root: PathBuf,
    /// WEC-Sim installation added to the engine search path.
    pub wec_sim_root: PathBuf,
}

impl MatlabEngineConfig {
    pub fn new(model_root: PathBuf, wec_sim_root: PathBuf) -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            extra_args: Vec::new(),
            model_root,
            wec_sim_root,
        }
    }
}

/// Runs each simulation in a fresh `matlab -batch` process.
#[derive(Debug, Clone)]
pub struct MatlabEngine {
    config: MatlabEngineConfig,
}

impl MatlabEngine {
    pub fn new(config: MatlabEngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatlabEngineConfig {
        &self.config
    }

    pub fn model_dir(&self, model: &WecModel) -> PathBuf {
        self.config.model_root.join(model.name())
    }

    /// Build the engine command for `request` without starting it.
    pub fn command_for(&self, request: &SimRequest<'_>) -> EngineResult<Command> {
        let model_dir = self.model_dir(request.model);
        if !model_dir.is_dir() {
            return Err(EngineError::ModelNotFound { path: model_dir });
        }
        let script = EngineScript::for_request(request, &model_dir, &self.config.wec_sim_root)?;

        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.extra_args)
            .arg("-batch")
            .arg(script.render())
            .current_dir(&model_dir);
        Ok(command)
    }
}

impl SimulationEngine for MatlabEngine {
    fn run(&self, request: &SimRequest<'_>) -> EngineResult<()> {
        if request.params.seed_policy()? == SeedPolicy::EngineDefault {
            tracing::warn!(
                device_id = %request.device_id,
                "no waveSeed configured; wave seeding left to the engine default"
            );
        }

        let mut command = self.command_for(request)?;
        tracing::info!(
            device_id = %request.device_id,
            model = %request.model,
            entry_point = request.model.entry_point(),
            "starting engine session"
        );
        let session = EngineSession::start(&mut command)?;
        let output = session.finish()?;
        for line in output.stdout.lines().filter(|l| !l.trim().is_empty()) {
            tracing::debug!(device_id = %request.device_id, "engine: {line}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SimParams;
    use std::path::Path;
    use wg_core::DeviceId;

    fn temp_roots(name: &str, model: &str) -> (PathBuf, PathBuf) {
        let root = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&root);
        let models = root.join("models");
        std::fs::create_dir_all(models.join(model)).unwrap();
        (models, root.join("WEC-Sim"))
    }

    fn params() -> SimParams {
        SimParams::new()
            .with("simLength", 600_i64)
            .with("Tsample", 60_i64)
            .with("waveHeight", 2.5)
            .with("wavePeriod", 8_i64)
            .with("waveSeed", 7_i64)
    }

    #[test]
    fn missing_model_folder_is_reported() {
        let (models, sim) = temp_roots("wg_engine_missing_model", "RM3");
        let engine = MatlabEngine::new(MatlabEngineConfig::new(models, sim));
        let model = WecModel::Lupa;
        let params = params();
        let request = SimRequest {
            device_id: DeviceId::new(1),
            model: &model,
            params: &params,
            store_location: Path::new("/tmp/wecgrid.db"),
        };
        let err = engine.run(&request).unwrap_err();
        assert!(matches!(err, EngineError::ModelNotFound { .. }));
    }

    #[test]
    fn command_runs_batch_script_inside_model_folder() {
        let (models, sim) = temp_roots("wg_engine_command", "LUPA");
        let mut config = MatlabEngineConfig::new(models.clone(), sim);
        config.extra_args = vec!["-nodesktop".to_string()];
        let engine = MatlabEngine::new(config);
        let model = WecModel::Lupa;
        let params = params();
        let request = SimRequest {
            device_id: DeviceId::new(42),
            model: &model,
            params: &params,
            store_location: Path::new("/tmp/wecgrid.db"),
        };

        let command = engine.command_for(&request).unwrap();
        assert_eq!(command.get_program(), "matlab");
        let args: Vec<String> = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args[0], "-nodesktop");
        assert_eq!(args[1], "-batch");
        assert!(args[2].contains("w2gSim_LUPA(wecId,simLength,Tsample,waveHeight,wavePeriod)"));
        assert_eq!(command.get_current_dir(), Some(models.join("LUPA").as_path()));
    }

    #[cfg(unix)]
    #[test]
    fn failing_engine_propagates_exit_error() {
        let (models, sim) = temp_roots("wg_engine_failing", "RM3");
        let mut config = MatlabEngineConfig::new(models, sim);
        config.program = "sh".to_string();
        config.extra_args = vec![
            "-c".to_string(),
            "echo 'license checkout failed' >&2; exit 1".to_string(),
            "engine".to_string(),
        ];
        let engine = MatlabEngine::new(config);
        let model = WecModel::from_name("RM3");
        let params = params();
        let request = SimRequest {
            device_id: DeviceId::new(3),
            model: &model,
            params: &params,
            store_location: Path::new("/tmp/wecgrid.db"),
        };

        match engine.run(&request).unwrap_err() {
            EngineError::Exit { stderr, .. } => assert!(stderr.contains("license checkout failed")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn successful_engine_returns_ok() {
        let (models, sim) = temp_roots("wg_engine_ok", "RM3");
        let mut config = MatlabEngineConfig::new(models, sim);
        config.program = "sh".to_string();
        config.extra_args = vec!["-c".to_string(), "echo done".to_string(), "engine".to_string()];
        let engine = MatlabEngine::new(config);
        let model = WecModel::from_name("RM3");
        let params = params();
        let request = SimRequest {
            device_id: DeviceId::new(3),
            model: &model,
            params: &params,
            store_location: Path::new("/tmp/wecgrid.db"),
        };
        engine.run(&request).unwrap();
    }
}
