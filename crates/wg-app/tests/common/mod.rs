//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use wg_app::RunContext;
use wg_core::DeviceId;
use wg_engine::{EngineError, EngineResult, SimParams, SimRequest, SimulationEngine};
use wg_results::{
    MemoryStore, OutputSample, OutputStore, OutputTable, ResultsError, ResultsResult, RunManifest,
    SqliteStore, output_table_name,
};

/// One recorded engine invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineCall {
    pub device_id: DeviceId,
    pub model: String,
    pub entry_point: &'static str,
}

/// How the fake engine answers a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behavior {
    /// Write `simLength / Tsample` rows (10 when unset).
    WriteExpected,
    /// Write exactly this many rows.
    WriteRows(usize),
    /// Exit successfully without writing a table.
    WriteNothing,
    /// Report an engine failure.
    Fail,
}

/// Fake engine that writes synthetic output into a shared in-memory store
/// and records every call.
pub struct RecordingEngine {
    store: Arc<MemoryStore>,
    behavior: Behavior,
    delay: Option<Duration>,
    calls: Mutex<Vec<EngineCall>>,
}

impl RecordingEngine {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            behavior: Behavior::WriteExpected,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl SimulationEngine for RecordingEngine {
    fn run(&self, request: &SimRequest<'_>) -> EngineResult<()> {
        self.calls.lock().unwrap().push(EngineCall {
            device_id: request.device_id,
            model: request.model.name().to_string(),
            entry_point: request.model.entry_point(),
        });
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }

        let rows = match self.behavior {
            Behavior::WriteExpected => request.params.expected_rows().unwrap_or(10),
            Behavior::WriteRows(n) => n,
            Behavior::WriteNothing => return Ok(()),
            Behavior::Fail => {
                return Err(EngineError::Exit {
                    program: "fake-engine".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "Undefined function 'w2gSim'".to_string(),
                });
            }
        };
        self.store
            .save_table(
                &output_table_name(request.device_id),
                &synthetic_samples(rows, request.device_id),
            )
            .map_err(|e| EngineError::Io(std::io::Error::other(e.to_string())))
    }
}

/// Fake engine that opens the store at the location it was handed, the
/// way the real formatter does.
pub struct StoreLocationEngine {
    pub calls: Mutex<usize>,
}

impl StoreLocationEngine {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(0),
        }
    }
}

impl SimulationEngine for StoreLocationEngine {
    fn run(&self, request: &SimRequest<'_>) -> EngineResult<()> {
        *self.calls.lock().unwrap() += 1;
        let store = SqliteStore::open(request.store_location.to_path_buf())
            .map_err(|e| EngineError::Io(std::io::Error::other(e.to_string())))?;
        let rows = request.params.expected_rows().unwrap_or(10);
        store
            .save_table(
                &output_table_name(request.device_id),
                &synthetic_samples(rows, request.device_id),
            )
            .map_err(|e| EngineError::Io(std::io::Error::other(e.to_string())))
    }
}

/// Store whose manifest writes always fail; everything else goes to the
/// wrapped in-memory store.
pub struct ManifestFailStore {
    pub inner: Arc<MemoryStore>,
}

impl OutputStore for ManifestFailStore {
    fn location(&self) -> &Path {
        self.inner.location()
    }

    fn table_exists(&self, table: &str) -> ResultsResult<bool> {
        self.inner.table_exists(table)
    }

    fn drop_table(&self, table: &str) -> ResultsResult<()> {
        self.inner.drop_table(table)
    }

    fn load_table(&self, table: &str) -> ResultsResult<OutputTable> {
        self.inner.load_table(table)
    }

    fn save_output(&self, table: &str, output: &OutputTable) -> ResultsResult<()> {
        self.inner.save_output(table, output)
    }

    fn list_output_tables(&self) -> ResultsResult<Vec<DeviceId>> {
        self.inner.list_output_tables()
    }

    fn record_manifest(&self, _manifest: &RunManifest) -> ResultsResult<()> {
        Err(ResultsError::CorruptManifest {
            message: "manifest table is read-only".to_string(),
        })
    }

    fn load_manifest(&self, device_id: DeviceId) -> ResultsResult<Option<RunManifest>> {
        self.inner.load_manifest(device_id)
    }

    fn delete_manifest(&self, device_id: DeviceId) -> ResultsResult<()> {
        self.inner.delete_manifest(device_id)
    }
}

/// Deterministic rows at a 300 s cadence, tagged by device id.
pub fn synthetic_samples(rows: usize, device_id: DeviceId) -> Vec<OutputSample> {
    (0..rows)
        .map(|i| OutputSample {
            time: i as f64 * 300.0,
            pg: f64::from(device_id.get()) * 1e-3 + i as f64 * 1e-4,
            pmax: 0.5,
            pmin: 0.0,
            qmax: 0.1,
            qmin: -0.1,
        })
        .collect()
}

/// Run start used throughout the tests: 2023-11-08 09:00:00.
pub fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 11, 8)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

pub fn context() -> RunContext {
    RunContext::new(start_time())
}

/// One hour at five-minute samples: 12 rows.
pub fn hour_params() -> SimParams {
    SimParams::new()
        .with("simLength", 3600_i64)
        .with("Tsample", 300_i64)
        .with("waveHeight", 2.5)
        .with("wavePeriod", 8_i64)
        .with("waveSeed", 1234_i64)
}

/// Fresh temp directory for a sqlite-backed test.
pub fn temp_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("wecgrid_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
