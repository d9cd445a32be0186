//! Device output resolution: load from the store, or simulate and load.

use std::time::Instant;

use chrono::Local;
use wg_core::{DeviceId, Timer};
use wg_engine::{SimParams, SimRequest, SimulationEngine, WecModel};
use wg_results::{
    OutputStore, OutputTable, RunManifest, compute_params_fingerprint, output_table_name,
};

use crate::error::{AppError, AppResult};
use crate::locks::DeviceLocks;
use crate::progress::{ResolveProgressEvent, ResolveStage};

/// Options for resolving a device's output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Skip the cache lookup and regenerate the table.
    pub force_refresh: bool,
    /// Fail with [`AppError::NotCached`] instead of simulating.
    pub cached_only: bool,
}

/// Request to resolve one device's output.
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    pub device_id: DeviceId,
    pub model: &'a WecModel,
    pub params: &'a SimParams,
    pub options: ResolveOptions,
}

/// Where resolved output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSource {
    Cache,
    Simulation,
}

/// Wall-clock breakdown of a resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolveTiming {
    pub lookup_time_s: f64,
    pub drop_time_s: f64,
    pub simulate_time_s: f64,
    pub load_time_s: f64,
    pub total_time_s: f64,
}

#[derive(Debug, Clone)]
pub struct ResolvedOutput {
    pub table: String,
    pub output: OutputTable,
    pub source: OutputSource,
    pub timing: ResolveTiming,
}

/// Resolves device output against an injected store and engine.
pub struct Resolver<'a> {
    store: &'a dyn OutputStore,
    engine: &'a dyn SimulationEngine,
    locks: &'a DeviceLocks,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(ResolveProgressEvent)>,
    device_id: DeviceId,
    stage: ResolveStage,
    started: Instant,
    message: Option<String>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(ResolveProgressEvent {
            device_id,
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message,
        });
    }
}

impl<'a> Resolver<'a> {
    pub fn new(
        store: &'a dyn OutputStore,
        engine: &'a dyn SimulationEngine,
        locks: &'a DeviceLocks,
    ) -> Self {
        Self {
            store,
            engine,
            locks,
        }
    }

    pub fn store(&self) -> &'a dyn OutputStore {
        self.store
    }

    pub fn locks(&self) -> &'a DeviceLocks {
        self.locks
    }

    /// Load a device's output from the store, simulating it first when
    /// no table exists.
    pub fn resolve(&self, request: &ResolveRequest<'_>) -> AppResult<ResolvedOutput> {
        self.resolve_with_progress(request, None)
    }

    /// Resolve and stream progress events.
    pub fn resolve_with_progress(
        &self,
        request: &ResolveRequest<'_>,
        mut progress_cb: Option<&mut dyn FnMut(ResolveProgressEvent)>,
    ) -> AppResult<ResolvedOutput> {
        let started = Instant::now();
        let device_id = request.device_id;

        let mut resolved = self.locks.with_lock(device_id, || {
            self.resolve_locked(request, &mut progress_cb, started)
        })?;
        resolved.timing.total_time_s = started.elapsed().as_secs_f64();
        Ok(resolved)
    }

    fn resolve_locked(
        &self,
        request: &ResolveRequest<'_>,
        progress_cb: &mut Option<&mut dyn FnMut(ResolveProgressEvent)>,
        started: Instant,
    ) -> AppResult<ResolvedOutput> {
        let device_id = request.device_id;
        let table = output_table_name(device_id);
        let mut timing = ResolveTiming::default();

        if !request.options.force_refresh {
            emit_progress(progress_cb, device_id, ResolveStage::CheckingCache, started, None);
            let lookup = Timer::start("cache lookup");
            let cached = self.store.table_exists(&table)?;
            timing.lookup_time_s = lookup.stop();

            if cached {
                tracing::debug!(%device_id, table = %table, "loading cached device output");
                emit_progress(progress_cb, device_id, ResolveStage::LoadingCached, started, None);
                let load = Timer::start("load cached output");
                let output = self.load_output(&table)?;
                timing.load_time_s = load.stop_and_log();
                return Ok(ResolvedOutput {
                    table,
                    output,
                    source: OutputSource::Cache,
                    timing,
                });
            }
        }

        if request.options.cached_only {
            return Err(AppError::NotCached { device_id, table });
        }

        tracing::info!(
            %device_id,
            model = %request.model,
            table = %table,
            refresh = request.options.force_refresh,
            "device output not cached; running simulation"
        );

        emit_progress(progress_cb, device_id, ResolveStage::DroppingStale, started, None);
        let drop_timer = Timer::start("drop stale table");
        self.store.drop_table(&table)?;
        timing.drop_time_s = drop_timer.stop();

        emit_progress(
            progress_cb,
            device_id,
            ResolveStage::Simulating,
            started,
            Some(format!("{} via {}", request.model, request.model.entry_point())),
        );
        let simulate = Timer::start("simulate");
        self.engine.run(&SimRequest {
            device_id,
            model: request.model,
            params: request.params,
            store_location: self.store.location(),
        })?;
        timing.simulate_time_s = simulate.stop_and_log();

        emit_progress(progress_cb, device_id, ResolveStage::Loading, started, None);
        if !self.store.table_exists(&table)? {
            return Err(AppError::MissingOutput { device_id, table });
        }
        let load = Timer::start("load computed output");
        let output = self.load_output(&table)?;
        timing.load_time_s = load.stop_and_log();

        if let Some(expected) = request.params.expected_rows() {
            if expected != output.len() {
                tracing::warn!(
                    %device_id,
                    expected,
                    actual = output.len(),
                    "computed row count differs from simLength / Tsample"
                );
            }
        }

        // Manifests are advisory; the written table stays usable without one.
        let manifest = RunManifest {
            device_id,
            model: request.model.name().to_string(),
            table_name: table.clone(),
            params_hash: compute_params_fingerprint(device_id, request.model.name(), request.params),
            completed_at: Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S").to_string(),
            row_count: output.len(),
        };
        if let Err(err) = self.store.record_manifest(&manifest) {
            tracing::warn!(%device_id, error = %err, "failed to record run manifest");
        }

        tracing::info!(
            %device_id,
            rows = output.len(),
            elapsed_s = timing.simulate_time_s,
            "simulation completed"
        );

        Ok(ResolvedOutput {
            table,
            output,
            source: OutputSource::Simulation,
            timing,
        })
    }

    /// The single place output is materialized from the store, shared by
    /// the cache-hit and compute paths.
    fn load_output(&self, table: &str) -> AppResult<OutputTable> {
        Ok(self.store.load_table(table)?)
    }
}
