//! The WEC device entity.
//!
//! A [`Wec`] only exists resolved: constructing one runs the
//! cache-or-compute resolution and attaches the snapshot timeline, so
//! every value of the type carries a complete output table.

use chrono::NaiveDateTime;
use wg_core::{DeviceId, snapshot_timeline};
use wg_engine::{SimParams, WecModel};
use wg_project::{BusLocation, DeviceDef};
use wg_results::{ExtraColumn, OutputColumn, OutputSample, OutputTable};

use crate::context::RunContext;
use crate::error::AppResult;
use crate::progress::{ResolveProgressEvent, ResolveStage};
use crate::resolve_service::{OutputSource, ResolveOptions, ResolveRequest, ResolveTiming, Resolver};

/// Per-unit base power used when none is configured.
pub const DEFAULT_MBASE: f64 = 0.1;

/// Active and reactive power limits of a device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerBounds {
    pub pmax: f64,
    pub pmin: f64,
    pub qmax: f64,
    pub qmin: f64,
}

impl Default for PowerBounds {
    fn default() -> Self {
        Self {
            pmax: 9999.0,
            pmin: -9999.0,
            qmax: 9999.0,
            qmin: -9999.0,
        }
    }
}

impl PowerBounds {
    pub fn with_pmax(mut self, pmax: f64) -> Self {
        self.pmax = pmax;
        self
    }

    pub fn with_pmin(mut self, pmin: f64) -> Self {
        self.pmin = pmin;
        self
    }

    pub fn with_qmax(mut self, qmax: f64) -> Self {
        self.qmax = qmax;
        self
    }

    pub fn with_qmin(mut self, qmin: f64) -> Self {
        self.qmin = qmin;
        self
    }
}

/// Construction inputs of a device, before its output is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct WecSpec {
    pub id: DeviceId,
    pub model: WecModel,
    pub bus_location: BusLocation,
    pub bounds: PowerBounds,
    pub mbase: f64,
    pub config: SimParams,
}

impl WecSpec {
    pub fn new(id: DeviceId, model: WecModel, bus_location: BusLocation) -> Self {
        Self {
            id,
            model,
            bus_location,
            bounds: PowerBounds::default(),
            mbase: DEFAULT_MBASE,
            config: SimParams::new(),
        }
    }

    pub fn with_bounds(mut self, bounds: PowerBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_mbase(mut self, mbase: f64) -> Self {
        self.mbase = mbase;
        self
    }

    pub fn with_config(mut self, config: SimParams) -> Self {
        self.config = config;
        self
    }

    /// Build from a project device entry; each bound left out of the file
    /// keeps its default on its own.
    pub fn from_def(def: &DeviceDef) -> Self {
        let defaults = PowerBounds::default();
        let bounds = PowerBounds {
            pmax: def.pmax.unwrap_or(defaults.pmax),
            pmin: def.pmin.unwrap_or(defaults.pmin),
            qmax: def.qmax.unwrap_or(defaults.qmax),
            qmin: def.qmin.unwrap_or(defaults.qmin),
        };
        Self::new(def.id, def.model.clone(), def.bus_location.clone())
            .with_bounds(bounds)
            .with_mbase(def.mbase.unwrap_or(DEFAULT_MBASE))
            .with_config(def.config.clone())
    }
}

/// Resolved output with its snapshot timeline.
///
/// Rows are fixed once built; there is no way to edit them in place.
#[derive(Debug, Clone, PartialEq)]
pub struct WecOutput {
    table: OutputTable,
    snapshots: Vec<NaiveDateTime>,
}

impl WecOutput {
    /// Attach one snapshot per row, starting at `start`.
    pub fn with_timeline(table: impl Into<OutputTable>, start: NaiveDateTime) -> AppResult<Self> {
        let table = table.into();
        let snapshots = snapshot_timeline(start, table.len())?;
        Ok(Self { table, snapshots })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn table(&self) -> &OutputTable {
        &self.table
    }

    pub fn samples(&self) -> &[OutputSample] {
        self.table.samples()
    }

    /// Columns the formatter wrote beyond the known six.
    pub fn extra_columns(&self) -> &[ExtraColumn] {
        self.table.extra_columns()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.table.column_names()
    }

    pub fn snapshots(&self) -> &[NaiveDateTime] {
        &self.snapshots
    }

    pub fn rows(&self) -> impl Iterator<Item = (NaiveDateTime, &OutputSample)> + '_ {
        self.snapshots.iter().copied().zip(self.table.samples().iter())
    }

    pub fn column(&self, column: OutputColumn) -> Vec<f64> {
        self.table.samples().iter().map(|s| s.value(column)).collect()
    }
}

/// One wave energy converter with resolved output.
#[derive(Debug, Clone)]
pub struct Wec {
    id: DeviceId,
    model: WecModel,
    bus_location: BusLocation,
    bounds: PowerBounds,
    mbase: f64,
    config: SimParams,
    gen_id: String,
    gen_name: String,
    output: WecOutput,
    source: OutputSource,
    timing: ResolveTiming,
}

impl Wec {
    /// Construct a device, resolving its output through `resolver`.
    ///
    /// Blocks for the whole engine run when the output is not cached.
    /// Store and engine failures are returned unchanged; nothing is
    /// retried.
    pub fn new(ctx: &RunContext, spec: WecSpec, resolver: &Resolver<'_>) -> AppResult<Self> {
        Self::with_progress(ctx, spec, resolver, ResolveOptions::default(), None)
    }

    pub fn with_progress(
        ctx: &RunContext,
        spec: WecSpec,
        resolver: &Resolver<'_>,
        options: ResolveOptions,
        mut progress_cb: Option<&mut dyn FnMut(ResolveProgressEvent)>,
    ) -> AppResult<Self> {
        let request = ResolveRequest {
            device_id: spec.id,
            model: &spec.model,
            params: &spec.config,
            options,
        };
        let mut forward = |event: ResolveProgressEvent| {
            if let Some(cb) = progress_cb.as_deref_mut() {
                cb(event);
            }
        };
        let resolved = resolver.resolve_with_progress(&request, Some(&mut forward))?;

        if let Some(cb) = progress_cb.as_deref_mut() {
            cb(ResolveProgressEvent {
                device_id: spec.id,
                stage: ResolveStage::AttachingTimeline,
                elapsed_wall_s: resolved.timing.total_time_s,
                message: Some(format!("{} rows", resolved.output.len())),
            });
        }
        let output = WecOutput::with_timeline(resolved.output, ctx.start_time)?;

        if let Some(cb) = progress_cb.as_deref_mut() {
            cb(ResolveProgressEvent {
                device_id: spec.id,
                stage: ResolveStage::Completed,
                elapsed_wall_s: resolved.timing.total_time_s,
                message: None,
            });
        }

        Ok(Self {
            id: spec.id,
            model: spec.model,
            bus_location: spec.bus_location,
            bounds: spec.bounds,
            mbase: spec.mbase,
            config: spec.config,
            gen_id: String::new(),
            gen_name: String::new(),
            output,
            source: resolved.source,
            timing: resolved.timing,
        })
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn model(&self) -> &WecModel {
        &self.model
    }

    pub fn bus_location(&self) -> &BusLocation {
        &self.bus_location
    }

    pub fn bounds(&self) -> PowerBounds {
        self.bounds
    }

    pub fn mbase(&self) -> f64 {
        self.mbase
    }

    pub fn config(&self) -> &SimParams {
        &self.config
    }

    pub fn output(&self) -> &WecOutput {
        &self.output
    }

    pub fn source(&self) -> OutputSource {
        self.source
    }

    pub fn timing(&self) -> &ResolveTiming {
        &self.timing
    }

    pub fn gen_id(&self) -> &str {
        &self.gen_id
    }

    pub fn gen_name(&self) -> &str {
        &self.gen_name
    }

    /// Record the generator a grid model bound this device to.
    pub fn bind_generator(&mut self, gen_id: impl Into<String>, gen_name: impl Into<String>) {
        self.gen_id = gen_id.into();
        self.gen_name = gen_name.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use proptest::prelude::*;

    fn sample(time: f64) -> OutputSample {
        OutputSample {
            time,
            pg: time / 1000.0,
            pmax: 0.1,
            pmin: 0.0,
            qmax: 0.02,
            qmin: -0.02,
        }
    }

    #[test]
    fn bounds_default_to_wide_limits() {
        let spec = WecSpec::new(
            DeviceId::new(1),
            WecModel::from_name("RM3"),
            BusLocation::Number(1),
        );
        assert_eq!(spec.bounds.pmax, 9999.0);
        assert_eq!(spec.bounds.pmin, -9999.0);
        assert_eq!(spec.bounds.qmax, 9999.0);
        assert_eq!(spec.bounds.qmin, -9999.0);
        assert_eq!(spec.mbase, 0.1);
    }

    proptest! {
        #[test]
        fn each_bound_overrides_independently(
            which in 0usize..4,
            value in -1.0e4f64..1.0e4,
        ) {
            let defaults = PowerBounds::default();
            let bounds = match which {
                0 => defaults.with_pmax(value),
                1 => defaults.with_pmin(value),
                2 => defaults.with_qmax(value),
                _ => defaults.with_qmin(value),
            };
            let fields = [bounds.pmax, bounds.pmin, bounds.qmax, bounds.qmin];
            let default_fields = [defaults.pmax, defaults.pmin, defaults.qmax, defaults.qmin];
            for i in 0..4 {
                if i == which {
                    prop_assert_eq!(fields[i], value);
                } else {
                    prop_assert_eq!(fields[i], default_fields[i]);
                }
            }
        }
    }

    #[test]
    fn from_def_keeps_defaults_for_missing_bounds() {
        let def = DeviceDef {
            id: DeviceId::new(3),
            model: WecModel::Lupa,
            bus_location: BusLocation::Name("B3".into()),
            pmax: None,
            pmin: Some(-1.0),
            qmax: None,
            qmin: Some(-2.0),
            mbase: None,
            config: SimParams::new().with("simLength", 600_i64),
        };
        let spec = WecSpec::from_def(&def);
        assert_eq!(
            spec.bounds,
            PowerBounds {
                pmax: 9999.0,
                pmin: -1.0,
                qmax: 9999.0,
                qmin: -2.0,
            }
        );
        assert_eq!(spec.mbase, DEFAULT_MBASE);
        assert_eq!(spec.config.sim_length(), Some(600.0));
    }

    #[test]
    fn timeline_matches_rows() {
        let start = NaiveDate::from_ymd_opt(2023, 11, 8)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let output =
            WecOutput::with_timeline(vec![sample(0.0), sample(300.0), sample(600.0)], start)
                .unwrap();
        assert_eq!(output.len(), 3);
        assert_eq!(output.snapshots()[0], start);
        assert_eq!(output.snapshots()[2], start + Duration::minutes(10));

        let rows: Vec<_> = output.rows().collect();
        assert_eq!(rows[1].0, start + Duration::minutes(5));
        assert_eq!(rows[1].1.time, 300.0);
        assert_eq!(output.column(OutputColumn::Time), vec![0.0, 300.0, 600.0]);
    }

    #[test]
    fn timeline_covers_extra_columns() {
        let start = NaiveDate::from_ymd_opt(2023, 11, 8)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let table = OutputTable::new(
            vec![sample(0.0), sample(300.0)],
            vec![ExtraColumn {
                name: "qg".into(),
                values: vec![0.01, 0.02],
            }],
        )
        .unwrap();
        let output = WecOutput::with_timeline(table, start).unwrap();
        assert_eq!(output.snapshots().len(), 2);
        assert_eq!(output.extra_columns()[0].name, "qg");
        assert_eq!(output.column_names().last(), Some(&"qg"));
    }
}
