//! Simulation parameters forwarded to the engine.
//!
//! The mapping is open: every key is bound into the engine verbatim and
//! only the engine decides which keys it understands. The accessors below
//! cover the keys that feed the entry point's positional arguments.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wg_core::expected_sample_count;

use crate::error::{EngineError, EngineResult};

pub const SIM_LENGTH: &str = "simLength";
pub const SAMPLE_RESOLUTION: &str = "Tsample";
pub const WAVE_HEIGHT: &str = "waveHeight";
pub const WAVE_PERIOD: &str = "wavePeriod";
pub const WAVE_SEED: &str = "waveSeed";

/// Long-form spellings accepted for the positional keys.
const ALIASES: [(&str, &str); 2] = [
    (SIM_LENGTH, "simulationLength"),
    (SAMPLE_RESOLUTION, "sampleResolution"),
];

/// Positional argument order of both entry points, after the device id.
pub const POSITIONAL_KEYS: [&str; 4] = [SIM_LENGTH, SAMPLE_RESOLUTION, WAVE_HEIGHT, WAVE_PERIOD];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            ParamValue::Bool(_) | ParamValue::Text(_) => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

/// How the wave seed reaches the engine: pinned to an explicit seed, or
/// left to the engine's own default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedPolicy {
    Fixed(u64),
    EngineDefault,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimParams {
    values: BTreeMap<String, ParamValue>,
}

impl SimParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.values.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a positional key, falling back to its long-form alias.
    fn lookup(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key).or_else(|| {
            ALIASES
                .iter()
                .find(|(canonical, _)| *canonical == key)
                .and_then(|(_, alias)| self.values.get(*alias))
        })
    }

    pub fn numeric(&self, key: &str) -> Option<f64> {
        self.lookup(key).and_then(ParamValue::as_f64)
    }

    /// Simulation length in seconds.
    pub fn sim_length(&self) -> Option<f64> {
        self.numeric(SIM_LENGTH)
    }

    /// Sample resolution in seconds.
    pub fn sample_resolution(&self) -> Option<f64> {
        self.numeric(SAMPLE_RESOLUTION)
    }

    pub fn wave_height(&self) -> Option<f64> {
        self.numeric(WAVE_HEIGHT)
    }

    pub fn wave_period(&self) -> Option<f64> {
        self.numeric(WAVE_PERIOD)
    }

    pub fn seed_policy(&self) -> EngineResult<SeedPolicy> {
        match self.values.get(WAVE_SEED) {
            None => Ok(SeedPolicy::EngineDefault),
            Some(ParamValue::Int(seed)) if *seed >= 0 => Ok(SeedPolicy::Fixed(*seed as u64)),
            Some(ParamValue::Float(seed)) if *seed >= 0.0 && seed.fract() == 0.0 => {
                Ok(SeedPolicy::Fixed(*seed as u64))
            }
            Some(other) => Err(EngineError::InvalidParameter {
                key: WAVE_SEED.to_string(),
                reason: format!("expected a non-negative integer, got {other:?}"),
            }),
        }
    }

    /// Rows the engine is expected to produce: `simLength / Tsample`.
    pub fn expected_rows(&self) -> Option<usize> {
        expected_sample_count(self.sim_length()?, self.sample_resolution()?)
    }

    /// Variables to bind into the engine workspace.
    ///
    /// Every configured key is bound as given. When a positional key was
    /// configured under its long-form alias, the canonical name is bound
    /// too so the entry point call can reference it.
    pub fn workspace_bindings(&self) -> Vec<(String, ParamValue)> {
        let mut bindings: Vec<(String, ParamValue)> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (canonical, alias) in ALIASES {
            if self.values.contains_key(canonical) {
                continue;
            }
            if let Some(value) = self.values.get(alias) {
                bindings.push((canonical.to_string(), value.clone()));
            }
        }
        bindings
    }
}
