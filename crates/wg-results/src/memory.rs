//! In-process output store.
//!
//! Holds tables in memory and keeps a log of destructive operations, which
//! makes it the store of choice for dry runs and service tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use wg_core::DeviceId;

use crate::naming::{ensure_identifier, parse_output_table_name};
use crate::store::OutputStore;
use crate::types::{OutputTable, RunManifest};
use crate::{ResultsError, ResultsResult};

#[derive(Default)]
struct MemoryState {
    tables: BTreeMap<String, OutputTable>,
    manifests: BTreeMap<DeviceId, RunManifest>,
    dropped: Vec<String>,
    loads: usize,
}

pub struct MemoryStore {
    location: PathBuf,
    state: Mutex<MemoryState>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            location: PathBuf::from(":memory:"),
            state: Mutex::new(MemoryState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        // A panicking test thread must not hide the tables from the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every `drop_table` call so far, in order, including no-op drops.
    pub fn dropped_tables(&self) -> Vec<String> {
        self.state().dropped.clone()
    }

    /// Number of successful `load_table` calls.
    pub fn load_count(&self) -> usize {
        self.state().loads
    }
}

impl OutputStore for MemoryStore {
    fn location(&self) -> &Path {
        &self.location
    }

    fn table_exists(&self, table: &str) -> ResultsResult<bool> {
        Ok(self.state().tables.contains_key(table))
    }

    fn drop_table(&self, table: &str) -> ResultsResult<()> {
        let table = ensure_identifier(table)?;
        let mut state = self.state();
        state.tables.remove(table);
        state.dropped.push(table.to_string());
        Ok(())
    }

    fn load_table(&self, table: &str) -> ResultsResult<OutputTable> {
        let mut state = self.state();
        let output = state
            .tables
            .get(table)
            .cloned()
            .ok_or_else(|| ResultsError::TableNotFound {
                table: table.to_string(),
            })?;
        state.loads += 1;
        Ok(output)
    }

    fn save_output(&self, table: &str, output: &OutputTable) -> ResultsResult<()> {
        let table = ensure_identifier(table)?;
        self.state()
            .tables
            .insert(table.to_string(), output.clone());
        Ok(())
    }

    fn list_output_tables(&self) -> ResultsResult<Vec<DeviceId>> {
        Ok(self
            .state()
            .tables
            .keys()
            .filter_map(|name| parse_output_table_name(name))
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect())
    }

    fn record_manifest(&self, manifest: &RunManifest) -> ResultsResult<()> {
        self.state()
            .manifests
            .insert(manifest.device_id, manifest.clone());
        Ok(())
    }

    fn load_manifest(&self, device_id: DeviceId) -> ResultsResult<Option<RunManifest>> {
        Ok(self.state().manifests.get(&device_id).cloned())
    }

    fn delete_manifest(&self, device_id: DeviceId) -> ResultsResult<()> {
        self.state().manifests.remove(&device_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExtraColumn, OutputSample};

    fn sample(time: f64) -> OutputSample {
        OutputSample {
            time,
            pg: 0.5,
            pmax: 1.0,
            pmin: 0.0,
            qmax: 0.2,
            qmin: -0.2,
        }
    }

    #[test]
    fn drop_is_idempotent_and_logged() {
        let store = MemoryStore::new();
        store.save_table("WEC_output_3", &[sample(0.0)]).unwrap();
        store.drop_table("WEC_output_3").unwrap();
        store.drop_table("WEC_output_3").unwrap();
        assert!(!store.table_exists("WEC_output_3").unwrap());
        assert_eq!(store.dropped_tables().len(), 2);
    }

    #[test]
    fn missing_table_load_fails() {
        let store = MemoryStore::new();
        let err = store.load_table("WEC_output_9").unwrap_err();
        assert!(matches!(err, ResultsError::TableNotFound { .. }));
        assert_eq!(store.load_count(), 0);
    }

    #[test]
    fn lists_device_tables_in_order() {
        let store = MemoryStore::new();
        store.save_table("WEC_output_10", &[]).unwrap();
        store.save_table("WEC_output_2", &[]).unwrap();
        store.save_table("scratch", &[]).unwrap();
        store.save_table("WEC_output_007", &[]).unwrap();
        assert_eq!(
            store.list_output_tables().unwrap(),
            vec![DeviceId::new(2), DeviceId::new(10)]
        );
    }

    #[test]
    fn keeps_extra_columns_through_save_and_load() {
        let store = MemoryStore::new();
        let output = OutputTable::new(
            vec![sample(0.0), sample(5.0)],
            vec![ExtraColumn {
                name: "qg".into(),
                values: vec![0.1, 0.3],
            }],
        )
        .unwrap();
        store.save_output("WEC_output_4", &output).unwrap();
        let loaded = store.load_table("WEC_output_4").unwrap();
        assert_eq!(loaded.extra_column("qg"), Some(&[0.1, 0.3][..]));
        assert_eq!(loaded.samples()[1].time, 5.0);
    }
}
