//! Output store API.

use std::path::Path;

use wg_core::DeviceId;

use crate::ResultsResult;
use crate::types::{OutputSample, OutputTable, RunManifest};

/// Relational store holding one output table per device.
///
/// Implementations acquire and release their connections per call, so a
/// failed operation never leaves a connection or cursor behind.
pub trait OutputStore: Send + Sync {
    /// Location bound into the engine workspace so its formatter writes
    /// into this same store.
    fn location(&self) -> &Path;

    fn table_exists(&self, table: &str) -> ResultsResult<bool>;

    /// Drop `table` if it exists. Dropping a missing table is not an error.
    fn drop_table(&self, table: &str) -> ResultsResult<()>;

    /// Load every row and every column of `table`, in storage order.
    ///
    /// Tables missing one of the known columns are an error; columns
    /// beyond them are returned as extra columns.
    fn load_table(&self, table: &str) -> ResultsResult<OutputTable>;

    /// Replace `table` wholesale with `output`, extra columns included.
    fn save_output(&self, table: &str, output: &OutputTable) -> ResultsResult<()>;

    /// Replace `table` wholesale with rows holding only the known columns.
    fn save_table(&self, table: &str, samples: &[OutputSample]) -> ResultsResult<()> {
        self.save_output(table, &OutputTable::from_samples(samples.to_vec()))
    }

    /// Device ids that currently have an output table, ascending.
    fn list_output_tables(&self) -> ResultsResult<Vec<DeviceId>>;

    fn record_manifest(&self, manifest: &RunManifest) -> ResultsResult<()>;

    fn load_manifest(&self, device_id: DeviceId) -> ResultsResult<Option<RunManifest>>;

    fn delete_manifest(&self, device_id: DeviceId) -> ResultsResult<()>;
}
