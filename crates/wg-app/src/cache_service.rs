//! Cache administration: listing, invalidating and importing device
//! output tables.

use wg_core::DeviceId;
use wg_results::{OutputStore, OutputTable, RunManifest, output_table_name};

use crate::error::{AppError, AppResult};
use crate::locks::DeviceLocks;

/// One cached output table and its manifest, when the table was computed
/// by wecgrid.
#[derive(Debug, Clone)]
pub struct CachedDevice {
    pub device_id: DeviceId,
    pub table: String,
    pub manifest: Option<RunManifest>,
}

/// List every device with an output table in the store.
pub fn list_cached(store: &dyn OutputStore) -> AppResult<Vec<CachedDevice>> {
    let mut cached = Vec::new();
    for device_id in store.list_output_tables()? {
        cached.push(CachedDevice {
            device_id,
            table: output_table_name(device_id),
            manifest: store.load_manifest(device_id)?,
        });
    }
    Ok(cached)
}

/// Drop a device's output table and manifest so the next resolution
/// simulates again. Returns whether a table was present.
pub fn invalidate(
    store: &dyn OutputStore,
    locks: &DeviceLocks,
    device_id: DeviceId,
) -> AppResult<bool> {
    locks.with_lock(device_id, || -> AppResult<bool> {
        let table = output_table_name(device_id);
        let existed = store.table_exists(&table)?;
        store.drop_table(&table)?;
        store.delete_manifest(device_id)?;
        tracing::info!(%device_id, table = %table, existed, "invalidated device output");
        Ok(existed)
    })
}

/// Store externally produced rows as a device's output table.
///
/// The table is replaced wholesale. Any manifest from an earlier
/// simulation is removed, since it no longer describes the table.
pub fn import_csv(
    store: &dyn OutputStore,
    locks: &DeviceLocks,
    device_id: DeviceId,
    output: &OutputTable,
) -> AppResult<()> {
    if output.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "Refusing to import an empty output table for device {}",
            device_id
        )));
    }
    locks.with_lock(device_id, || -> AppResult<()> {
        let table = output_table_name(device_id);
        store.save_output(&table, output)?;
        store.delete_manifest(device_id)?;
        tracing::info!(
            %device_id,
            table = %table,
            rows = output.len(),
            extra_columns = output.extra_columns().len(),
            "imported device output"
        );
        Ok(())
    })
}
