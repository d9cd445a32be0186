//! Resolution against a real SQLite store, with an engine that writes
//! through the store location it is handed.

mod common;

use std::fs;

use common::{StoreLocationEngine, context, hour_params, synthetic_samples, temp_dir};
use wg_app::{
    DeviceLocks, OutputSource, Resolver, Wec, WecSpec, import_csv, invalidate, list_cached,
    read_output_csv, write_csv,
};
use wg_core::DeviceId;
use wg_engine::WecModel;
use wg_project::BusLocation;
use wg_results::{ExtraColumn, OutputStore, OutputTable, SqliteStore};

fn lupa(id: u32) -> WecSpec {
    WecSpec::new(DeviceId::new(id), WecModel::Lupa, BusLocation::Number(14))
        .with_config(hour_params())
}

#[test]
fn compute_then_cache_through_sqlite() {
    let dir = temp_dir("sqlite_resolution");
    let store = SqliteStore::open(dir.join("wecgrid.db")).unwrap();
    let engine = StoreLocationEngine::new();
    let locks = DeviceLocks::new();
    let resolver = Resolver::new(&store, &engine, &locks);

    let first = Wec::new(&context(), lupa(42), &resolver).unwrap();
    assert_eq!(first.source(), OutputSource::Simulation);
    assert_eq!(first.output().len(), 12);

    let manifest = store.load_manifest(DeviceId::new(42)).unwrap().unwrap();
    assert_eq!(manifest.model, "LUPA");
    assert_eq!(manifest.row_count, 12);
    assert_eq!(manifest.params_hash.len(), 64);

    let second = Wec::new(&context(), lupa(42), &resolver).unwrap();
    assert_eq!(second.source(), OutputSource::Cache);
    assert_eq!(first.output(), second.output());
    assert_eq!(*engine.calls.lock().unwrap(), 1);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn invalidate_forces_new_simulation() {
    let dir = temp_dir("sqlite_invalidate");
    let store = SqliteStore::open(dir.join("wecgrid.db")).unwrap();
    let engine = StoreLocationEngine::new();
    let locks = DeviceLocks::new();
    let resolver = Resolver::new(&store, &engine, &locks);

    Wec::new(&context(), lupa(5), &resolver).unwrap();
    let cached = list_cached(&store).unwrap();
    assert_eq!(cached.len(), 1);
    assert!(cached[0].manifest.is_some());

    assert!(invalidate(&store, &locks, DeviceId::new(5)).unwrap());
    assert!(store.load_manifest(DeviceId::new(5)).unwrap().is_none());

    let again = Wec::new(&context(), lupa(5), &resolver).unwrap();
    assert_eq!(again.source(), OutputSource::Simulation);
    assert_eq!(*engine.calls.lock().unwrap(), 2);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn exported_csv_imports_as_cached_output() {
    let dir = temp_dir("sqlite_import");
    let store = SqliteStore::open(dir.join("wecgrid.db")).unwrap();
    let engine = StoreLocationEngine::new();
    let locks = DeviceLocks::new();
    let resolver = Resolver::new(&store, &engine, &locks);

    let source = Wec::new(&context(), lupa(1), &resolver).unwrap();
    let csv_path = dir.join("device_1.csv");
    write_csv(source.output(), fs::File::create(&csv_path).unwrap()).unwrap();

    let table = read_output_csv(fs::File::open(&csv_path).unwrap()).unwrap();
    import_csv(&store, &locks, DeviceId::new(2), &table).unwrap();

    let imported = Wec::new(&context(), lupa(2), &resolver).unwrap();
    assert_eq!(imported.source(), OutputSource::Cache);
    assert_eq!(imported.output().samples(), source.output().samples());
    assert_eq!(*engine.calls.lock().unwrap(), 1);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn cached_formatter_columns_reach_the_device() {
    let dir = temp_dir("sqlite_extra_columns");
    let store = SqliteStore::open(dir.join("wecgrid.db")).unwrap();
    let engine = StoreLocationEngine::new();
    let locks = DeviceLocks::new();
    let resolver = Resolver::new(&store, &engine, &locks);

    let table = OutputTable::new(
        synthetic_samples(3, DeviceId::new(7)),
        vec![ExtraColumn {
            name: "qg".to_string(),
            values: vec![0.01, 0.02, 0.03],
        }],
    )
    .unwrap();
    store.save_output("WEC_output_7", &table).unwrap();

    let wec = Wec::new(&context(), lupa(7), &resolver).unwrap();
    assert_eq!(wec.source(), OutputSource::Cache);
    assert_eq!(wec.output().table(), &table);
    assert_eq!(*engine.calls.lock().unwrap(), 0);

    let _ = fs::remove_dir_all(&dir);
}
