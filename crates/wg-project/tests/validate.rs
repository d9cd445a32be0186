use std::path::PathBuf;

use chrono::NaiveDate;
use wg_core::DeviceId;
use wg_engine::{SimParams, WecModel};
use wg_project::*;

fn device(id: u32) -> DeviceDef {
    DeviceDef {
        id: DeviceId::new(id),
        model: WecModel::from_name("RM3"),
        bus_location: BusLocation::Number(1),
        pmax: None,
        pmin: None,
        qmax: None,
        qmin: None,
        mbase: None,
        config: SimParams::new(),
    }
}

fn project(devices: Vec<DeviceDef>) -> Project {
    Project {
        version: LATEST_VERSION,
        name: "validate".to_string(),
        paths: PathsConfig {
            wec_model: PathBuf::from("models"),
            wec_sim: PathBuf::from("sim"),
            database: PathBuf::from("db.sqlite"),
        },
        engine: EngineDef::default(),
        context: ContextDef {
            start_time: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        },
        devices,
    }
}

#[test]
fn empty_config_is_accepted() {
    // Configuration is forwarded to the engine unchecked.
    validate_project(&project(vec![device(1), device(2)])).unwrap();
}

#[test]
fn duplicate_device_ids_rejected() {
    let err = validate_project(&project(vec![device(3), device(3)])).unwrap_err();
    assert!(matches!(err, ValidationError::DuplicateId { .. }));
}

#[test]
fn inverted_bounds_rejected() {
    let mut d = device(1);
    d.pmin = Some(5.0);
    d.pmax = Some(1.0);
    assert!(validate_project(&project(vec![d])).is_err());

    let mut d = device(1);
    d.qmin = Some(0.5);
    d.qmax = Some(-0.5);
    assert!(validate_project(&project(vec![d])).is_err());
}

#[test]
fn non_positive_mbase_rejected() {
    let mut d = device(1);
    d.mbase = Some(0.0);
    let err = validate_project(&project(vec![d])).unwrap_err();
    assert!(err.to_string().contains("mbase"));
}

#[test]
fn non_finite_bound_rejected() {
    let mut d = device(1);
    d.qmax = Some(f64::INFINITY);
    assert!(validate_project(&project(vec![d])).is_err());
}

#[test]
fn non_numeric_positional_parameter_rejected() {
    let mut d = device(1);
    d.config = SimParams::new().with("waveHeight", "tall");
    let err = validate_project(&project(vec![d])).unwrap_err();
    assert!(err.to_string().contains("waveHeight"));
}

#[test]
fn malformed_wave_seed_rejected() {
    let mut d = device(1);
    d.config = SimParams::new().with("waveSeed", 1.5);
    let err = validate_project(&project(vec![d])).unwrap_err();
    assert!(err.to_string().contains("waveSeed"));
}

#[test]
fn future_version_rejected() {
    let mut p = project(vec![]);
    p.version = LATEST_VERSION + 1;
    assert!(matches!(
        validate_project(&p),
        Err(ValidationError::UnsupportedVersion { .. })
    ));
}
