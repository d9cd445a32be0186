//! Content-based fingerprint of the parameters behind a computed table.

use serde::Serialize;
use sha2::{Digest, Sha256};
use wg_core::DeviceId;

pub fn compute_params_fingerprint<P: Serialize>(
    device_id: DeviceId,
    model: &str,
    params: &P,
) -> String {
    let mut hasher = Sha256::new();

    hasher.update(device_id.get().to_le_bytes());
    hasher.update(model.as_bytes());

    let params_json = serde_json::to_string(params).unwrap_or_default();
    hasher.update(params_json.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
