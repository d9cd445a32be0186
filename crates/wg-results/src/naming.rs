//! Output table naming.
//!
//! The engine's formatter writes into exactly these names, so the scheme
//! is an external contract.

use wg_core::DeviceId;

use crate::{ResultsError, ResultsResult};

pub const OUTPUT_TABLE_PREFIX: &str = "WEC_output_";

pub fn output_table_name(device_id: DeviceId) -> String {
    format!("{OUTPUT_TABLE_PREFIX}{device_id}")
}

/// Inverse of [`output_table_name`]. Only canonical names map back to a
/// device, so `WEC_output_007` is not device 7.
pub fn parse_output_table_name(name: &str) -> Option<DeviceId> {
    let digits = name.strip_prefix(OUTPUT_TABLE_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let device_id = digits.parse::<u32>().ok().map(DeviceId::new)?;
    (output_table_name(device_id) == name).then_some(device_id)
}

/// Table names are spliced into SQL text, so only plain identifiers pass.
pub(crate) fn ensure_identifier(name: &str) -> ResultsResult<&str> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(name)
    } else {
        Err(ResultsError::InvalidTableName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_name_embeds_device_id() {
        assert_eq!(output_table_name(DeviceId::new(42)), "WEC_output_42");
    }

    #[test]
    fn parse_accepts_only_output_tables() {
        assert_eq!(
            parse_output_table_name("WEC_output_7"),
            Some(DeviceId::new(7))
        );
        assert_eq!(parse_output_table_name("WEC_output_"), None);
        assert_eq!(parse_output_table_name("WEC_outputX7"), None);
        assert_eq!(parse_output_table_name("WEC_output_7a"), None);
        assert_eq!(parse_output_table_name("wec_run_manifest"), None);
    }

    #[test]
    fn parse_rejects_zero_padded_ids() {
        assert_eq!(parse_output_table_name("WEC_output_007"), None);
        assert_eq!(parse_output_table_name("WEC_output_00"), None);
        assert_eq!(
            parse_output_table_name("WEC_output_0"),
            Some(DeviceId::new(0))
        );
    }

    #[test]
    fn identifiers_reject_sql_text() {
        assert!(ensure_identifier("WEC_output_1").is_ok());
        assert!(ensure_identifier("WEC_output_1; DROP TABLE x").is_err());
        assert!(ensure_identifier("1abc").is_err());
        assert!(ensure_identifier("").is_err());
    }
}
