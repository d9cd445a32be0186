use core::fmt;
use core::str::FromStr;

use crate::CoreError;

/// Integer simulation id of one WEC device.
///
/// The id doubles as the cache key into the output store, so it must be
/// stable and unique within a run.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct DeviceId(u32);

impl DeviceId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for DeviceId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl FromStr for DeviceId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| CoreError::InvalidArg {
                what: "device id must be a non-negative integer",
            })
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_round_trip() {
        for raw in [0_u32, 7, 42, 10_000] {
            let id: DeviceId = raw.to_string().parse().unwrap();
            assert_eq!(id.get(), raw);
            assert_eq!(id.to_string(), raw.to_string());
        }
    }

    #[test]
    fn parse_rejects_negative_and_text() {
        assert!("-1".parse::<DeviceId>().is_err());
        assert!("wec".parse::<DeviceId>().is_err());
    }
}
