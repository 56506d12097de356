// Operation mode domain model
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discrete operating mode derived upstream from the unit's operation-state code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    Heating,
    Cooling,
    Dhw,
    Pool,
}

impl OperationMode {
    pub const ALL: [OperationMode; 4] = [
        OperationMode::Heating,
        OperationMode::Cooling,
        OperationMode::Dhw,
        OperationMode::Pool,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationMode::Heating => "heating",
            OperationMode::Cooling => "cooling",
            OperationMode::Dhw => "dhw",
            OperationMode::Pool => "pool",
        }
    }

    /// DHW and pool circuits only ever produce heat.
    pub fn always_heats(&self) -> bool {
        matches!(self, OperationMode::Dhw | OperationMode::Pool)
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_reported_mode(s)? {
            Some(mode) => Ok(mode),
            None => Err("operation mode is none".to_string()),
        }
    }
}

/// Parse a mode as the unit reports it, where `none` means no active circuit.
pub fn parse_reported_mode(s: &str) -> Result<Option<OperationMode>, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "heating" => Ok(Some(OperationMode::Heating)),
        "cooling" => Ok(Some(OperationMode::Cooling)),
        "dhw" => Ok(Some(OperationMode::Dhw)),
        "pool" => Ok(Some(OperationMode::Pool)),
        "none" | "" => Ok(None),
        other => Err(format!("unknown operation mode: {}", other)),
    }
}

/// Serde helper for optional modes that accepts `"none"` as well as null.
pub fn deserialize_reported_mode<'de, D>(
    deserializer: D,
) -> Result<Option<OperationMode>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_reported_mode(&raw).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_display() {
        for mode in OperationMode::ALL {
            assert_eq!(mode.to_string().parse::<OperationMode>(), Ok(mode));
        }
        assert_eq!(" DHW ".parse::<OperationMode>(), Ok(OperationMode::Dhw));
        assert!("none".parse::<OperationMode>().is_err());
        assert!("turbo".parse::<OperationMode>().is_err());
    }

    #[test]
    fn test_reported_none_is_no_mode() {
        assert_eq!(parse_reported_mode("none"), Ok(None));
        assert_eq!(parse_reported_mode(" None "), Ok(None));
        assert_eq!(parse_reported_mode("pool"), Ok(Some(OperationMode::Pool)));
        assert!(parse_reported_mode("turbo").is_err());
    }

    #[test]
    fn test_always_heats() {
        assert!(OperationMode::Dhw.always_heats());
        assert!(OperationMode::Pool.always_heats());
        assert!(!OperationMode::Heating.always_heats());
        assert!(!OperationMode::Cooling.always_heats());
    }
}
