// Energy domain models - thermal energy kinds, persistence snapshot and COP quality
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyKind {
    Heating,
    Cooling,
}

/// Energy totals the host persists across restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalEnergySnapshot {
    pub daily_heating_energy: f64,
    pub total_heating_energy: f64,
    pub daily_cooling_energy: f64,
    pub total_cooling_energy: f64,
    /// Local date the daily counters belong to
    pub last_reset_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopQuality {
    NoData,
    InsufficientData,
    Preliminary,
    Optimal,
}

impl CopQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            CopQuality::NoData => "no_data",
            CopQuality::InsufficientData => "insufficient_data",
            CopQuality::Preliminary => "preliminary",
            CopQuality::Optimal => "optimal",
        }
    }
}

impl fmt::Display for CopQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CopQualityReport {
    pub quality: CopQuality,
    pub measurement_count: usize,
    pub time_span_minutes: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_labels() {
        assert_eq!(CopQuality::NoData.to_string(), "no_data");
        assert_eq!(
            serde_json::to_string(&CopQuality::InsufficientData).unwrap(),
            "\"insufficient_data\""
        );
    }

    #[test]
    fn test_snapshot_tolerates_missing_fields() {
        let snapshot: ThermalEnergySnapshot =
            serde_json::from_str(r#"{"total_heating_energy": 1234.5}"#).unwrap();

        assert_eq!(snapshot.total_heating_energy, 1234.5);
        assert_eq!(snapshot.daily_heating_energy, 0.0);
        assert_eq!(snapshot.last_reset_date, None);
    }
}
