// Configuration - calculation constants, thresholds and replay settings
use crate::error::{MetricsError, Result};
use chrono::TimeDelta;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const MAX_RETENTION_MINUTES: i64 = 525_600;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub replay: ReplaySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySettings {
    pub input: PathBuf,
    /// Thermal energy snapshot restored before replay and rewritten afterwards
    pub snapshot: Option<PathBuf>,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/replay.jsonl"),
            snapshot: None,
        }
    }
}

/// Every constant and threshold used by the calculation services.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    pub water: WaterConfig,
    pub electrical: ElectricalConfig,
    pub cop: CopConfig,
    pub defrost: DefrostConfig,
    pub compressor: CompressorConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WaterConfig {
    /// kJ/(kg·K)
    pub specific_heat: f64,
    /// m³/h to kg/s
    pub flow_to_kg_per_s: f64,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            specific_heat: 4.185,
            flow_to_kg_per_s: 0.277778,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ElectricalConfig {
    pub three_phase: bool,
    /// Fixed supply voltage; falls back to the phase default when unset
    pub voltage: Option<f64>,
    pub power_factor: f64,
    pub three_phase_factor: f64,
    pub single_phase_voltage: f64,
    pub three_phase_voltage: f64,
    /// Measured power above this is read as Watts
    pub watts_threshold: f64,
}

impl Default for ElectricalConfig {
    fn default() -> Self {
        Self {
            three_phase: false,
            voltage: None,
            power_factor: 0.9,
            three_phase_factor: 1.732,
            single_phase_voltage: 230.0,
            three_phase_voltage: 400.0,
            watts_threshold: 50.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CopConfig {
    pub retention_minutes: i64,
    pub min_interval_seconds: u64,
    pub max_measurements: usize,
    pub min_thermal_energy: f64,
    pub max_thermal_energy: f64,
    pub min_electrical_energy: f64,
    pub max_electrical_energy: f64,
    pub min_cop: f64,
    pub max_cop: f64,
    pub insufficient_count: usize,
    pub insufficient_span_minutes: f64,
    pub preliminary_count: usize,
    pub preliminary_span_minutes: f64,
}

impl Default for CopConfig {
    fn default() -> Self {
        Self {
            retention_minutes: 30,
            min_interval_seconds: 60,
            max_measurements: 500,
            min_thermal_energy: 0.01,
            max_thermal_energy: 100.0,
            min_electrical_energy: 0.01,
            max_electrical_energy: 50.0,
            min_cop: 0.5,
            max_cop: 8.0,
            insufficient_count: 5,
            insufficient_span_minutes: 5.0,
            preliminary_count: 15,
            preliminary_span_minutes: 15.0,
        }
    }
}

impl CopConfig {
    pub fn retention(&self) -> TimeDelta {
        TimeDelta::try_minutes(self.retention_minutes).unwrap_or(TimeDelta::MAX)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(self.min_interval_seconds)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DefrostConfig {
    pub recovery_timeout_seconds: u64,
    pub stable_readings_required: u32,
    /// °C
    pub delta_t_threshold: f64,
}

impl Default for DefrostConfig {
    fn default() -> Self {
        Self {
            recovery_timeout_seconds: 300,
            stable_readings_required: 3,
            delta_t_threshold: 0.5,
        }
    }
}

impl DefrostConfig {
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_secs(self.recovery_timeout_seconds)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CompressorConfig {
    pub max_history: usize,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self { max_history: 100 }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.water.specific_heat <= 0.0 || self.water.flow_to_kg_per_s <= 0.0 {
            return Err(MetricsError::invalid("water", "constants must be positive"));
        }

        let e = &self.electrical;
        if e.power_factor <= 0.0 || e.power_factor > 1.0 {
            return Err(MetricsError::invalid(
                "electrical.power_factor",
                format!("{} is outside (0, 1]", e.power_factor),
            ));
        }
        if e.voltage.is_some_and(|v| v <= 0.0) {
            return Err(MetricsError::invalid("electrical.voltage", "must be positive"));
        }

        let c = &self.cop;
        if c.retention_minutes <= 0 {
            return Err(MetricsError::invalid("cop.retention_minutes", "must be positive"));
        }
        if c.retention_minutes > MAX_RETENTION_MINUTES {
            return Err(MetricsError::invalid(
                "cop.retention_minutes",
                format!("{} exceeds {} (one year)", c.retention_minutes, MAX_RETENTION_MINUTES),
            ));
        }
        if c.max_measurements < 2 {
            return Err(MetricsError::invalid(
                "cop.max_measurements",
                "at least two measurements are needed for a COP",
            ));
        }
        for (field, min, max) in [
            ("cop.thermal_energy", c.min_thermal_energy, c.max_thermal_energy),
            ("cop.electrical_energy", c.min_electrical_energy, c.max_electrical_energy),
            ("cop.cop", c.min_cop, c.max_cop),
        ] {
            if min >= max {
                return Err(MetricsError::invalid(
                    field,
                    format!("lower bound {} is not below upper bound {}", min, max),
                ));
            }
        }
        if c.insufficient_count > c.preliminary_count
            || c.insufficient_span_minutes > c.preliminary_span_minutes
        {
            return Err(MetricsError::invalid(
                "cop.quality",
                "insufficient thresholds exceed preliminary thresholds",
            ));
        }

        if self.defrost.stable_readings_required == 0 {
            return Err(MetricsError::invalid(
                "defrost.stable_readings_required",
                "must be at least 1",
            ));
        }
        if self.compressor.max_history == 0 {
            return Err(MetricsError::invalid("compressor.max_history", "must be at least 1"));
        }

        Ok(())
    }
}

pub fn load_app_config() -> Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/metrics").required(false))
        .add_source(
            config::Environment::with_prefix("HEATPUMP")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    let app: AppConfig = settings.try_deserialize()?;
    app.metrics.validate()?;
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Config, File, FileFormat};

    fn parse(toml: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = MetricsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cop.retention(), TimeDelta::minutes(30));
        assert_eq!(config.defrost.recovery_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let app = parse(
            r#"
            [metrics.electrical]
            three_phase = true

            [metrics.cop]
            min_interval_seconds = 30

            [replay]
            input = "samples.jsonl"
            "#,
        );

        assert!(app.metrics.electrical.three_phase);
        assert_eq!(app.metrics.electrical.three_phase_voltage, 400.0);
        assert_eq!(app.metrics.cop.min_interval_seconds, 30);
        assert_eq!(app.metrics.cop.max_cop, 8.0);
        assert_eq!(app.replay.input, PathBuf::from("samples.jsonl"));
        assert!(app.replay.snapshot.is_none());
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let mut config = MetricsConfig::default();
        config.cop.min_cop = 9.0;

        match config.validate() {
            Err(MetricsError::InvalidSetting { field, .. }) => assert_eq!(field, "cop.cop"),
            other => panic!("expected invalid setting, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_oversized_retention() {
        let mut config = MetricsConfig::default();
        config.cop.retention_minutes = i64::MAX;

        match config.validate() {
            Err(MetricsError::InvalidSetting { field, .. }) => {
                assert_eq!(field, "cop.retention_minutes")
            }
            other => panic!("expected invalid setting, got {:?}", other),
        }
        assert_eq!(config.cop.retention(), TimeDelta::MAX);
    }

    #[test]
    fn test_validate_rejects_zero_history() {
        let mut config = MetricsConfig::default();
        config.compressor.max_history = 0;
        assert!(config.validate().is_err());
    }
}
