// Power domain models - thermal and electrical power from raw readings
use crate::infrastructure::config::{ElectricalConfig, WaterConfig};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One accepted (thermal, electrical) sample in the COP window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerMeasurement {
    pub timestamp: DateTime<Local>,
    /// kW
    pub thermal_power: f64,
    /// kW
    pub electrical_power: f64,
}

impl PowerMeasurement {
    pub fn new(timestamp: DateTime<Local>, thermal_power: f64, electrical_power: f64) -> Self {
        Self {
            timestamp,
            thermal_power,
            electrical_power,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElectricalReading {
    /// A
    pub current: f64,
    pub measured_power: Option<f64>,
    pub voltage: Option<f64>,
    pub three_phase: bool,
}

pub type ThermalPowerFn = fn(f64, f64, f64, &WaterConfig) -> f64;
pub type ElectricalPowerFn = fn(&ElectricalReading, &ElectricalConfig) -> f64;

/// Signed thermal power in kW; positive when the outlet is warmer than the inlet.
pub fn thermal_power(inlet: f64, outlet: f64, flow_m3h: f64, water: &WaterConfig) -> f64 {
    let flow_kg_s = flow_m3h * water.flow_to_kg_per_s;
    let delta_t = outlet - inlet;
    flow_kg_s * water.specific_heat * delta_t
}

pub fn thermal_power_heating(inlet: f64, outlet: f64, flow_m3h: f64, water: &WaterConfig) -> f64 {
    thermal_power(inlet, outlet, flow_m3h, water).max(0.0)
}

pub fn thermal_power_cooling(inlet: f64, outlet: f64, flow_m3h: f64, water: &WaterConfig) -> f64 {
    (-thermal_power(inlet, outlet, flow_m3h, water)).max(0.0)
}

/// Electrical power in kW.
///
/// A directly measured power always wins; values above the watts threshold are
/// taken as Watts. Otherwise power is estimated from voltage and current.
pub fn electrical_power(reading: &ElectricalReading, config: &ElectricalConfig) -> f64 {
    if let Some(measured) = reading.measured_power {
        return if measured > config.watts_threshold {
            measured / 1000.0
        } else {
            measured
        };
    }

    if reading.three_phase {
        let voltage = reading.voltage.unwrap_or(config.three_phase_voltage);
        voltage * reading.current * config.power_factor * config.three_phase_factor / 1000.0
    } else {
        let voltage = reading.voltage.unwrap_or(config.single_phase_voltage);
        voltage * reading.current * config.power_factor / 1000.0
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_thermal_power_sign_follows_delta_t() {
        let water = WaterConfig::default();

        // 1 m³/h with 5 K rise
        let heating = thermal_power(30.0, 35.0, 1.0, &water);
        assert!(close(heating, 0.277778 * 4.185 * 5.0));

        let cooling = thermal_power(12.0, 7.0, 1.0, &water);
        assert!(cooling < 0.0);
        assert!(close(cooling, -heating));
    }

    #[test]
    fn test_heating_and_cooling_variants_clamp() {
        let water = WaterConfig::default();

        assert!(thermal_power_heating(30.0, 35.0, 2.0, &water) > 0.0);
        assert_eq!(thermal_power_cooling(30.0, 35.0, 2.0, &water), 0.0);

        assert_eq!(thermal_power_heating(12.0, 7.0, 2.0, &water), 0.0);
        assert!(close(
            thermal_power_cooling(12.0, 7.0, 2.0, &water),
            2.0 * 0.277778 * 4.185 * 5.0
        ));
    }

    #[test]
    fn test_measured_power_in_watts_is_converted() {
        let config = ElectricalConfig::default();
        let reading = ElectricalReading {
            current: 10.0,
            measured_power: Some(1500.0),
            ..Default::default()
        };
        assert!(close(electrical_power(&reading, &config), 1.5));

        let reading = ElectricalReading {
            measured_power: Some(1.8),
            ..reading
        };
        assert!(close(electrical_power(&reading, &config), 1.8));
    }

    #[test]
    fn test_single_phase_estimate_uses_default_voltage() {
        let config = ElectricalConfig::default();
        let reading = ElectricalReading {
            current: 10.0,
            ..Default::default()
        };
        assert!(close(electrical_power(&reading, &config), 230.0 * 10.0 * 0.9 / 1000.0));

        let reading = ElectricalReading {
            voltage: Some(240.0),
            ..reading
        };
        assert!(close(electrical_power(&reading, &config), 240.0 * 10.0 * 0.9 / 1000.0));
    }

    #[test]
    fn test_three_phase_estimate() {
        let config = ElectricalConfig::default();
        let reading = ElectricalReading {
            current: 5.0,
            three_phase: true,
            ..Default::default()
        };
        assert!(close(
            electrical_power(&reading, &config),
            400.0 * 5.0 * 0.9 * 1.732 / 1000.0
        ));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(2.005_1), 2.01);
        assert_eq!(round2(0.0), 0.0);
    }
}
