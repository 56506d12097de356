// Poll reading domain model - scalar inputs supplied by the host each cycle
use super::operation_mode::{OperationMode, deserialize_reported_mode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollReading {
    pub water_inlet_temp: Option<f64>,
    pub water_outlet_temp: Option<f64>,
    /// m³/h
    pub water_flow: Option<f64>,
    pub compressor_current: Option<f64>,
    pub compressor_frequency: Option<f64>,
    /// Directly measured compressor power, W or kW
    pub compressor_power: Option<f64>,
    pub voltage: Option<f64>,
    pub secondary_compressor_current: Option<f64>,
    pub secondary_compressor_frequency: Option<f64>,
    pub is_defrosting: Option<bool>,
    #[serde(deserialize_with = "deserialize_reported_mode")]
    pub operation_mode: Option<OperationMode>,
}

impl PollReading {
    /// Outlet minus inlet, when both temperatures are known.
    pub fn delta_t(&self) -> Option<f64> {
        match (self.water_inlet_temp, self.water_outlet_temp) {
            (Some(inlet), Some(outlet)) => Some(outlet - inlet),
            _ => None,
        }
    }

    pub fn compressor_running(&self) -> bool {
        is_running(self.compressor_frequency)
    }

    pub fn secondary_compressor_running(&self) -> bool {
        is_running(self.secondary_compressor_frequency)
    }

    pub fn defrosting(&self) -> bool {
        self.is_defrosting.unwrap_or(false)
    }
}

pub fn is_running(frequency: Option<f64>) -> bool {
    frequency.is_some_and(|f| f > 0.0)
}
