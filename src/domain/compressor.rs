// Compressor domain model
use serde::{Deserialize, Serialize};

/// Average durations in minutes; `None` until a value has been observed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CompressorTimes {
    pub cycle: Option<f64>,
    pub run: Option<f64>,
    pub rest: Option<f64>,
}
