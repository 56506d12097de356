// Defrost domain model
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefrostState {
    #[default]
    Normal,
    Defrost,
    Recovery,
}

impl fmt::Display for DefrostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DefrostState::Normal => "normal",
            DefrostState::Defrost => "defrost",
            DefrostState::Recovery => "recovery",
        };
        f.write_str(label)
    }
}
