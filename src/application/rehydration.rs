// Rehydration - rebuild per-poll readings from historical per-channel series
use crate::domain::operation_mode::OperationMode;
use crate::domain::reading::{PollReading, is_running};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type Series<T> = Vec<(DateTime<Local>, T)>;

/// Historical values per input channel, each in any order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelHistory {
    pub water_inlet_temp: Series<f64>,
    pub water_outlet_temp: Series<f64>,
    pub water_flow: Series<f64>,
    pub compressor_current: Series<f64>,
    pub compressor_frequency: Series<f64>,
    pub compressor_power: Series<f64>,
    pub secondary_compressor_current: Series<f64>,
    pub secondary_compressor_frequency: Series<f64>,
    pub is_defrosting: Series<bool>,
    pub operation_mode: Series<OperationMode>,
}

impl ChannelHistory {
    pub fn is_empty(&self) -> bool {
        self.timestamps().is_empty()
    }

    fn timestamps(&self) -> BTreeSet<DateTime<Local>> {
        let mut timestamps = BTreeSet::new();
        for series in [
            &self.water_inlet_temp,
            &self.water_outlet_temp,
            &self.water_flow,
            &self.compressor_current,
            &self.compressor_frequency,
            &self.compressor_power,
            &self.secondary_compressor_current,
            &self.secondary_compressor_frequency,
        ] {
            timestamps.extend(series.iter().map(|(ts, _)| *ts));
        }
        timestamps.extend(self.is_defrosting.iter().map(|(ts, _)| *ts));
        timestamps.extend(self.operation_mode.iter().map(|(ts, _)| *ts));
        timestamps
    }

    /// One reading per distinct timestamp across all channels, each channel
    /// holding its last known value at or before that instant.
    pub fn merged_readings(&self) -> Vec<(DateTime<Local>, PollReading)> {
        let inlet = sorted(&self.water_inlet_temp);
        let outlet = sorted(&self.water_outlet_temp);
        let flow = sorted(&self.water_flow);
        let current = sorted(&self.compressor_current);
        let frequency = sorted(&self.compressor_frequency);
        let power = sorted(&self.compressor_power);
        let secondary_current = sorted(&self.secondary_compressor_current);
        let secondary_frequency = sorted(&self.secondary_compressor_frequency);
        let defrosting = sorted(&self.is_defrosting);
        let mode = sorted(&self.operation_mode);

        self.timestamps()
            .into_iter()
            .map(|ts| {
                let reading = PollReading {
                    water_inlet_temp: value_at(&inlet, ts),
                    water_outlet_temp: value_at(&outlet, ts),
                    water_flow: value_at(&flow, ts),
                    compressor_current: value_at(&current, ts),
                    compressor_frequency: value_at(&frequency, ts),
                    compressor_power: value_at(&power, ts),
                    voltage: None,
                    secondary_compressor_current: value_at(&secondary_current, ts),
                    secondary_compressor_frequency: value_at(&secondary_frequency, ts),
                    is_defrosting: value_at(&defrosting, ts),
                    operation_mode: value_at(&mode, ts),
                };
                (ts, reading)
            })
            .collect()
    }
}

fn sorted<T: Copy>(series: &[(DateTime<Local>, T)]) -> Vec<(DateTime<Local>, T)> {
    let mut sorted = series.to_vec();
    sorted.sort_by_key(|(ts, _)| *ts);
    sorted
}

/// Last value at or before `at` in a sorted series.
fn value_at<T: Copy>(series: &[(DateTime<Local>, T)], at: DateTime<Local>) -> Option<T> {
    let idx = series.partition_point(|(ts, _)| *ts <= at);
    idx.checked_sub(1).map(|i| series[i].1)
}

/// Running states derived from compressor frequency history, oldest first.
pub fn compressor_states(frequency: &[(DateTime<Local>, f64)]) -> Vec<(DateTime<Local>, bool)> {
    sorted(frequency)
        .into_iter()
        .map(|(ts, f)| (ts, is_running(Some(f))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn at(minute: i64) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap() + TimeDelta::minutes(minute)
    }

    #[test]
    fn test_merged_readings_hold_last_value() {
        let history = ChannelHistory {
            water_inlet_temp: vec![(at(2), 31.0), (at(0), 30.0)],
            water_outlet_temp: vec![(at(1), 35.0)],
            compressor_frequency: vec![(at(0), 40.0)],
            ..Default::default()
        };

        let merged = history.merged_readings();
        assert_eq!(merged.len(), 3);

        let (ts, first) = &merged[0];
        assert_eq!(*ts, at(0));
        assert_eq!(first.water_inlet_temp, Some(30.0));
        assert_eq!(first.water_outlet_temp, None);

        let (_, second) = &merged[1];
        assert_eq!(second.water_inlet_temp, Some(30.0));
        assert_eq!(second.water_outlet_temp, Some(35.0));
        assert_eq!(second.compressor_frequency, Some(40.0));

        let (_, third) = &merged[2];
        assert_eq!(third.water_inlet_temp, Some(31.0));
    }

    #[test]
    fn test_compressor_states_are_sorted() {
        let states = compressor_states(&[(at(5), 0.0), (at(0), 42.0), (at(10), 38.0)]);
        assert_eq!(states, vec![(at(0), true), (at(5), false), (at(10), true)]);
    }

    #[test]
    fn test_empty_history() {
        let history = ChannelHistory::default();
        assert!(history.is_empty());
        assert!(history.merged_readings().is_empty());
    }
}
