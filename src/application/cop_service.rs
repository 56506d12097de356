// COP service - rolling-window coefficient of performance from paired power samples
use crate::application::bounded_sequence::BoundedSequence;
use crate::application::clock::Clock;
use crate::application::defrost_guard::DefrostGuard;
use crate::application::rehydration::ChannelHistory;
use crate::domain::energy::{CopQuality, CopQualityReport};
use crate::domain::operation_mode::OperationMode;
use crate::domain::power::{
    ElectricalPowerFn, ElectricalReading, PowerMeasurement, ThermalPowerFn, electrical_power,
    round2, thermal_power,
};
use crate::domain::reading::PollReading;
use crate::infrastructure::config::{CopConfig, ElectricalConfig, MetricsConfig, WaterConfig};
use crate::infrastructure::memory_sequence::InMemorySequence;
use chrono::{DateTime, Local, TimeDelta};
use std::sync::Arc;
use std::time::Duration;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;
const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Time-bounded window of power measurements.
pub struct EnergyAccumulator {
    window: Box<dyn BoundedSequence<PowerMeasurement>>,
    retention: TimeDelta,
    config: CopConfig,
}

impl EnergyAccumulator {
    pub fn new(window: Box<dyn BoundedSequence<PowerMeasurement>>, config: &CopConfig) -> Self {
        Self {
            window,
            retention: config.retention(),
            config: config.clone(),
        }
    }

    pub fn in_memory(config: &CopConfig) -> Self {
        Self::new(
            Box::new(InMemorySequence::with_max_length(config.max_measurements)),
            config,
        )
    }

    pub fn add_measurement(
        &mut self,
        thermal_power: f64,
        electrical_power: f64,
        timestamp: DateTime<Local>,
    ) {
        self.window.append(PowerMeasurement::new(
            timestamp,
            thermal_power,
            electrical_power,
        ));
        self.evict_expired();
    }

    /// Load historical measurements in any order. Existing entries are kept.
    pub fn bulk_load(&mut self, measurements: impl IntoIterator<Item = PowerMeasurement>) {
        let mut sorted: Vec<PowerMeasurement> = measurements.into_iter().collect();
        if sorted.is_empty() {
            return;
        }
        sorted.sort_by_key(|m| m.timestamp);

        for measurement in sorted {
            self.window.append(measurement);
        }
        self.evict_expired();
    }

    fn evict_expired(&mut self) {
        let Some(latest) = self.window.back().map(|m| m.timestamp) else {
            return;
        };
        let Some(cutoff) = latest.checked_sub_signed(self.retention) else {
            return;
        };

        while self.window.front().is_some_and(|m| m.timestamp < cutoff) {
            self.window.pop_front();
        }
    }

    pub fn measurements(&self) -> Vec<PowerMeasurement> {
        self.window.to_vec()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Integrated thermal energy over integrated electrical energy, or `None`
    /// when the window is too small or the result is implausible.
    pub fn get_cop(&self) -> Option<f64> {
        let mut measurements = self.window.to_vec();
        if measurements.len() < 2 {
            return None;
        }
        measurements.sort_by_key(|m| m.timestamp);

        let mut thermal_energy = 0.0;
        let mut electrical_energy = 0.0;
        for pair in measurements.windows(2) {
            let hours =
                (pair[1].timestamp - pair[0].timestamp).num_milliseconds() as f64 / MILLIS_PER_HOUR;
            thermal_energy += (pair[0].thermal_power + pair[1].thermal_power) / 2.0 * hours;
            electrical_energy += (pair[0].electrical_power + pair[1].electrical_power) / 2.0 * hours;
        }

        let c = &self.config;
        if electrical_energy <= 0.0 {
            return None;
        }
        if !(c.min_thermal_energy..=c.max_thermal_energy).contains(&thermal_energy)
            || !(c.min_electrical_energy..=c.max_electrical_energy).contains(&electrical_energy)
        {
            tracing::debug!(
                "Rejecting COP window: thermal {:.3} kWh, electrical {:.3} kWh",
                thermal_energy,
                electrical_energy
            );
            return None;
        }

        let cop = thermal_energy / electrical_energy;
        if !(c.min_cop..=c.max_cop).contains(&cop) {
            tracing::debug!("Rejecting implausible COP {:.2}", cop);
            return None;
        }

        Some(cop)
    }

    pub fn get_quality(&self) -> CopQualityReport {
        let measurements = self.window.to_vec();
        let count = measurements.len();
        let span_minutes = match (
            measurements.iter().map(|m| m.timestamp).min(),
            measurements.iter().map(|m| m.timestamp).max(),
        ) {
            (Some(first), Some(last)) => (last - first).num_milliseconds() as f64 / MILLIS_PER_MINUTE,
            _ => 0.0,
        };

        let c = &self.config;
        let quality = if count == 0 {
            CopQuality::NoData
        } else if count < c.insufficient_count || span_minutes < c.insufficient_span_minutes {
            CopQuality::InsufficientData
        } else if count < c.preliminary_count || span_minutes < c.preliminary_span_minutes {
            CopQuality::Preliminary
        } else {
            CopQuality::Optimal
        };

        CopQualityReport {
            quality,
            measurement_count: count,
            time_span_minutes: span_minutes,
        }
    }
}

/// One COP sensor. With an expected mode it only learns from cycles in that
/// mode, and fails closed when the mode is unknown.
pub struct CopService {
    accumulator: EnergyAccumulator,
    clock: Arc<dyn Clock>,
    defrost_guard: DefrostGuard,
    expected_mode: Option<OperationMode>,
    min_interval: Duration,
    /// Monotonic instant before which no new sample is stored
    next_sample_at: Option<Duration>,
    water: WaterConfig,
    electrical: ElectricalConfig,
    thermal_calculator: ThermalPowerFn,
    electrical_calculator: ElectricalPowerFn,
}

impl CopService {
    pub fn new(
        config: &MetricsConfig,
        clock: Arc<dyn Clock>,
        expected_mode: Option<OperationMode>,
    ) -> Self {
        Self::with_accumulator(
            EnergyAccumulator::in_memory(&config.cop),
            config,
            clock,
            expected_mode,
        )
    }

    pub fn with_accumulator(
        accumulator: EnergyAccumulator,
        config: &MetricsConfig,
        clock: Arc<dyn Clock>,
        expected_mode: Option<OperationMode>,
    ) -> Self {
        Self {
            accumulator,
            defrost_guard: DefrostGuard::new(&config.defrost, clock.clone()),
            clock,
            expected_mode,
            min_interval: config.cop.min_interval(),
            next_sample_at: None,
            water: config.water.clone(),
            electrical: config.electrical.clone(),
            thermal_calculator: thermal_power,
            electrical_calculator: electrical_power,
        }
    }

    pub fn with_calculators(
        mut self,
        thermal: ThermalPowerFn,
        electrical: ElectricalPowerFn,
    ) -> Self {
        self.thermal_calculator = thermal;
        self.electrical_calculator = electrical;
        self
    }

    pub fn update(&mut self, reading: &PollReading) {
        self.defrost_guard
            .update(reading.defrosting(), reading.delta_t());
        if !self.defrost_guard.is_data_reliable() {
            tracing::debug!("Skipping COP sample: defrost guard is {}", self.defrost_guard.state());
            return;
        }

        if !self.mode_matches(reading.operation_mode) {
            return;
        }

        if !reading.compressor_running() {
            return;
        }

        let now = self.clock.monotonic();
        if self.next_sample_at.is_some_and(|next| now < next) {
            return;
        }

        let Some((thermal, electrical)) = self.sample_power(reading) else {
            return;
        };

        self.accumulator
            .add_measurement(thermal, electrical, self.clock.now());
        self.next_sample_at = Some(now.saturating_add(self.min_interval));
    }

    fn mode_matches(&self, mode: Option<OperationMode>) -> bool {
        match (self.expected_mode, mode) {
            (None, _) => true,
            (Some(expected), Some(actual)) => expected == actual,
            (Some(_), None) => false,
        }
    }

    /// Thermal and electrical power for one reading, when both are positive.
    fn sample_power(&self, reading: &PollReading) -> Option<(f64, f64)> {
        let (Some(inlet), Some(outlet), Some(flow), Some(current)) = (
            reading.water_inlet_temp,
            reading.water_outlet_temp,
            reading.water_flow,
            reading.compressor_current,
        ) else {
            return None;
        };

        let mut thermal = (self.thermal_calculator)(inlet, outlet, flow, &self.water);
        // Cooling COP is computed from the magnitude of the extracted heat
        if self.expected_mode == Some(OperationMode::Cooling) {
            thermal = -thermal;
        }

        let voltage = reading.voltage.or(self.electrical.voltage);
        let three_phase = self.electrical.three_phase;
        let mut electrical = (self.electrical_calculator)(
            &ElectricalReading {
                current,
                measured_power: reading.compressor_power,
                voltage,
                three_phase,
            },
            &self.electrical,
        );

        if reading.secondary_compressor_running() {
            if let Some(secondary_current) = reading.secondary_compressor_current {
                electrical += (self.electrical_calculator)(
                    &ElectricalReading {
                        current: secondary_current,
                        measured_power: None,
                        voltage,
                        three_phase,
                    },
                    &self.electrical,
                );
            }
        }

        if thermal > 0.0 && electrical > 0.0 {
            Some((thermal, electrical))
        } else {
            None
        }
    }

    /// Rebuild the window from historical channels, applying the same gates as
    /// live updates with the historical timestamps as the clock.
    pub fn rehydrate(&mut self, history: &ChannelHistory) -> usize {
        let mut measurements = Vec::new();
        let mut last_accepted: Option<DateTime<Local>> = None;
        let min_interval = TimeDelta::from_std(self.min_interval).unwrap_or(TimeDelta::zero());

        for (timestamp, reading) in history.merged_readings() {
            if reading.defrosting()
                || !self.mode_matches(reading.operation_mode)
                || !reading.compressor_running()
            {
                continue;
            }
            if last_accepted.is_some_and(|last| timestamp - last < min_interval) {
                continue;
            }
            if let Some((thermal, electrical)) = self.sample_power(&reading) {
                measurements.push(PowerMeasurement::new(timestamp, thermal, electrical));
                last_accepted = Some(timestamp);
            }
        }

        if let Some(last) = last_accepted {
            self.hold_after_historical_sample(last);
        }

        let count = measurements.len();
        tracing::info!(
            "Rehydrating COP window ({}) with {} historical measurements",
            self.expected_mode.map_or("all modes", |m| m.as_str()),
            count
        );
        self.preload_measurements(measurements);
        count
    }

    /// Keep the first live sample at least one interval after the newest
    /// historical one.
    fn hold_after_historical_sample(&mut self, last: DateTime<Local>) {
        let elapsed = (self.clock.now() - last).to_std().unwrap_or(Duration::ZERO);
        let remaining = self.min_interval.saturating_sub(elapsed);
        if remaining.is_zero() {
            return;
        }
        let next = self.clock.monotonic().saturating_add(remaining);
        self.next_sample_at = Some(self.next_sample_at.map_or(next, |current| current.max(next)));
    }

    pub fn preload_measurements(&mut self, measurements: impl IntoIterator<Item = PowerMeasurement>) {
        self.accumulator.bulk_load(measurements);
    }

    pub fn get_value(&self) -> Option<f64> {
        self.accumulator.get_cop().map(round2)
    }

    pub fn get_quality(&self) -> CopQualityReport {
        self.accumulator.get_quality()
    }

    pub fn expected_mode(&self) -> Option<OperationMode> {
        self.expected_mode
    }

    pub fn accumulator(&self) -> &EnergyAccumulator {
        &self.accumulator
    }

    pub fn defrost_guard(&self) -> &DefrostGuard {
        &self.defrost_guard
    }
}
