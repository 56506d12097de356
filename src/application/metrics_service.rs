// Metrics service - fans each poll cycle out to the calculation services
use crate::application::clock::Clock;
use crate::application::compressor_timing_service::CompressorTimingService;
use crate::application::cop_service::CopService;
use crate::application::defrost_guard::DefrostGuard;
use crate::application::rehydration::ChannelHistory;
use crate::application::thermal_energy_service::ThermalEnergyAccumulator;
use crate::domain::compressor::CompressorTimes;
use crate::domain::defrost::DefrostState;
use crate::domain::energy::{CopQualityReport, ThermalEnergySnapshot};
use crate::domain::operation_mode::OperationMode;
use crate::domain::power::{round2, thermal_power_cooling, thermal_power_heating};
use crate::domain::reading::PollReading;
use crate::infrastructure::config::MetricsConfig;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CopSummary {
    pub value: Option<f64>,
    pub quality: CopQualityReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub cop: CopSummary,
    pub cop_by_mode: BTreeMap<OperationMode, CopSummary>,
    pub heating_power: f64,
    pub cooling_power: f64,
    pub daily_heating_energy: f64,
    pub total_heating_energy: f64,
    pub daily_cooling_energy: f64,
    pub total_cooling_energy: f64,
    pub daily_start_time: DateTime<Local>,
    pub compressor: CompressorTimes,
    pub defrost_state: DefrostState,
    pub data_reliable: bool,
}

pub struct HeatPumpMetrics {
    config: MetricsConfig,
    defrost_guard: DefrostGuard,
    thermal_energy: ThermalEnergyAccumulator,
    cop: CopService,
    cop_by_mode: BTreeMap<OperationMode, CopService>,
    compressor: CompressorTimingService,
}

impl HeatPumpMetrics {
    pub fn new(config: &MetricsConfig, clock: Arc<dyn Clock>) -> Self {
        let thermal_energy = ThermalEnergyAccumulator::new(clock.clone());
        Self::with_thermal_energy(config, clock, thermal_energy)
    }

    pub fn with_snapshot(
        config: &MetricsConfig,
        clock: Arc<dyn Clock>,
        snapshot: &ThermalEnergySnapshot,
    ) -> Self {
        let thermal_energy = ThermalEnergyAccumulator::from_snapshot(snapshot, clock.clone());
        Self::with_thermal_energy(config, clock, thermal_energy)
    }

    fn with_thermal_energy(
        config: &MetricsConfig,
        clock: Arc<dyn Clock>,
        thermal_energy: ThermalEnergyAccumulator,
    ) -> Self {
        let cop_by_mode = OperationMode::ALL
            .into_iter()
            .map(|mode| (mode, CopService::new(config, clock.clone(), Some(mode))))
            .collect();

        Self {
            config: config.clone(),
            defrost_guard: DefrostGuard::new(&config.defrost, clock.clone()),
            thermal_energy,
            cop: CopService::new(config, clock.clone(), None),
            cop_by_mode,
            compressor: CompressorTimingService::new(&config.compressor, clock),
        }
    }

    pub fn process(&mut self, reading: &PollReading) {
        self.defrost_guard
            .update(reading.defrosting(), reading.delta_t());

        self.compressor.update(reading.compressor_frequency);

        self.cop.update(reading);
        for service in self.cop_by_mode.values_mut() {
            service.update(reading);
        }

        let Some((heating, cooling)) = self.thermal_power(reading) else {
            tracing::debug!("Skipping thermal energy update: water inputs incomplete");
            return;
        };
        self.thermal_energy.update(
            heating,
            cooling,
            reading.compressor_running(),
            reading.operation_mode,
        );
    }

    /// Heating and cooling power for the energy counters. Zero while defrost
    /// makes ΔT meaningless, `None` when a water input is missing.
    fn thermal_power(&self, reading: &PollReading) -> Option<(f64, f64)> {
        if !self.defrost_guard.is_data_reliable() {
            return Some((0.0, 0.0));
        }

        let (Some(inlet), Some(outlet), Some(flow)) = (
            reading.water_inlet_temp,
            reading.water_outlet_temp,
            reading.water_flow,
        ) else {
            return None;
        };

        let water = &self.config.water;
        Some((
            thermal_power_heating(inlet, outlet, flow, water),
            thermal_power_cooling(inlet, outlet, flow, water),
        ))
    }

    pub fn rehydrate(&mut self, history: &ChannelHistory) {
        if history.is_empty() {
            return;
        }
        self.cop.rehydrate(history);
        for service in self.cop_by_mode.values_mut() {
            service.rehydrate(history);
        }
        self.compressor.rehydrate(&history.compressor_frequency);
    }

    pub fn summary(&self) -> MetricsSummary {
        let cop_summary = |service: &CopService| CopSummary {
            value: service.get_value(),
            quality: service.get_quality(),
        };

        MetricsSummary {
            cop: cop_summary(&self.cop),
            cop_by_mode: self
                .cop_by_mode
                .iter()
                .map(|(mode, service)| (*mode, cop_summary(service)))
                .collect(),
            heating_power: round2(self.thermal_energy.heating_power()),
            cooling_power: round2(self.thermal_energy.cooling_power()),
            daily_heating_energy: round2(self.thermal_energy.daily_heating_energy()),
            total_heating_energy: round2(self.thermal_energy.total_heating_energy()),
            daily_cooling_energy: round2(self.thermal_energy.daily_cooling_energy()),
            total_cooling_energy: round2(self.thermal_energy.total_cooling_energy()),
            daily_start_time: self.thermal_energy.daily_start_time(),
            compressor: self.compressor.get_average_times(),
            defrost_state: self.defrost_guard.state(),
            data_reliable: self.defrost_guard.is_data_reliable(),
        }
    }

    pub fn snapshot(&self) -> ThermalEnergySnapshot {
        self.thermal_energy.to_snapshot()
    }

    pub fn cop(&self, mode: Option<OperationMode>) -> Option<&CopService> {
        match mode {
            None => Some(&self.cop),
            Some(mode) => self.cop_by_mode.get(&mode),
        }
    }

    pub fn thermal_energy(&self) -> &ThermalEnergyAccumulator {
        &self.thermal_energy
    }

    pub fn compressor(&self) -> &CompressorTimingService {
        &self.compressor
    }
}
