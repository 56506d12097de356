// Thermal energy accumulator - integrates heating/cooling power into daily and total energy
use crate::application::clock::Clock;
use crate::domain::energy::{EnergyKind, ThermalEnergySnapshot};
use crate::domain::operation_mode::OperationMode;
use chrono::{DateTime, Local, NaiveDate};
use std::sync::Arc;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

pub struct ThermalEnergyAccumulator {
    clock: Arc<dyn Clock>,
    daily_heating_energy: f64,
    total_heating_energy: f64,
    daily_cooling_energy: f64,
    total_cooling_energy: f64,
    last_heating_power: f64,
    last_cooling_power: f64,
    last_measurement_time: Option<DateTime<Local>>,
    daily_start_time: DateTime<Local>,
    last_reset_date: NaiveDate,
    post_cycle_lock: bool,
    last_mode: Option<EnergyKind>,
}

impl ThermalEnergyAccumulator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            clock,
            daily_heating_energy: 0.0,
            total_heating_energy: 0.0,
            daily_cooling_energy: 0.0,
            total_cooling_energy: 0.0,
            last_heating_power: 0.0,
            last_cooling_power: 0.0,
            last_measurement_time: None,
            daily_start_time: now,
            last_reset_date: now.date_naive(),
            post_cycle_lock: false,
            last_mode: None,
        }
    }

    /// Restore persisted totals. Must be called before the first update.
    ///
    /// Daily counters carry the date they belong to; if that date is not today
    /// the first update rolls them over.
    pub fn from_snapshot(snapshot: &ThermalEnergySnapshot, clock: Arc<dyn Clock>) -> Self {
        let mut accumulator = Self::new(clock);
        accumulator.daily_heating_energy = snapshot.daily_heating_energy;
        accumulator.total_heating_energy = snapshot.total_heating_energy;
        accumulator.daily_cooling_energy = snapshot.daily_cooling_energy;
        accumulator.total_cooling_energy = snapshot.total_cooling_energy;
        if let Some(date) = snapshot.last_reset_date {
            accumulator.last_reset_date = date;
        }
        accumulator
    }

    pub fn to_snapshot(&self) -> ThermalEnergySnapshot {
        ThermalEnergySnapshot {
            daily_heating_energy: self.daily_heating_energy,
            total_heating_energy: self.total_heating_energy,
            daily_cooling_energy: self.daily_cooling_energy,
            total_cooling_energy: self.total_cooling_energy,
            last_reset_date: Some(self.last_reset_date),
        }
    }

    pub fn update(
        &mut self,
        heating_power: f64,
        cooling_power: f64,
        compressor_running: bool,
        operation_mode: Option<OperationMode>,
    ) {
        let now = self.clock.now();
        self.update_at(heating_power, cooling_power, compressor_running, operation_mode, now);
    }

    pub fn update_at(
        &mut self,
        heating_power: f64,
        cooling_power: f64,
        compressor_running: bool,
        operation_mode: Option<OperationMode>,
        now: DateTime<Local>,
    ) {
        let mut heating = heating_power;
        let mut cooling = cooling_power;

        // A brief negative ΔT after switching to DHW is sensor lag, not cooling
        if operation_mode.is_some_and(|mode| mode.always_heats()) {
            heating += cooling;
            cooling = 0.0;
        }

        if compressor_running {
            if self.post_cycle_lock {
                tracing::debug!("Compressor restarted, releasing post-cycle lock");
            }
            self.post_cycle_lock = false;
        } else if let Some(mode) = self.last_mode {
            let active = match mode {
                EnergyKind::Heating => &mut heating,
                EnergyKind::Cooling => &mut cooling,
            };
            if *active <= 0.0 && !self.post_cycle_lock {
                tracing::debug!("Residual {:?} power reached zero, engaging post-cycle lock", mode);
                self.post_cycle_lock = true;
            }
            if self.post_cycle_lock {
                *active = 0.0;
            }
        }

        if heating > 0.0 {
            self.integrate(heating, EnergyKind::Heating, now);
            self.last_cooling_power = 0.0;
            self.last_mode = Some(EnergyKind::Heating);
        } else if cooling > 0.0 {
            self.integrate(cooling, EnergyKind::Cooling, now);
            self.last_heating_power = 0.0;
            self.last_mode = Some(EnergyKind::Cooling);
        } else if let Some(mode) = self.last_mode {
            // Keep the time baseline moving so the next sample integrates
            // only its own interval
            self.integrate(0.0, mode, now);
            self.last_heating_power = 0.0;
            self.last_cooling_power = 0.0;
        }
    }

    fn integrate(&mut self, power: f64, kind: EnergyKind, now: DateTime<Local>) {
        self.roll_over_if_new_day(now);

        if let Some(last) = self.last_measurement_time {
            let hours = (now - last).num_milliseconds() as f64 / MILLIS_PER_HOUR;
            if hours > 0.0 {
                let previous = match kind {
                    EnergyKind::Heating => self.last_heating_power,
                    EnergyKind::Cooling => self.last_cooling_power,
                };
                let energy = (previous + power) / 2.0 * hours;
                match kind {
                    EnergyKind::Heating => {
                        self.daily_heating_energy += energy;
                        self.total_heating_energy += energy;
                    }
                    EnergyKind::Cooling => {
                        self.daily_cooling_energy += energy;
                        self.total_cooling_energy += energy;
                    }
                }
            }
        }

        self.last_measurement_time = Some(now);
        match kind {
            EnergyKind::Heating => self.last_heating_power = power,
            EnergyKind::Cooling => self.last_cooling_power = power,
        }
    }

    fn roll_over_if_new_day(&mut self, now: DateTime<Local>) {
        let today = now.date_naive();
        if today != self.last_reset_date {
            tracing::debug!(
                "Daily rollover {} -> {}: heating {:.2} kWh, cooling {:.2} kWh",
                self.last_reset_date,
                today,
                self.daily_heating_energy,
                self.daily_cooling_energy
            );
            self.daily_heating_energy = 0.0;
            self.daily_cooling_energy = 0.0;
            self.daily_start_time = now;
            self.last_reset_date = today;
        }
    }

    pub fn heating_power(&self) -> f64 {
        self.last_heating_power
    }

    pub fn cooling_power(&self) -> f64 {
        self.last_cooling_power
    }

    pub fn daily_heating_energy(&self) -> f64 {
        self.daily_heating_energy
    }

    pub fn total_heating_energy(&self) -> f64 {
        self.total_heating_energy
    }

    pub fn daily_cooling_energy(&self) -> f64 {
        self.daily_cooling_energy
    }

    pub fn total_cooling_energy(&self) -> f64 {
        self.total_cooling_energy
    }

    pub fn daily_start_time(&self) -> DateTime<Local> {
        self.daily_start_time
    }

    pub fn last_reset_date(&self) -> NaiveDate {
        self.last_reset_date
    }

    pub fn is_post_cycle_locked(&self) -> bool {
        self.post_cycle_lock
    }

    pub fn last_mode(&self) -> Option<EnergyKind> {
        self.last_mode
    }
}
