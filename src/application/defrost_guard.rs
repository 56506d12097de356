// Defrost guard - flags inlet/outlet readings as unreliable around defrost cycles
use crate::application::clock::Clock;
use crate::domain::defrost::DefrostState;
use crate::infrastructure::config::DefrostConfig;
use std::sync::Arc;
use std::time::Duration;

/// NORMAL -> DEFROST -> RECOVERY -> NORMAL.
///
/// Recovery ends once ΔT has settled back to its pre-defrost sign for enough
/// consecutive readings, or unconditionally after the recovery timeout.
pub struct DefrostGuard {
    clock: Arc<dyn Clock>,
    config: DefrostConfig,
    state: DefrostState,
    pre_defrost_positive: Option<bool>,
    stable_readings: u32,
    recovery_started: Option<Duration>,
}

impl DefrostGuard {
    pub fn new(config: &DefrostConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            config: config.clone(),
            state: DefrostState::Normal,
            pre_defrost_positive: None,
            stable_readings: 0,
            recovery_started: None,
        }
    }

    pub fn update(&mut self, is_defrosting: bool, delta_t: Option<f64>) -> DefrostState {
        let now = self.clock.monotonic();
        self.update_at(is_defrosting, delta_t, now)
    }

    /// Advance the state machine with an explicit monotonic timestamp.
    pub fn update_at(
        &mut self,
        is_defrosting: bool,
        delta_t: Option<f64>,
        now: Duration,
    ) -> DefrostState {
        match self.state {
            DefrostState::Normal => {
                if is_defrosting {
                    self.pre_defrost_positive = delta_t.map(|dt| dt > 0.0);
                    self.transition(DefrostState::Defrost);
                }
            }
            DefrostState::Defrost => {
                if !is_defrosting {
                    self.stable_readings = 0;
                    self.recovery_started = Some(now);
                    self.transition(DefrostState::Recovery);
                }
            }
            DefrostState::Recovery => self.recover(is_defrosting, delta_t, now),
        }

        self.state
    }

    fn recover(&mut self, is_defrosting: bool, delta_t: Option<f64>, now: Duration) {
        if is_defrosting {
            self.stable_readings = 0;
            self.transition(DefrostState::Defrost);
            return;
        }

        let started = self.recovery_started.unwrap_or(now);
        if now.saturating_sub(started) >= self.config.recovery_timeout() {
            tracing::debug!("Defrost recovery timed out, forcing normal state");
            self.stable_readings = 0;
            self.transition(DefrostState::Normal);
            return;
        }

        let (Some(delta_t), Some(positive)) = (delta_t, self.pre_defrost_positive) else {
            self.stable_readings = 0;
            return;
        };

        let threshold = self.config.delta_t_threshold;
        let matches = if positive {
            delta_t > threshold
        } else {
            delta_t < -threshold
        };

        if !matches {
            self.stable_readings = 0;
            return;
        }

        self.stable_readings += 1;
        if self.stable_readings >= self.config.stable_readings_required {
            self.stable_readings = 0;
            self.transition(DefrostState::Normal);
        }
    }

    fn transition(&mut self, next: DefrostState) {
        tracing::debug!("Defrost guard {} -> {}", self.state, next);
        self.state = next;
    }

    pub fn state(&self) -> DefrostState {
        self.state
    }

    pub fn is_data_reliable(&self) -> bool {
        self.state == DefrostState::Normal
    }

    pub fn stable_readings(&self) -> u32 {
        self.stable_readings
    }
}
