// Compressor timing service - cycle, run and rest durations from on/off transitions
use crate::application::bounded_sequence::BoundedSequence;
use crate::application::clock::Clock;
use crate::application::rehydration::compressor_states;
use crate::domain::compressor::CompressorTimes;
use crate::domain::reading::is_running;
use crate::infrastructure::config::CompressorConfig;
use crate::infrastructure::memory_sequence::InMemorySequence;
use chrono::{DateTime, Local, TimeDelta};
use std::sync::Arc;

pub struct CompressorHistory {
    transitions: Box<dyn BoundedSequence<(DateTime<Local>, bool)>>,
    cycles: Box<dyn BoundedSequence<f64>>,
    run_times: Box<dyn BoundedSequence<f64>>,
    rest_times: Box<dyn BoundedSequence<f64>>,
    last_state: Option<bool>,
    last_transition: Option<DateTime<Local>>,
    last_on: Option<DateTime<Local>>,
}

impl CompressorHistory {
    pub fn new(max_history: usize) -> Self {
        Self {
            // Enough transitions to back every derived entry
            transitions: Box::new(InMemorySequence::with_max_length(max_history * 2 + 1)),
            cycles: Box::new(InMemorySequence::with_max_length(max_history)),
            run_times: Box::new(InMemorySequence::with_max_length(max_history)),
            rest_times: Box::new(InMemorySequence::with_max_length(max_history)),
            last_state: None,
            last_transition: None,
            last_on: None,
        }
    }

    pub fn add_state(&mut self, is_running: bool, timestamp: DateTime<Local>) {
        let Some(previous) = self.last_state else {
            self.record(is_running, timestamp);
            return;
        };
        if previous == is_running {
            return;
        }

        let duration = self
            .last_transition
            .map_or(0.0, |last| minutes(timestamp - last));

        if is_running {
            if self.transitions.len() >= 2 {
                if let Some(last_on) = self.last_on {
                    self.cycles.append(minutes(timestamp - last_on));
                }
            }
            self.rest_times.append(duration);
        } else {
            self.run_times.append(duration);
        }

        self.record(is_running, timestamp);
    }

    fn record(&mut self, is_running: bool, timestamp: DateTime<Local>) {
        self.transitions.append((timestamp, is_running));
        self.last_state = Some(is_running);
        self.last_transition = Some(timestamp);
        if is_running {
            self.last_on = Some(timestamp);
        }
    }

    /// Replay historical states, oldest first, as if observed live.
    pub fn bulk_load(&mut self, states: impl IntoIterator<Item = (DateTime<Local>, bool)>) {
        let mut states: Vec<_> = states.into_iter().collect();
        states.sort_by_key(|(ts, _)| *ts);
        for (timestamp, is_running) in states {
            self.add_state(is_running, timestamp);
        }
    }

    pub fn get_average_times(&self) -> CompressorTimes {
        CompressorTimes {
            cycle: mean(&self.cycles.to_vec()),
            run: mean(&self.run_times.to_vec()),
            rest: mean(&self.rest_times.to_vec()),
        }
    }

    pub fn transitions(&self) -> Vec<(DateTime<Local>, bool)> {
        self.transitions.to_vec()
    }

    pub fn cycles(&self) -> Vec<f64> {
        self.cycles.to_vec()
    }

    pub fn run_times(&self) -> Vec<f64> {
        self.run_times.to_vec()
    }

    pub fn rest_times(&self) -> Vec<f64> {
        self.rest_times.to_vec()
    }
}

fn minutes(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / 60_000.0
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub struct CompressorTimingService {
    history: CompressorHistory,
    clock: Arc<dyn Clock>,
}

impl CompressorTimingService {
    pub fn new(config: &CompressorConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            history: CompressorHistory::new(config.max_history),
            clock,
        }
    }

    pub fn update(&mut self, frequency: Option<f64>) {
        let now = self.clock.now();
        self.history.add_state(is_running(frequency), now);
    }

    pub fn preload_states(&mut self, states: impl IntoIterator<Item = (DateTime<Local>, bool)>) {
        self.history.bulk_load(states);
    }

    pub fn rehydrate(&mut self, frequency: &[(DateTime<Local>, f64)]) {
        let states = compressor_states(frequency);
        tracing::info!(
            "Rehydrating compressor timing with {} historical states",
            states.len()
        );
        self.preload_states(states);
    }

    pub fn get_average_times(&self) -> CompressorTimes {
        self.history.get_average_times()
    }

    pub fn history(&self) -> &CompressorHistory {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::ManualClock;
    use chrono::TimeZone;
    use std::time::Duration;

    fn at(minute: i64) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap() + TimeDelta::minutes(minute)
    }

    fn sequence() -> Vec<(DateTime<Local>, bool)> {
        vec![
            (at(0), false),
            (at(5), true),
            (at(15), false),
            (at(20), true),
            (at(32), false),
            (at(40), true),
        ]
    }

    #[test]
    fn test_first_state_only_records() {
        let mut history = CompressorHistory::new(10);
        history.add_state(true, at(0));

        assert_eq!(history.transitions().len(), 1);
        assert_eq!(history.get_average_times(), CompressorTimes::default());
    }

    #[test]
    fn test_repeated_state_is_ignored() {
        let mut history = CompressorHistory::new(10);
        history.add_state(true, at(0));
        history.add_state(true, at(3));
        history.add_state(false, at(10));

        assert_eq!(history.transitions().len(), 2);
        assert_eq!(history.run_times(), vec![10.0]);
    }

    #[test]
    fn test_durations_from_transitions() {
        let mut history = CompressorHistory::new(10);
        for (ts, running) in sequence() {
            history.add_state(running, ts);
        }

        assert_eq!(history.rest_times(), vec![5.0, 5.0, 8.0]);
        assert_eq!(history.run_times(), vec![10.0, 12.0]);
        assert_eq!(history.cycles(), vec![15.0, 20.0]);

        let times = history.get_average_times();
        assert_eq!(times.cycle, Some(17.5));
        assert_eq!(times.run, Some(11.0));
        assert_eq!(times.rest, Some(6.0));
    }

    #[test]
    fn test_starting_on_counts_first_cycle() {
        let mut history = CompressorHistory::new(10);
        history.add_state(true, at(0));
        history.add_state(false, at(10));
        history.add_state(true, at(15));

        assert_eq!(history.cycles(), vec![15.0]);
        assert_eq!(history.rest_times(), vec![5.0]);
    }

    #[test]
    fn test_lists_are_capped() {
        let mut history = CompressorHistory::new(2);
        let mut minute = 0;
        for _ in 0..5 {
            history.add_state(true, at(minute));
            minute += 10 + minute / 10;
            history.add_state(false, at(minute));
            minute += 5;
        }

        assert_eq!(history.run_times().len(), 2);
        assert_eq!(history.rest_times().len(), 2);
        assert_eq!(history.cycles().len(), 2);
        // Oldest run times were evicted first
        assert!(history.run_times()[0] < history.run_times()[1]);
    }

    #[test]
    fn test_bulk_load_matches_live_replay() {
        let mut live = CompressorHistory::new(10);
        for (ts, running) in sequence() {
            live.add_state(running, ts);
        }

        let mut shuffled = sequence();
        shuffled.reverse();
        let mut loaded = CompressorHistory::new(10);
        loaded.bulk_load(shuffled);

        assert_eq!(loaded.get_average_times(), live.get_average_times());
    }

    #[test]
    fn test_service_derives_running_from_frequency() {
        let clock = Arc::new(ManualClock::new(at(0)));
        let mut service = CompressorTimingService::new(&CompressorConfig::default(), clock.clone());

        service.update(Some(45.0));
        clock.advance(Duration::from_secs(600));
        service.update(None);
        clock.advance(Duration::from_secs(300));
        service.update(Some(0.0));
        service.update(Some(30.0));

        let times = service.get_average_times();
        assert_eq!(times.run, Some(10.0));
        assert_eq!(times.rest, Some(5.0));
        assert_eq!(times.cycle, Some(15.0));
    }

    #[test]
    fn test_rehydrate_from_frequency_history() {
        let clock = Arc::new(ManualClock::new(at(60)));
        let mut service = CompressorTimingService::new(&CompressorConfig::default(), clock);

        service.rehydrate(&[
            (at(20), 50.0),
            (at(0), 0.0),
            (at(5), 40.0),
            (at(10), 45.0),
            (at(15), 0.0),
        ]);

        let times = service.get_average_times();
        assert_eq!(times.run, Some(10.0));
        assert_eq!(times.rest, Some(5.0));
        assert_eq!(times.cycle, Some(15.0));
    }
}
