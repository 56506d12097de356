// Replay source - recorded poll readings and persisted snapshots as JSON files
use crate::domain::energy::ThermalEnergySnapshot;
use crate::domain::reading::PollReading;
use crate::error::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayRecord {
    pub timestamp: DateTime<Local>,
    #[serde(flatten)]
    pub reading: PollReading,
}

/// Read JSON-lines records, returned in chronological order. Lines that fail
/// to parse are skipped.
pub fn load_replay_records(path: &Path) -> Result<Vec<ReplayRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ReplayRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Skipping line {} of {}: {}", index + 1, path.display(), e);
            }
        }
    }

    records.sort_by_key(|r| r.timestamp);
    tracing::debug!("Loaded {} replay records from {}", records.len(), path.display());
    Ok(records)
}

/// A missing snapshot file means a fresh installation.
pub fn load_snapshot(path: &Path) -> Result<Option<ThermalEnergySnapshot>> {
    if !path.exists() {
        return Ok(None);
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(Some(serde_json::from_reader(reader)?))
}

pub fn save_snapshot(path: &Path, snapshot: &ThermalEnergySnapshot) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, snapshot)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::operation_mode::OperationMode;
    use std::io::Write;

    #[test]
    fn test_load_records_sorted_and_skips_bad_ones() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"timestamp":"2024-01-15T12:01:00+00:00","water_inlet_temp":30.5,"operation_mode":"dhw"}}"#
        )
        .unwrap();
        writeln!(file, r#"{{"timestamp":"not a time"}}"#).unwrap();
        writeln!(
            file,
            r#"{{"timestamp":"2024-01-15T12:00:00+00:00","compressor_frequency":42.0}}"#
        )
        .unwrap();

        let records = load_replay_records(file.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].reading.compressor_frequency, Some(42.0));
        assert_eq!(records[1].reading.water_inlet_temp, Some(30.5));
        assert_eq!(records[1].reading.operation_mode, Some(OperationMode::Dhw));
    }

    #[test]
    fn test_load_record_with_mode_none() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"timestamp":"2024-01-15T12:00:00+00:00","compressor_frequency":0.0,"operation_mode":"none"}}"#
        )
        .unwrap();

        let records = load_replay_records(file.path()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].reading.operation_mode, None);
        assert_eq!(records[0].reading.compressor_frequency, Some(0.0));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_replay_records(&dir.path().join("absent.jsonl")).is_err());
    }

    #[test]
    fn test_snapshot_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("energy.json");
        assert_eq!(load_snapshot(&path).unwrap(), None);

        let snapshot = ThermalEnergySnapshot {
            total_heating_energy: 812.4,
            daily_heating_energy: 12.1,
            ..Default::default()
        };
        save_snapshot(&path, &snapshot).unwrap();

        assert_eq!(load_snapshot(&path).unwrap(), Some(snapshot));
    }
}
