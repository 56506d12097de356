// Main entry point - Replays recorded poll readings through the metrics services
use std::sync::Arc;

use heatpump_metrics::HeatPumpMetrics;
use heatpump_metrics::infrastructure::clock::ManualClock;
use heatpump_metrics::infrastructure::config::load_app_config;
use heatpump_metrics::infrastructure::replay_source::{
    load_replay_records, load_snapshot, save_snapshot,
};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let app_config = load_app_config()?;
    let records = load_replay_records(&app_config.replay.input)?;
    let Some(first) = records.first() else {
        anyhow::bail!("No replay records in {}", app_config.replay.input.display());
    };

    // The replay drives its own clock so timestamps are used exactly as recorded
    let clock = Arc::new(ManualClock::new(first.timestamp));

    let snapshot = match &app_config.replay.snapshot {
        Some(path) => load_snapshot(path)?,
        None => None,
    };
    let mut metrics = match &snapshot {
        Some(snapshot) => {
            tracing::info!(
                "Restoring energy totals: heating {:.2} kWh, cooling {:.2} kWh",
                snapshot.total_heating_energy,
                snapshot.total_cooling_energy
            );
            HeatPumpMetrics::with_snapshot(&app_config.metrics, clock.clone(), snapshot)
        }
        None => HeatPumpMetrics::new(&app_config.metrics, clock.clone()),
    };

    tracing::info!(
        "Replaying {} readings from {}",
        records.len(),
        app_config.replay.input.display()
    );
    for record in &records {
        clock.set(record.timestamp);
        metrics.process(&record.reading);
    }

    let summary = metrics.summary();
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(path) = &app_config.replay.snapshot {
        save_snapshot(path, &metrics.snapshot())?;
        tracing::info!("Saved energy snapshot to {}", path.display());
    }

    Ok(())
}
