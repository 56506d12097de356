// Heat pump metrics - COP, thermal energy and compressor timing from polled readings
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use application::metrics_service::{HeatPumpMetrics, MetricsSummary};
pub use domain::reading::PollReading;
pub use error::{MetricsError, Result};
pub use infrastructure::config::MetricsConfig;
