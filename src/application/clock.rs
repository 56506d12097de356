// Clock trait - wall and monotonic time source for the services
use chrono::{DateTime, Local};
use std::time::Duration;

pub trait Clock: Send + Sync {
    /// Wall-clock time, used for daily rollover and measurement timestamps
    fn now(&self) -> DateTime<Local>;

    /// Monotonic time elapsed since an arbitrary fixed origin
    fn monotonic(&self) -> Duration;
}
