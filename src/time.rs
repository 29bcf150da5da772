//! Time base shared by the catalog and the engine.
//!
//! All engine timestamps are expressed as minutes from the Unix epoch.

use chrono::{DateTime, Utc};

pub const MINUTES_PER_DAY: f64 = 1440.0;
const MILLIS_PER_MINUTE: f64 = 60_000.0;
const UNIX_EPOCH_JULIAN_DATE: f64 = 2_440_587.5;
const J2000_JULIAN_DATE: f64 = 2_451_545.0;
const DAYS_PER_JULIAN_YEAR: f64 = 365.25;

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn minutes_from_epoch(&self) -> f64 {
        minutes_from_epoch(&self.now())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub fn minutes_from_epoch(timestamp: &DateTime<Utc>) -> f64 {
    timestamp.timestamp_millis() as f64 / MILLIS_PER_MINUTE
}

pub fn naive_to_minutes(datetime: &sgp4::chrono::NaiveDateTime) -> f64 {
    datetime.and_utc().timestamp_millis() as f64 / MILLIS_PER_MINUTE
}

/// Snap a time onto the grid of even multiples of twice the step size.
///
/// Independent processes sampling the same object land on identical
/// timestamps without having to agree on a start time.
pub fn quantize(minutes_from_epoch: f64, step_minutes: f64) -> f64 {
    let quantum = 2.0 * step_minutes;
    (minutes_from_epoch / quantum).floor() * quantum
}

/// Greenwich sidereal angle (radians) at the given time.
pub fn earth_phase(minutes_from_epoch: f64) -> f64 {
    let julian_date = minutes_from_epoch / MINUTES_PER_DAY + UNIX_EPOCH_JULIAN_DATE;
    let years_since_j2000 = (julian_date - J2000_JULIAN_DATE) / DAYS_PER_JULIAN_YEAR;
    sgp4::iau_epoch_to_sidereal_time(years_since_j2000)
}
