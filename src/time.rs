use hifitime::{Duration, Epoch, Unit};

use crate::constants::{Radian, DPI, MJD, SIDEREAL_RATE, T2000};
use crate::skychart_errors::SkyChartError;

/// Modified Julian Date (UTC) of an epoch.
///
/// UTC is used as a stand-in for UT1: the sub-second difference is far below what a
/// screen pixel can show.
pub fn epoch_to_mjd(epoch: &Epoch) -> MJD {
    epoch.to_mjd_utc_days()
}

/// Build an epoch from a Modified Julian Date in the UTC scale.
pub fn mjd_to_epoch(mjd: MJD) -> Epoch {
    Epoch::from_mjd_utc(mjd)
}

/// Compute the Greenwich Mean Sidereal Time (GMST) in radians
/// for a given Modified Julian Date (UT1 time scale).
///
/// This implements the IAU 1982 polynomial for the mean sidereal time at 0h UT1,
/// plus the fractional-day term due to Earth's rotation rate.
///
/// # Arguments
/// * `tjm` - Modified Julian Date (MJD, UT1 time scale)
///
/// # Returns
/// * GMST angle in radians, normalized to the interval [0, 2π).
pub fn gmst(tjm: MJD) -> Radian {
    // Polynomial coefficients for GMST at 0h UT1 (in seconds)
    const C0: f64 = 24110.54841;
    const C1: f64 = 8640184.812866;
    const C2: f64 = 9.3104e-2;
    const C3: f64 = -6.2e-6;

    let itjm = tjm.floor();
    let t = (itjm - T2000) / 36525.0;

    let gmst0 = (((C3 * t + C2) * t + C1) * t + C0) * DPI / 86400.0;

    // fraction of the day, scaled to sidereal rotation
    let h = (tjm - itjm) * DPI;
    (gmst0 + h * SIDEREAL_RATE).rem_euclid(DPI)
}

/// Local mean sidereal time for an observer at east longitude `longitude` (radians).
pub fn local_sidereal_time(epoch: &Epoch, longitude: Radian) -> Radian {
    (gmst(epoch_to_mjd(epoch)) + longitude).rem_euclid(DPI)
}

/// Granularity of a discrete clock step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StepUnit {
    Day,
    Hour,
    Minute,
    Second,
}

impl From<StepUnit> for Unit {
    fn from(unit: StepUnit) -> Self {
        match unit {
            StepUnit::Day => Unit::Day,
            StepUnit::Hour => Unit::Hour,
            StepUnit::Minute => Unit::Minute,
            StepUnit::Second => Unit::Second,
        }
    }
}

/// How the simulated time moves on every clock tick.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum TimeRate {
    /// Every tick snaps the time to the current wall clock.
    JumpToNow,
    /// Fixed signed step per tick, e.g. `-3` days.
    Step { amount: i64, unit: StepUnit },
    /// Advance by the wall-clock time elapsed since the previous tick, scaled.
    RealTime { multiplier: f64 },
}

impl Default for TimeRate {
    fn default() -> Self {
        TimeRate::RealTime { multiplier: 1.0 }
    }
}

impl TimeRate {
    /// Compute the epoch following `current`.
    ///
    /// Arguments
    /// ---------
    /// * `current`: the simulated time before the tick
    /// * `elapsed`: wall-clock time since the previous tick, only used by [`TimeRate::RealTime`]
    ///
    /// Return
    /// ------
    /// * the advanced epoch, or a [`SkyChartError::Time`] when the system clock cannot be read
    pub fn advance(&self, current: Epoch, elapsed: std::time::Duration) -> Result<Epoch, SkyChartError> {
        match *self {
            TimeRate::JumpToNow => Ok(Epoch::now()?),
            TimeRate::Step { amount, unit } => Ok(current + Unit::from(unit) * amount),
            TimeRate::RealTime { multiplier } => {
                let step = Duration::from_seconds(elapsed.as_secs_f64() * multiplier);
                Ok(current + step)
            }
        }
    }
}
