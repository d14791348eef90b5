//! # Constants and type definitions for skychart
//!
//! This module centralizes the **astronomical constants**, **conversion factors**, and
//! **common type aliases** used throughout the `skychart` crate, together with a couple of
//! small angle helpers shared by every component that mutates a viewport center.
//!
//! ## Overview
//!
//! - Astronomical constants (J2000 epoch, sidereal rate)
//! - Unit conversions (degrees ↔ radians, arcseconds ↔ radians)
//! - Core type aliases used across the crate
//! - [`wrap_longitude`] and [`clamp_latitude`], the two invariants every central position obeys

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// π/2, the absolute bound of any latitude
pub const HALF_PI: f64 = std::f64::consts::FRAC_PI_2;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00 TT)
pub const T2000: f64 = 51544.5;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcseconds → radians
pub const RADSEC: f64 = std::f64::consts::PI / 648000.0;

/// Hours → radians
pub const RADH: f64 = DPI / 24.0;

/// Ratio of the sidereal day to the solar day
pub const SIDEREAL_RATE: f64 = 1.00273790934;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Distance in millimeters (focal lengths)
pub type Millimeter = f64;
/// Modified Julian Date (days)
pub type MJD = f64;
/// Apparent visual magnitude
pub type Magnitude = f32;

// -------------------------------------------------------------------------------------------------
// Angle invariants
// -------------------------------------------------------------------------------------------------

/// Wrap a longitude into `[0, 2π)`.
///
/// Non-finite inputs collapse to `0.0` so a corrupted delta can never leak a NaN
/// into a viewport center.
pub fn wrap_longitude(lon: Radian) -> Radian {
    if !lon.is_finite() {
        return 0.0;
    }
    let wrapped = lon.rem_euclid(DPI);
    // rem_euclid can round up to exactly 2π for tiny negative inputs
    if wrapped >= DPI {
        0.0
    } else {
        wrapped
    }
}

/// Clamp a latitude into `[−π/2, π/2]`.
pub fn clamp_latitude(lat: Radian) -> Radian {
    if !lat.is_finite() {
        return 0.0;
    }
    lat.clamp(-HALF_PI, HALF_PI)
}
