//! Coordinate literals typed or stored in place of an object name.
//!
//! Two forms are understood:
//!
//! * sexagesimal equatorial coordinates, `"HH MM SS.S ±DD MM SS.S"` (spaces or colons);
//! * the raw encoding `"raw:<ra_rad>,<dec_rad>"`, written by [`format_raw`] for sky points
//!   that have no catalog identifier.

use std::sync::LazyLock;

use regex::Regex;

use crate::constants::{Degree, Radian, RADEG};
use crate::ref_system::SkyPosition;
use crate::skychart_errors::SkyChartError;

const RAW_PREFIX: &str = "raw:";

static SEXAGESIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(\d{1,2})[\s:]+(\d{1,2})[\s:]+(\d{1,2}(?:\.\d*)?)\s+([+-]?)(\d{1,2})[\s:]+(\d{1,2})[\s:]+(\d{1,2}(?:\.\d*)?)\s*$",
    )
    .expect("static regex")
});

/// Combine `units minutes seconds` into a single value in `units`.
///
/// Arguments
/// ---------
/// * `units`, `minutes`, `seconds`: the three sexagesimal fields, all positive
/// * `max_units`: exclusive upper bound of the first field
///
/// Return
/// ------
/// * `None` if a field is out of range
fn sexagesimal(units: &str, minutes: &str, seconds: &str, max_units: f64) -> Option<f64> {
    let u: f64 = units.parse().ok()?;
    let m: f64 = minutes.parse().ok()?;
    let s: f64 = seconds.parse().ok()?;
    if u >= max_units || m >= 60.0 || s >= 60.0 {
        return None;
    }
    Some(u + m / 60.0 + s / 3600.0)
}

/// Parse a coordinate literal into an equatorial position.
///
/// Return
/// ------
/// * `Ok(None)` when `text` is not shaped like a literal at all (it is then a name)
/// * `Ok(Some(position))` on success
/// * [`SkyChartError::InvalidCoordinateLiteral`] when it is shaped like one but a field is
///   malformed or out of range
pub fn parse_coordinate_literal(text: &str) -> Result<Option<SkyPosition>, SkyChartError> {
    let text = text.trim();

    if let Some(raw) = text.strip_prefix(RAW_PREFIX) {
        let invalid = || SkyChartError::InvalidCoordinateLiteral(text.to_string());
        let (ra, dec) = raw.split_once(',').ok_or_else(invalid)?;
        let ra: Radian = ra.trim().parse().map_err(|_| invalid())?;
        let dec: Radian = dec.trim().parse().map_err(|_| invalid())?;
        if !ra.is_finite() || !dec.is_finite() || dec.abs() > std::f64::consts::FRAC_PI_2 {
            return Err(invalid());
        }
        return Ok(Some(SkyPosition::new(ra, dec)));
    }

    let Some(caps) = SEXAGESIMAL.captures(text) else {
        return Ok(None);
    };
    let invalid = || SkyChartError::InvalidCoordinateLiteral(text.to_string());

    let hours = sexagesimal(&caps[1], &caps[2], &caps[3], 24.0).ok_or_else(invalid)?;
    let degrees = sexagesimal(&caps[5], &caps[6], &caps[7], 91.0).ok_or_else(invalid)?;
    if degrees > 90.0 {
        return Err(invalid());
    }
    let sign = if &caps[4] == "-" { -1.0 } else { 1.0 };

    let ra: Degree = hours * 15.0;
    Ok(Some(SkyPosition::new(ra * RADEG, sign * degrees * RADEG)))
}

/// Raw encoding of a position without catalog identifier.
pub fn format_raw(position: &SkyPosition) -> String {
    format!("{RAW_PREFIX}{},{}", position.lon, position.lat)
}

/// `"HH MM SS.SS ±DD MM SS.S"`, the same layout [`parse_coordinate_literal`] reads.
pub fn format_sexagesimal(position: &SkyPosition) -> String {
    let total_s = (position.lon.to_degrees() / 15.0 * 3600.0 * 100.0).round() / 100.0;
    let total_s = total_s.rem_euclid(86400.0);
    let h = (total_s / 3600.0).floor();
    let m = ((total_s - h * 3600.0) / 60.0).floor();
    let s = total_s - h * 3600.0 - m * 60.0;

    let dec = position.lat.to_degrees();
    let sign = if dec < 0.0 { '-' } else { '+' };
    let total_as = (dec.abs() * 3600.0 * 10.0).round() / 10.0;
    let d = (total_as / 3600.0).floor();
    let am = ((total_as - d * 3600.0) / 60.0).floor();
    let asec = total_as - d * 3600.0 - am * 60.0;

    format!("{h:02} {m:02} {s:05.2} {sign}{d:02} {am:02} {asec:04.1}")
}
