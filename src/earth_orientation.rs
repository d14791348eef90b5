use nalgebra::Matrix3;

use crate::constants::{Radian, MJD, RADEG, RADSEC, T2000};
use crate::ref_system::{rotmt, Axis};

/// Compute the mean obliquity of the ecliptic at a given epoch (IAU 1976 model).
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date (TT scale).
///
/// Returns
/// --------
/// * Mean obliquity of the ecliptic in radians.
///
/// The obliquity is a cubic polynomial in Julian centuries since J2000,
/// evaluated with Horner's scheme:
///
/// ```text
/// ε(T) = ε₀ + ε₁·T + ε₂·T² + ε₃·T³
/// ```
pub fn obleq(tjm: MJD) -> Radian {
    let ob0 = ((23.0 * 3600.0 + 26.0 * 60.0) + 21.448) * RADSEC;
    let ob1 = -46.815 * RADSEC;
    let ob2 = -0.0006 * RADSEC;
    let ob3 = 0.00181 * RADSEC;

    let t = (tjm - T2000) / 36525.0;

    ((ob3 * t + ob2) * t + ob1) * t + ob0
}

/// Precession matrix from the J2000 mean equator to the mean equator of date (IAU 1976).
///
/// `x_date = prec(tjm) · x_J2000`. The matrix is the classical composition of three
/// frame rotations `R3(−z) · R2(θ) · R3(−ζ)` with
///
/// ```text
/// ζ(T) = (0.6406161 + 0.0000839·T + 0.0000050·T²) · T  [deg]
/// θ(T) = (0.5567530 - 0.0001185·T - 0.0000116·T²) · T  [deg]
/// z(T) = (0.6406161 + 0.0003041·T + 0.0000051·T²) · T  [deg]
/// ```
pub fn prec(tjm: MJD) -> Matrix3<f64> {
    let t = (tjm - T2000) / 36525.0;

    let zeta = ((0.0000050 * t + 0.0000839) * t + 0.6406161) * t * RADEG;
    let z = ((0.0000051 * t + 0.0003041) * t + 0.6406161) * t * RADEG;
    let theta = ((-0.0000116 * t - 0.0001185) * t + 0.5567530) * t * RADEG;

    rotmt(-z, Axis::Z) * rotmt(theta, Axis::Y) * rotmt(-zeta, Axis::Z)
}
