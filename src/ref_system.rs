//! # Reference frames of the sky chart
//!
//! Every sky position handled by the engine is a `(longitude, latitude)` pair in one of the
//! four [`CoordinateSystem`]s. Positions coming from the ephemeris and catalog collaborators
//! are **equatorial J2000**; this module builds, for a given time and observer, the rotation
//! matrices that carry a J2000 unit vector into every other frame:
//!
//! ```text
//! Equatorial J2000 ──P(date)──> Equatorial of date ──R1(ε)──> Ecliptic of date
//!        │                              └──R3(LST), H(φ)──> Horizontal (az from north, alt)
//!        └──────────────G──────────────> Galactic
//! ```
//!
//! All matrices are orthogonal, so the inverse transform is always the transpose.
//!
//! ## See also
//! * [`obleq`](crate::earth_orientation::obleq), [`prec`](crate::earth_orientation::prec) – Earth orientation models.
//! * [`local_sidereal_time`](crate::time::local_sidereal_time) – hour-angle origin of the horizontal frame.

use hifitime::Epoch;
use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::constants::{clamp_latitude, wrap_longitude, Radian};
use crate::earth_orientation::{obleq, prec};
use crate::observers::ObserverLocation;
use crate::time::{epoch_to_mjd, local_sidereal_time};

/// Equatorial J2000 → galactic (IAU 1958 system, Hipparcos realisation).
const EQUATORIAL_TO_GALACTIC: [[f64; 3]; 3] = [
    [-0.0548755604162154, -0.8734370902348850, -0.4838350155487132],
    [0.4941094278755837, -0.4448296299600112, 0.7469822444972189],
    [-0.8676661490190047, -0.1980763734312015, 0.4559837761750669],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Frame rotation of angle `alpha` around one of the principal axes.
///
/// This is the classical astronomical `Rk(α)`: it rotates the **frame** by `α`, so a fixed
/// vector appears rotated by `−α`. For instance
/// `R1(ε) = [[1, 0, 0], [0, cos ε, sin ε], [0, −sin ε, cos ε]]`.
pub fn rotmt(alpha: Radian, axis: Axis) -> Matrix3<f64> {
    let axis = match axis {
        Axis::X => Vector3::x_axis(),
        Axis::Y => Vector3::y_axis(),
        Axis::Z => Vector3::z_axis(),
    };

    Rotation3::from_axis_angle(&axis, -alpha).into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum CoordinateSystem {
    #[default]
    Equatorial,
    Horizontal,
    Ecliptic,
    Galactic,
}

/// A direction on the celestial sphere, in radians.
///
/// The meaning of `lon`/`lat` depends on the frame it was produced in:
/// (α, δ) for equatorial, (azimuth from north through east, altitude) for horizontal,
/// (λ, β) for ecliptic and (l, b) for galactic.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SkyPosition {
    pub lon: Radian,
    pub lat: Radian,
}

impl SkyPosition {
    /// Build a position, wrapping the longitude and clamping the latitude.
    pub fn new(lon: Radian, lat: Radian) -> Self {
        SkyPosition {
            lon: wrap_longitude(lon),
            lat: clamp_latitude(lat),
        }
    }

    pub fn from_degrees(lon: f64, lat: f64) -> Self {
        SkyPosition::new(lon.to_radians(), lat.to_radians())
    }

    pub fn to_unit_vector(&self) -> Vector3<f64> {
        let (sl, cl) = self.lon.sin_cos();
        let (sb, cb) = self.lat.sin_cos();
        Vector3::new(cb * cl, cb * sl, sb)
    }

    /// Convert a 3D Cartesian vector to spherical angles.
    ///
    /// Returns `None` for a zero or non-finite vector, which has no direction.
    pub fn from_vector(v: &Vector3<f64>) -> Option<Self> {
        let norm = v.norm();
        if norm == 0.0 || !norm.is_finite() {
            return None;
        }
        let lat = (v.z / norm).clamp(-1.0, 1.0).asin();
        let lon = if v.x == 0.0 && v.y == 0.0 {
            0.0
        } else {
            v.y.atan2(v.x)
        };
        Some(SkyPosition::new(lon, lat))
    }

    /// Great-circle distance to `other`, in radians.
    pub fn angular_distance(&self, other: &SkyPosition) -> Radian {
        let a = self.to_unit_vector();
        let b = other.to_unit_vector();
        // atan2 form keeps precision for tiny and near-antipodal separations
        a.cross(&b).norm().atan2(a.dot(&b))
    }
}

/// Frame rotations for one `(time, observer)` pair.
///
/// Building a converter costs one precession matrix and one sidereal time evaluation;
/// converting positions afterwards is a single matrix product.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameConverter {
    to_horizontal: Matrix3<f64>,
    to_ecliptic: Matrix3<f64>,
    to_galactic: Matrix3<f64>,
}

impl FrameConverter {
    pub fn new(epoch: &Epoch, observer: &ObserverLocation) -> Self {
        let tjm = epoch_to_mjd(epoch);
        let precession = prec(tjm);

        let lst = local_sidereal_time(epoch, observer.longitude_rad());
        let (sphi, cphi) = observer.latitude_rad().sin_cos();
        // equator of date (meridian on x) → x north point, y east point, z zenith
        let horizon = Matrix3::new(-sphi, 0.0, cphi, 0.0, 1.0, 0.0, cphi, 0.0, sphi);

        FrameConverter {
            to_horizontal: horizon * rotmt(lst, Axis::Z) * precession,
            to_ecliptic: rotmt(obleq(tjm), Axis::X) * precession,
            // nalgebra reads nested arrays as columns
            to_galactic: Matrix3::from(EQUATORIAL_TO_GALACTIC).transpose(),
        }
    }

    fn matrix(&self, system: CoordinateSystem) -> Matrix3<f64> {
        match system {
            CoordinateSystem::Equatorial => Matrix3::identity(),
            CoordinateSystem::Horizontal => self.to_horizontal,
            CoordinateSystem::Ecliptic => self.to_ecliptic,
            CoordinateSystem::Galactic => self.to_galactic,
        }
    }

    /// Express an equatorial J2000 position in `system`.
    pub fn from_equatorial(&self, position: &SkyPosition, system: CoordinateSystem) -> SkyPosition {
        let v = self.matrix(system) * position.to_unit_vector();
        SkyPosition::from_vector(&v).unwrap_or(*position)
    }

    /// Express a position given in `system` in equatorial J2000.
    pub fn to_equatorial(&self, position: &SkyPosition, system: CoordinateSystem) -> SkyPosition {
        let v = self.matrix(system).transpose() * position.to_unit_vector();
        SkyPosition::from_vector(&v).unwrap_or(*position)
    }

    /// Convert between two arbitrary frames, going through equatorial J2000.
    pub fn convert(
        &self,
        position: &SkyPosition,
        from: CoordinateSystem,
        to: CoordinateSystem,
    ) -> SkyPosition {
        if from == to {
            return *position;
        }
        self.from_equatorial(&self.to_equatorial(position, from), to)
    }
}
