//! # Coordinate mapper
//!
//! Pure sky ↔ screen math. A sky position expressed in the viewport's
//! [`CoordinateSystem`] is first mapped onto a projection plane centered on the viewport
//! center, then scaled to pixels so that the horizontal field of view spans the screen
//! width.
//!
//! Supported projections:
//!
//! | Projection      | Kind                           | Valid domain                 |
//! |-----------------|--------------------------------|------------------------------|
//! | Stereographic   | azimuthal, conformal           | whole sphere but the antipode |
//! | Spherical       | azimuthal, orthographic        | visible hemisphere            |
//! | Cylindrical     | equirectangular                | one turn in longitude         |
//! | Polar           | azimuthal, equidistant         | whole sphere but the antipode |
//!
//! Outside its domain a projection has no answer: [`project`] and [`unproject`] return
//! `None`, which callers read as "no sky location", never as a failure.
//!
//! Screen orientation
//! ------------------
//! Longitude grows to the **left** in the celestial frames (the sky is seen from inside the
//! sphere) and azimuth grows to the **right**; the viewport inversion flags mirror either
//! axis. Pixel `y` grows downwards.
//!
//! ## See also
//! * [`FrameConverter`] – frame rotations applied before projecting.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::config::HorizonConfig;
use crate::constants::{Radian, DPI, HALF_PI};
use crate::ephemeris::RenderContext;
use crate::ref_system::{CoordinateSystem, FrameConverter, SkyPosition};
use crate::skychart_errors::SkyChartError;
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Projection {
    #[default]
    Stereographic,
    Spherical,
    Cylindrical,
    Polar,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pixel {
    pub x: f64,
    pub y: f64,
}

impl Pixel {
    pub fn new(x: f64, y: f64) -> Self {
        Pixel { x, y }
    }

    pub fn distance(&self, other: &Pixel) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Plane coordinates of `pos` for a projection centered on `center`.
///
/// Azimuthal projections share the same direction terms and only differ by the radial
/// factor `k(c)`, `c` being the angular distance to the center.
fn plane_coords(
    projection: Projection,
    center: &SkyPosition,
    pos: &SkyPosition,
) -> Option<(f64, f64)> {
    let dlon = pos.lon - center.lon;

    if projection == Projection::Cylindrical {
        let x = (dlon + PI).rem_euclid(DPI) - PI;
        return Some((x, pos.lat - center.lat));
    }

    let (sp0, cp0) = center.lat.sin_cos();
    let (sp, cp) = pos.lat.sin_cos();
    let (sdl, cdl) = dlon.sin_cos();

    let cos_c = sp0 * sp + cp0 * cp * cdl;
    let xa = cp * sdl;
    let ya = cp0 * sp - sp0 * cp * cdl;

    let k = match projection {
        Projection::Stereographic => {
            let d = 1.0 + cos_c;
            if d < 1e-12 {
                return None;
            }
            2.0 / d
        }
        Projection::Spherical => {
            if cos_c < 0.0 {
                return None;
            }
            1.0
        }
        Projection::Polar => {
            let sin_c = xa.hypot(ya);
            let c = sin_c.atan2(cos_c);
            if c > PI - 1e-9 {
                return None;
            }
            if sin_c < 1e-15 {
                1.0
            } else {
                c / sin_c
            }
        }
        Projection::Cylindrical => 1.0,
    };
    Some((k * xa, k * ya))
}

/// Inverse of [`plane_coords`].
fn sphere_coords(
    projection: Projection,
    center: &SkyPosition,
    x: f64,
    y: f64,
) -> Option<SkyPosition> {
    if projection == Projection::Cylindrical {
        let lat = center.lat + y;
        if x.abs() > PI || lat.abs() > HALF_PI {
            return None;
        }
        return Some(SkyPosition::new(center.lon + x, lat));
    }

    let rho = x.hypot(y);
    let c = match projection {
        Projection::Stereographic => 2.0 * (rho / 2.0).atan(),
        Projection::Spherical => {
            if rho > 1.0 {
                return None;
            }
            rho.asin()
        }
        Projection::Polar | Projection::Cylindrical => {
            if rho > PI {
                return None;
            }
            rho
        }
    };
    if rho < 1e-15 {
        return Some(*center);
    }

    let (sp0, cp0) = center.lat.sin_cos();
    let (sc, cc) = c.sin_cos();
    let lat = (cc * sp0 + y * sc * cp0 / rho).clamp(-1.0, 1.0).asin();
    let lon = center.lon + (x * sc).atan2(rho * cp0 * cc - y * sp0 * sc);
    Some(SkyPosition::new(lon, lat))
}

/// Pixels per projection-plane unit for the viewport's field of view.
fn scale(vp: &Viewport) -> f64 {
    let half_width = vp.width as f64 / 2.0;
    let fov = vp.field_of_view().clamp(1e-9, DPI * 0.999);
    match vp.projection {
        Projection::Stereographic => half_width / (2.0 * (fov / 4.0).tan()),
        Projection::Spherical => half_width / (fov / 2.0).min(HALF_PI).sin(),
        Projection::Cylindrical | Projection::Polar => half_width / (fov / 2.0),
    }
}

/// Screen position of `pos`, expressed in the viewport's coordinate system.
///
/// Return
/// ------
/// * `None` when `pos` falls outside the projection's valid domain
pub fn project(pos: &SkyPosition, vp: &Viewport) -> Option<Pixel> {
    let (x, y) = plane_coords(vp.projection, &vp.center(), pos)?;
    let s = scale(vp);
    Some(Pixel {
        x: vp.width as f64 / 2.0 + vp.longitude_screen_sign() * s * x,
        y: vp.height as f64 / 2.0 + vp.horizon_offset - vp.latitude_screen_sign() * s * y,
    })
}

/// Sky position under `pixel`, in the viewport's coordinate system.
///
/// Return
/// ------
/// * `None` for pixels outside the plotted disk or area
pub fn unproject(pixel: &Pixel, vp: &Viewport) -> Option<SkyPosition> {
    if !(pixel.x.is_finite() && pixel.y.is_finite()) {
        return None;
    }
    let s = scale(vp);
    let x = (pixel.x - vp.width as f64 / 2.0) / (vp.longitude_screen_sign() * s);
    let y = -(pixel.y - vp.height as f64 / 2.0 - vp.horizon_offset) / (vp.latitude_screen_sign() * s);
    sphere_coords(vp.projection, &vp.center(), x, y)
}

/// Whether the horizon view offset applies to this viewport.
///
/// Only wide horizontal charts looking low above the horizon with an azimuthal
/// perspective projection are concerned; the thresholds come from [`HorizonConfig`].
pub fn horizon_view_engaged(vp: &Viewport, cfg: &HorizonConfig) -> bool {
    vp.layers.horizon_view
        && vp.coordinate_system == CoordinateSystem::Horizontal
        && matches!(vp.projection, Projection::Stereographic | Projection::Spherical)
        && vp.center().lat < cfg.max_center_lat_deg.to_radians()
        && vp.field_of_view() > cfg.min_fov_deg.to_radians()
}

/// Vertical offset, in pixels, that puts the horizon below the center at
/// `bottom_margin × height` from the bottom edge. Zero when horizon view is not engaged.
pub fn horizon_offset(vp: &Viewport, cfg: &HorizonConfig) -> f64 {
    if !horizon_view_engaged(vp, cfg) {
        return 0.0;
    }
    let center = vp.center();
    let horizon = SkyPosition::new(center.lon, 0.0);
    let Some((_, y)) = plane_coords(vp.projection, &center, &horizon) else {
        return 0.0;
    };

    let height = vp.height as f64;
    let natural = height / 2.0 - vp.latitude_screen_sign() * scale(vp) * y;
    let target = if vp.invert_vertical {
        height * cfg.bottom_margin
    } else {
        height * (1.0 - cfg.bottom_margin)
    };
    target - natural
}

pub fn update_horizon_offset(vp: &mut Viewport, cfg: &HorizonConfig) {
    vp.horizon_offset = horizon_offset(vp, cfg);
}

/// Projection bound to the frame rotations of one render context.
///
/// Ephemeris and catalog collaborators speak equatorial J2000; the mapper carries those
/// positions into the viewport's frame before projecting them.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateMapper {
    frames: FrameConverter,
}

impl CoordinateMapper {
    pub fn new(context: &RenderContext) -> Self {
        CoordinateMapper {
            frames: context.frames(),
        }
    }

    pub fn frames(&self) -> &FrameConverter {
        &self.frames
    }

    pub fn project(&self, pos: &SkyPosition, vp: &Viewport) -> Option<Pixel> {
        project(pos, vp)
    }

    pub fn unproject(&self, pixel: &Pixel, vp: &Viewport) -> Option<SkyPosition> {
        unproject(pixel, vp)
    }

    pub fn project_equatorial(&self, eq: &SkyPosition, vp: &Viewport) -> Option<Pixel> {
        let pos = self.frames.from_equatorial(eq, vp.coordinate_system);
        project(&pos, vp)
    }

    pub fn unproject_equatorial(&self, pixel: &Pixel, vp: &Viewport) -> Option<SkyPosition> {
        let pos = unproject(pixel, vp)?;
        Some(self.frames.to_equatorial(&pos, vp.coordinate_system))
    }

    /// Equatorial J2000 position of the viewport center.
    pub fn equatorial_center(&self, vp: &Viewport) -> SkyPosition {
        self.frames.to_equatorial(&vp.center(), vp.coordinate_system)
    }

    /// Center the viewport on an equatorial J2000 position.
    pub fn center_on_equatorial(&self, vp: &mut Viewport, eq: &SkyPosition) {
        let pos = self.frames.from_equatorial(eq, vp.coordinate_system);
        vp.set_center(pos.lon, pos.lat);
    }

    /// Center the viewport on the sky point under `pixel`.
    ///
    /// Return
    /// ------
    /// * [`SkyChartError::ProjectionDomain`] if the pixel is off the chart; the viewport is
    ///   left untouched
    pub fn center_on_pixel(&self, vp: &mut Viewport, pixel: &Pixel) -> Result<SkyPosition, SkyChartError> {
        let pos = unproject(pixel, vp).ok_or(SkyChartError::ProjectionDomain)?;
        vp.set_center(pos.lon, pos.lat);
        Ok(pos)
    }

    /// Angular radius, in pixels, of a disk of angular radius `radius` at the center.
    pub fn angular_to_pixels(&self, radius: Radian, vp: &Viewport) -> f64 {
        radius / vp.angular_pixel_size()
    }
}

#[cfg(test)]
mod projection_test {
    use super::*;
    use approx::assert_relative_eq;

    const ALL: [Projection; 4] = [
        Projection::Stereographic,
        Projection::Spherical,
        Projection::Cylindrical,
        Projection::Polar,
    ];

    fn viewport(projection: Projection, fov_deg: f64, lon: f64, lat: f64) -> Viewport {
        let mut vp = Viewport::new(1000, 800).unwrap();
        vp.projection = projection;
        vp.telescope.set_field_of_view(fov_deg.to_radians());
        vp.set_center(lon, lat);
        vp
    }

    fn assert_same_direction(a: &SkyPosition, b: &SkyPosition) {
        assert!(
            a.angular_distance(b) < 1e-9,
            "{a:?} and {b:?} differ by {}",
            a.angular_distance(b)
        );
    }

    #[test]
    fn test_center_maps_to_screen_center() {
        for projection in ALL {
            let vp = viewport(projection, 60.0, 1.0, 0.4);
            let px = project(&vp.center(), &vp).unwrap();
            assert_relative_eq!(px.x, 500.0, epsilon = 1e-9);
            assert_relative_eq!(px.y, 400.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_round_trip_inside_domain() {
        for projection in ALL {
            for &(lon0, lat0) in &[(0.0, 0.0), (2.0, 0.7), (5.0, -1.2), (1.0, 1.5)] {
                let mut vp = viewport(projection, 120.0, lon0, lat0);
                for flip in [false, true] {
                    vp.invert_horizontal = flip;
                    vp.invert_vertical = flip;
                    for i in -4..=4 {
                        for j in -4..=4 {
                            let p = SkyPosition::new(
                                lon0 + i as f64 * 0.15,
                                (lat0 + j as f64 * 0.1).clamp(-1.5, 1.5),
                            );
                            let px = project(&p, &vp).unwrap();
                            let back = unproject(&px, &vp).unwrap();
                            assert_same_direction(&p, &back);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_field_of_view_spans_the_width() {
        let fov = 90f64.to_radians();
        for projection in [Projection::Stereographic, Projection::Cylindrical, Projection::Polar] {
            let vp = viewport(projection, 90.0, 1.0, 0.0);
            let east = SkyPosition::new(1.0 + fov / 2.0, 0.0);
            let px = project(&east, &vp).unwrap();
            // longitude grows to the left
            assert_relative_eq!(px.x, 0.0, epsilon = 1e-9);
            assert_relative_eq!(px.y, 400.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_azimuth_grows_to_the_right() {
        let mut vp = viewport(Projection::Stereographic, 90.0, 1.0, 0.0);
        vp.coordinate_system = CoordinateSystem::Horizontal;
        let px = project(&SkyPosition::new(1.2, 0.0), &vp).unwrap();
        assert!(px.x > 500.0);
    }

    #[test]
    fn test_outside_domain_is_none() {
        let vp = viewport(Projection::Spherical, 170.0, 0.0, 0.0);
        assert!(unproject(&Pixel::new(0.0, 0.0), &vp).is_none());
        assert!(project(&SkyPosition::new(PI, 0.0), &vp).is_none());

        let vp = viewport(Projection::Stereographic, 90.0, 0.0, 0.0);
        assert!(project(&SkyPosition::new(PI, 0.0), &vp).is_none());

        let vp = viewport(Projection::Cylindrical, 300.0, 0.0, 0.0);
        assert!(unproject(&Pixel::new(500.0, -5000.0), &vp).is_none());
        assert!(unproject(&Pixel::new(f64::NAN, 1.0), &vp).is_none());

        let vp = viewport(Projection::Polar, 300.0, 0.0, 0.0);
        assert!(unproject(&Pixel::new(500.0 + 700.0, 400.0), &vp).is_none());
    }

    #[test]
    fn test_horizon_offset() {
        let cfg = HorizonConfig::default();
        let mut vp = viewport(Projection::Stereographic, 120.0, 3.0, 10f64.to_radians());
        vp.coordinate_system = CoordinateSystem::Horizontal;
        vp.layers.horizon_view = true;

        update_horizon_offset(&mut vp, &cfg);
        assert!(vp.horizon_offset != 0.0);
        let horizon = project(&SkyPosition::new(3.0, 0.0), &vp).unwrap();
        assert_relative_eq!(horizon.y, 800.0 * 0.9, epsilon = 1e-9);

        // round trip still holds with the offset
        let p = SkyPosition::new(3.3, 0.5);
        let back = unproject(&project(&p, &vp).unwrap(), &vp).unwrap();
        assert_same_direction(&p, &back);

        // narrow fields never use it
        vp.telescope.set_field_of_view(90f64.to_radians());
        update_horizon_offset(&mut vp, &cfg);
        assert_eq!(vp.horizon_offset, 0.0);

        // nor do high centers
        vp.telescope.set_field_of_view(120f64.to_radians());
        vp.set_center(3.0, 40f64.to_radians());
        assert!(!horizon_view_engaged(&vp, &cfg));
    }

    #[test]
    fn test_center_on_pixel_outside_is_an_error() {
        let context = RenderContext::new(
            crate::time::mjd_to_epoch(crate::constants::T2000),
            Default::default(),
        );
        let mapper = CoordinateMapper::new(&context);
        let mut vp = viewport(Projection::Spherical, 170.0, 0.0, 0.0);
        let before = vp.clone();
        assert_eq!(
            mapper.center_on_pixel(&mut vp, &Pixel::new(0.0, 0.0)),
            Err(SkyChartError::ProjectionDomain)
        );
        assert_eq!(vp, before);
        assert!(mapper.center_on_pixel(&mut vp, &Pixel::new(600.0, 300.0)).is_ok());
        assert_ne!(vp, before);
    }
}
