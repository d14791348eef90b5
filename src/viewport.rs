//! # Viewport
//!
//! The single piece of state every component of the engine reads or mutates: screen size,
//! where the chart is centered, how it is projected, which telescope defines the field of
//! view, which layers are drawn and at which fidelity.
//!
//! The center always satisfies the two chart invariants: longitude wrapped into `[0, 2π)`
//! and latitude clamped to `[−π/2, π/2]`. It is private for that reason and only changes
//! through [`Viewport::set_center`] and [`Viewport::pan_by`].

use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::constants::{Degree, Magnitude, Millimeter, Radian};
use crate::projection::Projection;
use crate::ref_system::{CoordinateSystem, SkyPosition};
use crate::skychart_errors::SkyChartError;

/// Optical train defining the field of view.
///
/// ```text
/// fov = apparent_field × ocular_focal_length / focal_length
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Telescope {
    pub focal_length: Millimeter,
    pub ocular_focal_length: Millimeter,
    /// Apparent field of the ocular, in degrees
    pub apparent_field: Degree,
}

impl Default for Telescope {
    /// A naked-eye like setup giving a 90° field.
    fn default() -> Self {
        Telescope {
            focal_length: 10.0,
            ocular_focal_length: 10.0,
            apparent_field: 90.0,
        }
    }
}

impl Telescope {
    pub fn field_of_view(&self) -> Radian {
        (self.apparent_field * self.ocular_focal_length / self.focal_length).to_radians()
    }

    /// Change the telescope focal length so the field of view becomes `fov`.
    pub fn set_field_of_view(&mut self, fov: Radian) {
        self.focal_length = self.apparent_field * self.ocular_focal_length / fov.to_degrees();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelMode {
    Full,
    /// Coarse labels, no collision avoidance
    Fast,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineMode {
    Antialiased,
    Fast,
}

/// Rendering-fidelity flags, the part of the viewport a [`QualityProfile`](crate::quality::QualityProfile) controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FidelityFlags {
    pub textures: bool,
    pub deep_sky_textures: bool,
    pub milky_way_fill: bool,
    pub label_mode: LabelMode,
    pub line_mode: LineMode,
}

impl Default for FidelityFlags {
    fn default() -> Self {
        FidelityFlags {
            textures: true,
            deep_sky_textures: true,
            milky_way_fill: true,
            label_mode: LabelMode::Full,
            line_mode: LineMode::Antialiased,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    Grid,
    Legend,
    Labels,
    MilkyWay,
    ConstellationLines,
    Comets,
    Asteroids,
    HorizonView,
}

/// Optional layers drawn on top of the stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Layers {
    pub grid: bool,
    pub legend: bool,
    pub labels: bool,
    pub milky_way: bool,
    pub constellation_lines: bool,
    pub comets: bool,
    pub asteroids: bool,
    pub horizon_view: bool,
}

impl Default for Layers {
    fn default() -> Self {
        Layers {
            grid: true,
            legend: true,
            labels: true,
            milky_way: true,
            constellation_lines: true,
            comets: false,
            asteroids: false,
            horizon_view: false,
        }
    }
}

impl Layers {
    pub fn get(&self, layer: Layer) -> bool {
        match layer {
            Layer::Grid => self.grid,
            Layer::Legend => self.legend,
            Layer::Labels => self.labels,
            Layer::MilkyWay => self.milky_way,
            Layer::ConstellationLines => self.constellation_lines,
            Layer::Comets => self.comets,
            Layer::Asteroids => self.asteroids,
            Layer::HorizonView => self.horizon_view,
        }
    }

    pub fn set(&mut self, layer: Layer, on: bool) {
        let slot = match layer {
            Layer::Grid => &mut self.grid,
            Layer::Legend => &mut self.legend,
            Layer::Labels => &mut self.labels,
            Layer::MilkyWay => &mut self.milky_way,
            Layer::ConstellationLines => &mut self.constellation_lines,
            Layer::Comets => &mut self.comets,
            Layer::Asteroids => &mut self.asteroids,
            Layer::HorizonView => &mut self.horizon_view,
        };
        *slot = on;
    }

    /// Flip a layer and return its new state.
    pub fn toggle(&mut self, layer: Layer) -> bool {
        let on = !self.get(layer);
        self.set(layer, on);
        on
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    center: SkyPosition,
    pub projection: Projection,
    pub coordinate_system: CoordinateSystem,
    pub telescope: Telescope,
    /// Mirror left/right
    pub invert_horizontal: bool,
    /// Mirror top/bottom
    pub invert_vertical: bool,
    pub star_limiting_magnitude: Magnitude,
    /// Limiting magnitude of deep-sky and minor objects
    pub object_limiting_magnitude: Magnitude,
    pub layers: Layers,
    pub fidelity: FidelityFlags,
    /// Vertical shift of the projection center in pixels, non-zero only in horizon view
    pub horizon_offset: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            width: 800,
            height: 600,
            center: SkyPosition { lon: 0.0, lat: 0.0 },
            projection: Projection::Stereographic,
            coordinate_system: CoordinateSystem::Equatorial,
            telescope: Telescope::default(),
            invert_horizontal: false,
            invert_vertical: false,
            star_limiting_magnitude: 6.5,
            object_limiting_magnitude: 11.0,
            layers: Layers::default(),
            fidelity: FidelityFlags::default(),
            horizon_offset: 0.0,
        }
    }
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Result<Self, SkyChartError> {
        if width == 0 || height == 0 {
            return Err(SkyChartError::InvalidConfig(format!(
                "viewport must have a non-empty area, got {width}x{height}"
            )));
        }
        Ok(Viewport {
            width,
            height,
            ..Viewport::default()
        })
    }

    pub fn center(&self) -> SkyPosition {
        self.center
    }

    /// Move the center, wrapping the longitude and clamping the latitude.
    pub fn set_center(&mut self, lon: Radian, lat: Radian) {
        self.center = SkyPosition::new(lon, lat);
    }

    pub fn pan_by(&mut self, dlon: Radian, dlat: Radian) {
        self.set_center(self.center.lon + dlon, self.center.lat + dlat);
    }

    pub fn field_of_view(&self) -> Radian {
        self.telescope.field_of_view()
    }

    /// Set the field of view, clamped to `[min, max]`.
    pub fn set_field_of_view(&mut self, fov: Radian, min: Radian, max: Radian) {
        let fov = if fov.is_finite() { fov.clamp(min, max) } else { max };
        self.telescope.set_field_of_view(fov);
    }

    /// Radians per pixel along the horizontal axis.
    pub fn angular_pixel_size(&self) -> Radian {
        self.field_of_view() / self.width as f64
    }

    /// Sign applied to longitude deltas going right on screen.
    ///
    /// Longitude grows to the left in every celestial frame, as the sky is seen from
    /// inside the sphere; azimuth grows to the right.
    pub fn longitude_screen_sign(&self) -> f64 {
        let base = match self.coordinate_system {
            CoordinateSystem::Horizontal => 1.0,
            _ => -1.0,
        };
        if self.invert_horizontal {
            -base
        } else {
            base
        }
    }

    /// Sign applied to latitude deltas going up on screen.
    pub fn latitude_screen_sign(&self) -> f64 {
        if self.invert_vertical {
            -1.0
        } else {
            1.0
        }
    }

    /// Copy everything that defines *where* the chart looks from `other`.
    pub fn sync_geometry_from(&mut self, other: &Viewport) {
        self.width = other.width;
        self.height = other.height;
        self.center = other.center;
        self.projection = other.projection;
        self.coordinate_system = other.coordinate_system;
        self.telescope = other.telescope;
        self.invert_horizontal = other.invert_horizontal;
        self.invert_vertical = other.invert_vertical;
        self.horizon_offset = other.horizon_offset;
    }

    /// Hash of the geometry, used to invalidate pixel-keyed caches.
    pub fn geometry_fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.width.hash(&mut hasher);
        self.height.hash(&mut hasher);
        self.center.lon.to_bits().hash(&mut hasher);
        self.center.lat.to_bits().hash(&mut hasher);
        self.projection.hash(&mut hasher);
        self.coordinate_system.hash(&mut hasher);
        self.field_of_view().to_bits().hash(&mut hasher);
        self.invert_horizontal.hash(&mut hasher);
        self.invert_vertical.hash(&mut hasher);
        self.horizon_offset.to_bits().hash(&mut hasher);
        self.star_limiting_magnitude.to_bits().hash(&mut hasher);
        self.object_limiting_magnitude.to_bits().hash(&mut hasher);
        hasher.finish()
    }
}
