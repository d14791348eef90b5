//! # Observer location
//!
//! Where the sky is evaluated from: geodetic longitude/latitude/elevation on a given body.
//! The body matters for two things only:
//!
//! - the ephemeris collaborator, which receives the whole [`ObserverLocation`];
//! - the **longitude convention** used when a longitude is shown to the user. Earth, the Moon
//!   and the Sun use east-positive longitudes; every other body uses the planetographic,
//!   west-positive convention, so the sign and the compass letter flip for them.
//!
//! Units
//! -----
//! * `longitude`, `latitude`: degrees (longitude stored east positive, whatever the body).
//! * `elevation`: kilometers.
//!
//! `NotNan<f64>` is used for every coordinate so an observer can be hashed and compared,
//! and a NaN can never enter the frame matrices.

use ordered_float::NotNan;

use crate::constants::{Degree, Kilometer, Radian};
use crate::ephemeris::BodyId;
use crate::skychart_errors::SkyChartError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LongitudeConvention {
    EastPositive,
    WestPositive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compass {
    North,
    South,
    East,
    West,
}

impl Compass {
    pub fn letter(&self) -> char {
        match self {
            Compass::North => 'N',
            Compass::South => 'S',
            Compass::East => 'E',
            Compass::West => 'W',
        }
    }
}

impl BodyId {
    /// Longitude convention of surface coordinates on this body.
    pub fn longitude_convention(&self) -> LongitudeConvention {
        match self {
            BodyId::Earth | BodyId::Moon | BodyId::Sun => LongitudeConvention::EastPositive,
            _ => LongitudeConvention::WestPositive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObserverLocation {
    /// Longitude in **degrees**, east positive.
    pub longitude: NotNan<f64>,

    /// Geodetic latitude in **degrees**.
    pub latitude: NotNan<f64>,

    /// Height above the reference surface in **kilometers**.
    pub elevation: NotNan<f64>,

    pub name: Option<String>,

    /// Body the observer stands on.
    pub body: BodyId,
}

impl ObserverLocation {
    /// Create an Earth-based observer.
    ///
    /// Arguments
    /// ---------
    /// * `longitude`: degrees, east positive
    /// * `latitude`: degrees, must lie in [−90, 90]
    /// * `elevation`: kilometers
    /// * `name`: optional site name
    ///
    /// Errors
    /// ------
    /// * [`SkyChartError::NaNValue`] if any coordinate is NaN
    /// * [`SkyChartError::InvalidConfig`] if the latitude is out of range
    pub fn new(
        longitude: Degree,
        latitude: Degree,
        elevation: Kilometer,
        name: Option<String>,
    ) -> Result<Self, SkyChartError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(SkyChartError::InvalidConfig(format!(
                "observer latitude out of range: {latitude}"
            )));
        }
        Ok(ObserverLocation {
            longitude: NotNan::new(longitude)?,
            latitude: NotNan::new(latitude)?,
            elevation: NotNan::new(elevation)?,
            name,
            body: BodyId::Earth,
        })
    }

    /// Same location, standing on another body.
    pub fn on_body(mut self, body: BodyId) -> Self {
        self.body = body;
        self
    }

    pub fn longitude_rad(&self) -> Radian {
        self.longitude.into_inner().to_radians()
    }

    pub fn latitude_rad(&self) -> Radian {
        self.latitude.into_inner().to_radians()
    }

    /// Longitude as it should be shown for this body: magnitude in degrees and compass letter.
    ///
    /// On east-positive bodies a stored `-3.7` reads `3.7 W`; on planetographic bodies the
    /// same stored value reads `3.7 E`, and a stored `+10` reads `10 W`.
    pub fn longitude_readout(&self) -> (Degree, Compass) {
        // normalise to (-180, 180]
        let raw = self.longitude.into_inner();
        let lon = if raw > -180.0 && raw <= 180.0 {
            raw
        } else {
            let wrapped = raw.rem_euclid(360.0);
            if wrapped > 180.0 {
                wrapped - 360.0
            } else {
                wrapped
            }
        };
        let shown = match self.body.longitude_convention() {
            LongitudeConvention::EastPositive => lon,
            LongitudeConvention::WestPositive => -lon,
        };
        let positive = match self.body.longitude_convention() {
            LongitudeConvention::EastPositive => Compass::East,
            LongitudeConvention::WestPositive => Compass::West,
        };
        let negative = match positive {
            Compass::East => Compass::West,
            _ => Compass::East,
        };
        if shown >= 0.0 {
            (shown, positive)
        } else {
            (-shown, negative)
        }
    }

    pub fn latitude_readout(&self) -> (Degree, Compass) {
        let lat = self.latitude.into_inner();
        if lat >= 0.0 {
            (lat, Compass::North)
        } else {
            (-lat, Compass::South)
        }
    }
}

impl Default for ObserverLocation {
    /// Greenwich, sea level.
    fn default() -> Self {
        ObserverLocation {
            longitude: NotNan::default(),
            latitude: NotNan::new(51.4769).unwrap_or_default(),
            elevation: NotNan::default(),
            name: Some("Greenwich".into()),
            body: BodyId::Earth,
        }
    }
}
