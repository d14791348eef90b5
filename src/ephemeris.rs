//! # Ephemeris collaborator
//!
//! The engine never computes planetary or minor-body positions itself: it asks an
//! [`EphemerisEngine`] for the **equatorial J2000** direction of a [`BodyId`] at a given time
//! and observer. This module defines that contract together with the
//! [`RenderContext`] triple (time, observer, options) the engine evaluates the sky with.
//!
//! Implementations must report failures as explicit
//! [`SkyChartError::EphemerisComputation`](crate::skychart_errors::SkyChartError::EphemerisComputation)
//! errors, never as malformed positions.

use hifitime::Epoch;

use crate::constants::{Magnitude, Radian};
use crate::observers::ObserverLocation;
use crate::ref_system::{FrameConverter, SkyPosition};
use crate::skychart_errors::SkyChartError;

/// Identifier of a minor body designation.
///
/// This can be:
/// - An asteroid number (e.g. `Int(433)`)
/// - A string designation (comet `"1P"`, provisional `"2015 AB"`, name `"Ceres"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectNumber {
    Int(u32),
    String(String),
}

impl std::fmt::Display for ObjectNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectNumber::Int(n) => write!(f, "{n}"),
            ObjectNumber::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for ObjectNumber {
    /// Pure digits become `Int`, anything else is kept as a string designation.
    fn from(s: &str) -> Self {
        match s.trim().parse::<u32>() {
            Ok(n) => ObjectNumber::Int(n),
            Err(_) => ObjectNumber::String(s.trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinorBodyKind {
    Asteroid,
    Comet,
    NearEarthObject,
    TransNeptunian,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MinorBody {
    pub kind: MinorBodyKind,
    pub designation: ObjectNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BodyId {
    Sun,
    Moon,
    Mercury,
    Venus,
    Earth,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    MinorBody(MinorBody),
}

impl BodyId {
    /// Major bodies visible from Earth, in the order the pick engine tries them.
    pub const SKY_BODIES: [BodyId; 10] = [
        BodyId::Sun,
        BodyId::Moon,
        BodyId::Mercury,
        BodyId::Venus,
        BodyId::Mars,
        BodyId::Jupiter,
        BodyId::Saturn,
        BodyId::Uranus,
        BodyId::Neptune,
        BodyId::Pluto,
    ];

    pub fn name(&self) -> String {
        match self {
            BodyId::Sun => "Sun".into(),
            BodyId::Moon => "Moon".into(),
            BodyId::Mercury => "Mercury".into(),
            BodyId::Venus => "Venus".into(),
            BodyId::Earth => "Earth".into(),
            BodyId::Mars => "Mars".into(),
            BodyId::Jupiter => "Jupiter".into(),
            BodyId::Saturn => "Saturn".into(),
            BodyId::Uranus => "Uranus".into(),
            BodyId::Neptune => "Neptune".into(),
            BodyId::Pluto => "Pluto".into(),
            BodyId::MinorBody(m) => m.designation.to_string(),
        }
    }

    /// Case-insensitive lookup among the major bodies.
    pub fn from_name(name: &str) -> Option<BodyId> {
        let name = name.trim();
        std::iter::once(BodyId::Earth)
            .chain(BodyId::SKY_BODIES)
            .find(|b| b.name().eq_ignore_ascii_case(name))
    }

    pub fn is_minor(&self) -> bool {
        matches!(self, BodyId::MinorBody(_))
    }
}

/// Apparent place of a body as returned by the ephemeris collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquatorialPosition {
    /// Right ascension / declination, equatorial J2000.
    pub position: SkyPosition,
    /// Distance to the observer in AU, when known.
    pub distance_au: Option<f64>,
    /// Apparent angular radius of the disk.
    pub angular_radius: Radian,
    pub magnitude: Option<Magnitude>,
}

/// Options forwarded untouched to the ephemeris collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct EphemerisOptions {
    pub topocentric: bool,
    pub apparent: bool,
    pub correct_refraction: bool,
}

impl Default for EphemerisOptions {
    fn default() -> Self {
        EphemerisOptions {
            topocentric: true,
            apparent: true,
            correct_refraction: false,
        }
    }
}

/// When and where the sky is evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    pub time: Epoch,
    pub observer: ObserverLocation,
    pub options: EphemerisOptions,
}

impl RenderContext {
    pub fn new(time: Epoch, observer: ObserverLocation) -> Self {
        RenderContext {
            time,
            observer,
            options: EphemerisOptions::default(),
        }
    }

    /// Frame rotations for this instant and site.
    pub fn frames(&self) -> FrameConverter {
        FrameConverter::new(&self.time, &self.observer)
    }
}

pub trait EphemerisEngine: Send + Sync {
    /// Equatorial J2000 position of `body` seen by `observer` at `time`.
    fn position_of(
        &self,
        body: &BodyId,
        time: &Epoch,
        observer: &ObserverLocation,
    ) -> Result<EquatorialPosition, SkyChartError>;
}

/// Orbital-element database used to recognise minor-body names.
pub trait MinorBodyCatalog: Send + Sync {
    fn find(&self, name: &str) -> Option<MinorBody>;
}
