//! Everything a user can ask the chart to do from a menu, toolbar or shortcut.
//!
//! Commands are plain data; [`SkyChart::apply_command`](crate::skychart::SkyChart::apply_command)
//! is the single place that executes them.

use serde::{Deserialize, Serialize};

use crate::constants::{Degree, Magnitude};
use crate::projection::{Pixel, Projection};
use crate::quality::FidelityFlag;
use crate::ref_system::CoordinateSystem;
use crate::time::TimeRate;
use crate::viewport::{LabelMode, Layer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    ToggleLayer(Layer),
    ToggleTextures,
    ToggleDeepSkyTextures,
    ToggleMilkyWayFill,
    SetLabelMode(LabelMode),
    InvertHorizontal,
    InvertVertical,
    SetProjection(Projection),
    /// Change frame, keeping the same sky point at the center
    SetCoordinateSystem(CoordinateSystem),
    SetStarLimitingMagnitude(Magnitude),
    SetObjectLimitingMagnitude(Magnitude),
    SetFieldOfView(Degree),
    ZoomIn,
    ZoomOut,
    SetTimeRate(TimeRate),
    /// Resolve a name and keep the chart centered on it
    CenterOn(String),
    CenterAtPixel(Pixel),
    ClearBinding,
    ToggleLockedPanning,
    /// Clicks and hovers return a satellite rather than a star at the same spot
    SetPreferManmade(bool),
    DismissMenu,
}

impl Command {
    /// Fidelity flag set explicitly by this command, if any.
    pub fn fidelity_flag(&self) -> Option<FidelityFlag> {
        match self {
            Command::ToggleTextures => Some(FidelityFlag::Textures),
            Command::ToggleDeepSkyTextures => Some(FidelityFlag::DeepSkyTextures),
            Command::ToggleMilkyWayFill => Some(FidelityFlag::MilkyWayFill),
            Command::SetLabelMode(_) => Some(FidelityFlag::LabelMode),
            _ => None,
        }
    }
}

/// Result of a successfully applied [`Command`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandOutcome {
    pub rendered: bool,
}
