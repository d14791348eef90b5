//! Tuning knobs of the navigation engine.
//!
//! Every threshold used by the interaction state machine, the quality governor, the
//! clock and the external name resolver lives here, grouped by component. The
//! [`Default`] values are the ones the engine has always shipped with; a host can
//! override any subset from a TOML document:
//!
//! ```toml
//! [interaction]
//! zoom_factor = 2.0
//!
//! [clock]
//! live_interval_ms = 5000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::Degree;
use crate::skychart_errors::SkyChartError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Pointer travel, in pixels, before a press becomes a drag
    pub drag_threshold_px: f64,
    /// Pixels panned by one arrow-key press
    pub key_pan_px: f64,
    /// Focal length multiplier applied per wheel notch
    pub zoom_factor: f64,
    /// Smallest field of view reachable by zooming (1 arcminute)
    pub min_fov_deg: Degree,
    pub max_fov_deg: Degree,
    /// Quiet time after the last wheel notch before full fidelity comes back
    pub wheel_debounce_ms: u64,
    /// Radius of the solar-system hit test, never smaller than this
    pub min_hit_radius_px: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        InteractionConfig {
            drag_threshold_px: 3.0,
            key_pan_px: 25.0,
            zoom_factor: 1.5,
            min_fov_deg: 1.0 / 60.0,
            max_fov_deg: 300.0,
            wheel_debounce_ms: 300,
            min_hit_radius_px: 6.0,
        }
    }
}

/// Horizon view: vertical offset that keeps the horizon near the bottom of wide views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizonConfig {
    /// Center altitude below which the offset applies
    pub max_center_lat_deg: Degree,
    /// Field of view above which the offset applies
    pub min_fov_deg: Degree,
    /// Distance of the horizon from the bottom edge, as a fraction of the height
    pub bottom_margin: f64,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        HorizonConfig {
            max_center_lat_deg: 25.0,
            min_fov_deg: 100.0,
            bottom_margin: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Field of view above which calibration starts and costly layers are degraded
    pub large_fov_deg: Degree,
    /// Field of view above which textures are always off while interacting
    pub texture_fov_deg: Degree,
    pub calibration_max_frames: u32,
    pub calibration_max_ms: f64,
    /// Below this frame rate the session switches to fast mode for good
    pub min_fps: f64,
    pub baseline_budget_ms: f64,
    pub degraded_budget_ms: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        QualityConfig {
            large_fov_deg: 100.0,
            texture_fov_deg: 40.0,
            calibration_max_frames: 200,
            calibration_max_ms: 3000.0,
            min_fps: 5.0,
            baseline_budget_ms: 200.0,
            degraded_budget_ms: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub live_interval_ms: u64,
    /// Interval used while a central object binding is active
    pub tracking_interval_ms: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig {
            live_interval_ms: 2000,
            tracking_interval_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub enabled: bool,
    /// Sesame endpoint; the url-encoded object name is appended
    pub sesame_url: String,
    pub timeout_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            enabled: true,
            sesame_url: "https://cds.unistra.fr/cgi-bin/nph-sesame/-oI/SNV?".into(),
            timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub interaction: InteractionConfig,
    pub horizon: HorizonConfig,
    pub quality: QualityConfig,
    pub clock: ClockConfig,
    pub resolver: ResolverConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML document. Missing keys keep their default value.
    pub fn from_toml_str(contents: &str) -> Result<Self, SkyChartError> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SkyChartError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Reject settings that would break an engine invariant.
    pub fn validate(&self) -> Result<(), SkyChartError> {
        let i = &self.interaction;
        if !(i.zoom_factor > 1.0) {
            return Err(SkyChartError::InvalidConfig(format!(
                "zoom_factor must be greater than 1, got {}",
                i.zoom_factor
            )));
        }
        if !(i.min_fov_deg > 0.0 && i.min_fov_deg < i.max_fov_deg) {
            return Err(SkyChartError::InvalidConfig(format!(
                "invalid field of view range [{}, {}]",
                i.min_fov_deg, i.max_fov_deg
            )));
        }
        if i.drag_threshold_px < 0.0 || i.min_hit_radius_px < 0.0 {
            return Err(SkyChartError::InvalidConfig(
                "pixel thresholds must be positive".into(),
            ));
        }
        let q = &self.quality;
        if q.texture_fov_deg > q.large_fov_deg {
            return Err(SkyChartError::InvalidConfig(
                "texture_fov_deg must not exceed large_fov_deg".into(),
            ));
        }
        if q.calibration_max_frames == 0 || !(q.calibration_max_ms > 0.0) {
            return Err(SkyChartError::InvalidConfig(
                "calibration window must be non-empty".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.horizon.bottom_margin) {
            return Err(SkyChartError::InvalidConfig(
                "horizon bottom_margin must lie in [0, 1)".into(),
            ));
        }
        if self.clock.live_interval_ms == 0 || self.clock.tracking_interval_ms == 0 {
            return Err(SkyChartError::InvalidConfig(
                "clock intervals must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn wheel_debounce(&self) -> Duration {
        Duration::from_millis(self.interaction.wheel_debounce_ms)
    }
}
