//! # Quality governor
//!
//! Keeps interaction responsive by swapping the viewport's [`FidelityFlags`] between two
//! live profiles:
//!
//! * **baseline**: the last explicit, full-fidelity configuration;
//! * **degraded**: synthesized from the baseline when a pan or zoom starts, with the costliest
//!   flags disabled.
//!
//! The first wide-field interaction session also runs a one-shot calibration: frame times
//! are accumulated until [`QualityConfig::calibration_max_frames`] frames or
//! [`QualityConfig::calibration_max_ms`] milliseconds have elapsed; a resulting frame rate
//! under [`QualityConfig::min_fps`] switches the session to *fast mode*, where every
//! later interaction degrades everything at once.
//!
//! Flags the user sets explicitly are **overrides**: the degraded profile never touches
//! them, and ending an interaction merges back whatever the user changed meanwhile.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::config::QualityConfig;
use crate::viewport::{FidelityFlags, LabelMode, LineMode, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FidelityFlag {
    Textures,
    DeepSkyTextures,
    MilkyWayFill,
    LabelMode,
    LineMode,
}

impl FidelityFlag {
    pub const ALL: [FidelityFlag; 5] = [
        FidelityFlag::Textures,
        FidelityFlag::DeepSkyTextures,
        FidelityFlag::MilkyWayFill,
        FidelityFlag::LabelMode,
        FidelityFlag::LineMode,
    ];
}

impl FidelityFlags {
    /// Copy a single flag from `other`.
    pub fn copy_flag(&mut self, other: &FidelityFlags, flag: FidelityFlag) {
        match flag {
            FidelityFlag::Textures => self.textures = other.textures,
            FidelityFlag::DeepSkyTextures => self.deep_sky_textures = other.deep_sky_textures,
            FidelityFlag::MilkyWayFill => self.milky_way_fill = other.milky_way_fill,
            FidelityFlag::LabelMode => self.label_mode = other.label_mode,
            FidelityFlag::LineMode => self.line_mode = other.line_mode,
        }
    }

    pub fn same_flag(&self, other: &FidelityFlags, flag: FidelityFlag) -> bool {
        match flag {
            FidelityFlag::Textures => self.textures == other.textures,
            FidelityFlag::DeepSkyTextures => self.deep_sky_textures == other.deep_sky_textures,
            FidelityFlag::MilkyWayFill => self.milky_way_fill == other.milky_way_fill,
            FidelityFlag::LabelMode => self.label_mode == other.label_mode,
            FidelityFlag::LineMode => self.line_mode == other.line_mode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Baseline,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityProfile {
    pub kind: ProfileKind,
    pub flags: FidelityFlags,
    /// Time a frame may take under this profile
    pub frame_budget_ms: f64,
}

impl QualityProfile {
    pub fn apply(&self, vp: &mut Viewport) {
        vp.fidelity = self.flags;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationState {
    /// No wide-field session seen yet
    Pending,
    Running { frames: u32, elapsed_ms: f64 },
    Done { fps: f64 },
}

/// What [`QualityGovernor::sample_frame`] did with a frame time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameSample {
    /// Calibration has not started
    Ignored,
    Calibrating { frames: u32, elapsed_ms: f64 },
    Calibrated { fps: f64, prefer_fast_mode: bool },
    /// Calibration already ran once
    CalibrationSkipped,
}

#[derive(Debug, Clone)]
pub struct QualityGovernor {
    config: QualityConfig,
    baseline: QualityProfile,
    overrides: HashSet<FidelityFlag>,
    calibration: CalibrationState,
    prefer_fast_mode: bool,
    in_session: bool,
    budget_overruns: u64,
}

impl QualityGovernor {
    pub fn new(config: QualityConfig, initial: FidelityFlags) -> Self {
        let baseline = QualityProfile {
            kind: ProfileKind::Baseline,
            flags: initial,
            frame_budget_ms: config.baseline_budget_ms,
        };
        QualityGovernor {
            config,
            baseline,
            overrides: HashSet::new(),
            calibration: CalibrationState::Pending,
            prefer_fast_mode: false,
            in_session: false,
            budget_overruns: 0,
        }
    }

    pub fn baseline(&self) -> &QualityProfile {
        &self.baseline
    }

    pub fn prefer_fast_mode(&self) -> bool {
        self.prefer_fast_mode
    }

    pub fn calibration(&self) -> CalibrationState {
        self.calibration
    }

    /// Sampled frames slower than the budget of the profile they were drawn with.
    pub fn budget_overruns(&self) -> u64 {
        self.budget_overruns
    }

    pub fn is_override(&self, flag: FidelityFlag) -> bool {
        self.overrides.contains(&flag)
    }

    /// Record that the user explicitly set `flag` to the value it has in `vp`.
    ///
    /// The value becomes part of the baseline and is never degraded automatically again.
    pub fn record_user_override(&mut self, flag: FidelityFlag, vp: &Viewport) {
        self.overrides.insert(flag);
        self.baseline.flags.copy_flag(&vp.fidelity, flag);
    }

    /// Enter an interaction session and return the profile to render it with.
    ///
    /// The caller applies the returned profile to the viewport it renders and hands it
    /// back to [`QualityGovernor::on_interaction_end`].
    pub fn on_interaction_start(&mut self, vp: &Viewport) -> QualityProfile {
        if !self.in_session {
            self.baseline.flags = vp.fidelity;
            self.in_session = true;
        }

        let fov = vp.field_of_view().to_degrees();
        if self.calibration == CalibrationState::Pending && fov > self.config.large_fov_deg {
            debug!(fov, "starting frame-rate calibration");
            self.calibration = CalibrationState::Running {
                frames: 0,
                elapsed_ms: 0.0,
            };
        }

        let degraded = self.degrade(fov);
        debug!(flags = ?degraded.flags, fast = self.prefer_fast_mode, "degraded profile");
        degraded
    }

    fn degrade(&self, fov: f64) -> QualityProfile {
        let mut flags = self.baseline.flags;
        let heavy = self.prefer_fast_mode || fov > self.config.large_fov_deg;

        if self.prefer_fast_mode || fov > self.config.texture_fov_deg {
            flags.textures = false;
        }
        if heavy {
            flags.milky_way_fill = false;
            flags.deep_sky_textures = false;
            flags.line_mode = LineMode::Fast;
            if flags.label_mode == LabelMode::Full {
                flags.label_mode = LabelMode::Fast;
            }
        }
        for flag in &self.overrides {
            flags.copy_flag(&self.baseline.flags, *flag);
        }

        QualityProfile {
            kind: ProfileKind::Degraded,
            flags,
            frame_budget_ms: self.config.degraded_budget_ms,
        }
    }

    /// Leave the interaction session and restore the baseline on `vp`.
    ///
    /// Any flag whose value in `vp` no longer matches `degraded` was changed by the user
    /// during the session: it is promoted to an override and kept.
    pub fn on_interaction_end(&mut self, vp: &mut Viewport, degraded: &QualityProfile) {
        for flag in FidelityFlag::ALL {
            if !vp.fidelity.same_flag(&degraded.flags, flag) {
                debug!(?flag, "keeping flag changed during interaction");
                self.record_user_override(flag, vp);
            }
        }
        self.baseline.apply(vp);
        self.in_session = false;
    }

    /// Feed the duration of one interactive frame.
    pub fn sample_frame(&mut self, elapsed_ms: f64) -> FrameSample {
        let budget = if self.in_session {
            self.config.degraded_budget_ms
        } else {
            self.baseline.frame_budget_ms
        };
        if elapsed_ms > budget {
            self.budget_overruns += 1;
            debug!(elapsed_ms, budget, "frame over budget");
        }

        match self.calibration {
            CalibrationState::Pending => FrameSample::Ignored,
            CalibrationState::Done { .. } => FrameSample::CalibrationSkipped,
            CalibrationState::Running { frames, elapsed_ms: total } => {
                let frames = frames + 1;
                let total = total + elapsed_ms.max(0.0);

                if frames >= self.config.calibration_max_frames
                    || total >= self.config.calibration_max_ms
                {
                    let fps = if total > 0.0 {
                        frames as f64 / (total / 1000.0)
                    } else {
                        f64::INFINITY
                    };
                    self.prefer_fast_mode = fps < self.config.min_fps;
                    self.calibration = CalibrationState::Done { fps };
                    info!(fps, frames, fast_mode = self.prefer_fast_mode, "calibration finished");
                    FrameSample::Calibrated {
                        fps,
                        prefer_fast_mode: self.prefer_fast_mode,
                    }
                } else {
                    self.calibration = CalibrationState::Running {
                        frames,
                        elapsed_ms: total,
                    };
                    FrameSample::Calibrating {
                        frames,
                        elapsed_ms: total,
                    }
                }
            }
        }
    }
}
