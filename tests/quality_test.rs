use approx::assert_relative_eq;

use skychart::config::QualityConfig;
use skychart::quality::{CalibrationState, FrameSample, ProfileKind, QualityGovernor};
use skychart::viewport::{FidelityFlags, LabelMode, LineMode, Viewport};

fn wide_viewport(fov_deg: f64) -> Viewport {
    let mut vp = Viewport::default();
    vp.set_field_of_view(fov_deg.to_radians(), 1e-3, 6.0);
    vp
}

#[test]
fn test_slow_machine_calibrates_once_into_fast_mode() {
    let mut governor = QualityGovernor::new(QualityConfig::default(), FidelityFlags::default());
    let vp = wide_viewport(120.0);

    let degraded = governor.on_interaction_start(&vp);
    assert_eq!(degraded.kind, ProfileKind::Degraded);

    // 250 frames at 3 fps
    let samples: Vec<FrameSample> = (0..250).map(|_| governor.sample_frame(1000.0 / 3.0)).collect();
    let calibrated: Vec<_> = samples
        .iter()
        .filter_map(|s| match s {
            FrameSample::Calibrated { fps, prefer_fast_mode } => Some((*fps, *prefer_fast_mode)),
            _ => None,
        })
        .collect();
    assert_eq!(calibrated.len(), 1);
    assert_relative_eq!(calibrated[0].0, 3.0, epsilon = 1e-6);
    assert!(calibrated[0].1);
    assert!(governor.prefer_fast_mode());

    let mut end = vp.clone();
    degraded.apply(&mut end);
    governor.on_interaction_end(&mut end, &degraded);

    // frame 251, in a new wide session, does not restart calibration
    governor.on_interaction_start(&vp);
    assert_eq!(governor.sample_frame(1000.0 / 3.0), FrameSample::CalibrationSkipped);
    assert!(matches!(governor.calibration(), CalibrationState::Done { .. }));
}

#[test]
fn test_fast_mode_degrades_even_narrow_fields() {
    let config = QualityConfig {
        calibration_max_frames: 5,
        ..QualityConfig::default()
    };
    let mut governor = QualityGovernor::new(config, FidelityFlags::default());

    let wide = governor.on_interaction_start(&wide_viewport(150.0));
    for _ in 0..5 {
        governor.sample_frame(500.0);
    }
    let mut vp = wide_viewport(150.0);
    wide.apply(&mut vp);
    governor.on_interaction_end(&mut vp, &wide);
    assert!(governor.prefer_fast_mode());

    let narrow = governor.on_interaction_start(&wide_viewport(10.0));
    assert!(!narrow.flags.textures);
    assert!(!narrow.flags.milky_way_fill);
    assert!(!narrow.flags.deep_sky_textures);
    assert_eq!(narrow.flags.label_mode, LabelMode::Fast);
    assert_eq!(narrow.flags.line_mode, LineMode::Fast);
}

#[test]
fn test_fast_machine_keeps_full_profile_at_narrow_fields() {
    let mut governor = QualityGovernor::new(QualityConfig::default(), FidelityFlags::default());
    let degraded = governor.on_interaction_start(&wide_viewport(20.0));
    assert_eq!(degraded.flags, FidelityFlags::default());
    assert_eq!(governor.sample_frame(16.0), FrameSample::Ignored);
    assert_eq!(governor.calibration(), CalibrationState::Pending);
}
