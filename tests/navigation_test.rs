use std::f64::consts::FRAC_PI_2;
use std::time::{Duration, Instant};

use approx::assert_relative_eq;

use skychart::command::Command;
use skychart::constants::DPI;
use skychart::interaction::{InputEvent, InteractionState, PointerButton};
use skychart::projection::Pixel;
use skychart::ref_system::CoordinateSystem;
use skychart::viewport::Viewport;

mod common;
use common::{harness, MockCatalog, MockEphemeris};

fn press(x: f64, y: f64) -> InputEvent {
    InputEvent::PointerDown {
        at: Pixel::new(x, y),
        button: PointerButton::Primary,
    }
}

fn drag(x: f64, y: f64) -> InputEvent {
    InputEvent::PointerMove {
        at: Pixel::new(x, y),
        button_held: true,
    }
}

fn release(x: f64, y: f64) -> InputEvent {
    InputEvent::PointerUp { at: Pixel::new(x, y) }
}

#[test]
fn test_drag_right_and_up_on_equatorial_chart() {
    let mut h = harness(MockCatalog::default(), MockEphemeris::default());
    let chart = &mut h.chart;
    let start = chart.viewport().center();
    let step = FRAC_PI_2 / 800.0;
    let now = Instant::now();

    chart.handle_event(press(400.0, 300.0), now);
    chart.handle_event(drag(450.0, 280.0), now);
    assert_eq!(chart.interaction_state(), InteractionState::Panning);
    chart.handle_event(release(450.0, 280.0), now);
    assert_eq!(chart.interaction_state(), InteractionState::Idle);

    let end = chart.viewport().center();
    assert!(end.lon < start.lon);
    assert!(end.lat > start.lat);
    assert_relative_eq!(start.lon - end.lon, 50.0 * step, epsilon = 1e-12);
    assert_relative_eq!(end.lat - start.lat, 20.0 * step, epsilon = 1e-12);
}

#[test]
fn test_drag_direction_flips_in_horizontal_and_inverted_charts() {
    let mut h = harness(MockCatalog::default(), MockEphemeris::default());
    let chart = &mut h.chart;
    chart
        .apply_command(Command::SetCoordinateSystem(CoordinateSystem::Horizontal))
        .unwrap();
    let now = Instant::now();

    let start = chart.viewport().center();
    chart.handle_event(press(400.0, 300.0), now);
    chart.handle_event(drag(420.0, 300.0), now);
    chart.handle_event(release(420.0, 300.0), now);
    let azimuth_step = chart.viewport().center().lon - start.lon;
    assert!(azimuth_step > 0.0 || azimuth_step < -std::f64::consts::PI);

    chart.apply_command(Command::InvertVertical).unwrap();
    let start = chart.viewport().center();
    chart.handle_event(press(400.0, 300.0), now);
    chart.handle_event(drag(400.0, 280.0), now);
    chart.handle_event(release(400.0, 280.0), now);
    assert!(chart.viewport().center().lat < start.lat);
}

#[test]
fn test_center_stays_in_range_whatever_the_drag() {
    let mut h = harness(MockCatalog::default(), MockEphemeris::default());
    let chart = &mut h.chart;
    let now = Instant::now();

    chart.handle_event(press(400.0, 300.0), now);
    for k in 1..200 {
        let x = 400.0 + 37.0 * k as f64;
        let y = 300.0 - 29.0 * k as f64;
        chart.handle_event(drag(x, y), now);
        let center = chart.viewport().center();
        assert!((0.0..DPI).contains(&center.lon), "lon {}", center.lon);
        assert!((-FRAC_PI_2..=FRAC_PI_2).contains(&center.lat), "lat {}", center.lat);
    }
    assert_eq!(chart.viewport().center().lat, FRAC_PI_2);
}

#[test]
fn test_interaction_renders_degraded_then_full() {
    let mut h = harness(MockCatalog::default(), MockEphemeris::default());
    let now = Instant::now();

    h.chart.handle_event(press(400.0, 300.0), now);
    h.chart.handle_event(drag(420.0, 300.0), now);
    // 90° is above the texture threshold
    assert!(!h.chart.viewport().fidelity.textures);
    assert!(h.chart.viewport().layers.grid);
    assert!(h.chart.gate().is_busy());
    let during = h.frames();

    h.chart.handle_event(release(420.0, 300.0), now);
    assert!(h.chart.viewport().fidelity.textures);
    assert!(!h.chart.gate().is_busy());
    assert_eq!(h.frames(), during + 1);
}

#[test]
fn test_fidelity_toggled_during_drag_survives_release() {
    let mut h = harness(MockCatalog::default(), MockEphemeris::default());
    let chart = &mut h.chart;
    let now = Instant::now();

    chart.handle_event(press(400.0, 300.0), now);
    chart.handle_event(drag(420.0, 300.0), now);
    chart.apply_command(Command::ToggleTextures).unwrap();
    chart.apply_command(Command::ToggleLayer(skychart::viewport::Layer::Grid)).unwrap();
    chart.handle_event(release(420.0, 300.0), now);

    assert!(chart.viewport().fidelity.textures);
    assert!(!chart.viewport().layers.grid);

    // the explicit choice is not degraded again
    chart.handle_event(press(400.0, 300.0), now);
    chart.handle_event(drag(420.0, 300.0), now);
    assert!(chart.viewport().fidelity.textures);
    chart.handle_event(release(420.0, 300.0), now);
}

#[test]
fn test_wheel_zoom_settles_after_debounce() {
    let mut h = harness(MockCatalog::default(), MockEphemeris::default());
    let chart = &mut h.chart;
    let t0 = Instant::now();
    let fov = chart.viewport().field_of_view();

    chart.handle_event(
        InputEvent::Wheel {
            at: Pixel::new(400.0, 300.0),
            notches: 2,
        },
        t0,
    );
    assert_eq!(chart.interaction_state(), InteractionState::Zooming);
    assert_relative_eq!(chart.viewport().field_of_view(), fov / 2.25, epsilon = 1e-12);

    // the clock tick expires the zoom first, then runs
    chart.tick(t0 + Duration::from_millis(350));
    assert_eq!(chart.interaction_state(), InteractionState::Idle);
    assert!(!chart.gate().is_busy());
}

#[test]
fn test_wheel_zoom_settles_without_the_clock() {
    let mut h = harness(MockCatalog::default(), MockEphemeris::default());
    let chart = &mut h.chart;
    let t0 = Instant::now();
    let wheel = InputEvent::Wheel {
        at: Pixel::new(400.0, 300.0),
        notches: 1,
    };

    chart.handle_event(wheel, t0);
    assert!(!chart.viewport().fidelity.textures);

    // the next input after the quiet period sees full fidelity
    let response = chart.handle_event(
        InputEvent::PointerMove {
            at: Pixel::new(400.0, 300.0),
            button_held: false,
        },
        t0 + Duration::from_secs(5),
    );
    assert_eq!(chart.interaction_state(), InteractionState::Idle);
    assert!(response.hover.is_some());
    assert!(chart.viewport().fidelity.textures);
    assert!(!chart.gate().is_busy());

    // or a host timer, with no input at all
    chart.handle_event(wheel, t0 + Duration::from_secs(6));
    assert!(!chart.settle_zoom(t0 + Duration::from_millis(6_100)));
    assert!(chart.settle_zoom(t0 + Duration::from_millis(6_400)));
    assert_eq!(chart.interaction_state(), InteractionState::Idle);
    assert!(!chart.gate().is_busy());
}

#[test]
fn test_hover_readout_and_menu() {
    let mut h = harness(MockCatalog::default(), MockEphemeris::default());
    let chart = &mut h.chart;
    let now = Instant::now();
    let hover = InputEvent::PointerMove {
        at: Pixel::new(400.0, 300.0),
        button_held: false,
    };

    let readout = chart.handle_event(hover, now).hover.unwrap();
    assert!(readout.equatorial.angular_distance(&chart.equatorial_center()) < 1e-9);
    assert!(readout.nearest.is_none());

    let menu = chart.handle_event(
        InputEvent::PointerDown {
            at: Pixel::new(5.0, 5.0),
            button: PointerButton::Secondary,
        },
        now,
    );
    assert_eq!(menu.menu_at, Some(Pixel::new(5.0, 5.0)));
    assert!(chart.handle_event(hover, now).hover.is_none());

    chart.apply_command(Command::DismissMenu).unwrap();
    assert_eq!(chart.interaction_state(), InteractionState::Idle);
    assert!(chart.handle_event(hover, now).hover.is_some());
}

#[test]
fn test_hover_off_the_chart_has_no_readout() {
    let mut h = harness(MockCatalog::default(), MockEphemeris::default());
    let chart = &mut h.chart;
    chart
        .apply_command(Command::SetProjection(skychart::projection::Projection::Spherical))
        .unwrap();
    chart.apply_command(Command::SetFieldOfView(20.0)).unwrap();

    let response = chart.handle_event(
        InputEvent::PointerMove {
            at: Pixel::new(-3000.0, 300.0),
            button_held: false,
        },
        Instant::now(),
    );
    assert!(response.hover.is_none());
    assert_eq!(chart.interaction_state(), InteractionState::Idle);
}

#[test]
fn test_locked_panning_from_menu() {
    let mut h = harness(MockCatalog::default(), MockEphemeris::default());
    let chart = &mut h.chart;
    let now = Instant::now();
    let start = chart.viewport().center();
    let free = |x: f64| InputEvent::PointerMove {
        at: Pixel::new(x, 300.0),
        button_held: false,
    };

    chart.apply_command(Command::ToggleLockedPanning).unwrap();
    assert_eq!(chart.interaction_state(), InteractionState::LockedPanning);
    chart.handle_event(free(400.0), now);
    chart.handle_event(free(300.0), now);
    assert!(chart.viewport().center().lon > start.lon);

    chart.apply_command(Command::ToggleLockedPanning).unwrap();
    assert_eq!(chart.interaction_state(), InteractionState::Idle);
    let settled = chart.viewport().center();
    chart.handle_event(free(200.0), now);
    assert_eq!(chart.viewport().center(), settled);
}

#[test]
fn test_drag_variant_only_changes_what_is_drawn() {
    let mut template = Viewport::default();
    template.star_limiting_magnitude = 4.5;
    let h = harness(MockCatalog::default(), MockEphemeris::default());
    let mut chart = h.chart.with_drag_variant(template);
    let now = Instant::now();

    chart.handle_event(press(400.0, 300.0), now);
    chart.handle_event(drag(430.0, 300.0), now);
    assert_eq!(chart.rendered_viewport().star_limiting_magnitude, 4.5);
    assert_eq!(chart.rendered_viewport().center(), chart.viewport().center());
    assert_eq!(chart.viewport().star_limiting_magnitude, 6.5);

    chart.handle_event(release(430.0, 300.0), now);
    assert_eq!(chart.rendered_viewport(), chart.viewport());
    assert!(chart.viewport().fidelity.textures);
}
