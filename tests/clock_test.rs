use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use approx::assert_relative_eq;
use tokio::sync::watch;

use skychart::clock::{ClockScheduler, DropReason, TickOutcome};
use skychart::command::Command;
use skychart::ephemeris::BodyId;
use skychart::interaction::{InputEvent, PointerButton};
use skychart::projection::Pixel;
use skychart::ref_system::SkyPosition;
use skychart::time::{epoch_to_mjd, StepUnit, TimeRate};

mod common;
use common::{harness, MockCatalog, MockEphemeris, START_MJD};

fn one_day() -> Command {
    Command::SetTimeRate(TimeRate::Step {
        amount: 1,
        unit: StepUnit::Day,
    })
}

#[test]
fn test_tick_while_busy_changes_nothing() {
    let mut h = harness(MockCatalog::default(), MockEphemeris::default());
    h.chart.apply_command(one_day()).unwrap();
    let viewport = h.chart.viewport().clone();
    let context = h.chart.context().clone();
    let frames = h.frames();

    let ticket = h.chart.gate().try_acquire();
    assert!(ticket.is_some());
    for _ in 0..3 {
        assert_eq!(
            h.chart.tick(Instant::now()),
            TickOutcome::Dropped(DropReason::Busy)
        );
    }
    assert_eq!(h.chart.viewport(), &viewport);
    assert_eq!(h.chart.context(), &context);
    assert_eq!(h.frames(), frames);

    drop(ticket);
    assert!(matches!(
        h.chart.tick(Instant::now()),
        TickOutcome::Advanced { recentered: false, .. }
    ));
    assert_relative_eq!(
        epoch_to_mjd(&h.chart.context().time),
        START_MJD + 1.0,
        epsilon = 1e-9
    );
    assert_eq!(h.frames(), frames + 1);
}

#[test]
fn test_ticks_are_dropped_during_interaction_and_menu() {
    let mut h = harness(MockCatalog::default(), MockEphemeris::default());
    let now = Instant::now();

    h.chart.handle_event(
        InputEvent::PointerDown {
            at: Pixel::new(400.0, 300.0),
            button: PointerButton::Primary,
        },
        now,
    );
    h.chart.handle_event(
        InputEvent::PointerMove {
            at: Pixel::new(440.0, 300.0),
            button_held: true,
        },
        now,
    );
    assert_eq!(h.chart.tick(now), TickOutcome::Dropped(DropReason::Interacting));
    h.chart.handle_event(InputEvent::PointerUp { at: Pixel::new(440.0, 300.0) }, now);

    h.chart.handle_event(
        InputEvent::PointerDown {
            at: Pixel::new(10.0, 10.0),
            button: PointerButton::Secondary,
        },
        now,
    );
    assert_eq!(h.chart.tick(now), TickOutcome::Dropped(DropReason::MenuOpen));
    h.chart.apply_command(Command::DismissMenu).unwrap();
    assert!(matches!(h.chart.tick(now), TickOutcome::Advanced { .. }));
}

#[test]
fn test_tracked_body_stays_centered() {
    let mars = SkyPosition::new(1.0, 0.1);
    let ephemeris = MockEphemeris::default().with_moving_body(BodyId::Mars, mars, 0.01);
    let mut h = harness(MockCatalog::default(), ephemeris);
    h.chart.apply_command(one_day()).unwrap();

    h.chart.center_on("mars").unwrap();
    assert_relative_eq!(h.chart.viewport().center().lon, 1.0, epsilon = 1e-12);

    for day in 1..=3 {
        assert!(matches!(
            h.chart.tick(Instant::now()),
            TickOutcome::Advanced { recentered: true, .. }
        ));
        let center = h.chart.viewport().center();
        assert_relative_eq!(center.lon, 1.0 + 0.01 * day as f64, epsilon = 1e-9);
        assert_relative_eq!(center.lat, 0.1, epsilon = 1e-12);
        assert_relative_eq!(
            h.chart.binding().unwrap().position.lon,
            center.lon,
            epsilon = 1e-12
        );
    }
}

#[test]
fn test_ephemeris_failure_skips_the_whole_tick() {
    let ephemeris =
        MockEphemeris::default().with_moving_body(BodyId::Jupiter, SkyPosition::new(2.0, 0.3), 0.02);
    let mut h = harness(MockCatalog::default(), ephemeris);
    h.chart.apply_command(one_day()).unwrap();
    h.chart.center_on("Jupiter").unwrap();
    let viewport = h.chart.viewport().clone();
    let time = h.chart.context().time;

    h.ephemeris.failing.store(true, Ordering::SeqCst);
    assert!(matches!(
        h.chart.tick(Instant::now()),
        TickOutcome::Skipped(_)
    ));
    assert_eq!(h.chart.viewport(), &viewport);
    assert_eq!(h.chart.context().time, time);
    assert!(h.chart.binding().is_some());
    assert!(!h.chart.gate().is_busy());

    h.ephemeris.failing.store(false, Ordering::SeqCst);
    assert!(matches!(
        h.chart.tick(Instant::now()),
        TickOutcome::Advanced { recentered: true, .. }
    ));
}

#[test]
fn test_real_time_rate_keeps_up_with_the_wall_clock() {
    let ephemeris =
        MockEphemeris::default().with_moving_body(BodyId::Jupiter, SkyPosition::new(2.0, 0.3), 0.0);
    let mut h = harness(MockCatalog::default(), ephemeris);
    h.chart.center_on("Jupiter").unwrap();
    h.chart
        .apply_command(Command::SetTimeRate(TimeRate::RealTime { multiplier: 1.0 }))
        .unwrap();
    let t0 = Instant::now();
    let start = epoch_to_mjd(&h.chart.context().time);
    let simulated = |h: &common::Harness| (epoch_to_mjd(&h.chart.context().time) - start) * 86400.0;

    // the first tick already covers the time since the rate was set
    assert!(matches!(
        h.chart.tick(t0 + Duration::from_secs(5)),
        TickOutcome::Advanced { .. }
    ));
    assert_relative_eq!(simulated(&h), 5.0, epsilon = 1e-2);

    h.ephemeris.failing.store(true, Ordering::SeqCst);
    assert!(matches!(
        h.chart.tick(t0 + Duration::from_secs(10)),
        TickOutcome::Skipped(_)
    ));
    assert_relative_eq!(simulated(&h), 5.0, epsilon = 1e-2);

    h.ephemeris.failing.store(false, Ordering::SeqCst);
    assert!(matches!(
        h.chart.tick(t0 + Duration::from_secs(20)),
        TickOutcome::Advanced { .. }
    ));
    assert_relative_eq!(simulated(&h), 20.0, epsilon = 1e-2);
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_follows_the_live_interval() {
    let h = harness(MockCatalog::default(), MockEphemeris::default());
    let frames = h.renderer.frames.clone();
    let chart = h.chart.into_shared();
    let (stop, stopped) = watch::channel(false);

    let task = tokio::spawn(ClockScheduler::run(chart.clone(), stopped));
    tokio::time::sleep(Duration::from_millis(6_100)).await;
    stop.send(true).unwrap();

    let summary = task.await.unwrap();
    assert_eq!(summary.admitted, 3);
    assert_eq!(summary.dropped, 0);
    assert_eq!(frames.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_drops_ticks_while_busy_and_speeds_up_when_tracking() {
    let mut h = harness(MockCatalog::default(), MockEphemeris::default());
    h.chart.center_on("Orion").unwrap();
    let chart = h.chart.into_shared();
    let (stop, stopped) = watch::channel(false);

    let ticket = chart.lock().unwrap().gate().try_acquire();
    let task = tokio::spawn(ClockScheduler::run(chart.clone(), stopped));

    // tracking interval: ticks at 0.5 s and 1.0 s are refused
    tokio::time::sleep(Duration::from_millis(1_100)).await;
    drop(ticket);
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    stop.send(true).unwrap();

    let summary = task.await.unwrap();
    assert_eq!(summary.dropped, 2);
    assert_eq!(summary.admitted, 2);
}
