//! # Clock scheduler
//!
//! Periodic ticks moving the simulated time forward and keeping a tracked object centered.
//!
//! Two producers can mutate a chart: the user, through the
//! [`InteractionController`](crate::interaction::InteractionController), and this clock. They
//! are serialized by an [`AdmissionGate`], a binary busy flag: whoever holds the
//! [`AdmissionTicket`] owns the chart, and a tick arriving while the ticket is taken is
//! **dropped**, never queued nor retried. The interaction controller holds the ticket for
//! its whole non-idle session, the menu included.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, TryLockError};
use std::time::{Duration, Instant};

use hifitime::Epoch;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::config::ClockConfig;
use crate::interaction::InteractionState;
use crate::render::Scene;
use crate::skychart::SharedSkyChart;
use crate::skychart_errors::SkyChartError;
use crate::time::TimeRate;
use crate::tracker::CentralObjectTracker;

/// Binary busy flag shared by every producer of chart mutations.
#[derive(Debug, Clone, Default)]
pub struct AdmissionGate {
    busy: Arc<AtomicBool>,
}

impl AdmissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the gate, or `None` if somebody already holds it.
    pub fn try_acquire(&self) -> Option<AdmissionTicket> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| AdmissionTicket {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of ownership of an [`AdmissionGate`]; the gate reopens when it is dropped.
#[derive(Debug)]
pub struct AdmissionTicket {
    busy: Arc<AtomicBool>,
}

impl Drop for AdmissionTicket {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Previous work still holds the gate
    Busy,
    MenuOpen,
    /// A pan or zoom session is in progress
    Interacting,
}

#[derive(Debug, PartialEq)]
pub enum TickOutcome {
    Dropped(DropReason),
    Advanced { time: Epoch, recentered: bool },
    /// The update failed and was abandoned; nothing changed
    Skipped(SkyChartError),
}

/// Admitted and dropped tick counts of a [`ClockScheduler::run`] loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub admitted: u64,
    pub dropped: u64,
}

#[derive(Debug)]
pub struct ClockScheduler {
    rate: TimeRate,
    config: ClockConfig,
    gate: AdmissionGate,
    /// Wall-clock instant the simulated time was last advanced to
    last_tick: Instant,
}

impl ClockScheduler {
    pub fn new(config: ClockConfig, gate: AdmissionGate) -> Self {
        ClockScheduler {
            rate: TimeRate::default(),
            config,
            gate,
            last_tick: Instant::now(),
        }
    }

    pub fn rate(&self) -> TimeRate {
        self.rate
    }

    /// Change the rate; real-time counting restarts from now.
    pub fn set_rate(&mut self, rate: TimeRate) {
        self.rate = rate;
        self.last_tick = Instant::now();
    }

    /// Tick period: shorter while an object is tracked.
    pub fn interval(&self, tracking: bool) -> Duration {
        let ms = if tracking {
            self.config.tracking_interval_ms
        } else {
            self.config.live_interval_ms
        };
        Duration::from_millis(ms)
    }

    /// Run one clock step.
    ///
    /// The step is dropped when the gate is held or the user is interacting. Otherwise the
    /// time advances by the current [`TimeRate`], an active binding is re-resolved for the
    /// new time and re-centered, and the chart is redrawn. An ephemeris failure abandons
    /// the whole step; the wall-clock time it covered is carried to the next admitted one.
    pub fn tick(
        &mut self,
        now: Instant,
        interaction: InteractionState,
        tracker: &CentralObjectTracker,
        scene: &mut Scene<'_>,
    ) -> TickOutcome {
        match interaction {
            InteractionState::Idle => {}
            InteractionState::MenuOpen => return self.drop_tick(DropReason::MenuOpen),
            _ => return self.drop_tick(DropReason::Interacting),
        }
        let Some(_ticket) = self.gate.try_acquire() else {
            return self.drop_tick(DropReason::Busy);
        };

        let elapsed = now.saturating_duration_since(self.last_tick);

        let time = match self.rate.advance(scene.context.time, elapsed) {
            Ok(time) => time,
            Err(err) => {
                warn!(%err, "clock step failed");
                return TickOutcome::Skipped(err);
            }
        };

        let mut next = scene.context.clone();
        next.time = time;

        let refreshed = match scene.binding.as_ref() {
            Some(binding) => match tracker.refresh(binding, &next) {
                Ok(binding) => Some(binding),
                Err(err) => {
                    warn!(%err, name = %binding.name, "tracked object update failed, tick skipped");
                    return TickOutcome::Skipped(err);
                }
            },
            None => None,
        };

        *scene.context = next;
        let recentered = refreshed.is_some();
        if let Some(binding) = refreshed {
            tracker.center_viewport(scene, &binding.position);
            *scene.binding = Some(binding);
        }
        scene.redraw(None);
        self.last_tick = now;

        debug!(time = %time, recentered, "clock tick");
        TickOutcome::Advanced { time, recentered }
    }

    fn drop_tick(&self, reason: DropReason) -> TickOutcome {
        debug!(?reason, "tick dropped");
        TickOutcome::Dropped(reason)
    }

    /// Drive `chart` from a timer until `stop` turns `true` or its sender goes away.
    ///
    /// A chart locked by the UI thread at tick time counts as busy and the tick is dropped.
    /// The period follows [`SkyChart::tick_interval`](crate::skychart::SkyChart::tick_interval)
    /// and is re-read after every admitted tick.
    pub async fn run(chart: SharedSkyChart, mut stop: watch::Receiver<bool>) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut period = match chart.lock() {
            Ok(chart) => chart.tick_interval(),
            Err(_) => {
                warn!("chart lock poisoned, clock not started");
                return summary;
            }
        };
        let mut ticker = Self::ticker(period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                    continue;
                }
            }

            match chart.try_lock() {
                Ok(mut chart) => match chart.tick(Instant::now()) {
                    TickOutcome::Dropped(_) => summary.dropped += 1,
                    _ => {
                        summary.admitted += 1;
                        let next = chart.tick_interval();
                        if next != period {
                            period = next;
                            ticker = Self::ticker(period);
                        }
                    }
                },
                Err(TryLockError::WouldBlock) => {
                    debug!("chart busy, tick dropped");
                    summary.dropped += 1;
                }
                Err(TryLockError::Poisoned(_)) => {
                    warn!("chart lock poisoned, clock stopped");
                    break;
                }
            }
        }
        summary
    }

    fn ticker(period: Duration) -> tokio::time::Interval {
        let start = tokio::time::Instant::now() + period;
        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    }
}
