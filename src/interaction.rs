//! # Interaction controller
//!
//! Finite-state machine turning pointer, wheel and keyboard events into viewport changes.
//!
//! ```text
//!            drag / arrow key            pointer up / key up
//!   Idle ───────────────────────> Panning ──────────────────> Idle
//!    │ ▲ wheel          debounce ▲
//!    │ └──── Zooming ────────────┘
//!    │ ⇅ toggle
//!    │ LockedPanning        (pointer moves pan without a button)
//!    └──── right click ───> MenuOpen ── dismiss ──> Idle
//! ```
//!
//! Every state but `Idle` is an interaction **session**: it holds the
//! [`AdmissionTicket`] so clock ticks are dropped, renders with the degraded
//! [`QualityProfile`] from the [`QualityGovernor`], and disables pick-cache population.
//! Leaving the session restores the baseline fidelity and redraws once at full quality.
//!
//! Pointer events are processed strictly in arrival order; each pan step starts from the
//! pointer position recorded by the previous event. Failures while computing hover
//! readouts or picks only mean "nothing under this pixel" and never interrupt a pan or zoom.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::clock::{AdmissionGate, AdmissionTicket};
use crate::config::{EngineConfig, HorizonConfig, InteractionConfig};
use crate::pick::PickResult;
use crate::projection::{update_horizon_offset, CoordinateMapper, Pixel};
use crate::quality::{QualityGovernor, QualityProfile};
use crate::ref_system::SkyPosition;
use crate::render::Scene;
use crate::viewport::{FidelityFlags, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Panning,
    LockedPanning,
    Zooming,
    MenuOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKey {
    Left,
    Right,
    Up,
    Down,
}

impl ArrowKey {
    /// Screen displacement equivalent to dragging by `step` pixels.
    fn delta(self, step: f64) -> (f64, f64) {
        match self {
            ArrowKey::Left => (-step, 0.0),
            ArrowKey::Right => (step, 0.0),
            ArrowKey::Up => (0.0, -step),
            ArrowKey::Down => (0.0, step),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { at: Pixel, button: PointerButton },
    PointerMove { at: Pixel, button_held: bool },
    PointerUp { at: Pixel },
    /// Positive notches zoom in
    Wheel { at: Pixel, notches: i32 },
    KeyDown(ArrowKey),
    KeyUp(ArrowKey),
    MenuDismissed,
}

/// What lies under the pointer while idle.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverReadout {
    pub pixel: Pixel,
    /// In the viewport's coordinate system
    pub position: SkyPosition,
    pub equatorial: SkyPosition,
    pub nearest: Option<PickResult>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionResponse {
    pub rendered: bool,
    pub picked: Option<PickResult>,
    pub hover: Option<HoverReadout>,
    /// Where the host should open its context menu
    pub menu_at: Option<Pixel>,
}

#[derive(Debug)]
struct Session {
    degraded: QualityProfile,
    /// Lower-fidelity copy rendered instead of the live viewport
    variant: Option<Viewport>,
    keyboard: bool,
    _ticket: Option<AdmissionTicket>,
}

#[derive(Debug)]
pub struct InteractionController {
    config: InteractionConfig,
    horizon: HorizonConfig,
    debounce: Duration,
    state: InteractionState,
    governor: QualityGovernor,
    gate: AdmissionGate,
    session: Option<Session>,
    menu_ticket: Option<AdmissionTicket>,
    press: Option<Pixel>,
    last_pointer: Option<Pixel>,
    zoom_deadline: Option<Instant>,
    drag_template: Option<Viewport>,
    prefer_manmade: bool,
}

impl InteractionController {
    pub fn new(config: &EngineConfig, gate: AdmissionGate, initial: FidelityFlags) -> Self {
        InteractionController {
            config: config.interaction.clone(),
            horizon: config.horizon.clone(),
            debounce: config.wheel_debounce(),
            state: InteractionState::Idle,
            governor: QualityGovernor::new(config.quality.clone(), initial),
            gate,
            session: None,
            menu_ticket: None,
            press: None,
            last_pointer: None,
            zoom_deadline: None,
            drag_template: None,
            prefer_manmade: false,
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn governor(&self) -> &QualityGovernor {
        &self.governor
    }

    pub fn governor_mut(&mut self) -> &mut QualityGovernor {
        &mut self.governor
    }

    /// Viewport rendered instead of the live one while dragging, if any.
    ///
    /// Its geometry, limiting magnitudes and label toggle are re-derived from the live
    /// viewport at the start of every session.
    pub fn set_drag_variant(&mut self, template: Option<Viewport>) {
        self.drag_template = template;
    }

    pub fn set_prefer_manmade(&mut self, prefer: bool) {
        self.prefer_manmade = prefer;
    }

    /// Drag variant of the running session, if it has one.
    pub fn drag_variant(&self) -> Option<&Viewport> {
        self.session.as_ref().and_then(|s| s.variant.as_ref())
    }

    /// The viewport currently drawn: the drag variant during a session that has one.
    pub fn rendered_viewport<'v>(&'v self, live: &'v Viewport) -> &'v Viewport {
        self.drag_variant().unwrap_or(live)
    }

    pub fn rendered_viewport_mut<'v>(&'v mut self, live: &'v mut Viewport) -> &'v mut Viewport {
        match self.session.as_mut().and_then(|s| s.variant.as_mut()) {
            Some(variant) => variant,
            None => live,
        }
    }

    /// Re-derive the drag variant after the live viewport changed mid-session.
    pub fn refresh_variant(&mut self, live: &Viewport) {
        let Some(template) = &self.drag_template else {
            return;
        };
        if let Some(session) = self.session.as_mut() {
            if let Some(variant) = session.variant.as_mut() {
                let fidelity = variant.fidelity;
                *variant = derive_variant(template, live, &session.degraded);
                variant.fidelity = fidelity;
            }
        }
    }

    fn transition(&mut self, next: InteractionState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "interaction state");
            self.state = next;
        }
    }

    fn begin_session(&mut self, next: InteractionState, keyboard: bool, scene: &mut Scene<'_>) {
        self.menu_ticket = None;
        let ticket = self.gate.try_acquire();
        if ticket.is_none() {
            debug!("admission gate already held when the session started");
        }

        let degraded = self.governor.on_interaction_start(scene.viewport);
        let variant = self
            .drag_template
            .as_ref()
            .map(|template| derive_variant(template, scene.viewport, &degraded));
        if variant.is_none() {
            degraded.apply(scene.viewport);
        }
        scene.picker.set_cache_enabled(false);

        self.session = Some(Session {
            degraded,
            variant,
            keyboard,
            _ticket: ticket,
        });
        self.transition(next);
    }

    /// Close the session, restore the baseline fidelity and redraw at full quality.
    fn end_session(&mut self, scene: &mut Scene<'_>) -> bool {
        self.press = None;
        self.zoom_deadline = None;
        let Some(session) = self.session.take() else {
            self.transition(InteractionState::Idle);
            return false;
        };

        if let Some(variant) = &session.variant {
            scene.viewport.sync_geometry_from(variant);
            scene.viewport.fidelity = variant.fidelity;
        }
        self.governor.on_interaction_end(scene.viewport, &session.degraded);
        scene.picker.set_cache_enabled(true);
        self.transition(InteractionState::Idle);
        drop(session);

        scene.redraw(None)
    }

    /// Draw one frame of the session and feed its duration to the governor.
    fn render_session_frame(&mut self, scene: &mut Scene<'_>) -> bool {
        if let Some(variant) = self.session.as_mut().and_then(|s| s.variant.as_mut()) {
            variant.sync_geometry_from(scene.viewport);
        }
        let started = Instant::now();
        let variant = self.session.as_ref().and_then(|s| s.variant.as_ref());
        let rendered = scene.redraw(variant);
        if rendered {
            self.governor
                .sample_frame(started.elapsed().as_secs_f64() * 1000.0);
        }
        rendered
    }

    /// Move the center by the angular equivalent of dragging from `from` to `to`.
    fn pan(&mut self, from: Pixel, to: Pixel, scene: &mut Scene<'_>) -> bool {
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        if dx == 0.0 && dy == 0.0 {
            return false;
        }

        let vp = &mut *scene.viewport;
        let step = vp.angular_pixel_size();
        let dlon = vp.longitude_screen_sign() * dx * step;
        let dlat = -dy * step * vp.latitude_screen_sign();
        vp.pan_by(dlon, dlat);
        update_horizon_offset(vp, &self.horizon);

        if scene.binding.take().is_some() {
            debug!("manual pan cleared the central object binding");
        }
        self.render_session_frame(scene)
    }

    fn fidelity_target<'v>(
        session: &'v mut Option<Session>,
        live: &'v mut Viewport,
    ) -> &'v mut FidelityFlags {
        match session.as_mut().and_then(|s| s.variant.as_mut()) {
            Some(variant) => &mut variant.fidelity,
            None => &mut live.fidelity,
        }
    }

    /// Multiply the focal length by the zoom factor once per notch.
    fn zoom(&mut self, notches: i32, scene: &mut Scene<'_>) -> bool {
        let fov = scene.viewport.field_of_view() / self.config.zoom_factor.powi(notches);
        scene.viewport.set_field_of_view(
            fov,
            self.config.min_fov_deg.to_radians(),
            self.config.max_fov_deg.to_radians(),
        );
        update_horizon_offset(scene.viewport, &self.horizon);

        // one texture-free frame when zooming in
        let zoom_in = notches > 0;
        let saved = Self::fidelity_target(&mut self.session, scene.viewport).textures;
        if zoom_in {
            Self::fidelity_target(&mut self.session, scene.viewport).textures = false;
        }
        let rendered = self.render_session_frame(scene);
        if zoom_in {
            Self::fidelity_target(&mut self.session, scene.viewport).textures = saved;
        }
        rendered
    }

    fn hover(&self, at: Pixel, scene: &mut Scene<'_>) -> Option<HoverReadout> {
        let mapper = CoordinateMapper::new(scene.context);
        let position = mapper.unproject(&at, scene.viewport)?;
        let equatorial = mapper
            .frames()
            .to_equatorial(&position, scene.viewport.coordinate_system);
        let nearest = scene
            .picker
            .pick(&at, self.prefer_manmade, scene.viewport, scene.context);
        Some(HoverReadout {
            pixel: at,
            position,
            equatorial,
            nearest,
        })
    }

    /// Process one input event.
    ///
    /// Arguments
    /// ---------
    /// * `event`: the input, in arrival order
    /// * `now`: arrival time, used by the wheel debounce
    /// * `scene`: the chart being driven
    ///
    /// A wheel zoom whose debounce delay has run out by `now` is settled before the
    /// event is processed.
    pub fn handle(
        &mut self,
        event: InputEvent,
        now: Instant,
        scene: &mut Scene<'_>,
    ) -> InteractionResponse {
        let mut response = InteractionResponse::default();
        let settled = self.poll(now, scene);

        match event {
            InputEvent::PointerDown { at, button: PointerButton::Secondary } => {
                match self.state {
                    InteractionState::LockedPanning => {}
                    InteractionState::MenuOpen => response.menu_at = Some(at),
                    _ => {
                        if self.session.is_some() {
                            response.rendered = self.end_session(scene);
                        }
                        self.press = None;
                        self.menu_ticket = self.gate.try_acquire();
                        self.transition(InteractionState::MenuOpen);
                        response.menu_at = Some(at);
                    }
                }
            }

            InputEvent::PointerDown { at, button: PointerButton::Primary } => match self.state {
                InteractionState::Idle | InteractionState::Zooming => {
                    self.press = Some(at);
                    self.last_pointer = Some(at);
                }
                // a drag joining a keyboard pan starts from the pressed pixel
                InteractionState::Panning => self.last_pointer = Some(at),
                _ => {}
            },

            InputEvent::PointerMove { at, button_held } => match self.state {
                InteractionState::MenuOpen => {}
                InteractionState::Idle | InteractionState::Zooming if button_held => {
                    if let Some(press) = self.press {
                        if press.distance(&at) > self.config.drag_threshold_px {
                            if self.state == InteractionState::Idle {
                                self.begin_session(InteractionState::Panning, false, scene);
                            } else {
                                self.zoom_deadline = None;
                                self.transition(InteractionState::Panning);
                            }
                            response.rendered = self.pan(press, at, scene);
                            self.last_pointer = Some(at);
                        }
                    }
                }
                InteractionState::Idle => {
                    response.hover = self.hover(at, scene);
                }
                InteractionState::Zooming => {}
                InteractionState::Panning | InteractionState::LockedPanning => {
                    let dragging = self.state == InteractionState::Panning && button_held;
                    if dragging || self.state == InteractionState::LockedPanning {
                        if let Some(last) = self.last_pointer {
                            response.rendered = self.pan(last, at, scene);
                        }
                        self.last_pointer = Some(at);
                    }
                }
            },

            InputEvent::PointerUp { at } => match self.state {
                InteractionState::Panning if !self.session.as_ref().is_some_and(|s| s.keyboard) => {
                    response.rendered = self.end_session(scene);
                }
                InteractionState::Idle => {
                    if self.press.take().is_some() {
                        response.picked = scene.picker.pick(
                            &at,
                            self.prefer_manmade,
                            scene.viewport,
                            scene.context,
                        );
                    }
                }
                _ => self.press = None,
            },

            InputEvent::Wheel { notches, .. } if notches != 0 => match self.state {
                InteractionState::MenuOpen => {}
                InteractionState::Idle | InteractionState::Zooming => {
                    if self.state == InteractionState::Idle {
                        self.begin_session(InteractionState::Zooming, false, scene);
                    }
                    self.zoom_deadline = Some(now + self.debounce);
                    response.rendered = self.zoom(notches, scene);
                }
                InteractionState::Panning | InteractionState::LockedPanning => {
                    response.rendered = self.zoom(notches, scene);
                }
            },
            InputEvent::Wheel { .. } => {}

            InputEvent::KeyDown(key) => {
                let (dx, dy) = key.delta(self.config.key_pan_px);
                if self.state != InteractionState::MenuOpen && (dx != 0.0 || dy != 0.0) {
                    if self.state == InteractionState::Idle {
                        self.begin_session(InteractionState::Panning, true, scene);
                    }
                    let from = Pixel::new(
                        scene.viewport.width as f64 / 2.0,
                        scene.viewport.height as f64 / 2.0,
                    );
                    let to = Pixel::new(from.x + dx, from.y + dy);
                    response.rendered = self.pan(from, to, scene);
                }
            }

            InputEvent::KeyUp(_) => {
                let keyboard = self.session.as_ref().is_some_and(|s| s.keyboard);
                if self.state == InteractionState::Panning && keyboard {
                    response.rendered = self.end_session(scene);
                }
            }

            InputEvent::MenuDismissed => {
                if self.state == InteractionState::MenuOpen {
                    self.menu_ticket = None;
                    self.transition(InteractionState::Idle);
                }
            }
        }

        response.rendered |= settled;
        response
    }

    /// Leave the zooming state once the wheel has been quiet for the debounce delay.
    ///
    /// [`InteractionController::handle`] and the clock tick call it on their own; a host
    /// with neither running should call it from a timer once the debounce delay elapsed.
    ///
    /// Returns `true` when the full-fidelity frame was drawn.
    pub fn poll(&mut self, now: Instant, scene: &mut Scene<'_>) -> bool {
        let expired = self.zoom_deadline.is_some_and(|deadline| now >= deadline);
        if self.state == InteractionState::Zooming && expired {
            return self.end_session(scene);
        }
        false
    }

    /// Menu action switching hands-free panning on or off. Returns the new state.
    pub fn toggle_locked_panning(&mut self, scene: &mut Scene<'_>) -> InteractionState {
        if self.state == InteractionState::LockedPanning {
            self.end_session(scene);
            return self.state;
        }

        if self.state == InteractionState::MenuOpen {
            self.menu_ticket = None;
            self.transition(InteractionState::Idle);
        } else if self.session.is_some() {
            self.end_session(scene);
        }
        self.press = None;
        self.last_pointer = None;
        self.begin_session(InteractionState::LockedPanning, false, scene);
        self.state
    }
}

/// Drag variant for one session: the template's rendering settings, the live viewport's
/// geometry, and limiting magnitudes and labels never richer than the live ones.
fn derive_variant(template: &Viewport, live: &Viewport, degraded: &QualityProfile) -> Viewport {
    let mut variant = template.clone();
    variant.sync_geometry_from(live);
    variant.star_limiting_magnitude = live
        .star_limiting_magnitude
        .min(template.star_limiting_magnitude);
    variant.object_limiting_magnitude = live
        .object_limiting_magnitude
        .min(template.object_limiting_magnitude);
    variant.layers = live.layers;
    variant.layers.labels = live.layers.labels && template.layers.labels;
    degraded.apply(&mut variant);
    variant
}
