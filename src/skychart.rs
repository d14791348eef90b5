//! # SkyChart: the navigation engine façade
//!
//! [`SkyChart`] owns the single [`Viewport`] and [`RenderContext`] of a chart session and
//! wires the components that act on them:
//!
//! 1. **Interaction** ([`InteractionController`]): pointer, wheel and keyboard events.
//! 2. **Clock** ([`ClockScheduler`]): simulated time and real-time tracking.
//! 3. **Tracking** ([`CentralObjectTracker`]): name resolution and re-centering.
//! 4. **Picking** ([`PickEngine`]): what lies under a pixel.
//!
//! Every mutation goes through `&mut SkyChart`, so the viewport is never touched
//! concurrently. A host running the clock on a timer task shares the chart as a
//! [`SharedSkyChart`]; see [`ClockScheduler::run`].
//!
//! ## Typical usage
//!
//! ```rust, no_run
//! use std::sync::Arc;
//! use std::time::Instant;
//!
//! use skychart::config::EngineConfig;
//! use skychart::ephemeris::{EphemerisEngine, RenderContext};
//! use skychart::interaction::InputEvent;
//! use skychart::pick::CatalogService;
//! use skychart::projection::Pixel;
//! use skychart::render::NullRenderer;
//! use skychart::skychart::SkyChart;
//! use skychart::viewport::Viewport;
//!
//! # fn run(catalog: Arc<dyn CatalogService>, ephemeris: Arc<dyn EphemerisEngine>, context: RenderContext) {
//! let mut chart = SkyChart::new(
//!     EngineConfig::default(),
//!     Viewport::new(1024, 768).unwrap(),
//!     context,
//!     Box::new(NullRenderer),
//!     catalog,
//!     ephemeris,
//! )
//! .unwrap();
//!
//! chart.center_on("Orion").unwrap();
//! chart.handle_event(InputEvent::Wheel { at: Pixel::new(512.0, 384.0), notches: 1 }, Instant::now());
//! # }
//! ```

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use hifitime::Epoch;
use tracing::{debug, info};

use crate::clock::{AdmissionGate, ClockScheduler, TickOutcome};
use crate::command::{Command, CommandOutcome};
use crate::config::EngineConfig;
use crate::ephemeris::{EphemerisEngine, MinorBodyCatalog, RenderContext};
use crate::interaction::{InputEvent, InteractionController, InteractionResponse, InteractionState};
use crate::observers::ObserverLocation;
use crate::pick::{CatalogService, PickEngine, PickResult};
use crate::projection::{update_horizon_offset, CoordinateMapper, Pixel};
use crate::quality::QualityGovernor;
use crate::ref_system::SkyPosition;
use crate::render::{Framebuffer, Renderer, Scene};
use crate::resolver::{NameResolver, SesameResolver};
use crate::skychart_errors::{ResolutionError, SkyChartError};
use crate::time::TimeRate;
use crate::tracker::{CentralObjectBinding, CentralObjectTracker};
use crate::viewport::Viewport;

/// A chart shared between the UI thread and a clock task.
pub type SharedSkyChart = Arc<Mutex<SkyChart>>;

/// State lent to the components as a [`Scene`].
struct ChartState {
    viewport: Viewport,
    context: RenderContext,
    renderer: Box<dyn Renderer>,
    frame: Option<Framebuffer>,
    picker: PickEngine,
    binding: Option<CentralObjectBinding>,
}

impl ChartState {
    fn scene(&mut self) -> Scene<'_> {
        Scene {
            viewport: &mut self.viewport,
            context: &mut self.context,
            renderer: self.renderer.as_mut(),
            frame: &mut self.frame,
            picker: &mut self.picker,
            binding: &mut self.binding,
        }
    }
}

pub struct SkyChart {
    config: EngineConfig,
    state: ChartState,
    controller: InteractionController,
    scheduler: ClockScheduler,
    tracker: CentralObjectTracker,
    gate: AdmissionGate,
}

impl SkyChart {
    /// Build a chart session.
    ///
    /// The configuration is validated first. When `config.resolver.enabled` is set, the
    /// tracker falls back to the CDS Sesame service; [`SkyChart::with_resolver`] replaces it.
    ///
    /// Arguments
    /// ---------
    /// * `config`: tuned constants of the engine
    /// * `viewport`: initial viewport, its fidelity flags become the baseline profile
    /// * `context`: initial time and observer
    /// * `renderer`: rasterizer receiving every redraw
    /// * `catalog`, `ephemeris`: lookup collaborators
    ///
    /// Return
    /// ------
    /// * the chart, not yet drawn, or [`SkyChartError::InvalidConfig`]
    pub fn new(
        config: EngineConfig,
        mut viewport: Viewport,
        context: RenderContext,
        renderer: Box<dyn Renderer>,
        catalog: Arc<dyn CatalogService>,
        ephemeris: Arc<dyn EphemerisEngine>,
    ) -> Result<Self, SkyChartError> {
        config.validate()?;

        let gate = AdmissionGate::new();
        let controller = InteractionController::new(&config, gate.clone(), viewport.fidelity);
        let scheduler = ClockScheduler::new(config.clock.clone(), gate.clone());
        let mut tracker = CentralObjectTracker::new(
            Arc::clone(&catalog),
            Arc::clone(&ephemeris),
            config.horizon.clone(),
        );
        if config.resolver.enabled {
            tracker = tracker.with_resolver(Arc::new(SesameResolver::from_config(&config.resolver)));
        }
        let picker = PickEngine::new(catalog, ephemeris, config.interaction.min_hit_radius_px);
        update_horizon_offset(&mut viewport, &config.horizon);

        Ok(SkyChart {
            config,
            state: ChartState {
                viewport,
                context,
                renderer,
                frame: None,
                picker,
                binding: None,
            },
            controller,
            scheduler,
            tracker,
            gate,
        })
    }

    pub fn with_minor_bodies(mut self, minor_bodies: Arc<dyn MinorBodyCatalog>) -> Self {
        self.tracker = self.tracker.with_minor_bodies(minor_bodies);
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn NameResolver>) -> Self {
        self.tracker = self.tracker.with_resolver(resolver);
        self
    }

    /// Render drags with `template` instead of the live viewport settings.
    pub fn with_drag_variant(mut self, template: Viewport) -> Self {
        self.controller.set_drag_variant(Some(template));
        self
    }

    /// Wrap the chart for sharing with a clock task.
    pub fn into_shared(self) -> SharedSkyChart {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.state.viewport
    }

    /// The viewport drawn by the last redraw: the drag variant while one is in use.
    pub fn rendered_viewport(&self) -> &Viewport {
        self.controller.rendered_viewport(&self.state.viewport)
    }

    pub fn context(&self) -> &RenderContext {
        &self.state.context
    }

    pub fn frame(&self) -> Option<&Framebuffer> {
        self.state.frame.as_ref()
    }

    pub fn binding(&self) -> Option<&CentralObjectBinding> {
        self.state.binding.as_ref()
    }

    pub fn interaction_state(&self) -> InteractionState {
        self.controller.state()
    }

    pub fn governor(&self) -> &QualityGovernor {
        self.controller.governor()
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub fn time_rate(&self) -> TimeRate {
        self.scheduler.rate()
    }

    /// Equatorial J2000 position at the center of the chart.
    pub fn equatorial_center(&self) -> SkyPosition {
        CoordinateMapper::new(&self.state.context).equatorial_center(&self.state.viewport)
    }

    /// Redraw whatever is currently displayed.
    pub fn redraw(&mut self) -> bool {
        self.controller.refresh_variant(&self.state.viewport);
        let variant = self.controller.drag_variant();
        self.state.scene().redraw(variant)
    }

    pub fn handle_event(&mut self, event: InputEvent, now: Instant) -> InteractionResponse {
        self.controller.handle(event, now, &mut self.state.scene())
    }

    /// Object under `pixel` in the displayed chart.
    pub fn pick(&mut self, pixel: &Pixel, prefer_manmade: bool) -> Option<PickResult> {
        let viewport = self.controller.rendered_viewport(&self.state.viewport);
        self.state
            .picker
            .pick(pixel, prefer_manmade, viewport, &self.state.context)
    }

    /// End a wheel zoom whose debounce delay has run out, redrawing at full fidelity.
    ///
    /// Input events and clock ticks already do this; call it from a timer set to
    /// [`EngineConfig::wheel_debounce`] when neither is expected soon.
    pub fn settle_zoom(&mut self, now: Instant) -> bool {
        self.controller.poll(now, &mut self.state.scene())
    }

    /// Let clicks and hovers prefer a satellite over a star drawn at the same spot.
    pub fn set_prefer_manmade(&mut self, prefer: bool) {
        self.controller.set_prefer_manmade(prefer);
    }

    /// One clock step, after expiring a finished wheel zoom.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if self.settle_zoom(now) {
            debug!("zoom settled before the clock tick");
        }
        self.scheduler.tick(
            now,
            self.controller.state(),
            &self.tracker,
            &mut self.state.scene(),
        )
    }

    /// Current clock period, shorter while an object is tracked.
    pub fn tick_interval(&self) -> Duration {
        self.scheduler.interval(self.state.binding.is_some())
    }

    /// Resolve `name` and keep the chart centered on it.
    pub fn center_on(&mut self, name: &str) -> Result<SkyPosition, ResolutionError> {
        let position = self.tracker.center_on(name, &mut self.state.scene())?;
        self.controller.refresh_variant(&self.state.viewport);
        Ok(position)
    }

    /// Move the simulated time, re-centering an active binding.
    pub fn set_time(&mut self, time: Epoch) -> Result<(), SkyChartError> {
        let mut next = self.state.context.clone();
        next.time = time;
        self.commit_context(next)
    }

    /// Move the observer, re-centering an active binding.
    pub fn set_observer(&mut self, observer: ObserverLocation) -> Result<(), SkyChartError> {
        let mut next = self.state.context.clone();
        next.observer = observer;
        self.state.picker.invalidate();
        self.commit_context(next)
    }

    fn commit_context(&mut self, next: RenderContext) -> Result<(), SkyChartError> {
        let refreshed = match &self.state.binding {
            Some(binding) => Some(self.tracker.refresh(binding, &next)?),
            None => None,
        };
        self.state.context = next;
        if let Some(binding) = refreshed {
            let mut scene = self.state.scene();
            self.tracker.center_viewport(&mut scene, &binding.position);
            *scene.binding = Some(binding);
        }
        self.redraw();
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<bool, SkyChartError> {
        if width == 0 || height == 0 {
            return Err(SkyChartError::InvalidConfig(format!(
                "viewport must have a non-empty area, got {width}x{height}"
            )));
        }
        self.state.viewport.width = width;
        self.state.viewport.height = height;
        self.refresh_geometry();
        Ok(self.redraw())
    }

    fn refresh_geometry(&mut self) {
        update_horizon_offset(&mut self.state.viewport, &self.config.horizon);
    }

    fn set_field_of_view(&mut self, fov: f64) {
        let interaction = &self.config.interaction;
        self.state.viewport.set_field_of_view(
            fov,
            interaction.min_fov_deg.to_radians(),
            interaction.max_fov_deg.to_radians(),
        );
        self.refresh_geometry();
    }

    /// Apply a fidelity change to the displayed viewport and remember it as user intent.
    fn set_fidelity(&mut self, command: &Command) -> Result<CommandOutcome, SkyChartError> {
        let Some(flag) = command.fidelity_flag() else {
            return Err(SkyChartError::InvalidConfig(format!(
                "{command:?} does not change a fidelity flag"
            )));
        };
        let target = self.controller.rendered_viewport_mut(&mut self.state.viewport);
        let fidelity = &mut target.fidelity;
        match command {
            Command::ToggleTextures => fidelity.textures = !fidelity.textures,
            Command::ToggleDeepSkyTextures => {
                fidelity.deep_sky_textures = !fidelity.deep_sky_textures
            }
            Command::ToggleMilkyWayFill => fidelity.milky_way_fill = !fidelity.milky_way_fill,
            Command::SetLabelMode(mode) => fidelity.label_mode = *mode,
            _ => {}
        }
        let snapshot = target.clone();
        self.controller
            .governor_mut()
            .record_user_override(flag, &snapshot);
        Ok(self.rendered())
    }

    fn rendered(&mut self) -> CommandOutcome {
        CommandOutcome {
            rendered: self.redraw(),
        }
    }

    /// Execute a menu or toolbar command.
    ///
    /// Return
    /// ------
    /// * whether a new frame was drawn
    /// * a [`SkyChartError`] when the command could not be carried out; the chart is then
    ///   unchanged
    pub fn apply_command(&mut self, command: Command) -> Result<CommandOutcome, SkyChartError> {
        debug!(?command, "command");
        match command {
            Command::ToggleTextures
            | Command::ToggleDeepSkyTextures
            | Command::ToggleMilkyWayFill
            | Command::SetLabelMode(_) => self.set_fidelity(&command),

            Command::ToggleLayer(layer) => {
                self.state.viewport.layers.toggle(layer);
                self.refresh_geometry();
                Ok(self.rendered())
            }
            Command::InvertHorizontal => {
                self.state.viewport.invert_horizontal = !self.state.viewport.invert_horizontal;
                Ok(self.rendered())
            }
            Command::InvertVertical => {
                self.state.viewport.invert_vertical = !self.state.viewport.invert_vertical;
                self.refresh_geometry();
                Ok(self.rendered())
            }
            Command::SetProjection(projection) => {
                self.state.viewport.projection = projection;
                self.refresh_geometry();
                Ok(self.rendered())
            }
            Command::SetCoordinateSystem(system) => {
                let mapper = CoordinateMapper::new(&self.state.context);
                let center = mapper.equatorial_center(&self.state.viewport);
                self.state.viewport.coordinate_system = system;
                mapper.center_on_equatorial(&mut self.state.viewport, &center);
                self.refresh_geometry();
                Ok(self.rendered())
            }
            Command::SetStarLimitingMagnitude(magnitude) => {
                self.state.viewport.star_limiting_magnitude = magnitude;
                Ok(self.rendered())
            }
            Command::SetObjectLimitingMagnitude(magnitude) => {
                self.state.viewport.object_limiting_magnitude = magnitude;
                Ok(self.rendered())
            }
            Command::SetFieldOfView(degrees) => {
                self.set_field_of_view(degrees.to_radians());
                Ok(self.rendered())
            }
            Command::ZoomIn => {
                self.set_field_of_view(
                    self.state.viewport.field_of_view() / self.config.interaction.zoom_factor,
                );
                Ok(self.rendered())
            }
            Command::ZoomOut => {
                self.set_field_of_view(
                    self.state.viewport.field_of_view() * self.config.interaction.zoom_factor,
                );
                Ok(self.rendered())
            }
            Command::SetTimeRate(rate) => {
                info!(?rate, "time rate changed");
                self.scheduler.set_rate(rate);
                Ok(CommandOutcome { rendered: false })
            }
            Command::CenterOn(name) => {
                self.center_on(&name)?;
                Ok(CommandOutcome { rendered: true })
            }
            Command::CenterAtPixel(pixel) => {
                let mapper = CoordinateMapper::new(&self.state.context);
                mapper.center_on_pixel(&mut self.state.viewport, &pixel)?;
                self.state.binding = None;
                self.refresh_geometry();
                Ok(self.rendered())
            }
            Command::ClearBinding => {
                self.state.binding = None;
                Ok(CommandOutcome { rendered: false })
            }
            Command::ToggleLockedPanning => {
                let state = self
                    .controller
                    .toggle_locked_panning(&mut self.state.scene());
                debug!(?state, "locked panning toggled");
                Ok(CommandOutcome { rendered: true })
            }
            Command::SetPreferManmade(prefer) => {
                self.set_prefer_manmade(prefer);
                Ok(CommandOutcome { rendered: false })
            }
            Command::DismissMenu => {
                let response = self.handle_event(InputEvent::MenuDismissed, Instant::now());
                Ok(CommandOutcome {
                    rendered: response.rendered,
                })
            }
        }
    }
}
