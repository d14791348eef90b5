#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use hifitime::Epoch;

use skychart::config::EngineConfig;
use skychart::ephemeris::{
    BodyId, EphemerisEngine, EquatorialPosition, MinorBody, MinorBodyCatalog, RenderContext,
};
use skychart::observers::ObserverLocation;
use skychart::pick::{CatalogEntry, CatalogHit, CatalogService, ObjectCategory};
use skychart::projection::{project, Pixel};
use skychart::ref_system::SkyPosition;
use skychart::render::{Framebuffer, Renderer};
use skychart::resolver::NameResolver;
use skychart::skychart::SkyChart;
use skychart::skychart_errors::{ResolutionError, SkyChartError};
use skychart::time::{epoch_to_mjd, mjd_to_epoch};
use skychart::viewport::{Layer, Viewport};

pub const START_MJD: f64 = 60000.0;

/// Search radius of [`MockCatalog::nearest`], in pixels.
pub const CATALOG_HIT_RADIUS: f64 = 8.0;

pub fn start_context() -> RenderContext {
    RenderContext::new(mjd_to_epoch(START_MJD), ObserverLocation::default())
}

/// Default configuration without the network resolver.
pub fn offline_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.resolver.enabled = false;
    config
}

/// Renderer counting its frames, and failing on demand.
#[derive(Clone, Default)]
pub struct CountingRenderer {
    pub frames: Arc<AtomicUsize>,
    pub fail: Arc<AtomicBool>,
}

impl Renderer for CountingRenderer {
    fn render(
        &mut self,
        viewport: &Viewport,
        _context: &RenderContext,
    ) -> Result<Framebuffer, SkyChartError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SkyChartError::Render("mock failure".into()));
        }
        self.frames.fetch_add(1, Ordering::SeqCst);
        Ok(Framebuffer::blank(viewport.width, viewport.height))
    }
}

struct MockBody {
    position: SkyPosition,
    /// Right-ascension drift in radians per day
    drift: f64,
    angular_radius: f64,
}

/// Ephemeris serving fixed, optionally drifting, bodies.
#[derive(Default)]
pub struct MockEphemeris {
    bodies: HashMap<BodyId, MockBody>,
    pub failing: AtomicBool,
    pub calls: AtomicUsize,
}

impl MockEphemeris {
    pub fn with_body(mut self, body: BodyId, position: SkyPosition, angular_radius: f64) -> Self {
        self.bodies.insert(
            body,
            MockBody {
                position,
                drift: 0.0,
                angular_radius,
            },
        );
        self
    }

    pub fn with_moving_body(mut self, body: BodyId, position: SkyPosition, drift: f64) -> Self {
        self.bodies.insert(
            body,
            MockBody {
                position,
                drift,
                angular_radius: 0.0,
            },
        );
        self
    }
}

impl EphemerisEngine for MockEphemeris {
    fn position_of(
        &self,
        body: &BodyId,
        time: &Epoch,
        _observer: &ObserverLocation,
    ) -> Result<EquatorialPosition, SkyChartError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(SkyChartError::EphemerisComputation(body.name()));
        }
        let known = self
            .bodies
            .get(body)
            .ok_or_else(|| SkyChartError::EphemerisComputation(body.name()))?;
        let days = epoch_to_mjd(time) - START_MJD;
        Ok(EquatorialPosition {
            position: SkyPosition::new(
                known.position.lon + known.drift * days,
                known.position.lat,
            ),
            distance_au: Some(1.5),
            angular_radius: known.angular_radius,
            magnitude: Some(-1.0),
        })
    }
}

/// Catalog of a few entries, projected with the viewport as-is (equatorial charts only).
///
/// An entry tied to a [`Layer`] is only found while that layer is drawn.
#[derive(Default)]
pub struct MockCatalog {
    entries: Vec<(CatalogHit, Option<Layer>)>,
    satellites: Vec<CatalogHit>,
    names: HashMap<String, SkyPosition>,
    pub nearest_calls: AtomicUsize,
}

impl MockCatalog {
    pub fn with_entry(
        self,
        category: ObjectCategory,
        id: &str,
        position: SkyPosition,
        magnitude: f32,
    ) -> Self {
        self.with_entry_on(category, id, position, magnitude, None)
    }

    pub fn with_entry_on(
        mut self,
        category: ObjectCategory,
        id: &str,
        position: SkyPosition,
        magnitude: f32,
        layer: Option<Layer>,
    ) -> Self {
        let hit = CatalogHit {
            category,
            payload: CatalogEntry {
                id: id.into(),
                name: Some(id.into()),
                position,
                magnitude: Some(magnitude),
            },
        };
        self.entries.push((hit, layer));
        self
    }

    pub fn with_satellite(mut self, id: &str, position: SkyPosition) -> Self {
        self.satellites.push(CatalogHit {
            category: ObjectCategory::Transient,
            payload: CatalogEntry {
                id: id.into(),
                name: Some(id.into()),
                position,
                magnitude: None,
            },
        });
        self
    }

    pub fn with_name(mut self, name: &str, position: SkyPosition) -> Self {
        self.names.insert(name.to_lowercase(), position);
        self
    }
}

impl CatalogService for MockCatalog {
    fn nearest(
        &self,
        pixel: &Pixel,
        viewport: &Viewport,
        apply_magnitude_cutoff: bool,
    ) -> Option<CatalogHit> {
        self.nearest_calls.fetch_add(1, Ordering::SeqCst);
        self.entries
            .iter()
            .filter(|(_, layer)| layer.map_or(true, |l| viewport.layers.get(l)))
            .map(|(hit, _)| hit)
            .filter(|hit| {
                !(apply_magnitude_cutoff
                    && hit.category == ObjectCategory::Star
                    && hit
                        .payload
                        .magnitude
                        .is_some_and(|m| m > viewport.star_limiting_magnitude))
            })
            .filter_map(|hit| {
                let at = project(&hit.payload.position, viewport)?;
                let d = at.distance(pixel);
                (d <= CATALOG_HIT_RADIUS).then_some((d, hit))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, hit)| hit.clone())
    }

    fn resolve_by_name(&self, name: &str) -> Option<SkyPosition> {
        self.names.get(&name.to_lowercase()).copied()
    }

    fn nearest_manmade(&self, pixel: &Pixel, viewport: &Viewport) -> Option<CatalogHit> {
        self.satellites
            .iter()
            .filter(|hit| {
                project(&hit.payload.position, viewport)
                    .is_some_and(|at| at.distance(pixel) <= CATALOG_HIT_RADIUS)
            })
            .cloned()
            .next()
    }
}

#[derive(Default)]
pub struct MockMinorBodies {
    bodies: Vec<MinorBody>,
}

impl MockMinorBodies {
    pub fn with(mut self, body: MinorBody) -> Self {
        self.bodies.push(body);
        self
    }
}

impl MinorBodyCatalog for MockMinorBodies {
    fn find(&self, name: &str) -> Option<MinorBody> {
        self.bodies
            .iter()
            .find(|b| b.designation.to_string().eq_ignore_ascii_case(name.trim()))
            .cloned()
    }
}

/// Resolver answering from a fixed table, `NotFound` otherwise.
#[derive(Default)]
pub struct MockResolver {
    answers: HashMap<String, Result<SkyPosition, ResolutionError>>,
    pub calls: AtomicUsize,
}

impl MockResolver {
    pub fn answering(mut self, name: &str, answer: Result<SkyPosition, ResolutionError>) -> Self {
        self.answers.insert(name.to_lowercase(), answer);
        self
    }
}

impl NameResolver for MockResolver {
    fn resolve(&self, name: &str) -> Result<SkyPosition, ResolutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or_else(|| Err(ResolutionError::NotFound(name.to_string())))
    }
}

pub struct Harness {
    pub chart: SkyChart,
    pub renderer: CountingRenderer,
    pub catalog: Arc<MockCatalog>,
    pub ephemeris: Arc<MockEphemeris>,
}

impl Harness {
    pub fn frames(&self) -> usize {
        self.renderer.frames.load(Ordering::SeqCst)
    }
}

/// An offline 800×600 equatorial chart centered on (1 rad, 0.2 rad) with a 90° field.
pub fn harness(catalog: MockCatalog, ephemeris: MockEphemeris) -> Harness {
    harness_with(offline_config(), catalog, ephemeris)
}

pub fn harness_with(config: EngineConfig, catalog: MockCatalog, ephemeris: MockEphemeris) -> Harness {
    let renderer = CountingRenderer::default();
    let catalog = Arc::new(catalog);
    let ephemeris = Arc::new(ephemeris);
    let mut viewport = Viewport::new(800, 600).expect("valid size");
    viewport.set_center(1.0, 0.2);

    let chart = SkyChart::new(
        config,
        viewport,
        start_context(),
        Box::new(renderer.clone()),
        catalog.clone(),
        ephemeris.clone(),
    )
    .expect("valid configuration");

    Harness {
        chart,
        renderer,
        catalog,
        ephemeris,
    }
}
