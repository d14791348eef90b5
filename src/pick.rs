//! # Pick engine
//!
//! Finds what the user clicked on. Lookup runs in two phases:
//!
//! 1. Solar-system bodies from the [`EphemerisEngine`], then the catalog **without** the star
//!    magnitude cutoff, so bright bodies stay reachable whatever the zoom level;
//! 2. if phase 1 landed on a star, the catalog is asked again **with** the cutoff, stars
//!    being by far the densest category.
//!
//! The category of a result is the one declared by the collaborator that produced it; the
//! payload is carried through untouched.
//!
//! Results are cached per pixel for a given viewport geometry and time. Population is
//! switched off while dragging, when every frame sees a different geometry anyway.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::constants::Magnitude;
use crate::ephemeris::{BodyId, EphemerisEngine, RenderContext};
use crate::projection::{CoordinateMapper, Pixel};
use crate::ref_system::SkyPosition;
use crate::time::epoch_to_mjd;
use crate::viewport::{Layers, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectCategory {
    Star,
    DeepSky,
    PlanetOrMoon,
    MinorBody,
    /// Satellite, nova or supernova
    Transient,
}

/// Catalog record, opaque to the engine apart from its position.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: String,
    pub name: Option<String>,
    /// Equatorial J2000
    pub position: SkyPosition,
    pub magnitude: Option<Magnitude>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogHit {
    pub category: ObjectCategory,
    pub payload: CatalogEntry,
}

/// Star, deep-sky, city and observatory lookups.
pub trait CatalogService: Send + Sync {
    /// Nearest drawable entry around `pixel`.
    ///
    /// With `apply_magnitude_cutoff`, stars fainter than the viewport's star limiting
    /// magnitude are ignored.
    fn nearest(
        &self,
        pixel: &Pixel,
        viewport: &Viewport,
        apply_magnitude_cutoff: bool,
    ) -> Option<CatalogHit>;

    /// Equatorial J2000 position of a named entry.
    fn resolve_by_name(&self, name: &str) -> Option<SkyPosition>;

    /// Nearest man-made object (satellite) around `pixel`, when the catalog has any.
    fn nearest_manmade(&self, _pixel: &Pixel, _viewport: &Viewport) -> Option<CatalogHit> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickResult {
    pub category: ObjectCategory,
    pub payload: CatalogEntry,
    /// Where the object is drawn, or the clicked pixel if it cannot be projected
    pub pixel: Pixel,
}

type PickKey = (i64, i64, bool);

/// Geometry, visible layers and time a cache is valid for.
type CacheGeneration = (u64, Layers, u64);

pub struct PickEngine {
    catalog: Arc<dyn CatalogService>,
    ephemeris: Arc<dyn EphemerisEngine>,
    min_hit_radius_px: f64,
    cache: HashMap<PickKey, Option<PickResult>>,
    cache_generation: Option<CacheGeneration>,
    cache_enabled: bool,
}

impl PickEngine {
    pub fn new(
        catalog: Arc<dyn CatalogService>,
        ephemeris: Arc<dyn EphemerisEngine>,
        min_hit_radius_px: f64,
    ) -> Self {
        PickEngine {
            catalog,
            ephemeris,
            min_hit_radius_px,
            cache: HashMap::new(),
            cache_generation: None,
            cache_enabled: true,
        }
    }

    pub fn set_cache_enabled(&mut self, enabled: bool) {
        self.cache_enabled = enabled;
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    pub fn invalidate(&mut self) {
        self.cache.clear();
        self.cache_generation = None;
    }

    /// Object under `pixel`, if any.
    ///
    /// Arguments
    /// ---------
    /// * `pixel`: screen position of the click
    /// * `prefer_manmade`: return a satellite rather than a star sharing the same spot
    /// * `viewport`, `context`: the chart the pixel belongs to
    pub fn pick(
        &mut self,
        pixel: &Pixel,
        prefer_manmade: bool,
        viewport: &Viewport,
        context: &RenderContext,
    ) -> Option<PickResult> {
        let generation = (
            viewport.geometry_fingerprint(),
            viewport.layers,
            epoch_to_mjd(&context.time).to_bits(),
        );
        if self.cache_generation != Some(generation) {
            self.cache.clear();
            self.cache_generation = Some(generation);
        }

        let key = (pixel.x.round() as i64, pixel.y.round() as i64, prefer_manmade);
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }

        let result = self.lookup(pixel, prefer_manmade, viewport, context);
        if self.cache_enabled {
            self.cache.insert(key, result.clone());
        }
        result
    }

    fn lookup(
        &self,
        pixel: &Pixel,
        prefer_manmade: bool,
        viewport: &Viewport,
        context: &RenderContext,
    ) -> Option<PickResult> {
        let mapper = CoordinateMapper::new(context);

        if let Some(body) = self.nearest_body(pixel, viewport, context, &mapper) {
            return Some(body);
        }

        let first = self.catalog.nearest(pixel, viewport, false)?;
        let hit = if first.category == ObjectCategory::Star {
            if prefer_manmade {
                if let Some(manmade) = self.catalog.nearest_manmade(pixel, viewport) {
                    return Some(Self::located(manmade, pixel, viewport, &mapper));
                }
            }
            self.catalog.nearest(pixel, viewport, true)?
        } else {
            first
        };
        Some(Self::located(hit, pixel, viewport, &mapper))
    }

    fn located(hit: CatalogHit, pixel: &Pixel, vp: &Viewport, mapper: &CoordinateMapper) -> PickResult {
        let at = mapper
            .project_equatorial(&hit.payload.position, vp)
            .unwrap_or(*pixel);
        PickResult {
            category: hit.category,
            payload: hit.payload,
            pixel: at,
        }
    }

    /// Closest Sun, Moon or planet whose disk, never smaller than the minimum hit
    /// radius, contains `pixel`.
    fn nearest_body(
        &self,
        pixel: &Pixel,
        viewport: &Viewport,
        context: &RenderContext,
        mapper: &CoordinateMapper,
    ) -> Option<PickResult> {
        let mut best: Option<(f64, PickResult)> = None;

        for body in BodyId::SKY_BODIES.iter().filter(|b| **b != context.observer.body) {
            let place = match self.ephemeris.position_of(body, &context.time, &context.observer) {
                Ok(place) => place,
                Err(err) => {
                    debug!(body = %body.name(), %err, "skipping body in pick");
                    continue;
                }
            };
            let Some(at) = mapper.project_equatorial(&place.position, viewport) else {
                continue;
            };

            let radius = mapper
                .angular_to_pixels(place.angular_radius, viewport)
                .max(self.min_hit_radius_px);
            let distance = at.distance(pixel);
            if distance > radius || best.as_ref().is_some_and(|(d, _)| *d <= distance) {
                continue;
            }

            let name = body.name();
            best = Some((
                distance,
                PickResult {
                    category: ObjectCategory::PlanetOrMoon,
                    payload: CatalogEntry {
                        id: name.clone(),
                        name: Some(name),
                        position: place.position,
                        magnitude: place.magnitude,
                    },
                    pixel: at,
                },
            ));
        }
        best.map(|(_, hit)| hit)
    }
}
