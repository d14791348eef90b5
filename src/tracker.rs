//! # Central object tracker
//!
//! Turns a user-supplied name into an equatorial J2000 position and keeps the viewport
//! centered on it. Manual search, real-time tracking and event selection all go through
//! [`CentralObjectTracker::center_on`].
//!
//! Resolution order, first match wins:
//!
//! 1. coordinate literal (sexagesimal or raw encoding), Sun/Moon/planet name, then the
//!    catalog;
//! 2. constellation name;
//! 3. minor body (asteroid, comet, NEO, trans-Neptunian object) known to the orbital
//!    element database;
//! 4. external name-resolution service.
//!
//! A successful resolution becomes the [`CentralObjectBinding`] that the clock refreshes on
//! every tick, so a moving body stays centered as time advances. A failed one clears the
//! binding and leaves the viewport untouched.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::HorizonConfig;
use crate::constellations::find_constellation;
use crate::conversion::parse_coordinate_literal;
use crate::ephemeris::{BodyId, EphemerisEngine, MinorBodyCatalog, RenderContext};
use crate::pick::CatalogService;
use crate::projection::{update_horizon_offset, CoordinateMapper};
use crate::ref_system::SkyPosition;
use crate::render::Scene;
use crate::resolver::NameResolver;
use crate::skychart_errors::{ResolutionError, SkyChartError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    CoordinateLiteral,
    SolarSystem,
    Catalog,
    Constellation,
    MinorBody,
    External,
}

/// How a binding is brought up to date on a clock tick.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingTarget {
    /// Position does not depend on time
    Fixed,
    /// Recomputed from the ephemeris
    Body(BodyId),
    /// Looked up again in the catalog, which may hold moving entries
    Catalog,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CentralObjectBinding {
    pub name: String,
    /// Equatorial J2000
    pub position: SkyPosition,
    pub target: BindingTarget,
    pub source: ResolutionSource,
}

pub struct CentralObjectTracker {
    catalog: Arc<dyn CatalogService>,
    ephemeris: Arc<dyn EphemerisEngine>,
    minor_bodies: Option<Arc<dyn MinorBodyCatalog>>,
    resolver: Option<Arc<dyn NameResolver>>,
    horizon: HorizonConfig,
}

impl CentralObjectTracker {
    pub fn new(
        catalog: Arc<dyn CatalogService>,
        ephemeris: Arc<dyn EphemerisEngine>,
        horizon: HorizonConfig,
    ) -> Self {
        CentralObjectTracker {
            catalog,
            ephemeris,
            minor_bodies: None,
            resolver: None,
            horizon,
        }
    }

    pub fn with_minor_bodies(mut self, minor_bodies: Arc<dyn MinorBodyCatalog>) -> Self {
        self.minor_bodies = Some(minor_bodies);
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn NameResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    fn body_position(
        &self,
        body: &BodyId,
        context: &RenderContext,
    ) -> Result<SkyPosition, SkyChartError> {
        // the ephemeris works on its own copy of the observer
        let observer = context.observer.clone();
        Ok(self
            .ephemeris
            .position_of(body, &context.time, &observer)?
            .position)
    }

    fn binding(
        name: &str,
        position: SkyPosition,
        target: BindingTarget,
        source: ResolutionSource,
    ) -> CentralObjectBinding {
        CentralObjectBinding {
            name: name.to_string(),
            position,
            target,
            source,
        }
    }

    /// Resolve `name` without touching any chart state.
    pub fn resolve(
        &self,
        name: &str,
        context: &RenderContext,
    ) -> Result<CentralObjectBinding, ResolutionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ResolutionError::EmptyQuery);
        }

        match parse_coordinate_literal(name) {
            Ok(Some(position)) => {
                return Ok(Self::binding(
                    name,
                    position,
                    BindingTarget::Fixed,
                    ResolutionSource::CoordinateLiteral,
                ))
            }
            Ok(None) => {}
            Err(err) => return Err(ResolutionError::NotFound(err.to_string())),
        }

        if let Some(body) = BodyId::from_name(name) {
            let position = self
                .body_position(&body, context)
                .map_err(|_| ResolutionError::Ephemeris(name.to_string()))?;
            return Ok(Self::binding(
                name,
                position,
                BindingTarget::Body(body),
                ResolutionSource::SolarSystem,
            ));
        }

        if let Some(position) = self.catalog.resolve_by_name(name) {
            return Ok(Self::binding(
                name,
                position,
                BindingTarget::Catalog,
                ResolutionSource::Catalog,
            ));
        }

        if let Some(constellation) = find_constellation(name) {
            return Ok(Self::binding(
                constellation.name,
                constellation.center(),
                BindingTarget::Fixed,
                ResolutionSource::Constellation,
            ));
        }

        if let Some(minor) = self.minor_bodies.as_ref().and_then(|db| db.find(name)) {
            let body = BodyId::MinorBody(minor);
            let position = self
                .body_position(&body, context)
                .map_err(|_| ResolutionError::Ephemeris(name.to_string()))?;
            return Ok(Self::binding(
                name,
                position,
                BindingTarget::Body(body),
                ResolutionSource::MinorBody,
            ));
        }

        match &self.resolver {
            Some(resolver) => {
                debug!(name, "falling back to the external resolver");
                let position = resolver.resolve(name)?;
                Ok(Self::binding(
                    name,
                    position,
                    BindingTarget::Fixed,
                    ResolutionSource::External,
                ))
            }
            None => Err(ResolutionError::NotFound(name.to_string())),
        }
    }

    /// Resolve `name`, bind it and center the viewport on it.
    ///
    /// Return
    /// ------
    /// * the equatorial J2000 position now at the center
    /// * a [`ResolutionError`] otherwise; the binding is then cleared and the viewport is
    ///   left exactly as it was
    pub fn center_on(
        &self,
        name: &str,
        scene: &mut Scene<'_>,
    ) -> Result<SkyPosition, ResolutionError> {
        match self.resolve(name, scene.context) {
            Ok(binding) => {
                let position = binding.position;
                self.center_viewport(scene, &position);
                info!(name = %binding.name, source = ?binding.source, "centered on object");
                *scene.binding = Some(binding);
                scene.redraw(None);
                Ok(position)
            }
            Err(err) => {
                debug!(name, %err, "resolution failed, binding cleared");
                *scene.binding = None;
                Err(err)
            }
        }
    }

    /// Position of `binding` for a new render context.
    pub fn refresh(
        &self,
        binding: &CentralObjectBinding,
        context: &RenderContext,
    ) -> Result<CentralObjectBinding, SkyChartError> {
        let position = match &binding.target {
            BindingTarget::Fixed => binding.position,
            BindingTarget::Body(body) => self.body_position(body, context)?,
            BindingTarget::Catalog => self
                .catalog
                .resolve_by_name(&binding.name)
                .ok_or_else(|| ResolutionError::NotFound(binding.name.clone()))?,
        };
        Ok(CentralObjectBinding {
            position,
            ..binding.clone()
        })
    }

    /// Put an equatorial J2000 position at the center of the live viewport.
    pub fn center_viewport(&self, scene: &mut Scene<'_>, equatorial: &SkyPosition) {
        let mapper = CoordinateMapper::new(scene.context);
        mapper.center_on_equatorial(scene.viewport, equatorial);
        update_horizon_offset(scene.viewport, &self.horizon);
    }
}
