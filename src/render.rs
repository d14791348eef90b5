//! Rasterizer collaborator.
//!
//! The engine never draws anything itself. Whenever the sky has to be redrawn it hands the
//! viewport and render context to a [`Renderer`] and keeps the returned [`Framebuffer`].
//! The renderer is called synchronously and must not keep the viewport: the engine may
//! mutate it again as soon as the call returns.

use tracing::warn;

use crate::ephemeris::RenderContext;
use crate::pick::PickEngine;
use crate::skychart_errors::SkyChartError;
use crate::tracker::CentralObjectBinding;
use crate::viewport::Viewport;

/// Pixels produced by a [`Renderer`], row major, one `u32` per pixel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl Framebuffer {
    pub fn blank(width: u32, height: u32) -> Self {
        Framebuffer {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }
}

pub trait Renderer: Send {
    fn render(
        &mut self,
        viewport: &Viewport,
        context: &RenderContext,
    ) -> Result<Framebuffer, SkyChartError>;
}

/// Renderer producing blank frames of the viewport size, for headless sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(
        &mut self,
        viewport: &Viewport,
        _context: &RenderContext,
    ) -> Result<Framebuffer, SkyChartError> {
        Ok(Framebuffer::blank(viewport.width, viewport.height))
    }
}

/// Mutable view over one chart session, lent to the interaction controller, the clock and
/// the tracker for the duration of a single event or tick.
pub struct Scene<'a> {
    pub viewport: &'a mut Viewport,
    pub context: &'a mut RenderContext,
    pub renderer: &'a mut dyn Renderer,
    pub frame: &'a mut Option<Framebuffer>,
    pub picker: &'a mut PickEngine,
    pub binding: &'a mut Option<CentralObjectBinding>,
}

impl Scene<'_> {
    /// Draw `variant`, or the live viewport when `None`, and keep the frame.
    ///
    /// A renderer failure is logged and the previous frame stays on screen.
    pub fn redraw(&mut self, variant: Option<&Viewport>) -> bool {
        let viewport = variant.unwrap_or(&*self.viewport);
        match self.renderer.render(viewport, self.context) {
            Ok(frame) => {
                *self.frame = Some(frame);
                true
            }
            Err(err) => {
                warn!(%err, "render failed, keeping the previous frame");
                false
            }
        }
    }
}
