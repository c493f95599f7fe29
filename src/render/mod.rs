//! Graph rendering.
//!
//! [`GraphRenderer`] owns a drawing surface and feeds it graph models. The
//! surface is created on the first update and reused afterwards: later
//! models are bound to the existing surface and laid out again.
//!
//! ```text
//! Uninitialized ──update()──▶ Bound ──update()──▶ Bound (rebind + render)
//!                  create()
//!                  bind()
//!                  render()
//! ```

pub mod layout;
pub mod scene;

use std::sync::Arc;

use tracing::debug;

use crate::config::CanvasSettings;
use crate::data::GraphModel;

pub use layout::{EdgePath, Layout, NodePlacement};
pub use scene::Scene;

/// A drawing surface a graph model can be bound to.
pub trait GraphSurface {
    /// Create a surface with fixed dimensions and layout parameters.
    fn create(canvas: &CanvasSettings) -> Self
    where
        Self: Sized;

    /// Replace the data the surface shows.
    fn bind(&mut self, model: Arc<GraphModel>);

    /// Lay out and draw the bound data.
    fn render(&mut self);
}

/// Renderer lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    /// No surface yet.
    Uninitialized,
    /// A surface exists and shows the last model passed to `update`.
    Bound,
}

/// Drives a [`GraphSurface`] through model updates.
#[derive(Debug)]
pub struct GraphRenderer<S> {
    canvas: CanvasSettings,
    surface: Option<S>,
}

impl<S: GraphSurface> GraphRenderer<S> {
    pub fn new(canvas: CanvasSettings) -> Self {
        Self {
            canvas,
            surface: None,
        }
    }

    pub fn state(&self) -> RendererState {
        if self.surface.is_some() {
            RendererState::Bound
        } else {
            RendererState::Uninitialized
        }
    }

    /// Show a new model, creating the surface on first use.
    pub fn update(&mut self, model: &Arc<GraphModel>) {
        if self.surface.is_none() {
            debug!(
                width = self.canvas.width,
                height = self.canvas.height,
                "creating graph surface"
            );
            self.surface = Some(S::create(&self.canvas));
        } else {
            debug!(
                nodes = model.nodes.len(),
                edges = model.edges.len(),
                "rebinding graph surface"
            );
        }

        if let Some(surface) = self.surface.as_mut() {
            surface.bind(Arc::clone(model));
            surface.render();
        }
    }

    /// The surface, once created.
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }
}
