//! Per-style procedural draw routines.
//!
//! Every routine is a pure function of the scene, progress and frame size,
//! except Retro, which also consumes the injected grain noise source. All of
//! them draw nothing when the scene has no elements or no usable colors.

pub mod abstract_shapes;
pub mod animation;
pub mod cinematic;
pub mod realistic;
pub mod retro;

use anyhow::Result;
use tiny_skia::Color;

use crate::grain::{GrainSettings, NoiseSource};
use crate::palette::cycle;
use crate::schema::{SceneDescriptor, Style};
use crate::surface::FrameSurface;

/// Inputs shared by all style renderers for one frame.
pub struct SceneFrame<'a> {
    pub scene: &'a SceneDescriptor,
    /// `scene.colors` parsed, unparseable entries dropped.
    pub palette: &'a [Color],
    /// Position within the scene, in `[0, 1)`.
    pub progress: f32,
    pub width: f32,
    pub height: f32,
}

impl SceneFrame<'_> {
    pub fn element_count(&self) -> usize {
        self.scene.elements.len()
    }

    pub fn has_motifs(&self) -> bool {
        self.element_count() > 0 && !self.palette.is_empty()
    }

    /// `palette[index mod len]`. Only meaningful when `has_motifs()`.
    pub fn color(&self, index: usize) -> Color {
        cycle(self.palette, index).unwrap_or(Color::WHITE)
    }
}

/// Film grain input for styles that post-process pixels.
pub struct GrainInput<'n> {
    pub settings: GrainSettings,
    pub noise: &'n mut dyn NoiseSource,
}

pub fn render_style(
    style: Style,
    surface: &mut FrameSurface,
    frame: &SceneFrame<'_>,
    grain: GrainInput<'_>,
) -> Result<()> {
    if !frame.has_motifs() {
        tracing::trace!(
            style = style.id(),
            elements = frame.element_count(),
            colors = frame.palette.len(),
            "scene has nothing to draw for style"
        );
        return Ok(());
    }

    match style {
        Style::Cinematic => cinematic::draw(surface, frame),
        Style::Animation => animation::draw(surface, frame),
        Style::Realistic => realistic::draw(surface, frame)?,
        Style::Abstract => abstract_shapes::draw(surface, frame),
        Style::Retro => retro::draw(surface, frame, grain),
    }
    Ok(())
}
