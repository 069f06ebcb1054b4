//! 2D raster drawing context used by the compositor and style renderers.
//!
//! Wraps a `tiny_skia::Pixmap` with the pieces of a canvas-style API the
//! renderers need: a save/restore state stack (transform, global alpha),
//! solid and gradient brushes, offscreen blur layers and raw pixel access.

use anyhow::{anyhow, Result};
use tiny_skia::{
    Color, FillRule, GradientStop, LinearGradient, Paint, Path, PathBuilder, Pixmap, PixmapPaint,
    Point, RadialGradient, Rect, Shader, SpreadMode, Stroke, Transform,
};

use crate::blur::{blur_rgba8_premul_in_place, kernel_half_width};

#[derive(Debug, Clone)]
pub enum Brush {
    Solid(Color),
    Linear {
        start: (f32, f32),
        end: (f32, f32),
        stops: Vec<(f32, Color)>,
    },
    Radial {
        center: (f32, f32),
        radius: f32,
        stops: Vec<(f32, Color)>,
    },
}

impl Brush {
    pub fn solid(color: Color) -> Self {
        Self::Solid(color)
    }

    /// Stops evenly distributed over `[0, 1]` in order.
    pub fn linear_even(start: (f32, f32), end: (f32, f32), colors: &[Color]) -> Self {
        let last = colors.len().saturating_sub(1).max(1) as f32;
        let stops = colors
            .iter()
            .enumerate()
            .map(|(index, color)| (index as f32 / last, *color))
            .collect();
        Self::Linear { start, end, stops }
    }

    pub fn radial(center: (f32, f32), radius: f32, inner: Color, outer: Color) -> Self {
        Self::Radial {
            center,
            radius,
            stops: vec![(0.0, inner), (1.0, outer)],
        }
    }

    fn shader(&self) -> Option<Shader<'static>> {
        match self {
            Self::Solid(color) => Some(Shader::SolidColor(*color)),
            Self::Linear { start, end, stops } => LinearGradient::new(
                Point::from_xy(start.0, start.1),
                Point::from_xy(end.0, end.1),
                gradient_stops(stops),
                SpreadMode::Pad,
                Transform::identity(),
            ),
            Self::Radial {
                center,
                radius,
                stops,
            } => RadialGradient::new(
                Point::from_xy(center.0, center.1),
                Point::from_xy(center.0, center.1),
                *radius,
                gradient_stops(stops),
                SpreadMode::Pad,
                Transform::identity(),
            ),
        }
    }
}

fn gradient_stops(stops: &[(f32, Color)]) -> Vec<GradientStop> {
    stops
        .iter()
        .map(|(position, color)| GradientStop::new(position.clamp(0.0, 1.0), *color))
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct DrawState {
    transform: Transform,
    alpha: f32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            alpha: 1.0,
        }
    }
}

pub struct FrameSurface {
    pixmap: Pixmap,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl FrameSurface {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("failed to allocate frame surface {}x{}", width, height))?;
        Ok(Self {
            pixmap,
            state: DrawState::default(),
            stack: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Overwrites every pixel and resets the state stack.
    pub fn clear(&mut self, color: Color) {
        self.stack.clear();
        self.state = DrawState::default();
        self.pixmap.fill(color);
    }

    pub fn save(&mut self) {
        self.stack.push(self.state);
    }

    /// Unbalanced restores are ignored.
    pub fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.state.transform = self.state.transform.pre_translate(dx, dy);
    }

    pub fn rotate(&mut self, radians: f32) {
        self.state.transform = self
            .state
            .transform
            .pre_concat(Transform::from_rotate(radians.to_degrees()));
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.state.transform = self.state.transform.pre_scale(sx, sy);
    }

    pub fn set_global_alpha(&mut self, alpha: f32) {
        self.state.alpha = if alpha.is_finite() {
            alpha.clamp(0.0, 1.0)
        } else {
            1.0
        };
    }

    pub fn global_alpha(&self) -> f32 {
        self.state.alpha
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, brush: &Brush) {
        let Some(rect) = Rect::from_xywh(x, y, width, height) else {
            return;
        };
        self.fill_path(&PathBuilder::from_rect(rect), brush);
    }

    pub fn fill_path(&mut self, path: &Path, brush: &Brush) {
        let Some(paint) = self.paint(brush) else {
            return;
        };
        self.pixmap
            .fill_path(path, &paint, FillRule::Winding, self.state.transform, None);
    }

    pub fn stroke_path(&mut self, path: &Path, color: Color, width: f32) {
        let Some(paint) = self.paint(&Brush::Solid(color)) else {
            return;
        };
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(path, &paint, &stroke, self.state.transform, None);
    }

    /// Draws into an offscreen layer covering `bounds` (device space), blurs
    /// it with a standard deviation of `blur_radius` pixels and composites it
    /// back at the current global alpha. The layer starts with the current transform, so `draw` uses the
    /// same coordinates it would on the main surface.
    pub fn with_blurred_layer(
        &mut self,
        bounds: Rect,
        blur_radius: u32,
        draw: impl FnOnce(&mut FrameSurface),
    ) -> Result<()> {
        let margin = kernel_half_width(blur_radius) as f32;
        let left = (bounds.left() - margin).floor().max(0.0);
        let top = (bounds.top() - margin).floor().max(0.0);
        let right = (bounds.right() + margin).ceil().min(self.width() as f32);
        let bottom = (bounds.bottom() + margin).ceil().min(self.height() as f32);
        if right <= left || bottom <= top {
            return Ok(());
        }

        let layer_width = (right - left) as u32;
        let layer_height = (bottom - top) as u32;
        let mut layer = FrameSurface::new(layer_width, layer_height)?;
        layer.state.transform = self.state.transform.post_translate(-left, -top);
        draw(&mut layer);

        blur_rgba8_premul_in_place(layer.pixmap.data_mut(), layer_width, layer_height, blur_radius)?;

        let paint = PixmapPaint {
            opacity: self.state.alpha,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            left as i32,
            top as i32,
            layer.pixmap.as_ref(),
            &paint,
            Transform::identity(),
            None,
        );
        Ok(())
    }

    /// Premultiplied RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        self.pixmap.data_mut()
    }

    /// Straight-alpha RGBA8 copy of the frame.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.data().len());
        for pixel in self.pixmap.pixels() {
            let color = pixel.demultiply();
            out.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
        }
        out
    }

    /// Straight-alpha value of one pixel, `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let color = self.pixmap.pixel(x, y)?.demultiply();
        Some([color.red(), color.green(), color.blue(), color.alpha()])
    }

    fn paint(&self, brush: &Brush) -> Option<Paint<'static>> {
        let mut shader = brush.shader()?;
        if self.state.alpha < 1.0 {
            shader.apply_opacity(self.state.alpha);
        }
        Some(Paint {
            shader,
            anti_alias: true,
            ..Paint::default()
        })
    }
}

pub fn circle(cx: f32, cy: f32, radius: f32) -> Option<Path> {
    if !(radius > 0.0) {
        return None;
    }
    PathBuilder::from_circle(cx, cy, radius)
}

pub fn ellipse(cx: f32, cy: f32, rx: f32, ry: f32) -> Option<Path> {
    let rect = Rect::from_xywh(cx - rx, cy - ry, rx * 2.0, ry * 2.0)?;
    PathBuilder::from_oval(rect)
}

pub fn rect(x: f32, y: f32, width: f32, height: f32) -> Option<Path> {
    Rect::from_xywh(x, y, width, height).map(PathBuilder::from_rect)
}

pub fn polygon(points: &[(f32, f32)]) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut builder = PathBuilder::new();
    builder.move_to(first.0, first.1);
    for (x, y) in rest {
        builder.line_to(*x, *y);
    }
    builder.close();
    builder.finish()
}
