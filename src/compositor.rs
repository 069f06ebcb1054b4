use anyhow::Result;
use sha2::{Digest, Sha256};
use tiny_skia::Color;

use crate::caption::{CaptionPainter, TextBox};
use crate::grain::{GrainSettings, NoiseSource};
use crate::palette::{parse_palette, DEFAULT_BACKGROUND};
use crate::schema::{SceneDescriptor, Style};
use crate::styles::{render_style, GrainInput, SceneFrame};
use crate::surface::{Brush, FrameSurface};

/// Caption bar height as a fraction of the frame (80px on a 450px frame).
pub const CAPTION_BAR_FRACTION: f32 = 80.0 / 450.0;
pub const PLACEHOLDER_TEXT: &str = "Your video will appear here";
const MAX_PROGRESS: f32 = 1.0 - f32::EPSILON;

pub struct FrameCompositor {
    surface: FrameSurface,
    caption: Option<CaptionPainter>,
    grain: GrainSettings,
}

impl FrameCompositor {
    pub fn new(width: u32, height: u32, caption: Option<CaptionPainter>, grain: GrainSettings) -> Result<Self> {
        if caption.is_none() {
            tracing::warn!("no caption font loaded; caption bars will be drawn without text");
        }
        Ok(Self {
            surface: FrameSurface::new(width, height)?,
            caption,
            grain,
        })
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn surface(&self) -> &FrameSurface {
        &self.surface
    }

    /// Paints one complete frame: background, style layer, caption.
    ///
    /// Unknown `style_id`s get background and caption only.
    pub fn compose(
        &mut self,
        style_id: &str,
        scene: &SceneDescriptor,
        progress: f32,
        noise: &mut dyn NoiseSource,
    ) -> Result<()> {
        let progress = if progress.is_finite() {
            progress.clamp(0.0, MAX_PROGRESS)
        } else {
            0.0
        };
        let width = self.surface.width() as f32;
        let height = self.surface.height() as f32;
        let palette = parse_palette(&scene.colors);

        self.paint_background(&palette, width, height);

        if let Some(style) = Style::from_id(style_id) {
            let frame = SceneFrame {
                scene,
                palette: &palette,
                progress,
                width,
                height,
            };
            render_style(
                style,
                &mut self.surface,
                &frame,
                GrainInput {
                    settings: self.grain,
                    noise,
                },
            )?;
        } else {
            tracing::debug!(style_id, "unknown style id, drawing background and caption only");
        }

        self.paint_caption(&scene.description, width, height);
        Ok(())
    }

    /// Frame shown before anything has been generated.
    pub fn draw_placeholder(&mut self) {
        self.surface.clear(Color::from_rgba8(0x0a, 0x0a, 0x0a, 255));
        let width = self.surface.width() as f32;
        let height = self.surface.height() as f32;
        if let Some(painter) = self.caption.as_mut() {
            let previous = painter.font_size();
            painter.set_font_size(previous * 1.5);
            painter.draw_centered(
                &mut self.surface,
                TextBox {
                    x: 0.0,
                    y: 0.0,
                    width,
                    height,
                },
                PLACEHOLDER_TEXT,
                [0x66, 0x66, 0x66, 255],
            );
            painter.set_font_size(previous);
        }
    }

    /// Straight-alpha RGBA8 copy of the current frame.
    pub fn rgba(&self) -> Vec<u8> {
        self.surface.to_rgba()
    }

    /// sha256 hex of [`Self::rgba`].
    pub fn digest(&self) -> String {
        sha256_hex(&self.rgba())
    }

    fn paint_background(&mut self, palette: &[Color], width: f32, height: f32) {
        let fallback;
        let colors = if palette.is_empty() {
            fallback = parse_palette(&DEFAULT_BACKGROUND.map(str::to_owned));
            &fallback[..]
        } else {
            palette
        };

        // Every call starts from a fully opaque frame.
        self.surface.clear(colors[0]);
        if colors.len() > 1 {
            let gradient = Brush::linear_even((0.0, 0.0), (width, height), colors);
            self.surface.fill_rect(0.0, 0.0, width, height, &gradient);
        }
    }

    fn paint_caption(&mut self, description: &str, width: f32, height: f32) {
        let bar_height = (height * CAPTION_BAR_FRACTION).round();
        let bar_top = height - bar_height;
        self.surface.fill_rect(
            0.0,
            bar_top,
            width,
            bar_height,
            &Brush::solid(Color::from_rgba8(0, 0, 0, 153)),
        );
        if let Some(painter) = self.caption.as_mut() {
            painter.draw_centered(
                &mut self.surface,
                TextBox {
                    x: 0.0,
                    y: bar_top,
                    width,
                    height: bar_height,
                },
                description,
                [255, 255, 255, 255],
            );
        }
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
