use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use fontdue::layout::{
    CoordinateSystem, GlyphRasterConfig, HorizontalAlign, Layout, LayoutSettings, TextStyle,
    VerticalAlign, WrapStyle,
};
use fontdue::{Font, FontSettings};

use crate::surface::FrameSurface;

pub const FONT_ENV_VAR: &str = "PROMPTREEL_FONT";

/// Searched in order when neither config nor environment names a font.
pub const SYSTEM_FONT_CANDIDATES: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, Clone)]
struct GlyphBitmap {
    width: usize,
    height: usize,
    bitmap: Vec<u8>,
}

/// Axis-aligned box text is centred in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

pub struct CaptionPainter {
    font: Font,
    font_size: f32,
    glyph_cache: HashMap<GlyphRasterConfig, GlyphBitmap>,
}

impl CaptionPainter {
    pub fn from_path(font_path: &Path, font_size: f32) -> Result<Self> {
        let font_bytes = fs::read(font_path)
            .with_context(|| format!("failed to read font file {}", font_path.display()))?;
        Self::from_bytes(font_bytes, font_size)
            .with_context(|| format!("failed to load font {}", font_path.display()))
    }

    pub fn from_bytes(font_bytes: Vec<u8>, font_size: f32) -> Result<Self> {
        let font = Font::from_bytes(font_bytes, FontSettings::default())
            .map_err(|error| anyhow!("failed to parse font: {error}"))?;
        Ok(Self {
            font,
            font_size,
            glyph_cache: HashMap::new(),
        })
    }

    /// Loads the configured font, or the first discoverable one.
    pub fn discover(configured: Option<&Path>, font_size: f32) -> Result<Self> {
        let path = resolve_font_path(configured)
            .ok_or_else(|| anyhow!("no caption font found; set caption.font or {FONT_ENV_VAR}"))?;
        tracing::debug!(font = %path.display(), font_size, "loading caption font");
        Self::from_path(&path, font_size)
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn set_font_size(&mut self, font_size: f32) {
        if (self.font_size - font_size).abs() > f32::EPSILON {
            self.font_size = font_size;
            self.glyph_cache.clear();
        }
    }

    /// Draws a single line of `text` centred in `area`, blending `color`
    /// (straight RGBA8) source-over onto the surface.
    pub fn draw_centered(&mut self, surface: &mut FrameSurface, area: TextBox, text: &str, color: [u8; 4]) {
        if text.is_empty() {
            return;
        }

        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings {
            x: area.x,
            y: area.y,
            max_width: Some(area.width),
            max_height: Some(area.height),
            horizontal_align: HorizontalAlign::Center,
            vertical_align: VerticalAlign::Middle,
            line_height: 1.0,
            wrap_style: WrapStyle::Word,
            wrap_hard_breaks: true,
        });
        layout.append(&[&self.font], &TextStyle::new(text, self.font_size, 0));

        let frame_width = surface.width();
        let frame_height = surface.height();
        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let font = &self.font;
            let bitmap = self.glyph_cache.entry(glyph.key).or_insert_with(|| {
                let (_, bitmap) = font.rasterize_config(glyph.key);
                GlyphBitmap {
                    width: glyph.width,
                    height: glyph.height,
                    bitmap,
                }
            });
            blend_glyph(
                surface.data_mut(),
                frame_width,
                frame_height,
                glyph.x.round() as i32,
                glyph.y.round() as i32,
                bitmap,
                color,
            );
        }
    }
}

pub fn resolve_font_path(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        return Some(path.to_path_buf());
    }
    if let Some(from_env) = std::env::var_os(FONT_ENV_VAR) {
        let path = PathBuf::from(from_env);
        if path.is_file() {
            return Some(path);
        }
        tracing::warn!(font = %path.display(), "{FONT_ENV_VAR} does not point at a file");
    }
    SYSTEM_FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.is_file())
}

fn blend_glyph(
    frame: &mut [u8],
    frame_width: u32,
    frame_height: u32,
    x: i32,
    y: i32,
    glyph: &GlyphBitmap,
    color: [u8; 4],
) {
    for row in 0..glyph.height {
        let py = y + row as i32;
        if py < 0 || py >= frame_height as i32 {
            continue;
        }
        for col in 0..glyph.width {
            let px = x + col as i32;
            if px < 0 || px >= frame_width as i32 {
                continue;
            }
            let mask = glyph.bitmap[row * glyph.width + col];
            if mask == 0 {
                continue;
            }
            let alpha = ((u16::from(mask) * u16::from(color[3])) / 255) as u8;
            let idx = ((py as u32 * frame_width + px as u32) * 4) as usize;
            blend_premultiplied(frame, idx, [color[0], color[1], color[2], alpha]);
        }
    }
}

/// Source-over of a straight-alpha `src` onto a premultiplied pixel.
pub fn blend_premultiplied(frame: &mut [u8], idx: usize, src: [u8; 4]) {
    let alpha = u16::from(src[3]);
    if alpha == 0 {
        return;
    }
    let inv_alpha = 255 - alpha;
    for channel in 0..3 {
        let src_premul = u16::from(src[channel]) * alpha;
        let dst = u16::from(frame[idx + channel]) * inv_alpha;
        frame[idx + channel] = ((src_premul + dst + 127) / 255) as u8;
    }
    let dst_alpha = u16::from(frame[idx + 3]) * inv_alpha;
    frame[idx + 3] = ((alpha * 255 + dst_alpha + 127) / 255) as u8;
}
