use std::sync::OnceLock;

use anyhow::{anyhow, Result};
use regex::Regex;
use tiny_skia::Color;

/// Fallback gradient used when a scene carries no colors at all.
pub const DEFAULT_BACKGROUND: [&str; 3] = ["#1a1a2e", "#16213e", "#0f3460"];

fn hex_color_re() -> &'static Regex {
    static HEX_COLOR_RE: OnceLock<Regex> = OnceLock::new();
    HEX_COLOR_RE.get_or_init(|| {
        Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
            .expect("hex color regex should compile")
    })
}

pub fn is_hex_color(raw: &str) -> bool {
    hex_color_re().is_match(raw.trim())
}

/// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`.
pub fn parse_hex_color(raw: &str) -> Result<Color> {
    let trimmed = raw.trim();
    if !is_hex_color(trimmed) {
        return Err(anyhow!("invalid hex color '{raw}'"));
    }

    let digits = &trimmed[1..];
    let byte = |index: usize| -> Result<u8> {
        u8::from_str_radix(&digits[index..index + 2], 16)
            .map_err(|error| anyhow!("invalid hex color '{raw}': {error}"))
    };

    let (r, g, b, a) = match digits.len() {
        3 => {
            let nibble = |index: usize| -> Result<u8> {
                let value = u8::from_str_radix(&digits[index..index + 1], 16)
                    .map_err(|error| anyhow!("invalid hex color '{raw}': {error}"))?;
                Ok(value * 17)
            };
            (nibble(0)?, nibble(1)?, nibble(2)?, 255)
        }
        6 => (byte(0)?, byte(2)?, byte(4)?, 255),
        _ => (byte(0)?, byte(2)?, byte(4)?, byte(6)?),
    };
    Ok(Color::from_rgba8(r, g, b, a))
}

/// Same color with its alpha replaced by `alpha` (0-255). Mirrors appending a
/// two-digit alpha suffix to a `#rrggbb` string.
pub fn with_alpha_u8(color: Color, alpha: u8) -> Color {
    with_alpha(color, f32::from(alpha) / 255.0)
}

pub fn with_alpha(color: Color, alpha: f32) -> Color {
    Color::from_rgba(color.red(), color.green(), color.blue(), alpha.clamp(0.0, 1.0))
        .unwrap_or(color)
}

pub fn rgba(r: u8, g: u8, b: u8, alpha: f32) -> Color {
    with_alpha(Color::from_rgba8(r, g, b, 255), alpha)
}

/// Parses every color of a scene palette, skipping entries that do not parse.
pub fn parse_palette(colors: &[String]) -> Vec<Color> {
    colors
        .iter()
        .filter_map(|raw| match parse_hex_color(raw) {
            Ok(color) => Some(color),
            Err(error) => {
                tracing::debug!(%error, "skipping palette entry");
                None
            }
        })
        .collect()
}

/// `palette[index mod len]`, or `None` for an empty palette.
pub fn cycle(palette: &[Color], index: usize) -> Option<Color> {
    if palette.is_empty() {
        return None;
    }
    Some(palette[index % palette.len()])
}
