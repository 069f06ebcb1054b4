use std::f32::consts::{PI, TAU};

use tiny_skia::Color;

use crate::grain::apply_film_grain;
use crate::palette::rgba;
use crate::styles::{GrainInput, SceneFrame};
use crate::surface::{Brush, FrameSurface};

pub const SCAN_LINE_PERIOD: u32 = 4;
pub const SCAN_LINE_THICKNESS: f32 = 2.0;
const SQUARE_HALF: f32 = 50.0;

/// Horizontal channel misregistration in pixels, shared by all elements.
pub fn channel_offset(progress: f32) -> f32 {
    (progress * PI * 8.0).sin() * 3.0
}

pub fn draw(surface: &mut FrameSurface, frame: &SceneFrame<'_>, grain: GrainInput<'_>) {
    let (w, h, p) = (frame.width, frame.height, frame.progress);

    let scan_line = Brush::solid(rgba(0, 0, 0, 0.1));
    for row in (0..h.max(0.0) as u32).step_by(SCAN_LINE_PERIOD as usize) {
        surface.fill_rect(0.0, row as f32, w, SCAN_LINE_THICKNESS, &scan_line);
    }

    let offset = channel_offset(p);
    let channels = [
        (Color::from_rgba8(255, 0, 0, 0x60), offset),
        (Color::from_rgba8(0, 255, 0, 0x60), 0.0),
        (Color::from_rgba8(0, 0, 255, 0x60), -offset),
    ];
    for index in 0..frame.element_count() {
        let i = index as f32;
        let x = w * (0.2 + i * 0.2) + (p * PI + i).sin() * 40.0;
        let y = h * 0.5 + (p * TAU + i).cos() * 30.0;
        for (color, shift) in channels {
            surface.fill_rect(
                x - SQUARE_HALF + shift,
                y - SQUARE_HALF,
                SQUARE_HALF * 2.0,
                SQUARE_HALF * 2.0,
                &Brush::solid(color),
            );
        }
    }

    let vignette = Brush::radial(
        (w / 2.0, h / 2.0),
        w * 0.7,
        rgba(0, 0, 0, 0.0),
        rgba(0, 0, 0, 0.7),
    );
    surface.fill_rect(0.0, 0.0, w, h, &vignette);

    let touched = apply_film_grain(surface.data_mut(), grain.settings, grain.noise);
    tracing::trace!(touched, "film grain applied");
}
