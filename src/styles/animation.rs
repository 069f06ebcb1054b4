use std::f32::consts::PI;

use tiny_skia::Color;

use crate::palette::rgba;
use crate::styles::SceneFrame;
use crate::surface::{circle, ellipse, Brush, FrameSurface};

pub const BOUNCE_AMPLITUDE: f32 = 100.0;
const OUTLINE_WIDTH: f32 = 4.0;

/// Height above the floor for element `index`; two full bounces per scene.
pub fn bounce_height(progress: f32, index: usize) -> f32 {
    (progress * PI * 4.0 + index as f32 * 0.5).sin().abs() * BOUNCE_AMPLITUDE
}

/// Horizontal/vertical scale of the shadow under a disc at `bounce` height.
pub fn shadow_scale(bounce: f32) -> (f32, f32) {
    (1.0 + bounce / 200.0, 0.4)
}

pub fn draw(surface: &mut FrameSurface, frame: &SceneFrame<'_>) {
    let (w, h, p) = (frame.width, frame.height, frame.progress);
    let shadow = Brush::solid(rgba(0, 0, 0, 0.2));

    for index in 0..frame.element_count() {
        let i = index as f32;
        let bounce = bounce_height(p, index);
        let x = w * (0.15 + i * 0.2);
        let y = h * 0.5 - bounce;
        let size = 60.0 + (p * 6.0 + i).sin() * 15.0;

        if let Some(disc) = circle(x, y, size) {
            surface.fill_path(&disc, &Brush::solid(frame.color(index)));
            surface.stroke_path(&disc, Color::WHITE, OUTLINE_WIDTH);
        }

        surface.save();
        surface.translate(x, y + size + 5.0);
        let (sx, sy) = shadow_scale(bounce);
        surface.scale(sx, sy);
        if let Some(oval) = ellipse(0.0, 0.0, size * 0.8, size * 0.3) {
            surface.fill_path(&oval, &shadow);
        }
        surface.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounce_touches_floor_and_peaks_at_amplitude() {
        assert!(bounce_height(0.0, 0).abs() < 1e-4);
        assert!((bounce_height(0.125, 0) - BOUNCE_AMPLITUDE).abs() < 1e-3);
        assert!(bounce_height(0.25, 0).abs() < 1e-3);
    }

    #[test]
    fn bounce_is_never_negative() {
        for step in 0..100 {
            let progress = step as f32 / 100.0;
            for index in 0..5 {
                assert!(bounce_height(progress, index) >= 0.0);
            }
        }
    }

    #[test]
    fn element_index_shifts_bounce_phase() {
        assert!((bounce_height(0.0, 1) - 0.5f32.sin() * BOUNCE_AMPLITUDE).abs() < 1e-3);
    }

    #[test]
    fn shadow_stretches_with_height() {
        assert_eq!(shadow_scale(0.0), (1.0, 0.4));
        assert_eq!(shadow_scale(100.0), (1.5, 0.4));
    }
}
