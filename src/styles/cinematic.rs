use std::f32::consts::{PI, TAU};

use crate::palette::{rgba, with_alpha_u8};
use crate::styles::SceneFrame;
use crate::surface::{circle, Brush, FrameSurface};

/// Top and bottom bars each cover this fraction of the frame height.
pub const LETTERBOX_FRACTION: f32 = 0.1;
const FLARE_RADIUS: f32 = 200.0;

pub fn draw(surface: &mut FrameSurface, frame: &SceneFrame<'_>) {
    let (w, h, p) = (frame.width, frame.height, frame.progress);

    let bar = Brush::solid(rgba(0, 0, 0, 0.9));
    let bar_height = h * LETTERBOX_FRACTION;
    surface.fill_rect(0.0, 0.0, w, bar_height, &bar);
    surface.fill_rect(0.0, h - bar_height, w, bar_height, &bar);

    let flare_center = (w * (0.3 + (p * PI).sin() * 0.4), h * 0.3);
    let flare = Brush::radial(
        flare_center,
        FLARE_RADIUS,
        rgba(255, 255, 200, 0.3),
        rgba(255, 255, 200, 0.0),
    );
    surface.fill_rect(0.0, 0.0, w, h, &flare);

    for index in 0..frame.element_count() {
        let i = index as f32;
        let x = w * (0.2 + i * 0.2) + (p * TAU + i).sin() * 30.0;
        let y = h * (0.3 + i * 0.15) + (p * PI + i).cos() * 20.0;
        let radius = 40.0 + (p * 4.0 + i).sin() * 10.0;
        if let Some(disc) = circle(x, y, radius) {
            surface.fill_path(&disc, &Brush::solid(with_alpha_u8(frame.color(index), 0x80)));
        }
    }
}

#[cfg(test)]
mod tests {
    use tiny_skia::Color;

    use super::*;
    use crate::palette::parse_palette;
    use crate::schema::Style;
    use crate::styles::test_support::{render, scene};

    #[test]
    fn letterbox_bars_darken_top_and_bottom() {
        let scene = scene(1, 1);
        let palette = parse_palette(&scene.colors);
        let mut surface = FrameSurface::new(160, 90).unwrap();
        surface.clear(Color::WHITE);
        let frame = SceneFrame {
            scene: &scene,
            palette: &palette,
            progress: 0.5,
            width: 160.0,
            height: 90.0,
        };
        draw(&mut surface, &frame);

        // Bars cover rows 0..9 and 81..90; the lone disc stays left of x=90.
        let top = u16::from(surface.pixel(150, 2).unwrap()[0]);
        let middle = u16::from(surface.pixel(150, 45).unwrap()[0]);
        let bottom = u16::from(surface.pixel(150, 87).unwrap()[0]);
        assert!(top + 100 < middle, "top={top} middle={middle}");
        assert!(bottom + 100 < middle, "bottom={bottom} middle={middle}");
    }

    #[test]
    fn flare_position_follows_progress() {
        let empty = render(Style::Cinematic, &scene(0, 1), 0.0).to_rgba();
        let start = render(Style::Cinematic, &scene(1, 1), 0.0).to_rgba();
        let middle = render(Style::Cinematic, &scene(1, 1), 0.5).to_rgba();
        assert_ne!(start, middle);
        assert_ne!(empty, start);
    }

    #[test]
    fn rendering_is_repeatable() {
        let a = render(Style::Cinematic, &scene(3, 3), 0.37).to_rgba();
        let b = render(Style::Cinematic, &scene(3, 3), 0.37).to_rgba();
        assert_eq!(a, b);
    }
}
