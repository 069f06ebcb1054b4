use std::f32::consts::{PI, TAU};

use tiny_skia::Path;

use crate::palette::with_alpha_u8;
use crate::styles::SceneFrame;
use crate::surface::{circle, polygon, rect, Brush, FrameSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Triangle,
    Square,
    Circle,
    Hexagon,
}

pub const PRIMITIVE_CYCLE: [Primitive; 4] = [
    Primitive::Triangle,
    Primitive::Square,
    Primitive::Circle,
    Primitive::Hexagon,
];

const STROKE_WIDTH: f32 = 3.0;

pub fn primitive_for(index: usize) -> Primitive {
    PRIMITIVE_CYCLE[index % PRIMITIVE_CYCLE.len()]
}

/// Rotation in radians for element `index`.
pub fn rotation(progress: f32, index: usize) -> f32 {
    progress * TAU + index as f32
}

/// Path centred on the origin.
pub fn primitive_path(primitive: Primitive, size: f32) -> Option<Path> {
    match primitive {
        Primitive::Circle => circle(0.0, 0.0, size),
        Primitive::Square => rect(-size, -size, size * 2.0, size * 2.0),
        Primitive::Triangle => polygon(&[(0.0, -size), (size, size), (-size, size)]),
        Primitive::Hexagon => {
            let points = (0..6)
                .map(|j| {
                    let angle = PI / 3.0 * j as f32;
                    (angle.cos() * size, angle.sin() * size)
                })
                .collect::<Vec<_>>();
            polygon(&points)
        }
    }
}

pub fn draw(surface: &mut FrameSurface, frame: &SceneFrame<'_>) {
    let (w, h, p) = (frame.width, frame.height, frame.progress);

    for index in 0..frame.element_count() {
        let i = index as f32;
        let x = w * (0.15 + i * 0.22) + (p * PI * 3.0 + i).sin() * 60.0;
        let y = h * (0.3 + (index % 2) as f32 * 0.3) + (p * TAU + i).cos() * 50.0;
        let size = 70.0 + (p * 5.0 + i).sin() * 20.0;

        let Some(path) = primitive_path(primitive_for(index), size) else {
            continue;
        };
        surface.save();
        surface.translate(x, y);
        surface.rotate(rotation(p, index));
        surface.fill_path(&path, &Brush::solid(with_alpha_u8(frame.color(index), 0xCC)));
        surface.stroke_path(&path, frame.color(index + 1), STROKE_WIDTH);
        surface.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_cycle_by_index() {
        assert_eq!(primitive_for(0), Primitive::Triangle);
        assert_eq!(primitive_for(3), Primitive::Hexagon);
        assert_eq!(primitive_for(4), Primitive::Triangle);
        assert_eq!(primitive_for(6), Primitive::Circle);
    }

    #[test]
    fn rotation_grows_linearly_with_progress() {
        let step = rotation(0.5, 2) - rotation(0.25, 2);
        assert!((step - TAU * 0.25).abs() < 1e-5);
        assert_eq!(rotation(0.0, 2), 2.0);
    }

    #[test]
    fn every_primitive_builds_a_path() {
        for primitive in PRIMITIVE_CYCLE {
            let path = primitive_path(primitive, 10.0).expect("path should build");
            let bounds = path.bounds();
            assert!(bounds.width() > 19.0 && bounds.width() <= 20.5);
        }
    }
}
