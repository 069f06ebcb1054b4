use std::f32::consts::PI;

use anyhow::Result;
use tiny_skia::Rect;

use crate::palette::with_alpha_u8;
use crate::styles::SceneFrame;
use crate::surface::{circle, Brush, FrameSurface};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthLayer {
    pub blur_radius: u32,
    pub alpha: f32,
    pub scale: f32,
    pub offset_y: f32,
}

/// Back, focus and front layers in draw order. Only the focus layer is sharp
/// and opaque.
pub const DEPTH_LAYERS: [DepthLayer; 3] = [
    DepthLayer {
        blur_radius: 6,
        alpha: 0.6,
        scale: 0.7,
        offset_y: -50.0,
    },
    DepthLayer {
        blur_radius: 0,
        alpha: 1.0,
        scale: 0.85,
        offset_y: 0.0,
    },
    DepthLayer {
        blur_radius: 3,
        alpha: 0.6,
        scale: 1.0,
        offset_y: 50.0,
    },
];

const BASE_RADIUS: f32 = 80.0;

pub fn draw(surface: &mut FrameSurface, frame: &SceneFrame<'_>) -> Result<()> {
    let (w, h, p) = (frame.width, frame.height, frame.progress);

    for (layer_index, layer) in DEPTH_LAYERS.iter().enumerate() {
        for index in 0..frame.element_count() {
            let i = index as f32;
            let x = w * (0.2 + i * 0.25) + (p * PI + layer_index as f32).sin() * 20.0;
            let y = h * 0.5 + layer.offset_y + (p * PI * 0.5).cos() * 15.0;
            let radius = BASE_RADIUS * layer.scale;
            let Some(disc) = circle(x, y, radius) else {
                continue;
            };
            let brush = Brush::radial(
                (x, y),
                radius,
                frame.color(index),
                with_alpha_u8(frame.color(index + 1), 0x40),
            );

            surface.save();
            surface.set_global_alpha(layer.alpha);
            if layer.blur_radius == 0 {
                surface.fill_path(&disc, &brush);
            } else if let Some(bounds) = Rect::from_xywh(x - radius, y - radius, radius * 2.0, radius * 2.0) {
                surface.with_blurred_layer(bounds, layer.blur_radius, |offscreen| {
                    offscreen.fill_path(&disc, &brush);
                })?;
            }
            surface.restore();
        }
    }
    Ok(())
}
