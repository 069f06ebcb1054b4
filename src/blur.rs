//! Separable gaussian blur over premultiplied RGBA8 buffers.
//!
//! Weights are quantized to Q16 so the output is bit-stable across platforms.

use anyhow::{bail, Result};

/// Blurs `rgba` in place. `radius` is the standard deviation in pixels, as in
/// CSS `blur(r)`; the kernel extends [`kernel_half_width`] pixels each side.
pub fn blur_rgba8_premul_in_place(rgba: &mut [u8], width: u32, height: u32, radius: u32) -> Result<()> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(4));
    let Some(expected_len) = expected_len else {
        bail!("blur buffer size overflow for {width}x{height}");
    };
    if rgba.len() != expected_len {
        bail!(
            "blur expects {} bytes for {}x{}, got {}",
            expected_len,
            width,
            height,
            rgba.len()
        );
    }
    if radius == 0 || width == 0 || height == 0 {
        return Ok(());
    }

    let kernel = gaussian_kernel_q16(kernel_half_width(radius), radius as f32)?;
    let mut tmp = vec![0u8; expected_len];
    horizontal_pass(rgba, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, rgba, width, height, &kernel);
    Ok(())
}

/// Taps either side of the centre for a blur of `radius`: three sigma.
pub fn kernel_half_width(radius: u32) -> u32 {
    radius.saturating_mul(3)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> Result<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        bail!("blur sigma must be > 0");
    }

    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights_f = (-r..=r)
        .map(|i| (-(f64::from(i) * f64::from(i)) / denom).exp())
        .collect::<Vec<_>>();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        bail!("gaussian kernel sum is zero");
    }

    let mut weights = Vec::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for weight in &weights_f {
        let q = ((weight / sum) * 65536.0).round().clamp(0.0, 65536.0) as i64;
        weights.push(q as u32);
        acc += q;
    }
    // Fold rounding drift into the centre tap so the kernel sums to exactly 1.0.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, kernel: &[u32]) {
    let radius = (kernel.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &weight) in kernel.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(weight) * u64::from(src[idx + c]);
                }
            }
            let out = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, kernel: &[u32]) {
    let radius = (kernel.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &weight) in kernel.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(weight) * u64::from(src[idx + c]);
                }
            }
            let out = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}
