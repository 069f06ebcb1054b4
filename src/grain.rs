//! Film grain: sparse additive noise over a premultiplied RGBA8 frame.
//!
//! Randomness comes from a [`NoiseSource`] so callers can substitute a fixed
//! sequence. The default source is a seed-locked xorshift64* generator,
//! re-seeded once per frame.

/// Tiny deterministic PRNG (xorshift64*).
#[derive(Debug, Clone, Copy)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    /// `seed = 0` is remapped to a non-zero internal state so the generator
    /// cannot lock into an all-zero sequence.
    pub const fn from_seed(seed: u64) -> Self {
        let mixed = seed ^ 0x9E37_79B9_7F4A_7C15;
        let state = if mixed == 0 {
            0xA076_1D64_78BD_642F
        } else {
            mixed
        };
        Self { state }
    }

    #[inline(always)]
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }
}

/// Source of uniform samples in `[0, 1)`.
pub trait NoiseSource {
    fn next_unit(&mut self) -> f32;
}

impl NoiseSource for XorShift64 {
    #[inline(always)]
    fn next_unit(&mut self) -> f32 {
        // Top 24 bits map exactly onto the f32 mantissa.
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }
}

/// Seed for frame `frame_number` of a session seeded with `session_seed`.
pub fn frame_seed(session_seed: u64, frame_number: u64) -> u64 {
    let mut x = session_seed ^ frame_number.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrainSettings {
    /// Chance that a given pixel receives noise.
    pub probability: f32,
    /// Noise is drawn from `[0, max_noise)` and added to R, G and B.
    pub max_noise: f32,
}

impl Default for GrainSettings {
    fn default() -> Self {
        Self {
            probability: 0.05,
            max_noise: 50.0,
        }
    }
}

/// Adds grain in place and returns how many pixels were touched.
///
/// Two samples are drawn per pixel regardless of the outcome of the first, so
/// the consumed sequence length depends only on the frame size. Alpha is never
/// modified and channels saturate at their alpha (valid premultiplied output).
pub fn apply_film_grain(rgba: &mut [u8], settings: GrainSettings, noise: &mut dyn NoiseSource) -> usize {
    let threshold = 1.0 - settings.probability.clamp(0.0, 1.0);
    let mut touched = 0;
    for pixel in rgba.chunks_exact_mut(4) {
        let roll = noise.next_unit();
        let amount = noise.next_unit() * settings.max_noise.max(0.0);
        if roll <= threshold || settings.probability <= 0.0 {
            continue;
        }
        let add = amount as u16;
        if add == 0 {
            continue;
        }
        let ceiling = u16::from(pixel[3]);
        for channel in &mut pixel[..3] {
            *channel = (u16::from(*channel) + add).min(ceiling) as u8;
        }
        touched += 1;
    }
    touched
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<f32>, usize);

    impl NoiseSource for Fixed {
        fn next_unit(&mut self) -> f32 {
            let value = self.0[self.1 % self.0.len()];
            self.1 += 1;
            value
        }
    }

    fn gray_frame(pixels: usize) -> Vec<u8> {
        [100u8, 100, 100, 255].repeat(pixels)
    }

    #[test]
    fn unit_samples_stay_in_range() {
        let mut rng = XorShift64::from_seed(0);
        for _ in 0..10_000 {
            let value = rng.next_unit();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn fixed_source_controls_every_pixel() {
        let mut frame = gray_frame(2);
        // pixel 0: roll 0.99 (hit) amount 0.5 -> +25; pixel 1: roll 0.1 (miss)
        let mut noise = Fixed(vec![0.99, 0.5, 0.1, 0.9], 0);
        let touched = apply_film_grain(&mut frame, GrainSettings::default(), &mut noise);
        assert_eq!(touched, 1);
        assert_eq!(&frame[..4], &[125, 125, 125, 255]);
        assert_eq!(&frame[4..], &[100, 100, 100, 255]);
    }

    #[test]
    fn noise_is_bounded_and_alpha_preserved() {
        let mut frame = gray_frame(4096);
        let mut rng = XorShift64::from_seed(frame_seed(7, 3));
        apply_film_grain(&mut frame, GrainSettings::default(), &mut rng);
        for pixel in frame.chunks_exact(4) {
            assert_eq!(pixel[3], 255);
            assert!(pixel[0] >= 100 && pixel[0] < 150);
        }
    }

    #[test]
    fn touched_fraction_tracks_probability() {
        let mut frame = gray_frame(20_000);
        let mut rng = XorShift64::from_seed(42);
        let touched = apply_film_grain(&mut frame, GrainSettings::default(), &mut rng);
        let fraction = touched as f32 / 20_000.0;
        assert!(fraction > 0.03 && fraction < 0.07, "fraction was {fraction}");
    }

    #[test]
    fn zero_probability_leaves_frame_untouched() {
        let mut frame = gray_frame(64);
        let mut rng = XorShift64::from_seed(1);
        let settings = GrainSettings {
            probability: 0.0,
            ..GrainSettings::default()
        };
        assert_eq!(apply_film_grain(&mut frame, settings, &mut rng), 0);
        assert_eq!(frame, gray_frame(64));
    }

    #[test]
    fn frame_seeds_differ_between_frames() {
        assert_ne!(frame_seed(9, 0), frame_seed(9, 1));
        assert_eq!(frame_seed(9, 5), frame_seed(9, 5));
    }
}
