//! Headless prompt-to-scene playback.
//!
//! A prompt and a style id are expanded into a fixed scene sequence
//! ([`orchestrator`]), each scene is painted procedurally as a function of
//! progress ([`styles`], [`compositor`]), and a tick-driven
//! [`playback::PlaybackScheduler`] maps wall-clock time onto scenes.

pub mod blur;
pub mod caption;
pub mod compositor;
pub mod config;
pub mod error_codes;
pub mod export;
pub mod grain;
pub mod orchestrator;
pub mod palette;
pub mod playback;
pub mod prompt;
pub mod schema;
pub mod segment;
pub mod styles;
pub mod surface;
