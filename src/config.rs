use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::error_codes::{CodedError, INVALID_CONFIG};
use crate::grain::GrainSettings;
use crate::playback::ResumePolicy;

pub const MAX_CANVAS_DIMENSION: u32 = 8192;
pub const MAX_FPS: u32 = 240;
/// Ten minutes per scene.
pub const MAX_SCENE_DURATION_MS: u64 = 600_000;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub canvas: CanvasConfig,
    pub playback: PlaybackConfig,
    pub stages: StageConfig,
    pub grain: GrainConfig,
    pub caption: CaptionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 450,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaybackConfig {
    pub scene_duration_ms: u64,
    pub fps: u32,
    pub resume: ResumePolicy,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            scene_duration_ms: 3000,
            fps: 60,
            resume: ResumePolicy::Continue,
        }
    }
}

impl PlaybackConfig {
    pub fn scene_duration(&self) -> Duration {
        Duration::from_millis(self.scene_duration_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }
}

/// Artificial delays after each generation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageConfig {
    pub enhance_ms: u64,
    pub segment_ms: u64,
    pub render_ms: u64,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            enhance_ms: 500,
            segment_ms: 500,
            render_ms: 1000,
        }
    }
}

impl StageConfig {
    pub fn none() -> Self {
        Self {
            enhance_ms: 0,
            segment_ms: 0,
            render_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrainConfig {
    pub seed: u64,
    pub probability: f32,
    pub max_noise: f32,
}

impl Default for GrainConfig {
    fn default() -> Self {
        let settings = GrainSettings::default();
        Self {
            seed: 0,
            probability: settings.probability,
            max_noise: settings.max_noise,
        }
    }
}

impl GrainConfig {
    pub fn settings(&self) -> GrainSettings {
        GrainSettings {
            probability: self.probability,
            max_noise: self.max_noise,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionConfig {
    pub font: Option<PathBuf>,
    pub font_size: f32,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            font: None,
            font_size: 16.0,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        let CanvasConfig { width, height } = self.canvas;
        for (name, value) in [("canvas.width", width), ("canvas.height", height)] {
            if !(1..=MAX_CANVAS_DIMENSION).contains(&value) {
                bail!("{name} must be in 1..={MAX_CANVAS_DIMENSION}, got {value}");
            }
        }
        if !(1..=MAX_SCENE_DURATION_MS).contains(&self.playback.scene_duration_ms) {
            bail!(
                "playback.scene_duration_ms must be in 1..={MAX_SCENE_DURATION_MS}, got {}",
                self.playback.scene_duration_ms
            );
        }
        if !(1..=MAX_FPS).contains(&self.playback.fps) {
            bail!("playback.fps must be in 1..={MAX_FPS}, got {}", self.playback.fps);
        }
        let probability = self.grain.probability;
        if !(0.0..=1.0).contains(&probability) {
            bail!("grain.probability must be in [0, 1], got {probability}");
        }
        if !self.grain.max_noise.is_finite() || self.grain.max_noise < 0.0 {
            bail!("grain.max_noise must be a non-negative number, got {}", self.grain.max_noise);
        }
        if !self.caption.font_size.is_finite() || self.caption.font_size <= 0.0 {
            bail!("caption.font_size must be positive, got {}", self.caption.font_size);
        }
        if let Some(font) = &self.caption.font {
            if !font.is_file() {
                bail!("caption.font does not exist or is not a file: {}", font.display());
            }
        }
        Ok(())
    }
}

/// Parses and validates a config file. Failures carry `INVALID_CONFIG`.
pub fn load_and_validate_config(path: &Path) -> Result<SessionConfig> {
    load_config(path).map_err(|error| {
        anyhow::Error::new(CodedError::usage(INVALID_CONFIG, format!("{error:#}")))
    })
}

fn load_config(path: &Path) -> Result<SessionConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let mut config = parse_config(&contents)
        .map_err(|error| anyhow!("in {}: {error:#}", path.display()))?;

    let config_dir = path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    if let Some(font) = config.caption.font.take() {
        config.caption.font = Some(if font.is_absolute() {
            font
        } else {
            config_dir.join(font)
        });
    }

    config.validate()?;
    tracing::debug!(config = %path.display(), "loaded session config");
    Ok(config)
}

/// Parses YAML without touching the filesystem. An empty document yields the
/// defaults.
pub fn parse_config(contents: &str) -> Result<SessionConfig> {
    if contents.trim().is_empty() {
        return Ok(SessionConfig::default());
    }
    serde_yaml::from_str(contents).map_err(|error| {
        let location = error
            .location()
            .map(|location| format!("line {}, column {}", location.line(), location.column()))
            .unwrap_or_else(|| "unknown location".to_owned());
        anyhow!("failed to parse yaml at {}: {}", location, error)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_codes::find_coded_error;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_document_is_all_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.canvas.width, 800);
        assert_eq!(config.playback.scene_duration(), Duration::from_millis(3000));
        assert_eq!(config.stages.render_ms, 1000);
        config.validate().unwrap();
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse_config("playback:\n  resume: keep_origin\ngrain:\n  seed: 42\n").unwrap();
        assert_eq!(config.playback.resume, ResumePolicy::KeepOrigin);
        assert_eq!(config.playback.fps, 60);
        assert_eq!(config.grain.seed, 42);
        assert_eq!(config.grain.probability, 0.05);
    }

    #[test]
    fn unknown_keys_are_rejected_with_location() {
        let error = parse_config("canvas:\n  width: 640\n  depth: 3\n").unwrap_err();
        let message = format!("{error:#}");
        assert!(message.contains("depth"), "{message}");
        assert!(message.contains("line 3"), "{message}");
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        let cases = [
            "canvas: { width: 0 }",
            "canvas: { height: 9000 }",
            "playback: { fps: 0 }",
            "playback: { fps: 500 }",
            "playback: { scene_duration_ms: 0 }",
            "playback: { scene_duration_ms: 600001 }",
            "playback: { scene_duration_ms: 18446744073709551615 }",
            "grain: { probability: 1.5 }",
            "caption: { font_size: 0 }",
        ];
        for case in cases {
            let config = parse_config(case).unwrap();
            assert!(config.validate().is_err(), "{case} should fail validation");
        }
    }

    #[test]
    fn load_tags_failures_as_invalid_config() {
        let file = write_config("caption:\n  font: missing-font.ttf\n");
        let error = load_and_validate_config(file.path()).unwrap_err();
        let coded = find_coded_error(&error).expect("coded");
        assert_eq!(coded.code, INVALID_CONFIG);
        assert!(coded.message.contains("caption.font"), "{}", coded.message);
    }

    #[test]
    fn font_path_is_resolved_next_to_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("caption.ttf"), b"not really a font").unwrap();
        let path = dir.path().join("session.yaml");
        fs::write(&path, "caption:\n  font: caption.ttf\n").unwrap();

        let config = load_and_validate_config(&path).unwrap();
        assert_eq!(config.caption.font, Some(dir.path().join("caption.ttf")));
    }

    #[test]
    fn frame_interval_follows_fps() {
        let config = parse_config("playback: { fps: 50 }").unwrap();
        assert_eq!(config.playback.frame_interval(), Duration::from_millis(20));
    }
}
