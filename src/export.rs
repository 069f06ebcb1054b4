//! Headless playback: drives a session's scheduler with a simulated clock and
//! records every frame.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use image::RgbaImage;
use serde::Serialize;

use crate::compositor::{sha256_hex, FrameCompositor};
use crate::grain::{frame_seed, XorShift64};
use crate::orchestrator::Session;
use crate::playback::{FrameSink, TickHandle, TickOutcome};
use crate::schema::SceneDescriptor;

pub const SUMMARY_FILE_NAME: &str = "run.json";

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub frame_interval: Duration,
    pub grain_seed: u64,
    /// Directory for PNG frames and the run summary. `None` records digests
    /// only.
    pub out_dir: Option<PathBuf>,
    /// Write every n-th frame as PNG; frames in between are still digested.
    pub every_nth: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub prompt: String,
    pub enhanced_prompt: Option<String>,
    pub style_id: String,
    pub width: u32,
    pub height: u32,
    pub frame_interval_ms: f64,
    pub scene_duration_ms: u64,
    pub grain_seed: u64,
    pub frame_count: usize,
    /// sha256 over every frame digest in order.
    pub sequence_digest: String,
    pub scenes: Vec<SceneSummary>,
    pub frames: Vec<FrameRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneSummary {
    pub index: usize,
    pub description: String,
    pub motion: String,
    pub frame_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameRecord {
    pub frame: u64,
    pub scene_index: usize,
    pub progress: f32,
    pub digest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

struct ExportSink<'a> {
    compositor: &'a mut FrameCompositor,
    style_id: &'a str,
    options: &'a ExportOptions,
    frame_number: u64,
    records: Vec<FrameRecord>,
}

impl FrameSink for ExportSink<'_> {
    fn render(&mut self, scene_index: usize, scene: &SceneDescriptor, progress: f32) -> Result<()> {
        let frame_number = self.frame_number;
        self.frame_number += 1;

        let mut noise = XorShift64::from_seed(frame_seed(self.options.grain_seed, frame_number));
        self.compositor
            .compose(self.style_id, scene, progress, &mut noise)
            .with_context(|| format!("failed to compose frame {frame_number}"))?;
        let rgba = self.compositor.rgba();
        let digest = sha256_hex(&rgba);

        let mut path = None;
        if let Some(dir) = &self.options.out_dir {
            if frame_number % u64::from(self.options.every_nth.max(1)) == 0 {
                let file_name = format!("frame_{frame_number:05}.png");
                save_rgba_png(
                    &dir.join(&file_name),
                    self.compositor.width(),
                    self.compositor.height(),
                    rgba,
                )?;
                path = Some(file_name);
            }
        }

        tracing::trace!(frame = frame_number, scene_index, progress, "frame recorded");
        self.records.push(FrameRecord {
            frame: frame_number,
            scene_index,
            progress,
            digest,
            path,
        });
        Ok(())
    }
}

/// Plays the generated sequence to its end, one tick per `frame_interval`
/// after `started_at`.
pub fn export_run(
    session: &mut Session,
    handle: TickHandle,
    started_at: Instant,
    compositor: &mut FrameCompositor,
    options: &ExportOptions,
) -> Result<RunSummary> {
    if options.frame_interval.is_zero() {
        bail!("frame interval must be greater than zero");
    }
    if let Some(dir) = &options.out_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    }

    let style_id = session.style_id.clone();
    let mut sink = ExportSink {
        compositor: &mut *compositor,
        style_id: &style_id,
        options,
        frame_number: 0,
        records: Vec::new(),
    };

    let mut pending = Some(handle);
    let mut tick_index: u32 = 0;
    while let Some(handle) = pending.take() {
        let now = options
            .frame_interval
            .checked_mul(tick_index)
            .and_then(|offset| started_at.checked_add(offset))
            .with_context(|| format!("simulated clock overflowed at tick {tick_index}"))?;
        tick_index = tick_index
            .checked_add(1)
            .context("export ran past the tick limit")?;
        match session.scheduler_mut().tick(handle, now, &mut sink)? {
            TickOutcome::Frame { next, .. } => pending = next,
            TickOutcome::Finished => break,
            TickOutcome::Stale => bail!("playback tick was cancelled during export"),
        }
    }

    let records = sink.records;
    let scenes = session
        .scenes()
        .map(|scenes| {
            scenes
                .iter()
                .enumerate()
                .map(|(index, scene)| SceneSummary {
                    index,
                    description: scene.description.clone(),
                    motion: scene.motion.clone(),
                    frame_count: records.iter().filter(|record| record.scene_index == index).count(),
                })
                .collect()
        })
        .unwrap_or_default();

    let joined = records
        .iter()
        .map(|record| record.digest.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let summary = RunSummary {
        prompt: session.prompt.clone(),
        enhanced_prompt: session.enhanced_prompt().map(str::to_owned),
        style_id,
        width: compositor.width(),
        height: compositor.height(),
        frame_interval_ms: options.frame_interval.as_secs_f64() * 1000.0,
        scene_duration_ms: session.scheduler().scene_duration().as_millis() as u64,
        grain_seed: options.grain_seed,
        frame_count: records.len(),
        sequence_digest: sha256_hex(joined.as_bytes()),
        scenes,
        frames: records,
    };

    if let Some(dir) = &options.out_dir {
        write_summary(&dir.join(SUMMARY_FILE_NAME), &summary)?;
    }
    tracing::info!(
        frames = summary.frame_count,
        sequence_digest = %summary.sequence_digest,
        "export finished"
    );
    Ok(summary)
}

pub fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("failed to serialize run summary")?;
    fs::write(path, json).with_context(|| format!("failed to write run summary {}", path.display()))
}

pub fn save_rgba_png(path: &Path, width: u32, height: u32, rgba: Vec<u8>) -> Result<()> {
    let image = RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
        anyhow::anyhow!(
            "failed to construct image buffer for {}x{} RGBA frame",
            width,
            height
        )
    })?;
    image
        .save(path)
        .with_context(|| format!("failed to write png {}", path.display()))
}
