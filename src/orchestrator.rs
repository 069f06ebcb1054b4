//! Prompt → scenes → playback pipeline.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::config::{PlaybackConfig, StageConfig};
use crate::playback::{PlaybackScheduler, TickHandle};
use crate::prompt::PromptEnhancer;
use crate::schema::SceneSequence;
use crate::segment::SceneSegmenter;

pub const STATUS_ENHANCING: &str = "Enhancing your prompt...";
pub const STATUS_SEGMENTING: &str = "Segmenting into scenes...";
pub const STATUS_RENDERING: &str = "Rendering video...";
pub const STATUS_FAILED: &str = "Error generating video. Please try again.";

/// Pauses between pipeline stages.
pub trait StageTimer {
    fn wait(&mut self, delay: Duration) -> Result<()>;

    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Blocks the calling thread for each delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepTimer;

impl StageTimer for SleepTimer {
    fn wait(&mut self, delay: Duration) -> Result<()> {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        Ok(())
    }
}

/// Skips every delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl StageTimer for NoDelay {
    fn wait(&mut self, _delay: Duration) -> Result<()> {
        Ok(())
    }
}

/// One user's generation state and its playback.
pub struct Session {
    pub prompt: String,
    pub style_id: String,
    status: Option<String>,
    enhanced_prompt: Option<String>,
    video_generated: bool,
    scheduler: PlaybackScheduler,
}

impl Session {
    pub fn new(prompt: impl Into<String>, style_id: impl Into<String>, playback: &PlaybackConfig) -> Self {
        Self {
            prompt: prompt.into(),
            style_id: style_id.into(),
            status: None,
            enhanced_prompt: None,
            video_generated: false,
            scheduler: PlaybackScheduler::new(playback.scene_duration(), playback.resume),
        }
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn enhanced_prompt(&self) -> Option<&str> {
        self.enhanced_prompt.as_deref()
    }

    pub fn video_generated(&self) -> bool {
        self.video_generated
    }

    pub fn scenes(&self) -> Option<&SceneSequence> {
        self.scheduler.scenes()
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.is_playing()
    }

    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut PlaybackScheduler {
        &mut self.scheduler
    }

    pub fn toggle_playback(&mut self, now: Instant) -> Option<TickHandle> {
        self.scheduler.toggle_playback(now)
    }

    pub fn scene_label(&self) -> Option<String> {
        self.scheduler.scene_label()
    }

    fn announce(&mut self, status: &str, on_status: &mut dyn FnMut(&str)) {
        tracing::info!(status, "generation stage");
        self.status = Some(status.to_owned());
        on_status(status);
    }

    fn reset_output(&mut self) {
        self.scheduler.clear();
        self.enhanced_prompt = None;
        self.video_generated = false;
    }
}

#[derive(Debug)]
pub enum GenerationOutcome {
    /// Prompt was blank; the session is untouched.
    Skipped,
    Completed {
        scene_count: usize,
        handle: TickHandle,
        started_at: Instant,
    },
    /// A stage failed; the session holds no output and shows [`STATUS_FAILED`].
    Failed(anyhow::Error),
}

impl GenerationOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

pub struct GenerationOrchestrator<E, S, T> {
    enhancer: E,
    segmenter: S,
    timer: T,
    stages: StageConfig,
}

impl<E, S, T> GenerationOrchestrator<E, S, T>
where
    E: PromptEnhancer,
    S: SceneSegmenter,
    T: StageTimer,
{
    pub fn new(enhancer: E, segmenter: S, timer: T, stages: StageConfig) -> Self {
        Self {
            enhancer,
            segmenter,
            timer,
            stages,
        }
    }

    /// Runs the pipeline for the session's current prompt and style and
    /// starts playback on success. `on_status` sees every status string as it
    /// is announced.
    pub fn generate(&mut self, session: &mut Session, on_status: &mut dyn FnMut(&str)) -> GenerationOutcome {
        if session.prompt.trim().is_empty() {
            tracing::debug!("blank prompt, nothing to generate");
            return GenerationOutcome::Skipped;
        }

        session.reset_output();
        match self.run_stages(session, on_status) {
            Ok((enhanced, scenes)) => {
                let started_at = self.timer.now();
                let handle = match session.scheduler.start(scenes, started_at) {
                    Ok(handle) => handle,
                    Err(error) => return Self::fail(session, error, on_status),
                };
                let scene_count = session.scheduler.scene_count();
                session.enhanced_prompt = Some(enhanced);
                session.video_generated = true;
                session.status = None;
                tracing::info!(scene_count, style_id = %session.style_id, "generation completed");
                GenerationOutcome::Completed {
                    scene_count,
                    handle,
                    started_at,
                }
            }
            Err(error) => Self::fail(session, error, on_status),
        }
    }

    fn run_stages(
        &mut self,
        session: &mut Session,
        on_status: &mut dyn FnMut(&str),
    ) -> Result<(String, SceneSequence)> {
        session.announce(STATUS_ENHANCING, on_status);
        let enhanced = self
            .enhancer
            .enhance(&session.prompt, &session.style_id)
            .context("prompt enhancement failed")?;
        self.timer.wait(Duration::from_millis(self.stages.enhance_ms))?;

        session.announce(STATUS_SEGMENTING, on_status);
        let scenes = self
            .segmenter
            .segment(&session.style_id)
            .context("scene segmentation failed")?;
        self.timer.wait(Duration::from_millis(self.stages.segment_ms))?;

        session.announce(STATUS_RENDERING, on_status);
        self.timer.wait(Duration::from_millis(self.stages.render_ms))?;
        Ok((enhanced, scenes))
    }

    fn fail(session: &mut Session, error: anyhow::Error, on_status: &mut dyn FnMut(&str)) -> GenerationOutcome {
        tracing::warn!(error = %format!("{error:#}"), "generation failed");
        session.reset_output();
        session.status = Some(STATUS_FAILED.to_owned());
        on_status(STATUS_FAILED);
        GenerationOutcome::Failed(error)
    }
}
