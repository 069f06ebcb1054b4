//! Wall-clock driven scene playback.
//!
//! The scheduler never owns a timer. The host asks for ticks at its own
//! cadence by passing the armed [`TickHandle`] and the current instant back to
//! [`PlaybackScheduler::tick`]. At most one handle is armed at a time; a handle
//! is re-armed only after the frame for the previous one has been rendered and
//! only while still playing, so a cancelled or replaced session can never draw.

use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::schema::{SceneDescriptor, SceneSequence};

pub const DEFAULT_SCENE_DURATION: Duration = Duration::from_millis(3000);

/// What resuming from a pause does with the time spent paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumePolicy {
    /// Shift the time origin by the paused span; playback continues where it
    /// stopped.
    #[default]
    Continue,
    /// Leave the time origin alone; playback jumps ahead by the paused span.
    KeepOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// No sequence loaded.
    Idle,
    Playing,
    Paused,
    /// Sequence loaded and positioned at its start, not playing. Reached at
    /// the end of the sequence or after `stop`.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Frame {
        scene_index: usize,
        progress: f32,
        next: Option<TickHandle>,
    },
    Finished,
    /// The handle was cancelled or superseded; nothing was drawn.
    Stale,
}

/// Where `elapsed` falls on a timeline of `scene_count` equal scenes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelinePosition {
    At { scene_index: usize, progress: f32 },
    End,
}

pub fn timeline_position(elapsed: Duration, scene_duration: Duration, scene_count: usize) -> TimelinePosition {
    let duration_ns = scene_duration.as_nanos().max(1);
    let elapsed_ns = elapsed.as_nanos();
    if elapsed_ns >= duration_ns * scene_count as u128 {
        return TimelinePosition::End;
    }
    TimelinePosition::At {
        scene_index: (elapsed_ns / duration_ns) as usize,
        progress: ((elapsed_ns % duration_ns) as f64 / duration_ns as f64) as f32,
    }
}

/// Receives one frame per honored tick.
pub trait FrameSink {
    fn render(&mut self, scene_index: usize, scene: &SceneDescriptor, progress: f32) -> Result<()>;
}

pub struct PlaybackScheduler {
    scenes: Option<SceneSequence>,
    scene_duration: Duration,
    resume: ResumePolicy,
    state: PlaybackState,
    start_time: Option<Instant>,
    paused_at: Option<Instant>,
    current_scene_index: usize,
    pending: Option<TickHandle>,
    next_handle: u64,
}

impl PlaybackScheduler {
    pub fn new(scene_duration: Duration, resume: ResumePolicy) -> Self {
        Self {
            scenes: None,
            scene_duration: scene_duration.max(Duration::from_millis(1)),
            resume,
            state: PlaybackState::Idle,
            start_time: None,
            paused_at: None,
            current_scene_index: 0,
            pending: None,
            next_handle: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn current_scene_index(&self) -> usize {
        self.current_scene_index
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.as_ref().map_or(0, |scenes| scenes.len())
    }

    pub fn scenes(&self) -> Option<&SceneSequence> {
        self.scenes.as_ref()
    }

    pub fn scene_duration(&self) -> Duration {
        self.scene_duration
    }

    pub fn pending_tick(&self) -> Option<TickHandle> {
        self.pending
    }

    /// "Scene i of N" for the active scene, `None` when nothing is loaded.
    pub fn scene_label(&self) -> Option<String> {
        let count = self.scene_count();
        if count == 0 {
            return None;
        }
        Some(format!("Scene {} of {}", self.current_scene_index + 1, count))
    }

    /// Loads `scenes` and starts playing from the beginning. Any previously
    /// armed tick is cancelled.
    pub fn start(&mut self, scenes: SceneSequence, now: Instant) -> Result<TickHandle> {
        if scenes.is_empty() {
            bail!("cannot start playback of an empty scene sequence");
        }
        self.pending = None;
        tracing::info!(scenes = scenes.len(), "playback started");
        self.scenes = Some(scenes);
        self.current_scene_index = 0;
        self.paused_at = None;
        self.start_time = Some(now);
        self.state = PlaybackState::Playing;
        Ok(self.arm())
    }

    /// Play/pause transport. Returns the newly armed handle when playback
    /// (re)starts.
    pub fn toggle_playback(&mut self, now: Instant) -> Option<TickHandle> {
        match self.state {
            PlaybackState::Idle => None,
            PlaybackState::Playing => {
                self.pending = None;
                self.paused_at = Some(now);
                self.state = PlaybackState::Paused;
                tracing::debug!(scene = self.current_scene_index, "playback paused");
                None
            }
            PlaybackState::Paused => {
                if self.resume == ResumePolicy::Continue {
                    if let (Some(start), Some(paused_at)) = (self.start_time, self.paused_at) {
                        self.start_time = Some(start + now.saturating_duration_since(paused_at));
                    }
                }
                self.paused_at = None;
                self.state = PlaybackState::Playing;
                tracing::debug!(policy = ?self.resume, "playback resumed");
                Some(self.arm())
            }
            PlaybackState::Finished => {
                self.current_scene_index = 0;
                self.start_time = Some(now);
                self.paused_at = None;
                self.state = PlaybackState::Playing;
                tracing::debug!("playback restarted from the first scene");
                Some(self.arm())
            }
        }
    }

    /// Advances playback to `now` and renders one frame into `sink`.
    ///
    /// If `sink` fails, playback stops and the error is returned.
    pub fn tick(&mut self, handle: TickHandle, now: Instant, sink: &mut dyn FrameSink) -> Result<TickOutcome> {
        if self.pending != Some(handle) || self.state != PlaybackState::Playing {
            return Ok(TickOutcome::Stale);
        }
        self.pending = None;

        let (Some(scenes), Some(start)) = (self.scenes.clone(), self.start_time) else {
            return Ok(TickOutcome::Stale);
        };
        let elapsed = now.saturating_duration_since(start);

        match timeline_position(elapsed, self.scene_duration, scenes.len()) {
            TimelinePosition::End => {
                self.finish();
                tracing::info!("playback reached the end of the sequence");
                Ok(TickOutcome::Finished)
            }
            TimelinePosition::At {
                scene_index,
                progress,
            } => {
                if scene_index != self.current_scene_index {
                    tracing::debug!(scene = scene_index, "scene changed");
                }
                self.current_scene_index = scene_index;
                if let Err(error) = sink.render(scene_index, &scenes[scene_index], progress) {
                    self.stop();
                    return Err(error);
                }
                let next = self.is_playing().then(|| self.arm());
                Ok(TickOutcome::Frame {
                    scene_index,
                    progress,
                    next,
                })
            }
        }
    }

    /// Cancels any armed tick and rewinds to the start. Safe to call
    /// repeatedly.
    pub fn stop(&mut self) {
        if self.scenes.is_some() {
            self.finish();
        } else {
            self.pending = None;
            self.state = PlaybackState::Idle;
            self.current_scene_index = 0;
        }
    }

    /// Stops and unloads the sequence.
    pub fn clear(&mut self) {
        self.stop();
        self.scenes = None;
        self.state = PlaybackState::Idle;
    }

    fn finish(&mut self) {
        self.pending = None;
        self.start_time = None;
        self.paused_at = None;
        self.current_scene_index = 0;
        self.state = PlaybackState::Finished;
    }

    fn arm(&mut self) -> TickHandle {
        self.next_handle += 1;
        let handle = TickHandle(self.next_handle);
        self.pending = Some(handle);
        handle
    }
}
