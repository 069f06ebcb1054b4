use std::time::{Duration, Instant};

use anyhow::Result;
use promptreel::playback::{
    FrameSink, PlaybackScheduler, PlaybackState, ResumePolicy, TickOutcome, DEFAULT_SCENE_DURATION,
};
use promptreel::schema::{SceneDescriptor, Style};
use promptreel::segment::scene_table;

#[derive(Default)]
struct Frames(Vec<(usize, f32, String)>);

impl FrameSink for Frames {
    fn render(&mut self, scene_index: usize, scene: &SceneDescriptor, progress: f32) -> Result<()> {
        self.0.push((scene_index, progress, scene.description.clone()));
        Ok(())
    }
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[test]
fn fifty_fps_playback_walks_scenes_in_order_then_rewinds() {
    let mut scheduler = PlaybackScheduler::new(DEFAULT_SCENE_DURATION, ResumePolicy::Continue);
    let mut frames = Frames::default();
    let t0 = Instant::now();
    let interval = ms(20);

    let mut pending = Some(scheduler.start(scene_table(Style::Cinematic).into(), t0).unwrap());
    let mut tick = 0u32;
    let mut finished = false;
    while let Some(handle) = pending.take() {
        match scheduler.tick(handle, t0 + interval * tick, &mut frames).unwrap() {
            TickOutcome::Frame { next, .. } => pending = next,
            TickOutcome::Finished => finished = true,
            TickOutcome::Stale => panic!("tick {tick} was stale"),
        }
        tick += 1;
        assert!(tick < 10_000, "playback never finished");
    }

    assert!(finished);
    assert_eq!(scheduler.state(), PlaybackState::Finished);
    assert_eq!(scheduler.current_scene_index(), 0);

    let indices = frames.0.iter().map(|(index, _, _)| *index).collect::<Vec<_>>();
    assert!(indices.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(indices.first(), Some(&0));
    assert_eq!(indices.last(), Some(&2));
    assert!(frames.0.iter().all(|(_, progress, _)| (0.0..1.0).contains(progress)));
    assert_eq!(frames.0[0].2, scene_table(Style::Cinematic)[0].description);
    // 9s at 50fps: 450 frames, the tick at exactly 9s ends playback.
    assert_eq!(frames.0.len(), 450);
}

#[test]
fn seven_seconds_in_is_a_third_into_the_last_scene() {
    let mut scheduler = PlaybackScheduler::new(DEFAULT_SCENE_DURATION, ResumePolicy::Continue);
    let mut frames = Frames::default();
    let t0 = Instant::now();
    let handle = scheduler.start(scene_table(Style::Abstract).into(), t0).unwrap();

    let outcome = scheduler.tick(handle, t0 + ms(7000), &mut frames).unwrap();
    let TickOutcome::Frame { scene_index, progress, .. } = outcome else {
        panic!("expected a frame, got {outcome:?}");
    };
    assert_eq!(scene_index, 2);
    assert!((progress - 0.333).abs() < 1e-3, "progress {progress}");
    assert_eq!(scheduler.scene_label().as_deref(), Some("Scene 3 of 3"));
}

#[test]
fn late_tick_past_the_end_finishes_without_drawing() {
    let mut scheduler = PlaybackScheduler::new(DEFAULT_SCENE_DURATION, ResumePolicy::Continue);
    let mut frames = Frames::default();
    let t0 = Instant::now();
    let handle = scheduler.start(scene_table(Style::Retro).into(), t0).unwrap();

    assert_eq!(scheduler.tick(handle, t0 + ms(12_345), &mut frames).unwrap(), TickOutcome::Finished);
    assert!(frames.0.is_empty());
    assert!(!scheduler.is_playing());
    assert_eq!(scheduler.current_scene_index(), 0);
}

#[test]
fn restart_after_stop_ignores_old_handles() {
    let mut scheduler = PlaybackScheduler::new(ms(500), ResumePolicy::KeepOrigin);
    let mut frames = Frames::default();
    let t0 = Instant::now();
    let old = scheduler.start(scene_table(Style::Animation).into(), t0).unwrap();
    scheduler.stop();
    scheduler.stop();

    let fresh = scheduler.toggle_playback(t0 + ms(100)).expect("stopped sequence replays");
    assert_eq!(scheduler.tick(old, t0 + ms(200), &mut frames).unwrap(), TickOutcome::Stale);
    let outcome = scheduler.tick(fresh, t0 + ms(700), &mut frames).unwrap();
    assert!(matches!(outcome, TickOutcome::Frame { scene_index: 1, .. }), "{outcome:?}");
}
