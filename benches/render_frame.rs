//! Frame compose benchmarks, one per style at the default 800x450 canvas.
//! Run: cargo bench
//!
//! Captions are drawn without text so results do not depend on installed fonts.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use promptreel::compositor::FrameCompositor;
use promptreel::grain::{GrainSettings, XorShift64};
use promptreel::schema::Style;
use promptreel::segment::scene_table;

fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_frame");
    group.sample_size(50);

    let mut compositor = FrameCompositor::new(800, 450, None, GrainSettings::default()).expect("create compositor");
    for style in Style::ALL {
        let scene = scene_table(style).remove(0);
        group.bench_function(format!("{}_800x450", style.id()), |b| {
            let mut noise = XorShift64::from_seed(7);
            b.iter(|| {
                compositor
                    .compose(style.id(), &scene, black_box(0.42), &mut noise)
                    .expect("compose");
                black_box(compositor.surface().data().len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compose);
criterion_main!(benches);
