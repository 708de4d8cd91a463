//! Benchmarks for the sampling policies.
//!
//! Run with: cargo bench
//!
//! Synthetic benchmarks always run; real-video benchmarks need fixture
//! files from `tests/fixtures/generate_fixtures.sh`.

use std::{hint::black_box, path::Path, time::Duration};

use criterion::Criterion;
use ffmpeg_next::util::log::Level as LogLevel;
use framesift::{MemorySource, SampleOptions, SamplingPolicy, sample, sample_file};
use image::{Rgb, RgbImage};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

/// 300 frames at 640x360 with a cut every 30 frames.
fn synthetic_frames() -> Vec<RgbImage> {
    (0..300u32)
        .map(|index| {
            let shade = ((index / 30) * 25) as u8;
            RgbImage::from_pixel(640, 360, Rgb([shade, shade / 2, 255 - shade]))
        })
        .collect()
}

fn benchmark_synthetic(criterion: &mut Criterion) {
    let frames = synthetic_frames();
    let mut group = criterion.benchmark_group("synthetic 640x360");
    group.sample_size(20);

    for (name, policy) in [
        ("interval", SamplingPolicy::Interval),
        ("change", SamplingPolicy::on_change(30.0)),
        ("spread", SamplingPolicy::Spread),
    ] {
        let options = SampleOptions::new()
            .with_policy(policy)
            .with_num_frames(10);
        group.bench_function(name, |bencher| {
            bencher.iter_batched(
                || MemorySource::new(frames.clone()),
                |mut source| black_box(sample(&mut source, &options).unwrap()),
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn benchmark_video_file(criterion: &mut Criterion) {
    ffmpeg_next::util::log::set_level(LogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let mut group = criterion.benchmark_group("video file");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("interval (5 frames)", |bencher| {
        let options = SampleOptions::new().with_num_frames(5);
        bencher.iter(|| black_box(sample_file(SAMPLE_VIDEO, &options).unwrap()));
    });

    group.bench_function("change (30 frames)", |bencher| {
        let options = SampleOptions::new()
            .with_policy(SamplingPolicy::on_change(30.0))
            .with_num_frames(30);
        bencher.iter(|| black_box(sample_file(SAMPLE_VIDEO, &options).unwrap()));
    });

    group.finish();
}

criterion::criterion_group!(benches, benchmark_synthetic, benchmark_video_file);
criterion::criterion_main!(benches);
