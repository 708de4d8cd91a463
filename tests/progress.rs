//! Progress and cancellation integration tests.

use std::sync::{Arc, Mutex};

use framesift::{
    CancellationToken, FramesiftError, MemorySource, OperationType, ProgressCallback, ProgressInfo,
    SampleOptions, SamplingPolicy, Sampler, SummaryOptions, sample, summarize_source,
};
use image::{Rgb, RgbImage};

#[derive(Default)]
struct Recorder {
    infos: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for Recorder {
    fn on_progress(&self, info: &ProgressInfo) {
        self.infos.lock().unwrap().push(info.clone());
    }
}

fn flat_video(count: usize) -> MemorySource {
    MemorySource::new((0..count).map(|_| RgbImage::from_pixel(2, 2, Rgb([7, 7, 7]))))
}

// ── CancellationToken ──────────────────────────────────────────────

#[test]
fn cancellation_token_clone_shares_state() {
    let token = CancellationToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());

    token.cancel();
    assert!(clone.is_cancelled());
}

#[test]
fn cancelling_mid_run_stops_before_the_next_read() {
    let token = CancellationToken::new();
    let mut source = flat_video(50);
    let options = SampleOptions::new()
        .with_policy(SamplingPolicy::Interval)
        .with_num_frames(5)
        .with_cancellation(token.clone());

    let mut sampler = Sampler::new(&mut source, &options).expect("Failed to create sampler");
    assert_eq!(sampler.next().unwrap().unwrap().index, 0);
    token.cancel();
    assert!(matches!(sampler.next(), Some(Err(FramesiftError::Cancelled))));
    assert!(sampler.next().is_none());
    drop(sampler);
    assert_eq!(source.frames_read(), 1);
}

/// Cancels its token once `after` frames have been reported.
struct CancelAfter {
    token: CancellationToken,
    after: u64,
}

impl ProgressCallback for CancelAfter {
    fn on_progress(&self, info: &ProgressInfo) {
        if info.current >= self.after {
            self.token.cancel();
        }
    }
}

#[test]
fn cancelling_between_scene_changes_stops_the_scan() {
    let token = CancellationToken::new();
    // A still video: after frame 0 nothing else is ever selected.
    let mut source = flat_video(50);
    let options = SampleOptions::new()
        .with_policy(SamplingPolicy::on_change(30.0))
        .with_num_frames(5)
        .with_cancellation(token.clone())
        .with_progress(Arc::new(CancelAfter { token, after: 3 }));

    let mut sampler = Sampler::new(&mut source, &options).expect("Failed to create sampler");
    assert_eq!(sampler.next().unwrap().unwrap().index, 0);
    assert!(matches!(sampler.next(), Some(Err(FramesiftError::Cancelled))));
    assert_eq!(sampler.frames_scanned(), 3);
    drop(sampler);
    assert_eq!(source.frames_read(), 3);
}

// ── Progress reports ───────────────────────────────────────────────

#[test]
fn scanning_reports_in_batches() {
    let recorder = Arc::new(Recorder::default());
    let mut source = flat_video(100);
    let options = SampleOptions::new()
        .with_num_frames(5)
        .with_batch_size(25)
        .with_progress(recorder.clone());

    sample(&mut source, &options).expect("Failed to sample");

    let infos = recorder.infos.lock().unwrap();
    let currents: Vec<u64> = infos.iter().map(|info| info.current).collect();
    // 81 frames are scanned; the final report follows the last batch.
    assert_eq!(currents, vec![25, 50, 75, 81]);
    assert!(infos.iter().all(|info| info.operation == OperationType::IntervalSampling));
    assert!(infos.iter().all(|info| info.total == Some(100)));
    assert_eq!(infos[0].current_frame, Some(24));
}

#[test]
fn unknown_total_reports_no_percentage() {
    let recorder = Arc::new(Recorder::default());
    let mut source = flat_video(10).with_reported_total(0);
    let options = SampleOptions::new()
        .with_policy(SamplingPolicy::on_change(1.0))
        .with_progress(recorder.clone());

    sample(&mut source, &options).expect("Failed to sample");

    let infos = recorder.infos.lock().unwrap();
    let last = infos.last().expect("final report");
    assert_eq!(last.operation, OperationType::ChangeSampling);
    assert_eq!(last.current, 10);
    assert!(last.percentage.is_none());
}

#[test]
fn summaries_report_captioning() {
    let recorder = Arc::new(Recorder::default());
    let mut source = flat_video(20);
    let options = SummaryOptions::new().with_sample_options(
        SampleOptions::new()
            .with_policy(SamplingPolicy::Spread)
            .with_num_frames(4)
            .with_batch_size(100)
            .with_progress(recorder.clone()),
    );
    let mut captioner =
        |_: &RgbImage| -> Result<String, FramesiftError> { Ok("grey frame".to_string()) };

    summarize_source(&mut source, "grey", &options, &mut captioner).expect("Failed");

    let infos = recorder.infos.lock().unwrap();
    let captioning: Vec<u64> = infos
        .iter()
        .filter(|info| info.operation == OperationType::Captioning)
        .map(|info| info.current)
        .collect();
    assert_eq!(captioning, vec![1, 2, 3, 4, 4]);
    let last = infos.last().unwrap();
    assert_eq!(last.percentage, Some(100.0));
}
