//! 编排器端到端测试：并行分析 → 报告 → 确认 → 原地重写


use audio_test_fixtures::*;
use std::path::PathBuf;
use zerochecker::audio::UniversalOpener;
use zerochecker::core::{FileRecord, RunConfiguration, RunSettings};
use zerochecker::processing::{
    AnalysisOrchestrator, Confirm, Progress, ReportingSink, RewriteAction, RunOutcome, RunPhase,
    RunSummary,
};
use zerochecker::tools::AutoConfirm;

#[derive(Default)]
struct RecordingSink {
    appended: Vec<String>,
    ticks: Vec<Progress>,
    summary: Option<RunSummary>,
}

impl ReportingSink for RecordingSink {
    fn append_result(&mut self, record: &FileRecord) {
        self.appended.push(record.file_name());
    }
    fn tick(&mut self, progress: Progress) {
        self.ticks.push(progress);
    }
    fn finalize(&mut self, summary: &RunSummary) {
        assert!(self.summary.is_none(), "finalize 只能调用一次");
        self.summary = Some(summary.clone());
    }
}

/// 记录被询问次数的确认器
struct CountingConfirm {
    answer: bool,
    asked: Vec<(RewriteAction, usize)>,
}

impl CountingConfirm {
    fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: Vec::new(),
        }
    }
}

impl Confirm for CountingConfirm {
    fn confirm(&mut self, action: RewriteAction, count: usize) -> bool {
        self.asked.push((action, count));
        self.answer
    }
}

fn boundary_config(consecutive: i64) -> RunConfiguration {
    RunConfiguration::from_settings(&RunSettings {
        consecutive,
        ..RunSettings::default()
    })
    .unwrap()
}

fn mono_config(threshold: f64) -> RunConfiguration {
    RunConfiguration::from_settings(&RunSettings {
        mono_threshold: Some(threshold),
        ..RunSettings::default()
    })
    .unwrap()
}

fn run_with(
    config: &RunConfiguration,
    files: &[PathBuf],
    sink: &mut RecordingSink,
    confirm: &mut dyn Confirm,
) -> RunOutcome {
    let opener = UniversalOpener;
    let mut orchestrator = AnalysisOrchestrator::new(config, &opener, 4);
    assert_eq!(orchestrator.phase(), RunPhase::Idle);
    let outcome = orchestrator.run(files, sink, confirm).unwrap();
    assert_eq!(orchestrator.phase(), RunPhase::Done);
    outcome
}

#[test]
fn test_unreadable_file_dropped_and_progress_complete() {
    let ws = Workspace::new();
    let good = ws.path("good.wav");
    let bad = ws.path("bad.wav");
    let silent = ws.path("silent.wav");
    scenario_a(&good);
    corrupt(&bad);
    silent_stereo(&silent, 10_000);

    let files = vec![good, bad, silent];
    let mut sink = RecordingSink::default();
    let mut confirm = AutoConfirm(false);
    let outcome = run_with(&boundary_config(0), &files, &mut sink, &mut confirm);

    log(format!("报告 {:?}", sink.appended), "appended records");
    assert_eq!(sink.ticks.len(), 3);
    assert_eq!(sink.ticks.last().unwrap().completed, 3);
    assert_eq!(sink.appended.len(), 2);
    assert!(!sink.appended.contains(&"bad.wav".to_string()));

    let summary = sink.summary.unwrap();
    assert_eq!(summary.files_scanned, 3);
    assert_eq!(summary.files_analyzed, 2);
    assert_eq!(summary.files_dropped, 1);
    assert_eq!(summary.files_with_silence, 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].files, vec!["bad.wav".to_string()]);

    assert_eq!(outcome.records.len(), 2);
    assert!(outcome.rewrite.is_none());
}

#[test]
fn test_mono_threshold_filters_reports() {
    let ws = Workspace::new();
    let same = ws.path("same.wav");
    let inverted = ws.path("inverted.wav");
    let single = ws.path("single.wav");
    identical_stereo(&same, 20_000);
    inverted_stereo(&inverted, 20_000);
    mono(&single, 20_000);

    let mut sink = RecordingSink::default();
    let mut confirm = CountingConfirm::new(false);
    let outcome = run_with(
        &mono_config(0.5),
        &[same, inverted, single],
        &mut sink,
        &mut confirm,
    );

    assert_eq!(sink.appended, vec!["same.wav".to_string()]);
    assert_eq!(sink.ticks.len(), 3);
    assert_eq!(outcome.summary.mono_compatible_files, 1);
    assert_eq!(confirm.asked, vec![(RewriteAction::Downmix, 1)]);
    assert!(outcome.rewrite.is_none());
}

#[test]
fn test_confirm_not_asked_when_nothing_reported() {
    let ws = Workspace::new();
    let inverted = ws.path("inverted.wav");
    inverted_stereo(&inverted, 5_000);

    let mut sink = RecordingSink::default();
    let mut confirm = CountingConfirm::new(true);
    let outcome = run_with(&mono_config(0.99), &[inverted], &mut sink, &mut confirm);

    assert!(confirm.asked.is_empty());
    assert!(outcome.records.is_empty());
    assert!(outcome.rewrite.is_none());
    assert!(sink.summary.is_some());
}

#[test]
fn test_trim_rewrite_preserves_retained_samples() {
    let ws = Workspace::new();
    let path = ws.path("trim.wav");
    scenario_a(&path);
    let (_, before) = read_wav_int(&path);

    let mut sink = RecordingSink::default();
    let mut confirm = AutoConfirm(true);
    let outcome = run_with(&boundary_config(0), &[path.clone()], &mut sink, &mut confirm);

    let rewrite = outcome.rewrite.unwrap();
    assert_eq!(rewrite.rewritten, 1);
    assert!(rewrite.failed.is_empty());

    let (spec, after) = read_wav_int(&path);
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_rate, RATE);
    let pad = RATE as usize;
    let body = 8 * RATE as usize;
    for ch in 0..2 {
        assert_eq!(after[ch].len(), body);
        assert_eq!(after[ch], before[ch][pad..pad + body]);
    }
}

#[test]
fn test_silent_file_left_untouched_on_rewrite() {
    let ws = Workspace::new();
    let path = ws.path("silent.wav");
    silent_stereo(&path, 30_000);
    let original = std::fs::read(&path).unwrap();

    let mut sink = RecordingSink::default();
    let mut confirm = AutoConfirm(true);
    let outcome = run_with(&boundary_config(0), &[path.clone()], &mut sink, &mut confirm);

    let rewrite = outcome.rewrite.unwrap();
    assert_eq!(rewrite.rewritten, 0);
    assert_eq!(rewrite.skipped, 1);
    assert_eq!(std::fs::read(&path).unwrap(), original);
}

#[test]
fn test_downmix_keeps_first_channel() {
    let ws = Workspace::new();
    let path = ws.path("dual.wav");
    identical_stereo(&path, 12_345);
    let (_, before) = read_wav_int(&path);

    let mut sink = RecordingSink::default();
    let mut confirm = AutoConfirm(true);
    let outcome = run_with(&mono_config(0.9), &[path.clone()], &mut sink, &mut confirm);

    assert_eq!(outcome.rewrite.unwrap().rewritten, 1);
    let (spec, after) = read_wav_int(&path);
    assert_eq!(spec.channels, 1);
    assert_eq!(after.len(), 1);
    assert_eq!(after[0], before[0]);
}

#[test]
fn test_flac_trim_round_trip() {
    let ws = Workspace::new();
    let path = ws.path("trim.flac");
    write_flac(&path, 16, &padded_stereo_i16(5_000, 20_000));

    let mut sink = RecordingSink::default();
    let mut confirm = AutoConfirm(true);
    let outcome = run_with(&boundary_config(0), &[path.clone()], &mut sink, &mut confirm);
    assert_eq!(outcome.rewrite.unwrap().rewritten, 1);

    // 重新分析：首尾静音已被移除
    let mut sink = RecordingSink::default();
    let mut confirm = AutoConfirm(false);
    let outcome = run_with(&boundary_config(0), &[path], &mut sink, &mut confirm);
    let record = &outcome.records[0];
    assert_eq!(record.length(), 20_000);
    assert_eq!(record.first_boundary(), Some(0));
    assert_eq!(record.last_boundary(), Some(0));
    assert_eq!(outcome.summary.files_with_silence, 0);
}

#[test]
fn test_folder_inputs_analyzed_once() {
    let ws = Workspace::new();
    let nested = ws.root().join("album");
    std::fs::create_dir(&nested).unwrap();
    scenario_a(&nested.join("01.wav"));
    silent_stereo(&nested.join("02.wav"), 1_000);
    std::fs::write(nested.join("cover.jpg"), b"jpeg").unwrap();

    let inputs = zerochecker::tools::collect_inputs(&[ws.root().to_path_buf(), nested.join("01.wav")]);
    assert_eq!(inputs.files.len(), 2);

    let mut sink = RecordingSink::default();
    let mut confirm = AutoConfirm(false);
    let outcome = run_with(&boundary_config(0), &inputs.files, &mut sink, &mut confirm);
    assert_eq!(outcome.summary.files_scanned, 2);
    assert_eq!(sink.ticks.len(), 2);
}

#[test]
fn test_f64_wav_not_rewritten_at_lower_precision() {
    let ws = Workspace::new();
    let path = ws.path("double.wav");
    write_wav_f64(&path, &padded_stereo_float(100, 1_000));
    let original = std::fs::read(&path).unwrap();

    let mut sink = RecordingSink::default();
    let mut confirm = AutoConfirm(true);
    let outcome = run_with(&boundary_config(0), &[path.clone()], &mut sink, &mut confirm);

    // 分析照常进行
    let record = &outcome.records[0];
    assert_eq!(record.first_boundary(), Some(100));
    assert_eq!(record.last_boundary(), Some(100));

    let rewrite = outcome.rewrite.unwrap();
    log(format!("重写结果 {rewrite:?}"), "64-bit float rewrite outcome");
    assert_eq!(rewrite.rewritten, 0);
    assert_eq!(rewrite.skipped, 1);
    assert_eq!(std::fs::read(&path).unwrap(), original, "64位浮点文件不应被降精度重写");
}

#[test]
fn test_24bit_wav_trim_is_sample_exact() {
    let ws = Workspace::new();
    let path = ws.path("hires.wav");
    let mut body: Vec<i32> = (0..5_000).map(|n| (n * 1_597 % 16_000_000) - 8_000_000).collect();
    body[0] = -8_388_608;
    body[4_999] = 8_388_607;
    let mut samples = vec![0; 300];
    samples.extend(&body);
    samples.extend(vec![0; 700]);
    write_wav_int(&path, 24, &[samples]);

    let mut sink = RecordingSink::default();
    let mut confirm = AutoConfirm(true);
    let outcome = run_with(&boundary_config(0), &[path.clone()], &mut sink, &mut confirm);
    assert_eq!(outcome.rewrite.unwrap().rewritten, 1);

    let (spec, after) = read_wav_int(&path);
    assert_eq!(spec.bits_per_sample, 24);
    assert_eq!(after[0], body);
}

#[test]
fn test_f32_wav_trim_is_sample_exact() {
    let ws = Workspace::new();
    let path = ws.path("float.wav");
    let [left, right] = padded_stereo_float(200, 3_000);
    let channels: Vec<Vec<f32>> = [left, right]
        .iter()
        .map(|ch| ch.iter().map(|&s| s as f32).collect())
        .collect();
    write_wav_f32(&path, &channels);

    let mut sink = RecordingSink::default();
    let mut confirm = AutoConfirm(true);
    let outcome = run_with(&boundary_config(0), &[path.clone()], &mut sink, &mut confirm);
    assert_eq!(outcome.rewrite.unwrap().rewritten, 1);

    let (spec, after) = read_wav_f32(&path);
    assert_eq!(spec.bits_per_sample, 32);
    assert_eq!(spec.sample_format, hound::SampleFormat::Float);
    for ch in 0..2 {
        assert_eq!(after[ch], channels[ch][200..3_200]);
    }
}
