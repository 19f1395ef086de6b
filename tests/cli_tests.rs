//! 命令行解析测试

use clap::error::ErrorKind;
use std::path::PathBuf;
use zerochecker::core::{AnalysisMode, RunConfiguration};
use zerochecker::tools::{RewritePolicy, parse_args_from};

#[test]
fn test_defaults() {
    let config = parse_args_from(["zerochecker", "a.wav"]).unwrap();
    assert_eq!(config.inputs, vec![PathBuf::from("a.wav")]);
    assert_eq!(config.offset, 0);
    assert_eq!(config.num_samples, -1);
    assert_eq!(config.consecutive, 0);
    assert_eq!(config.max_magnitude, 1.0);
    assert_eq!(config.min_magnitude, 0.003);
    assert_eq!(config.mono_threshold, None);
    assert_eq!(config.rewrite, RewritePolicy::Ask);
    assert!(config.csv_path.is_none());
    assert!(!config.verbose);

    let run = RunConfiguration::from_settings(&config.run_settings()).unwrap();
    assert_eq!(run.mode, AnalysisMode::Boundary);
    assert_eq!(run.min_run, 0);
}

#[test]
fn test_short_flags_and_negative_values() {
    let config = parse_args_from([
        "zerochecker",
        "-o",
        "-5",
        "-n",
        "-1",
        "-s",
        "10",
        "-x",
        "0.9",
        "-y",
        "0.01",
        "-m",
        "0.95",
        "-c",
        "out",
        "-j",
        "out.json",
        "-p",
        "2",
        "x.flac",
        "folder",
    ])
    .unwrap();

    assert_eq!(config.offset, -5);
    assert_eq!(config.num_samples, -1);
    assert_eq!(config.consecutive, 10);
    assert_eq!(config.max_magnitude, 0.9);
    assert_eq!(config.min_magnitude, 0.01);
    assert_eq!(config.mono_threshold, Some(0.95));
    assert_eq!(config.csv_path, Some(PathBuf::from("out")));
    assert_eq!(config.json_path, Some(PathBuf::from("out.json")));
    assert_eq!(config.parallel_files, Some(2));
    assert_eq!(config.inputs.len(), 2);

    let run = RunConfiguration::from_settings(&config.run_settings()).unwrap();
    assert_eq!(run.start_offset, 0);
    assert_eq!(run.min_run, 10);
    assert!(run.mode.is_mono());
}

#[test]
fn test_rewrite_policy_flags() {
    let yes = parse_args_from(["zerochecker", "--yes", "a.wav"]).unwrap();
    assert_eq!(yes.rewrite, RewritePolicy::Always);

    let no = parse_args_from(["zerochecker", "--no-rewrite", "a.wav"]).unwrap();
    assert_eq!(no.rewrite, RewritePolicy::Never);

    let both = parse_args_from(["zerochecker", "--yes", "--no-rewrite", "a.wav"]).unwrap_err();
    assert_eq!(both.kind(), ErrorKind::ArgumentConflict);
}

#[test]
fn test_no_arguments_shows_help() {
    let err = parse_args_from(["zerochecker"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand);
}

#[test]
fn test_version_flag() {
    let err = parse_args_from(["zerochecker", "-v"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayVersion);
}

#[test]
fn test_inverted_band_rejected_before_processing() {
    let config = parse_args_from(["zerochecker", "-x", "0.1", "-y", "0.2", "a.wav"]).unwrap();
    assert!(RunConfiguration::from_settings(&config.run_settings()).is_err());
}

#[test]
fn test_invalid_number_rejected() {
    let err = parse_args_from(["zerochecker", "-s", "many", "a.wav"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValueValidation);
}
