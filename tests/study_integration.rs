//! Integration tests for settings presets, studies, sweeps and CSV export.

mod common;

use load_shift_sim::config::StudyConfig;
use load_shift_sim::io::export::{export_profile_csv, export_report_csv};
use load_shift_sim::runner::{self, SweepKind};
use load_shift_sim::settings;

#[test]
fn all_settings_presets_load() {
    for name in settings::PRESETS {
        let cfg = settings::from_preset(name).expect("preset should load");
        assert!(!cfg.tasks().is_empty(), "preset \"{name}\" has no tasks");
        for (i, task) in cfg.tasks().iter().enumerate() {
            assert_eq!(task.id, i);
            assert!(task.last_start(cfg.total_slots()).is_some());
        }
    }
    let domestic = settings::from_preset("domestic").expect("preset should load");
    assert_eq!(domestic.tasks().len(), 24);
    assert_eq!(domestic.total_slots(), 36);
}

#[test]
fn quick_study_on_domestic_preset() {
    let run = settings::from_preset("domestic").expect("preset should load");
    let mut study = StudyConfig::quick();
    study.study.workers = 3;
    let report = runner::run_study(&study, &run).expect("study should succeed");

    let labels: Vec<&str> = report.rows.iter().map(|r| r.label).collect();
    assert_eq!(
        labels,
        vec!["Game", "Time/Slackness", "ALOHA-like II", "ALOHA-like I", "Uniform"]
    );
    for row in &report.rows {
        assert!(row.gc.mean >= report.min_cost - 1e-9);
        let par = row.par.expect("domestic run carries load");
        assert!(par.mean >= 1.0 - 1e-12);
    }
}

#[test]
fn study_on_loadless_settings_reports_par_as_unavailable() {
    for source in [
        "L = 1\nnb_slots = 4\nC0 = 1\nC1 = 1\n\n1\n2 2 0.0\n",
        "L = 1\nnb_slots = 4\nC0 = 1\nC1 = 1\n\n0\n",
    ] {
        let run = settings::parse_settings(source).expect("settings should parse");
        let report = runner::run_study(&StudyConfig::quick(), &run).expect("study should succeed");
        assert_eq!(report.rows.len(), 5);
        for row in &report.rows {
            assert_eq!(row.gc.mean, 0.0, "{}", row.label);
            assert!(row.par.is_none(), "{} has a PAR", row.label);
        }
        let mut csv = Vec::new();
        load_shift_sim::io::export::write_report_csv(&report, &mut csv).expect("csv export");
        let text = String::from_utf8(csv).expect("utf-8");
        assert!(text.lines().skip(1).all(|l| l.ends_with("n/a,n/a")));
    }
}

#[test]
fn out_of_range_study_parameters_are_reported() {
    let run = common::mixed_config();
    let study = StudyConfig::from_toml_str("[aloha]\nprob_safe = 1.5\n").expect("toml parses");
    let err = runner::run_study(&study, &run).expect_err("probability above 1");
    assert!(matches!(err, runner::RunError::Config(_)), "{err}");
}

#[test]
fn study_results_do_not_depend_on_worker_count() {
    let run = common::mixed_config();
    let mut serial = StudyConfig::quick();
    serial.study.workers = 1;
    let mut parallel = serial.clone();
    parallel.study.workers = 4;

    let a = runner::run_study(&serial, &run).expect("study should succeed");
    let b = runner::run_study(&parallel, &run).expect("study should succeed");
    for (ra, rb) in a.rows.iter().zip(&b.rows) {
        assert_eq!(ra.gc, rb.gc, "{} differs", ra.label);
        assert_eq!(ra.par, rb.par, "{} differs", ra.label);
    }
}

#[test]
fn day_length_scales_costs_linearly() {
    let run = common::mixed_config();
    let long = run
        .clone()
        .with_day_length_secs(run.day_length_secs() * 2.0)
        .expect("positive day length");
    let study = StudyConfig::quick();
    let policy = study.policy_by_name("uniform").expect("known policy");
    let a = runner::sample_profile(&run, &policy, 5).expect("trial should succeed");
    let b = runner::sample_profile(&long, &policy, 5).expect("trial should succeed");
    assert_eq!(a, b);
    assert!((long.min_cost() - 2.0 * run.min_cost()).abs() < 1e-9);
}

#[test]
fn sweep_over_grid_prefix() {
    let run = common::mixed_config();
    let grid: Vec<f64> = runner::default_grid().into_iter().take(4).collect();
    let points = runner::sweep(&run, SweepKind::AlohaII, &grid, 5, 0, 2)
        .expect("sweep should succeed");
    assert_eq!(points.len(), 4);
    assert_eq!(points[3].param, grid[3]);
}

#[test]
fn csv_files_are_written() {
    let run = settings::from_preset("two_players").expect("preset should load");
    let dir = std::env::temp_dir().join(format!("load-shift-sim-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");

    let report = runner::run_study(&StudyConfig::quick(), &run).expect("study should succeed");
    let report_path = dir.join("report.csv");
    export_report_csv(&report, &report_path).expect("report export");
    let text = std::fs::read_to_string(&report_path).expect("report readable");
    assert_eq!(text.lines().count(), 1 + report.rows.len());

    let policy = StudyConfig::tuned().policy_by_name("game").expect("known policy");
    let profile = runner::sample_profile(&run, &policy, 0).expect("trial should succeed");
    let profile_path = dir.join("profile.csv");
    export_profile_csv(&profile, run.capacity_kw(), &profile_path).expect("profile export");
    let text = std::fs::read_to_string(&profile_path).expect("profile readable");
    assert_eq!(text.lines().count(), 1 + run.total_slots());
    assert!(!text.contains("true"), "two players never exceed L");

    std::fs::remove_dir_all(&dir).ok();
}
