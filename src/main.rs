//! load-shift-sim entry point: CLI wiring, configuration loading, and output.

mod cli;

use std::process;

use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{CliOptions, Mode};
use load_shift_sim::config::StudyConfig;
use load_shift_sim::io::export::{export_profile_csv, export_report_csv, export_sweep_csv};
use load_shift_sim::policies::SchedulingPolicy;
use load_shift_sim::runner::{self, SweepKind};
use load_shift_sim::settings;
use load_shift_sim::sim::types::RunConfig;

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{msg}");
    process::exit(1);
}

fn load_run(cli: &CliOptions) -> RunConfig {
    let run = if let Some(ref path) = cli.settings {
        settings::from_file(path)
    } else {
        settings::from_preset(cli.preset.as_deref().unwrap_or("heterogeneous"))
    };
    run.unwrap_or_else(|e| fail(e))
}

fn load_study(cli: &CliOptions) -> StudyConfig {
    let study = if let Some(ref path) = cli.study {
        StudyConfig::from_toml_file(path)
    } else {
        StudyConfig::from_preset(cli.study_preset.as_deref().unwrap_or("tuned"))
    };
    let mut study = study.unwrap_or_else(|e| fail(e));

    if let Some(seed) = cli.seed {
        study.study.seed = seed;
    }
    if let Some(workers) = cli.workers {
        study.study.workers = workers;
    }

    let errors = study.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    study
}

fn run_study(cli: &CliOptions, study: &StudyConfig, run: &RunConfig) {
    let report = runner::run_study(study, run).unwrap_or_else(|e| fail(e));
    println!("{report}");

    if let Some(ref path) = cli.report_out {
        if let Err(e) = export_report_csv(&report, path) {
            fail(format!("error: failed to write CSV: {e}"));
        }
        eprintln!("Report written to {}", path.display());
    }
}

fn run_sweep(cli: &CliOptions, kind: SweepKind, study: &StudyConfig, run: &RunConfig) {
    let s = &study.study;
    let points = runner::sweep(
        run,
        kind,
        &runner::default_grid(),
        kind.trials_in(study),
        s.seed,
        s.workers,
    )
    .unwrap_or_else(|e| fail(e));

    for p in &points {
        println!("{:>6.3}  GC {}", p.param, p.gc);
    }

    if let Some(ref path) = cli.sweep_out {
        if let Err(e) = export_sweep_csv(&points, path) {
            fail(format!("error: failed to write CSV: {e}"));
        }
        eprintln!("Sweep written to {}", path.display());
    }
}

fn run_tune(kind: SweepKind, study: &StudyConfig, run: &RunConfig) {
    let s = &study.study;
    let best = runner::tune(
        run,
        kind,
        &runner::default_grid(),
        kind.trials_in(study),
        s.seed,
        s.workers,
    )
    .unwrap_or_else(|e| fail(e));

    match best {
        Some((param, gc)) => println!("Best parameter: {param:.3} (GC {gc})"),
        None => println!("Best parameter: n/a (empty grid)"),
    }
}

fn run_profile(cli: &CliOptions, name: &str, study: &StudyConfig, run: &RunConfig) {
    let policy = study.policy_by_name(name).unwrap_or_else(|e| fail(e));
    let sched = policy
        .run(run, study.study.seed)
        .unwrap_or_else(|e| fail(e));
    let profile = sched.profile();
    let capacity = run.capacity_kw();

    for (t, load) in profile.as_slice().iter().enumerate() {
        let flag = if *load > capacity { "  over" } else { "" };
        println!("slot {t:>3}  {load:>8.3} kW{flag}");
    }
    let gc = sched.global_cost().unwrap_or_else(|e| fail(e));
    println!("\n{} (seed {})", policy.name(), study.study.seed);
    println!("Peak load:             {:.3} kW", profile.peak_kw());
    match sched.peak_to_average() {
        Ok(par) => println!("Peak-to-average ratio: {par:.3}"),
        Err(e) => println!("Peak-to-average ratio: n/a ({e})"),
    }
    println!("Global cost:           {gc:.4}");

    if let Some(ref path) = cli.profile_out {
        if let Err(e) = export_profile_csv(profile, capacity, path) {
            fail(format!("error: failed to write CSV: {e}"));
        }
        eprintln!("Profile written to {}", path.display());
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::parse_args().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        cli::print_usage();
        process::exit(1);
    });

    let study = load_study(&cli);
    let run = load_run(&cli)
        .with_day_length_secs(study.day_length_secs())
        .unwrap_or_else(|e| fail(e));
    info!(
        tasks = run.tasks().len(),
        slots = run.total_slots(),
        capacity_kw = run.capacity_kw(),
        "run configuration loaded"
    );

    match &cli.mode {
        Mode::Study => run_study(&cli, &study, &run),
        Mode::Sweep(kind) => run_sweep(&cli, *kind, &study, &run),
        Mode::Tune(kind) => run_tune(*kind, &study, &run),
        Mode::Profile(name) => run_profile(&cli, name, &study, &run),
    }
}
