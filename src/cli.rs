use std::env;
use std::path::PathBuf;

use load_shift_sim::runner::SweepKind;

/// What the binary does after loading its configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// Compare every configured policy.
    Study,
    /// Sweep one policy parameter over the default grid.
    Sweep(SweepKind),
    /// Search the default grid for the parameter with the lowest mean cost.
    Tune(SweepKind),
    /// Schedule once with the named policy and show its load profile.
    Profile(String),
}

pub struct CliOptions {
    pub settings: Option<PathBuf>,
    pub preset: Option<String>,
    pub study: Option<PathBuf>,
    pub study_preset: Option<String>,
    pub seed: Option<u64>,
    pub workers: Option<usize>,
    pub mode: Mode,
    pub report_out: Option<PathBuf>,
    pub profile_out: Option<PathBuf>,
    pub sweep_out: Option<PathBuf>,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn set_once<T>(slot: &mut Option<T>, value: T, flag: &str) -> Result<(), String> {
    if slot.replace(value).is_some() {
        return Err(format!("{flag} provided more than once"));
    }
    Ok(())
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut settings = None;
    let mut preset = None;
    let mut study = None;
    let mut study_preset = None;
    let mut seed = None;
    let mut workers = None;
    let mut sweep = None;
    let mut tune = None;
    let mut profile = None;
    let mut report_out = None;
    let mut profile_out = None;
    let mut sweep_out = None;

    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--settings" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --settings (expected a settings file path)",
                )?;
                set_once(&mut settings, PathBuf::from(path), flag)?;
            }
            "--preset" => {
                i += 1;
                let name =
                    args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                set_once(&mut preset, name.to_string(), flag)?;
            }
            "--study" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --study (expected a TOML file path)")?;
                set_once(&mut study, PathBuf::from(path), flag)?;
            }
            "--study-preset" => {
                i += 1;
                let name = args.next_or_err(
                    i,
                    "missing value for --study-preset (expected a preset name)",
                )?;
                set_once(&mut study_preset, name.to_string(), flag)?;
            }
            "--seed" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --seed (expected a u64)")?;
                let value = raw
                    .parse::<u64>()
                    .map_err(|_| format!("--seed value \"{raw}\" is not a valid u64"))?;
                set_once(&mut seed, value, flag)?;
            }
            "--workers" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --workers (expected a count)")?;
                let value = raw
                    .parse::<usize>()
                    .map_err(|_| format!("--workers value \"{raw}\" is not a valid count"))?;
                set_once(&mut workers, value, flag)?;
            }
            "--sweep" => {
                i += 1;
                let name =
                    args.next_or_err(i, "missing value for --sweep (expected a policy name)")?;
                let kind = name.parse::<SweepKind>().map_err(|e| e.to_string())?;
                set_once(&mut sweep, kind, flag)?;
            }
            "--tune" => {
                i += 1;
                let name =
                    args.next_or_err(i, "missing value for --tune (expected a policy name)")?;
                let kind = name.parse::<SweepKind>().map_err(|e| e.to_string())?;
                set_once(&mut tune, kind, flag)?;
            }
            "--profile" => {
                i += 1;
                let name =
                    args.next_or_err(i, "missing value for --profile (expected a policy name)")?;
                set_once(&mut profile, name.to_string(), flag)?;
            }
            "--report-out" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --report-out (expected a file path)")?;
                set_once(&mut report_out, PathBuf::from(path), flag)?;
            }
            "--profile-out" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --profile-out (expected a file path)")?;
                set_once(&mut profile_out, PathBuf::from(path), flag)?;
            }
            "--sweep-out" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --sweep-out (expected a file path)")?;
                set_once(&mut sweep_out, PathBuf::from(path), flag)?;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if settings.is_some() && preset.is_some() {
        return Err(
            "arguments `--settings` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }
    if study.is_some() && study_preset.is_some() {
        return Err(
            "arguments `--study` and `--study-preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    let mode = match (sweep, tune, profile) {
        (Some(kind), None, None) => Mode::Sweep(kind),
        (None, Some(kind), None) => Mode::Tune(kind),
        (None, None, Some(name)) => Mode::Profile(name),
        (None, None, None) => Mode::Study,
        _ => {
            return Err(
                "arguments `--sweep`, `--tune` and `--profile` are mutually exclusive".to_string(),
            );
        }
    };

    if settings.is_none() && preset.is_none() {
        preset = Some("heterogeneous".to_string());
    }
    if study.is_none() && study_preset.is_none() {
        study_preset = Some("tuned".to_string());
    }

    Ok(CliOptions {
        settings,
        preset,
        study,
        study_preset,
        seed,
        workers,
        mode,
        report_out,
        profile_out,
        sweep_out,
    })
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("load-shift-sim: offline demand-response scheduling study");
    eprintln!();
    eprintln!("Usage: load-shift-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --settings <path>        Load the task set from a settings file");
    eprintln!("  --preset <name>          Task set (domestic, heterogeneous, two_players)");
    eprintln!("  --study <path>           Load study parameters from a TOML file");
    eprintln!("  --study-preset <name>    Built-in study (tuned, quick)");
    eprintln!("  --seed <u64>             Override the base seed");
    eprintln!("  --workers <n>            Override the worker thread count");
    eprintln!("  --sweep <policy>         Sweep aloha, aloha-ii or time-slackness");
    eprintln!("  --tune <policy>          Report the best parameter of a swept policy");
    eprintln!("  --profile <policy>       Schedule once and print the load profile");
    eprintln!("  --report-out <path>      Export the study report to CSV");
    eprintln!("  --profile-out <path>     Export the sample load profile to CSV");
    eprintln!("  --sweep-out <path>       Export the sweep to CSV");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("Defaults: --preset heterogeneous --study-preset tuned. Log level via RUST_LOG.");
}
