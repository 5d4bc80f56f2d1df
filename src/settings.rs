//! Line-oriented settings files describing one simulated day.
//!
//! Layout:
//!
//! ```text
//! L = 10            capacity threshold (kW)
//! nb_slots = 36     number of slots
//! C0 = 0.1          flat cost coefficient
//! C1 = 0.05         ramp slope
//!                   (ignored)
//! 2                 number of task groups
//! 8 6 3.0           count duration power
//! 6 12 1.5
//! ```
//!
//! Labelled lines take their last token as the value; labels are free text.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::ConfigError;
use crate::sim::types::{RunConfig, TaskGroup};

const DOMESTIC: &str = include_str!("../settings/domestic.in");
const HETEROGENEOUS: &str = include_str!("../settings/heterogeneous.in");
const TWO_PLAYERS: &str = include_str!("../settings/two_players.in");

/// Available built-in settings names.
pub const PRESETS: &[&str] = &["domestic", "heterogeneous", "two_players"];

/// Loads a built-in settings preset.
///
/// # Errors
///
/// Returns a `ConfigError` if the preset name is unknown.
pub fn from_preset(name: &str) -> Result<RunConfig, ConfigError> {
    let source = match name {
        "domestic" => DOMESTIC,
        "heterogeneous" => HETEROGENEOUS,
        "two_players" => TWO_PLAYERS,
        _ => {
            return Err(ConfigError::new(
                "preset",
                format!("unknown preset \"{name}\", available: {}", PRESETS.join(", ")),
            ));
        }
    };
    parse_settings(source)
}

/// Reads and parses a settings file.
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read or is malformed.
pub fn from_file(path: &Path) -> Result<RunConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| {
        ConfigError::new("settings", format!("cannot read \"{}\": {e}", path.display()))
    })?;
    parse_settings(&content)
}

/// Parses settings text into a run configuration.
///
/// # Errors
///
/// Returns a `ConfigError` naming the offending line if a line is missing,
/// has the wrong number of fields, or holds a non-numeric value, and for any
/// constraint [`RunConfig::new`] rejects.
pub fn parse_settings(source: &str) -> Result<RunConfig, ConfigError> {
    let mut lines = source.lines().enumerate();
    let mut next_line = |what: &str| {
        lines
            .next()
            .map(|(i, line)| (i + 1, line))
            .ok_or_else(|| ConfigError::new("settings", format!("missing {what} line")))
    };

    let capacity_kw: f64 = labelled_value(next_line("capacity threshold")?)?;
    let total_slots: i64 = labelled_value(next_line("slot count")?)?;
    let base_cost: f64 = labelled_value(next_line("C0")?)?;
    let ramp_cost: f64 = labelled_value(next_line("C1")?)?;
    next_line("separator")?;

    let (n, line) = next_line("group count")?;
    let group_count: usize = match line.split_whitespace().next() {
        Some(token) => parse_token(token, n)?,
        None => return Err(line_error(n, "expected the number of task groups")),
    };

    let mut groups = Vec::new();
    for _ in 0..group_count {
        let (n, line) = next_line("task group")?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [count, slots, power] = fields.as_slice() else {
            return Err(line_error(
                n,
                format!("expected `count duration power`, got {} fields", fields.len()),
            ));
        };
        groups.push(TaskGroup::new(
            parse_token(count, n)?,
            parse_token(slots, n)?,
            parse_token(power, n)?,
        ));
    }

    let total_slots = usize::try_from(total_slots)
        .ok()
        .filter(|&s| s > 0)
        .ok_or_else(|| {
            ConfigError::new("total_slots", format!("must be > 0, got {total_slots}"))
        })?;

    RunConfig::new(total_slots, capacity_kw, base_cost, ramp_cost, &groups)
}

fn labelled_value<T: FromStr>((n, line): (usize, &str)) -> Result<T, ConfigError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.as_slice() {
        [_, .., value] => parse_token(value, n),
        _ => Err(line_error(n, "expected `label = value`")),
    }
}

fn parse_token<T: FromStr>(token: &str, line: usize) -> Result<T, ConfigError> {
    token
        .parse()
        .map_err(|_| line_error(line, format!("invalid numeric value \"{token}\"")))
}

fn line_error(line: usize, message: impl Into<String>) -> ConfigError {
    ConfigError::new(format!("line {line}"), message)
}
