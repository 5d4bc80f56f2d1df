//! TOML-based study configuration and preset definitions.
//!
//! A study says which policies to compare, with which parameters, and how
//! many trials each gets. The task set itself comes from a settings file
//! (see [`crate::settings`]).

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::policies::{AlohaLike, Game, Policy, TimeSlackness, Uniform};

/// Configuration error with field path and constraint description.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"aloha.prob_safe"`) or `"line N"`.
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    /// Creates a configuration error for `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Top-level study configuration parsed from TOML.
///
/// All sections have defaults matching the tuned parameters for a 36-slot
/// horizon. Load from TOML with [`StudyConfig::from_toml_file`] or use
/// [`StudyConfig::tuned`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyConfig {
    /// Seeding, parallelism, and timing.
    #[serde(default)]
    pub study: StudySection,
    /// Uniform policy trials.
    #[serde(default)]
    pub uniform: UniformConfig,
    /// ALOHA-like I: no acceptance under overage.
    #[serde(default)]
    pub aloha: AlohaConfig,
    /// ALOHA-like II: reduced acceptance under overage.
    #[serde(default = "AlohaConfig::variant_ii")]
    pub aloha_ii: AlohaConfig,
    /// Time/Slackness density policy.
    #[serde(default)]
    pub time_slackness: TimeSlacknessConfig,
    /// Best-response game.
    #[serde(default)]
    pub game: GameConfig,
}

/// Seeding, parallelism, and timing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudySection {
    /// Master random seed; trial `i` uses `seed + i`.
    pub seed: u64,
    /// Worker threads for trial execution (must be > 0).
    pub workers: usize,
    /// Simulated day length in hours (must be > 0).
    pub day_length_hours: f64,
}

impl Default for StudySection {
    fn default() -> Self {
        Self {
            seed: 42,
            workers: 4,
            day_length_hours: 6.0,
        }
    }
}

/// Uniform policy trials.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UniformConfig {
    /// Number of trials (0 skips the policy).
    pub trials: usize,
}

impl Default for UniformConfig {
    fn default() -> Self {
        Self { trials: 200 }
    }
}

/// ALOHA-like policy parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlohaConfig {
    /// Number of trials (0 skips the policy).
    pub trials: usize,
    /// Per-slot acceptance probability while under the threshold.
    pub prob_safe: f64,
    /// Per-slot acceptance probability otherwise.
    pub prob_overage: f64,
}

impl Default for AlohaConfig {
    fn default() -> Self {
        Self {
            trials: 200,
            prob_safe: 0.2,
            prob_overage: 0.0,
        }
    }
}

impl AlohaConfig {
    /// Defaults for the ALOHA-like II variant.
    pub fn variant_ii() -> Self {
        Self {
            trials: 200,
            prob_safe: 0.145,
            prob_overage: 0.0175,
        }
    }
}

/// Time/Slackness policy parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeSlacknessConfig {
    /// Number of trials (0 skips the policy).
    pub trials: usize,
    /// Weight of the slack-driven term of the decision density.
    pub alpha: f64,
}

impl Default for TimeSlacknessConfig {
    fn default() -> Self {
        Self {
            trials: 200,
            alpha: 0.06,
        }
    }
}

/// Best-response game parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Number of trials (0 skips the policy).
    pub trials: usize,
    /// Extra random plays per task after the first full round.
    pub rounds_ratio: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            trials: 5,
            rounds_ratio: 2,
        }
    }
}

/// One policy of a study with its label and trial count.
#[derive(Debug, Clone)]
pub struct PolicyEntry {
    /// Display label.
    pub label: &'static str,
    /// Configured policy.
    pub policy: Policy,
    /// Number of trials.
    pub trials: usize,
}

impl StudyConfig {
    /// Returns the tuned study (parameters found best for 36 slots).
    pub fn tuned() -> Self {
        Self {
            study: StudySection::default(),
            uniform: UniformConfig::default(),
            aloha: AlohaConfig::default(),
            aloha_ii: AlohaConfig::variant_ii(),
            time_slackness: TimeSlacknessConfig::default(),
            game: GameConfig::default(),
        }
    }

    /// Returns the quick preset: same parameters, few trials.
    pub fn quick() -> Self {
        let tuned = Self::tuned();
        Self {
            uniform: UniformConfig { trials: 20 },
            aloha: AlohaConfig {
                trials: 20,
                ..tuned.aloha
            },
            aloha_ii: AlohaConfig {
                trials: 20,
                ..tuned.aloha_ii
            },
            time_slackness: TimeSlacknessConfig {
                trials: 20,
                ..tuned.time_slackness
            },
            game: GameConfig {
                trials: 2,
                ..tuned.game
            },
            study: tuned.study,
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["tuned", "quick"];

    /// Loads a study from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "tuned" => Ok(Self::tuned()),
            "quick" => Ok(Self::quick()),
            _ => Err(ConfigError::new(
                "study_preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a study from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("study", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a study from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Simulated day length in seconds.
    pub fn day_length_secs(&self) -> f64 {
        self.study.day_length_hours * 3600.0
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.study;

        if s.workers == 0 {
            errors.push(ConfigError::new("study.workers", "must be > 0"));
        }
        if !(s.day_length_hours.is_finite() && s.day_length_hours > 0.0) {
            errors.push(ConfigError::new("study.day_length_hours", "must be > 0"));
        }

        for (name, aloha) in [("aloha", &self.aloha), ("aloha_ii", &self.aloha_ii)] {
            if !(0.0..=1.0).contains(&aloha.prob_safe) {
                errors.push(ConfigError::new(
                    format!("{name}.prob_safe"),
                    "must be in [0.0, 1.0]",
                ));
            }
            if !(0.0..=1.0).contains(&aloha.prob_overage) {
                errors.push(ConfigError::new(
                    format!("{name}.prob_overage"),
                    "must be in [0.0, 1.0]",
                ));
            }
        }

        let ts = &self.time_slackness;
        if !(ts.alpha.is_finite() && ts.alpha >= 0.0) {
            errors.push(ConfigError::new(
                "time_slackness.alpha",
                "must be finite and >= 0",
            ));
        }

        errors
    }

    /// Returns the first validation error, if any.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` reported by [`StudyConfig::validate`].
    pub fn ensure_valid(&self) -> Result<(), ConfigError> {
        match self.validate().into_iter().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Policies with at least one trial, in report order.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a policy parameter is out of range.
    pub fn policies(&self) -> Result<Vec<PolicyEntry>, ConfigError> {
        self.ensure_valid()?;
        let entries = [
            PolicyEntry {
                label: "Game",
                policy: Policy::Game(Game::new(self.game.rounds_ratio)),
                trials: self.game.trials,
            },
            PolicyEntry {
                label: "Time/Slackness",
                policy: Policy::TimeSlackness(TimeSlackness::new(self.time_slackness.alpha)),
                trials: self.time_slackness.trials,
            },
            PolicyEntry {
                label: "ALOHA-like II",
                policy: Policy::Aloha(AlohaLike::new(
                    self.aloha_ii.prob_safe,
                    self.aloha_ii.prob_overage,
                )),
                trials: self.aloha_ii.trials,
            },
            PolicyEntry {
                label: "ALOHA-like I",
                policy: Policy::Aloha(AlohaLike::new(
                    self.aloha.prob_safe,
                    self.aloha.prob_overage,
                )),
                trials: self.aloha.trials,
            },
            PolicyEntry {
                label: "Uniform",
                policy: Policy::Uniform(Uniform),
                trials: self.uniform.trials,
            },
        ];
        Ok(entries.into_iter().filter(|e| e.trials > 0).collect())
    }

    /// Names accepted by [`StudyConfig::policy_by_name`].
    pub const POLICY_NAMES: &[&str] =
        &["game", "time-slackness", "aloha-ii", "aloha", "uniform"];

    /// Looks up one configured policy by its command-line name.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the name is unknown or a policy parameter
    /// is out of range.
    pub fn policy_by_name(&self, name: &str) -> Result<Policy, ConfigError> {
        self.ensure_valid()?;
        let policy = match name {
            "game" => Policy::Game(Game::new(self.game.rounds_ratio)),
            "time-slackness" => {
                Policy::TimeSlackness(TimeSlackness::new(self.time_slackness.alpha))
            }
            "aloha-ii" => Policy::Aloha(AlohaLike::new(
                self.aloha_ii.prob_safe,
                self.aloha_ii.prob_overage,
            )),
            "aloha" => Policy::Aloha(AlohaLike::new(
                self.aloha.prob_safe,
                self.aloha.prob_overage,
            )),
            "uniform" => Policy::Uniform(Uniform),
            _ => {
                return Err(ConfigError::new(
                    "policy",
                    format!(
                        "unknown policy \"{name}\", available: {}",
                        Self::POLICY_NAMES.join(", ")
                    ),
                ));
            }
        };
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuned_preset_valid() {
        let errors = StudyConfig::tuned().validate();
        assert!(errors.is_empty(), "tuned should be valid: {errors:?}");
    }

    #[test]
    fn all_presets_are_valid() {
        for name in StudyConfig::PRESETS {
            let cfg = StudyConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn from_preset_unknown() {
        let e = StudyConfig::from_preset("nonexistent").unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[study]
seed = 7
workers = 2
day_length_hours = 24.0

[uniform]
trials = 10

[aloha]
trials = 30
prob_safe = 0.3
prob_overage = 0.0

[aloha_ii]
trials = 30
prob_safe = 0.2
prob_overage = 0.02

[time_slackness]
trials = 40
alpha = 0.1

[game]
trials = 3
rounds_ratio = 4
"#;
        let cfg = StudyConfig::from_toml_str(toml).expect("valid TOML should parse");
        assert_eq!(cfg.study.seed, 7);
        assert_eq!(cfg.day_length_secs(), 86_400.0);
        assert_eq!(cfg.aloha_ii.prob_overage, 0.02);
        assert_eq!(cfg.game.rounds_ratio, 4);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn partial_toml_uses_section_defaults() {
        let cfg = StudyConfig::from_toml_str("[game]\ntrials = 1\n").expect("should parse");
        assert_eq!(cfg.game.trials, 1);
        assert_eq!(cfg.game.rounds_ratio, 2);
        assert_eq!(cfg.aloha.prob_safe, 0.2);
        assert_eq!(cfg.aloha_ii.prob_safe, 0.145);
        assert_eq!(cfg.study.seed, 42);
    }

    #[test]
    fn unknown_field_rejected() {
        let result = StudyConfig::from_toml_str("[study]\nbogus = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn validation_catches_bad_probability() {
        let mut cfg = StudyConfig::tuned();
        cfg.aloha_ii.prob_overage = 1.5;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "aloha_ii.prob_overage"));
    }

    #[test]
    fn validation_catches_zero_workers() {
        let mut cfg = StudyConfig::tuned();
        cfg.study.workers = 0;
        assert!(cfg.validate().iter().any(|e| e.field == "study.workers"));
    }

    #[test]
    fn policies_skip_zero_trial_entries() {
        let mut cfg = StudyConfig::tuned();
        cfg.game.trials = 0;
        let labels: Vec<&str> = cfg
            .policies()
            .expect("valid study")
            .iter()
            .map(|e| e.label)
            .collect();
        assert_eq!(
            labels,
            vec!["Time/Slackness", "ALOHA-like II", "ALOHA-like I", "Uniform"]
        );
    }

    #[test]
    fn policy_by_name_uses_section_parameters() {
        let cfg = StudyConfig::tuned();
        for name in StudyConfig::POLICY_NAMES {
            assert!(cfg.policy_by_name(name).is_ok(), "{name} should resolve");
        }
        assert_eq!(
            cfg.policy_by_name("aloha-ii"),
            Ok(Policy::Aloha(AlohaLike::new(0.145, 0.0175)))
        );
        let e = cfg.policy_by_name("random").unwrap_err();
        assert_eq!(e.field, "policy");
    }

    #[test]
    fn out_of_range_parameters_fail_instead_of_building_policies() {
        let cfg =
            StudyConfig::from_toml_str("[aloha]\nprob_safe = 1.5\n").expect("should parse");
        let e = cfg.policies().unwrap_err();
        assert_eq!(e.field, "aloha.prob_safe");
        assert!(cfg.policy_by_name("aloha").is_err());
        assert!(cfg.policy_by_name("uniform").is_err());

        let cfg = StudyConfig::from_toml_str("[time_slackness]\nalpha = -1.0\n")
            .expect("should parse");
        assert_eq!(cfg.policies().unwrap_err().field, "time_slackness.alpha");
    }
}
