//! Configuration for the simulator, the parameter sweeps and the request defaults.
//!
//! Every section is optional in the TOML file; missing values fall back to the
//! standard BB84 constants so an empty file reproduces the default behaviour.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Bb84Error, Result};

/// Standard BB84 security threshold on the estimated QBER.
pub const QBER_THRESHOLD: f64 = 0.11;

/// Error rate an intercept-resend attacker introduces on each intercepted qubit.
pub const INTERCEPT_RESEND_DISTURBANCE: f64 = 0.25;

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub defaults: RequestDefaults,
}

/// Constants of the noise model and detection policy.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ProtocolConfig {
    /// QBER above which the run is flagged as eavesdropped
    #[serde(default = "default_qber_threshold")]
    pub qber_threshold: f64,

    /// Disturbance per intercepted qubit
    #[serde(default = "default_intercept_disturbance")]
    pub intercept_disturbance: f64,
}

/// An inclusive, evenly spaced range of sweep levels.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SweepRange {
    pub start: f64,
    pub end: f64,
    pub steps: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SweepConfig {
    /// Channel noise levels, swept with no eavesdropper
    #[serde(default = "default_noise_range")]
    pub noise: SweepRange,

    /// Interception levels, swept over a noiseless channel
    #[serde(default = "default_eavesdropper_range")]
    pub eavesdropper: SweepRange,
}

/// Values the request boundary substitutes for omitted fields.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct RequestDefaults {
    #[serde(default = "default_qubit_count")]
    pub qubit_count: usize,
    #[serde(default = "default_runs_per_level")]
    pub runs_per_level: usize,
    #[serde(default = "default_analysis_qubit_count")]
    pub analysis_qubit_count: usize,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Bb84Error::Config(format!("{}: {}", path.display(), e)))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.protocol.validate()?;
        self.sweep.noise.validate("noise")?;
        self.sweep.eavesdropper.validate("eavesdropper")?;

        if self.defaults.runs_per_level == 0 {
            return Err(Bb84Error::InvalidRunCount(0));
        }

        Ok(())
    }
}

impl ProtocolConfig {
    pub fn validate(&self) -> Result<()> {
        check_probability("qber_threshold", self.qber_threshold)?;
        check_probability("intercept_disturbance", self.intercept_disturbance)
    }
}

impl SweepRange {
    pub fn new(start: f64, end: f64, steps: usize) -> Self {
        Self { start, end, steps }
    }

    /// The levels of this range, ascending, endpoints included.
    pub fn levels(&self) -> Vec<f64> {
        linspace(self.start, self.end, self.steps)
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        check_probability(name, self.start)?;
        check_probability(name, self.end)?;

        if self.steps == 0 {
            return Err(Bb84Error::InvalidSweep(format!("{} sweep needs at least one step", name)));
        }
        if self.end < self.start {
            return Err(Bb84Error::InvalidSweep(format!(
                "{} sweep ends at {} before it starts at {}",
                name, self.end, self.start
            )));
        }

        Ok(())
    }
}

/// `steps` evenly spaced values from `start` to `end` inclusive.
///
/// A single step yields just `start`.
pub fn linspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (steps - 1) as f64;
            (0..steps)
                .map(|i| if i == steps - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

pub(crate) fn check_probability(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Bb84Error::InvalidProbability {
            name: name.to_string(),
            value,
        })
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            qber_threshold: default_qber_threshold(),
            intercept_disturbance: default_intercept_disturbance(),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            noise: default_noise_range(),
            eavesdropper: default_eavesdropper_range(),
        }
    }
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            qubit_count: default_qubit_count(),
            runs_per_level: default_runs_per_level(),
            analysis_qubit_count: default_analysis_qubit_count(),
        }
    }
}

// Default value functions
fn default_qber_threshold() -> f64 { QBER_THRESHOLD }
fn default_intercept_disturbance() -> f64 { INTERCEPT_RESEND_DISTURBANCE }
fn default_noise_range() -> SweepRange { SweepRange::new(0.0, 0.15, 7) }
fn default_eavesdropper_range() -> SweepRange { SweepRange::new(0.0, 1.0, 7) }
fn default_qubit_count() -> usize { 10 }
fn default_runs_per_level() -> usize { 10 }
fn default_analysis_qubit_count() -> usize { 25 }

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_linspace_endpoints_and_spacing() {
        let levels = linspace(0.0, 0.15, 7);
        assert_eq!(levels.len(), 7);
        assert_eq!(levels[0], 0.0);
        assert_eq!(levels[6], 0.15);
        for pair in levels.windows(2) {
            assert!((pair[1] - pair[0] - 0.025).abs() < 1e-12);
        }
    }

    #[test]
    fn test_linspace_degenerate_steps() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(0.3, 1.0, 1), vec![0.3]);
    }

    #[test]
    fn test_default_sweeps() {
        let sweep = SweepConfig::default();
        assert_eq!(sweep.noise.levels().last().copied(), Some(0.15));
        assert_eq!(sweep.eavesdropper.levels(), linspace(0.0, 1.0, 7));
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config: Config = toml::from_str(
            r#"
            [protocol]
            qber_threshold = 0.05

            [sweep.noise]
            start = 0.0
            end = 0.3
            steps = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.protocol.qber_threshold, 0.05);
        assert_eq!(config.protocol.intercept_disturbance, INTERCEPT_RESEND_DISTURBANCE);
        assert_eq!(config.sweep.noise.steps, 4);
        assert_eq!(config.sweep.eavesdropper, default_eavesdropper_range());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.protocol.qber_threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(Bb84Error::InvalidProbability { .. })
        ));

        let mut config = Config::default();
        config.sweep.noise.steps = 0;
        assert!(matches!(config.validate(), Err(Bb84Error::InvalidSweep(_))));

        let mut config = Config::default();
        config.sweep.eavesdropper = SweepRange::new(0.8, 0.2, 3);
        assert!(matches!(config.validate(), Err(Bb84Error::InvalidSweep(_))));

        let mut config = Config::default();
        config.defaults.runs_per_level = 0;
        assert!(matches!(config.validate(), Err(Bb84Error::InvalidRunCount(0))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[defaults]\nqubit_count = 64").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.defaults.qubit_count, 64);
        assert_eq!(config.defaults.analysis_qubit_count, 25);
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("bb84.example.toml");
        assert_eq!(Config::load(path).unwrap(), Config::default());
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[protocol]\nqber_threshold = \"high\"").unwrap();

        assert!(matches!(Config::load(file.path()), Err(Bb84Error::Config(_))));
    }
}
