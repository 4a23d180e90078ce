//! Batch statistics: repeated runs across swept noise and interception levels.
//!
//! Two sweeps are produced. The noise sweep varies channel noise with no
//! eavesdropper and records the mean QBER per level. The eavesdropper sweep
//! varies the interception probability over a noiseless channel and records
//! the mean QBER together with the empirical detection rate.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::bb84_protocol::{simulate_with, RunParameters};
use crate::config::{Config, ProtocolConfig, SweepRange};
use crate::error::{Bb84Error, Result};

/// Per-level averages for one swept variable, aligned with `levels`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSeries {
    pub levels: Vec<f64>,
    pub mean_qber: Vec<f64>,
    /// Only recorded for the eavesdropper sweep.
    pub mean_detection_rate: Option<Vec<f64>>,
}

/// Both sweeps of one collection call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub noise: SweepSeries,
    pub eavesdropper: SweepSeries,
}

/// Averages over the runs at one level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelStats {
    pub mean_qber: f64,
    pub detection_rate: f64,
}

/// Which probability a sweep varies; the other is held at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweptVariable {
    Noise,
    Eavesdropper,
}

impl SweptVariable {
    fn parameters(self, qubit_count: usize, level: f64) -> RunParameters {
        match self {
            SweptVariable::Noise => RunParameters::new(qubit_count, level, 0.0),
            SweptVariable::Eavesdropper => RunParameters::new(qubit_count, 0.0, level),
        }
    }
}

/// Runs `runs` independent simulations with the same parameters.
pub fn run_level<R: Rng + ?Sized>(
    params: &RunParameters,
    runs: usize,
    config: &ProtocolConfig,
    rng: &mut R,
) -> LevelStats {
    let mut qber_sum = 0.0;
    let mut detections = 0usize;

    for _ in 0..runs {
        let result = simulate_with(params, config, rng);
        qber_sum += result.qber;
        if result.eavesdropper_detected {
            detections += 1;
        }
    }

    LevelStats {
        mean_qber: qber_sum / runs as f64,
        detection_rate: detections as f64 / runs as f64,
    }
}

/// Sweeps one variable across `range`, in ascending level order.
pub fn sweep<R: Rng + ?Sized>(
    variable: SweptVariable,
    range: &SweepRange,
    runs_per_level: usize,
    qubit_count: usize,
    config: &ProtocolConfig,
    rng: &mut R,
) -> SweepSeries {
    let levels = range.levels();
    let stats: Vec<LevelStats> = levels
        .iter()
        .map(|&level| {
            let params = variable.parameters(qubit_count, level);
            let stats = run_level(&params, runs_per_level, config, rng);
            debug!(
                "{:?} level {:.4}: mean qber {:.4}, detection rate {:.2}",
                variable, level, stats.mean_qber, stats.detection_rate
            );
            stats
        })
        .collect();

    let mean_detection_rate = match variable {
        SweptVariable::Noise => None,
        SweptVariable::Eavesdropper => Some(stats.iter().map(|s| s.detection_rate).collect()),
    };

    SweepSeries {
        levels,
        mean_qber: stats.iter().map(|s| s.mean_qber).collect(),
        mean_detection_rate,
    }
}

pub fn sweep_noise<R: Rng + ?Sized>(
    range: &SweepRange,
    runs_per_level: usize,
    qubit_count: usize,
    config: &ProtocolConfig,
    rng: &mut R,
) -> SweepSeries {
    sweep(SweptVariable::Noise, range, runs_per_level, qubit_count, config, rng)
}

pub fn sweep_eavesdropper<R: Rng + ?Sized>(
    range: &SweepRange,
    runs_per_level: usize,
    qubit_count: usize,
    config: &ProtocolConfig,
    rng: &mut R,
) -> SweepSeries {
    sweep(SweptVariable::Eavesdropper, range, runs_per_level, qubit_count, config, rng)
}

/// Collects both sweeps with the standard levels: 7 noise levels over
/// [0, 0.15] and 7 interception levels over [0, 1].
pub fn collect_metrics<R: Rng + ?Sized>(
    runs_per_level: usize,
    qubit_count: usize,
    rng: &mut R,
) -> Result<Metrics> {
    collect_metrics_with(runs_per_level, qubit_count, &Config::default(), rng)
}

pub fn collect_metrics_thread_rng(runs_per_level: usize, qubit_count: usize) -> Result<Metrics> {
    collect_metrics(runs_per_level, qubit_count, &mut rand::thread_rng())
}

/// Collects both sweeps using the ranges and protocol constants of `config`.
pub fn collect_metrics_with<R: Rng + ?Sized>(
    runs_per_level: usize,
    qubit_count: usize,
    config: &Config,
    rng: &mut R,
) -> Result<Metrics> {
    if runs_per_level == 0 {
        return Err(Bb84Error::InvalidRunCount(runs_per_level));
    }

    debug!(
        "collecting metrics: {} runs per level, {} qubits",
        runs_per_level, qubit_count
    );

    let noise = sweep_noise(
        &config.sweep.noise,
        runs_per_level,
        qubit_count,
        &config.protocol,
        rng,
    );
    let eavesdropper = sweep_eavesdropper(
        &config.sweep.eavesdropper,
        runs_per_level,
        qubit_count,
        &config.protocol,
        rng,
    );

    Ok(Metrics {
        noise,
        eavesdropper,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_series_align_with_levels() {
        let mut rng = StdRng::seed_from_u64(1);
        let metrics = collect_metrics(3, 25, &mut rng).unwrap();

        assert_eq!(metrics.noise.levels.len(), 7);
        assert_eq!(metrics.noise.mean_qber.len(), 7);
        assert!(metrics.noise.mean_detection_rate.is_none());

        assert_eq!(metrics.eavesdropper.levels.len(), 7);
        assert_eq!(metrics.eavesdropper.mean_qber.len(), 7);
        assert_eq!(metrics.eavesdropper.mean_detection_rate.as_ref().map(Vec::len), Some(7));

        assert_eq!(metrics.noise.levels[0], 0.0);
        assert_eq!(metrics.noise.levels[6], 0.15);
        assert_eq!(metrics.eavesdropper.levels[6], 1.0);
        assert!(metrics.noise.levels.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_thread_rng_collection() {
        let metrics = collect_metrics_thread_rng(2, 10).unwrap();
        assert_eq!(metrics.noise.mean_qber.len(), 7);
        assert!(matches!(collect_metrics_thread_rng(0, 10), Err(Bb84Error::InvalidRunCount(0))));
    }

    #[test]
    fn test_zero_runs_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            collect_metrics(0, 25, &mut rng),
            Err(Bb84Error::InvalidRunCount(0))
        ));
    }

    #[test]
    fn test_noiseless_level_has_zero_qber() {
        let mut rng = StdRng::seed_from_u64(4);
        let stats = run_level(
            &RunParameters::new(50, 0.0, 0.0),
            20,
            &ProtocolConfig::default(),
            &mut rng,
        );
        assert_eq!(stats.mean_qber, 0.0);
        assert_eq!(stats.detection_rate, 0.0);
    }

    #[test]
    fn test_noise_sweep_monotonic() {
        let mut rng = StdRng::seed_from_u64(99);
        let series = sweep_noise(
            &SweepRange::new(0.0, 0.15, 7),
            200,
            50,
            &ProtocolConfig::default(),
            &mut rng,
        );
        assert_eq!(series.mean_qber[0], 0.0);
        assert!(
            series.mean_qber.first().unwrap() < series.mean_qber.last().unwrap(),
            "QBER should grow with channel noise"
        );
    }

    #[test]
    fn test_full_interception_converges() {
        let mut rng = StdRng::seed_from_u64(2025);
        let series = sweep_eavesdropper(
            &SweepRange::new(0.0, 1.0, 7),
            300,
            100,
            &ProtocolConfig::default(),
            &mut rng,
        );
        let last_qber = *series.mean_qber.last().unwrap();
        let rates = series.mean_detection_rate.unwrap();

        assert!((last_qber - 0.25).abs() < 0.03, "mean QBER {} should be near 0.25", last_qber);
        assert_eq!(rates[0], 0.0);
        assert!(*rates.last().unwrap() > 0.99);
    }

    #[test]
    fn test_seeded_collection_is_reproducible() {
        let a = collect_metrics(4, 20, &mut StdRng::seed_from_u64(8)).unwrap();
        let b = collect_metrics(4, 20, &mut StdRng::seed_from_u64(8)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_custom_sweep_config() {
        let mut config = Config::default();
        config.sweep.noise = SweepRange::new(0.0, 0.3, 4);
        config.sweep.eavesdropper = SweepRange::new(0.5, 0.5, 1);

        let metrics = collect_metrics_with(2, 16, &config, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(metrics.noise.levels.len(), 4);
        assert!((metrics.noise.levels[1] - 0.1).abs() < 1e-12);
        assert_eq!(metrics.noise.levels[3], 0.3);
        assert_eq!(metrics.eavesdropper.levels, vec![0.5]);
    }
}
