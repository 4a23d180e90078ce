//! JSON request/response contract used by front ends.
//!
//! Field names follow the web client (`n_qubits`, `noise_prob`, `detected_eve`,
//! `alice_final_key`, ...). Long names are accepted as aliases. Any failure is
//! reported as `{"error": "<message>"}`.

use log::warn;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::bb84_protocol::{simulate_with, RunParameters, RunResult};
use crate::bb84_states::Bit;
use crate::config::Config;
use crate::error::{Bb84Error, Result};
use crate::simulation::{collect_metrics_with, Metrics};

// A field may be omitted, in which case the configured default applies, but an
// explicit `null` is a conversion failure. Sending both the short name and its
// alias is rejected as a duplicate field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RunRequest {
    #[serde(default, deserialize_with = "present", rename = "n_qubits", alias = "qubit_count")]
    pub qubit_count: Option<usize>,
    #[serde(default, deserialize_with = "present", rename = "noise_prob", alias = "noise_probability")]
    pub noise_probability: Option<f64>,
    #[serde(default, deserialize_with = "present", rename = "eve_prob", alias = "eavesdropper_probability")]
    pub eavesdropper_probability: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AnalysisRequest {
    #[serde(default, deserialize_with = "present", rename = "n_runs", alias = "runs_per_level")]
    pub runs_per_level: Option<usize>,
    #[serde(default, deserialize_with = "present", rename = "n_qubits", alias = "qubit_count")]
    pub qubit_count: Option<usize>,
}

/// Deserializes a field that is present in the body; `null` fails like any
/// other value of the wrong type.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RunResponse {
    pub qber: f64,
    pub sifted_length: usize,
    pub key_length: usize,
    pub detected_eve: bool,
    pub alice_sifted_key: Vec<Bit>,
    pub bob_sifted_key: Vec<Bit>,
    pub alice_final_key: Vec<Bit>,
    pub bob_final_key: Vec<Bit>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NoiseSeries {
    pub x: Vec<f64>,
    pub qber: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EveSeries {
    pub x: Vec<f64>,
    pub qber: Vec<f64>,
    pub detection_rate: Vec<f64>,
}

/// Sweep levels are given in percent.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnalysisResponse {
    pub noise: NoiseSeries,
    pub eve: EveSeries,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ErrorPayload {
    pub error: String,
}

impl RunRequest {
    /// Fills omitted fields from `config` and validates the probabilities.
    pub fn parameters(&self, config: &Config) -> Result<RunParameters> {
        let params = RunParameters::new(
            self.qubit_count.unwrap_or(config.defaults.qubit_count),
            self.noise_probability.unwrap_or(0.0),
            self.eavesdropper_probability.unwrap_or(0.0),
        );
        params.validate()?;
        Ok(params)
    }
}

impl AnalysisRequest {
    /// Returns `(runs_per_level, qubit_count)` with defaults applied.
    pub fn resolve(&self, config: &Config) -> Result<(usize, usize)> {
        let runs = self.runs_per_level.unwrap_or(config.defaults.runs_per_level);
        if runs == 0 {
            return Err(Bb84Error::InvalidRunCount(runs));
        }
        let qubits = self.qubit_count.unwrap_or(config.defaults.analysis_qubit_count);
        Ok((runs, qubits))
    }
}

impl From<RunResult> for RunResponse {
    fn from(result: RunResult) -> Self {
        Self {
            qber: result.qber,
            sifted_length: result.sifted_length,
            key_length: result.key_length,
            detected_eve: result.eavesdropper_detected,
            alice_sifted_key: result.sender_sifted_key,
            bob_sifted_key: result.receiver_sifted_key,
            alice_final_key: result.sender_final_key,
            bob_final_key: result.receiver_final_key,
        }
    }
}

impl From<Metrics> for AnalysisResponse {
    fn from(metrics: Metrics) -> Self {
        let detection_rate = metrics.eavesdropper.mean_detection_rate.unwrap_or_default();
        Self {
            noise: NoiseSeries {
                x: to_percent(&metrics.noise.levels),
                qber: metrics.noise.mean_qber,
            },
            eve: EveSeries {
                x: to_percent(&metrics.eavesdropper.levels),
                qber: metrics.eavesdropper.mean_qber,
                detection_rate,
            },
        }
    }
}

impl ErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        let mut body = serde_json::Map::new();
        body.insert("error".to_string(), Value::String(self.error.clone()));
        Value::Object(body)
    }
}

impl From<&Bb84Error> for ErrorPayload {
    fn from(err: &Bb84Error) -> Self {
        Self::new(err.to_string())
    }
}

fn to_percent(levels: &[f64]) -> Vec<f64> {
    levels.iter().map(|level| level * 100.0).collect()
}

pub fn handle_run<R: Rng + ?Sized>(
    request: &RunRequest,
    config: &Config,
    rng: &mut R,
) -> Result<RunResponse> {
    let params = request.parameters(config)?;
    Ok(simulate_with(&params, &config.protocol, rng).into())
}

pub fn handle_analysis<R: Rng + ?Sized>(
    request: &AnalysisRequest,
    config: &Config,
    rng: &mut R,
) -> Result<AnalysisResponse> {
    let (runs, qubits) = request.resolve(config)?;
    Ok(collect_metrics_with(runs, qubits, config, rng)?.into())
}

/// Parses a run request body and returns the response or an error payload.
pub fn handle_run_json<R: Rng + ?Sized>(body: &str, config: &Config, rng: &mut R) -> Value {
    respond(parse_body::<RunRequest>(body).and_then(|request| handle_run(&request, config, rng)))
}

/// Parses an analysis request body and returns the response or an error payload.
pub fn handle_analysis_json<R: Rng + ?Sized>(body: &str, config: &Config, rng: &mut R) -> Value {
    respond(
        parse_body::<AnalysisRequest>(body)
            .and_then(|request| handle_analysis(&request, config, rng)),
    )
}

/// An empty body counts as an empty object, so every field takes its default.
fn parse_body<T: DeserializeOwned + Default>(body: &str) -> Result<T> {
    if body.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_json::from_str(body)?)
}

/// Serializes a handler outcome, turning any error into an error payload.
pub fn respond<T: Serialize>(outcome: Result<T>) -> Value {
    let serialized = outcome.and_then(|response| Ok(serde_json::to_value(response)?));
    match serialized {
        Ok(value) => value,
        Err(err) => {
            warn!("request rejected: {}", err);
            error_payload(&err)
        }
    }
}

pub fn error_payload(err: &Bb84Error) -> Value {
    ErrorPayload::from(err).to_value()
}
