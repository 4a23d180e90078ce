//! One complete BB84 exchange: preparation, transmission, sifting, QBER
//! estimation, eavesdropper detection and key extraction.
//!
//! The channel is modelled through measurement statistics only. Channel noise
//! and an intercept-resend attacker are folded into a single bit-flip
//! probability, `p_flip = noise + disturbance * eavesdropper`, applied
//! independently to every received bit.

use log::trace;
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::bb84_states::{flip_bit, measure_outcome, random_bit, Bit, MeasurementBasis};
use crate::config::{check_probability, ProtocolConfig};
use crate::error::Result;

/// Inputs of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    pub qubit_count: usize,
    pub noise_probability: f64,
    pub eavesdropper_probability: f64,
}

/// Outcome of a single run.
///
/// `sender_final_key` and `receiver_final_key` are equal by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub qber: f64,
    pub sifted_length: usize,
    pub key_length: usize,
    pub eavesdropper_detected: bool,
    pub sender_sifted_key: Vec<Bit>,
    pub receiver_sifted_key: Vec<Bit>,
    pub sender_final_key: Vec<Bit>,
    pub receiver_final_key: Vec<Bit>,
}

/// Everything both parties hold after the quantum phase, position by position.
#[derive(Debug, Clone, PartialEq)]
pub struct Transmission {
    pub sender_bits: Vec<Bit>,
    pub sender_bases: Vec<MeasurementBasis>,
    pub receiver_bases: Vec<MeasurementBasis>,
    pub measured_bits: Vec<Bit>,
}

/// Sender and receiver bits at the positions where their bases agreed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SiftedKey {
    pub sender: Vec<Bit>,
    pub receiver: Vec<Bit>,
}

impl RunParameters {
    pub fn new(qubit_count: usize, noise_probability: f64, eavesdropper_probability: f64) -> Self {
        Self {
            qubit_count,
            noise_probability,
            eavesdropper_probability,
        }
    }

    /// Checks both probabilities lie in [0, 1]. A qubit count of zero is
    /// allowed and produces the degenerate run.
    pub fn validate(&self) -> Result<()> {
        check_probability("noise_probability", self.noise_probability)?;
        check_probability("eavesdropper_probability", self.eavesdropper_probability)
    }
}

impl RunResult {
    /// Result of a run in which no basis matched: nothing can be estimated,
    /// so the channel is treated as fully compromised.
    pub fn degenerate() -> Self {
        Self {
            qber: 1.0,
            sifted_length: 0,
            key_length: 0,
            eavesdropper_detected: true,
            sender_sifted_key: Vec::new(),
            receiver_sifted_key: Vec::new(),
            sender_final_key: Vec::new(),
            receiver_final_key: Vec::new(),
        }
    }
}

impl SiftedKey {
    pub fn len(&self) -> usize {
        self.sender.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sender.is_empty()
    }

    pub fn disagrees_at(&self, position: usize) -> bool {
        self.sender[position] != self.receiver[position]
    }

    /// Number of disagreeing positions over the whole sifted key.
    pub fn error_count(&self) -> usize {
        (0..self.len()).filter(|&j| self.disagrees_at(j)).count()
    }
}

pub fn effective_flip_probability(params: &RunParameters, config: &ProtocolConfig) -> f64 {
    params.noise_probability + config.intercept_disturbance * params.eavesdropper_probability
}

/// Prepares, sends and measures `qubit_count` qubits.
///
/// Draw order: all sender bits, then all sender bases, then all receiver
/// bases, then per position the mismatch coin (only on a basis mismatch)
/// followed by the flip draw.
pub fn transmit<R: Rng + ?Sized>(
    params: &RunParameters,
    config: &ProtocolConfig,
    rng: &mut R,
) -> Transmission {
    let n = params.qubit_count;
    let p_flip = effective_flip_probability(params, config);

    let sender_bits: Vec<Bit> = (0..n).map(|_| random_bit(rng)).collect();
    let sender_bases: Vec<MeasurementBasis> =
        (0..n).map(|_| MeasurementBasis::random(rng)).collect();
    let receiver_bases: Vec<MeasurementBasis> =
        (0..n).map(|_| MeasurementBasis::random(rng)).collect();

    let measured_bits = (0..n)
        .map(|i| {
            let ideal = measure_outcome(sender_bits[i], sender_bases[i], receiver_bases[i], rng);
            if rng.gen::<f64>() < p_flip {
                flip_bit(ideal)
            } else {
                ideal
            }
        })
        .collect();

    Transmission {
        sender_bits,
        sender_bases,
        receiver_bases,
        measured_bits,
    }
}

/// Public basis comparison: keeps matching-basis positions in their original
/// order, whatever the bit values.
pub fn sift(transmission: &Transmission) -> SiftedKey {
    let mut key = SiftedKey::default();
    for i in 0..transmission.sender_bits.len() {
        if transmission.sender_bases[i] == transmission.receiver_bases[i] {
            key.sender.push(transmission.sender_bits[i]);
            key.receiver.push(transmission.measured_bits[i]);
        }
    }
    key
}

/// Picks the positions disclosed for error estimation: a uniform subset of
/// `max(1, len / 2)` sifted positions, without replacement.
///
/// `sifted_length` must be at least 1.
pub fn sample_positions<R: Rng + ?Sized>(sifted_length: usize, rng: &mut R) -> Vec<usize> {
    let sample_size = (sifted_length / 2).max(1);
    index::sample(rng, sifted_length, sample_size).into_vec()
}

/// Fraction of disclosed positions where the two parties disagree.
pub fn estimate_qber(key: &SiftedKey, sample: &[usize]) -> f64 {
    if sample.is_empty() {
        return 1.0;
    }
    let errors = sample.iter().filter(|&&j| key.disagrees_at(j)).count();
    errors as f64 / sample.len() as f64
}

/// Builds the final key from undisclosed positions, silently dropping any
/// position where the parties still disagree.
pub fn extract_final_key(key: &SiftedKey, sample: &[usize]) -> (Vec<Bit>, Vec<Bit>) {
    let mut disclosed = vec![false; key.len()];
    for &j in sample {
        disclosed[j] = true;
    }

    let kept: Vec<usize> = (0..key.len())
        .filter(|&j| !disclosed[j] && !key.disagrees_at(j))
        .collect();

    let sender = kept.iter().map(|&j| key.sender[j]).collect();
    let receiver = kept.iter().map(|&j| key.receiver[j]).collect();
    (sender, receiver)
}

/// Runs one BB84 exchange with the standard threshold and disturbance.
pub fn simulate<R: Rng + ?Sized>(params: &RunParameters, rng: &mut R) -> RunResult {
    simulate_with(params, &ProtocolConfig::default(), rng)
}

pub fn simulate_thread_rng(params: &RunParameters) -> RunResult {
    simulate(params, &mut rand::thread_rng())
}

/// Runs one BB84 exchange under an explicit protocol configuration.
///
/// Probabilities outside [0, 1] are not clamped.
pub fn simulate_with<R: Rng + ?Sized>(
    params: &RunParameters,
    config: &ProtocolConfig,
    rng: &mut R,
) -> RunResult {
    let transmission = transmit(params, config, rng);
    let sifted = sift(&transmission);

    if sifted.is_empty() {
        trace!("no matching bases in {} qubits", params.qubit_count);
        return RunResult::degenerate();
    }

    let sample = sample_positions(sifted.len(), rng);
    let qber = estimate_qber(&sifted, &sample);

    // Any disagreement anywhere in the sifted key trips detection, so plain
    // channel noise is reported as an eavesdropper too.
    let total_errors = sifted.error_count();
    let eavesdropper_detected = qber > config.qber_threshold || total_errors > 0;

    let (sender_final_key, receiver_final_key) = extract_final_key(&sifted, &sample);

    trace!(
        "run: n={} sifted={} qber={:.4} errors={} key={} detected={}",
        params.qubit_count,
        sifted.len(),
        qber,
        total_errors,
        sender_final_key.len(),
        eavesdropper_detected
    );

    RunResult {
        qber,
        sifted_length: sifted.len(),
        key_length: sender_final_key.len(),
        eavesdropper_detected,
        sender_sifted_key: sifted.sender,
        receiver_sifted_key: sifted.receiver,
        sender_final_key,
        receiver_final_key,
    }
}
