//! # bb84
//!
//! Monte Carlo simulator for the BB84 quantum key distribution protocol.
//!
//! A sender and a receiver exchange `n` qubits in randomly chosen bases over a
//! channel subject to bit-flip noise and an intercept-resend eavesdropper. Each
//! run sifts the key, sacrifices half of it to estimate the quantum bit error
//! rate (QBER), flags eavesdropping and extracts the remaining agreeing bits
//! as the shared key.
//!
//! ## Noise model
//!
//! No quantum state is simulated. A matching-basis measurement reproduces the
//! sender's bit, a mismatched one yields a fair coin, and every received bit
//! is then flipped with probability `noise + 0.25 * eavesdropper`, the 25%
//! being the disturbance an intercept-resend attack causes on each qubit it
//! touches.
//!
//! ## Usage
//!
//! ```no_run
//! use bb84::prelude::*;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let result = simulate(&RunParameters::new(100, 0.02, 0.0), &mut rng);
//! println!("QBER {:.3}, key {} bits", result.qber, result.key_length);
//!
//! let metrics = collect_metrics(10, 25, &mut rng).unwrap();
//! println!("{:?}", metrics.eavesdropper.mean_detection_rate);
//! ```

pub mod api;
pub mod bb84_protocol;
pub mod bb84_states;
pub mod config;
pub mod error;
pub mod simulation;


pub mod prelude {
    pub use crate::bb84_protocol::*;
    pub use crate::bb84_states::*;
    pub use crate::config::*;
    pub use crate::error::Bb84Error;
    pub use crate::simulation::*;
}
