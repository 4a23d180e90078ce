use rand::Rng;
use serde::{Deserialize, Serialize};

/// A classical bit as exchanged over the public channel, always 0 or 1.
pub type Bit = u8;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasurementBasis {
    /// Rectilinear basis (|0> and |1>)
    Rectilinear,
    /// Diagonal basis (|+> and |->)
    Diagonal,
}

impl MeasurementBasis {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen::<bool>() {
            MeasurementBasis::Diagonal
        } else {
            MeasurementBasis::Rectilinear
        }
    }
}

pub fn random_bit<R: Rng + ?Sized>(rng: &mut R) -> Bit {
    rng.gen::<bool>() as Bit
}

pub fn flip_bit(bit: Bit) -> Bit {
    1 - bit
}

/// Outcome of measuring a qubit prepared as `bit` in `prepared` when the
/// receiver reads it out in `measured`.
///
/// Matching bases reproduce the prepared bit; a basis mismatch collapses to a
/// uniformly random result.
pub fn measure_outcome<R: Rng + ?Sized>(
    bit: Bit,
    prepared: MeasurementBasis,
    measured: MeasurementBasis,
    rng: &mut R,
) -> Bit {
    if prepared == measured {
        bit
    } else {
        random_bit(rng)
    }
}
