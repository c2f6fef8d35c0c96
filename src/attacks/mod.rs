//! Poisoning attacks injected into malicious clients' updates.
//!
//! Each attack replaces the flat updates of the configured malicious
//! clients before aggregation, leaving honest updates untouched:
//!
//! - [`Attack::NoAttack`] — pass-through baseline
//! - [`Attack::Gaussian`] — i.i.d. noise scaled by magnitude
//! - [`Attack::Lie`] — stealth shift inside the honest std envelope
//! - [`Attack::Fang`] — directed deviation optimized against Krum selection
//! - [`Attack::MinMax`] — largest perturbation within the honest distance spread
//!
//! Attacks fire only once the round index reaches the configured warmup
//! (the orchestrator's responsibility); all randomness comes from the
//! caller-supplied seeded source.

pub mod gaussian;
pub mod lie;
pub mod opt;

pub use gaussian::gaussian_attack;
pub use lie::lie_attack;
pub use opt::{fang_attack, minmax_attack, OptPolicy};

use rand::rngs::StdRng;

use crate::error::AegisError;

/// Poisoning attack, resolved once at startup from its configured name.
#[derive(Clone, Debug, PartialEq)]
pub enum Attack {
    /// No perturbation (baseline)
    NoAttack,
    /// Additive i.i.d. Gaussian noise on each malicious update
    Gaussian {
        /// Noise standard deviation
        magnitude: f32,
    },
    /// "Little is enough" shift: honest mean minus a bounded multiple of the
    /// honest std
    Lie,
    /// Directed deviation searched against a Krum-style acceptance check
    Fang {
        /// Optimization policy for the λ search
        policy: OptPolicy,
    },
    /// Perturbation along the negative honest-mean direction, bounded by the
    /// maximum pairwise honest distance
    MinMax {
        /// Optimization policy for the γ search
        policy: OptPolicy,
    },
}

impl Attack {
    /// Resolve an attack from its configured name.
    ///
    /// Recognized names: `na`, `gaussian`, `lie`, `fang`, `minmax`. Unknown
    /// names fail fast with [`AegisError::UnknownAttack`].
    pub fn from_name(name: &str, magnitude: f32, policy: OptPolicy) -> Result<Self, AegisError> {
        match name {
            "na" => Ok(Attack::NoAttack),
            "gaussian" => Ok(Attack::Gaussian { magnitude }),
            "lie" => Ok(Attack::Lie),
            "fang" => Ok(Attack::Fang { policy }),
            "minmax" => Ok(Attack::MinMax { policy }),
            other => Err(AegisError::UnknownAttack(other.to_string())),
        }
    }

    /// The attack's canonical configuration name.
    pub fn name(&self) -> &'static str {
        match self {
            Attack::NoAttack => "na",
            Attack::Gaussian { .. } => "gaussian",
            Attack::Lie => "lie",
            Attack::Fang { .. } => "fang",
            Attack::MinMax { .. } => "minmax",
        }
    }

    /// Replace the updates at the `malicious` indices in place.
    ///
    /// Honest updates (all other indices) are read-only inputs to the
    /// crafting step and are never modified.
    pub fn apply(
        &self,
        updates: &mut [Vec<f32>],
        malicious: &[usize],
        rng: &mut StdRng,
    ) -> Result<(), AegisError> {
        if malicious.is_empty() {
            return Ok(());
        }
        match self {
            Attack::NoAttack => Ok(()),
            Attack::Gaussian { magnitude } => gaussian_attack(updates, malicious, *magnitude, rng),
            Attack::Lie => lie_attack(updates, malicious),
            Attack::Fang { policy } => fang_attack(updates, malicious, policy),
            Attack::MinMax { policy } => minmax_attack(updates, malicious, policy),
        }
    }
}

/// Indices of honest (non-malicious) updates, in client order.
pub(crate) fn honest_indices(n: usize, malicious: &[usize]) -> Vec<usize> {
    (0..n).filter(|i| !malicious.contains(i)).collect()
}

/// Coordinate-wise mean over the honest updates.
pub(crate) fn honest_mean(
    updates: &[Vec<f32>],
    honest: &[usize],
) -> Result<Vec<f32>, AegisError> {
    if honest.is_empty() {
        return Err(AegisError::EmptyUpdates);
    }
    let dim = updates[honest[0]].len();
    let mut mu = vec![0.0f32; dim];
    for &i in honest {
        if updates[i].len() != dim {
            return Err(AegisError::DimensionMismatch);
        }
        for (m, &x) in mu.iter_mut().zip(updates[i].iter()) {
            *m += x;
        }
    }
    for m in &mut mu {
        *m /= honest.len() as f32;
    }
    Ok(mu)
}
