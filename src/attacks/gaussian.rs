//! Additive Gaussian noise attack.
//!
//! The bluntest poisoning: each malicious client submits its own update
//! plus i.i.d. `N(0, magnitude²)` noise per coordinate. Easy for any
//! distance-based defense to spot at high magnitudes, which makes it the
//! standard calibration attack.

use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::error::AegisError;

/// Add i.i.d. Gaussian noise to each malicious client's update.
///
/// `magnitude` is the standard deviation of the per-coordinate noise.
pub fn gaussian_attack(
    updates: &mut [Vec<f32>],
    malicious: &[usize],
    magnitude: f32,
    rng: &mut StdRng,
) -> Result<(), AegisError> {
    let noise = Normal::new(0.0f32, magnitude)
        .map_err(|_| AegisError::InvalidConfig(format!("bad noise magnitude: {}", magnitude)))?;
    for &i in malicious {
        let update = updates.get_mut(i).ok_or_else(|| {
            AegisError::InvalidConfig(format!("malicious index {} outside client pool", i))
        })?;
        for x in update.iter_mut() {
            *x += noise.sample(rng);
        }
    }
    Ok(())
}
