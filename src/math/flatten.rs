//! Flattening of layered model parameters into a single flat update.
//!
//! Client updates arrive as one array per model layer with heterogeneous
//! shapes. Aggregation operates on a single flat vector, so a
//! [`LayerShapes`] template records the per-layer shapes once and performs
//! the flatten/unflatten round-trip. Flattening and unflattening are mutual
//! inverses given the same template.

use ndarray::{ArrayD, IxDyn};

use crate::error::AegisError;

/// Per-layer shape template for a model's parameters.
///
/// Materialized once from the initial global parameters and reused for every
/// round's flatten/unflatten calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerShapes {
    shapes: Vec<Vec<usize>>,
    total: usize,
}

impl LayerShapes {
    /// Record the shapes of a layered parameter list.
    pub fn from_layers(layers: &[ArrayD<f32>]) -> Self {
        let shapes: Vec<Vec<usize>> = layers.iter().map(|l| l.shape().to_vec()).collect();
        let total = shapes.iter().map(|s| s.iter().product::<usize>()).sum();
        Self { shapes, total }
    }

    /// Number of layers in the template.
    pub fn num_layers(&self) -> usize {
        self.shapes.len()
    }

    /// Total number of scalar parameters across all layers.
    pub fn total_len(&self) -> usize {
        self.total
    }

    /// Concatenate layers into one flat vector, preserving layer order and
    /// per-layer element order.
    ///
    /// Fails with [`AegisError::DimensionMismatch`] if the layer count or any
    /// layer shape disagrees with the template.
    pub fn flatten(&self, layers: &[ArrayD<f32>]) -> Result<Vec<f32>, AegisError> {
        if layers.len() != self.shapes.len() {
            return Err(AegisError::DimensionMismatch);
        }
        let mut flat = Vec::with_capacity(self.total);
        for (layer, shape) in layers.iter().zip(self.shapes.iter()) {
            if layer.shape() != shape.as_slice() {
                return Err(AegisError::DimensionMismatch);
            }
            flat.extend(layer.iter().copied());
        }
        Ok(flat)
    }

    /// Rebuild the layered representation from a flat vector.
    ///
    /// Fails with [`AegisError::DimensionMismatch`] if the flat length does
    /// not match the template's total.
    pub fn unflatten(&self, flat: &[f32]) -> Result<Vec<ArrayD<f32>>, AegisError> {
        if flat.len() != self.total {
            return Err(AegisError::DimensionMismatch);
        }
        let mut layers = Vec::with_capacity(self.shapes.len());
        let mut offset = 0;
        for shape in &self.shapes {
            let len: usize = shape.iter().product();
            let chunk = flat[offset..offset + len].to_vec();
            let layer = ArrayD::from_shape_vec(IxDyn(shape), chunk)
                .map_err(|_| AegisError::DimensionMismatch)?;
            layers.push(layer);
            offset += len;
        }
        Ok(layers)
    }
}
