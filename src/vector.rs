//! This is the vector math module
//! Provide the distance functions used by the indexes

use crate::error::{Result, VecError};
use serde::{Deserialize, Serialize};

fn check_dims(left: &[f32], right: &[f32]) -> Result<()> {
    if left.len() != right.len() {
        return Err(VecError::DimensionMismatch {
            expected: left.len(),
            actual: right.len(),
        });
    }
    Ok(())
}

/// Squared Euclidean distance
/// dist = sum((a[i] - b[i])^2)
pub fn squared_l2(left: &[f32], right: &[f32]) -> Result<f32> {
    check_dims(left, right)?;

    let dist = left.iter()
        .zip(right.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum();

    Ok(dist)
}

/// Dot Product
/// dot_prod = sum(a[i] * b[i]) for i = 0..a.len()
/// Can only process vectors with same dimensions
pub fn dot_product(left: &[f32], right: &[f32]) -> Result<f32> {
    check_dims(left, right)?;

    let dot_prod = left.iter()
        .zip(right.iter())
        .map(|(x, y)| x * y)
        .sum();

    Ok(dot_prod)
}

/// L2 norm, ||vec||
pub fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter()
        .map(|x| x * x)
        .sum::<f32>()
        .sqrt()
}

/// Distance function used to rank neighbors. Smaller is closer for every
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    SquaredL2,
    Euclidean,
    /// `1 - cos(a, b)`. A zero vector sits at distance 1 from everything.
    Cosine,
    /// Negated dot product.
    InnerProduct,
}

impl Metric {
    pub fn distance(&self, left: &[f32], right: &[f32]) -> Result<f32> {
        match self {
            Metric::SquaredL2 => squared_l2(left, right),
            Metric::Euclidean => squared_l2(left, right).map(f32::sqrt),
            Metric::Cosine => {
                let dot = dot_product(left, right)?;
                let norms = l2_norm(left) * l2_norm(right);
                if norms == 0.0 {
                    return Ok(1.0);
                }
                Ok(1.0 - dot / norms)
            }
            Metric::InnerProduct => dot_product(left, right).map(|d| -d),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Metric::SquaredL2 => "squared_l2",
            Metric::Euclidean => "euclidean",
            Metric::Cosine => "cosine",
            Metric::InnerProduct => "inner_product",
        }
    }
}
