//! Normalized embedding vectors for visual similarity

use crate::error::{MatchError, Result};

/// Tolerance for accepting an already-normalized vector (stored or decoded).
pub const UNIT_TOLERANCE: f32 = 1e-4;

/// Unit-length embedding. The only ways in are [`Embedding::new`], which
/// normalizes, and [`Embedding::from_unit`], which checks.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
	/// Create normalized embedding from raw model output
	pub fn new(data: Vec<f32>) -> Result<Self> {
		if data.is_empty() {
			return Err(MatchError::ModelInference("empty embedding".into()));
		}
		if data.iter().any(|v| !v.is_finite()) {
			return Err(MatchError::ModelInference("embedding contains non-finite values".into()));
		}
		let norm = l2_norm(&data);
		if norm <= f32::EPSILON {
			return Err(MatchError::ModelInference("embedding has zero norm".into()));
		}
		Ok(Self(data.into_iter().map(|x| x / norm).collect()))
	}

	/// Accept pre-normalized data (deserialization). Returns `None` unless
	/// every value is finite and the norm is within [`UNIT_TOLERANCE`] of 1.
	pub fn from_unit(data: Vec<f32>) -> Option<Self> {
		if data.is_empty() || data.iter().any(|v| !v.is_finite()) {
			return None;
		}
		if (l2_norm(&data) - 1.0).abs() > UNIT_TOLERANCE {
			return None;
		}
		Some(Self(data))
	}

	pub fn as_slice(&self) -> &[f32] {
		&self.0
	}

	pub fn dimension(&self) -> usize {
		self.0.len()
	}

	pub fn norm(&self) -> f32 {
		l2_norm(&self.0)
	}

	/// Cosine similarity, which is the plain dot product for unit vectors
	pub fn similarity(&self, other: &Self) -> f32 {
		dot(&self.0, &other.0)
	}

	pub fn into_vec(self) -> Vec<f32> {
		self.0
	}
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
	a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn l2_norm(v: &[f32]) -> f32 {
	v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
