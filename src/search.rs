//! Similarity search over a catalog generation
//!
//! Callers go through [`SimilarityIndex`], so the linear scan below can be
//! swapped for an approximate index without touching them.

use std::sync::Arc;

use crate::config::{DEFAULT_LIMIT, DEFAULT_MIN_SCORE};
use crate::core::{Embedding, SearchResult};
use crate::error::{MatchError, Result};
use crate::storage::CatalogIndex;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
	/// Maximum results; larger than the catalog returns everything that passes
	pub limit: usize,
	/// Inclusive lower bound, applied before truncation
	pub min_score: f32,
}

impl Default for SearchParams {
	fn default() -> Self {
		Self { limit: DEFAULT_LIMIT, min_score: DEFAULT_MIN_SCORE }
	}
}

impl SearchParams {
	pub fn new(limit: usize, min_score: f32) -> Self {
		Self { limit, min_score }
	}
}

pub trait SimilarityIndex: Send + Sync {
	fn dimension(&self) -> usize;

	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Ranked matches, best first; ties keep catalog order
	fn search(&self, query: &Embedding, params: SearchParams) -> Result<Vec<SearchResult>>;
}

/// Exhaustive O(N·D) scan; fine up to a few thousand products
#[derive(Debug, Clone)]
pub struct LinearScan {
	catalog: Arc<CatalogIndex>,
}

impl LinearScan {
	pub fn new(catalog: Arc<CatalogIndex>) -> Self {
		Self { catalog }
	}

	pub fn catalog(&self) -> &Arc<CatalogIndex> {
		&self.catalog
	}
}

impl SimilarityIndex for LinearScan {
	fn dimension(&self) -> usize {
		self.catalog.dimension()
	}

	fn len(&self) -> usize {
		self.catalog.len()
	}

	fn search(&self, query: &Embedding, params: SearchParams) -> Result<Vec<SearchResult>> {
		if query.dimension() != self.catalog.dimension() {
			return Err(MatchError::DimensionMismatch {
				expected: self.catalog.dimension(),
				actual: query.dimension(),
			});
		}

		let mut matches: Vec<SearchResult> = self
			.catalog
			.iter()
			.filter_map(|entry| {
				let score = query.similarity(&entry.embedding);
				(score >= params.min_score).then(|| SearchResult {
					product: Arc::clone(&entry.product),
					similarity_score: score,
				})
			})
			.collect();

		// Stable: equal scores stay in insertion order
		matches.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
		matches.truncate(params.limit);

		Ok(matches)
	}
}
