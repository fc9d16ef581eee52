//! In-memory catalog generations

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::core::{Embedding, Fingerprint, Product};
use crate::error::{MatchError, Result};

#[derive(Debug, Clone)]
pub struct CatalogEntry {
	pub product: Arc<Product>,
	pub embedding: Embedding,
}

impl CatalogEntry {
	pub fn new(product: Product, embedding: Embedding) -> Self {
		Self { product: Arc::new(product), embedding }
	}
}

/// One complete, immutable catalog generation.
///
/// Entry order is insertion order and breaks ranking ties.
#[derive(Debug)]
pub struct CatalogIndex {
	encoder: String,
	dimension: usize,
	built_at: DateTime<Utc>,
	fingerprint: Fingerprint,
	entries: Vec<CatalogEntry>,
}

impl CatalogIndex {
	pub fn new(encoder: impl Into<String>, dimension: usize, entries: Vec<CatalogEntry>) -> Result<Self> {
		Self::with_timestamp(encoder, dimension, entries, Utc::now())
	}

	pub fn with_timestamp(
		encoder: impl Into<String>,
		dimension: usize,
		entries: Vec<CatalogEntry>,
		built_at: DateTime<Utc>,
	) -> Result<Self> {
		let mut seen = HashSet::with_capacity(entries.len());
		for entry in &entries {
			if entry.embedding.dimension() != dimension {
				return Err(MatchError::DimensionMismatch {
					expected: dimension,
					actual: entry.embedding.dimension(),
				});
			}
			if !seen.insert(entry.product.id) {
				return Err(MatchError::store_load(
					"<memory>",
					format!("duplicate product id {}", entry.product.id),
				));
			}
		}

		let fingerprint =
			Fingerprint::of_entries(entries.iter().map(|e| (e.product.id, e.embedding.as_slice())));

		Ok(Self { encoder: encoder.into(), dimension, built_at, fingerprint, entries })
	}

	pub fn encoder(&self) -> &str {
		&self.encoder
	}

	pub fn dimension(&self) -> usize {
		self.dimension
	}

	pub fn built_at(&self) -> DateTime<Utc> {
		self.built_at
	}

	pub fn fingerprint(&self) -> Fingerprint {
		self.fingerprint
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
		self.entries.iter()
	}

	pub fn get(&self, id: u64) -> Option<&CatalogEntry> {
		self.entries.iter().find(|e| e.product.id == id)
	}

	/// Sorted unique categories
	pub fn categories(&self) -> Vec<String> {
		let mut cats: Vec<String> = self.entries.iter().map(|e| e.product.category.clone()).collect();
		cats.sort();
		cats.dedup();
		cats
	}
}

/// The active generation, replaced wholesale on rebuild.
///
/// Readers take an `Arc` snapshot and keep it for the whole request, so a
/// swap never changes data under an in-flight search.
#[derive(Debug)]
pub struct CatalogHandle {
	active: RwLock<Arc<CatalogIndex>>,
}

impl CatalogHandle {
	pub fn new(index: CatalogIndex) -> Self {
		Self { active: RwLock::new(Arc::new(index)) }
	}

	pub fn current(&self) -> Arc<CatalogIndex> {
		match self.active.read() {
			Ok(guard) => Arc::clone(&*guard),
			Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
		}
	}

	/// Publish a new generation, returning the one it replaced
	pub fn swap(&self, index: CatalogIndex) -> Arc<CatalogIndex> {
		let next = Arc::new(index);
		let mut guard = match self.active.write() {
			Ok(guard) => guard,
			Err(poisoned) => poisoned.into_inner(),
		};
		std::mem::replace(&mut *guard, next)
	}
}
