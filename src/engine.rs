//! Serving engine: one encoder, one active catalog generation, one worker pool

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;

use crate::core::{CancelToken, Embedding, SearchResult};
use crate::error::{MatchError, Result};
use crate::models::{ImageEmbedder, ModelLayout, VisionEncoder};
use crate::processing::image::encode_bytes;
use crate::search::{LinearScan, SearchParams, SimilarityIndex};
use crate::storage::{self, CatalogHandle, CatalogIndex};
use crate::ui;

/// Owns the process-wide shared state. Cheap to share behind an `Arc`;
/// dropping the last reference releases the model session and the pool.
pub struct Engine {
	embedder: Arc<dyn ImageEmbedder>,
	catalog: CatalogHandle,
	pool: rayon::ThreadPool,
}

impl Engine {
	/// Load the encoder eagerly, then the catalog. Any failure here is fatal:
	/// the engine never exists without a valid generation.
	pub fn start(model: &Path, layout: ModelLayout, catalog: &Path, workers: Option<usize>) -> anyhow::Result<Self> {
		let encoder = VisionEncoder::load(model, layout)?;
		ui::success("Vision model loaded");

		let index = storage::load(catalog, encoder.encoder_tag(), encoder.dimension())?;
		ui::info(&format!(
			"Catalog {} loaded: {} products (generation {})",
			catalog.display(),
			index.len(),
			index.fingerprint().short()
		));

		Self::new(Arc::new(encoder), index, workers)
	}

	pub fn new(embedder: Arc<dyn ImageEmbedder>, index: CatalogIndex, workers: Option<usize>) -> anyhow::Result<Self> {
		check_compatible(embedder.as_ref(), &index)?;

		let threads = workers.unwrap_or_else(|| std::thread::available_parallelism().map_or(1, |n| n.get()));
		let pool = rayon::ThreadPoolBuilder::new()
			.num_threads(threads)
			.thread_name(|i| format!("vismatch-worker-{}", i))
			.build()
			.context("Failed to build worker pool")?;
		ui::debug(&format!("Worker pool: {} threads", threads));

		Ok(Self { embedder, catalog: CatalogHandle::new(index), pool })
	}

	pub fn embedder(&self) -> &dyn ImageEmbedder {
		self.embedder.as_ref()
	}

	/// The active generation; hold on to it for the duration of a request
	pub fn catalog(&self) -> Arc<CatalogIndex> {
		self.catalog.current()
	}

	/// Image bytes to a unit query vector, on the calling thread
	pub fn embed(&self, image_bytes: &[u8]) -> Result<Embedding> {
		encode_bytes(self.embedder.as_ref(), image_bytes, &CancelToken::new())
	}

	pub fn search(&self, query: &Embedding, params: SearchParams) -> Result<Vec<SearchResult>> {
		LinearScan::new(self.catalog.current()).search(query, params)
	}

	/// Embed and rank on the worker pool. A cancelled request returns
	/// `Cancelled`, never a partial ranking.
	pub fn match_image(&self, image_bytes: &[u8], params: SearchParams, cancel: &CancelToken) -> Result<Vec<SearchResult>> {
		self.pool.install(|| {
			let generation = self.catalog.current();
			let query = encode_bytes(self.embedder.as_ref(), image_bytes, cancel)?;
			cancel.check()?;
			let results = LinearScan::new(generation).search(&query, params)?;
			cancel.check()?;
			Ok(results)
		})
	}

	/// Read a persisted generation built for this engine's encoder
	pub fn load_catalog(&self, path: &Path) -> Result<CatalogIndex> {
		storage::load(path, self.embedder.encoder_tag(), self.embedder.dimension())
	}

	/// Publish a new generation; in-flight requests finish on the old one
	pub fn swap_catalog(&self, index: CatalogIndex) -> Result<Arc<CatalogIndex>> {
		check_compatible(self.embedder.as_ref(), &index)?;
		let next = index.fingerprint();
		let previous = self.catalog.swap(index);
		ui::info(&format!("Catalog generation {} replaced {}", next.short(), previous.fingerprint().short()));
		Ok(previous)
	}

	pub fn reload_catalog(&self, path: &Path) -> Result<Arc<CatalogIndex>> {
		let index = self.load_catalog(path)?;
		self.swap_catalog(index)
	}
}

fn check_compatible(embedder: &dyn ImageEmbedder, index: &CatalogIndex) -> Result<()> {
	if index.dimension() != embedder.dimension() {
		return Err(MatchError::DimensionMismatch { expected: index.dimension(), actual: embedder.dimension() });
	}
	if index.encoder() != embedder.encoder_tag() {
		return Err(MatchError::store_load(
			"<catalog>",
			format!("catalog encoder '{}' differs from '{}'", index.encoder(), embedder.encoder_tag()),
		));
	}
	Ok(())
}
