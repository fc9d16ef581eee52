//! # Catalog Builder
//!
//! Offline full-generation rebuild: fetch every product image, embed it, and
//! persist the result. Individual failures are recorded and skipped.

pub mod fetch;
pub mod source;

#[cfg(test)]
mod test_server;

pub use fetch::{DefaultFetcher, FileFetcher, HttpFetcher, ImageFetcher};
pub use source::{DummyJsonSource, JsonFileSource, ProductSource};

use rayon::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::core::{CancelToken, Embedding, Product};
use crate::error::{MatchError, Result};
use crate::models::ImageEmbedder;
use crate::processing::image::encode_bytes;
use crate::storage::{self, CatalogEntry, CatalogIndex};
use crate::ui;

#[derive(Debug, Clone)]
pub struct SkippedProduct {
	pub id: u64,
	pub name: String,
	pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
	pub succeeded: Vec<u64>,
	pub skipped: Vec<SkippedProduct>,
	pub duration: Duration,
}

impl BuildReport {
	pub fn skipped_ids(&self) -> Vec<u64> {
		self.skipped.iter().map(|s| s.id).collect()
	}

	/// `PartialBuildFailure` when anything was skipped; the built entries stay valid
	pub fn partial_failure(&self) -> Option<MatchError> {
		if self.skipped.is_empty() {
			None
		} else {
			Some(MatchError::PartialBuildFailure {
				succeeded: self.succeeded.len(),
				skipped: self.skipped_ids(),
			})
		}
	}
}

pub struct CatalogBuilder<'a> {
	embedder: &'a dyn ImageEmbedder,
	fetcher: &'a dyn ImageFetcher,
	cancel: CancelToken,
}

impl<'a> CatalogBuilder<'a> {
	pub fn new(embedder: &'a dyn ImageEmbedder, fetcher: &'a dyn ImageFetcher) -> Self {
		Self { embedder, fetcher, cancel: CancelToken::new() }
	}

	pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
		self.cancel = cancel;
		self
	}

	/// Embed every product into a fresh generation. Source order is kept.
	pub fn build(&self, products: Vec<Product>) -> Result<(CatalogIndex, BuildReport)> {
		let start = Instant::now();
		let total = products.len();
		let mut report = BuildReport::default();

		let mut seen = HashSet::with_capacity(total);
		let mut unique = Vec::with_capacity(total);
		for product in products {
			if seen.insert(product.id) {
				unique.push(product);
			} else {
				ui::warn(&format!("Duplicate product id {} ({}), keeping the first", product.id, product.name));
				report.skipped.push(SkippedProduct {
					id: product.id,
					name: product.name,
					reason: "duplicate product id".into(),
				});
			}
		}

		let outcomes: Vec<(Product, Result<Embedding>)> = unique
			.into_par_iter()
			.enumerate()
			.map(|(i, product)| {
				let outcome = self.embed_product(&product);
				let queue = format!("[{}/{}]", i + 1, total);
				match &outcome {
					Ok(_) => ui::debug(&format!("{} {} embedded", queue, product.name)),
					Err(e) => ui::warn(&format!("{} {} skipped: {}", queue, product.name, e)),
				}
				(product, outcome)
			})
			.collect();

		self.cancel.check()?;

		let mut entries = Vec::with_capacity(outcomes.len());
		for (product, outcome) in outcomes {
			match outcome {
				Ok(embedding) => {
					report.succeeded.push(product.id);
					entries.push(CatalogEntry::new(product, embedding));
				}
				Err(e) => report.skipped.push(SkippedProduct {
					id: product.id,
					name: product.name,
					reason: e.to_string(),
				}),
			}
		}

		let index = CatalogIndex::new(self.embedder.encoder_tag(), self.embedder.dimension(), entries)?;
		report.duration = start.elapsed();
		Ok((index, report))
	}

	fn embed_product(&self, product: &Product) -> Result<Embedding> {
		if product.image_url.trim().is_empty() {
			return Err(MatchError::fetch(format!("product {}", product.id), "no image URL"));
		}
		self.cancel.check()?;
		let bytes = self.fetcher.fetch(&product.image_url)?;
		let embedding = encode_bytes(self.embedder, &bytes, &self.cancel)?;
		if embedding.dimension() != self.embedder.dimension() {
			return Err(MatchError::DimensionMismatch {
				expected: self.embedder.dimension(),
				actual: embedding.dimension(),
			});
		}
		Ok(embedding)
	}
}

/// Full rebuild: build from the source, then overwrite the persisted store.
///
/// An empty result leaves the previous store on disk untouched.
pub fn rebuild_catalog(
	builder: &CatalogBuilder<'_>,
	source: &dyn ProductSource,
	path: &Path,
) -> Result<(CatalogIndex, BuildReport)> {
	let products = source.products()?;
	ui::info(&format!("Embedding {} products", products.len()));

	let (index, report) = builder.build(products)?;
	if index.is_empty() {
		return Err(MatchError::EmptyCatalog);
	}

	storage::save(path, &index)?;
	ui::success(&format!(
		"Wrote {} products to {} (generation {})",
		index.len(),
		path.display(),
		index.fingerprint().short()
	));
	Ok((index, report))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::processing::PixelTensor;
	use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
	use std::collections::HashMap;
	use std::io::Cursor;

	/// Four-dimensional embedder that misbehaves on red images
	struct Flaky;

	impl ImageEmbedder for Flaky {
		fn dimension(&self) -> usize {
			4
		}

		fn encoder_tag(&self) -> &str {
			"flaky/r1"
		}

		fn embed_tensor(&self, pixels: PixelTensor, _cancel: &CancelToken) -> Result<Embedding> {
			let red = pixels[[0, 0, 0, 0]];
			let green = pixels[[0, 1, 0, 0]];
			if red > 1.0 {
				Embedding::new(vec![1.0, 0.5, 0.25])
			} else {
				Embedding::new(vec![1.0, green.abs() + 0.1, 0.3, 0.2])
			}
		}
	}

	struct Images(HashMap<String, Vec<u8>>);

	impl ImageFetcher for Images {
		fn fetch(&self, location: &str) -> Result<Vec<u8>> {
			self.0.get(location).cloned().ok_or_else(|| MatchError::fetch(location, "404"))
		}
	}

	fn solid(rgb: [u8; 3]) -> Vec<u8> {
		let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(16, 16, Rgb(rgb)));
		let mut out = Cursor::new(Vec::new());
		img.write_to(&mut out, ImageFormat::Png).unwrap();
		out.into_inner()
	}

	fn product(id: u64, image_url: &str) -> Product {
		Product {
			id,
			name: format!("Product {}", id),
			category: "lamps".into(),
			brand: String::new(),
			price: 9.5,
			description: String::new(),
			image_url: image_url.into(),
			thumbnail_url: String::new(),
			rating: 0.0,
		}
	}

	#[test]
	fn wrong_dimension_skips_only_that_product() {
		let images = Images(HashMap::from([
			("blue".to_string(), solid([0, 0, 255])),
			("green".to_string(), solid([0, 255, 0])),
			("red".to_string(), solid([255, 0, 0])),
		]));
		let products = vec![product(1, "blue"), product(2, "red"), product(3, "green"), product(4, "")];

		let (index, report) = CatalogBuilder::new(&Flaky, &images).build(products).unwrap();

		assert_eq!(index.iter().map(|e| e.product.id).collect::<Vec<_>>(), vec![1, 3]);
		assert_eq!(report.skipped_ids(), vec![2, 4]);
		assert!(report.skipped[0].reason.contains("dimension"));
	}

	#[test]
	fn cancelled_build_fails_whole() {
		let images = Images(HashMap::from([("blue".to_string(), solid([0, 0, 255]))]));
		let cancel = CancelToken::new();
		cancel.cancel();
		let err = CatalogBuilder::new(&Flaky, &images)
			.with_cancel(cancel)
			.build(vec![product(1, "blue")])
			.unwrap_err();
		assert!(matches!(err, MatchError::Cancelled));
	}
}
