#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use rand::prelude::*;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use vismatch::build::{CatalogBuilder, ImageFetcher};
use vismatch::config::{EMBEDDING_DIM, ENCODER_TAG};
use vismatch::models::ImageEmbedder;
use vismatch::processing::PixelTensor;
use vismatch::{CancelToken, CatalogIndex, Embedding, MatchError, Product, Result};

/// Deterministic stand-in for the ONNX encoder: mean-pools the flattened
/// tensor into `EMBEDDING_DIM` contiguous chunks.
pub struct PoolingEmbedder;

impl ImageEmbedder for PoolingEmbedder {
	fn dimension(&self) -> usize {
		EMBEDDING_DIM
	}

	fn encoder_tag(&self) -> &str {
		ENCODER_TAG
	}

	fn embed_tensor(&self, pixels: PixelTensor, cancel: &CancelToken) -> Result<Embedding> {
		cancel.check()?;
		let flat: Vec<f32> = pixels.iter().copied().collect();
		let chunk = flat.len() / EMBEDDING_DIM;
		let pooled = flat
			.chunks(chunk)
			.take(EMBEDDING_DIM)
			.map(|c| c.iter().sum::<f32>() / c.len() as f32)
			.collect();
		Embedding::new(pooled)
	}
}

/// Serves images from memory; unknown locations fail like a 404
#[derive(Default)]
pub struct MemoryFetcher {
	images: HashMap<String, Vec<u8>>,
}

impl MemoryFetcher {
	pub fn insert(&mut self, location: impl Into<String>, bytes: Vec<u8>) {
		self.images.insert(location.into(), bytes);
	}

	pub fn get(&self, location: &str) -> &[u8] {
		&self.images[location]
	}
}

impl ImageFetcher for MemoryFetcher {
	fn fetch(&self, location: &str) -> Result<Vec<u8>> {
		self.images
			.get(location)
			.cloned()
			.ok_or_else(|| MatchError::fetch(location, "404 Not Found"))
	}
}

/// 64x64 PNG made of random 8x8 colour blocks
pub fn block_png(seed: u64) -> Vec<u8> {
	let mut rng = StdRng::seed_from_u64(seed);
	let colours: Vec<[u8; 3]> = (0..64).map(|_| [rng.random(), rng.random(), rng.random()]).collect();
	let img = RgbImage::from_fn(64, 64, |x, y| Rgb(colours[((y / 8) * 8 + x / 8) as usize]));
	png(&DynamicImage::ImageRgb8(img))
}

pub fn png(img: &DynamicImage) -> Vec<u8> {
	let mut out = Cursor::new(Vec::new());
	img.write_to(&mut out, ImageFormat::Png).unwrap();
	out.into_inner()
}

pub fn product(id: u64, category: &str) -> Product {
	Product {
		id,
		name: format!("Product {}", id),
		category: category.to_string(),
		brand: "Acme".to_string(),
		price: id as f64 + 0.99,
		description: String::new(),
		image_url: format!("mem://{}.png", id),
		thumbnail_url: String::new(),
		rating: 4.5,
	}
}

/// `count` products with ids 1..=count and an image for each
pub fn fixture(count: u64) -> (Vec<Product>, MemoryFetcher) {
	let mut fetcher = MemoryFetcher::default();
	let categories = ["shoes", "bags", "lamps"];
	let products: Vec<Product> = (1..=count)
		.map(|id| {
			let p = product(id, categories[id as usize % categories.len()]);
			fetcher.insert(p.image_url.clone(), block_png(id));
			p
		})
		.collect();
	(products, fetcher)
}

pub fn built_index(count: u64) -> (CatalogIndex, MemoryFetcher) {
	let (products, fetcher) = fixture(count);
	let (index, report) = CatalogBuilder::new(&PoolingEmbedder, &fetcher).build(products).unwrap();
	assert!(report.skipped.is_empty());
	(index, fetcher)
}

pub fn embedder() -> Arc<dyn ImageEmbedder> {
	Arc::new(PoolingEmbedder)
}
