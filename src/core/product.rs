//! Catalog products and ranked search results

use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
	pub id: u64,
	pub name: String,
	#[serde(default = "unknown_category")]
	pub category: String,
	#[serde(default)]
	pub brand: String,
	#[serde(default)]
	pub price: f64,
	#[serde(default)]
	pub description: String,
	pub image_url: String,
	#[serde(default)]
	pub thumbnail_url: String,
	#[serde(default)]
	pub rating: f32,
}

fn unknown_category() -> String {
	"unknown".to_string()
}

/// A product with its similarity to the query, produced fresh per search
#[derive(Debug, Clone)]
pub struct SearchResult {
	pub product: Arc<Product>,
	/// Cosine similarity in [-1, 1]
	pub similarity_score: f32,
}

impl SearchResult {
	pub fn id(&self) -> u64 {
		self.product.id
	}
}
