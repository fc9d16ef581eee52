//! Product sources for catalog builds

use reqwest::blocking::Client;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{self, DUMMYJSON_API, DUMMYJSON_PAGE};
use crate::core::Product;
use crate::error::{MatchError, Result};

pub trait ProductSource {
	/// Every product to embed, in catalog order
	fn products(&self) -> Result<Vec<Product>>;
}

impl ProductSource for Vec<Product> {
	fn products(&self) -> Result<Vec<Product>> {
		Ok(self.clone())
	}
}

/// JSON array of [`Product`] records on disk
pub struct JsonFileSource {
	path: PathBuf,
}

impl JsonFileSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ProductSource for JsonFileSource {
	fn products(&self) -> Result<Vec<Product>> {
		let location = self.path.display().to_string();
		let bytes = fs::read(&self.path).map_err(|e| MatchError::fetch(&location, e))?;
		serde_json::from_slice(&bytes).map_err(|e| MatchError::fetch(location, e))
	}
}

/// The public dummyjson.com product listing, fetched page by page
pub struct DummyJsonSource {
	client: Client,
	base_url: String,
	total: usize,
	page_delay: Duration,
}

#[derive(Debug, Deserialize)]
struct Page {
	#[serde(default)]
	products: Vec<RawProduct>,
}

#[derive(Debug, Deserialize)]
struct RawProduct {
	id: u64,
	#[serde(default)]
	title: Option<String>,
	#[serde(default)]
	category: Option<String>,
	#[serde(default)]
	brand: Option<String>,
	#[serde(default)]
	price: f64,
	#[serde(default)]
	description: String,
	#[serde(default)]
	thumbnail: String,
	#[serde(default)]
	images: Vec<String>,
	#[serde(default)]
	rating: f32,
}

impl RawProduct {
	fn into_product(self) -> Product {
		let image_url = if self.thumbnail.is_empty() {
			self.images.first().cloned().unwrap_or_default()
		} else {
			self.thumbnail.clone()
		};
		let thumbnail_url = if self.thumbnail.is_empty() { image_url.clone() } else { self.thumbnail };

		Product {
			id: self.id,
			name: self.title.unwrap_or_else(|| format!("Product {}", self.id)),
			category: self.category.unwrap_or_else(|| "unknown".to_string()),
			brand: self.brand.unwrap_or_else(|| "Unknown".to_string()),
			price: self.price,
			description: self.description,
			image_url,
			thumbnail_url,
			rating: self.rating,
		}
	}
}

impl DummyJsonSource {
	pub fn new(total: usize) -> Result<Self> {
		Self::with_base_url(DUMMYJSON_API, total)
	}

	pub fn with_base_url(base_url: impl Into<String>, total: usize) -> Result<Self> {
		let base_url = base_url.into();
		let client = Client::builder()
			.timeout(config::SOURCE_TIMEOUT)
			.user_agent(config::user_agent())
			.build()
			.map_err(|e| MatchError::fetch(&base_url, e))?;
		Ok(Self { client, base_url, total, page_delay: Duration::from_millis(500) })
	}

	fn page(&self, skip: usize) -> Result<Vec<RawProduct>> {
		let url = format!("{}?limit={}&skip={}", self.base_url, DUMMYJSON_PAGE, skip);
		crate::ui::debug(&format!("Fetching products from {}", url));

		let response = self
			.client
			.get(&url)
			.send()
			.and_then(|r| r.error_for_status())
			.map_err(|e| MatchError::fetch(&url, e))?;
		let bytes = response.bytes().map_err(|e| MatchError::fetch(&url, e))?;
		let page: Page = serde_json::from_slice(&bytes).map_err(|e| MatchError::fetch(&url, e))?;
		Ok(page.products)
	}
}

impl ProductSource for DummyJsonSource {
	fn products(&self) -> Result<Vec<Product>> {
		let mut products = Vec::with_capacity(self.total);
		let mut skip = 0;

		while products.len() < self.total {
			let batch = self.page(skip)?;
			if batch.is_empty() {
				break;
			}
			products.extend(batch.into_iter().map(RawProduct::into_product));
			skip += DUMMYJSON_PAGE;
			if products.len() < self.total {
				std::thread::sleep(self.page_delay);
			}
		}

		products.truncate(self.total);
		crate::ui::debug(&format!("Fetched {} products", products.len()));
		Ok(products)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::build::test_server::{Reply, TestServer};

	/// Serves `available` products, `limit` at a time, like the public API
	fn catalog_server(available: u64) -> TestServer {
		TestServer::start(move |target| {
			let query = target.split_once('?').map(|(_, q)| q).unwrap_or("");
			let param = |name: &str| {
				query
					.split('&')
					.find_map(|kv| kv.strip_prefix(name).and_then(|v| v.strip_prefix('=')))
					.and_then(|v| v.parse::<u64>().ok())
					.unwrap_or(0)
			};
			let (limit, skip) = (param("limit"), param("skip"));
			let products: Vec<serde_json::Value> = (skip + 1..=(skip + limit).min(available))
				.map(|id| serde_json::json!({ "id": id, "title": format!("Item {}", id), "thumbnail": format!("https://x/{}.png", id) }))
				.collect();
			Reply::ok("application/json", serde_json::json!({ "products": products }).to_string())
		})
	}

	fn loopback_source(server: &TestServer, total: usize) -> DummyJsonSource {
		let mut source = DummyJsonSource::with_base_url(server.url("/products"), total).unwrap();
		source.client = Client::builder().no_proxy().timeout(config::SOURCE_TIMEOUT).build().unwrap();
		source.page_delay = Duration::ZERO;
		source
	}

	#[test]
	fn pages_are_fetched_until_total_then_truncated() {
		let server = catalog_server(75);
		let products = loopback_source(&server, 70).products().unwrap();

		assert_eq!(products.len(), 70);
		assert_eq!(products.iter().map(|p| p.id).collect::<Vec<_>>(), (1..=70).collect::<Vec<_>>());
		assert_eq!(products[69].image_url, "https://x/70.png");
		assert_eq!(
			server.requests(),
			vec![
				"/products?limit=30&skip=0".to_string(),
				"/products?limit=30&skip=30".to_string(),
				"/products?limit=30&skip=60".to_string(),
			]
		);
	}

	#[test]
	fn empty_page_ends_a_short_listing() {
		let server = catalog_server(40);
		let products = loopback_source(&server, 100).products().unwrap();

		assert_eq!(products.len(), 40);
		assert_eq!(server.requests().len(), 3);
		assert!(server.requests()[2].ends_with("skip=60"));
	}

	#[test]
	fn failing_listing_is_fetch_error() {
		let server = TestServer::start(|_| Reply::status(503));
		let err = loopback_source(&server, 10).products().unwrap_err();
		assert!(matches!(err, MatchError::Fetch { .. }));
	}

	#[test]
	fn raw_product_falls_back_to_first_image() {
		let raw: RawProduct = serde_json::from_str(
			r#"{"id": 4, "title": "Lamp", "price": 12.5, "images": ["https://x/a.png", "https://x/b.png"]}"#,
		)
		.unwrap();
		let p = raw.into_product();
		assert_eq!(p.image_url, "https://x/a.png");
		assert_eq!(p.thumbnail_url, "https://x/a.png");
		assert_eq!(p.category, "unknown");
		assert_eq!(p.brand, "Unknown");
	}

	#[test]
	fn raw_product_prefers_thumbnail() {
		let raw: RawProduct = serde_json::from_str(
			r#"{"id": 9, "category": "beauty", "thumbnail": "https://x/t.png", "images": ["https://x/a.png"]}"#,
		)
		.unwrap();
		let p = raw.into_product();
		assert_eq!(p.name, "Product 9");
		assert_eq!(p.image_url, "https://x/t.png");
		assert_eq!(p.category, "beauty");
	}

	#[test]
	fn missing_product_file_is_fetch_error() {
		let err = JsonFileSource::new("/nonexistent/products.json").products().unwrap_err();
		assert!(matches!(err, MatchError::Fetch { .. }));
	}
}
