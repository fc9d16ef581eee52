//! Image fetchers

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::fs;
use std::io::Read;

use crate::config::{self, FETCH_TIMEOUT, MAX_DOWNLOAD_BYTES};
use crate::error::{MatchError, Result};

pub trait ImageFetcher: Send + Sync {
	/// Raw encoded image bytes for a URL or path
	fn fetch(&self, location: &str) -> Result<Vec<u8>>;
}

/// Downloads over HTTP(S). Bodies above `MAX_DOWNLOAD_BYTES` are refused,
/// checked against `Content-Length` and again while reading.
pub struct HttpFetcher {
	client: Client,
	max_bytes: u64,
}

impl HttpFetcher {
	pub fn new() -> Result<Self> {
		let client = Client::builder()
			.timeout(FETCH_TIMEOUT)
			.user_agent(config::user_agent())
			.build()
			.map_err(|e| MatchError::fetch("http client", e))?;
		Ok(Self { client, max_bytes: MAX_DOWNLOAD_BYTES })
	}
}

impl ImageFetcher for HttpFetcher {
	fn fetch(&self, location: &str) -> Result<Vec<u8>> {
		let response = self
			.client
			.get(location)
			.send()
			.and_then(|r| r.error_for_status())
			.map_err(|e| MatchError::fetch(location, e))?;

		let kind = response.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or("");
		if !kind.starts_with("image/") {
			let kind = if kind.is_empty() { "no content type" } else { kind };
			return Err(MatchError::InvalidImage(format!("{} served {}, not an image", location, kind)));
		}

		let too_large = |size: String| MatchError::fetch(location, format!("{} exceeds the {} byte limit", size, self.max_bytes));
		if let Some(length) = response.content_length() {
			if length > self.max_bytes {
				return Err(too_large(format!("{} bytes", length)));
			}
		}

		let mut bytes = Vec::new();
		response
			.take(self.max_bytes + 1)
			.read_to_end(&mut bytes)
			.map_err(|e| MatchError::fetch(location, e))?;
		if bytes.len() as u64 > self.max_bytes {
			return Err(too_large("body".to_string()));
		}
		Ok(bytes)
	}
}

/// Reads local files
pub struct FileFetcher;

impl ImageFetcher for FileFetcher {
	fn fetch(&self, location: &str) -> Result<Vec<u8>> {
		let path = location.strip_prefix("file://").unwrap_or(location);
		fs::read(path).map_err(|e| MatchError::fetch(location, e))
	}
}

/// `http(s)://` over the network, anything else from disk
pub struct DefaultFetcher {
	http: HttpFetcher,
}

impl DefaultFetcher {
	pub fn new() -> Result<Self> {
		Ok(Self { http: HttpFetcher::new()? })
	}
}

pub fn is_remote(location: &str) -> bool {
	location.starts_with("http://") || location.starts_with("https://")
}

impl ImageFetcher for DefaultFetcher {
	fn fetch(&self, location: &str) -> Result<Vec<u8>> {
		if is_remote(location) {
			self.http.fetch(location)
		} else {
			FileFetcher.fetch(location)
		}
	}
}
