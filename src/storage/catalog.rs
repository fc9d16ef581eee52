//! Persisted catalog format and I/O

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::CATALOG_FORMAT;
use crate::core::{Embedding, Product};
use crate::error::{MatchError, Result};

use super::index::{CatalogEntry, CatalogIndex};

static SAVE_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
	format: u32,
	encoder: String,
	dimension: usize,
	built_at: DateTime<Utc>,
	entries: Vec<StoredEntry>,
}

/// One product record keyed by `product.id`; list order is ranking tie-break order.
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
	product: Product,
	embedding: Vec<f32>,
	dimension: usize,
	encoder: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
	MessagePack,
	Json,
}

impl Encoding {
	pub fn for_path(path: &Path) -> Self {
		match path.extension().and_then(|e| e.to_str()) {
			Some(ext) if ext.eq_ignore_ascii_case("json") => Encoding::Json,
			_ => Encoding::MessagePack,
		}
	}
}

/// Load a catalog, refusing anything built by another encoder variant or dimension
pub fn load(path: &Path, expected_encoder: &str, expected_dim: usize) -> Result<CatalogIndex> {
	let fail = |cause: String| MatchError::store_load(path, cause);

	let bytes = fs::read(path).map_err(|e| fail(e.to_string()))?;
	let file: CatalogFile = match Encoding::for_path(path) {
		Encoding::Json => serde_json::from_slice(&bytes).map_err(|e| fail(e.to_string()))?,
		Encoding::MessagePack => rmp_serde::from_slice(&bytes).map_err(|e| fail(e.to_string()))?,
	};

	if file.format != CATALOG_FORMAT {
		return Err(fail(format!("unsupported format {} (expected {})", file.format, CATALOG_FORMAT)));
	}
	if file.encoder != expected_encoder {
		return Err(fail(format!(
			"built with encoder '{}', this build uses '{}'; rebuild the catalog",
			file.encoder, expected_encoder
		)));
	}
	if file.dimension != expected_dim {
		return Err(fail(format!(
			"dimension {} does not match encoder dimension {}; rebuild the catalog",
			file.dimension, expected_dim
		)));
	}

	let mut entries = Vec::with_capacity(file.entries.len());
	for stored in file.entries {
		let id = stored.product.id;
		if stored.encoder != file.encoder || stored.dimension != file.dimension {
			return Err(fail(format!("product {} was embedded by a different encoder", id)));
		}
		if stored.embedding.len() != stored.dimension {
			return Err(fail(format!(
				"product {} has {} values, declares {}",
				id,
				stored.embedding.len(),
				stored.dimension
			)));
		}
		let embedding = Embedding::from_unit(stored.embedding)
			.ok_or_else(|| fail(format!("product {} has a non-normalized or non-finite vector", id)))?;
		entries.push(CatalogEntry::new(stored.product, embedding));
	}

	CatalogIndex::with_timestamp(file.encoder, file.dimension, entries, file.built_at).map_err(|e| match e {
		MatchError::StoreLoad { cause, .. } => fail(cause),
		other => fail(other.to_string()),
	})
}

/// Write the whole generation, replacing any previous file atomically
pub fn save(path: &Path, index: &CatalogIndex) -> Result<()> {
	let fail = |cause: String| MatchError::StoreWrite { path: path.to_path_buf(), cause };

	let file = CatalogFile {
		format: CATALOG_FORMAT,
		encoder: index.encoder().to_string(),
		dimension: index.dimension(),
		built_at: index.built_at(),
		entries: index
			.iter()
			.map(|e| StoredEntry {
				product: (*e.product).clone(),
				embedding: e.embedding.as_slice().to_vec(),
				dimension: index.dimension(),
				encoder: index.encoder().to_string(),
			})
			.collect(),
	};

	let bytes = match Encoding::for_path(path) {
		Encoding::Json => serde_json::to_vec_pretty(&file).map_err(|e| fail(e.to_string()))?,
		Encoding::MessagePack => rmp_serde::to_vec_named(&file).map_err(|e| fail(e.to_string()))?,
	};

	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
	}

	let tmp = temp_path(path);
	fs::write(&tmp, bytes).map_err(|e| fail(e.to_string()))?;
	fs::rename(&tmp, path).map_err(|e| {
		let _ = fs::remove_file(&tmp);
		fail(e.to_string())
	})
}

/// Unique per call, so concurrent saves to one target never share a temp file
fn temp_path(path: &Path) -> PathBuf {
	let seq = SAVE_SEQ.fetch_add(1, Ordering::Relaxed);
	let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
	name.push(format!(".{}.{}.tmp", std::process::id(), seq));
	path.with_file_name(name)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn encoding_follows_extension() {
		assert_eq!(Encoding::for_path(Path::new("a/catalog.json")), Encoding::Json);
		assert_eq!(Encoding::for_path(Path::new("a/catalog.JSON")), Encoding::Json);
		assert_eq!(Encoding::for_path(Path::new("a/catalog.msgpack")), Encoding::MessagePack);
		assert_eq!(Encoding::for_path(Path::new("catalog")), Encoding::MessagePack);
	}

	#[test]
	fn temp_file_sits_next_to_target() {
		let tmp = temp_path(Path::new("data/catalog.msgpack"));
		assert_eq!(tmp.parent(), Some(Path::new("data")));
		assert!(tmp.to_string_lossy().ends_with(".tmp"));
		assert_ne!(tmp, temp_path(Path::new("data/catalog.msgpack")));
	}
}
