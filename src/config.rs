//! Application configuration and constants

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

static CUSTOM_MODEL: OnceLock<PathBuf> = OnceLock::new();
static CUSTOM_MODEL_DIR: OnceLock<PathBuf> = OnceLock::new();
static CUSTOM_CATALOG: OnceLock<PathBuf> = OnceLock::new();

// === Model Files ===
pub const VISION_MODEL: &str = "clip-vit-base-patch32.onnx";

// === Model Parameters ===
pub const INPUT_SIZE: u32 = 224;
pub const EMBEDDING_DIM: usize = 512;
pub const INTRA_THREADS: usize = 4;

/// Longest/shortest side ratio accepted by the preprocessor
pub const MAX_ASPECT_RATIO: u32 = 100;

/// Identifies the encoder variant plus its preprocessing recipe.
///
/// Bump the trailing revision whenever the model file, the output layout or
/// any preprocessing constant changes: stores carrying another tag are refused.
pub const ENCODER_TAG: &str = "clip-vit-base-patch32/224-bicubic-center-crop/r1";

// === Storage ===
pub const CATALOG_FORMAT: u32 = 1;
pub const DEFAULT_CATALOG: &str = "data/catalog.msgpack";

// === Search Defaults ===
pub const DEFAULT_LIMIT: usize = 20;
pub const DEFAULT_MIN_SCORE: f32 = 0.0;

// === Catalog Build ===
pub const DUMMYJSON_API: &str = "https://dummyjson.com/products";
pub const DUMMYJSON_PAGE: usize = 30;
pub const DEFAULT_BUILD_COUNT: usize = 60;
pub const MAX_DOWNLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
pub const SOURCE_TIMEOUT: Duration = Duration::from_secs(30);

pub fn user_agent() -> String {
	format!("vismatch/{}", env!("CARGO_PKG_VERSION"))
}

pub fn set_model(path: PathBuf) {
	let _ = CUSTOM_MODEL.set(path);
}

pub fn set_model_dir(path: PathBuf) {
	let _ = CUSTOM_MODEL_DIR.set(path);
}

pub fn set_catalog(path: PathBuf) {
	let _ = CUSTOM_CATALOG.set(path);
}

/// Get models directory (custom, VISMATCH_MODELS_DIR, or `models/` next to the executable)
pub fn models_dir() -> Option<PathBuf> {
	if let Some(custom) = CUSTOM_MODEL_DIR.get() {
		crate::ui::debug(&format!("Using custom model dir: {}", custom.display()));
		return Some(custom.clone());
	}

	if let Ok(env_path) = std::env::var("VISMATCH_MODELS_DIR") {
		let path = PathBuf::from(&env_path);
		if path.is_dir() {
			crate::ui::debug(&format!("Using VISMATCH_MODELS_DIR: {}", env_path));
			return Some(path);
		}
	}

	if let Ok(exe) = std::env::current_exe() {
		if let Some(dir) = exe.parent() {
			let models = dir.join("models");
			if models.is_dir() {
				crate::ui::debug(&format!("Found models at: {}", models.display()));
				return Some(models);
			}
		}
	}

	None
}

pub fn get_vision_model_path() -> Option<PathBuf> {
	if let Some(custom) = CUSTOM_MODEL.get() {
		return Some(custom.clone());
	}
	if let Ok(env_path) = std::env::var("VISMATCH_MODEL") {
		return Some(PathBuf::from(env_path));
	}
	models_dir().map(|d| d.join(VISION_MODEL))
}

pub fn get_catalog_path() -> PathBuf {
	if let Some(custom) = CUSTOM_CATALOG.get() {
		return custom.clone();
	}
	std::env::var("VISMATCH_CATALOG")
		.map(PathBuf::from)
		.unwrap_or_else(|_| PathBuf::from(DEFAULT_CATALOG))
}
