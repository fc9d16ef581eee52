//! # Command Implementations
//!
//! Each submodule handles one CLI command (build, search, inspect).

pub mod build;
pub mod inspect;
pub mod search;

use anyhow::{anyhow, Result};
use std::path::PathBuf;

use crate::config;

/// The vision model configured for this run, which must exist on disk
pub(crate) fn resolve_model() -> Result<PathBuf> {
	let path = config::get_vision_model_path().ok_or_else(|| {
		anyhow!(
			"Vision model not found. Pass --model, set VISMATCH_MODEL, or place {} in a models/ directory next to the binary",
			config::VISION_MODEL
		)
	})?;
	if !path.is_file() {
		return Err(anyhow!("Vision model not found at {}", path.display()));
	}
	Ok(path)
}
