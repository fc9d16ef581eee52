//! Error taxonomy shared by every stage of the matching pipeline

use std::path::PathBuf;

pub type Result<T, E = MatchError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
	/// Bytes do not decode, dimensions are zero, or no RGB conversion exists
	#[error("invalid image: {0}")]
	InvalidImage(String),

	/// Image or product source unreachable
	#[error("fetch failed for {location}: {cause}")]
	Fetch { location: String, cause: String },

	/// Runtime fault or malformed tensor
	#[error("model inference failed: {0}")]
	ModelInference(String),

	#[error("dimension mismatch: catalog has {expected}, query has {actual}")]
	DimensionMismatch { expected: usize, actual: usize },

	/// Missing, corrupt or incompatible persisted catalog
	#[error("cannot load catalog {path:?}: {cause}")]
	StoreLoad { path: PathBuf, cause: String },

	#[error("catalog build skipped {} of {} products", skipped.len(), succeeded + skipped.len())]
	PartialBuildFailure { succeeded: usize, skipped: Vec<u64> },

	#[error("catalog build produced no entries")]
	EmptyCatalog,

	/// Caller went away or the deadline passed
	#[error("request cancelled")]
	Cancelled,

	#[error("cannot write catalog {path:?}: {cause}")]
	StoreWrite { path: PathBuf, cause: String },
}

impl MatchError {
	pub fn fetch(location: impl Into<String>, cause: impl std::fmt::Display) -> Self {
		Self::Fetch { location: location.into(), cause: cause.to_string() }
	}

	pub fn store_load(path: impl Into<PathBuf>, cause: impl std::fmt::Display) -> Self {
		Self::StoreLoad { path: path.into(), cause: cause.to_string() }
	}

	/// Errors that abort only the request that raised them
	pub fn is_per_request(&self) -> bool {
		matches!(
			self,
			Self::InvalidImage(_) | Self::Fetch { .. } | Self::ModelInference(_) | Self::Cancelled
		)
	}
}

impl From<ort::Error> for MatchError {
	fn from(err: ort::Error) -> Self {
		Self::ModelInference(err.to_string())
	}
}
