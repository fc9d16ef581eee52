//! # Embedding Models
//!
//! The [`ImageEmbedder`] seam plus the ONNX CLIP vision encoder behind it.

pub mod vision;

pub use vision::{ModelLayout, VisionEncoder};

use crate::core::{CancelToken, Embedding};
use crate::error::Result;
use crate::processing::image::PixelTensor;

/// Turns a preprocessed tensor into a unit-length embedding.
///
/// Implementations own L2 normalization: every returned [`Embedding`] is
/// already normalized, and callers never normalize again. Implementations
/// must be safe to call from many worker threads at once.
pub trait ImageEmbedder: Send + Sync {
	/// Output dimensionality
	fn dimension(&self) -> usize;

	/// Encoder variant tag, written into and checked against persisted stores
	fn encoder_tag(&self) -> &str;

	fn embed_tensor(&self, pixels: PixelTensor, cancel: &CancelToken) -> Result<Embedding>;
}
