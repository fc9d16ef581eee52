//! Image decoding, CLIP preprocessing and encoding

use image::imageops::{self, FilterType};
use image::DynamicImage;
use ndarray::Array4;

use crate::config::MAX_ASPECT_RATIO;
use crate::core::{CancelToken, Embedding};
use crate::error::{MatchError, Result};
use crate::models::ImageEmbedder;

/// NCHW float tensor, `[1, 3, size, size]`
pub type PixelTensor = Array4<f32>;

/// Preprocessing recipe the encoder was trained with.
///
/// These values are part of the encoder's identity (see `config::ENCODER_TAG`),
/// not tunables: any drift silently degrades similarity.
#[derive(Debug, Clone, Copy)]
pub struct ClipPreprocess {
	pub size: u32,
	pub filter: FilterType,
	pub mean: [f32; 3],
	pub std: [f32; 3],
}

impl ClipPreprocess {
	#[allow(clippy::excessive_precision)]
	pub const VIT_B32: Self = Self {
		size: crate::config::INPUT_SIZE,
		filter: FilterType::CatmullRom,
		mean: [0.48145466, 0.4578275, 0.40821073],
		std: [0.26862954, 0.26130258, 0.27577711],
	};

	pub fn shape(&self) -> [usize; 4] {
		let s = self.size as usize;
		[1, 3, s, s]
	}
}

/// Decode raw bytes in any format the `image` crate recognizes
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
	if bytes.is_empty() {
		return Err(MatchError::InvalidImage("empty input".into()));
	}
	let img = image::load_from_memory(bytes).map_err(|e| MatchError::InvalidImage(e.to_string()))?;
	if img.width() == 0 || img.height() == 0 {
		return Err(MatchError::InvalidImage(format!(
			"zero-sized image ({}x{})",
			img.width(),
			img.height()
		)));
	}
	Ok(img)
}

/// Resize shorter side to `size`, center-crop, rescale to [0, 1], normalize
pub fn prepare(img: &DynamicImage, recipe: &ClipPreprocess) -> Result<PixelTensor> {
	let (w, h) = (img.width(), img.height());
	if w == 0 || h == 0 {
		return Err(MatchError::InvalidImage(format!("zero-sized image ({}x{})", w, h)));
	}

	let (short, long) = (w.min(h), w.max(h));
	if long / short > MAX_ASPECT_RATIO {
		return Err(MatchError::InvalidImage(format!(
			"aspect ratio of {}x{} exceeds {}:1",
			w, h, MAX_ASPECT_RATIO
		)));
	}

	let size = recipe.size;

	// Only the centered square survives the crop. Cut it out of the source
	// first, keeping a margin for the filter taps, so the resize buffer stays
	// near `size` along both axes whatever the input aspect ratio.
	let margin = (2 * short).div_ceil(size) + 1;
	let span = short.saturating_add(2 * margin).min(long);
	let offset = (long - span) / 2;
	let region = if w >= h {
		img.crop_imm(offset, 0, span, h)
	} else {
		img.crop_imm(0, offset, w, span)
	};
	let rgb = region.to_rgb8();

	// Integer floor keeps the short side at exactly `size`
	let scale = |side: u32| ((side as u64 * size as u64) / short as u64).max(size as u64) as u32;
	let (new_w, new_h) = (scale(rgb.width()), scale(rgb.height()));
	let resized = imageops::resize(&rgb, new_w, new_h, recipe.filter);

	let left = (new_w - size) / 2;
	let top = (new_h - size) / 2;

	let s = size as usize;
	let mut tensor = Array4::<f32>::zeros((1, 3, s, s));
	for y in 0..s {
		for x in 0..s {
			let px = resized.get_pixel(left + x as u32, top + y as u32);
			for c in 0..3 {
				let v = px[c] as f32 / 255.0;
				tensor[[0, c, y, x]] = (v - recipe.mean[c]) / recipe.std[c];
			}
		}
	}

	Ok(tensor)
}

/// Decode and prepare with the encoder's recipe
pub fn preprocess(bytes: &[u8]) -> Result<PixelTensor> {
	let img = decode(bytes)?;
	prepare(&img, &ClipPreprocess::VIT_B32)
}

/// Full bytes → unit vector path, shared by catalog builds and queries so
/// both sides get identical preprocessing and normalization.
pub fn encode_bytes(embedder: &dyn ImageEmbedder, bytes: &[u8], cancel: &CancelToken) -> Result<Embedding> {
	cancel.check()?;
	let tensor = preprocess(bytes)?;
	cancel.check()?;
	embedder.embed_tensor(tensor, cancel)
}
