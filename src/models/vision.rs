//! Vision model (CLIP ViT-B/32) for image embeddings

use anyhow::Context;
use ndarray::Array4;
use ort::session::{Session, SessionOutputs};
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use crate::config::{EMBEDDING_DIM, ENCODER_TAG};
use crate::core::{CancelToken, Embedding};
use crate::error::{MatchError, Result};
use crate::processing::image::{ClipPreprocess, PixelTensor};

use super::ImageEmbedder;

/// CLIP tokenizer BOS / EOS; the combined graph needs a text branch even for images
const BOS_TOKEN: i64 = 49406;
const EOS_TOKEN: i64 = 49407;
const TEXT_CONTEXT: usize = 77;

/// Which ONNX export is loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ModelLayout {
	/// Full CLIP graph (image + text towers), reads `image_embeds`
	#[default]
	Combined,
	/// Image tower only, reads `image_embeds` or `pooler_output`
	VisionOnly,
}

/// One shared ONNX session behind a mutex.
///
/// `Session::run` needs `&mut Session`, so inference calls are serialized;
/// preprocessing happens outside the lock and runs in parallel.
pub struct VisionEncoder {
	session: Mutex<Session>,
	layout: ModelLayout,
	recipe: ClipPreprocess,
}

impl VisionEncoder {
	/// Load the model and run one warm-up inference
	pub fn load(model_path: &Path, layout: ModelLayout) -> anyhow::Result<Self> {
		if !model_path.exists() {
			anyhow::bail!("Vision model file does not exist: {}", model_path.display());
		}

		crate::ui::debug(&format!("Loading vision model: {}", model_path.display()));
		let session = crate::runtime::create_session(model_path).context("Failed to load vision model")?;

		let encoder = Self { session: Mutex::new(session), layout, recipe: ClipPreprocess::VIT_B32 };

		let start = Instant::now();
		let shape = encoder.recipe.shape();
		encoder
			.embed_tensor(Array4::zeros((shape[0], shape[1], shape[2], shape[3])), &CancelToken::new())
			.context("Warm-up inference failed")?;
		crate::ui::debug(&format!("Warm-up took {}ms", start.elapsed().as_millis()));

		Ok(encoder)
	}

	fn run(&self, pixels: PixelTensor, cancel: &CancelToken) -> Result<Vec<f32>> {
		let shape = pixels.shape().to_vec();
		let (data, _) = pixels.into_raw_vec_and_offset();
		let pixel_values = Value::from_array((shape, data))?;

		let mut session = self
			.session
			.lock()
			.map_err(|e| MatchError::ModelInference(format!("session lock poisoned: {}", e)))?;
		cancel.check()?;

		match self.layout {
			ModelLayout::Combined => {
				let mut ids = vec![0i64; TEXT_CONTEXT];
				ids[0] = BOS_TOKEN;
				ids[1] = EOS_TOKEN;
				let mut mask = vec![0i64; TEXT_CONTEXT];
				mask[0] = 1;
				mask[1] = 1;
				let input_ids = Value::from_array((vec![1usize, TEXT_CONTEXT], ids))?;
				let attention_mask = Value::from_array((vec![1usize, TEXT_CONTEXT], mask))?;

				let outputs = session.run(ort::inputs![
					"pixel_values" => pixel_values,
					"input_ids" => input_ids,
					"attention_mask" => attention_mask
				])?;
				extract_embedding(&outputs)
			}
			ModelLayout::VisionOnly => {
				let outputs = session.run(ort::inputs!["pixel_values" => pixel_values])?;
				extract_embedding(&outputs)
			}
		}
	}
}

impl ImageEmbedder for VisionEncoder {
	fn dimension(&self) -> usize {
		EMBEDDING_DIM
	}

	fn encoder_tag(&self) -> &str {
		ENCODER_TAG
	}

	fn embed_tensor(&self, pixels: PixelTensor, cancel: &CancelToken) -> Result<Embedding> {
		let expected = self.recipe.shape();
		if pixels.shape() != &expected[..] {
			return Err(MatchError::ModelInference(format!(
				"malformed tensor shape {:?}, expected {:?}",
				pixels.shape(),
				expected
			)));
		}

		let raw = self.run(pixels, cancel)?;
		cancel.check()?;
		Embedding::new(raw)
	}
}

fn extract_embedding(outputs: &SessionOutputs) -> Result<Vec<f32>> {
	let embeds = outputs
		.get("image_embeds")
		.or_else(|| outputs.get("pooler_output"))
		.ok_or_else(|| MatchError::ModelInference("no image_embeds output found".into()))?;

	let (shape, data) = embeds.try_extract_tensor::<f32>()?;
	let dims: Vec<usize> = shape.iter().map(|&x| x as usize).collect();

	match dims.as_slice() {
		[1, dim] | [dim] if *dim == EMBEDDING_DIM => Ok(data.to_vec()),
		_ => Err(MatchError::ModelInference(format!(
			"unexpected output shape {:?}, expected [1, {}]",
			dims, EMBEDDING_DIM
		))),
	}
}
