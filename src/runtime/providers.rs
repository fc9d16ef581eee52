//! Execution provider selection

use anyhow::{Context, Result};
use ort::ep::ExecutionProvider;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use crate::config::INTRA_THREADS;
use crate::ui;

/// Execution provider for ONNX Runtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Provider {
	/// Auto-detect best available (TensorRT → CUDA → CoreML → XNNPACK → CPU)
	#[default]
	Auto,
	/// CPU only
	Cpu,
	/// NVIDIA CUDA GPU
	Cuda,
	/// NVIDIA TensorRT (optimized inference)
	Tensorrt,
	/// Apple CoreML (macOS only)
	Coreml,
	/// XNNPACK CPU kernels
	Xnnpack,
}

/// Accelerated backends that can be registered on a session builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
	TensorRt,
	Cuda,
	CoreMl,
	Xnnpack,
}

impl Provider {
	/// Backends to try, best first; an empty list means plain CPU
	fn backends(self) -> &'static [Backend] {
		match self {
			Provider::Auto => &[Backend::TensorRt, Backend::Cuda, Backend::CoreMl, Backend::Xnnpack],
			Provider::Cpu => &[],
			Provider::Cuda => &[Backend::Cuda],
			Provider::Tensorrt => &[Backend::TensorRt],
			Provider::Coreml => &[Backend::CoreMl],
			Provider::Xnnpack => &[Backend::Xnnpack],
		}
	}
}

impl Backend {
	fn name(self) -> &'static str {
		match self {
			Backend::TensorRt => "TensorRT",
			Backend::Cuda => "CUDA",
			Backend::CoreMl => "CoreML",
			Backend::Xnnpack => "XNNPACK",
		}
	}

	fn register(self, builder: &mut SessionBuilder) -> bool {
		match self {
			Backend::TensorRt => register::<ort::ep::TensorRT>(builder, self.name()),
			Backend::Cuda => register::<ort::ep::CUDA>(builder, self.name()),
			#[cfg(target_os = "macos")]
			Backend::CoreMl => register::<ort::ep::CoreML>(builder, self.name()),
			#[cfg(not(target_os = "macos"))]
			Backend::CoreMl => {
				ui::debug("CoreML only available on macOS");
				false
			}
			Backend::Xnnpack => register::<ort::ep::XNNPACK>(builder, self.name()),
		}
	}
}

static SELECTED_PROVIDER: OnceLock<Provider> = OnceLock::new();
static INTRA: OnceLock<usize> = OnceLock::new();
static PROVIDER_LOGGED: AtomicBool = AtomicBool::new(false);

pub fn set_provider(p: Provider) {
	let _ = SELECTED_PROVIDER.set(p);
}

pub fn set_intra_threads(n: usize) {
	let _ = INTRA.set(n.max(1));
}

fn get_provider() -> Provider {
	SELECTED_PROVIDER.get().copied().unwrap_or_default()
}

/// Provider choice is reported once per process, not once per session
fn report_once(msg: &str) {
	if !PROVIDER_LOGGED.swap(true, Ordering::Relaxed) {
		ui::success(msg);
	}
}

fn register<P: ExecutionProvider + Default>(builder: &mut SessionBuilder, name: &str) -> bool {
	ui::debug(&format!("Trying provider: {}", name));

	let provider = P::default();
	if !provider.is_available().unwrap_or(false) {
		ui::debug(&format!("{} not available", name));
		return false;
	}

	match provider.register(builder) {
		Ok(_) => true,
		Err(e) => {
			ui::debug(&format!("{} registration failed: {}", name, e));
			false
		}
	}
}

pub fn create_session(model_path: &Path) -> Result<Session> {
	let mut builder = Session::builder().context("Failed to create session builder")?;

	let requested = get_provider();
	let chosen = requested.backends().iter().copied().find(|b| b.register(&mut builder));

	match (chosen, requested) {
		(Some(backend), _) => report_once(&format!("Using {} execution provider", backend.name())),
		(None, Provider::Auto) => report_once("Using CPU execution provider"),
		(None, Provider::Cpu) => report_once("Using CPU execution provider (forced)"),
		(None, other) => ui::error(&format!("{:?} requested but unavailable, falling back to CPU", other)),
	}

	let intra = INTRA.get().copied().unwrap_or(INTRA_THREADS);
	builder
		.with_optimization_level(GraphOptimizationLevel::Level3)?
		.with_intra_threads(intra)?
		.commit_from_file(model_path)
		.context("Failed to load model")
}
