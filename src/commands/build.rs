//! Build command - embed a product catalog into a fresh store

use anyhow::Result;
use colored::*;
use std::path::Path;
use std::time::Instant;

use crate::build::{self, CatalogBuilder, DefaultFetcher, DummyJsonSource, JsonFileSource, ProductSource};
use crate::cli::SourceKind;
use crate::models::{ModelLayout, VisionEncoder};
use crate::ui;

pub fn run(source: SourceKind, products: Option<&Path>, count: usize, out: &Path, layout: ModelLayout) -> Result<()> {
	let model = super::resolve_model()?;

	ui::info("Loading vision model...");
	let load_start = Instant::now();
	let encoder = VisionEncoder::load(&model, layout)?;
	ui::success(&format!("Model ready in {:.2}s", load_start.elapsed().as_secs_f32()));

	let source: Box<dyn ProductSource> = match (source, products) {
		(SourceKind::File, Some(path)) => {
			ui::info(&format!("Reading products from {}", path.display()));
			Box::new(JsonFileSource::new(path))
		}
		(SourceKind::File, None) => anyhow::bail!("--source file needs --products <FILE>"),
		(SourceKind::Dummyjson, _) => {
			ui::info(&format!("Fetching {} products from dummyjson", count));
			Box::new(DummyJsonSource::new(count)?)
		}
	};

	let fetcher = DefaultFetcher::new()?;
	let builder = CatalogBuilder::new(&encoder, &fetcher);
	let (_, report) = build::rebuild_catalog(&builder, source.as_ref(), out)?;

	ui::summary(report.succeeded.len(), report.skipped.len(), report.duration.as_secs_f32());

	if let Some(partial) = report.partial_failure() {
		ui::warn(&partial.to_string());
		for skipped in &report.skipped {
			println!(
				"  {} {} {}",
				format!("#{}", skipped.id).yellow(),
				skipped.name,
				skipped.reason.dimmed()
			);
		}
		println!();
	} else {
		ui::success("All products embedded");
	}

	Ok(())
}
