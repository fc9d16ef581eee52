//! Search command - rank catalog products against a query image

use anyhow::Result;
use colored::*;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::build::{DefaultFetcher, ImageFetcher};
use crate::core::CancelToken;
use crate::engine::Engine;
use crate::models::ModelLayout;
use crate::search::SearchParams;
use crate::ui;

pub struct SearchOptions {
	pub limit: usize,
	pub min_score: f32,
	pub timeout: Option<Duration>,
	pub workers: Option<usize>,
	pub layout: ModelLayout,
}

pub fn run(image: &str, catalog: &Path, options: SearchOptions) -> Result<()> {
	let model = super::resolve_model()?;
	let engine = Engine::start(&model, options.layout, catalog, options.workers)?;

	ui::info(&format!("Searching by image: {}", image));
	let bytes = DefaultFetcher::new()?.fetch(image)?;

	let cancel = match options.timeout {
		Some(timeout) => CancelToken::with_timeout(timeout),
		None => CancelToken::new(),
	};

	let search_start = Instant::now();
	let results = engine.match_image(&bytes, SearchParams::new(options.limit, options.min_score), &cancel)?;
	ui::debug(&format!("Matched in {}ms", search_start.elapsed().as_millis()));

	if results.is_empty() {
		ui::warn("No matches found");
		return Ok(());
	}

	ui::header("Results");

	for (i, result) in results.iter().enumerate() {
		let product = &result.product;
		let rank = format!("#{}", i + 1).bright_blue().bold();
		let score = format!("{:.3}", result.similarity_score);
		let score = if result.similarity_score >= 0.8 {
			score.bright_green()
		} else if result.similarity_score >= 0.5 {
			score.yellow()
		} else {
			score.dimmed()
		};

		println!(
			"  {} {} {} {}",
			rank,
			product.name.bright_white(),
			format!("[{}]", product.category).dimmed(),
			score
		);
		println!(
			"     {} {} {}",
			format!("${:.2}", product.price).bright_blue(),
			product.brand.dimmed(),
			format!("id {}", product.id).dimmed()
		);
	}

	println!();
	ui::success(&format!("Found {} matches", results.len()));
	Ok(())
}
