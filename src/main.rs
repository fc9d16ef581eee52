//! vismatch - visual product matching
//!
//! Embeds a product catalog with a CLIP vision encoder and ranks catalog
//! products by similarity to a query image.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;

use vismatch::cli::{Cli, Command};
use vismatch::commands::{self, search::SearchOptions};
use vismatch::config::{self, INTRA_THREADS};
use vismatch::runtime::{set_intra_threads, set_provider};
use vismatch::ui::{self, Log};

fn main() {
	let cli = Cli::parse();

	Log::set_verbose(cli.verbose);
	set_provider(cli.provider);
	set_intra_threads(cli.intra_threads.unwrap_or(INTRA_THREADS));
	if let Some(model) = cli.model.clone() {
		config::set_model(model);
	}
	if let Some(dir) = cli.models_dir.clone() {
		config::set_model_dir(dir);
	}

	print_header();

	if let Err(e) = run(cli) {
		ui::error(&format!("{:#}", e));
		std::process::exit(1);
	}
}

fn run(cli: Cli) -> Result<()> {
	match cli.command {
		Command::Build { source, products, count, out } => {
			let out = catalog_path(out);
			commands::build::run(source, products.as_deref(), count, &out, cli.layout)
		}
		Command::Search { image, catalog, limit, min_score, timeout_ms } => {
			let catalog = catalog_path(catalog);
			let options = SearchOptions {
				limit,
				min_score,
				timeout: timeout_ms.map(Duration::from_millis),
				workers: cli.workers,
				layout: cli.layout,
			};
			commands::search::run(&image, &catalog, options)
		}
		Command::Inspect { catalog, id } => {
			let catalog = catalog_path(catalog);
			commands::inspect::run(&catalog, id)
		}
	}
}

/// `-c`/`-o` from the command line, else VISMATCH_CATALOG, else the default store
fn catalog_path(flag: Option<PathBuf>) -> PathBuf {
	if let Some(path) = flag {
		config::set_catalog(path);
	}
	config::get_catalog_path()
}

fn print_header() {
	println!();
	println!(
		"{}",
		format!("─── vismatch v{} ───", env!("CARGO_PKG_VERSION"))
			.bright_blue()
			.bold()
	);
}
