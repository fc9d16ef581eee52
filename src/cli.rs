use clap::builder::styling::{AnsiColor, Style, Styles};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::{DEFAULT_BUILD_COUNT, DEFAULT_LIMIT};
use crate::models::ModelLayout;
use crate::runtime::Provider;

fn parse_score(s: &str) -> Result<f32, String> {
	let val: f32 = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
	if !(-1.0..=1.0).contains(&val) {
		Err(format!("score must be between -1.0 and 1.0, got {}", val))
	} else {
		Ok(val)
	}
}

fn styles() -> Styles {
	Styles::styled()
		.header(Style::new().bold().fg_color(Some(AnsiColor::Blue.into())))
		.usage(Style::new().bold().fg_color(Some(AnsiColor::Blue.into())))
		.literal(Style::new().fg_color(Some(AnsiColor::Blue.into())))
		.placeholder(Style::new().fg_color(Some(AnsiColor::Yellow.into())))
		.valid(Style::new().fg_color(Some(AnsiColor::Blue.into())))
		.invalid(Style::new().fg_color(Some(AnsiColor::Red.into())))
}

/// Where the build reads its product list from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
	/// The public dummyjson.com product API
	#[default]
	Dummyjson,
	/// A local JSON array of products (--products)
	File,
}

#[derive(Parser, Debug)]
#[command(
	name = "vismatch",
	author,
	version,
	about = "Visual product matching with CLIP embeddings",
	styles = styles(),
	after_help = format!(
		"{title}
  {bin} {build}    {build_args}   {build_desc}
  {bin} {search}   {search_args}            {search_desc}
  {bin} {inspect}  {inspect_args}                {inspect_desc}",
		title = "Examples:".bright_blue().bold(),
		bin = "vismatch".bright_blue(),
		build = "build".yellow(),
		build_args = "--count 60 -o data/catalog.msgpack",
		build_desc = "Embed the product catalog".dimmed(),
		search = "search".yellow(),
		search_args = "sneaker.jpg -n 5",
		search_desc = "Find similar products".dimmed(),
		inspect = "inspect".yellow(),
		inspect_args = "--id 12",
		inspect_desc = "Show catalog contents".dimmed(),
	),
)]
pub struct Cli {
	/// Enable verbose debug output
	#[arg(short = 'v', long = "verbose", global = true)]
	pub verbose: bool,

	/// Execution provider
	#[arg(short = 'p', long = "provider", global = true, default_value = "auto")]
	pub provider: Provider,

	/// Path to the CLIP ONNX model (default: models/ next to the binary)
	#[arg(long = "model", global = true, value_name = "PATH")]
	pub model: Option<PathBuf>,

	/// Directory holding the ONNX models
	#[arg(long = "models-dir", global = true, value_name = "DIR")]
	pub models_dir: Option<PathBuf>,

	/// ONNX export layout
	#[arg(long = "layout", global = true, default_value = "combined")]
	pub layout: ModelLayout,

	/// Worker threads (default: available cores)
	#[arg(long = "workers", global = true)]
	pub workers: Option<usize>,

	/// Intra-op threads for the ONNX session
	#[arg(long = "intra-threads", global = true)]
	pub intra_threads: Option<usize>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Rebuild the catalog store from a product source
	Build {
		/// Product source
		#[arg(long = "source", default_value = "dummyjson")]
		source: SourceKind,

		/// Product list for --source file
		#[arg(long = "products", value_name = "FILE", required_if_eq("source", "file"))]
		products: Option<PathBuf>,

		/// Number of products to fetch from dummyjson
		#[arg(long = "count", default_value_t = DEFAULT_BUILD_COUNT)]
		count: usize,

		/// Output store (.json for JSON, anything else for MessagePack)
		#[arg(short = 'o', long = "out", value_name = "PATH")]
		out: Option<PathBuf>,
	},

	/// Find catalog products similar to an image
	Search {
		/// Image path or http(s) URL
		#[arg(value_name = "IMAGE")]
		image: String,

		/// Catalog store
		#[arg(short = 'c', long = "catalog", value_name = "PATH")]
		catalog: Option<PathBuf>,

		/// Number of results
		#[arg(short = 'n', long = "limit", default_value_t = DEFAULT_LIMIT)]
		limit: usize,

		/// Minimum similarity score (-1.0 to 1.0, inclusive)
		#[arg(short = 's', long = "score", default_value_t = 0.0, value_parser = parse_score)]
		min_score: f32,

		/// Abort if matching takes longer than this
		#[arg(long = "timeout-ms", value_name = "MS")]
		timeout_ms: Option<u64>,
	},

	/// Show what a catalog store contains
	Inspect {
		/// Catalog store
		#[arg(short = 'c', long = "catalog", value_name = "PATH")]
		catalog: Option<PathBuf>,

		/// Show a single product
		#[arg(long = "id")]
		id: Option<u64>,
	},
}
