//! Inspect command - summarize a catalog store

use anyhow::{anyhow, Result};
use colored::*;
use std::path::Path;

use crate::config::{EMBEDDING_DIM, ENCODER_TAG};
use crate::storage::{self, Encoding};
use crate::ui;

pub fn run(catalog: &Path, id: Option<u64>) -> Result<()> {
	let index = storage::load(catalog, ENCODER_TAG, EMBEDDING_DIM)?;

	if let Some(id) = id {
		let entry = index.get(id).ok_or_else(|| anyhow!("Product {} is not in {}", id, catalog.display()))?;
		let product = &entry.product;

		ui::header(&product.name);
		println!("  {} {}", "Id:".bright_blue(), product.id);
		println!("  {} {}", "Category:".bright_blue(), product.category);
		println!("  {} {}", "Brand:".bright_blue(), product.brand);
		println!("  {} ${:.2}", "Price:".bright_blue(), product.price);
		println!("  {} {:.1}", "Rating:".bright_blue(), product.rating);
		println!("  {} {}", "Image:".bright_blue(), product.image_url);
		println!("  {} {:.4}", "Norm:".bright_blue(), entry.embedding.norm());
		if !product.description.is_empty() {
			println!("  {}", product.description.dimmed());
		}
		println!();
		return Ok(());
	}

	let format = match Encoding::for_path(catalog) {
		Encoding::Json => "JSON",
		Encoding::MessagePack => "MessagePack",
	};

	ui::header("Catalog");
	println!("  {} {}", "Path:".bright_blue(), catalog.display());
	println!("  {} {}", "Format:".bright_blue(), format);
	println!("  {} {}", "Encoder:".bright_blue(), index.encoder());
	println!("  {} {}", "Dimension:".bright_blue(), index.dimension());
	println!("  {} {}", "Built:".bright_blue(), index.built_at().format("%Y-%m-%d %H:%M:%S UTC"));
	println!("  {} {}", "Generation:".bright_blue(), index.fingerprint().short());
	println!("  {} {}", "Products:".bright_blue(), index.len());

	let categories = index.categories();
	if !categories.is_empty() {
		println!("  {} {}", "Categories:".bright_blue(), categories.join(", ").dimmed());
	}
	println!();

	ui::debug(&format!("Catalog {} validated", catalog.display()));
	Ok(())
}
