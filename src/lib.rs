//! # vismatch
//!
//! Visual product matching: rank a fixed product catalog by CLIP embedding
//! similarity to an arbitrary input image. Covers image preprocessing, ONNX
//! inference, the persisted catalog store, similarity search and offline
//! catalog builds.

pub mod build;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod models;
pub mod processing;
pub mod runtime;
pub mod search;
pub mod storage;
pub mod ui;

pub use crate::core::{CancelToken, Embedding, Product, SearchResult};
pub use engine::Engine;
pub use error::{MatchError, Result};
pub use search::{LinearScan, SearchParams, SimilarityIndex};
pub use storage::{CatalogHandle, CatalogIndex};
