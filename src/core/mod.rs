//! Core domain types

pub mod cancel;
pub mod embedding;
pub mod hash;
pub mod product;

pub use cancel::CancelToken;
pub use embedding::Embedding;
pub use hash::Fingerprint;
pub use product::{Product, SearchResult};
