//! Catalog embedding store

pub mod catalog;
pub mod index;

pub use catalog::{load, save, Encoding};
pub use index::{CatalogEntry, CatalogHandle, CatalogIndex};
