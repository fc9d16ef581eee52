//! Image preprocessing

pub mod image;

pub use self::image::{decode, encode_bytes, prepare, preprocess, ClipPreprocess, PixelTensor};
