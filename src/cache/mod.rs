//! On-disk caches

pub mod image_cache;

pub use image_cache::{fetch_image_cached, ImageCache};
