//! Ergonomic wrappers over `harris-corners-core` that accept `image` crate
//! buffers, plus the application layer behind the `harris-corners` CLI.
//!
//! - [`image`] – helpers on `image::GrayImage` and 16-bit luma buffers.
//! - [`app`] – JSON-config driven detection with JSON/PNG output.
//! - [`logger`] – a simple `log` implementation used by the CLI and examples.

#[cfg(feature = "image")]
pub mod app;
#[cfg(feature = "image")]
pub mod image;
pub mod logger;

// Re-export a focused subset of core types for convenience. Consumers that
// need the individual stages should depend on `harris-corners-core` directly.
pub use harris_corners_core::detect::HarrisResult;
pub use harris_corners_core::{
    Candidate, Gaussian3x3, HarrisParams, ImageView, PixelDepth, ScalarField, Smoother,
    StageTimings,
};

#[cfg(feature = "image")]
pub use crate::image::{
    find_candidates_image, find_candidates_image16, harris_response_image,
    harris_response_image16, Gray16Image,
};
