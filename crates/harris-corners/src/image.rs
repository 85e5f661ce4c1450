//! `image` crate helpers for the Harris candidate detector.
//!
//! These wrappers expose the core response and detection primitives in terms
//! of `image::GrayImage` and 16-bit luma buffers.

use harris_corners_core::{detect, Candidate, Gaussian3x3, HarrisParams, ImageView, ScalarField};
use image::{GrayImage, ImageBuffer, Luma};

/// 16-bit single channel image.
pub type Gray16Image = ImageBuffer<Luma<u16>, Vec<u16>>;

#[inline]
pub fn view_u8(img: &GrayImage) -> ImageView<'_> {
    ImageView::from_u8_slice(img.width() as usize, img.height() as usize, img.as_raw())
        .expect("GrayImage buffer matches its dimensions")
}

#[inline]
pub fn view_u16(img: &Gray16Image) -> ImageView<'_> {
    ImageView::from_u16_slice(img.width() as usize, img.height() as usize, img.as_raw())
        .expect("Gray16Image buffer matches its dimensions")
}

/// Dense Harris response for an 8-bit image.
#[inline]
pub fn harris_response_image(img: &GrayImage) -> ScalarField {
    detect::harris_scores(view_u8(img), &Gaussian3x3)
}

/// Dense Harris response for a 16-bit image.
#[inline]
pub fn harris_response_image16(img: &Gray16Image) -> ScalarField {
    detect::harris_scores(view_u16(img), &Gaussian3x3)
}

/// Candidates of an 8-bit image in raster order.
#[inline]
pub fn find_candidates_image(img: &GrayImage, params: &HarrisParams) -> Vec<Candidate> {
    detect::find_candidates(view_u8(img), params)
}

/// Candidates of a 16-bit image in raster order.
#[inline]
pub fn find_candidates_image16(img: &Gray16Image, params: &HarrisParams) -> Vec<Candidate> {
    detect::find_candidates(view_u16(img), params)
}
