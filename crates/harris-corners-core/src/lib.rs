#![cfg_attr(feature = "simd", feature(portable_simd))]
//! Core primitives for computing Harris corner responses and extracting
//! keypoint candidates from 8‑bit and 16‑bit grayscale images.
//!
//! # Overview
//!
//! The detector is a strictly forward pipeline:
//!
//! 1. [`covariance`] – 3×3 derivative convolution and the raw structure
//!    tensor products `Ix·Ix`, `Iy·Iy`, `Ix·Iy`.
//! 2. [`smooth`] – 3×3 Gaussian window applied to each product
//!    (pluggable through the [`Smoother`] trait).
//! 3. [`response`] – Harris score `det − trace² / 16` per pixel.
//! 4. [`detect`] – thresholding and strict 8‑neighbour non‑maximum
//!    suppression, emitting [`Candidate`]s in raster order.
//!
//! Rows are processed in fixed‑width batches of [`lanes::LANES`] pixels. The
//! last batch of a row is re‑anchored to end at the row's last valid pixel,
//! so some pixels are computed twice with bit‑identical results.
//!
//! # Features
//!
//! - `rayon` – parallelizes the dense stages over image rows. This does not
//!   change numerical results, only performance on multi‑core machines.
//! - `simd` – runs the lane batches on `portable_simd` vectors. Requires a
//!   nightly compiler; the array path remains the reference implementation
//!   and both produce identical values.
//! - `tracing` – emits `tracing` spans around each stage.
//!
//! Pixels within two pixels of any border are never written by the response
//! stage and never reported as candidates.

pub mod covariance;
pub mod detect;
pub mod image;
pub mod lanes;
pub mod profile;
pub mod response;
pub mod smooth;

pub use crate::detect::{find_candidates, find_candidates_into, harris_scores, Candidate};
pub use crate::image::{ImageView, PixelData, PixelDepth};
pub use crate::profile::{NoProfile, ProfileHook, Stage, StageTimings};
pub use crate::smooth::{Gaussian3x3, Smoother};

/// Width of the margin (on every side) that the response stage leaves at zero
/// and the maxima scan never visits.
pub const BORDER: usize = 2;

/// Tunable parameters for candidate extraction.
#[derive(Clone, Debug)]
pub struct HarrisParams {
    /// Absolute response threshold. A pixel whose response equals the
    /// threshold is still eligible.
    pub threshold_abs: f32,
}

impl Default for HarrisParams {
    fn default() -> Self {
        Self { threshold_abs: 0.0 }
    }
}

/// Dense `f32` field in row-major layout with the dimensions of the source
/// image. Used for covariance channels and the response map.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField {
    pub w: usize,
    pub h: usize,
    pub data: Vec<f32>,
}

impl ScalarField {
    /// Zero-initialized field of the given size.
    pub fn zeros(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![0.0; w * h],
        }
    }

    #[inline]
    /// Value at an integer coordinate.
    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.w + x]
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[f32] {
        &self.data[y * self.w..(y + 1) * self.w]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let w = self.w;
        &mut self.data[y * w..(y + 1) * w]
    }

    #[inline]
    pub fn same_size(&self, other: &ScalarField) -> bool {
        self.w == other.w && self.h == other.h
    }
}
