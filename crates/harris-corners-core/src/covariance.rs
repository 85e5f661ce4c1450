//! Gradient covariance (raw structure tensor entries) from a 3×3 derivative
//! kernel.
//!
//! The horizontal kernel has [`DERIVATIVE_TAPS`] in its left column, the
//! negated taps in its right column and zeros in the middle; the vertical
//! kernel is its transpose. For every window fully inside the image the three
//! products `dx·dx`, `dy·dy`, `dx·dy` are written under the window centre, so
//! the written region is rows `[1, h-1)` and columns `[1, w-1)`.
//!
//! The window with top-left corner `(row i, col j)` lands at `(i + 1, j + 1)`.
//! A layout that stores it at `(i, j + 1)` (rows `[0, h-2)`) is shifted one
//! row up relative to these fields; the centred placement keeps the later
//! response peak on the pixel where the corner is.

use crate::image::{ImageView, PixelData, Sample};
use crate::lanes::{row_batches, Batch, Lane};
use crate::ScalarField;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Smoothing taps of the derivative kernel (Scharr-like, sums to 0.5).
pub const DERIVATIVE_TAPS: [f32; 3] = [0.09375, 0.3125, 0.09375];

/// Horizontal derivative kernel, indexed `[row][col]`.
pub const DERIVATIVE_KERNEL: [[f32; 3]; 3] = [
    [DERIVATIVE_TAPS[0], 0.0, -DERIVATIVE_TAPS[0]],
    [DERIVATIVE_TAPS[1], 0.0, -DERIVATIVE_TAPS[1]],
    [DERIVATIVE_TAPS[2], 0.0, -DERIVATIVE_TAPS[2]],
];

/// The three raw covariance channels of the structure tensor.
#[derive(Clone, Debug, PartialEq)]
pub struct CovarianceFields {
    pub dxdx: ScalarField,
    pub dydy: ScalarField,
    pub dxdy: ScalarField,
}

/// Compute `Ix²`, `Iy²` and `Ix·Iy` for every interior pixel of `img`.
///
/// Output fields are zero-initialized and have the image's dimensions;
/// pixels whose 3×3 window leaves the image stay zero.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(img), fields(w = img.width, h = img.height))
)]
pub fn covariance_fields(img: ImageView<'_>) -> CovarianceFields {
    match img.data {
        PixelData::U8(data) => covariance_from_samples(data, img.width, img.height),
        PixelData::U16(data) => covariance_from_samples(data, img.width, img.height),
    }
}

fn covariance_from_samples<T: Sample>(src: &[T], w: usize, h: usize) -> CovarianceFields {
    let mut dxdx = ScalarField::zeros(w, h);
    let mut dydy = ScalarField::zeros(w, h);
    let mut dxdy = ScalarField::zeros(w, h);

    if w < 3 || h < 3 {
        return CovarianceFields { dxdx, dydy, dxdy };
    }

    let row_job = |(y, ((xx, yy), xy)): (usize, ((&mut [f32], &mut [f32]), &mut [f32]))| {
        if y >= 1 && y < h - 1 {
            covariance_row(src, w, y, xx, yy, xy);
        }
    };

    #[cfg(feature = "rayon")]
    dxdx.data
        .par_chunks_mut(w)
        .zip(dydy.data.par_chunks_mut(w))
        .zip(dxdy.data.par_chunks_mut(w))
        .enumerate()
        .for_each(row_job);

    #[cfg(not(feature = "rayon"))]
    dxdx.data
        .chunks_mut(w)
        .zip(dydy.data.chunks_mut(w))
        .zip(dxdy.data.chunks_mut(w))
        .enumerate()
        .for_each(row_job);

    CovarianceFields { dxdx, dydy, dxdy }
}

/// Fill output row `y` (window rows `y-1..=y+1`).
fn covariance_row<T: Sample>(
    src: &[T],
    w: usize,
    y: usize,
    xx: &mut [f32],
    yy: &mut [f32],
    xy: &mut [f32],
) {
    let top = (y - 1) * w;
    // j is the left column of the window; its centre is j + 1.
    for batch in row_batches(0, w - 2) {
        match batch {
            Batch::Lanes(j) => {
                let (dx, dy) = gradient_lanes(src, w, top + j);
                (dx * dx).store(&mut xx[j + 1..]);
                (dy * dy).store(&mut yy[j + 1..]);
                (dx * dy).store(&mut xy[j + 1..]);
            }
            Batch::Scalar(j) => {
                let (dx, dy) = gradient_at(src, w, top + j);
                xx[j + 1] = dx * dx;
                yy[j + 1] = dy * dy;
                xy[j + 1] = dx * dy;
            }
        }
    }
}

/// Raw `(dx, dy)` for the windows whose top-left corners are `origin..origin + LANES`.
#[inline(always)]
fn gradient_lanes<T: Sample>(src: &[T], w: usize, origin: usize) -> (Lane, Lane) {
    let mut dx = Lane::splat(0.0);
    let mut dy = Lane::splat(0.0);
    for kx in 0..3 {
        for ky in 0..3 {
            let m_dx = DERIVATIVE_KERNEL[ky][kx];
            let m_dy = DERIVATIVE_KERNEL[kx][ky];
            let base = origin + ky * w + kx;
            let px = Lane::from_fn(|k| src[base + k].to_f32());
            if m_dx != 0.0 {
                dx = dx + px * Lane::splat(m_dx);
            }
            if m_dy != 0.0 {
                dy = dy + px * Lane::splat(m_dy);
            }
        }
    }
    (dx, dy)
}

/// Scalar twin of [`gradient_lanes`]; identical accumulation order.
#[inline(always)]
fn gradient_at<T: Sample>(src: &[T], w: usize, origin: usize) -> (f32, f32) {
    let mut dx = 0.0f32;
    let mut dy = 0.0f32;
    for kx in 0..3 {
        for ky in 0..3 {
            let m_dx = DERIVATIVE_KERNEL[ky][kx];
            let m_dy = DERIVATIVE_KERNEL[kx][ky];
            let px = src[origin + ky * w + kx].to_f32();
            if m_dx != 0.0 {
                dx += px * m_dx;
            }
            if m_dy != 0.0 {
                dy += px * m_dy;
            }
        }
    }
    (dx, dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise_u8(w: usize, h: usize, seed: u32) -> Vec<u8> {
        let mut s = seed;
        (0..w * h)
            .map(|_| {
                s = s.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (s >> 24) as u8
            })
            .collect()
    }

    #[test]
    fn kernel_is_antisymmetric() {
        for row in DERIVATIVE_KERNEL {
            assert_eq!(row[0], -row[2]);
            assert_eq!(row[1], 0.0);
        }
        assert_eq!(DERIVATIVE_TAPS.iter().sum::<f32>(), 0.5);
    }

    #[test]
    fn horizontal_ramp_has_pure_x_gradient() {
        let (w, h) = (11, 6);
        let data: Vec<u8> = (0..h).flat_map(|_| (0..w).map(|x| (3 * x) as u8)).collect();
        let img = ImageView::from_u8_slice(w, h, &data).unwrap();
        let cov = covariance_fields(img);

        for y in 1..h - 1 {
            for x in 1..w - 1 {
                assert_eq!(cov.dxdx.at(x, y), 9.0, "dxdx at ({x},{y})");
                assert_eq!(cov.dydy.at(x, y), 0.0);
                assert_eq!(cov.dxdy.at(x, y), 0.0);
            }
        }
    }

    #[test]
    fn border_ring_stays_zero() {
        let (w, h) = (13, 9);
        let data = noise_u8(w, h, 7);
        let cov = covariance_fields(ImageView::from_u8_slice(w, h, &data).unwrap());
        for field in [&cov.dxdx, &cov.dydy, &cov.dxdy] {
            for x in 0..w {
                assert_eq!(field.at(x, 0), 0.0);
                assert_eq!(field.at(x, h - 1), 0.0);
            }
            for y in 0..h {
                assert_eq!(field.at(0, y), 0.0);
                assert_eq!(field.at(w - 1, y), 0.0);
            }
        }
    }

    #[test]
    fn lane_path_matches_scalar_twin_bitwise() {
        // Widths chosen to hit exact multiples, end-aligned tails and the
        // scalar fallback (w - 2 < LANES).
        for w in [3usize, 4, 5, 6, 7, 9, 10, 17] {
            let h = 5;
            let data = noise_u8(w, h, w as u32);
            let cov = covariance_fields(ImageView::from_u8_slice(w, h, &data).unwrap());
            for y in 1..h - 1 {
                for x in 1..w - 1 {
                    let (dx, dy) = gradient_at(&data, w, (y - 1) * w + (x - 1));
                    assert_eq!(cov.dxdx.at(x, y).to_bits(), (dx * dx).to_bits());
                    assert_eq!(cov.dydy.at(x, y).to_bits(), (dy * dy).to_bits());
                    assert_eq!(cov.dxdy.at(x, y).to_bits(), (dx * dy).to_bits());
                }
            }
        }
    }

    #[test]
    fn products_are_centred_on_the_window() {
        let (w, h) = (7, 7);
        let mut data = vec![0u8; w * h];
        data[3 * w + 3] = 100;
        let cov = covariance_fields(ImageView::from_u8_slice(w, h, &data).unwrap());

        let support = |f: &ScalarField| {
            let mut px = Vec::new();
            for y in 0..h {
                for x in 0..w {
                    if f.at(x, y) != 0.0 {
                        px.push((y, x));
                    }
                }
            }
            px
        };
        // Symmetric about the impulse in both directions.
        let dx_support = vec![(2, 2), (2, 4), (3, 2), (3, 4), (4, 2), (4, 4)];
        let dy_support = vec![(2, 2), (2, 3), (2, 4), (4, 2), (4, 3), (4, 4)];
        assert_eq!(support(&cov.dxdx), dx_support);
        assert_eq!(support(&cov.dydy), dy_support);
        assert_eq!(support(&cov.dxdy), vec![(2, 2), (2, 4), (4, 2), (4, 4)]);
    }

    #[test]
    fn tiny_images_produce_zero_fields() {
        let data = [255u8; 4];
        let cov = covariance_fields(ImageView::from_u8_slice(2, 2, &data).unwrap());
        assert!(cov.dxdx.data.iter().all(|&v| v == 0.0));
        assert_eq!((cov.dydy.w, cov.dydy.h), (2, 2));
    }
}
