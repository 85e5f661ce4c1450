//! 3×3 smoothing of covariance channels.
//!
//! The pipeline only relies on the [`Smoother`] contract: the output has the
//! input's dimensions and pixels without a full 3×3 neighbourhood (the outer
//! one-pixel ring) are left at zero. [`Gaussian3x3`] is the stock window.

use crate::lanes::{row_batches, Batch, Lane};
use crate::ScalarField;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Sampled Gaussian with σ = 1, normalized to sum to one.
pub const GAUSS_TAPS: [f32; 3] = [0.274_068_62, 0.451_862_75, 0.274_068_62];

/// Window applied to each covariance channel before scoring.
pub trait Smoother: Sync {
    /// Return a smoothed copy of `src` with identical dimensions.
    fn smooth3x3(&self, src: &ScalarField) -> ScalarField;
}

impl<F> Smoother for F
where
    F: Fn(&ScalarField) -> ScalarField + Sync,
{
    fn smooth3x3(&self, src: &ScalarField) -> ScalarField {
        self(src)
    }
}

/// Separable 3×3 Gaussian built from [`GAUSS_TAPS`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Gaussian3x3;

impl Gaussian3x3 {
    #[inline]
    fn weights() -> [[f32; 3]; 3] {
        core::array::from_fn(|r| core::array::from_fn(|c| GAUSS_TAPS[r] * GAUSS_TAPS[c]))
    }
}

impl Smoother for Gaussian3x3 {
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip(self, src), fields(w = src.w, h = src.h))
    )]
    fn smooth3x3(&self, src: &ScalarField) -> ScalarField {
        let (w, h) = (src.w, src.h);
        let mut dst = ScalarField::zeros(w, h);
        if w < 3 || h < 3 {
            return dst;
        }
        let weights = Self::weights();

        let row_job = |(y, out): (usize, &mut [f32])| {
            if y >= 1 && y < h - 1 {
                gauss_row(src, y, &weights, out);
            }
        };

        #[cfg(feature = "rayon")]
        dst.data.par_chunks_mut(w).enumerate().for_each(row_job);
        #[cfg(not(feature = "rayon"))]
        dst.data.chunks_mut(w).enumerate().for_each(row_job);

        dst
    }
}

fn gauss_row(src: &ScalarField, y: usize, weights: &[[f32; 3]; 3], out: &mut [f32]) {
    let rows = [src.row(y - 1), src.row(y), src.row(y + 1)];
    for batch in row_batches(1, src.w - 1) {
        match batch {
            Batch::Lanes(x) => {
                let mut acc = Lane::splat(0.0);
                for (r, row) in rows.iter().enumerate() {
                    for c in 0..3 {
                        acc = acc + Lane::load(&row[x - 1 + c..]) * Lane::splat(weights[r][c]);
                    }
                }
                acc.store(&mut out[x..]);
            }
            Batch::Scalar(x) => {
                let mut acc = 0.0f32;
                for (r, row) in rows.iter().enumerate() {
                    for c in 0..3 {
                        acc += row[x - 1 + c] * weights[r][c];
                    }
                }
                out[x] = acc;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_are_normalized() {
        let sum: f32 = Gaussian3x3::weights().iter().flatten().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn impulse_spreads_to_neighbours_only() {
        let mut src = ScalarField::zeros(7, 7);
        src.data[3 * 7 + 3] = 16.0;
        let out = Gaussian3x3.smooth3x3(&src);
        let weights = Gaussian3x3::weights();

        assert_eq!((out.w, out.h), (7, 7));
        for y in 0..7 {
            for x in 0..7 {
                let v = out.at(x, y);
                if (2..=4).contains(&x) && (2..=4).contains(&y) {
                    let expected = 16.0 * weights[4 - y][4 - x];
                    assert!((v - expected).abs() < 1e-5, "({x},{y}) = {v}");
                } else {
                    assert_eq!(v, 0.0);
                }
            }
        }
    }

    #[test]
    fn outer_ring_untouched() {
        let src = ScalarField {
            w: 6,
            h: 5,
            data: vec![1.0; 30],
        };
        let out = Gaussian3x3.smooth3x3(&src);
        for x in 0..6 {
            assert_eq!(out.at(x, 0), 0.0);
            assert_eq!(out.at(x, 4), 0.0);
        }
        for y in 1..4 {
            assert_eq!(out.at(0, y), 0.0);
            assert_eq!(out.at(5, y), 0.0);
            assert!((out.at(2, y) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn closures_act_as_smoothers() {
        let identity = |f: &ScalarField| f.clone();
        let src = ScalarField {
            w: 2,
            h: 2,
            data: vec![1.0, 2.0, 3.0, 4.0],
        };
        assert_eq!(identity.smooth3x3(&src), src);
    }
}
