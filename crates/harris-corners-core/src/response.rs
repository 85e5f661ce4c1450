//! Harris corner response from smoothed structure tensor channels.
use crate::lanes::{row_batches, Batch, Lane};
use crate::{ScalarField, BORDER};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Trace weight of the Harris score (κ = 1/16).
pub const HARRIS_KAPPA: f32 = 0.0625;

/// Score every pixel at least [`BORDER`] pixels away from the image edges:
///
/// ```text
/// det   = Ix²s · Iy²s − IxIys²
/// trace = Ix²s + Iy²s
/// R     = det − κ · trace²
/// ```
///
/// The returned field has the inputs' dimensions; the border margin is 0.0.
///
/// # Panics
///
/// Panics if the three channels do not share the same dimensions.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(w = dxdx.w, h = dxdx.h))
)]
pub fn corner_response(dxdx: &ScalarField, dydy: &ScalarField, dxdy: &ScalarField) -> ScalarField {
    assert!(
        dxdx.same_size(dydy) && dxdx.same_size(dxdy),
        "covariance channels differ in size: {}x{}, {}x{}, {}x{}",
        dxdx.w,
        dxdx.h,
        dydy.w,
        dydy.h,
        dxdy.w,
        dxdy.h
    );

    let (w, h) = (dxdx.w, dxdx.h);
    let mut resp = ScalarField::zeros(w, h);
    if w <= 2 * BORDER || h <= 2 * BORDER {
        return resp;
    }

    let row_job = |(y, out): (usize, &mut [f32])| {
        if y >= BORDER && y < h - BORDER {
            response_row(dxdx.row(y), dydy.row(y), dxdy.row(y), out);
        }
    };

    #[cfg(feature = "rayon")]
    resp.data.par_chunks_mut(w).enumerate().for_each(row_job);
    #[cfg(not(feature = "rayon"))]
    resp.data.chunks_mut(w).enumerate().for_each(row_job);

    resp
}

fn response_row(xx: &[f32], yy: &[f32], xy: &[f32], out: &mut [f32]) {
    let w = out.len();
    let kappa = Lane::splat(HARRIS_KAPPA);
    for batch in row_batches(BORDER, w - BORDER) {
        match batch {
            Batch::Lanes(x) => {
                let a = Lane::load(&xx[x..]);
                let b = Lane::load(&yy[x..]);
                let c = Lane::load(&xy[x..]);
                let det = a * b - c * c;
                let trace = a + b;
                (det - trace * trace * kappa).store(&mut out[x..]);
            }
            Batch::Scalar(x) => out[x] = harris_score(xx[x], yy[x], xy[x]),
        }
    }
}

/// Scalar Harris score; same operation order as the lane path.
#[inline]
pub fn harris_score(dxdx: f32, dydy: f32, dxdy: f32) -> f32 {
    let det = dxdx * dydy - dxdy * dxdy;
    let trace = dxdx + dydy;
    det - trace * trace * HARRIS_KAPPA
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(w: usize, h: usize, f: impl Fn(usize, usize) -> f32) -> ScalarField {
        let mut out = ScalarField::zeros(w, h);
        for y in 0..h {
            for x in 0..w {
                out.data[y * w + x] = f(x, y);
            }
        }
        out
    }

    #[test]
    fn score_formula() {
        // det = 4*2 - 1 = 7, trace = 6, 7 - 36/16 = 4.75
        assert_eq!(harris_score(4.0, 2.0, 1.0), 4.75);
        // pure edge: det = 0 → negative
        assert!(harris_score(10.0, 0.0, 0.0) < 0.0);
    }

    #[test]
    fn border_is_zero_and_interior_scored() {
        let (w, h) = (11, 8);
        let a = field(w, h, |x, y| (x + y) as f32 + 1.0);
        let b = field(w, h, |x, _| x as f32 * 0.5 + 2.0);
        let c = field(w, h, |_, y| y as f32 * 0.25);
        let r = corner_response(&a, &b, &c);

        for y in 0..h {
            for x in 0..w {
                let v = r.at(x, y);
                let interior = (BORDER..w - BORDER).contains(&x) && (BORDER..h - BORDER).contains(&y);
                if interior {
                    let expected = harris_score(a.at(x, y), b.at(x, y), c.at(x, y));
                    assert_eq!(v.to_bits(), expected.to_bits(), "({x},{y})");
                } else {
                    assert_eq!(v, 0.0, "border ({x},{y})");
                }
            }
        }
    }

    #[test]
    fn overlapping_tail_matches_scalar_for_all_widths() {
        for w in 5..=16 {
            let h = 6;
            let a = field(w, h, |x, y| ((x * 7 + y * 3) % 11) as f32 * 1.37);
            let b = field(w, h, |x, y| ((x * 5 + y) % 13) as f32 * 0.91);
            let c = field(w, h, |x, y| ((x + y * 9) % 7) as f32 - 3.3);
            let r = corner_response(&a, &b, &c);
            for y in BORDER..h - BORDER {
                for x in BORDER..w - BORDER {
                    let expected = harris_score(a.at(x, y), b.at(x, y), c.at(x, y));
                    assert_eq!(r.at(x, y).to_bits(), expected.to_bits(), "w={w} ({x},{y})");
                }
            }
        }
    }

    #[test]
    fn degenerate_sizes_write_nothing() {
        let a = ScalarField {
            w: 4,
            h: 9,
            data: vec![3.0; 36],
        };
        let r = corner_response(&a, &a, &a);
        assert!(r.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    #[should_panic(expected = "differ in size")]
    fn mismatched_channels_panic() {
        let a = ScalarField::zeros(8, 8);
        let b = ScalarField::zeros(8, 7);
        let _ = corner_response(&a, &b, &a);
    }
}
