//! Candidate extraction on top of the dense Harris response.
use crate::covariance::covariance_fields;
use crate::image::ImageView;
use crate::profile::{NoProfile, ProfileHook, Stage, Stopwatch};
use crate::response::corner_response;
use crate::smooth::{Gaussian3x3, Smoother};
use crate::{HarrisParams, ScalarField, BORDER};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// A pixel that is a local maximum of the response map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub row: usize,
    pub col: usize,
    /// Harris response at `(row, col)`.
    pub score: f32,
}

/// Timed detection outcome containing candidates and profiling data.
#[derive(Clone, Debug)]
pub struct HarrisResult {
    /// Candidates in raster order.
    pub candidates: Vec<Candidate>,
    /// Time spent computing the dense response (milliseconds).
    pub scores_ms: f64,
    /// Time spent on thresholding and NMS (milliseconds).
    pub maxima_ms: f64,
}

/// Run covariance, smoothing and scoring; returns the response map.
pub fn harris_scores<S: Smoother + ?Sized>(img: ImageView<'_>, smoother: &S) -> ScalarField {
    harris_scores_profiled(img, smoother, &mut NoProfile)
}

/// [`harris_scores`] reporting each stage's elapsed time to `hook`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(w = img.width, h = img.height))
)]
pub fn harris_scores_profiled<S, P>(img: ImageView<'_>, smoother: &S, hook: &mut P) -> ScalarField
where
    S: Smoother + ?Sized,
    P: ProfileHook + ?Sized,
{
    let sw = Stopwatch::start(hook);
    let cov = covariance_fields(img);
    sw.stop(hook, Stage::Covariance);

    let sw = Stopwatch::start(hook);
    let dxdx = smoother.smooth3x3(&cov.dxdx);
    let dydy = smoother.smooth3x3(&cov.dydy);
    let dxdy = smoother.smooth3x3(&cov.dxdy);
    sw.stop(hook, Stage::Smoothing);

    let sw = Stopwatch::start(hook);
    let resp = corner_response(&dxdx, &dydy, &dxdy);
    sw.stop(hook, Stage::Response);

    resp
}

/// Detect candidates in an 8- or 16-bit image with the stock Gaussian window.
pub fn find_candidates(img: ImageView<'_>, params: &HarrisParams) -> Vec<Candidate> {
    let mut out = Vec::new();
    find_candidates_into(img, params, &mut out);
    out
}

/// Like [`find_candidates`], appending to a caller-owned vector.
pub fn find_candidates_into(img: ImageView<'_>, params: &HarrisParams, out: &mut Vec<Candidate>) {
    let resp = harris_scores(img, &Gaussian3x3);
    get_2d_maxima(&resp, params.threshold_abs, out);
}

/// Detect candidates and report stage timings to `hook`.
///
/// This is a convenience that combines:
/// - [`harris_scores_profiled`] (dense response map)
/// - [`get_2d_maxima`] (thresholding + 8-neighbour NMS)
///
/// With a disabled hook such as [`NoProfile`] the clock is never read and
/// both millisecond fields of the result are zero.
pub fn find_candidates_with_trace<P: ProfileHook + ?Sized>(
    img: ImageView<'_>,
    params: &HarrisParams,
    hook: &mut P,
) -> HarrisResult {
    let scores_sw = Stopwatch::start(hook);
    let resp = harris_scores_profiled(img, &Gaussian3x3, hook);
    let scores_ms = scores_sw.elapsed().as_secs_f64() * 1000.0;

    let sw = Stopwatch::start(hook);
    let mut candidates = Vec::new();
    get_2d_maxima(&resp, params.threshold_abs, &mut candidates);
    let maxima_elapsed = sw.stop(hook, Stage::Maxima);

    HarrisResult {
        candidates,
        scores_ms,
        maxima_ms: maxima_elapsed.as_secs_f64() * 1000.0,
    }
}

/// 8-neighbour non-maximum suppression with an absolute threshold.
///
/// Scans rows and columns `[BORDER, dim - BORDER)` and appends, in raster
/// order, every pixel with `r >= threshold` that no neighbour strictly
/// exceeds. Equal neighbours do not suppress each other, so a plateau can
/// yield several candidates.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(resp, out), fields(w = resp.w, h = resp.h))
)]
pub fn get_2d_maxima(resp: &ScalarField, threshold: f32, out: &mut Vec<Candidate>) {
    let (w, h) = (resp.w, resp.h);
    if w <= 2 * BORDER || h <= 2 * BORDER {
        return;
    }
    let d = &resp.data;

    for y in BORDER..h - BORDER {
        let mut skip_next = false;
        for x in BORDER..w - BORDER {
            if std::mem::take(&mut skip_next) {
                continue;
            }
            let i = y * w + x;
            let c = d[i];
            if c < threshold {
                continue;
            }
            let right = d[i + 1];
            if right > c {
                continue;
            }
            // The right pixel now has a strictly larger left neighbour.
            skip_next = right < c;
            if d[i - 1] > c {
                continue;
            }
            let below = i + w;
            let above = i - w;
            if d[below] > c
                || d[above] > c
                || d[below + 1] > c
                || d[below - 1] > c
                || d[above + 1] > c
                || d[above - 1] > c
            {
                continue;
            }
            out.push(Candidate {
                row: y,
                col: x,
                score: c,
            });
        }
    }
}
