//! Fixed-width lane batches shared by the dense stages.
//!
//! A row span `[start, end)` is covered by consecutive batches of [`LANES`]
//! pixels. When the span is not a multiple of the lane width, one extra batch
//! is anchored at `end - LANES`, overlapping the previous one. Every lane of a
//! batch is computed independently, so the overlap is recomputed with
//! bit-identical values. Spans shorter than one batch fall back to scalar
//! pixels evaluated with the same arithmetic.

use core::ops::{Add, Mul, Sub};

/// Number of pixels processed together in one batch.
pub const LANES: usize = 4;

/// One unit of work inside a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Batch {
    /// `LANES` pixels starting at this column.
    Lanes(usize),
    /// A single pixel, used when the span is narrower than one batch.
    Scalar(usize),
}

/// Iterator over the batches covering `[start, end)`.
#[derive(Clone, Debug)]
pub struct RowBatches {
    next: usize,
    end: usize,
    scalar: bool,
    tail_done: bool,
}

/// Split `[start, end)` into lane batches with an end-aligned tail.
pub fn row_batches(start: usize, end: usize) -> RowBatches {
    let end = end.max(start);
    RowBatches {
        next: start,
        end,
        scalar: end - start < LANES,
        tail_done: false,
    }
}

impl Iterator for RowBatches {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.scalar {
            if self.next >= self.end {
                return None;
            }
            let x = self.next;
            self.next += 1;
            return Some(Batch::Scalar(x));
        }

        if self.next + LANES <= self.end {
            let x = self.next;
            self.next += LANES;
            return Some(Batch::Lanes(x));
        }
        if self.next < self.end && !self.tail_done {
            self.tail_done = true;
            self.next = self.end;
            return Some(Batch::Lanes(self.end - LANES));
        }
        None
    }
}

#[cfg(not(feature = "simd"))]
type Repr = [f32; LANES];
#[cfg(feature = "simd")]
type Repr = std::simd::Simd<f32, LANES>;

/// `LANES` packed `f32` values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lane(Repr);

#[cfg(not(feature = "simd"))]
impl Lane {
    #[inline(always)]
    pub fn splat(v: f32) -> Self {
        Lane([v; LANES])
    }

    #[inline(always)]
    pub fn from_fn(f: impl FnMut(usize) -> f32) -> Self {
        Lane(core::array::from_fn(f))
    }

    #[inline(always)]
    pub fn to_array(self) -> [f32; LANES] {
        self.0
    }

    #[inline(always)]
    fn zip(self, rhs: Self, op: impl Fn(f32, f32) -> f32) -> Self {
        Lane(core::array::from_fn(|k| op(self.0[k], rhs.0[k])))
    }
}

#[cfg(feature = "simd")]
impl Lane {
    #[inline(always)]
    pub fn splat(v: f32) -> Self {
        Lane(Repr::splat(v))
    }

    #[inline(always)]
    pub fn from_fn(f: impl FnMut(usize) -> f32) -> Self {
        Lane(Repr::from_array(core::array::from_fn(f)))
    }

    #[inline(always)]
    pub fn to_array(self) -> [f32; LANES] {
        self.0.to_array()
    }
}

impl Lane {
    /// Load `LANES` consecutive values from the front of `src`.
    #[inline(always)]
    pub fn load(src: &[f32]) -> Self {
        Self::from_fn(|k| src[k])
    }

    /// Store into the front of `dst`.
    #[inline(always)]
    pub fn store(self, dst: &mut [f32]) {
        dst[..LANES].copy_from_slice(&self.to_array());
    }
}

#[cfg(not(feature = "simd"))]
impl Add for Lane {
    type Output = Lane;
    #[inline(always)]
    fn add(self, rhs: Lane) -> Lane {
        self.zip(rhs, |a, b| a + b)
    }
}

#[cfg(not(feature = "simd"))]
impl Sub for Lane {
    type Output = Lane;
    #[inline(always)]
    fn sub(self, rhs: Lane) -> Lane {
        self.zip(rhs, |a, b| a - b)
    }
}

#[cfg(not(feature = "simd"))]
impl Mul for Lane {
    type Output = Lane;
    #[inline(always)]
    fn mul(self, rhs: Lane) -> Lane {
        self.zip(rhs, |a, b| a * b)
    }
}

#[cfg(feature = "simd")]
impl Add for Lane {
    type Output = Lane;
    #[inline(always)]
    fn add(self, rhs: Lane) -> Lane {
        Lane(self.0 + rhs.0)
    }
}

#[cfg(feature = "simd")]
impl Sub for Lane {
    type Output = Lane;
    #[inline(always)]
    fn sub(self, rhs: Lane) -> Lane {
        Lane(self.0 - rhs.0)
    }
}

#[cfg(feature = "simd")]
impl Mul for Lane {
    type Output = Lane;
    #[inline(always)]
    fn mul(self, rhs: Lane) -> Lane {
        Lane(self.0 * rhs.0)
    }
}
