//! Borrowed grayscale image views with an 8‑bit or 16‑bit sample depth.

/// Sample depth of an [`ImageView`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelDepth {
    U8,
    U16,
}

impl PixelDepth {
    /// Resolve a depth tag from a bit count.
    ///
    /// # Panics
    ///
    /// Panics for anything other than 8 or 16 bits. The depth is established
    /// by the caller, so an unsupported value is a programming error.
    pub fn from_bits(bits: u32) -> Self {
        match bits {
            8 => PixelDepth::U8,
            16 => PixelDepth::U16,
            other => panic!("unsupported pixel depth: {other} bits (expected 8 or 16)"),
        }
    }

    #[inline]
    pub fn bits(self) -> u32 {
        match self {
            PixelDepth::U8 => 8,
            PixelDepth::U16 => 16,
        }
    }
}

/// Integer sample types that widen losslessly to `f32`.
pub trait Sample: Copy + Send + Sync {
    fn to_f32(self) -> f32;
}

impl Sample for u8 {
    #[inline(always)]
    fn to_f32(self) -> f32 {
        self as f32
    }
}

impl Sample for u16 {
    #[inline(always)]
    fn to_f32(self) -> f32 {
        self as f32
    }
}

/// Row-major pixel storage tagged with its depth.
#[derive(Clone, Copy, Debug)]
pub enum PixelData<'a> {
    U8(&'a [u8]),
    U16(&'a [u16]),
}

/// Read-only view over a tightly packed grayscale image.
#[derive(Clone, Copy, Debug)]
pub struct ImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: PixelData<'a>,
}

impl<'a> ImageView<'a> {
    /// Wrap an 8-bit buffer. Returns `None` if `data.len() != width * height`
    /// or the product overflows.
    pub fn from_u8_slice(width: usize, height: usize, data: &'a [u8]) -> Option<Self> {
        (width.checked_mul(height) == Some(data.len())).then_some(Self {
            width,
            height,
            data: PixelData::U8(data),
        })
    }

    /// Wrap a 16-bit buffer. Returns `None` if `data.len() != width * height`
    /// or the product overflows.
    pub fn from_u16_slice(width: usize, height: usize, data: &'a [u16]) -> Option<Self> {
        (width.checked_mul(height) == Some(data.len())).then_some(Self {
            width,
            height,
            data: PixelData::U16(data),
        })
    }

    /// Wrap an untyped buffer holding `bits`-deep samples in native byte
    /// order. Returns `None` on a length mismatch or, for 16-bit data, if
    /// `bytes` is not aligned to `u16` or has an odd length.
    ///
    /// # Panics
    ///
    /// Panics if `bits` is not 8 or 16 (see [`PixelDepth::from_bits`]).
    pub fn from_raw_bytes(width: usize, height: usize, bits: u32, bytes: &'a [u8]) -> Option<Self> {
        match PixelDepth::from_bits(bits) {
            PixelDepth::U8 => Self::from_u8_slice(width, height, bytes),
            PixelDepth::U16 => {
                let samples = bytemuck::try_cast_slice::<u8, u16>(bytes).ok()?;
                Self::from_u16_slice(width, height, samples)
            }
        }
    }

    #[inline]
    pub fn depth(&self) -> PixelDepth {
        match self.data {
            PixelData::U8(_) => PixelDepth::U8,
            PixelData::U16(_) => PixelDepth::U16,
        }
    }

    /// Sample at `(x, y)` widened to `f32`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        let idx = y * self.width + x;
        match self.data {
            PixelData::U8(d) => d[idx].to_f32(),
            PixelData::U16(d) => d[idx].to_f32(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_reject_length_mismatch() {
        assert!(ImageView::from_u8_slice(4, 4, &[0u8; 15]).is_none());
        assert!(ImageView::from_u16_slice(3, 2, &[0u16; 6]).is_some());
    }

    #[test]
    fn raw_bytes_dispatch_on_depth() {
        let bytes = [1u8, 2, 3, 4, 5, 6];
        let view = ImageView::from_raw_bytes(3, 2, 8, &bytes).expect("8-bit view");
        assert_eq!(view.depth(), PixelDepth::U8);
        assert_eq!(view.get(2, 1), 6.0);

        let wide = [1000u16, 2000, 65535, 7];
        let raw: &[u8] = bytemuck::cast_slice(&wide);
        let view = ImageView::from_raw_bytes(2, 2, 16, raw).expect("16-bit view");
        assert_eq!(view.depth(), PixelDepth::U16);
        assert_eq!(view.get(0, 1), 65535.0);
    }

    #[test]
    fn misaligned_or_odd_sixteen_bit_bytes_are_rejected() {
        let wide = [0u16; 5];
        let raw: &[u8] = bytemuck::cast_slice(&wide);
        // Shifting by one byte breaks u16 alignment.
        assert!(ImageView::from_raw_bytes(2, 2, 16, &raw[1..9]).is_none());
        assert!(ImageView::from_raw_bytes(2, 2, 16, &raw[..7]).is_none());
        assert!(ImageView::from_raw_bytes(2, 2, 16, &raw[..8]).is_some());
    }

    #[test]
    fn oversized_dimensions_do_not_wrap() {
        // (usize::MAX / 2 + 1) * 2 wraps to 0 in release builds.
        let half = usize::MAX / 2 + 1;
        assert!(ImageView::from_u8_slice(half, 2, &[]).is_none());
        assert!(ImageView::from_u16_slice(2, half, &[]).is_none());
        assert!(ImageView::from_u8_slice(0, usize::MAX, &[]).is_some());
    }

    #[test]
    #[should_panic(expected = "unsupported pixel depth")]
    fn unsupported_depth_is_fatal() {
        let bytes = [0u8; 12];
        let _ = ImageView::from_raw_bytes(2, 2, 24, &bytes);
    }
}
