//! Frame scheduling: padding, frame count and bin count for a signal.
//!
//! A [`FrameLayout`] is derived once from `(total_length, frame_size,
//! overlap)` and stays fixed for the lifetime of a
//! [`SpectrogramEngine`](crate::stft::SpectrogramEngine).

use crate::stft::StftError;

/// How the number of frames and the zero padding are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramingPolicy {
    /// `floor(N / hop) - 2` frames over a signal padded to a multiple of
    /// `frame_size`. Reproduces the row count of the classic `libstft`
    /// interface, which drops the trailing frames.
    #[default]
    Compat,
    /// Just enough frames that every sample lands in at least one frame; the
    /// signal is padded so the last frame ends exactly on the padded length.
    Covering,
}

/// Derived framing quantities for one signal length and frame configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    total_length: usize,
    frame_size: usize,
    overlap: usize,
    hop: usize,
    frame_count: usize,
    bin_count: usize,
    pad_length: usize,
    policy: FramingPolicy,
}

impl FrameLayout {
    /// Validate the frame configuration and derive the layout.
    ///
    /// Fails with [`StftError::InvalidOverlap`] unless `overlap > 0`,
    /// `frame_size >= overlap` and `frame_size % overlap == 0`, with
    /// [`StftError::ZeroHop`] when `overlap == frame_size`, and with
    /// [`StftError::SignalTooShort`] when the policy yields no valid frame count.
    pub fn new(
        total_length: usize,
        frame_size: usize,
        overlap: usize,
        policy: FramingPolicy,
    ) -> Result<Self, StftError> {
        if overlap == 0 || frame_size < overlap || frame_size % overlap != 0 {
            return Err(StftError::InvalidOverlap {
                frame_size,
                overlap,
            });
        }
        let hop = frame_size - overlap;
        if hop == 0 {
            return Err(StftError::ZeroHop { frame_size });
        }
        let too_short = StftError::SignalTooShort { total_length, hop };
        let (frame_count, pad_length) = match policy {
            FramingPolicy::Compat => {
                let frame_count = (total_length / hop).checked_sub(2).ok_or(too_short)?;
                let rem = total_length % frame_size;
                let pad_length = if rem != 0 { frame_size - rem } else { 0 };
                (frame_count, pad_length)
            }
            FramingPolicy::Covering => {
                if total_length == 0 {
                    return Err(too_short);
                }
                let frame_count = if total_length <= frame_size {
                    1
                } else {
                    (total_length - frame_size).div_ceil(hop) + 1
                };
                let padded = (frame_count - 1) * hop + frame_size;
                (frame_count, padded - total_length)
            }
        };
        let layout = Self {
            total_length,
            frame_size,
            overlap,
            hop,
            frame_count,
            bin_count: col_count(frame_size),
            pad_length,
            policy,
        };
        debug_assert!(layout.frame_count == 0 || layout.last_frame_end() <= layout.padded_length());
        Ok(layout)
    }

    /// Number of samples in the unpadded signal.
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Stride between consecutive frame starts, `frame_size - overlap`.
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Number of frames, i.e. rows of the output matrix.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Number of spectral bins per frame, i.e. columns of the output matrix.
    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    /// Zero samples appended after the signal.
    pub fn pad_length(&self) -> usize {
        self.pad_length
    }

    pub fn padded_length(&self) -> usize {
        self.total_length + self.pad_length
    }

    pub fn policy(&self) -> FramingPolicy {
        self.policy
    }

    /// Start offset of every frame, in order.
    pub fn offsets(&self) -> impl ExactSizeIterator<Item = usize> {
        let hop = self.hop;
        (0..self.frame_count).map(move |m| m * hop)
    }

    fn last_frame_end(&self) -> usize {
        (self.frame_count - 1) * self.hop + self.frame_size
    }
}

/// Row count of the classic `libstft` interface, `floor(n / hop) - 2`.
///
/// Returns `None` for an invalid frame configuration or when the signal is
/// too short to yield a non-negative count.
pub fn row_count(total_length: usize, frame_size: usize, overlap: usize) -> Option<usize> {
    FrameLayout::new(total_length, frame_size, overlap, FramingPolicy::Compat)
        .ok()
        .map(|layout| layout.frame_count())
}

/// Number of spectral bins kept per frame, `floor(frame_size / 2)`.
pub fn col_count(frame_size: usize) -> usize {
    frame_size / 2
}
