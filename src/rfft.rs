//! Real-input forward FFT producing the packed half-complex layout.
//!
//! [`TransformEngine`] wraps a [`realfft`] plan of a fixed length `n` and owns
//! every buffer the transform touches, so a call performs no allocation. The
//! `n / 2 + 1` complex bins produced by the plan are repacked into `n` reals
//! in the classic FFTPACK half-complex order:
//!
//! ```text
//! [ Re X0, Re X1, Im X1, Re X2, Im X2, ..., Re X(n/2) ]   (n even)
//! [ Re X0, Re X1, Im X1, ..., Re X(n-1)/2, Im X(n-1)/2 ]  (n odd)
//! ```
//!
//! The transform is unnormalized and uses the `e^{-2πi jk/n}` sign convention.

use std::fmt;
use std::sync::Arc;

use realfft::num_complex::Complex32;
use realfft::{RealFftPlanner, RealToComplex};

use crate::buffer::try_filled;

/// Errors reported by [`TransformEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftError {
    /// A zero-length transform was requested.
    EmptyInput,
    /// The frame handed to the engine does not match its configured length.
    MismatchedLengths { expected: usize, actual: usize },
    /// One of the engine's buffers could not be allocated.
    AllocationFailed,
}

impl fmt::Display for FftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FftError::EmptyInput => write!(f, "transform length must be non-zero"),
            FftError::MismatchedLengths { expected, actual } => {
                write!(f, "expected a frame of {} samples, got {}", expected, actual)
            }
            FftError::AllocationFailed => write!(f, "failed to allocate transform buffers"),
        }
    }
}

impl std::error::Error for FftError {}

/// Fixed-length forward real FFT with engine-owned buffers.
///
/// The slice returned by [`TransformEngine::forward_real_transform`] borrows
/// the engine's output buffer; it is overwritten by the next call, so callers
/// that need the spectrum afterwards must copy it.
pub struct TransformEngine {
    len: usize,
    plan: Arc<dyn RealToComplex<f32>>,
    /// Working copy of the frame; the plan destroys its input.
    input: Vec<f32>,
    /// `len / 2 + 1` complex bins as produced by the plan.
    spectrum: Vec<Complex32>,
    scratch: Vec<Complex32>,
    /// Half-complex packed output handed back to the caller.
    output: Vec<f32>,
}

impl fmt::Debug for TransformEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformEngine")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl TransformEngine {
    /// Create an engine for transforms of exactly `len` samples.
    pub fn new(len: usize) -> Result<Self, FftError> {
        let mut planner = RealFftPlanner::<f32>::new();
        Self::with_planner(&mut planner, len)
    }

    /// Create an engine whose plan comes from a shared `planner`, so several
    /// engines of the same length reuse one set of twiddle tables.
    pub fn with_planner(planner: &mut RealFftPlanner<f32>, len: usize) -> Result<Self, FftError> {
        if len == 0 {
            return Err(FftError::EmptyInput);
        }
        let plan = planner.plan_fft_forward(len);
        let zero = Complex32::new(0.0, 0.0);
        let input = try_filled(len, 0.0f32).map_err(|_| FftError::AllocationFailed)?;
        let spectrum = try_filled(len / 2 + 1, zero).map_err(|_| FftError::AllocationFailed)?;
        let scratch =
            try_filled(plan.get_scratch_len(), zero).map_err(|_| FftError::AllocationFailed)?;
        let output = try_filled(len, 0.0f32).map_err(|_| FftError::AllocationFailed)?;
        Ok(Self {
            len,
            plan,
            input,
            spectrum,
            scratch,
            output,
        })
    }

    /// Transform length `n` fixed at construction.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`; zero-length engines cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Forward-transform `frame` and return its half-complex spectrum.
    ///
    /// `frame` must hold exactly [`len`](Self::len) samples. The returned
    /// slice aliases the engine's output buffer and stays valid until the next
    /// call.
    ///
    /// # Examples
    /// ```
    /// use stftpack::rfft::TransformEngine;
    /// let mut fft = TransformEngine::new(4).unwrap();
    /// let spectrum = fft.forward_real_transform(&[1.0, 1.0, 1.0, 1.0]).unwrap();
    /// assert!((spectrum[0] - 4.0).abs() < 1e-6);
    /// assert!(spectrum[1..].iter().all(|x| x.abs() < 1e-6));
    /// ```
    pub fn forward_real_transform(&mut self, frame: &[f32]) -> Result<&[f32], FftError> {
        if frame.len() != self.len {
            return Err(FftError::MismatchedLengths {
                expected: self.len,
                actual: frame.len(),
            });
        }
        self.input.copy_from_slice(frame);
        self.plan
            .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)
            .map_err(|_| FftError::MismatchedLengths {
                expected: self.len,
                actual: frame.len(),
            })?;
        pack_half_complex(&self.spectrum, &mut self.output);
        Ok(&self.output)
    }
}

/// Repack `n / 2 + 1` complex bins into `out.len() == n` half-complex reals.
fn pack_half_complex(spectrum: &[Complex32], out: &mut [f32]) {
    let n = out.len();
    out[0] = spectrum[0].re;
    for k in 1..=(n - 1) / 2 {
        out[2 * k - 1] = spectrum[k].re;
        out[2 * k] = spectrum[k].im;
    }
    if n % 2 == 0 && n > 1 {
        out[n - 1] = spectrum[n / 2].re;
    }
}
