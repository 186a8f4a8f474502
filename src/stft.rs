//! Short-Time Fourier Transform magnitude, power and log-power spectrograms.
//!
//! A [`SpectrogramEngine`] is built once per signal length and frame
//! configuration. It owns the Hann window, the frame scratch, the
//! [`TransformEngine`] and the output matrix, and every `forward_*` call
//! overwrites that matrix in place. The returned [`SpectrogramView`] borrows
//! the engine, so it cannot outlive the next call; use
//! [`SpectrogramView::to_owned`] to keep a result.
//!
//! # Examples
//! ```
//! use stftpack::stft::{SpectrogramEngine, StftConfig};
//!
//! let signal: Vec<f32> = (0..4096).map(|i| (i as f32 * 0.1).sin()).collect();
//! let config = StftConfig::new(signal.len(), 128, 32, 1e-10);
//! let mut engine = SpectrogramEngine::new(config).unwrap();
//! let power = engine.forward_spectrogram(&signal).unwrap();
//! assert_eq!(power.rows(), 4096 / 96 - 2);
//! assert_eq!(power.cols(), 64);
//! ```

use std::fmt;
use std::ops::Index;
use std::slice::ChunksExact;

use log::{debug, trace};

use crate::buffer::try_filled;
use crate::frame::{FrameLayout, FramingPolicy};
use crate::rfft::{FftError, TransformEngine};
use crate::window::hann_inplace;

/// Frame length used by [`StftConfig::for_length`].
pub const DEFAULT_FRAME_SIZE: usize = 128;
/// Overlap used by [`StftConfig::for_length`].
pub const DEFAULT_OVERLAP: usize = 32;
/// Log floor used by [`StftConfig::for_length`].
pub const DEFAULT_EPSILON: f32 = 1e-10;

/// Errors reported while building or running a [`SpectrogramEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StftError {
    /// `overlap` is zero, larger than `frame_size`, or does not divide it.
    InvalidOverlap { frame_size: usize, overlap: usize },
    /// `overlap == frame_size`, leaving no stride between frames.
    ZeroHop { frame_size: usize },
    /// The log floor is negative, infinite or NaN.
    InvalidEpsilon(f32),
    /// The signal is too short to produce a frame count under the chosen policy.
    SignalTooShort { total_length: usize, hop: usize },
    /// The signal does not have the length the engine was built for.
    MismatchedLengths { expected: usize, actual: usize },
    /// An engine buffer could not be allocated.
    AllocationFailed,
    /// The per-frame transform failed.
    Transform(FftError),
}

impl StftError {
    /// `true` for errors caused by an invalid [`StftConfig`].
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            StftError::InvalidOverlap { .. }
                | StftError::ZeroHop { .. }
                | StftError::InvalidEpsilon(_)
                | StftError::SignalTooShort { .. }
        )
    }
}

impl fmt::Display for StftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StftError::InvalidOverlap {
                frame_size,
                overlap,
            } => write!(
                f,
                "frame size {} and overlap {} violate frame_size >= overlap && frame_size % overlap == 0",
                frame_size, overlap
            ),
            StftError::ZeroHop { frame_size } => {
                write!(f, "overlap equals frame size {}, hop would be zero", frame_size)
            }
            StftError::InvalidEpsilon(eps) => {
                write!(f, "epsilon must be finite and non-negative, got {}", eps)
            }
            StftError::SignalTooShort { total_length, hop } => write!(
                f,
                "signal of {} samples is too short for hop {}",
                total_length, hop
            ),
            StftError::MismatchedLengths { expected, actual } => {
                write!(f, "expected a signal of {} samples, got {}", expected, actual)
            }
            StftError::AllocationFailed => write!(f, "failed to allocate spectrogram buffers"),
            StftError::Transform(err) => write!(f, "frame transform failed: {}", err),
        }
    }
}

impl std::error::Error for StftError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StftError::Transform(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FftError> for StftError {
    fn from(err: FftError) -> Self {
        match err {
            FftError::AllocationFailed => StftError::AllocationFailed,
            other => StftError::Transform(other),
        }
    }
}

/// Signal length and frame configuration of a [`SpectrogramEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StftConfig {
    /// Exact number of samples every signal passed to the engine must have.
    pub total_length: usize,
    /// Samples per frame; also the transform length.
    pub frame_size: usize,
    /// Samples shared by consecutive frames.
    pub overlap: usize,
    /// Floor added to the power before taking the logarithm.
    pub epsilon: f32,
    pub framing: FramingPolicy,
}

impl StftConfig {
    pub fn new(total_length: usize, frame_size: usize, overlap: usize, epsilon: f32) -> Self {
        Self {
            total_length,
            frame_size,
            overlap,
            epsilon,
            framing: FramingPolicy::default(),
        }
    }

    /// Configuration with [`DEFAULT_FRAME_SIZE`], [`DEFAULT_OVERLAP`] and
    /// [`DEFAULT_EPSILON`].
    pub fn for_length(total_length: usize) -> Self {
        Self::new(
            total_length,
            DEFAULT_FRAME_SIZE,
            DEFAULT_OVERLAP,
            DEFAULT_EPSILON,
        )
    }

    pub fn with_framing(mut self, framing: FramingPolicy) -> Self {
        self.framing = framing;
        self
    }

    /// Check the configuration and derive its [`FrameLayout`].
    pub fn validate(&self) -> Result<FrameLayout, StftError> {
        let layout = FrameLayout::new(
            self.total_length,
            self.frame_size,
            self.overlap,
            self.framing,
        )?;
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(StftError::InvalidEpsilon(self.epsilon));
        }
        Ok(layout)
    }
}

/// Reusable STFT pipeline: frame, window, transform, magnitude.
pub struct SpectrogramEngine {
    config: StftConfig,
    layout: FrameLayout,
    window: Vec<f32>,
    frame: Vec<f32>,
    /// Copy of the current frame's half-complex spectrum.
    frame_spectrum: Vec<f32>,
    fft: TransformEngine,
    /// Row-major `frame_count x bin_count` matrix.
    output: Vec<f32>,
}

impl fmt::Debug for SpectrogramEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrogramEngine")
            .field("config", &self.config)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl SpectrogramEngine {
    /// Validate `config` and allocate every buffer the pipeline needs.
    ///
    /// No engine is returned unless all allocations succeed.
    pub fn new(config: StftConfig) -> Result<Self, StftError> {
        let layout = config.validate()?;
        let frame_size = layout.frame_size();
        let cells = layout
            .frame_count()
            .checked_mul(layout.bin_count())
            .ok_or(StftError::AllocationFailed)?;

        let mut window = try_filled(frame_size, 0.0f32).map_err(|_| StftError::AllocationFailed)?;
        hann_inplace(&mut window);
        let frame = try_filled(frame_size, 0.0f32).map_err(|_| StftError::AllocationFailed)?;
        let frame_spectrum =
            try_filled(frame_size, 0.0f32).map_err(|_| StftError::AllocationFailed)?;
        let fft = TransformEngine::new(frame_size)?;
        let output = try_filled(cells, 0.0f32).map_err(|_| StftError::AllocationFailed)?;

        debug!(
            "spectrogram engine: {} rows x {} cols, hop {}, pad {}, {:?} framing",
            layout.frame_count(),
            layout.bin_count(),
            layout.hop(),
            layout.pad_length(),
            layout.policy()
        );

        Ok(Self {
            config,
            layout,
            window,
            frame,
            frame_spectrum,
            fft,
            output,
        })
    }

    pub fn config(&self) -> &StftConfig {
        &self.config
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// The cached analysis window.
    pub fn window(&self) -> &[f32] {
        &self.window
    }

    /// Rows of every returned matrix (frames).
    pub fn row_count(&self) -> usize {
        self.layout.frame_count()
    }

    /// Columns of every returned matrix (bins).
    pub fn col_count(&self) -> usize {
        self.layout.bin_count()
    }

    /// Magnitude STFT of `signal`.
    ///
    /// Cell `(m, j)` is `sqrt(s[2j]^2 + s[2j+1]^2)` where `s` is the
    /// half-complex spectrum of frame `m`. Samples past the end of `signal`
    /// (the padding) are read as zero.
    pub fn forward_stft(&mut self, signal: &[f32]) -> Result<SpectrogramView<'_>, StftError> {
        self.compute_magnitudes(signal)?;
        Ok(self.view())
    }

    /// Power spectrogram: the magnitude STFT squared in place.
    pub fn forward_spectrogram(
        &mut self,
        signal: &[f32],
    ) -> Result<SpectrogramView<'_>, StftError> {
        self.compute_magnitudes(signal)?;
        for cell in self.output.iter_mut() {
            *cell = *cell * *cell;
        }
        Ok(self.view())
    }

    /// Log-power spectrogram: `ln(epsilon + magnitude^2)` in place.
    pub fn forward_log_spectrogram(
        &mut self,
        signal: &[f32],
    ) -> Result<SpectrogramView<'_>, StftError> {
        self.compute_magnitudes(signal)?;
        let eps = self.config.epsilon;
        for cell in self.output.iter_mut() {
            *cell = (eps + *cell * *cell).ln();
        }
        Ok(self.view())
    }

    fn compute_magnitudes(&mut self, signal: &[f32]) -> Result<(), StftError> {
        let n = self.layout.total_length();
        if signal.len() != n {
            return Err(StftError::MismatchedLengths {
                expected: n,
                actual: signal.len(),
            });
        }
        trace!(
            "stft over {} samples ({} virtual padding)",
            n,
            self.layout.pad_length()
        );
        let frame_size = self.layout.frame_size();
        let cols = self.layout.bin_count();
        for (row, start) in self
            .output
            .chunks_exact_mut(cols)
            .zip(self.layout.offsets())
        {
            let src = signal.get(start..).unwrap_or(&[]);
            let avail = src.len().min(frame_size);
            for ((x, &s), &w) in self.frame[..avail]
                .iter_mut()
                .zip(&src[..avail])
                .zip(&self.window[..avail])
            {
                *x = s * w;
            }
            self.frame[avail..].fill(0.0);

            let spectrum = self.fft.forward_real_transform(&self.frame)?;
            self.frame_spectrum.copy_from_slice(spectrum);

            for (j, cell) in row.iter_mut().enumerate() {
                let re = self.frame_spectrum[2 * j];
                let im = self.frame_spectrum[2 * j + 1];
                *cell = (re * re + im * im).sqrt();
            }
        }
        Ok(())
    }

    fn view(&self) -> SpectrogramView<'_> {
        SpectrogramView {
            data: &self.output,
            rows: self.layout.frame_count(),
            cols: self.layout.bin_count(),
        }
    }
}

/// Borrowed `rows x cols` view of an engine's output matrix.
///
/// Row `m` is frame `m`, column `j` is bin `j`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrogramView<'a> {
    data: &'a [f32],
    rows: usize,
    cols: usize,
}

impl<'a> SpectrogramView<'a> {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row-major cells.
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    pub fn row(&self, m: usize) -> Option<&'a [f32]> {
        if m >= self.rows {
            return None;
        }
        Some(&self.data[m * self.cols..(m + 1) * self.cols])
    }

    pub fn get(&self, m: usize, j: usize) -> Option<f32> {
        if j >= self.cols {
            return None;
        }
        self.row(m).map(|row| row[j])
    }

    pub fn iter_rows(&self) -> ChunksExact<'a, f32> {
        self.data.chunks_exact(self.cols.max(1))
    }

    /// Copy into nested rows.
    pub fn to_vec(&self) -> Vec<Vec<f32>> {
        self.iter_rows().map(<[f32]>::to_vec).collect()
    }

    /// Copy into an owned [`Spectrogram`] that survives further engine calls.
    pub fn to_owned(&self) -> Spectrogram {
        Spectrogram {
            data: self.data.to_vec(),
            rows: self.rows,
            cols: self.cols,
        }
    }
}

impl Index<(usize, usize)> for SpectrogramView<'_> {
    type Output = f32;

    fn index(&self, (m, j): (usize, usize)) -> &f32 {
        assert!(m < self.rows && j < self.cols, "cell ({}, {}) out of bounds", m, j);
        &self.data[m * self.cols + j]
    }
}

/// Owned copy of a spectrogram matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl Spectrogram {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn row(&self, m: usize) -> Option<&[f32]> {
        if m >= self.rows {
            return None;
        }
        Some(&self.data[m * self.cols..(m + 1) * self.cols])
    }

    pub fn view(&self) -> SpectrogramView<'_> {
        SpectrogramView {
            data: &self.data,
            rows: self.rows,
            cols: self.cols,
        }
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

impl Index<(usize, usize)> for Spectrogram {
    type Output = f32;

    fn index(&self, (m, j): (usize, usize)) -> &f32 {
        assert!(m < self.rows && j < self.cols, "cell ({}, {}) out of bounds", m, j);
        &self.data[m * self.cols + j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * core::f32::consts::PI * 5.0 * i as f32 / 64.0).sin())
            .collect()
    }

    #[test]
    fn test_shape_matches_layout() {
        let mut engine = SpectrogramEngine::new(StftConfig::new(1000, 128, 32, 1e-10)).unwrap();
        assert_eq!(engine.row_count(), 8);
        assert_eq!(engine.col_count(), 64);
        let view = engine.forward_stft(&vec![0.0; 1000]).unwrap();
        assert_eq!(view.rows(), 8);
        assert_eq!(view.cols(), 64);
        assert_eq!(view.as_slice().len(), 8 * 64);
    }

    #[test]
    fn test_power_and_log_power() {
        let signal = tone(2048);
        let config = StftConfig::new(signal.len(), 64, 32, 1e-6);
        let mut engine = SpectrogramEngine::new(config).unwrap();
        let mag = engine.forward_stft(&signal).unwrap().to_owned();
        let power = engine.forward_spectrogram(&signal).unwrap().to_owned();
        let log_power = engine.forward_log_spectrogram(&signal).unwrap().to_owned();
        for ((&m, &p), &l) in mag
            .as_slice()
            .iter()
            .zip(power.as_slice())
            .zip(log_power.as_slice())
        {
            assert!((p - m * m).abs() <= 1e-4 * p.max(1.0));
            assert!((l - (1e-6 + m * m).ln()).abs() < 1e-4);
        }
    }

    #[test]
    fn test_wrong_signal_length() {
        let mut engine = SpectrogramEngine::new(StftConfig::new(1000, 128, 32, 1e-10)).unwrap();
        assert_eq!(
            engine.forward_stft(&[0.0; 999]).unwrap_err(),
            StftError::MismatchedLengths {
                expected: 1000,
                actual: 999
            }
        );
    }

    #[test]
    fn test_invalid_epsilon() {
        for eps in [-1.0, f32::NAN, f32::INFINITY] {
            let err = SpectrogramEngine::new(StftConfig::new(1000, 128, 32, eps)).unwrap_err();
            assert!(matches!(err, StftError::InvalidEpsilon(_)));
            assert!(err.is_config_error());
        }
    }

    #[test]
    fn test_fft_error_conversion() {
        assert_eq!(
            StftError::from(FftError::AllocationFailed),
            StftError::AllocationFailed
        );
        assert_eq!(
            StftError::from(FftError::EmptyInput),
            StftError::Transform(FftError::EmptyInput)
        );
    }

    #[test]
    fn test_view_accessors() {
        let signal = tone(512);
        let mut engine = SpectrogramEngine::new(StftConfig::new(512, 16, 8, 0.0)).unwrap();
        let view = engine.forward_stft(&signal).unwrap();
        assert_eq!(view.get(1, 2), Some(view[(1, 2)]));
        assert_eq!(view.row(1).unwrap()[2], view[(1, 2)]);
        assert_eq!(view.get(view.rows(), 0), None);
        assert_eq!(view.get(0, view.cols()), None);
        assert_eq!(view.iter_rows().len(), view.rows());
        assert_eq!(view.to_vec().len(), view.rows());
    }
}
