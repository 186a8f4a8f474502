//! # stftpack - STFT and spectrograms of real signals
//!
//! Frames a real signal into overlapping Hann-windowed segments, forward
//! transforms each segment with a real-input FFT and reduces the half-complex
//! spectra to magnitude, power or log-power spectrograms.
//!
//! ## Features
//!
//! - **Reusable engines**: every buffer is allocated once at construction,
//!   the hot path performs no heap allocation
//! - **Borrowed results**: `forward_*` return a view tied to the engine borrow,
//!   so a stale matrix cannot be read after the next call
//! - **Checked boundaries**: frame configuration, signal length and allocation
//!   failures are reported as typed errors
//! - **C adapter**: opaque-handle `extern "C"` functions behind the `capi` feature
//!
//! ## Cargo Features
//!
//! - `capi`: export the flat C interface (`create_stftpack_object`,
//!   `forward_log_spectrogram`, ...)
//!
//! ## Example
//!
//! ```
//! use stftpack::{SpectrogramEngine, StftConfig};
//!
//! let signal = vec![0.0f32; 16_000];
//! let mut engine = SpectrogramEngine::new(StftConfig::for_length(signal.len())).unwrap();
//! let log_power = engine.forward_log_spectrogram(&signal).unwrap();
//! assert_eq!(log_power.cols(), 64);
//! ```
//!
//! ## License
//!
//! Licensed under either of
//! - Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or https://www.apache.org/licenses/LICENSE-2.0)
//! - MIT license ([LICENSE-MIT](LICENSE-MIT) or https://opensource.org/licenses/MIT)
//!
//! at your option.

mod buffer;

/// Window functions
///
/// Periodic Hann window applied to every frame.
pub mod window;

/// Real-input FFT
///
/// Fixed-length forward transform producing the packed half-complex layout.
pub mod rfft;

/// Frame scheduling
///
/// Padding, frame count and bin count derived from the signal length.
pub mod frame;

/// Short-Time Fourier Transform (STFT)
///
/// Magnitude, power and log-power spectrogram engine.
pub mod stft;

/// C interface
///
/// Opaque-handle `extern "C"` adapter with null-on-failure returns.
#[cfg(feature = "capi")]
pub mod ffi;

pub use frame::{FrameLayout, FramingPolicy};
pub use rfft::{FftError, TransformEngine};
pub use stft::{Spectrogram, SpectrogramEngine, SpectrogramView, StftConfig, StftError};
