//! Smoothing windows applied to each frame before the forward transform.
//!
//! Only the periodic Hann window is provided. It is the window the
//! spectrogram engine caches at construction.

use core::f64::consts::PI;

/// Generate a periodic Hann window of length `len`.
///
/// `w[k] = 0.5 * (1 - cos(2πk / len))` for `k = 0..len`. The first sample is
/// zero and the peak `w[len / 2] == 1` sits at the centre, so the window is
/// symmetric around `len / 2` (`w[k] == w[len - k]`).
///
/// # Examples
/// ```
/// use stftpack::window::hann;
/// let w = hann(8);
/// assert_eq!(w.len(), 8);
/// assert!(w[0].abs() < 1e-6);
/// assert!((w[4] - 1.0).abs() < 1e-6);
/// ```
pub fn hann(len: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; len];
    hann_inplace(&mut out);
    out
}

/// Fill `out` with a periodic Hann window of length `out.len()` without
/// allocating.
pub fn hann_inplace(out: &mut [f32]) {
    let n = out.len() as f64;
    for (k, w) in out.iter_mut().enumerate() {
        // Phase is evaluated in f64 so long windows stay symmetric after the
        // cast back to f32.
        *w = (0.5 * (1.0 - (2.0 * PI * k as f64 / n).cos())) as f32;
    }
}
