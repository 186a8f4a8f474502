//! Flat `extern "C"` interface over opaque engine handles.
//!
//! Mirrors the classic `libstft` entry points so foreign callers (ctypes,
//! plain C) can drive the engines. Every failure, including a panic inside
//! the library, comes back as a null pointer or `-1`. Returned buffers are
//! owned by the handle and stay valid until the next call on that handle or
//! until it is deleted.

use std::os::raw::{c_float, c_int, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use std::slice;

use log::warn;

use crate::buffer::try_filled;
use crate::frame::{col_count, row_count};
use crate::rfft::TransformEngine;
use crate::stft::{SpectrogramEngine, SpectrogramView, StftConfig, StftError};
use crate::window::hann;

/// Spectrogram engine plus the `float**` row table handed to C callers.
struct StftHandle {
    engine: SpectrogramEngine,
    rows: Vec<*const c_float>,
}

#[derive(Clone, Copy)]
enum Reduction {
    Magnitude,
    Power,
    LogPower,
}

/// Run `f`, turning a panic into `None`.
fn guard<T>(f: impl FnOnce() -> Option<T>) -> Option<T> {
    catch_unwind(AssertUnwindSafe(f)).ok().flatten()
}

fn to_usize(v: c_int) -> Option<usize> {
    usize::try_from(v).ok()
}

/// Create a forward real FFT of length `n`. Returns null on failure.
#[no_mangle]
pub extern "C" fn create_fft_object(n: c_int) -> *mut c_void {
    guard(|| {
        let engine = TransformEngine::new(to_usize(n)?)
            .map_err(|err| warn!("create_fft_object({}) failed: {}", n, err))
            .ok()?;
        Some(Box::into_raw(Box::new(engine)) as *mut c_void)
    })
    .unwrap_or(ptr::null_mut())
}

/// Transform `n` samples read from `arr` and return the half-complex spectrum.
///
/// # Safety
/// `ptr` must come from [`create_fft_object`] and not be deleted; `arr` must
/// point to at least `n` readable floats.
#[no_mangle]
pub unsafe extern "C" fn forward_rfft(ptr: *mut c_void, arr: *const c_float) -> *const c_float {
    if ptr.is_null() || arr.is_null() {
        return ptr::null();
    }
    let engine = &mut *(ptr as *mut TransformEngine);
    let frame = slice::from_raw_parts(arr, engine.len());
    guard(|| engine.forward_real_transform(frame).ok().map(<[f32]>::as_ptr))
        .unwrap_or(ptr::null())
}

/// # Safety
/// `ptr` must be null or come from [`create_fft_object`], and is invalid
/// afterwards.
#[no_mangle]
pub unsafe extern "C" fn delete_fft_object(ptr: *mut c_void) {
    if !ptr.is_null() {
        drop(Box::from_raw(ptr as *mut TransformEngine));
    }
}

/// Row count for `(n, nperseg, noverlap)`, or `-1` if no engine can be built.
#[no_mangle]
pub extern "C" fn calc_nrows(n: c_int, nperseg: c_int, noverlap: c_int) -> c_int {
    (|| {
        let rows = row_count(to_usize(n)?, to_usize(nperseg)?, to_usize(noverlap)?)?;
        c_int::try_from(rows).ok()
    })()
    .unwrap_or(-1)
}

/// Column count `floor(nperseg / 2)`, or `-1` for a negative `nperseg`.
#[no_mangle]
pub extern "C" fn calc_ncols(_n: c_int, nperseg: c_int, _noverlap: c_int) -> c_int {
    to_usize(nperseg)
        .and_then(|size| c_int::try_from(col_count(size)).ok())
        .unwrap_or(-1)
}

/// Allocate a Hann window of length `n`; release it with [`free_hann_window`].
#[no_mangle]
pub extern "C" fn get_hann_window(n: c_int) -> *mut c_float {
    guard(|| {
        let window = hann(to_usize(n)?).into_boxed_slice();
        Some(Box::into_raw(window) as *mut c_float)
    })
    .unwrap_or(ptr::null_mut())
}

/// # Safety
/// `ptr` must be null or come from [`get_hann_window`] called with the same `n`.
#[no_mangle]
pub unsafe extern "C" fn free_hann_window(ptr: *mut c_float, n: c_int) {
    if ptr.is_null() {
        return;
    }
    if let Some(len) = to_usize(n) {
        drop(Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, len)));
    }
}

/// Create a spectrogram engine. Returns null on an invalid configuration or
/// allocation failure.
#[no_mangle]
pub extern "C" fn create_stftpack_object(
    n: c_int,
    nperseg: c_int,
    noverlap: c_int,
    eps: c_float,
) -> *mut c_void {
    guard(|| {
        let config = StftConfig::new(to_usize(n)?, to_usize(nperseg)?, to_usize(noverlap)?, eps);
        let handle = new_handle(config)
            .map_err(|err| warn!("create_stftpack_object failed: {}", err))
            .ok()?;
        Some(Box::into_raw(Box::new(handle)) as *mut c_void)
    })
    .unwrap_or(ptr::null_mut())
}

fn new_handle(config: StftConfig) -> Result<StftHandle, StftError> {
    let engine = SpectrogramEngine::new(config)?;
    let rows =
        try_filled(engine.row_count(), ptr::null()).map_err(|_| StftError::AllocationFailed)?;
    Ok(StftHandle { engine, rows })
}

/// # Safety
/// `ptr` must be null or come from [`create_stftpack_object`], and is invalid
/// afterwards together with every matrix it returned.
#[no_mangle]
pub unsafe extern "C" fn delete_stftpack_object(ptr: *mut c_void) {
    if !ptr.is_null() {
        drop(Box::from_raw(ptr as *mut StftHandle));
    }
}

/// Magnitude STFT as a `float**` of `calc_nrows` rows by `calc_ncols` columns.
///
/// # Safety
/// `ptr` must come from [`create_stftpack_object`]; `arr` must point to the
/// `n` floats the engine was created for.
#[no_mangle]
pub unsafe extern "C" fn forward_stft(
    ptr: *mut c_void,
    arr: *const c_float,
) -> *const *const c_float {
    run(ptr, arr, Reduction::Magnitude)
}

/// Power spectrogram, see [`forward_stft`].
///
/// # Safety
/// Same contract as [`forward_stft`].
#[no_mangle]
pub unsafe extern "C" fn forward_spectrogram(
    ptr: *mut c_void,
    arr: *const c_float,
) -> *const *const c_float {
    run(ptr, arr, Reduction::Power)
}

/// Log-power spectrogram, see [`forward_stft`].
///
/// # Safety
/// Same contract as [`forward_stft`].
#[no_mangle]
pub unsafe extern "C" fn forward_log_spectrogram(
    ptr: *mut c_void,
    arr: *const c_float,
) -> *const *const c_float {
    run(ptr, arr, Reduction::LogPower)
}

unsafe fn run(
    ptr: *mut c_void,
    arr: *const c_float,
    reduction: Reduction,
) -> *const *const c_float {
    if ptr.is_null() || arr.is_null() {
        return ptr::null();
    }
    let handle = &mut *(ptr as *mut StftHandle);
    let signal = slice::from_raw_parts(arr, handle.engine.config().total_length);
    guard(|| {
        let StftHandle { engine, rows } = handle;
        let view = match reduction {
            Reduction::Magnitude => engine.forward_stft(signal),
            Reduction::Power => engine.forward_spectrogram(signal),
            Reduction::LogPower => engine.forward_log_spectrogram(signal),
        }
        .map_err(|err| warn!("spectrogram call failed: {}", err))
        .ok()?;
        fill_row_table(&view, rows);
        Some(rows.as_ptr())
    })
    .unwrap_or(ptr::null())
}

fn fill_row_table(view: &SpectrogramView<'_>, rows: &mut [*const c_float]) {
    for (slot, row) in rows.iter_mut().zip(view.iter_rows()) {
        *slot = row.as_ptr();
    }
}
