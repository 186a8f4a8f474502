//! Fallible buffer allocation shared by the engines.

use std::collections::TryReserveError;

/// Allocate a vector of `len` copies of `value`, reporting allocation failure
/// instead of aborting the process.
pub(crate) fn try_filled<T: Clone>(len: usize, value: T) -> Result<Vec<T>, TryReserveError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)?;
    buf.resize(len, value);
    Ok(buf)
}
