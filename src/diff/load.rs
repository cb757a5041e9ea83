//! Input loading
//!
//! Both inputs are read fully into memory before any indexing starts.
//! A failed or oversized read aborts the job with no partial output.

use super::context::MAX_INPUT;
use super::error::DiffError;
use std::io::Read;

/// Reject lengths beyond the 32-bit indexing limit
pub(crate) fn check_len(len: u64) -> Result<(), DiffError> {
    if len > MAX_INPUT {
        return Err(DiffError::InputTooLarge(len));
    }
    Ok(())
}

/// Read an input to the end, stopping as soon as it provably exceeds
/// the size limit
pub(crate) fn read_input<R: Read>(reader: R) -> Result<Vec<u8>, DiffError> {
    let mut buf = Vec::new();
    reader
        .take(MAX_INPUT + 1)
        .read_to_end(&mut buf)
        .map_err(DiffError::InputRead)?;
    check_len(buf.len() as u64)?;
    Ok(buf)
}
