//! The apply engine
//!
//! Consumes a framed patch stream plus the old data and reconstructs
//! the new data: each record's add bytes are wrapping-added to the old
//! bytes under the cursor, its copy bytes pass through verbatim, and
//! the cursor then moves by `add_len + seek`. The cursor must stay
//! inside `[0, old_len]` at every step; streams that violate that are
//! rejected as corrupt rather than applied out of bounds.

use crate::wire::{PatchReader, WireError};
use std::io::{Read, Write};
use thiserror::Error;

/// Patch application failures
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("failed to write output")]
    Output(#[source] std::io::Error),

    #[error("add region of {len} bytes overruns old data (cursor {cursor})")]
    AddOutOfBounds { cursor: i64, len: usize },

    #[error("seek of {seek} moves cursor to {cursor}, outside old data")]
    SeekOutOfBounds { cursor: i64, seek: i64 },
}

/// Reconstruct the new data from `old` and a framed patch stream
pub fn apply<R: Read, W: Write>(old: &[u8], patch: R, mut out: W) -> Result<(), ApplyError> {
    let mut reader = PatchReader::new(patch)?;
    let mut cursor = 0i64;
    let mut staged = Vec::new();

    loop {
        let record = reader.read_record()?;
        if record.eof {
            break;
        }

        let len = record.add.len();
        if cursor < 0 || cursor as usize > old.len() || len > old.len() - cursor as usize {
            return Err(ApplyError::AddOutOfBounds { cursor, len });
        }

        staged.clear();
        staged.extend(
            record
                .add
                .iter()
                .zip(&old[cursor as usize..cursor as usize + len])
                .map(|(delta, o)| delta.wrapping_add(*o)),
        );
        out.write_all(&staged).map_err(ApplyError::Output)?;
        out.write_all(&record.copy).map_err(ApplyError::Output)?;

        let next = cursor + len as i64 + record.seek;
        if next < 0 || next as u64 > old.len() as u64 {
            return Err(ApplyError::SeekOutOfBounds {
                cursor: next,
                seek: record.seek,
            });
        }
        cursor = next;
    }

    out.flush().map_err(ApplyError::Output)?;
    Ok(())
}

/// Convenience wrapper returning the reconstructed bytes
pub fn apply_buffers(old: &[u8], patch: &[u8]) -> Result<Vec<u8>, ApplyError> {
    let mut out = Vec::new();
    apply(old, patch, &mut out)?;
    Ok(out)
}
