use crate::suffix::IndexError;
use std::io;
use thiserror::Error;

/// Fatal diff job failures
///
/// Nothing is retried: every variant terminates the job, and no EOF
/// record is emitted on the error path.
#[derive(Debug, Error)]
pub enum DiffError {
    /// An input exceeds the maximum diffable size (2^31 - 2 bytes)
    #[error("input of {0} or more bytes exceeds the maximum diffable size")]
    InputTooLarge(u64),

    /// An input reader failed
    #[error("failed to read input")]
    InputRead(#[source] io::Error),

    /// The emit callback refused a control record
    #[error("failed to emit control record")]
    Emit(#[source] io::Error),

    /// Suffix array construction failed
    #[error(transparent)]
    Indexer(#[from] IndexError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_preserves_cause() {
        let cause = io::Error::new(io::ErrorKind::BrokenPipe, "downstream gone");
        let err = DiffError::Emit(cause);
        let source = std::error::Error::source(&err).expect("source preserved");
        assert!(source.to_string().contains("downstream gone"));
    }

    #[test]
    fn test_messages() {
        let err = DiffError::InputTooLarge(i32::MAX as u64);
        assert!(err.to_string().contains("maximum diffable size"));
    }
}
