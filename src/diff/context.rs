//! Diff context and job statistics

use super::control::Control;
use super::error::DiffError;
use super::{load, scan};
use crate::progress::ProgressSink;
use crate::utils::{format_size, resident_memory};
use serde::Serialize;
use std::io::{self, Read};
use std::time::Duration;

/// Largest input size diffed on either side: 2^31 - 2 bytes
///
/// The suffix array is indexed with signed 32-bit offsets, so anything
/// larger is rejected before any work is done.
pub const MAX_INPUT: u64 = i32::MAX as u64 - 1;

/// Timing and size counters accumulated across jobs
///
/// Counters only grow; reusing a context across jobs keeps adding to
/// the same totals.
#[derive(Debug, Default, Clone, Serialize)]
pub struct DiffStats {
    /// Total time spent building suffix arrays
    pub time_sorting: Duration,
    /// Total time spent scanning and emitting records
    pub time_scanning: Duration,
    /// Largest add region emitted so far, in bytes
    pub biggest_add: u64,
}

/// Settings and reusable scratch storage for diff jobs
///
/// Reusing a context across jobs avoids reallocating the scratch
/// buffer that stages each record's add region. A context must not be
/// shared between threads mid-job; two independent contexts may run in
/// parallel.
#[derive(Default)]
pub struct DiffContext {
    /// Worker count for the parallel portion of suffix sorting:
    /// 0 is sequential, a positive value caps the pool at that many
    /// workers, a negative value means that many fewer than the core
    /// count. The emitted stream is identical at every setting.
    pub suffix_sort_concurrency: i32,

    /// Report resident-set size through the progress sink at four
    /// checkpoints of the job
    pub measure_memory: bool,

    /// Report how much of the indexing time went to parallel setup
    pub measure_parallel_overhead: bool,

    /// Optional accumulator for timing and size counters
    pub stats: Option<DiffStats>,

    /// Staging buffer for add regions, reset per record, capacity kept
    /// across records and jobs
    pub(crate) scratch: Vec<u8>,
}

impl DiffContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context that accumulates [`DiffStats`]
    pub fn with_stats() -> Self {
        Self {
            stats: Some(DiffStats::default()),
            ..Self::default()
        }
    }

    /// Diff two readers, emitting one [`Control`] record per matched
    /// region and a final EOF record
    ///
    /// Both inputs are read fully before indexing starts. The callback
    /// must serialize each record before returning; the record's slices
    /// are invalidated by the next emission. Any callback error aborts
    /// the job.
    pub fn diff<RO, RN, W>(
        &mut self,
        old: RO,
        new: RN,
        write_message: W,
        progress: &mut dyn ProgressSink,
    ) -> Result<(), DiffError>
    where
        RO: Read,
        RN: Read,
        W: FnMut(&Control<'_>) -> io::Result<()>,
    {
        self.note_memory(progress, "at start");
        let old = load::read_input(old)?;
        let new = load::read_input(new)?;
        self.note_memory(progress, "after input load");
        self.diff_buffers(&old, &new, write_message, progress)
    }

    /// Diff two in-memory buffers; see [`DiffContext::diff`]
    pub fn diff_buffers<W>(
        &mut self,
        old: &[u8],
        new: &[u8],
        write_message: W,
        progress: &mut dyn ProgressSink,
    ) -> Result<(), DiffError>
    where
        W: FnMut(&Control<'_>) -> io::Result<()>,
    {
        load::check_len(old.len() as u64)?;
        load::check_len(new.len() as u64)?;
        scan::diff(self, old, new, write_message, progress)
    }

    pub(crate) fn note_memory(&self, progress: &mut dyn ProgressSink, when: &str) {
        if !self.measure_memory {
            return;
        }
        if let Some(rss) = resident_memory() {
            progress.debug(&format!("resident memory {}: {}", when, format_size(rss)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopSink;
    use std::io::Cursor;

    #[test]
    fn test_reader_path_matches_buffer_path() {
        let old = b"the quick brown fox".to_vec();
        let new = b"the quick red fox".to_vec();

        let mut from_readers: Vec<Vec<u8>> = Vec::new();
        DiffContext::new()
            .diff(
                Cursor::new(old.clone()),
                Cursor::new(new.clone()),
                |rec| {
                    from_readers.push(rec.add.to_vec());
                    Ok(())
                },
                &mut NoopSink,
            )
            .unwrap();

        let mut from_buffers: Vec<Vec<u8>> = Vec::new();
        DiffContext::new()
            .diff_buffers(
                &old,
                &new,
                |rec| {
                    from_buffers.push(rec.add.to_vec());
                    Ok(())
                },
                &mut NoopSink,
            )
            .unwrap();

        assert_eq!(from_readers, from_buffers);
    }

    #[test]
    fn test_scratch_capacity_survives_jobs() {
        let mut ctx = DiffContext::new();
        ctx.diff_buffers(b"aaaa", b"aaaa", |_| Ok(()), &mut NoopSink)
            .unwrap();
        let cap = ctx.scratch.capacity();
        assert!(cap >= 4);
        ctx.diff_buffers(b"aaaa", b"aaaa", |_| Ok(()), &mut NoopSink)
            .unwrap();
        assert!(ctx.scratch.capacity() >= cap);
    }

    #[test]
    fn test_stats_accumulate_across_jobs() {
        let mut ctx = DiffContext::with_stats();
        ctx.diff_buffers(b"abcdefgh", b"abcdefgh", |_| Ok(()), &mut NoopSink)
            .unwrap();
        let first = ctx.stats.clone().unwrap();
        assert_eq!(first.biggest_add, 8);

        ctx.diff_buffers(b"abcdefgh", b"abcdefgh", |_| Ok(()), &mut NoopSink)
            .unwrap();
        let second = ctx.stats.clone().unwrap();
        assert!(second.time_scanning >= first.time_scanning);
        assert_eq!(second.biggest_add, 8);
    }
}
