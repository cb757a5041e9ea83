//! Suffix array construction and longest-match lookup
//!
//! The diff engine indexes the old buffer once with a linear-time
//! suffix sort ([`sais`]) and then answers longest-prefix queries for
//! every scan position with a plain binary search over the sorted
//! suffixes. The array holds `len + 1` signed 32-bit entries: slot 0 is
//! the empty suffix, which sorts before everything else.

mod sais;

use rayon::prelude::*;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Chunk size for the parallel histogram pass
const HISTOGRAM_CHUNK: usize = 4 << 20;

/// Suffix array construction failed
#[derive(Debug, Error)]
#[error("suffix array construction failed: {0}")]
pub struct IndexError(pub(crate) String);

/// Sorted suffix array over one immutable byte buffer
///
/// Built exactly once per diff job and never mutated afterward. The
/// same input always yields the same array.
pub struct SuffixArray {
    entries: Vec<i32>,
    /// Time spent setting up and running the parallel histogram pass;
    /// zero when the build was sequential
    pub(crate) parallel_overhead: Duration,
}

impl SuffixArray {
    /// Index `old`, using `workers` threads for the histogram pass
    ///
    /// `workers` comes from [`resolve_workers`]; a value of 1 keeps the
    /// build fully sequential. The result is identical at every worker
    /// count.
    pub fn build(old: &[u8], workers: usize) -> Result<Self, IndexError> {
        let n = old.len();
        if n > (i32::MAX - 1) as usize {
            return Err(IndexError(format!("{} bytes exceed 32-bit indexing", n)));
        }

        let mut entries = Vec::new();
        entries
            .try_reserve_exact(n + 1)
            .map_err(|e| IndexError(format!("cannot allocate {} suffix entries: {}", n + 1, e)))?;
        entries.resize(n + 1, 0);
        // The empty suffix sorts first
        entries[0] = n as i32;

        let mut parallel_overhead = Duration::ZERO;
        let counts = if workers > 1 && n > 0 {
            let started = Instant::now();
            let counts = parallel_histogram(old, workers)?;
            parallel_overhead = started.elapsed();
            counts
        } else {
            histogram(old)
        };

        sais::sufsort(old, &mut entries[1..], &counts);
        debug_assert!(entries.iter().all(|&p| p >= 0 && p as usize <= n));

        Ok(Self {
            entries,
            parallel_overhead,
        })
    }

    /// Number of entries, including the empty-suffix slot
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the array indexes an empty buffer (only the
    /// empty-suffix slot is present)
    pub fn is_empty(&self) -> bool {
        self.entries.len() == 1
    }

    /// Longest-match lookup for `q` anywhere in `old`
    ///
    /// Returns the starting offset in `old` of the suffix sharing the
    /// longest common prefix with `q`, and that prefix length (0 when
    /// nothing matches). Purely functional; ties between halves resolve
    /// toward the lower half.
    pub fn search(&self, old: &[u8], q: &[u8]) -> (usize, usize) {
        search_range(&self.entries, old, q, 0, self.entries.len() - 1)
    }
}

/// Binary search over `sa[lo..=hi]` for the suffix closest to `q`
fn search_range(sa: &[i32], old: &[u8], q: &[u8], lo: usize, hi: usize) -> (usize, usize) {
    if hi - lo < 2 {
        let x = common_prefix(&old[sa[lo] as usize..], q);
        let y = common_prefix(&old[sa[hi] as usize..], q);
        if x > y {
            (sa[lo] as usize, x)
        } else {
            (sa[hi] as usize, y)
        }
    } else {
        let mid = lo + (hi - lo) / 2;
        if old[sa[mid] as usize..].cmp(q).is_lt() {
            search_range(sa, old, q, mid, hi)
        } else {
            search_range(sa, old, q, lo, mid)
        }
    }
}

/// Count matching prefix bytes between two slices
#[inline]
fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Map the suffix sort concurrency setting to a worker count
///
/// 0 is sequential, a positive value is taken as-is, a negative value
/// means that many fewer workers than cores, with a floor of one.
pub(crate) fn resolve_workers(concurrency: i32) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|c| c.get())
        .unwrap_or(1);
    match concurrency {
        0 => 1,
        k if k > 0 => k as usize,
        k => cores.saturating_sub(k.unsigned_abs() as usize).max(1),
    }
}

fn histogram(text: &[u8]) -> [usize; 256] {
    let mut counts = [0usize; 256];
    for &b in text {
        counts[b as usize] += 1;
    }
    counts
}

fn parallel_histogram(text: &[u8], workers: usize) -> Result<[usize; 256], IndexError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| IndexError(format!("cannot start {} sort workers: {}", workers, e)))?;
    Ok(pool.install(|| {
        text.par_chunks(HISTOGRAM_CHUNK)
            .fold(
                || [0usize; 256],
                |mut acc, chunk| {
                    for &b in chunk {
                        acc[b as usize] += 1;
                    }
                    acc
                },
            )
            .reduce(
                || [0usize; 256],
                |mut a, b| {
                    for (slot, count) in a.iter_mut().zip(b.iter()) {
                        *slot += count;
                    }
                    a
                },
            )
    }))
}
