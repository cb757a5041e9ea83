//! The scanner/encoder
//!
//! Walks the new buffer left to right. At each position the suffix
//! array locates the longest prefix of the remaining new data that
//! appears anywhere in the old data; a running score decides whether
//! that candidate beats simply continuing the previous record's offset.
//! Once a match is accepted, forward and backward extension pick where
//! the add region ends and the copy region begins, overlaps are split
//! at the point that assigns the most bytes correctly, and one control
//! record is emitted.

use super::context::DiffContext;
use super::control::Control;
use super::error::DiffError;
use crate::progress::ProgressSink;
use crate::suffix::{resolve_workers, SuffixArray};
use crate::utils::format_size;
use std::io;
use std::time::Instant;

/// Bytes of scanned input between progress notifications
const PROGRESS_EVERY: usize = 64 << 20;

/// A new candidate match must beat the previous offset's implied score
/// by more than this many bytes before the scanner switches to it.
/// Changing it changes every emitted stream.
const MISMATCH_SLACK: i64 = 8;

pub(crate) fn diff<W>(
    ctx: &mut DiffContext,
    old: &[u8],
    new: &[u8],
    mut write_message: W,
    progress: &mut dyn ProgressSink,
) -> Result<(), DiffError>
where
    W: FnMut(&Control<'_>) -> io::Result<()>,
{
    let olen = old.len();
    let nlen = new.len();

    let sort_started = Instant::now();
    let workers = resolve_workers(ctx.suffix_sort_concurrency);
    let index = SuffixArray::build(old, workers)?;
    if let Some(stats) = ctx.stats.as_mut() {
        stats.time_sorting += sort_started.elapsed();
    }
    if ctx.measure_parallel_overhead {
        progress.debug(&format!(
            "suffix sort: {} workers, {:?} of {:?} spent in parallel setup",
            workers,
            index.parallel_overhead,
            sort_started.elapsed(),
        ));
    }
    ctx.note_memory(progress, "after suffix sort");

    progress.label(&format!("Scanning {}...", format_size(nlen as u64)));

    let scan_started = Instant::now();
    let mut last_progress = 0usize;

    let mut scan = 0usize;
    let mut length = 0usize;
    let mut pos = 0usize;
    let mut lastscan = 0usize;
    let mut lastpos = 0usize;
    let mut lastoffset = 0i64;

    while scan < nlen {
        let mut oldscore = 0i64;
        scan += length;

        if scan - last_progress > PROGRESS_EVERY {
            last_progress = scan;
            progress.progress(scan as f64 / nlen as f64);
        }

        // Extend scan until a candidate match clearly beats continuing
        // the previous record's offset. oldscore counts, over the
        // window already covered, how many bytes that offset would
        // still get right.
        let mut scsc = scan;
        while scan < nlen {
            let (p, l) = index.search(old, &new[scan..]);
            pos = p;
            length = l;

            while scsc < scan + length {
                let off = scsc as i64 + lastoffset;
                if off >= 0 && (off as usize) < olen && old[off as usize] == new[scsc] {
                    oldscore += 1;
                }
                scsc += 1;
            }

            if (length as i64 == oldscore && length != 0)
                || length as i64 > oldscore + MISMATCH_SLACK
            {
                break;
            }

            let off = scan as i64 + lastoffset;
            if off >= 0 && (off as usize) < olen && old[off as usize] == new[scan] {
                oldscore -= 1;
            }
            scan += 1;
        }

        if length as i64 != oldscore || scan == nlen {
            // Forward extension: longest prefix of the gap maximizing
            // 2 * matches - length. The strict comparison keeps the
            // earliest maximum.
            let mut s = 0i64;
            let mut best_f = 0i64;
            let mut lenf = 0usize;
            let mut i = 0usize;
            while lastscan + i < scan && lastpos + i < olen {
                if old[lastpos + i] == new[lastscan + i] {
                    s += 1;
                }
                i += 1;
                if s * 2 - i as i64 > best_f * 2 - lenf as i64 {
                    best_f = s;
                    lenf = i;
                }
            }

            // Backward extension from the accepted match, same score
            let mut lenb = 0usize;
            if scan < nlen {
                let mut s = 0i64;
                let mut best_b = 0i64;
                let mut i = 1usize;
                while scan >= lastscan + i && pos >= i {
                    if old[pos - i] == new[scan - i] {
                        s += 1;
                    }
                    if s * 2 - i as i64 > best_b * 2 - lenb as i64 {
                        best_b = s;
                        lenb = i;
                    }
                    i += 1;
                }
            }

            // The extensions may claim the same middle bytes; split the
            // overlap where the running balance of correct assignments
            // peaks first.
            if lastscan + lenf > scan - lenb {
                let overlap = (lastscan + lenf) - (scan - lenb);
                let mut s = 0i64;
                let mut best = 0i64;
                let mut split = 0usize;
                for i in 0..overlap {
                    if new[lastscan + lenf - overlap + i] == old[lastpos + lenf - overlap + i] {
                        s += 1;
                    }
                    if new[scan - lenb + i] == old[pos - lenb + i] {
                        s -= 1;
                    }
                    if s > best {
                        best = s;
                        split = i + 1;
                    }
                }
                lenf = lenf + split - overlap;
                lenb -= split;
            }

            // Stage the add region: new minus old, modulo 256
            ctx.scratch.clear();
            ctx.scratch.extend(
                new[lastscan..lastscan + lenf]
                    .iter()
                    .zip(&old[lastpos..lastpos + lenf])
                    .map(|(n, o)| n.wrapping_sub(*o)),
            );

            let record = Control {
                add: &ctx.scratch,
                copy: &new[lastscan + lenf..scan - lenb],
                seek: (pos as i64 - lenb as i64) - (lastpos as i64 + lenf as i64),
                eof: false,
            };
            write_message(&record).map_err(DiffError::Emit)?;

            if let Some(stats) = ctx.stats.as_mut() {
                stats.biggest_add = stats.biggest_add.max(lenf as u64);
            }

            lastscan = scan - lenb;
            lastpos = pos - lenb;
            lastoffset = pos as i64 - scan as i64;
        }
    }

    if let Some(stats) = ctx.stats.as_mut() {
        stats.time_scanning += scan_started.elapsed();
    }
    ctx.note_memory(progress, "after scan");

    write_message(&Control::eof()).map_err(DiffError::Emit)?;

    Ok(())
}
