//! End-to-end diff/apply tests over the framed patch format.
//!
//! Every case drives the full pipeline: diff into a framed patch,
//! decode the frames, apply against the old data, and compare the
//! reconstruction byte for byte.

use bdx::diff::{DiffContext, DiffStats};
use bdx::patch;
use bdx::progress::NoopSink;
use bdx::wire::{PatchReader, PatchWriter, Record, WireError};
use proptest::prelude::*;
use std::fs;
use std::io::BufReader;

fn diff_to_patch(old: &[u8], new: &[u8]) -> Vec<u8> {
    let mut writer = PatchWriter::new(Vec::new()).expect("patch header");
    DiffContext::new()
        .diff_buffers(old, new, |rec| writer.write_record(rec), &mut NoopSink)
        .expect("diff");
    writer.into_inner()
}

/// Decode every frame up to and including the EOF record, and verify
/// nothing follows it
fn records_of(patch_bytes: &[u8]) -> Vec<Record> {
    let mut reader = PatchReader::new(patch_bytes).expect("patch header");
    let mut records = Vec::new();
    loop {
        let record = reader.read_record().expect("record");
        let eof = record.eof;
        records.push(record);
        if eof {
            break;
        }
    }
    assert!(
        matches!(reader.read_record(), Err(WireError::Truncated)),
        "frames found after the EOF record"
    );
    records
}

fn assert_roundtrip(old: &[u8], new: &[u8]) -> Vec<Record> {
    let patch_bytes = diff_to_patch(old, new);
    let rebuilt = patch::apply_buffers(old, &patch_bytes).expect("apply");
    assert_eq!(rebuilt, new, "reconstruction mismatch");

    let records = records_of(&patch_bytes);
    assert_eq!(records.iter().filter(|r| r.eof).count(), 1);
    let payload: usize = records.iter().map(|r| r.add.len() + r.copy.len()).sum();
    assert_eq!(payload, new.len(), "add + copy must cover the new data");
    records
}

fn xorshift_bytes(mut state: u64, len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        out.push(state as u8);
    }
    out
}

#[test]
fn identical_inputs() {
    let records = assert_roundtrip(b"abcdefgh", b"abcdefgh");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].add, vec![0u8; 8]);
    assert!(records[0].copy.is_empty());
}

#[test]
fn single_byte_flip() {
    let records = assert_roundtrip(b"abcdefgh", b"abcXefgh");
    assert!(records.len() <= 3, "at most two data records expected");
}

#[test]
fn empty_old() {
    let records = assert_roundtrip(b"", b"hello");
    assert_eq!(records.len(), 2);
    assert!(records[0].add.is_empty());
    assert_eq!(records[0].copy, b"hello");
    assert_eq!(records[0].seek, 0);
}

#[test]
fn empty_new() {
    let records = assert_roundtrip(b"hello", b"");
    assert_eq!(records.len(), 1);
    assert!(records[0].eof);
}

#[test]
fn both_empty() {
    let records = assert_roundtrip(b"", b"");
    assert_eq!(records.len(), 1);
}

#[test]
fn word_replacement() {
    assert_roundtrip(b"the quick brown fox", b"the quick red fox");
}

#[test]
fn binary_with_nul_bytes() {
    assert_roundtrip(b"\x00\x00\x01\x02\x00\xFF", b"\x00\x01\x01\x02\x00\xFE");
}

#[test]
fn replaced_region_in_large_random_input() {
    let old = xorshift_bytes(0x0123_4567_89AB_CDEF, 1 << 20);
    let mut new = old.clone();
    let replacement = xorshift_bytes(0xFEDC_BA98_7654_3210, 100);
    new[500_000..500_100].copy_from_slice(&replacement);

    let records = assert_roundtrip(&old, &new);
    let data_records = records.iter().filter(|r| !r.eof).count();
    assert!(
        data_records <= 8,
        "expected a handful of records, got {data_records}"
    );
}

#[test]
fn shifted_content() {
    let base = xorshift_bytes(0xDEAD_BEEF_DEAD_BEEF, 4096);
    // New starts 512 bytes into old, then appends fresh data
    let mut new = base[512..].to_vec();
    new.extend_from_slice(&xorshift_bytes(0xABCD, 256));
    assert_roundtrip(&base, &new);
}

#[test]
fn repetitive_inputs() {
    let old: Vec<u8> = b"abcabcabc".iter().cycle().take(3000).copied().collect();
    let mut new = old.clone();
    new.insert(1500, b'X');
    assert_roundtrip(&old, &new);
}

#[test]
fn deterministic_patches() {
    let old = xorshift_bytes(7, 20_000);
    let mut new = old.clone();
    new[10_000] ^= 0x5A;
    new.extend_from_slice(b"trailer");

    assert_eq!(diff_to_patch(&old, &new), diff_to_patch(&old, &new));
}

#[test]
fn stats_populated() {
    let mut ctx = DiffContext::new();
    ctx.stats = Some(DiffStats::default());
    let mut writer = PatchWriter::new(Vec::new()).unwrap();
    ctx.diff_buffers(
        b"the quick brown fox",
        b"the quick red fox",
        |rec| writer.write_record(rec),
        &mut NoopSink,
    )
    .unwrap();

    let stats = ctx.stats.unwrap();
    assert!(stats.biggest_add > 0);
}

#[test]
fn patch_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let old = xorshift_bytes(42, 10_000);
    let mut new = old.clone();
    new[5_000] = new[5_000].wrapping_add(1);

    let patch_path = dir.path().join("delta.bdx");
    let file = fs::File::create(&patch_path).unwrap();
    let mut writer = PatchWriter::new(file).unwrap();
    DiffContext::new()
        .diff_buffers(&old, &new, |rec| writer.write_record(rec), &mut NoopSink)
        .unwrap();
    writer.flush().unwrap();
    drop(writer);

    let file = fs::File::open(&patch_path).unwrap();
    let mut rebuilt = Vec::new();
    patch::apply(&old, BufReader::new(file), &mut rebuilt).unwrap();
    assert_eq!(rebuilt, new);
}

proptest! {
    #[test]
    fn roundtrip_arbitrary_inputs(
        old in proptest::collection::vec(any::<u8>(), 0..512),
        new in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let patch_bytes = diff_to_patch(&old, &new);
        let rebuilt = patch::apply_buffers(&old, &patch_bytes).unwrap();
        prop_assert_eq!(rebuilt, new);
    }

    #[test]
    fn roundtrip_mutated_copy(
        base in proptest::collection::vec(any::<u8>(), 1..1024),
        edits in proptest::collection::vec((any::<prop::sample::Index>(), any::<u8>()), 0..8),
    ) {
        let mut new = base.clone();
        for (index, value) in &edits {
            let i = index.index(new.len());
            new[i] = *value;
        }
        let patch_bytes = diff_to_patch(&base, &new);
        let rebuilt = patch::apply_buffers(&base, &patch_bytes).unwrap();
        prop_assert_eq!(rebuilt, new);
    }
}
