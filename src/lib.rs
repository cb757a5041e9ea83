//! # BDX - Binary Delta Engine
//!
//! BDX computes compact patches between two byte sequences using the
//! bsdiff family of algorithms: a suffix array over the old data drives
//! an approximate-match scan over the new data, and each matched region
//! is encoded as a control record carrying a byte-wise difference, a
//! literal copy, and a cursor displacement.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`diff`] - The diff engine (loader, scanner/encoder, context)
//! - [`suffix`] - Linear-time suffix array construction and match lookup
//! - [`patch`] - The apply engine (reconstructs new from old + patch)
//! - [`wire`] - Length-prefixed patch framing
//! - [`progress`] - Progress reporting hooks
//! - [`utils`] - Utility functions (varints, human-readable sizes)
//!
//! ## Quick Start
//!
//! ```no_run
//! use bdx::diff::DiffContext;
//! use bdx::progress::NoopSink;
//! use bdx::wire::PatchWriter;
//!
//! let old = std::fs::read("v1.bin").unwrap();
//! let new = std::fs::read("v2.bin").unwrap();
//!
//! let mut writer = PatchWriter::new(Vec::new()).unwrap();
//! let mut ctx = DiffContext::new();
//! ctx.diff_buffers(&old, &new, |rec| writer.write_record(rec), &mut NoopSink)
//!     .unwrap();
//!
//! let patch = writer.into_inner();
//! let rebuilt = bdx::patch::apply_buffers(&old, &patch).unwrap();
//! assert_eq!(rebuilt, new);
//! ```
//!
//! ## Guarantees
//!
//! Applying the emitted stream to the old data reconstructs the new data
//! byte for byte, the record sequence is deterministic for a given input
//! pair, and every stream ends with exactly one EOF record. Inputs are
//! limited to 2^31 - 2 bytes per side; the suffix array is indexed with
//! signed 32-bit offsets.

pub mod diff;
pub mod patch;
pub mod progress;
pub mod suffix;
pub mod utils;
pub mod wire;
