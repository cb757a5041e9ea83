//! The diff engine
//!
//! A diff job is a three-stage pipeline executed sequentially:
//!
//! 1. both inputs are materialized into contiguous byte buffers and
//!    length-checked against [`MAX_INPUT`]
//! 2. the old buffer is indexed with a linear-time suffix sort
//!    ([`crate::suffix`])
//! 3. the new buffer is walked left to right; each matched region
//!    becomes one [`Control`] record handed to the emit callback, and a
//!    final EOF record closes the stream
//!
//! ## Usage
//!
//! ```no_run
//! use bdx::diff::DiffContext;
//! use bdx::progress::NoopSink;
//!
//! let mut ctx = DiffContext::new();
//! let mut records = 0u64;
//! ctx.diff_buffers(b"old data", b"new data", |_rec| {
//!     records += 1;
//!     Ok(())
//! }, &mut NoopSink).unwrap();
//! ```

pub mod context;
pub mod control;
pub mod error;
mod load;
mod scan;

pub use context::{DiffContext, DiffStats, MAX_INPUT};
pub use control::Control;
pub use error::DiffError;
