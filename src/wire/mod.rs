//! Length-prefixed patch framing
//!
//! A patch file is a small header followed by one frame per control
//! record:
//!
//! ```text
//! header:  magic "BDXP" | version u32 LE
//! frame:   payload_len u32 LE | payload
//! payload: flags u8 | seek zigzag varint | add_len varint
//!          | copy_len varint | add bytes | copy bytes
//! ```
//!
//! The writer serializes each record into an internal buffer before
//! returning, so the borrowed slices of a [`Control`] are never
//! retained. The stream ends at the frame whose EOF flag is set.

use crate::diff::Control;
use crate::utils::encoding::{
    decode_varint, encode_varint, read_u32_le, write_u32_le, zigzag_decode, zigzag_encode,
};
use std::io::{self, Read, Write};
use thiserror::Error;

/// Magic number opening every patch stream
pub const MAGIC: [u8; 4] = *b"BDXP";

/// Current version of the patch framing
pub const VERSION: u32 = 1;

/// Upper bound reserved for per-frame payloads
///
/// Not enforced yet: add regions may legitimately exceed it. Declared
/// so a future framing revision can split oversized records without
/// changing the header.
pub const MAX_MESSAGE_PAYLOAD: u64 = 16 * 1024 * 1024;

const FLAG_EOF: u8 = 0b0000_0001;

/// A malformed or unreadable patch stream
#[derive(Debug, Error)]
pub enum WireError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("not a patch stream (bad magic)")]
    BadMagic,

    #[error("unsupported patch version {0}")]
    UnsupportedVersion(u32),

    #[error("patch stream ended mid-frame")]
    Truncated,

    #[error("corrupt frame: {0}")]
    Corrupt(&'static str),
}

/// An owned control record decoded from a patch stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub add: Vec<u8>,
    pub copy: Vec<u8>,
    pub seek: i64,
    pub eof: bool,
}

/// Streaming writer producing framed patch files
pub struct PatchWriter<W: Write> {
    inner: W,
    frame: Vec<u8>,
}

impl<W: Write> PatchWriter<W> {
    /// Write the stream header and return the writer
    pub fn new(mut inner: W) -> io::Result<Self> {
        inner.write_all(&MAGIC)?;
        write_u32_le(&mut inner, VERSION)?;
        Ok(Self {
            inner,
            frame: Vec::new(),
        })
    }

    /// Frame and write one control record
    ///
    /// The record is fully serialized before this returns; the caller
    /// may reuse its buffers immediately afterward.
    pub fn write_record(&mut self, record: &Control<'_>) -> io::Result<()> {
        self.frame.clear();
        self.frame
            .push(if record.eof { FLAG_EOF } else { 0 });
        encode_varint(zigzag_encode(record.seek), &mut self.frame);
        encode_varint(record.add.len() as u64, &mut self.frame);
        encode_varint(record.copy.len() as u64, &mut self.frame);
        self.frame.extend_from_slice(record.add);
        self.frame.extend_from_slice(record.copy);

        write_u32_le(&mut self.inner, self.frame.len() as u32)?;
        self.inner.write_all(&self.frame)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(mut self) -> W {
        let _ = self.inner.flush();
        self.inner
    }
}

/// Streaming reader over framed patch files
#[derive(Debug)]
pub struct PatchReader<R: Read> {
    inner: R,
    payload: Vec<u8>,
}

impl<R: Read> PatchReader<R> {
    /// Validate the stream header and return the reader
    pub fn new(mut inner: R) -> Result<Self, WireError> {
        let mut magic = [0u8; 4];
        inner.read_exact(&mut magic).map_err(eof_as_truncated)?;
        if magic != MAGIC {
            return Err(WireError::BadMagic);
        }
        let version = read_u32_le(&mut inner).map_err(eof_as_truncated)?;
        if version != VERSION {
            return Err(WireError::UnsupportedVersion(version));
        }
        Ok(Self {
            inner,
            payload: Vec::new(),
        })
    }

    /// Read and decode the next record
    pub fn read_record(&mut self) -> Result<Record, WireError> {
        let len = read_u32_le(&mut self.inner).map_err(eof_as_truncated)? as u64;

        self.payload.clear();
        let read = (&mut self.inner)
            .take(len)
            .read_to_end(&mut self.payload)?;
        if read as u64 != len {
            return Err(WireError::Truncated);
        }

        let buf = &self.payload[..];
        let (&flags, mut rest) = buf.split_first().ok_or(WireError::Corrupt("empty frame"))?;

        let seek = zigzag_decode(take_varint(&mut rest)?);
        let add_len = usize::try_from(take_varint(&mut rest)?)
            .map_err(|_| WireError::Corrupt("add length overflow"))?;
        let copy_len = usize::try_from(take_varint(&mut rest)?)
            .map_err(|_| WireError::Corrupt("copy length overflow"))?;

        if rest.len() != add_len.checked_add(copy_len).ok_or(WireError::Corrupt("length overflow"))? {
            return Err(WireError::Corrupt("frame length mismatch"));
        }

        Ok(Record {
            add: rest[..add_len].to_vec(),
            copy: rest[add_len..].to_vec(),
            seek,
            eof: flags & FLAG_EOF != 0,
        })
    }
}

fn take_varint(buf: &mut &[u8]) -> Result<u64, WireError> {
    let (value, consumed) =
        decode_varint(buf).ok_or(WireError::Corrupt("unterminated varint"))?;
    *buf = &buf[consumed..];
    Ok(value)
}

fn eof_as_truncated(err: io::Error) -> WireError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        WireError::Truncated
    } else {
        WireError::Io(err)
    }
}
