/// One unit of the emitted patch stream
///
/// `add` holds the byte-wise difference (modulo 256) between the new
/// data and the matched old region; `copy` holds literal new bytes that
/// matched nothing useful; `seek` moves the apply cursor within the old
/// data before the next record.
///
/// Both slices are borrowed: `add` from the context's scratch buffer,
/// `copy` from the new input. The emit callback must serialize the
/// record before returning; neither slice may be retained afterward.
#[derive(Debug, Clone, Copy)]
pub struct Control<'a> {
    /// Byte-wise difference for the approximately-matching region
    pub add: &'a [u8],
    /// Literal bytes taken verbatim from the new data
    pub copy: &'a [u8],
    /// Signed displacement of the old-data cursor, applied after `add`
    pub seek: i64,
    /// Set on the final record of every stream; `add` and `copy` are
    /// empty and `seek` is zero
    pub eof: bool,
}

impl Control<'_> {
    /// The closing record of a patch stream
    pub fn eof() -> Control<'static> {
        Control {
            add: &[],
            copy: &[],
            seek: 0,
            eof: true,
        }
    }
}
