//! A growable byte buffer with a read/write cursor
//!
//! One [`Buffer`] is created per table being encoded or decoded and dropped
//! when that call returns. All multi-byte access is big-endian, as required
//! by the container format.

use crate::error::DecodeError;

/// An owned byte sequence with an internal read/write cursor.
///
/// Reads advance the cursor and fail with [`DecodeError::TooShort`] when
/// insufficient bytes remain; callers decoding variable-count structures are
/// expected to pre-check the declared length (see
/// [`check_from`](Buffer::check_from)) so that errors name the structure
/// being read rather than the buffer itself.
///
/// Writes at the cursor append when the cursor sits at the end of the data
/// and overwrite in place otherwise; the buffer never truncates on
/// overwrite. Seeking past the end is permitted for the offset-patch
/// protocol ([`ping16`](Buffer::ping16) and friends); a write landing past
/// the end zero-fills the gap first.
#[derive(Clone, Default)]
pub struct Buffer {
    bytes: Vec<u8>,
    cursor: usize,
}

/// Cursor state threaded through an offset-patch sequence.
///
/// `value` is the position the next payload will land at, and therefore the
/// value the next offset slot receives; `resume` is where sequential header
/// writing continues after a patch. See [`Buffer::ping16`].
#[derive(Clone, Copy, Debug)]
pub struct OffsetRun {
    value: usize,
    resume: usize,
}

impl OffsetRun {
    /// A new run whose first payload lands at `payload_start` (usually the
    /// size of the fixed header being written).
    pub fn new(payload_start: usize) -> Self {
        OffsetRun {
            value: payload_start,
            resume: 0,
        }
    }

    /// The position the next payload will be written at.
    pub fn value(&self) -> usize {
        self.value
    }
}

impl Buffer {
    /// Create a new, empty buffer.
    pub fn new() -> Self {
        Buffer::default()
    }

    /// The length of the data, in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// `true` if the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The current cursor position.
    pub fn pos(&self) -> usize {
        self.cursor
    }

    /// Move the cursor to `pos`.
    pub fn seek(&mut self, pos: usize) {
        self.cursor = pos;
    }

    /// The number of bytes between the cursor and the end of the data.
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.cursor)
    }

    /// Check that at least `expected` bytes exist counting from `start`.
    ///
    /// On failure returns [`DecodeError::TooShort`] naming the caller's
    /// structure. Decoders call this once for the fixed header, and again
    /// once a header-declared element count is known, before looping over
    /// elements.
    pub fn check_from(
        &self,
        start: usize,
        table: &'static str,
        reading: &'static str,
        expected: usize,
    ) -> Result<(), DecodeError> {
        let actual = self.bytes.len().saturating_sub(start);
        if actual < expected {
            return Err(DecodeError::TooShort {
                table,
                reading,
                expected,
                actual,
            });
        }
        Ok(())
    }

    fn read_be(&mut self, width: usize, reading: &'static str) -> Result<u64, DecodeError> {
        let end = self.cursor + width;
        if end > self.bytes.len() {
            return Err(DecodeError::TooShort {
                table: "cursor buffer",
                reading,
                expected: end,
                actual: self.bytes.len(),
            });
        }
        let mut out = 0u64;
        for &byte in &self.bytes[self.cursor..end] {
            out = (out << 8) | u64::from(byte);
        }
        self.cursor = end;
        Ok(out)
    }

    /// Read a u8, advancing the cursor.
    pub fn read8u(&mut self) -> Result<u8, DecodeError> {
        self.read_be(1, "u8").map(|v| v as u8)
    }

    /// Read a big-endian u16, advancing the cursor.
    pub fn read16u(&mut self) -> Result<u16, DecodeError> {
        self.read_be(2, "u16").map(|v| v as u16)
    }

    /// Read a big-endian 24-bit unsigned value, advancing the cursor.
    pub fn read24u(&mut self) -> Result<u32, DecodeError> {
        self.read_be(3, "u24").map(|v| v as u32)
    }

    /// Read a big-endian u32, advancing the cursor.
    pub fn read32u(&mut self) -> Result<u32, DecodeError> {
        self.read_be(4, "u32").map(|v| v as u32)
    }

    /// Read a big-endian u64, advancing the cursor.
    pub fn read64u(&mut self) -> Result<u64, DecodeError> {
        self.read_be(8, "u64")
    }

    /// Read an i8, advancing the cursor.
    pub fn read8s(&mut self) -> Result<i8, DecodeError> {
        self.read8u().map(|v| v as i8)
    }

    /// Read a big-endian i16, advancing the cursor.
    pub fn read16s(&mut self) -> Result<i16, DecodeError> {
        self.read16u().map(|v| v as i16)
    }

    /// Read a big-endian i32, advancing the cursor.
    pub fn read32s(&mut self) -> Result<i32, DecodeError> {
        self.read32u().map(|v| v as i32)
    }

    /// Read a big-endian i64, advancing the cursor.
    pub fn read64s(&mut self) -> Result<i64, DecodeError> {
        self.read64u().map(|v| v as i64)
    }

    /// Write a byte at the cursor, appending or overwriting as appropriate.
    pub fn write8(&mut self, value: u8) {
        if self.cursor >= self.bytes.len() {
            // zero-fill any gap left by a sparse seek
            self.bytes.resize(self.cursor, 0);
            self.bytes.push(value);
        } else {
            self.bytes[self.cursor] = value;
        }
        self.cursor += 1;
    }

    /// Write a big-endian u16 at the cursor.
    pub fn write16(&mut self, value: u16) {
        self.write8((value >> 8) as u8);
        self.write8(value as u8);
    }

    /// Write the low 24 bits of `value` big-endian at the cursor.
    pub fn write24(&mut self, value: u32) {
        self.write8((value >> 16) as u8);
        self.write8((value >> 8) as u8);
        self.write8(value as u8);
    }

    /// Write a big-endian u32 at the cursor.
    pub fn write32(&mut self, value: u32) {
        self.write16((value >> 16) as u16);
        self.write16(value as u16);
    }

    /// Write a big-endian u64 at the cursor.
    pub fn write64(&mut self, value: u64) {
        self.write32((value >> 32) as u32);
        self.write32(value as u32);
    }

    /// Write raw bytes at the cursor.
    pub fn write_slice(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write8(byte);
        }
    }

    /// Write another buffer's contents at the cursor, draining it.
    ///
    /// The source is emptied so a sub-buffer cannot be spliced twice; this
    /// is the ownership contract [`pingpong16`](Buffer::pingpong16) relies
    /// on.
    pub fn write_buffer(&mut self, other: &mut Buffer) {
        let bytes = std::mem::take(&mut other.bytes);
        other.cursor = 0;
        self.write_slice(&bytes);
    }

    /// Pad the data to a 4-byte boundary with zero bytes.
    ///
    /// Padding is appended at the end regardless of the cursor, which is
    /// restored afterwards. Table lengths in the container format must be
    /// 4-byte aligned.
    pub fn align4(&mut self) {
        let saved = self.pos();
        self.seek(self.bytes.len());
        while self.bytes.len() % 4 != 0 {
            self.write8(0);
        }
        self.seek(saved);
    }

    /// Write `run.value` into a 16-bit offset slot at the cursor, then move
    /// the cursor to that position to receive the payload.
    ///
    /// Together with [`pong`](Buffer::pong) this implements the offset-patch
    /// discipline used whenever a structure holds "offset to subtable"
    /// fields: offset slots and payloads are interleaved in one pass instead
    /// of precomputing every subtable length up front.
    pub fn ping16(&mut self, run: &mut OffsetRun) {
        debug_assert!(run.value <= u16::MAX as usize);
        self.write16(run.value as u16);
        run.resume = self.pos();
        self.seek(run.value);
    }

    /// Record the end of the payload just written as the next offset value
    /// and move the cursor back to resume sequential writing.
    pub fn pong(&mut self, run: &mut OffsetRun) {
        run.value = self.pos();
        self.seek(run.resume);
    }

    /// The fused form of [`ping16`](Buffer::ping16) and
    /// [`pong`](Buffer::pong): write the offset slot, splice in `sub` as the
    /// payload (draining it), and resume.
    pub fn pingpong16(&mut self, sub: &mut Buffer, run: &mut OffsetRun) {
        debug_assert!(run.value <= u16::MAX as usize);
        self.write16(run.value as u16);
        run.resume = self.pos();
        self.seek(run.value);
        self.write_buffer(sub);
        run.value = self.pos();
        self.seek(run.resume);
    }

    /// The underlying bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the buffer, returning the underlying bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(bytes: Vec<u8>) -> Self {
        Buffer { bytes, cursor: 0 }
    }
}

impl From<&[u8]> for Buffer {
    fn from(bytes: &[u8]) -> Self {
        bytes.to_vec().into()
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Buffer(len {}, pos {})", self.bytes.len(), self.cursor)?;
        for (row, chunk) in self.bytes.chunks(16).enumerate() {
            let hex = chunk
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(f, "{:08x}  {hex}", row * 16)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn big_endian_round_trip() {
        let mut buf = Buffer::new();
        buf.write8(0x01);
        buf.write16(0x0203);
        buf.write24(0x040506);
        buf.write32(0x0708090a);
        buf.write64(0x0b0c0d0e0f101112);
        assert_eq!(
            buf.as_slice(),
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18]
        );

        buf.seek(0);
        assert_eq!(buf.read8u().unwrap(), 0x01);
        assert_eq!(buf.read16u().unwrap(), 0x0203);
        assert_eq!(buf.read24u().unwrap(), 0x040506);
        assert_eq!(buf.read32u().unwrap(), 0x0708090a);
        assert_eq!(buf.read64u().unwrap(), 0x0b0c0d0e0f101112);
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn signed_reads() {
        let mut buf = Buffer::from(vec![0xff, 0xff, 0xfe, 0x80]);
        assert_eq!(buf.read16s().unwrap(), -1);
        assert_eq!(buf.read8s().unwrap(), -2);
        assert_eq!(buf.read8s().unwrap(), -128);
    }

    #[test]
    fn read_past_end_is_too_short() {
        let mut buf = Buffer::from(vec![0xab]);
        assert_eq!(buf.read8u().unwrap(), 0xab);
        assert!(matches!(
            buf.read16u(),
            Err(DecodeError::TooShort {
                expected: 3,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn overwrite_never_truncates() {
        let mut buf = Buffer::new();
        buf.write32(0xdeadbeef);
        buf.seek(1);
        buf.write16(0x0102);
        assert_eq!(buf.as_slice(), &[0xde, 0x01, 0x02, 0xef]);
        assert_eq!(buf.pos(), 3);
    }

    #[test]
    fn align4_pads_at_end_and_restores_cursor() {
        let mut buf = Buffer::new();
        buf.write8(1);
        buf.write8(2);
        buf.seek(1);
        buf.align4();
        assert_eq!(buf.as_slice(), &[1, 2, 0, 0]);
        assert_eq!(buf.pos(), 1);

        buf.align4();
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn ping_pong_interleaves_offsets_and_payloads() {
        // header: one u16 field plus two 16-bit offset slots
        let mut buf = Buffer::new();
        let mut run = OffsetRun::new(6);
        buf.write16(0x0001);
        buf.ping16(&mut run);
        buf.write16(0xaaaa);
        buf.write16(0xbbbb);
        buf.pong(&mut run);
        buf.ping16(&mut run);
        buf.write16(0xcccc);
        buf.pong(&mut run);
        assert_eq!(
            buf.as_slice(),
            &[0x00, 0x01, 0x00, 0x06, 0x00, 0x0a, 0xaa, 0xaa, 0xbb, 0xbb, 0xcc, 0xcc]
        );
    }

    #[test]
    fn pingpong_splices_and_drains_sub_buffer() {
        let mut sub = Buffer::new();
        sub.write16(0xaaaa);
        let mut buf = Buffer::new();
        let mut run = OffsetRun::new(4);
        buf.write16(0x0007);
        buf.pingpong16(&mut sub, &mut run);
        assert!(sub.is_empty());
        assert_eq!(buf.as_slice(), &[0x00, 0x07, 0x00, 0x04, 0xaa, 0xaa]);
        assert_eq!(run.value(), 6);
        assert_eq!(buf.pos(), 4);
    }

    #[test]
    fn check_from_counts_from_structure_start() {
        let buf = Buffer::from(vec![0u8; 10]);
        assert!(buf.check_from(0, "Coverage", "glyph array", 10).is_ok());
        let err = buf.check_from(0, "Coverage", "glyph array", 204).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TooShort {
                table: "Coverage",
                reading: "glyph array",
                expected: 204,
                actual: 10,
            }
        );
    }
}
