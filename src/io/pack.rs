//! Compact binary packing of metadata for broadcast.
//!
//! Values are written in native byte order behind a leading marker word. A
//! reader that sees the marker byte-swapped decodes the rest of the stream
//! swapped, so a stream produced on a host of the other endianness still
//! round-trips.

use crate::bov_error::BovError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

pub const PACK_MARKER: u32 = 0x0A0B_0C0D;

#[derive(Debug)]
pub struct PackWriter {
    buf: BytesMut,
}

impl Default for PackWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PackWriter {
    pub fn new() -> Self {
        let mut buf = BytesMut::with_capacity(256);
        buf.put_u32_ne(PACK_MARKER);
        Self { buf }
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.put_u32_ne(v);
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.buf.put_i32_ne(v);
        self
    }

    pub fn i64(&mut self, v: i64) -> &mut Self {
        self.buf.put_i64_ne(v);
        self
    }

    pub fn f64(&mut self, v: f64) -> &mut Self {
        self.buf.put_f64_ne(v);
        self
    }

    pub fn bool(&mut self, v: bool) -> &mut Self {
        self.buf.put_u8(v as u8);
        self
    }

    /// Length-prefixed UTF-8.
    pub fn str(&mut self, s: &str) -> &mut Self {
        self.buf.put_u32_ne(s.len() as u32);
        self.buf.put_slice(s.as_bytes());
        self
    }

    pub fn i32s(&mut self, v: &[i32]) -> &mut Self {
        self.buf.put_u32_ne(v.len() as u32);
        for &x in v {
            self.buf.put_i32_ne(x);
        }
        self
    }

    pub fn f64s(&mut self, v: &[f64]) -> &mut Self {
        self.buf.put_u32_ne(v.len() as u32);
        for &x in v {
            self.buf.put_f64_ne(x);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

#[derive(Debug)]
pub struct PackReader<'a> {
    buf: &'a [u8],
    swapped: bool,
}

impl<'a> PackReader<'a> {
    /// Validate the marker; a byte-swapped marker switches the reader to
    /// swapped decoding.
    pub fn new(mut buf: &'a [u8]) -> Result<Self, BovError> {
        if buf.remaining() < 4 {
            return Err(BovError::Decode("stream shorter than its marker".into()));
        }
        let marker = buf.get_u32_ne();
        let swapped = if marker == PACK_MARKER {
            false
        } else if marker.swap_bytes() == PACK_MARKER {
            log::debug!("metadata stream is byte-swapped");
            true
        } else {
            return Err(BovError::Decode(format!(
                "bad stream marker {marker:#010x}"
            )));
        };
        Ok(Self { buf, swapped })
    }

    pub fn is_swapped(&self) -> bool {
        self.swapped
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn need(&self, n: usize, what: &str) -> Result<(), BovError> {
        if self.buf.remaining() < n {
            return Err(BovError::Decode(format!(
                "truncated stream reading {what}: need {n} bytes, have {}",
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    pub fn u32(&mut self) -> Result<u32, BovError> {
        self.need(4, "u32")?;
        let v = self.buf.get_u32_ne();
        Ok(if self.swapped { v.swap_bytes() } else { v })
    }

    pub fn i32(&mut self) -> Result<i32, BovError> {
        self.need(4, "i32")?;
        let v = self.buf.get_i32_ne();
        Ok(if self.swapped { v.swap_bytes() } else { v })
    }

    pub fn i64(&mut self) -> Result<i64, BovError> {
        self.need(8, "i64")?;
        let v = self.buf.get_i64_ne();
        Ok(if self.swapped { v.swap_bytes() } else { v })
    }

    pub fn f64(&mut self) -> Result<f64, BovError> {
        self.need(8, "f64")?;
        let bits = self.buf.get_u64_ne();
        Ok(f64::from_bits(if self.swapped {
            bits.swap_bytes()
        } else {
            bits
        }))
    }

    pub fn bool(&mut self) -> Result<bool, BovError> {
        self.need(1, "bool")?;
        match self.buf.get_u8() {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(BovError::Decode(format!("invalid bool byte {b}"))),
        }
    }

    fn count(&mut self, elem: usize, what: &str) -> Result<usize, BovError> {
        let n = self.u32()? as usize;
        self.need(n.saturating_mul(elem), what)?;
        Ok(n)
    }

    pub fn string(&mut self) -> Result<String, BovError> {
        let n = self.count(1, "string")?;
        let s = std::str::from_utf8(&self.buf[..n])
            .map_err(|e| BovError::Decode(format!("string is not UTF-8: {e}")))?
            .to_owned();
        self.buf.advance(n);
        Ok(s)
    }

    pub fn i32s(&mut self) -> Result<Vec<i32>, BovError> {
        let n = self.count(4, "i32 array")?;
        (0..n).map(|_| self.i32()).collect()
    }

    pub fn f64s(&mut self) -> Result<Vec<f64>, BovError> {
        let n = self.count(8, "f64 array")?;
        (0..n).map(|_| self.f64()).collect()
    }
}
