//! Bit-level packing helpers shared by the centroid and colour layers.

use crate::error::CodecError;

/// MSB-first bit packer.
#[derive(Debug, Default)]
pub(crate) struct BitWriter {
    bytes: Vec<u8>,
    used: u8,
}

impl BitWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append the low `count` bits of `value`.
    pub(crate) fn write(&mut self, value: u32, count: u8) {
        for shift in (0..count).rev() {
            if self.used == 0 {
                self.bytes.push(0);
            }
            let bit = ((value >> shift) & 1) as u8;
            if let Some(last) = self.bytes.last_mut() {
                *last |= bit << (7 - self.used);
            }
            self.used = (self.used + 1) % 8;
        }
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// Reader for streams produced by [`BitWriter`].
pub(crate) struct BitReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    pub(crate) fn read(&mut self, count: u8) -> Result<u32, CodecError> {
        let mut value = 0u32;
        for _ in 0..count {
            let byte = self.position / 8;
            let Some(&current) = self.bytes.get(byte) else {
                return Err(CodecError::Truncated {
                    needed: byte + 1,
                    available: self.bytes.len(),
                });
            };
            let bit = (current >> (7 - (self.position % 8))) & 1;
            value = (value << 1) | bit as u32;
            self.position += 1;
        }
        Ok(value)
    }
}

pub(crate) fn zigzag(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

pub(crate) fn unzigzag(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// LEB128-style unsigned varint.
pub(crate) fn write_varint(out: &mut Vec<u8>, mut value: u32) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

pub(crate) fn read_varint(bytes: &[u8], cursor: &mut usize) -> Result<u32, CodecError> {
    let mut value = 0u32;
    let mut shift = 0;
    loop {
        let Some(&byte) = bytes.get(*cursor) else {
            return Err(CodecError::Truncated {
                needed: *cursor + 1,
                available: bytes.len(),
            });
        };
        *cursor += 1;
        if shift > 28 {
            return Err(CodecError::Corrupt("varint longer than 5 bytes".into()));
        }
        value |= ((byte & 0x7f) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}
