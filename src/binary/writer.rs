use bytes::{Bytes, BytesMut};
use serde_json::Value;
use zerocopy::byteorder::{BigEndian, LittleEndian};

use super::{Endianness, PrimitiveType, ValueError};

/// Growing output buffer with a write cursor at its end.
#[derive(Debug)]
pub struct BinaryWriter {
    buffer: BytesMut,
    endianness: Endianness,
}

impl BinaryWriter {
    pub const GROW_STEP: usize = 1024;
    /// Free space that must remain after every write, enough for the widest primitive.
    const HEADROOM: usize = 8;

    pub fn new(endianness: Endianness) -> Self {
        Self::with_capacity(Self::GROW_STEP, endianness)
    }

    pub fn with_capacity(capacity: usize, endianness: Endianness) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            endianness,
        }
    }

    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    /// Encodes `value` at the cursor. A value that does not fit `ty` leaves the buffer untouched.
    pub fn write(&mut self, ty: PrimitiveType, value: &Value) -> Result<(), ValueError> {
        match self.endianness {
            Endianness::Big => ty.encode::<BigEndian>(value, &mut self.buffer)?,
            Endianness::Little => ty.encode::<LittleEndian>(value, &mut self.buffer)?,
        }

        if self.buffer.capacity() - self.buffer.len() < Self::HEADROOM {
            self.buffer.reserve(Self::GROW_STEP);
        }
        Ok(())
    }

    /// Exactly the bytes written so far.
    pub fn finalize(self) -> Bytes {
        self.buffer.freeze()
    }
}
