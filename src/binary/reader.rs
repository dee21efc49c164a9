use std::{
    fs::File,
    io::{BufReader, Read, Seek, SeekFrom},
    path::Path,
};

use serde_json::Value;
use zerocopy::byteorder::{BigEndian, LittleEndian};

use super::{Endianness, PrimitiveType};
use crate::error::{Result, SchemaUsageError};

/// Cursor based primitive reader.
///
/// Reads start at the cursor. The stream is only sought when its own position
/// is unknown or differs from the cursor, so a buffered stream keeps its buffer
/// across sequential reads.
#[derive(Debug)]
pub struct BinaryReader<R = BufReader<File>> {
    stream: Option<R>,
    pos: u64,
    /// Position of `stream` after the last read, if known.
    stream_pos: Option<u64>,
    endianness: Endianness,
}

impl<R> BinaryReader<R> {
    /// Reader without a stream. Reads fail until one is attached.
    pub fn new(endianness: Endianness) -> Self {
        Self {
            stream: None,
            pos: 0,
            stream_pos: None,
            endianness,
        }
    }

    pub fn from_stream(stream: R, endianness: Endianness) -> Self {
        Self {
            stream: Some(stream),
            pos: 0,
            stream_pos: None,
            endianness,
        }
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Releases the stream; later reads fail with [SchemaUsageError::NoStream].
    pub fn close(&mut self) -> Option<R> {
        self.stream.take()
    }
}

impl BinaryReader<BufReader<File>> {
    /// Opens `path` and rewinds the cursor.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::open(path.as_ref())?;
        *self = Self::from_stream(BufReader::new(file), self.endianness);
        Ok(())
    }
}

impl<R: Read + Seek> BinaryReader<R> {
    pub fn read(&mut self, ty: PrimitiveType) -> Result<Value> {
        let stream = self.stream.as_mut().ok_or(SchemaUsageError::NoStream)?;

        let mut buf = [0u8; 8];
        let buf = &mut buf[..ty.width()];
        if self.stream_pos.take() != Some(self.pos) {
            stream.seek(SeekFrom::Start(self.pos))?;
        }
        stream.read_exact(buf)?;
        self.pos += buf.len() as u64;
        self.stream_pos = Some(self.pos);

        let value = match self.endianness {
            Endianness::Big => ty.decode::<BigEndian>(buf)?,
            Endianness::Little => ty.decode::<LittleEndian>(buf)?,
        };
        Ok(value)
    }
}
