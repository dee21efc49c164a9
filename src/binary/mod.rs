//! Fixed-width scalar types and the cursor based reader/writer built on them.
//!
//! Every value is moved through `zerocopy`'s byte-order aware wrappers, so the
//! same [PrimitiveType] can be read or written in either endianness.

use core::fmt::{self, Display};
use std::io;

use bytes::BufMut;
use serde_json::Value;
use zerocopy::{
    byteorder::{ByteOrder, F32, F64, I16, I32, I64, U16, U32, U64},
    FromBytes, IntoBytes,
};

use crate::error::SchemaUsageError;

mod reader;
mod writer;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    #[allow(dead_code)]
    Little,
    #[default]
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PrimitiveType {
    U8 = 0,
    I8 = 1,
    U16 = 2,
    I16 = 3,
    U32 = 4,
    I32 = 5,
    U64 = 6,
    I64 = 7,
    F32 = 8,
    F64 = 9,
}

/// Rejection of a document value that cannot be encoded as a given type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("{ty} must be an integer within <{min},{max}>")]
    OutOfRange {
        ty: PrimitiveType,
        min: i128,
        max: i128,
    },
    #[error("invalid {ty} value")]
    InvalidFloat { ty: PrimitiveType },
}

/// A value that passed [PrimitiveType::check].
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scalar {
    Int(i128),
    Float(f64),
}

impl PrimitiveType {
    pub const fn width(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Inclusive range of an integer type, [None] for floats.
    pub const fn range(self) -> Option<(i128, i128)> {
        match self {
            Self::U8 => Some((0, u8::MAX as i128)),
            Self::I8 => Some((i8::MIN as i128, i8::MAX as i128)),
            Self::U16 => Some((0, u16::MAX as i128)),
            Self::I16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Self::U32 => Some((0, u32::MAX as i128)),
            Self::I32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Self::U64 => Some((0, u64::MAX as i128)),
            Self::I64 => Some((i64::MIN as i128, i64::MAX as i128)),
            Self::F32 | Self::F64 => None,
        }
    }

    /// Value written for a field the document leaves out.
    pub fn zero(self) -> Value {
        if self.is_float() {
            Value::from(0.0)
        } else {
            Value::from(0)
        }
    }

    pub fn validate(self, value: &Value) -> Result<(), ValueError> {
        self.check(value).map(|_| ())
    }

    fn check(self, value: &Value) -> Result<Scalar, ValueError> {
        match self.range() {
            Some((min, max)) => as_integer(value)
                .filter(|n| (min..=max).contains(n))
                .map(Scalar::Int)
                .ok_or(ValueError::OutOfRange { ty: self, min, max }),
            None => value
                .as_f64()
                .filter(|f| !f.is_nan())
                .map(Scalar::Float)
                .ok_or(ValueError::InvalidFloat { ty: self }),
        }
    }

    /// Appends `value` to `out`, failing without writing if the value does not fit.
    pub fn encode<O: ByteOrder>(self, value: &Value, out: &mut impl BufMut) -> Result<(), ValueError> {
        let (n, f) = match self.check(value)? {
            Scalar::Int(n) => (n, 0.0),
            Scalar::Float(f) => (0, f),
        };

        match self {
            Self::U8 => out.put_u8(n as u8),
            Self::I8 => out.put_i8(n as i8),
            Self::U16 => out.put_slice(U16::<O>::new(n as u16).as_bytes()),
            Self::I16 => out.put_slice(I16::<O>::new(n as i16).as_bytes()),
            Self::U32 => out.put_slice(U32::<O>::new(n as u32).as_bytes()),
            Self::I32 => out.put_slice(I32::<O>::new(n as i32).as_bytes()),
            Self::U64 => out.put_slice(U64::<O>::new(n as u64).as_bytes()),
            Self::I64 => out.put_slice(I64::<O>::new(n as i64).as_bytes()),
            Self::F32 => out.put_slice(F32::<O>::new(f as f32).as_bytes()),
            Self::F64 => out.put_slice(F64::<O>::new(f).as_bytes()),
        }

        Ok(())
    }

    /// Decodes the first [PrimitiveType::width] bytes of `bytes`.
    ///
    /// Non-finite floats have no document representation and decode to `null`.
    pub fn decode<O: ByteOrder>(self, bytes: &[u8]) -> io::Result<Value> {
        let value = match self {
            Self::U8 => Value::from(prefix::<u8>(bytes)?),
            Self::I8 => Value::from(prefix::<i8>(bytes)?),
            Self::U16 => Value::from(prefix::<U16<O>>(bytes)?.get()),
            Self::I16 => Value::from(prefix::<I16<O>>(bytes)?.get()),
            Self::U32 => Value::from(prefix::<U32<O>>(bytes)?.get()),
            Self::I32 => Value::from(prefix::<I32<O>>(bytes)?.get()),
            Self::U64 => Value::from(prefix::<U64<O>>(bytes)?.get()),
            Self::I64 => Value::from(prefix::<I64<O>>(bytes)?.get()),
            Self::F32 => Value::from(prefix::<F32<O>>(bytes)?.get() as f64),
            Self::F64 => Value::from(prefix::<F64<O>>(bytes)?.get()),
        };

        Ok(value)
    }
}

impl TryFrom<u8> for PrimitiveType {
    type Error = SchemaUsageError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Ok(match tag {
            0 => Self::U8,
            1 => Self::I8,
            2 => Self::U16,
            3 => Self::I16,
            4 => Self::U32,
            5 => Self::I32,
            6 => Self::U64,
            7 => Self::I64,
            8 => Self::F32,
            9 => Self::F64,
            _ => return Err(SchemaUsageError::UnknownPrimitive(tag)),
        })
    }
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::U8 => "UINT8",
            Self::I8 => "INT8",
            Self::U16 => "UINT16",
            Self::I16 => "INT16",
            Self::U32 => "UINT32",
            Self::I32 => "INT32",
            Self::U64 => "UINT64",
            Self::I64 => "INT64",
            Self::F32 => "FLOAT32",
            Self::F64 => "FLOAT64",
        })
    }
}

/// Integral document numbers, including floats with no fractional part.
fn as_integer(value: &Value) -> Option<i128> {
    let Value::Number(n) = value else {
        return None;
    };

    if let Some(u) = n.as_u64() {
        Some(u as i128)
    } else if let Some(i) = n.as_i64() {
        Some(i as i128)
    } else {
        n.as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i128)
    }
}

fn prefix<T: FromBytes>(bytes: &[u8]) -> io::Result<T> {
    T::read_from_prefix(bytes)
        .map(|(value, _)| value)
        .map_err(|_| io::Error::from(io::ErrorKind::UnexpectedEof))
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use serde_json::json;
    use zerocopy::byteorder::{BigEndian, LittleEndian};

    use super::{PrimitiveType, ValueError};
    use crate::error::SchemaUsageError;

    #[test]
    fn integer_bounds() {
        assert!(PrimitiveType::I16.validate(&json!(32767)).is_ok());
        assert!(PrimitiveType::I16.validate(&json!(-32768)).is_ok());
        assert_eq!(
            PrimitiveType::I16.validate(&json!(32768)),
            Err(ValueError::OutOfRange {
                ty: PrimitiveType::I16,
                min: -32768,
                max: 32767
            })
        );
        assert!(PrimitiveType::U8.validate(&json!(-1)).is_err());
        assert!(PrimitiveType::U64.validate(&json!(u64::MAX)).is_ok());
        assert!(PrimitiveType::I64.validate(&json!(u64::MAX)).is_err());
        assert!(PrimitiveType::U32.validate(&json!(4.0)).is_ok());
        assert!(PrimitiveType::U32.validate(&json!(4.5)).is_err());
        assert!(PrimitiveType::U32.validate(&json!("4")).is_err());
    }

    #[test]
    fn float_rejects_non_numbers() {
        assert!(PrimitiveType::F64.validate(&json!(1)).is_ok());
        assert!(PrimitiveType::F32.validate(&json!(-0.25)).is_ok());
        assert_eq!(
            PrimitiveType::F64.validate(&json!(null)),
            Err(ValueError::InvalidFloat {
                ty: PrimitiveType::F64
            })
        );
        assert_eq!(
            PrimitiveType::F64.validate(&json!(null)).unwrap_err().to_string(),
            "invalid FLOAT64 value"
        );
    }

    #[test]
    fn encode_respects_byte_order() {
        let mut buf = BytesMut::new();
        PrimitiveType::U16
            .encode::<BigEndian>(&json!(0x1234), &mut buf)
            .unwrap();
        PrimitiveType::U16
            .encode::<LittleEndian>(&json!(0x1234), &mut buf)
            .unwrap();
        PrimitiveType::I8.encode::<BigEndian>(&json!(-2), &mut buf).unwrap();
        assert_eq!(&buf[..], &[0x12, 0x34, 0x34, 0x12, 0xFE]);

        let err = PrimitiveType::U8.encode::<BigEndian>(&json!(256), &mut buf);
        assert!(err.is_err());
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn decode_floats() {
        let bytes = 1.5f64.to_be_bytes();
        assert_eq!(
            PrimitiveType::F64.decode::<BigEndian>(&bytes).unwrap(),
            json!(1.5)
        );

        let bytes = f32::NAN.to_be_bytes();
        assert_eq!(
            PrimitiveType::F32.decode::<BigEndian>(&bytes).unwrap(),
            json!(null)
        );

        assert!(PrimitiveType::F64.decode::<BigEndian>(&[0, 1]).is_err());
    }

    #[test]
    fn tags() {
        assert_eq!(PrimitiveType::try_from(3), Ok(PrimitiveType::I16));
        assert_eq!(
            PrimitiveType::try_from(10),
            Err(SchemaUsageError::UnknownPrimitive(10))
        );
        assert_eq!(PrimitiveType::F32.width(), 4);
        assert_eq!(PrimitiveType::U64.range(), Some((0, u64::MAX as i128)));
        assert_eq!(PrimitiveType::F64.range(), None);
    }
}
