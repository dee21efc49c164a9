//! Ordered field lists that drive validation, reading and writing of records.
//!
//! A [StructSchema] is the single source of the wire order: [StructSchema::read_from]
//! and [StructSchema::write_to] walk the same field list, so a record written from a
//! validated document reads back field for field.

use std::io::{Read, Seek};

use serde_json::{Map, Value};

use crate::{
    binary::{BinaryReader, BinaryWriter, PrimitiveType},
    error::Result,
};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Primitive(PrimitiveType),
    #[allow(dead_code)]
    Nested(StructSchema),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    /// Number of consecutive values, always at least 1. Above 1 the document holds an array.
    pub repeat: usize,
    /// Occupies its bytes on the wire but never appears in a document. Written as zero.
    pub reserved: bool,
}

impl FieldSpec {
    pub fn primitive(name: impl Into<String>, ty: PrimitiveType) -> Self {
        Self::new(name, FieldKind::Primitive(ty))
    }

    #[allow(dead_code)]
    pub fn nested(name: impl Into<String>, schema: StructSchema) -> Self {
        Self::new(name, FieldKind::Nested(schema))
    }

    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            repeat: 1,
            reserved: false,
        }
    }

    #[allow(dead_code)]
    pub fn repeated(mut self, count: usize) -> Self {
        assert!(count >= 1, "Field {} must repeat at least once", self.name);
        self.repeat = count;
        self
    }

    pub fn reserved(mut self) -> Self {
        self.reserved = true;
        self
    }

    pub fn byte_size(&self) -> usize {
        let one = match &self.kind {
            FieldKind::Primitive(ty) => ty.width(),
            FieldKind::Nested(schema) => schema.byte_size(),
        };
        one * self.repeat
    }

    fn validate_one(&self, value: &Value) -> Result<(), ValidationError> {
        match &self.kind {
            FieldKind::Primitive(ty) => ty
                .validate(value)
                .map_err(|e| ValidationError::new(&self.name, e.to_string())),
            FieldKind::Nested(schema) => schema
                .validate(value)
                .map_err(|e| e.nested_in(&self.name)),
        }
    }

    fn read_one<R: Read + Seek>(&self, reader: &mut BinaryReader<R>) -> Result<Value> {
        match &self.kind {
            FieldKind::Primitive(ty) => reader.read(*ty),
            FieldKind::Nested(schema) => schema.read_from(reader),
        }
    }

    fn write_one(&self, writer: &mut BinaryWriter, value: Option<&Value>) -> Result<(), ValidationError> {
        match &self.kind {
            FieldKind::Primitive(ty) => writer
                .write(*ty, value.unwrap_or(&ty.zero()))
                .map_err(|e| ValidationError::new(&self.name, e.to_string())),
            FieldKind::Nested(schema) => schema
                .write_to(writer, value.unwrap_or(&Value::Null))
                .map_err(|e| e.nested_in(&self.name)),
        }
    }
}

/// First problem found in a document, named by field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}field {field}: {message}", section_prefix(.section))]
pub struct ValidationError {
    /// Part of the document the error belongs to, e.g. `sht header`.
    pub section: Option<String>,
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            section: None,
            field: field.into(),
            message: message.into(),
        }
    }

    /// Tags the error with `section` unless a more specific one is already set.
    pub fn in_section(mut self, section: impl Into<String>) -> Self {
        self.section.get_or_insert_with(|| section.into());
        self
    }

    fn nested_in(mut self, parent: &str) -> Self {
        self.field = format!("{parent}.{}", self.field);
        self
    }

    pub fn at_index(mut self, index: usize) -> Self {
        self.message = format!("{} (at index {index})", self.message);
        self
    }
}

fn section_prefix(section: &Option<String>) -> String {
    section
        .as_ref()
        .map(|section| format!("error in {section}: "))
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructSchema {
    fields: Vec<FieldSpec>,
}

impl StructSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Wire size of one record.
    pub fn byte_size(&self) -> usize {
        self.fields.iter().map(FieldSpec::byte_size).sum()
    }

    /// Checks `document` against every non-reserved field, in schema order.
    pub fn validate(&self, document: &Value) -> Result<(), ValidationError> {
        let Value::Object(map) = document else {
            return Err(ValidationError::new(
                "(none)",
                "passed value is not a struct at all",
            ));
        };

        for field in self.fields.iter().filter(|f| !f.reserved) {
            let Some(value) = map.get(&field.name) else {
                return Err(ValidationError::new(&field.name, "value is not defined"));
            };

            if field.repeat == 1 {
                field.validate_one(value)?;
                continue;
            }

            let Value::Array(items) = value else {
                return Err(ValidationError::new(&field.name, "array expected"));
            };
            if items.len() != field.repeat {
                return Err(ValidationError::new(
                    &field.name,
                    format!("expected {} elements, found {}", field.repeat, items.len()),
                ));
            }
            for (i, item) in items.iter().enumerate() {
                field.validate_one(item).map_err(|e| e.at_index(i))?;
            }
        }

        Ok(())
    }

    /// Reads one record. Reserved fields are consumed but left out of the result.
    pub fn read_from<R: Read + Seek>(&self, reader: &mut BinaryReader<R>) -> Result<Value> {
        let mut record = Map::new();

        for field in &self.fields {
            let value = if field.repeat == 1 {
                field.read_one(reader)?
            } else {
                (0..field.repeat)
                    .map(|_| field.read_one(reader))
                    .collect::<Result<Vec<_>>>()?
                    .into()
            };

            if !field.reserved {
                record.insert(field.name.clone(), value);
            }
        }

        Ok(Value::Object(record))
    }

    /// Writes one record in the same order as [StructSchema::read_from].
    ///
    /// Expects a validated document. Absent values, and every reserved field, are
    /// written as zero; a value that does not fit its type still fails.
    pub fn write_to(&self, writer: &mut BinaryWriter, document: &Value) -> Result<(), ValidationError> {
        for field in &self.fields {
            let value = document
                .get(&field.name)
                .filter(|v| !v.is_null() && !field.reserved);

            if field.repeat == 1 {
                field.write_one(writer, value)?;
            } else {
                for i in 0..field.repeat {
                    field
                        .write_one(writer, value.and_then(|v| v.get(i)).filter(|v| !v.is_null()))
                        .map_err(|e| e.at_index(i))?;
                }
            }
        }

        Ok(())
    }
}
