//! dBASE III attribute table (.dbf) generation

use super::{AttributeValue, ExportError, ExportResult, FieldType};
use chrono::{Datelike, NaiveDate};

const VERSION: u8 = 0x03;
const HEADER_LEN: usize = 32;
const DESCRIPTOR_LEN: usize = 32;
const HEADER_TERMINATOR: u8 = 0x0D;
const END_OF_FILE: u8 = 0x1A;
const RECORD_ACTIVE: u8 = b' ';
const MAX_NAME_LEN: usize = 10;
const MAX_WIDTH: usize = 254;

/// Column descriptor
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DbfField {
    name: String,
    field_type: FieldType,
    width: usize,
}

impl DbfField {
    fn type_code(&self) -> u8 {
        match self.field_type {
            FieldType::Integer => b'N',
            FieldType::String => b'C',
        }
    }

    fn encode(&self, value: Option<AttributeValue<'_>>, out: &mut Vec<u8>) -> ExportResult<()> {
        let start = out.len();
        match (self.field_type, value) {
            (_, None) => {},
            (FieldType::Integer, Some(AttributeValue::Integer(v))) => {
                let mut buf = itoa::Buffer::new();
                let digits = buf.format(v);
                if digits.len() > self.width {
                    return Err(self.invalid(format!("{} does not fit in {} digits", v, self.width)));
                }
                // Numbers are right-aligned
                out.resize(start + self.width - digits.len(), b' ');
                out.extend_from_slice(digits.as_bytes());
            },
            (FieldType::Integer, Some(AttributeValue::String(_))) => {
                return Err(self.invalid("text value for a numeric field".to_string()));
            },
            (FieldType::String, Some(AttributeValue::Integer(v))) => {
                let mut buf = itoa::Buffer::new();
                out.extend_from_slice(truncate(buf.format(v), self.width).as_bytes());
            },
            (FieldType::String, Some(AttributeValue::String(s))) => {
                out.extend_from_slice(truncate(s, self.width).as_bytes());
            },
        }
        out.resize(start + self.width, b' ');
        Ok(())
    }

    fn invalid(&self, reason: String) -> ExportError {
        ExportError::InvalidField {
            name: self.name.clone(),
            reason,
        }
    }
}

/// Longest prefix of `s` within `max` bytes that ends on a char boundary.
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Attribute table builder for one layer
#[derive(Debug, Clone, Default)]
pub(crate) struct DbfTable {
    fields: Vec<DbfField>,
    /// Encoded records, each prefixed with its deletion flag
    records: Vec<u8>,
    count: usize,
}

impl DbfTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_field(&mut self, name: &str, field_type: FieldType, width: usize) -> ExportResult<()> {
        let invalid = |reason: &str| ExportError::InvalidField {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        if self.count > 0 {
            return Err(invalid("fields must be declared before records"));
        }
        if name.is_empty() || name.len() > MAX_NAME_LEN || !name.is_ascii() {
            return Err(invalid("names are 1 to 10 ASCII characters"));
        }
        if self.fields.iter().any(|f| f.name.eq_ignore_ascii_case(name)) {
            return Err(invalid("duplicate field name"));
        }
        if width == 0 || width > MAX_WIDTH {
            return Err(invalid("width must be between 1 and 254"));
        }
        if self.record_len() + width > u16::MAX as usize {
            return Err(invalid("record length exceeds 65535 bytes"));
        }
        self.fields.push(DbfField {
            name: name.to_string(),
            field_type,
            width,
        });
        Ok(())
    }

    pub(crate) fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Deletion flag plus all column widths.
    pub(crate) fn record_len(&self) -> usize {
        1 + self.fields.iter().map(|f| f.width).sum::<usize>()
    }

    fn header_len(&self) -> usize {
        HEADER_LEN + DESCRIPTOR_LEN * self.fields.len() + 1
    }

    pub(crate) fn len(&self) -> usize {
        self.count
    }

    /// Append one record. The table is unchanged on error.
    pub(crate) fn push(&mut self, attributes: &[(&str, AttributeValue<'_>)]) -> ExportResult<()> {
        if let Some((name, _)) = attributes.iter().find(|(name, _)| !self.has_field(name)) {
            return Err(ExportError::UnknownField(name.to_string()));
        }

        let mut record = Vec::with_capacity(self.record_len());
        record.push(RECORD_ACTIVE);
        for field in &self.fields {
            let value = attributes
                .iter()
                .find(|(name, _)| field.name.eq_ignore_ascii_case(name))
                .map(|(_, v)| *v);
            field.encode(value, &mut record)?;
        }

        self.records.extend_from_slice(&record);
        self.count += 1;
        Ok(())
    }

    /// Generate the complete table stamped with `date`.
    pub(crate) fn generate(&self, date: NaiveDate) -> ExportResult<Vec<u8>> {
        let header_len = self.header_len();
        let count = u32::try_from(self.count).map_err(|_| ExportError::InvalidField {
            name: String::new(),
            reason: "too many records".to_string(),
        })?;
        let header_len16 = u16::try_from(header_len).map_err(|_| ExportError::InvalidField {
            name: String::new(),
            reason: "too many fields".to_string(),
        })?;

        let mut out = Vec::with_capacity(header_len + self.records.len() + 1);

        out.push(VERSION);
        // Last update, years since 1900
        out.push((date.year() - 1900).clamp(0, 255) as u8);
        out.push(date.month() as u8);
        out.push(date.day() as u8);
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&header_len16.to_le_bytes());
        out.extend_from_slice(&(self.record_len() as u16).to_le_bytes());
        out.resize(HEADER_LEN, 0);

        for field in &self.fields {
            let start = out.len();
            out.extend_from_slice(field.name.as_bytes());
            // Name is NUL padded to 11 bytes
            out.resize(start + 11, 0);
            out.push(field.type_code());
            // Field data address (unused)
            out.extend_from_slice(&[0; 4]);
            out.push(field.width as u8);
            // Decimal count
            out.push(0);
            out.resize(start + DESCRIPTOR_LEN, 0);
        }
        out.push(HEADER_TERMINATOR);

        out.extend_from_slice(&self.records);
        out.push(END_OF_FILE);
        Ok(out)
    }
}
