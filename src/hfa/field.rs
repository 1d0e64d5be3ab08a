//! Field decoding over raw entry data.
//!
//! Fields of a record are laid out back to back in declaration order, and
//! most of them have a per-instance width (pointer fields carry their own
//! count, basedata carries its own dimensions). Reaching field `i` therefore
//! means consuming every field before it; [`FieldCursor`] owns that
//! bookkeeping.

use super::consts::{MAX_TYPE_NESTING, POINTER_PREFIX_SIZE};
use super::dictionary::{Dictionary, HfaField, HfaType, ItemType};
use super::error::{HfaError, HfaResult};
use super::matrix::MatrixBlock;
use crate::common::binary::{
    BinaryError, parse_windows1252_string, read_f32_le, read_f64_le, read_i16_le, read_i32_le,
    read_u8, read_u16_le, read_u32_le,
};

/// A decoded scalar field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Double(f64),
    Text(String),
    Enum { value: u16, name: Option<String> },
}

impl FieldValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            FieldValue::Double(v) => Some(*v as i64),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Enum { value, .. } => Some(*value as i64),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Double(v) => Some(*v),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Enum { value, .. } => Some(*value as f64),
        }
    }

    pub fn into_string(self) -> String {
        match self {
            FieldValue::Int(v) => v.to_string(),
            FieldValue::Double(v) => v.to_string(),
            FieldValue::Text(s) => s,
            FieldValue::Enum { value, name } => name.unwrap_or_else(|| value.to_string()),
        }
    }
}

/// One step of a field path: `name`, `name[i]`, optionally followed by `.rest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldPath<'p> {
    pub name: &'p str,
    pub index: Option<usize>,
    pub rest: Option<&'p str>,
}

impl<'p> FieldPath<'p> {
    pub fn parse(path: &'p str) -> HfaResult<Self> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };

        let (name, index) = match head.find('[') {
            Some(open) => {
                let inner = head[open + 1..].strip_suffix(']').ok_or_else(|| {
                    HfaError::InvalidFormat(format!("unterminated index in path '{}'", path))
                })?;
                let index = inner.parse::<usize>().map_err(|_| {
                    HfaError::InvalidFormat(format!("invalid index in path '{}'", path))
                })?;
                (&head[..open], Some(index))
            },
            None => (head, None),
        };

        if name.is_empty() {
            return Err(HfaError::InvalidFormat(format!("empty field name in '{}'", path)));
        }

        Ok(Self { name, index, rest })
    }
}

fn insufficient(expected: usize, available: usize) -> HfaError {
    HfaError::Binary(BinaryError::InsufficientData {
        expected,
        available,
    })
}

#[inline]
fn tail(data: &[u8], offset: usize) -> HfaResult<&[u8]> {
    data.get(offset..)
        .ok_or_else(|| insufficient(offset, data.len()))
}

impl HfaField {
    /// Number of items in this instance and the offset of the first item.
    fn instance_layout(&self, data: &[u8]) -> HfaResult<(usize, usize)> {
        if self.pointer {
            Ok((read_u32_le(data, 0)? as usize, POINTER_PREFIX_SIZE))
        } else {
            Ok((self.item_count, 0))
        }
    }

    /// Number of items stored in the instance starting at `data[0]`.
    pub fn instance_count(&self, data: &[u8]) -> HfaResult<usize> {
        self.instance_layout(data).map(|(count, _)| count)
    }

    /// Bytes occupied by the instance of this field starting at `data[0]`.
    pub fn instance_bytes(&self, dict: &Dictionary, data: &[u8]) -> HfaResult<usize> {
        self.instance_bytes_at(dict, data, 0)
    }

    fn instance_bytes_at(&self, dict: &Dictionary, data: &[u8], depth: usize) -> HfaResult<usize> {
        let (count, start) = self.instance_layout(data)?;

        match self.item_type {
            ItemType::BaseData => {
                if count == 0 {
                    return Ok(start);
                }
                Ok(start + MatrixBlock::byte_len(tail(data, start)?)?)
            },
            ItemType::Object => {
                let ty = self.object_def(dict)?;
                let mut offset = start;
                for _ in 0..count {
                    let width = ty.instance_bytes_at(dict, tail(data, offset)?, depth + 1)?;
                    if width == 0 {
                        break;
                    }
                    offset += width;
                }
                Ok(offset)
            },
            ItemType::Other(code) => Err(HfaError::UnsupportedItemType(code as char)),
            scalar => {
                let size = scalar.size().unwrap_or(0);
                count
                    .checked_mul(size)
                    .and_then(|n| n.checked_add(start))
                    .ok_or_else(|| insufficient(usize::MAX, data.len()))
            },
        }
    }

    fn object_def<'d>(&self, dict: &'d Dictionary) -> HfaResult<&'d HfaType> {
        let name = self.object_type.as_deref().ok_or_else(|| {
            HfaError::Dictionary(format!("object field '{}' has no type", self.name))
        })?;
        dict.require(name)
    }

    /// Byte range of object instance `index` within this field's data.
    fn object_instance<'d>(
        &self,
        dict: &Dictionary,
        data: &'d [u8],
        index: usize,
        depth: usize,
    ) -> HfaResult<Option<&'d [u8]>> {
        let (count, start) = self.instance_layout(data)?;
        if index >= count {
            return Ok(None);
        }
        let ty = self.object_def(dict)?;
        let mut offset = start;
        for _ in 0..index {
            offset += ty.instance_bytes_at(dict, tail(data, offset)?, depth + 1)?;
        }
        let rest = tail(data, offset)?;
        let width = ty.instance_bytes_at(dict, rest, depth + 1)?;
        rest.get(..width)
            .map(Some)
            .ok_or_else(|| insufficient(offset + width, data.len()))
    }

    /// Decode item `index` (or the whole string for character arrays when no
    /// index is given), descending into objects along `rest`.
    pub(crate) fn extract(
        &self,
        dict: &Dictionary,
        data: &[u8],
        index: Option<usize>,
        rest: Option<&str>,
        depth: usize,
    ) -> HfaResult<Option<FieldValue>> {
        if depth > MAX_TYPE_NESTING {
            return Err(HfaError::Dictionary(format!(
                "type nesting deeper than {} at field '{}'",
                MAX_TYPE_NESTING, self.name
            )));
        }

        let (count, start) = self.instance_layout(data)?;

        match self.item_type {
            ItemType::Char | ItemType::UChar if index.is_none() => {
                let end = start.saturating_add(count).min(data.len());
                let bytes = data.get(start..end).unwrap_or(&[]);
                Ok(Some(FieldValue::Text(parse_windows1252_string(bytes))))
            },
            ItemType::Object => {
                let Some(rest) = rest else {
                    return Ok(None);
                };
                match self.object_instance(dict, data, index.unwrap_or(0), depth)? {
                    Some(instance) => self
                        .object_def(dict)?
                        .extract_at(dict, instance, rest, depth + 1),
                    None => Ok(None),
                }
            },
            ItemType::BaseData => {
                if count == 0 {
                    return Ok(None);
                }
                let matrix = MatrixBlock::read(tail(data, start)?)?;
                Ok(matrix
                    .values()
                    .get(index.unwrap_or(0))
                    .map(|&v| FieldValue::Double(v)))
            },
            ItemType::Complex64 | ItemType::Complex128 | ItemType::Other(_) => {
                Err(HfaError::UnsupportedItemType(self.item_type.code()))
            },
            scalar => {
                let i = index.unwrap_or(0);
                if i >= count {
                    return Ok(None);
                }
                let size = scalar.size().unwrap_or(0);
                let at = start + i * size;
                let value = match scalar {
                    ItemType::Char | ItemType::UChar => FieldValue::Int(read_u8(data, at)? as i64),
                    ItemType::Enum => {
                        let value = read_u16_le(data, at)?;
                        let name = self.enum_names.get(value as usize).cloned();
                        FieldValue::Enum { value, name }
                    },
                    ItemType::U16 => FieldValue::Int(read_u16_le(data, at)? as i64),
                    ItemType::I16 => FieldValue::Int(read_i16_le(data, at)? as i64),
                    ItemType::Time | ItemType::U32 => FieldValue::Int(read_u32_le(data, at)? as i64),
                    ItemType::I32 => FieldValue::Int(read_i32_le(data, at)? as i64),
                    ItemType::F32 => FieldValue::Double(read_f32_le(data, at)? as f64),
                    _ => FieldValue::Double(read_f64_le(data, at)?),
                };
                Ok(Some(value))
            },
        }
    }
}

impl HfaType {
    /// Bytes occupied by one instance of this type starting at `data[0]`.
    pub fn instance_bytes(&self, dict: &Dictionary, data: &[u8]) -> HfaResult<usize> {
        self.instance_bytes_at(dict, data, 0)
    }

    fn instance_bytes_at(&self, dict: &Dictionary, data: &[u8], depth: usize) -> HfaResult<usize> {
        if depth > MAX_TYPE_NESTING {
            return Err(HfaError::Dictionary(format!(
                "type nesting deeper than {} in '{}'",
                MAX_TYPE_NESTING, self.name
            )));
        }
        let mut offset = 0;
        for field in &self.fields {
            offset += field.instance_bytes_at(dict, tail(data, offset)?, depth)?;
        }
        Ok(offset)
    }

    /// Resolve a field path such as `center.x`, `proParams[3]` or
    /// `text.string` against an instance of this type.
    ///
    /// Returns `Ok(None)` when a path component names no field of the type.
    pub fn extract(
        &self,
        dict: &Dictionary,
        data: &[u8],
        path: &str,
    ) -> HfaResult<Option<FieldValue>> {
        self.extract_at(dict, data, path, 0)
    }

    fn extract_at(
        &self,
        dict: &Dictionary,
        data: &[u8],
        path: &str,
        depth: usize,
    ) -> HfaResult<Option<FieldValue>> {
        let step = FieldPath::parse(path)?;
        let mut cursor = FieldCursor::new(dict, self, data);
        match cursor.seek(step.name)? {
            Some(span) => span
                .field
                .extract(dict, span.data, step.index, step.rest, depth),
            None => Ok(None),
        }
    }
}

/// Position within one record instance, advanced field by field.
#[derive(Debug, Clone)]
pub struct FieldCursor<'a> {
    dict: &'a Dictionary,
    ty: &'a HfaType,
    data: &'a [u8],
    position: usize,
    next_field: usize,
}

impl<'a> FieldCursor<'a> {
    /// Start at the first field of `ty` laid out in `data`.
    pub fn new(dict: &'a Dictionary, ty: &'a HfaType, data: &'a [u8]) -> Self {
        Self {
            dict,
            ty,
            data,
            position: 0,
            next_field: 0,
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    #[inline]
    pub fn type_def(&self) -> &'a HfaType {
        self.ty
    }

    /// The field the next [`advance`](Self::advance) will consume.
    #[inline]
    pub fn peek_field(&self) -> Option<&'a HfaField> {
        self.ty.fields.get(self.next_field)
    }

    /// Consume the next field, returning its span.
    pub fn advance(&mut self) -> HfaResult<Option<FieldSpan<'a>>> {
        let Some(field) = self.ty.fields.get(self.next_field) else {
            return Ok(None);
        };

        let data: &'a [u8] = self.data;
        let rest = tail(data, self.position)?;
        let width = field.instance_bytes(self.dict, rest)?;
        let bytes = rest
            .get(..width)
            .ok_or_else(|| insufficient(self.position + width, data.len()))?;

        let span = FieldSpan {
            dict: self.dict,
            field,
            data: bytes,
            offset: self.position,
        };
        self.position += width;
        self.next_field += 1;
        Ok(Some(span))
    }

    /// Consume fields up to and including `name`.
    ///
    /// Returns `Ok(None)` once the type runs out of fields; the cursor is then
    /// exhausted.
    pub fn seek(&mut self, name: &str) -> HfaResult<Option<FieldSpan<'a>>> {
        while let Some(span) = self.advance()? {
            if span.field.name == name {
                return Ok(Some(span));
            }
        }
        Ok(None)
    }
}

/// The bytes of one consumed field instance.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpan<'a> {
    dict: &'a Dictionary,
    field: &'a HfaField,
    data: &'a [u8],
    offset: usize,
}

impl<'a> FieldSpan<'a> {
    #[inline]
    pub fn field(&self) -> &'a HfaField {
        self.field
    }

    /// Offset of the field within the record instance.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn item_count(&self) -> HfaResult<usize> {
        self.field.instance_count(self.data)
    }

    /// First item, or the whole string for character fields.
    pub fn value(&self) -> HfaResult<Option<FieldValue>> {
        self.field.extract(self.dict, self.data, None, None, 0)
    }

    /// Item `index` of an array field.
    pub fn value_at(&self, index: usize) -> HfaResult<Option<FieldValue>> {
        self.field.extract(self.dict, self.data, Some(index), None, 0)
    }

    /// Cursor over object instance `index` of an object field.
    pub fn object_cursor(&self, index: usize) -> HfaResult<Option<FieldCursor<'a>>> {
        if self.field.item_type != ItemType::Object {
            return Err(HfaError::InvalidFormat(format!(
                "field '{}' is not an object",
                self.field.name
            )));
        }
        let ty = self.field.object_def(self.dict)?;
        Ok(self
            .field
            .object_instance(self.dict, self.data, index, 0)?
            .map(|instance| FieldCursor::new(self.dict, ty, instance)))
    }

    /// Decode a basedata field as a matrix block.
    pub fn matrix(&self) -> HfaResult<MatrixBlock> {
        if self.field.item_type != ItemType::BaseData {
            return Err(HfaError::InvalidFormat(format!(
                "field '{}' is not a matrix",
                self.field.name
            )));
        }
        let (count, start) = self.field.instance_layout(self.data)?;
        if count == 0 {
            return Ok(MatrixBlock::empty());
        }
        MatrixBlock::read(tail(self.data, start)?)
    }
}
