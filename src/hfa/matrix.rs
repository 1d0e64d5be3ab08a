//! Basedata matrix blocks.
//!
//! A basedata (`b`) field stores a self-describing matrix:
//!
//! ```text
//! rows: i32 | columns: i32 | element type: i16 | object type: i16 | elements...
//! ```
//!
//! Elements are stored row-major. Coordinate lists are stored as matrices
//! too, but two generations of the annotation format disagree on which axis
//! holds the x/y pair, so pairing is an explicit [`PairLayout`] choice.

use super::consts::*;
use super::error::{HfaError, HfaResult};
use crate::common::binary::{
    read_f32_le, read_f64_le, read_i8, read_i16_le, read_i32_le, read_u8, read_u16_le,
    read_u32_le,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Element type of a matrix block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl ElementType {
    /// Map an `EPT_*` code. Bit-packed and complex types are not supported.
    pub fn from_code(code: i16) -> HfaResult<Self> {
        match code {
            EPT_U8 => Ok(ElementType::U8),
            EPT_S8 => Ok(ElementType::I8),
            EPT_U16 => Ok(ElementType::U16),
            EPT_S16 => Ok(ElementType::I16),
            EPT_U32 => Ok(ElementType::U32),
            EPT_S32 => Ok(ElementType::I32),
            EPT_F32 => Ok(ElementType::F32),
            EPT_F64 => Ok(ElementType::F64),
            EPT_U1 | EPT_U2 | EPT_U4 | EPT_C64 | EPT_C128 => Err(HfaError::Matrix(format!(
                "element type {} is not supported",
                code
            ))),
            other => Err(HfaError::Matrix(format!("unknown element type {}", other))),
        }
    }

    /// Size of one element in bytes.
    #[inline]
    pub fn size(self) -> usize {
        match self {
            ElementType::U8 | ElementType::I8 => 1,
            ElementType::U16 | ElementType::I16 => 2,
            ElementType::U32 | ElementType::I32 | ElementType::F32 => 4,
            ElementType::F64 => 8,
        }
    }

    fn read(self, data: &[u8], offset: usize) -> HfaResult<f64> {
        let value = match self {
            ElementType::U8 => read_u8(data, offset)? as f64,
            ElementType::I8 => read_i8(data, offset)? as f64,
            ElementType::U16 => read_u16_le(data, offset)? as f64,
            ElementType::I16 => read_i16_le(data, offset)? as f64,
            ElementType::U32 => read_u32_le(data, offset)? as f64,
            ElementType::I32 => read_i32_le(data, offset)? as f64,
            ElementType::F32 => read_f32_le(data, offset)? as f64,
            ElementType::F64 => read_f64_le(data, offset)?,
        };
        Ok(value)
    }
}

/// How consecutive matrix elements pair up into (x, y) points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairLayout {
    /// Rows of pairs (`N x 2`): point `i` is `(v[2i], v[2i+1])`.
    ///
    /// Written by the `Element_2_Eant` generation of the format.
    #[default]
    Interleaved,
    /// Two rows of `N` columns (`2 x N`): point `i` is `(v[i], v[N+i])`.
    ///
    /// Written by the legacy `Element_Eant` generation.
    Planar,
}

impl FromStr for PairLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "interleaved" | "rows" => Ok(PairLayout::Interleaved),
            "planar" | "columns" => Ok(PairLayout::Planar),
            other => Err(format!("unknown pair layout '{}'", other)),
        }
    }
}

/// A decoded basedata matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixBlock {
    rows: usize,
    columns: usize,
    element_type: ElementType,
    values: Vec<f64>,
}

impl MatrixBlock {
    /// A block with no elements (pointer field with a zero count).
    pub fn empty() -> Self {
        Self {
            rows: 0,
            columns: 0,
            element_type: ElementType::F64,
            values: Vec::new(),
        }
    }

    fn header(data: &[u8]) -> HfaResult<(usize, usize, ElementType)> {
        let rows = read_i32_le(data, 0)?;
        let columns = read_i32_le(data, 4)?;
        let element_type = ElementType::from_code(read_i16_le(data, 8)?)?;

        if rows < 0 || columns < 0 {
            return Err(HfaError::Matrix(format!(
                "negative dimensions {}x{}",
                rows, columns
            )));
        }

        Ok((rows as usize, columns as usize, element_type))
    }

    /// Total encoded size of the block starting at `data[0]` (the header).
    pub fn byte_len(data: &[u8]) -> HfaResult<usize> {
        let (rows, columns, element_type) = Self::header(data)?;
        rows.checked_mul(columns)
            .and_then(|n| n.checked_mul(element_type.size()))
            .and_then(|n| n.checked_add(MATRIX_HEADER_SIZE))
            .ok_or_else(|| HfaError::Matrix(format!("{}x{} overflows", rows, columns)))
    }

    /// Decode a block whose header starts at `data[0]`.
    ///
    /// Every element is converted to `f64` in storage order (row-major).
    pub fn read(data: &[u8]) -> HfaResult<Self> {
        let (rows, columns, element_type) = Self::header(data)?;
        let total = Self::byte_len(data)?;
        if total > data.len() {
            return Err(HfaError::Matrix(format!(
                "{}x{} block needs {} bytes, {} available",
                rows,
                columns,
                total,
                data.len()
            )));
        }

        let count = rows * columns;
        let size = element_type.size();
        let values = (0..count)
            .map(|i| element_type.read(data, MATRIX_HEADER_SIZE + i * size))
            .collect::<HfaResult<Vec<_>>>()?;

        Ok(Self {
            rows,
            columns,
            element_type,
            values,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Flat elements in storage order.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Pair the elements into points according to `layout`.
    pub fn pairs(&self, layout: PairLayout) -> HfaResult<Vec<(f64, f64)>> {
        if self.values.len() % 2 != 0 {
            return Err(HfaError::Matrix(format!(
                "{}x{} block has an odd element count and cannot hold (x, y) pairs",
                self.rows, self.columns
            )));
        }

        let n = self.values.len() / 2;
        let pts = match layout {
            PairLayout::Interleaved => self
                .values
                .chunks_exact(2)
                .map(|xy| (xy[0], xy[1]))
                .collect(),
            PairLayout::Planar => (0..n).map(|i| (self.values[i], self.values[n + i])).collect(),
        };
        Ok(pts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(rows: i32, columns: i32, values: &[f64]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&rows.to_le_bytes());
        buf.extend_from_slice(&columns.to_le_bytes());
        buf.extend_from_slice(&EPT_F64.to_le_bytes());
        buf.extend_from_slice(&0i16.to_le_bytes());
        for v in values {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

    #[test]
    fn test_read_f64_block() {
        let data = block(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        let m = MatrixBlock::read(&data).unwrap();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.columns(), 2);
        assert_eq!(m.values(), &[1.0, 0.0, 0.0, 1.0]);
        assert_eq!(MatrixBlock::byte_len(&data).unwrap(), data.len());
    }

    #[test]
    fn test_read_integer_block() {
        let mut data = Vec::new();
        data.extend_from_slice(&1i32.to_le_bytes());
        data.extend_from_slice(&3i32.to_le_bytes());
        data.extend_from_slice(&EPT_S16.to_le_bytes());
        data.extend_from_slice(&0i16.to_le_bytes());
        for v in [-2i16, 7, 300] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let m = MatrixBlock::read(&data).unwrap();
        assert_eq!(m.element_type(), ElementType::I16);
        assert_eq!(m.values(), &[-2.0, 7.0, 300.0]);
    }

    #[test]
    fn test_interleaved_pairs_rows_of_two() {
        // 3 x 2: (0,1) (2,3) (4,5)
        let data = block(3, 2, &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let m = MatrixBlock::read(&data).unwrap();
        assert_eq!(
            m.pairs(PairLayout::Interleaved).unwrap(),
            vec![(0.0, 1.0), (2.0, 3.0), (4.0, 5.0)]
        );
    }

    #[test]
    fn test_planar_pairs_two_rows() {
        // 2 x 3: xs on row 0, ys on row 1
        let data = block(2, 3, &[0.0, 2.0, 4.0, 1.0, 3.0, 5.0]);
        let m = MatrixBlock::read(&data).unwrap();
        assert_eq!(
            m.pairs(PairLayout::Planar).unwrap(),
            vec![(0.0, 1.0), (2.0, 3.0), (4.0, 5.0)]
        );
        // Same bytes under the other convention give different points.
        assert_eq!(
            m.pairs(PairLayout::Interleaved).unwrap()[0],
            (0.0, 2.0)
        );
    }

    #[test]
    fn test_odd_count_cannot_pair() {
        let data = block(1, 3, &[1.0, 2.0, 3.0]);
        let m = MatrixBlock::read(&data).unwrap();
        assert!(m.pairs(PairLayout::Interleaved).is_err());
    }

    #[test]
    fn test_truncated_block() {
        let mut data = block(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        data.truncate(data.len() - 1);
        assert!(matches!(MatrixBlock::read(&data), Err(HfaError::Matrix(_))));
    }

    #[test]
    fn test_rejects_complex_and_negative() {
        let mut data = block(1, 1, &[0.0]);
        data[8..10].copy_from_slice(&EPT_C64.to_le_bytes());
        assert!(MatrixBlock::read(&data).is_err());

        let data = block(-1, 2, &[]);
        assert!(MatrixBlock::read(&data).is_err());
    }

    #[test]
    fn test_pair_layout_from_str() {
        assert_eq!("planar".parse::<PairLayout>().unwrap(), PairLayout::Planar);
        assert_eq!("Rows".parse::<PairLayout>().unwrap(), PairLayout::Interleaved);
        assert!("diagonal".parse::<PairLayout>().is_err());
    }
}
