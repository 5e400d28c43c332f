//! In-memory MATLAB values.
//!
//! Mirrors what `scipy.io.loadmat` hands back: every variable is an array
//! (even scalars are 1×1), struct variables are struct *arrays* whose
//! elements are [`Record`]s, and cell arrays hold further values. Element
//! order is MATLAB's column-major order throughout.
use ndarray::{Array2, ShapeBuilder};

use crate::error::{Error, Result};

use super::constants::*;

// ── Numeric ───────────────────────────────────────────────────────────────

/// Class of a numeric array as saved by MATLAB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericClass {
    Double,
    Single,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
}

impl NumericClass {
    pub fn from_mx(class: u8) -> Option<Self> {
        Some(match class {
            MX_DOUBLE_CLASS => Self::Double,
            MX_SINGLE_CLASS => Self::Single,
            MX_INT8_CLASS   => Self::Int8,
            MX_UINT8_CLASS  => Self::UInt8,
            MX_INT16_CLASS  => Self::Int16,
            MX_UINT16_CLASS => Self::UInt16,
            MX_INT32_CLASS  => Self::Int32,
            MX_UINT32_CLASS => Self::UInt32,
            MX_INT64_CLASS  => Self::Int64,
            MX_UINT64_CLASS => Self::UInt64,
            _ => return None,
        })
    }

    /// MATLAB class name (`class(x)`).
    pub fn name(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Single => "single",
            Self::Int8   => "int8",
            Self::UInt8  => "uint8",
            Self::Int16  => "int16",
            Self::UInt16 => "uint16",
            Self::Int32  => "int32",
            Self::UInt32 => "uint32",
            Self::Int64  => "int64",
            Self::UInt64 => "uint64",
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Self::Double | Self::Single)
    }
}

/// A numeric (or logical) N-d array, values widened to `f64`.
///
/// 64-bit integers beyond 2⁵³ lose precision in the widening.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    pub class:   NumericClass,
    pub dims:    Vec<usize>,
    /// Real part, column-major.
    pub real:    Vec<f64>,
    /// Imaginary part for complex arrays.
    pub imag:    Option<Vec<f64>>,
    pub logical: bool,
}

impl NumericArray {
    /// A `0×0` double, the value of an empty `[]`.
    pub fn empty() -> Self {
        Self {
            class: NumericClass::Double,
            dims: vec![0, 0],
            real: Vec::new(),
            imag: None,
            logical: false,
        }
    }

    pub fn numel(&self) -> usize {
        numel(&self.dims)
    }

    pub fn nrows(&self) -> usize {
        self.dims.first().copied().unwrap_or(0)
    }

    /// Columns, folding any trailing dimensions (MATLAB `size(x, 2:end)`).
    pub fn ncols(&self) -> usize {
        trailing(&self.dims)
    }

    /// Element at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        linear_index(&self.dims, row, col).and_then(|i| self.real.get(i).copied())
    }

    /// The single value of a 1×1 array.
    pub fn scalar(&self) -> Option<f64> {
        (self.numel() == 1).then(|| self.real[0])
    }

    /// Values of a row or column vector (`x[0]` / `x[:, 0]` in scipy terms).
    ///
    /// Returns `None` for a true matrix (both dimensions > 1).
    pub fn as_vector(&self) -> Option<&[f64]> {
        let non_singleton = self.dims.iter().filter(|&&d| d != 1).count();
        (non_singleton <= 1).then_some(self.real.as_slice())
    }

    /// Copy into a `[rows, cols]` array in logical (row, col) order.
    pub fn to_array2(&self) -> Array2<f64> {
        let shape = (self.nrows(), self.ncols()).f();
        // dims and real are checked against each other when parsed.
        Array2::from_shape_vec(shape, self.real.clone())
            .unwrap_or_else(|_| Array2::zeros((0, 0)))
    }
}

// ── Char ──────────────────────────────────────────────────────────────────

/// A MATLAB character array.
#[derive(Debug, Clone, PartialEq)]
pub struct CharArray {
    pub dims: Vec<usize>,
    /// One `char` per code unit, column-major.
    pub data: Vec<char>,
}

impl CharArray {
    /// Each row as a `String` (a `1×N` char array has exactly one row).
    pub fn rows(&self) -> Vec<String> {
        let n_rows = self.dims.first().copied().unwrap_or(0);
        let n_cols = trailing(&self.dims);
        if self.data.len() != n_rows * n_cols {
            // Multi-byte UTF-8 storage: the unit count no longer matches dims.
            return vec![self.data.iter().collect()];
        }
        (0..n_rows)
            .map(|r| (0..n_cols).map(|c| self.data[r + c * n_rows]).collect())
            .collect()
    }

    /// The text of a single-row char array; rows are concatenated otherwise.
    pub fn as_string(&self) -> String {
        self.rows().concat()
    }
}

// ── Cell ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct CellArray {
    pub dims:  Vec<usize>,
    /// Cell contents, column-major.
    pub cells: Vec<MatValue>,
}

impl CellArray {
    pub fn get(&self, row: usize, col: usize) -> Option<&MatValue> {
        linear_index(&self.dims, row, col).and_then(|i| self.cells.get(i))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MatValue> {
        self.cells.iter()
    }
}

// ── Struct ────────────────────────────────────────────────────────────────

/// One element of a struct array: ordered `(field, value)` pairs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, MatValue)>,
}

impl Record {
    pub fn new(fields: Vec<(String, MatValue)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&MatValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Like [`get`](Self::get) but a missing field is an error.
    pub fn field(&self, name: &str) -> Result<&MatValue> {
        self.get(name).ok_or_else(|| Error::missing(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructArray {
    pub dims:        Vec<usize>,
    pub field_names: Vec<String>,
    /// Records, column-major.
    pub elements:    Vec<Record>,
}

impl StructArray {
    /// Record at `(row, col)`; `at(0, 0)` unwraps a scalar struct.
    pub fn at(&self, row: usize, col: usize) -> Option<&Record> {
        linear_index(&self.dims, row, col).and_then(|i| self.elements.get(i))
    }
}

// ── Value ─────────────────────────────────────────────────────────────────

/// Any MATLAB value this reader understands.
#[derive(Debug, Clone, PartialEq)]
pub enum MatValue {
    Numeric(NumericArray),
    Char(CharArray),
    Cell(CellArray),
    Struct(StructArray),
    /// Sparse, object and function-handle arrays: recognised but not decoded.
    Opaque { class: u8, dims: Vec<usize> },
}

impl MatValue {
    pub fn dims(&self) -> &[usize] {
        match self {
            MatValue::Numeric(a) => &a.dims,
            MatValue::Char(a) => &a.dims,
            MatValue::Cell(a) => &a.dims,
            MatValue::Struct(a) => &a.dims,
            MatValue::Opaque { dims, .. } => dims,
        }
    }

    /// Short description used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            MatValue::Numeric(a) if a.logical => "logical",
            MatValue::Numeric(a) => a.class.name(),
            MatValue::Char(_) => "char",
            MatValue::Cell(_) => "cell",
            MatValue::Struct(_) => "struct",
            MatValue::Opaque { .. } => "opaque",
        }
    }

    pub fn as_numeric(&self) -> Option<&NumericArray> {
        match self {
            MatValue::Numeric(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<&CharArray> {
        match self {
            MatValue::Char(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_cell(&self) -> Option<&CellArray> {
        match self {
            MatValue::Cell(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructArray> {
        match self {
            MatValue::Struct(a) => Some(a),
            _ => None,
        }
    }

    /// Numeric view or a format error naming `what`.
    pub fn expect_numeric(&self, what: &str) -> Result<&NumericArray> {
        self.as_numeric().ok_or_else(|| self.wrong_kind(what, "numeric"))
    }

    pub fn expect_cell(&self, what: &str) -> Result<&CellArray> {
        self.as_cell().ok_or_else(|| self.wrong_kind(what, "cell"))
    }

    /// Unwrap a scalar struct to its single record (`x[0, 0]` in scipy terms).
    pub fn expect_record(&self, what: &str) -> Result<&Record> {
        self.as_struct()
            .and_then(|s| s.at(0, 0))
            .ok_or_else(|| self.wrong_kind(what, "1x1 struct"))
    }

    fn wrong_kind(&self, what: &str, expected: &str) -> Error {
        Error::format(format!(
            "`{what}` should be {expected}, found {} of size {:?}",
            self.kind(),
            self.dims()
        ))
    }
}

// ── Index helpers ─────────────────────────────────────────────────────────

/// Element count, `None` when the product overflows `usize`.
pub(crate) fn checked_numel(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Element count, saturating at `usize::MAX`.
pub(crate) fn numel(dims: &[usize]) -> usize {
    checked_numel(dims).unwrap_or(usize::MAX)
}

fn trailing(dims: &[usize]) -> usize {
    if dims.len() < 2 { 0 } else { numel(&dims[1..]) }
}

fn linear_index(dims: &[usize], row: usize, col: usize) -> Option<usize> {
    let n_rows = dims.first().copied()?;
    (row < n_rows && col < trailing(dims)).then(|| row + col * n_rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: usize, cols: usize, real: Vec<f64>) -> NumericArray {
        NumericArray {
            class: NumericClass::Double,
            dims: vec![rows, cols],
            real,
            imag: None,
            logical: false,
        }
    }

    #[test]
    fn column_major_indexing() {
        // [[1, 3, 5], [2, 4, 6]] stored column-major.
        let m = matrix(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(m.get(0, 2), Some(5.0));
        assert_eq!(m.get(1, 0), Some(2.0));
        assert_eq!(m.get(2, 0), None);
        let a = m.to_array2();
        assert_eq!(a.dim(), (2, 3));
        assert_eq!(a[[0, 1]], 3.0);
        assert_eq!(a[[1, 2]], 6.0);
    }

    #[test]
    fn vector_view() {
        assert!(matrix(1, 4, vec![0.0; 4]).as_vector().is_some());
        assert!(matrix(4, 1, vec![0.0; 4]).as_vector().is_some());
        assert!(matrix(2, 2, vec![0.0; 4]).as_vector().is_none());
    }

    #[test]
    fn char_rows() {
        // ["ab"; "cd"] column-major: a c b d
        let c = CharArray { dims: vec![2, 2], data: vec!['a', 'c', 'b', 'd'] };
        assert_eq!(c.rows(), vec!["ab".to_string(), "cd".to_string()]);
    }

    #[test]
    fn record_missing_field() {
        let r = Record::new(vec![("fs".into(), MatValue::Numeric(matrix(1, 1, vec![100.0])))]);
        assert!(r.get("fs").is_some());
        assert!(matches!(r.field("clab"), Err(Error::MissingField(f)) if f == "clab"));
    }
}
