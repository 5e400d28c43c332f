//! Event table and class-label map.
//!
//! The event table has MNE's `events` layout: one row per trial,
//! `[onset_sample, 0, class_code]`. The middle column is the "previous event
//! id" slot MNE reserves; it is always zero here.
use ndarray::{Array2, ArrayView1, Axis};

use crate::error::{Error, Result};

/// Event code of the "right hand" motor-imagery class.
pub const RIGHT: i64 = 1;
/// Event code of the "foot" motor-imagery class.
pub const FOOT: i64 = 2;

// ── EventId ───────────────────────────────────────────────────────────────

/// Ordered mapping from class name to integer event code (MNE's `event_id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventId {
    entries: Vec<(String, i64)>,
}

impl EventId {
    pub fn new<S: Into<String>>(entries: impl IntoIterator<Item = (S, i64)>) -> Self {
        Self {
            entries: entries.into_iter().map(|(n, c)| (n.into(), c)).collect(),
        }
    }

    /// `{"right": 1, "foot": 2}`.
    pub fn motor_imagery() -> Self {
        Self::new([("right", RIGHT), ("foot", FOOT)])
    }

    pub fn code(&self, name: &str) -> Option<i64> {
        self.entries.iter().find(|(n, _)| n == name).map(|&(_, c)| c)
    }

    pub fn name(&self, code: i64) -> Option<&str> {
        self.entries.iter().find(|&&(_, c)| c == code).map(|(n, _)| n.as_str())
    }

    pub fn contains_code(&self, code: i64) -> bool {
        self.entries.iter().any(|&(_, c)| c == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::motor_imagery()
    }
}

// ── EventTable ────────────────────────────────────────────────────────────

/// `[N, 3]` event table: onset sample, placeholder zero, class code.
///
/// Row order is the order the onsets were stored in; rows are not re-sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTable {
    table: Array2<i64>,
}

impl EventTable {
    /// Wrap an existing `[N, 3]` array.
    pub fn from_array(table: Array2<i64>) -> Result<Self> {
        if table.ncols() != 3 {
            return Err(Error::Shape(format!(
                "event table must have 3 columns, got {:?}",
                table.dim()
            )));
        }
        Ok(Self { table })
    }

    pub fn empty() -> Self {
        Self { table: Array2::zeros((0, 3)) }
    }

    pub fn len(&self) -> usize {
        self.table.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.table.nrows() == 0
    }

    /// Column 0: onset sample indices.
    pub fn onsets(&self) -> ArrayView1<'_, i64> {
        self.table.column(0)
    }

    /// Column 2: class codes.
    pub fn labels(&self) -> ArrayView1<'_, i64> {
        self.table.column(2)
    }

    pub fn as_array(&self) -> &Array2<i64> {
        &self.table
    }

    pub fn into_array(self) -> Array2<i64> {
        self.table
    }

    /// Rows at `indices`, in the order given.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self { table: self.table.select(Axis(0), indices) }
    }

    /// Number of rows carrying `code`.
    pub fn count(&self, code: i64) -> usize {
        self.labels().iter().filter(|&&c| c == code).count()
    }
}

// ── Builder ───────────────────────────────────────────────────────────────

/// Stack labeled onsets and class codes into an [`EventTable`].
///
/// Column 0 = `labeled_positions`, column 1 = 0, column 2 = `class_labels`,
/// both inputs kept in order.
///
/// # Errors
///
/// [`Error::LengthMismatch`] when the two slices differ in length.
///
/// # Examples
///
/// ```
/// use mieeg::events::create_events_array;
///
/// let ev = create_events_array(&[5, 40], &[1, 2]).unwrap();
/// assert_eq!(ev.as_array().row(1).to_vec(), vec![40, 0, 2]);
/// ```
pub fn create_events_array(labeled_positions: &[i64], class_labels: &[i64]) -> Result<EventTable> {
    if labeled_positions.len() != class_labels.len() {
        return Err(Error::LengthMismatch {
            positions: labeled_positions.len(),
            labels: class_labels.len(),
        });
    }
    let n = class_labels.len();
    let mut table = Array2::<i64>::zeros((n, 3));
    for (i, (&pos, &label)) in labeled_positions.iter().zip(class_labels).enumerate() {
        table[[i, 0]] = pos;
        table[[i, 2]] = label;
    }
    Ok(EventTable { table })
}
