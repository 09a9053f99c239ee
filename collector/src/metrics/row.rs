use serde::{
    Serialize,
    Serializer,
};
use std::fmt;

/// One cell of a canonical row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Text(String),
    Count(u64),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    pub fn count(value: u64) -> Self {
        Cell::Count(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::text(value)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::text(value)
    }
}

impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        Cell::Count(value)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => f.pad(""),
            Cell::Text(text) => f.pad(text),
            Cell::Count(count) => f.pad(&count.to_string()),
        }
    }
}

// Spreadsheets get numbers as numbers so sorting and charts work on them.
impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Empty => serializer.serialize_str(""),
            Cell::Text(text) => serializer.serialize_str(text),
            Cell::Count(count) => serializer.serialize_u64(*count),
        }
    }
}

/// An ordered `[label, count, uniques, date, name]` row, possibly shorter than the full width.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CanonicalRow(Vec<Cell>);

impl CanonicalRow {
    /// Number of columns in the full row shape.
    pub const WIDTH: usize = 5;

    pub fn new(cells: Vec<Cell>) -> Self {
        Self(cells)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fills the row with trailing empty cells up to `width`. Longer rows are left untouched.
    pub fn padded(mut self, width: usize) -> Self {
        if self.0.len() < width {
            self.0.resize(width, Cell::Empty);
        }
        self
    }
}

/// Builds a [`CanonicalRow`] from values convertible into [`Cell`]s.
#[macro_export]
macro_rules! row {
    ($($cell:expr),* $(,)?) => {
        $crate::metrics::CanonicalRow::new(vec![$($crate::metrics::Cell::from($cell)),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_text_is_an_empty_cell() {
        assert_eq!(Cell::from(""), Cell::Empty);
        assert_eq!(Cell::text(String::new()), Cell::Empty);
    }

    #[test]
    fn padding_appends_empty_cells() {
        let row = crate::row!["views: total_count", 8u64, 2u64].padded(CanonicalRow::WIDTH);
        assert_eq!(row.len(), 5);
        assert_eq!(row.cells()[3], Cell::Empty);
        assert_eq!(row.cells()[0], Cell::text("views: total_count"));

        let already_wide = crate::row!["", 1u64, 1u64, "", "/README.md", "extra"].padded(3);
        assert_eq!(already_wide.len(), 6);
    }

    #[test]
    fn cells_serialize_as_strings_and_numbers() {
        let row = crate::row!["", 3u64, ""];
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"["",3,""]"#);
    }
}
