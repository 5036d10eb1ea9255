//! Single-row tabular input handed to the preprocessor.
//!
//! A `Row` is the in-memory equivalent of a one-row data frame: ordered,
//! named cells that are either numeric or categorical. Column names must match
//! the names the preprocessor was fitted against.

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Category(String),
}

impl Cell {
    pub fn type_name(&self) -> &'static str {
        match self {
            Cell::Number(_) => "number",
            Cell::Category(_) => "category",
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Cell::Number(f64::from(value))
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Category(value.to_string())
    }
}

/// Ordered set of named cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Cell)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. A repeated column replaces the earlier value.
    pub fn with(mut self, column: impl Into<String>, cell: impl Into<Cell>) -> Self {
        self.set(column, cell);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, cell: impl Into<Cell>) {
        let column = column.into();
        let cell = cell.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = cell,
            None => self.cells.push((column, cell)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, cell)| cell)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_preserves_insertion_order() {
        let row = Row::new().with("b", 1.0).with("a", "x");
        let columns: Vec<_> = row.columns().collect();
        assert_eq!(columns, vec!["b", "a"]);
    }

    #[test]
    fn test_row_set_replaces_existing_column() {
        let mut row = Row::new().with("Idade", 30u32);
        row.set("Idade", 31u32);
        assert_eq!(row.columns().count(), 1);
        assert_eq!(row.get("Idade"), Some(&Cell::Number(31.0)));
    }

    #[test]
    fn test_row_get_missing_column() {
        let row = Row::new().with("Sexo", "Masculino");
        assert!(row.get("Região").is_none());
    }
}
