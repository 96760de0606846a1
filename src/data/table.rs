use serde::{Deserialize, Serialize};

use super::{DataError, Result};

/// A single named column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<String>,
}

/// Column-oriented table with a fixed column order.
///
/// Every column has the same number of values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedTable")]
pub struct Table {
    columns: Vec<Column>,
}

#[derive(Deserialize)]
struct UncheckedTable {
    columns: Vec<Column>,
}

impl TryFrom<UncheckedTable> for Table {
    type Error = DataError;

    fn try_from(raw: UncheckedTable) -> Result<Self> {
        Table::from_columns(raw.columns.into_iter().map(|c| (c.name, c.values)))
    }
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from (name, values) pairs, rejecting ragged or duplicate columns
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<String>)>,
        S: Into<String>,
    {
        let mut table = Table::new();
        for (name, values) in columns {
            table.push_column(name.into(), values)?;
        }
        Ok(table)
    }

    /// Build a table from a header and row-major records
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut columns: Vec<Column> = header
            .into_iter()
            .map(|name| Column {
                name,
                values: Vec::with_capacity(rows.len()),
            })
            .collect();

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(DataError::Malformed {
                    location: format!("row {}", i + 1),
                    reason: format!("expected {} fields, found {}", columns.len(), row.len()),
                });
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.values.push(value);
            }
        }

        Table::from_columns(columns.into_iter().map(|c| (c.name, c.values)))
    }

    fn push_column(&mut self, name: String, values: Vec<String>) -> Result<()> {
        if self.columns.iter().any(|c| c.name == name) {
            return Err(DataError::Malformed {
                location: "header".to_string(),
                reason: format!("duplicate field '{}'", name),
            });
        }
        if let Some(first) = self.columns.first() {
            if first.values.len() != values.len() {
                return Err(DataError::Malformed {
                    location: format!("field '{}'", name),
                    reason: format!(
                        "expected {} values, found {}",
                        first.values.len(),
                        values.len()
                    ),
                });
            }
        }
        self.columns.push(Column { name, values });
        Ok(())
    }

    /// Column names in order
    pub fn header(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// All values of a field
    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// One row across all fields, in header order
    pub fn row(&self, index: usize) -> Option<Vec<&str>> {
        if index >= self.num_rows() {
            return None;
        }
        Some(self.columns.iter().map(|c| c.values[index].as_str()).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&str>> + '_ {
        (0..self.num_rows()).filter_map(move |i| self.row(i))
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn num_fields(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// New table restricted to `fields`, in the order given
    pub fn project(&self, fields: &[&str]) -> Result<Table> {
        let mut projected = Table::new();
        for name in fields {
            let values = self
                .field(name)
                .ok_or_else(|| DataError::MissingField(name.to_string()))?;
            projected.push_column(name.to_string(), values.to_vec())?;
        }
        Ok(projected)
    }
}
