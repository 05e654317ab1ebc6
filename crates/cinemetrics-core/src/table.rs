//! Immutable-by-convention table value
//!
//! Every transformation consumes a `Table` and returns a new one. Column
//! order is significant and preserved by every operation.

use crate::value::Value;

/// Errors raised when building a table from parts
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    #[error("Row {row} has {actual} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Column '{column}' has {actual} values, table has {expected} rows")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },
}

/// Ordered columns with row-major storage
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given columns
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Create a table from columns and rows, checking row widths
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, TableError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::RowWidth {
                    row: i,
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Append a row
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn row(&self, index: usize) -> Option<RowRef<'_>> {
        (index < self.rows.len()).then_some(RowRef { table: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        (0..self.rows.len()).map(move |index| RowRef { table: self, index })
    }

    /// Cell lookup by row index and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// All values of one column, in row order
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Rewrite every cell of a column; a missing column is left alone
    pub fn map_column(mut self, name: &str, mut f: impl FnMut(&Value) -> Value) -> Self {
        if let Some(idx) = self.column_index(name) {
            for row in &mut self.rows {
                row[idx] = f(&row[idx]);
            }
        }
        self
    }

    /// Add (or replace) a column computed from each row
    pub fn with_derived(mut self, name: &str, mut f: impl FnMut(RowRef<'_>) -> Value) -> Self {
        let values: Vec<Value> = (0..self.rows.len())
            .map(|index| f(RowRef { table: &self, index }))
            .collect();

        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        self
    }

    /// Add (or replace) a column from explicit values
    pub fn with_column(self, name: &str, values: Vec<Value>) -> Result<Self, TableError> {
        if values.len() != self.rows.len() {
            return Err(TableError::ColumnLength {
                column: name.to_string(),
                expected: self.rows.len(),
                actual: values.len(),
            });
        }
        let mut values = values.into_iter();
        Ok(self.with_derived(name, |_| values.next().unwrap_or(Value::Null)))
    }

    /// Drop every listed column that exists; absent names are ignored
    pub fn drop_columns(self, names: &[&str]) -> Self {
        let keep: Vec<String> = self
            .columns
            .iter()
            .filter(|c| !names.contains(&c.as_str()))
            .cloned()
            .collect();
        let keep_refs: Vec<&str> = keep.iter().map(String::as_str).collect();
        self.reindex(&keep_refs)
    }

    /// Rename a column if present
    pub fn rename_column(mut self, from: &str, to: &str) -> Self {
        if let Some(idx) = self.column_index(from) {
            self.columns[idx] = to.to_string();
        }
        self
    }

    /// Keep only rows matching the predicate, preserving order
    pub fn filter_rows(self, mut keep: impl FnMut(RowRef<'_>) -> bool) -> Self {
        let mask: Vec<bool> = (0..self.rows.len())
            .map(|index| keep(RowRef { table: &self, index }))
            .collect();

        let Self { columns, rows } = self;
        let rows = rows
            .into_iter()
            .zip(mask)
            .filter_map(|(row, k)| k.then_some(row))
            .collect();

        Self { columns, rows }
    }

    /// Conform to exactly the given column list
    ///
    /// Missing columns are created as all-null, columns not listed are
    /// dropped.
    pub fn reindex(self, names: &[&str]) -> Self {
        let positions: Vec<Option<usize>> = names.iter().map(|n| self.column_index(n)).collect();

        let rows = self
            .rows
            .into_iter()
            .map(|row| {
                positions
                    .iter()
                    .map(|p| p.map(|i| row[i].clone()).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self {
            columns: names.iter().map(|n| n.to_string()).collect(),
            rows,
        }
    }

    /// Rows at the given positions, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    /// First `n` rows
    pub fn head(mut self, n: usize) -> Self {
        self.rows.truncate(n);
        self
    }
}

/// Borrowed view of a single row
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> RowRef<'a> {
    /// Position of the row in its table
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn values(&self) -> &'a [Value] {
        &self.table.rows[self.index]
    }

    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.table
            .column_index(column)
            .map(|idx| &self.table.rows[self.index][idx])
    }

    /// Cell, treating a missing column as null
    pub fn value(&self, column: &str) -> &'a Value {
        const NULL: &Value = &Value::Null;
        self.get(column).unwrap_or(NULL)
    }

    pub fn float(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Value::as_f64)
    }

    pub fn int(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(Value::as_i64)
    }

    pub fn text(&self, column: &str) -> Option<&'a str> {
        self.get(column).and_then(Value::as_str)
    }

    pub fn is_null(&self, column: &str) -> bool {
        self.value(column).is_null()
    }

    /// Count of non-null cells across all columns
    pub fn non_null_count(&self) -> usize {
        self.values().iter().filter(|v| !v.is_null()).count()
    }
}
