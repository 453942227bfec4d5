//! Columnar result table keyed by row.
//!
//! Every source in this workspace produces one of these: a fixed set of
//! typed columns, rows addressed by a [`RowKey`], and sparse upserts so
//! concurrent fetches over the same key space can each fill in their own
//! columns. Cells a row never names stay at the column's missing value
//! (NaN for numbers).

use std::borrow::Cow;
use std::collections::HashMap;

use time::Date;

use crate::error::TableError;
use crate::field::Field;
use crate::value::{DataType, Value};

/// Identity of a row. Sources keyed by instrument use [`RowKey::Text`],
/// time series use [`RowKey::Date`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowKey {
    Date(Date),
    Text(String),
}

impl std::fmt::Display for RowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{date}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<Date> for RowKey {
    fn from(date: Date) -> Self {
        Self::Date(date)
    }
}

impl From<&str> for RowKey {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for RowKey {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Declared name and type of one table column. Column names are
/// usually field names from a catalog, but sources that shape their
/// output around the request (one column per ticker, say) build them
/// from owned strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    name: Cow<'static, str>,
    data_type: DataType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<Cow<'static, str>>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn data_type(&self) -> DataType {
        self.data_type
    }
}

impl From<&'static Field> for ColumnSpec {
    fn from(field: &'static Field) -> Self {
        Self::new(field.name(), field.data_type())
    }
}

/// One sparse row update: a key plus the cells this update names.
#[derive(Debug, Clone)]
pub struct TableRow {
    key: RowKey,
    cells: Vec<(Cow<'static, str>, Value)>,
}

impl TableRow {
    pub fn new(key: impl Into<RowKey>) -> Self {
        Self {
            key: key.into(),
            cells: Vec::new(),
        }
    }

    pub fn key(&self) -> &RowKey {
        &self.key
    }

    pub fn set(&mut self, field: &'static Field, value: impl Into<Value>) {
        self.cells.push((Cow::Borrowed(field.name()), value.into()));
    }

    pub fn with(mut self, field: &'static Field, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Sets a cell in a column that has no catalog field behind it.
    pub fn set_named(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Value>) {
        self.cells.push((name.into(), value.into()));
    }

    pub fn with_named(
        mut self,
        name: impl Into<Cow<'static, str>>,
        value: impl Into<Value>,
    ) -> Self {
        self.set_named(name, value);
        self
    }

    pub fn cells(&self) -> &[(Cow<'static, str>, Value)] {
        &self.cells
    }
}

/// Column-major table with keyed rows and type-checked inserts.
#[derive(Debug, Clone)]
pub struct ResultTable {
    columns: Vec<ColumnSpec>,
    column_index: HashMap<Cow<'static, str>, usize>,
    keys: Vec<RowKey>,
    row_index: HashMap<RowKey, usize>,
    cells: Vec<Vec<Value>>,
}

impl ResultTable {
    pub fn new(columns: impl IntoIterator<Item = ColumnSpec>) -> Self {
        Self::with_row_capacity(columns, 0)
    }

    pub fn with_row_capacity(
        columns: impl IntoIterator<Item = ColumnSpec>,
        rows: usize,
    ) -> Self {
        let columns: Vec<ColumnSpec> = columns.into_iter().collect();
        let column_index = columns
            .iter()
            .enumerate()
            .map(|(index, column)| (column.name.clone(), index))
            .collect();
        let cells = columns.iter().map(|_| Vec::with_capacity(rows)).collect();
        Self {
            columns,
            column_index,
            keys: Vec::with_capacity(rows),
            row_index: HashMap::with_capacity(rows),
            cells,
        }
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[RowKey] {
        &self.keys
    }

    pub fn row_of(&self, key: &RowKey) -> Option<usize> {
        self.row_index.get(key).copied()
    }

    /// Cell at a row ordinal and column name, if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let column = *self.column_index.get(column)?;
        self.cells.get(column).and_then(|cells| cells.get(row))
    }

    pub fn value_by_key(&self, key: &RowKey, column: &str) -> Option<&Value> {
        self.value(self.row_of(key)?, column)
    }

    /// Applies one sparse row update. Unnamed cells of a new row start at
    /// their column's missing value; cells of an existing row that the
    /// update does not name are left untouched.
    ///
    /// The update is validated in full before anything is written, so a
    /// rejected row leaves the table unchanged.
    pub fn upsert(&mut self, row: TableRow) -> Result<(), TableError> {
        self.validate(&row)?;
        self.write(row);
        Ok(())
    }

    /// Applies a batch of row updates with all-or-nothing semantics: if
    /// any row is invalid, none of the batch is written.
    pub fn upsert_all(&mut self, rows: Vec<TableRow>) -> Result<(), TableError> {
        for row in &rows {
            self.validate(row)?;
        }
        for row in rows {
            self.write(row);
        }
        Ok(())
    }

    fn validate(&self, row: &TableRow) -> Result<(), TableError> {
        for (name, value) in row.cells() {
            let Some(&column) = self.column_index.get(name) else {
                return Err(TableError::UnknownColumn {
                    name: name.to_string(),
                });
            };
            let expected = self.columns[column].data_type();
            if let Some(actual) = value.data_type() {
                if actual != expected {
                    return Err(TableError::TypeMismatch {
                        column: name.to_string(),
                        expected: expected.as_str(),
                        actual: actual.as_str(),
                    });
                }
            }
        }
        Ok(())
    }

    fn write(&mut self, row: TableRow) {
        let TableRow { key, cells } = row;
        let ordinal = match self.row_index.get(&key) {
            Some(&ordinal) => ordinal,
            None => {
                let ordinal = self.keys.len();
                self.keys.push(key.clone());
                self.row_index.insert(key, ordinal);
                for (column, store) in self.cells.iter_mut().enumerate() {
                    store.push(Value::missing_for(self.columns[column].data_type()));
                }
                ordinal
            }
        };
        for (name, value) in cells {
            let column = self.column_index[name.as_ref()];
            self.cells[column][ordinal] = value;
        }
    }

    /// Renders the table as an array of JSON records, one object per
    /// row, keyed by column name plus a `"key"` entry for the row key.
    pub fn to_json_records(&self) -> serde_json::Value {
        let records: Vec<serde_json::Value> = (0..self.row_count())
            .map(|row| {
                let mut record = serde_json::Map::with_capacity(self.columns.len() + 1);
                record.insert(
                    String::from("key"),
                    serde_json::Value::String(self.keys[row].to_string()),
                );
                for (column, spec) in self.columns.iter().enumerate() {
                    let cell = serde_json::to_value(&self.cells[column][row])
                        .unwrap_or(serde_json::Value::Null);
                    record.insert(spec.name().to_owned(), cell);
                }
                serde_json::Value::Object(record)
            })
            .collect();
        serde_json::Value::Array(records)
    }

    /// Reorders rows by ascending key.
    pub fn sort_rows_by_key(&mut self) {
        let mut order: Vec<usize> = (0..self.keys.len()).collect();
        order.sort_by(|&a, &b| self.keys[a].cmp(&self.keys[b]));
        self.apply_row_order(&order);
    }

    /// Reorders rows by the given columns in precedence order, missing
    /// values last within each column.
    pub fn sort_rows_by_columns(&mut self, columns: &[&str]) -> Result<(), TableError> {
        let mut indices = Vec::with_capacity(columns.len());
        for name in columns {
            let Some(&index) = self.column_index.get(*name) else {
                return Err(TableError::UnknownColumn {
                    name: (*name).to_owned(),
                });
            };
            indices.push(index);
        }
        let mut order: Vec<usize> = (0..self.keys.len()).collect();
        order.sort_by(|&a, &b| {
            for &column in &indices {
                let ordering = self.cells[column][a].compare(&self.cells[column][b]);
                if ordering != std::cmp::Ordering::Equal {
                    return ordering;
                }
            }
            std::cmp::Ordering::Equal
        });
        self.apply_row_order(&order);
        Ok(())
    }

    fn apply_row_order(&mut self, order: &[usize]) {
        self.keys = order.iter().map(|&from| self.keys[from].clone()).collect();
        for store in &mut self.cells {
            *store = order.iter().map(|&from| store[from].clone()).collect();
        }
        self.row_index = self
            .keys
            .iter()
            .enumerate()
            .map(|(ordinal, key)| (key.clone(), ordinal))
            .collect();
    }
}
