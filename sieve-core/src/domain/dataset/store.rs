// sieve-core/src/domain/dataset/store.rs

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::dataset::schema::Schema;
use crate::domain::dataset::value::{DataType, Value};
use crate::domain::error::DomainError;

/// Raw row as handed over by a source reader.
pub type Record = HashMap<String, Value>;

/// Immutable columnar dataset. Derived datasets (selections, casts) are
/// always new values.
#[derive(Debug, Clone)]
pub struct Dataset {
    id: u64,
    schema: Schema,
    columns: Vec<Vec<Value>>,
    len: usize,
}

static NEXT_DATASET_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_DATASET_ID.fetch_add(1, Ordering::Relaxed)
}

// Content equality; the version id is ignored.
impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.schema == other.schema && self.columns == other.columns
    }
}

impl Dataset {
    /// Builds the column store, checking every record against the schema.
    pub fn load(records: Vec<Record>, schema: Schema) -> Result<Self, DomainError> {
        let len = records.len();
        let mut columns: Vec<Vec<Value>> = schema
            .columns()
            .iter()
            .map(|_| Vec::with_capacity(len))
            .collect();

        for (row, mut record) in records.into_iter().enumerate() {
            let mut missing = Vec::new();

            for (column, store) in schema.columns().iter().zip(columns.iter_mut()) {
                let Some(value) = record.remove(&column.name) else {
                    missing.push(column.name.clone());
                    continue;
                };

                if value.is_null() && !column.nullable {
                    return Err(DomainError::SchemaMismatch {
                        row,
                        detail: format!("null value in non-nullable column '{}'", column.name),
                    });
                }
                if !column.data_type.accepts(&value) {
                    return Err(DomainError::SchemaMismatch {
                        row,
                        detail: format!(
                            "column '{}' is declared {} but holds a {} value",
                            column.name,
                            column.data_type,
                            value.type_name()
                        ),
                    });
                }

                store.push(widen(column.data_type, value));
            }

            if !missing.is_empty() || !record.is_empty() {
                let mut unexpected: Vec<String> = record.into_keys().collect();
                unexpected.sort();
                return Err(DomainError::SchemaMismatch {
                    row,
                    detail: format!("missing columns {:?}, unexpected columns {:?}", missing, unexpected),
                });
            }
        }

        Ok(Self {
            id: next_id(),
            schema,
            columns,
            len,
        })
    }

    /// Assembles a dataset from columns already known to match the schema.
    /// `len` is explicit: a schema without columns still has rows.
    pub(crate) fn from_columns(schema: Schema, columns: Vec<Vec<Value>>, len: usize) -> Self {
        debug_assert!(columns.iter().all(|c| c.len() == len));
        Self {
            id: next_id(),
            schema,
            columns,
            len,
        }
    }

    pub fn empty(schema: Schema) -> Self {
        let columns = schema.columns().iter().map(|_| Vec::new()).collect();
        Self {
            id: next_id(),
            schema,
            columns,
            len: 0,
        }
    }

    /// Version identity. Clones share it; selections and casts get a new one.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn column(&self, name: &str) -> Result<&[Value], DomainError> {
        self.schema
            .position(name)
            .and_then(|pos| self.columns.get(pos))
            .map(Vec::as_slice)
            .ok_or_else(|| DomainError::UnknownColumn {
                column: name.to_string(),
                context: "dataset lookup".to_string(),
            })
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        (index < self.len).then_some(Row {
            dataset: self,
            index,
        })
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = Row<'_>> + '_ {
        (0..self.len).map(move |index| Row {
            dataset: self,
            index,
        })
    }

    /// New dataset holding the given rows, in the given order.
    /// Indices past the end are skipped.
    pub fn select(&self, indices: &[usize]) -> Dataset {
        let kept: Vec<usize> = indices.iter().copied().filter(|&i| i < self.len).collect();
        let columns = self
            .columns
            .iter()
            .map(|col| kept.iter().map(|&i| col[i].clone()).collect())
            .collect();
        Dataset::from_columns(self.schema.clone(), columns, kept.len())
    }
}

fn widen(data_type: DataType, value: Value) -> Value {
    match (data_type, value) {
        (DataType::Float, Value::Int(i)) => Value::Float(i as f64),
        (_, v) => v,
    }
}

/// Borrowed view of one row. Never owns or mutates data.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    dataset: &'a Dataset,
    index: usize,
}

impl<'a> Row<'a> {
    /// Position of the row inside its dataset.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.dataset
            .schema
            .position(column)
            .and_then(|pos| self.value_at(pos))
    }

    pub fn value_at(&self, position: usize) -> Option<&'a Value> {
        self.dataset
            .columns
            .get(position)
            .and_then(|col| col.get(self.index))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        let row = *self;
        row.dataset
            .schema
            .columns()
            .iter()
            .enumerate()
            .filter_map(move |(pos, c)| row.value_at(pos).map(|v| (c.name.as_str(), v)))
    }
}

impl Serialize for Row<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.dataset.schema.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
