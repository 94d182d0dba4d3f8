// sieve-core/src/domain/dataset/schema.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::domain::dataset::value::DataType;
use crate::domain::error::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Column {
    #[validate(length(min = 1, message = "Column name cannot be empty"))]
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Ordered column list with an O(1) name index.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Result<Self, DomainError> {
        let mut index = HashMap::with_capacity(columns.len());
        for (pos, column) in columns.iter().enumerate() {
            if index.insert(column.name.clone(), pos).is_some() {
                return Err(DomainError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(Self { columns, index })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.position(name).and_then(|pos| self.columns.get(pos))
    }

    /// Resolves a column or reports who asked for it.
    pub fn require(&self, name: &str, context: &str) -> Result<&Column, DomainError> {
        self.get(name).ok_or_else(|| DomainError::UnknownColumn {
            column: name.to_string(),
            context: context.to_string(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|c| c.name.as_str())
    }
}
