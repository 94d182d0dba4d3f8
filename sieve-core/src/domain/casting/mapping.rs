// sieve-core/src/domain/casting/mapping.rs

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::domain::dataset::{Column, DataType};

/// Cast target: a column type, optionally length-bounded (`varchar(255)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetType {
    pub data_type: DataType,
    pub max_length: Option<usize>,
}

impl TargetType {
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            max_length: None,
        }
    }

    pub fn varchar(max_length: usize) -> Self {
        Self {
            data_type: DataType::String,
            max_length: Some(max_length),
        }
    }
}

impl FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let bounded = lowered
            .strip_prefix("varchar(")
            .or_else(|| lowered.strip_prefix("char("))
            .and_then(|rest| rest.strip_suffix(')'));

        match bounded {
            Some(n) => n
                .trim()
                .parse::<usize>()
                .map(TargetType::varchar)
                .map_err(|_| format!("Invalid length in target type '{}'", s)),
            None => DataType::from_str(&lowered).map(TargetType::new),
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_length {
            Some(n) => write!(f, "varchar({})", n),
            None => write!(f, "{}", self.data_type),
        }
    }
}

impl<'de> Deserialize<'de> for TargetType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TargetType::from_str(&s).map_err(de::Error::custom)
    }
}

impl Serialize for TargetType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// What to do with rows that cannot be cast.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CastPolicy {
    /// Drop the row and report every failing cell.
    #[default]
    Exclude,
    /// Abort the batch on the first failure.
    Abort,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Validate)]
pub struct MappingEntry {
    #[validate(length(min = 1, message = "Mapping source column cannot be empty"))]
    pub source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_to: Option<String>,

    #[serde(rename = "type")]
    pub target: TargetType,

    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl MappingEntry {
    pub fn new(source: impl Into<String>, target: TargetType) -> Self {
        Self {
            source: source.into(),
            rename_to: None,
            target,
            nullable: true,
        }
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.rename_to = Some(name.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn target_name(&self) -> &str {
        self.rename_to.as_deref().unwrap_or(&self.source)
    }

    pub fn target_column(&self) -> Column {
        Column {
            name: self.target_name().to_string(),
            data_type: self.target.data_type,
            nullable: self.nullable,
        }
    }
}

/// Ordered target schema, applied to a routed group before persistence.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default, Validate)]
pub struct SchemaMapping {
    #[serde(default)]
    pub on_failure: CastPolicy,

    #[validate(nested)]
    #[validate(length(min = 1, message = "A schema mapping needs at least one column"))]
    pub columns: Vec<MappingEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_target_type_parsing() -> Result<()> {
        assert_eq!("varchar(255)".parse::<TargetType>(), Ok(TargetType::varchar(255)));
        assert_eq!(
            "VARCHAR( 10 )".parse::<TargetType>(),
            Ok(TargetType::varchar(10))
        );
        assert_eq!(
            "bigint".parse::<TargetType>(),
            Ok(TargetType::new(DataType::Integer))
        );
        assert!("varchar(abc)".parse::<TargetType>().is_err());
        assert!("blob".parse::<TargetType>().is_err());
        assert_eq!(TargetType::varchar(4).to_string(), "varchar(4)");
        Ok(())
    }

    #[test]
    fn test_mapping_yaml() -> Result<()> {
        let yaml = r#"
on_failure: abort
columns:
  - source: Series_Title
    rename_to: series_title
    type: varchar(255)
    nullable: false
  - source: Released_Year
    type: int
"#;
        let mapping: SchemaMapping = serde_yaml::from_str(yaml)?;
        mapping.validate()?;
        assert_eq!(mapping.on_failure, CastPolicy::Abort);
        assert_eq!(mapping.columns[0].target_name(), "series_title");
        assert_eq!(mapping.columns[1].target_name(), "Released_Year");
        assert_eq!(
            mapping.columns[0].target_column(),
            Column::new("series_title", DataType::String).required()
        );
        Ok(())
    }
}
