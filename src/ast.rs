//! Entities and relationships as read from the diagram export, before any
//! foreign-key placement has happened.

use serde::Serialize;
use std::fmt;

/// Namespace plus table name. Unique across one schema model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TableId {
    pub namespace: String,
    pub table: String,
}

impl TableId {
    pub fn new(namespace: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.table)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    Char,
    Varchar,
    Text,
    Integer,
    Smallint,
    Bigint,
    Float,
    Double,
    Decimal,
    Numeric,
    Boolean,
    Bit,
    Date,
    Time,
    Datetime,
    Timestamp,
    Binary,
    Varbinary,
    Blob,
}

impl DataType {
    /// Parse a column type as written in the export. Case-insensitive, and a
    /// trailing size such as `VARCHAR(40)` is ignored.
    pub fn from_str(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        let base = lower.split('(').next().unwrap_or(&lower).trim();

        match base {
            "char" | "character" => Some(Self::Char),
            "varchar" | "character varying" => Some(Self::Varchar),
            "text" => Some(Self::Text),
            "integer" | "int" => Some(Self::Integer),
            "smallint" => Some(Self::Smallint),
            "bigint" => Some(Self::Bigint),
            "float" | "real" => Some(Self::Float),
            "double" | "double precision" => Some(Self::Double),
            "decimal" => Some(Self::Decimal),
            "numeric" => Some(Self::Numeric),
            "boolean" | "bool" => Some(Self::Boolean),
            "bit" => Some(Self::Bit),
            "date" => Some(Self::Date),
            "time" => Some(Self::Time),
            "datetime" => Some(Self::Datetime),
            "timestamp" => Some(Self::Timestamp),
            "binary" => Some(Self::Binary),
            "varbinary" => Some(Self::Varbinary),
            "blob" => Some(Self::Blob),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Char => "CHAR",
            Self::Varchar => "VARCHAR",
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::Smallint => "SMALLINT",
            Self::Bigint => "BIGINT",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Decimal => "DECIMAL",
            Self::Numeric => "NUMERIC",
            Self::Boolean => "BOOLEAN",
            Self::Bit => "BIT",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Datetime => "DATETIME",
            Self::Timestamp => "TIMESTAMP",
            Self::Binary => "BINARY",
            Self::Varbinary => "VARBINARY",
            Self::Blob => "BLOB",
        }
    }

    /// Text-like types carry a length.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Char | Self::Varchar | Self::Text)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub length: Option<u32>,
    pub is_primary_key: bool,
    pub is_unique: bool,
    pub is_not_null: bool,
    pub is_foreign_key: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            length: None,
            is_primary_key: false,
            is_unique: false,
            is_not_null: false,
            is_foreign_key: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Cardinality {
    #[default]
    #[serde(rename = "1")]
    One,
    #[serde(rename = "0..1")]
    ZeroOrOne,
    #[serde(rename = "0..*")]
    Many,
    #[serde(rename = "1..*")]
    OneOrMore,
}

impl Cardinality {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "1" | "1..1" => Some(Self::One),
            "0..1" => Some(Self::ZeroOrOne),
            "0..*" | "*" => Some(Self::Many),
            "1..*" => Some(Self::OneOrMore),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::One => "1",
            Self::ZeroOrOne => "0..1",
            Self::Many => "0..*",
            Self::OneOrMore => "1..*",
        }
    }

    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many | Self::OneOrMore)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Element id other nodes use to reference this entity.
    pub id: String,
    pub table: TableId,
    pub columns: Vec<Column>,
}

impl Entity {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipEnd {
    /// Id of the referenced entity.
    pub reference: String,
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawRelationship {
    pub id: Option<String>,
    pub name: String,
    pub end1: RelationshipEnd,
    pub end2: RelationshipEnd,
}

/// Output of the extraction stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    pub entities: Vec<Entity>,
    pub relationships: Vec<RawRelationship>,
}
