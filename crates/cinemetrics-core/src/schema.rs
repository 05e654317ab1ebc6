//! Schema types and the Clean Table column contract

use crate::value::Value;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column names shared across the pipeline
pub mod columns {
    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const TAGLINE: &str = "tagline";
    pub const RELEASE_DATE: &str = "release_date";
    pub const GENRES: &str = "genres";
    pub const BELONGS_TO_COLLECTION: &str = "belongs_to_collection";
    pub const ORIGINAL_LANGUAGE: &str = "original_language";
    pub const BUDGET_MUSD: &str = "budget_musd";
    pub const REVENUE_MUSD: &str = "revenue_musd";
    pub const PRODUCTION_COMPANIES: &str = "production_companies";
    pub const PRODUCTION_COUNTRIES: &str = "production_countries";
    pub const VOTE_COUNT: &str = "vote_count";
    pub const VOTE_AVERAGE: &str = "vote_average";
    pub const POPULARITY: &str = "popularity";
    pub const RUNTIME: &str = "runtime";
    pub const OVERVIEW: &str = "overview";
    pub const SPOKEN_LANGUAGES: &str = "spoken_languages";
    pub const POSTER_PATH: &str = "poster_path";

    // Raw-only fields
    pub const BUDGET: &str = "budget";
    pub const REVENUE: &str = "revenue";
    pub const STATUS: &str = "status";
    pub const CREDITS: &str = "credits";

    // Analyzer-derived
    pub const PROFIT_MUSD: &str = "profit_musd";
    pub const ROI: &str = "roi";
    pub const IS_FRANCHISE: &str = "is_franchise";
    pub const CAST: &str = "cast";
    pub const DIRECTOR: &str = "director";
}

/// Portable logical type system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalType {
    /// Boolean type
    Bool,

    /// Integer type
    Int,

    /// Floating point
    Float,

    /// String/text type
    String,

    /// Date (no time component)
    Date,

    /// Nested JSON structure
    Json,

    /// Unknown type (inferred from content)
    Unknown,
}

impl LogicalType {
    /// Parse a textual field into a cell of this type
    ///
    /// Empty fields are null. Fields that do not parse as the declared
    /// type are null as well; reading never fails on a single cell.
    pub fn parse_field(&self, field: &str) -> Value {
        if field.is_empty() {
            return Value::Null;
        }

        match self {
            Self::Bool => match field.to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::Null,
            },
            Self::Int => field
                .parse::<i64>()
                .map(Value::Int)
                .or_else(|_| field.parse::<f64>().map(|f| Value::Int(f as i64)))
                .unwrap_or(Value::Null),
            Self::Float => field.parse::<f64>().map(Value::float).unwrap_or(Value::Null),
            Self::String => Value::Text(field.to_string()),
            Self::Date => NaiveDate::parse_from_str(field, "%Y-%m-%d")
                .map(Value::Date)
                .unwrap_or(Value::Null),
            Self::Json => serde_json::from_str(field)
                .map(Value::Json)
                .unwrap_or_else(|_| Value::Text(field.to_string())),
            Self::Unknown => infer_field(field),
        }
    }
}

/// Best-effort typing for a field with no declared type
fn infer_field(field: &str) -> Value {
    if let Ok(i) = field.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = field.parse::<f64>() {
        return Value::float(f);
    }
    match field {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::Text(field.to_string()),
    }
}

impl std::fmt::Display for LogicalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool => write!(f, "BOOL"),
            Self::Int => write!(f, "INT"),
            Self::Float => write!(f, "FLOAT"),
            Self::String => write!(f, "STRING"),
            Self::Date => write!(f, "DATE"),
            Self::Json => write!(f, "JSON"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Nullability state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nullability {
    /// May hold nulls
    Yes,

    /// Never null
    No,
}

/// A column in a schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,

    /// Logical type
    pub logical_type: LogicalType,

    /// Nullability
    pub nullable: Nullability,
}

impl Column {
    /// Create a new nullable column
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
            nullable: Nullability::Yes,
        }
    }

    /// Set nullability
    pub fn with_nullability(mut self, nullable: Nullability) -> Self {
        self.nullable = nullable;
        self
    }
}

/// An ordered collection of columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Ordered list of columns
    pub columns: Vec<Column>,
}

impl Schema {
    /// Create a new empty schema
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Create a schema from columns
    pub fn from_columns(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// The Clean Table contract, in its fixed column order
    pub fn clean_table() -> Self {
        use columns::*;

        Self::from_columns(vec![
            Column::new(ID, LogicalType::Int).with_nullability(Nullability::No),
            Column::new(TITLE, LogicalType::String).with_nullability(Nullability::No),
            Column::new(TAGLINE, LogicalType::String),
            Column::new(RELEASE_DATE, LogicalType::Date),
            Column::new(GENRES, LogicalType::String),
            Column::new(BELONGS_TO_COLLECTION, LogicalType::String),
            Column::new(ORIGINAL_LANGUAGE, LogicalType::String),
            Column::new(BUDGET_MUSD, LogicalType::Float),
            Column::new(REVENUE_MUSD, LogicalType::Float),
            Column::new(PRODUCTION_COMPANIES, LogicalType::String),
            Column::new(PRODUCTION_COUNTRIES, LogicalType::String),
            Column::new(VOTE_COUNT, LogicalType::Float),
            Column::new(VOTE_AVERAGE, LogicalType::Float),
            Column::new(POPULARITY, LogicalType::Float),
            Column::new(RUNTIME, LogicalType::Float),
            Column::new(OVERVIEW, LogicalType::String),
            Column::new(SPOKEN_LANGUAGES, LogicalType::String),
            Column::new(POSTER_PATH, LogicalType::String),
        ])
    }

    /// The Clean Table contract extended with Analyzer-derived columns
    pub fn enriched_table() -> Self {
        use columns::*;

        let mut schema = Self::clean_table();
        schema.columns.extend([
            Column::new(PROFIT_MUSD, LogicalType::Float),
            Column::new(ROI, LogicalType::Float),
            Column::new(IS_FRANCHISE, LogicalType::Bool),
            Column::new(CAST, LogicalType::String),
            Column::new(DIRECTOR, LogicalType::String),
        ]);
        schema
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Declared type of a column, `Unknown` when not part of the schema
    pub fn type_of(&self, name: &str) -> LogicalType {
        self.find_column(name)
            .map(|c| c.logical_type)
            .unwrap_or(LogicalType::Unknown)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_type_display() {
        assert_eq!(LogicalType::Bool.to_string(), "BOOL");
        assert_eq!(LogicalType::Date.to_string(), "DATE");
    }

    #[test]
    fn clean_table_order() {
        let schema = Schema::clean_table();
        let names = schema.column_names();
        assert_eq!(names.len(), 18);
        assert_eq!(names[0], "id");
        assert_eq!(names[1], "title");
        assert_eq!(names[7], "budget_musd");
        assert_eq!(names[17], "poster_path");
        assert!(schema.find_column("status").is_none());
    }

    #[test]
    fn schema_operations() {
        let schema = Schema::from_columns(vec![
            Column::new("id", LogicalType::Int),
            Column::new("name", LogicalType::String),
        ]);

        assert_eq!(schema.column_names(), vec!["id", "name"]);
        assert!(schema.find_column("id").is_some());
        assert_eq!(schema.type_of("nonexistent"), LogicalType::Unknown);
    }

    #[test]
    fn field_parsing_degrades_to_null() {
        assert_eq!(LogicalType::Float.parse_field("1.5"), Value::Float(1.5));
        assert_eq!(LogicalType::Float.parse_field("abc"), Value::Null);
        assert_eq!(LogicalType::Int.parse_field(""), Value::Null);
        assert_eq!(LogicalType::Date.parse_field("2019-04-24").to_string(), "2019-04-24");
        assert_eq!(LogicalType::Date.parse_field("April"), Value::Null);
        assert_eq!(LogicalType::Unknown.parse_field("7"), Value::Int(7));
        assert_eq!(LogicalType::Unknown.parse_field("x|y"), Value::from("x|y"));
    }
}
