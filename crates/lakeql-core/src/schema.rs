//! Column types shared by the catalog, the resolver and the printer

use serde::{Deserialize, Serialize};

/// Portable logical type system
///
/// Maps backend column types to a common representation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogicalType {
    /// Boolean type
    Bool,

    /// Integer type (any precision)
    Int,

    /// Floating point (any precision)
    Float,

    /// Decimal with precision and scale
    Decimal {
        precision: Option<u16>,
        scale: Option<u16>,
    },

    /// String/text type
    String,

    /// Date (no time component)
    Date,

    /// Date with time component
    DateTime,

    /// JSON/Variant type
    Json,

    /// Array type
    Array {
        element_type: Box<LogicalType>,
    },

    /// Unknown type (cannot infer)
    Unknown,
}

impl std::fmt::Display for LogicalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool => write!(f, "BOOL"),
            Self::Int => write!(f, "INT"),
            Self::Float => write!(f, "FLOAT"),
            Self::Decimal { precision, scale } => {
                match (precision, scale) {
                    (Some(p), Some(s)) => write!(f, "DECIMAL({}, {})", p, s),
                    (Some(p), None) => write!(f, "DECIMAL({})", p),
                    _ => write!(f, "DECIMAL"),
                }
            }
            Self::String => write!(f, "STRING"),
            Self::Date => write!(f, "DATE"),
            Self::DateTime => write!(f, "DATETIME"),
            Self::Json => write!(f, "JSON"),
            Self::Array { element_type } => write!(f, "ARRAY({})", element_type),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A column of a catalog table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,

    /// Logical type
    pub logical_type: LogicalType,
}

impl Column {
    /// Create a new column
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_type_display() {
        assert_eq!(LogicalType::Bool.to_string(), "BOOL");
        assert_eq!(
            LogicalType::Decimal { precision: Some(10), scale: Some(2) }.to_string(),
            "DECIMAL(10, 2)"
        );
        assert_eq!(
            LogicalType::Array { element_type: Box::new(LogicalType::String) }.to_string(),
            "ARRAY(STRING)"
        );
    }

    #[test]
    fn column_serialization() {
        let column = Column::new("Volume", LogicalType::Int);
        let json = serde_json::to_string(&column).unwrap();
        assert!(json.contains("\"name\":\"Volume\""));
        assert!(json.contains("\"type\":\"int\""));

        let parsed: Column = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, column);
    }
}
