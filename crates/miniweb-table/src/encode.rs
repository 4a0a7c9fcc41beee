//! Column typing transforms at the read/write boundary.
//!
//! The driver only speaks SQLite's storage classes; declared column types
//! beyond those are handled here. JSON documents travel as text, geometry
//! travels as WKT wrapped in the PostGIS conversion functions, and
//! booleans come back from integer-typed drivers as 0/1.

use crate::schema::{ColumnType, TableSchema};
use miniweb_core::Value;

/// Encode a value for writing to the named column.
pub fn encode_value(schema: &TableSchema, column: &str, value: Value) -> Value {
    match schema.column_type(column) {
        Some(ColumnType::Jsonb) => match value {
            Value::Json(json) => Value::Text(json.to_string()),
            other => other,
        },
        _ => value,
    }
}

/// Decode a fetched value for the named column.
pub fn decode_value(schema: &TableSchema, column: &str, value: Value) -> Value {
    match schema.column_type(column) {
        Some(ColumnType::Jsonb) => match value {
            Value::Text(text) => match serde_json::from_str(&text) {
                Ok(json) => Value::Json(json),
                Err(_) => Value::Text(text),
            },
            other => other,
        },
        Some(ColumnType::Boolean) => match value {
            Value::Int(n) => Value::Bool(n != 0),
            other => other,
        },
        _ => value,
    }
}

/// The SELECT-list expression for a column, written against identifier
/// placeholders. Geometry columns read back as WKT.
pub fn select_expr(column_type: Option<ColumnType>, placeholder: &str, alias: &str) -> String {
    match column_type {
        Some(ColumnType::Geometry) => {
            format!("ST_AsText({placeholder}) AS {alias}")
        }
        _ => placeholder.to_string(),
    }
}

/// The VALUES-list expression for a column's bound placeholder. Geometry
/// columns write through ST_GeomFromText.
pub fn write_expr(column_type: Option<ColumnType>, placeholder: &str) -> String {
    match column_type {
        Some(ColumnType::Geometry) => format!("ST_GeomFromText({placeholder})"),
        _ => placeholder.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableSchema;

    fn schema() -> TableSchema {
        TableSchema::new("places")
            .column("id", ColumnType::Serial)
            .column("meta", ColumnType::Jsonb)
            .column("active", ColumnType::Boolean)
            .column("point", ColumnType::Geometry)
    }

    #[test]
    fn jsonb_round_trip() {
        let s = schema();
        let json = serde_json::json!({"tags": ["a", "b"]});

        let encoded = encode_value(&s, "meta", Value::Json(json.clone()));
        assert_eq!(encoded, Value::Text(json.to_string()));

        let decoded = decode_value(&s, "meta", Value::Text(json.to_string()));
        assert_eq!(decoded, Value::Json(json));
    }

    #[test]
    fn invalid_json_stays_text() {
        let s = schema();
        let decoded = decode_value(&s, "meta", Value::Text("{broken".to_string()));
        assert_eq!(decoded, Value::Text("{broken".to_string()));
    }

    #[test]
    fn boolean_from_integer() {
        let s = schema();
        assert_eq!(decode_value(&s, "active", Value::Int(1)), Value::Bool(true));
        assert_eq!(
            decode_value(&s, "active", Value::Int(0)),
            Value::Bool(false)
        );
        // Undeclared columns pass through untouched
        assert_eq!(decode_value(&s, "id", Value::Int(1)), Value::Int(1));
    }

    #[test]
    fn geometry_expressions() {
        assert_eq!(
            select_expr(Some(ColumnType::Geometry), "::c3", "::a3"),
            "ST_AsText(::c3) AS ::a3"
        );
        assert_eq!(select_expr(Some(ColumnType::Text), "::c0", "::a0"), "::c0");
        assert_eq!(
            write_expr(Some(ColumnType::Geometry), ":v2"),
            "ST_GeomFromText(:v2)"
        );
        assert_eq!(write_expr(Some(ColumnType::Integer), ":v0"), ":v0");
    }
}
