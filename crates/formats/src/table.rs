use serde::{Deserialize, Serialize};

use foundation::ids::FeatureId;
use store::FeatureRecord;

use crate::error::FormatError;

/// One raw row of the columnar feature table, in file column order:
/// `(id, max_activation, x, y, top10_x, top10_y, label, order)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureTableRow {
    pub id: u32,
    pub max_activation: f64,
    pub x: f64,
    pub y: f64,
    pub top10_x: f64,
    pub top10_y: f64,
    pub label: String,
    pub order: f64,
}

/// Boundary to the columnar (parquet) decoder, which is an external
/// collaborator: implementations turn fetched bytes into rows in file order.
pub trait FeatureTableReader {
    fn read_feature_table(&self, bytes: &[u8]) -> Result<Vec<FeatureTableRow>, FormatError>;
}

/// Decodes a JSON array of rows, as produced by a host-side columnar reader
/// that has already lowered the table out of parquet.
pub fn rows_from_json(text: &str) -> Result<Vec<FeatureTableRow>, FormatError> {
    serde_json::from_str(text).map_err(|e| FormatError::Json(e.to_string()))
}

/// Reader for tables the host has already lowered to UTF-8 JSON rows; the
/// implementation the web boundary feeds its `commit_features` payload
/// through.
#[derive(Debug, Default, Copy, Clone)]
pub struct JsonRowsReader;

impl FeatureTableReader for JsonRowsReader {
    fn read_feature_table(&self, bytes: &[u8]) -> Result<Vec<FeatureTableRow>, FormatError> {
        let text = std::str::from_utf8(bytes).map_err(|e| FormatError::Table(e.to_string()))?;
        rows_from_json(text)
    }
}

/// Converts decoded rows into feature records, preserving file order.
pub fn rows_to_records(rows: Vec<FeatureTableRow>) -> Vec<FeatureRecord> {
    rows.into_iter()
        .map(|r| FeatureRecord {
            id: FeatureId(r.id),
            max_activation: r.max_activation,
            x: r.x,
            y: r.y,
            top10_x: r.top10_x,
            top10_y: r.top10_y,
            label: r.label,
            order: r.order,
        })
        .collect()
}

/// Content hash of a fetched feature table, used as the model data version
/// when pinning the sample-chunk cache.
pub fn table_version(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::{
        FeatureTableReader, JsonRowsReader, rows_from_json, rows_to_records, table_version,
    };
    use foundation::ids::FeatureId;

    #[test]
    fn rows_round_trip_into_records_in_order() {
        let text = r#"[
            {"id": 9, "max_activation": 2.5, "x": 0.1, "y": 0.2,
             "top10_x": 1.0, "top10_y": 0.0, "label": "prime numbers", "order": 0.4},
            {"id": 5, "max_activation": 1.5, "x": 0.3, "y": 0.4,
             "top10_x": 0.0, "top10_y": 0.0, "label": "", "order": 0.1}
        ]"#;
        let rows = rows_from_json(text).unwrap();
        let records = rows_to_records(rows);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, FeatureId(9));
        assert_eq!(records[0].label, "prime numbers");
        assert_eq!(records[1].id, FeatureId(5));
        assert_eq!(records[1].top10_x, 0.0);
    }

    #[test]
    fn malformed_rows_are_an_error() {
        assert!(rows_from_json("[{\"id\": \"not a number\"}]").is_err());
    }

    #[test]
    fn json_reader_decodes_row_bytes() {
        let bytes = br#"[
            {"id": 3, "max_activation": 1.0, "x": 0.0, "y": 0.0,
             "top10_x": 0.5, "top10_y": 0.5, "label": "weather", "order": 0.2}
        ]"#;
        let rows = JsonRowsReader.read_feature_table(bytes).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 3);

        assert!(JsonRowsReader.read_feature_table(b"\xff\xfe").is_err());
        assert!(JsonRowsReader.read_feature_table(b"{not rows").is_err());
    }

    #[test]
    fn table_version_is_stable_for_identical_bytes() {
        let a = table_version(b"columnar bytes");
        let b = table_version(b"columnar bytes");
        let c = table_version(b"other bytes");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
