use crate::error::CirclePackError;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Position of a row inside its dataset.
pub type RowId = usize;

/// One input record. Columns missing from a short record are absent, not empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: HashMap<String, String>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn get_or_empty(&self, column: &str) -> &str {
        self.get(column).unwrap_or("")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub fields: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    /// Parses CSV with the first record as header. Short records are kept.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CirclePackError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);
        let fields: Vec<String> = reader
            .headers()?
            .iter()
            .map(|field| field.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|value| value.is_empty()) {
                continue;
            }
            let row: Row = fields
                .iter()
                .zip(record.iter())
                .map(|(field, value)| (field.clone(), value.to_string()))
                .collect();
            rows.push(row);
        }
        tracing::debug!(fields = fields.len(), rows = rows.len(), "parsed csv");
        Ok(Self { fields, rows })
    }

    pub fn from_csv_str(input: &str) -> Result<Self, CirclePackError> {
        Self::from_reader(input.as_bytes())
    }

    pub fn from_path(path: &Path) -> Result<Self, CirclePackError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_and_rows() {
        let dataset = Dataset::from_csv_str("country,state,city\nUS,CA,LA\nUS,NY,NYC\n").unwrap();
        assert_eq!(dataset.fields, vec!["country", "state", "city"]);
        assert_eq!(dataset.rows.len(), 2);
        assert_eq!(dataset.rows[1].get("city"), Some("NYC"));
    }

    #[test]
    fn short_records_leave_columns_absent() {
        let dataset = Dataset::from_csv_str("a,b,c\n1,,\n2\n").unwrap();
        assert_eq!(dataset.rows[0].get("b"), Some(""));
        assert_eq!(dataset.rows[1].get("a"), Some("2"));
        assert_eq!(dataset.rows[1].get("b"), None);
        assert_eq!(dataset.rows[1].get_or_empty("b"), "");
    }

    #[test]
    fn header_only_input_is_empty() {
        let dataset = Dataset::from_csv_str("a,b\n").unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.fields.len(), 2);
    }
}
