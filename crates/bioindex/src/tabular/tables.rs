//! The correlated table set produced by the tabularizer.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::rows::{
    CompositionRow, DimensionRow, DiversityRow, InfoRow, ProcessRow, Row, SampleRow,
};

/// A row as an ordered `column -> value` map.
pub type Record = IndexMap<String, Value>;

/// A table in generic form, ready for a sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: &'static str,
    /// Declared columns, in output order.
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Table {
    /// Convert typed rows into generic records.
    pub fn from_rows<R: Row>(rows: &[R]) -> serde_json::Result<Self> {
        let records = rows
            .iter()
            .map(|row| -> serde_json::Result<Record> {
                Ok(match serde_json::to_value(row)? {
                    Value::Object(map) => map.into_iter().collect(),
                    _ => Record::new(),
                })
            })
            .collect::<serde_json::Result<Vec<_>>>()?;

        Ok(Self {
            name: R::TABLE,
            columns: R::COLUMNS.iter().map(|c| c.to_string()).collect(),
            records,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The six tables derived from one Bioindex.
///
/// Serializing this struct yields the output document directly: `info` as an
/// object and every other table as an ordered list of row objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSet {
    pub info: InfoRow,
    pub by_sample: Vec<SampleRow>,
    pub by_dimension: Vec<DimensionRow>,
    pub by_process: Vec<ProcessRow>,
    pub diversity: Vec<DiversityRow>,
    pub community_composition: Vec<CompositionRow>,
}

impl TableSet {
    /// Table names in output order.
    pub const TABLE_NAMES: [&'static str; 6] = [
        InfoRow::TABLE,
        SampleRow::TABLE,
        DimensionRow::TABLE,
        ProcessRow::TABLE,
        DiversityRow::TABLE,
        CompositionRow::TABLE,
    ];

    /// The output document as a JSON value.
    pub fn to_document(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// The output document as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Rebuild a table set from an output document.
    pub fn from_document(document: Value) -> serde_json::Result<Self> {
        serde_json::from_value(document)
    }

    /// All six tables in generic form, in output order.
    pub fn tables(&self) -> serde_json::Result<Vec<Table>> {
        Ok(vec![
            Table::from_rows(std::slice::from_ref(&self.info))?,
            Table::from_rows(&self.by_sample)?,
            Table::from_rows(&self.by_dimension)?,
            Table::from_rows(&self.by_process)?,
            Table::from_rows(&self.diversity)?,
            Table::from_rows(&self.community_composition)?,
        ])
    }

    /// Samples in source order.
    pub fn samples(&self) -> Vec<&str> {
        self.by_sample.iter().map(|r| r.sample.as_str()).collect()
    }

    /// Distinct samples referenced by each per-sample table.
    pub fn samples_by_table(&self) -> IndexMap<&'static str, IndexSet<&str>> {
        fn distinct<R: Row>(rows: &[R]) -> IndexSet<&str> {
            rows.iter().filter_map(R::sample).collect()
        }

        IndexMap::from([
            (SampleRow::TABLE, distinct(&self.by_sample)),
            (DimensionRow::TABLE, distinct(&self.by_dimension)),
            (ProcessRow::TABLE, distinct(&self.by_process)),
            (DiversityRow::TABLE, distinct(&self.diversity)),
            (CompositionRow::TABLE, distinct(&self.community_composition)),
        ])
    }

    /// Total number of rows across all tables.
    pub fn row_count(&self) -> usize {
        1 + self.by_sample.len()
            + self.by_dimension.len()
            + self.by_process.len()
            + self.diversity.len()
            + self.community_composition.len()
    }

    /// SHA-256 of the compact output document.
    pub fn digest(&self) -> serde_json::Result<String> {
        let bytes = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("sha256:{:x}", hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_sample(ggh: f64) -> TableSet {
        TableSet {
            info: InfoRow {
                id: "bx".to_string(),
                hash: "h".to_string(),
                version: 1,
                updated_at: "2024-01-01T00:00:00Z".to_string(),
            },
            by_sample: vec![SampleRow {
                sample: "S1".to_string(),
                ggh,
            }],
            by_dimension: Vec::new(),
            by_process: Vec::new(),
            diversity: Vec::new(),
            community_composition: Vec::new(),
        }
    }

    #[test]
    fn test_document_round_trip_is_bit_exact() {
        // Shortest representations that a best-effort float parser misreads.
        for ggh in [180.17933438838418, 0.1 + 0.2, -987.6543210987654, f64::MIN_POSITIVE] {
            let tables = single_sample(ggh);
            let text = tables.to_json_pretty().unwrap();
            let restored = TableSet::from_document(serde_json::from_str(&text).unwrap()).unwrap();

            assert_eq!(restored.by_sample[0].ggh.to_bits(), ggh.to_bits());
            assert_eq!(restored, tables);
        }
    }

    #[test]
    fn test_digest_is_stable() {
        let tables = single_sample(0.8);
        let digest = tables.digest().unwrap();
        assert!(digest.starts_with("sha256:"));
        assert_eq!(digest.len(), "sha256:".len() + 64);
        assert_eq!(digest, tables.clone().digest().unwrap());
        assert_ne!(digest, single_sample(0.81).digest().unwrap());
    }
}
