//! Row types of the six derived tables.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::model::DimensionName;

/// A row of one of the derived tables.
pub trait Row: Serialize + DeserializeOwned {
    /// Table name, as used for document keys and file names.
    const TABLE: &'static str;

    /// Column names in output order.
    const COLUMNS: &'static [&'static str];

    /// The sample this row belongs to, if the table is per-sample.
    fn sample(&self) -> Option<&str>;
}

/// Top-level record fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoRow {
    pub id: String,
    pub hash: String,
    pub version: i64,
    pub updated_at: String,
}

impl Row for InfoRow {
    const TABLE: &'static str = "info";
    const COLUMNS: &'static [&'static str] = &["id", "hash", "version", "updatedAt"];

    fn sample(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    pub sample: String,
    pub ggh: f64,
}

impl Row for SampleRow {
    const TABLE: &'static str = "by_sample";
    const COLUMNS: &'static [&'static str] = &["sample", "ggh"];

    fn sample(&self) -> Option<&str> {
        Some(&self.sample)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionRow {
    pub sample: String,
    pub dimension: DimensionName,
    pub ggh: f64,
}

impl Row for DimensionRow {
    const TABLE: &'static str = "by_dimension";
    const COLUMNS: &'static [&'static str] = &["sample", "dimension", "ggh"];

    fn sample(&self) -> Option<&str> {
        Some(&self.sample)
    }
}

/// Per-process contribution. `group` is only ever set for biological
/// fertility rows and is omitted from the output otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRow {
    pub sample: String,
    pub dimension: DimensionName,
    pub process: String,
    pub ggh: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl Row for ProcessRow {
    const TABLE: &'static str = "by_process";
    const COLUMNS: &'static [&'static str] = &["sample", "dimension", "process", "ggh", "group"];

    fn sample(&self) -> Option<&str> {
        Some(&self.sample)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiversityRow {
    pub sample: String,
    pub taxonomic_group: String,
    pub metric: String,
    pub value: f64,
    pub inverse_confidence: f64,
}

impl Row for DiversityRow {
    const TABLE: &'static str = "diversity";
    const COLUMNS: &'static [&'static str] = &[
        "sample",
        "taxonomicGroup",
        "metric",
        "value",
        "inverseConfidence",
    ];

    fn sample(&self) -> Option<&str> {
        Some(&self.sample)
    }
}

/// A community-composition entry. `taxon` is always written, as `null` when
/// unresolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionRow {
    pub sample: String,
    pub key: String,
    pub key_type: String,
    pub count: u64,
    pub is_pathogenic: bool,
    #[serde(default)]
    pub taxon: Option<String>,
}

impl Row for CompositionRow {
    const TABLE: &'static str = "community_composition";
    const COLUMNS: &'static [&'static str] = &[
        "sample",
        "key",
        "keyType",
        "count",
        "isPathogenic",
        "taxon",
    ];

    fn sample(&self) -> Option<&str> {
        Some(&self.sample)
    }
}
