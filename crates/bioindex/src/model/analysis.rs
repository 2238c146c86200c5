//! Analysis listings from the Agroportal API.
//!
//! Only the payload shape lives here. Fetching listings over HTTP is left to
//! callers; the CLI reads listings that were saved to disk.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BioindexError, Result};

/// A page of analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisList {
    pub count: u64,
    pub skip: u64,
    pub size: u64,
    pub records: Vec<Analysis>,
}

impl AnalysisList {
    /// Read a saved listing from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| BioindexError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Customer reference: either the full record or just its id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CustomerRef {
    Full { record: CustomerRecord },
    Id { id: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub id: String,
    pub short_name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub value: String,
    #[serde(default)]
    pub meta: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: String,
    pub result_set: ResultSetRef,
    pub name: String,
    pub url: String,
    pub artifact_type: String,
    pub public_object: bool,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSetRef {
    pub id: String,
}

/// Identifiers of the Bioindex records attached to an analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BioindexIds {
    pub ids: Vec<String>,
}

/// A single analysis, possibly with nested child analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub customer: CustomerRef,
    pub id: String,
    #[serde(default)]
    pub parent: Value,
    pub result_type: String,
    pub name: String,
    #[serde(default)]
    pub tags: Option<Vec<Tag>>,
    pub hash: String,
    pub version: i64,
    pub updated_at: String,
    #[serde(default)]
    pub collection_date: Option<Value>,
    pub crop: String,
    pub taxa: String,
    pub was_frozen: bool,
    pub was_approved: bool,
    pub was_evaluated: bool,
    pub was_rejected: bool,
    pub upload_completed: bool,
    pub verbose_status: String,
    #[serde(default)]
    pub artifacts: Option<Vec<Artifact>>,
    #[serde(default)]
    pub aggregation_set: Option<Value>,
    #[serde(default)]
    pub sample_statistics: Option<Value>,
    pub show_recommendation: bool,
    #[serde(default)]
    pub children: Option<Vec<Analysis>>,
    #[serde(default)]
    pub bioindex: Option<BioindexIds>,
}

impl Analysis {
    /// Bioindex IDs of this analysis followed by those of its children,
    /// depth first.
    pub fn list_bioindex_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        self.collect_bioindex_ids(&mut ids);
        ids
    }

    fn collect_bioindex_ids(&self, ids: &mut Vec<String>) {
        if let Some(ref bioindex) = self.bioindex {
            ids.extend(bioindex.ids.iter().cloned());
        }
        for child in self.children.iter().flatten() {
            child.collect_bioindex_ids(ids);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn analysis(id: &str, ids: &[&str], children: Vec<Value>) -> Value {
        json!({
            "customer": { "id": "c-1" },
            "id": id,
            "parent": null,
            "resultType": "bioindex",
            "name": format!("analysis {}", id),
            "hash": "h",
            "version": 1,
            "updatedAt": "2024-03-01 10:00:00 +00:00",
            "crop": "soy",
            "taxa": "16S",
            "wasFrozen": false,
            "wasApproved": true,
            "wasEvaluated": true,
            "wasRejected": false,
            "uploadCompleted": true,
            "verboseStatus": "done",
            "showRecommendation": false,
            "children": children,
            "bioindex": { "ids": ids }
        })
    }

    #[test]
    fn test_bioindex_ids_include_children_depth_first() {
        let grandchild = analysis("a3", &["b4"], vec![]);
        let child = analysis("a2", &["b2", "b3"], vec![grandchild]);
        let sibling = analysis("a4", &["b5"], vec![]);
        let root: Analysis =
            serde_json::from_value(analysis("a1", &["b1"], vec![child, sibling])).unwrap();

        assert_eq!(root.list_bioindex_ids(), vec!["b1", "b2", "b3", "b4", "b5"]);
    }

    #[test]
    fn test_full_customer_record_parses() {
        let mut value = analysis("a1", &[], vec![]);
        value["customer"] = json!({ "record": { "id": "c-1", "shortName": "Farm" } });
        let parsed: Analysis = serde_json::from_value(value).unwrap();
        match parsed.customer {
            CustomerRef::Full { record } => assert_eq!(record.short_name, "Farm"),
            CustomerRef::Id { .. } => panic!("expected full customer record"),
        }
    }

    #[test]
    fn test_missing_bioindex_yields_no_ids() {
        let mut value = analysis("a1", &[], vec![]);
        value.as_object_mut().unwrap().remove("bioindex");
        value.as_object_mut().unwrap().remove("children");
        let parsed: Analysis = serde_json::from_value(value).unwrap();
        assert!(parsed.list_bioindex_ids().is_empty());
    }
}
