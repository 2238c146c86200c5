//! Bioindex record types.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{BioindexError, Result};

/// A multi-sample biodiversity assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bioindex {
    pub id: String,
    /// Content-addressing token for provenance.
    pub hash: String,
    pub version: i64,
    pub updated_at: String,
    /// One entry per sample, in source order.
    pub results: Vec<SampleResult>,
}

impl Bioindex {
    /// Parse a record from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a record from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| BioindexError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&content)
    }

    /// Unique `(key, keyType)` pairs across all samples, in first-seen order.
    pub fn taxon_keys(&self) -> IndexSet<TaxonKey> {
        self.results
            .iter()
            .flat_map(|r| r.diversity.community_composition.iter())
            .map(CommunityComposition::taxon_key)
            .collect()
    }

    /// Fill in `taxon` for every composition entry whose key was resolved.
    ///
    /// Entries without a resolved name are left untouched. Returns the number
    /// of entries that received a name.
    pub fn apply_taxa(&mut self, names: &HashMap<TaxonKey, String>) -> usize {
        let mut applied = 0;
        for entry in self
            .results
            .iter_mut()
            .flat_map(|r| r.diversity.community_composition.iter_mut())
        {
            if let Some(name) = names.get(&entry.taxon_key()) {
                entry.taxon = Some(name.clone());
                applied += 1;
            }
        }
        applied
    }

    /// Sample identifiers in source order.
    pub fn samples(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|r| r.sample.as_str())
    }
}

/// Scores and diversity data for a single sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleResult {
    pub sample: String,
    pub ggh: f64,
    pub diversity: Diversity,
    pub by_dimension: ByDimension,
}

/// The four scored dimensions.
///
/// Declaration order is the order used by every table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DimensionName {
    Biodiversity,
    BiologicalAgents,
    BiologicalFertility,
    PhytosanitaryRisk,
}

impl DimensionName {
    /// All dimensions, in table order.
    pub const ALL: [DimensionName; 4] = [
        DimensionName::Biodiversity,
        DimensionName::BiologicalAgents,
        DimensionName::BiologicalFertility,
        DimensionName::PhytosanitaryRisk,
    ];

    /// Name as it appears in JSON and in table cells.
    pub fn as_str(&self) -> &'static str {
        match self {
            DimensionName::Biodiversity => "biodiversity",
            DimensionName::BiologicalAgents => "biologicalAgents",
            DimensionName::BiologicalFertility => "biologicalFertility",
            DimensionName::PhytosanitaryRisk => "phytosanitaryRisk",
        }
    }

    /// Whether process entries of this dimension carry a `group` label.
    pub fn carries_group(&self) -> bool {
        matches!(self, DimensionName::BiologicalFertility)
    }
}

impl std::fmt::Display for DimensionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dimension scores keyed by dimension name.
///
/// On the wire this is an object with one key per dimension. A complete set
/// has all four; [`Bioindex::validate`] rejects anything less.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ByDimension(BTreeMap<DimensionName, Dimension>);

impl ByDimension {
    /// Build a complete dimension set.
    pub fn new(
        biodiversity: Dimension,
        biological_agents: Dimension,
        biological_fertility: Dimension,
        phytosanitary_risk: Dimension,
    ) -> Self {
        Self(BTreeMap::from([
            (DimensionName::Biodiversity, biodiversity),
            (DimensionName::BiologicalAgents, biological_agents),
            (DimensionName::BiologicalFertility, biological_fertility),
            (DimensionName::PhytosanitaryRisk, phytosanitary_risk),
        ]))
    }

    pub fn get(&self, name: DimensionName) -> Option<&Dimension> {
        self.0.get(&name)
    }

    /// Present dimensions, in table order.
    pub fn iter(&self) -> impl Iterator<Item = (DimensionName, &Dimension)> {
        self.0.iter().map(|(name, dim)| (*name, dim))
    }

    /// Dimensions that are absent from this set.
    pub fn missing(&self) -> impl Iterator<Item = DimensionName> + '_ {
        DimensionName::ALL
            .into_iter()
            .filter(|name| !self.0.contains_key(name))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(DimensionName, Dimension)> for ByDimension {
    fn from_iter<I: IntoIterator<Item = (DimensionName, Dimension)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Aggregate score of a dimension and its per-process contributions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub ggh: f64,
    /// Process names may repeat; order is preserved.
    pub by_process: Vec<ByProcess>,
}

/// Contribution of a single process to a dimension score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByProcess {
    pub process: String,
    pub ggh: f64,
    /// Only meaningful for biological fertility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl ByProcess {
    pub fn new(process: impl Into<String>, ggh: f64) -> Self {
        Self {
            process: process.into(),
            ggh,
            group: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// Diversity statistics and community composition of a sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diversity {
    pub statistics: Statistics,
    pub community_composition: Vec<CommunityComposition>,
}

/// Diversity metrics reported per taxonomic group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    FaithPd,
    Shannon,
    Richness,
}

impl Metric {
    /// All metrics, in table order.
    pub const ALL: [Metric; 3] = [Metric::FaithPd, Metric::Shannon, Metric::Richness];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::FaithPd => "faithPd",
            Metric::Shannon => "shannon",
            Metric::Richness => "richness",
        }
    }
}

/// Taxonomic groups that diversity statistics are split by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxonomicGroup {
    Fungi,
    Bacteria,
}

impl TaxonomicGroup {
    /// All groups, in table order.
    pub const ALL: [TaxonomicGroup; 2] = [TaxonomicGroup::Fungi, TaxonomicGroup::Bacteria];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaxonomicGroup::Fungi => "fungi",
            TaxonomicGroup::Bacteria => "bacteria",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub faith_pd: ByTaxonomy,
    pub shannon: ByTaxonomy,
    pub richness: ByTaxonomy,
}

impl Statistics {
    pub fn get(&self, metric: Metric) -> &ByTaxonomy {
        match metric {
            Metric::FaithPd => &self.faith_pd,
            Metric::Shannon => &self.shannon,
            Metric::Richness => &self.richness,
        }
    }

    /// Present `(metric, group, statistics)` combinations, in table order.
    pub fn entries(&self) -> impl Iterator<Item = (Metric, TaxonomicGroup, &TaxonStatistics)> {
        Metric::ALL.into_iter().flat_map(move |metric| {
            TaxonomicGroup::ALL
                .into_iter()
                .filter_map(move |group| self.get(metric).get(group).map(|s| (metric, group, s)))
        })
    }
}

/// A metric split by taxonomic group; absent groups were not measured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ByTaxonomy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fungi: Option<TaxonStatistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bacteria: Option<TaxonStatistics>,
}

impl ByTaxonomy {
    pub fn get(&self, group: TaxonomicGroup) -> Option<&TaxonStatistics> {
        match group {
            TaxonomicGroup::Fungi => self.fungi.as_ref(),
            TaxonomicGroup::Bacteria => self.bacteria.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonStatistics {
    pub value: f64,
    pub inverse_confidence: f64,
}

/// A detected taxon and how often it occurred in a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityComposition {
    /// Taxon identifier, e.g. an NCBI taxid.
    pub key: String,
    /// Identifier scheme, e.g. `"taxid"`.
    pub key_type: String,
    pub count: u64,
    pub is_pathogenic: bool,
    /// Resolved name; `None` until enrichment succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxon: Option<String>,
}

impl CommunityComposition {
    pub fn new(key: impl Into<String>, key_type: impl Into<String>, count: u64) -> Self {
        Self {
            key: key.into(),
            key_type: key_type.into(),
            count,
            is_pathogenic: false,
            taxon: None,
        }
    }

    pub fn pathogenic(mut self, is_pathogenic: bool) -> Self {
        self.is_pathogenic = is_pathogenic;
        self
    }

    pub fn taxon_key(&self) -> TaxonKey {
        TaxonKey::new(&self.key, &self.key_type)
    }
}

/// Identity of a taxon lookup: the identifier plus its scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonKey {
    pub key: String,
    pub key_type: String,
}

impl TaxonKey {
    pub fn new(key: impl Into<String>, key_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            key_type: key_type.into(),
        }
    }
}

impl std::fmt::Display for TaxonKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.key_type, self.key)
    }
}
