//! Projection of a Bioindex into the six tables.

use crate::error::InvalidRecordError;
use crate::model::{Bioindex, SampleResult};

use super::rows::{CompositionRow, DimensionRow, DiversityRow, InfoRow, ProcessRow, SampleRow};
use super::tables::TableSet;

/// Flatten a record into its table set.
///
/// The record is validated first; an invalid record yields no tables at all.
/// Rows follow source order: samples as listed, then nested lists as
/// listed.
pub fn tabularize(bioindex: &Bioindex) -> Result<TableSet, InvalidRecordError> {
    bioindex.validate()?;

    let mut tables = TableSet {
        info: InfoRow {
            id: bioindex.id.clone(),
            hash: bioindex.hash.clone(),
            version: bioindex.version,
            updated_at: bioindex.updated_at.clone(),
        },
        by_sample: Vec::with_capacity(bioindex.results.len()),
        by_dimension: Vec::with_capacity(bioindex.results.len() * 4),
        by_process: Vec::new(),
        diversity: Vec::new(),
        community_composition: Vec::new(),
    };

    for result in &bioindex.results {
        push_result(&mut tables, result);
    }

    Ok(tables)
}

fn push_result(tables: &mut TableSet, result: &SampleResult) {
    let sample = &result.sample;

    tables.by_sample.push(SampleRow {
        sample: sample.clone(),
        ggh: result.ggh,
    });

    for (name, dimension) in result.by_dimension.iter() {
        tables.by_dimension.push(DimensionRow {
            sample: sample.clone(),
            dimension: name,
            ggh: dimension.ggh,
        });

        tables
            .by_process
            .extend(dimension.by_process.iter().map(|p| ProcessRow {
                sample: sample.clone(),
                dimension: name,
                process: p.process.clone(),
                ggh: p.ggh,
                group: if name.carries_group() {
                    p.group.clone()
                } else {
                    None
                },
            }));
    }

    tables.diversity.extend(
        result
            .diversity
            .statistics
            .entries()
            .map(|(metric, group, stats)| DiversityRow {
                sample: sample.clone(),
                taxonomic_group: group.as_str().to_string(),
                metric: metric.as_str().to_string(),
                value: stats.value,
                inverse_confidence: stats.inverse_confidence,
            }),
    );

    tables.community_composition.extend(
        result
            .diversity
            .community_composition
            .iter()
            .map(|c| CompositionRow {
                sample: sample.clone(),
                key: c.key.clone(),
                key_type: c.key_type.clone(),
                count: c.count,
                is_pathogenic: c.is_pathogenic,
                taxon: c.taxon.clone(),
            }),
    );
}
