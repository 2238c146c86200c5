//! Structural validation of Bioindex records.

use std::collections::HashSet;

use crate::error::InvalidRecordError;

use super::record::{Bioindex, SampleResult};

impl Bioindex {
    /// Check the invariants the tabularizer relies on.
    ///
    /// A record is rejected when it has no results, repeats a sample
    /// identifier, lacks any of the four dimensions, or holds a NaN or
    /// infinite score anywhere. The first problem found is reported.
    pub fn validate(&self) -> Result<(), InvalidRecordError> {
        if self.results.is_empty() {
            return Err(InvalidRecordError::NoResults {
                id: self.id.clone(),
            });
        }

        let mut seen = HashSet::with_capacity(self.results.len());
        for result in &self.results {
            if !seen.insert(result.sample.as_str()) {
                return Err(InvalidRecordError::DuplicateSample {
                    sample: result.sample.clone(),
                });
            }
            validate_result(result)?;
        }

        Ok(())
    }
}

fn validate_result(result: &SampleResult) -> Result<(), InvalidRecordError> {
    let sample = result.sample.as_str();
    check_finite(sample, "ggh", result.ggh)?;

    if let Some(dimension) = result.by_dimension.missing().next() {
        return Err(InvalidRecordError::MissingDimension {
            sample: sample.to_string(),
            dimension: dimension.to_string(),
        });
    }

    for (name, dimension) in result.by_dimension.iter() {
        check_finite(sample, &format!("byDimension.{}.ggh", name), dimension.ggh)?;
        for (idx, process) in dimension.by_process.iter().enumerate() {
            check_finite(
                sample,
                &format!("byDimension.{}.byProcess[{}].ggh", name, idx),
                process.ggh,
            )?;
        }
    }

    for (metric, group, stats) in result.diversity.statistics.entries() {
        let path = format!(
            "diversity.statistics.{}.{}",
            metric.as_str(),
            group.as_str()
        );
        check_finite(sample, &format!("{}.value", path), stats.value)?;
        check_finite(
            sample,
            &format!("{}.inverseConfidence", path),
            stats.inverse_confidence,
        )?;
    }

    Ok(())
}

fn check_finite(sample: &str, field: &str, value: f64) -> Result<(), InvalidRecordError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(InvalidRecordError::NonFinite {
            sample: sample.to_string(),
            field: field.to_string(),
            value,
        })
    }
}
