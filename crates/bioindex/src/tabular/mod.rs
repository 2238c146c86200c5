//! Flattening of Bioindex records into correlated tables.
//!
//! [`tabularize`] produces a [`TableSet`] with six tables that share the
//! `sample` column:
//!
//! | Table                   | One row per                          |
//! |-------------------------|--------------------------------------|
//! | `info`                  | record                               |
//! | `by_sample`             | sample                               |
//! | `by_dimension`          | sample × dimension (always 4)        |
//! | `by_process`            | sample × dimension × process         |
//! | `diversity`             | sample × metric × taxonomic group    |
//! | `community_composition` | sample × detected taxon              |

mod rows;
mod tables;
mod tabularizer;

pub use rows::{CompositionRow, DimensionRow, DiversityRow, InfoRow, ProcessRow, Row, SampleRow};
pub use tables::{Record, Table, TableSet};
pub use tabularizer::tabularize;
