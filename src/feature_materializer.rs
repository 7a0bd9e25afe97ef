//! Feature materialization for score model inference.
//!
//! Turns validated input records into the fixed-schema table the persisted
//! transformer was fit on. Categorical text is copied verbatim; no case
//! folding or trimming happens here.

use crate::types::record::InputRecord;
use crate::types::table::{Cell, FeatureTable, Row, COLUMNS};

/// Converts input records into feature table rows.
pub struct FeatureMaterializer;

impl FeatureMaterializer {
    /// Create a new feature materializer.
    pub fn new() -> Self {
        Self
    }

    /// Materialize a single record as a one-row table.
    pub fn materialize(&self, record: &InputRecord) -> FeatureTable {
        let mut table = FeatureTable::with_capacity(1);
        table.push_row(self.row(record));
        table
    }

    /// Materialize several records, one row each, in input order.
    pub fn materialize_all<'a, I>(&self, records: I) -> FeatureTable
    where
        I: IntoIterator<Item = &'a InputRecord>,
    {
        let mut table = FeatureTable::new();
        for record in records {
            table.push_row(self.row(record));
        }
        table
    }

    /// Build one row. Order matches [`COLUMNS`].
    pub fn row(&self, record: &InputRecord) -> Row {
        [
            Cell::Text(record.gender().to_string()),
            Cell::Text(record.race_ethnicity().to_string()),
            Cell::Text(record.parental_level_of_education().to_string()),
            Cell::Text(record.lunch().to_string()),
            Cell::Text(record.test_preparation_course().to_string()),
            Cell::Number(record.reading_score()),
            Cell::Number(record.writing_score()),
        ]
    }

    /// Get the number of columns produced.
    pub fn column_count(&self) -> usize {
        COLUMNS.len()
    }

    /// Get column names in table order.
    pub fn column_names(&self) -> &'static [&'static str] {
        &COLUMNS
    }
}

impl Default for FeatureMaterializer {
    fn default() -> Self {
        Self::new()
    }
}
