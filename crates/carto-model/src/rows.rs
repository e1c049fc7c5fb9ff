//! Decoding a whole fetch into a record set.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::category::Category;
use crate::error::RowError;
use crate::ids::RecordId;
use crate::record::Record;

/// A row that was dropped during decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    /// Position of the row in the fetched payload.
    pub index: usize,
    pub reason: RowError,
}

/// The decoded result of one successful fetch.
///
/// Records keep the order of their first row. Identities are unique:
/// field agent rows sharing an identity are folded together, for the
/// other categories the last row wins.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet {
    category: Category,
    records: Vec<Record>,
    skipped: Vec<SkippedRow>,
}

impl RecordSet {
    pub fn from_rows(category: Category, rows: &[Value]) -> Self {
        let mut records: Vec<Record> = Vec::with_capacity(rows.len());
        let mut positions: HashMap<RecordId, usize> = HashMap::new();
        let mut skipped = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            let record = match Record::from_row(category, row) {
                Ok(record) => record,
                Err(reason) => {
                    skipped.push(SkippedRow { index, reason });
                    continue;
                }
            };

            match positions.get(record.id()) {
                Some(&at) => {
                    if !records[at].absorb(&record) {
                        debug!(
                            category = %category,
                            id = %record.id(),
                            row = index,
                            "duplicate identity, keeping the later row"
                        );
                        records[at] = record;
                    }
                }
                None => {
                    positions.insert(record.id().clone(), records.len());
                    records.push(record);
                }
            }
        }

        Self {
            category,
            records,
            skipped,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn skipped(&self) -> &[SkippedRow] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Record>, Vec<SkippedRow>) {
        (self.records, self.skipped)
    }
}
