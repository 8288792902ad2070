//src/split.rs

use crate::types::TaxonRecord;

/// The two disjoint subsets produced from a report.
#[derive(Debug, Default)]
pub struct SplitRecords {
    /// Rows with taxonomy ID 0, regardless of read count.
    pub unclassified: Vec<TaxonRecord>,
    /// Rows with a non-zero taxonomy ID and at least one direct read.
    pub classified: Vec<TaxonRecord>,
    /// Rows with a non-zero taxonomy ID but no direct reads (clade totals only).
    pub dropped: usize,
}

/// Partitions report rows into unclassified and classified subsets.
///
/// Rows matching neither predicate carry no rank-level signal and are counted
/// in `dropped` but otherwise discarded.
pub fn split_classified(records: Vec<TaxonRecord>) -> SplitRecords {
    let mut split = SplitRecords::default();

    for rec in records {
        if rec.is_unclassified() {
            split.unclassified.push(rec);
        } else if rec.direct_reads != 0 {
            split.classified.push(rec);
        } else {
            split.dropped += 1;
        }
    }

    log::debug!(
        "Split report: {} unclassified, {} classified, {} clade-only rows dropped",
        split.unclassified.len(),
        split.classified.len(),
        split.dropped
    );
    split
}
