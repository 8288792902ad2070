//src/enrich.rs

use crate::lineage::LineageMap;
use crate::types::{EnrichedRecord, TaxonRecord};

/// Lineage assigned to every row with taxonomy ID 0.
pub const UNCLASSIFIED_LINEAGE: &str = "unclassified";

/// Left-joins resolved lineages onto classified rows by taxonomy ID.
/// Rows whose ID is missing from `lineages` keep a `None` lineage.
pub fn attach_lineages(
    mut classified: Vec<TaxonRecord>,
    lineages: &LineageMap,
) -> Vec<TaxonRecord> {
    for rec in &mut classified {
        rec.lineage = lineages.get(&rec.tax_id).cloned();
    }
    classified
}

/// Labels unclassified rows, concatenates them ahead of the classified rows,
/// and drops every row left without a usable lineage.
pub fn combine_and_filter(
    unclassified: Vec<TaxonRecord>,
    classified_with_lineage: Vec<TaxonRecord>,
) -> Vec<EnrichedRecord> {
    let unclassified = unclassified.into_iter().map(|mut rec| {
        rec.lineage = Some(UNCLASSIFIED_LINEAGE.to_string());
        rec
    });

    unclassified
        .chain(classified_with_lineage)
        .filter_map(|rec| match rec.lineage {
            Some(lineage) if !lineage.is_empty() => Some(EnrichedRecord {
                lineage,
                tax_id: rec.tax_id,
                direct_reads: rec.direct_reads,
                percentage: rec.percentage,
            }),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(tax_id: u32, direct_reads: u64) -> TaxonRecord {
        TaxonRecord {
            percentage: 2.5,
            clade_reads: direct_reads,
            direct_reads,
            rank_code: "S".to_string(),
            tax_id,
            name: String::new(),
            lineage: None,
        }
    }

    fn lineages() -> LineageMap {
        let mut map = LineageMap::new();
        map.insert(562, "d__Bacteria|s__Escherichia_coli".to_string());
        map.insert(7, String::new());
        map
    }

    #[test]
    fn left_join_keeps_unmatched_rows_as_none() {
        let joined = attach_lineages(vec![row(562, 3), row(9999, 4)], &lineages());
        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].lineage.as_deref(), Some("d__Bacteria|s__Escherichia_coli"));
        assert_eq!(joined[1].lineage, None);
    }

    #[test]
    fn unclassified_rows_survive_filter() {
        let merged = combine_and_filter(vec![row(0, 0)], Vec::new());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].lineage, UNCLASSIFIED_LINEAGE);
        assert_eq!(merged[0].tax_id, 0);
    }

    #[test]
    fn null_and_empty_lineages_are_dropped() {
        let classified = attach_lineages(vec![row(562, 3), row(9999, 4), row(7, 1)], &lineages());
        let merged = combine_and_filter(vec![row(0, 10)], classified);

        let ids: Vec<u32> = merged.iter().map(|r| r.tax_id).collect();
        assert_eq!(ids, vec![0, 562]);
        assert_eq!(merged[1].direct_reads, 3);
        assert_eq!(merged[1].percentage, 2.5);
    }
}
