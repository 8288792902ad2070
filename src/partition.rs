//src/partition.rs

use rayon::prelude::*;

use crate::types::{EnrichedRecord, Rank, RankRecord, RankSubset};

/// Ranks reported, coarse to fine. Each rank excludes lineages that reach the
/// next finer rank so the same reads are not counted at two levels.
pub const RANKS: [Rank; 7] = [
    Rank {
        label: "Domain",
        include: "d__",
        exclude: "p__",
    },
    Rank {
        label: "Phylum",
        include: "p__",
        exclude: "c__",
    },
    Rank {
        label: "Class",
        include: "c__",
        exclude: "o__",
    },
    Rank {
        label: "Order",
        include: "o__",
        exclude: "f__",
    },
    Rank {
        label: "Family",
        include: "f__",
        exclude: "g__",
    },
    Rank {
        label: "Genus",
        include: "g__",
        exclude: "s__",
    },
    Rank {
        label: "Species",
        include: "s__",
        exclude: "t__",
    },
];

/// Extracts the taxon name tagged with `marker` from a lineage.
///
/// Finds the leftmost `marker` followed by at least one non-`|` character and
/// returns the text up to the next `|`, with underscores turned into spaces.
pub fn extract_rank_name(lineage: &str, marker: &str) -> Option<String> {
    lineage.match_indices(marker).find_map(|(idx, _)| {
        let rest = &lineage[idx + marker.len()..];
        let name = rest.split('|').next().unwrap_or_default();
        (!name.is_empty()).then(|| name.replace('_', " "))
    })
}

/// Selects and projects the records of one rank.
pub fn partition_rank(rank: Rank, records: &[EnrichedRecord]) -> RankSubset {
    let mut subset = RankSubset {
        rank,
        records: Vec::new(),
        malformed: 0,
    };

    for rec in records {
        if !rec.lineage.contains(rank.include) || rec.lineage.contains(rank.exclude) {
            continue;
        }

        match extract_rank_name(&rec.lineage, rank.include) {
            Some(name) => subset.records.push(RankRecord {
                name,
                lineage: rec.lineage.clone(),
                tax_id: rec.tax_id,
                percentage: rec.percentage,
                direct_reads: rec.direct_reads,
            }),
            None => {
                log::warn!(
                    "{}: cannot extract {} name from lineage {:?} (taxid {})",
                    rank.label,
                    rank.include,
                    rec.lineage,
                    rec.tax_id
                );
                subset.malformed += 1;
            }
        }
    }

    subset
}

/// Computes every rank subset of the merged set, in `RANKS` order.
pub fn split_by_rank(records: &[EnrichedRecord]) -> Vec<RankSubset> {
    RANKS
        .par_iter()
        .map(|&rank| partition_rank(rank, records))
        .collect()
}
