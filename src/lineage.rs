//src/lineage.rs

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use ahash::AHashMap;

use crate::error::ResolveError;
use crate::ete::EteTaxonomy;
use crate::taxdb::TaxDb;
use crate::types::TaxonRecord;

/// taxid -> pipe-delimited lineage, e.g. `d__Bacteria|p__Pseudomonadota|...`
pub type LineageMap = AHashMap<u32, String>;

/// First 16 bytes of every SQLite 3 database file.
const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";

/// A taxonomy lookup that turns taxonomy IDs into lineage strings.
///
/// IDs without a resolvable lineage are left out of the returned map; that is
/// not an error. Errors are reserved for the database itself failing.
pub trait LineageResolver {
    fn resolve(&self, tax_ids: &[u32]) -> Result<LineageMap, ResolveError>;
}

/// A fixed in-memory mapping is itself a resolver.
impl LineageResolver for LineageMap {
    fn resolve(&self, tax_ids: &[u32]) -> Result<LineageMap, ResolveError> {
        Ok(tax_ids
            .iter()
            .filter_map(|id| self.get(id).map(|lineage| (*id, lineage.clone())))
            .collect())
    }
}

/// Sorted, deduplicated taxonomy IDs of the given records.
pub fn distinct_tax_ids(records: &[TaxonRecord]) -> Vec<u32> {
    records
        .iter()
        .map(|r| r.tax_id)
        .collect::<BTreeSet<u32>>()
        .into_iter()
        .collect()
}

/// Maps an NCBI rank name to its lineage marker. Unlisted ranks get no segment.
pub fn rank_marker(rank: &str) -> Option<&'static str> {
    match rank {
        "superkingdom" | "domain" | "realm" => Some("d__"),
        "phylum" => Some("p__"),
        "class" => Some("c__"),
        "order" => Some("o__"),
        "family" => Some("f__"),
        "genus" => Some("g__"),
        "species" => Some("s__"),
        "subspecies" | "strain" | "serotype" | "isolate" => Some("t__"),
        _ => None,
    }
}

/// Builds a lineage string from `(rank, name)` pairs ordered coarse to fine.
///
/// Each marker is used at most once (the coarsest occurrence is kept). Returns
/// `None` when no pair carries a known rank.
pub fn format_lineage<'a, I>(ancestry: I) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut used: Vec<&'static str> = Vec::with_capacity(8);
    let mut segments: Vec<String> = Vec::with_capacity(8);

    for (rank, name) in ancestry {
        let Some(marker) = rank_marker(rank) else {
            continue;
        };
        if used.contains(&marker) {
            continue;
        }
        used.push(marker);

        let name: String = name
            .trim()
            .chars()
            .map(|c| if c == ' ' || c == '|' { '_' } else { c })
            .collect();
        segments.push(format!("{marker}{name}"));
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("|"))
    }
}

/// Opens a taxonomy database, choosing the backend from the file contents:
/// an ETE `taxa.sqlite` when the file is an SQLite database, otherwise a
/// krakenuniq-style `taxDB` flat file.
pub fn open_resolver<P: AsRef<Path>>(path: P) -> Result<Box<dyn LineageResolver>, ResolveError> {
    let path = path.as_ref();

    let mut header = Vec::with_capacity(SQLITE_MAGIC.len());
    File::open(path)?
        .take(SQLITE_MAGIC.len() as u64)
        .read_to_end(&mut header)?;

    if header.as_slice() == &SQLITE_MAGIC[..] {
        log::info!("Using ETE taxonomy database {}", path.display());
        Ok(Box::new(EteTaxonomy::open(path)?))
    } else {
        log::info!("Using taxDB file {}", path.display());
        Ok(Box::new(TaxDb::from_file(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_known_ranks_only() {
        let lineage = format_lineage([
            ("no rank", "cellular organisms"),
            ("superkingdom", "Bacteria"),
            ("phylum", "Pseudomonadota"),
            ("clade", "ignored"),
            ("genus", "Escherichia"),
            ("species", "Escherichia coli"),
        ]);
        assert_eq!(
            lineage.as_deref(),
            Some("d__Bacteria|p__Pseudomonadota|g__Escherichia|s__Escherichia_coli")
        );
    }

    #[test]
    fn keeps_first_occurrence_of_each_marker() {
        let lineage = format_lineage([
            ("domain", "Bacteria"),
            ("species", "Escherichia coli"),
            ("subspecies", "ssp"),
            ("strain", "K-12"),
        ]);
        assert_eq!(
            lineage.as_deref(),
            Some("d__Bacteria|s__Escherichia_coli|t__ssp")
        );
    }

    #[test]
    fn pipes_in_names_are_replaced() {
        assert_eq!(
            format_lineage([("genus", "odd|name")]).as_deref(),
            Some("g__odd_name")
        );
    }

    #[test]
    fn no_known_rank_means_no_lineage() {
        assert_eq!(format_lineage([("no rank", "root")]), None);
    }

    #[test]
    fn static_map_resolves_subset() {
        let mut map = LineageMap::new();
        map.insert(562, "d__Bacteria".to_string());
        map.insert(2, "d__Bacteria".to_string());

        let resolved = map.resolve(&[562, 9999]).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.get(&562).map(String::as_str), Some("d__Bacteria"));
        assert!(!resolved.contains_key(&9999));
    }

    #[test]
    fn distinct_ids_are_sorted_and_unique() {
        let rec = |tax_id| TaxonRecord {
            percentage: 0.0,
            clade_reads: 1,
            direct_reads: 1,
            rank_code: "S".to_string(),
            tax_id,
            name: String::new(),
            lineage: None,
        };
        let ids = distinct_tax_ids(&[rec(562), rec(2), rec(562), rec(1)]);
        assert_eq!(ids, vec![1, 2, 562]);
    }

    #[test]
    fn missing_database_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = open_resolver(dir.path().join("nope.sqlite"));
        assert!(matches!(result, Err(ResolveError::Io(_))));
    }
}
