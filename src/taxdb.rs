//src/taxdb.rs

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use ahash::AHashMap;

use crate::error::ResolveError;
use crate::lineage::{format_lineage, LineageMap, LineageResolver};

pub type ParentMap = AHashMap<u32, u32>;
pub type NameMap = AHashMap<u32, String>;
pub type RankMap = AHashMap<u32, String>;

/// Deepest ancestry we are willing to walk before assuming a cycle.
const MAX_DEPTH: usize = 256;

/// Parses a taxDB file in the format:
/// ```text
/// <taxid>\t<parentid>\t<taxname>\t<rank>
/// ```
/// Returns:
/// - a `ParentMap` mapping child_taxid -> parent_taxid
/// - a `NameMap` mapping taxid -> taxname
/// - a `RankMap` mapping taxid -> rank
pub fn parse_taxdb<R: Read>(reader: R) -> Result<(ParentMap, NameMap, RankMap), ResolveError> {
    let reader = BufReader::new(reader);

    let mut parent_map = ParentMap::new();
    let mut name_map = NameMap::new();
    let mut rank_map = RankMap::new();
    let mut skipped = 0usize;

    for (idx, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        // e.g. "2   131567   Bacteria   superkingdom"
        let parts: Vec<&str> = line.split('\t').collect();

        if parts.len() < 4 {
            skipped += 1;
            continue;
        }

        let taxid = parse_id(parts[0], idx + 1)?;
        let parentid = parse_id(parts[1], idx + 1)?;

        if taxid != 0 {
            parent_map.insert(taxid, parentid);
            name_map.insert(taxid, parts[2].trim().to_string());
            rank_map.insert(taxid, parts[3].trim().to_string());
        }
    }

    if skipped > 0 {
        log::debug!("Skipped {skipped} short lines in taxDB");
    }
    Ok((parent_map, name_map, rank_map))
}

fn parse_id(raw: &str, line: usize) -> Result<u32, ResolveError> {
    raw.trim().parse().map_err(|_| ResolveError::Malformed {
        line,
        reason: format!("invalid taxonomy ID {raw:?}"),
    })
}

/// A krakenuniq-style taxonomy loaded fully into memory.
pub struct TaxDb {
    parent_map: ParentMap,
    name_map: NameMap,
    rank_map: RankMap,
}

impl TaxDb {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ResolveError> {
        let file = File::open(path)?;
        let db = Self::from_reader(file)?;
        log::info!("Loaded taxDB with {} nodes", db.len());
        Ok(db)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ResolveError> {
        let (parent_map, name_map, rank_map) = parse_taxdb(reader)?;
        Ok(Self {
            parent_map,
            name_map,
            rank_map,
        })
    }

    pub fn len(&self) -> usize {
        self.parent_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent_map.is_empty()
    }

    /// Taxa from `taxid` up to the root, leaf first. Empty if `taxid` is unknown.
    pub fn ancestry(&self, taxid: u32) -> Vec<u32> {
        let mut path = Vec::new();
        let mut node = taxid;

        while self.parent_map.contains_key(&node) && path.len() < MAX_DEPTH {
            path.push(node);
            match self.parent_map.get(&node) {
                Some(&p) if p != node && p != 0 && node != 1 => node = p,
                _ => break,
            }
        }
        if path.len() == MAX_DEPTH {
            log::warn!("Ancestry of taxid {taxid} exceeds {MAX_DEPTH} levels; truncated");
        }
        path
    }

    pub fn lineage(&self, taxid: u32) -> Option<String> {
        let ancestry = self.ancestry(taxid);
        format_lineage(ancestry.iter().rev().map(|id| {
            (
                self.rank_map.get(id).map(String::as_str).unwrap_or_default(),
                self.name_map.get(id).map(String::as_str).unwrap_or_default(),
            )
        }))
    }
}

impl LineageResolver for TaxDb {
    fn resolve(&self, tax_ids: &[u32]) -> Result<LineageMap, ResolveError> {
        Ok(tax_ids
            .iter()
            .filter_map(|&id| self.lineage(id).map(|lineage| (id, lineage)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAXDB: &str = "\
1\t1\troot\tno rank
131567\t1\tcellular organisms\tno rank
2\t131567\tBacteria\tsuperkingdom
1224\t2\tPseudomonadota\tphylum
1236\t1224\tGammaproteobacteria\tclass
91347\t1236\tEnterobacterales\torder
543\t91347\tEnterobacteriaceae\tfamily
561\t543\tEscherichia\tgenus
562\t561\tEscherichia coli\tspecies
83333\t562\tEscherichia coli K-12\tstrain
short line
";

    #[test]
    fn parses_maps() {
        let (parents, names, ranks) = parse_taxdb(TAXDB.as_bytes()).unwrap();
        assert_eq!(parents.len(), 10);
        assert_eq!(parents[&562], 561);
        assert_eq!(names[&562], "Escherichia coli");
        assert_eq!(ranks[&2], "superkingdom");
    }

    #[test]
    fn rejects_non_numeric_ids() {
        let result = parse_taxdb("x\t1\troot\tno rank\n".as_bytes());
        assert!(matches!(result, Err(ResolveError::Malformed { line: 1, .. })));
    }

    #[test]
    fn builds_full_lineage() {
        let db = TaxDb::from_reader(TAXDB.as_bytes()).unwrap();
        assert_eq!(
            db.lineage(562).as_deref(),
            Some(
                "d__Bacteria|p__Pseudomonadota|c__Gammaproteobacteria|o__Enterobacterales\
                 |f__Enterobacteriaceae|g__Escherichia|s__Escherichia_coli"
            )
        );
        assert!(db.lineage(83333).unwrap().ends_with("|t__Escherichia_coli_K-12"));
        assert_eq!(db.lineage(2).as_deref(), Some("d__Bacteria"));
    }

    #[test]
    fn unknown_or_rankless_ids_are_absent() {
        let db = TaxDb::from_reader(TAXDB.as_bytes()).unwrap();
        let resolved = db.resolve(&[1, 562, 424242]).unwrap();
        assert_eq!(resolved.len(), 1);
        assert!(resolved.contains_key(&562));
    }

    #[test]
    fn cycles_terminate() {
        let db = TaxDb::from_reader("10\t11\ta\tgenus\n11\t10\tb\tfamily\n".as_bytes()).unwrap();
        assert_eq!(db.ancestry(10).len(), MAX_DEPTH);
        assert_eq!(db.lineage(10).as_deref(), Some("f__b|g__a"));
    }
}
