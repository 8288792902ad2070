//src/types.rs

/// One typed row of a Kraken report.
///
/// The report columns are, in order:
///  %  cladeReads  directReads  rankCode  taxID  name
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonRecord {
    pub percentage: f64,
    pub clade_reads: u64,
    pub direct_reads: u64,
    pub rank_code: String,
    pub tax_id: u32,              // 0 => unclassified
    pub name: String,
    pub lineage: Option<String>,  // filled in by enrichment
}

impl TaxonRecord {
    pub fn is_unclassified(&self) -> bool {
        self.tax_id == 0
    }
}

/// A record that survived enrichment: lineage is known and non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub lineage: String,
    pub tax_id: u32,
    pub direct_reads: u64,
    pub percentage: f64,
}

/// A record projected into one rank subset.
#[derive(Debug, Clone, PartialEq)]
pub struct RankRecord {
    /// Rank-specific taxon name, e.g. "Escherichia coli" for Species.
    pub name: String,
    pub lineage: String,
    pub tax_id: u32,
    pub percentage: f64,
    pub direct_reads: u64,
}

/// A taxonomic rank and the lineage markers used to select it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rank {
    pub label: &'static str,
    /// Marker a lineage must contain, e.g. `"g__"`.
    pub include: &'static str,
    /// Marker of the next finer rank; its presence excludes the record.
    pub exclude: &'static str,
}

/// All records of the merged set that belong to one rank.
#[derive(Debug, Clone)]
pub struct RankSubset {
    pub rank: Rank,
    pub records: Vec<RankRecord>,
    /// Records carrying the include marker whose name could not be extracted.
    pub malformed: usize,
}
