// src/lib.rs
pub mod types;
pub mod config;
pub mod enrich;
pub mod error;
pub mod ete;
pub mod lineage;
pub mod output;
pub mod partition;
pub mod report;
pub mod split;
pub mod taxdb;

use std::path::PathBuf;

pub use config::{Cli, RunConfig};
pub use error::{IngestError, PipelineError, ResolveError};
pub use lineage::{open_resolver, LineageMap, LineageResolver};
pub use types::{EnrichedRecord, Rank, RankRecord, RankSubset, TaxonRecord};

use crate::enrich::{attach_lineages, combine_and_filter};
use crate::lineage::distinct_tax_ids;
use crate::output::write_outputs;
use crate::partition::split_by_rank;
use crate::report::read_report;
use crate::split::split_classified;

/// Row counts collected along the way, for logging and diagnosis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub input_rows: usize,
    pub unclassified: usize,
    pub classified: usize,
    /// Non-zero taxid rows without direct reads.
    pub zero_direct_dropped: usize,
    pub distinct_tax_ids: usize,
    /// Classified taxids the resolver had no lineage for.
    pub unresolved_tax_ids: usize,
    /// Merged rows that made it through the lineage filter.
    pub enriched: usize,
}

/// Everything one run produces: the merged set and its per-rank views.
pub struct PipelineResults {
    pub combined: Vec<EnrichedRecord>,
    /// One subset per entry of `partition::RANKS`, in the same order.
    pub rank_subsets: Vec<RankSubset>,
    pub stats: PipelineStats,
}

impl PipelineResults {
    pub fn rank_subset(&self, label: &str) -> Option<&RankSubset> {
        self.rank_subsets.iter().find(|s| s.rank.label == label)
    }
}

/// Split -> resolve -> merge -> partition over already-parsed report rows.
pub fn run_pipeline(
    records: Vec<TaxonRecord>,
    resolver: &dyn LineageResolver,
) -> Result<PipelineResults, PipelineError> {
    let mut stats = PipelineStats {
        input_rows: records.len(),
        ..Default::default()
    };

    // 1. Classified vs unclassified
    let split = split_classified(records);
    stats.unclassified = split.unclassified.len();
    stats.classified = split.classified.len();
    stats.zero_direct_dropped = split.dropped;

    // 2. Resolve lineages for distinct classified taxids
    let tax_ids = distinct_tax_ids(&split.classified);
    stats.distinct_tax_ids = tax_ids.len();
    let lineages = if tax_ids.is_empty() {
        LineageMap::new()
    } else {
        resolver.resolve(&tax_ids)?
    };
    stats.unresolved_tax_ids = tax_ids.iter().filter(|id| !lineages.contains_key(*id)).count();
    if stats.unresolved_tax_ids > 0 {
        log::warn!(
            "{} of {} taxids have no lineage and will be dropped",
            stats.unresolved_tax_ids,
            stats.distinct_tax_ids
        );
    }

    // 3. Merge
    let classified = attach_lineages(split.classified, &lineages);
    let combined = combine_and_filter(split.unclassified, classified);
    stats.enriched = combined.len();

    // 4. Per-rank views
    let rank_subsets = split_by_rank(&combined);
    for subset in &rank_subsets {
        log::debug!("{}: {} records", subset.rank.label, subset.records.len());
        if subset.malformed > 0 {
            log::warn!(
                "{}: dropped {} records with malformed lineages",
                subset.rank.label,
                subset.malformed
            );
        }
    }

    log::info!(
        "{} rows in, {} unclassified, {} classified, {} enriched",
        stats.input_rows,
        stats.unclassified,
        stats.classified,
        stats.enriched
    );

    Ok(PipelineResults {
        combined,
        rank_subsets,
        stats,
    })
}

/// Progress events emitted by `run_with_progress`, in this order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stage<'a> {
    Reading,
    Read { rows: usize },
    Resolving,
    Resolved { stats: &'a PipelineStats },
    Writing,
    Written { paths: &'a [PathBuf] },
}

/// Reads the report, resolves lineages against the configured database and
/// writes every table. Nothing is written unless all earlier steps succeed.
pub fn run(config: &RunConfig) -> Result<(PipelineResults, Vec<PathBuf>), PipelineError> {
    run_with_progress(config, |_| {})
}

/// Same as `run`, reporting each stage to `on_stage` as it starts and ends.
pub fn run_with_progress<F>(
    config: &RunConfig,
    mut on_stage: F,
) -> Result<(PipelineResults, Vec<PathBuf>), PipelineError>
where
    F: FnMut(Stage<'_>),
{
    on_stage(Stage::Reading);
    let records = read_report(&config.input)?;
    on_stage(Stage::Read {
        rows: records.len(),
    });

    on_stage(Stage::Resolving);
    let resolver = open_resolver(&config.db)?;
    let results = run_pipeline(records, resolver.as_ref())?;
    on_stage(Stage::Resolved {
        stats: &results.stats,
    });

    on_stage(Stage::Writing);
    let written = write_outputs(
        &results.rank_subsets,
        &results.combined,
        &config.outdir,
        &config.output,
    )?;
    on_stage(Stage::Written { paths: &written });

    Ok((results, written))
}
