//src/ete.rs
//! Lineage lookups against the SQLite taxonomy dump maintained by the ETE toolkit
//! (`~/.etetoolkit/taxa.sqlite`).
//!
//! Relevant tables:
//! ```text
//! species (taxid INT PRIMARY KEY, parent INT, spname VARCHAR, common VARCHAR, rank VARCHAR, track TEXT)
//! merged  (taxid_old INT, taxid_new INT)
//! ```
//! `track` holds the comma-separated ancestry of a taxon, leaf first.

use std::path::Path;

use ahash::AHashMap;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use crate::error::ResolveError;
use crate::lineage::{format_lineage, LineageMap, LineageResolver};

pub struct EteTaxonomy {
    conn: Connection,
}

/// `(spname, rank)` of one taxon.
type NodeInfo = (String, String);

impl EteTaxonomy {
    /// Opens the database read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ResolveError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Follows the `merged` table so retired IDs still resolve.
    fn current_taxid(&self, taxid: u32) -> Result<u32, ResolveError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT taxid_new FROM merged WHERE taxid_old = ?1")?;
        let merged: Option<u32> = stmt.query_row(params![taxid], |row| row.get(0)).optional()?;

        if let Some(new_id) = merged {
            log::debug!("taxid {taxid} was merged into {new_id}");
        }
        Ok(merged.unwrap_or(taxid))
    }

    fn track(&self, taxid: u32) -> Result<Option<Vec<u32>>, ResolveError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT track FROM species WHERE taxid = ?1")?;
        let track: Option<Option<String>> =
            stmt.query_row(params![taxid], |row| row.get(0)).optional()?;

        let Some(Some(track)) = track else {
            return Ok(None);
        };

        // A corrupt row only loses this taxid, not the run
        let ancestors = track
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().parse::<u32>())
            .collect::<Result<Vec<u32>, _>>();

        match ancestors {
            Ok(ancestors) => Ok(Some(ancestors)),
            Err(_) => {
                log::warn!("taxid {taxid} has an unreadable ancestry track {track:?}; skipped");
                Ok(None)
            }
        }
    }

    fn node<'c>(
        &self,
        taxid: u32,
        cache: &'c mut AHashMap<u32, Option<NodeInfo>>,
    ) -> Result<Option<&'c NodeInfo>, ResolveError> {
        if !cache.contains_key(&taxid) {
            let mut stmt = self
                .conn
                .prepare_cached("SELECT spname, rank FROM species WHERE taxid = ?1")?;
            let info: Option<(Option<String>, Option<String>)> = stmt
                .query_row(params![taxid], |row| Ok((row.get(0)?, row.get(1)?)))
                .optional()?;
            let info =
                info.map(|(name, rank)| (name.unwrap_or_default(), rank.unwrap_or_default()));
            cache.insert(taxid, info);
        }
        Ok(cache.get(&taxid).and_then(Option::as_ref))
    }

    fn lineage(
        &self,
        taxid: u32,
        cache: &mut AHashMap<u32, Option<NodeInfo>>,
    ) -> Result<Option<String>, ResolveError> {
        let taxid = self.current_taxid(taxid)?;
        let Some(track) = self.track(taxid)? else {
            return Ok(None);
        };

        let mut ancestry: Vec<NodeInfo> = Vec::with_capacity(track.len());
        for &id in track.iter().rev() {
            if let Some(info) = self.node(id, cache)? {
                ancestry.push(info.clone());
            }
        }

        Ok(format_lineage(
            ancestry.iter().map(|(name, rank)| (rank.as_str(), name.as_str())),
        ))
    }
}

impl LineageResolver for EteTaxonomy {
    fn resolve(&self, tax_ids: &[u32]) -> Result<LineageMap, ResolveError> {
        let mut cache = AHashMap::new();
        let mut lineages = LineageMap::with_capacity(tax_ids.len());

        for &taxid in tax_ids {
            if let Some(lineage) = self.lineage(taxid, &mut cache)? {
                lineages.insert(taxid, lineage);
            }
        }
        log::debug!("Looked up {} ancestor nodes in ETE database", cache.len());
        Ok(lineages)
    }
}
