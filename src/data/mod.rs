//! Input file loading
//!
//! Every input is a materialized JSON file named in the config; the core
//! pipeline never does I/O of its own. Optional inputs (corrections,
//! realized team stats, the transfer ledger) degrade to empty when the file
//! is missing, since the upstream feeds deliver them on their own schedule.

use std::collections::HashMap;
use std::path::Path;

use log::warn;
use serde::de::DeserializeOwned;

use crate::corrections::{CorrectionCache, SeasonCorrections};
use crate::{HoopError, PlayerSeasonStats, Result, TeamSeasonStats, TransferLedger};

fn load_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| HoopError::Json {
        path: path.to_string(),
        source,
    })
}

/// Individual player season lines, the one mandatory input
pub fn load_players(path: &str) -> Result<Vec<PlayerSeasonStats>> {
    load_json(path)
}

/// Transfer ledger, player code -> hops. Missing file means no portal
/// activity yet.
pub fn load_transfers(path: &str) -> Result<TransferLedger> {
    if !Path::new(path).exists() {
        warn!("no transfer ledger at {}, assuming none", path);
        return Ok(TransferLedger::new());
    }
    load_json(path)
}

/// Realized team-level stats for review mode. Missing file falls back to
/// the individual-line estimate inside the aggregator.
pub fn load_team_stats(path: &str) -> Result<Vec<TeamSeasonStats>> {
    if !Path::new(path).exists() {
        warn!("no team stats at {}, review mode will estimate", path);
        return Ok(Vec::new());
    }
    load_json(path)
}

/// Manual correction tables keyed by "{Gender}_{Year}", built into the
/// startup cache. Missing file means no corrections.
pub fn load_corrections(path: &str) -> Result<CorrectionCache> {
    if !Path::new(path).exists() {
        warn!("no corrections at {}, using empty cache", path);
        return Ok(CorrectionCache::empty());
    }
    let seasons: HashMap<String, SeasonCorrections> = load_json(path)?;
    Ok(CorrectionCache::new(seasons))
}
