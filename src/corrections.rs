//! Manual correction tables
//!
//! Season-by-season corrections (added/removed/disabled players, rating
//! overrides, freshman-class injections, conference changes) are opaque
//! configuration keyed by `"{Gender}_{Year}"`. The cache is built once at
//! startup from the loaded data and injected into the aggregation pass; the
//! pipeline only ever sees the `CorrectionTable` trait.

use std::collections::{HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{Gender, PlayerClass, Position};

/// One per-player rating override.
///
/// Parameters are free-form; the pipeline applies the keys it knows
/// (`off_adj`, `def_adj`, `poss_pct`) and silently ignores the rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerEdit {
    pub key: String,
    #[serde(default)]
    pub params: HashMap<String, f64>,
}

/// Manual fixes for one team in one off-season
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamManualFix {
    /// Added-player spec string; see `parse_added_players`
    #[serde(default)]
    pub added_players: String,
    #[serde(default)]
    pub overrides: Vec<PlayerEdit>,
    /// Minutes zeroed but still counted in roster composition
    #[serde(default)]
    pub disabled_players: HashSet<String>,
    /// Removed from the roster entirely
    #[serde(default)]
    pub deleted_players: HashSet<String>,
    /// Seniors keep their extra year instead of graduating
    #[serde(default)]
    pub super_seniors_back: bool,
    /// Bench quality profile, e.g. "4*/T40ish"
    #[serde(default)]
    pub bench_profile: Option<String>,
}

/// Injected freshman-class projection for one recruit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreshmanIntake {
    pub key: String,
    pub pos: Position,
    pub off_adj: f64,
    pub def_adj: f64,
    pub poss_pct: f64,
}

/// One season's worth of corrections, keyed by team
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeasonCorrections {
    #[serde(default)]
    pub fixes: HashMap<String, TeamManualFix>,
    #[serde(default)]
    pub freshmen: HashMap<String, Vec<FreshmanIntake>>,
    /// Off-season conference moves, team -> new conference
    #[serde(default)]
    pub conf_changes: HashMap<String, String>,
}

/// Read-only correction lookup, pure in `(team, gender, year)`
pub trait CorrectionTable {
    fn lookup(&self, team: &str, gender: Gender, year: u16) -> Option<&TeamManualFix>;
    fn freshmen(&self, team: &str, gender: Gender, year: u16) -> &[FreshmanIntake];
    fn conf_change(&self, team: &str, gender: Gender, year: u16) -> Option<&str>;
    /// Teams carrying a fix or a freshman class this season
    fn corrected_teams(&self, gender: Gender, year: u16) -> Vec<&str>;
}

pub fn season_key(gender: Gender, year: u16) -> String {
    format!("{}_{}", gender.code(), year)
}

/// Correction cache constructed once at startup and never mutated
#[derive(Debug, Clone, Default)]
pub struct CorrectionCache {
    seasons: HashMap<String, SeasonCorrections>,
}

impl CorrectionCache {
    pub fn new(seasons: HashMap<String, SeasonCorrections>) -> Self {
        CorrectionCache { seasons }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn season_count(&self) -> usize {
        self.seasons.len()
    }

    fn season(&self, gender: Gender, year: u16) -> Option<&SeasonCorrections> {
        self.seasons.get(&season_key(gender, year))
    }
}

impl CorrectionTable for CorrectionCache {
    fn lookup(&self, team: &str, gender: Gender, year: u16) -> Option<&TeamManualFix> {
        self.season(gender, year)?.fixes.get(team)
    }

    fn freshmen(&self, team: &str, gender: Gender, year: u16) -> &[FreshmanIntake] {
        self.season(gender, year)
            .and_then(|s| s.freshmen.get(team))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn conf_change(&self, team: &str, gender: Gender, year: u16) -> Option<&str> {
        self.season(gender, year)?
            .conf_changes
            .get(team)
            .map(String::as_str)
    }

    fn corrected_teams(&self, gender: Gender, year: u16) -> Vec<&str> {
        match self.season(gender, year) {
            Some(s) => {
                let mut teams: Vec<&str> = s
                    .fixes
                    .keys()
                    .chain(s.freshmen.keys())
                    .map(String::as_str)
                    .collect();
                teams.sort_unstable();
                teams.dedup();
                teams
            }
            None => Vec::new(),
        }
    }
}

/// Parsed added-player entry: either a reference to an existing player's
/// code (pulling their real stat line onto the team) or a fully synthetic
/// record with its own projected ratings.
#[derive(Debug, Clone, PartialEq)]
pub enum AddedPlayer {
    Reference(String),
    Synthetic(SyntheticPlayer),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticPlayer {
    pub key: String,
    pub pos: Position,
    pub class: PlayerClass,
    pub off_adj: f64,
    pub def_adj: f64,
    pub poss_pct: f64,
}

/// Parse an added-players spec string.
///
/// Entries are `;`-separated. A bare token references a player code; a full
/// entry is `"Key|POS|class|off/def/poss"`. Malformed entries are skipped.
pub fn parse_added_players(spec: &str) -> Vec<AddedPlayer> {
    let mut out = Vec::new();
    for entry in spec.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let fields: Vec<&str> = entry.split('|').map(str::trim).collect();
        if fields.len() == 1 {
            out.push(AddedPlayer::Reference(fields[0].to_string()));
            continue;
        }
        if fields.len() != 4 {
            debug!("skipping malformed added-player entry: {}", entry);
            continue;
        }
        let pos = Position::from_role(fields[1]);
        let class = match PlayerClass::from_code(fields[2]) {
            Some(c) => c,
            None => {
                debug!("skipping added-player entry with bad class: {}", entry);
                continue;
            }
        };
        let nums: Vec<f64> = fields[3]
            .split('/')
            .filter_map(|n| n.trim().parse().ok())
            .collect();
        if nums.len() != 3 {
            debug!("skipping added-player entry with bad ratings: {}", entry);
            continue;
        }
        out.push(AddedPlayer::Synthetic(SyntheticPlayer {
            key: fields[0].to_string(),
            pos,
            class,
            off_adj: nums[0],
            def_adj: nums[1],
            poss_pct: nums[2],
        }));
    }
    out
}
