//! Off-season college basketball projection leaderboard
//!
//! Projects each team's efficiency for the coming season from last season's
//! individual player lines, transfers and manual corrections, then ranks every
//! team in the division against each other.

pub mod corrections;
pub mod data;
pub mod evaluate;
pub mod grades;
pub mod leaderboard;
pub mod projection;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Division gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Men,
    Women,
}

impl Gender {
    pub fn code(&self) -> &'static str {
        match self {
            Gender::Men => "Men",
            Gender::Women => "Women",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_lowercase().as_str() {
            "men" | "m" => Some(Gender::Men),
            "women" | "w" => Some(Gender::Women),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Coarse positional archetype used for bench placeholders and class curves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Guard,
    Wing,
    Big,
}

impl Position {
    /// Map a roster position string ("PG", "s-PF", "C", ...) to an archetype
    pub fn from_role(role: &str) -> Position {
        let r = role.trim_start_matches("s-").to_uppercase();
        match r.as_str() {
            "PG" | "CG" | "SG" | "G" => Position::Guard,
            "C" | "PF" | "PF/C" | "F/C" => Position::Big,
            _ => Position::Wing,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Position::Guard => "G",
            Position::Wing => "W",
            Position::Big => "B",
        }
    }
}

/// Academic class, drives the development curve and departure rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerClass {
    Freshman,
    Sophomore,
    Junior,
    Senior,
    SuperSenior,
}

impl PlayerClass {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_lowercase().as_str() {
            "fr" => Some(PlayerClass::Freshman),
            "so" => Some(PlayerClass::Sophomore),
            "jr" => Some(PlayerClass::Junior),
            "sr" => Some(PlayerClass::Senior),
            "sr+" | "gr" => Some(PlayerClass::SuperSenior),
            _ => None,
        }
    }

    /// Class after one more season, None once eligibility is exhausted
    pub fn next(&self) -> Option<PlayerClass> {
        match self {
            PlayerClass::Freshman => Some(PlayerClass::Sophomore),
            PlayerClass::Sophomore => Some(PlayerClass::Junior),
            PlayerClass::Junior => Some(PlayerClass::Senior),
            PlayerClass::Senior => Some(PlayerClass::SuperSenior),
            PlayerClass::SuperSenior => None,
        }
    }
}

/// One player-season stat line, everything the projection needs.
///
/// Ratings are points per 100 possessions relative to the division average,
/// so an average player carries 0.0/0.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSeasonStats {
    /// Display key, e.g. "AaronBradshaw::Kentucky"
    pub key: String,
    /// Stable player code used by the transfer ledger
    pub code: String,
    pub team: String,
    /// Season start year (2023 means the 2023/24 season)
    pub year: u16,
    #[serde(default)]
    pub conf: Option<String>,
    pub pos: Position,
    pub class: PlayerClass,
    /// Offensive rating above division average, pts/100
    pub off_adj: f64,
    /// Defensive rating above division average, pts/100 (lower is better)
    pub def_adj: f64,
    /// Share of team possessions the player is on the floor for (0..1)
    pub poss_pct: f64,
    /// Declared for the professional draft (leaves regardless of class)
    #[serde(default)]
    pub pro_departure: bool,
}

/// Realized team-level stats for a season, used in review mode.
///
/// `luck_adj_*` are the luck-adjusted efficiencies; the raw `adj_*` pair is
/// the fallback when luck adjustment is unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSeasonStats {
    pub team: String,
    pub year: u16,
    /// Adjusted offensive efficiency, pts/100 (absolute, not relative)
    pub adj_off: Option<f64>,
    pub adj_def: Option<f64>,
    pub luck_adj_off: Option<f64>,
    pub luck_adj_def: Option<f64>,
}

impl TeamSeasonStats {
    /// Luck-adjusted-or-raw picker for the offensive end
    pub fn pick_off(&self) -> Option<f64> {
        self.luck_adj_off.or(self.adj_off)
    }

    pub fn pick_def(&self) -> Option<f64> {
        self.luck_adj_def.or(self.adj_def)
    }
}

/// A single transfer hop for one player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub from_team: String,
    pub to_team: String,
}

/// Player code -> transfer hops for the off-season being projected
pub type TransferLedger = HashMap<String, Vec<Transfer>>;

/// Application-wide errors.
///
/// The projection core degrades gracefully instead of erroring; these cover
/// the edges where the CLI loads configuration and input files.
#[derive(Debug, Error)]
pub enum HoopError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("Unknown gender: {0} (use men or women)")]
    UnknownGender(String),

    #[error("Unknown sort key: {0}")]
    UnknownSortKey(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, HoopError>;

/// Application configuration loaded from hooprank.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub projection: ProjectionConfig,
    pub ranking: RankingConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Uncertainty band width for an established player, pts/100 each way
    pub rating_sigma: f64,
    /// Band multiplier for players without a college season (freshmen/bench)
    pub unproven_sigma_mult: f64,
    /// Bench-level offensive rating relative to average, pts/100
    pub bench_off_adj: f64,
    /// Bench-level defensive rating relative to average, pts/100
    pub bench_def_adj: f64,
    /// Weight applied to beyond-the-rotation quality in the depth bonus
    pub depth_weight: f64,
    /// Depth bonus clamp, pts/100 each way
    pub depth_cap: f64,
    /// Rotation players assumed quasi-independent when shrinking bands
    pub band_players: f64,
    /// Replacement-level net penalty per unit of unaccounted possession share
    pub replacement_penalty: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// A departure may not be credited for more than this fraction of net
    pub benefit_cap_frac: f64,
    /// Division average efficiency, pts/100 (both ends)
    pub avg_eff: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub players_path: String,
    pub transfers_path: String,
    pub team_stats_path: String,
    pub corrections_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            projection: ProjectionConfig {
                rating_sigma: 1.6,
                unproven_sigma_mult: 1.75,
                bench_off_adj: -3.0,
                bench_def_adj: 1.5,
                depth_weight: 0.3,
                depth_cap: 1.5,
                band_players: 5.0,
                replacement_penalty: -6.0,
            },
            ranking: RankingConfig {
                benefit_cap_frac: 1.0 / 3.0,
                avg_eff: 100.0,
            },
            data: DataConfig {
                players_path: "data/players.json".to_string(),
                transfers_path: "data/transfers.json".to_string(),
                team_stats_path: "data/team_stats.json".to_string(),
                corrections_path: "data/corrections.json".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HoopError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| HoopError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| HoopError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
