//! Roster projection pipeline
//!
//! Turns one team's candidate player pool plus this off-season's manual
//! edits into per-player good/bad/ok projection triples and team totals.

mod roster;
mod totals;

pub use roster::{
    project_roster, Decomposition, Departure, DepartureKind, RosterContext, RosterCounts,
    RosterProjection,
};
pub use totals::{band_nets, build_totals, calc_depth_bonus, DepthBonus, Totals};

use serde::Serialize;

use crate::{PlayerClass, Position};

/// One band of projected per-player stats. Ratings are pts/100 relative to
/// the division average; `poss_pct` is the player's share of the team's
/// weighted possession total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProjectedStats {
    pub off_adj: f64,
    pub def_adj: f64,
    pub poss_pct: f64,
}

/// Projection band selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// Optimistic, one standard deviation up
    Good,
    /// Pessimistic, one standard deviation down
    Bad,
    /// Expected value
    Ok,
    /// Last season's raw line
    Orig,
}

/// Per-player projection: optimistic/pessimistic/expected bands plus the
/// original stat line the projection started from.
#[derive(Debug, Clone, Serialize)]
pub struct GoodBadOkTriple {
    pub key: String,
    pub good: ProjectedStats,
    pub bad: ProjectedStats,
    pub ok: ProjectedStats,
    pub orig: ProjectedStats,
    pub pos: Position,
    /// Class for the coming season; bench placeholders have none
    pub class: Option<PlayerClass>,
    /// Bench archetype placeholder, not a real player
    pub bench: bool,
    /// Injected via an added-player or freshman correction
    pub added: bool,
    /// Disabled by a manual fix: minutes zeroed, still counted in the
    /// roster composition
    pub disabled: bool,
}

impl GoodBadOkTriple {
    pub fn stats(&self, band: Band) -> &ProjectedStats {
        match band {
            Band::Good => &self.good,
            Band::Bad => &self.bad,
            Band::Ok => &self.ok,
            Band::Orig => &self.orig,
        }
    }
}
