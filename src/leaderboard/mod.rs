//! Division-wide aggregation and ranking
//!
//! Fans the roster projection pipeline out over every team in a division,
//! feeds the results into the percentile engine's population and ranks the
//! teams by a selectable sort key.

mod aggregate;
mod info;

pub use aggregate::{
    build_leaderboard, player_partition, DivisionInputs, OffseasonProjection, METRIC_DEF,
    METRIC_NET, METRIC_OFF,
};
pub use info::{OffseasonTeamInfo, SortKey};
