//! Ranked team output and sort keys

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::projection::RosterCounts;
use crate::HoopError;

/// Per-team projection summary for one off-season pass. Built fresh each
/// aggregation, immutable once returned.
#[derive(Debug, Clone, Serialize)]
pub struct OffseasonTeamInfo {
    pub team: String,
    pub conf: String,
    /// Season the player lines came from; the projection targets year + 1
    pub year: u16,
    /// Projected efficiency, pts/100 above division average
    pub off: f64,
    pub def: f64,
    pub net: f64,
    /// Optimistic and pessimistic net bands
    pub good_net: f64,
    pub bad_net: f64,
    /// Realized margins for the following season, review mode only
    pub actual_off: Option<f64>,
    pub actual_def: Option<f64>,
    pub actual_net: Option<f64>,
    // transfer decomposition margins, rating x possession share
    pub in_off: f64,
    pub in_def: f64,
    pub out_off: f64,
    pub out_def: f64,
    pub nba_off: f64,
    pub nba_def: f64,
    pub sr_off: f64,
    pub sr_def: f64,
    pub dev_off: f64,
    pub dev_def: f64,
    pub fr_net: f64,
    /// Departure nets with the benefit cap applied, used by the sort keys
    pub out_net_capped: f64,
    pub nba_net_capped: f64,
    pub sr_net_capped: f64,
    pub counts: RosterCounts,
}

impl OffseasonTeamInfo {
    pub fn in_net(&self) -> f64 {
        self.in_off - self.in_def
    }

    pub fn dev_net(&self) -> f64 {
        self.dev_off - self.dev_def
    }

    /// Transfer in/out margin with the out side capped
    pub fn transfer_io(&self) -> f64 {
        self.in_net() - self.out_net_capped
    }

    /// Net off-season movement: freshman class plus transfer in/out minus
    /// pro and graduation departures
    pub fn offseason_net(&self) -> f64 {
        self.fr_net + self.transfer_io() - self.nba_net_capped - self.sr_net_capped
    }

    /// Everything that changed, movement plus development
    pub fn total_io(&self) -> f64 {
        self.offseason_net() + self.dev_net()
    }

    pub fn sort_value(&self, key: SortKey) -> f64 {
        match key {
            SortKey::Net => self.net,
            SortKey::OffseasonNet => self.offseason_net(),
            SortKey::DevIn => self.dev_net(),
            SortKey::TotalIo => self.total_io(),
            SortKey::TxferIn => self.in_net(),
            SortKey::TxferOut => -self.out_net_capped,
            SortKey::TxferIo => self.transfer_io(),
            SortKey::NbaOut => -self.nba_net_capped,
            SortKey::SrOut => -self.sr_net_capped,
        }
    }
}

/// Leaderboard sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Net,
    OffseasonNet,
    DevIn,
    TotalIo,
    TxferIn,
    TxferOut,
    TxferIo,
    NbaOut,
    SrOut,
}

impl SortKey {
    pub fn code(&self) -> &'static str {
        match self {
            SortKey::Net => "net",
            SortKey::OffseasonNet => "offseason_net",
            SortKey::DevIn => "dev_in",
            SortKey::TotalIo => "total_io",
            SortKey::TxferIn => "txfer_in",
            SortKey::TxferOut => "txfer_out",
            SortKey::TxferIo => "txfer_io",
            SortKey::NbaOut => "nba_out",
            SortKey::SrOut => "sr_out",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for SortKey {
    type Err = HoopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "net" => Ok(SortKey::Net),
            "offseason_net" => Ok(SortKey::OffseasonNet),
            "dev_in" => Ok(SortKey::DevIn),
            "total_io" => Ok(SortKey::TotalIo),
            "txfer_in" => Ok(SortKey::TxferIn),
            "txfer_out" => Ok(SortKey::TxferOut),
            "txfer_io" => Ok(SortKey::TxferIo),
            "nba_out" => Ok(SortKey::NbaOut),
            "sr_out" => Ok(SortKey::SrOut),
            other => Err(HoopError::UnknownSortKey(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_info() -> OffseasonTeamInfo {
        OffseasonTeamInfo {
            team: "Kansas".to_string(),
            conf: "B12".to_string(),
            year: 2024,
            off: 6.0,
            def: -3.0,
            net: 9.0,
            good_net: 11.0,
            bad_net: 7.0,
            actual_off: None,
            actual_def: None,
            actual_net: None,
            in_off: 1.2,
            in_def: -0.3,
            out_off: 0.8,
            out_def: 0.2,
            nba_off: 0.0,
            nba_def: 0.0,
            sr_off: 0.5,
            sr_def: -0.1,
            dev_off: 0.4,
            dev_def: -0.2,
            fr_net: 0.9,
            out_net_capped: 0.6,
            nba_net_capped: 0.0,
            sr_net_capped: 0.6,
            counts: Default::default(),
        }
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("net".parse::<SortKey>().unwrap(), SortKey::Net);
        assert_eq!(
            "OFFSEASON_NET".parse::<SortKey>().unwrap(),
            SortKey::OffseasonNet
        );
        assert!("sideways".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_offseason_net_formula() {
        let info = make_info();
        let expected = info.fr_net + (info.in_net() - info.out_net_capped)
            - info.nba_net_capped
            - info.sr_net_capped;
        assert!((info.sort_value(SortKey::OffseasonNet) - expected).abs() < 1e-12);
        assert!((info.sort_value(SortKey::TotalIo) - (expected + info.dev_net())).abs() < 1e-12);
    }

    #[test]
    fn test_departure_keys_negate_capped_margins() {
        let info = make_info();
        assert_eq!(info.sort_value(SortKey::TxferOut), -0.6);
        assert_eq!(info.sort_value(SortKey::SrOut), -0.6);
    }
}
