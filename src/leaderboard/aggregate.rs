//! The division aggregation pass

use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, info};

use crate::corrections::{parse_added_players, AddedPlayer, CorrectionTable};
use crate::grades::{DivisionStatistics, OrdF64};
use crate::projection::{
    band_nets, build_totals, calc_depth_bonus, project_roster, Band, DepartureKind, RosterContext,
};
use crate::{Config, Gender, PlayerSeasonStats, TeamSeasonStats, TransferLedger};

use super::{OffseasonTeamInfo, SortKey};

/// Metric names fed into the percentile engine's population
pub const METRIC_OFF: &str = "off_adj_ppp";
pub const METRIC_DEF: &str = "def_adj_ppp";
pub const METRIC_NET: &str = "off_net";

/// Materialized inputs for one aggregation pass. `players` carries the
/// `year` lines the projection starts from, plus the `year + 1` lines the
/// review-mode fallback estimates actuals from.
pub struct DivisionInputs<'a> {
    pub gender: Gender,
    pub year: u16,
    pub players: &'a [PlayerSeasonStats],
    pub transfers: &'a TransferLedger,
    /// Realized team-level stats, review mode only
    pub team_stats: &'a [TeamSeasonStats],
    pub corrections: &'a dyn CorrectionTable,
    pub eval_mode: bool,
}

/// One pass's output: the ranked teams, value-keyed rank maps and the
/// frozen division population for percentile queries.
pub struct OffseasonProjection {
    /// Sorted by the requested key, best first
    pub teams: Vec<OffseasonTeamInfo>,
    /// Metric value -> 0-based rank; tied values share one entry
    pub off_rank: BTreeMap<OrdF64, usize>,
    pub def_rank: BTreeMap<OrdF64, usize>,
    pub net_rank: BTreeMap<OrdF64, usize>,
    pub div_stats: DivisionStatistics,
}

/// Map each team to its candidate player pool: the player's own team, every
/// team reachable through their transfer hops, and any team whose manual
/// added-players spec references their code.
pub fn player_partition<'a>(
    players: &[&'a PlayerSeasonStats],
    inputs: &DivisionInputs,
) -> BTreeMap<String, Vec<&'a PlayerSeasonStats>> {
    let mut map: BTreeMap<String, Vec<&PlayerSeasonStats>> = BTreeMap::new();
    let by_code: HashMap<&str, &PlayerSeasonStats> =
        players.iter().map(|p| (p.code.as_str(), *p)).collect();

    for p in players {
        map.entry(p.team.clone()).or_default().push(p);
        if let Some(hops) = inputs.transfers.get(&p.code) {
            for h in hops {
                for t in [&h.from_team, &h.to_team] {
                    if *t != p.team {
                        map.entry(t.clone()).or_default().push(p);
                    }
                }
            }
        }
    }

    for team in inputs
        .corrections
        .corrected_teams(inputs.gender, inputs.year)
    {
        let entry = map.entry(team.to_string()).or_default();
        if let Some(fix) = inputs.corrections.lookup(team, inputs.gender, inputs.year) {
            for add in parse_added_players(&fix.added_players) {
                if let AddedPlayer::Reference(code) = add {
                    match by_code.get(code.as_str()) {
                        Some(p) => entry.push(p),
                        None => debug!("added-player code {} not found for {}", code, team),
                    }
                }
            }
        }
    }

    // a player can reach the same team through several routes
    for pool in map.values_mut() {
        let mut seen = HashSet::new();
        pool.retain(|p| seen.insert(p.code.clone()));
    }
    map
}

/// Run the projection pipeline over every team, build the division
/// population and rank the results.
pub fn build_leaderboard(
    inputs: &DivisionInputs,
    sort_by: SortKey,
    config: &Config,
) -> OffseasonProjection {
    let season_players: Vec<&PlayerSeasonStats> = inputs
        .players
        .iter()
        .filter(|p| p.year == inputs.year)
        .collect();
    let partition = player_partition(&season_players, inputs);
    debug!(
        "partitioned {} players across {} teams",
        season_players.len(),
        partition.len()
    );

    let mut div_stats = DivisionStatistics::new();
    let mut teams = Vec::with_capacity(partition.len());
    let avg = config.ranking.avg_eff;

    for (team, candidates) in &partition {
        let fix = inputs.corrections.lookup(team, inputs.gender, inputs.year);
        let freshmen = inputs
            .corrections
            .freshmen(team, inputs.gender, inputs.year);
        let ctx = RosterContext {
            team,
            candidates,
            transfers: inputs.transfers,
            fix,
            freshmen,
            config: &config.projection,
        };
        let proj = project_roster(&ctx);
        let depth = calc_depth_bonus(&proj.triples, &config.projection);
        let ok = build_totals(&proj.triples, Band::Ok, &depth, 0.0);
        let (good_net, bad_net) = band_nets(&proj.triples, &ok, &config.projection);

        div_stats.accumulate(METRIC_OFF, avg + ok.off, false);
        div_stats.accumulate(METRIC_DEF, avg + ok.def, false);
        div_stats.accumulate(METRIC_NET, ok.net, false);

        // a departure may not be credited for more than a third of net
        let benefit_cap = config.ranking.benefit_cap_frac * ok.net;
        let mut out_capped = 0.0;
        let mut nba_capped = 0.0;
        let mut sr_capped = 0.0;
        for d in &proj.departures {
            let capped = d.net.max(-benefit_cap);
            match d.kind {
                DepartureKind::Transfer => out_capped += capped,
                DepartureKind::Pro => nba_capped += capped,
                DepartureKind::Graduation => sr_capped += capped,
            }
        }

        let actuals = if inputs.eval_mode {
            resolve_actuals(team, inputs, config)
        } else {
            None
        };
        let d = proj.decomposition;
        teams.push(OffseasonTeamInfo {
            team: team.clone(),
            conf: resolve_conference(team, candidates, inputs),
            year: inputs.year,
            off: ok.off,
            def: ok.def,
            net: ok.net,
            good_net,
            bad_net,
            actual_off: actuals.map(|a| a.0),
            actual_def: actuals.map(|a| a.1),
            actual_net: actuals.map(|a| a.2),
            in_off: d.in_off,
            in_def: d.in_def,
            out_off: d.out_off,
            out_def: d.out_def,
            nba_off: d.nba_off,
            nba_def: d.nba_def,
            sr_off: d.sr_off,
            sr_def: d.sr_def,
            dev_off: d.dev_off,
            dev_def: d.dev_def,
            fr_net: d.fr_net,
            out_net_capped: out_capped,
            nba_net_capped: nba_capped,
            sr_net_capped: sr_capped,
            counts: proj.counts,
        });
    }

    div_stats.finalize();

    teams.sort_by(|a, b| {
        b.sort_value(sort_by)
            .total_cmp(&a.sort_value(sort_by))
            .then_with(|| a.team.cmp(&b.team))
    });
    info!(
        "ranked {} {} teams for {} by {}",
        teams.len(),
        inputs.gender,
        inputs.year + 1,
        sort_by
    );

    let off_rank = rank_map(&teams, |t| t.off, false);
    let def_rank = rank_map(&teams, |t| t.def, true);
    let net_rank = rank_map(&teams, |t| t.net, false);
    OffseasonProjection {
        teams,
        off_rank,
        def_rank,
        net_rank,
        div_stats,
    }
}

fn resolve_conference(
    team: &str,
    candidates: &[&PlayerSeasonStats],
    inputs: &DivisionInputs,
) -> String {
    if let Some(conf) = inputs
        .corrections
        .conf_change(team, inputs.gender, inputs.year)
    {
        return conf.to_string();
    }
    candidates
        .iter()
        .filter(|p| p.team == team)
        .find_map(|p| p.conf.clone())
        .unwrap_or_else(|| "???".to_string())
}

/// Realized margins for the following season: official team-level stats
/// when available (luck-adjusted preferred), else an estimate from the
/// team's individual lines with a replacement-level penalty for the
/// unaccounted possession share, else nothing.
fn resolve_actuals(
    team: &str,
    inputs: &DivisionInputs,
    config: &Config,
) -> Option<(f64, f64, f64)> {
    let next = inputs.year + 1;
    let avg = config.ranking.avg_eff;

    if let Some(ts) = inputs
        .team_stats
        .iter()
        .find(|t| t.team == team && t.year == next)
    {
        if let (Some(o), Some(d)) = (ts.pick_off(), ts.pick_def()) {
            let off = o - avg;
            let def = d - avg;
            return Some((off, def, off - def));
        }
    }

    let lines: Vec<&PlayerSeasonStats> = inputs
        .players
        .iter()
        .filter(|p| p.year == next && p.team == team)
        .collect();
    if lines.is_empty() {
        return None;
    }
    let mut off = 0.0;
    let mut def = 0.0;
    let mut covered = 0.0;
    for p in &lines {
        off += p.off_adj * p.poss_pct;
        def += p.def_adj * p.poss_pct;
        covered += p.poss_pct;
    }
    let short = (1.0 - covered).max(0.0);
    off += config.projection.replacement_penalty * short / 2.0;
    def -= config.projection.replacement_penalty * short / 2.0;
    Some((off, def, off - def))
}

fn rank_map<F>(teams: &[OffseasonTeamInfo], metric: F, ascending: bool) -> BTreeMap<OrdF64, usize>
where
    F: Fn(&OffseasonTeamInfo) -> f64,
{
    let mut vals: Vec<f64> = teams.iter().map(metric).collect();
    vals.sort_by(|a, b| {
        if ascending {
            a.total_cmp(b)
        } else {
            b.total_cmp(a)
        }
    });
    let mut map = BTreeMap::new();
    for (i, v) in vals.into_iter().enumerate() {
        map.insert(OrdF64(v), i);
    }
    map
}
