//! Prediction accuracy scoring
//!
//! Review-mode bookkeeping: compares predicted ranks against realized
//! results across graduated rank-threshold rules, accumulating hit counts,
//! named misses and running error statistics. Rank-correlation itself is a
//! downstream concern; this module only emits the paired rank lists.

use std::fmt;

use crate::leaderboard::OffseasonTeamInfo;

/// One graduated threshold rule: teams predicted inside `lower_rank` are
/// checked against where they actually landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalRule {
    pub lower_rank: usize,
    /// Actual rank at or inside this counts as a hit
    pub good_threshold: usize,
    /// Actual rank beyond this counts as a named miss
    pub bad_threshold: usize,
}

/// The fixed rule set for whole-division evaluation
pub const GLOBAL_RULES: [EvalRule; 4] = [
    EvalRule {
        lower_rank: 10,
        good_threshold: 15,
        bad_threshold: 30,
    },
    EvalRule {
        lower_rank: 25,
        good_threshold: 35,
        bad_threshold: 60,
    },
    EvalRule {
        lower_rank: 50,
        good_threshold: 65,
        bad_threshold: 80,
    },
    EvalRule {
        lower_rank: 75,
        good_threshold: 100,
        bad_threshold: 120,
    },
];

/// One-pass running mean and mean-of-squares over prediction errors
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalStatSubResults {
    pub n: usize,
    mean: f64,
    mean_sq: f64,
}

impl EvalStatSubResults {
    pub fn update(&mut self, datum: f64) {
        self.n += 1;
        let w = 1.0 / self.n as f64;
        self.mean += (datum - self.mean) * w;
        self.mean_sq += (datum * datum - self.mean_sq) * w;
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        (self.mean_sq - self.mean * self.mean).max(0.0).sqrt()
    }
}

/// Hits and named misses for one side (predicted or actual) of a rule
#[derive(Debug, Clone, Default)]
pub struct EvalSide {
    pub good: usize,
    pub bad: Vec<String>,
}

/// Accumulated results for one rule
#[derive(Debug, Clone)]
pub struct EvalResults {
    pub rule: EvalRule,
    pub predicted: EvalSide,
    pub actual: EvalSide,
    pub net_delta: EvalStatSubResults,
    pub off_delta: EvalStatSubResults,
    pub def_delta: EvalStatSubResults,
}

impl EvalResults {
    fn new(rule: EvalRule) -> Self {
        EvalResults {
            rule,
            predicted: EvalSide::default(),
            actual: EvalSide::default(),
            net_delta: EvalStatSubResults::default(),
            off_delta: EvalStatSubResults::default(),
            def_delta: EvalStatSubResults::default(),
        }
    }
}

impl fmt::Display for EvalResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "top {:>3}: predicted {}/{} | actual {}/{} | net err {:+.2} ({:.2})",
            self.rule.lower_rank,
            self.predicted.good,
            self.predicted.good + self.predicted.bad.len(),
            self.actual.good,
            self.actual.good + self.actual.bad.len(),
            self.net_delta.mean(),
            self.net_delta.std_dev()
        )
    }
}

/// Paired 1-based (predicted, actual) ranks for downstream rank-correlation
#[derive(Debug, Clone, Default)]
pub struct PredictedVsActualRankings {
    /// Every team with a known actual rank
    pub pairs: Vec<(usize, usize)>,
    /// Restricted to teams predicted inside the widest rule
    pub rule_only: Vec<(usize, usize)>,
}

struct Scored<'a> {
    info: &'a OffseasonTeamInfo,
    pred: usize,
    actual: usize,
}

/// Rank the field by projected net (against everyone) and by realized net
/// (against teams with a known actual); teams without actuals are simply
/// excluded from the scored set.
fn score_field(teams: &[OffseasonTeamInfo]) -> Vec<Scored> {
    let mut pred_order: Vec<usize> = (0..teams.len()).collect();
    pred_order.sort_by(|&a, &b| teams[b].net.total_cmp(&teams[a].net));
    let mut pred_rank = vec![0usize; teams.len()];
    for (rank, idx) in pred_order.iter().enumerate() {
        pred_rank[*idx] = rank + 1;
    }

    let mut with_actuals: Vec<usize> = (0..teams.len())
        .filter(|&i| teams[i].actual_net.is_some())
        .collect();
    with_actuals.sort_by(|&a, &b| {
        teams[b]
            .actual_net
            .unwrap()
            .total_cmp(&teams[a].actual_net.unwrap())
    });

    with_actuals
        .iter()
        .enumerate()
        .map(|(rank, &idx)| Scored {
            info: &teams[idx],
            pred: pred_rank[idx],
            actual: rank + 1,
        })
        .collect()
}

/// Single dynamic rule for a filtered (e.g. one-conference) field, split at
/// the median actual rank within the set.
pub fn dynamic_rules(teams: &[OffseasonTeamInfo]) -> Vec<EvalRule> {
    let known = teams.iter().filter(|t| t.actual_net.is_some()).count();
    if known == 0 {
        return Vec::new();
    }
    let median = known.div_ceil(2);
    vec![EvalRule {
        lower_rank: median,
        good_threshold: median,
        bad_threshold: median,
    }]
}

/// Score every team with a known actual rank against each rule.
pub fn evaluate_projections(
    teams: &[OffseasonTeamInfo],
    rules: &[EvalRule],
) -> (Vec<EvalResults>, PredictedVsActualRankings) {
    let scored = score_field(teams);
    let mut results: Vec<EvalResults> = rules.iter().map(|r| EvalResults::new(*r)).collect();
    let mut rankings = PredictedVsActualRankings::default();
    let max_lower = rules.iter().map(|r| r.lower_rank).max().unwrap_or(0);

    for s in &scored {
        rankings.pairs.push((s.pred, s.actual));
        if s.pred <= max_lower {
            rankings.rule_only.push((s.pred, s.actual));
        }
        for res in results.iter_mut() {
            let rule = res.rule;
            if s.pred <= rule.lower_rank {
                if s.actual <= rule.good_threshold {
                    res.predicted.good += 1;
                } else if s.actual > rule.bad_threshold {
                    res.predicted
                        .bad
                        .push(format!("{} [{}] vs [{}]", s.info.team, s.pred, s.actual));
                }
                if let (Some(an), Some(ao), Some(ad)) =
                    (s.info.actual_net, s.info.actual_off, s.info.actual_def)
                {
                    res.net_delta.update(an - s.info.net);
                    res.off_delta.update(ao - s.info.off);
                    res.def_delta.update(ad - s.info.def);
                }
            }
            if s.actual <= rule.lower_rank {
                if s.pred <= rule.good_threshold {
                    res.actual.good += 1;
                } else if s.pred > rule.bad_threshold {
                    res.actual
                        .bad
                        .push(format!("{} [{}] vs [{}]", s.info.team, s.pred, s.actual));
                }
            }
        }
    }
    (results, rankings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_info(team: &str, net: f64, actual_net: Option<f64>) -> OffseasonTeamInfo {
        OffseasonTeamInfo {
            team: team.to_string(),
            conf: "B12".to_string(),
            year: 2024,
            off: net / 2.0,
            def: -net / 2.0,
            net,
            good_net: net + 2.0,
            bad_net: net - 2.0,
            actual_off: actual_net.map(|n| n / 2.0),
            actual_def: actual_net.map(|n| -n / 2.0),
            actual_net,
            in_off: 0.0,
            in_def: 0.0,
            out_off: 0.0,
            out_def: 0.0,
            nba_off: 0.0,
            nba_def: 0.0,
            sr_off: 0.0,
            sr_def: 0.0,
            dev_off: 0.0,
            dev_def: 0.0,
            fr_net: 0.0,
            out_net_capped: 0.0,
            nba_net_capped: 0.0,
            sr_net_capped: 0.0,
            counts: Default::default(),
        }
    }

    /// Forty teams predicted in net order; realized order flips two of them
    /// far enough apart to trip the first rule both ways.
    fn field() -> Vec<OffseasonTeamInfo> {
        let mut teams = Vec::new();
        for i in 0..40 {
            let net = 20.0 - i as f64; // predicted rank i+1
            let actual = match i {
                2 => Some(-25.0),  // predicted 3rd, lands 40th
                39 => Some(21.0),  // predicted 40th, lands 1st
                _ => Some(net),
            };
            teams.push(make_info(&format!("T{:02}", i + 1), net, actual));
        }
        teams
    }

    #[test]
    fn test_rule_counting_and_named_misses() {
        let teams = field();
        let (results, _) = evaluate_projections(&teams, &GLOBAL_RULES);

        let top10 = &results[0];
        // nine of the predicted top ten landed inside 15; T03 fell to 40
        assert_eq!(top10.predicted.good, 9);
        assert_eq!(top10.predicted.bad, vec!["T03 [3] vs [40]".to_string()]);
        // actual top ten: nine were predicted inside 15, T40 came from 40
        assert_eq!(top10.actual.good, 9);
        assert_eq!(top10.actual.bad, vec!["T40 [40] vs [1]".to_string()]);
    }

    #[test]
    fn test_between_thresholds_is_neither() {
        // predicted 1st, lands 20th: outside good (15), inside bad (30)
        let teams = vec![
            make_info("Hit", 10.0, Some(5.0)),
            make_info("Tweener", 12.0, Some(-5.0)),
        ];
        // ranks: Tweener pred 1 actual 2, Hit pred 2 actual 1
        let rule = EvalRule {
            lower_rank: 1,
            good_threshold: 1,
            bad_threshold: 3,
        };
        let (results, _) = evaluate_projections(&teams, &[rule]);
        assert_eq!(results[0].predicted.good, 0);
        assert!(results[0].predicted.bad.is_empty());
    }

    #[test]
    fn test_running_mean_and_std() {
        let mut stats = EvalStatSubResults::default();
        let data = [1.5, -2.0, 0.5, 3.0];
        for d in data {
            stats.update(d);
        }
        let mean: f64 = data.iter().sum::<f64>() / data.len() as f64;
        let var: f64 =
            data.iter().map(|d| (d - mean) * (d - mean)).sum::<f64>() / data.len() as f64;
        assert!((stats.mean() - mean).abs() < 1e-12);
        assert!((stats.std_dev() - var.sqrt()).abs() < 1e-12);
        assert_eq!(stats.n, 4);
    }

    #[test]
    fn test_delta_stats_cover_predicted_group() {
        let teams = field();
        let (results, _) = evaluate_projections(&teams, &GLOBAL_RULES);
        // one delta sample per predicted-top-10 team
        assert_eq!(results[0].net_delta.n, 10);
        assert_eq!(results[1].net_delta.n, 25);
    }

    #[test]
    fn test_rank_pairs_and_rule_only() {
        let teams = field();
        let (_, rankings) = evaluate_projections(&teams, &GLOBAL_RULES);
        assert_eq!(rankings.pairs.len(), 40);
        // widest rule reaches predicted rank 75, so everything qualifies
        assert_eq!(rankings.rule_only.len(), 40);
        // a perfect prediction pairs equal ranks for untouched teams
        assert!(rankings.pairs.contains(&(1, 2))); // T01 slid behind T40
    }

    #[test]
    fn test_teams_without_actuals_are_excluded() {
        let teams = vec![
            make_info("Known", 10.0, Some(8.0)),
            make_info("Unknown", 12.0, None),
        ];
        let (results, rankings) = evaluate_projections(&teams, &GLOBAL_RULES);
        assert_eq!(rankings.pairs.len(), 1);
        // Known is predicted 2nd in the full field but 1st among actuals
        assert_eq!(rankings.pairs[0], (2, 1));
        assert_eq!(results[0].predicted.good, 1);
    }

    #[test]
    fn test_dynamic_rule_splits_at_median() {
        let teams: Vec<OffseasonTeamInfo> = (0..9)
            .map(|i| make_info(&format!("T{}", i), 10.0 - i as f64, Some(10.0 - i as f64)))
            .collect();
        let rules = dynamic_rules(&teams);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].lower_rank, 5);
        assert_eq!(rules[0].good_threshold, 5);

        assert!(dynamic_rules(&[make_info("NoActual", 1.0, None)]).is_empty());
    }
}
