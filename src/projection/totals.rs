//! Team totals, depth bonus and projection bands

use crate::ProjectionConfig;

use super::{Band, GoodBadOkTriple};

/// Rotation size the depth bonus looks beyond
const ROTATION_SIZE: usize = 5;

/// Team efficiency totals, pts/100 relative to the division average
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub off: f64,
    pub def: f64,
    pub net: f64,
}

/// Roster-depth adjustment beyond the top contributors
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DepthBonus {
    pub off: f64,
    pub def: f64,
}

/// Possession-weighted team totals for one projection band.
///
/// `adj` is an extra anchor shift applied to both ends, zero in normal use.
pub fn build_totals(
    triples: &[GoodBadOkTriple],
    band: Band,
    depth: &DepthBonus,
    adj: f64,
) -> Totals {
    let mut off = depth.off + adj;
    let mut def = depth.def + adj;
    for t in triples {
        let s = t.stats(band);
        off += s.off_adj * s.poss_pct;
        def += s.def_adj * s.poss_pct;
    }
    Totals {
        off,
        def,
        net: off - def,
    }
}

/// Depth bonus: quality beyond the top rotation, measured against bench
/// level, weighted and clamped by the calibrated config constants.
pub fn calc_depth_bonus(triples: &[GoodBadOkTriple], config: &ProjectionConfig) -> DepthBonus {
    let mut real: Vec<&GoodBadOkTriple> = triples.iter().filter(|t| !t.bench).collect();
    real.sort_by(|a, b| b.ok.poss_pct.total_cmp(&a.ok.poss_pct));

    let mut off = 0.0;
    let mut def = 0.0;
    for t in real.iter().skip(ROTATION_SIZE) {
        off += (t.ok.off_adj - config.bench_off_adj) * t.ok.poss_pct;
        def += (t.ok.def_adj - config.bench_def_adj) * t.ok.poss_pct;
    }
    DepthBonus {
        off: (config.depth_weight * off).clamp(-config.depth_cap, config.depth_cap),
        def: (config.depth_weight * def).clamp(-config.depth_cap, config.depth_cap),
    }
}

/// Good/bad team nets: the ok net shifted by the possession-weighted
/// per-player band spread, shrunk by `sqrt(band_players)` to turn
/// one-std-dev-per-player bands into a team-level one-std-dev band.
pub fn band_nets(
    triples: &[GoodBadOkTriple],
    ok: &Totals,
    config: &ProjectionConfig,
) -> (f64, f64) {
    let shrink = config.band_players.sqrt();
    let mut good_spread = 0.0;
    let mut bad_spread = 0.0;
    for t in triples {
        let ok_net = t.ok.off_adj - t.ok.def_adj;
        good_spread += t.ok.poss_pct * ((t.good.off_adj - t.good.def_adj) - ok_net);
        bad_spread += t.ok.poss_pct * ((t.bad.off_adj - t.bad.def_adj) - ok_net);
    }
    (ok.net + good_spread / shrink, ok.net + bad_spread / shrink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectedStats;
    use crate::{Config, Position};

    fn make_triple(key: &str, off: f64, def: f64, poss: f64, sigma: f64) -> GoodBadOkTriple {
        GoodBadOkTriple {
            key: key.to_string(),
            good: ProjectedStats {
                off_adj: off + sigma,
                def_adj: def - sigma,
                poss_pct: poss,
            },
            bad: ProjectedStats {
                off_adj: off - sigma,
                def_adj: def + sigma,
                poss_pct: poss,
            },
            ok: ProjectedStats {
                off_adj: off,
                def_adj: def,
                poss_pct: poss,
            },
            orig: ProjectedStats {
                off_adj: off,
                def_adj: def,
                poss_pct: poss,
            },
            pos: Position::Wing,
            class: None,
            bench: false,
            added: false,
            disabled: false,
        }
    }

    #[test]
    fn test_build_totals_weighted_sum() {
        let triples = vec![
            make_triple("a", 4.0, -2.0, 0.25, 1.0),
            make_triple("b", -1.0, 1.0, 0.2, 1.0),
        ];
        let depth = DepthBonus { off: 0.5, def: -0.3 };
        let t = build_totals(&triples, Band::Ok, &depth, 0.0);

        assert!((t.off - (4.0 * 0.25 - 1.0 * 0.2 + 0.5)).abs() < 1e-12);
        assert!((t.def - (-2.0 * 0.25 + 1.0 * 0.2 - 0.3)).abs() < 1e-12);
        assert!((t.net - (t.off - t.def)).abs() < 1e-12);
    }

    #[test]
    fn test_build_totals_band_selection() {
        let triples = vec![make_triple("a", 2.0, 0.0, 0.5, 1.5)];
        let depth = DepthBonus::default();
        let ok = build_totals(&triples, Band::Ok, &depth, 0.0);
        let good = build_totals(&triples, Band::Good, &depth, 0.0);
        let bad = build_totals(&triples, Band::Bad, &depth, 0.0);

        assert!(good.off > ok.off && good.def < ok.def);
        assert!(bad.off < ok.off && bad.def > ok.def);
    }

    #[test]
    fn test_build_totals_adj_shifts_both_ends() {
        let triples = vec![make_triple("a", 2.0, 0.0, 0.5, 1.0)];
        let depth = DepthBonus::default();
        let base = build_totals(&triples, Band::Ok, &depth, 0.0);
        let shifted = build_totals(&triples, Band::Ok, &depth, 1.2);

        assert!((shifted.off - base.off - 1.2).abs() < 1e-12);
        assert!((shifted.def - base.def - 1.2).abs() < 1e-12);
        assert!((shifted.net - base.net).abs() < 1e-12);
    }

    /// Regression pin for the calibrated depth formula
    #[test]
    fn test_depth_bonus_regression() {
        let config = Config::default().projection;
        // five rotation-grade players plus two depth pieces
        let mut triples: Vec<GoodBadOkTriple> = (0..5)
            .map(|i| make_triple(&format!("starter{}", i), 3.0, -1.0, 0.15, 1.0))
            .collect();
        triples.push(make_triple("six", 1.0, 0.5, 0.12, 1.0));
        triples.push(make_triple("seven", -0.5, 1.0, 0.08, 1.0));

        let depth = calc_depth_bonus(&triples, &config);
        // six: (1.0 - -3.0) * 0.12 = 0.48; seven: (-0.5 - -3.0) * 0.08 = 0.2
        // off = 0.3 * 0.68 = 0.204
        assert!((depth.off - 0.204).abs() < 1e-12);
        // six: (0.5 - 1.5) * 0.12 = -0.12; seven: (1.0 - 1.5) * 0.08 = -0.04
        // def = 0.3 * -0.16 = -0.048
        assert!((depth.def - (-0.048)).abs() < 1e-12);
    }

    #[test]
    fn test_depth_bonus_clamps_and_skips_bench() {
        let config = Config::default().projection;
        let mut triples: Vec<GoodBadOkTriple> = (0..5)
            .map(|i| make_triple(&format!("starter{}", i), 3.0, -1.0, 0.15, 1.0))
            .collect();
        let mut benchy = make_triple("bench-g-1", 20.0, -20.0, 0.1, 1.0);
        benchy.bench = true;
        triples.push(benchy);

        // bench placeholders are not depth, however loud their ratings
        let depth = calc_depth_bonus(&triples, &config);
        assert_eq!(depth.off, 0.0);
        assert_eq!(depth.def, 0.0);

        // an absurd sixth man (below the rotation's shares) saturates the cap
        triples.push(make_triple("loaded", 100.0, -100.0, 0.08, 1.0));
        let depth = calc_depth_bonus(&triples, &config);
        assert_eq!(depth.off, config.depth_cap);
        assert_eq!(depth.def, -config.depth_cap);
    }

    #[test]
    fn test_band_nets_shrink_by_sqrt_rotation() {
        let config = Config::default().projection;
        let sigma = 1.5;
        let triples = vec![
            make_triple("a", 3.0, -1.0, 0.3, sigma),
            make_triple("b", 1.0, 0.0, 0.2, sigma),
        ];
        let depth = DepthBonus::default();
        let ok = build_totals(&triples, Band::Ok, &depth, 0.0);
        let (good_net, bad_net) = band_nets(&triples, &ok, &config);

        // each player's band net spread is 2*sigma either way
        let spread = (0.3 + 0.2) * 2.0 * sigma / config.band_players.sqrt();
        assert!((good_net - (ok.net + spread)).abs() < 1e-12);
        assert!((bad_net - (ok.net - spread)).abs() < 1e-12);
        assert!(good_net > ok.net && bad_net < ok.net);
    }
}
