//! Roster assembly and per-player projection
//!
//! Composition order, highest precedence last: base roster candidates,
//! transfer in/out adjustments, added/freshman injection, manual rating
//! overrides, deletions and disables, bench backfill. Missing or partial
//! data degrades to bench-level defaults; nothing in here errors.

use std::collections::HashSet;

use log::debug;
use serde::Serialize;

use crate::corrections::{parse_added_players, AddedPlayer, FreshmanIntake, TeamManualFix};
use crate::{PlayerClass, PlayerSeasonStats, Position, ProjectionConfig, TransferLedger};

use super::{GoodBadOkTriple, ProjectedStats};

/// Weighted possession shares across a full roster sum to this ceiling
const POSS_CEILING: f64 = 1.0;
/// Share assigned to each bench placeholder slot
const BENCH_SLOT_SHARE: f64 = 0.08;
/// Profile assumed for teams without a bench correction
const DEFAULT_BENCH_PROFILE: &str = "4*/T40ish";

/// Everything the pipeline needs for one team
pub struct RosterContext<'a> {
    pub team: &'a str,
    /// Candidate pool: own roster plus anyone transfer-linked or
    /// added-player-referenced to this team
    pub candidates: &'a [&'a PlayerSeasonStats],
    pub transfers: &'a TransferLedger,
    pub fix: Option<&'a TeamManualFix>,
    pub freshmen: &'a [FreshmanIntake],
    pub config: &'a ProjectionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartureKind {
    Transfer,
    Pro,
    Graduation,
}

/// One player leaving the roster, with the net production they take along
#[derive(Debug, Clone)]
pub struct Departure {
    pub key: String,
    pub kind: DepartureKind,
    /// Net contribution lost, rating x possession share
    pub net: f64,
}

/// Roster composition counts
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RosterCounts {
    pub returning: usize,
    pub transfers_in: usize,
    pub freshmen: usize,
    pub added: usize,
    pub bench: usize,
    pub disabled: usize,
}

/// Transfer decomposition margins, all rating x possession share.
///
/// Incoming, development and freshman margins are taken from the roster as
/// edited, so deletions, disables and manual overrides are reflected in the
/// sort keys built on top of them. Departure margins reflect the line as
/// played.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Decomposition {
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
}

pub struct RosterProjection {
    pub triples: Vec<GoodBadOkTriple>,
    pub counts: RosterCounts,
    pub decomposition: Decomposition,
    pub departures: Vec<Departure>,
}

/// Off/def improvement applied to a returning player, by the class they
/// just finished. The freshman-to-sophomore jump is the biggest.
fn development_bump(class: PlayerClass) -> (f64, f64) {
    match class {
        PlayerClass::Freshman => (1.8, -0.9),
        PlayerClass::Sophomore => (1.1, -0.55),
        PlayerClass::Junior => (0.6, -0.3),
        PlayerClass::Senior | PlayerClass::SuperSenior => (0.25, -0.15),
    }
}

/// Bench rating adjustment for a recruiting-quality profile
fn bench_profile_adj(profile: &str) -> (f64, f64) {
    match profile {
        "5*/T5ish" => (2.5, -1.2),
        "5*/T15ish" => (1.5, -0.8),
        "4*/T40ish" => (0.0, 0.0),
        "3.5*/T75ish" => (-1.0, 0.5),
        "3*/T150ish" => (-2.0, 1.0),
        other => {
            debug!("unknown bench profile {}, using neutral", other);
            (0.0, 0.0)
        }
    }
}

/// Which decomposition margin a roster entry feeds
#[derive(Clone, Copy, PartialEq)]
enum MarginKind {
    None,
    TransferIn,
    Freshman,
}

struct Working {
    key: String,
    pos: Position,
    class: Option<PlayerClass>,
    ok: ProjectedStats,
    orig: ProjectedStats,
    sigma: f64,
    margin: MarginKind,
    bump_off: f64,
    bump_def: f64,
    bench: bool,
    added: bool,
    disabled: bool,
}

/// Project one team's roster into good/bad/ok triples.
pub fn project_roster(ctx: &RosterContext) -> RosterProjection {
    let mut counts = RosterCounts::default();
    let mut decomp = Decomposition::default();
    let mut departures = Vec::new();
    let mut working: Vec<Working> = Vec::new();

    let parsed_adds = match ctx.fix {
        Some(f) => parse_added_players(&f.added_players),
        None => Vec::new(),
    };
    let added_refs: HashSet<&str> = parsed_adds
        .iter()
        .filter_map(|a| match a {
            AddedPlayer::Reference(code) => Some(code.as_str()),
            AddedPlayer::Synthetic(_) => None,
        })
        .collect();
    let super_back = ctx.fix.map_or(false, |f| f.super_seniors_back);

    // base roster plus transfer adjustments
    for p in ctx.candidates {
        let hops = ctx.transfers.get(&p.code);
        let own = p.team == ctx.team;
        let incoming = hops.map_or(false, |hs| {
            hs.iter()
                .any(|h| h.to_team == ctx.team && h.from_team != ctx.team)
        });

        if own {
            let off = p.off_adj * p.poss_pct;
            let def = p.def_adj * p.poss_pct;
            let net = off - def;
            if p.pro_departure {
                decomp.nba_off += off;
                decomp.nba_def += def;
                departures.push(Departure {
                    key: p.key.clone(),
                    kind: DepartureKind::Pro,
                    net,
                });
                continue;
            }
            let graduating = p.class == PlayerClass::SuperSenior
                || (p.class == PlayerClass::Senior && !super_back);
            if graduating {
                decomp.sr_off += off;
                decomp.sr_def += def;
                departures.push(Departure {
                    key: p.key.clone(),
                    kind: DepartureKind::Graduation,
                    net,
                });
                continue;
            }
            let outgoing = hops.map_or(false, |hs| {
                hs.iter()
                    .any(|h| h.from_team == ctx.team && h.to_team != ctx.team)
            });
            if outgoing {
                decomp.out_off += off;
                decomp.out_def += def;
                departures.push(Departure {
                    key: p.key.clone(),
                    kind: DepartureKind::Transfer,
                    net,
                });
                continue;
            }
        } else {
            if p.pro_departure {
                continue;
            }
            if !incoming && !added_refs.contains(p.code.as_str()) {
                // partitioned here by an old transfer hop, not joining
                continue;
            }
        }

        let (bump_off, bump_def) = development_bump(p.class);
        let ok = ProjectedStats {
            off_adj: p.off_adj + bump_off,
            def_adj: p.def_adj + bump_def,
            poss_pct: p.poss_pct,
        };
        let orig = ProjectedStats {
            off_adj: p.off_adj,
            def_adj: p.def_adj,
            poss_pct: p.poss_pct,
        };
        if own {
            counts.returning += 1;
        } else if incoming {
            counts.transfers_in += 1;
        } else {
            counts.added += 1;
        }
        working.push(Working {
            key: p.key.clone(),
            pos: p.pos,
            class: p.class.next(),
            ok,
            orig,
            sigma: ctx.config.rating_sigma,
            margin: if own {
                MarginKind::None
            } else {
                MarginKind::TransferIn
            },
            bump_off,
            bump_def,
            bench: false,
            added: !own && !incoming,
            disabled: false,
        });
    }

    // synthetic added players from the fix
    let unproven_sigma = ctx.config.rating_sigma * ctx.config.unproven_sigma_mult;
    for add in &parsed_adds {
        let s = match add {
            AddedPlayer::Synthetic(s) => s,
            AddedPlayer::Reference(_) => continue,
        };
        let ok = ProjectedStats {
            off_adj: s.off_adj,
            def_adj: s.def_adj,
            poss_pct: s.poss_pct,
        };
        if s.class == PlayerClass::Freshman {
            counts.freshmen += 1;
        } else {
            counts.added += 1;
        }
        working.push(Working {
            key: s.key.clone(),
            pos: s.pos,
            class: Some(s.class),
            ok,
            orig: ProjectedStats::default(),
            sigma: unproven_sigma,
            margin: if s.class == PlayerClass::Freshman {
                MarginKind::Freshman
            } else {
                MarginKind::TransferIn
            },
            bump_off: 0.0,
            bump_def: 0.0,
            bench: false,
            added: true,
            disabled: false,
        });
    }

    // injected freshman class
    for f in ctx.freshmen {
        let ok = ProjectedStats {
            off_adj: f.off_adj,
            def_adj: f.def_adj,
            poss_pct: f.poss_pct,
        };
        counts.freshmen += 1;
        working.push(Working {
            key: f.key.clone(),
            pos: f.pos,
            class: Some(PlayerClass::Freshman),
            ok,
            orig: ProjectedStats::default(),
            sigma: unproven_sigma,
            margin: MarginKind::Freshman,
            bump_off: 0.0,
            bump_def: 0.0,
            bench: false,
            added: true,
            disabled: false,
        });
    }

    // manual overrides, then deletions and disables
    if let Some(fix) = ctx.fix {
        for edit in &fix.overrides {
            let w = match working.iter_mut().find(|w| w.key == edit.key) {
                Some(w) => w,
                None => continue,
            };
            for (param, &val) in &edit.params {
                match param.as_str() {
                    "off_adj" => w.ok.off_adj = val,
                    "def_adj" => w.ok.def_adj = val,
                    "poss_pct" => w.ok.poss_pct = val,
                    other => debug!("ignoring unknown override param {} on {}", other, edit.key),
                }
            }
        }
        working.retain(|w| !fix.deleted_players.contains(&w.key));
        for w in working.iter_mut() {
            if fix.disabled_players.contains(&w.key) {
                w.ok.poss_pct = 0.0;
                w.disabled = true;
                counts.disabled += 1;
            }
        }
    }

    // margins come off the edited roster
    for w in &working {
        decomp.dev_off += w.bump_off * w.ok.poss_pct;
        decomp.dev_def += w.bump_def * w.ok.poss_pct;
        match w.margin {
            MarginKind::TransferIn => {
                decomp.in_off += w.ok.off_adj * w.ok.poss_pct;
                decomp.in_def += w.ok.def_adj * w.ok.poss_pct;
            }
            MarginKind::Freshman => {
                decomp.fr_net += (w.ok.off_adj - w.ok.def_adj) * w.ok.poss_pct;
            }
            MarginKind::None => {}
        }
    }

    // bench backfill up to the possession ceiling
    let profile = ctx
        .fix
        .and_then(|f| f.bench_profile.as_deref())
        .unwrap_or(DEFAULT_BENCH_PROFILE);
    let (bench_qo, bench_qd) = bench_profile_adj(profile);
    let archetypes = [Position::Guard, Position::Wing, Position::Big];
    let mut total: f64 = working.iter().map(|w| w.ok.poss_pct).sum();
    let mut slot = 0usize;
    while total + 1e-9 < POSS_CEILING {
        let share = (POSS_CEILING - total).min(BENCH_SLOT_SHARE);
        let pos = archetypes[slot % archetypes.len()];
        working.push(Working {
            key: format!("bench-{}-{}", pos.code().to_lowercase(), slot + 1),
            pos,
            class: None,
            ok: ProjectedStats {
                off_adj: ctx.config.bench_off_adj + bench_qo,
                def_adj: ctx.config.bench_def_adj + bench_qd,
                poss_pct: share,
            },
            orig: ProjectedStats::default(),
            sigma: unproven_sigma,
            margin: MarginKind::None,
            bump_off: 0.0,
            bump_def: 0.0,
            bench: true,
            added: false,
            disabled: false,
        });
        counts.bench += 1;
        total += share;
        slot += 1;
    }

    let triples = working
        .into_iter()
        .map(|w| GoodBadOkTriple {
            good: ProjectedStats {
                off_adj: w.ok.off_adj + w.sigma,
                def_adj: w.ok.def_adj - w.sigma,
                poss_pct: w.ok.poss_pct,
            },
            bad: ProjectedStats {
                off_adj: w.ok.off_adj - w.sigma,
                def_adj: w.ok.def_adj + w.sigma,
                poss_pct: w.ok.poss_pct,
            },
            ok: w.ok,
            orig: w.orig,
            key: w.key,
            pos: w.pos,
            class: w.class,
            bench: w.bench,
            added: w.added,
            disabled: w.disabled,
        })
        .collect();

    RosterProjection {
        triples,
        counts,
        decomposition: decomp,
        departures,
    }
}
