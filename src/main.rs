//! Off-season projection CLI
//!
//! Projects and ranks every team in a division from last season's player
//! lines, and scores past projections in review mode.

use clap::{Parser, Subcommand};
use hooprank::{Config, Result};

#[derive(Parser)]
#[command(name = "hooprank")]
#[command(about = "Off-season college basketball projection leaderboard", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "hooprank.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Data file management
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Project and rank every team in the division
    Rank {
        /// Division gender (men or women)
        #[arg(long, default_value = "men")]
        gender: String,
        /// Season the player lines come from (2024 projects 2025/26)
        #[arg(long)]
        year: u16,
        /// Sort key: net, offseason_net, dev_in, total_io, txfer_in,
        /// txfer_out, txfer_io, nba_out, sr_out
        #[arg(long, default_value = "net")]
        sort: String,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
        /// Limit output to the top N teams (0 = all)
        #[arg(long, default_value = "0")]
        top: usize,
    },
    /// Score past projections against realized results
    Eval {
        /// Division gender (men or women)
        #[arg(long, default_value = "men")]
        gender: String,
        /// Season the projections were made from
        #[arg(long)]
        year: u16,
        /// Restrict to one conference (switches to a single median rule)
        #[arg(long)]
        conf: Option<String>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Show input file status
    Status,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use table, json, or csv.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Run command
    let result = match cli.command {
        Commands::Data { action } => match action {
            DataCommands::Status => commands::data_status(&config),
        },
        Commands::Rank {
            gender,
            year,
            sort,
            format,
            top,
        } => commands::rank(&config, &gender, year, &sort, format, top),
        Commands::Eval {
            gender,
            year,
            conf,
            format,
        } => commands::eval(&config, &gender, year, conf, format),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use hooprank::data;
    use hooprank::evaluate::{dynamic_rules, evaluate_projections, GLOBAL_RULES};
    use hooprank::grades::OrdF64;
    use hooprank::leaderboard::{
        build_leaderboard, DivisionInputs, OffseasonProjection, SortKey, METRIC_NET,
    };
    use hooprank::{Gender, HoopError};

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        println!("Created data/ directory");

        println!("\nNext steps:");
        println!("  1. Edit {} to point at your input files", config_path);
        println!("  2. Drop player lines into data/players.json");
        println!("  3. Run 'hooprank rank --year 2024' for the leaderboard");
        println!("  4. Run 'hooprank eval --year 2023' once results are in");

        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let players = data::load_players(&config.data.players_path)
            .map(|p| p.len())
            .unwrap_or(0);
        let transfers = data::load_transfers(&config.data.transfers_path)?.len();
        let team_stats = data::load_team_stats(&config.data.team_stats_path)?.len();
        let corrections = data::load_corrections(&config.data.corrections_path)?.season_count();

        println!("Input Status");
        println!("───────────────────────────────");
        println!("  Players:       {:>6}  ({})", players, config.data.players_path);
        println!("  Transfers:     {:>6}  ({})", transfers, config.data.transfers_path);
        println!("  Team stats:    {:>6}  ({})", team_stats, config.data.team_stats_path);
        println!("  Corrections:   {:>6}  ({})", corrections, config.data.corrections_path);

        Ok(())
    }

    fn parse_gender(gender: &str) -> Result<Gender> {
        Gender::from_code(gender).ok_or_else(|| HoopError::UnknownGender(gender.to_string()))
    }

    fn run_pass(
        config: &Config,
        gender: Gender,
        year: u16,
        sort_by: SortKey,
        eval_mode: bool,
    ) -> Result<OffseasonProjection> {
        let players = data::load_players(&config.data.players_path)?;
        let transfers = data::load_transfers(&config.data.transfers_path)?;
        let team_stats = if eval_mode {
            data::load_team_stats(&config.data.team_stats_path)?
        } else {
            Vec::new()
        };
        let corrections = data::load_corrections(&config.data.corrections_path)?;

        let inputs = DivisionInputs {
            gender,
            year,
            players: &players,
            transfers: &transfers,
            team_stats: &team_stats,
            corrections: &corrections,
            eval_mode,
        };
        Ok(build_leaderboard(&inputs, sort_by, config))
    }

    pub fn rank(
        config: &Config,
        gender: &str,
        year: u16,
        sort: &str,
        format: OutputFormat,
        top: usize,
    ) -> Result<()> {
        let gender = parse_gender(gender)?;
        let sort_by: SortKey = sort.parse()?;
        let proj = run_pass(config, gender, year, sort_by, false)?;

        let limit = if top == 0 { proj.teams.len() } else { top };
        let teams = &proj.teams[..limit.min(proj.teams.len())];

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(teams).unwrap());
            }
            OutputFormat::Csv => {
                println!("rank,team,conf,net,off,def,good_net,bad_net,offseason_net");
                for (i, t) in teams.iter().enumerate() {
                    println!(
                        "{},{},{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2}",
                        i + 1,
                        t.team,
                        t.conf,
                        t.net,
                        t.off,
                        t.def,
                        t.good_net,
                        t.bad_net,
                        t.offseason_net()
                    );
                }
            }
            OutputFormat::Table => {
                println!(
                    "Projected {} {} leaderboard (by {})",
                    gender,
                    year + 1,
                    sort_by
                );
                println!(
                    "{:>4}  {:<24} {:<6} {:>7} {:>11} {:>11} {:>7}",
                    "Rank", "Team", "Conf", "Net", "Off", "Def", "Pctile"
                );
                println!("────────────────────────────────────────────────────────────────────────────");
                for (i, t) in teams.iter().enumerate() {
                    let pctile = proj
                        .div_stats
                        .get_percentile(METRIC_NET, t.net)
                        .map(|p| format!("{:>6.1}%", p.value * 100.0))
                        .unwrap_or_else(|| "    ???".to_string());
                    let off_rk = proj.off_rank.get(&OrdF64(t.off)).map_or(0, |r| r + 1);
                    let def_rk = proj.def_rank.get(&OrdF64(t.def)).map_or(0, |r| r + 1);
                    println!(
                        "{:>4}  {:<24} {:<6} {:>7.2} {:>7.2} #{:<3} {:>7.2} #{:<3} {}",
                        i + 1,
                        t.team,
                        t.conf,
                        t.net,
                        t.off,
                        off_rk,
                        t.def,
                        def_rk,
                        pctile
                    );
                }
            }
        }
        Ok(())
    }

    pub fn eval(
        config: &Config,
        gender: &str,
        year: u16,
        conf: Option<String>,
        format: OutputFormat,
    ) -> Result<()> {
        let gender = parse_gender(gender)?;
        let proj = run_pass(config, gender, year, SortKey::Net, true)?;

        let teams: Vec<_> = match &conf {
            Some(c) => proj
                .teams
                .iter()
                .filter(|t| t.conf.eq_ignore_ascii_case(c))
                .cloned()
                .collect(),
            None => proj.teams.clone(),
        };
        let rules = match &conf {
            Some(_) => dynamic_rules(&teams),
            None => GLOBAL_RULES.to_vec(),
        };
        let (results, rankings) = evaluate_projections(&teams, &rules);
        let tau = kendall_tau(&rankings.pairs);

        match format {
            OutputFormat::Json => {
                let rules_json: Vec<_> = results
                    .iter()
                    .map(|r| {
                        serde_json::json!({
                            "lower_rank": r.rule.lower_rank,
                            "predicted_good": r.predicted.good,
                            "predicted_bad": r.predicted.bad,
                            "actual_good": r.actual.good,
                            "actual_bad": r.actual.bad,
                            "net_err_mean": r.net_delta.mean(),
                            "net_err_std": r.net_delta.std_dev(),
                            "off_err_mean": r.off_delta.mean(),
                            "def_err_mean": r.def_delta.mean(),
                        })
                    })
                    .collect();
                let out = serde_json::json!({
                    "scored_teams": rankings.pairs.len(),
                    "kendall_tau": tau,
                    "rules": rules_json,
                });
                println!("{}", serde_json::to_string_pretty(&out).unwrap());
            }
            OutputFormat::Csv => {
                println!("lower_rank,predicted_good,predicted_bad,actual_good,actual_bad,net_err_mean,net_err_std");
                for r in &results {
                    println!(
                        "{},{},{},{},{},{:.3},{:.3}",
                        r.rule.lower_rank,
                        r.predicted.good,
                        r.predicted.bad.len(),
                        r.actual.good,
                        r.actual.bad.len(),
                        r.net_delta.mean(),
                        r.net_delta.std_dev()
                    );
                }
            }
            OutputFormat::Table => {
                println!(
                    "Review of {} {} projections ({} teams scored)",
                    gender,
                    year + 1,
                    rankings.pairs.len()
                );
                println!("───────────────────────────────────────────────────────────");
                for r in &results {
                    println!("{}", r);
                    for miss in &r.predicted.bad {
                        println!("      predicted miss: {}", miss);
                    }
                    for miss in &r.actual.bad {
                        println!("      surprise:       {}", miss);
                    }
                }
                println!("───────────────────────────────────────────────────────────");
                println!("Kendall tau (all scored teams): {:.3}", tau);
            }
        }
        Ok(())
    }

    /// Rank correlation over the paired predicted/actual ranks. O(n^2) is
    /// fine at division scale.
    fn kendall_tau(pairs: &[(usize, usize)]) -> f64 {
        let n = pairs.len();
        if n < 2 {
            return 0.0;
        }
        let mut concordant = 0i64;
        let mut discordant = 0i64;
        for i in 0..n {
            for j in (i + 1)..n {
                let dp = pairs[i].0 as i64 - pairs[j].0 as i64;
                let da = pairs[i].1 as i64 - pairs[j].1 as i64;
                let sign = dp * da;
                if sign > 0 {
                    concordant += 1;
                } else if sign < 0 {
                    discordant += 1;
                }
            }
        }
        (concordant - discordant) as f64 / (n * (n - 1) / 2) as f64
    }
}
