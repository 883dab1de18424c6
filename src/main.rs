use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clutch_stats::api::state::AppState;
use clutch_stats::cache::MemoryCache;
use clutch_stats::calculate::SummaryComplexionScorer;
use clutch_stats::config::AppConfig;
use clutch_stats::leaderboard::{LeaderboardCalculator, LeaderboardScheduler};
use clutch_stats::models::{
    ClanId, GameType, LeaderboardKind, LeaderboardPeriod, StatsFilters, UserId,
};
use clutch_stats::stats::StatsService;
use clutch_stats::storage::{JsonlEventStore, JsonlLeaderboardStore, StorageConfig};

#[derive(Parser)]
#[command(name = "clutch-stats")]
#[command(about = "CS2 match statistics and clan leaderboards")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Clan leaderboards
    Leaderboard {
        #[command(subcommand)]
        action: LeaderboardAction,
    },

    /// Print a player's statistics as JSON
    Stats {
        /// Statistics block to compute
        #[arg(value_enum)]
        block: StatsBlock,

        /// User id
        #[arg(long)]
        user: String,

        /// Only matches on this map
        #[arg(long)]
        map: Option<String>,

        /// Only matches of this game type
        #[arg(long)]
        game_type: Option<String>,

        /// Earliest match date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Latest match date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Matches per comparison window
        #[arg(long)]
        count: Option<usize>,
    },
}

#[derive(Subcommand)]
enum LeaderboardAction {
    /// Calculate leaderboards for one clan
    Calculate {
        /// Clan id
        #[arg(long)]
        clan: String,

        /// Leaderboard type; all types when omitted
        #[arg(long)]
        kind: Option<String>,

        /// Any date in the week to rank (default: last completed week)
        #[arg(long)]
        week_of: Option<String>,
    },

    /// Print a persisted leaderboard
    Show {
        /// Clan id
        #[arg(long)]
        clan: String,

        /// Leaderboard type
        #[arg(long)]
        kind: String,

        /// Any date in the week (default: last completed week)
        #[arg(long)]
        week_of: Option<String>,
    },

    /// Recalculate every clan's leaderboards for the last completed week
    Schedule {
        /// Run one pass and exit
        #[arg(long)]
        once: bool,

        /// Run continuously at interval
        #[arg(long)]
        watch: bool,

        /// Interval between passes (e.g., "168h"); overrides the config file
        #[arg(long)]
        interval: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatsBlock {
    Aim,
    Overview,
    Clutch,
    Maps,
}

fn parse_date(label: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("Invalid {} date (expected YYYY-MM-DD): {}", label, s))
        })
        .transpose()
}

fn period_for(week_of: Option<&str>) -> Result<LeaderboardPeriod> {
    Ok(match parse_date("--week-of", week_of)? {
        Some(date) => LeaderboardPeriod::week_containing(date),
        None => LeaderboardPeriod::last_completed_week(Utc::now().date_naive()),
    })
}

fn parse_kind(kind: &str) -> Result<LeaderboardKind> {
    kind.parse::<LeaderboardKind>().map_err(anyhow::Error::msg)
}

/// Shared services wired from the configuration.
struct Services {
    events: Arc<JsonlEventStore>,
    stats: Arc<StatsService>,
    calculator: Arc<LeaderboardCalculator>,
}

impl Services {
    fn build(config: &AppConfig) -> Self {
        let storage = StorageConfig::new(config.data_dir.clone());
        let events = Arc::new(JsonlEventStore::new(storage.clone()));
        let scorer = Arc::new(SummaryComplexionScorer::new(events.clone()));

        let stats = StatsService::new(
            events.clone(),
            events.clone(),
            scorer.clone(),
            Arc::new(MemoryCache::new()),
        )
        .with_ttl(config.cache.ttl());

        let calculator = LeaderboardCalculator::new(
            events.clone(),
            events.clone(),
            Arc::new(JsonlLeaderboardStore::new(storage)),
            scorer,
        )
        .with_min_linked_members(config.leaderboard.min_linked_members);

        Self {
            events,
            stats: Arc::new(stats),
            calculator: Arc::new(calculator),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting clutch-stats v{}", env!("CARGO_PKG_VERSION"));

    let services = Services::build(&config);

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let state = AppState {
                stats: services.stats.clone(),
                leaderboards: services.calculator.clone(),
                default_past_match_count: config.stats.default_past_match_count,
            };
            let app = clutch_stats::api::build_router(state, &config.server.cors_origin);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Leaderboard { action } => match action {
            LeaderboardAction::Calculate {
                clan,
                kind,
                week_of,
            } => {
                let period = period_for(week_of.as_deref())?;
                let kinds = match kind {
                    Some(k) => vec![parse_kind(&k)?],
                    None => LeaderboardKind::ALL.to_vec(),
                };

                for kind in kinds {
                    let run = services
                        .calculator
                        .calculate(&ClanId::from(clan.as_str()), kind, period)
                        .await?;
                    println!(
                        "{:<8} {}  {} entries, {} excluded",
                        kind,
                        period,
                        run.entries_written,
                        run.excluded_members.len()
                    );
                }
            }
            LeaderboardAction::Show {
                clan,
                kind,
                week_of,
            } => {
                let period = period_for(week_of.as_deref())?;
                let kind = parse_kind(&kind)?;
                let entries = services
                    .calculator
                    .standings(&ClanId::from(clan.as_str()), kind, period)
                    .await?;

                println!("{} leaderboard for {} ({})", kind, clan, period);
                if entries.is_empty() {
                    println!("  (no entries)");
                }
                for entry in entries {
                    println!(
                        "  {:>3}. {:<24} {:>8.2}",
                        entry.position, entry.user_id, entry.value
                    );
                }
            }
            LeaderboardAction::Schedule {
                once,
                watch,
                interval,
            } => {
                let interval = match interval {
                    Some(s) => match clutch_stats::parse_duration(&s) {
                        Some(d) if !d.is_zero() => d,
                        _ => bail!("Invalid --interval: {}", s),
                    },
                    None => config.leaderboard.interval()?,
                };
                let scheduler = LeaderboardScheduler::new(
                    services.calculator.clone(),
                    services.events.clone(),
                )
                .with_interval(interval);

                if once {
                    let result = scheduler.run_once(Utc::now().date_naive()).await?;
                    println!("\n=== Leaderboard Pass ===");
                    if let Some(period) = result.period {
                        println!("Period:           {}", period);
                    }
                    println!("Runs:             {}", result.runs);
                    println!("Entries written:  {}", result.entries_written);
                    println!("Duration:         {:?}", result.duration);
                    if !result.errors.is_empty() {
                        println!("\nErrors:");
                        for err in &result.errors {
                            println!("  - {}", err);
                        }
                    }
                } else if watch {
                    tracing::info!("Running leaderboard schedule (interval: {:?})...", interval);
                    Arc::new(scheduler).run_periodic().await;
                } else {
                    eprintln!("Specify --once or --watch");
                }
            }
        },
        Commands::Stats {
            block,
            user,
            map,
            game_type,
            from,
            to,
            count,
        } => {
            let mut filters = StatsFilters::default()
                .with_dates(
                    parse_date("--from", from.as_deref())?,
                    parse_date("--to", to.as_deref())?,
                )
                .with_past_match_count(
                    count
                        .filter(|&c| c > 0)
                        .unwrap_or(config.stats.default_past_match_count),
                );
            if let Some(map) = map {
                filters = filters.with_map(map);
            }
            if let Some(game_type) = game_type {
                let game_type: GameType = game_type.parse().map_err(anyhow::Error::msg)?;
                filters = filters.with_game_type(game_type);
            }

            let user_id = UserId::from(user);
            let stats = &services.stats;
            let json = match block {
                StatsBlock::Aim => {
                    serde_json::to_string_pretty(&stats.aim_report(&user_id, &filters).await?)?
                }
                StatsBlock::Overview => serde_json::to_string_pretty(
                    &stats.overview_report(&user_id, &filters).await?,
                )?,
                StatsBlock::Clutch => {
                    serde_json::to_string_pretty(&stats.clutch_report(&user_id, &filters).await?)?
                }
                StatsBlock::Maps => {
                    serde_json::to_string_pretty(&stats.map_report(&user_id, &filters).await?)?
                }
            };
            println!("{}", json);
        }
    }

    Ok(())
}
