//! Jobmatch CLI - aggregate, list, match and analyze skill gaps

mod output;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use jobmatch_core::application::{cancellation_channel, AggregationPipeline, MatchService};
use jobmatch_core::domain::{CandidateProfile, SkillGapReport};
use jobmatch_core::port::{JobRepository, PostingFilter, SystemTimeProvider, UuidProvider};
use jobmatch_infra_http::HttpAdapterFactory;
use jobmatch_infra_sqlite::{open_database, run_migrations, SqliteJobRepository};
use jobmatch_settings::{init_tracing, AppConfig, CONFIG_ENV_VAR};
use output::{GapRow, MatchRow, PostingRow, SourceRow, StepRow};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::Table;

#[derive(Parser)]
#[command(name = "jobmatch")]
#[command(about = "Job aggregation and matching CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(long, env = CONFIG_ENV_VAR, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one aggregation cycle over the configured sources
    Aggregate,

    /// List stored postings
    Jobs {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Rank stored postings against a candidate profile
    Match {
        /// Profile JSON file
        #[arg(short, long)]
        profile: PathBuf,

        /// Number of matches shown
        #[arg(short = 'n', long, default_value = "10")]
        top: usize,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Rank missing skills across stored postings
    Gaps {
        /// Profile JSON file
        #[arg(short, long)]
        profile: PathBuf,

        /// Learning path length (defaults to the configured top_n_gaps)
        #[arg(long)]
        top: Option<usize>,

        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Keyword in title, description or skills (repeatable)
    #[arg(short, long = "keyword")]
    keywords: Vec<String>,

    #[arg(long)]
    source: Option<String>,

    #[arg(long)]
    remote: bool,

    #[arg(long)]
    location: Option<String>,

    /// Only postings on or after this date (YYYY-MM-DD)
    #[arg(long)]
    since: Option<NaiveDate>,

    #[arg(long)]
    limit: Option<u32>,

    #[arg(long)]
    offset: Option<u32>,
}

impl FilterArgs {
    fn to_filter(&self) -> PostingFilter {
        PostingFilter {
            keywords: self.keywords.clone(),
            source: self.source.clone(),
            remote_only: self.remote,
            location: self.location.clone(),
            posted_after: self
                .since
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc().timestamp_millis()),
            limit: self.limit,
            offset: self.offset,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let _log_guard = init_tracing(config.log_dir().as_deref());

    let db_path = config.database_path();
    let pool = open_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    run_migrations(&pool).await.context("Migration failed")?;

    let repository = Arc::new(SqliteJobRepository::new(pool, Arc::new(SystemTimeProvider)));

    match cli.command {
        Commands::Aggregate => {
            if config.sources.is_empty() {
                println!("{}", "No sources configured".yellow());
                return Ok(());
            }

            let pipeline = AggregationPipeline::new(
                repository.clone(),
                Arc::new(HttpAdapterFactory),
                Arc::new(UuidProvider),
                Arc::new(SystemTimeProvider),
            )
            .with_max_concurrency(config.max_concurrency);

            // Ctrl+C cancels the cycle; postings stored so far are kept
            let (cancel_handle, cancel_token) = cancellation_channel();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel_handle.cancel();
                }
            });

            let summary = pipeline
                .run_aggregation_cycle(&config.sources, cancel_token)
                .await;

            if cli.json {
                return print_json(&summary);
            }

            let failed = summary.failed_sources();
            if summary.cancelled {
                println!("{}", "! Cycle cancelled".yellow().bold());
            } else if failed.is_empty() {
                println!("{}", "✓ Aggregation complete".green().bold());
            } else {
                println!(
                    "{}",
                    format!("! Aggregation finished with {} failing source(s)", failed.len())
                        .yellow()
                        .bold()
                );
            }
            println!();

            let rows: Vec<SourceRow> = summary.sources.iter().map(SourceRow::from).collect();
            println!("{}", Table::new(rows));
            println!(
                "Fetched {}, inserted {}, merged {} in {}ms",
                summary.total_fetched(),
                summary.total_inserted(),
                summary.total_merged(),
                summary.duration_ms()
            );
        }

        Commands::Jobs { filter } => {
            let postings = repository.query(&filter.to_filter()).await?;

            if cli.json {
                return print_json(&postings);
            }
            if postings.is_empty() {
                println!("{}", "No postings found".yellow());
                return Ok(());
            }

            let total = repository.count().await?;
            let rows: Vec<PostingRow> = postings.iter().map(PostingRow::from).collect();
            println!("{}", Table::new(rows));
            println!("{} of {} stored postings", postings.len(), total);
        }

        Commands::Match {
            profile,
            top,
            filter,
        } => {
            let profile = read_profile(&profile)?;
            let service = MatchService::new(repository.clone());

            let mut results = service
                .compute_matches(&profile, &filter.to_filter())
                .await?;
            results.truncate(top);

            if cli.json {
                return print_json(&results);
            }
            if results.is_empty() {
                println!("{}", "No postings to match against".yellow());
                return Ok(());
            }

            let mut rows = Vec::with_capacity(results.len());
            for result in &results {
                let posting = repository.find_by_id(&result.posting_id).await?;
                rows.push(MatchRow::new(result, posting.as_ref()));
            }

            println!("{}", "Top matches".cyan().bold());
            println!("{}", Table::new(rows));

            for result in &results {
                if let Some(note) = &result.recommendation {
                    println!("{} {}", format!("[{}]", result.posting_id).dimmed(), note);
                }
            }
        }

        Commands::Gaps {
            profile,
            top,
            filter,
        } => {
            let profile = read_profile(&profile)?;
            let service = MatchService::new(repository)
                .with_top_n(top.unwrap_or(config.top_n_gaps));

            let report = service
                .analyze_skill_gaps_for(&profile, &filter.to_filter())
                .await?;

            if cli.json {
                return print_json(&report);
            }

            let analysis = match &report {
                SkillGapReport::NoJobsAnalyzed => {
                    println!("{}", "No postings analyzed".yellow());
                    return Ok(());
                }
                SkillGapReport::Analyzed(analysis) => analysis,
            };

            println!(
                "{}",
                format!("Skill gaps across {} postings", analysis.jobs_analyzed)
                    .cyan()
                    .bold()
            );
            if analysis.ranked_gaps.is_empty() {
                println!("{}", "✓ No missing skills".green().bold());
                return Ok(());
            }

            let gaps: Vec<GapRow> = analysis.ranked_gaps.iter().map(GapRow::from).collect();
            println!("{}", Table::new(gaps));
            println!();

            println!("{}", "Learning path".cyan().bold());
            let steps: Vec<StepRow> = analysis.learning_path.iter().map(StepRow::from).collect();
            println!("{}", Table::new(steps));

            let improvement = &analysis.improvement;
            println!(
                "Average skills score {:.1} -> {:.1} ({})",
                improvement.current_average,
                improvement.projected_average,
                format!("+{:.1}", improvement.delta).green()
            );
        }
    }

    Ok(())
}

fn read_profile(path: &Path) -> Result<CandidateProfile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile {}", path.display()))?;
    serde_json::from_str(&contents).context("Invalid profile JSON")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
