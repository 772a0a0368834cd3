//! Kyotei CLI - analyze a race from the command line

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use kyotei::config::AppConfig;
use kyotei::core::{Candidate, Category, StrategyResult};
use kyotei::data::Venue;
use kyotei::models::AnalyzeRequest;
use kyotei::pipeline::{Analysis, Decision, Pipeline};

#[derive(Parser)]
#[command(name = "kyotei")]
#[command(author, version, about = "Boat race analysis CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file
    #[arg(long, env = "KYOTEI_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the race data directory (overrides the config)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single race
    Analyze {
        /// Venue name (e.g. 大村) or code (1-24)
        #[arg(short, long)]
        venue: String,

        /// Race number (1-12)
        #[arg(short, long)]
        race: u8,

        /// Race date (YYYYMMDD format, default: today)
        #[arg(short, long)]
        date: Option<u32>,

        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// List venues and their codes
    Venues,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            venue,
            race,
            date,
            json,
        } => {
            let mut config = AppConfig::load(cli.config.as_deref())?;
            if let Some(dir) = cli.data_dir {
                config.data.data_dir = dir;
            }
            analyze(&config, venue, race, date, json).await?;
        }
        Commands::Venues => list_venues(),
    }

    Ok(())
}

async fn analyze(
    config: &AppConfig,
    venue: String,
    race: u8,
    date: Option<u32>,
    json: bool,
) -> Result<()> {
    let pipeline = Pipeline::from_config(config);
    let request = AnalyzeRequest {
        venue,
        race_number: race,
        date,
    };

    let decision = pipeline
        .analyze(&request)
        .await
        .with_context(|| format!("Analysis of {} {}R failed", request.venue, race))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
        return Ok(());
    }

    println!(
        "{}: {} / {}R",
        "Analyzing".green(),
        request.venue,
        request.race_number
    );
    println!();

    match &decision {
        Decision::DataInsufficient {
            quality_score,
            missing,
            recommendation,
        } => {
            println!(
                "{} (quality {:.0}%)",
                "Data insufficient".red().bold(),
                quality_score * 100.0
            );
            for label in missing {
                println!("  ✗ {}", label);
            }
            println!("{} {}", "→".yellow(), recommendation);
        }
        Decision::Abstain {
            category,
            stability,
            expected_value,
            reasons,
            recommendation,
        } => {
            println!(
                "{} [{}] stability {} / EV {:.1}%",
                "Abstain".yellow().bold(),
                category,
                stability,
                expected_value
            );
            for reason in reasons {
                println!("  - {}", reason);
            }
            println!("{} {}", "→".yellow(), recommendation);
        }
        Decision::Success(analysis) => print_analysis(analysis),
    }

    Ok(())
}

fn category_label(category: Category) -> colored::ColoredString {
    match category {
        Category::Stable => category.as_str().green().bold(),
        Category::Mixed => category.as_str().yellow().bold(),
        Category::Upset => category.as_str().red().bold(),
    }
}

fn print_analysis(analysis: &Analysis) {
    println!(
        "{} (stability {}) {}",
        category_label(analysis.category),
        analysis.stability,
        analysis.description
    );
    if analysis.demo_mode {
        println!("{}", "(heuristic predictions, reduced confidence)".dimmed());
    }
    println!();

    print_candidates("Favorite", &analysis.predictions.favorite);
    print_candidates("Balanced", &analysis.predictions.balanced);
    print_candidates("Long shot", &analysis.predictions.long_shot);

    print_strategy(&analysis.strategy);
    println!(
        "Data quality: {:.0}%",
        analysis.quality.score * 100.0
    );
}

fn print_candidates(title: &str, candidates: &[Candidate]) {
    println!("{}", format!("{}:", title).yellow().bold());
    println!("{:>8} {:>8} {:>6}", "組合せ", "score", "conf");
    println!("{}", "-".repeat(26));
    for candidate in candidates.iter().take(5) {
        println!(
            "{:>8} {:>8.4} {:>5}%",
            candidate.key(),
            candidate.score,
            candidate.confidence
        );
    }
    println!();
}

fn print_strategy(strategy: &StrategyResult) {
    println!("{}", strategy.label.cyan().bold());
    if strategy.no_profitable_outcome {
        println!("{}", "No tickets".dimmed());
    }
    for ticket in &strategy.tickets {
        let expected = ticket
            .expected_return
            .map(|r| format!("{:.0}", r))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>10} {:>8} {:>6}円 {:>7.1}x {:>8}  {}",
            format!("{:?}", ticket.bet_type).to_lowercase(),
            ticket.combination,
            ticket.stake,
            ticket.odds,
            expected,
            ticket.purpose
        );
    }
    println!("Total stake: {}円", strategy.total_stake);
    if let Some(ev) = strategy.expected_value {
        let ev_str = format!("{:+.1}%", ev);
        if ev > 0.0 {
            println!("Expected value: {}", ev_str.green());
        } else {
            println!("Expected value: {}", ev_str.red());
        }
    }
    for line in &strategy.rationale {
        println!("  {} {}", "→".green(), line);
    }
    println!();
}

fn list_venues() {
    println!("{}", "Venues:".yellow().bold());
    for venue in Venue::all() {
        println!("  {} {}", venue.code_str(), venue.name());
    }
}
