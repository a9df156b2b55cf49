//! CLI binary for Sekela: seed, refresh, and query the university catalog.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sekela_core::config::SekelaConfig;
use sekela_core::dataset::CatalogDataset;
use sekela_core::model::Institution;
use sekela_core::seed::{SeedReport, Seeder};
use sekela_core::storage::{CatalogStore, Session};
use sekela_query::insights::{InsightField, NULL_KEY, insights};
use sekela_query::wizard::{WizardPreferences, recommend};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sekela", about = "Tanzanian university catalog")]
struct Cli {
    /// Directory holding sekela.toml (defaults to current directory)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Database URL, overriding the configuration
    #[arg(short, long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add dataset institutions that are not stored yet
    Seed,

    /// Delete every institution and reload the dataset
    Refresh,

    /// List institutions in id order
    List {
        /// Number of institutions to skip
        #[arg(long, default_value = "0")]
        skip: usize,

        /// Maximum number to show (defaults to catalog.default_limit)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one institution with its programs and facilities
    Show {
        /// Institution id
        id: i64,
    },

    /// Recommend institutions matching the given preferences
    Recommend {
        /// Exact region, or "Any"
        #[arg(long)]
        region: Option<String>,

        /// "Public", "Private", or "Any"
        #[arg(long = "type")]
        ownership: Option<String>,

        /// Maximum average fees in TZS (0 means no limit)
        #[arg(long)]
        max_fees: Option<i64>,

        /// Case-insensitive substring of a program name
        #[arg(long)]
        interest: Option<String>,

        /// Exact difficulty level, or "Any"
        #[arg(long)]
        difficulty: Option<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Count institutions per region, type, or difficulty
    Insights {
        /// One of: regions, types, difficulty
        field: InsightField,
    },

    /// Show row counts and the dataset version
    Info,
}

/// Resolved configuration plus the handles a command needs.
struct App {
    config: SekelaConfig,
    store: CatalogStore,
}

impl App {
    fn open(cli: &Cli) -> Result<Self> {
        let root = match &cli.root {
            Some(p) => p.clone(),
            None => std::env::current_dir().context("failed to get current directory")?,
        };
        let mut config = SekelaConfig::load(&root)
            .with_context(|| format!("failed to load configuration from {}", root.display()))?;
        if let Some(url) = &cli.database {
            config.database.url.clone_from(url);
        }
        let store = CatalogStore::open(&config.database)
            .with_context(|| format!("failed to open database {}", config.database.url))?;
        Ok(Self { config, store })
    }

    fn dataset(&self) -> Result<CatalogDataset> {
        CatalogDataset::load_or_builtin(self.config.catalog.dataset.as_deref())
            .context("failed to load catalog dataset")
    }

    fn session(&self) -> Result<Session> {
        self.store.session().context("failed to open database session")
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let ctx = App::open(&cli)?;

    match cli.command {
        Commands::Seed => cmd_seed(&ctx),
        Commands::Refresh => cmd_refresh(&ctx),
        Commands::List { skip, limit } => {
            cmd_list(&ctx, skip, limit.unwrap_or(ctx.config.catalog.default_limit))
        }
        Commands::Show { id } => cmd_show(&ctx, id),
        Commands::Recommend {
            region,
            ownership,
            max_fees,
            interest,
            difficulty,
            json,
        } => {
            let prefs = WizardPreferences {
                region,
                ownership,
                max_fees,
                academic_interest: interest,
                difficulty,
            };
            cmd_recommend(&ctx, &prefs, json)
        }
        Commands::Insights { field } => cmd_insights(&ctx, field),
        Commands::Info => cmd_info(&ctx),
    }
}

fn print_report(report: &SeedReport) {
    println!("{}", report.message());
    if !report.failed.is_empty() {
        eprintln!("{} record(s) failed:", report.failed.len());
        for failure in &report.failed {
            eprintln!("  {}: {}", failure.name, failure.message);
        }
    }
}

fn cmd_seed(ctx: &App) -> Result<()> {
    let dataset = ctx.dataset()?;
    let mut session = ctx.session()?;
    let report = Seeder::new(&dataset).seed(&mut session)?;
    print_report(&report);
    Ok(())
}

fn cmd_refresh(ctx: &App) -> Result<()> {
    let dataset = ctx.dataset()?;
    let mut session = ctx.session()?;
    let report = Seeder::new(&dataset).refresh(&mut session)?;
    print_report(&report);
    Ok(())
}

fn format_fees(fees: Option<i64>) -> String {
    fees.map_or_else(|| "-".to_string(), |f| format!("{f} TZS"))
}

fn print_row(inst: &Institution) {
    println!(
        "{:>4}  {:<8} {:<10} {:<8} {:>14}  {}",
        inst.id,
        inst.acronym.as_deref().unwrap_or("-"),
        inst.region.as_deref().unwrap_or("-"),
        inst.ownership.as_deref().unwrap_or("-"),
        format_fees(inst.avg_fees),
        inst.name
    );
}

fn cmd_list(ctx: &App, skip: usize, limit: usize) -> Result<()> {
    let session = ctx.session()?;
    let page = session.list_all(skip, limit)?;
    if page.is_empty() {
        eprintln!("No institutions. Run `sekela seed` first.");
        return Ok(());
    }
    for inst in &page {
        print_row(inst);
    }
    Ok(())
}

fn cmd_show(ctx: &App, id: i64) -> Result<()> {
    let session = ctx.session()?;
    let inst = session.require(id)?;

    println!("{} ({})", inst.name, inst.acronym.as_deref().unwrap_or("-"));
    println!("Type: {}", inst.ownership.as_deref().unwrap_or("-"));
    println!(
        "Location: {}, {}",
        inst.location.as_deref().unwrap_or("-"),
        inst.region.as_deref().unwrap_or("-")
    );
    println!("Average fees: {}", format_fees(inst.avg_fees));
    println!("Difficulty: {}", inst.difficulty.as_deref().unwrap_or("-"));
    if let Some(desc) = inst.description.as_deref().filter(|d| !d.is_empty()) {
        println!("\n{desc}");
    }
    if let Some(req) = inst
        .admission_requirements
        .as_deref()
        .filter(|r| !r.is_empty())
    {
        println!("\nAdmission: {req}");
    }

    if !inst.programs.is_empty() {
        println!("\nPrograms:");
        for p in &inst.programs {
            let duration = p.duration.map_or_else(|| "-".to_string(), |d| format!("{d} yrs"));
            println!(
                "  {} [{}, {}]",
                p.name.as_deref().unwrap_or("-"),
                duration,
                p.program_difficulty.as_deref().unwrap_or("-")
            );
            if let Some(prospects) = p.prospects.as_deref().filter(|s| !s.is_empty()) {
                println!("    Prospects: {prospects}");
            }
        }
    }
    let facilities: Vec<&str> = inst
        .facilities
        .iter()
        .filter_map(|f| f.name.as_deref())
        .collect();
    if !facilities.is_empty() {
        println!("\nFacilities: {}", facilities.join(", "));
    }
    Ok(())
}

fn cmd_recommend(ctx: &App, prefs: &WizardPreferences, json: bool) -> Result<()> {
    let session = ctx.session()?;
    let results = recommend(&session, prefs)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }
    if results.is_empty() {
        println!("No institutions match these preferences.");
        return Ok(());
    }
    println!("{} match(es), easiest first:", results.len());
    for inst in &results {
        print_row(inst);
    }
    Ok(())
}

fn cmd_insights(ctx: &App, field: InsightField) -> Result<()> {
    let session = ctx.session()?;
    let counts = insights(&session, field)?;
    if counts.is_empty() {
        println!("No institutions.");
        return Ok(());
    }
    let width = counts
        .keys()
        .map(|k| k.as_deref().unwrap_or(NULL_KEY).len())
        .max()
        .unwrap_or(0);
    for (key, count) in &counts {
        println!("{:<width$}  {count}", key.as_deref().unwrap_or(NULL_KEY));
    }
    Ok(())
}

fn cmd_info(ctx: &App) -> Result<()> {
    let session = ctx.session()?;
    let dataset = ctx.dataset()?;

    if ctx.store.is_memory() {
        println!("Database: {} (in-memory, discarded on exit)", ctx.config.database.url);
    } else {
        println!("Database: {}", ctx.config.database.url);
    }
    println!(
        "Dataset: v{} ({} records)",
        dataset.version,
        dataset.len()
    );
    if let Some(source) = &dataset.source {
        println!("Source: {source}");
    }
    println!();
    println!("Institutions: {}", session.count_institutions()?);
    println!("Programs: {}", session.count_programs()?);
    println!("Facilities: {}", session.count_facilities()?);
    Ok(())
}
