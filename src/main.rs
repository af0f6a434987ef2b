use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use paris_events::apis::{ParisOpenDataApi, RawFileSource};
use paris_events::config::Config;
use paris_events::dashboard::{self, PriceFilter};
use paris_events::logging;
use paris_events::pipeline::Pipeline;
use paris_events::report::Analysis;
use paris_events::storage::{EventStore, SqliteEventStore};

#[derive(Parser)]
#[command(name = "paris_events")]
#[command(about = "Paris open-data event fetcher, loader and analyzer")]
#[command(version = "0.1.0")]
struct Cli {
    /// Config file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download raw records from the open-data API into the raw events file
    Fetch {
        /// Upper bound on the number of records kept
        #[arg(long)]
        max_records: Option<usize>,
    },
    /// Normalize the raw events file and upsert it into the database
    Load {
        /// Raw events file (defaults to <data_dir>/raw_events.json)
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Fetch then load
    Run {
        #[arg(long)]
        max_records: Option<usize>,
        /// Do nothing when the database file already exists
        #[arg(long)]
        skip_if_exists: bool,
    },
    /// Print the dashboard figures and export them as JSON
    Analyze {
        /// Only "gratuit sous condition" events
        #[arg(long)]
        conditional_free: bool,
        /// Keep events whose price or access type is one of these (comma-separated)
        #[arg(long)]
        filters: Option<String>,
        /// Skip writing the JSON exports
        #[arg(long)]
        no_export: bool,
    },
}

fn price_filter(conditional_free: bool, filters: Option<String>) -> PriceFilter {
    if conditional_free {
        return PriceFilter::ConditionalFreeOnly;
    }
    match filters {
        Some(list) => PriceFilter::AnyOf(
            list.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        ),
        None => PriceFilter::All,
    }
}

async fn fetch(config: &Config) -> anyhow::Result<()> {
    println!("📡 Fetching events from the open-data API...");
    let api = ParisOpenDataApi::new(config.api.clone())?;
    let result = Pipeline::fetch(&api, &config.storage.raw_events_path()).await?;
    println!("💾 Saved {} events to {}", result.total_records, result.output_file);
    Ok(())
}

async fn load(config: &Config, input: Option<PathBuf>) -> anyhow::Result<()> {
    let input = input.unwrap_or_else(|| config.storage.raw_events_path());
    println!("🔧 Loading {} into {}...", input.display(), config.storage.db_path.display());
    let store = SqliteEventStore::open(&config.storage.db_path)?;
    let result = Pipeline::load(&RawFileSource::new(input), &store).await?;

    println!("\n📊 Load Results:");
    println!("   Records read: {}", result.total_records);
    println!("   Rows upserted: {}", result.upserted);
    println!("   Replaced within run: {}", result.replaced_in_run);
    println!("   Records without id: {}", result.missing_id);
    println!("   With valid coordinates: {}", result.with_location);
    println!("   Rows in table: {}", store.count()?);
    Ok(())
}

fn analyze(config: &Config, filter: PriceFilter, export: bool) -> anyhow::Result<()> {
    let store = SqliteEventStore::open(&config.storage.db_path)?;
    let events = store.all()?;
    if events.is_empty() {
        println!("❌ The events table is empty. Run fetch and load first.");
        return Ok(());
    }

    let classifier = config.classifier.build();
    let analysis = Analysis::build(events, &classifier, &filter);
    let report = &analysis.report;

    println!("📊 Rows: {}", report.total_rows);
    println!("   with zipcode: {}", report.rows_with_zipcode);
    println!("   with tags: {}", report.rows_with_tags);
    println!("   with price type: {}", report.rows_with_price_type);
    println!("   with access type: {}", report.rows_with_access_type);
    println!("   with start date: {}", report.rows_with_start_date);
    println!("   mappable (date, coordinates, arrondissement): {}", report.viz_rows);
    println!("   matching filters: {}", report.filtered_rows);

    if report.category_by_arrondissement.is_empty() {
        println!("\n⚠️  No valid arrondissements, skipping category breakdown.");
    } else {
        println!("\n🗺️  Events by category and arrondissement:");
        for (category, by_district) in &report.category_by_arrondissement {
            let cells: Vec<String> = by_district.iter().map(|(a, n)| format!("{a}e:{n}")).collect();
            println!("   {}: {}", category, cells.join(" "));
        }
    }

    let overview = &report.overview;
    println!("\n🎯 Selected events: {}", overview.events);
    let earliest = overview
        .earliest_start
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "N/A".to_string());
    println!("   first start date: {earliest}");
    println!("   arrondissements: {}", overview.arrondissements);
    println!("   access types: {}", overview.access_types);

    println!("\n🏙️  Events by price type and arrondissement:");
    for (price_type, by_district) in &report.price_type_by_arrondissement {
        let cells: Vec<String> = by_district.iter().map(|(a, n)| format!("{a}e:{n}")).collect();
        println!("   {}: {}", price_type, cells.join(" "));
    }

    println!("\n📈 Monthly event count:");
    for (month, count) in &report.monthly {
        println!("   {month}: {count}");
    }

    println!("\n🎫 Access types:");
    for (access_type, count) in &report.access_types {
        println!("   {access_type}: {count}");
    }

    let viz = dashboard::viz_events(&analysis.views);
    let options: Vec<String> = dashboard::filter_options(&viz).into_iter().collect();
    println!("\n🔎 Available filters: {}", options.join(", "));

    let now = chrono::Utc::now();
    for summary in &report.categories {
        println!(
            "\n📌 {} : {} events ({} gratuit, {} payant, {} arrondissements)",
            summary.category, summary.total, summary.free, summary.paid, summary.arrondissements
        );
        let in_category = dashboard::events_in_category(&viz, &summary.category);
        let (upcoming, listed) = dashboard::upcoming_or_recent(&in_category, now);
        if upcoming {
            println!("   Upcoming ({}):", listed.len());
        } else {
            println!("   Nothing upcoming, {} most recent:", listed.len());
        }
        for view in listed {
            let date = view
                .starts_at
                .map(|d| d.format("%d/%m/%Y").to_string())
                .unwrap_or_else(|| "?".to_string());
            println!(
                "   - {} | {} | {} | {}",
                date, view.event.title, view.event.address_name, view.event.price_type
            );
        }
    }

    if export {
        let (events_path, monthly_path) = analysis.export(&config.storage.data_dir)?;
        println!("\n💾 Exported {} and {}", events_path.display(), monthly_path.display());
    }
    Ok(())
}

async fn execute(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Fetch { max_records } => {
            if let Some(max) = max_records {
                config.api.max_records = max;
            }
            fetch(&config).await
        }
        Commands::Load { input } => load(&config, input).await,
        Commands::Run { max_records, skip_if_exists } => {
            if skip_if_exists && config.storage.db_path.exists() {
                println!("✅ {} already exists, nothing to do", config.storage.db_path.display());
                return Ok(());
            }
            if let Some(max) = max_records {
                config.api.max_records = max;
            }
            println!("🚀 Running full pipeline (fetch + load)...");
            let api = ParisOpenDataApi::new(config.api.clone())?;
            let db_path = &config.storage.db_path;
            let (fetched, loaded, store) =
                Pipeline::run(&api, &config.storage.raw_events_path(), || {
                    SqliteEventStore::open(db_path)
                })
                .await?;
            println!("   Fetched: {}", fetched.total_records);
            println!("   Upserted: {}", loaded.upserted);
            println!("   Rows in table: {}", store.count()?);
            Ok(())
        }
        Commands::Analyze { conditional_free, filters, no_export } => {
            analyze(&config, price_filter(conditional_free, filters), !no_export)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _guard = logging::init_logging();
    let cli = Cli::parse();

    info!("Starting paris_events");
    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Run failed: {:#}", e);
            println!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}
