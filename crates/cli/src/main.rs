//! Command-line driver for the asset landscape pipeline.
//!
//! Usage:
//!     landscape summarize --input assets.json --granularity quarterly
//!     landscape summarize --url http://127.0.0.1:8080 --status GRANTED --format json
//!     landscape classify --title "Neural network classifier" --country US
//!     landscape period --date 2024-03-10 --granularity weekly

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use iplandscape_aggregate::{analyze, AggregateConfig};
use iplandscape_features::{period_key_for_text, Normalizer};
use iplandscape_model::{CountRow, Granularity, LandscapeReport, RawAssetRecord};
use iplandscape_query::AssetSelection;
use iplandscape_radar::{status_kpis, summarize_radar};
use iplandscape_source::{
    AssetSource, FileAssetSource, HttpAssetSource, HttpSourceConfig,
};

#[derive(Parser)]
#[command(name = "landscape")]
#[command(about = "Aggregate IP asset portfolios into landscape tables")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full aggregation pipeline
    Summarize {
        /// JSON file holding an exported asset collection
        #[arg(short, long, conflicts_with = "url")]
        input: Option<String>,

        /// Base URL of the asset API
        #[arg(long)]
        url: Option<String>,

        /// weekly, monthly, quarterly, half-yearly or yearly
        #[arg(short, long, default_value = "yearly")]
        granularity: String,

        /// Legal status filter
        #[arg(long, default_value = "all")]
        status: String,

        /// Technology field filter
        #[arg(long, default_value = "all")]
        field: String,

        /// Asset type filter
        #[arg(long, default_value = "all")]
        asset_type: String,

        /// Rows in the country table
        #[arg(long, default_value = "10")]
        top_countries: usize,

        /// Year counted as recent (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Derive technology field and region for one asset
    Classify {
        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long = "abstract")]
        abstract_text: Option<String>,

        #[arg(short, long)]
        country: Option<String>,
    },

    /// Print the period key of a filing date
    Period {
        #[arg(short, long)]
        date: String,

        #[arg(short, long, default_value = "yearly")]
        granularity: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("iplandscape=debug".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Summarize {
            input,
            url,
            granularity,
            status,
            field,
            asset_type,
            top_countries,
            year,
            format,
        } => {
            let records = load_records(input, url).await?;
            let selection = AssetSelection::from_selectors(&status, &field, &asset_type)?;
            let config = AggregateConfig {
                granularity: granularity.parse()?,
                top_countries,
                current_year: year,
            };
            run_summarize(&records, &selection, &config, format)?;
        }
        Commands::Classify {
            title,
            abstract_text,
            country,
        } => {
            run_classify(title, abstract_text, country);
        }
        Commands::Period { date, granularity } => {
            let granularity: Granularity = granularity.parse()?;
            println!("{}", period_key_for_text(&date, granularity));
        }
    }

    Ok(())
}

async fn load_records(input: Option<String>, url: Option<String>) -> Result<Vec<RawAssetRecord>> {
    let records = match (input, url) {
        (Some(path), _) => fetch(&FileAssetSource::new(path)).await?,
        (None, Some(base_url)) => {
            let source = HttpAssetSource::new(HttpSourceConfig {
                base_url,
                ..Default::default()
            })?;
            fetch(&source).await?
        }
        (None, None) => bail!("Either --input or --url is required"),
    };
    Ok(records)
}

async fn fetch<S: AssetSource>(source: &S) -> Result<Vec<RawAssetRecord>> {
    let records = source.fetch_assets().await?;
    tracing::info!(source = source.name(), count = records.len(), "Loaded asset records");
    Ok(records)
}

fn run_summarize(
    records: &[RawAssetRecord],
    selection: &AssetSelection,
    config: &AggregateConfig,
    format: OutputFormat,
) -> Result<()> {
    let report = analyze(records, &Normalizer::default(), selection, config);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report, records.len()),
    }

    Ok(())
}

fn print_report(report: &LandscapeReport, total: usize) {
    println!("Assets: {} | Granularity: {}", total, report.granularity);
    println!("{}", summarize_radar(&report.radar));

    let kpis = status_kpis(&report.status_distribution);
    println!(
        "Filings: {} | Filed: {} | Under examination: {} | Granted: {}",
        kpis.total, kpis.filed, kpis.under_examination, kpis.granted
    );
    println!("---");

    println!("\nFiling trend:");
    for point in &report.filing_trend {
        println!(
            "   {:<10} {:>5} filings ({} patents, {} trademarks)",
            point.period, point.filings, point.patents, point.trademarks
        );
    }

    print_table("Technology fields", &report.field_distribution);
    print_table("Asset types", &report.type_distribution);
    print_table("Priorities", &report.priority_distribution);
    print_table("Regions", &report.regional_distribution);
    print_table("Top countries", &report.country_distribution);
    print_table("Legal status", &report.status_distribution);
    print_table("Activity by period", &report.periodic_activity);

    if !report.lifecycle.entries.is_empty() {
        println!(
            "\nAverage processing time: {:.1} days over {} assets",
            report.lifecycle.average_days,
            report.lifecycle.entries.len()
        );
    }

    println!("\nRadar:");
    for metric in &report.radar {
        println!("   {:<16} {:>3}", metric.metric.label(), metric.value);
    }
}

fn print_table(title: &str, rows: &[CountRow]) {
    println!("\n{}:", title);
    if rows.is_empty() {
        println!("   (no data)");
    }
    for row in rows {
        println!("   {:<24} {:>5}", row.key, row.count);
    }
}

fn run_classify(title: Option<String>, abstract_text: Option<String>, country: Option<String>) {
    let raw = RawAssetRecord {
        title,
        abstract_text,
        country,
        ..Default::default()
    };
    let record = Normalizer::default().normalize(&raw);

    println!("Field:  {}", record.patent_field);
    println!("Region: {}", record.region);
}
