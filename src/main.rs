use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

mod aggregate;
mod config;
mod error;
mod loader;
mod models;
mod reference;
mod report;

use loader::CleanOptions;
use models::LampType;
use reference::DashboardReference;

#[derive(Parser)]
#[command(name = "lights-out")]
#[command(about = "Streetlight efficiency dashboard data for the City of Hobart", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and clean the street lighting assets into light.csv
    Fetch {
        #[arg(long, default_value = loader::LIGHT_GEOJSON)]
        source: String,
        #[arg(long, default_value = "light.csv")]
        out: PathBuf,
        /// Keep lights whose wattage cannot be read from WATT_TYPE
        #[arg(long)]
        keep_unknown_wattage: bool,
    },
    /// Standardised operational cost per lamp type
    Costs {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Lighting map points with MV replacement candidates relabeled
    Map {
        #[arg(long, default_value = "light.csv")]
        light: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Wattage distribution for one lamp type
    Histogram {
        #[arg(long)]
        lamp_type: String,
        #[arg(long, default_value = "light.csv")]
        light: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Solar poles scheduled for a rollout phase
    Solar {
        #[arg(long, default_value = "All Years")]
        phase: String,
        #[arg(long, default_value = "solar_pole_table.csv")]
        table: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Render the full dashboard as markdown
    Report {
        #[arg(long, default_value = "light.csv")]
        light: PathBuf,
        #[arg(long, default_value = "solar_pole_table.csv")]
        table: PathBuf,
        /// Lamp types to chart; defaults to MV, CFL, LED and HPS
        #[arg(long = "lamp-type")]
        lamp_types: Vec<String>,
        #[arg(long, default_value = "All Years")]
        phase: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let reference = DashboardReference::default();

    match cli.command {
        Commands::Fetch {
            source,
            out,
            keep_unknown_wattage,
        } => {
            let outcome = loader::load_streetlights(&source, CleanOptions { keep_unknown_wattage })
                .await
                .with_context(|| format!("failed to prepare streetlights from {source}"))?;
            loader::write_light_csv(&out, &outcome.records)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!(
                "Wrote {} streetlights to {} ({} incomplete rows dropped).",
                outcome.records.len(),
                out.display(),
                outcome.dropped
            );
        }
        Commands::Costs { format } => {
            let costs = aggregate::cost_by_type(&reference.costs);
            match format {
                OutputFormat::Json => print_json(&costs)?,
                OutputFormat::Table => {
                    println!(
                        "Operational cost over {} hours, standardised to {} lumen:",
                        reference.costs.lifetime_hours, reference.costs.lumens
                    );
                    for entry in &costs {
                        println!("- {} ({}): ${:.2}", entry.label, entry.lamp_type, entry.cost);
                    }
                }
            }
        }
        Commands::Map { light, format } => {
            let lights = loader::read_light_csv(&light)
                .with_context(|| format!("failed to load {}", light.display()))?;
            let points = aggregate::map_points(&reference.replacements, &lights);
            match format {
                OutputFormat::Json => print_json(&points)?,
                OutputFormat::Table => {
                    let counts = aggregate::label_counts(&points);
                    if counts.is_empty() {
                        println!("No streetlights to plot.");
                        return Ok(());
                    }
                    println!("Lights by map label:");
                    for count in &counts {
                        println!("- {}: {}", count.label, count.count);
                    }
                    let candidates = aggregate::replacement_candidates(&points);
                    println!("{} points of interest for LED replacement.", candidates.len());
                }
            }
        }
        Commands::Histogram {
            lamp_type,
            light,
            format,
        } => {
            let lamp_type: LampType = lamp_type.parse()?;
            let lights = loader::read_light_csv(&light)
                .with_context(|| format!("failed to load {}", light.display()))?;
            let histogram = aggregate::wattage_histogram(&lights, lamp_type);
            info!(%lamp_type, buckets = histogram.len(), "computed wattage distribution");
            match format {
                OutputFormat::Json => print_json(&histogram)?,
                OutputFormat::Table => {
                    if let Some(description) = reference.descriptions.get(lamp_type) {
                        println!("Distribution of {}:", description.full_name);
                    }
                    if histogram.is_empty() {
                        println!("No {lamp_type} lights recorded.");
                    }
                    for bucket in &histogram {
                        println!("- {}: {}", bucket.wattage.with_unit(), bucket.count);
                    }
                }
            }
        }
        Commands::Solar {
            phase,
            table,
            format,
        } => {
            let poles = loader::read_solar_table(&table)
                .with_context(|| format!("failed to load {}", table.display()))?;
            let selected = aggregate::filter_phase(&reference.phases, &poles, &phase)?;
            match format {
                OutputFormat::Json => print_json(&selected)?,
                OutputFormat::Table => {
                    println!("{} solar poles scheduled for {}:", selected.len(), phase.trim());
                    for summary in aggregate::phase_savings(&selected) {
                        println!(
                            "- {}: {} poles, ${:.2} annual savings",
                            summary.lamp_type, summary.poles, summary.annual_savings
                        );
                    }
                }
            }
        }
        Commands::Report {
            light,
            table,
            lamp_types,
            phase,
            out,
        } => {
            let map = config::MapSettings::from_env()?;
            let lights = loader::read_light_csv(&light)
                .with_context(|| format!("failed to load {}", light.display()));
            let poles = loader::read_solar_table(&table)
                .with_context(|| format!("failed to load {}", table.display()));

            let mut selection = report::Selection {
                phase,
                ..report::Selection::default()
            };
            if !lamp_types.is_empty() {
                selection.lamp_types = lamp_types;
            }

            let report = report::build_report(
                &reference,
                &map,
                &selection,
                &lights,
                &poles,
                chrono::Utc::now(),
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
