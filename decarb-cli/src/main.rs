//! Decarb CLI - decarbonization advisory over JSON portfolio/catalog files

#![deny(warnings)]

// Global invariants enforced:
// - Deterministic output ordering
// - Identical input yields byte-for-byte identical output

use anyhow::Context;
use clap::{Parser, Subcommand};
use decarb_core::bulk::{self, BulkContext, CommitStrategy, SelectionCriterion};
use decarb_core::catalog::{self, Catalog};
use decarb_core::model::RegionFacts;
use decarb_core::report;
use decarb_core::{
    assess_portfolio, recommend, render_json, render_text, sort_reports, SectorAverages,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "decarb")]
#[command(about = "Decarbonization advisory: supplier risk, measure selection, funding coverage")]
#[command(version = env!("DECARB_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess risk tiers for every supplier in a portfolio
    Assess {
        /// Path to portfolio JSON (array of suppliers)
        #[arg(long)]
        portfolio: PathBuf,

        /// Sector average intensities JSON (default: computed from portfolio)
        #[arg(long)]
        sector_averages: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Recommend measures and funding for a single supplier
    Recommend {
        /// Path to portfolio JSON
        #[arg(long)]
        portfolio: PathBuf,

        /// Path to catalog JSON (measures + funding sources)
        #[arg(long)]
        catalog: PathBuf,

        /// Supplier id to plan for
        #[arg(long)]
        supplier: String,

        /// Regional facts JSON (default: all prerequisites assumed met)
        #[arg(long)]
        facts: Option<PathBuf>,

        /// Sector average intensities JSON (default: computed from portfolio)
        #[arg(long)]
        sector_averages: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Plan a filtered supplier set in bulk and aggregate the results
    Bulk {
        /// Path to portfolio JSON
        #[arg(long)]
        portfolio: PathBuf,

        /// Path to catalog JSON
        #[arg(long)]
        catalog: PathBuf,

        /// Which suppliers to plan
        #[arg(long, default_value = "all")]
        filter: BulkFilter,

        /// Commit matching plans and print them as JSON
        #[arg(long)]
        commit: Option<CommitArg>,

        /// Write committed plans to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Regional facts JSON
        #[arg(long)]
        facts: Option<PathBuf>,

        /// Sector average intensities JSON (default: computed from portfolio)
        #[arg(long)]
        sector_averages: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Inspect measure and funding catalogs
    #[command(name = "catalog")]
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Validate a catalog file without running any planning
    Validate {
        /// Path to catalog JSON
        #[arg(long)]
        path: PathBuf,
    },
    /// Show the parsed catalog
    Show {
        /// Path to catalog JSON
        #[arg(long)]
        path: PathBuf,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, PartialEq, clap::ValueEnum)]
enum BulkFilter {
    /// Every supplier in the portfolio
    All,
    /// Suppliers without a stored plan (none known to the CLI)
    NoPlan,
    /// Suppliers above their sector average intensity
    AboveAverage,
    /// Suppliers classified high or critical
    HighRisk,
}

#[derive(Clone, Copy, PartialEq, clap::ValueEnum)]
enum CommitArg {
    All,
    ReachedTarget,
}

fn load_averages(
    path: Option<&Path>,
    suppliers: &[decarb_core::Supplier],
) -> anyhow::Result<SectorAverages> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read sector averages: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("failed to parse sector averages: {}", path.display()))
        }
        None => Ok(SectorAverages::from_portfolio(suppliers)),
    }
}

fn load_facts(path: Option<&Path>) -> anyhow::Result<RegionFacts> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read regional facts: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("failed to parse regional facts: {}", path.display()))
        }
        None => Ok(RegionFacts::default()),
    }
}

fn criterion_for(filter: BulkFilter) -> SelectionCriterion {
    match filter {
        BulkFilter::All => SelectionCriterion::Custom {
            min_emissions: None,
            sectors: Vec::new(),
        },
        // The CLI holds no plan store, so no supplier counts as planned
        BulkFilter::NoPlan => SelectionCriterion::NoPlanYet {
            planned_ids: HashSet::new(),
        },
        BulkFilter::AboveAverage => SelectionCriterion::AboveSectorAverage,
        BulkFilter::HighRisk => SelectionCriterion::HighRisk,
    }
}

/// Write committed plans as JSON to the given file, or stdout when absent
fn write_plans(plans: &[decarb_core::ActionPlan], output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(plans)?;
    match output {
        Some(path) => std::fs::write(path, &json)
            .with_context(|| format!("failed to write plans to {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Assess {
            portfolio,
            sector_averages,
            format,
        } => {
            let suppliers = catalog::load_portfolio(&portfolio)?;
            let averages = load_averages(sector_averages.as_deref(), &suppliers)?;
            let assessments = assess_portfolio(&suppliers, &averages);

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&assessments)?);
                }
                OutputFormat::Text => {
                    println!(
                        "{:<12} {:<12} {:<10} {:<10} {:<8}",
                        "SUPPLIER", "INTENSITY", "AVG", "TIER", "ABOVE%"
                    );
                    for a in &assessments {
                        let above = if a.multiplier.is_none() {
                            "n/a".to_string()
                        } else {
                            format!("{:.0}", a.percent_above)
                        };
                        println!(
                            "{:<12} {:<12.2} {:<10.2} {:<10} {:<8}",
                            a.supplier_id,
                            a.intensity,
                            a.sector_avg_intensity,
                            a.tier.as_str(),
                            above
                        );
                    }
                }
            }
        }
        Commands::Recommend {
            portfolio,
            catalog: catalog_path,
            supplier,
            facts,
            sector_averages,
            format,
        } => {
            let suppliers = catalog::load_portfolio(&portfolio)?;
            let catalog = Catalog::load(&catalog_path)?;
            let averages = load_averages(sector_averages.as_deref(), &suppliers)?;
            let facts = load_facts(facts.as_deref())?;

            let target = suppliers
                .iter()
                .find(|s| s.id == supplier)
                .with_context(|| format!("supplier not found in portfolio: {}", supplier))?;

            let ctx = BulkContext {
                catalog: &catalog,
                averages: &averages,
                facts: &facts,
                all_suppliers: &suppliers,
            };
            let reports = vec![recommend(target, &ctx)];

            match format {
                OutputFormat::Text => print!("{}", render_text(&reports)),
                OutputFormat::Json => println!("{}", render_json(&reports)),
            }
        }
        Commands::Bulk {
            portfolio,
            catalog: catalog_path,
            filter,
            commit,
            output,
            facts,
            sector_averages,
            format,
        } => {
            let suppliers = catalog::load_portfolio(&portfolio)?;
            let catalog = Catalog::load(&catalog_path)?;
            let averages = load_averages(sector_averages.as_deref(), &suppliers)?;
            let facts = load_facts(facts.as_deref())?;

            let ctx = BulkContext {
                catalog: &catalog,
                averages: &averages,
                facts: &facts,
                all_suppliers: &suppliers,
            };

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
            spinner.set_message("planning suppliers...");
            spinner.enable_steady_tick(Duration::from_millis(100));
            let run = bulk::run_bulk(&criterion_for(filter), &ctx);
            spinner.finish_and_clear();

            match format {
                OutputFormat::Text => {
                    let sorted = sort_reports(run.reports.clone());
                    print!("{}", render_text(&sorted));
                    println!();
                    print!("{}", report::render_bulk_summary(&run));
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&run)?),
            }

            if let Some(commit) = commit {
                let strategy = match commit {
                    CommitArg::All => CommitStrategy::All,
                    CommitArg::ReachedTarget => CommitStrategy::ReachedTargetOnly,
                };
                let plans = bulk::commit_plans(&run, &strategy);
                eprintln!("Committing {} plan(s)", plans.len());
                write_plans(&plans, output.as_deref())?;
            }
        }
        Commands::Catalog { action } => match action {
            CatalogAction::Validate { path } => {
                Catalog::load(&path)?;
                println!("Catalog is valid: {}", path.display());
            }
            CatalogAction::Show { path } => {
                let catalog = Catalog::load(&path)?;
                println!("{}", serde_json::to_string_pretty(&catalog)?);
            }
        },
    }

    Ok(())
}
