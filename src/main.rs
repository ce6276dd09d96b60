//! MarketPulse - Sales & Marketing KPI Report Generator
//!
//! A CLI tool that loads the MarketPulse CSV datasets, derives monthly,
//! regional, product, and competitor KPI tables, and writes a
//! multi-sheet Excel workbook plus a set of PNG charts.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing input, parse failure, write failure, etc.)

mod cli;
mod config;
mod kpi;
mod loader;
mod models;
mod report;

use anyhow::{Context, Result};
use cli::Args;
use config::Config;
use models::ReportTables;
use report::ChartSize;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("MarketPulse v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Generate the report
    match run_report(args) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Report generation failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default marketpulse.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new("marketpulse.toml");

    if path.exists() {
        eprintln!("⚠️  marketpulse.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write marketpulse.toml")?;

    println!("✅ Created marketpulse.toml with default settings.");
    println!("   Edit it to customize dataset paths, output paths, and chart size.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete report pipeline: load, derive, export.
fn run_report(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // Step 1: Load the three datasets
    println!("📥 Loading datasets from: {}", config.data.dir.display());
    let sales = loader::load_sales(&config.sales_path())?;
    let competitors = loader::load_competitors(&config.competitors_path())?;
    let survey = loader::load_survey(&config.survey_path())?;
    info!(
        "Loaded {} sales rows, {} competitor rows, {} survey rows",
        sales.len(),
        competitors.len(),
        survey.rows.len()
    );

    // Step 2: Derive the KPI tables
    println!("📊 Deriving KPI tables...");
    let monthly = kpi::monthly_kpis(&sales)?;
    let regions = kpi::region_kpis(&sales);
    let products = kpi::product_pricing(&sales);
    let competitor_summary = kpi::competitor_summary(&competitors);
    debug!(
        "Derived {} months, {} regions, {} products, {} competitor pairs",
        monthly.len(),
        regions.len(),
        products.len(),
        competitor_summary.len()
    );

    let tables = ReportTables {
        sales,
        competitors,
        survey,
        monthly,
        regions,
        products,
        competitor_summary,
    };

    // Step 3: Write the workbook
    std::fs::create_dir_all(&config.output.dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            config.output.dir.display()
        )
    })?;

    let workbook_path = config.workbook_path();
    println!("📝 Writing workbook: {}", workbook_path.display());
    report::write_workbook(&workbook_path, &tables)?;

    // Step 4: Render the charts
    let rendered = if args.skip_charts {
        info!("Chart rendering skipped (--skip-charts)");
        0
    } else {
        let charts_dir = config.charts_dir();
        println!("📈 Rendering charts into: {}", charts_dir.display());
        report::render_charts(&charts_dir, &tables, ChartSize::from(&config.charts))
    };

    let duration = start_time.elapsed().as_secs_f64();

    // Print summary
    println!("\n📊 Report Summary:");
    println!("   Sales rows: {}", tables.sales.len());
    println!(
        "   Months: {} | Regions: {} | Products: {}",
        tables.monthly.len(),
        tables.regions.len(),
        tables.products.len()
    );
    println!(
        "   Competitor pairs: {} | Survey rows: {}",
        tables.competitor_summary.len(),
        tables.survey.rows.len()
    );
    println!("   Workbook sheets: {}", report::SHEET_NAMES.len());
    if !args.skip_charts {
        println!(
            "   Charts rendered: {}/{}",
            rendered,
            report::CHART_FILES.len()
        );
    }
    println!("   Duration: {:.1}s", duration);
    println!(
        "\n✅ Report complete! Workbook saved to: {}",
        workbook_path.display()
    );

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from marketpulse.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
