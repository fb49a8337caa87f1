use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::info;

use pnlreport::config::ReportConfig;
use pnlreport::data;
use pnlreport::reporting::aggregate::{budget_item_totals, displayed_transactions, MonthSummary};
use pnlreport::reporting::checks::check_fields;
use pnlreport::reporting::projection::{project_year, ClassProjection};
use pnlreport::reporting::record::{of_class, Period};
use pnlreport::reporting::report::{flatten_report, Flattened};
use pnlreport::reporting::{AccountClass, ProjectionError, DISPLAY_PRECISION};

/// Budget-vs-actual reports from profit and loss detail exports.
#[derive(Parser)]
#[command(name = "pnlreport")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flatten report JSON files into the transaction table
    Extract {
        /// Report files, rows are concatenated in argument order
        #[arg(required = true)]
        reports: Vec<PathBuf>,

        /// Transaction table to write, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report unexpected transaction types and unbudgeted items
    Check {
        #[arg(short, long)]
        transactions: PathBuf,

        #[arg(short, long)]
        budget: PathBuf,
    },

    /// Budget against actuals for one month
    Month {
        #[arg(short, long)]
        transactions: PathBuf,

        #[arg(short, long)]
        budget: PathBuf,

        #[arg(short, long)]
        year: i32,

        #[arg(short, long)]
        month: u32,
    },

    /// Project income and expenses to the end of the year
    Project {
        #[arg(short, long)]
        transactions: PathBuf,

        /// Budget mapping, adds a per-item year-to-date table when given
        #[arg(short, long)]
        budget: Option<PathBuf>,

        #[arg(short, long)]
        year: i32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match &cli.config {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };

    match cli.command {
        Commands::Extract { reports, output } => extract(&config, &reports, output),
        Commands::Check { transactions, budget } => {
            let transactions = data::load_transactions(&transactions)?;
            let mapping = data::load_budget_mapping(&budget)?;
            let warnings = check_fields(&transactions, &mapping, &config.expected_transaction_types);
            if warnings.is_empty() {
                info!("no issues found in {} transactions", transactions.len());
            }

            Ok(())
        },
        Commands::Month {
            transactions,
            budget,
            year,
            month,
        } => month_report(&config, transactions, budget, year, month),
        Commands::Project {
            transactions,
            budget,
            year,
        } => projection_report(&config, transactions, budget, year),
    }
}

fn extract(config: &ReportConfig, reports: &[PathBuf], output: Option<PathBuf>) -> Result<()> {
    let mut flattened = Flattened::default();
    for path in reports {
        let report = data::load_report(path)?;
        let rows = flatten_report(&report);
        info!("flattened {}, rows={}, dropped={}", path.display(), rows.rows().len(), rows.dropped());
        flattened.append(rows);
    }

    let (transactions, drops) = flattened.convert();
    info!("extracted transactions={}, dropped={}", transactions.len(), drops.total());
    drops.log(config.warn_on_dropped_rows);

    match output {
        Some(path) => data::write_transactions(&transactions, File::create(path)?),
        None => data::write_transactions(&transactions, io::stdout()),
    }
}

fn month_report(config: &ReportConfig, transactions: PathBuf, budget: PathBuf, year: i32, month: u32) -> Result<()> {
    let period = Period::month(year, month).ok_or_else(|| anyhow!("invalid month {year}-{month}"))?;
    let transactions = data::load_transactions(&transactions)?;
    let mapping = data::load_budget_mapping(&budget)?;
    check_fields(&transactions, &mapping, &config.expected_transaction_types);

    let summary = MonthSummary::build(&transactions, &mapping, period, &config.report_exclusions);
    let mut stdout = io::stdout().lock();
    if summary.is_empty() {
        writeln!(stdout, "No data for {year}-{month:02}")?;
        return Ok(());
    }

    writeln!(stdout, "Total Expenses: ${}", summary.total_expenses)?;
    writeln!(stdout, "Total Income: ${}", summary.total_income)?;
    writeln!(stdout, "Net Profit: ${}", summary.net_profit())?;
    writeln!(stdout)?;
    data::export_subcategories(&summary.subcategories, &mut stdout)?;
    writeln!(stdout)?;
    data::export_items(&summary.items, &mut stdout)?;

    writeln!(stdout)?;
    let shown = displayed_transactions(period.select(&transactions), &config.report_exclusions);
    data::write_transactions(shown, &mut stdout)?;

    Ok(())
}

fn projection_report(config: &ReportConfig, transactions: PathBuf, budget: Option<PathBuf>, year: i32) -> Result<()> {
    let period = Period::year(year).ok_or_else(|| anyhow!("invalid year {year}"))?;
    let transactions = data::load_transactions(&transactions)?;
    let year_transactions: Vec<_> = period.select(&transactions).into_iter().cloned().collect();

    let projection = project_year(&year_transactions, year, |t| config.projection.excludes(t));
    let mut stdout = io::stdout().lock();
    write_projection(&mut stdout, AccountClass::Income, &projection.income)?;
    write_projection(&mut stdout, AccountClass::Expenses, &projection.expenses)?;
    if let Ok(net) = projection.projected_net_profit() {
        writeln!(stdout, "Projected Net Profit: ${}", net)?;
    }

    if let Some(budget) = budget {
        let mapping = data::load_budget_mapping(&budget)?;
        let expenses = of_class(&year_transactions, AccountClass::Expenses);
        writeln!(stdout)?;
        data::export_budget_items(&budget_item_totals(&mapping, expenses), &mut stdout)?;
    }

    Ok(())
}

fn write_projection<W: Write>(
    writer: &mut W,
    class: AccountClass,
    projection: &Result<ClassProjection, ProjectionError>,
) -> Result<()> {
    match projection {
        Ok(projection) => writeln!(
            writer,
            "Projected {}: ${}",
            class,
            projection.projected_total.round_dp(DISPLAY_PRECISION)
        )?,
        Err(err) => writeln!(writer, "Projected {}: {}", class, err)?,
    }

    Ok(())
}
