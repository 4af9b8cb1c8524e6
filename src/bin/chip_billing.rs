use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use chip_billing_core::{
    BillingConfig, BillingReconciliation, DatasetKind, DetailExporter, FileSource, RuleVersion,
    SummaryExporter, TextSummaryExporter, XlsxDetailExporter,
};

#[derive(Parser)]
#[command(name = "chip-billing")]
#[command(about = "Reconcile a SIM card supplier roster against the internal database", long_about = None)]
struct Cli {
    /// Supplier roster (xlsx or csv)
    #[arg(long)]
    supplier_roster: Option<PathBuf>,
    /// Internal subscriber database (xlsx or csv)
    #[arg(long)]
    internal_db: Option<PathBuf>,
    /// Acquisition list (xlsx or csv)
    #[arg(long)]
    acquisition_list: Option<PathBuf>,
    /// Test chip list (xlsx or csv)
    #[arg(long)]
    test_chips: Option<PathBuf>,
    /// Reference month, YYYY-MM
    #[arg(long, short = 'm', env = "CHIP_BILLING_MONTH")]
    month: Option<String>,
    /// Supplier name, as configured
    #[arg(long, short = 's')]
    supplier: String,
    /// TOML configuration file
    #[arg(long, short = 'c', env = "CHIP_BILLING_CONFIG")]
    config: Option<PathBuf>,
    /// Override the configured rule revision (v1, v2, v3)
    #[arg(long)]
    rules: Option<String>,
    /// Detail workbook to write
    #[arg(long, default_value = "relatorio_faturamento.xlsx")]
    detail: PathBuf,
    /// Summary document to write; printed to stdout when omitted
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn parse_rule_version(value: &str) -> Result<RuleVersion> {
    RuleVersion::ALL
        .into_iter()
        .find(|version| version.to_string().eq_ignore_ascii_case(value.trim()))
        .with_context(|| format!("unknown rule revision '{}'", value))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => BillingConfig::from_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => BillingConfig::default(),
    };
    if let Some(rules) = &cli.rules {
        config.rules.version = parse_rule_version(rules)?;
    }
    let timezone = config.timezone()?;
    let header = config.summary_header.clone();

    let mut source = FileSource::new();
    for (kind, path) in [
        (DatasetKind::SupplierRoster, &cli.supplier_roster),
        (DatasetKind::InternalDatabase, &cli.internal_db),
        (DatasetKind::AcquisitionList, &cli.acquisition_list),
        (DatasetKind::TestChipList, &cli.test_chips),
    ] {
        if let Some(path) = path {
            source.set(kind, path);
        }
    }

    let reconciliation = BillingReconciliation::new(source, config);
    let run = reconciliation.run(cli.month.as_deref(), &cli.supplier)?;

    XlsxDetailExporter::new(&cli.detail).export_detail(&run)?;

    match &cli.summary {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating summary {}", path.display()))?;
            TextSummaryExporter::new(BufWriter::new(file), timezone)
                .with_header(header)
                .export_summary(&run)?;
        }
        None => {
            TextSummaryExporter::new(std::io::stdout().lock(), timezone)
                .with_header(header)
                .export_summary(&run)?;
        }
    }

    log::info!(
        "done: {} billable, {} excluded, detail at {}",
        run.billable_count(),
        run.excluded_count(),
        cli.detail.display()
    );
    Ok(())
}
