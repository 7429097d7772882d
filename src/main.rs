use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use budget_divert::csv::{
    CsvError, read_budget_lines, read_budget_report, read_disbursements, write_budget,
    write_budget_by_unit, write_summary, write_transfers,
};
use budget_divert::{BudgetLedger, BudgetLine, Engine, EngineError, Tier};
use clap::{Parser, ValueEnum};
use thiserror::Error;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "budget-divert")]
#[command(about = "Cover salary budget shortfalls by diverting balances from donor fund centers")]
struct Cli {
    /// Budget table (csv).
    #[arg(long, env = "BUDGET_DIVERT_BUDGET")]
    budget: PathBuf,

    /// Salary disbursements (csv). Without it only budget tables are written.
    #[arg(long, env = "BUDGET_DIVERT_SALARY")]
    salary: Option<PathBuf>,

    /// Directory receiving the output tables.
    #[arg(long, env = "BUDGET_DIVERT_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Layout of the budget file.
    #[arg(
        long,
        env = "BUDGET_DIVERT_BUDGET_FORMAT",
        value_enum,
        default_value_t = BudgetFormat::Flat
    )]
    budget_format: BudgetFormat,

    /// Donor tiers in draw order.
    #[arg(
        long,
        env = "BUDGET_DIVERT_TIERS",
        value_delimiter = ',',
        default_values_t = Tier::ordered()
    )]
    tiers: Vec<Tier>,

    /// Also write one budget table per fund center.
    #[arg(long, env = "BUDGET_DIVERT_PER_UNIT")]
    per_unit: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BudgetFormat {
    /// `Fund Center,Comm. Code,TEXT,Budget Available` table
    Flat,
    /// Raw sectioned budget report
    Report,
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("cannot create output directory {}: {source}", path.display())]
    OutDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let lines = load_budget(&cli)?;
    let engine = Engine::new(BudgetLedger::build(lines))?;
    let mut engine = engine.with_tiers(cli.tiers);

    fs::create_dir_all(&cli.out_dir).map_err(|source| AppError::OutDir {
        path: cli.out_dir.clone(),
        source,
    })?;

    let budget_path = cli.out_dir.join("BUDGET_ALL.csv");
    write_budget(create(&budget_path)?, engine.initial_ledger().lines())?;
    if cli.per_unit {
        let written = write_budget_by_unit(&cli.out_dir, engine.initial_ledger())?;
        info!(tables = written.len(), "per fund center budget tables written");
    }

    let Some(salary) = cli.salary else {
        info!("no salary file given, budget tables only");
        return Ok(());
    };

    let requests = read_disbursements(salary)?;
    let (tx_sender, tx_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in requests {
            match result {
                Ok(request) => {
                    if tx_sender.send(request).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    engine.run(ReceiverStream::new(tx_receiver)).await;
    engine.verify_replay()?;

    let recorder = engine.recorder();
    write_summary(
        create(&cli.out_dir.join("SALARY_ANALYSIS.csv"))?,
        recorder.outcomes(),
    )?;
    write_transfers(
        create(&cli.out_dir.join("DONOR_LEDGER.csv"))?,
        recorder.transfers(),
    )?;

    info!(
        disbursements = recorder.outcomes().len(),
        transfers = recorder.transfers().len(),
        diverted = %recorder.total_diverted(),
        "analysis written"
    );
    Ok(())
}

fn load_budget(cli: &Cli) -> Result<Vec<BudgetLine>, CsvError> {
    match cli.budget_format {
        BudgetFormat::Report => read_budget_report(&cli.budget),
        BudgetFormat::Flat => Ok(read_budget_lines(&cli.budget)?
            .filter_map(|result| match result {
                Ok(line) => Some(line),
                Err(e) => {
                    warn!("{e}");
                    None
                }
            })
            .collect()),
    }
}

fn create(path: &Path) -> Result<File, CsvError> {
    Ok(File::create(path)?)
}
