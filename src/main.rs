use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use bank_seeder::orchestrator::PhaseSummary;
use bank_seeder::{
    clear_data, reporter, seed, MemoryStorage, Orchestrator, PipelineError, RunReport,
    SeederConfig, SqliteStorage,
};

const USAGE: &str = "Usage: bank-seeder [bulk|seed|clear|dry-run] [--config PATH]";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Bulk,
    Seed,
    Clear,
    DryRun,
}

struct Args {
    command: Command,
    config: Option<PathBuf>,
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        report_failure(&err);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_args() -> Result<Args> {
    let mut command = None;
    let mut config = None;
    let mut args = env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().context("--config needs a path")?;
                config = Some(PathBuf::from(path));
            }
            "bulk" => command = Some(Command::Bulk),
            "seed" => command = Some(Command::Seed),
            "clear" => command = Some(Command::Clear),
            "dry-run" => command = Some(Command::DryRun),
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            other => bail!("unknown argument '{}'\n{}", other, USAGE),
        }
    }

    Ok(Args {
        command: command.unwrap_or(Command::Bulk),
        config,
    })
}

fn load_config(path: Option<&PathBuf>) -> Result<SeederConfig> {
    let config = match path {
        Some(path) => SeederConfig::from_json_file(path)?,
        None => {
            let config = SeederConfig::default();
            config.validate()?;
            config
        }
    };
    Ok(config)
}

fn open_database(config: &SeederConfig) -> Result<SqliteStorage> {
    SqliteStorage::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

fn run() -> Result<()> {
    let args = parse_args()?;
    let config = load_config(args.config.as_ref())?;

    match args.command {
        Command::Bulk => run_bulk(&config),
        Command::DryRun => run_dry(&config),
        Command::Seed => run_seed(&config),
        Command::Clear => run_clear(&config),
    }
}

fn run_bulk(config: &SeederConfig) -> Result<()> {
    println!("🏦 Bulk seed → {}", config.database_path.display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut storage = open_database(config)?;
    let progress = reporter(config.progress);
    let report = Orchestrator::new(&mut storage, config, progress.as_ref()).run()?;

    print_run_report(&report);
    Ok(())
}

fn run_dry(config: &SeederConfig) -> Result<()> {
    println!("🧪 Dry run (in-memory, nothing is written to disk)");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut storage = MemoryStorage::new();
    let progress = reporter(config.progress);
    let report = Orchestrator::new(&mut storage, config, progress.as_ref()).run()?;

    print_run_report(&report);
    Ok(())
}

fn run_seed(config: &SeederConfig) -> Result<()> {
    println!("🌱 Small-scale seed → {}", config.database_path.display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut storage = open_database(config)?;
    let progress = reporter(config.progress);
    let report = seed::run(&mut storage, config, progress.as_ref())?;

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Seed complete in {}", format_elapsed(report.elapsed));
    println!("   👤 Customers:    {}", report.customers);
    println!("   💳 Accounts:     {}", report.accounts);
    println!("   💸 Transactions: {}", report.transactions);
    println!("   🎲 Seed:         {}", report.seed);
    Ok(())
}

fn run_clear(config: &SeederConfig) -> Result<()> {
    println!("🧹 Clearing {}", config.database_path.display());

    let mut storage = open_database(config)?;
    let removed = clear_data(&mut storage)?;

    println!("✓ Deleted {}", removed);
    Ok(())
}

fn print_run_report(report: &RunReport) {
    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Bulk run complete in {}", format_elapsed(report.elapsed));
    println!("   👤 Customers:    {}", report.customers);
    println!("   💳 Accounts:     {}", report.accounts);
    println!("   💸 Transactions: {}", report.transactions);
    println!("   🎲 Seed:         {}", report.seed);

    println!("\n📊 Phases:");
    for phase in &report.phases {
        print_phase(phase);
    }
}

fn print_phase(phase: &PhaseSummary) {
    let write = &phase.write;
    println!(
        "   {:<13} {} inserted in {} batches ({} skipped, {} retries) - {}",
        phase.entity.label(),
        write.inserted,
        write.batches,
        write.skipped,
        write.retries,
        format_elapsed(phase.elapsed)
    );
}

fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.2}s", elapsed.as_secs_f64())
}

fn report_failure(err: &anyhow::Error) {
    eprintln!("\n❌ {}", err);

    if let Some(phase) = err.downcast_ref::<PipelineError>().and_then(|e| e.phase()) {
        eprintln!("   Failed phase: {}", phase);
        match err.downcast_ref::<PipelineError>().and_then(|e| e.persisted()) {
            Some(counts) => eprintln!("   Persisted before failure: {}", counts),
            None => eprintln!("   Persisted before failure: unknown (storage could not be counted)"),
        }
        eprintln!("   Earlier batches are kept; run `bank-seeder clear` to start over.");
    } else {
        for cause in err.chain().skip(1) {
            eprintln!("   caused by: {}", cause);
        }
    }
}
