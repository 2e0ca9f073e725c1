use clap::{Parser, Subcommand};
use twinshot::config::{FileConfig, PendingPrompts};
use twinshot::core::case_numbers::parse_case_numbers;
use twinshot::utils::error::ErrorSeverity;
use twinshot::utils::logger;
use twinshot::{CaseLedger, LocalStorage, RunConfig};

#[derive(Parser)]
#[command(name = "twinshot-ledger")]
#[command(about = "Maintain the matched URL ledger without opening a browser")]
struct Args {
    /// Directory holding the URL lists
    #[arg(long, default_value = ".")]
    workdir: String,

    /// TOML configuration file (only [paths] is used)
    #[arg(short, long)]
    config: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show active and excluded cases
    List,
    /// Move cases (e.g. 1,2,3 or 1-4,6) into the excluded lists
    Exclude { cases: String },
    /// Merge the excluded cases back and drop duplicates
    Revert,
    /// Drop duplicate URL pairs from the active lists
    Dedupe,
}

async fn execute(args: &Args) -> twinshot::Result<()> {
    let mut config = RunConfig::default();
    if let Some(path) = &args.config {
        FileConfig::from_file(path)?.apply(&mut config, &mut PendingPrompts::none());
    }

    let ledger = CaseLedger::new(LocalStorage::new(&args.workdir), config.paths);

    match &args.command {
        Command::List => {
            let active = ledger.active().await?;
            println!("Active cases ({}):", active.len());
            for pair in &active {
                println!("  {:>4}  {}  ->  {}", pair.index, pair.original_url, pair.staging_url);
            }
            let excluded = ledger.excluded().await?;
            println!("Excluded cases ({}):", excluded.len());
            for pair in &excluded {
                println!("        {}  ->  {}", pair.original_url, pair.staging_url);
            }
        }
        Command::Exclude { cases } => {
            let report = ledger.exclude(&parse_case_numbers(cases)).await?;
            for case in &report.invalid {
                println!("⚠️ Invalid case number: {}. Skipping.", case);
            }
            println!(
                "🚫 Excluded {} case(s), {} remaining",
                report.excluded.len(),
                report.remaining
            );
        }
        Command::Revert => {
            let restored = ledger.revert().await?;
            let removed = ledger.deduplicate().await?;
            println!(
                "↩️ Excluded links have been reverted ({} case(s), {} duplicate(s) removed)",
                restored, removed
            );
        }
        Command::Dedupe => {
            let removed = ledger.deduplicate().await?;
            println!("🧹 Removed {} duplicate case(s)", removed);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    if let Err(e) = execute(&args).await {
        tracing::error!("❌ Ledger command failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        let code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(code);
    }
}
