use anyhow::Context;
use clap::Parser;
use twinshot::app::{self, operator::Operator};
use twinshot::utils::error::{ErrorSeverity, TwinshotError};
use twinshot::utils::logger;
use twinshot::{CliConfig, LocalStorage, RunReport, WebDriverFactory};

fn exit_code(e: &TwinshotError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,      // 警告，但成功
        ErrorSeverity::Medium => 2,   // 重試錯誤
        ErrorSeverity::High => 1,     // 處理錯誤
        ErrorSeverity::Critical => 3, // 系統錯誤
    }
}

fn report_failure(stage: &str, e: &TwinshotError) -> ! {
    tracing::error!(
        "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
        stage,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
    std::process::exit(exit_code(e));
}

fn print_report(report: &RunReport) {
    if let Some(capture) = &report.capture {
        println!(
            "✅ Captured {}/{} screenshot(s) for {} case(s)",
            capture.captures_succeeded,
            capture.total_captures(),
            capture.pairs_scheduled
        );
        for failure in &capture.failures {
            println!(
                "   ⚠️ case {} [{} {}]: {}",
                failure.index, failure.role, failure.device, failure.error
            );
        }
    }
    if let Some(retry) = &report.retry {
        println!("🔁 Retried {} case(s)", retry.pairs_scheduled);
    }
    if let Some(restored) = report.reverted {
        println!(
            "↩️ Reverted {} excluded case(s), removed {} duplicate(s)",
            restored, report.duplicates_removed
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting twinshot in {}", cli.workdir);
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let (config, pending) = match cli.resolve() {
        Ok(resolved) => resolved,
        Err(e) => report_failure("Configuration", &e),
    };

    std::fs::create_dir_all(&cli.workdir)
        .with_context(|| format!("cannot use working directory {}", cli.workdir))?;

    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(&cli.workdir);
    let mut operator = Operator::stdio();
    let result = app::run_staged(
        |config| WebDriverFactory::new(config.browser.clone()),
        storage,
        config,
        pending,
        &mut operator,
        cli.monitor,
    )
    .await;

    match result {
        Ok(report) => {
            tracing::info!("✅ Capture run completed");
            print_report(&report);
        }
        Err(e) => report_failure("Capture run", &e),
    }

    Ok(())
}
