pub mod operator;

use crate::config::PendingPrompts;
use crate::core::artifacts;
use crate::core::engine::{self, CaptureEngine, RunReport};
use crate::domain::ports::{SessionFactory, Storage};
use crate::domain::settings::RunConfig;
use crate::utils::error::Result;
use operator::Operator;
use std::io::{BufRead, Write};

/// 依原本的操作順序分段執行：排除 → 設定 → 截圖 → 重試 → 還原。
///
/// 每一段之前才詢問該段的問題，所以 factory 要等瀏覽器選好之後才建立。
pub async fn run_staged<F, S, R, W>(
    make_factory: impl FnOnce(&RunConfig) -> F,
    storage: S,
    mut config: RunConfig,
    pending: PendingPrompts,
    operator: &mut Operator<R, W>,
    monitor_enabled: bool,
) -> Result<RunReport>
where
    F: SessionFactory,
    S: Storage + Clone,
    R: BufRead,
    W: Write,
{
    if pending.exclusions && artifacts::has_previous_artifacts(&storage, &config.paths).await? {
        config.excluded_cases = operator.cases_to_exclude()?;
    }
    // 排除後沒有剩下的 case 就在這裡結束，不再問瀏覽器與裝置
    let exclusion = engine::apply_exclusions(&storage, &config.paths, &config.excluded_cases).await?;

    operator.answer_setup(&mut config, &pending)?;

    let factory = make_factory(&config);
    let engine = CaptureEngine::new_with_monitoring(factory, storage, config.clone(), monitor_enabled);

    let mut report = RunReport {
        exclusion,
        ..RunReport::default()
    };
    report.capture = Some(engine.capture_all().await?);
    tracing::info!("All screenshots captured.");

    let retry_cases = if pending.retry {
        operator.cases_to_retry()?
    } else {
        config.retry_cases.clone()
    };
    match engine.retry_cases(&retry_cases).await {
        Ok(summary) => report.retry = summary,
        Err(e) => tracing::error!("❌ Error during retry: {}", e),
    }

    if engine.ledger().revert_available().await {
        let revert = if pending.revert {
            operator.confirm_revert()?
        } else {
            config.revert_excluded
        };
        if revert {
            if let Some((restored, removed)) = engine.revert_excluded().await? {
                report.reverted = Some(restored);
                report.duplicates_removed = removed;
            }
        }
    }

    Ok(report)
}
