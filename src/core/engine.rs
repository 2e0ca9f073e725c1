use crate::core::artifacts::{self, ArtifactPairing};
use crate::core::capture::CaptureUnit;
use crate::core::devices;
use crate::core::height::HeightNegotiator;
use crate::core::interaction::InteractionDirector;
use crate::core::ledger::{CaseLedger, ExclusionReport};
use crate::core::orchestrator::PairOrchestrator;
use crate::core::scheduler::ChunkScheduler;
use crate::domain::model::{MatchedPair, RunSummary};
use crate::domain::ports::{SessionFactory, Storage};
use crate::domain::settings::{RunConfig, StatePaths};
use crate::utils::error::Result;

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub exclusion: Option<ExclusionReport>,
    pub capture: Option<RunSummary>,
    pub retry: Option<RunSummary>,
    pub reverted: Option<usize>,
    pub duplicates_removed: usize,
}

/// 只有上一次執行留下截圖時才套用排除；第一次執行時忽略並警告
pub async fn apply_exclusions<S: Storage + Clone>(
    storage: &S,
    paths: &StatePaths,
    case_numbers: &[usize],
) -> Result<Option<ExclusionReport>> {
    if case_numbers.is_empty() {
        return Ok(None);
    }
    if !artifacts::has_previous_artifacts(storage, paths).await? {
        tracing::warn!("First run detected (no previous screenshots), ignoring requested exclusions");
        return Ok(None);
    }
    CaseLedger::new(storage.clone(), paths.clone())
        .exclude(case_numbers)
        .await
        .map(Some)
}

/// 一次完整的比對截圖執行：排除 → 截圖 → 重試 → 還原
pub struct CaptureEngine<F: SessionFactory, S: Storage + Clone> {
    config: RunConfig,
    storage: S,
    ledger: CaseLedger<S>,
    orchestrator: PairOrchestrator<F, S>,
    scheduler: ChunkScheduler,
}

impl<F: SessionFactory, S: Storage + Clone> CaptureEngine<F, S> {
    pub fn new(factory: F, storage: S, config: RunConfig) -> Self {
        Self::new_with_monitoring(factory, storage, config, false)
    }

    pub fn new_with_monitoring(factory: F, storage: S, config: RunConfig, monitor_enabled: bool) -> Self {
        let director = InteractionDirector::new(
            config.selectors.clone(),
            config.timings.clone(),
            config.include_interactions,
        );
        let capture = CaptureUnit::new(director, config.timings.clone(), config.capture.retries);
        let orchestrator = PairOrchestrator::new(
            factory,
            storage.clone(),
            capture,
            HeightNegotiator::new(config.timings.clone()),
            devices::select(&config.devices),
        )
        .with_output_dirs(&config.paths.original_dir, &config.paths.staging_dir);

        Self {
            ledger: CaseLedger::new(storage.clone(), config.paths.clone()),
            scheduler: ChunkScheduler::new(config.scheduler).with_monitoring(monitor_enabled),
            storage,
            orchestrator,
            config,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn ledger(&self) -> &CaseLedger<S> {
        &self.ledger
    }

    pub async fn apply_exclusions(&self, case_numbers: &[usize]) -> Result<Option<ExclusionReport>> {
        apply_exclusions(&self.storage, &self.config.paths, case_numbers).await
    }

    /// 建立並清空兩個截圖目錄
    pub async fn prepare_artifact_dirs(&self) -> Result<()> {
        for dir in [&self.config.paths.original_dir, &self.config.paths.staging_dir] {
            self.storage.create_dir(dir).await?;
            let files = self.storage.list_dir(dir).await?;
            for file in &files {
                self.storage.remove_file(&format!("{}/{}", dir, file)).await?;
            }
            tracing::debug!("Prepared {} ({} old file(s) removed)", dir, files.len());
        }
        Ok(())
    }

    pub async fn capture_all(&self) -> Result<RunSummary> {
        let active = self.ledger.active().await?;
        if active.is_empty() {
            tracing::warn!("⚠️ No matched URL pairs to capture");
        }

        self.prepare_artifact_dirs().await?;

        if self.config.capture.warmup {
            if let Some(first) = active.first() {
                self.warm_up(first).await;
            }
        }

        let summary = self.scheduler.run(&self.orchestrator, &active).await;
        summary.log("Capture run");
        Ok(summary)
    }

    async fn warm_up(&self, pair: &MatchedPair) {
        tracing::info!("🔥 Warming up browsers with {}", pair.original_url);
        let (original, staging) = self.orchestrator.warm_up(pair).await;
        if !original.is_captured() || !staging.is_captured() {
            tracing::warn!("⚠️ Warm-up capture failed, continuing with the main run");
        }
    }

    pub async fn retry_cases(&self, case_numbers: &[usize]) -> Result<Option<RunSummary>> {
        if case_numbers.is_empty() {
            return Ok(None);
        }
        let active = self.ledger.active().await?;
        let summary = self
            .scheduler
            .retry_cases(&self.orchestrator, &active, case_numbers)
            .await;
        summary.log("Retry run");
        Ok(Some(summary))
    }

    /// 還原被排除的 case 並去除重複；沒有帳本檔時只記錄警告
    pub async fn revert_excluded(&self) -> Result<Option<(usize, usize)>> {
        if !self.ledger.revert_available().await {
            tracing::warn!("Nothing to revert, excluded ledger files are missing");
            return Ok(None);
        }
        let restored = self.ledger.revert().await?;
        let removed = self.ledger.deduplicate().await?;
        Ok(Some((restored, removed)))
    }

    /// 給下游 diff 設定產生器使用的截圖配對
    pub async fn artifact_pairing(&self) -> Result<ArtifactPairing> {
        let originals = artifacts::list_indexed_artifacts(&self.storage, &self.config.paths.original_dir).await?;
        let stagings = artifacts::list_indexed_artifacts(&self.storage, &self.config.paths.staging_dir).await?;
        Ok(artifacts::pair_artifacts(&originals, &stagings))
    }

    pub async fn run(&self) -> Result<RunReport> {
        let mut report = RunReport {
            exclusion: self.apply_exclusions(&self.config.excluded_cases).await?,
            ..RunReport::default()
        };

        report.capture = Some(self.capture_all().await?);
        report.retry = self.retry_cases(&self.config.retry_cases).await?;

        if self.config.revert_excluded {
            if let Some((restored, removed)) = self.revert_excluded().await? {
                report.reverted = Some(restored);
                report.duplicates_removed = removed;
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::artifacts::WARMUP_ARTIFACT;
    use crate::core::test_support::{fast_timings, FakeBrowser, MockStorage};
    use crate::domain::model::DeviceName;
    use crate::utils::error::TwinshotError;
    use serde_json::json;

    fn config() -> RunConfig {
        RunConfig {
            devices: vec![DeviceName::Desktop],
            timings: fast_timings(),
            ..RunConfig::default()
        }
    }

    async fn storage() -> MockStorage {
        let storage = MockStorage::new();
        storage
            .put_json(
                "matching_original_urls.json",
                json!(["https://a.com/x/1", "https://a.com/x/2", "https://a.com/x/3"]),
            )
            .await;
        storage
            .put_json(
                "matching_staging_urls.json",
                json!(["https://b.com/x/1", "https://b.com/x/2", "https://b.com/x/3"]),
            )
            .await;
        storage
    }

    #[tokio::test]
    async fn test_first_run_ignores_exclusions_and_captures_everything() {
        let storage = storage().await;
        let mut config = config();
        config.excluded_cases = vec![1];
        let engine = CaptureEngine::new(FakeBrowser::new(), storage.clone(), config);

        let report = engine.run().await.unwrap();

        assert!(report.exclusion.is_none());
        let capture = report.capture.unwrap();
        assert_eq!(capture.pairs_scheduled, 3);
        assert_eq!(capture.captures_succeeded, 6);

        let pairing = engine.artifact_pairing().await.unwrap();
        assert_eq!(pairing.pairs.len(), 3);
        assert_eq!(pairing.pairs[0].0, "original_1_desktop_x_1.png");
    }

    #[tokio::test]
    async fn test_second_run_excludes_and_purges_old_artifacts() {
        let storage = storage().await;
        storage
            .write_file("original_scr/original_9_desktop_old.png", b"old")
            .await
            .unwrap();
        let mut config = config();
        config.excluded_cases = vec![2];
        config.capture.warmup = true;
        let engine = CaptureEngine::new(FakeBrowser::new(), storage.clone(), config);

        let report = engine.run().await.unwrap();

        assert_eq!(report.exclusion.unwrap().excluded[0].original_url, "https://a.com/x/2");
        assert!(storage.get_file("original_scr/original_9_desktop_old.png").await.is_none());
        assert!(storage
            .get_file(&format!("original_scr/{}", WARMUP_ARTIFACT))
            .await
            .is_some());

        // 暖機截圖不列入配對
        let pairing = engine.artifact_pairing().await.unwrap();
        assert_eq!(pairing.pairs.len(), 2);
        assert_eq!(pairing.pairs[1].0, "original_2_desktop_x_3.png");
    }

    #[tokio::test]
    async fn test_excluding_every_case_aborts_the_run() {
        let storage = storage().await;
        storage.write_file("staging_scr/staging_1_desktop_x.png", b"old").await.unwrap();
        let mut config = config();
        config.excluded_cases = vec![1, 2, 3];
        let browser = FakeBrowser::new();
        let engine = CaptureEngine::new(browser.clone(), storage, config);

        assert!(matches!(engine.run().await, Err(TwinshotError::AllCasesExcluded)));
        assert_eq!(browser.launched(), 0);
    }

    #[tokio::test]
    async fn test_retry_and_revert_in_one_run() {
        let storage = storage().await;
        storage.write_file("original_scr/original_1_desktop_x.png", b"old").await.unwrap();
        let mut config = config();
        config.excluded_cases = vec![1];
        config.retry_cases = vec![2, 7];
        config.revert_excluded = true;
        let engine = CaptureEngine::new(FakeBrowser::new(), storage.clone(), config);

        let report = engine.run().await.unwrap();

        assert_eq!(report.retry.unwrap().pairs_scheduled, 1);
        assert_eq!(report.reverted, Some(1));
        assert_eq!(
            storage.get_json("matching_original_urls.json").await.unwrap(),
            json!(["https://a.com/x/1", "https://a.com/x/2", "https://a.com/x/3"])
        );
        assert!(!engine.ledger().revert_available().await);
    }

    #[tokio::test]
    async fn test_no_devices_means_no_captures() {
        let storage = storage().await;
        let mut config = config();
        config.devices.clear();
        let browser = FakeBrowser::new();
        let engine = CaptureEngine::new(browser.clone(), storage, config);

        let report = engine.run().await.unwrap();

        assert_eq!(report.capture.unwrap().total_captures(), 0);
        assert_eq!(browser.launched(), 0);
    }
}
