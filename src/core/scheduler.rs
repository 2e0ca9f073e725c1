use crate::core::ledger;
use crate::core::orchestrator::PairOrchestrator;
use crate::domain::model::{MatchedPair, RunSummary};
use crate::domain::ports::{SessionFactory, Storage};
use crate::domain::settings::SchedulerSettings;
use crate::utils::monitor::SystemMonitor;
use futures::future::join_all;

/// 排程計畫：chunk → 子群組 → pair；子群組內的 pair 同時處理
pub type SchedulePlan = Vec<Vec<Vec<MatchedPair>>>;

/// 依清單位置切出 chunk 與子群組，case 編號在排程前就決定
pub fn plan(pairs: &[MatchedPair], settings: SchedulerSettings) -> SchedulePlan {
    let chunk_size = settings.chunk_size.max(1);
    let concurrency_limit = settings.concurrency_limit.max(1);
    let mut global_index = 1;

    pairs
        .chunks(chunk_size)
        .map(|chunk| {
            chunk
                .chunks(concurrency_limit)
                .map(|group| {
                    let group: Vec<MatchedPair> = group
                        .iter()
                        .enumerate()
                        .map(|(offset, pair)| pair.clone().with_index(global_index + offset))
                        .collect();
                    global_index += group.len();
                    group
                })
                .collect()
        })
        .collect()
}

/// 分批限制同時開啟的瀏覽器數量（每組 pair 兩個 session）
pub struct ChunkScheduler {
    settings: SchedulerSettings,
    monitor: Option<SystemMonitor>,
}

impl ChunkScheduler {
    pub fn new(settings: SchedulerSettings) -> Self {
        Self {
            settings,
            monitor: None,
        }
    }

    /// 啟用或禁用系統監控
    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = enabled.then(SystemMonitor::new);
        self
    }

    pub fn settings(&self) -> SchedulerSettings {
        self.settings
    }

    pub fn max_open_sessions(&self) -> usize {
        self.settings.concurrency_limit.max(1) * 2
    }

    pub async fn run<F, S>(&self, orchestrator: &PairOrchestrator<F, S>, pairs: &[MatchedPair]) -> RunSummary
    where
        F: SessionFactory,
        S: Storage,
    {
        let schedule = plan(pairs, self.settings);
        let mut summary = RunSummary::start();

        tracing::info!(
            "🚀 Capturing {} case(s) in {} chunk(s), at most {} browser sessions at once",
            pairs.len(),
            schedule.len(),
            self.max_open_sessions()
        );

        for (chunk_no, chunk) in schedule.iter().enumerate() {
            tracing::info!(
                "📦 Chunk {}/{} ({} case(s))",
                chunk_no + 1,
                schedule.len(),
                chunk.iter().map(Vec::len).sum::<usize>()
            );

            for group in chunk {
                let outcomes = join_all(group.iter().map(|pair| orchestrator.process_pair(pair))).await;
                for outcome in &outcomes {
                    summary.record(outcome);
                }
            }

            if let Some(monitor) = &self.monitor {
                monitor.log_chunk(chunk_no + 1);
            }
        }

        if let Some(monitor) = &self.monitor {
            monitor.log_final();
        }

        summary.finish();
        summary
    }

    /// 重跑指定的 case：每個 case 各自開新的 session，與主流程無關
    pub async fn retry_cases<F, S>(
        &self,
        orchestrator: &PairOrchestrator<F, S>,
        active: &[MatchedPair],
        case_numbers: &[usize],
    ) -> RunSummary
    where
        F: SessionFactory,
        S: Storage,
    {
        let (selected, invalid) = ledger::resolve_cases(active, case_numbers);
        for case in invalid {
            tracing::warn!("Invalid case number: {}. Skipping.", case);
        }

        let mut summary = RunSummary::start();
        for pair in &selected {
            tracing::info!("🔁 Retrying case {}", pair.index);
            let outcome = orchestrator.process_pair(pair).await;
            summary.record(&outcome);
        }
        summary.finish();
        summary
    }
}
