use crate::core::artifacts;
use crate::core::interaction::InteractionDirector;
use crate::core::wait;
use crate::domain::model::{CaptureOutcome, CaptureTask, Viewport};
use crate::domain::ports::{BrowserSession, Storage};
use crate::domain::settings::Timings;
use crate::utils::error::{Result, TwinshotError};
use std::path::PathBuf;

/// 對單一 (url, device, role) 截圖，失敗時整段流程重試
#[derive(Debug, Clone)]
pub struct CaptureUnit {
    director: InteractionDirector,
    timings: Timings,
    retries: u32,
}

impl CaptureUnit {
    pub fn new(director: InteractionDirector, timings: Timings, retries: u32) -> Self {
        Self {
            director,
            timings,
            retries: retries.max(1),
        }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// 重試用盡只記錄錯誤、不回傳 `Err`；沒有產出檔案即代表失敗
    pub async fn capture<S, B>(
        &self,
        storage: &S,
        session: &B,
        task: &CaptureTask,
        height: u32,
        output_dir: &str,
    ) -> CaptureOutcome
    where
        S: Storage,
        B: BrowserSession + ?Sized,
    {
        let label = format!("{}-{}", task.role, task.device.name);
        tracing::info!(
            "📸 [{}] Start capturing screenshot '{}' for '{}'",
            label,
            task.pair.index,
            task.url()
        );

        let mut last_error = String::new();
        for attempt in 1..=self.retries {
            match self.attempt(storage, session, task, height, output_dir).await {
                Ok(path) => {
                    tracing::info!(
                        "✅ [{}] Finished capturing screenshot '{}' for '{}'",
                        label,
                        task.pair.index,
                        task.url()
                    );
                    return CaptureOutcome::Captured {
                        path,
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        "⚠️ [{}] Error capturing screenshot '{}' for '{}': {} ({}/{})",
                        label,
                        task.pair.index,
                        task.url(),
                        e,
                        attempt,
                        self.retries
                    );
                    last_error = e.to_string();
                    if attempt < self.retries {
                        tokio::time::sleep(self.timings.retry_delay).await;
                    }
                }
            }
        }

        tracing::error!(
            "❌ [{}] Failed to capture screenshot '{}' for '{}' after {} retries",
            label,
            task.pair.index,
            task.url(),
            self.retries
        );
        CaptureOutcome::Failed {
            attempts: self.retries,
            last_error,
        }
    }

    async fn attempt<S, B>(
        &self,
        storage: &S,
        session: &B,
        task: &CaptureTask,
        height: u32,
        output_dir: &str,
    ) -> Result<PathBuf>
    where
        S: Storage,
        B: BrowserSession + ?Sized,
    {
        session
            .navigate(task.url(), self.timings.navigation_timeout)
            .await?;
        wait::wait_for_ready_state(
            session,
            self.timings.ready_state_wait,
            self.timings.element_poll_interval,
        )
        .await?;

        let report = self.director.run(session).await;
        if report.skipped() > 0 {
            tracing::debug!(
                "{} interaction(s) skipped on {}",
                report.skipped(),
                task.url()
            );
        }

        session
            .set_viewport(Viewport::new(task.device.width, height))
            .await?;
        tokio::time::sleep(self.timings.capture_settle).await;

        let image = session.screenshot().await?;
        if image.is_empty() {
            return Err(TwinshotError::CaptureError {
                message: format!("browser returned an empty screenshot for {}", task.url()),
            });
        }
        let path = artifacts::artifact_path(output_dir, task);
        storage.write_file(&path, &image).await?;

        Ok(PathBuf::from(path))
    }
}
