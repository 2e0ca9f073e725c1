use crate::core::capture::CaptureUnit;
use crate::core::devices;
use crate::core::height::{self, HeightNegotiator, NEUTRAL_HEIGHT};
use crate::domain::model::{
    CaptureOutcome, CaptureRecord, CaptureTask, DeviceName, DeviceProfile, MatchedPair,
    PairOutcome, Role, Viewport,
};
use crate::domain::ports::{BrowserSession, SessionFactory, Storage};

/// 為一組 MatchedPair 開啟兩個 session，依序跑完所有裝置後關閉
pub struct PairOrchestrator<F: SessionFactory, S: Storage> {
    factory: F,
    storage: S,
    capture: CaptureUnit,
    negotiator: HeightNegotiator,
    devices: Vec<DeviceProfile>,
    original_dir: String,
    staging_dir: String,
}

impl<F: SessionFactory, S: Storage> PairOrchestrator<F, S> {
    pub fn new(
        factory: F,
        storage: S,
        capture: CaptureUnit,
        negotiator: HeightNegotiator,
        devices: Vec<DeviceProfile>,
    ) -> Self {
        Self {
            factory,
            storage,
            capture,
            negotiator,
            devices,
            original_dir: "original_scr".to_string(),
            staging_dir: "staging_scr".to_string(),
        }
    }

    pub fn with_output_dirs(mut self, original_dir: &str, staging_dir: &str) -> Self {
        self.original_dir = original_dir.to_string();
        self.staging_dir = staging_dir.to_string();
        self
    }

    pub fn devices(&self) -> &[DeviceProfile] {
        &self.devices
    }

    pub fn output_dir(&self, role: Role) -> &str {
        match role {
            Role::Original => &self.original_dir,
            Role::Staging => &self.staging_dir,
        }
    }

    pub async fn process_pair(&self, pair: &MatchedPair) -> PairOutcome {
        if self.devices.is_empty() {
            tracing::debug!("No devices selected, nothing to capture for case {}", pair.index);
            return PairOutcome::new(pair.index);
        }

        let initial = Viewport::new(self.devices[0].width, NEUTRAL_HEIGHT);
        let (original, staging) = match self.open_pair(pair.index, initial).await {
            Ok(sessions) => sessions,
            Err(outcome) => return outcome,
        };

        let outcome = self.capture_devices(pair, &original, &staging).await;

        self.release(pair.index, Role::Original, &original).await;
        self.release(pair.index, Role::Staging, &staging).await;
        outcome
    }

    /// 用第一組 pair 在 desktop 寬度先拍一張不編號的暖機截圖
    pub async fn warm_up(&self, pair: &MatchedPair) -> (CaptureOutcome, CaptureOutcome) {
        let desktop = devices::profile(DeviceName::Desktop);
        let viewport = Viewport::new(desktop.width, NEUTRAL_HEIGHT);

        let (original, staging) = match self.open_pair(0, viewport).await {
            Ok(sessions) => sessions,
            Err(outcome) => {
                let error = outcome.launch_error.unwrap_or_default();
                let failed = || CaptureOutcome::Failed {
                    attempts: 0,
                    last_error: error.clone(),
                };
                return (failed(), failed());
            }
        };

        let warmup_pair = pair.clone().with_index(0);
        let original_task = CaptureTask::warmup(warmup_pair.clone(), desktop, Role::Original);
        let staging_task = CaptureTask::warmup(warmup_pair, desktop, Role::Staging);

        let outcomes = tokio::join!(
            self.capture.capture(
                &self.storage,
                &original,
                &original_task,
                NEUTRAL_HEIGHT,
                &self.original_dir
            ),
            self.capture.capture(
                &self.storage,
                &staging,
                &staging_task,
                NEUTRAL_HEIGHT,
                &self.staging_dir
            ),
        );

        self.release(0, Role::Original, &original).await;
        self.release(0, Role::Staging, &staging).await;
        outcomes
    }

    async fn open_pair(
        &self,
        index: usize,
        viewport: Viewport,
    ) -> std::result::Result<(F::Session, F::Session), PairOutcome> {
        let original = match self.factory.launch(viewport).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("❌ Could not start original session for case {}: {}", index, e);
                return Err(PairOutcome::launch_failed(index, e.to_string()));
            }
        };

        match self.factory.launch(viewport).await {
            Ok(staging) => Ok((original, staging)),
            Err(e) => {
                tracing::error!("❌ Could not start staging session for case {}: {}", index, e);
                self.release(index, Role::Original, &original).await;
                Err(PairOutcome::launch_failed(index, e.to_string()))
            }
        }
    }

    async fn capture_devices(
        &self,
        pair: &MatchedPair,
        original: &F::Session,
        staging: &F::Session,
    ) -> PairOutcome {
        let mut outcome = PairOutcome::new(pair.index);

        for device in &self.devices {
            let neutral = Viewport::new(device.width, NEUTRAL_HEIGHT);
            resize(original, neutral, pair.index, Role::Original).await;
            resize(staging, neutral, pair.index, Role::Staging).await;

            let (original_height, staging_height) = tokio::join!(
                self.negotiator.negotiate(original, &pair.original_url),
                self.negotiator.negotiate(staging, &pair.staging_url),
            );
            let max_height = height::shared_height(original_height, staging_height);
            tracing::debug!(
                "Case {} [{}]: original {}px, staging {}px, capturing at {}px",
                pair.index,
                device.name,
                original_height.pixels,
                staging_height.pixels,
                max_height
            );

            let sized = Viewport::new(device.width, max_height);
            resize(original, sized, pair.index, Role::Original).await;
            resize(staging, sized, pair.index, Role::Staging).await;

            let original_task = CaptureTask::new(pair.clone(), *device, Role::Original);
            let staging_task = CaptureTask::new(pair.clone(), *device, Role::Staging);

            let (original_outcome, staging_outcome) = tokio::join!(
                self.capture.capture(
                    &self.storage,
                    original,
                    &original_task,
                    max_height,
                    &self.original_dir
                ),
                self.capture.capture(
                    &self.storage,
                    staging,
                    &staging_task,
                    max_height,
                    &self.staging_dir
                ),
            );

            outcome.captures.push(CaptureRecord {
                device: device.name,
                role: Role::Original,
                height: max_height,
                outcome: original_outcome,
            });
            outcome.captures.push(CaptureRecord {
                device: device.name,
                role: Role::Staging,
                height: max_height,
                outcome: staging_outcome,
            });
        }

        outcome
    }

    async fn release(&self, index: usize, role: Role, session: &F::Session) {
        match session.close().await {
            Ok(()) => tracing::debug!("Closed {} session for case {}", role, index),
            Err(e) => tracing::warn!("⚠️ Failed to close {} session for case {}: {}", role, index, e),
        }
    }
}

async fn resize<B: BrowserSession + ?Sized>(session: &B, viewport: Viewport, index: usize, role: Role) {
    if let Err(e) = session.set_viewport(viewport).await {
        tracing::warn!(
            "⚠️ Could not resize {} session for case {} to {}x{}: {}",
            role,
            index,
            viewport.width,
            viewport.height,
            e
        );
    }
}
