use crate::utils::error::{Result, TwinshotError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// 一組對應的 original / staging URL，index 為 1-based 的 case 編號
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedPair {
    pub index: usize,
    pub original_url: String,
    pub staging_url: String,
}

impl MatchedPair {
    pub fn new(index: usize, original_url: impl Into<String>, staging_url: impl Into<String>) -> Self {
        Self {
            index,
            original_url: original_url.into(),
            staging_url: staging_url.into(),
        }
    }

    pub fn url_for(&self, role: Role) -> &str {
        match role {
            Role::Original => &self.original_url,
            Role::Staging => &self.staging_url,
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// 將兩個以位置對應的 URL 清單組成 pair，長度不一致即視為帳本損壞
    pub fn zip_lists(original: Vec<String>, staging: Vec<String>) -> Result<Vec<MatchedPair>> {
        if original.len() != staging.len() {
            return Err(TwinshotError::LedgerMismatchError {
                original: original.len(),
                staging: staging.len(),
            });
        }

        Ok(original
            .into_iter()
            .zip(staging)
            .enumerate()
            .map(|(i, (o, s))| MatchedPair::new(i + 1, o, s))
            .collect())
    }

    pub fn unzip_lists(pairs: &[MatchedPair]) -> (Vec<String>, Vec<String>) {
        pairs
            .iter()
            .map(|p| (p.original_url.clone(), p.staging_url.clone()))
            .unzip()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceName {
    Desktop,
    Tablet,
    Mobile,
}

impl DeviceName {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceName::Desktop => "desktop",
            DeviceName::Tablet => "tablet",
            DeviceName::Mobile => "mobile",
        }
    }
}

impl fmt::Display for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceName {
    type Err = TwinshotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" | "1" => Ok(DeviceName::Desktop),
            "tablet" | "2" => Ok(DeviceName::Tablet),
            "mobile" | "3" => Ok(DeviceName::Mobile),
            other => Err(TwinshotError::InvalidConfigValueError {
                field: "devices".to_string(),
                value: other.to_string(),
                reason: "Expected desktop, tablet or mobile".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceProfile {
    pub name: DeviceName,
    pub width: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Original,
    Staging,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Original => "original",
            Role::Staging => "staging",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Chrome,
    Firefox,
    Edge,
    Safari,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Edge => "edge",
            BrowserKind::Safari => "safari",
        }
    }

    /// 操作員選單的答案：1 Chrome、2 Firefox、3 Edge、4 Safari，其他一律 Chrome
    pub fn from_menu_choice(choice: &str) -> Self {
        match choice.trim() {
            "1" => BrowserKind::Chrome,
            "2" => BrowserKind::Firefox,
            "3" => BrowserKind::Edge,
            "4" => BrowserKind::Safari,
            other => {
                tracing::warn!("Invalid browser choice '{}'. Defaulting to Chrome.", other);
                BrowserKind::Chrome
            }
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserKind {
    type Err = TwinshotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" => Ok(BrowserKind::Chrome),
            "firefox" => Ok(BrowserKind::Firefox),
            "edge" | "msedge" | "microsoftedge" => Ok(BrowserKind::Edge),
            "safari" => Ok(BrowserKind::Safari),
            other => Err(TwinshotError::InvalidConfigValueError {
                field: "browser".to_string(),
                value: other.to_string(),
                reason: "Expected chrome, firefox, edge or safari".to_string(),
            }),
        }
    }
}

/// 單次截圖嘗試的工作描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTask {
    pub pair: MatchedPair,
    pub device: DeviceProfile,
    pub role: Role,
    pub warmup: bool,
}

impl CaptureTask {
    pub fn new(pair: MatchedPair, device: DeviceProfile, role: Role) -> Self {
        Self {
            pair,
            device,
            role,
            warmup: false,
        }
    }

    pub fn warmup(pair: MatchedPair, device: DeviceProfile, role: Role) -> Self {
        Self {
            pair,
            device,
            role,
            warmup: true,
        }
    }

    pub fn url(&self) -> &str {
        self.pair.url_for(self.role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionResult {
    Found,
    NotFound,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorOutcome {
    pub selector: String,
    pub result: InteractionResult,
}

impl SelectorOutcome {
    pub fn new(selector: &str, result: InteractionResult) -> Self {
        Self {
            selector: selector.to_string(),
            result,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionReport {
    pub hovers: Vec<SelectorOutcome>,
    pub clicks: Vec<SelectorOutcome>,
    pub removals: Vec<SelectorOutcome>,
}

impl InteractionReport {
    pub fn skipped(&self) -> usize {
        self.hovers
            .iter()
            .chain(&self.clicks)
            .chain(&self.removals)
            .filter(|o| o.result != InteractionResult::Found)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightSource {
    Measured,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiatedHeight {
    pub pixels: u32,
    pub source: HeightSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Captured { path: PathBuf, attempts: u32 },
    Failed { attempts: u32, last_error: String },
}

impl CaptureOutcome {
    pub fn is_captured(&self) -> bool {
        matches!(self, CaptureOutcome::Captured { .. })
    }

    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            CaptureOutcome::Captured { path, .. } => Some(path),
            CaptureOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRecord {
    pub device: DeviceName,
    pub role: Role,
    pub height: u32,
    pub outcome: CaptureOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairOutcome {
    pub index: usize,
    pub captures: Vec<CaptureRecord>,
    pub launch_error: Option<String>,
}

impl PairOutcome {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            captures: Vec::new(),
            launch_error: None,
        }
    }

    pub fn launch_failed(index: usize, error: String) -> Self {
        Self {
            index,
            captures: Vec::new(),
            launch_error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedCapture {
    pub index: usize,
    pub device: DeviceName,
    pub role: Role,
    pub error: String,
}

/// 整次執行的統計
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub pairs_scheduled: usize,
    pub pairs_without_sessions: usize,
    pub captures_succeeded: usize,
    pub captures_failed: usize,
    pub failures: Vec<FailedCapture>,
}

impl RunSummary {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            pairs_scheduled: 0,
            pairs_without_sessions: 0,
            captures_succeeded: 0,
            captures_failed: 0,
            failures: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: &PairOutcome) {
        self.pairs_scheduled += 1;
        if outcome.launch_error.is_some() {
            self.pairs_without_sessions += 1;
        }

        for capture in &outcome.captures {
            match &capture.outcome {
                CaptureOutcome::Captured { .. } => self.captures_succeeded += 1,
                CaptureOutcome::Failed { last_error, .. } => {
                    self.captures_failed += 1;
                    self.failures.push(FailedCapture {
                        index: outcome.index,
                        device: capture.device,
                        role: capture.role,
                        error: last_error.clone(),
                    });
                }
            }
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn total_captures(&self) -> usize {
        self.captures_succeeded + self.captures_failed
    }

    pub fn is_clean(&self) -> bool {
        self.captures_failed == 0 && self.pairs_without_sessions == 0
    }

    pub fn log(&self, label: &str) {
        let elapsed = self
            .finished_at
            .map(|f| f - self.started_at)
            .map(|d| d.num_seconds())
            .unwrap_or_default();

        tracing::info!(
            "📋 {} - pairs: {}, captures: {} ok / {} failed, pairs without sessions: {}, elapsed: {}s",
            label,
            self.pairs_scheduled,
            self.captures_succeeded,
            self.captures_failed,
            self.pairs_without_sessions,
            elapsed
        );

        for failure in &self.failures {
            tracing::warn!(
                "   ✗ case {} [{}-{}]: {}",
                failure.index,
                failure.role,
                failure.device,
                failure.error
            );
        }
    }
}
