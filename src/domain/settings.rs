use crate::domain::model::{BrowserKind, DeviceName};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::time::Duration;

pub const DEFAULT_CHUNK_SIZE: usize = 12;
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 4;
pub const DEFAULT_RETRIES: u32 = 3;

/// 每個等待點各自的上限
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timings {
    pub navigation_timeout: Duration,
    pub root_element_wait: Duration,
    pub height_settle: Duration,
    pub ready_state_wait: Duration,
    pub capture_settle: Duration,
    pub hover_wait: Duration,
    pub click_pause: Duration,
    pub removal_poll_interval: Duration,
    pub removal_max_attempts: u32,
    pub removal_timeout: Duration,
    pub retry_delay: Duration,
    pub element_poll_interval: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(60),
            root_element_wait: Duration::from_secs(30),
            height_settle: Duration::from_secs(5),
            ready_state_wait: Duration::from_secs(20),
            capture_settle: Duration::from_secs(2),
            hover_wait: Duration::from_secs(5),
            click_pause: Duration::from_secs(1),
            removal_poll_interval: Duration::from_secs(1),
            removal_max_attempts: 2,
            removal_timeout: Duration::from_secs(3),
            retry_delay: Duration::from_secs(5),
            element_poll_interval: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSet {
    pub hover: Vec<String>,
    pub click: Vec<String>,
    pub remove: Vec<String>,
}

impl SelectorSet {
    pub fn empty() -> Self {
        Self {
            hover: Vec::new(),
            click: Vec::new(),
            remove: Vec::new(),
        }
    }
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self {
            hover: vec![
                ".cmp-experiencefragment--subsidiary-header-xf .cmp-navigation__item--level-0.cmp-navigation__item--active>.cmp-navigation__item-link".to_string(),
            ],
            click: vec![
                ".cmp-experiencefragment--subsidiary-header-xf .hamburger-search-container".to_string(),
            ],
            remove: vec![
                "#onetrust-banner-sdk".to_string(),
                ".ot-sdk-container".to_string(),
                ".ot-sdk-row".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserSettings {
    pub kind: BrowserKind,
    pub webdriver_url: String,
    pub headless: bool,
    /// `webdriver_url` 來自設定檔或 `--webdriver-url`，換瀏覽器時不可覆蓋
    pub webdriver_url_explicit: bool,
}

impl BrowserSettings {
    pub fn default_webdriver_url(kind: BrowserKind) -> &'static str {
        match kind {
            BrowserKind::Chrome | BrowserKind::Edge => "http://localhost:9515",
            BrowserKind::Firefox | BrowserKind::Safari => "http://localhost:4444",
        }
    }

    pub fn with_endpoint(kind: BrowserKind, webdriver_url: impl Into<String>) -> Self {
        Self {
            kind,
            webdriver_url: webdriver_url.into(),
            webdriver_url_explicit: true,
            ..Self::default()
        }
    }

    /// 換瀏覽器；只有沒被明確指定過的 endpoint 才跟著換成該瀏覽器的預設值
    pub fn select_kind(&mut self, kind: BrowserKind) {
        self.kind = kind;
        if !self.webdriver_url_explicit {
            self.webdriver_url = Self::default_webdriver_url(kind).to_string();
        }
    }

    pub fn set_webdriver_url(&mut self, url: impl Into<String>) {
        self.webdriver_url = url.into();
        self.webdriver_url_explicit = true;
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            kind: BrowserKind::Chrome,
            webdriver_url: Self::default_webdriver_url(BrowserKind::Chrome).to_string(),
            headless: true,
            webdriver_url_explicit: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub chunk_size: usize,
    pub concurrency_limit: usize,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    pub retries: u32,
    pub warmup: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            warmup: false,
        }
    }
}

/// 狀態檔與截圖目錄的相對路徑
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    pub original_urls: String,
    pub staging_urls: String,
    pub excluded_original_urls: String,
    pub excluded_staging_urls: String,
    pub original_dir: String,
    pub staging_dir: String,
}

impl Default for StatePaths {
    fn default() -> Self {
        Self {
            original_urls: "matching_original_urls.json".to_string(),
            staging_urls: "matching_staging_urls.json".to_string(),
            excluded_original_urls: "excluded_original_urls.json".to_string(),
            excluded_staging_urls: "excluded_staging_urls.json".to_string(),
            original_dir: "original_scr".to_string(),
            staging_dir: "staging_scr".to_string(),
        }
    }
}

/// 一次執行所需的全部設定，由 CLI / 設定檔 / 操作員提示組合而成後整個傳入核心
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunConfig {
    pub browser: BrowserSettings,
    pub devices: Vec<DeviceName>,
    pub include_interactions: bool,
    pub excluded_cases: Vec<usize>,
    pub retry_cases: Vec<usize>,
    pub revert_excluded: bool,
    pub selectors: SelectorSet,
    pub timings: Timings,
    pub scheduler: SchedulerSettings,
    pub capture: CaptureSettings,
    pub paths: StatePaths,
}

impl Validate for StatePaths {
    fn validate(&self) -> Result<()> {
        validation::validate_path("paths.original_urls", &self.original_urls)?;
        validation::validate_path("paths.staging_urls", &self.staging_urls)?;
        validation::validate_path("paths.excluded_original_urls", &self.excluded_original_urls)?;
        validation::validate_path("paths.excluded_staging_urls", &self.excluded_staging_urls)?;
        validation::validate_path("paths.original_dir", &self.original_dir)?;
        validation::validate_path("paths.staging_dir", &self.staging_dir)?;
        Ok(())
    }
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("browser.webdriver_url", &self.browser.webdriver_url)?;
        validation::validate_positive_number("scheduler.chunk_size", self.scheduler.chunk_size, 1)?;
        validation::validate_positive_number(
            "scheduler.concurrency_limit",
            self.scheduler.concurrency_limit,
            1,
        )?;
        validation::validate_positive_number("capture.retries", self.capture.retries as usize, 1)?;
        validation::validate_positive_number(
            "timing.removal_max_attempts",
            self.timings.removal_max_attempts as usize,
            1,
        )?;
        self.paths.validate()
    }
}
