use crate::config::PendingPrompts;
use crate::domain::model::{BrowserKind, DeviceName};
use crate::domain::settings::RunConfig;
use crate::utils::error::{Result, TwinshotError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// TOML 設定檔，所有區段皆可省略
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub browser: Option<BrowserSection>,
    pub selectors: Option<SelectorSection>,
    pub scheduler: Option<SchedulerSection>,
    pub capture: Option<CaptureSection>,
    pub timing: Option<TimingSection>,
    pub paths: Option<PathsSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrowserSection {
    pub kind: Option<BrowserKind>,
    pub webdriver_url: Option<String>,
    pub headless: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorSection {
    pub hover: Option<Vec<String>>,
    pub click: Option<Vec<String>>,
    pub remove: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerSection {
    pub chunk_size: Option<usize>,
    pub concurrency_limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureSection {
    pub retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub warmup: Option<bool>,
    pub devices: Option<Vec<DeviceName>>,
    pub interactions: Option<bool>,
}

/// 每個等待點的毫秒數
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingSection {
    pub navigation_timeout_ms: Option<u64>,
    pub root_element_wait_ms: Option<u64>,
    pub height_settle_ms: Option<u64>,
    pub ready_state_wait_ms: Option<u64>,
    pub capture_settle_ms: Option<u64>,
    pub hover_wait_ms: Option<u64>,
    pub click_pause_ms: Option<u64>,
    pub removal_poll_interval_ms: Option<u64>,
    pub removal_max_attempts: Option<u32>,
    pub removal_timeout_ms: Option<u64>,
    pub element_poll_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsSection {
    pub original_urls: Option<String>,
    pub staging_urls: Option<String>,
    pub excluded_original_urls: Option<String>,
    pub excluded_staging_urls: Option<String>,
    pub original_dir: Option<String>,
    pub staging_dir: Option<String>,
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn set_ms(target: &mut Duration, value: Option<u64>) {
    set(target, value.map(Duration::from_millis));
}

impl FileConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TwinshotError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| TwinshotError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${WEBDRIVER_URL})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TwinshotError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 把設定檔有寫的值覆蓋到 RunConfig，並標記不必再詢問的項目
    pub fn apply(&self, config: &mut RunConfig, pending: &mut PendingPrompts) {
        if let Some(browser) = &self.browser {
            if let Some(kind) = browser.kind {
                config.browser.select_kind(kind);
                pending.browser = false;
            }
            if let Some(url) = &browser.webdriver_url {
                config.browser.set_webdriver_url(url.clone());
            }
            set(&mut config.browser.headless, browser.headless);
        }

        if let Some(selectors) = &self.selectors {
            set(&mut config.selectors.hover, selectors.hover.clone());
            set(&mut config.selectors.click, selectors.click.clone());
            set(&mut config.selectors.remove, selectors.remove.clone());
        }

        if let Some(scheduler) = &self.scheduler {
            set(&mut config.scheduler.chunk_size, scheduler.chunk_size);
            set(&mut config.scheduler.concurrency_limit, scheduler.concurrency_limit);
        }

        if let Some(capture) = &self.capture {
            set(&mut config.capture.retries, capture.retries);
            set_ms(&mut config.timings.retry_delay, capture.retry_delay_ms);
            set(&mut config.capture.warmup, capture.warmup);
            if let Some(devices) = &capture.devices {
                config.devices = devices.clone();
                pending.devices = false;
            }
            if let Some(interactions) = capture.interactions {
                config.include_interactions = interactions;
                pending.interactions = false;
            }
        }

        if let Some(timing) = &self.timing {
            let t = &mut config.timings;
            set_ms(&mut t.navigation_timeout, timing.navigation_timeout_ms);
            set_ms(&mut t.root_element_wait, timing.root_element_wait_ms);
            set_ms(&mut t.height_settle, timing.height_settle_ms);
            set_ms(&mut t.ready_state_wait, timing.ready_state_wait_ms);
            set_ms(&mut t.capture_settle, timing.capture_settle_ms);
            set_ms(&mut t.hover_wait, timing.hover_wait_ms);
            set_ms(&mut t.click_pause, timing.click_pause_ms);
            set_ms(&mut t.removal_poll_interval, timing.removal_poll_interval_ms);
            set(&mut t.removal_max_attempts, timing.removal_max_attempts);
            set_ms(&mut t.removal_timeout, timing.removal_timeout_ms);
            set_ms(&mut t.element_poll_interval, timing.element_poll_interval_ms);
        }

        if let Some(paths) = &self.paths {
            let p = &mut config.paths;
            set(&mut p.original_urls, paths.original_urls.clone());
            set(&mut p.staging_urls, paths.staging_urls.clone());
            set(&mut p.excluded_original_urls, paths.excluded_original_urls.clone());
            set(&mut p.excluded_staging_urls, paths.excluded_staging_urls.clone());
            set(&mut p.original_dir, paths.original_dir.clone());
            set(&mut p.staging_dir, paths.staging_dir.clone());
        }
    }
}
