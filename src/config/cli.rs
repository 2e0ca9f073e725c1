use crate::config::{FileConfig, PendingPrompts};
use crate::core::case_numbers::parse_case_numbers;
use crate::domain::model::{BrowserKind, DeviceName};
use crate::domain::settings::RunConfig;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "twinshot")]
#[command(about = "Paired original/staging screenshot capture for visual regression")]
pub struct CliConfig {
    #[arg(long, default_value = ".", help = "Directory holding the URL lists and screenshot folders")]
    pub workdir: String,

    #[arg(long, help = "TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, help = "chrome, firefox, edge or safari")]
    pub browser: Option<BrowserKind>,

    #[arg(long)]
    pub webdriver_url: Option<String>,

    #[arg(long, value_delimiter = ',', help = "Devices to capture, e.g. desktop,mobile")]
    pub devices: Option<Vec<DeviceName>>,

    #[arg(long, num_args = 0..=1, default_missing_value = "true", help = "Run hover/click/removal interactions")]
    pub interactions: Option<bool>,

    #[arg(long, help = "Case numbers to exclude, e.g. 1-4,6")]
    pub exclude: Option<String>,

    #[arg(long, help = "Case numbers to capture again after the main run")]
    pub retry: Option<String>,

    #[arg(long, num_args = 0..=1, default_missing_value = "true", help = "Restore excluded cases after the run")]
    pub revert: Option<bool>,

    #[arg(long, help = "Capture an unindexed warm-up screenshot first")]
    pub warmup: bool,

    #[arg(long)]
    pub chunk_size: Option<usize>,

    #[arg(long)]
    pub concurrency: Option<usize>,

    #[arg(long, help = "Never prompt; unanswered questions use defaults")]
    pub non_interactive: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[arg(long, help = "Log browser process count and memory after every chunk")]
    pub monitor: bool,
}

impl CliConfig {
    /// 預設值 → TOML → CLI 旗標；回傳 RunConfig 與仍需詢問的項目
    pub fn resolve(&self) -> Result<(RunConfig, PendingPrompts)> {
        let mut config = RunConfig::default();
        let mut pending = PendingPrompts::all();

        if let Some(path) = &self.config {
            tracing::debug!("Loading configuration file {}", path);
            FileConfig::from_file(path)?.apply(&mut config, &mut pending);
        }

        self.apply(&mut config, &mut pending);

        if self.non_interactive {
            if pending.devices {
                config.devices = vec![DeviceName::Desktop, DeviceName::Tablet, DeviceName::Mobile];
            }
            pending = PendingPrompts::none();
        }

        config.validate()?;
        Ok((config, pending))
    }

    fn apply(&self, config: &mut RunConfig, pending: &mut PendingPrompts) {
        if let Some(kind) = self.browser {
            config.browser.select_kind(kind);
            pending.browser = false;
        }
        if let Some(url) = &self.webdriver_url {
            config.browser.set_webdriver_url(url.clone());
        }
        if let Some(devices) = &self.devices {
            config.devices = devices.clone();
            pending.devices = false;
        }
        if let Some(interactions) = self.interactions {
            config.include_interactions = interactions;
            pending.interactions = false;
        }
        if let Some(exclude) = &self.exclude {
            config.excluded_cases = parse_case_numbers(exclude);
            pending.exclusions = false;
        }
        if let Some(retry) = &self.retry {
            config.retry_cases = parse_case_numbers(retry);
            pending.retry = false;
        }
        if let Some(revert) = self.revert {
            config.revert_excluded = revert;
            pending.revert = false;
        }
        if self.warmup {
            config.capture.warmup = true;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.scheduler.chunk_size = chunk_size;
        }
        if let Some(concurrency) = self.concurrency {
            config.scheduler.concurrency_limit = concurrency;
        }
    }
}
