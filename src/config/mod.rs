#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::FileConfig;

/// 設定檔與旗標都沒有回答、需要在執行時詢問操作員的項目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPrompts {
    pub browser: bool,
    pub interactions: bool,
    pub devices: bool,
    pub exclusions: bool,
    pub retry: bool,
    pub revert: bool,
}

impl PendingPrompts {
    pub fn all() -> Self {
        Self {
            browser: true,
            interactions: true,
            devices: true,
            exclusions: true,
            retry: true,
            revert: true,
        }
    }

    /// `--non-interactive`：一律使用預設值
    pub fn none() -> Self {
        Self {
            browser: false,
            interactions: false,
            devices: false,
            exclusions: false,
            retry: false,
            revert: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::none()
    }
}
