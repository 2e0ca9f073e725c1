use crate::config::PendingPrompts;
use crate::core::case_numbers::parse_case_numbers;
use crate::core::devices;
use crate::domain::model::{BrowserKind, DeviceName};
use crate::domain::settings::RunConfig;
use crate::utils::error::Result;
use std::io::{self, BufRead, StdinLock, Stdout, Write};

/// 操作員問答；輸入結束（EOF）時一律視為空白答案
pub struct Operator<R, W> {
    input: R,
    output: W,
}

impl Operator<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Operator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(answer.trim().to_string())
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        Ok(self.ask(question)?.eq_ignore_ascii_case("y"))
    }

    pub fn choose_browser(&mut self) -> Result<BrowserKind> {
        let choice = self.ask("Select a browser (1: Chrome, 2: Firefox, 3: Edge, 4: Safari): ")?;
        Ok(BrowserKind::from_menu_choice(&choice))
    }

    pub fn include_interactions(&mut self) -> Result<bool> {
        self.confirm("Do you want to capture screenshots along with interactive elements? (y/n): ")
    }

    pub fn choose_devices(&mut self) -> Result<Vec<DeviceName>> {
        let choice = self.ask("For which device you want to run the test? (1: Desktop, 2: Tablet, 3: Mobile): ")?;
        let names = devices::parse_menu_choice(&choice);
        if names.is_empty() {
            tracing::warn!("No devices selected, nothing will be captured");
        }
        Ok(names)
    }

    pub fn cases_to_exclude(&mut self) -> Result<Vec<usize>> {
        if !self.confirm("Do you want to exclude any cases for the test? (y/n): ")? {
            return Ok(Vec::new());
        }
        let input = self.ask("Enter the case numbers to exclude (e.g., 1,2,3 or 1-4,6): ")?;
        Ok(parse_case_numbers(&input))
    }

    pub fn cases_to_retry(&mut self) -> Result<Vec<usize>> {
        if !self.confirm("Do you want to retry testing any cases? (y/n): ")? {
            return Ok(Vec::new());
        }
        let input = self.ask("Enter the case numbers to retry (e.g., 1,2,3 or 1-4,6): ")?;
        Ok(parse_case_numbers(&input))
    }

    pub fn confirm_revert(&mut self) -> Result<bool> {
        self.confirm("Do you want to revert excluded links back into the matching links JSON files? (y/n): ")
    }

    /// 開跑前的三個問題：瀏覽器、互動、裝置
    pub fn answer_setup(&mut self, config: &mut RunConfig, pending: &PendingPrompts) -> Result<()> {
        if pending.browser {
            let kind = self.choose_browser()?;
            config.browser.select_kind(kind);
        }
        if pending.interactions {
            config.include_interactions = self.include_interactions()?;
        }
        if pending.devices {
            config.devices = self.choose_devices()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn operator(input: &str) -> Operator<Cursor<Vec<u8>>, Vec<u8>> {
        Operator::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_setup_answers() {
        let mut op = operator("2\ny\n13\n");
        let mut config = RunConfig::default();

        op.answer_setup(&mut config, &PendingPrompts::all()).unwrap();

        assert_eq!(config.browser.kind, BrowserKind::Firefox);
        assert_eq!(config.browser.webdriver_url, "http://localhost:4444");
        assert!(config.include_interactions);
        assert_eq!(config.devices, vec![DeviceName::Desktop, DeviceName::Mobile]);
    }

    #[test]
    fn test_prompted_browser_keeps_configured_webdriver_url() {
        let mut op = operator("2\n");
        let mut config = RunConfig::default();
        config.browser.set_webdriver_url("http://grid.internal:4444");
        let pending = PendingPrompts {
            browser: true,
            ..PendingPrompts::none()
        };

        op.answer_setup(&mut config, &pending).unwrap();

        assert_eq!(config.browser.kind, BrowserKind::Firefox);
        assert_eq!(config.browser.webdriver_url, "http://grid.internal:4444");
    }

    #[test]
    fn test_unknown_browser_defaults_to_chrome() {
        let mut op = operator("9\n");
        assert_eq!(op.choose_browser().unwrap(), BrowserKind::Chrome);
    }

    #[test]
    fn test_answered_prompts_are_not_asked() {
        let mut op = operator("");
        let mut config = RunConfig::default();
        let pending = PendingPrompts {
            devices: true,
            ..PendingPrompts::none()
        };

        op.answer_setup(&mut config, &pending).unwrap();

        assert!(config.devices.is_empty());
        let asked = String::from_utf8(op.output).unwrap();
        assert!(asked.starts_with("For which device"));
        assert!(!asked.contains("Select a browser"));
    }

    #[test]
    fn test_case_prompts() {
        let mut op = operator("y\n1-3,5\nn\nY\n");
        assert_eq!(op.cases_to_exclude().unwrap(), vec![1, 2, 3, 5]);
        assert!(op.cases_to_retry().unwrap().is_empty());
        assert!(op.confirm_revert().unwrap());
    }

    #[test]
    fn test_eof_means_no() {
        let mut op = operator("");
        assert!(op.cases_to_exclude().unwrap().is_empty());
        assert!(!op.confirm_revert().unwrap());
    }
}
