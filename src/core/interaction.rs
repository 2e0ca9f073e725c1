use crate::core::wait;
use crate::domain::model::{InteractionReport, InteractionResult, SelectorOutcome};
use crate::domain::ports::BrowserSession;
use crate::domain::settings::{SelectorSet, Timings};
use crate::utils::error::TwinshotError;

const REMOVE_SCRIPT: &str = r#"const elements = document.querySelectorAll(arguments[0]);
elements.forEach(el => { if (el.parentNode) { el.parentNode.removeChild(el); } });
return elements.length;"#;

/// 截圖前的 hover / click 互動與遮罩元素移除，全部 best-effort
#[derive(Debug, Clone)]
pub struct InteractionDirector {
    selectors: SelectorSet,
    timings: Timings,
    include_interactions: bool,
}

impl InteractionDirector {
    pub fn new(selectors: SelectorSet, timings: Timings, include_interactions: bool) -> Self {
        Self {
            selectors,
            timings,
            include_interactions,
        }
    }

    pub async fn run<B: BrowserSession + ?Sized>(&self, session: &B) -> InteractionReport {
        let mut report = InteractionReport::default();

        if self.include_interactions {
            for selector in &self.selectors.hover {
                report.hovers.push(self.hover(session, selector).await);
            }
            for selector in &self.selectors.click {
                report.clicks.push(self.click(session, selector).await);
            }
        }

        for selector in &self.selectors.remove {
            report.removals.push(self.remove(session, selector).await);
        }

        report
    }

    async fn hover<B: BrowserSession + ?Sized>(&self, session: &B, selector: &str) -> SelectorOutcome {
        let element = match wait::wait_for_element(
            session,
            selector,
            self.timings.hover_wait,
            self.timings.element_poll_interval,
        )
        .await
        {
            Ok(element) => element,
            Err(TwinshotError::TimeoutError { .. }) => {
                tracing::info!("Hover action skipped: '{}' did not appear", selector);
                return SelectorOutcome::new(selector, InteractionResult::TimedOut);
            }
            Err(e) => {
                tracing::info!("Hover action skipped for '{}': {}", selector, e);
                return SelectorOutcome::new(selector, InteractionResult::NotFound);
            }
        };

        match session.hover(&element).await {
            Ok(()) => SelectorOutcome::new(selector, InteractionResult::Found),
            Err(e) => {
                tracing::info!("Hover action skipped for '{}': {}", selector, e);
                SelectorOutcome::new(selector, InteractionResult::NotFound)
            }
        }
    }

    async fn click<B: BrowserSession + ?Sized>(&self, session: &B, selector: &str) -> SelectorOutcome {
        let element = match session.find_element(selector).await {
            Ok(Some(element)) => element,
            Ok(None) => {
                tracing::info!("Click action skipped: '{}' not found", selector);
                return SelectorOutcome::new(selector, InteractionResult::NotFound);
            }
            Err(e) => {
                tracing::info!("Click action skipped for '{}': {}", selector, e);
                return SelectorOutcome::new(selector, InteractionResult::NotFound);
            }
        };

        match session.click(&element).await {
            Ok(()) => {
                tokio::time::sleep(self.timings.click_pause).await;
                SelectorOutcome::new(selector, InteractionResult::Found)
            }
            Err(e) => {
                tracing::info!("Click action skipped for '{}': {}", selector, e);
                SelectorOutcome::new(selector, InteractionResult::NotFound)
            }
        }
    }

    /// 每隔固定間隔查一次，找到就全部移除；次數或總時間先到者為止
    async fn remove<B: BrowserSession + ?Sized>(&self, session: &B, selector: &str) -> SelectorOutcome {
        let poll = async {
            for attempt in 1..=self.timings.removal_max_attempts {
                tokio::time::sleep(self.timings.removal_poll_interval).await;
                match session
                    .execute_script(REMOVE_SCRIPT, vec![serde_json::json!(selector)])
                    .await
                {
                    Ok(count) if count.as_u64().unwrap_or(0) > 0 => {
                        tracing::debug!(
                            "Removed {} element(s) matching '{}' on attempt {}",
                            count,
                            selector,
                            attempt
                        );
                        return InteractionResult::Found;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::info!("Removal action skipped for '{}': {}", selector, e);
                        return InteractionResult::NotFound;
                    }
                }
            }
            InteractionResult::NotFound
        };

        let result = tokio::time::timeout(self.timings.removal_timeout, poll)
            .await
            .unwrap_or(InteractionResult::TimedOut);

        if result != InteractionResult::Found {
            tracing::debug!("Removal action failed for '{}' after retries", selector);
        }
        SelectorOutcome::new(selector, result)
    }
}
