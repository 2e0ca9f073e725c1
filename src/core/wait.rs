use crate::domain::ports::{BrowserSession, ElementRef};
use crate::utils::error::{Result, TwinshotError};
use std::time::Duration;

/// 輪詢直到 selector 對應的元素出現；逾時回傳 `TimeoutError`
pub async fn wait_for_element<B: BrowserSession + ?Sized>(
    session: &B,
    selector: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<ElementRef> {
    match tokio::time::timeout(timeout, poll_element(session, selector, poll_interval)).await {
        Ok(found) => found,
        Err(_) => Err(TwinshotError::timeout(
            format!("waiting for element '{}'", selector),
            timeout,
        )),
    }
}

/// 等待 `document.readyState` 變成 `complete`
pub async fn wait_for_ready_state<B: BrowserSession + ?Sized>(
    session: &B,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    match tokio::time::timeout(timeout, poll_ready_state(session, poll_interval)).await {
        Ok(ready) => ready,
        Err(_) => Err(TwinshotError::timeout(
            "waiting for document ready state",
            timeout,
        )),
    }
}

async fn poll_element<B: BrowserSession + ?Sized>(
    session: &B,
    selector: &str,
    poll_interval: Duration,
) -> Result<ElementRef> {
    loop {
        if let Some(element) = session.find_element(selector).await? {
            return Ok(element);
        }
        tokio::time::sleep(poll_interval).await;
    }
}

async fn poll_ready_state<B: BrowserSession + ?Sized>(
    session: &B,
    poll_interval: Duration,
) -> Result<()> {
    loop {
        let state = session
            .execute_script("return document.readyState", Vec::new())
            .await?;
        if state.as_str() == Some("complete") {
            return Ok(());
        }
        tokio::time::sleep(poll_interval).await;
    }
}
