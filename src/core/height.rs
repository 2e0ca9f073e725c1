use crate::core::wait;
use crate::domain::model::{HeightSource, NegotiatedHeight};
use crate::domain::ports::BrowserSession;
use crate::domain::settings::Timings;

/// 量不到高度時使用的固定值
pub const FALLBACK_HEIGHT: u32 = 1024;

/// 量測前 viewport 使用的中性高度
pub const NEUTRAL_HEIGHT: u32 = 1080;

pub const ROOT_SELECTOR: &str = "body";

const SCROLL_TOP_SCRIPT: &str = "window.scrollTo(0, 0);";

// 文件本身的各種高度與所有可見元素底邊取最大值；flex/absolute 版面的 root 常常低報
const HEIGHT_SCRIPT: &str = r#"return Math.max(
    document.body.scrollHeight,
    document.documentElement.scrollHeight,
    document.body.offsetHeight,
    document.documentElement.offsetHeight,
    document.body.clientHeight,
    document.documentElement.clientHeight,
    Array.from(document.querySelectorAll("*"))
        .filter(el => el.offsetHeight > 0 && el.offsetWidth > 0)
        .reduce((max, el) => Math.max(max, el.getBoundingClientRect().bottom), 0)
);"#;

#[derive(Debug, Clone)]
pub struct HeightNegotiator {
    timings: Timings,
}

impl HeightNegotiator {
    pub fn new(timings: Timings) -> Self {
        Self { timings }
    }

    /// 載入頁面並量測完整可捲動高度，任何失敗都回傳 [`FALLBACK_HEIGHT`]
    pub async fn negotiate<B: BrowserSession + ?Sized>(&self, session: &B, url: &str) -> NegotiatedHeight {
        if let Err(e) = session.navigate(url, self.timings.navigation_timeout).await {
            tracing::warn!("⚠️ Navigation to {} failed while measuring height: {}", url, e);
            return Self::fallback();
        }

        if let Err(e) = wait::wait_for_element(
            session,
            ROOT_SELECTOR,
            self.timings.root_element_wait,
            self.timings.element_poll_interval,
        )
        .await
        {
            tracing::warn!("⚠️ Error waiting for body element on {}: {}", url, e);
            return Self::fallback();
        }

        if let Err(e) = session.execute_script(SCROLL_TOP_SCRIPT, Vec::new()).await {
            tracing::debug!("Scroll to top failed on {}: {}", url, e);
        }
        tokio::time::sleep(self.timings.height_settle).await;

        match session.execute_script(HEIGHT_SCRIPT, Vec::new()).await {
            Ok(value) => match value.as_f64() {
                Some(height) if height >= 1.0 => {
                    let pixels = height.ceil().min(u32::MAX as f64) as u32;
                    tracing::debug!("📏 Measured height {}px for {}", pixels, url);
                    NegotiatedHeight {
                        pixels,
                        source: HeightSource::Measured,
                    }
                }
                _ => {
                    tracing::warn!("⚠️ Unusable height {} reported by {}", value, url);
                    Self::fallback()
                }
            },
            Err(e) => {
                tracing::warn!("⚠️ Height measurement failed on {}: {}", url, e);
                Self::fallback()
            }
        }
    }

    fn fallback() -> NegotiatedHeight {
        NegotiatedHeight {
            pixels: FALLBACK_HEIGHT,
            source: HeightSource::Fallback,
        }
    }
}

/// 兩側量得的高度取較大者，兩張截圖才能直接比對
pub fn shared_height(original: NegotiatedHeight, staging: NegotiatedHeight) -> u32 {
    original.pixels.max(staging.pixels)
}
