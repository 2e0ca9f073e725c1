use crate::domain::model::{BrowserKind, Viewport};
use crate::domain::ports::{BrowserSession, ElementRef, SessionFactory};
use crate::domain::settings::BrowserSettings;
use crate::utils::error::{Result, TwinshotError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::time::Duration;

/// W3C WebDriver 回傳 element reference 時使用的 key
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const NO_SUCH_ELEMENT: &str = "no such element";

/// 透過 chromedriver / geckodriver / msedgedriver / safaridriver 開啟 session
#[derive(Debug, Clone)]
pub struct WebDriverFactory {
    client: Client,
    settings: BrowserSettings,
}

impl WebDriverFactory {
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    /// 依瀏覽器種類組出 alwaysMatch capabilities
    pub fn capabilities(&self, viewport: Viewport) -> Value {
        let args = self.browser_args(viewport);

        match self.settings.kind {
            BrowserKind::Chrome => json!({
                "browserName": "chrome",
                "goog:chromeOptions": { "args": args }
            }),
            BrowserKind::Edge => json!({
                "browserName": "MicrosoftEdge",
                "ms:edgeOptions": { "args": args }
            }),
            BrowserKind::Firefox => json!({
                "browserName": "firefox",
                "moz:firefoxOptions": { "args": args }
            }),
            // safaridriver 不支援 headless
            BrowserKind::Safari => json!({ "browserName": "safari" }),
        }
    }

    fn browser_args(&self, viewport: Viewport) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        if self.settings.headless {
            args.push("--headless".to_string());
            if self.settings.kind != BrowserKind::Firefox {
                args.push("--disable-gpu".to_string());
            }
            args.extend(
                ["--disable-infobars", "--log-level=3", "--silent", "--no-sandbox"]
                    .map(String::from),
            );
        }

        match self.settings.kind {
            BrowserKind::Firefox => {
                args.push(format!("--width={}", viewport.width));
                args.push(format!("--height={}", viewport.height));
            }
            _ => args.push(format!("--window-size={},{}", viewport.width, viewport.height)),
        }
        args
    }
}

#[async_trait]
impl SessionFactory for WebDriverFactory {
    type Session = WebDriverSession;

    async fn launch(&self, viewport: Viewport) -> Result<WebDriverSession> {
        let endpoint = format!("{}/session", self.settings.webdriver_url.trim_end_matches('/'));
        let body = json!({
            "capabilities": { "alwaysMatch": self.capabilities(viewport) }
        });

        let response = self.client.post(&endpoint).json(&body).send().await?;
        let value = unwrap_response(response).await?;
        let session_id = value["sessionId"]
            .as_str()
            .ok_or_else(|| TwinshotError::webdriver("session not created", "response has no sessionId"))?
            .to_string();

        tracing::debug!("🌐 Started {} session {}", self.settings.kind, session_id);

        let session = WebDriverSession {
            client: self.client.clone(),
            session_url: format!("{}/{}", endpoint, session_id),
            session_id,
        };

        if let Err(e) = session.set_viewport(viewport).await {
            tracing::warn!("⚠️ Could not size new session {}: {}", session.session_id, e);
        }
        Ok(session)
    }
}

pub struct WebDriverSession {
    client: Client,
    session_url: String,
    session_id: String,
}

impl WebDriverSession {
    pub fn id(&self) -> &str {
        &self.session_id
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.session_url, path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        unwrap_response(response).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.command(Method::POST, path, Some(body), None).await
    }
}

/// 取出 `value`；非 2xx 時轉成 WebDriverError
async fn unwrap_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body: Value = response.json().await?;
    let value = body.get("value").cloned().unwrap_or(Value::Null);

    if !status.is_success() {
        let error = value["error"].as_str().unwrap_or("unknown error");
        let message = value["message"].as_str().unwrap_or_default();
        return Err(TwinshotError::webdriver(error, message));
    }
    Ok(value)
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        match self
            .command(Method::POST, "/url", Some(json!({ "url": url })), Some(timeout))
            .await
        {
            Ok(_) => Ok(()),
            Err(TwinshotError::HttpError(e)) if e.is_timeout() => {
                Err(TwinshotError::timeout(format!("loading {}", url), timeout))
            }
            Err(e) => Err(e),
        }
    }

    async fn find_element(&self, selector: &str) -> Result<Option<ElementRef>> {
        let found = self
            .post(
                "/element",
                json!({ "using": "css selector", "value": selector }),
            )
            .await;

        match found {
            Ok(value) => Ok(value[ELEMENT_KEY].as_str().map(|id| ElementRef(id.to_string()))),
            Err(TwinshotError::WebDriverError { error, .. }) if error == NO_SUCH_ELEMENT => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.post("/execute/sync", json!({ "script": script, "args": args }))
            .await
    }

    async fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        self.post(
            "/window/rect",
            json!({ "width": viewport.width, "height": viewport.height }),
        )
        .await?;
        Ok(())
    }

    async fn hover(&self, element: &ElementRef) -> Result<()> {
        let mut origin = serde_json::Map::new();
        origin.insert(ELEMENT_KEY.to_string(), json!(element.0));
        let actions = json!({
            "actions": [{
                "type": "pointer",
                "id": "mouse",
                "parameters": { "pointerType": "mouse" },
                "actions": [{
                    "type": "pointerMove",
                    "duration": 0,
                    "origin": origin,
                    "x": 0,
                    "y": 0
                }]
            }]
        });
        self.post("/actions", actions).await?;
        Ok(())
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        self.post(&format!("/element/{}/click", element.0), json!({}))
            .await?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let value = self.command(Method::GET, "/screenshot", None, None).await?;
        let encoded = value
            .as_str()
            .ok_or_else(|| TwinshotError::webdriver("unable to capture screen", "screenshot is not a string"))?;
        Ok(STANDARD.decode(encoded)?)
    }

    async fn close(&self) -> Result<()> {
        self.command(Method::DELETE, "", None, None).await?;
        tracing::debug!("Closed WebDriver session {}", self.session_id);
        Ok(())
    }
}
