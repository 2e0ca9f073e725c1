//! Scripted browser sessions and in-memory storage shared by the unit tests.

use crate::domain::model::Viewport;
use crate::domain::ports::{BrowserSession, ElementRef, SessionFactory, Storage};
use crate::domain::settings::Timings;
use crate::utils::error::{Result, TwinshotError};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn fast_timings() -> Timings {
    let ms = Duration::from_millis;
    Timings {
        navigation_timeout: ms(50),
        root_element_wait: ms(20),
        height_settle: ms(1),
        ready_state_wait: ms(20),
        capture_settle: ms(1),
        hover_wait: ms(10),
        click_pause: ms(1),
        removal_poll_interval: ms(1),
        removal_max_attempts: 2,
        removal_timeout: ms(50),
        retry_delay: ms(1),
        element_poll_interval: ms(1),
    }
}

#[derive(Debug, Clone)]
pub struct FakePage {
    pub height: Option<f64>,
    pub ready: bool,
    pub elements: Vec<String>,
    pub removable: Vec<String>,
}

impl FakePage {
    pub fn with_height(height: f64) -> Self {
        Self {
            height: Some(height),
            ready: true,
            elements: Vec::new(),
            removable: Vec::new(),
        }
    }

    pub fn without_body() -> Self {
        Self {
            height: None,
            ..Self::with_height(0.0)
        }
    }

    pub fn never_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    pub fn with_element(mut self, selector: &str) -> Self {
        self.elements.push(selector.to_string());
        self
    }

    pub fn with_removable(mut self, selector: &str) -> Self {
        self.removable.push(selector.to_string());
        self
    }
}

struct BrowserState {
    pages: HashMap<String, FakePage>,
    default_page: FakePage,
    fail_navigation: bool,
    fail_screenshot: bool,
    fail_launch_from: Option<usize>,
    launched: AtomicUsize,
    closed: AtomicUsize,
    navigations: AtomicUsize,
    screenshots: AtomicUsize,
    viewports: Mutex<Vec<Viewport>>,
    hovered: Mutex<Vec<String>>,
    clicked: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
}

#[derive(Clone)]
pub struct FakeBrowser {
    state: Arc<BrowserState>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self {
            state: Arc::new(BrowserState {
                pages: HashMap::new(),
                default_page: FakePage::with_height(1500.0),
                fail_navigation: false,
                fail_screenshot: false,
                fail_launch_from: None,
                launched: AtomicUsize::new(0),
                closed: AtomicUsize::new(0),
                navigations: AtomicUsize::new(0),
                screenshots: AtomicUsize::new(0),
                viewports: Mutex::new(Vec::new()),
                hovered: Mutex::new(Vec::new()),
                clicked: Mutex::new(Vec::new()),
                removed: Mutex::new(Vec::new()),
            }),
        }
    }

    fn configure(&mut self) -> &mut BrowserState {
        Arc::get_mut(&mut self.state).expect("configure the fake browser before sharing it")
    }

    pub fn with_page(mut self, url: &str, page: FakePage) -> Self {
        self.configure().pages.insert(url.to_string(), page);
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.configure().fail_navigation = true;
        self
    }

    pub fn failing_screenshots(mut self) -> Self {
        self.configure().fail_screenshot = true;
        self
    }

    /// 第 n 次（1-based）以後的 launch 全部失敗
    pub fn failing_launch_from(mut self, n: usize) -> Self {
        self.configure().fail_launch_from = Some(n);
        self
    }

    pub fn session(&self) -> FakeSession {
        FakeSession {
            state: Arc::clone(&self.state),
            current: Mutex::new(None),
        }
    }

    pub fn launched(&self) -> usize {
        self.state.launched.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> usize {
        self.state.navigations.load(Ordering::SeqCst)
    }

    pub fn screenshots(&self) -> usize {
        self.state.screenshots.load(Ordering::SeqCst)
    }

    pub fn viewports(&self) -> Vec<Viewport> {
        self.state.viewports.lock().unwrap().clone()
    }

    pub fn hovered(&self) -> Vec<String> {
        self.state.hovered.lock().unwrap().clone()
    }

    pub fn clicked(&self) -> Vec<String> {
        self.state.clicked.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<String> {
        self.state.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionFactory for FakeBrowser {
    type Session = FakeSession;

    async fn launch(&self, viewport: Viewport) -> Result<FakeSession> {
        let n = self.state.launched.fetch_add(1, Ordering::SeqCst) + 1;
        if matches!(self.state.fail_launch_from, Some(from) if n >= from) {
            return Err(TwinshotError::webdriver(
                "session not created",
                "fake browser refused to start",
            ));
        }
        self.state.viewports.lock().unwrap().push(viewport);
        Ok(self.session())
    }
}

pub struct FakeSession {
    state: Arc<BrowserState>,
    current: Mutex<Option<String>>,
}

impl FakeSession {
    fn page(&self) -> FakePage {
        let current = self.current.lock().unwrap().clone();
        current
            .and_then(|url| self.state.pages.get(&url).cloned())
            .unwrap_or_else(|| self.state.default_page.clone())
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<()> {
        self.state.navigations.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_navigation {
            return Err(TwinshotError::webdriver("unknown error", "net::ERR_CONNECTION_REFUSED"));
        }
        *self.current.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn find_element(&self, selector: &str) -> Result<Option<ElementRef>> {
        let page = self.page();
        let present = if selector == "body" {
            page.height.is_some()
        } else {
            page.elements.iter().any(|e| e == selector)
        };
        Ok(present.then(|| ElementRef(selector.to_string())))
    }

    async fn execute_script(
        &self,
        script: &str,
        args: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let page = self.page();
        if script.contains("document.readyState") {
            let state = if page.ready { "complete" } else { "loading" };
            return Ok(serde_json::json!(state));
        }
        if script.contains("getBoundingClientRect") {
            return Ok(page
                .height
                .map(|h| serde_json::json!(h))
                .unwrap_or(serde_json::Value::Null));
        }
        if script.contains("querySelectorAll(arguments[0])") {
            let selector = args
                .first()
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            if page.removable.contains(&selector) {
                self.state.removed.lock().unwrap().push(selector);
                return Ok(serde_json::json!(1));
            }
            return Ok(serde_json::json!(0));
        }
        Ok(serde_json::Value::Null)
    }

    async fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        self.state.viewports.lock().unwrap().push(viewport);
        Ok(())
    }

    async fn hover(&self, element: &ElementRef) -> Result<()> {
        self.state.hovered.lock().unwrap().push(element.0.clone());
        Ok(())
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        self.state.clicked.lock().unwrap().push(element.0.clone());
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.state.screenshots.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_screenshot {
            return Err(TwinshotError::webdriver("unable to capture screen", "fake failure"));
        }
        let current = self.current.lock().unwrap().clone().unwrap_or_default();
        Ok(format!("PNG:{}", current).into_bytes())
    }

    async fn close(&self) -> Result<()> {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockStorage {
    files: Arc<tokio::sync::Mutex<HashMap<String, Vec<u8>>>>,
    dirs: Arc<tokio::sync::Mutex<BTreeSet<String>>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().await.get(path).cloned()
    }

    pub async fn put_json(&self, path: &str, value: serde_json::Value) {
        let data = serde_json::to_vec_pretty(&value).unwrap();
        self.files.lock().await.insert(path.to_string(), data);
    }

    pub async fn get_json(&self, path: &str) -> Option<serde_json::Value> {
        self.get_file(path)
            .await
            .map(|data| serde_json::from_slice(&data).unwrap())
    }
}

impl Storage for MockStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let files = self.files.lock().await;
        files.get(path).cloned().ok_or_else(|| {
            TwinshotError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path),
            ))
        })
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let mut files = self.files.lock().await;
        files.insert(path.to_string(), data.to_vec());
        Ok(())
    }

    async fn exists(&self, path: &str) -> bool {
        self.files.lock().await.contains_key(path) || self.dirs.lock().await.contains(path)
    }

    async fn remove_file(&self, path: &str) -> Result<()> {
        let mut files = self.files.lock().await;
        files.remove(path).map(|_| ()).ok_or_else(|| {
            TwinshotError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path),
            ))
        })
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<String>> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let files = self.files.lock().await;
        let mut names: Vec<String> = files
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect();
        names.sort();
        Ok(names)
    }

    async fn create_dir(&self, path: &str) -> Result<()> {
        self.dirs.lock().await.insert(path.to_string());
        Ok(())
    }
}
