use crate::domain::model::Viewport;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
    /// 目錄內的檔名（不含子目錄），目錄不存在時回傳空清單
    fn list_dir(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
    fn create_dir(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// WebDriver element reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef(pub String);

/// 單一瀏覽器 session 提供的操作
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;
    async fn find_element(&self, selector: &str) -> Result<Option<ElementRef>>;
    async fn execute_script(
        &self,
        script: &str,
        args: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value>;
    async fn set_viewport(&self, viewport: Viewport) -> Result<()>;
    async fn hover(&self, element: &ElementRef) -> Result<()>;
    async fn click(&self, element: &ElementRef) -> Result<()>;
    async fn screenshot(&self) -> Result<Vec<u8>>;
    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: BrowserSession;

    async fn launch(&self, viewport: Viewport) -> Result<Self::Session>;
}
