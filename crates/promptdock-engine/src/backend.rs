use crate::dom::PageDom;
use async_trait::async_trait;
pub use promptdock_common::error::BackendError;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub title: String,
}

/// A browser page the engine can drive.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Launch the backend (start browser, connect to remote, etc.)
    async fn launch(&mut self) -> Result<(), BackendError>;

    /// Close the backend and cleanup resources.
    async fn close(&mut self) -> Result<(), BackendError>;

    /// Check if the backend is ready to accept commands.
    async fn is_ready(&self) -> bool;

    /// Navigate to a specific URL.
    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError>;

    /// DOM primitives of the current page.
    fn page_dom(&self) -> Result<Arc<dyn PageDom>, BackendError>;
}
