use crate::cdp::CdpClient;
use crate::dom::CdpDom;
use async_trait::async_trait;
use promptdock_engine::backend::{Backend, BackendError, NavigationResult};
use promptdock_engine::dom::PageDom;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Local Chromium driven over CDP.
pub struct HeadlessBackend {
    client: Option<CdpClient>,
    visible: bool,
    user_data_dir: Option<PathBuf>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::new_with_visibility(false)
    }

    pub fn new_with_visibility(visible: bool) -> Self {
        Self {
            client: None,
            visible,
            user_data_dir: None,
        }
    }

    /// Keep the browser profile (logins, cookies) in `dir`.
    pub fn with_user_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.user_data_dir = dir;
        self
    }

    pub fn get_client(&self) -> Option<&CdpClient> {
        self.client.as_ref()
    }

    async fn get_navigation_result(
        page: &chromiumoxide::Page,
    ) -> Result<NavigationResult, BackendError> {
        let title = page
            .get_title()
            .await
            .unwrap_or_default()
            .unwrap_or_default();
        let url = page
            .url()
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?
            .unwrap_or_default();
        Ok(NavigationResult { url, title })
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for HeadlessBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        info!("Launching Headless Backend (Chromium)...");
        let client = CdpClient::launch(self.visible, self.user_data_dir.as_deref())
            .await
            .map_err(|e| BackendError::Other(e.to_string()))?;
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| BackendError::Other(e.to_string()))?;
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError> {
        let client = self.client.as_mut().ok_or(BackendError::NotReady)?;

        info!("Navigating to: {}", url);
        client
            .page
            .goto(url)
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?;

        Self::get_navigation_result(&client.page).await
    }

    fn page_dom(&self) -> Result<Arc<dyn PageDom>, BackendError> {
        let client = self.client.as_ref().ok_or(BackendError::NotReady)?;
        Ok(Arc::new(CdpDom::new(client.page.clone())))
    }
}
