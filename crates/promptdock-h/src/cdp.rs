//! The Chromium process and its single page.

use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::cdp::js_protocol::runtime::{EventConsoleApiCalled, RemoteObject};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

type CdpResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const PROFILE_ENV: &str = "PROMPTDOCK_USER_DATA_DIR";

/// Chromium's user-data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileDir {
    /// Survives [`CdpClient::close`], so logins persist.
    Kept(PathBuf),
    /// Made for one launch and removed on close.
    Scratch(PathBuf),
}

impl ProfileDir {
    /// `PROMPTDOCK_USER_DATA_DIR` wins over the configured directory; with
    /// neither, a fresh scratch directory under the system temp dir.
    pub fn choose(env: Option<PathBuf>, configured: Option<&Path>) -> Self {
        if let Some(dir) = env.filter(|d| !d.as_os_str().is_empty()) {
            return Self::Kept(dir);
        }
        if let Some(dir) = configured {
            return Self::Kept(dir.to_path_buf());
        }
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        Self::Scratch(std::env::temp_dir().join(format!(
            "promptdock-profile-{}-{}",
            std::process::id(),
            nanos
        )))
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Kept(path) | Self::Scratch(path) => path,
        }
    }

    fn remove_if_scratch(&self) {
        if let Self::Scratch(path) = self
            && let Err(e) = std::fs::remove_dir_all(path)
        {
            debug!("Could not remove scratch profile {}: {}", path.display(), e);
        }
    }
}

pub struct CdpClient {
    pub browser: Browser,
    pub handler_task: JoinHandle<()>,
    pub page: Page,
    profile: ProfileDir,
}

impl CdpClient {
    /// Start Chromium on `about:blank`, forwarding page console output to
    /// the log and accepting every JavaScript dialog.
    pub async fn launch(visible: bool, configured_profile: Option<&Path>) -> CdpResult<Self> {
        let env_profile = std::env::var_os(PROFILE_ENV).map(PathBuf::from);
        let profile = ProfileDir::choose(env_profile, configured_profile);
        std::fs::create_dir_all(profile.path())?;
        info!(
            "Launching Chromium ({}) with profile {}",
            if visible { "visible" } else { "headless" },
            profile.path().display()
        );

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(profile.path());
        if visible {
            builder = builder.with_head();
        }
        if let Ok(bin) = std::env::var("CHROME_BIN") {
            debug!("CHROME_BIN={}", bin);
            builder = builder.chrome_executable(bin);
        }
        let config = builder
            .build()
            .map_err(|e| format!("Invalid browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| format!("Failed to launch browser: {}", e))?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("CDP handler: {}", e);
                }
            }
            debug!("CDP handler finished");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| format!("Failed to open page: {}", e))?;
        forward_console(&page).await?;
        accept_dialogs(&page).await?;

        Ok(Self {
            browser,
            handler_task,
            page,
            profile,
        })
    }

    pub async fn close(mut self) -> CdpResult<()> {
        self.browser
            .close()
            .await
            .map_err(|e| format!("Failed to close browser: {}", e))?;
        self.handler_task.await?;
        self.profile.remove_if_scratch();
        Ok(())
    }
}

/// Page `console.*` calls become `info!` lines.
async fn forward_console(page: &Page) -> CdpResult<()> {
    let mut events = page.event_listener::<EventConsoleApiCalled>().await?;
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            info!("console.{:?}: {}", event.r#type, console_text(&event.args));
        }
    });
    Ok(())
}

fn console_text(args: &[RemoteObject]) -> String {
    args.iter()
        .map(|arg| match (&arg.description, &arg.value) {
            (Some(description), _) => description.clone(),
            (None, Some(serde_json::Value::String(s))) => s.clone(),
            (None, Some(value)) => value.to_string(),
            (None, None) => "undefined".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A pending `alert`/`confirm` blocks every evaluate on the page.
async fn accept_dialogs(page: &Page) -> CdpResult<()> {
    let mut events = page.event_listener::<EventJavascriptDialogOpening>().await?;
    let page = page.clone();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            debug!("Accepting {:?} dialog: {}", event.r#type, event.message);
            if let Err(e) = page.execute(HandleJavaScriptDialogParams::new(true)).await {
                error!("Failed to accept dialog: {}", e);
            }
        }
    });
    Ok(())
}
