//! Command entry point: one `PageCommand` in, one `CommandResult` out.

use crate::dom::PageDom;
use crate::followup::FollowUps;
use crate::inject::{Injector, Timings};
use crate::locator::{ResolvedTarget, locate};
use promptdock_common::error::TargetError;
use promptdock_common::protocol::{CommandResult, PageCommand};
use promptdock_common::sites::SiteRegistry;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

pub struct CommandHandler<D: PageDom + ?Sized> {
    registry: Arc<SiteRegistry>,
    injector: Injector<D>,
    /// Hostname seen by the previous command.
    last_hostname: Mutex<Option<String>>,
}

impl<D: PageDom + ?Sized + 'static> CommandHandler<D> {
    pub fn new(dom: Arc<D>, registry: Arc<SiteRegistry>, timings: Timings) -> Self {
        Self {
            registry,
            injector: Injector::new(dom, FollowUps::new(), timings),
            last_hostname: Mutex::new(None),
        }
    }

    pub fn injector(&self) -> &Injector<D> {
        &self.injector
    }

    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }

    /// Handle one command. Resolves once the synchronous page work is done;
    /// scheduled follow-ups keep running afterwards.
    pub async fn handle(&self, command: PageCommand) -> CommandResult {
        info!("Handling {}", command.name());
        let result = match command {
            PageCommand::ApplyPrompt { content } => self.apply(&content).await,
            PageCommand::ClearInput => self.clear().await,
        };

        match result {
            Ok(()) => CommandResult::ok(),
            Err(e) => {
                warn!("Command failed: {}", e);
                CommandResult::failed(e.to_string())
            }
        }
    }

    async fn apply(&self, content: &str) -> Result<(), TargetError> {
        let target = self.locate().await?;
        self.injector.inject(&target, content).await;
        Ok(())
    }

    async fn clear(&self) -> Result<(), TargetError> {
        let target = self.locate().await?;
        self.injector.clear(&target).await;
        Ok(())
    }

    /// Locate the input for the page's current hostname.
    pub async fn locate(&self) -> Result<ResolvedTarget, TargetError> {
        let dom = self.injector.dom();
        let hostname = dom.hostname().await.map_err(|e| {
            warn!("Cannot read page hostname: {}", e);
            TargetError::InputNotFound
        })?;
        self.note_hostname(&hostname);
        locate(dom, &self.registry, &hostname).await
    }

    /// Handles are numbered per document; a hostname change drops follow-ups
    /// still aimed at the previous page.
    fn note_hostname(&self, hostname: &str) {
        let mut last = self
            .last_hostname
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = last.as_deref()
            && previous != hostname
        {
            debug!("Page moved from {} to {}", previous, hostname);
            self.injector.follow_ups().cancel_all();
        }
        *last = Some(hostname.to_string());
    }
}
