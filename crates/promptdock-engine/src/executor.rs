//! Line-oriented session commands shared by the REPL and script runner.
//!
//! ```text
//! goto <url>        navigate the page
//! apply <text>      inject text (\n, \t and \\ escapes)
//! use <id>          inject a stored prompt
//! clear             empty the input
//! site              show the matched site profile
//! prompts [query]   list stored prompts, newest first
//! ```

use crate::backend::{Backend, BackendError};
use crate::dom::PageDom;
use crate::facade::CommandHandler;
use crate::inject::Timings;
use crate::store::{self, PromptOrder, PromptStore, StoreError};
use promptdock_common::error::DomError;
use promptdock_common::protocol::{CommandResult, PageCommand};
use promptdock_common::sites::SiteRegistry;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Page error: {0}")]
    Dom(#[from] DomError),

    #[error("Unknown command '{0}'. Try goto, apply, use, clear, site or prompts.")]
    UnknownCommand(String),

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No prompt store configured")]
    NoStore,

    #[error("Prompt {0} not found")]
    PromptNotFound(u64),

    #[error("{0}")]
    Command(String),
}

/// Result of executing a command.
pub struct ExecutionResult {
    /// Formatted output string for display.
    pub output: String,
    /// Whether execution was successful.
    pub success: bool,
}

impl ExecutionResult {
    fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: true,
        }
    }
}

pub struct SessionExecutor {
    registry: Arc<SiteRegistry>,
    timings: Timings,
    store: Option<Arc<dyn PromptStore>>,
    handler: Option<CommandHandler<dyn PageDom>>,
}

impl SessionExecutor {
    pub fn new(registry: Arc<SiteRegistry>, timings: Timings) -> Self {
        Self {
            registry,
            timings,
            store: None,
            handler: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn PromptStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Execute a line of input.
    pub async fn execute_line<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        line: &str,
    ) -> Result<ExecutionResult, SessionError> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        debug!("Session command '{}'", verb);

        match verb {
            "goto" => {
                if rest.is_empty() {
                    return Err(SessionError::MissingArgument("url"));
                }
                let url = normalize_url(rest)?;
                // element handles do not survive a page load
                if let Some(handler) = self.handler.take() {
                    handler.injector().follow_ups().cancel_all();
                }
                let res = backend.navigate(&url).await?;
                Ok(ExecutionResult::ok(format!(
                    "Navigated to {} ({})",
                    res.url, res.title
                )))
            }
            "apply" => {
                if rest.is_empty() {
                    return Err(SessionError::MissingArgument("text"));
                }
                let content = unescape(rest);
                self.send(backend, PageCommand::ApplyPrompt { content })
                    .await
            }
            "use" => {
                let id: u64 = rest
                    .parse()
                    .map_err(|_| SessionError::InvalidArgument(format!("'{}' is not a prompt id", rest)))?;
                let store = self.store.as_ref().ok_or(SessionError::NoStore)?;
                let prompt = store
                    .get(id)
                    .await?
                    .ok_or(SessionError::PromptNotFound(id))?;
                self.send(
                    backend,
                    PageCommand::ApplyPrompt {
                        content: prompt.content,
                    },
                )
                .await
            }
            "clear" => self.send(backend, PageCommand::ClearInput).await,
            "site" => self.describe_site(backend).await,
            "prompts" => self.list_prompts(rest).await,
            other => Err(SessionError::UnknownCommand(other.to_string())),
        }
    }

    fn handler<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
    ) -> Result<&CommandHandler<dyn PageDom>, SessionError> {
        if self.handler.is_none() {
            let dom = backend.page_dom()?;
            self.handler = Some(CommandHandler::new(
                dom,
                Arc::clone(&self.registry),
                self.timings,
            ));
        }
        self.handler.as_ref().ok_or(SessionError::Backend(BackendError::NotReady))
    }

    async fn send<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        command: PageCommand,
    ) -> Result<ExecutionResult, SessionError> {
        let name = command.name();
        let result: CommandResult = self.handler(backend)?.handle(command).await;
        if result.success {
            Ok(ExecutionResult::ok(format!("{}: ok", name)))
        } else {
            Err(SessionError::Command(
                result.error.unwrap_or_else(|| format!("{} failed", name)),
            ))
        }
    }

    async fn describe_site<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
    ) -> Result<ExecutionResult, SessionError> {
        let handler = self.handler(backend)?;
        let hostname = handler.injector().dom().hostname().await?;
        let output = match handler.registry().resolve(&hostname) {
            Some(profile) => format!(
                "{}: {} ({:?}), selectors: {}",
                hostname,
                profile.display_name,
                profile.flavor,
                profile.input_selectors.join(", ")
            ),
            None => format!("{}: no site profile", hostname),
        };
        Ok(ExecutionResult::ok(output))
    }

    async fn list_prompts(&self, query: &str) -> Result<ExecutionResult, SessionError> {
        let store = self.store.as_ref().ok_or(SessionError::NoStore)?;
        let mut prompts = store::search(store.list().await?, query);
        store::sort(&mut prompts, PromptOrder::Newest);

        if prompts.is_empty() {
            return Ok(ExecutionResult::ok("No prompts"));
        }
        let lines: Vec<String> = prompts
            .iter()
            .map(|p| format!("[{}] {}: {}", p.id, p.name, preview(&p.content, 60)))
            .collect();
        Ok(ExecutionResult::ok(lines.join("\n")))
    }
}

/// Accept bare hostnames the way a browser address bar does.
pub fn normalize_url(raw: &str) -> Result<String, SessionError> {
    let candidate = if raw.contains("://") || raw.starts_with("data:") || raw.starts_with("about:") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };
    url::Url::parse(&candidate)
        .map(|u| u.to_string())
        .map_err(|e| SessionError::InvalidArgument(format!("{}: {}", raw, e)))
}

/// Expand `\n`, `\t` and `\\` typed on a single line.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// First line of `content`, cut to `max` characters.
pub fn preview(content: &str, max: usize) -> String {
    let first = content.lines().next().unwrap_or("");
    if first.chars().count() > max {
        let cut: String = first.chars().take(max).collect();
        format!("{}…", cut)
    } else if content.lines().nth(1).is_some() {
        format!("{}…", first)
    } else {
        first.to_string()
    }
}
