use chromiumoxide::Page;
use promptdock_page::{PAGE_JS, PAGE_JS_PROBE};
use serde::Deserialize;
use std::error::Error;
use std::future::Future;
use std::time::Duration;

/// Upper bound for one evaluate; a dialog can block the JS thread.
const EVAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum retries for context errors during page navigation.
const MAX_CONTEXT_RETRIES: u32 = 10;

const CONTEXT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Whether the page's execution context is gone, e.g. mid-navigation.
fn is_context_error(err: &str) -> bool {
    err.contains("Cannot find context")
        || err.contains("Execution context was destroyed")
        || err.contains("-32000")
}

/// Retry `operation` while it fails with a context error. Any other error
/// is returned as-is.
async fn retry_on_context_error<T, E, F, Fut>(
    operation_name: &str,
    mut operation: F,
) -> Result<T, Box<dyn Error + Send + Sync>>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut last_error = None;

    for attempt in 0..MAX_CONTEXT_RETRIES {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let err_str = e.to_string();
                if is_context_error(&err_str) {
                    tracing::debug!(
                        "{} context error (attempt {}/{}), retrying...",
                        operation_name,
                        attempt + 1,
                        MAX_CONTEXT_RETRIES
                    );
                    last_error = Some(err_str);
                    tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
                    continue;
                }
                return Err(err_str.into());
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| format!("{} failed after retries", operation_name))
        .into())
}

pub async fn install_page_script(page: &Page) -> Result<(), Box<dyn Error + Send + Sync>> {
    retry_on_context_error("Page script injection", || try_install(page)).await
}

async fn try_install(page: &Page) -> Result<(), Box<dyn Error + Send + Sync>> {
    let is_loaded: bool = page
        .evaluate(PAGE_JS_PROBE)
        .await
        .map_err(|e| format!("Failed to check page script status: {}", e))?
        .into_value()
        .map_err(|e| format!("Failed to get bool value: {}", e))?;

    if !is_loaded {
        page.evaluate(PAGE_JS)
            .await
            .map_err(|e| format!("Failed to inject page script: {}", e))?;
    }

    Ok(())
}

/// Failure reported by the page script itself.
#[derive(Debug, Clone, Deserialize)]
pub struct PrimitiveFault {
    pub kind: String,
    pub message: String,
    #[serde(default)]
    pub el: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    error: Option<PrimitiveFault>,
}

#[derive(Debug)]
pub enum CallError {
    /// The page script ran and refused the operation.
    Primitive(PrimitiveFault),
    Timeout,
    Transport(String),
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallError::Primitive(fault) => write!(f, "{}: {}", fault.kind, fault.message),
            CallError::Timeout => write!(
                f,
                "Call timed out - possibly blocked by a dialog (alert/confirm/prompt)"
            ),
            CallError::Transport(msg) => write!(f, "{}", msg),
        }
    }
}

/// Run one page primitive through `window.PromptDock.call`.
///
/// The script is (re)installed before each attempt so a navigation in
/// between calls is survived transparently.
pub async fn call_primitive(
    page: &Page,
    op: &str,
    args: serde_json::Value,
) -> Result<serde_json::Value, CallError> {
    let expression = format!(
        "window.PromptDock.call({}, {})",
        serde_json::Value::String(op.to_string()),
        args
    );
    tracing::trace!("Evaluating script: {}", expression);

    let mut last_error = None;

    for attempt in 0..MAX_CONTEXT_RETRIES {
        install_page_script(page)
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        match evaluate_with_timeout(page, &expression).await {
            Ok(value) => {
                let envelope: Envelope = serde_json::from_value(value)
                    .map_err(|e| CallError::Transport(format!("Malformed reply: {}", e)))?;
                if envelope.ok {
                    return Ok(envelope.value);
                }
                return Err(CallError::Primitive(envelope.error.unwrap_or(
                    PrimitiveFault {
                        kind: "script".into(),
                        message: format!("{} failed", op),
                        el: None,
                    },
                )));
            }
            Err(EvalError::Timeout) => return Err(CallError::Timeout),
            Err(EvalError::Context(err_str)) => {
                tracing::debug!(
                    "Context error during {} (attempt {}/{}), retrying...",
                    op,
                    attempt + 1,
                    MAX_CONTEXT_RETRIES
                );
                last_error = Some(err_str);
                tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
            }
            Err(EvalError::Other(err_str)) => {
                return Err(CallError::Transport(format!(
                    "Evaluation failed: {}",
                    err_str
                )));
            }
        }
    }

    Err(CallError::Transport(last_error.unwrap_or_else(|| {
        format!("{} failed after retries", op)
    })))
}

enum EvalError {
    Timeout,
    Context(String),
    Other(String),
}

async fn evaluate_with_timeout(
    page: &Page,
    expression: &str,
) -> Result<serde_json::Value, EvalError> {
    let eval_result = tokio::time::timeout(EVAL_TIMEOUT, page.evaluate(expression)).await;

    match eval_result {
        Err(_) => Err(EvalError::Timeout),
        Ok(Err(e)) => {
            let err_str = e.to_string();
            if is_context_error(&err_str) {
                Err(EvalError::Context(err_str))
            } else {
                Err(EvalError::Other(err_str))
            }
        }
        Ok(Ok(remote_object)) => remote_object
            .into_value::<serde_json::Value>()
            .map_err(|e| EvalError::Other(format!("Failed to get result: {}", e))),
    }
}
