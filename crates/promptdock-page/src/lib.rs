/// Page primitive layer injected into every driven page.
///
/// Exposes `window.PromptDock.call(op, args)`, which hands out stable
/// element handles and performs one raw DOM operation per call. It never
/// retries or falls back on its own.
pub const PAGE_JS: &str = include_str!("page.js");

/// Expression that is `true` once [`PAGE_JS`] is installed in the page.
pub const PAGE_JS_PROBE: &str = "typeof window.PromptDock !== 'undefined'";
