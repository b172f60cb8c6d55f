use serde::{Deserialize, Serialize};

/// Commands sent from the panel (or any other client) to a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageCommand {
    ApplyPrompt { content: String },
    ClearInput,
}

impl PageCommand {
    pub fn name(&self) -> &'static str {
        match self {
            PageCommand::ApplyPrompt { .. } => "APPLY_PROMPT",
            PageCommand::ClearInput => "CLEAR_INPUT",
        }
    }
}

/// Reply to exactly one `PageCommand`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
        }
    }
}

// ============================================================
// Page primitives (Rust <-> injected page script)
// ============================================================

/// Opaque handle to a node registered by the page primitive layer.
///
/// The same DOM node always maps to the same handle for the lifetime of the
/// page, which makes it usable as a key for per-element follow-up tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementRef(pub u32);

impl std::fmt::Display for ElementRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a selector query starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Document,
    /// An element or a shadow root handle.
    Within(ElementRef),
}

/// Snapshot of the properties the engine needs to classify an element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementInfo {
    /// Lower-case tag name.
    pub tag: String,
    /// Raw `contenteditable` attribute, if present.
    #[serde(default)]
    pub content_editable: Option<String>,
    /// Computed `isContentEditable`.
    #[serde(default)]
    pub is_content_editable: bool,
    /// `type` attribute for `<input>`.
    #[serde(default)]
    pub input_type: Option<String>,
    /// Whether the node exposes a `value` property.
    #[serde(default)]
    pub has_value: bool,
}

impl ElementInfo {
    pub fn is_native_field(&self) -> bool {
        self.tag == "textarea" || self.tag == "input"
    }

    pub fn is_editable_region(&self) -> bool {
        self.content_editable.as_deref() == Some("true") || self.is_content_editable
    }

    /// Whether `setSelectionRange` is meaningful for this element.
    pub fn supports_selection_range(&self) -> bool {
        self.tag == "textarea" || self.input_type.as_deref() == Some("text")
    }
}

/// How a value write reaches a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueWrite {
    /// Through the prototype setter, bypassing framework-patched properties.
    Native,
    /// Plain property assignment.
    Property,
}

/// Where the selection ends up after selecting an element's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collapse {
    /// Keep the whole contents selected.
    None,
    /// Collapse to a caret after the last child.
    End,
}

/// `document.execCommand` calls the engine issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "value", rename_all = "camelCase")]
pub enum EditCommand {
    SelectAll,
    Delete,
    InsertText(String),
    #[serde(rename = "insertHTML")]
    InsertHtml(String),
}

impl EditCommand {
    pub fn name(&self) -> &'static str {
        match self {
            EditCommand::SelectAll => "selectAll",
            EditCommand::Delete => "delete",
            EditCommand::InsertText(_) => "insertText",
            EditCommand::InsertHtml(_) => "insertHTML",
        }
    }
}

/// DOM event interface used to construct a synthetic event.
///
/// The page script falls back to a plain `Event` when the specific
/// constructor is unavailable or throws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "interface", rename_all = "snake_case")]
pub enum EventInterface {
    Plain,
    Input {
        #[serde(rename = "inputType", skip_serializing_if = "Option::is_none")]
        input_type: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<String>,
    },
    Keyboard {
        key: String,
        code: String,
    },
    Clipboard {
        plain: String,
        html: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub bubbles: bool,
    pub cancelable: bool,
    #[serde(flatten)]
    pub interface: EventInterface,
}

impl SyntheticEvent {
    /// Bubbling, non-cancelable `Event`.
    pub fn plain(event_type: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
            bubbles: true,
            cancelable: false,
            interface: EventInterface::Plain,
        }
    }

    /// Bubbling `InputEvent` (`input`, `beforeinput`).
    pub fn input(event_type: &str, input_type: &str, data: Option<&str>) -> Self {
        Self {
            event_type: event_type.to_string(),
            bubbles: true,
            cancelable: true,
            interface: EventInterface::Input {
                input_type: Some(input_type.to_string()),
                data: data.map(str::to_string),
            },
        }
    }

    /// Bubbling `KeyboardEvent` for the `a` key.
    pub fn key(event_type: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
            bubbles: true,
            cancelable: true,
            interface: EventInterface::Keyboard {
                key: "a".to_string(),
                code: "KeyA".to_string(),
            },
        }
    }

    /// Cancelable `paste` carrying both clipboard flavors.
    pub fn paste(plain: &str, html: &str) -> Self {
        Self {
            event_type: "paste".to_string(),
            bubbles: true,
            cancelable: true,
            interface: EventInterface::Clipboard {
                plain: plain.to_string(),
                html: html.to_string(),
            },
        }
    }

    pub fn cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }
}

// ============================================================
// Prompt records
// ============================================================

/// A stored prompt. Exported and imported in this exact shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRecord {
    pub id: u64,
    pub name: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub updated_at: i64,
}

/// Fields supplied when creating a prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptInput {
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptPatch {
    pub name: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub model: Option<String>,
}

impl PromptPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.model.is_none()
    }
}
