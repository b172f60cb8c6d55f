use async_trait::async_trait;
use promptdock_common::error::DomError;
use promptdock_common::protocol::{
    Collapse, EditCommand, ElementInfo, ElementRef, Scope, SyntheticEvent, ValueWrite,
};

/// Raw DOM primitives of one page.
///
/// Every method maps to a single page-side operation. Implementations do no
/// retrying or fallback of their own; the engine composes these calls into
/// fallback chains and absorbs their faults.
#[async_trait]
pub trait PageDom: Send + Sync {
    /// `location.hostname` of the page.
    async fn hostname(&self) -> Result<String, DomError>;

    /// First match of `selector` under `scope`, in document order.
    async fn query_selector(
        &self,
        scope: Scope,
        selector: &str,
    ) -> Result<Option<ElementRef>, DomError>;

    /// All matches of `selector` under `scope`, in document order.
    async fn query_selector_all(
        &self,
        scope: Scope,
        selector: &str,
    ) -> Result<Vec<ElementRef>, DomError> {
        Ok(self.query_selector(scope, selector).await?.into_iter().collect())
    }

    /// Open shadow root of `host`, if any.
    async fn shadow_root(&self, _host: ElementRef) -> Result<Option<ElementRef>, DomError> {
        Ok(None)
    }

    async fn parent(&self, _el: ElementRef) -> Result<Option<ElementRef>, DomError> {
        Err(DomError::Unsupported("parent".into()))
    }

    async fn describe(&self, el: ElementRef) -> Result<ElementInfo, DomError>;

    async fn attribute(&self, _el: ElementRef, name: &str) -> Result<Option<String>, DomError> {
        Err(DomError::Unsupported(format!("attribute({})", name)))
    }

    async fn set_attribute(&self, _el: ElementRef, name: &str, _value: &str) -> Result<(), DomError> {
        Err(DomError::Unsupported(format!("set_attribute({})", name)))
    }

    async fn focus(&self, el: ElementRef) -> Result<(), DomError>;

    async fn blur(&self, _el: ElementRef) -> Result<(), DomError> {
        Err(DomError::Unsupported("blur".into()))
    }

    /// Current `value` property, or `None` when the node has none.
    async fn value(&self, el: ElementRef) -> Result<Option<String>, DomError>;

    async fn set_value(&self, el: ElementRef, value: &str, how: ValueWrite)
        -> Result<(), DomError>;

    async fn text_content(&self, el: ElementRef) -> Result<String, DomError>;

    async fn set_text_content(&self, el: ElementRef, text: &str) -> Result<(), DomError>;

    async fn inner_html(&self, _el: ElementRef) -> Result<String, DomError> {
        Err(DomError::Unsupported("inner_html".into()))
    }

    async fn set_inner_html(&self, el: ElementRef, html: &str) -> Result<(), DomError>;

    /// Select the element's contents as the document selection.
    async fn select_contents(&self, _el: ElementRef, _collapse: Collapse) -> Result<(), DomError> {
        Err(DomError::Unsupported("select_contents".into()))
    }

    /// `setSelectionRange` in UTF-16 code units.
    async fn set_selection_range(
        &self,
        _el: ElementRef,
        _start: usize,
        _end: usize,
    ) -> Result<(), DomError> {
        Err(DomError::Unsupported("set_selection_range".into()))
    }

    /// `document.execCommand`; `Ok(false)` when the browser declined it.
    async fn exec_command(&self, command: &EditCommand) -> Result<bool, DomError> {
        Err(DomError::Unsupported(command.name().into()))
    }

    /// Dispatch `event` at `el`. Returns `dispatchEvent`'s result: `false`
    /// when a listener cancelled the event.
    async fn dispatch(&self, el: ElementRef, event: &SyntheticEvent) -> Result<bool, DomError>;
}
