use crate::inject::{CallError, call_primitive};
use async_trait::async_trait;
use chromiumoxide::Page;
use promptdock_engine::dom::PageDom;
use promptdock_engine::error::DomError;
use promptdock_engine::protocol::{
    Collapse, EditCommand, ElementInfo, ElementRef, Scope, SyntheticEvent, ValueWrite,
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// [`PageDom`] over a live Chromium page.
#[derive(Clone)]
pub struct CdpDom {
    page: Page,
}

impl CdpDom {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        op: &str,
        target: Option<ElementRef>,
        args: Value,
    ) -> Result<T, DomError> {
        let value = call_primitive(&self.page, op, args)
            .await
            .map_err(|e| to_dom_error(e, target))?;
        serde_json::from_value(value)
            .map_err(|e| DomError::Script(format!("{} returned an unexpected value: {}", op, e)))
    }

    async fn call_unit(
        &self,
        op: &str,
        target: Option<ElementRef>,
        args: Value,
    ) -> Result<(), DomError> {
        call_primitive(&self.page, op, args)
            .await
            .map(|_| ())
            .map_err(|e| to_dom_error(e, target))
    }
}

fn scope_arg(scope: Scope) -> Value {
    match scope {
        Scope::Document => Value::Null,
        Scope::Within(el) => json!(el),
    }
}

fn to_dom_error(err: CallError, target: Option<ElementRef>) -> DomError {
    match err {
        CallError::Primitive(fault) => match fault.kind.as_str() {
            "stale" => DomError::Stale(fault.el.map(ElementRef).or(target).unwrap_or(ElementRef(0))),
            "unsupported" => DomError::Unsupported(fault.message),
            _ => DomError::Script(fault.message),
        },
        other => DomError::Transport(other.to_string()),
    }
}

#[async_trait]
impl PageDom for CdpDom {
    async fn hostname(&self) -> Result<String, DomError> {
        self.call("hostname", None, json!({})).await
    }

    async fn query_selector(
        &self,
        scope: Scope,
        selector: &str,
    ) -> Result<Option<ElementRef>, DomError> {
        self.call(
            "query",
            None,
            json!({ "scope": scope_arg(scope), "selector": selector }),
        )
        .await
    }

    async fn query_selector_all(
        &self,
        scope: Scope,
        selector: &str,
    ) -> Result<Vec<ElementRef>, DomError> {
        self.call(
            "queryAll",
            None,
            json!({ "scope": scope_arg(scope), "selector": selector }),
        )
        .await
    }

    async fn shadow_root(&self, host: ElementRef) -> Result<Option<ElementRef>, DomError> {
        self.call("shadowRoot", Some(host), json!({ "el": host }))
            .await
    }

    async fn parent(&self, el: ElementRef) -> Result<Option<ElementRef>, DomError> {
        self.call("parent", Some(el), json!({ "el": el })).await
    }

    async fn describe(&self, el: ElementRef) -> Result<ElementInfo, DomError> {
        self.call("describe", Some(el), json!({ "el": el })).await
    }

    async fn attribute(&self, el: ElementRef, name: &str) -> Result<Option<String>, DomError> {
        self.call("attribute", Some(el), json!({ "el": el, "name": name }))
            .await
    }

    async fn set_attribute(&self, el: ElementRef, name: &str, value: &str) -> Result<(), DomError> {
        self.call_unit(
            "setAttribute",
            Some(el),
            json!({ "el": el, "name": name, "value": value }),
        )
        .await
    }

    async fn focus(&self, el: ElementRef) -> Result<(), DomError> {
        self.call_unit("focus", Some(el), json!({ "el": el })).await
    }

    async fn blur(&self, el: ElementRef) -> Result<(), DomError> {
        self.call_unit("blur", Some(el), json!({ "el": el })).await
    }

    async fn value(&self, el: ElementRef) -> Result<Option<String>, DomError> {
        self.call("value", Some(el), json!({ "el": el })).await
    }

    async fn set_value(&self, el: ElementRef, value: &str, how: ValueWrite) -> Result<(), DomError> {
        self.call_unit(
            "setValue",
            Some(el),
            json!({ "el": el, "value": value, "how": how }),
        )
        .await
    }

    async fn text_content(&self, el: ElementRef) -> Result<String, DomError> {
        self.call("textContent", Some(el), json!({ "el": el })).await
    }

    async fn set_text_content(&self, el: ElementRef, text: &str) -> Result<(), DomError> {
        self.call_unit("setTextContent", Some(el), json!({ "el": el, "text": text }))
            .await
    }

    async fn inner_html(&self, el: ElementRef) -> Result<String, DomError> {
        self.call("innerHtml", Some(el), json!({ "el": el })).await
    }

    async fn set_inner_html(&self, el: ElementRef, html: &str) -> Result<(), DomError> {
        self.call_unit("setInnerHtml", Some(el), json!({ "el": el, "html": html }))
            .await
    }

    async fn select_contents(&self, el: ElementRef, collapse: Collapse) -> Result<(), DomError> {
        self.call_unit(
            "selectContents",
            Some(el),
            json!({ "el": el, "collapse": collapse }),
        )
        .await
    }

    async fn set_selection_range(
        &self,
        el: ElementRef,
        start: usize,
        end: usize,
    ) -> Result<(), DomError> {
        self.call_unit(
            "setSelectionRange",
            Some(el),
            json!({ "el": el, "start": start, "end": end }),
        )
        .await
    }

    async fn exec_command(&self, command: &EditCommand) -> Result<bool, DomError> {
        self.call("execCommand", None, json!({ "command": command }))
            .await
    }

    async fn dispatch(&self, el: ElementRef, event: &SyntheticEvent) -> Result<bool, DomError> {
        self.call("dispatch", Some(el), json!({ "el": el, "event": event }))
            .await
    }
}
