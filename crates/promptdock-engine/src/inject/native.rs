//! Writes into `<textarea>` / `<input>`.

use super::plan::{InjectionRequest, Quirk};
use super::steps::{ChainOutcome, Fallback, StepLog, quietly};
use super::{Injector, dom_len};
use crate::dom::PageDom;
use promptdock_common::html::line_break_html;
use promptdock_common::protocol::{ElementRef, Scope, SyntheticEvent, ValueWrite};
use std::sync::Arc;
use tracing::debug;

/// Display div DeepSeek renders the textarea text into. Its class names are
/// build hashes and change between releases.
const DEEPSEEK_DISPLAY: &str = ".b13855df";
const DEEPSEEK_DISPLAY_EXCLUDED_CLASS: &str = "_24fad49";

impl<D: PageDom + ?Sized + 'static> Injector<D> {
    pub(crate) async fn write_native(
        &self,
        request: &InjectionRequest<'_>,
        quirk: Quirk,
        log: &mut StepLog,
    ) -> ChainOutcome {
        match quirk {
            Quirk::DeferredRewrite => self.deferred_rewrite(request, log).await,
            Quirk::StaggeredEvents => self.staggered_events(request, log).await,
            Quirk::ResetThenPaste => self.reset_then_paste(request, log).await,
            Quirk::None | Quirk::MirrorDisplay => {
                let el = request.target.element;
                let outcome = self
                    .write_value(el, request.text, ValueWrite::Native, log)
                    .await;
                self.dispatch(el, SyntheticEvent::plain("input"), "input", log)
                    .await;
                self.dispatch(el, SyntheticEvent::plain("change"), "change", log)
                    .await;
                if quirk == Quirk::MirrorDisplay {
                    self.mirror_display(el, request.text, log).await;
                }
                outcome
            }
        }
    }

    /// Value write, falling back from the native setter to the property.
    pub(crate) async fn write_value(
        &self,
        el: ElementRef,
        text: &str,
        first: ValueWrite,
        log: &mut StepLog,
    ) -> ChainOutcome {
        let dom = self.dom.as_ref();
        let mut chain = Fallback::new("value write");
        if first == ValueWrite::Native {
            chain = chain.then_unit("native setter", dom.set_value(el, text, ValueWrite::Native));
        }
        chain
            .then_unit("value property", dom.set_value(el, text, ValueWrite::Property))
            .run(log)
            .await
    }

    pub(crate) async fn dispatch(
        &self,
        el: ElementRef,
        event: SyntheticEvent,
        step: &'static str,
        log: &mut StepLog,
    ) -> Option<bool> {
        log.guard(step, self.dom.dispatch(el, &event)).await
    }

    /// Write now; once the host has rendered, focus, write again, move the
    /// caret and announce the input.
    async fn deferred_rewrite(&self, request: &InjectionRequest<'_>, log: &mut StepLog) -> ChainOutcome {
        let el = request.target.element;
        let outcome = self
            .write_value(el, request.text, ValueWrite::Property, log)
            .await;

        let dom = Arc::clone(&self.dom);
        let text = request.text.to_string();
        self.follow_ups.schedule(el, self.timings.deferred, async move {
            quietly("focus", dom.focus(el).await);
            quietly("rewrite", dom.set_value(el, &text, ValueWrite::Property).await);
            let end = dom_len(&text);
            quietly("caret", dom.set_selection_range(el, end, end).await);
            let input = SyntheticEvent::input("input", "insertText", None).cancelable(false);
            quietly("input", dom.dispatch(el, &input).await);
        });
        outcome
    }

    /// Empty write then real write, events spread over consecutive ticks, and
    /// a corrective pass in case the host's debounced render reverted it.
    async fn staggered_events(&self, request: &InjectionRequest<'_>, log: &mut StepLog) -> ChainOutcome {
        let el = request.target.element;
        let text = request.text;

        log.guard("focus", self.dom.focus(el)).await;
        log.guard("empty value", self.dom.set_value(el, "", ValueWrite::Property))
            .await;
        let outcome = self.write_value(el, text, ValueWrite::Property, log).await;

        let events = [
            SyntheticEvent::plain("focus"),
            SyntheticEvent::input("beforeinput", "insertText", Some(text)),
            SyntheticEvent::input("input", "insertText", Some(text)),
            SyntheticEvent::plain("change"),
        ];
        for (tick, event) in (0u32..).zip(events) {
            let dom = Arc::clone(&self.dom);
            self.follow_ups
                .schedule(el, self.timings.stagger * tick, async move {
                    quietly(&event.event_type, dom.dispatch(el, &event).await);
                });
        }

        let dom = Arc::clone(&self.dom);
        let owned = text.to_string();
        let refocus_after = self.timings.deferred;
        self.follow_ups
            .schedule(el, self.timings.corrective, async move {
                match dom.value(el).await {
                    Ok(Some(current)) if current == owned => {}
                    Ok(_) => {
                        debug!("Host reverted {}; rewriting", el);
                        quietly("corrective write", dom.set_value(el, &owned, ValueWrite::Property).await);
                    }
                    Err(e) => debug!("Cannot read back {}: {}", el, e),
                }
                quietly("blur", dom.blur(el).await);

                tokio::time::sleep(refocus_after).await;
                quietly("refocus", dom.focus(el).await);
                quietly("rewrite", dom.set_value(el, &owned, ValueWrite::Property).await);
                let input = SyntheticEvent::input("input", "insertText", Some(&owned));
                quietly("input", dom.dispatch(el, &input).await);
                quietly("change", dom.dispatch(el, &SyntheticEvent::plain("change")).await);
            });
        outcome
    }

    /// Reset through the native setter, write through it again and announce
    /// the value as pasted input.
    async fn reset_then_paste(&self, request: &InjectionRequest<'_>, log: &mut StepLog) -> ChainOutcome {
        let el = request.target.element;
        let text = request.text;

        log.guard("focus", self.dom.focus(el)).await;
        self.write_value(el, "", ValueWrite::Native, log).await;
        self.dispatch(el, SyntheticEvent::plain("input"), "input", log)
            .await;

        let outcome = self.write_value(el, text, ValueWrite::Native, log).await;
        log.guard("value attribute", self.dom.set_attribute(el, "value", text))
            .await;

        self.dispatch(
            el,
            SyntheticEvent::input("beforeinput", "insertFromPaste", Some(text)),
            "beforeinput",
            log,
        )
        .await;
        self.dispatch(el, SyntheticEvent::plain("input"), "input", log)
            .await;
        self.dispatch(
            el,
            SyntheticEvent::input("input", "insertText", Some(text)),
            "input",
            log,
        )
        .await;
        self.dispatch(el, SyntheticEvent::plain("change"), "change", log)
            .await;

        let end = dom_len(text);
        log.guard("caret", self.dom.set_selection_range(el, end, end))
            .await;

        let dom = Arc::clone(&self.dom);
        self.follow_ups.schedule(el, self.timings.deferred, async move {
            quietly("input", dom.dispatch(el, &SyntheticEvent::plain("input")).await);
            quietly("change", dom.dispatch(el, &SyntheticEvent::plain("change")).await);
        });
        outcome
    }

    /// Rewrite the sibling div that renders the textarea's text.
    async fn mirror_display(&self, el: ElementRef, text: &str, log: &mut StepLog) {
        let Some(Some(parent)) = log.guard("parent", self.dom.parent(el)).await else {
            return;
        };
        let Some(display) = self.find_display(parent).await else {
            debug!("No display mirror next to {}", el);
            return;
        };
        log.guard(
            "mirror display",
            self.dom.set_inner_html(display, &line_break_html(text)),
        )
        .await;
    }

    async fn find_display(&self, parent: ElementRef) -> Option<ElementRef> {
        let scope = Scope::Within(parent);
        if let Ok(Some(display)) = self.dom.query_selector(scope, DEEPSEEK_DISPLAY).await {
            return Some(display);
        }

        let candidates = self.dom.query_selector_all(scope, "div").await.ok()?;
        for div in candidates {
            if div == parent {
                continue;
            }
            let class = self.dom.attribute(div, "class").await.ok().flatten();
            let excluded = class
                .as_deref()
                .is_some_and(|c| c.split_whitespace().any(|n| n == DEEPSEEK_DISPLAY_EXCLUDED_CLASS));
            if !excluded {
                return Some(div);
            }
        }
        None
    }
}
