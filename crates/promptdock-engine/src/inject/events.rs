//! Event batteries fired after the primary write.

use super::plan::Battery;
use super::steps::{StepLog, quietly};
use super::{Injector, dom_len};
use crate::dom::PageDom;
use crate::locator::ResolvedTarget;
use promptdock_common::protocol::{Collapse, ElementRef, SyntheticEvent};
use std::sync::Arc;

impl<D: PageDom + ?Sized + 'static> Injector<D> {
    /// `input`, `change`, a key press and optionally a bare `paste`.
    pub(crate) async fn fire_battery(
        &self,
        el: ElementRef,
        text: &str,
        battery: Battery,
        log: &mut StepLog,
    ) {
        if battery == Battery::None {
            return;
        }

        let mut events = vec![
            (
                "battery input",
                SyntheticEvent::input("input", "insertText", Some(text)),
            ),
            (
                "battery change",
                SyntheticEvent::plain("change").cancelable(true),
            ),
            ("battery keydown", SyntheticEvent::key("keydown")),
            ("battery keyup", SyntheticEvent::key("keyup")),
        ];
        if battery == Battery::Full {
            events.push((
                "battery paste",
                SyntheticEvent::plain("paste").cancelable(true),
            ));
        }
        for (step, event) in events {
            self.dispatch(el, event, step, log).await;
        }
    }

    /// Key press followed by a complete composition session.
    pub(crate) async fn fire_composition(&self, el: ElementRef, log: &mut StepLog) {
        let events = [
            ("keydown", SyntheticEvent::key("keydown")),
            ("keypress", SyntheticEvent::key("keypress")),
            ("keyup", SyntheticEvent::key("keyup")),
            ("compositionstart", SyntheticEvent::plain("compositionstart")),
            ("compositionupdate", SyntheticEvent::plain("compositionupdate")),
            ("compositionend", SyntheticEvent::plain("compositionend")),
        ];
        for (step, event) in events {
            self.dispatch(el, event, step, log).await;
        }
    }

    /// Focus, caret to the end, and a settle-delayed `input`/`change`.
    pub(crate) async fn finish(&self, target: &ResolvedTarget, text: &str, log: &mut StepLog) {
        let el = target.element;
        log.guard("finish focus", self.dom.focus(el)).await;

        if target.info.supports_selection_range() {
            let end = dom_len(text);
            log.guard("finish caret", self.dom.set_selection_range(el, end, end))
                .await;
        } else if target.info.content_editable.as_deref() == Some("true") {
            log.guard("finish caret", self.dom.select_contents(el, Collapse::End))
                .await;
        }

        let dom = Arc::clone(&self.dom);
        self.follow_ups.schedule(el, self.timings.settle, async move {
            quietly("settle input", dom.dispatch(el, &SyntheticEvent::plain("input")).await);
            quietly("settle change", dom.dispatch(el, &SyntheticEvent::plain("change")).await);
        });
    }
}
