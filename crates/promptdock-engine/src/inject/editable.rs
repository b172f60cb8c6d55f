//! Writes into `contenteditable` regions.

use super::plan::{InjectionRequest, Quirk, Strategy};
use super::steps::{ChainOutcome, Fallback, StepLog, quietly};
use super::Injector;
use crate::dom::PageDom;
use promptdock_common::error::DomError;
use promptdock_common::html::{blank_line_paragraphs, line_break_html, strict_paragraphs};
use promptdock_common::protocol::{Collapse, EditCommand, SyntheticEvent};
use std::sync::Arc;

impl<D: PageDom + ?Sized + 'static> Injector<D> {
    pub(crate) async fn write_editable(
        &self,
        request: &InjectionRequest<'_>,
        quirk: Quirk,
        log: &mut StepLog,
    ) -> ChainOutcome {
        if quirk == Quirk::DeferredRewrite {
            return self.rewrite_markup(request, log).await;
        }
        self.replace_editable(request, log).await
    }

    /// Focus, optionally clear, select everything and replace it through the
    /// strategy's fallback chain.
    async fn replace_editable(&self, request: &InjectionRequest<'_>, log: &mut StepLog) -> ChainOutcome {
        let el = request.target.element;
        let text = request.text;
        let dom = self.dom.as_ref();

        log.guard("focus", dom.focus(el)).await;
        if request.options.clear_before_write {
            self.clear_editable(el, log).await;
        }
        log.guard("select contents", dom.select_contents(el, Collapse::None))
            .await;

        let html = if request.options.strict_paragraphs {
            strict_paragraphs(text)
        } else {
            blank_line_paragraphs(text)
        };
        let insert_html = EditCommand::InsertHtml(html.clone());
        let insert_text = EditCommand::InsertText(text.to_string());
        let paste = SyntheticEvent::paste(text, &html);

        let chain = match request.strategy {
            Strategy::HtmlDirect => Fallback::new("html write")
                .then("insertHTML", dom.exec_command(&insert_html))
                .then_unit("innerHTML", dom.set_inner_html(el, &html))
                .then_unit("textContent", dom.set_text_content(el, text)),
            // a cancelled paste falls back to markup
            Strategy::PasteEmulation => Fallback::new("paste write")
                .then("paste", dom.dispatch(el, &paste))
                .then_unit("innerHTML", dom.set_inner_html(el, &html))
                .then_unit("textContent", dom.set_text_content(el, text)),
            // insertText turns line breaks into <br>, which textContent drops
            Strategy::SyntheticInsertText => Fallback::new("text write")
                .then("insertText", async {
                    if !dom.exec_command(&insert_text).await? {
                        return Ok(false);
                    }
                    Ok::<_, DomError>(dom.text_content(el).await? == text)
                })
                .then_unit("textContent", dom.set_text_content(el, text)),
            Strategy::PlainTextSet => Fallback::new("text write")
                .then_unit("textContent", dom.set_text_content(el, text)),
        };
        let outcome = chain.run(log).await;

        self.dispatch(el, SyntheticEvent::plain("input"), "input", log)
            .await;
        self.dispatch(el, SyntheticEvent::plain("change"), "change", log)
            .await;
        outcome
    }

    /// Replace the markup outright, then repeat it once the host editor has
    /// reacted to the first write.
    async fn rewrite_markup(&self, request: &InjectionRequest<'_>, log: &mut StepLog) -> ChainOutcome {
        let el = request.target.element;
        let html = line_break_html(request.text);
        let dom = self.dom.as_ref();

        let outcome = Fallback::new("markup write")
            .then_unit("innerHTML", dom.set_inner_html(el, &html))
            .then_unit("textContent", dom.set_text_content(el, request.text))
            .run(log)
            .await;

        let dom = Arc::clone(&self.dom);
        let text = request.text.to_string();
        self.follow_ups.schedule(el, self.timings.deferred, async move {
            quietly("focus", dom.focus(el).await);
            quietly("rewrite", dom.set_inner_html(el, &html).await);
            quietly("caret", dom.select_contents(el, Collapse::End).await);
            let input =
                SyntheticEvent::input("input", "insertFromPaste", Some(&text)).cancelable(false);
            quietly("input", dom.dispatch(el, &input).await);
        });
        outcome
    }
}
