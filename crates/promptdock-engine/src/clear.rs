//! Empties a located input.

use crate::dom::PageDom;
use crate::inject::Injector;
use crate::inject::steps::{Fallback, StepLog};
use crate::locator::{ElementKind, ResolvedTarget};
use promptdock_common::protocol::{EditCommand, ElementRef, SyntheticEvent, ValueWrite};
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct ClearReport {
    pub steps: StepLog,
    /// Follow-ups that were still pending for the element.
    pub cancelled: usize,
}

impl<D: PageDom + ?Sized + 'static> Injector<D> {
    /// Empty `target`. Like injection, never fails.
    pub async fn clear(&self, target: &ResolvedTarget) -> ClearReport {
        let el = target.element;
        let cancelled = self.follow_ups().cancel(el);
        info!("Clearing {} ({:?}) on {}", el, target.kind, target.site);

        let mut log = StepLog::default();
        match target.kind {
            ElementKind::NativeField => {
                self.write_value(el, "", ValueWrite::Native, &mut log).await;
                self.dispatch(el, SyntheticEvent::plain("input"), "input", &mut log)
                    .await;
            }
            ElementKind::EditableRegion | ElementKind::Opaque => {
                self.clear_editable(el, &mut log).await;
            }
        }

        debug!(
            "Clear done: {} steps applied, {} absorbed faults",
            log.applied.len(),
            log.fault_count()
        );
        ClearReport {
            steps: log,
            cancelled,
        }
    }

    /// Delete the contents the way a cut would, then empty the markup.
    pub(crate) async fn clear_editable(&self, el: ElementRef, log: &mut StepLog) {
        let dom = self.dom();

        log.guard("focus", dom.focus(el)).await;
        log.guard("selectAll", dom.exec_command(&EditCommand::SelectAll))
            .await;
        self.dispatch(
            el,
            SyntheticEvent::input("beforeinput", "deleteByCut", Some("")),
            "beforeinput",
            log,
        )
        .await;
        self.dispatch(
            el,
            SyntheticEvent::input("input", "deleteByCut", Some("")),
            "input",
            log,
        )
        .await;
        log.guard("delete", dom.exec_command(&EditCommand::Delete))
            .await;

        Fallback::new("empty markup")
            .then_unit("innerHTML", dom.set_inner_html(el, ""))
            .then_unit("textContent", dom.set_text_content(el, ""))
            .run(log)
            .await;

        self.dispatch(el, SyntheticEvent::plain("input"), "input", log)
            .await;
        self.dispatch(el, SyntheticEvent::plain("change"), "change", log)
            .await;
    }
}
