//! Content injection engine.
//!
//! Writes text into a located element so the host page's framework sees it
//! as user input. The write strategy comes from [`plan::plan`]; every page
//! call is guarded and a failing call moves on to the next fallback. An
//! injection therefore always completes, and the returned report says what
//! actually took effect.

pub mod editable;
pub mod events;
pub mod native;
pub mod plan;
pub mod steps;

use crate::dom::PageDom;
use crate::followup::FollowUps;
use crate::locator::{ElementKind, ResolvedTarget};
use plan::{InjectionPlan, InjectionRequest};
use promptdock_common::protocol::ValueWrite;
use std::sync::Arc;
use std::time::Duration;
use steps::{ChainOutcome, Fallback, StepLog};
use tracing::{debug, info};

/// Delays used to line synthetic work up with host render cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Gap between consecutive staggered events.
    pub stagger: Duration,
    /// Delay before a deferred rewrite.
    pub deferred: Duration,
    /// Delay before checking for and undoing a host revert.
    pub corrective: Duration,
    /// Delay before the final `input`/`change` re-dispatch.
    pub settle: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            stagger: Duration::from_millis(10),
            deferred: Duration::from_millis(50),
            corrective: Duration::from_millis(150),
            settle: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InjectionReport {
    pub plan: InjectionPlan,
    /// Outcome of the primary write chain.
    pub outcome: ChainOutcome,
    pub steps: StepLog,
}

impl InjectionReport {
    pub fn exhausted(&self) -> bool {
        self.outcome == ChainOutcome::Exhausted
    }
}

pub struct Injector<D: PageDom + ?Sized> {
    dom: Arc<D>,
    follow_ups: FollowUps,
    timings: Timings,
}

impl<D: PageDom + ?Sized + 'static> Injector<D> {
    pub fn new(dom: Arc<D>, follow_ups: FollowUps, timings: Timings) -> Self {
        Self {
            dom,
            follow_ups,
            timings,
        }
    }

    pub fn dom(&self) -> &D {
        self.dom.as_ref()
    }

    pub fn follow_ups(&self) -> &FollowUps {
        &self.follow_ups
    }

    pub fn timings(&self) -> Timings {
        self.timings
    }

    /// Write `text` into `target`. Never fails; faults end up in the report.
    pub async fn inject(&self, target: &ResolvedTarget, text: &str) -> InjectionReport {
        let stale = self.follow_ups.cancel(target.element);
        if stale > 0 {
            debug!("Dropped {} stale follow-ups before writing", stale);
        }

        let plan = plan::plan(target.flavor, target.kind);
        let request = InjectionRequest {
            target,
            text,
            strategy: plan.strategy,
            options: plan.options,
        };
        info!(
            "Injecting {} chars into {} ({:?}, {:?}, quirk {:?}) on {}",
            text.chars().count(),
            target.element,
            target.kind,
            plan.strategy,
            plan.quirk,
            target.site
        );

        let mut log = StepLog::default();
        let outcome = match target.kind {
            ElementKind::NativeField => self.write_native(&request, plan.quirk, &mut log).await,
            ElementKind::EditableRegion => {
                self.write_editable(&request, plan.quirk, &mut log).await
            }
            ElementKind::Opaque => self.write_opaque(&request, &mut log).await,
        };

        self.fire_battery(target.element, text, plan.battery, &mut log)
            .await;
        if plan.composition {
            self.fire_composition(target.element, &mut log).await;
        }
        if plan.finish {
            self.finish(target, text, &mut log).await;
        }

        if outcome == ChainOutcome::Exhausted {
            info!("Primary write exhausted every fallback; value may not be applied");
        }
        debug!(
            "Injection done: {} steps applied, {} absorbed faults",
            log.applied.len(),
            log.fault_count()
        );

        InjectionReport {
            plan,
            outcome,
            steps: log,
        }
    }

    async fn write_opaque(&self, request: &InjectionRequest<'_>, log: &mut StepLog) -> ChainOutcome {
        let el = request.target.element;
        let dom = self.dom.as_ref();

        if request.target.info.has_value {
            log.guard("value", dom.set_value(el, request.text, ValueWrite::Property))
                .await;
        }
        Fallback::new("opaque write")
            .then_unit("textContent", dom.set_text_content(el, request.text))
            .run(log)
            .await
    }
}

/// UTF-16 length, the unit of DOM selection offsets.
pub(crate) fn dom_len(text: &str) -> usize {
    text.encode_utf16().count()
}
