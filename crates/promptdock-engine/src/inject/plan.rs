//! Strategy selection: a pure function of site flavor and element kind.

use crate::locator::{ElementKind, ResolvedTarget};
use promptdock_common::sites::SiteFlavor;

/// How the text itself gets written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Value or text content assignment.
    PlainTextSet,
    /// Value write accompanied by `insertText` input events, or
    /// `execCommand('insertText')` on editable regions.
    SyntheticInsertText,
    /// Paragraph markup through `insertHTML` or `innerHTML`.
    HtmlDirect,
    /// A synthetic `paste` carrying plain and HTML clipboard data.
    PasteEmulation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InjectOptions {
    pub clear_before_write: bool,
    /// One paragraph per line instead of merged multi-line paragraphs.
    pub strict_paragraphs: bool,
}

/// Site-specific sequencing on top of the strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quirk {
    None,
    /// Write now, write again after a short delay with focus and caret.
    DeferredRewrite,
    /// Empty write, real write, events staggered over several ticks and a
    /// corrective rewrite once the host has settled.
    StaggeredEvents,
    /// Native empty write, native real write, paste-typed input events.
    ResetThenPaste,
    /// Also rewrite the display div that mirrors the textarea.
    MirrorDisplay,
}

/// Events fired after the primary write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Battery {
    None,
    Full,
    WithoutPaste,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectionPlan {
    pub strategy: Strategy,
    pub options: InjectOptions,
    pub quirk: Quirk,
    pub battery: Battery,
    /// `keydown`/`keypress`/`keyup` plus a composition sequence.
    pub composition: bool,
    /// Focus, caret to the end and a delayed `input`/`change`.
    pub finish: bool,
}

impl InjectionPlan {
    fn kind_default(kind: ElementKind) -> Self {
        let strategy = match kind {
            ElementKind::EditableRegion => Strategy::SyntheticInsertText,
            ElementKind::NativeField | ElementKind::Opaque => Strategy::PlainTextSet,
        };
        Self {
            strategy,
            options: InjectOptions::default(),
            quirk: Quirk::None,
            battery: Battery::Full,
            composition: false,
            finish: true,
        }
    }

    fn with(mut self, strategy: Strategy, quirk: Quirk) -> Self {
        self.strategy = strategy;
        self.quirk = quirk;
        self
    }
}

/// A fully specified write for one command.
#[derive(Debug, Clone, Copy)]
pub struct InjectionRequest<'a> {
    pub target: &'a ResolvedTarget,
    pub text: &'a str,
    pub strategy: Strategy,
    pub options: InjectOptions,
}

pub fn plan(flavor: SiteFlavor, kind: ElementKind) -> InjectionPlan {
    use ElementKind::*;
    use SiteFlavor as F;

    let base = InjectionPlan::kind_default(kind);
    match (flavor, kind) {
        (F::ChatGpt, NativeField) => base.with(Strategy::PlainTextSet, Quirk::DeferredRewrite),
        (F::ChatGpt, EditableRegion) => base.with(Strategy::HtmlDirect, Quirk::DeferredRewrite),
        (F::Tongyi, NativeField) => {
            base.with(Strategy::SyntheticInsertText, Quirk::StaggeredEvents)
        }
        (F::Grok, NativeField) => base.with(Strategy::SyntheticInsertText, Quirk::ResetThenPaste),
        (F::DeepSeek, NativeField) => InjectionPlan {
            composition: true,
            ..base.with(Strategy::PlainTextSet, Quirk::MirrorDisplay)
        },
        (F::DeepSeek, _) => InjectionPlan {
            composition: true,
            ..base
        },
        (F::Lexical, EditableRegion) => InjectionPlan {
            strategy: Strategy::PasteEmulation,
            options: InjectOptions {
                clear_before_write: true,
                strict_paragraphs: false,
            },
            battery: Battery::None,
            finish: false,
            ..base
        },
        (F::ProseMirror, EditableRegion) => InjectionPlan {
            strategy: Strategy::HtmlDirect,
            options: InjectOptions {
                clear_before_write: true,
                strict_paragraphs: true,
            },
            battery: Battery::None,
            finish: false,
            ..base
        },
        (F::Lexical | F::ProseMirror, _) => InjectionPlan {
            battery: Battery::WithoutPaste,
            ..base
        },
        _ => base,
    }
}
