//! Finds the chat input on the current page.

use crate::dom::PageDom;
use promptdock_common::error::TargetError;
use promptdock_common::protocol::{ElementInfo, ElementRef, Scope};
use promptdock_common::sites::{SiteFlavor, SiteProfile, SiteRegistry};
use tracing::debug;

/// Descendants that can stand in for a non-editable container match.
pub const EDITABLE_DESCENDANT: &str =
    "[contenteditable=\"true\"], textarea, input, [role=\"textbox\"]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// `<input>` or `<textarea>`.
    NativeField,
    /// A `contenteditable` subtree.
    EditableRegion,
    Opaque,
}

impl ElementKind {
    pub fn classify(info: &ElementInfo) -> Self {
        if info.is_native_field() {
            ElementKind::NativeField
        } else if info.is_editable_region() {
            ElementKind::EditableRegion
        } else {
            ElementKind::Opaque
        }
    }
}

/// An element located for one command. Never reused across commands.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub element: ElementRef,
    pub kind: ElementKind,
    pub info: ElementInfo,
    pub flavor: SiteFlavor,
    /// Display name of the matched site profile.
    pub site: String,
}

/// Resolve the profile for `hostname` and find its input element.
pub async fn locate<D: PageDom + ?Sized>(
    dom: &D,
    registry: &SiteRegistry,
    hostname: &str,
) -> Result<ResolvedTarget, TargetError> {
    let profile = registry.resolve(hostname).ok_or_else(|| {
        debug!("No site profile for host '{}'", hostname);
        TargetError::InputNotFound
    })?;

    let found = find_input(dom, profile)
        .await
        .ok_or(TargetError::InputNotFound)?;
    let element = reduce_to_editable(dom, found).await;

    let info = dom.describe(element).await.map_err(|e| {
        debug!("Located {} but could not describe it: {}", element, e);
        TargetError::TargetNotFound
    })?;

    Ok(ResolvedTarget {
        element,
        kind: ElementKind::classify(&info),
        info,
        flavor: profile.flavor,
        site: profile.display_name.clone(),
    })
}

/// Search the declared shadow roots (deepest first), then the document.
pub async fn find_input<D: PageDom + ?Sized>(dom: &D, profile: &SiteProfile) -> Option<ElementRef> {
    for root in shadow_roots(dom, &profile.shadow_hosts).await.into_iter().rev() {
        if let Some(el) = first_match(dom, Scope::Within(root), &profile.input_selectors).await {
            return Some(el);
        }
    }
    first_match(dom, Scope::Document, &profile.input_selectors).await
}

/// Walk the shadow host chain and collect every reachable open shadow root.
/// A missing host or a closed root ends the chain.
pub async fn shadow_roots<D: PageDom + ?Sized>(dom: &D, hosts: &[String]) -> Vec<ElementRef> {
    let mut roots = Vec::new();
    let mut scope = Scope::Document;

    for selector in hosts {
        let host = match dom.query_selector(scope, selector).await {
            Ok(Some(host)) => host,
            Ok(None) => break,
            Err(e) => {
                debug!("Shadow host query '{}' failed: {}", selector, e);
                break;
            }
        };
        match dom.shadow_root(host).await {
            Ok(Some(root)) => {
                roots.push(root);
                scope = Scope::Within(root);
            }
            Ok(None) => break,
            Err(e) => {
                debug!("Shadow root of {} unavailable: {}", host, e);
                break;
            }
        }
    }
    roots
}

/// First element of the first selector that matches anything.
pub async fn first_match<D: PageDom + ?Sized>(
    dom: &D,
    scope: Scope,
    selectors: &[String],
) -> Option<ElementRef> {
    for selector in selectors {
        match dom.query_selector(scope, selector).await {
            Ok(Some(el)) => return Some(el),
            Ok(None) => {}
            Err(e) => debug!("Selector '{}' failed: {}", selector, e),
        }
    }
    None
}

/// Reduce a matched container to the element that actually takes input.
pub async fn reduce_to_editable<D: PageDom + ?Sized>(dom: &D, el: ElementRef) -> ElementRef {
    match dom.describe(el).await {
        Ok(info) if info.is_native_field() || info.is_editable_region() => return el,
        Ok(_) => {}
        Err(e) => {
            debug!("Cannot describe {}: {}", el, e);
            return el;
        }
    }

    match dom.query_selector(Scope::Within(el), EDITABLE_DESCENDANT).await {
        Ok(Some(inner)) => inner,
        Ok(None) => el,
        Err(e) => {
            debug!("Editable descendant search under {} failed: {}", el, e);
            el
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(tag: &str, content_editable: Option<&str>, is_content_editable: bool) -> ElementInfo {
        ElementInfo {
            tag: tag.into(),
            content_editable: content_editable.map(str::to_string),
            is_content_editable,
            ..Default::default()
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            ElementKind::classify(&info("textarea", None, false)),
            ElementKind::NativeField
        );
        assert_eq!(
            ElementKind::classify(&info("input", None, false)),
            ElementKind::NativeField
        );
        assert_eq!(
            ElementKind::classify(&info("div", Some("true"), true)),
            ElementKind::EditableRegion
        );
        // inherited editability
        assert_eq!(
            ElementKind::classify(&info("p", None, true)),
            ElementKind::EditableRegion
        );
        assert_eq!(
            ElementKind::classify(&info("div", Some("false"), false)),
            ElementKind::Opaque
        );
    }
}
