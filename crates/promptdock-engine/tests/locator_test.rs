mod common;

use common::MemoryDom;
use promptdock_common::error::TargetError;
use promptdock_common::sites::{SiteFlavor, SiteProfile, SiteRegistry};
use promptdock_engine::locator::{ElementKind, find_input, locate, shadow_roots};

#[tokio::test]
async fn test_chatgpt_textarea_by_id() {
    let dom = MemoryDom::new("chatgpt.com");
    let form = dom.append(dom.body(), "form", &[]);
    let textarea = dom.append(form, "textarea", &[("id", "prompt-textarea")]);

    let target = locate(&dom, &SiteRegistry::builtin(), "chatgpt.com")
        .await
        .unwrap();
    assert_eq!(target.element, textarea);
    assert_eq!(target.kind, ElementKind::NativeField);
    assert_eq!(target.flavor, SiteFlavor::ChatGpt);
    assert_eq!(target.site, "ChatGPT");
}

#[tokio::test]
async fn test_unknown_host_is_not_found() {
    let dom = MemoryDom::new("example.org");
    dom.append(dom.body(), "textarea", &[]);

    let err = locate(&dom, &SiteRegistry::builtin(), "example.org")
        .await
        .unwrap_err();
    assert_eq!(err, TargetError::InputNotFound);
    assert_eq!(err.to_string(), "Input element not found");
}

#[tokio::test]
async fn test_no_matching_element_is_not_found() {
    let dom = MemoryDom::new("claude.ai");
    dom.append(dom.body(), "div", &[("class", "composer")]);

    let err = locate(&dom, &SiteRegistry::builtin(), "claude.ai")
        .await
        .unwrap_err();
    assert_eq!(err, TargetError::InputNotFound);
}

#[tokio::test]
async fn test_selector_order_beats_document_order() {
    let dom = MemoryDom::new("kimi.com");
    // generic contenteditable comes first in the document, but the
    // Lexical-specific selector is declared first
    let generic = dom.append(dom.body(), "div", &[("contenteditable", "true")]);
    let lexical = dom.append(
        dom.body(),
        "div",
        &[
            ("class", "chat-input-editor"),
            ("data-lexical-editor", "true"),
            ("contenteditable", "true"),
        ],
    );

    let target = locate(&dom, &SiteRegistry::builtin(), "www.kimi.com")
        .await
        .unwrap();
    assert_eq!(target.element, lexical);
    assert_ne!(target.element, generic);
    assert_eq!(target.kind, ElementKind::EditableRegion);
    assert_eq!(target.flavor, SiteFlavor::Lexical);
}

#[tokio::test]
async fn test_every_builtin_profile_locates_its_first_selector() {
    let registry = SiteRegistry::builtin();
    assert!(!registry.is_empty());

    for profile in registry.profiles() {
        let dom = MemoryDom::new(&profile.key);
        let mut scope = dom.body();
        for host in &profile.shadow_hosts {
            let host = dom.append_matching(scope, host);
            scope = dom.attach_shadow(host);
        }
        let expected = dom.append_matching(scope, &profile.input_selectors[0]);

        let target = locate(&dom, &registry, &profile.key)
            .await
            .unwrap_or_else(|e| panic!("{}: {}", profile.key, e));
        assert_eq!(target.element, expected, "{}", profile.key);
        assert_eq!(target.site, profile.display_name, "{}", profile.key);
        assert_eq!(target.flavor, profile.flavor, "{}", profile.key);
    }
}

#[tokio::test]
async fn test_shadow_root_searched_before_document() {
    let dom = MemoryDom::new("gemini.google.com");
    let textbox = [("contenteditable", "true"), ("role", "textbox")];
    let decoy = dom.append(dom.body(), "div", &textbox);
    let host = dom.append(dom.body(), "chat-app", &[]);
    let root = dom.attach_shadow(host);
    let inner = dom.append(root, "div", &textbox);

    let target = locate(&dom, &SiteRegistry::builtin(), "gemini.google.com")
        .await
        .unwrap();
    assert_eq!(target.element, inner);
    assert_ne!(target.element, decoy);
}

#[tokio::test]
async fn test_missing_shadow_host_falls_back_to_document() {
    let dom = MemoryDom::new("gemini.google.com");
    let editor = dom.append(
        dom.body(),
        "div",
        &[("contenteditable", "true"), ("role", "textbox")],
    );

    let target = locate(&dom, &SiteRegistry::builtin(), "gemini.google.com")
        .await
        .unwrap();
    assert_eq!(target.element, editor);
}

#[tokio::test]
async fn test_nested_shadow_chain_deepest_first() {
    let dom = MemoryDom::new("app.test");
    let outer_host = dom.append(dom.body(), "outer-app", &[]);
    let outer_root = dom.attach_shadow(outer_host);
    let shallow = dom.append(outer_root, "textarea", &[]);
    let inner_host = dom.append(outer_root, "inner-panel", &[]);
    let inner_root = dom.attach_shadow(inner_host);
    let deep = dom.append(inner_root, "textarea", &[]);

    let profile = SiteProfile::new("app.test", "Test", &["textarea"])
        .with_shadow_hosts(&["outer-app", "inner-panel"]);

    let roots = shadow_roots(&dom, &profile.shadow_hosts).await;
    assert_eq!(roots, vec![outer_root, inner_root]);

    let found = find_input(&dom, &profile).await;
    assert_eq!(found, Some(deep));
    assert_ne!(found, Some(shallow));
}

#[tokio::test]
async fn test_container_reduced_to_editable_descendant() {
    let dom = MemoryDom::new("yuanbao.tencent.com");
    let container = dom.append(dom.body(), "div", &[("class", "chat-input")]);
    let wrapper = dom.append(container, "div", &[]);
    let editor = dom.append(wrapper, "div", &[("contenteditable", "true")]);

    let registry = SiteRegistry::with_overrides(vec![SiteProfile::new(
        "yuanbao.tencent.com",
        "Yuanbao",
        &[".chat-input"],
    )])
    .unwrap();

    let target = locate(&dom, &registry, "yuanbao.tencent.com")
        .await
        .unwrap();
    assert_eq!(target.element, editor);
    assert_eq!(target.kind, ElementKind::EditableRegion);
}

#[tokio::test]
async fn test_container_without_editable_descendant_is_opaque() {
    let dom = MemoryDom::new("custom.test");
    let container = dom.append(dom.body(), "section", &[("id", "composer")]);

    let registry = SiteRegistry::with_overrides(vec![SiteProfile::new(
        "custom.test",
        "Custom",
        &["#composer"],
    )])
    .unwrap();

    let target = locate(&dom, &registry, "custom.test").await.unwrap();
    assert_eq!(target.element, container);
    assert_eq!(target.kind, ElementKind::Opaque);
}

#[tokio::test]
async fn test_user_profile_shadows_builtin() {
    let dom = MemoryDom::new("claude.ai");
    let textarea = dom.append(dom.body(), "textarea", &[("name", "legacy")]);
    dom.append(
        dom.body(),
        "div",
        &[("class", "ProseMirror"), ("contenteditable", "true")],
    );

    let registry = SiteRegistry::with_overrides(vec![
        SiteProfile::new("claude.ai", "Claude (legacy)", &["textarea[name=\"legacy\"]"]),
    ])
    .unwrap();

    let target = locate(&dom, &registry, "claude.ai").await.unwrap();
    assert_eq!(target.element, textarea);
    assert_eq!(target.site, "Claude (legacy)");
    assert_eq!(target.flavor, SiteFlavor::Generic);
}

#[tokio::test]
async fn test_query_faults_count_as_no_match() {
    let dom = MemoryDom::new("chatgpt.com");
    dom.append(dom.body(), "textarea", &[("id", "prompt-textarea")]);
    dom.fail_primitive("query");

    let err = locate(&dom, &SiteRegistry::builtin(), "chatgpt.com")
        .await
        .unwrap_err();
    assert_eq!(err, TargetError::InputNotFound);
}

#[tokio::test]
async fn test_undescribable_target_is_target_not_found() {
    let dom = MemoryDom::new("chatgpt.com");
    dom.append(dom.body(), "textarea", &[("id", "prompt-textarea")]);
    dom.fail_primitive("describe");

    let err = locate(&dom, &SiteRegistry::builtin(), "chatgpt.com")
        .await
        .unwrap_err();
    assert_eq!(err, TargetError::TargetNotFound);
}
