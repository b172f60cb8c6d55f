#![allow(dead_code)]

//! In-memory page used to exercise the engine without a browser.

use async_trait::async_trait;
use promptdock_common::error::DomError;
use promptdock_common::html::escape_html;
use promptdock_common::protocol::{
    Collapse, EditCommand, ElementInfo, ElementRef, Scope, SyntheticEvent,
    ValueWrite,
};
use promptdock_common::selector::split_selector_list;
use promptdock_engine::dom::PageDom;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

const SHADOW_ROOT: &str = "#shadow-root";

#[derive(Debug, Default)]
struct Node {
    tag: String,
    attrs: Vec<(String, String)>,
    parent: Option<usize>,
    children: Vec<usize>,
    shadow: Option<usize>,
    value: Option<String>,
    text: String,
    html: String,
    removed: bool,
}

impl Node {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|n| n == class))
    }
}

#[derive(Debug, Default)]
struct State {
    hostname: String,
    nodes: Vec<Node>,
    events: Vec<(ElementRef, SyntheticEvent)>,
    focused: Option<ElementRef>,
    /// Element whose contents are selected, and whether the selection is
    /// collapsed to the end.
    selection: Option<(ElementRef, bool)>,
    caret: Option<(ElementRef, usize, usize)>,
    native_writes: usize,
    declined_commands: HashSet<&'static str>,
    failing_primitives: HashSet<&'static str>,
    paste_cancelled: bool,
}

/// Document tree with a small CSS selector engine. Element `0` is `<body>`.
pub struct MemoryDom {
    state: Mutex<State>,
}

impl MemoryDom {
    pub fn new(hostname: &str) -> Self {
        let body = Node {
            tag: "body".into(),
            ..Default::default()
        };
        Self {
            state: Mutex::new(State {
                hostname: hostname.into(),
                nodes: vec![body],
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn body(&self) -> ElementRef {
        ElementRef(0)
    }

    pub fn set_hostname(&self, hostname: &str) {
        self.lock().hostname = hostname.into();
    }

    pub fn append(&self, parent: ElementRef, tag: &str, attrs: &[(&str, &str)]) -> ElementRef {
        let mut state = self.lock();
        let id = state.nodes.len();
        let value = matches!(tag, "textarea" | "input").then(String::new);
        state.nodes.push(Node {
            tag: tag.into(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            parent: Some(parent.0 as usize),
            value,
            ..Default::default()
        });
        state.nodes[parent.0 as usize].children.push(id);
        ElementRef(id as u32)
    }

    /// Build the element chain a selector describes under `parent` and
    /// return the innermost element. Compounds without a tag become `<div>`;
    /// bare attribute tests get the value `"true"`.
    pub fn append_matching(&self, parent: ElementRef, selector: &str) -> ElementRef {
        let mut current = parent;
        for part in split_compounds(selector) {
            let compound = Compound::parse(&part);
            let mut attrs: Vec<(String, String)> = compound
                .attrs
                .iter()
                .map(|(name, test)| {
                    let value = match test {
                        AttrTest::Present => "true".to_string(),
                        AttrTest::Equals(v) | AttrTest::Contains(v) => v.clone(),
                    };
                    (name.clone(), value)
                })
                .collect();
            if let Some(id) = &compound.id {
                attrs.push(("id".into(), id.clone()));
            }
            if !compound.classes.is_empty() {
                attrs.push(("class".into(), compound.classes.join(" ")));
            }
            let attrs: Vec<(&str, &str)> = attrs
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            current = self.append(current, compound.tag.as_deref().unwrap_or("div"), &attrs);
        }
        current
    }

    /// Attach an open shadow root to `host` and return it.
    pub fn attach_shadow(&self, host: ElementRef) -> ElementRef {
        let mut state = self.lock();
        let id = state.nodes.len();
        state.nodes.push(Node {
            tag: SHADOW_ROOT.into(),
            ..Default::default()
        });
        state.nodes[host.0 as usize].shadow = Some(id);
        ElementRef(id as u32)
    }

    /// Detach `el` from the tree; later primitive calls on it fail as stale.
    pub fn remove(&self, el: ElementRef) {
        let mut state = self.lock();
        state.nodes[el.0 as usize].removed = true;
        if let Some(parent) = state.nodes[el.0 as usize].parent {
            state.nodes[parent].children.retain(|&c| c != el.0 as usize);
        }
    }

    /// `execCommand(name)` reports that the browser did not handle it.
    pub fn decline_command(&self, name: &'static str) {
        self.lock().declined_commands.insert(name);
    }

    /// Make a primitive fault, as if the page threw.
    pub fn fail_primitive(&self, name: &'static str) {
        self.lock().failing_primitives.insert(name);
    }

    /// A page listener calls `preventDefault()` on every cancelable paste.
    pub fn cancel_paste(&self) {
        self.lock().paste_cancelled = true;
    }

    pub fn value_of(&self, el: ElementRef) -> Option<String> {
        self.lock().nodes[el.0 as usize].value.clone()
    }

    /// Overwrite a field's value behind the engine's back.
    pub fn host_writes_value(&self, el: ElementRef, value: &str) {
        self.lock().nodes[el.0 as usize].value = Some(value.into());
    }

    pub fn text_of(&self, el: ElementRef) -> String {
        self.lock().nodes[el.0 as usize].text.clone()
    }

    pub fn html_of(&self, el: ElementRef) -> String {
        self.lock().nodes[el.0 as usize].html.clone()
    }

    pub fn attr_of(&self, el: ElementRef, name: &str) -> Option<String> {
        self.lock().nodes[el.0 as usize].attr(name).map(str::to_string)
    }

    pub fn focused(&self) -> Option<ElementRef> {
        self.lock().focused
    }

    pub fn caret(&self) -> Option<(ElementRef, usize, usize)> {
        self.lock().caret
    }

    pub fn selection(&self) -> Option<(ElementRef, bool)> {
        self.lock().selection
    }

    pub fn native_writes(&self) -> usize {
        self.lock().native_writes
    }

    /// Types of the events dispatched at `el`, in order.
    pub fn events_for(&self, el: ElementRef) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter(|(target, _)| *target == el)
            .map(|(_, ev)| ev.event_type.clone())
            .collect()
    }

    pub fn dispatched(&self) -> Vec<(ElementRef, SyntheticEvent)> {
        self.lock().events.clone()
    }

    pub fn clear_events(&self) {
        self.lock().events.clear();
    }
}

impl State {
    fn node(&self, el: ElementRef) -> Result<&Node, DomError> {
        match self.nodes.get(el.0 as usize) {
            Some(node) if !node.removed => Ok(node),
            _ => Err(DomError::Stale(el)),
        }
    }

    fn node_mut(&mut self, el: ElementRef) -> Result<&mut Node, DomError> {
        match self.nodes.get_mut(el.0 as usize) {
            Some(node) if !node.removed => Ok(node),
            _ => Err(DomError::Stale(el)),
        }
    }

    fn check(&self, primitive: &'static str) -> Result<(), DomError> {
        if self.failing_primitives.contains(primitive) {
            Err(DomError::Script(format!("{} threw", primitive)))
        } else {
            Ok(())
        }
    }

    /// Light-tree descendants of `root` in document order.
    fn descendants(&self, root: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.nodes[root].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id].children.iter().rev());
        }
        out
    }

    fn is_content_editable(&self, id: usize) -> bool {
        let mut current = Some(id);
        while let Some(i) = current {
            match self.nodes[i].attr("contenteditable") {
                Some("true") | Some("") => return true,
                Some("false") => return false,
                _ => current = self.nodes[i].parent,
            }
        }
        false
    }

    fn matches_list(&self, id: usize, selector: &str) -> bool {
        split_selector_list(selector)
            .iter()
            .any(|complex| self.matches_complex(id, complex))
    }

    /// Compound selectors joined by descendant combinators.
    fn matches_complex(&self, id: usize, selector: &str) -> bool {
        let parts: Vec<Compound> = split_compounds(selector).iter().map(|s| Compound::parse(s)).collect();
        let Some((last, ancestors)) = parts.split_last() else {
            return false;
        };
        if !last.matches(&self.nodes[id]) {
            return false;
        }

        let mut remaining = ancestors.len();
        let mut current = self.nodes[id].parent;
        while remaining > 0 {
            let Some(i) = current else { break };
            if ancestors[remaining - 1].matches(&self.nodes[i]) {
                remaining -= 1;
            }
            current = self.nodes[i].parent;
        }
        remaining == 0
    }
}

/// Split at whitespace outside brackets and quotes.
fn split_compounds(selector: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0;
    let mut quote: Option<char> = None;
    for c in selector.trim().chars() {
        match (quote, c) {
            (Some(q), _) if c == q => {
                quote = None;
                current.push(c);
            }
            (Some(_), _) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                current.push(c);
            }
            (None, '[') => {
                depth += 1;
                current.push(c);
            }
            (None, ']') => {
                depth -= 1;
                current.push(c);
            }
            (None, c) if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            (None, c) => current.push(c),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

#[derive(Debug)]
enum AttrTest {
    Present,
    Equals(String),
    Contains(String),
}

#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, AttrTest)>,
}

impl Compound {
    fn parse(s: &str) -> Self {
        let mut compound = Compound::default();
        let chars: Vec<char> = s.chars().collect();
        let mut i = 0;

        let ident = |i: &mut usize| {
            let start = *i;
            while *i < chars.len() && (chars[*i].is_alphanumeric() || matches!(chars[*i], '-' | '_')) {
                *i += 1;
            }
            chars[start..*i].iter().collect::<String>()
        };

        while i < chars.len() {
            match chars[i] {
                '#' => {
                    i += 1;
                    compound.id = Some(ident(&mut i));
                }
                '.' => {
                    i += 1;
                    compound.classes.push(ident(&mut i));
                }
                '[' => {
                    let end = chars[i..].iter().position(|&c| c == ']').map_or(chars.len(), |p| i + p);
                    let body: String = chars[i + 1..end].iter().collect();
                    compound.attrs.push(parse_attr(&body));
                    i = end + 1;
                }
                '*' => i += 1,
                _ => {
                    let tag = ident(&mut i);
                    if tag.is_empty() {
                        i += 1;
                    } else {
                        compound.tag = Some(tag.to_lowercase());
                    }
                }
            }
        }
        compound
    }

    fn matches(&self, node: &Node) -> bool {
        if node.tag == SHADOW_ROOT {
            return false;
        }
        if let Some(tag) = &self.tag
            && *tag != node.tag
        {
            return false;
        }
        if let Some(id) = &self.id
            && node.attr("id") != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.iter().all(|c| node.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|(name, test)| match (node.attr(name), test) {
            (None, _) => false,
            (Some(_), AttrTest::Present) => true,
            (Some(v), AttrTest::Equals(want)) => v == want,
            (Some(v), AttrTest::Contains(want)) => v.contains(want.as_str()),
        })
    }
}

fn parse_attr(body: &str) -> (String, AttrTest) {
    let unquote = |v: &str| v.trim().trim_matches(|c| c == '"' || c == '\'').to_string();
    if let Some((name, value)) = body.split_once("*=") {
        (name.trim().into(), AttrTest::Contains(unquote(value)))
    } else if let Some((name, value)) = body.split_once('=') {
        (name.trim().into(), AttrTest::Equals(unquote(value)))
    } else {
        (body.trim().into(), AttrTest::Present)
    }
}

/// Text a browser would report for `html`.
fn strip_tags(html: &str) -> String {
    let mut out = String::new();
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&lt;", "<").replace("&gt;", ">").replace("&amp;", "&")
}

#[async_trait]
impl PageDom for MemoryDom {
    async fn hostname(&self) -> Result<String, DomError> {
        let state = self.lock();
        state.check("hostname")?;
        Ok(state.hostname.clone())
    }

    async fn query_selector(&self, scope: Scope, selector: &str) -> Result<Option<ElementRef>, DomError> {
        Ok(self.query_selector_all(scope, selector).await?.into_iter().next())
    }

    async fn query_selector_all(&self, scope: Scope, selector: &str) -> Result<Vec<ElementRef>, DomError> {
        let state = self.lock();
        state.check("query")?;
        let root = match scope {
            Scope::Document => 0,
            Scope::Within(el) => {
                state.node(el)?;
                el.0 as usize
            }
        };
        let mut candidates = state.descendants(root);
        if scope == Scope::Document {
            candidates.insert(0, 0);
        }
        Ok(candidates
            .into_iter()
            .filter(|&id| state.matches_list(id, selector))
            .map(|id| ElementRef(id as u32))
            .collect())
    }

    async fn shadow_root(&self, host: ElementRef) -> Result<Option<ElementRef>, DomError> {
        let state = self.lock();
        Ok(state.node(host)?.shadow.map(|id| ElementRef(id as u32)))
    }

    async fn parent(&self, el: ElementRef) -> Result<Option<ElementRef>, DomError> {
        let state = self.lock();
        Ok(state.node(el)?.parent.map(|id| ElementRef(id as u32)))
    }

    async fn describe(&self, el: ElementRef) -> Result<ElementInfo, DomError> {
        let state = self.lock();
        state.check("describe")?;
        let node = state.node(el)?;
        let input_type = (node.tag == "input")
            .then(|| node.attr("type").unwrap_or("text").to_string());
        Ok(ElementInfo {
            tag: node.tag.clone(),
            content_editable: node.attr("contenteditable").map(str::to_string),
            is_content_editable: state.is_content_editable(el.0 as usize),
            input_type,
            has_value: node.value.is_some(),
        })
    }

    async fn attribute(&self, el: ElementRef, name: &str) -> Result<Option<String>, DomError> {
        let state = self.lock();
        Ok(state.node(el)?.attr(name).map(str::to_string))
    }

    async fn set_attribute(&self, el: ElementRef, name: &str, value: &str) -> Result<(), DomError> {
        let mut state = self.lock();
        let node = state.node_mut(el)?;
        node.attrs.retain(|(k, _)| k != name);
        node.attrs.push((name.into(), value.into()));
        Ok(())
    }

    async fn focus(&self, el: ElementRef) -> Result<(), DomError> {
        let mut state = self.lock();
        state.check("focus")?;
        state.node(el)?;
        state.focused = Some(el);
        Ok(())
    }

    async fn blur(&self, el: ElementRef) -> Result<(), DomError> {
        let mut state = self.lock();
        state.node(el)?;
        if state.focused == Some(el) {
            state.focused = None;
        }
        Ok(())
    }

    async fn value(&self, el: ElementRef) -> Result<Option<String>, DomError> {
        let state = self.lock();
        Ok(state.node(el)?.value.clone())
    }

    async fn set_value(&self, el: ElementRef, value: &str, how: ValueWrite) -> Result<(), DomError> {
        let mut state = self.lock();
        if how == ValueWrite::Native {
            state.check("native setter")?;
            state.native_writes += 1;
        }
        state.node_mut(el)?.value = Some(value.into());
        Ok(())
    }

    async fn text_content(&self, el: ElementRef) -> Result<String, DomError> {
        let state = self.lock();
        Ok(state.node(el)?.text.clone())
    }

    async fn set_text_content(&self, el: ElementRef, text: &str) -> Result<(), DomError> {
        let mut state = self.lock();
        state.check("textContent")?;
        let node = state.node_mut(el)?;
        node.text = text.into();
        node.html = escape_html(text);
        Ok(())
    }

    async fn inner_html(&self, el: ElementRef) -> Result<String, DomError> {
        let state = self.lock();
        Ok(state.node(el)?.html.clone())
    }

    async fn set_inner_html(&self, el: ElementRef, html: &str) -> Result<(), DomError> {
        let mut state = self.lock();
        state.check("innerHTML")?;
        let node = state.node_mut(el)?;
        node.html = html.into();
        node.text = strip_tags(html);
        Ok(())
    }

    async fn select_contents(&self, el: ElementRef, collapse: Collapse) -> Result<(), DomError> {
        let mut state = self.lock();
        state.node(el)?;
        state.selection = Some((el, collapse == Collapse::End));
        Ok(())
    }

    async fn set_selection_range(&self, el: ElementRef, start: usize, end: usize) -> Result<(), DomError> {
        let mut state = self.lock();
        if state.node(el)?.value.is_none() {
            return Err(DomError::Unsupported("setSelectionRange".into()));
        }
        state.caret = Some((el, start, end));
        Ok(())
    }

    async fn exec_command(&self, command: &EditCommand) -> Result<bool, DomError> {
        let mut state = self.lock();
        if state.declined_commands.contains(command.name()) {
            return Ok(false);
        }
        let target = match command {
            EditCommand::SelectAll => {
                let Some(focused) = state.focused else {
                    return Ok(false);
                };
                state.selection = Some((focused, false));
                return Ok(true);
            }
            _ => match state.selection {
                Some((el, false)) if state.is_content_editable(el.0 as usize) => el,
                _ => return Ok(false),
            },
        };

        let node = state.node_mut(target)?;
        match command {
            // line breaks land as <br>, which textContent does not report
            EditCommand::InsertText(text) => {
                node.text = text.replace('\n', "");
                node.html = escape_html(text).replace('\n', "<br>");
            }
            EditCommand::InsertHtml(html) => {
                node.html = html.clone();
                node.text = strip_tags(html);
            }
            EditCommand::Delete => {
                node.text.clear();
                node.html.clear();
            }
            EditCommand::SelectAll => {}
        }
        Ok(true)
    }

    async fn dispatch(&self, el: ElementRef, event: &SyntheticEvent) -> Result<bool, DomError> {
        let mut state = self.lock();
        state.check("dispatch")?;
        state.node(el)?;
        state.events.push((el, event.clone()));

        let cancelled =
            event.event_type == "paste" && event.cancelable && state.paste_cancelled;
        Ok(!cancelled)
    }
}
