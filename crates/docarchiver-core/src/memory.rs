//! In-memory [`FrameDocument`].
//!
//! Holds an element tree, a small CSS selector engine (type, `*`, `#id`,
//! `.class`, `[attr]`, `[attr="v"]`, descendant combinator and selector
//! lists) and scripted page reactions, so page workflows can be exercised
//! without a browser.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::dom::{
    DomEvent, ElementSnapshot, FrameDocument, FrameLocation, NodeRef, ReadyState,
};
use crate::error::DomError;

/// Element description used to build a [`MemoryDocument`].
#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    checked: bool,
    click_handler: bool,
    options: Vec<String>,
    value: Option<String>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_uppercase(),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    /// Install an `onclick` property handler (not visible as an attribute).
    pub fn click_handler(mut self) -> Self {
        self.click_handler = true;
        self
    }

    /// Set the `value` property independently of the `value` attribute.
    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    /// Option values of a select.
    pub fn options(mut self, values: &[&str]) -> Self {
        self.options = values.iter().map(|v| v.to_string()).collect();
        self
    }
}

/// Scripted page behaviour triggered by an event on an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    /// Load a fresh document at the same URL. Element state is kept, as the
    /// server re-renders what it already recorded.
    Reload,
    /// Load a fresh document at another URL.
    Navigate(String),
    /// Replace the options of a select.
    SetOptions { select: NodeRef, options: Vec<String> },
}

/// Mutations performed through the [`FrameDocument`] interface.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedAction {
    Checked(NodeRef, bool),
    ParentClassAdded(NodeRef, String),
    ValueSet(NodeRef, String),
    Dispatched(NodeRef, DomEvent),
    Clicked(NodeRef),
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attributes: HashMap<String, String>,
    text: String,
    checked: bool,
    value: String,
    click_handler: bool,
    options: Vec<String>,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl Node {
    fn classes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace())
            .into_iter()
            .flatten()
    }
}

#[derive(Debug)]
struct DocumentState {
    url: String,
    document_id: u64,
    ready: ReadyState,
    nodes: Vec<Node>,
    roots: Vec<usize>,
    reactions: HashMap<(NodeRef, DomEvent), Vec<Reaction>>,
    actions: Vec<RecordedAction>,
    unavailable: Option<DomError>,
}

/// A frame document living in memory.
#[derive(Debug)]
pub struct MemoryDocument {
    state: Mutex<DocumentState>,
}

impl MemoryDocument {
    /// Empty, fully loaded document at `url`.
    pub fn new(url: &str) -> Self {
        Self {
            state: Mutex::new(DocumentState {
                url: url.to_string(),
                document_id: 1,
                ready: ReadyState::Complete,
                nodes: Vec::new(),
                roots: Vec::new(),
                reactions: HashMap::new(),
                actions: Vec::new(),
                unavailable: None,
            }),
        }
    }

    /// Append an element under `parent` (or at the top level).
    pub fn append(&self, parent: Option<NodeRef>, element: Element) -> NodeRef {
        let mut state = self.state.lock();
        let index = state.nodes.len();
        let parent_index = parent.and_then(|p| Self::index_of(&state, p).ok());
        let attributes: HashMap<String, String> = element.attributes.into_iter().collect();
        let value = match element.value {
            Some(value) => value,
            None if element.tag == "SELECT" => element.options.first().cloned().unwrap_or_default(),
            None => attributes.get("value").cloned().unwrap_or_default(),
        };

        state.nodes.push(Node {
            tag: element.tag,
            attributes,
            text: element.text,
            checked: element.checked,
            value,
            click_handler: element.click_handler,
            options: element.options,
            parent: parent_index,
            children: Vec::new(),
        });

        match parent_index {
            Some(p) => state.nodes[p].children.push(index),
            None => state.roots.push(index),
        }

        NodeRef(index as u64 + 1)
    }

    /// Register a reaction to an event on `node`.
    pub fn on(&self, node: NodeRef, event: DomEvent, reaction: Reaction) {
        self.state
            .lock()
            .reactions
            .entry((node, event))
            .or_default()
            .push(reaction);
    }

    pub fn set_ready_state(&self, ready: ReadyState) {
        self.state.lock().ready = ready;
    }

    /// Make every read fail with `error` until cleared with `None`.
    pub fn set_unavailable(&self, error: Option<DomError>) {
        self.state.lock().unavailable = error;
    }

    /// Load a fresh document at `url`, keeping the element tree.
    pub fn navigate(&self, url: &str) {
        let mut state = self.state.lock();
        state.url = url.to_string();
        state.document_id += 1;
    }

    /// Load a fresh document at the current URL.
    pub fn reload(&self) {
        self.state.lock().document_id += 1;
    }

    pub fn url(&self) -> String {
        self.state.lock().url.clone()
    }

    pub fn document_id(&self) -> u64 {
        self.state.lock().document_id
    }

    fn inspect<T: Default>(&self, node: NodeRef, f: impl FnOnce(&Node) -> T) -> T {
        let state = self.state.lock();
        Self::index_of(&state, node)
            .map(|index| f(&state.nodes[index]))
            .unwrap_or_default()
    }

    pub fn is_checked(&self, node: NodeRef) -> bool {
        self.inspect(node, |n| n.checked)
    }

    pub fn value_of(&self, node: NodeRef) -> String {
        self.inspect(node, |n| n.value.clone())
    }

    /// Class attribute of a node.
    pub fn classes_of(&self, node: NodeRef) -> Vec<String> {
        self.inspect(node, |n| n.classes().map(str::to_string).collect())
    }

    /// Every mutation performed so far, in order.
    pub fn actions(&self) -> Vec<RecordedAction> {
        self.state.lock().actions.clone()
    }

    fn check_available(state: &DocumentState) -> Result<(), DomError> {
        match &state.unavailable {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn index_of(state: &DocumentState, node: NodeRef) -> Result<usize, DomError> {
        let index = node.0.checked_sub(1).ok_or(DomError::Detached(node))? as usize;
        if index < state.nodes.len() {
            Ok(index)
        } else {
            Err(DomError::Detached(node))
        }
    }

    fn text_content(state: &DocumentState, index: usize) -> String {
        let node = &state.nodes[index];
        let mut text = node.text.clone();
        for &child in &node.children {
            text.push_str(&Self::text_content(state, child));
        }
        text
    }

    fn document_order(state: &DocumentState) -> Vec<usize> {
        fn visit(state: &DocumentState, index: usize, out: &mut Vec<usize>) {
            out.push(index);
            for &child in &state.nodes[index].children {
                visit(state, child, out);
            }
        }
        let mut out = Vec::with_capacity(state.nodes.len());
        for &root in &state.roots {
            visit(state, root, &mut out);
        }
        out
    }

    fn snapshot(state: &DocumentState, index: usize) -> ElementSnapshot {
        let node = &state.nodes[index];
        ElementSnapshot {
            node: NodeRef(index as u64 + 1),
            tag: node.tag.clone(),
            attributes: node.attributes.clone(),
            text: Self::text_content(state, index).trim().to_string(),
            value: node.value.clone(),
            checked: node.checked,
            has_click_handler: node.click_handler,
            parent_classes: node
                .parent
                .map(|p| state.nodes[p].classes().map(str::to_string).collect())
                .unwrap_or_default(),
            option_count: node.options.len(),
        }
    }

    fn react(state: &mut DocumentState, node: NodeRef, event: DomEvent) {
        let reactions = state.reactions.get(&(node, event)).cloned().unwrap_or_default();
        for reaction in reactions {
            match reaction {
                Reaction::Reload => state.document_id += 1,
                Reaction::Navigate(url) => {
                    state.url = url;
                    state.document_id += 1;
                }
                Reaction::SetOptions { select, options } => {
                    if let Ok(index) = Self::index_of(state, select) {
                        let target = &mut state.nodes[index];
                        target.value = options.first().cloned().unwrap_or_default();
                        target.options = options;
                    }
                }
            }
        }
    }
}

#[async_trait]
impl FrameDocument for MemoryDocument {
    async fn location(&self) -> Result<FrameLocation, DomError> {
        let state = self.state.lock();
        Self::check_available(&state)?;
        Ok(FrameLocation {
            url: state.url.clone(),
            document_id: state.document_id,
        })
    }

    async fn ready_state(&self) -> Result<ReadyState, DomError> {
        let state = self.state.lock();
        Self::check_available(&state)?;
        Ok(state.ready)
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>, DomError> {
        let state = self.state.lock();
        Self::check_available(&state)?;
        let selectors = selector::parse(selector)?;
        Ok(Self::document_order(&state)
            .into_iter()
            .filter(|&index| selectors.iter().any(|s| selector::matches(&state, s, index)))
            .map(|index| Self::snapshot(&state, index))
            .collect())
    }

    async fn set_checked(&self, node: NodeRef, checked: bool) -> Result<(), DomError> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;
        let index = Self::index_of(&state, node)?;
        state.nodes[index].checked = checked;
        state.actions.push(RecordedAction::Checked(node, checked));
        Ok(())
    }

    async fn add_parent_class(&self, node: NodeRef, class: &str) -> Result<(), DomError> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;
        let index = Self::index_of(&state, node)?;
        if let Some(parent) = state.nodes[index].parent {
            let classes = state.nodes[parent].attributes.entry("class".to_string()).or_default();
            if !classes.split_whitespace().any(|c| c == class) {
                if !classes.is_empty() {
                    classes.push(' ');
                }
                classes.push_str(class);
            }
        }
        state
            .actions
            .push(RecordedAction::ParentClassAdded(node, class.to_string()));
        Ok(())
    }

    async fn set_value(&self, node: NodeRef, value: &str) -> Result<String, DomError> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;
        let index = Self::index_of(&state, node)?;
        let target = &mut state.nodes[index];
        target.value = if target.tag != "SELECT" || target.options.iter().any(|o| o == value) {
            value.to_string()
        } else {
            String::new()
        };
        let effective = target.value.clone();
        state
            .actions
            .push(RecordedAction::ValueSet(node, value.to_string()));
        Ok(effective)
    }

    async fn dispatch_event(&self, node: NodeRef, event: DomEvent) -> Result<(), DomError> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;
        Self::index_of(&state, node)?;
        state.actions.push(RecordedAction::Dispatched(node, event));
        Self::react(&mut state, node, event);
        Ok(())
    }

    async fn click(&self, node: NodeRef) -> Result<(), DomError> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;
        Self::index_of(&state, node)?;
        state.actions.push(RecordedAction::Clicked(node));
        Self::react(&mut state, node, DomEvent::Click);
        Ok(())
    }
}

mod selector {
    use super::DocumentState;
    use crate::error::DomError;

    #[derive(Debug, Default)]
    pub(super) struct Compound {
        tag: Option<String>,
        id: Option<String>,
        classes: Vec<String>,
        attrs: Vec<(String, Option<String>)>,
    }

    /// Descendant chain, outermost first.
    pub(super) type Complex = Vec<Compound>;

    pub(super) fn parse(input: &str) -> Result<Vec<Complex>, DomError> {
        split_top_level(input, |c| c == ',')
            .into_iter()
            .map(|group| {
                let parts = split_top_level(&group, char::is_whitespace);
                let compounds = parts
                    .iter()
                    .filter(|p| !p.is_empty())
                    .map(|p| parse_compound(p))
                    .collect::<Result<Vec<_>, _>>()?;
                if compounds.is_empty() {
                    return Err(invalid(input));
                }
                Ok(compounds)
            })
            .collect()
    }

    fn invalid(input: &str) -> DomError {
        DomError::Script(format!("'{}' is not a valid selector", input))
    }

    /// Split on `sep` outside brackets and quotes.
    fn split_top_level(input: &str, sep: impl Fn(char) -> bool) -> Vec<String> {
        let mut parts = Vec::new();
        let mut current = String::new();
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut escaped = false;

        for c in input.chars() {
            if escaped {
                current.push(c);
                escaped = false;
                continue;
            }
            match (quote, c) {
                (_, '\\') => {
                    current.push(c);
                    escaped = true;
                }
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
                    depth = depth.saturating_sub(1);
                    current.push(c);
                }
                (None, _) if depth == 0 && sep(c) => {
                    parts.push(std::mem::take(&mut current).trim().to_string());
                }
                _ => current.push(c),
            }
        }
        parts.push(current.trim().to_string());
        parts
    }

    fn is_ident(c: char) -> bool {
        c.is_alphanumeric() || c == '-' || c == '_'
    }

    fn parse_compound(input: &str) -> Result<Compound, DomError> {
        let chars: Vec<char> = input.chars().collect();
        let mut compound = Compound::default();
        let mut i = 0;

        let read_ident = |i: &mut usize| -> String {
            let start = *i;
            while *i < chars.len() && is_ident(chars[*i]) {
                *i += 1;
            }
            chars[start..*i].iter().collect()
        };

        if i < chars.len() && chars[i] == '*' {
            i += 1;
        } else if i < chars.len() && is_ident(chars[i]) {
            compound.tag = Some(read_ident(&mut i).to_ascii_uppercase());
        }

        while i < chars.len() {
            match chars[i] {
                '#' => {
                    i += 1;
                    compound.id = Some(read_ident(&mut i));
                }
                '.' => {
                    i += 1;
                    compound.classes.push(read_ident(&mut i));
                }
                '[' => {
                    i += 1;
                    let name = read_ident(&mut i);
                    if name.is_empty() || i >= chars.len() {
                        return Err(invalid(input));
                    }
                    let value = if chars[i] == '=' {
                        i += 1;
                        let mut value = String::new();
                        if i < chars.len() && (chars[i] == '"' || chars[i] == '\'') {
                            let q = chars[i];
                            i += 1;
                            while i < chars.len() && chars[i] != q {
                                if chars[i] == '\\' && i + 1 < chars.len() {
                                    i += 1;
                                }
                                value.push(chars[i]);
                                i += 1;
                            }
                            i += 1;
                        } else {
                            while i < chars.len() && chars[i] != ']' {
                                value.push(chars[i]);
                                i += 1;
                            }
                        }
                        Some(value)
                    } else {
                        None
                    };
                    if i >= chars.len() || chars[i] != ']' {
                        return Err(invalid(input));
                    }
                    i += 1;
                    compound.attrs.push((name, value));
                }
                _ => return Err(invalid(input)),
            }
        }

        Ok(compound)
    }

    fn matches_compound(state: &DocumentState, compound: &Compound, index: usize) -> bool {
        let node = &state.nodes[index];
        if let Some(tag) = &compound.tag {
            if &node.tag != tag {
                return false;
            }
        }
        if let Some(id) = &compound.id {
            if node.attributes.get("id") != Some(id) {
                return false;
            }
        }
        if !compound
            .classes
            .iter()
            .all(|class| node.classes().any(|c| c == class))
        {
            return false;
        }
        compound.attrs.iter().all(|(name, value)| match value {
            Some(v) => node.attributes.get(name) == Some(v),
            None => node.attributes.contains_key(name),
        })
    }

    pub(super) fn matches(state: &DocumentState, complex: &Complex, index: usize) -> bool {
        let Some((last, ancestors)) = complex.split_last() else {
            return false;
        };
        if !matches_compound(state, last, index) {
            return false;
        }

        let mut current = state.nodes[index].parent;
        for compound in ancestors.iter().rev() {
            loop {
                match current {
                    Some(p) if matches_compound(state, compound, p) => {
                        current = state.nodes[p].parent;
                        break;
                    }
                    Some(p) => current = state.nodes[p].parent,
                    None => return false,
                }
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
