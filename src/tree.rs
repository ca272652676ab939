//! Document tree built from scanner events.
//!
//! The builder replays the event stream onto an owned stack of in-progress
//! containers: begin-events push, end-events pop the finished node and attach
//! it to the new stack top. Property spans are the subtle part — a property
//! only finishes once its value finishes (or a `,` / closing delimiter proves
//! the value never arrived), so every value-completion path also checks
//! whether it just closed the enclosing property.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::scanner::{self, ErrorCode, Event, Literal};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Sentinel for a span length not yet resolved by a closing event.
pub const UNRESOLVED: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Array,
    Property,
    Boolean,
    Number,
    String,
    Null,
}

impl NodeKind {
    fn of_literal(literal: &Literal) -> Self {
        match literal {
            Literal::Bool(_) => NodeKind::Boolean,
            Literal::Number(_) => NodeKind::Number,
            Literal::Str(_) => NodeKind::String,
            Literal::Null => NodeKind::Null,
        }
    }

    /// JSON Schema `type` name for a value node of this kind.
    pub fn schema_type(self) -> &'static str {
        match self {
            NodeKind::Object | NodeKind::Property => "object",
            NodeKind::Array => "array",
            NodeKind::Boolean => "boolean",
            NodeKind::Number => "number",
            NodeKind::String => "string",
            NodeKind::Null => "null",
        }
    }
}

/// One element of the document tree. Containers and properties own their
/// children; a property always carries its synthetic string key child first
/// and (in well-formed input) its value child second.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub offset: usize,
    /// Byte length of the source span; [`UNRESOLVED`] until the closing
    /// event has been observed.
    pub length: usize,
    pub children: Vec<Node>,
    /// Cleaned comment lines attached to this node (objects and properties).
    pub comment: Vec<String>,
    /// Parsed literal; present on literal-kind nodes only.
    pub value: Option<Literal>,
    /// Offset of the `:` separator, recorded on property nodes.
    pub colon_offset: Option<usize>,
}

impl Node {
    fn new(kind: NodeKind, offset: usize) -> Self {
        Self {
            kind,
            offset,
            length: UNRESOLVED,
            children: Vec::new(),
            comment: Vec::new(),
            value: None,
            colon_offset: None,
        }
    }

    /// Key text of a property node.
    pub fn key(&self) -> Option<&str> {
        match self.children.first()?.value.as_ref()? {
            Literal::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Value child of a property node; `None` on other kinds and on
    /// malformed properties whose value never arrived.
    pub fn value_child(&self) -> Option<&Node> {
        if self.kind == NodeKind::Property {
            self.children.get(1)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IssueKind {
    #[error("{0}")]
    Syntax(ErrorCode),
    #[error("node span left unresolved at end of input")]
    UnresolvedSpan,
    #[error("property is missing its value")]
    MissingPropertyValue,
}

/// A recorded problem; construction never aborts on these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Issue {
    pub kind: IssueKind,
    pub offset: usize,
    pub length: usize,
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY POINTS
// ————————————————————————————————————————————————————————————————————————————

/// Scan `src` and build its document tree. Always returns a best-effort
/// tree; problems end up in the issue list.
pub fn parse_tree(src: &str) -> (Node, Vec<Issue>) {
    let events = scanner::scan(src);
    build(src, events)
}

/// Replay an event stream into a tree. The synthetic root is an array-kind
/// container holding the document's single top-level value.
pub fn build(src: &str, events: Vec<Event>) -> (Node, Vec<Issue>) {
    let mut builder = TreeBuilder {
        src,
        stack: vec![Node::new(NodeKind::Array, 0)],
        pending_comments: Vec::new(),
        issues: Vec::new(),
    };
    for event in events {
        builder.on_event(event);
    }
    builder.finish()
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

static LINE_COMMENT_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^//\s*").unwrap());
static BLOCK_COMMENT_WRAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/\*\s*|\s*\*/$").unwrap());

fn clean_comment(raw: &str) -> String {
    if raw.starts_with("//") {
        LINE_COMMENT_PREFIX.replace(raw, "").into_owned()
    } else {
        BLOCK_COMMENT_WRAP.replace_all(raw, "").trim().to_string()
    }
}

struct TreeBuilder<'a> {
    src: &'a str,
    /// In-progress containers; index 0 is the synthetic root.
    stack: Vec<Node>,
    /// Comment lines waiting for the next object or property node.
    pending_comments: Vec<String>,
    issues: Vec<Issue>,
}

impl<'a> TreeBuilder<'a> {
    fn on_event(&mut self, event: Event) {
        match event {
            Event::ObjectBegin { offset } => self.begin_container(NodeKind::Object, offset),
            Event::ArrayBegin { offset } => self.begin_container(NodeKind::Array, offset),
            Event::ObjectEnd { offset, length } | Event::ArrayEnd { offset, length } => {
                self.end_container(offset + length);
            }
            Event::Property { name, offset, length } => self.begin_property(name, offset, length),
            Event::Literal { value, offset, length } => self.on_literal(value, offset, length),
            Event::Separator { ch, offset } => self.on_separator(ch, offset),
            Event::Comment { offset, length } => self.on_comment(offset, length),
            Event::Error { code, offset, length } => {
                self.issues.push(Issue { kind: IssueKind::Syntax(code), offset, length });
            }
        }
    }

    fn top_is(&self, kind: NodeKind) -> bool {
        matches!(self.stack.last(), Some(node) if node.kind == kind)
    }

    /// Pop the stack top, resolve its length against `end`, and attach it as
    /// the next child of the new top. This is where parent/child links form.
    fn complete_top(&mut self, end: usize) {
        if self.stack.len() <= 1 {
            return;
        }
        let Some(mut node) = self.stack.pop() else {
            return;
        };
        node.length = end.saturating_sub(node.offset);
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
        }
    }

    /// A finished value also finishes its enclosing property; the property's
    /// span ends where the value's span ends.
    fn complete_property(&mut self, end: usize) {
        if self.top_is(NodeKind::Property) {
            self.complete_top(end);
        }
    }

    fn begin_container(&mut self, kind: NodeKind, offset: usize) {
        let mut node = Node::new(kind, offset);
        // arrays do not receive comments; the buffer keeps waiting
        if kind == NodeKind::Object {
            node.comment = std::mem::take(&mut self.pending_comments);
        }
        self.stack.push(node);
    }

    fn end_container(&mut self, end: usize) {
        // a property still open here never got its value, e.g. `{"a":}`;
        // close it at the delimiter so the container's own pop lines up
        if self.top_is(NodeKind::Property) {
            self.complete_top(end);
        }
        self.complete_top(end);
        self.complete_property(end);
    }

    fn begin_property(&mut self, name: String, offset: usize, length: usize) {
        let mut property = Node::new(NodeKind::Property, offset);
        property.comment = std::mem::take(&mut self.pending_comments);
        let mut key = Node::new(NodeKind::String, offset);
        key.length = length;
        key.value = Some(Literal::Str(name));
        property.children.push(key);
        self.stack.push(property);
    }

    fn on_literal(&mut self, value: Literal, offset: usize, length: usize) {
        let mut node = Node::new(NodeKind::of_literal(&value), offset);
        node.length = length;
        node.value = Some(value);
        if let Some(top) = self.stack.last_mut() {
            top.children.push(node);
        }
        self.complete_property(offset + length);
    }

    fn on_separator(&mut self, ch: char, offset: usize) {
        if !self.top_is(NodeKind::Property) {
            return;
        }
        if ch == ':' {
            if let Some(top) = self.stack.last_mut() {
                top.colon_offset = Some(offset);
            }
        } else if ch == ',' {
            // alternate completion point for a property whose value was never
            // appended (the usual paths complete at the value's own end)
            self.complete_top(offset);
        }
    }

    fn on_comment(&mut self, offset: usize, length: usize) {
        let text = clean_comment(&self.src[offset..offset + length]);
        // a comment on the same line as the property it follows documents
        // that property; everything else waits for the next node
        if let Some(top) = self.stack.last_mut() {
            if let Some(last) = top.children.last_mut() {
                if last.kind == NodeKind::Property
                    && last.length != UNRESOLVED
                    && last.offset + last.length <= offset
                    && !self.src[last.offset + last.length..offset].contains('\n')
                {
                    last.comment.push(text);
                    return;
                }
            }
        }
        self.pending_comments.push(text);
    }

    fn finish(mut self) -> (Node, Vec<Issue>) {
        let end = self.src.len();
        // anything still open means the event source stopped short; close at
        // end of input and say so
        while self.stack.len() > 1 {
            if let Some(node) = self.stack.last() {
                self.issues.push(Issue {
                    kind: IssueKind::UnresolvedSpan,
                    offset: node.offset,
                    length: 0,
                });
            }
            self.complete_top(end);
        }
        let mut root = match self.stack.pop() {
            Some(root) => root,
            None => Node::new(NodeKind::Array, 0),
        };
        root.length = end;
        verify(&root, &mut self.issues);
        (root, self.issues)
    }
}

/// Post-build consistency pass: unresolved spans and one-legged properties
/// indicate the event source broke its contract.
fn verify(node: &Node, issues: &mut Vec<Issue>) {
    if node.length == UNRESOLVED {
        issues.push(Issue { kind: IssueKind::UnresolvedSpan, offset: node.offset, length: 0 });
    }
    if node.kind == NodeKind::Property && node.children.len() != 2 {
        issues.push(Issue {
            kind: IssueKind::MissingPropertyValue,
            offset: node.offset,
            length: if node.length == UNRESOLVED { 0 } else { node.length },
        });
    }
    for child in &node.children {
        verify(child, issues);
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
