//! Rich-text document model.
//!
//! # Responsibility
//! - Represent rich text as an index arena of typed nodes with inline marks.
//! - Validate that every node respects the shape its kind admits.
//! - Project documents to plain text for previews and cards.
//! - Encode/decode the editor JSON shape (`type`, `attrs`, `marks`,
//!   `content`, `text`).
//!
//! # Invariants
//! - The root node lives at index 0 and a document always has one.
//! - Nodes are only appended under an existing parent, so a child index is
//!   always greater than its parent index and the arena is acyclic.
//! - Projection (`to_plain_text`, `preview`) never mutates the stored tree.
//! - Equality is structural and order-sensitive over kind, attributes,
//!   marks, text and children; it does not depend on arena layout.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use unicode_segmentation::UnicodeSegmentation;

/// Marker appended by [`truncate`] when text is cut.
pub const ELLIPSIS: &str = "…";

const HEADING_LEVEL_MIN: i64 = 1;
const HEADING_LEVEL_MAX: i64 = 6;

/// Index of one node inside its owning [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Node type tag. Names follow the editor JSON (`bulletList`, `hardBreak`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Doc,
    Paragraph,
    Heading,
    Text,
    BulletList,
    OrderedList,
    ListItem,
    Blockquote,
    CodeBlock,
    HardBreak,
    HorizontalRule,
    /// Kind produced by an editor extension this model does not know.
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Block,
    Inline,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Content {
    Blocks,
    Inlines,
    ListItems,
    Leaf,
}

impl NodeKind {
    /// Stable editor name for this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Doc => "doc",
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::Text => "text",
            Self::BulletList => "bulletList",
            Self::OrderedList => "orderedList",
            Self::ListItem => "listItem",
            Self::Blockquote => "blockquote",
            Self::CodeBlock => "codeBlock",
            Self::HardBreak => "hardBreak",
            Self::HorizontalRule => "horizontalRule",
            Self::Other(name) => name.as_str(),
        }
    }

    /// Parses an editor name. Unknown names are kept as [`NodeKind::Other`].
    pub fn parse(value: &str) -> Self {
        match value {
            "doc" => Self::Doc,
            "paragraph" => Self::Paragraph,
            "heading" => Self::Heading,
            "text" => Self::Text,
            "bulletList" => Self::BulletList,
            "orderedList" => Self::OrderedList,
            "listItem" => Self::ListItem,
            "blockquote" => Self::Blockquote,
            "codeBlock" => Self::CodeBlock,
            "hardBreak" => Self::HardBreak,
            "horizontalRule" => Self::HorizontalRule,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether this kind can never have children.
    pub fn is_leaf(&self) -> bool {
        self.content() == Content::Leaf
    }

    fn flow(&self) -> Flow {
        match self {
            Self::Text | Self::HardBreak => Flow::Inline,
            Self::Other(_) => Flow::Unknown,
            _ => Flow::Block,
        }
    }

    fn content(&self) -> Content {
        match self {
            Self::Doc | Self::Blockquote | Self::ListItem => Content::Blocks,
            Self::Paragraph | Self::Heading | Self::CodeBlock => Content::Inlines,
            Self::BulletList | Self::OrderedList => Content::ListItems,
            Self::Text | Self::HardBreak | Self::HorizontalRule | Self::Other(_) => Content::Leaf,
        }
    }

    fn admits_child(&self, child: &NodeKind) -> bool {
        match self.content() {
            Content::Blocks => child.flow() == Flow::Block && *child != NodeKind::Doc,
            Content::Inlines => child.flow() == Flow::Inline,
            Content::ListItems => *child == NodeKind::ListItem,
            Content::Leaf => false,
        }
    }

    fn allowed_attributes(&self) -> &'static [&'static str] {
        match self {
            Self::Heading => &["level", "textAlign"],
            Self::Paragraph => &["textAlign"],
            Self::OrderedList => &["start"],
            Self::CodeBlock => &["language"],
            _ => &[],
        }
    }
}

/// Primitive attribute value carried by nodes and marks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl AttrValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(number) => number.as_i64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Inline style tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarkKind {
    Bold,
    Italic,
    Strike,
    Code,
    Link,
    Other(String),
}

impl MarkKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Strike => "strike",
            Self::Code => "code",
            Self::Link => "link",
            Self::Other(name) => name.as_str(),
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "bold" => Self::Bold,
            "italic" => Self::Italic,
            "strike" => Self::Strike,
            "code" => Self::Code,
            "link" => Self::Link,
            other => Self::Other(other.to_string()),
        }
    }

    fn allowed_attributes(&self) -> &'static [&'static str] {
        match self {
            Self::Link => &["href", "target", "rel", "class"],
            _ => &[],
        }
    }
}

/// Inline mark attached to a text run. Link marks carry `href`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    kind: MarkKind,
    attrs: BTreeMap<String, AttrValue>,
}

impl Mark {
    pub fn new(kind: MarkKind) -> Self {
        Self {
            kind,
            attrs: BTreeMap::new(),
        }
    }

    pub fn bold() -> Self {
        Self::new(MarkKind::Bold)
    }

    pub fn italic() -> Self {
        Self::new(MarkKind::Italic)
    }

    pub fn strike() -> Self {
        Self::new(MarkKind::Strike)
    }

    /// Link mark pointing at `href`.
    pub fn link(href: impl Into<String>) -> Self {
        Self::new(MarkKind::Link).with_attr("href", href.into())
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn kind(&self) -> &MarkKind {
        &self.kind
    }

    pub fn attrs(&self) -> &BTreeMap<String, AttrValue> {
        &self.attrs
    }

    /// Link target, when this is a link mark with a textual `href`.
    pub fn href(&self) -> Option<&str> {
        if self.kind != MarkKind::Link {
            return None;
        }
        self.attrs.get("href").and_then(AttrValue::as_str)
    }
}

/// One element of a document tree.
///
/// Children are arena indices and can only be attached through
/// [`Document::append`].
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    attrs: BTreeMap<String, AttrValue>,
    marks: Vec<Mark>,
    children: Vec<NodeId>,
    text: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attrs: BTreeMap::new(),
            marks: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Text leaf holding `value`.
    pub fn text_run(value: impl Into<String>) -> Self {
        let mut node = Self::new(NodeKind::Text);
        node.text = Some(value.into());
        node
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.marks.push(mark);
        self
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn attrs(&self) -> &BTreeMap<String, AttrValue> {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    fn same_content(&self, other: &Node) -> bool {
        self.kind == other.kind
            && self.attrs == other.attrs
            && self.marks == other.marks
            && self.text == other.text
            && self.children.len() == other.children.len()
    }
}

/// What is wrong with one node of a malformed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeViolation {
    RootNotDoc(String),
    NestedDoc,
    UnknownKind(String),
    ChildrenOnLeaf,
    IllegalChild { parent: String, child: String },
    MissingText,
    EmptyText,
    UnexpectedText,
    UnexpectedMarks,
    UnknownMark(String),
    LinkWithoutHref,
    UnexpectedAttribute(String),
    MissingAttribute(&'static str),
    InvalidAttribute {
        name: &'static str,
        reason: &'static str,
    },
    DanglingChild(usize),
    BackReference(usize),
    SharedNode(usize),
    UnreachableNode(usize),
    UnknownParent(usize),
}

impl Display for ShapeViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RootNotDoc(kind) => write!(f, "root must be `doc`, found `{kind}`"),
            Self::NestedDoc => write!(f, "`doc` is only allowed at the root"),
            Self::UnknownKind(kind) => write!(f, "unknown node kind `{kind}`"),
            Self::ChildrenOnLeaf => write!(f, "leaf node must not have children"),
            Self::IllegalChild { parent, child } => {
                write!(f, "`{parent}` does not admit `{child}` children")
            }
            Self::MissingText => write!(f, "text node must carry text"),
            Self::EmptyText => write!(f, "text node must not be empty"),
            Self::UnexpectedText => write!(f, "only text nodes may carry text"),
            Self::UnexpectedMarks => write!(f, "only text nodes may carry marks"),
            Self::UnknownMark(kind) => write!(f, "unknown mark `{kind}`"),
            Self::LinkWithoutHref => write!(f, "link mark requires a textual `href`"),
            Self::UnexpectedAttribute(name) => write!(f, "attribute `{name}` is not allowed"),
            Self::MissingAttribute(name) => write!(f, "attribute `{name}` is required"),
            Self::InvalidAttribute { name, reason } => {
                write!(f, "attribute `{name}` is invalid: {reason}")
            }
            Self::DanglingChild(index) => write!(f, "child #{index} does not exist"),
            Self::BackReference(index) => write!(f, "child #{index} points backwards"),
            Self::SharedNode(index) => write!(f, "node #{index} has more than one parent"),
            Self::UnreachableNode(index) => write!(f, "node #{index} is not reachable from root"),
            Self::UnknownParent(index) => write!(f, "parent #{index} does not exist"),
        }
    }
}

/// Malformed document tree, naming the offending node path.
///
/// Paths read `doc/<i>/<j>` where each segment is a child position; nodes
/// that cannot be located by position are written as `#<index>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeError {
    path: String,
    violation: ShapeViolation,
}

impl ShapeError {
    fn at(path: &[usize], violation: ShapeViolation) -> Self {
        Self {
            path: format_path(path),
            violation,
        }
    }

    fn at_index(index: usize, violation: ShapeViolation) -> Self {
        Self {
            path: format!("#{index}"),
            violation,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn violation(&self) -> &ShapeViolation {
        &self.violation
    }
}

impl Display for ShapeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.violation)
    }
}

impl Error for ShapeError {}

fn format_path(path: &[usize]) -> String {
    let mut out = String::from("doc");
    for position in path {
        out.push('/');
        out.push_str(&position.to_string());
    }
    out
}

/// Rich-text tree stored as a node arena.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Bare `doc` root without children.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Doc)],
        }
    }

    /// The editor's empty state: a `doc` holding one empty paragraph.
    pub fn empty() -> Self {
        let mut document = Self::new();
        document.attach(0, Node::new(NodeKind::Paragraph));
        document
    }

    /// One paragraph per input line; empty lines become empty paragraphs.
    pub fn from_plain_text(text: &str) -> Self {
        let mut document = Self::new();
        for line in text.split('\n') {
            let paragraph = document.attach(0, Node::new(NodeKind::Paragraph));
            if !line.is_empty() {
                document.attach(paragraph, Node::text_run(line));
            }
        }
        document
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Number of nodes in the arena, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Appends `node` as the last child of `parent`.
    ///
    /// Shape is not checked here; call [`Document::validate`] once the tree
    /// is complete.
    pub fn append(&mut self, parent: NodeId, node: Node) -> Result<NodeId, ShapeError> {
        if parent.0 >= self.nodes.len() {
            return Err(ShapeError::at_index(
                parent.0,
                ShapeViolation::UnknownParent(parent.0),
            ));
        }
        Ok(NodeId(self.attach(parent.0, node)))
    }

    fn attach(&mut self, parent: usize, mut node: Node) -> usize {
        node.children.clear();
        let index = self.nodes.len();
        self.nodes.push(node);
        self.nodes[parent].children.push(NodeId(index));
        index
    }

    /// Checks every node against the shape its kind admits.
    ///
    /// Errors are reported for the first offending node in document order.
    pub fn validate(&self) -> Result<(), ShapeError> {
        let mut visited = vec![false; self.nodes.len()];
        let mut pending: Vec<(usize, Vec<usize>)> = vec![(0, Vec::new())];

        while let Some((index, path)) = pending.pop() {
            let Some(node) = self.nodes.get(index) else {
                return Err(ShapeError::at(&path, ShapeViolation::DanglingChild(index)));
            };
            if visited[index] {
                return Err(ShapeError::at(&path, ShapeViolation::SharedNode(index)));
            }
            visited[index] = true;
            check_node(index, node, &path)?;

            for (position, child) in node.children.iter().enumerate().rev() {
                let mut child_path = path.clone();
                child_path.push(position);
                let Some(child_node) = self.nodes.get(child.0) else {
                    return Err(ShapeError::at(
                        &child_path,
                        ShapeViolation::DanglingChild(child.0),
                    ));
                };
                if child.0 <= index {
                    return Err(ShapeError::at(
                        &child_path,
                        ShapeViolation::BackReference(child.0),
                    ));
                }
                // Unknown children report their own kind when visited.
                let unknown = matches!(child_node.kind, NodeKind::Other(_));
                if !unknown && !node.kind.is_leaf() && !node.kind.admits_child(&child_node.kind) {
                    return Err(ShapeError::at(
                        &child_path,
                        ShapeViolation::IllegalChild {
                            parent: node.kind.as_str().to_string(),
                            child: child_node.kind.as_str().to_string(),
                        },
                    ));
                }
                pending.push((child.0, child_path));
            }
        }

        if let Some(orphan) = visited.iter().position(|seen| !seen) {
            return Err(ShapeError::at_index(
                orphan,
                ShapeViolation::UnreachableNode(orphan),
            ));
        }
        Ok(())
    }

    /// Plain-text projection.
    ///
    /// Inline runs are concatenated, sibling blocks with non-empty text are
    /// separated by `\n`, hard breaks emit `\n` and unknown kinds are
    /// skipped. Never fails.
    pub fn to_plain_text(&self) -> String {
        let Some(root) = self.nodes.first() else {
            return String::new();
        };
        match root.kind.flow() {
            Flow::Block => self.block_text(0),
            Flow::Inline => {
                let mut out = String::new();
                push_inline(root, &mut out);
                out
            }
            Flow::Unknown => String::new(),
        }
    }

    /// Plain text cut to `max_len` graphemes, used by card previews.
    pub fn preview(&self, max_len: usize) -> String {
        truncate(&self.to_plain_text(), max_len)
    }

    /// True when the tree holds nothing but empty paragraphs.
    pub fn is_blank(&self) -> bool {
        self.nodes.iter().enumerate().all(|(index, node)| {
            if index == 0 {
                node.kind == NodeKind::Doc
            } else {
                node.kind == NodeKind::Paragraph && node.children.is_empty()
            }
        })
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json_str(value: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(value)
    }

    fn block_text(&self, index: usize) -> String {
        let mut segments: Vec<String> = Vec::new();
        let mut run = String::new();

        for child in &self.nodes[index].children {
            let Some(node) = self.nodes.get(child.0) else {
                continue;
            };
            match node.kind.flow() {
                Flow::Inline => push_inline(node, &mut run),
                Flow::Block if child.0 > index => {
                    flush_run(&mut run, &mut segments);
                    let text = self.block_text(child.0);
                    if !text.is_empty() {
                        segments.push(text);
                    }
                }
                Flow::Block | Flow::Unknown => {}
            }
        }
        flush_run(&mut run, &mut segments);
        segments.join("\n")
    }

    fn to_json_node(&self, index: usize) -> JsonNode {
        let node = &self.nodes[index];
        JsonNode {
            kind: node.kind.as_str().to_string(),
            attrs: node.attrs.clone(),
            marks: node
                .marks
                .iter()
                .map(|mark| JsonMark {
                    kind: mark.kind.as_str().to_string(),
                    attrs: mark.attrs.clone(),
                })
                .collect(),
            content: node
                .children
                .iter()
                .filter(|child| child.0 > index)
                .map(|child| self.to_json_node(child.0))
                .collect(),
            text: node.text.clone(),
        }
    }

    fn from_json_node(root: JsonNode) -> Self {
        let mut document = Self { nodes: Vec::new() };
        document.push_json(None, root);
        document
    }

    fn push_json(&mut self, parent: Option<usize>, source: JsonNode) {
        let index = self.nodes.len();
        self.nodes.push(Node {
            kind: NodeKind::parse(&source.kind),
            attrs: source.attrs,
            marks: source
                .marks
                .into_iter()
                .map(|mark| Mark {
                    kind: MarkKind::parse(&mark.kind),
                    attrs: mark.attrs,
                })
                .collect(),
            children: Vec::new(),
            text: source.text,
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(NodeId(index));
        }
        for child in source.content {
            self.push_json(Some(index), child);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(0usize, 0usize)];
        while let Some((left, right)) = pending.pop() {
            let (Some(a), Some(b)) = (self.nodes.get(left), other.nodes.get(right)) else {
                return false;
            };
            if !a.same_content(b) {
                return false;
            }
            pending.extend(
                a.children
                    .iter()
                    .zip(&b.children)
                    .map(|(x, y)| (x.0, y.0)),
            );
        }
        true
    }
}

impl Eq for Document {}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_node(0).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        JsonNode::deserialize(deserializer).map(Self::from_json_node)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonNode {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attrs: BTreeMap<String, AttrValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    marks: Vec<JsonMark>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    content: Vec<JsonNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonMark {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attrs: BTreeMap<String, AttrValue>,
}

fn push_inline(node: &Node, out: &mut String) {
    match node.kind {
        NodeKind::Text => {
            if let Some(text) = node.text.as_deref() {
                out.push_str(text);
            }
        }
        NodeKind::HardBreak => out.push('\n'),
        _ => {}
    }
}

fn flush_run(run: &mut String, segments: &mut Vec<String>) {
    if !run.is_empty() {
        segments.push(std::mem::take(run));
    }
}

fn check_node(index: usize, node: &Node, path: &[usize]) -> Result<(), ShapeError> {
    let fail = |violation| Err(ShapeError::at(path, violation));

    if index == 0 && node.kind != NodeKind::Doc {
        return fail(ShapeViolation::RootNotDoc(node.kind.as_str().to_string()));
    }
    if index != 0 && node.kind == NodeKind::Doc {
        return fail(ShapeViolation::NestedDoc);
    }
    if let NodeKind::Other(name) = &node.kind {
        return fail(ShapeViolation::UnknownKind(name.clone()));
    }
    if node.kind.is_leaf() && !node.children.is_empty() {
        return fail(ShapeViolation::ChildrenOnLeaf);
    }

    match (&node.kind, node.text.as_deref()) {
        (NodeKind::Text, None) => return fail(ShapeViolation::MissingText),
        (NodeKind::Text, Some("")) => return fail(ShapeViolation::EmptyText),
        (NodeKind::Text, Some(_)) | (_, None) => {}
        (_, Some(_)) => return fail(ShapeViolation::UnexpectedText),
    }

    if node.kind != NodeKind::Text && !node.marks.is_empty() {
        return fail(ShapeViolation::UnexpectedMarks);
    }
    for mark in &node.marks {
        if let MarkKind::Other(name) = &mark.kind {
            return fail(ShapeViolation::UnknownMark(name.clone()));
        }
        if let Some(name) = mark
            .attrs
            .keys()
            .find(|name| !mark.kind.allowed_attributes().contains(&name.as_str()))
        {
            return fail(ShapeViolation::UnexpectedAttribute(name.clone()));
        }
        if mark.kind == MarkKind::Link && mark.href().is_none() {
            return fail(ShapeViolation::LinkWithoutHref);
        }
    }

    check_attributes(node).map_err(|violation| ShapeError::at(path, violation))
}

fn check_attributes(node: &Node) -> Result<(), ShapeViolation> {
    if let Some(name) = node
        .attrs
        .keys()
        .find(|name| !node.kind.allowed_attributes().contains(&name.as_str()))
    {
        return Err(ShapeViolation::UnexpectedAttribute(name.clone()));
    }

    if node.kind == NodeKind::Heading {
        let level = node
            .attr("level")
            .ok_or(ShapeViolation::MissingAttribute("level"))?;
        match level.as_i64() {
            Some(value) if (HEADING_LEVEL_MIN..=HEADING_LEVEL_MAX).contains(&value) => {}
            _ => {
                return Err(ShapeViolation::InvalidAttribute {
                    name: "level",
                    reason: "expected an integer between 1 and 6",
                })
            }
        }
    }

    if let Some(start) = node.attr("start") {
        if !matches!(start.as_i64(), Some(value) if value >= 0) {
            return Err(ShapeViolation::InvalidAttribute {
                name: "start",
                reason: "expected a non-negative integer",
            });
        }
    }

    for name in ["language", "textAlign"] {
        if let Some(value) = node.attr(name) {
            if !matches!(value, AttrValue::Text(_) | AttrValue::Null) {
                return Err(ShapeViolation::InvalidAttribute {
                    name,
                    reason: "expected a string or null",
                });
            }
        }
    }

    Ok(())
}

/// Cuts `text` to at most `max_len` grapheme clusters.
///
/// Text that already fits is returned unchanged; otherwise the first
/// `max_len` graphemes are kept and [`ELLIPSIS`] is appended. Clusters are
/// never split.
pub fn truncate(text: &str, max_len: usize) -> String {
    match text.grapheme_indices(true).nth(max_len) {
        None => text.to_string(),
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + ELLIPSIS.len());
            out.push_str(&text[..cut]);
            out.push_str(ELLIPSIS);
            out
        }
    }
}
