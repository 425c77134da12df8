//! Nodes produced by the lexer and assembled by the scanners
//!
//! Every node records the offsets it was read from. Offsets refer to the decoded characters of
//! the page, which is not kept by the node; ask the parser's page when line information is
//! needed.

pub mod attribute;
pub mod composite;
pub mod tag;

pub use attribute::Attribute;
pub use composite::CompositeTag;
pub use tag::Tag;

use std::fmt;

/// A run of characters between markup
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Text {
    start: usize,
    end: usize,
    text: String,
}

impl Text {
    pub fn new(start: usize, end: usize, text: String) -> Self {
        Self { start, end, text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    /// Returns true when the text only contains whitespace
    pub fn is_whitespace(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }
}

/// A comment (`<!-- ... -->`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Remark {
    start: usize,
    end: usize,
    text: String,
    /// The remark as found in the source, delimiters included
    source: String,
}

impl Remark {
    pub fn new(start: usize, end: usize, text: String, source: String) -> Self {
        Self {
            start,
            end,
            text,
            source,
        }
    }

    /// Contents between the delimiters
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.source = format!("<!--{text}-->");
    }
}

#[derive(Clone, Debug)]
pub enum Node {
    Text(Text),
    Remark(Remark),
    Tag(Tag),
    Composite(CompositeTag),
}

impl Node {
    pub fn start_position(&self) -> usize {
        match self {
            Node::Text(text) => text.start,
            Node::Remark(remark) => remark.start,
            Node::Tag(tag) => tag.start_position(),
            Node::Composite(composite) => composite.start_position(),
        }
    }

    pub fn end_position(&self) -> usize {
        match self {
            Node::Text(text) => text.end,
            Node::Remark(remark) => remark.end,
            Node::Tag(tag) => tag.end_position(),
            Node::Composite(composite) => composite.end_position(),
        }
    }

    /// The tag of a tag node, or the start tag of a composite
    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Node::Tag(tag) => Some(tag),
            Node::Composite(composite) => Some(composite.tag()),
            _ => None,
        }
    }

    pub fn as_tag_mut(&mut self) -> Option<&mut Tag> {
        match self {
            Node::Tag(tag) => Some(tag),
            Node::Composite(composite) => Some(composite.tag_mut()),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeTag> {
        match self {
            Node::Composite(composite) => Some(composite),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_remark(&self) -> Option<&Remark> {
        match self {
            Node::Remark(remark) => Some(remark),
            _ => None,
        }
    }

    /// Children of a composite; other nodes have none
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Composite(composite) => composite.children(),
            _ => &[],
        }
    }

    /// Writes the node as HTML. Verbatim output reproduces the source exactly; otherwise the
    /// markup is generated from the current state and every composite and remark is closed.
    pub fn to_html(&self, verbatim: bool) -> String {
        let mut buf = String::new();
        self.write_html(&mut buf, verbatim);
        buf
    }

    pub(crate) fn write_html(&self, buf: &mut String, verbatim: bool) {
        enum Work<'a> {
            Node(&'a Node),
            End(&'a CompositeTag),
        }

        // walks the tree with its own stack, nesting depth is not bounded by the input
        let mut work = vec![Work::Node(self)];
        while let Some(item) = work.pop() {
            match item {
                Work::Node(Node::Text(text)) => buf.push_str(&text.text),
                Work::Node(Node::Remark(remark)) if verbatim => buf.push_str(&remark.source),
                Work::Node(Node::Remark(remark)) => {
                    buf.push_str("<!--");
                    buf.push_str(&remark.text);
                    buf.push_str("-->");
                }
                Work::Node(Node::Tag(tag)) => tag.write_html(buf, verbatim),
                Work::Node(Node::Composite(composite)) => {
                    composite.tag().write_html(buf, verbatim);
                    work.push(Work::End(composite));
                    work.extend(composite.children().iter().rev().map(Work::Node));
                }
                Work::End(composite) => composite.write_end_html(buf, verbatim),
            }
        }
    }

    /// Text content of the node, without any markup
    pub fn to_plain_text_string(&self) -> String {
        let mut buf = String::new();
        self.write_plain_text(&mut buf);
        buf
    }

    pub(crate) fn write_plain_text(&self, buf: &mut String) {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match node {
                Node::Text(text) => buf.push_str(&text.text),
                Node::Composite(composite) => pending.extend(composite.children().iter().rev()),
                Node::Remark(_) | Node::Tag(_) => {}
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_html(true))
    }
}

/// Ordered list of nodes
#[derive(Clone, Debug, Default)]
pub struct NodeList {
    nodes: Vec<Node>,
}

impl NodeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Node> {
        self.nodes.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    pub fn as_slice(&self) -> &[Node] {
        &self.nodes
    }

    pub fn into_vec(self) -> Vec<Node> {
        self.nodes
    }

    pub fn to_html(&self, verbatim: bool) -> String {
        let mut buf = String::new();
        for node in &self.nodes {
            node.write_html(&mut buf, verbatim);
        }
        buf
    }

    /// Text content of all nodes
    pub fn as_string(&self) -> String {
        let mut buf = String::new();
        for node in &self.nodes {
            node.write_plain_text(&mut buf);
        }
        buf
    }
}

impl From<Vec<Node>> for NodeList {
    fn from(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }
}

impl FromIterator<Node> for NodeList {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for NodeList {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a NodeList {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
