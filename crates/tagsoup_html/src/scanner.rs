//! Scanners turn the flat nodes of the lexer into a tree.
//!
//! Every start tag is bound to a [`Scanner`] looked up by its name in a [`ScannerRegistry`].
//! Leaf scanners return the tag as it is. Composite scanners keep pulling nodes as children
//! until the matching end tag, an ender, or the end of the page, recursing into nested
//! composites. Raw text scanners take everything up to their end tag as a single text node.
//!
//! Scanners themselves hold no state. The state of a scan (the lexer, the one node of
//! lookahead and the names of the open composites) lives in a [`ScanContext`] owned by the
//! parser.

mod action;
mod composite;
mod raw_text;
pub mod registry;

pub use action::{Action, SemanticAction};
pub use registry::ScannerRegistry;

use crate::lexer::Lexer;
use crate::node::{Node, Tag};
use encoding_rs::Encoding;
use lazy_static::lazy_static;
use std::sync::Arc;
use tagsoup_shared::page::Page;

lazy_static! {
    static ref DEFAULT_SCANNER: Arc<Scanner> = Arc::new(Scanner::leaf(&[]));
}

/// The leaf scanner every tag without a registered scanner is bound to
pub fn default_scanner() -> Arc<Scanner> {
    Arc::clone(&DEFAULT_SCANNER)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScannerKind {
    /// The tag is a node of its own
    Leaf,
    /// The tag starts a composite with children
    Composite,
    /// The tag starts a composite whose body is not tokenized
    RawText,
}

/// Result of scanning a tag
#[derive(Debug)]
pub enum Outcome {
    Complete(Node),
    /// The page declared another charset; everything scanned so far must be discarded
    EncodingChange(&'static Encoding),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scanner {
    ids: Vec<String>,
    enders: Vec<String>,
    end_tag_enders: Vec<String>,
    kind: ScannerKind,
    action: SemanticAction,
}

fn upper(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_ascii_uppercase()).collect()
}

impl Scanner {
    fn new(ids: &[&str], kind: ScannerKind) -> Self {
        Self {
            ids: upper(ids),
            enders: Vec::new(),
            end_tag_enders: Vec::new(),
            kind,
            action: SemanticAction::None,
        }
    }

    pub fn leaf(ids: &[&str]) -> Self {
        Self::new(ids, ScannerKind::Leaf)
    }

    pub fn composite(ids: &[&str]) -> Self {
        Self::new(ids, ScannerKind::Composite)
    }

    pub fn raw_text(ids: &[&str]) -> Self {
        Self::new(ids, ScannerKind::RawText)
    }

    /// Start tags that close a composite of this scanner
    pub fn with_enders(mut self, enders: &[&str]) -> Self {
        self.enders = upper(enders);
        self
    }

    /// End tags other than its own that close a composite of this scanner
    pub fn with_end_tag_enders(mut self, end_tag_enders: &[&str]) -> Self {
        self.end_tag_enders = upper(end_tag_enders);
        self
    }

    pub fn with_action(mut self, action: SemanticAction) -> Self {
        self.action = action;
        self
    }

    /// Upper-cased names of the tags this scanner handles
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn enders(&self) -> &[String] {
        &self.enders
    }

    pub fn end_tag_enders(&self) -> &[String] {
        &self.end_tag_enders
    }

    pub fn kind(&self) -> ScannerKind {
        self.kind
    }

    pub fn action(&self) -> SemanticAction {
        self.action
    }

    pub fn is_composite(&self) -> bool {
        self.kind != ScannerKind::Leaf
    }

    pub fn is_ender(&self, name: &str) -> bool {
        self.enders.iter().any(|ender| ender == name)
    }

    pub fn is_end_tag_ender(&self, name: &str) -> bool {
        self.end_tag_enders.iter().any(|ender| ender == name)
    }

    /// Scans the node that starts with the given start tag
    pub fn scan(&self, tag: Tag, context: &mut ScanContext) -> Outcome {
        match self.kind {
            ScannerKind::Leaf => self.finish(Node::Tag(tag), context),
            ScannerKind::Composite => composite::scan(self, tag, context),
            ScannerKind::RawText => raw_text::scan(self, tag, context),
        }
    }

    /// Runs the semantic action on a completed node
    fn finish(&self, node: Node, context: &ScanContext) -> Outcome {
        let Some(tag) = node.as_tag() else {
            return Outcome::Complete(node);
        };

        match self.action.perform(tag, context.page()) {
            Action::Continue => Outcome::Complete(node),
            Action::Restart(encoding) => Outcome::EncodingChange(encoding),
        }
    }
}

/// Everything a scan needs besides the scanner: the lexer, the one node of lookahead shared by
/// all nesting levels, and the names of the composites being scanned.
pub struct ScanContext {
    lexer: Lexer,
    pushback: Option<Node>,
    open: Vec<String>,
    registry: Arc<ScannerRegistry>,
}

impl ScanContext {
    pub fn new(lexer: Lexer, registry: Arc<ScannerRegistry>) -> Self {
        Self {
            lexer,
            pushback: None,
            open: Vec::new(),
            registry,
        }
    }

    pub fn lexer(&self) -> &Lexer {
        &self.lexer
    }

    pub fn lexer_mut(&mut self) -> &mut Lexer {
        &mut self.lexer
    }

    pub fn page(&self) -> &Page {
        self.lexer.page()
    }

    pub fn registry(&self) -> &Arc<ScannerRegistry> {
        &self.registry
    }

    /// Returns the pushed back node, or lexes a new one and binds it to its scanner
    pub fn next_node(&mut self) -> Option<Node> {
        if let Some(node) = self.pushback.take() {
            return Some(node);
        }

        let mut node = self.lexer.next_node()?;
        if let Node::Tag(tag) = &mut node {
            if !tag.is_end_tag() {
                tag.set_scanner(self.registry.lookup(&tag.tag_name()));
            }
        }

        Some(node)
    }

    /// Hands a node back so the next call to [`ScanContext::next_node`] returns it again
    pub fn push_back(&mut self, node: Node) {
        debug_assert!(self.pushback.is_none(), "pushback slot already taken");
        self.pushback = Some(node);
    }

    /// Returns true when a node is pushed back or characters are left
    pub fn has_pending(&mut self) -> bool {
        self.pushback.is_some() || !self.lexer.at_end()
    }

    /// Returns true when a composite with the given name encloses the one being scanned
    pub fn is_open_ancestor(&self, name: &str) -> bool {
        self.open.iter().rev().skip(1).any(|open| open == name)
    }

    fn enter(&mut self, name: String) {
        self.open.push(name);
    }

    fn leave(&mut self) {
        self.open.pop();
    }

    /// Forgets all scan state and moves the lexer back to the start of the page
    pub fn reset(&mut self) {
        self.pushback = None;
        self.open.clear();
        self.lexer.reset();
    }
}
