//! Iteration driver
//!
//! The [`Parser`] hands out the top level nodes of a page one at a time, scanning every start
//! tag into its subtree first. When a META tag declares a charset other than the one the page
//! is being decoded with, the parser decodes the page again and starts over; nodes produced
//! before that belong to an older generation and must be thrown away by whoever keeps them.

use crate::lexer::Lexer;
use crate::node::{Node, NodeList};
use crate::scanner::{Outcome, ScanContext, ScannerRegistry};
use encoding_rs::Encoding;
use log::{error, warn};
use std::path::Path;
use std::sync::Arc;
use tagsoup_shared::page::{Config, Page};
use tagsoup_shared::types::{Error, ParseError, Result};

/// Number of times a page may be decoded again because it declared another charset
pub const MAX_ENCODING_RESTARTS: usize = 1;

#[derive(Clone, Copy, Debug)]
pub struct ParserOptions {
    /// Scan start tags into composites. When false, every tag is returned as a flat node and
    /// no semantic actions are run.
    pub recurse: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self { recurse: true }
    }
}

pub struct Parser {
    context: ScanContext,
    options: ParserOptions,
    /// Number of charset restarts so far
    restarts: usize,
    /// Bumped every time the parser starts over
    generation: usize,
    /// Set after an error has been returned; no more nodes follow
    failed: bool,
}

impl Parser {
    pub fn new(page: Page) -> Self {
        Self::with_options(page, ParserOptions::default())
    }

    pub fn with_options(page: Page, options: ParserOptions) -> Self {
        Self::with_registry(page, ScannerRegistry::standard(), options)
    }

    pub fn with_registry(page: Page, registry: Arc<ScannerRegistry>, options: ParserOptions) -> Self {
        Self {
            context: ScanContext::new(Lexer::new(page), registry),
            options,
            restarts: 0,
            generation: 0,
            failed: false,
        }
    }

    /// Parser for a string of HTML
    pub fn from_html(html: &str) -> Self {
        Self::new(Page::from_str(html, None))
    }

    /// Parser for raw bytes in an unknown charset
    pub fn from_bytes(bytes: Vec<u8>, source: Option<&str>, config: Config) -> Self {
        Self::new(Page::from_bytes(bytes, source, config))
    }

    pub fn from_file<P: AsRef<Path>>(path: P, config: Config) -> Result<Self> {
        Ok(Self::new(Page::from_file(path, config)?))
    }

    pub fn page(&self) -> &Page {
        self.context.page()
    }

    pub fn page_mut(&mut self) -> &mut Page {
        self.context.lexer_mut().page_mut()
    }

    pub fn lexer(&self) -> &Lexer {
        self.context.lexer()
    }

    pub fn registry(&self) -> &Arc<ScannerRegistry> {
        self.context.registry()
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    pub fn restarts(&self) -> usize {
        self.restarts
    }

    /// Changes every time the parser starts over from the beginning of the page. Nodes returned
    /// under an earlier generation refer to offsets that are no longer valid.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns true when another node can be read
    pub fn has_next(&mut self) -> bool {
        !self.failed && self.context.has_pending()
    }

    /// Returns the next top level node, or None at the end of the page
    pub fn next_node(&mut self) -> Result<Option<Node>> {
        if self.failed {
            return Ok(None);
        }

        loop {
            match self.scan_next() {
                None => return Ok(None),
                Some(Outcome::Complete(node)) => return Ok(Some(node)),
                Some(Outcome::EncodingChange(encoding)) => self.restart(encoding)?,
            }
        }
    }

    /// Parses the remainder of the page into a list of top level nodes
    pub fn parse(&mut self) -> Result<NodeList> {
        let mut nodes = NodeList::new();
        let mut generation = self.generation;

        while let Some(node) = self.next_node()? {
            if generation != self.generation {
                nodes.clear();
                generation = self.generation;
            }
            nodes.push(node);
        }

        if generation != self.generation {
            nodes.clear();
        }

        Ok(nodes)
    }

    /// Starts over from the beginning of the page
    pub fn reset(&mut self) {
        self.context.reset();
        self.generation += 1;
        self.failed = false;
    }

    fn scan_next(&mut self) -> Option<Outcome> {
        let node = self.context.next_node()?;

        Some(match node {
            Node::Tag(tag) if self.options.recurse && !tag.is_end_tag() => {
                let scanner = tag.scanner().clone();
                scanner.scan(tag, &mut self.context)
            }
            node => Outcome::Complete(node),
        })
    }

    fn restart(&mut self, encoding: &'static Encoding) -> Result<()> {
        let from = self.page().charset();

        if self.restarts >= MAX_ENCODING_RESTARTS {
            error!(
                "{} changed its charset again, from {from} to {}",
                self.page().source(),
                encoding.name()
            );
            self.failed = true;
            let cause = Error::EncodingChange {
                from: from.to_string(),
                to: encoding.name().to_string(),
            };
            return Err(self.parse_error("charset changed more than once", cause));
        }

        warn!(
            "{} declares charset {}, parsing again",
            self.page().source(),
            encoding.name()
        );

        self.restarts += 1;
        self.generation += 1;
        self.context.reset();
        self.page_mut().set_encoding_to(encoding);

        Ok(())
    }

    /// Wraps the cause into a parse error pointing at the current position of the lexer
    fn parse_error(&mut self, message: &str, cause: Error) -> Error {
        let lexer = self.context.lexer_mut();
        let line = lexer.current_line_number();
        let line_text = lexer.current_line();

        Error::Parse(ParseError {
            message: message.to_string(),
            source_id: lexer.page().source().to_string(),
            line,
            line_text,
            cause: Some(Box::new(cause)),
        })
    }
}

impl Iterator for Parser {
    type Item = Result<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_node().transpose()
    }
}
