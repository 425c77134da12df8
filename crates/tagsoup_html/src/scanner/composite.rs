use crate::node::{CompositeTag, Node, Tag};
use crate::scanner::{Outcome, ScanContext, Scanner, ScannerKind};
use log::debug;
use std::sync::Arc;

/// A composite that is still collecting children
struct Frame {
    tag: Tag,
    name: String,
    /// None for the composite the scan started with
    scanner: Option<Arc<Scanner>>,
    children: Vec<Node>,
}

impl Frame {
    fn new(tag: Tag, scanner: Option<Arc<Scanner>>) -> Self {
        Self {
            name: tag.tag_name(),
            tag,
            scanner,
            children: Vec::new(),
        }
    }

    fn scanner<'a>(&'a self, outer: &'a Scanner) -> &'a Scanner {
        self.scanner.as_deref().unwrap_or(outer)
    }

    fn finish(self, end_tag: Option<Tag>, outer: &Scanner, context: &ScanContext) -> Outcome {
        let Frame {
            tag, scanner, children, ..
        } = self;
        let node = Node::Composite(CompositeTag::new(tag, children, end_tag));
        scanner.as_deref().unwrap_or(outer).finish(node, context)
    }
}

enum Step {
    /// Close the current composite with the given end tag
    Close(Option<Tag>),
    Child(Node),
    /// Open a nested composite
    Open(Tag, Arc<Scanner>),
    /// Scan a leaf or raw text element
    Scan(Tag, Arc<Scanner>),
}

/// Collects the children of a composite tag.
///
/// For every incoming node, in this order:
///
/// 1. the end tag with our own name closes the composite and becomes its end tag,
/// 2. an end tag in the end tag enders, or naming an enclosing composite, closes the
///    composite and is pushed back for the parent,
/// 3. a start tag in the enders closes the composite and is pushed back,
/// 4. any other start tag is scanned with its own scanner and becomes a child,
/// 5. everything else, stray end tags included, becomes a child.
///
/// The end of the page closes the composite without an end tag.
///
/// Nested composites are kept on a heap stack rather than scanned recursively, so any depth of
/// unclosed tags can be handled.
pub(crate) fn scan(scanner: &Scanner, tag: Tag, context: &mut ScanContext) -> Outcome {
    if tag.is_empty_xml_tag() {
        return scanner.finish(Node::Composite(CompositeTag::new(tag, Vec::new(), None)), context);
    }

    let mut current = Frame::new(tag, None);
    let mut parents: Vec<Frame> = Vec::new();
    context.enter(current.name.clone());

    loop {
        let step = match context.next_node() {
            None => Step::Close(None),
            Some(Node::Tag(next)) => next_step(current.scanner(scanner), &current.name, next, context),
            Some(node) => Step::Child(node),
        };

        match step {
            Step::Child(node) => current.children.push(node),
            Step::Open(next, next_scanner) => {
                let frame = Frame::new(next, Some(next_scanner));
                context.enter(frame.name.clone());
                parents.push(std::mem::replace(&mut current, frame));
            }
            Step::Scan(next, next_scanner) => match next_scanner.scan(next, context) {
                Outcome::Complete(child) => current.children.push(child),
                restart @ Outcome::EncodingChange(_) => return abandon(restart, parents.len() + 1, context),
            },
            Step::Close(end_tag) => {
                context.leave();
                let Some(parent) = parents.pop() else {
                    return current.finish(end_tag, scanner, context);
                };
                let closed = std::mem::replace(&mut current, parent);
                match closed.finish(end_tag, scanner, context) {
                    Outcome::Complete(child) => current.children.push(child),
                    restart @ Outcome::EncodingChange(_) => {
                        return abandon(restart, parents.len() + 1, context)
                    }
                }
            }
        }
    }
}

/// Decides what a tag means for the composite being collected
fn next_step(scanner: &Scanner, name: &str, next: Tag, context: &mut ScanContext) -> Step {
    let next_name = next.tag_name();

    if next.is_end_tag() {
        if next_name == name {
            return Step::Close(Some(next));
        }
        if scanner.is_end_tag_ender(&next_name) || context.is_open_ancestor(&next_name) {
            debug!("{name} closed by end tag {next_name}");
            context.push_back(Node::Tag(next));
            return Step::Close(None);
        }
        return Step::Child(Node::Tag(next));
    }

    if scanner.is_ender(&next_name) {
        debug!("{name} closed by {next_name}");
        context.push_back(Node::Tag(next));
        return Step::Close(None);
    }

    let next_scanner = next.scanner().clone();
    if next_scanner.kind() == ScannerKind::Composite && !next.is_empty_xml_tag() {
        Step::Open(next, next_scanner)
    } else {
        Step::Scan(next, next_scanner)
    }
}

/// Drops the open composites after a restart was requested
fn abandon(restart: Outcome, open: usize, context: &mut ScanContext) -> Outcome {
    for _ in 0..open {
        context.leave();
    }
    restart
}
