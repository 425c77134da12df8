use crate::node::{CompositeTag, Node, Tag};
use crate::scanner::{Outcome, ScanContext, Scanner};

/// Scans elements like SCRIPT and STYLE, whose body is taken as a single text node without
/// looking for markup in it.
pub(crate) fn scan(scanner: &Scanner, tag: Tag, context: &mut ScanContext) -> Outcome {
    if tag.is_empty_xml_tag() {
        return scanner.finish(Node::Composite(CompositeTag::new(tag, Vec::new(), None)), context);
    }

    let name = tag.tag_name();
    let children = context
        .lexer_mut()
        .parse_raw_text(&name)
        .map(Node::Text)
        .into_iter()
        .collect();

    let mut end_tag = None;
    match context.next_node() {
        Some(Node::Tag(next)) if next.is_end_tag() && next.tag_name() == name => end_tag = Some(next),
        Some(node) => context.push_back(node),
        None => {}
    }

    scanner.finish(Node::Composite(CompositeTag::new(tag, children, end_tag)), context)
}
