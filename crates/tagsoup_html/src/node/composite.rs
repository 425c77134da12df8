use crate::node::tag::Tag;
use crate::node::Node;

/// A start tag together with everything up to its end tag.
///
/// The end tag is `None` when the composite was closed implicitly: by an ender, by the end tag
/// of an ancestor or by the end of the page.
#[derive(Clone, Debug)]
pub struct CompositeTag {
    tag: Tag,
    children: Vec<Node>,
    end_tag: Option<Tag>,
}

impl CompositeTag {
    pub fn new(tag: Tag, children: Vec<Node>, end_tag: Option<Tag>) -> Self {
        Self {
            tag,
            children,
            end_tag,
        }
    }

    /// The start tag
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn tag_mut(&mut self) -> &mut Tag {
        &mut self.tag
    }

    pub fn tag_name(&self) -> String {
        self.tag.tag_name()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    pub fn child(&self, idx: usize) -> Option<&Node> {
        self.children.get(idx)
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn end_tag(&self) -> Option<&Tag> {
        self.end_tag.as_ref()
    }

    pub fn end_tag_mut(&mut self) -> Option<&mut Tag> {
        self.end_tag.as_mut()
    }

    pub fn set_end_tag(&mut self, end_tag: Option<Tag>) {
        self.end_tag = end_tag;
    }

    pub fn start_position(&self) -> usize {
        self.tag.start_position()
    }

    /// Offset just past the end tag, or past the last child when there is no end tag
    pub fn end_position(&self) -> usize {
        let mut composite = self;
        loop {
            if let Some(end_tag) = &composite.end_tag {
                return end_tag.end_position();
            }
            match composite.children.last() {
                Some(Node::Composite(last)) => composite = last,
                Some(last) => return last.end_position(),
                None => return composite.tag.end_position(),
            }
        }
    }

    /// HTML of the children only
    pub fn children_html(&self, verbatim: bool) -> String {
        let mut buf = String::new();
        for child in &self.children {
            child.write_html(&mut buf, verbatim);
        }
        buf
    }

    /// Writes the end tag, or the one a generated document needs
    pub(crate) fn write_end_html(&self, buf: &mut String, verbatim: bool) {
        match &self.end_tag {
            Some(end_tag) => end_tag.write_html(buf, verbatim),
            None if !verbatim && !self.tag.is_empty_xml_tag() => {
                let name = self.tag.raw_tag_name().trim_matches('/');
                buf.push_str("</");
                buf.push_str(name);
                buf.push('>');
            }
            None => {}
        }
    }
}

// Deeply nested trees are taken apart level by level instead of recursively
impl Drop for CompositeTag {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            if let Node::Composite(composite) = &mut node {
                pending.append(&mut composite.children);
            }
        }
    }
}
