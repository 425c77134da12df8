use crate::lexer::Lexer;
use crate::node::attribute::{choose_quote, quote_fits, Attribute};
use crate::node::Node;
use crate::scanner::Scanner;
use std::fmt;
use std::sync::Arc;
use tagsoup_shared::page::{Page, STRING_SOURCE};
use tagsoup_shared::types::{Error, ParseError, Result};

/// Longest description [`Tag`] displays before it is cut off
const DISPLAY_WIDTH: usize = 80;

/// Tags that break the flow of text when it is rendered
static BREAK_TAGS: phf::Set<&'static str> = phf::phf_set! {
    "BLOCKQUOTE", "BODY", "BR", "CENTER", "DD", "DIR", "DIV", "DL", "DT", "FORM", "H1", "H2",
    "H3", "H4", "H5", "H6", "HEAD", "HR", "HTML", "ISINDEX", "LI", "MENU", "NOFRAMES", "OL",
    "P", "PRE", "TD", "TH", "TITLE", "UL",
};

/// Returns true when the (upper-cased) tag name breaks the flow of text
pub fn breaks_flow(name: &str) -> bool {
    BREAK_TAGS.contains(name)
}

/// A start or end tag.
///
/// The first attribute always holds the name of the tag as found in the source, including the
/// leading slash of an end tag. The remaining attributes are the real attributes interleaved
/// with the whitespace between them.
#[derive(Clone, Debug)]
pub struct Tag {
    start: usize,
    end: usize,
    attributes: Vec<Attribute>,
    /// False when the source ended the tag without a `>`
    closed: bool,
    scanner: Arc<Scanner>,
}

impl Tag {
    pub(crate) fn from_source(
        start: usize,
        end: usize,
        attributes: Vec<Attribute>,
        closed: bool,
        scanner: Arc<Scanner>,
    ) -> Self {
        Self {
            start,
            end,
            attributes,
            closed,
            scanner,
        }
    }

    /// Creates a tag that is not backed by any source
    pub fn new(name: &str) -> Self {
        Self::from_source(
            0,
            0,
            vec![Attribute::standalone(name)],
            true,
            crate::scanner::default_scanner(),
        )
    }

    pub fn start_position(&self) -> usize {
        self.start
    }

    pub fn end_position(&self) -> usize {
        self.end
    }

    pub fn set_positions(&mut self, start: usize, end: usize) {
        self.start = start;
        self.end = end;
    }

    /// Line the tag starts on, starting with 1
    pub fn starting_line_number(&self, page: &Page) -> usize {
        page.line_of(self.start)
    }

    /// Line the tag ends on, starting with 1
    pub fn ending_line_number(&self, page: &Page) -> usize {
        page.line_of(self.end.saturating_sub(1).max(self.start))
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn scanner(&self) -> &Arc<Scanner> {
        &self.scanner
    }

    pub fn set_scanner(&mut self, scanner: Arc<Scanner>) {
        self.scanner = scanner;
    }

    /// All entries of the attribute list, including the tag name and whitespace
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Vec<Attribute> {
        &mut self.attributes
    }

    /// Name of the tag as found in the source
    pub fn raw_tag_name(&self) -> &str {
        self.attributes
            .first()
            .and_then(Attribute::name)
            .unwrap_or_default()
    }

    /// Upper-cased tag name without the slash of an end tag or an empty XML tag
    pub fn tag_name(&self) -> String {
        self.raw_tag_name()
            .trim_start_matches('/')
            .trim_end_matches('/')
            .to_ascii_uppercase()
    }

    /// Renames the tag, keeping whether it is an end tag
    pub fn set_tag_name(&mut self, name: &str) {
        let name = if self.is_end_tag() && !name.starts_with('/') {
            format!("/{name}")
        } else {
            name.to_string()
        };

        match self.attributes.first_mut() {
            Some(first) if !first.is_whitespace() => first.set_name(&name),
            _ => self.attributes.insert(0, Attribute::standalone(&name)),
        }
    }

    pub fn is_end_tag(&self) -> bool {
        self.raw_tag_name().starts_with('/')
    }

    /// Returns true for tags like `<br/>` that close themselves
    pub fn is_empty_xml_tag(&self) -> bool {
        self.attributes
            .last()
            .and_then(Attribute::name)
            .is_some_and(|name| name.ends_with('/'))
    }

    pub fn set_empty_xml_tag(&mut self, empty: bool) {
        if empty == self.is_empty_xml_tag() {
            return;
        }

        if empty {
            if self.attributes.last().is_some_and(|attr| !attr.is_whitespace()) {
                self.attributes.push(Attribute::whitespace(" "));
            }
            self.attributes.push(Attribute::standalone("/"));
            return;
        }

        let last = self.attributes.len() - 1;
        if last > 0 && self.attributes[last].name() == Some("/") {
            self.attributes.pop();
            if self.attributes.len() > 1 && self.attributes[last - 1].is_whitespace() {
                self.attributes.pop();
            }
        } else if let Some(name) = self.attributes[last].name() {
            let name = name.trim_end_matches('/').to_string();
            self.attributes[last].set_name(&name);
        }
    }

    /// Returns true when the tag breaks the flow of text
    pub fn breaks_flow(&self) -> bool {
        breaks_flow(&self.tag_name())
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.attributes
            .iter()
            .skip(1)
            .position(|attr| attr.has_name(name))
            .map(|idx| idx + 1)
    }

    /// Looks up an attribute by name, ignoring case
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.position_of(name).map(|idx| &self.attributes[idx])
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.position_of(name).map(|idx| &mut self.attributes[idx])
    }

    /// Value of the attribute with the given name, ignoring case. Attributes that are present
    /// without a value return an empty string.
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attribute(name).map(|attr| attr.value().unwrap_or_default())
    }

    /// Sets the value of an attribute. An existing attribute keeps its quote when the new value
    /// can be written with it; a new attribute is appended, quoted.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        if let Some(attr) = self.attribute_mut(name) {
            if quote_fits(attr.quote(), value) {
                attr.set_value(value);
            } else {
                let (quote, value) = choose_quote(value);
                attr.set_quote(quote);
                attr.set_value(&value);
            }
            if attr.assignment().is_none() {
                attr.set_assignment(Some("="));
            }
            return;
        }

        let (quote, value) = choose_quote(value);
        self.append_attribute(Attribute::new(name, &value, quote));
    }

    /// Sets the value of an attribute using the given quote, or no quote at all
    pub fn set_attribute_quoted(&mut self, name: &str, value: &str, quote: Option<char>) {
        match self.attribute_mut(name) {
            Some(attr) => {
                attr.set_value(value);
                attr.set_quote(quote);
                if attr.assignment().is_none() {
                    attr.set_assignment(Some("="));
                }
            }
            None => self.append_attribute(Attribute::new(name, value, quote)),
        }
    }

    /// Replaces the attribute with the same name, or appends it
    pub fn set_attribute_node(&mut self, attribute: Attribute) {
        let existing = attribute.name().and_then(|name| self.position_of(name));
        match existing {
            Some(idx) => self.attributes[idx] = attribute,
            None => self.append_attribute(attribute),
        }
    }

    fn append_attribute(&mut self, attribute: Attribute) {
        let empty_xml = self.is_empty_xml_tag();
        if empty_xml {
            self.set_empty_xml_tag(false);
        }

        if self.attributes.last().is_some_and(|attr| !attr.is_whitespace()) {
            self.attributes.push(Attribute::whitespace(" "));
        }
        self.attributes.push(attribute);

        if empty_xml {
            self.set_empty_xml_tag(true);
        }
    }

    /// Removes an attribute together with the whitespace in front of it
    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        let idx = self.position_of(name)?;
        let removed = self.attributes.remove(idx);
        if idx > 1 && self.attributes[idx - 1].is_whitespace() {
            self.attributes.remove(idx - 1);
        }

        Some(removed)
    }

    /// Replaces the tag with the one lexed from the markup, like `<a href="x.html">`. The
    /// attributes, positions and closing state are taken over; the scanner binding stays.
    pub fn set_text(&mut self, html: &str) -> Result<()> {
        let mut lexer = Lexer::new(Page::from_str(html, None));
        let Some(Node::Tag(tag)) = lexer.next_node() else {
            return Err(Error::Parse(ParseError {
                message: "markup does not start with a tag".to_string(),
                source_id: STRING_SOURCE.to_string(),
                line: 1,
                line_text: html.lines().next().unwrap_or_default().to_string(),
                cause: None,
            }));
        };

        self.start = tag.start;
        self.end = tag.end;
        self.attributes = tag.attributes;
        self.closed = tag.closed;

        Ok(())
    }

    /// Contents of the tag between the angle brackets
    pub fn text(&self) -> String {
        let mut buf = String::new();
        for attr in &self.attributes {
            attr.write_html(&mut buf, true);
        }
        buf
    }

    pub(crate) fn write_html(&self, buf: &mut String, verbatim: bool) {
        buf.push('<');
        for attr in &self.attributes {
            attr.write_html(buf, verbatim);
        }
        if self.closed || !verbatim {
            buf.push('>');
        }
    }

    /// The tag as HTML. Verbatim output leaves out a `>` that was missing in the source.
    pub fn to_html(&self, verbatim: bool) -> String {
        let mut buf = String::new();
        self.write_html(&mut buf, verbatim);
        buf
    }
}

/// Short description for diagnostics: `Tag (start,end): contents`, cut off with `...` when
/// longer than 80 characters.
impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_end_tag() { "End" } else { "Tag" };
        let prefix = format!("{kind} ({},{}): ", self.start, self.end);
        let text = self.text();

        let prefix_len = prefix.chars().count();
        if prefix_len + text.chars().count() > DISPLAY_WIDTH {
            let cut: String = text.chars().take((DISPLAY_WIDTH - 3).saturating_sub(prefix_len)).collect();
            write!(f, "{prefix}{cut}...")
        } else {
            write!(f, "{prefix}{text}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::node::Node;

    fn lex_tag(html: &str) -> Tag {
        let mut lexer = Lexer::new(Page::from_str(html, None));
        match lexer.next_node() {
            Some(Node::Tag(tag)) => tag,
            other => panic!("expected a tag, got {other:?}"),
        }
    }

    #[test]
    fn names() {
        let tag = lex_tag("<div class=x>");
        assert_eq!(tag.raw_tag_name(), "div");
        assert_eq!(tag.tag_name(), "DIV");
        assert!(!tag.is_end_tag());

        let tag = lex_tag("</Div>");
        assert_eq!(tag.raw_tag_name(), "/Div");
        assert_eq!(tag.tag_name(), "DIV");
        assert!(tag.is_end_tag());

        let tag = lex_tag("<br/>");
        assert_eq!(tag.tag_name(), "BR");
        assert!(tag.is_empty_xml_tag());
    }

    #[test]
    fn rename_keeps_end_tag() {
        let mut tag = lex_tag("</b>");
        tag.set_tag_name("strong");
        assert_eq!(tag.to_html(true), "</strong>");
    }

    #[test]
    fn attribute_lookup_ignores_case() {
        let tag = lex_tag("<a HREF=\"x.html\" target=_blank disabled>");
        assert_eq!(tag.attribute_value("href"), Some("x.html"));
        assert_eq!(tag.attribute_value("Target"), Some("_blank"));
        assert_eq!(tag.attribute_value("disabled"), Some(""));
        assert_eq!(tag.attribute_value("title"), None);
        assert_eq!(tag.attribute_value("a"), None);
    }

    #[test]
    fn set_attribute_keeps_quote() {
        let mut tag = lex_tag("<a href='x.html'>");
        tag.set_attribute("HREF", "y.html");
        assert_eq!(tag.to_html(true), "<a href='y.html'>");

        tag.set_attribute_quoted("href", "z.html", Some('"'));
        assert_eq!(tag.to_html(true), "<a href=\"z.html\">");

        tag.set_attribute("href", "it's");
        assert_eq!(tag.to_html(true), "<a href=\"it's\">");
    }

    #[test]
    fn set_attribute_quote_selection() {
        let mut tag = lex_tag("<img>");
        tag.set_attribute("alt", "plain");
        tag.set_attribute("title", "say \"hi\"");
        tag.set_attribute("data-x", "it's \"x\"");
        assert_eq!(
            tag.to_html(true),
            "<img alt=\"plain\" title='say \"hi\"' data-x=\"it's &quot;x&quot;\">"
        );
    }

    #[test]
    fn naked_value_gets_quoted_when_needed() {
        let mut tag = lex_tag("<td width=10>");
        tag.set_attribute("width", "20");
        assert_eq!(tag.to_html(true), "<td width=20>");
        tag.set_attribute("width", "20 %");
        assert_eq!(tag.to_html(true), "<td width=\"20 %\">");
    }

    #[test]
    fn unterminated_quote_requoted_when_generated() {
        let tag = lex_tag("<a href=\"x>");
        assert_eq!(tag.to_html(true), "<a href=\"x>");
        assert_eq!(tag.to_html(false), "<a href='\"x'>");
    }

    #[test]
    fn remove_attribute() {
        let mut tag = lex_tag("<input type=text  name=\"q\" disabled>");
        let removed = tag.remove_attribute("NAME").unwrap();
        assert_eq!(removed.value(), Some("q"));
        assert_eq!(tag.to_html(true), "<input type=text disabled>");
        assert!(tag.remove_attribute("name").is_none());
    }

    #[test]
    fn empty_xml_tag() {
        let mut tag = lex_tag("<br/>");
        tag.set_attribute("class", "x");
        assert_eq!(tag.to_html(true), "<br class=\"x\" />");

        tag.set_empty_xml_tag(false);
        assert_eq!(tag.to_html(true), "<br class=\"x\">");

        let mut tag = lex_tag("<hr>");
        tag.set_empty_xml_tag(true);
        assert_eq!(tag.to_html(true), "<hr />");
    }

    #[test]
    fn text_and_flow() {
        let tag = lex_tag("<p align=center>");
        assert_eq!(tag.text(), "p align=center");
        assert!(tag.breaks_flow());
        assert!(!lex_tag("<span>").breaks_flow());
    }

    #[test]
    fn unclosed_tag() {
        let tag = lex_tag("<div class=x");
        assert!(!tag.is_closed());
        assert_eq!(tag.to_html(true), "<div class=x");
        assert_eq!(tag.to_html(false), "<div class=x>");
    }

    #[test]
    fn line_numbers() {
        let mut lexer = Lexer::new(Page::from_str("a\n<div\nid=x>", None));
        lexer.next_node();
        let Some(Node::Tag(tag)) = lexer.next_node() else {
            panic!("expected a tag");
        };
        assert_eq!(tag.starting_line_number(lexer.page()), 2);
        assert_eq!(tag.ending_line_number(lexer.page()), 3);
    }

    #[test]
    fn set_text_relexes() {
        let mut tag = lex_tag("<a href=x.html>");
        tag.set_text("<img  src='y.gif' alt=\"y\"").unwrap();

        assert_eq!(tag.tag_name(), "IMG");
        assert_eq!(tag.attribute_value("SRC"), Some("y.gif"));
        assert_eq!(tag.attribute("href"), None);
        assert_eq!((tag.start_position(), tag.end_position()), (0, 25));
        assert!(!tag.is_closed());
        assert_eq!(tag.to_html(true), "<img  src='y.gif' alt=\"y\"");

        tag.set_text("</A>").unwrap();
        assert!(tag.is_end_tag());
        assert_eq!(tag.to_html(true), "</A>");
    }

    #[test]
    fn set_text_needs_a_tag() {
        let mut tag = lex_tag("<b>");
        let err = tag.set_text("plain text").unwrap_err();
        assert!(matches!(err, Error::Parse(ref parse) if parse.line_text == "plain text"));
        assert_eq!(tag.to_html(true), "<b>");
    }

    #[test]
    fn display() {
        let mut lexer = Lexer::new(Page::from_str("x<p class=intro></p>", None));
        lexer.next_node();
        let Some(Node::Tag(tag)) = lexer.next_node() else {
            panic!("expected a tag");
        };
        assert_eq!(tag.to_string(), "Tag (1,16): p class=intro");
        let Some(Node::Tag(end)) = lexer.next_node() else {
            panic!("expected a tag");
        };
        assert_eq!(end.to_string(), "End (16,20): /p");

        let long = lex_tag(&format!("<div title=\"{}\">", "x".repeat(100)));
        let description = long.to_string();
        assert_eq!(description.chars().count(), DISPLAY_WIDTH);
        assert!(description.starts_with("Tag (0,114): div title=\"xxx"));
        assert!(description.ends_with("x..."));
    }
}
