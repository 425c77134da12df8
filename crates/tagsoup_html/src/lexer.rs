//! Tokenizer that turns the characters of a page into flat nodes
//!
//! The lexer never fails: malformed markup is shaped into the closest matching node and the
//! lexer moves on. Every call to [`Lexer::next_node`] produces one text, remark or tag node, and
//! only the cursor position is kept between calls.

use crate::node::{Attribute, Node, Remark, Tag, Text};
use crate::scanner::default_scanner;
use log::trace;
use tagsoup_shared::page::{Character, Cursor, Page};

use Character::*;

#[derive(Clone, Copy, Debug, PartialEq)]
enum TagState {
    /// Outside of any attribute, possibly in whitespace
    Between,
    /// In an attribute name
    Name,
    /// In whitespace after a name; either an `=` follows or the attribute is standalone
    AfterName,
    /// After the `=`, waiting for the value
    Equals,
    /// In a value without quotes
    Naked,
    /// In a value quoted with the given character
    Quoted(char),
}

pub struct Lexer {
    page: Page,
    cursor: Cursor,
}

impl Lexer {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            cursor: Cursor::default(),
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn into_page(self) -> Page {
        self.page
    }

    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    pub fn set_position(&mut self, position: usize) {
        self.cursor.set_position(position);
    }

    /// Moves back to the start of the page
    pub fn reset(&mut self) {
        self.cursor = Cursor::default();
    }

    /// Returns true when no characters are left
    pub fn at_end(&mut self) -> bool {
        self.page.at_end(self.cursor.position())
    }

    /// Line the lexer is positioned on, starting with 1
    pub fn current_line_number(&self) -> usize {
        self.page.line_of(self.cursor.position())
    }

    /// Text of the line the lexer is positioned on
    pub fn current_line(&mut self) -> String {
        self.page.line_text(self.cursor.position())
    }

    fn read(&mut self) -> Character {
        self.page.character(&mut self.cursor)
    }

    fn unget(&mut self) {
        self.page.unget(&mut self.cursor);
    }

    /// Returns the next node, or None at the end of the page
    pub fn next_node(&mut self) -> Option<Node> {
        let start = self.cursor.position();

        let node = match self.read() {
            StreamEnd => return None,
            Ch('<') => match self.read() {
                StreamEnd => self.make_text(start),
                Ch('!') => self.parse_declaration(start),
                Ch(c) if starts_tag(c) => self.parse_tag(start),
                Ch(_) => self.parse_text(start),
            },
            Ch(_) => self.parse_text(start),
        };

        trace!("lexed node at {}..{}", start, node.end_position());
        Some(node)
    }

    fn make_text(&mut self, start: usize) -> Node {
        let end = self.cursor.position();
        let text = self.page.text(start, end);
        Node::Text(Text::new(start, end, text))
    }

    /// Text runs until a `<` that starts markup. Any other `<` is part of the text.
    fn parse_text(&mut self, start: usize) -> Node {
        self.cursor.set_position(start + 1);

        loop {
            let pos = self.cursor.position();
            match self.read() {
                StreamEnd => break,
                Ch('<') => match self.read() {
                    // a trailing '<' belongs to the text
                    StreamEnd => break,
                    Ch(c) if c == '!' || starts_tag(c) => {
                        self.cursor.set_position(pos);
                        break;
                    }
                    Ch(_) => self.unget(),
                },
                Ch(_) => {}
            }
        }

        self.make_text(start)
    }

    /// Handles everything starting with `<!`: remarks, and declarations like `<!DOCTYPE>` which
    /// are lexed as tags.
    fn parse_declaration(&mut self, start: usize) -> Node {
        match self.read() {
            StreamEnd => return self.make_text(start),
            Ch('>') => return self.make_remark(start, start + 2, start + 2),
            Ch('-') => {
                if self.read() == Ch('-') {
                    return self.parse_remark(start);
                }
            }
            Ch(_) => {}
        }

        self.parse_tag(start)
    }

    /// Parses the remark body after `<!--`. The remark ends at `--` followed by optional
    /// whitespace and `>`, or at the end of the page.
    fn parse_remark(&mut self, start: usize) -> Node {
        let text_start = self.cursor.position();

        loop {
            let pos = self.cursor.position();
            match self.read() {
                StreamEnd => return self.make_remark(start, text_start, pos),
                Ch('-') => {
                    if self.read() == Ch('-') {
                        let mut ch = self.read();
                        while ch.is_whitespace() {
                            ch = self.read();
                        }
                        if ch == Ch('>') {
                            return self.make_remark(start, text_start, pos);
                        }
                    }
                    self.cursor.set_position(pos + 1);
                }
                Ch(_) => {}
            }
        }
    }

    fn make_remark(&mut self, start: usize, text_start: usize, text_end: usize) -> Node {
        let end = self.cursor.position();
        let text = self.page.text(text_start, text_end);
        let source = self.page.text(start, end);
        Node::Remark(Remark::new(start, end, text, source))
    }

    /// Parses a tag starting at the `<` on `start`.
    ///
    /// The tag ends at `>`, at the end of the page, or at a `<` found outside of an attribute
    /// value (which is left for the next node). A quoted value without a closing quote is read
    /// again as an unquoted value that starts with the quote character.
    fn parse_tag(&mut self, start: usize) -> Node {
        self.cursor.set_position(start + 1);

        let mut attributes = Vec::new();
        let mut state = TagState::Between;
        // start of the current whitespace run or attribute name
        let mut mark = start + 1;
        let mut name_end = 0;
        let mut assignment_end = 0;
        let mut value_start = 0;
        let mut literal_quote = None;

        let closed = loop {
            let pos = self.cursor.position();
            let ch = self.read();

            match state {
                TagState::Between => match ch {
                    StreamEnd | Ch('>') | Ch('<') => {
                        self.push_whitespace(&mut attributes, mark, pos);
                        break self.finish_tag(ch);
                    }
                    Ch(c) if c.is_whitespace() => {}
                    Ch(_) => {
                        self.push_whitespace(&mut attributes, mark, pos);
                        mark = pos;
                        state = TagState::Name;
                    }
                },
                TagState::Name => match ch {
                    StreamEnd | Ch('>') | Ch('<') => {
                        let name = self.page.text(mark, pos);
                        attributes.push(Attribute::standalone(&name));
                        break self.finish_tag(ch);
                    }
                    Ch('=') => {
                        name_end = pos;
                        state = TagState::Equals;
                    }
                    Ch(c) if c.is_whitespace() => {
                        name_end = pos;
                        state = TagState::AfterName;
                    }
                    Ch(_) => {}
                },
                TagState::AfterName => match ch {
                    StreamEnd | Ch('>') | Ch('<') => {
                        let name = self.page.text(mark, name_end);
                        attributes.push(Attribute::standalone(&name));
                        self.push_whitespace(&mut attributes, name_end, pos);
                        break self.finish_tag(ch);
                    }
                    Ch('=') => state = TagState::Equals,
                    Ch(c) if c.is_whitespace() => {}
                    Ch(_) => {
                        let name = self.page.text(mark, name_end);
                        attributes.push(Attribute::standalone(&name));
                        self.push_whitespace(&mut attributes, name_end, pos);
                        mark = pos;
                        state = TagState::Name;
                    }
                },
                TagState::Equals => match ch {
                    StreamEnd | Ch('>') => {
                        let name = self.page.text(mark, name_end);
                        let assignment = self.page.text(name_end, pos);
                        attributes.push(Attribute::empty(&name, &assignment));
                        break self.finish_tag(ch);
                    }
                    Ch(q @ ('"' | '\'')) if literal_quote != Some(pos) => {
                        assignment_end = pos;
                        value_start = pos + 1;
                        state = TagState::Quoted(q);
                    }
                    Ch(c) if c.is_whitespace() => {}
                    Ch(_) => {
                        assignment_end = pos;
                        value_start = pos;
                        state = TagState::Naked;
                    }
                },
                TagState::Naked => match ch {
                    StreamEnd | Ch('>') => {
                        attributes.push(self.valued(mark, name_end, assignment_end, value_start, pos, None));
                        break self.finish_tag(ch);
                    }
                    Ch(c) if c.is_whitespace() => {
                        attributes.push(self.valued(mark, name_end, assignment_end, value_start, pos, None));
                        mark = pos;
                        state = TagState::Between;
                    }
                    Ch(_) => {}
                },
                TagState::Quoted(q) => match ch {
                    StreamEnd => {
                        trace!("unterminated {q} quote at {assignment_end}, reading unquoted");
                        literal_quote = Some(assignment_end);
                        self.cursor.set_position(assignment_end);
                        state = TagState::Equals;
                    }
                    Ch(c) if c == q => {
                        attributes.push(self.valued(mark, name_end, assignment_end, value_start, pos, Some(q)));
                        mark = pos + 1;
                        state = TagState::Between;
                    }
                    Ch(_) => {}
                },
            }
        };

        let end = self.cursor.position();
        Node::Tag(Tag::from_source(start, end, attributes, closed, default_scanner()))
    }

    /// Returns whether the character that ended a tag closed it. A `<` is given back.
    fn finish_tag(&mut self, ch: Character) -> bool {
        if ch == Ch('<') {
            self.unget();
        }
        ch == Ch('>')
    }

    fn push_whitespace(&mut self, attributes: &mut Vec<Attribute>, start: usize, end: usize) {
        if end > start {
            let whitespace = self.page.text(start, end);
            attributes.push(Attribute::whitespace(&whitespace));
        }
    }

    fn valued(
        &mut self,
        name_start: usize,
        name_end: usize,
        assignment_end: usize,
        value_start: usize,
        value_end: usize,
        quote: Option<char>,
    ) -> Attribute {
        Attribute::valued(
            self.page.text(name_start, name_end),
            self.page.text(name_end, assignment_end),
            self.page.text(value_start, value_end),
            quote,
        )
    }

    /// Reads the body of a raw text element like SCRIPT or STYLE: everything up to the end tag
    /// with the given name. Returns None when the body is empty.
    pub fn parse_raw_text(&mut self, name: &str) -> Option<Text> {
        let start = self.cursor.position();

        loop {
            let pos = self.cursor.position();
            match self.read() {
                StreamEnd => break,
                Ch('<') => {
                    if self.read() == Ch('/') && self.at_end_tag_name(name) {
                        self.cursor.set_position(pos);
                        break;
                    }
                    self.cursor.set_position(pos + 1);
                }
                Ch(_) => {}
            }
        }

        let end = self.cursor.position();
        if end == start {
            return None;
        }

        let text = self.page.text(start, end);
        Some(Text::new(start, end, text))
    }

    fn at_end_tag_name(&mut self, name: &str) -> bool {
        for expected in name.chars() {
            match self.read() {
                Ch(c) if c.eq_ignore_ascii_case(&expected) => {}
                _ => return false,
            }
        }

        match self.page.character_at(self.cursor.position()) {
            StreamEnd => true,
            Ch(c) => c == '>' || c == '/' || c.is_whitespace(),
        }
    }
}

/// Characters after `<` that start a tag
fn starts_tag(c: char) -> bool {
    c == '/' || c == '?' || c.is_alphabetic()
}

#[cfg(test)]
mod test {
    use super::*;

    fn lex(html: &str) -> Vec<Node> {
        let mut lexer = Lexer::new(Page::from_str(html, None));
        let mut nodes = Vec::new();
        while let Some(node) = lexer.next_node() {
            nodes.push(node);
        }
        nodes
    }

    fn round_trip(html: &str) -> String {
        lex(html).iter().map(|n| n.to_html(true)).collect()
    }

    macro_rules! assert_text {
        ($node:expr, $expected:expr) => {
            match &$node {
                Node::Text(text) => assert_eq!(text.text(), $expected),
                other => panic!("expected text {:?}, got {other:?}", $expected),
            }
        };
    }

    macro_rules! assert_tag {
        ($node:expr, $name:expr) => {
            match &$node {
                Node::Tag(tag) => assert_eq!(tag.tag_name(), $name),
                other => panic!("expected tag {}, got {other:?}", $name),
            }
        };
    }

    #[test]
    fn test_text_and_tags() {
        let nodes = lex("Hello <b>world</b>!");
        assert_eq!(nodes.len(), 5);
        assert_text!(nodes[0], "Hello ");
        assert_tag!(nodes[1], "B");
        assert_text!(nodes[2], "world");
        assert_tag!(nodes[3], "B");
        assert!(nodes[3].as_tag().unwrap().is_end_tag());
        assert_text!(nodes[4], "!");

        assert_eq!(nodes[1].start_position(), 6);
        assert_eq!(nodes[1].end_position(), 9);
    }

    #[test]
    fn test_empty_page() {
        assert!(lex("").is_empty());
    }

    #[test]
    fn test_stray_less_than() {
        let nodes = lex("a < b <= c");
        assert_eq!(nodes.len(), 1);
        assert_text!(nodes[0], "a < b <= c");

        let nodes = lex("x<");
        assert_eq!(nodes.len(), 1);
        assert_text!(nodes[0], "x<");

        let nodes = lex("<<p>");
        assert_eq!(nodes.len(), 2);
        assert_text!(nodes[0], "<");
        assert_tag!(nodes[1], "P");
    }

    #[test]
    fn test_whitespace_before_slash_is_text() {
        let nodes = lex("< /div>");
        assert_eq!(nodes.len(), 1);
        assert_text!(nodes[0], "< /div>");
    }

    #[test]
    fn test_attributes() {
        let nodes = lex("<a href=\"x.html\"  target = '_top' id=main checked>");
        let tag = nodes[0].as_tag().unwrap();
        assert_eq!(tag.attribute_value("href"), Some("x.html"));
        assert_eq!(tag.attribute("href").unwrap().quote(), Some('"'));
        assert_eq!(tag.attribute_value("target"), Some("_top"));
        assert_eq!(tag.attribute("target").unwrap().assignment(), Some(" = "));
        assert_eq!(tag.attribute_value("id"), Some("main"));
        assert_eq!(tag.attribute("id").unwrap().quote(), None);
        assert!(tag.attribute("checked").unwrap().is_standalone());

        // name, then whitespace and attribute pairs
        assert_eq!(tag.attributes().len(), 9);
        assert_eq!(tag.attributes()[3].value(), Some("  "));
    }

    #[test]
    fn test_empty_attribute() {
        let nodes = lex("<img alt= >");
        let tag = nodes[0].as_tag().unwrap();
        assert!(tag.attribute("alt").unwrap().is_empty());
        assert_eq!(tag.attribute_value("alt"), Some(""));
        assert_eq!(tag.to_html(true), "<img alt= >");
    }

    #[test]
    fn test_quoted_greater_than() {
        let nodes = lex("<a title=\"1 > 0\">x");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].as_tag().unwrap().attribute_value("title"), Some("1 > 0"));
    }

    #[test]
    fn test_unterminated_quote() {
        let nodes = lex("<a title=\"oops>text</a>");
        assert_eq!(nodes.len(), 3);
        let tag = nodes[0].as_tag().unwrap();
        assert_eq!(tag.attribute_value("title"), Some("\"oops"));
        assert_eq!(tag.attribute("title").unwrap().quote(), None);
        assert_text!(nodes[1], "text");
        assert_tag!(nodes[2], "A");
    }

    #[test]
    fn test_tag_ended_by_less_than() {
        let nodes = lex("<div class=x <p>y");
        assert_eq!(nodes.len(), 3);
        let tag = nodes[0].as_tag().unwrap();
        assert!(!tag.is_closed());
        assert_eq!(tag.attribute_value("class"), Some("x"));
        assert_tag!(nodes[1], "P");
        assert_text!(nodes[2], "y");
    }

    #[test]
    fn test_tag_at_end_of_page() {
        let nodes = lex("<div id=");
        assert_eq!(nodes.len(), 1);
        let tag = nodes[0].as_tag().unwrap();
        assert!(!tag.is_closed());
        assert!(tag.attribute("id").unwrap().is_empty());
    }

    #[test]
    fn test_remarks() {
        let nodes = lex("<!-- a -- b --><!---->x<!-- c -- >");
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[0].as_remark().unwrap().text(), " a -- b ");
        assert_eq!(nodes[1].as_remark().unwrap().text(), "");
        assert_text!(nodes[2], "x");
        assert_eq!(nodes[3].as_remark().unwrap().text(), " c ");
    }

    #[test]
    fn test_unterminated_remark() {
        let nodes = lex("<!-- never closed <b>");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].as_remark().unwrap().text(), " never closed <b>");
        assert_eq!(nodes[0].to_html(true), "<!-- never closed <b>");
        assert_eq!(nodes[0].to_html(false), "<!-- never closed <b>-->");
    }

    #[test]
    fn test_declarations() {
        let nodes = lex("<!DOCTYPE html><?xml version=\"1.0\"?><!>");
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].as_tag().unwrap().raw_tag_name(), "!DOCTYPE");
        assert_eq!(nodes[1].as_tag().unwrap().raw_tag_name(), "?xml");
        assert_eq!(nodes[2].as_remark().unwrap().text(), "");
    }

    #[test]
    fn test_round_trip_malformed() {
        for html in [
            "<html><body bgcolor=white><p>one<p>two</body></html>",
            "<a href='x\">y</a>",
            "<div class=x <p>y",
            "<!-- a --><!-- b",
            "<td\twidth = 10\n nowrap>cell</td >",
            "a < b > c <",
            "<br/><img src=x.gif />",
            "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 4.01//EN\">",
        ] {
            assert_eq!(round_trip(html), html);
        }
    }

    #[test]
    fn test_raw_text() {
        let html = "<script>if (a < b && c</b) x = '</scriptx>';</SCRIPT >after";
        let mut lexer = Lexer::new(Page::from_str(html, None));
        assert_tag!(lexer.next_node().unwrap(), "SCRIPT");

        let body = lexer.parse_raw_text("SCRIPT").unwrap();
        assert_eq!(body.text(), "if (a < b && c</b) x = '</scriptx>';");

        let end = lexer.next_node().unwrap();
        assert_tag!(end, "SCRIPT");
        assert_text!(lexer.next_node().unwrap(), "after");
    }

    #[test]
    fn test_raw_text_empty_and_unclosed() {
        let mut lexer = Lexer::new(Page::from_str("<style></style>", None));
        lexer.next_node();
        assert!(lexer.parse_raw_text("STYLE").is_none());

        let mut lexer = Lexer::new(Page::from_str("<style>p { }", None));
        lexer.next_node();
        assert_eq!(lexer.parse_raw_text("STYLE").unwrap().text(), "p { }");
        assert!(lexer.next_node().is_none());
    }

    #[test]
    fn test_reset_and_lines() {
        let mut lexer = Lexer::new(Page::from_str("<p>\nline two", None));
        lexer.next_node();
        lexer.next_node();
        assert!(lexer.at_end());
        assert_eq!(lexer.current_line_number(), 2);
        assert_eq!(lexer.current_line(), "line two");

        lexer.reset();
        assert_eq!(lexer.position(), 0);
        assert_tag!(lexer.next_node().unwrap(), "P");
    }
}
