use crate::node::Tag;
use encoding_rs::Encoding;
use log::{debug, warn};
use tagsoup_shared::page::{lookup_charset, Confidence, Page};

/// Side effect a scanner has once it completed a node
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SemanticAction {
    #[default]
    None,
    /// Switch the page to the charset a META tag declares
    ContentTypeCharset,
}

/// What the parser has to do after a semantic action
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Continue,
    /// Scan the page again from the start with the given charset
    Restart(&'static Encoding),
}

impl SemanticAction {
    pub fn perform(&self, tag: &Tag, page: &Page) -> Action {
        match self {
            SemanticAction::None => Action::Continue,
            SemanticAction::ContentTypeCharset => content_type_charset(tag, page),
        }
    }
}

/// Handles `<meta http-equiv="Content-Type" content="text/html; charset=...">` and
/// `<meta charset="...">`
fn content_type_charset(tag: &Tag, page: &Page) -> Action {
    let declared = if let Some(charset) = tag.attribute_value("CHARSET") {
        match lookup_charset(charset) {
            Ok(encoding) => Some(encoding),
            Err(err) => {
                warn!("{err}, ignoring meta charset");
                None
            }
        }
    } else if tag
        .attribute_value("HTTP-EQUIV")
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("Content-Type"))
    {
        let content = tag.attribute_value("CONTENT").unwrap_or_default();
        Some(page.charset_from(content))
    } else {
        None
    };

    let Some(encoding) = declared else {
        return Action::Continue;
    };

    // bytes that were readable as ASCII cannot be UTF-16
    let encoding = encoding.output_encoding();

    if page.confidence() == Confidence::Certain {
        debug!(
            "ignoring declared charset {}, page charset {} is certain",
            encoding.name(),
            page.charset()
        );
        return Action::Continue;
    }

    if encoding == page.encoding() {
        Action::Continue
    } else {
        Action::Restart(encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::node::Node;
    use tagsoup_shared::page::Config;

    fn meta_on(html: &str, page_charset: &'static Encoding) -> Action {
        let config = Config {
            default_charset: page_charset,
            detect_charset: false,
            ..Config::default()
        };
        let mut lexer = Lexer::new(Page::from_bytes(html.as_bytes().to_vec(), None, config));
        let Some(Node::Tag(tag)) = lexer.next_node() else {
            panic!("expected a tag");
        };
        SemanticAction::ContentTypeCharset.perform(&tag, lexer.page())
    }

    #[test]
    fn http_equiv() {
        let html = "<META HTTP-EQUIV=content-type CONTENT=\"text/html; charset=iso-8859-2\">";
        assert_eq!(meta_on(html, encoding_rs::UTF_8), Action::Restart(encoding_rs::ISO_8859_2));
        assert_eq!(meta_on(html, encoding_rs::ISO_8859_2), Action::Continue);
    }

    #[test]
    fn charset_attribute() {
        let html = "<meta charset=utf-8>";
        assert_eq!(meta_on(html, encoding_rs::WINDOWS_1252), Action::Restart(encoding_rs::UTF_8));
        assert_eq!(meta_on("<meta charset=klingon>", encoding_rs::WINDOWS_1252), Action::Continue);
    }

    #[test]
    fn utf16_means_utf8() {
        assert_eq!(
            meta_on("<meta charset=utf-16le>", encoding_rs::WINDOWS_1252),
            Action::Restart(encoding_rs::UTF_8)
        );
    }

    #[test]
    fn missing_charset_falls_back_to_default() {
        let html = "<meta http-equiv=\"Content-Type\" content=\"text/html\">";
        assert_eq!(meta_on(html, encoding_rs::WINDOWS_1252), Action::Continue);
    }

    #[test]
    fn other_meta_tags() {
        let html = "<meta name=keywords content=\"charset=utf-8\">";
        assert_eq!(meta_on(html, encoding_rs::WINDOWS_1252), Action::Continue);
    }

    #[test]
    fn certain_page() {
        let mut lexer = Lexer::new(Page::from_str("<meta charset=koi8-r>", None));
        let Some(Node::Tag(tag)) = lexer.next_node() else {
            panic!("expected a tag");
        };
        assert_eq!(SemanticAction::ContentTypeCharset.perform(&tag, lexer.page()), Action::Continue);
        assert_eq!(SemanticAction::None.perform(&tag, lexer.page()), Action::Continue);
    }
}
