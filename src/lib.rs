//! Lenient HTML tokenizer and tree builder
//!
//! Turns a string, a byte buffer or a file into a tree of nodes, whatever the state of the
//! markup, and follows the charset a document declares for itself.
//!
//! ```
//! let nodes = tagsoup::parse_str("<ul><li>one<li>two</ul>").unwrap();
//! assert_eq!(nodes.len(), 1);
//! assert_eq!(nodes.to_html(false), "<ul><li>one</li><li>two</li></ul>");
//! ```

pub use tagsoup_html::{lexer, node, parser, scanner};
pub use tagsoup_shared::{page, types};

use std::path::Path;
use tagsoup_html::node::NodeList;
use tagsoup_html::parser::Parser;
use tagsoup_shared::page::Config;
use tagsoup_shared::types::Result;

/// Parses a string of HTML
pub fn parse_str(html: &str) -> Result<NodeList> {
    Parser::from_html(html).parse()
}

/// Parses raw bytes, detecting their charset
pub fn parse_bytes(bytes: Vec<u8>, config: Config) -> Result<NodeList> {
    Parser::from_bytes(bytes, None, config).parse()
}

/// Parses the file at the given path
pub fn parse_file<P: AsRef<Path>>(path: P, config: Config) -> Result<NodeList> {
    Parser::from_file(path, config)?.parse()
}
