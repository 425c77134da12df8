use crate::scanner::{default_scanner, Scanner, SemanticAction};
use lazy_static::lazy_static;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

const HEADINGS: [&str; 6] = ["H1", "H2", "H3", "H4", "H5", "H6"];

lazy_static! {
    static ref STANDARD_REGISTRY: Arc<ScannerRegistry> = Arc::new(ScannerRegistry::with_standard_scanners());
}

/// Maps tag names to the scanners that handle them.
///
/// A registry is filled before parsing starts and is only read afterwards; parsers share it
/// through an `Arc`. The standard registry is built once per process.
#[derive(Clone, Debug)]
pub struct ScannerRegistry {
    scanners: HashMap<String, Arc<Scanner>>,
    default: Arc<Scanner>,
}

impl Default for ScannerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ScannerRegistry {
    /// Creates a registry without any scanners; every tag is a leaf
    pub fn new() -> Self {
        Self {
            scanners: HashMap::new(),
            default: default_scanner(),
        }
    }

    /// The shared registry with the scanners for the standard HTML tags
    pub fn standard() -> Arc<ScannerRegistry> {
        Arc::clone(&STANDARD_REGISTRY)
    }

    /// Registers the scanner for all of its ids, replacing earlier registrations
    pub fn register(&mut self, scanner: Scanner) -> Arc<Scanner> {
        let scanner = Arc::new(scanner);
        for id in scanner.ids() {
            debug!("registering {:?} scanner for {id}", scanner.kind());
            self.scanners.insert(id.clone(), Arc::clone(&scanner));
        }
        scanner
    }

    /// Removes the scanner registered for the name
    pub fn remove(&mut self, name: &str) -> Option<Arc<Scanner>> {
        self.scanners.remove(&name.to_ascii_uppercase())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Scanner>> {
        self.scanners.get(&name.to_ascii_uppercase())
    }

    /// Returns the scanner for the tag name, or the default leaf scanner
    pub fn lookup(&self, name: &str) -> Arc<Scanner> {
        Arc::clone(self.get(name).unwrap_or(&self.default))
    }

    pub fn default_scanner(&self) -> &Arc<Scanner> {
        &self.default
    }

    /// Names with a registered scanner, in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scanners.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.scanners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scanners.is_empty()
    }

    /// Builds a registry with the scanners for the standard HTML tags
    pub fn with_standard_scanners() -> Self {
        let mut registry = Self::new();

        let body_html = ["BODY", "HTML"];

        registry.register(Scanner::composite(&["HTML"]));
        registry.register(
            Scanner::composite(&["HEAD"])
                .with_enders(&["HEAD", "BODY"])
                .with_end_tag_enders(&["HTML"]),
        );
        registry.register(
            Scanner::composite(&["BODY"])
                .with_enders(&["BODY"])
                .with_end_tag_enders(&["HTML"]),
        );
        registry.register(
            Scanner::composite(&["TITLE"])
                .with_enders(&["TITLE", "BODY"])
                .with_end_tag_enders(&["HEAD", "HTML"]),
        );
        registry.register(
            Scanner::composite(&["DIV"])
                .with_enders(&["BODY"])
                .with_end_tag_enders(&body_html),
        );
        registry.register(
            Scanner::composite(&["SPAN", "LABEL", "OBJECT", "APPLET", "TABLE", "FRAMESET"])
                .with_end_tag_enders(&body_html),
        );

        // a paragraph is closed by the start of any other block
        let mut blocks = vec![
            "ADDRESS", "BLOCKQUOTE", "CENTER", "DD", "DIR", "DIV", "DL", "DT", "FIELDSET", "FORM",
            "HR", "ISINDEX", "LI", "MENU", "NOFRAMES", "OL", "PARAM", "PRE", "UL",
        ];
        blocks.extend(HEADINGS);
        let mut p_enders = blocks.clone();
        p_enders.push("P");
        let mut p_end_tag_enders = blocks;
        p_end_tag_enders.extend(body_html);
        registry.register(
            Scanner::composite(&["P"])
                .with_enders(&p_enders)
                .with_end_tag_enders(&p_end_tag_enders),
        );

        registry.register(
            Scanner::composite(&["LI"])
                .with_enders(&["LI", "BODY", "HTML"])
                .with_end_tag_enders(&["UL", "OL", "BODY", "HTML"]),
        );
        registry.register(
            Scanner::composite(&["UL", "OL", "DL"])
                .with_enders(&body_html)
                .with_end_tag_enders(&body_html),
        );
        registry.register(
            Scanner::composite(&["DD", "DT"])
                .with_enders(&["DD", "DT", "DL"])
                .with_end_tag_enders(&["DL", "BODY", "HTML"]),
        );

        registry.register(
            Scanner::composite(&["TR"])
                .with_enders(&["TBODY", "TFOOT", "THEAD", "TR"])
                .with_end_tag_enders(&["TBODY", "TFOOT", "THEAD", "TABLE", "BODY", "HTML"]),
        );
        let cell_end_tag_enders = ["TBODY", "TFOOT", "THEAD", "TR", "TABLE", "BODY", "HTML"];
        registry.register(
            Scanner::composite(&["TD"])
                .with_enders(&["TBODY", "TD", "TFOOT", "THEAD", "TR"])
                .with_end_tag_enders(&cell_end_tag_enders),
        );
        registry.register(
            Scanner::composite(&["TH"])
                .with_enders(&["TBODY", "TD", "TFOOT", "TH", "THEAD", "TR"])
                .with_end_tag_enders(&cell_end_tag_enders),
        );

        registry.register(
            Scanner::composite(&["FORM"])
                .with_enders(&["FORM", "BODY", "HTML"])
                .with_end_tag_enders(&body_html),
        );
        registry.register(
            Scanner::composite(&["SELECT"])
                .with_enders(&["INPUT", "TEXTAREA", "SELECT"])
                .with_end_tag_enders(&["FORM", "BODY", "HTML"]),
        );
        registry.register(
            Scanner::composite(&["OPTION"])
                .with_enders(&["INPUT", "TEXTAREA", "SELECT", "OPTION"])
                .with_end_tag_enders(&["SELECT", "FORM", "BODY", "HTML"]),
        );
        registry.register(
            Scanner::composite(&["TEXTAREA"])
                .with_enders(&["INPUT", "TEXTAREA", "SELECT", "OPTION"])
                .with_end_tag_enders(&["FORM", "BODY", "HTML"]),
        );

        registry.register(
            Scanner::composite(&["A"])
                .with_enders(&["A", "P", "DIV", "TD", "TR", "FORM", "LI"])
                .with_end_tag_enders(&["P", "DIV", "TD", "TR", "FORM", "LI", "BODY", "HTML"]),
        );

        let mut heading_enders = HEADINGS.to_vec();
        heading_enders.push("PARAM");
        registry.register(
            Scanner::composite(&HEADINGS)
                .with_enders(&heading_enders)
                .with_end_tag_enders(&body_html),
        );

        registry.register(Scanner::raw_text(&["SCRIPT", "STYLE"]));
        registry.register(Scanner::leaf(&["META"]).with_action(SemanticAction::ContentTypeCharset));

        registry
    }
}
