use tagsoup::node::Node;
use tagsoup::scanner::ScannerRegistry;
use test_case::test_case;

fn find<'a>(nodes: &'a [Node], name: &str) -> Option<&'a Node> {
    for node in nodes {
        if node.as_tag().is_some_and(|tag| !tag.is_end_tag() && tag.tag_name() == name) {
            return Some(node);
        }
        if let Some(found) = find(node.children(), name) {
            return Some(found);
        }
    }
    None
}

#[test]
fn every_composite_is_closed_by_its_end_tag() {
    let registry = ScannerRegistry::standard();
    let composites: Vec<&str> = registry
        .names()
        .filter(|name| registry.lookup(name).is_composite())
        .collect();
    assert!(composites.len() > 30);

    for name in composites {
        for html in [
            format!("<{name}>x</{name}>"),
            format!("<{}>x</{}>", name.to_lowercase(), name.to_lowercase()),
        ] {
            let nodes = tagsoup::parse_str(&html).unwrap();
            assert_eq!(nodes.len(), 1, "{html}");

            let composite = nodes.get(0).and_then(Node::as_composite).unwrap();
            let end_tag = composite.end_tag().unwrap();
            assert!(end_tag.tag_name().eq_ignore_ascii_case(name), "{html}");
            assert_eq!(composite.child_count(), 1, "{html}");
        }
    }
}

#[test]
fn unclosed_composite_takes_every_following_node() {
    let nodes = tagsoup::parse_str("<div>a<!--c--><br>b</span>").unwrap();
    assert_eq!(nodes.len(), 1);

    let div = nodes.get(0).and_then(Node::as_composite).unwrap();
    assert!(div.end_tag().is_none());
    assert_eq!(div.child_count(), 5);
}

#[test]
fn deeply_nested_unclosed_tags() {
    let depth = 10_000;
    let html = format!("{}deep", "<span>".repeat(depth));
    let nodes = tagsoup::parse_str(&html).unwrap();
    assert_eq!(nodes.len(), 1);

    let mut levels = 0;
    let mut node = nodes.get(0).unwrap();
    while let Some(span) = node.as_composite() {
        assert!(span.end_tag().is_none());
        node = &span.children()[0];
        levels += 1;
    }
    assert_eq!(levels, depth);
    assert_eq!(node.as_text().unwrap().text(), "deep");
    assert_eq!(nodes.as_string(), "deep");
    assert_eq!(nodes.to_html(true), html);
    assert!(nodes.to_html(false).ends_with(&"</span>".repeat(depth)));
}

#[test]
fn ender_becomes_next_sibling() {
    let nodes = tagsoup::parse_str("<LI>A<LI>B").unwrap();
    assert_eq!(nodes.len(), 2);

    for (node, text) in nodes.iter().zip(["A", "B"]) {
        let li = node.as_composite().unwrap();
        assert!(li.end_tag().is_none());
        assert_eq!(li.child_count(), 1);
        assert_eq!(li.children()[0].as_text().unwrap().text(), text);
    }
}

#[test]
fn nested_composites() {
    let nodes = tagsoup::parse_str("<DIV><P>Hi</P></DIV>").unwrap();
    assert_eq!(nodes.len(), 1);

    let div = nodes.get(0).and_then(Node::as_composite).unwrap();
    assert_eq!(div.tag_name(), "DIV");
    assert_eq!(div.child_count(), 1);

    let p = div.children()[0].as_composite().unwrap();
    assert_eq!(p.tag_name(), "P");
    assert_eq!(p.child_count(), 1);
    assert_eq!(p.children()[0].as_text().unwrap().text(), "Hi");
}

#[test_case("href", Some("notes.html"))]
#[test_case("HREF", Some("notes.html"))]
#[test_case("Target", Some("_blank"))]
#[test_case("title", None)]
fn attribute_lookup(name: &str, expected: Option<&str>) {
    let nodes = tagsoup::parse_str("<p>See the <a href=\"notes.html\" target=_blank>notes</a>.</p>").unwrap();
    let a = find(nodes.as_slice(), "A").and_then(Node::as_tag).unwrap();
    assert_eq!(a.attribute_value(name), expected);
}

#[test]
fn document_structure() {
    let html = std::fs::read_to_string(format!("{}/tests/data/well_formed.html", env!("CARGO_MANIFEST_DIR"))).unwrap();
    let nodes = tagsoup::parse_str(&html).unwrap();

    let html_node = find(nodes.as_slice(), "HTML").unwrap();
    let children: Vec<String> = html_node
        .children()
        .iter()
        .filter_map(Node::as_tag)
        .map(|tag| tag.tag_name())
        .collect();
    assert_eq!(children, ["HEAD", "BODY"]);

    let title = find(nodes.as_slice(), "TITLE").unwrap();
    assert_eq!(title.to_plain_text_string(), "Quarterly report");

    let table = find(nodes.as_slice(), "TABLE").unwrap();
    let rows = table.children().iter().filter(|node| node.as_composite().is_some()).count();
    assert_eq!(rows, 2);

    let script = find(nodes.as_slice(), "SCRIPT").unwrap();
    assert_eq!(script.children().len(), 1);
    assert!(script.to_plain_text_string().contains("</div>"));
}

#[test]
fn malformed_document_structure() {
    let html = std::fs::read_to_string(format!("{}/tests/data/malformed.html", env!("CARGO_MANIFEST_DIR"))).unwrap();
    let nodes = tagsoup::parse_str(&html).unwrap();

    let body = find(nodes.as_slice(), "BODY").unwrap();
    let paragraphs = body
        .children()
        .iter()
        .filter(|node| node.as_composite().is_some_and(|c| c.tag_name() == "P"))
        .count();
    assert_eq!(paragraphs, 2);

    let ul = find(nodes.as_slice(), "UL").unwrap();
    let items = ul.children().iter().filter(|node| node.as_composite().is_some()).count();
    assert_eq!(items, 2);

    let a = find(nodes.as_slice(), "A").and_then(Node::as_tag).unwrap();
    assert_eq!(a.attribute_value("href"), Some("\"broken.html"));

    let text = nodes.as_string();
    assert!(text.contains("< not a tag > and a stray"));
}
