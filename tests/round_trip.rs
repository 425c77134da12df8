use tagsoup::parser::Parser;
use test_case::test_case;

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(path).unwrap()
}

#[test_case("well_formed.html")]
#[test_case("malformed.html")]
fn fixture_round_trip(name: &str) {
    let html = fixture(name);
    let nodes = tagsoup::parse_str(&html).unwrap();
    assert_eq!(nodes.to_html(true), html);
}

#[test_case("" ; "empty")]
#[test_case("just text" ; "text only")]
#[test_case("<p>a<p>b" ; "implicit paragraphs")]
#[test_case("<div><span>x</div>" ; "ancestor end tag")]
#[test_case("<a href=x.html title='a \"quoted\" title'>x</a>" ; "mixed quotes")]
#[test_case("<td\n  nowrap\n  width = 10 >" ; "whitespace in tags")]
#[test_case("<img src=\"x.gif\"" ; "unclosed tag")]
#[test_case("<a href=\"x>y</a>" ; "unterminated quote")]
#[test_case("<!-- a --><!-- b -- ><!---->" ; "remarks")]
#[test_case("<script><!-- if (a<b) {} //--></script>" ; "script body")]
#[test_case("</p></p>stray" ; "stray end tags")]
#[test_case("<br/><hr /><div/>" ; "empty xml tags")]
#[test_case("<?xml version=\"1.0\"?><!DOCTYPE html>" ; "declarations")]
fn inline_round_trip(html: &str) {
    let nodes = tagsoup::parse_str(html).unwrap();
    assert_eq!(nodes.to_html(true), html);
}

#[test_case("<p>a<p>b", "<p>a</p><p>b</p>")]
#[test_case("<div><span>x</div>", "<div><span>x</span></div>")]
#[test_case("<!-- open", "<!-- open-->")]
#[test_case("<img src=x", "<img src=x>")]
#[test_case("<div/>", "<div/>")]
#[test_case("<a href=\"x>y</a>", "<a href='\"x'>y</a>")]
fn generated_html(html: &str, expected: &str) {
    let nodes = tagsoup::parse_str(html).unwrap();
    assert_eq!(nodes.to_html(false), expected);
}

#[test]
fn edited_tree_serializes_edits() {
    let mut parser = Parser::from_html("<a href='old.html' class=x>link</a>");
    let mut node = parser.next_node().unwrap().unwrap();

    let tag = node.as_tag_mut().unwrap();
    tag.set_attribute("HREF", "new.html");
    tag.remove_attribute("class");
    tag.set_attribute("title", "it's new");

    assert_eq!(node.to_html(true), "<a href='new.html' title=\"it's new\">link</a>");
}
