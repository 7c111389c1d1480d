// ABOUTME: HTML fragment parsing into the element tree using the html5gum tokenizer
// ABOUTME: Lenient tree building for editor content: stray end tags are dropped, unclosed tags closed

use html5gum::{HtmlString, Token, Tokenizer};
use tracing::debug;

use super::element::{Element, Node, VOID_ELEMENTS};

/// Parsed HTML fragment. The container element is synthetic and never
/// serialized; only its children are content.
#[derive(Debug, Clone)]
pub struct Fragment {
    container: Element,
}

impl Fragment {
    pub fn new() -> Self {
        Self {
            container: Element::new("#fragment"),
        }
    }

    pub fn parse(html: &str) -> Self {
        let fragment = Self::new();
        let mut stack: Vec<Element> = vec![fragment.container.clone()];

        for token in Tokenizer::new(html).infallible() {
            match token {
                Token::StartTag(tag) => {
                    let name = decode(&tag.name).to_ascii_lowercase();
                    let element = Element::new(&name);
                    for (key, value) in &tag.attributes {
                        element.set_attribute(&decode(key), &decode(value));
                    }
                    current(&stack).append_child(Node::Element(element.clone()));
                    if !tag.self_closing && !VOID_ELEMENTS.contains(&name.as_str()) {
                        stack.push(element);
                    }
                }
                Token::EndTag(tag) => {
                    let name = decode(&tag.name).to_ascii_lowercase();
                    // Index 0 is the container and never matches a real tag
                    match stack.iter().rposition(|el| el.tag_name() == name) {
                        Some(index) if index > 0 => stack.truncate(index),
                        _ => debug!("Dropping stray end tag </{}>", name),
                    }
                }
                Token::String(text) => {
                    current(&stack).append_child(Node::Text(decode(&text)));
                }
                Token::Comment(text) => {
                    current(&stack).append_child(Node::Comment(decode(&text)));
                }
                Token::Doctype(_) => {}
                Token::Error(e) => debug!("HTML tokenizer error: {}", e),
            }
        }

        fragment
    }

    pub fn container(&self) -> &Element {
        &self.container
    }

    pub fn first_element(&self) -> Option<Element> {
        self.container.first_element_child()
    }

    pub fn append(&self, element: Element) {
        self.container.append_child(Node::Element(element));
    }

    pub fn query_selector(&self, selector: &str) -> super::error::Result<Option<Element>> {
        self.container.query_selector(selector)
    }

    pub fn to_html(&self) -> String {
        self.container.inner_html()
    }
}

impl Default for Fragment {
    fn default() -> Self {
        Self::new()
    }
}

fn current(stack: &[Element]) -> &Element {
    // The container is pushed first and never popped
    &stack[stack.len() - 1]
}

fn decode(s: &HtmlString) -> String {
    String::from_utf8_lossy(&s.0).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_fragment() {
        let fragment = Fragment::parse(
            r#"<div class="iedib-alerta iedib-alerta-border" style="width: 10px"><p>Hi <b>there</b></p><img src="a.png"></div>"#,
        );
        let root = fragment.first_element().unwrap();
        assert_eq!(root.tag_name(), "div");
        assert!(root.has_class("iedib-alerta-border"));
        assert_eq!(root.child_elements().len(), 2);
        assert_eq!(root.text_content(), "Hi there");
        assert!(root.query_selector("img[src]").unwrap().is_some());
    }

    #[test]
    fn test_round_trip_serialization() {
        let html = r#"<div class="a" data-x="1"><span>t</span><br></div>"#;
        assert_eq!(Fragment::parse(html).to_html(), html);
    }

    #[test]
    fn test_lenient_end_tags() {
        let fragment = Fragment::parse("<div><p>one</span></div>tail");
        assert_eq!(fragment.to_html(), "<div><p>one</p></div>tail");
    }
}
