// ABOUTME: Shared-ownership element tree standing in for the host editor's DOM
// ABOUTME: Provides attribute, class list, inline style, query and serialization operations

use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::error::Result;
use super::selector::SelectorList;
use super::style::InlineStyle;

/// Elements that never have children or a closing tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug)]
struct ElementData {
    tag: String,
    attributes: IndexMap<String, String>,
    children: Vec<Node>,
}

/// Handle to an element. Clones share the same underlying node, so a
/// binding holding an `Element` sees every write made through any handle.
#[derive(Clone)]
pub struct Element(Rc<RefCell<ElementData>>);

impl Element {
    pub fn new(tag: &str) -> Self {
        Element(Rc::new(RefCell::new(ElementData {
            tag: tag.to_ascii_lowercase(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        })))
    }

    /// Builder-style attribute setter, handy when assembling trees in code
    pub fn with_attribute(self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_child(self, child: Element) -> Self {
        self.append_child(Node::Element(child));
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        self.append_child(Node::Text(text.to_string()));
        self
    }

    pub fn tag_name(&self) -> String {
        self.0.borrow().tag.clone()
    }

    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // Attributes

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.0
            .borrow()
            .attributes
            .get(&name.to_ascii_lowercase())
            .cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.0
            .borrow()
            .attributes
            .contains_key(&name.to_ascii_lowercase())
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        self.0
            .borrow_mut()
            .attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    pub fn remove_attribute(&self, name: &str) -> bool {
        self.0
            .borrow_mut()
            .attributes
            .shift_remove(&name.to_ascii_lowercase())
            .is_some()
    }

    pub fn attributes(&self) -> Vec<(String, String)> {
        self.0
            .borrow()
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    // Class list

    /// Classes in declaration order, duplicates removed
    pub fn class_list(&self) -> Vec<String> {
        let mut classes: Vec<String> = Vec::new();
        if let Some(attr) = self.get_attribute("class") {
            for class in attr.split_whitespace() {
                if !classes.iter().any(|c| c == class) {
                    classes.push(class.to_string());
                }
            }
        }
        classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_list().iter().any(|c| c == class)
    }

    pub fn add_class(&self, class: &str) {
        let class = class.trim();
        if class.is_empty() || self.has_class(class) {
            return;
        }
        let mut classes = self.class_list();
        classes.push(class.to_string());
        self.set_attribute("class", &classes.join(" "));
    }

    pub fn remove_class(&self, class: &str) {
        if !self.has_attribute("class") {
            return;
        }
        let classes: Vec<String> = self
            .class_list()
            .into_iter()
            .filter(|c| c != class)
            .collect();
        self.set_attribute("class", &classes.join(" "));
    }

    /// Replace `old` with `new` at the same position in the class list
    pub fn replace_class(&self, old: &str, new: &str) {
        let new = new.trim();
        if old == new {
            return;
        }
        let mut classes = self.class_list();
        let Some(index) = classes.iter().position(|c| c == old) else {
            self.add_class(new);
            return;
        };
        if new.is_empty() || classes.iter().any(|c| c == new) {
            classes.remove(index);
        } else {
            classes[index] = new.to_string();
        }
        self.set_attribute("class", &classes.join(" "));
    }

    // Inline style

    pub fn style(&self) -> InlineStyle {
        self.get_attribute("style")
            .map(|s| InlineStyle::parse(&s))
            .unwrap_or_default()
    }

    pub fn style_property(&self, property: &str) -> Option<String> {
        self.style().get(property).map(str::to_string)
    }

    pub fn set_style_property(&self, property: &str, value: &str) {
        let mut style = self.style();
        style.set(property, value);
        self.write_style(&style);
    }

    pub fn remove_style_property(&self, property: &str) {
        if !self.has_attribute("style") {
            return;
        }
        let mut style = self.style();
        style.remove(property);
        self.write_style(&style);
    }

    fn write_style(&self, style: &InlineStyle) {
        if style.is_empty() {
            self.remove_attribute("style");
        } else {
            self.set_attribute("style", &style.to_css_text());
        }
    }

    // Tree

    pub fn children(&self) -> Vec<Node> {
        self.0.borrow().children.clone()
    }

    pub fn child_elements(&self) -> Vec<Element> {
        self.0
            .borrow()
            .children
            .iter()
            .filter_map(|node| match node {
                Node::Element(el) => Some(el.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn first_element_child(&self) -> Option<Element> {
        self.child_elements().into_iter().next()
    }

    /// Append a node, merging adjacent text nodes
    pub fn append_child(&self, node: Node) {
        let mut data = self.0.borrow_mut();
        if let Node::Text(text) = &node {
            if let Some(Node::Text(last)) = data.children.last_mut() {
                last.push_str(text);
                return;
            }
        }
        data.children.push(node);
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in self.children() {
            match child {
                Node::Text(text) => out.push_str(&text),
                Node::Element(el) => out.push_str(&el.text_content()),
                Node::Comment(_) => {}
            }
        }
        out
    }

    pub fn set_text_content(&self, text: &str) {
        let mut data = self.0.borrow_mut();
        data.children.clear();
        if !text.is_empty() {
            data.children.push(Node::Text(text.to_string()));
        }
    }

    /// Depth-first descendants, each with its ancestor chain (root first)
    pub(crate) fn descendants_with_ancestors(&self) -> Vec<(Element, Vec<Element>)> {
        fn walk(el: &Element, ancestors: &mut Vec<Element>, out: &mut Vec<(Element, Vec<Element>)>) {
            ancestors.push(el.clone());
            for child in el.child_elements() {
                out.push((child.clone(), ancestors.clone()));
                walk(&child, ancestors, out);
            }
            ancestors.pop();
        }
        let mut out = Vec::new();
        walk(self, &mut Vec::new(), &mut out);
        out
    }

    /// First descendant matching `selector`, in document order
    pub fn query_selector(&self, selector: &str) -> Result<Option<Element>> {
        let selectors = SelectorList::parse(selector)?;
        Ok(self
            .descendants_with_ancestors()
            .into_iter()
            .find(|(el, ancestors)| selectors.matches(el, ancestors))
            .map(|(el, _)| el))
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<Element>> {
        let selectors = SelectorList::parse(selector)?;
        Ok(self
            .descendants_with_ancestors()
            .into_iter()
            .filter(|(el, ancestors)| selectors.matches(el, ancestors))
            .map(|(el, _)| el)
            .collect())
    }

    /// Whether this element itself matches `selector` (no ancestor context)
    pub fn matches(&self, selector: &str) -> Result<bool> {
        Ok(SelectorList::parse(selector)?.matches(self, &[]))
    }

    // Serialization

    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }

    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in self.children() {
            write_node(&child, &mut out);
        }
        out
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Element")
            .field("tag", &data.tag)
            .field("attributes", &data.attributes)
            .field("children", &data.children.len())
            .finish()
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(el) => write_element(el, out),
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}

fn write_element(el: &Element, out: &mut String) {
    let tag = el.tag_name();
    out.push('<');
    out.push_str(&tag);
    for (name, value) in el.attributes() {
        out.push(' ');
        out.push_str(&name);
        out.push_str("=\"");
        out.push_str(&escape_attribute(&value));
        out.push('"');
    }
    out.push('>');
    if VOID_ELEMENTS.contains(&tag.as_str()) {
        return;
    }
    for child in el.children() {
        write_node(&child, out);
    }
    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
