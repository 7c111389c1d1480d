// ABOUTME: Minimal DOM used as the binding target: elements, selectors, styles and HTML I/O
// ABOUTME: Single-threaded shared ownership (Rc/RefCell), mirroring a browser's live node tree

pub mod element;
pub mod error;
pub mod html;
pub mod selector;
pub mod style;

pub use element::{Element, Node};
pub use error::{DomError, Result};
pub use html::Fragment;
pub use selector::SelectorList;
pub use style::InlineStyle;
