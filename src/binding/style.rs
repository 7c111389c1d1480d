// ABOUTME: Inline-style bindings: presence of a property and a capture group inside its value
// ABOUTME: Every effective write re-serializes the style into the data-mce-style snapshot attribute

use tracing::debug;

use super::dsl::BindingKind;
use super::error::Result;
use super::factory::{require_pair, split_pair};
use super::{dom_flag, dom_string, Binding, SHADOW_PREFIX};
use crate::dom::Element;
use crate::pattern::CapturePattern;
use crate::value::{cast_value, CastKind, Value};

fn sync_style_snapshot(el: &Element) {
    let snapshot = format!("{}style", SHADOW_PREFIX);
    let style = el.style();
    if style.is_empty() {
        el.remove_attribute(&snapshot);
    } else {
        el.set_attribute(&snapshot, &style.to_css_text());
    }
}

/// `hasStyle` / `notHasStyle` over `property` or `property:value`
pub struct HasStyleBinding {
    target: Option<Element>,
    property: String,
    expected: Option<String>,
    negate: bool,
}

impl HasStyleBinding {
    pub fn new(target: Option<Element>, spec: &str, negate: bool) -> Self {
        let (property, expected) = split_pair(spec, ':');
        Self {
            target,
            property: property.to_ascii_lowercase(),
            expected: expected.filter(|e| !e.is_empty()),
            negate,
        }
    }

    fn is_present(&self, el: &Element) -> bool {
        match (el.style_property(&self.property), &self.expected) {
            (Some(actual), Some(expected)) => actual.trim().eq_ignore_ascii_case(expected),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

impl Binding for HasStyleBinding {
    fn get_value(&self) -> Value {
        match &self.target {
            Some(el) => Value::Bool(self.negate != self.is_present(el)),
            None => Value::Bool(false),
        }
    }

    fn set_value(&self, value: &Value) {
        let Some(el) = &self.target else { return };
        let wanted = self.negate != dom_flag(value);

        if wanted {
            if self.is_present(el) {
                return;
            }
            match &self.expected {
                Some(expected) => el.set_style_property(&self.property, expected),
                None => {
                    debug!("hasStyle('{}') has no value to add", self.property);
                    return;
                }
            }
        } else if self.is_present(el) {
            el.remove_style_property(&self.property);
        } else {
            return;
        }
        sync_style_snapshot(el);
    }

    fn kind(&self) -> &'static str {
        "hasStyle"
    }
}

/// `styleRegex(property:pattern)`: a capture group inside a style value
pub struct StyleRegexBinding {
    target: Option<Element>,
    property: String,
    pattern: CapturePattern,
    cast: Option<CastKind>,
}

impl StyleRegexBinding {
    pub fn new(target: Option<Element>, spec: &str, cast: Option<CastKind>) -> Result<Self> {
        let (property, pattern) = require_pair(BindingKind::StyleRegex, spec, ':')?;
        Ok(Self {
            target,
            property: property.to_ascii_lowercase(),
            pattern: CapturePattern::new(&pattern)?,
            cast,
        })
    }

    fn is_dimension(&self) -> bool {
        self.property.contains("width") || self.property.contains("height")
    }
}

impl Binding for StyleRegexBinding {
    fn get_value(&self) -> Value {
        self.target
            .as_ref()
            .and_then(|el| el.style_property(&self.property))
            .and_then(|value| self.pattern.extract_first_group(&value))
            .map(|group| cast_value(Value::String(group), self.cast.as_ref()))
            .unwrap_or(Value::Null)
    }

    fn set_value(&self, value: &Value) {
        let Some(el) = &self.target else { return };
        let current = el.style_property(&self.property);

        if value.is_null() || (self.is_dimension() && value.as_number() <= 0.0) {
            if current.is_none() {
                return;
            }
            el.remove_style_property(&self.property);
        } else {
            let updated = self
                .pattern
                .replace_or_synthesize(current.as_deref().unwrap_or_default(), &dom_string(value));
            if current.as_deref() == Some(updated.as_str()) {
                return;
            }
            el.set_style_property(&self.property, &updated);
        }
        sync_style_snapshot(el);
    }

    fn kind(&self) -> &'static str {
        "styleRegex"
    }
}
