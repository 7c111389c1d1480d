// ABOUTME: Attribute bindings: plain value, Bootstrap data-attribute pairs, presence and regex
// ABOUTME: href/src writes that change the value keep the editor's data-mce-* shadow attribute in sync

use super::dsl::BindingKind;
use super::error::Result;
use super::factory::{require_pair, split_pair};
use super::{dom_flag, dom_string, Binding, SHADOWED_ATTRIBUTES, SHADOW_PREFIX};
use crate::dom::Element;
use crate::pattern::CapturePattern;
use crate::value::{cast_value, CastKind, Value};

fn shadow_name(name: &str) -> Option<String> {
    SHADOWED_ATTRIBUTES
        .contains(&name)
        .then(|| format!("{}{}", SHADOW_PREFIX, name))
}

fn write_attribute(el: &Element, name: &str, value: &str) {
    el.set_attribute(name, value);
    if let Some(shadow) = shadow_name(name) {
        el.set_attribute(&shadow, value);
    }
}

fn clear_attribute(el: &Element, name: &str) {
    el.remove_attribute(name);
    if let Some(shadow) = shadow_name(name) {
        el.remove_attribute(&shadow);
    }
}

/// `data-bs-toggle`, `data-toggle` and `toggle` all name the `toggle` suffix
pub(crate) fn bs_suffix(name: &str) -> &str {
    let name = name.trim();
    name.strip_prefix("data-bs-")
        .or_else(|| name.strip_prefix("data-"))
        .unwrap_or(name)
}

/// Attribute names in read-preference order for a Bootstrap generation
fn bs_names(suffix: &str, version: u8) -> [String; 2] {
    let modern = format!("data-bs-{}", suffix);
    let legacy = format!("data-{}", suffix);
    if version >= 5 {
        [modern, legacy]
    } else {
        [legacy, modern]
    }
}

/// `attr(name)`: the attribute value, cast
pub struct AttrBinding {
    target: Option<Element>,
    name: String,
    cast: Option<CastKind>,
}

impl AttrBinding {
    pub fn new(target: Option<Element>, name: &str, cast: Option<CastKind>) -> Self {
        Self {
            target,
            name: name.trim().to_string(),
            cast,
        }
    }

    /// `data-bs-x` is mirrored to `data-x` for pre-5 markup
    fn mirror(&self) -> Option<String> {
        self.name
            .contains("-bs-")
            .then(|| self.name.replacen("-bs-", "-", 1))
    }
}

impl Binding for AttrBinding {
    fn get_value(&self) -> Value {
        self.target
            .as_ref()
            .and_then(|el| el.get_attribute(&self.name))
            .map(|value| cast_value(Value::String(value), self.cast.as_ref()))
            .unwrap_or(Value::Null)
    }

    fn set_value(&self, value: &Value) {
        let Some(el) = &self.target else { return };
        let mirror = self.mirror();

        if value.is_null() {
            clear_attribute(el, &self.name);
            if let Some(mirror) = mirror {
                el.remove_attribute(&mirror);
            }
            return;
        }

        let text = dom_string(value);
        if el.get_attribute(&self.name).as_deref() == Some(text.as_str()) {
            return;
        }
        write_attribute(el, &self.name, &text);
        if let Some(mirror) = mirror {
            el.set_attribute(&mirror, &text);
        }
    }

    fn kind(&self) -> &'static str {
        "attr"
    }
}

/// `attrBS(name, query?, cast?, version?)`
pub struct AttrBsBinding {
    target: Option<Element>,
    suffix: String,
    cast: Option<CastKind>,
    version: u8,
}

impl AttrBsBinding {
    pub fn new(target: Option<Element>, name: &str, cast: Option<CastKind>, version: u8) -> Self {
        Self {
            target,
            suffix: bs_suffix(name).to_string(),
            cast,
            version,
        }
    }
}

impl Binding for AttrBsBinding {
    fn get_value(&self) -> Value {
        let Some(el) = &self.target else {
            return Value::Null;
        };
        bs_names(&self.suffix, self.version)
            .iter()
            .find_map(|name| el.get_attribute(name))
            .map(|value| cast_value(Value::String(value), self.cast.as_ref()))
            .unwrap_or(Value::Null)
    }

    fn set_value(&self, value: &Value) {
        let Some(el) = &self.target else { return };
        let modern = format!("data-bs-{}", self.suffix);
        let legacy = format!("data-{}", self.suffix);

        if value.is_null() {
            el.remove_attribute(&modern);
            el.remove_attribute(&legacy);
            return;
        }

        let text = dom_string(value);
        el.set_attribute(&modern, &text);
        if self.version >= 5 {
            el.remove_attribute(&legacy);
        } else {
            el.set_attribute(&legacy, &text);
        }
    }

    fn kind(&self) -> &'static str {
        "attrBS"
    }
}

/// `hasAttr` / `notHasAttr` / `hasAttrBS` over `name` or `name=value`.
///
/// With an expected value, presence means the attribute holds exactly that
/// value. Writing `true` sets the attribute to the expected value (or the
/// empty string) unless it already counts as present; writing `false`
/// removes it only if it currently counts as present.
pub struct HasAttrBinding {
    target: Option<Element>,
    names: Vec<String>,
    expected: Option<String>,
    negate: bool,
    bs_version: Option<u8>,
}

impl HasAttrBinding {
    pub fn new(target: Option<Element>, spec: &str, negate: bool, bs_version: Option<u8>) -> Self {
        let (name, expected) = split_pair(spec, '=');
        let names = match bs_version {
            Some(version) => bs_names(bs_suffix(&name), version).to_vec(),
            None => vec![name],
        };
        Self {
            target,
            names,
            expected,
            negate,
            bs_version,
        }
    }

    fn is_present(&self, el: &Element) -> bool {
        self.names.iter().any(|name| match el.get_attribute(name) {
            Some(value) => self.expected.as_ref().map_or(true, |e| *e == value),
            None => false,
        })
    }
}

impl Binding for HasAttrBinding {
    fn get_value(&self) -> Value {
        match &self.target {
            Some(el) => Value::Bool(self.negate != self.is_present(el)),
            None => Value::Bool(false),
        }
    }

    fn set_value(&self, value: &Value) {
        let Some(el) = &self.target else { return };
        let wanted = self.negate != dom_flag(value);
        if wanted && self.is_present(el) {
            return;
        }
        let text = self.expected.clone().unwrap_or_default();

        match (wanted, self.bs_version) {
            (true, Some(version)) => {
                // names[0] is the version-preferred spelling
                let modern = format!("data-bs-{}", bs_suffix(&self.names[0]));
                el.set_attribute(&modern, &text);
                if version < 5 {
                    el.set_attribute(&format!("data-{}", bs_suffix(&self.names[0])), &text);
                }
            }
            (true, None) => write_attribute(el, &self.names[0], &text),
            (false, _) => {
                if self.is_present(el) {
                    for name in &self.names {
                        clear_attribute(el, name);
                    }
                }
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self.bs_version {
            Some(_) => "hasAttrBS",
            None => "hasAttr",
        }
    }
}

/// `attrRegex(name=pattern)`: a capture group inside an attribute value
pub struct AttrRegexBinding {
    target: Option<Element>,
    name: String,
    pattern: CapturePattern,
    cast: Option<CastKind>,
}

impl AttrRegexBinding {
    pub fn new(target: Option<Element>, spec: &str, cast: Option<CastKind>) -> Result<Self> {
        let (name, pattern) = require_pair(BindingKind::AttrRegex, spec, '=')?;
        Ok(Self {
            target,
            name,
            pattern: CapturePattern::new(&pattern)?,
            cast,
        })
    }
}

impl Binding for AttrRegexBinding {
    fn get_value(&self) -> Value {
        self.target
            .as_ref()
            .and_then(|el| el.get_attribute(&self.name))
            .and_then(|value| self.pattern.extract_first_group(&value))
            .map(|group| cast_value(Value::String(group), self.cast.as_ref()))
            .unwrap_or(Value::Null)
    }

    fn set_value(&self, value: &Value) {
        let Some(el) = &self.target else { return };
        if value.is_null() {
            return;
        }
        let current = el.get_attribute(&self.name);
        let updated = self
            .pattern
            .replace_or_synthesize(current.as_deref().unwrap_or_default(), &dom_string(value));
        if current.as_deref() == Some(updated.as_str()) {
            return;
        }
        write_attribute(el, &self.name, &updated);
    }

    fn kind(&self) -> &'static str {
        "attrRegex"
    }
}
