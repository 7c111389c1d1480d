// ABOUTME: Class-based bindings: presence of a class and a capture group inside a class name
// ABOUTME: classRegex rewrites the matching class in place so other classes keep their order

use tracing::debug;

use super::error::Result;
use super::{dom_flag, dom_string, Binding};
use crate::dom::Element;
use crate::pattern::CapturePattern;
use crate::value::{cast_value, CastKind, Value};

/// `hasClass` / `notHasClass`: reads `negate XOR present`
pub struct HasClassBinding {
    target: Option<Element>,
    class: String,
    negate: bool,
}

impl HasClassBinding {
    pub fn new(target: Option<Element>, class: &str, negate: bool) -> Self {
        Self {
            target,
            class: class.trim().to_string(),
            negate,
        }
    }
}

impl Binding for HasClassBinding {
    fn get_value(&self) -> Value {
        match &self.target {
            Some(el) => Value::Bool(self.negate != el.has_class(&self.class)),
            None => Value::Bool(false),
        }
    }

    fn set_value(&self, value: &Value) {
        let Some(el) = &self.target else { return };
        if self.negate != dom_flag(value) {
            el.add_class(&self.class);
        } else {
            el.remove_class(&self.class);
        }
    }

    fn kind(&self) -> &'static str {
        "hasClass"
    }
}

/// `classRegex`: the first capture group of the first class matching the
/// pattern
pub struct ClassRegexBinding {
    target: Option<Element>,
    pattern: CapturePattern,
    cast: Option<CastKind>,
}

impl ClassRegexBinding {
    pub fn new(target: Option<Element>, pattern: &str, cast: Option<CastKind>) -> Result<Self> {
        Ok(Self {
            target,
            pattern: CapturePattern::new(pattern)?,
            cast,
        })
    }

    fn matching_class(&self, el: &Element) -> Option<String> {
        el.class_list()
            .into_iter()
            .find(|class| self.pattern.is_match(class))
    }
}

impl Binding for ClassRegexBinding {
    fn get_value(&self) -> Value {
        let Some(el) = &self.target else {
            return Value::Null;
        };
        el.class_list()
            .iter()
            .find_map(|class| self.pattern.extract_first_group(class))
            .map(|group| cast_value(Value::String(group), self.cast.as_ref()))
            .unwrap_or(Value::Null)
    }

    fn set_value(&self, value: &Value) {
        let Some(el) = &self.target else { return };
        let current = self.matching_class(el);

        if value.is_null() {
            if let Some(class) = current {
                el.remove_class(&class);
            }
            return;
        }

        let replacement = dom_string(value);
        match current {
            Some(class) => {
                let updated = self.pattern.replace_or_synthesize(&class, &replacement);
                debug!("classRegex: {} -> {}", class, updated);
                el.replace_class(&class, &updated);
            }
            None => el.add_class(&self.pattern.synthesize(&replacement)),
        }
    }

    fn kind(&self) -> &'static str {
        "classRegex"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert() -> Element {
        Element::new("div").with_attribute("class", "iedib-alerta iedib-alerta-border shadow")
    }

    #[test]
    fn test_has_class_xor() {
        let el = alert();
        for negate in [false, true] {
            let binding = HasClassBinding::new(Some(el.clone()), "shadow", negate);
            assert_eq!(binding.get_value(), Value::Bool(!negate));
        }

        let binding = HasClassBinding::new(Some(el.clone()), "shadow", true);
        binding.set_value(&Value::Bool(true));
        assert!(!el.has_class("shadow"));
        binding.set_value(&Value::from("false"));
        assert!(el.has_class("shadow"));
    }

    #[test]
    fn test_class_regex_splices_in_place() {
        let el = alert();
        let binding =
            ClassRegexBinding::new(Some(el.clone()), "iedib-(alerta|important)-border", None).unwrap();
        assert_eq!(binding.get_value(), Value::from("alerta"));

        binding.set_value(&Value::from("important"));
        assert_eq!(
            el.get_attribute("class").unwrap(),
            "iedib-alerta iedib-important-border shadow"
        );
        assert_eq!(binding.get_value(), Value::from("important"));
    }

    #[test]
    fn test_class_regex_synthesizes_when_absent() {
        let el = Element::new("div").with_attribute("class", "box");
        let binding = ClassRegexBinding::new(
            Some(el.clone()),
            "^col-(\\d+)$",
            Some(CastKind::Number),
        )
        .unwrap();
        assert_eq!(binding.get_value(), Value::Null);

        binding.set_value(&Value::from(6));
        assert_eq!(el.get_attribute("class").unwrap(), "box col-6");
        assert_eq!(binding.get_value(), Value::Number(6.0));

        binding.set_value(&Value::Null);
        assert_eq!(el.get_attribute("class").unwrap(), "box");
    }

    #[test]
    fn test_missing_target() {
        let binding = ClassRegexBinding::new(None, "a-(.*)", None).unwrap();
        assert_eq!(binding.get_value(), Value::Null);
        binding.set_value(&Value::from("x"));

        let has = HasClassBinding::new(None, "x", true);
        assert_eq!(has.get_value(), Value::Bool(false));
    }
}
