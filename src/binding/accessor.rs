// ABOUTME: Bindings built from author-supplied getter/setter expressions
// ABOUTME: Expressions run in keep-functions mode against an element vocabulary bound to the target

use tracing::{debug, warn};

use super::dom_string;
use super::error::Result;
use super::Binding;
use crate::dom::Element;
use crate::expr::{self, EvalError, Expr, FunctionMode, Scope};
use crate::value::Value;

/// Name of the incoming value inside a setter expression
pub const SETTER_VARIABLE: &str = "v";

/// Which element API the accessor expressions are written against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vocabulary {
    /// Wrapped-element calls: `attr`, `hasClass`, `css`, `text`, ...
    Legacy,
    /// Raw-element calls: `getAttribute`, `classList.add`, `style.setProperty`, ...
    Direct,
}

pub struct AccessorBinding {
    target: Option<Element>,
    vocabulary: Vocabulary,
    getter: Expr,
    setter: Option<Expr>,
}

impl AccessorBinding {
    pub fn new(
        target: Option<Element>,
        vocabulary: Vocabulary,
        getter: &str,
        setter: Option<&str>,
    ) -> Result<Self> {
        let getter = expr::compile(getter)?;
        let setter = setter
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(expr::compile)
            .transpose()?;
        Ok(Self {
            target,
            vocabulary,
            getter,
            setter,
        })
    }

    fn scope_for(&self, el: &Element) -> Scope {
        let mut scope = Scope::new();
        match self.vocabulary {
            Vocabulary::Legacy => define_legacy(&mut scope, el),
            Vocabulary::Direct => define_direct(&mut scope, el),
        }
        scope
    }
}

impl Binding for AccessorBinding {
    fn get_value(&self) -> Value {
        let Some(el) = &self.target else {
            return Value::Null;
        };
        let scope = self.scope_for(el);
        match expr::evaluate_compiled(&scope, &self.getter, FunctionMode::Keep) {
            Ok(value) => value,
            Err(e) => {
                warn!("Accessor getter failed: {}", e);
                Value::Null
            }
        }
    }

    fn set_value(&self, value: &Value) {
        let Some(el) = &self.target else { return };
        let Some(setter) = &self.setter else {
            debug!("Accessor binding has no setter; ignoring write");
            return;
        };
        let mut scope = self.scope_for(el);
        scope.set(SETTER_VARIABLE, value.clone());
        if let Err(e) = expr::evaluate_compiled(&scope, setter, FunctionMode::Keep) {
            warn!("Accessor setter failed: {}", e);
        }
    }

    fn kind(&self) -> &'static str {
        match self.vocabulary {
            Vocabulary::Legacy => "accessor",
            Vocabulary::Direct => "directAccessor",
        }
    }
}

fn string_arg(function: &str, args: &[Value], index: usize) -> expr::Result<String> {
    match args.get(index) {
        Some(Value::Null) | None => Err(EvalError::InvalidArguments {
            function: function.to_string(),
            reason: format!("missing argument {}", index + 1),
        }),
        Some(value) => Ok(dom_string(value)),
    }
}

fn define<F>(scope: &mut Scope, el: &Element, name: &'static str, body: F)
where
    F: Fn(&Element, &[Value]) -> expr::Result<Value> + 'static,
{
    let el = el.clone();
    scope.define_function(name, move |args| body(&el, args));
}

fn toggle(el: &Element, class: &str, force: Option<&Value>) -> Value {
    let on = match force {
        Some(flag) if !flag.is_null() => flag.is_truthy(),
        _ => !el.has_class(class),
    };
    if on {
        el.add_class(class);
    } else {
        el.remove_class(class);
    }
    Value::Bool(on)
}

fn write_text(el: &Element, args: &[Value]) -> Value {
    match args.first() {
        Some(value) => {
            el.set_text_content(&dom_string(value));
            Value::Null
        }
        None => Value::String(el.text_content()),
    }
}

fn define_legacy(scope: &mut Scope, el: &Element) {
    define(scope, el, "attr", |el, args| {
        let name = string_arg("attr", args, 0)?;
        match args.get(1) {
            None => Ok(el.get_attribute(&name).map(Value::String).unwrap_or(Value::Null)),
            Some(Value::Null) => {
                el.remove_attribute(&name);
                Ok(Value::Null)
            }
            Some(value) => {
                el.set_attribute(&name, &dom_string(value));
                Ok(Value::Null)
            }
        }
    });
    define(scope, el, "removeAttr", |el, args| {
        el.remove_attribute(&string_arg("removeAttr", args, 0)?);
        Ok(Value::Null)
    });
    define(scope, el, "hasClass", |el, args| {
        Ok(Value::Bool(el.has_class(&string_arg("hasClass", args, 0)?)))
    });
    define(scope, el, "addClass", |el, args| {
        el.add_class(&string_arg("addClass", args, 0)?);
        Ok(Value::Null)
    });
    define(scope, el, "removeClass", |el, args| {
        el.remove_class(&string_arg("removeClass", args, 0)?);
        Ok(Value::Null)
    });
    define(scope, el, "toggleClass", |el, args| {
        let class = string_arg("toggleClass", args, 0)?;
        Ok(toggle(el, &class, args.get(1)))
    });
    define(scope, el, "css", |el, args| {
        let property = string_arg("css", args, 0)?;
        match args.get(1) {
            None => Ok(Value::String(el.style_property(&property).unwrap_or_default())),
            Some(value) => {
                el.set_style_property(&property, &dom_string(value));
                Ok(Value::Null)
            }
        }
    });
    define(scope, el, "text", |el, args| Ok(write_text(el, args)));
}

fn define_direct(scope: &mut Scope, el: &Element) {
    define(scope, el, "getAttribute", |el, args| {
        let name = string_arg("getAttribute", args, 0)?;
        Ok(el.get_attribute(&name).map(Value::String).unwrap_or(Value::Null))
    });
    define(scope, el, "setAttribute", |el, args| {
        let name = string_arg("setAttribute", args, 0)?;
        let value = args.get(1).map(dom_string).unwrap_or_default();
        el.set_attribute(&name, &value);
        Ok(Value::Null)
    });
    define(scope, el, "removeAttribute", |el, args| {
        el.remove_attribute(&string_arg("removeAttribute", args, 0)?);
        Ok(Value::Null)
    });
    define(scope, el, "hasAttribute", |el, args| {
        Ok(Value::Bool(el.has_attribute(&string_arg("hasAttribute", args, 0)?)))
    });
    define(scope, el, "classList.contains", |el, args| {
        Ok(Value::Bool(el.has_class(&string_arg("classList.contains", args, 0)?)))
    });
    define(scope, el, "classList.add", |el, args| {
        el.add_class(&string_arg("classList.add", args, 0)?);
        Ok(Value::Null)
    });
    define(scope, el, "classList.remove", |el, args| {
        el.remove_class(&string_arg("classList.remove", args, 0)?);
        Ok(Value::Null)
    });
    define(scope, el, "classList.toggle", |el, args| {
        let class = string_arg("classList.toggle", args, 0)?;
        Ok(toggle(el, &class, args.get(1)))
    });
    define(scope, el, "style.getPropertyValue", |el, args| {
        let property = string_arg("style.getPropertyValue", args, 0)?;
        Ok(Value::String(el.style_property(&property).unwrap_or_default()))
    });
    define(scope, el, "style.setProperty", |el, args| {
        let property = string_arg("style.setProperty", args, 0)?;
        let value = args.get(1).map(dom_string).unwrap_or_default();
        el.set_style_property(&property, &value);
        Ok(Value::Null)
    });
    define(scope, el, "style.removeProperty", |el, args| {
        el.remove_style_property(&string_arg("style.removeProperty", args, 0)?);
        Ok(Value::Null)
    });
    define(scope, el, "textContent", |el, args| Ok(write_text(el, args)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_accessor() {
        let el = Element::new("div").with_attribute("class", "box");
        let binding = AccessorBinding::new(
            Some(el.clone()),
            Vocabulary::Legacy,
            "hasClass('dark') ? 'dark' : 'light'",
            Some("toggleClass('dark', v == 'dark')"),
        )
        .unwrap();
        assert_eq!(binding.get_value(), Value::from("light"));

        binding.set_value(&Value::from("dark"));
        assert!(el.has_class("dark"));
        assert_eq!(binding.get_value(), Value::from("dark"));
    }

    #[test]
    fn test_direct_accessor() {
        let el = Element::new("div").with_attribute("style", "height: 20px");
        let binding = AccessorBinding::new(
            Some(el.clone()),
            Vocabulary::Direct,
            "style.getPropertyValue('height')",
            Some("style.setProperty('height', v + 'px')"),
        )
        .unwrap();
        assert_eq!(binding.get_value(), Value::from("20px"));
        binding.set_value(&Value::from(35));
        assert_eq!(el.style_property("height").as_deref(), Some("35px"));
    }

    #[test]
    fn test_failures_are_absorbed() {
        let el = Element::new("div");
        let binding = AccessorBinding::new(
            Some(el.clone()),
            Vocabulary::Direct,
            "attr('title')",
            Some("setAttribute('title', missing)"),
        )
        .unwrap();
        assert_eq!(binding.get_value(), Value::Null);
        binding.set_value(&Value::from("x"));
        assert!(!el.has_attribute("title"));
    }

    #[test]
    fn test_syntax_error_is_reported() {
        assert!(AccessorBinding::new(None, Vocabulary::Legacy, "attr(", None).is_err());
    }

    #[test]
    fn test_getter_only() {
        let el = Element::new("p").with_text("hello");
        let binding = AccessorBinding::new(Some(el.clone()), Vocabulary::Legacy, "text()", None).unwrap();
        assert_eq!(binding.get_value(), Value::from("hello"));
        binding.set_value(&Value::from("bye"));
        assert_eq!(el.text_content(), "hello");
    }
}
