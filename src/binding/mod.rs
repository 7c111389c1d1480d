// ABOUTME: Two-way bindings between widget parameters and a live DOM fragment
// ABOUTME: Defines the Binding trait, the closed BindingSpec variant and the binding factory

pub mod accessor;
pub mod attr;
pub mod class;
pub mod dsl;
pub mod error;
pub mod factory;
pub mod set;
pub mod style;

pub use dsl::{parse_binding_call, BindingCall, BindingKind, DslArg};
pub use error::{BindingError, Result};
pub use factory::BindingFactory;
pub use set::{BindingSet, CommitReport};

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Prefix of the offline-editor shadow attributes kept next to `href`, `src`
/// and `style`
pub const SHADOW_PREFIX: &str = "data-mce-";

/// Attributes that carry a shadow copy
pub const SHADOWED_ATTRIBUTES: &[&str] = &["href", "src"];

/// A get/set pair over one location of a DOM subtree.
///
/// Both methods address the same target for the binding's whole life. A
/// missing target reads as an empty value and ignores writes.
pub trait Binding {
    fn get_value(&self) -> Value;
    fn set_value(&self, value: &Value);
    fn kind(&self) -> &'static str;
}

/// How a widget parameter declares its binding.
///
/// Deserializes from either a DSL string (`"attr('title')"`), a
/// `{ getValue, setValue }` object (direct element accessors) or a
/// `{ get, set }` object (legacy wrapped-element accessors).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BindingSpec {
    StringDsl(String),
    DirectAccessor {
        #[serde(rename = "getValue")]
        get_value: String,
        #[serde(rename = "setValue", default, skip_serializing_if = "Option::is_none")]
        set_value: Option<String>,
    },
    LegacyAccessor {
        get: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        set: Option<String>,
    },
}

impl BindingSpec {
    pub fn dsl(text: impl Into<String>) -> Self {
        BindingSpec::StringDsl(text.into())
    }

    pub fn describe(&self) -> String {
        match self {
            BindingSpec::StringDsl(text) => text.clone(),
            BindingSpec::DirectAccessor { get_value, .. } => format!("{{ getValue: {} }}", get_value),
            BindingSpec::LegacyAccessor { get, .. } => format!("{{ get: {} }}", get),
        }
    }
}

/// Stand-in for a binding that could not be built: reads `null`, ignores writes
#[derive(Debug, Clone, Default)]
pub struct NoopBinding;

impl Binding for NoopBinding {
    fn get_value(&self) -> Value {
        Value::Null
    }

    fn set_value(&self, _value: &Value) {}

    fn kind(&self) -> &'static str {
        "noop"
    }
}

/// String form of a value for writing into the DOM
pub(crate) fn dom_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Structured(json) => serde_json::to_string(json).unwrap_or_default(),
        other => other.to_string(),
    }
}

/// Boolean form of a value for presence bindings
pub(crate) fn dom_flag(value: &Value) -> bool {
    matches!(
        crate::value::cast_value(value.clone(), Some(&crate::value::CastKind::Boolean)),
        Value::Bool(true)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_deserialization() {
        let dsl: BindingSpec = serde_json::from_str(r#""hasClass('x')""#).unwrap();
        assert_eq!(dsl, BindingSpec::dsl("hasClass('x')"));

        let direct: BindingSpec =
            serde_json::from_str(r#"{"getValue": "getAttribute('a')", "setValue": "setAttribute('a', v)"}"#)
                .unwrap();
        assert!(matches!(direct, BindingSpec::DirectAccessor { .. }));

        let legacy: BindingSpec = serde_yaml::from_str("get: attr('a')\nset: attr('a', v)\n").unwrap();
        assert!(matches!(legacy, BindingSpec::LegacyAccessor { set: Some(_), .. }));
    }

    #[test]
    fn test_dom_flag() {
        assert!(dom_flag(&Value::from("true")));
        assert!(dom_flag(&Value::from(1)));
        assert!(!dom_flag(&Value::from("false")));
        assert!(!dom_flag(&Value::Null));
    }
}
