// ABOUTME: Variable context for template rendering
// ABOUTME: Ordered name-to-value map plus the reserved locale keys read by the I18n macro

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::expr::Scope;
use crate::value::Value;

/// Reserved context keys naming the render locale, in lookup order
pub const LOCALE_KEYS: [&str; 2] = ["LANG", "_lang"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateContext {
    variables: IndexMap<String, Value>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a JSON object; other JSON values give an empty
    /// context
    pub fn from_json(json: &JsonValue) -> Self {
        let mut context = Self::new();
        if let JsonValue::Object(map) = json {
            for (key, value) in map {
                context.set(key.clone(), Value::from(value.clone()));
            }
        }
        context
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn extend<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.variables.extend(values);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Locale requested by the context through `LANG` or `_lang`
    pub fn locale(&self) -> Option<String> {
        LOCALE_KEYS.iter().find_map(|key| {
            self.get(key)
                .filter(|value| !value.is_null())
                .map(ToString::to_string)
                .filter(|locale| !locale.trim().is_empty())
        })
    }

    pub fn to_scope(&self) -> Scope {
        Scope::from_values(self.variables.iter().map(|(k, v)| (k.clone(), v.clone())))
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.variables
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl FromIterator<(String, Value)> for TemplateContext {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            variables: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_locale_lookup_order() {
        let context = TemplateContext::new().with("_lang", "es").with("LANG", "ca");
        assert_eq!(context.locale().as_deref(), Some("ca"));

        let fallback = TemplateContext::new().with("LANG", "").with("_lang", "es");
        assert_eq!(fallback.locale().as_deref(), Some("es"));

        assert_eq!(TemplateContext::new().locale(), None);
    }

    #[test]
    fn test_from_json() {
        let context = TemplateContext::from_json(&json!({"n": 3, "name": "Josep", "list": [1, 2]}));
        assert_eq!(context.get("n"), Some(&Value::Number(3.0)));
        assert_eq!(context.get("name"), Some(&Value::from("Josep")));
        assert!(matches!(context.get("list"), Some(Value::Structured(_))));
        assert_eq!(context.to_json()["name"], json!("Josep"));
    }
}
