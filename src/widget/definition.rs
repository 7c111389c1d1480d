// ABOUTME: Widget definition data structures and YAML/JSON loading
// ABOUTME: A widget is a template, its typed parameters with optional bindings, and translations

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

use super::error::{Result, ValidationError, WidgetError};
use crate::binding::BindingSpec;
use crate::template::Translations;
use crate::value::{cast_value, CastKind, Value};

fn default_version() -> String {
    "1.0".to_string()
}

fn default_insertable() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetDefinition {
    pub key: String,
    #[serde(default)]
    pub name: String,
    pub category: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
    pub author: Option<String>,
    /// Query identifying the widget root inside a document
    pub selector: Option<String>,
    #[serde(default = "default_insertable")]
    pub insertable: bool,
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default, rename = "I18n", skip_serializing_if = "Translations::is_empty")]
    pub translations: Translations,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub title: Option<String>,
    #[serde(default, rename = "value")]
    pub default_value: Value,
    #[serde(default, rename = "type")]
    pub declared_type: ParameterType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ParamOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<BindingSpec>,
    #[serde(rename = "castTo", skip_serializing_if = "Option::is_none")]
    pub cast_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
    #[serde(rename = "when", skip_serializing_if = "Option::is_none")]
    pub when_expr: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    #[default]
    Textfield,
    Textarea,
    Numeric,
    Checkbox,
    Select,
    Color,
    Image,
    #[serde(other)]
    Unknown,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::Textfield => "textfield",
            ParameterType::Textarea => "textarea",
            ParameterType::Numeric => "numeric",
            ParameterType::Checkbox => "checkbox",
            ParameterType::Select => "select",
            ParameterType::Color => "color",
            ParameterType::Image => "image",
            ParameterType::Unknown => "unknown",
        }
    }

    /// Cast applied to values of this type when the parameter names none
    pub fn implied_cast(&self) -> Option<CastKind> {
        match self {
            ParameterType::Numeric => Some(CastKind::Number),
            ParameterType::Checkbox => Some(CastKind::Boolean),
            _ => None,
        }
    }
}

/// A select option: a bare value or `{ label, value }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamOption {
    Labeled { label: String, value: Value },
    Plain(Value),
}

impl ParamOption {
    pub fn value(&self) -> &Value {
        match self {
            ParamOption::Labeled { value, .. } => value,
            ParamOption::Plain(value) => value,
        }
    }

    pub fn label(&self) -> String {
        match self {
            ParamOption::Labeled { label, .. } => label.clone(),
            ParamOption::Plain(value) => value.to_string(),
        }
    }
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            default_value: Value::Null,
            declared_type: ParameterType::default(),
            options: Vec::new(),
            bind: None,
            cast_to: None,
            transform: None,
            when_expr: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = value.into();
        self
    }

    pub fn with_type(mut self, declared_type: ParameterType) -> Self {
        self.declared_type = declared_type;
        self
    }

    pub fn with_binding(mut self, bind: BindingSpec) -> Self {
        self.bind = Some(bind);
        self
    }

    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    /// Explicit `castTo`, else the cast implied by the declared type
    pub fn cast_kind(&self) -> Option<CastKind> {
        CastKind::parse_optional(self.cast_to.as_deref())
            .or_else(|| self.declared_type.implied_cast())
    }

    pub fn cast(&self, value: Value) -> Value {
        cast_value(value, self.cast_kind().as_ref())
    }

    pub fn default_cast_value(&self) -> Value {
        self.cast(self.default_value.clone())
    }
}

impl WidgetDefinition {
    /// Parse widget from a file, choosing JSON or YAML by extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(WidgetError::IoError)?;
        WidgetFormat::from_path(path.as_ref()).parse(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let widget: WidgetDefinition = serde_yaml::from_str(content).map_err(WidgetError::YamlError)?;
        widget.finish()
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let widget: WidgetDefinition = serde_json::from_str(content).map_err(WidgetError::JsonError)?;
        widget.finish()
    }

    fn finish(mut self) -> Result<Self> {
        if self.name.trim().is_empty() {
            self.name = self.key.clone();
        }
        self.validate_structure()?;
        Ok(self)
    }

    /// Validate basic widget structure
    pub fn validate_structure(&self) -> Result<()> {
        if self.key.trim().is_empty() {
            return Err(WidgetError::MissingField("key".to_string()));
        }

        let mut names = HashSet::new();
        for parameter in &self.parameters {
            if parameter.name.trim().is_empty() {
                return Err(WidgetError::MissingField(format!(
                    "parameters[{}].name",
                    names.len()
                )));
            }
            if !names.insert(parameter.name.as_str()) {
                return Err(WidgetError::ValidationError(
                    ValidationError::DuplicateParameter {
                        parameter: parameter.name.clone(),
                    },
                ));
            }
        }

        Ok(())
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }

    pub fn bound_parameters(&self) -> impl Iterator<Item = (&Parameter, &BindingSpec)> {
        self.parameters
            .iter()
            .filter_map(|p| p.bind.as_ref().map(|bind| (p, bind)))
    }

    /// Declared defaults, cast to each parameter's kind
    pub fn default_values(&self) -> IndexMap<String, Value> {
        self.parameters
            .iter()
            .map(|p| (p.name.clone(), p.default_cast_value()))
            .collect()
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(WidgetError::YamlError)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(WidgetError::JsonError)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetFormat {
    Yaml,
    Json,
}

impl WidgetFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => WidgetFormat::Json,
            _ => WidgetFormat::Yaml,
        }
    }

    pub fn parse(&self, content: &str) -> Result<WidgetDefinition> {
        match self {
            WidgetFormat::Yaml => WidgetDefinition::from_yaml(content),
            WidgetFormat::Json => WidgetDefinition::from_json(content),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WidgetParser;

impl WidgetParser {
    pub fn new() -> Self {
        Self
    }

    pub async fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<WidgetDefinition> {
        let content = fs::read_to_string(path.as_ref())
            .await
            .map_err(WidgetError::IoError)?;
        WidgetFormat::from_path(path.as_ref()).parse(&content)
    }

    pub fn parse_string(&self, content: &str) -> Result<WidgetDefinition> {
        WidgetDefinition::from_yaml(content)
    }
}

impl Default for WidgetParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    const ALERT: &str = r#"
key: alerta
name: Alert box
category: boxes
selector: "div.iedib-alerta"
template: |
  <div class="iedib-alerta iedib-{{tipus}}-border">{{#I18n}}msg{{/I18n}}</div>
parameters:
  - name: tipus
    value: alerta
    type: select
    options: [alerta, important]
    bind: "classRegex('iedib-(alerta|important)-border')"
  - name: width
    value: "50"
    type: numeric
    bind:
      get: css('width')
  - name: shadow
    value: 1
    type: checkbox
    castTo: boolean
I18n:
  msg: { en: "Note", ca: "Nota" }
"#;

    #[test]
    fn test_parse_widget() {
        let widget = WidgetDefinition::from_yaml(ALERT).unwrap();
        assert_eq!(widget.key, "alerta");
        assert_eq!(widget.parameters.len(), 3);
        assert_eq!(widget.version, "1.0");
        assert!(widget.insertable);

        let tipus = widget.parameter("tipus").unwrap();
        assert_eq!(tipus.declared_type, ParameterType::Select);
        assert_eq!(tipus.options.len(), 2);
        assert!(matches!(tipus.bind, Some(BindingSpec::StringDsl(_))));

        let width = widget.parameter("width").unwrap();
        assert!(matches!(width.bind, Some(BindingSpec::LegacyAccessor { .. })));
        assert_eq!(width.cast_kind(), Some(CastKind::Number));

        assert_eq!(widget.translations.lookup("msg", "ca"), "Nota");
    }

    #[test]
    fn test_default_values_are_cast() {
        let widget = WidgetDefinition::from_yaml(ALERT).unwrap();
        let defaults = widget.default_values();
        assert_eq!(defaults["tipus"], Value::from("alerta"));
        assert_eq!(defaults["width"], Value::Number(50.0));
        assert_eq!(defaults["shadow"], Value::Bool(true));
    }

    #[test]
    fn test_json_and_name_fallback() {
        let widget = WidgetDefinition::from_json(
            r#"{"key": "card", "template": "<div></div>", "parameters": [{"name": "t", "type": "slider"}]}"#,
        )
        .unwrap();
        assert_eq!(widget.name, "card");
        assert_eq!(widget.parameters[0].declared_type, ParameterType::Unknown);
    }

    #[test]
    fn test_structure_errors() {
        assert!(matches!(
            WidgetDefinition::from_yaml("key: ''\ntemplate: x\n"),
            Err(WidgetError::MissingField(_))
        ));
        let duplicated = "key: a\nparameters:\n  - name: x\n  - name: x\n";
        assert!(matches!(
            WidgetDefinition::from_yaml(duplicated),
            Err(WidgetError::ValidationError(ValidationError::DuplicateParameter { .. }))
        ));
    }

    #[test]
    fn test_file_operations() {
        let widget = WidgetDefinition::from_yaml(ALERT).unwrap();
        let mut temp_file = Builder::new().suffix(".json").tempfile().unwrap();
        temp_file.write_all(widget.to_json().unwrap().as_bytes()).unwrap();

        let loaded = WidgetDefinition::from_file(temp_file.path()).unwrap();
        assert_eq!(loaded.key, widget.key);
        assert_eq!(loaded.parameters.len(), widget.parameters.len());
    }

    #[tokio::test]
    async fn test_async_parser() {
        let mut temp_file = Builder::new().suffix(".yaml").tempfile().unwrap();
        temp_file.write_all(ALERT.as_bytes()).unwrap();
        let widget = WidgetParser::new().parse_file(temp_file.path()).await.unwrap();
        assert_eq!(widget.name, "Alert box");
    }
}
