// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides widget definition builders and temp-dir fixtures for widget and fragment files

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;

use widgetkit::dom::{Element, Fragment};

pub const ALERT_TEMPLATE: &str = r#"<div class="iedib-alerta iedib-{{tipus}}-border" role="alert">{{#I18n}}title{{/I18n}}: {{text}}</div>"#;

pub const ALERT_FRAGMENT: &str = r#"<p>before</p><div class="iedib-alerta iedib-alerta-border" role="alert" data-bs-dismiss="alert">Nota: hola</div>"#;

pub struct TestWidgetBuilder {
    key: String,
    name: String,
    selector: Option<String>,
    template: String,
    parameters: Vec<TestParameter>,
    translations: Vec<(String, String, String)>,
}

#[derive(Default)]
pub struct TestParameter {
    pub name: String,
    pub value: Option<String>,
    pub param_type: Option<String>,
    pub bind: Option<String>,
    pub cast_to: Option<String>,
    pub options: Vec<String>,
    pub transform: Option<String>,
    pub when: Option<String>,
}

impl TestParameter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Default value as a YAML scalar (`50`, `true`, `"text"`)
    pub fn value(mut self, yaml_scalar: &str) -> Self {
        self.value = Some(yaml_scalar.to_string());
        self
    }

    pub fn param_type(mut self, param_type: &str) -> Self {
        self.param_type = Some(param_type.to_string());
        self
    }

    pub fn bind(mut self, dsl: &str) -> Self {
        self.bind = Some(dsl.to_string());
        self
    }

    pub fn cast_to(mut self, kind: &str) -> Self {
        self.cast_to = Some(kind.to_string());
        self
    }

    pub fn options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|o| o.to_string()).collect();
        self
    }

    pub fn transform(mut self, chain: &str) -> Self {
        self.transform = Some(chain.to_string());
        self
    }

    pub fn when(mut self, condition: &str) -> Self {
        self.when = Some(condition.to_string());
        self
    }
}

impl TestWidgetBuilder {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            name: format!("Test widget: {}", key),
            selector: None,
            template: String::new(),
            parameters: Vec::new(),
            translations: Vec::new(),
        }
    }

    pub fn with_selector(mut self, selector: &str) -> Self {
        self.selector = Some(selector.to_string());
        self
    }

    pub fn with_template(mut self, template: &str) -> Self {
        self.template = template.to_string();
        self
    }

    pub fn with_parameter(mut self, parameter: TestParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_translation(mut self, key: &str, locale: &str, text: &str) -> Self {
        self.translations
            .push((key.to_string(), locale.to_string(), text.to_string()));
        self
    }

    /// The alert box used across the integration tests
    pub fn alert() -> Self {
        Self::new("alerta")
            .with_selector("div.iedib-alerta")
            .with_template(ALERT_TEMPLATE)
            .with_parameter(
                TestParameter::new("tipus")
                    .value("alerta")
                    .param_type("select")
                    .options(&["alerta", "important", "exemple"])
                    .bind("classRegex('iedib-(.*)-border')"),
            )
            .with_parameter(
                TestParameter::new("dismissible")
                    .value("false")
                    .param_type("checkbox")
                    .bind("hasAttrBS('dismiss=alert')"),
            )
            .with_parameter(TestParameter::new("text").value("\"hola\"").transform("trim"))
            .with_translation("title", "en", "Note")
            .with_translation("title", "ca", "Nota")
    }

    pub fn generate_yaml(&self) -> String {
        let mut yaml = format!("key: {}\nname: {}\n", self.key, quote(&self.name));

        if let Some(selector) = &self.selector {
            yaml.push_str(&format!("selector: {}\n", quote(selector)));
        }
        yaml.push_str(&format!("template: {}\n", quote(&self.template)));

        if !self.parameters.is_empty() {
            yaml.push_str("parameters:\n");
            for p in &self.parameters {
                yaml.push_str(&format!("  - name: {}\n", p.name));
                if let Some(value) = &p.value {
                    yaml.push_str(&format!("    value: {}\n", value));
                }
                if let Some(param_type) = &p.param_type {
                    yaml.push_str(&format!("    type: {}\n", param_type));
                }
                if !p.options.is_empty() {
                    yaml.push_str("    options:\n");
                    for option in &p.options {
                        yaml.push_str(&format!("      - {}\n", quote(option)));
                    }
                }
                if let Some(bind) = &p.bind {
                    yaml.push_str(&format!("    bind: {}\n", quote(bind)));
                }
                if let Some(cast_to) = &p.cast_to {
                    yaml.push_str(&format!("    castTo: {}\n", cast_to));
                }
                if let Some(transform) = &p.transform {
                    yaml.push_str(&format!("    transform: {}\n", quote(transform)));
                }
                if let Some(when) = &p.when {
                    yaml.push_str(&format!("    when: {}\n", quote(when)));
                }
            }
        }

        if !self.translations.is_empty() {
            yaml.push_str("I18n:\n");
            let mut current: Option<&str> = None;
            for (key, locale, text) in &self.translations {
                if current != Some(key.as_str()) {
                    yaml.push_str(&format!("  {}:\n", key));
                    current = Some(key.as_str());
                }
                yaml.push_str(&format!("    {}: {}\n", locale, quote(text)));
            }
        }

        yaml
    }

    pub async fn write_to_file(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        fs::write(path, self.generate_yaml()).await?;
        Ok(())
    }
}

/// JSON strings are valid YAML scalars
fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_default()
}

pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn widget_file(&self, name: &str) -> PathBuf {
        self.path().join(format!("{}.yaml", name))
    }

    pub fn fragment_file(&self, name: &str) -> PathBuf {
        self.path().join(format!("{}.html", name))
    }

    pub fn output_file(&self, name: &str) -> PathBuf {
        self.path().join(format!("{}_output.html", name))
    }

    pub async fn create_widget_file(&self, name: &str, builder: &TestWidgetBuilder) -> PathBuf {
        let widget_file = self.widget_file(name);
        builder
            .write_to_file(&widget_file)
            .await
            .expect("Failed to write widget file");
        widget_file
    }

    pub async fn create_fragment_file(&self, name: &str, html: &str) -> PathBuf {
        let fragment_file = self.fragment_file(name);
        fs::write(&fragment_file, html)
            .await
            .expect("Failed to write fragment file");
        fragment_file
    }
}

/// Parse `html` and return its first element
pub fn element(html: &str) -> (Fragment, Element) {
    let fragment = Fragment::parse(html);
    let root = fragment
        .first_element()
        .expect("fragment has no element");
    (fragment, root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_builder() {
        let yaml = TestWidgetBuilder::alert().generate_yaml();

        assert!(yaml.contains("key: alerta"));
        assert!(yaml.contains("bind: \"classRegex('iedib-(.*)-border')\""));
        assert!(yaml.contains("I18n:\n  title:\n    en: \"Note\"\n    ca: \"Nota\""));

        let widget = widgetkit::WidgetDefinition::from_yaml(&yaml).unwrap();
        assert_eq!(widget.parameters.len(), 3);
        assert_eq!(widget.translations.lookup("title", "ca"), "Nota");
    }

    #[test]
    fn test_environment_setup() {
        let env = TestEnvironment::new();
        assert!(env.path().exists());
        assert!(env.widget_file("w").to_string_lossy().ends_with("w.yaml"));
    }
}
