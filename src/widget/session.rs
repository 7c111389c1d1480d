// ABOUTME: Editing session over one widget instance: bind and read, preview, write back
// ABOUTME: Holds the live bindings and current parameter values for the session's lifetime

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use super::definition::{Parameter, WidgetDefinition};
use super::error::{Result, WidgetError};
use super::transform::{apply_chain, parse_chain};
use crate::binding::{BindingFactory, BindingSet, CommitReport};
use crate::dom::Element;
use crate::expr;
use crate::template::{TemplateContext, TemplateEngine};
use crate::value::Value;

/// Parameter values for one widget, optionally bound to an existing
/// element.
///
/// A session created with [`EditSession::new`] starts from the declared
/// defaults and has no bindings (inserting a new widget). One created with
/// [`EditSession::open`] reads its initial values from the element through
/// the parameters' bindings, and [`EditSession::commit`] writes them back.
pub struct EditSession<'w> {
    definition: &'w WidgetDefinition,
    engine: &'w TemplateEngine,
    bindings: BindingSet,
    values: IndexMap<String, Value>,
    variables: TemplateContext,
}

impl<'w> EditSession<'w> {
    pub fn new(definition: &'w WidgetDefinition, engine: &'w TemplateEngine) -> Self {
        debug!("New session for widget '{}'", definition.key);
        Self {
            definition,
            engine,
            bindings: BindingSet::new(),
            values: definition.default_values(),
            variables: TemplateContext::new(),
        }
    }

    /// Bind every parameter that declares a binding against `root` and read
    /// the initial values. Parameters whose binding reads empty keep their
    /// default.
    pub fn open(
        definition: &'w WidgetDefinition,
        engine: &'w TemplateEngine,
        factory: &BindingFactory,
        root: &Element,
    ) -> Self {
        let mut session = Self::new(definition, engine);

        for (parameter, spec) in definition.bound_parameters() {
            let binding = factory.create(spec, root);
            let read = binding.get_value();
            if !read.is_null() {
                debug!(
                    "Read '{}' = {} through {} binding",
                    parameter.name,
                    read,
                    binding.kind()
                );
                session
                    .values
                    .insert(parameter.name.clone(), parameter.cast(read));
            }
            session.bindings.insert(parameter.name.clone(), binding);
        }

        info!(
            "Opened widget '{}' with {} bound parameters",
            definition.key,
            session.bindings.len()
        );
        session
    }

    /// Extra context variables for rendering and `when` conditions.
    /// Parameter values take precedence over them.
    pub fn with_variables(mut self, variables: TemplateContext) -> Self {
        self.variables.extend(variables.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn definition(&self) -> &WidgetDefinition {
        self.definition
    }

    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Set a parameter value, cast to the parameter's kind
    pub fn set_value(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let parameter = self.parameter(name)?;
        let value = parameter.cast(value.into());
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Whether the parameter's `when` condition holds for the current values
    pub fn is_visible(&self, name: &str) -> Result<bool> {
        let parameter = self.parameter(name)?;
        let Some(condition) = &parameter.when_expr else {
            return Ok(true);
        };
        let scope = self.raw_context().to_scope();
        Ok(expr::evaluate(&scope, condition)?.is_truthy())
    }

    /// Render context: extra variables, then parameter values with their
    /// transforms applied
    pub fn context(&self) -> TemplateContext {
        let mut context = self.variables.clone();
        for parameter in &self.definition.parameters {
            let Some(value) = self.values.get(&parameter.name) else {
                continue;
            };
            context.set(parameter.name.clone(), transformed(parameter, value.clone()));
        }
        context
    }

    /// Render the widget template for the current values
    pub fn preview(&self) -> Result<String> {
        let html = self.engine.render(
            &self.definition.template,
            &self.context(),
            &self.definition.translations,
        )?;
        Ok(html)
    }

    /// Write the current values back through the bindings
    pub fn commit(&self) -> CommitReport {
        let report = self.bindings.apply(self.values.iter());
        info!(
            "Committed {} values to widget '{}' ({} without binding)",
            report.written.len(),
            self.definition.key,
            report.unbound.len()
        );
        report
    }

    pub fn bindings(&self) -> &BindingSet {
        &self.bindings
    }

    /// True when the session was opened over an existing element
    pub fn is_editing(&self) -> bool {
        !self.bindings.is_empty()
    }

    fn parameter(&self, name: &str) -> Result<&'w Parameter> {
        self.definition
            .parameter(name)
            .ok_or_else(|| WidgetError::UnknownParameter(name.to_string()))
    }

    fn raw_context(&self) -> TemplateContext {
        let mut context = self.variables.clone();
        context.extend(self.values.iter().map(|(k, v)| (k.clone(), v.clone())));
        context
    }
}

fn transformed(parameter: &Parameter, value: Value) -> Value {
    let Some(spec) = &parameter.transform else {
        return value;
    };
    match parse_chain(spec) {
        Ok(chain) => apply_chain(&chain, value),
        Err(unknown) => {
            warn!(
                "Unknown transform '{}' on parameter '{}'; using the raw value",
                unknown, parameter.name
            );
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Fragment;

    const CARD: &str = r#"
key: card
template: "<div class='card border-{{color}}' style='width: {{width}}px'>{{title}}</div>"
parameters:
  - name: color
    value: primary
    bind: "classRegex('border-(.*)')"
  - name: width
    value: 100
    type: numeric
    bind: "styleRegex('width:(.*)px')"
  - name: title
    value: "  Hello "
    transform: "trim|toUpperCase"
  - name: note
    value: ""
    when: "width > 200"
"#;

    fn card() -> WidgetDefinition {
        WidgetDefinition::from_yaml(CARD).unwrap()
    }

    #[test]
    fn test_new_session_uses_defaults() {
        let widget = card();
        let engine = TemplateEngine::new();
        let session = EditSession::new(&widget, &engine);

        assert!(!session.is_editing());
        assert_eq!(session.value("width"), Some(&Value::Number(100.0)));
        assert_eq!(
            session.preview().unwrap(),
            "<div class='card border-primary' style='width: 100px'>HELLO</div>"
        );
    }

    #[test]
    fn test_open_reads_and_commit_writes() {
        let widget = card();
        let engine = TemplateEngine::new();
        let factory = BindingFactory::new();
        let fragment = Fragment::parse(r#"<div class="card border-danger" style="width: 300px">x</div>"#);
        let root = fragment.first_element().unwrap();

        let mut session = EditSession::open(&widget, &engine, &factory, &root);
        assert!(session.is_editing());
        assert_eq!(session.value("color"), Some(&Value::from("danger")));
        assert_eq!(session.value("width"), Some(&Value::Number(300.0)));
        assert!(session.is_visible("note").unwrap());

        session.set_value("color", "success").unwrap();
        session.set_value("width", "150").unwrap();
        assert!(!session.is_visible("note").unwrap());

        let report = session.commit();
        assert_eq!(report.written, vec!["color", "width"]);
        assert_eq!(report.unbound, vec!["title", "note"]);
        assert!(root.has_class("border-success"));
        assert!(!root.has_class("border-danger"));
        assert_eq!(root.style_property("width").as_deref(), Some("150px"));
    }

    #[test]
    fn test_unknown_parameter() {
        let widget = card();
        let engine = TemplateEngine::new();
        let mut session = EditSession::new(&widget, &engine);
        assert!(matches!(
            session.set_value("missing", 1),
            Err(WidgetError::UnknownParameter(name)) if name == "missing"
        ));
        assert!(session.is_visible("missing").is_err());
    }

    #[test]
    fn test_variables_do_not_override_parameters() {
        let widget = card();
        let engine = TemplateEngine::new();
        let session = EditSession::new(&widget, &engine)
            .with_variables(TemplateContext::new().with("color", "dark").with("LANG", "ca"));
        let context = session.context();
        assert_eq!(context.get("color"), Some(&Value::from("primary")));
        assert_eq!(context.locale().as_deref(), Some("ca"));
    }
}
