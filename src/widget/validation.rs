// ABOUTME: Widget validation: template syntax, bindings, conditions, transforms and translations
// ABOUTME: Collects every problem into a report instead of stopping at the first one

use serde::Serialize;
use std::collections::HashSet;

use super::definition::{ParameterType, WidgetDefinition};
use super::error::ValidationError;
use super::transform::parse_chain;
use crate::binding::BindingFactory;
use crate::dom::{Element, SelectorList};
use crate::expr;
use crate::template::context::LOCALE_KEYS;
use crate::template::i18n::FALLBACK_LOCALE;
use crate::template::TemplateEngine;
use crate::value::CastKind;

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    #[serde(serialize_with = "serialize_errors")]
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
    pub is_valid: bool,
}

fn serialize_errors<S>(errors: &[ValidationError], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(errors.iter().map(ToString::to_string))
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            is_valid: true,
        }
    }
}

pub struct WidgetValidator {
    strict_mode: bool,
    engine: TemplateEngine,
    factory: BindingFactory,
    known_variables: HashSet<String>,
}

impl WidgetValidator {
    pub fn new() -> Self {
        Self {
            strict_mode: false,
            engine: TemplateEngine::new(),
            factory: BindingFactory::new(),
            known_variables: LOCALE_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// In strict mode template variables that are not parameters are errors
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Extra variables supplied at render time (configuration template vars)
    pub fn with_known_variables<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_variables.extend(names.into_iter().map(Into::into));
        self
    }

    /// Validate a complete widget
    pub fn validate(&self, widget: &WidgetDefinition) -> ValidationReport {
        let mut report = ValidationReport::new();

        self.validate_selector(widget, &mut report);
        self.validate_template(widget, &mut report);
        self.validate_parameters(widget, &mut report);

        if widget.parameters.is_empty() {
            report
                .warnings
                .push("Widget declares no parameters".to_string());
        }

        report.is_valid = report.errors.is_empty();
        report
    }

    fn validate_selector(&self, widget: &WidgetDefinition, report: &mut ValidationReport) {
        if let Some(selector) = &widget.selector {
            if let Err(e) = SelectorList::parse(selector) {
                report.errors.push(ValidationError::InvalidSelector {
                    selector: selector.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    fn validate_template(&self, widget: &WidgetDefinition, report: &mut ValidationReport) {
        if widget.template.trim().is_empty() {
            report.warnings.push("Widget template is empty".to_string());
            return;
        }

        let template = match self.engine.compile(&widget.template) {
            Ok(template) => template,
            Err(e) => {
                report.errors.push(ValidationError::InvalidTemplate {
                    error: e.to_string(),
                });
                return;
            }
        };

        let declared: HashSet<String> = widget.parameter_names().into_iter().collect();
        for variable in template.variables() {
            if declared.contains(&variable) || self.known_variables.contains(&variable) {
                continue;
            }
            if self.strict_mode {
                report
                    .errors
                    .push(ValidationError::UndeclaredVariable { variable });
            } else {
                report.warnings.push(format!(
                    "Template variable '{}' is not a declared parameter",
                    variable
                ));
            }
        }

        for key in template.translation_keys() {
            let locales = widget.translations.locales(&key);
            if locales.is_empty() {
                report
                    .warnings
                    .push(format!("Translation key '{}' has no translations", key));
            } else if !locales.iter().any(|l| l.eq_ignore_ascii_case(FALLBACK_LOCALE)) {
                report.warnings.push(format!(
                    "Translation key '{}' has no '{}' fallback",
                    key, FALLBACK_LOCALE
                ));
            }
        }
    }

    fn validate_parameters(&self, widget: &WidgetDefinition, report: &mut ValidationReport) {
        // Bindings are checked against a detached element: only construction
        // errors matter here, not whether a target exists
        let detached = Element::new("div");

        for parameter in &widget.parameters {
            if let Some(bind) = &parameter.bind {
                if let Err(e) = self.factory.try_create(bind, &detached) {
                    report.errors.push(ValidationError::InvalidBinding {
                        parameter: parameter.name.clone(),
                        binding: bind.describe(),
                        reason: e.to_string(),
                    });
                }
            }

            if let Some(when) = &parameter.when_expr {
                if let Err(e) = expr::compile(when) {
                    report.errors.push(ValidationError::InvalidCondition {
                        parameter: parameter.name.clone(),
                        error: e.to_string(),
                    });
                }
            }

            if let Some(transform) = &parameter.transform {
                if let Err(unknown) = parse_chain(transform) {
                    report.errors.push(ValidationError::UnknownTransform {
                        parameter: parameter.name.clone(),
                        transform: unknown,
                    });
                }
            }

            if let Some(CastKind::Unsupported(name)) = parameter.cast_kind() {
                report.warnings.push(format!(
                    "Parameter '{}' casts to unsupported type '{}'; values pass through unchanged",
                    parameter.name, name
                ));
            }

            if parameter.declared_type == ParameterType::Unknown {
                report.warnings.push(format!(
                    "Parameter '{}' has an unrecognized type",
                    parameter.name
                ));
            }

            if parameter.declared_type == ParameterType::Select {
                if parameter.options.is_empty() {
                    report.warnings.push(format!(
                        "Select parameter '{}' declares no options",
                        parameter.name
                    ));
                } else if !parameter.default_value.is_null()
                    && !parameter
                        .options
                        .iter()
                        .any(|o| o.value().to_string() == parameter.default_value.to_string())
                {
                    report.warnings.push(format!(
                        "Default value of '{}' is not one of its options",
                        parameter.name
                    ));
                }
            }
        }
    }
}

impl Default for WidgetValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(yaml: &str) -> WidgetDefinition {
        WidgetDefinition::from_yaml(yaml).unwrap()
    }

    #[test]
    fn test_valid_widget() {
        let w = widget(
            r#"
key: badge
template: "<span class='badge bg-{{color}}'>{{#I18n}}label{{/I18n}}</span>"
parameters:
  - name: color
    value: primary
    type: select
    options: [primary, secondary]
    bind: "classRegex('bg-(.*)')"
I18n:
  label: { en: Badge, ca: Insígnia }
"#,
        );
        let report = WidgetValidator::new().validate(&w);
        assert!(report.is_valid, "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn test_collects_all_errors() {
        let w = widget(
            r#"
key: broken
selector: "div["
template: "{{#if}}[x]{{/each}}"
parameters:
  - name: a
    bind: "classRegex('(unclosed')"
  - name: b
    bind: "nonsense('x')"
    when: "a &&"
    transform: "trim|shout"
"#,
        );
        let report = WidgetValidator::new().validate(&w);
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 6);
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::UnknownTransform { transform, .. } if transform == "shout")));
    }

    #[test]
    fn test_undeclared_variables() {
        let w = widget("key: k\ntemplate: \"{{title}} {{LANG}} {{#each}}[3]{{i}}{{/each}}\"\n");
        let report = WidgetValidator::new().validate(&w);
        assert!(report.is_valid);
        assert!(report.warnings.iter().any(|w| w.contains("'title'")));
        assert!(!report.warnings.iter().any(|w| w.contains("'i'")));

        let strict = WidgetValidator::new().with_strict_mode(true).validate(&w);
        assert_eq!(
            strict.errors,
            vec![ValidationError::UndeclaredVariable {
                variable: "title".into()
            }]
        );

        let known = WidgetValidator::new()
            .with_strict_mode(true)
            .with_known_variables(["title"])
            .validate(&w);
        assert!(known.is_valid);
    }

    #[test]
    fn test_translation_warnings() {
        let w = widget(
            "key: k\ntemplate: \"{{#I18n}}a{{/I18n}}{{#I18n}}b{{/I18n}}\"\nI18n:\n  b: { ca: B }\n",
        );
        let report = WidgetValidator::new().validate(&w);
        assert!(report.warnings.iter().any(|w| w.contains("'a' has no translations")));
        assert!(report.warnings.iter().any(|w| w.contains("'b' has no 'en' fallback")));
    }
}
