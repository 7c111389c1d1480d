// ABOUTME: Command implementations for the widgetkit CLI
// ABOUTME: Handles render, inspect, apply, validate, preview and eval over widget and HTML files

use anyhow::Result;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use super::config::Config;
use crate::binding::BindingFactory;
use crate::dom::{Element, Fragment};
use crate::expr::{self, Scope};
use crate::template::{PageData, PreviewPage, TemplateContext, TemplateEngine};
use crate::value::Value;
use crate::widget::{EditSession, WidgetDefinition, WidgetParser, WidgetValidator};

/// Render a widget template to stdout
pub async fn render_widget(
    widget_path: PathBuf,
    vars: IndexMap<String, String>,
    lang: Option<String>,
    config: &Config,
) -> Result<()> {
    info!("Rendering widget: {}", widget_path.display());

    let widget = load_widget(&widget_path).await?;
    let engine = build_engine(config);
    let session = prepare_session(&widget, &engine, &vars, lang, config)?;

    let html = session
        .preview()
        .map_err(|e| anyhow::anyhow!("Failed to render widget '{}': {}", widget.key, e))?;
    println!("{}", html);

    Ok(())
}

/// Print the parameter values read from a fragment as JSON
pub async fn inspect_widget(widget_path: PathBuf, fragment_path: PathBuf, config: &Config) -> Result<()> {
    info!(
        "Inspecting {} with widget {}",
        fragment_path.display(),
        widget_path.display()
    );

    let widget = load_widget(&widget_path).await?;
    let fragment = load_fragment(&fragment_path).await?;
    let root = widget_root(&widget, &fragment)?;

    let engine = build_engine(config);
    let factory = BindingFactory::new().with_bs_version(config.bs_version);
    let session = EditSession::open(&widget, &engine, &factory, &root);

    let values: IndexMap<&String, JsonValue> = session
        .values()
        .iter()
        .map(|(name, value)| (name, value.to_json()))
        .collect();
    println!("{}", serde_json::to_string_pretty(&values)?);

    Ok(())
}

/// Write values into a fragment through the widget's bindings
pub async fn apply_widget(
    widget_path: PathBuf,
    fragment_path: PathBuf,
    vars: IndexMap<String, String>,
    output: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    info!(
        "Applying {} values to {}",
        vars.len(),
        fragment_path.display()
    );

    let widget = load_widget(&widget_path).await?;
    let fragment = load_fragment(&fragment_path).await?;
    let root = widget_root(&widget, &fragment)?;

    let engine = build_engine(config);
    let factory = BindingFactory::new().with_bs_version(config.bs_version);
    let mut session = EditSession::open(&widget, &engine, &factory, &root);

    for (name, text) in &vars {
        session
            .set_value(name, parse_value(text))
            .map_err(|e| anyhow::anyhow!("Cannot set '{}': {}", name, e))?;
    }

    let report = session.commit();
    for name in report.unbound.iter().filter(|name| vars.contains_key(*name)) {
        warn!("Parameter '{}' has no binding; its value was not written", name);
    }

    let html = fragment.to_html();
    match output {
        Some(path) => {
            fs::write(&path, &html)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to write output file '{}': {}", path.display(), e))?;
            info!("Updated fragment written to: {}", path.display());
        }
        None => println!("{}", html),
    }

    Ok(())
}

/// Validate a widget definition
pub async fn validate_widget(widget_path: PathBuf, strict: bool, config: &Config) -> Result<()> {
    info!("Validating widget: {}", widget_path.display());

    let widget = load_widget(&widget_path).await?;
    let report = WidgetValidator::new()
        .with_strict_mode(strict)
        .with_known_variables(config.template_vars.keys().cloned())
        .validate(&widget);

    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }

    if !report.is_valid {
        for error in &report.errors {
            println!("  error: {}", error);
        }
        return Err(anyhow::anyhow!(
            "Widget '{}' has {} validation error(s)",
            widget.key,
            report.errors.len()
        ));
    }

    println!("✓ Widget '{}' is valid", widget.key);
    println!("  Parameters: {}", widget.parameters.len());
    let engine = build_engine(config);
    if let Ok(template) = engine.compile(&widget.template) {
        let macros = template.block_names();
        if !macros.is_empty() {
            println!("  Macros: {}", macros.join(", "));
        }
    }

    info!("Widget validation completed successfully");
    Ok(())
}

/// Render a widget into a standalone preview page
pub async fn preview_widget(
    widget_path: PathBuf,
    vars: IndexMap<String, String>,
    lang: Option<String>,
    output: PathBuf,
    stylesheets: Vec<String>,
    config: &Config,
) -> Result<()> {
    info!("Building preview for widget: {}", widget_path.display());

    let widget = load_widget(&widget_path).await?;
    let engine = build_engine(config);
    let session = prepare_session(&widget, &engine, &vars, lang, config)?;

    let body = session
        .preview()
        .map_err(|e| anyhow::anyhow!("Failed to render widget '{}': {}", widget.key, e))?;
    let locale = session
        .context()
        .locale()
        .unwrap_or_else(|| engine.default_locale().to_string());

    let page = PreviewPage::new()?.render(&PageData {
        title: widget.name.clone(),
        locale,
        body,
        parameters: session
            .values()
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect(),
        stylesheets,
    })?;

    fs::write(&output, page)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to write preview '{}': {}", output.display(), e))?;
    info!("Preview written to: {}", output.display());

    Ok(())
}

/// Evaluate an expression and print the result
pub async fn eval_expression(expression: String, vars: IndexMap<String, String>) -> Result<()> {
    debug!("Evaluating '{}' with {} variables", expression, vars.len());

    let scope = Scope::from_values(vars.iter().map(|(k, v)| (k.clone(), parse_value(v))));
    let result = expr::evaluate(&scope, &expression)
        .map_err(|e| anyhow::anyhow!("Evaluation failed: {}", e))?;
    println!("{}", result);

    Ok(())
}

async fn load_widget(path: &Path) -> Result<WidgetDefinition> {
    WidgetParser::new()
        .parse_file(path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load widget '{}': {}", path.display(), e))
}

async fn load_fragment(path: &Path) -> Result<Fragment> {
    let html = fs::read_to_string(path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read fragment '{}': {}", path.display(), e))?;
    Ok(Fragment::parse(&html))
}

/// The widget's root element: the first match of its selector, else the
/// fragment's first element
fn widget_root(widget: &WidgetDefinition, fragment: &Fragment) -> Result<Element> {
    let root = match &widget.selector {
        Some(selector) => fragment
            .query_selector(selector)
            .map_err(|e| anyhow::anyhow!("Invalid widget selector: {}", e))?,
        None => fragment.first_element(),
    };
    root.ok_or_else(|| anyhow::anyhow!("No instance of widget '{}' found in fragment", widget.key))
}

fn build_engine(config: &Config) -> TemplateEngine {
    TemplateEngine::new().with_default_locale(config.default_locale.clone())
}

/// Session over the declared defaults. `--var` entries naming a parameter
/// set it; the rest join the configured template variables.
fn prepare_session<'w>(
    widget: &'w WidgetDefinition,
    engine: &'w TemplateEngine,
    vars: &IndexMap<String, String>,
    lang: Option<String>,
    config: &Config,
) -> Result<EditSession<'w>> {
    let mut variables: TemplateContext = config
        .template_vars
        .iter()
        .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
        .collect();
    if let Some(lang) = lang {
        variables.set("LANG", Value::from(lang));
    }

    let mut parameters = Vec::new();
    for (name, text) in vars {
        if widget.parameter(name).is_some() {
            parameters.push((name, parse_value(text)));
        } else {
            variables.set(name.clone(), parse_value(text));
        }
    }

    let mut session = EditSession::new(widget, engine).with_variables(variables);
    for (name, value) in parameters {
        session
            .set_value(name, value)
            .map_err(|e| anyhow::anyhow!("Cannot set '{}': {}", name, e))?;
    }
    Ok(session)
}

/// Command line values are JSON when they parse as JSON scalars or
/// structures, plain strings otherwise
fn parse_value(text: &str) -> Value {
    match serde_json::from_str::<JsonValue>(text) {
        Ok(json) => Value::from(json),
        Err(_) => Value::from(text),
    }
}
