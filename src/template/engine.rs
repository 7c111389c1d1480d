// ABOUTME: Template engine: macro expansion followed by Handlebars substitution
// ABOUTME: Expands if/var/for/each/eval/I18n against a scope, then renders tags and sections with the context

use handlebars::Handlebars;
use tracing::debug;

use super::ast::{Assignment, ForHeader, Node, Template};
use super::context::TemplateContext;
use super::error::{RenderError, Result};
use super::helpers;
use super::i18n::{Translations, FALLBACK_LOCALE};
use super::parser;
use super::tags;
use crate::expr::{self, FunctionMode, Scope};
use crate::value::Value;

pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

#[derive(Debug, Clone)]
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
    default_locale: String,
    max_iterations: usize,
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        helpers::register_section_helper(&mut handlebars);

        Self {
            handlebars,
            default_locale: FALLBACK_LOCALE.to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Locale used when the context names none through `LANG`/`_lang`
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }

    pub fn with_max_iterations(mut self, limit: usize) -> Self {
        self.max_iterations = limit;
        self
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn compile(&self, template: &str) -> Result<Template> {
        parser::parse(template)
    }

    /// Validate template syntax without rendering
    pub fn validate_template(&self, template: &str) -> Result<()> {
        self.compile(template).map(|_| ())
    }

    /// Check if a string contains template tags
    pub fn has_templates(&self, text: &str) -> bool {
        text.contains("{{") && text.contains("}}")
    }

    /// Render with the locale named by the context, or the default locale
    pub fn render(
        &self,
        template: &str,
        context: &TemplateContext,
        translations: &Translations,
    ) -> Result<String> {
        let locale = context
            .locale()
            .unwrap_or_else(|| self.default_locale.clone());
        self.render_for_locale(template, context, translations, &locale)
    }

    pub fn render_for_locale(
        &self,
        template: &str,
        context: &TemplateContext,
        translations: &Translations,
        locale: &str,
    ) -> Result<String> {
        let compiled = self.compile(template)?;
        self.render_compiled(&compiled, context, translations, locale)
    }

    pub fn render_compiled(
        &self,
        template: &Template,
        context: &TemplateContext,
        translations: &Translations,
        locale: &str,
    ) -> Result<String> {
        debug!("Rendering template with {} variables, locale {}", context.len(), locale);
        let expanded = self.expand(template, context, translations, locale)?;
        self.render_with_json(&expanded, &context.to_json())
    }

    /// Run the macro pass only. The result is Handlebars source in which
    /// names bound by `var`/`for`/`each` are already inlined.
    pub fn expand(
        &self,
        template: &Template,
        context: &TemplateContext,
        translations: &Translations,
        locale: &str,
    ) -> Result<String> {
        let mut expansion = Expansion {
            translations,
            locale,
            max_iterations: self.max_iterations,
            iterations: 0,
            scope: context.to_scope(),
            locals: vec![Vec::new()],
            out: String::new(),
        };
        expansion.nodes(&template.nodes)?;
        Ok(expansion.out)
    }

    /// Substitute tags and sections of expanded text with a JSON context
    pub fn render_with_json(&self, expanded: &str, context: &serde_json::Value) -> Result<String> {
        Ok(self.handlebars.render_template(expanded, context)?)
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// State of one macro expansion
struct Expansion<'a> {
    translations: &'a Translations,
    locale: &'a str,
    max_iterations: usize,
    iterations: usize,
    scope: Scope,
    /// Names bound by macros, one list per scope frame
    locals: Vec<Vec<String>>,
    out: String,
}

impl Expansion<'_> {
    fn nodes(&mut self, nodes: &[Node]) -> Result<()> {
        for node in nodes {
            self.node(node)?;
        }
        Ok(())
    }

    fn push_frame(&mut self) {
        self.scope.push_frame();
        self.locals.push(Vec::new());
    }

    fn pop_frame(&mut self) {
        self.scope.pop_frame();
        self.locals.pop();
    }

    fn bind(&mut self, name: &str, value: Value) {
        if let Some(frame) = self.locals.last_mut() {
            if !frame.iter().any(|n| n == name) {
                frame.push(name.to_string());
            }
        }
        self.scope.set(name.to_string(), value);
    }

    fn is_local(&self, name: &str) -> bool {
        self.locals.iter().flatten().any(|n| n == name)
    }

    /// Render `nodes` inside a fresh scope frame
    fn block(&mut self, nodes: &[Node], bindings: Vec<(String, Value)>) -> Result<()> {
        self.push_frame();
        for (name, value) in bindings {
            self.bind(&name, value);
        }
        let result = self.nodes(nodes);
        self.pop_frame();
        result
    }

    /// Value of a macro-bound name followed by a field path
    fn local_value(&self, name: &str, path: &[&str]) -> Option<Value> {
        if !self.is_local(name) {
            return None;
        }
        path.iter()
            .try_fold(self.scope.get(name)?.clone(), |value, field| value.field(field))
            .or(Some(Value::Null))
    }

    fn node(&mut self, node: &Node) -> Result<()> {
        match node {
            Node::Text(text) => {
                if self.locals.iter().all(Vec::is_empty) {
                    self.out.push_str(text);
                } else {
                    let inlined = tags::inline_values(text, |name, path| self.local_value(name, path));
                    self.out.push_str(&inlined);
                }
            }
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let test = expr::evaluate_compiled(&self.scope, condition, FunctionMode::Filtered)?;
                let branch = if test.is_truthy() {
                    then_branch
                } else {
                    else_branch
                };
                self.block(branch, Vec::new())?;
            }
            Node::Var { assignments } => {
                for Assignment { name, value } in assignments {
                    let value = expr::evaluate_compiled(&self.scope, value, FunctionMode::Filtered)?;
                    self.bind(name, value);
                }
            }
            Node::For { header, body } => self.for_loop(header, body)?,
            Node::Each { loops, body } => self.each(loops, body)?,
            Node::Eval { expr } => {
                let value = expr::evaluate_compiled(&self.scope, expr, FunctionMode::Filtered)?;
                self.out.push_str(&tags::literal(&value.to_string()));
            }
            Node::I18n { key } => {
                let text = self.translations.lookup(key, self.locale);
                self.out.push_str(&tags::literal(&text));
            }
        }
        Ok(())
    }

    fn tick(&mut self) -> Result<()> {
        self.iterations += 1;
        if self.iterations > self.max_iterations {
            return Err(RenderError::LoopLimit {
                limit: self.max_iterations,
            });
        }
        Ok(())
    }

    fn eval_number(&self, expr: &expr::Expr) -> Result<f64> {
        Ok(expr::evaluate_compiled(&self.scope, expr, FunctionMode::Filtered)?.as_number())
    }

    fn for_loop(&mut self, header: &ForHeader, body: &[Node]) -> Result<()> {
        let mut current = self.eval_number(&header.start)?;
        let bound = self.eval_number(&header.bound)?;
        let step = self.eval_number(&header.step)?;

        while header.comparator.holds(current, bound) {
            self.tick()?;
            self.block(body, vec![(header.variable.clone(), Value::Number(current))])?;
            current += step;
        }
        Ok(())
    }

    fn each(&mut self, loops: &[Assignment], body: &[Node]) -> Result<()> {
        let Some((outer, inner)) = loops.split_first() else {
            return self.nodes(body);
        };
        let count = self.eval_number(&outer.value)?;

        let mut n = 1.0;
        while n <= count {
            self.tick()?;
            self.push_frame();
            self.bind(&outer.name, Value::Number(n));
            let result = self.each(inner, body);
            self.pop_frame();
            result?;
            n += 1.0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(template: &str, context: &TemplateContext) -> String {
        TemplateEngine::new()
            .render(template, context, &Translations::new())
            .unwrap()
    }

    #[test]
    fn test_each_counts() {
        let ctx = TemplateContext::new();
        assert_eq!(render("{{#each}}[5]{{i}}{{/each}}", &ctx), "12345");
        assert_eq!(
            render("{{#each}}[2,3]{{i}}-{{j}} {{/each}}", &ctx),
            "1-1 1-2 1-3 2-1 2-2 2-3 "
        );
        assert_eq!(render("{{#each}}[row=2, col=1]{{row}}{{col}};{{/each}}", &ctx), "11;21;");
    }

    #[test]
    fn test_if_with_expression() {
        let ctx = TemplateContext::new()
            .with("n", 3)
            .with("k", 1)
            .with("lastname", "Josep");
        let template = "{{#if}}[n+k>=4]{{lastname}}{{/if}}";
        assert_eq!(render(template, &ctx), "Josep");
        assert_eq!(render(template, &ctx.clone().with("n", 1)), "");
    }

    #[test]
    fn test_for_comparators() {
        let ctx = TemplateContext::new();
        assert_eq!(render("{{#for}}[i=0;i<3]{{i}}{{/for}}", &ctx), "012");
        assert_eq!(render("{{#for}}[i=3;i>=1]{{i}}{{/for}}", &ctx), "321");
        assert_eq!(render("{{#for}}[i=0;i!=10;i+=5]{{i}},{{/for}}", &ctx), "0,5,");
    }

    #[test]
    fn test_loop_limit() {
        let engine = TemplateEngine::new().with_max_iterations(50);
        let result = engine.render(
            "{{#for}}[i=0;i<1;i+=0]x{{/for}}",
            &TemplateContext::new(),
            &Translations::new(),
        );
        assert!(matches!(result, Err(RenderError::LoopLimit { limit: 50 })));
    }

    #[test]
    fn test_var_scoping() {
        let ctx = TemplateContext::new().with("x", "outer");
        let template = "{{#if}}[true]{{#var}}[x='inner'; y=2*3]{{/var}}{{x}}{{y}}{{/if}}|{{x}}{{y}}";
        assert_eq!(render(template, &ctx), "inner6|outer");
    }

    #[test]
    fn test_loop_variable_shadows_within_block() {
        let ctx = TemplateContext::new().with("i", "outer");
        assert_eq!(render("{{#each}}[2]{{i}}{{/each}}{{i}}", &ctx), "12outer");
    }

    #[test]
    fn test_sections() {
        let ctx = TemplateContext::from_json(&json!({
            "show": 0,
            "title": "T",
            "items": [{"name": "a"}, {"name": "b"}],
            "tags": ["x", "y"],
        }));
        assert_eq!(render("{{#show}}yes{{/show}}{{^show}}no{{/show}}", &ctx), "no");
        assert_eq!(render("{{#title}}[{{.}}]{{/title}}", &ctx), "[T]");
        assert_eq!(render("{{#items}}{{name}},{{/items}}", &ctx), "a,b,");
        assert_eq!(render("{{#tags}}({{.}}){{/tags}}", &ctx), "(x)(y)");
        assert_eq!(render("{{#items}}y{{else}}n{{/items}}{{#show}}y{{else}}n{{/show}}", &ctx), "yyn");
    }

    #[test]
    fn test_macros_inside_sections() {
        let ctx = TemplateContext::from_json(&json!({
            "items": [{"name": "a"}, {"name": "b"}],
            "n": 2,
        }));
        let template = "{{#items}}{{#each}}[n]{{name}}{{i}}{{/each}} {{/items}}";
        assert_eq!(render(template, &ctx), "a1a2 b1b2 ");
    }

    #[test]
    fn test_macro_output_is_not_reparsed() {
        let translations = Translations::new().with("msg", "en", "{{secret}}");
        let ctx = TemplateContext::new()
            .with("secret", "leak")
            .with("s", "{{secret}}");
        let out = TemplateEngine::new()
            .render(
                "{{#I18n}}msg{{/I18n}}|{{#eval}}s{{/eval}}|{{#var}}[v=s]{{/var}}{{v}}|{{s}}",
                &ctx,
                &translations,
            )
            .unwrap();
        assert_eq!(out, "{{secret}}|{{secret}}|{{secret}}|{{secret}}");
    }

    #[test]
    fn test_unknown_tags_pass_through() {
        let ctx = TemplateContext::new().with("x", 1);
        assert_eq!(render("{{foo bar}} {{#x y}}{{x}}", &ctx), "{{foo bar}} {{#x y}}1");
        assert_eq!(render("{{#for}}[oops]{{x}}{{/for}}", &ctx), "{{#for}}[oops]{{x}}{{/for}}");
    }

    #[test]
    fn test_escaping() {
        let ctx = TemplateContext::new().with("html", "<b>\"x\"</b>");
        assert_eq!(render("{{{html}}}", &ctx), "<b>\"x\"</b>");
        assert_eq!(render("{{& html}}", &ctx), "<b>\"x\"</b>");
        assert_eq!(render("{{html}}", &ctx), "&lt;b&gt;&quot;x&quot;&lt;/b&gt;");
        assert_eq!(render("{{missing}}", &ctx), "");
    }

    #[test]
    fn test_eval_and_i18n() {
        let translations = Translations::new()
            .with("msg", "en", "Note")
            .with("msg", "ca", "Nota");
        let engine = TemplateEngine::new();
        let ctx = TemplateContext::new().with("LANG", "ca").with("w", 7);

        let out = engine
            .render("{{#eval}}w * 2{{/eval}} {{#I18n}}msg{{/I18n}}", &ctx, &translations)
            .unwrap();
        assert_eq!(out, "14 Nota");

        let out = engine
            .render("{{#I18n}}msg{{/I18n}}", &TemplateContext::new(), &translations)
            .unwrap();
        assert_eq!(out, "Note");

        let es = TemplateEngine::new().with_default_locale("es");
        let out = es
            .render("{{#I18n}}other{{/I18n}}", &TemplateContext::new(), &translations)
            .unwrap();
        assert_eq!(out, "other");
    }

    #[test]
    fn test_undefined_identifier_aborts() {
        let result = TemplateEngine::new().render(
            "{{#if}}[nope > 1]x{{/if}}",
            &TemplateContext::new(),
            &Translations::new(),
        );
        assert!(matches!(result, Err(RenderError::Eval(_))));
    }

    #[test]
    fn test_validate_template() {
        let engine = TemplateEngine::new();
        assert!(engine.validate_template("Hello {{name}}").is_ok());
        assert!(engine.validate_template("Hello {{name}").is_err());
        assert!(engine
            .validate_template("{{#if}}[condition]true{{else}}false{{/if}}")
            .is_ok());
        assert!(engine.has_templates("Hello {{name}}"));
        assert!(!engine.has_templates("Hello world"));
    }
}
