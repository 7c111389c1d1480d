// ABOUTME: Standalone HTML preview page around a rendered widget
// ABOUTME: Uses Handlebars for the page shell; the widget body is inserted unescaped

use handlebars::Handlebars;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as JsonValue;

use super::error::Result;
use super::helpers;

const PAGE_TEMPLATE_NAME: &str = "preview";

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{locale}}">
<head>
<meta charset="utf-8">
<title>{{default title "Widget preview"}}</title>
{{#each stylesheets}}<link rel="stylesheet" href="{{this}}">
{{/each}}</head>
<body>
<main class="widgetkit-preview">
{{{body}}}
</main>
{{#if parameters}}<details>
<summary>Parameters</summary>
<pre>{{json parameters}}</pre>
</details>
{{/if}}</body>
</html>
"#;

#[derive(Debug, Clone, Default, Serialize)]
pub struct PageData {
    pub title: String,
    pub locale: String,
    pub body: String,
    pub parameters: IndexMap<String, JsonValue>,
    pub stylesheets: Vec<String>,
}

#[derive(Clone)]
pub struct PreviewPage {
    handlebars: Handlebars<'static>,
}

impl PreviewPage {
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        helpers::register_helpers(&mut handlebars);
        handlebars.register_template_string(PAGE_TEMPLATE_NAME, PAGE_TEMPLATE)?;
        Ok(Self { handlebars })
    }

    pub fn render(&self, data: &PageData) -> Result<String> {
        Ok(self.handlebars.render(PAGE_TEMPLATE_NAME, data)?)
    }
}
