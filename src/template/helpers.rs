// ABOUTME: Handlebars helpers for widget templates and the preview page
// ABOUTME: Mustache-style sections over context keys, JSON dumps and defaults over page data

use handlebars::{
    BlockContext, Context, Handlebars, Helper, HelperDef, HelperResult, JsonTruthy, Output,
    RenderContext, RenderError, Renderable,
};
use serde_json::Value as JsonValue;

/// Name handlebars calls for a block whose name is not a registered helper
pub const SECTION_HELPER_NAME: &str = "blockHelperMissing";

/// `{{#key}}..{{else}}..{{/key}}` over an arbitrary context key. Arrays
/// render the block once per item, other truthy values render it once with
/// the value as `this`, falsy values (`0`, `""`, `[]`, null) render the
/// inverse.
#[derive(Clone, Copy)]
pub struct SectionHelper;

impl HelperDef for SectionHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let value = rc.evaluate(ctx, h.name())?.as_json().clone();

        if !value.is_truthy(false) {
            if let Some(t) = h.inverse() {
                t.render(r, ctx, rc, out)?;
            }
            return Ok(());
        }

        let Some(t) = h.template() else {
            return Ok(());
        };
        let items = match value {
            JsonValue::Array(items) => items,
            other => vec![other],
        };
        for item in items {
            let mut block = BlockContext::new();
            block.set_base_value(item);
            rc.push_block(block);
            let result = t.render(r, ctx, rc, out);
            rc.pop_block();
            result?;
        }
        Ok(())
    }
}

/// JSON helper - pretty-prints a value, HTML-escaped for display
pub fn json_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> std::result::Result<(), RenderError> {
    let value = h
        .param(0)
        .map(|v| v.value().clone())
        .ok_or_else(|| RenderError::new("json helper requires a parameter"))?;
    let text = serde_json::to_string_pretty(&value)
        .map_err(|e| RenderError::new(format!("json helper failed: {}", e)))?;
    out.write(&handlebars::html_escape(&text))?;
    Ok(())
}

/// Default helper - returns default value if input is empty or missing
pub fn default_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> std::result::Result<(), RenderError> {
    let value = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");
    let default_value = h.param(1).and_then(|v| v.value().as_str()).unwrap_or("");

    let result = if value.is_empty() {
        default_value
    } else {
        value
    };
    out.write(result)?;
    Ok(())
}

/// Register the section fallback used by widget templates
pub fn register_section_helper(handlebars: &mut Handlebars) {
    handlebars.register_helper(SECTION_HELPER_NAME, Box::new(SectionHelper));
}

/// Register all preview helpers
pub fn register_helpers(handlebars: &mut Handlebars) {
    handlebars.register_helper("json", Box::new(json_helper));
    handlebars.register_helper("default", Box::new(default_helper));
}
