// ABOUTME: Builds live bindings from binding specs against a DOM root
// ABOUTME: Resolves the descendant query once and dispatches on the closed set of binding kinds

use tracing::{debug, warn};

use super::accessor::{AccessorBinding, Vocabulary};
use super::attr::{AttrBinding, AttrBsBinding, AttrRegexBinding, HasAttrBinding};
use super::class::{ClassRegexBinding, HasClassBinding};
use super::dsl::{parse_binding_call, BindingCall, BindingKind};
use super::error::{BindingError, Result};
use super::style::{HasStyleBinding, StyleRegexBinding};
use super::{Binding, BindingSpec, NoopBinding};
use crate::dom::Element;

pub const DEFAULT_BS_VERSION: u8 = 5;

#[derive(Debug, Clone)]
pub struct BindingFactory {
    default_bs_version: u8,
}

impl BindingFactory {
    pub fn new() -> Self {
        Self {
            default_bs_version: DEFAULT_BS_VERSION,
        }
    }

    /// Bootstrap generation used by `attrBS`/`hasAttrBS` calls that do not
    /// name one
    pub fn with_bs_version(mut self, version: u8) -> Self {
        self.default_bs_version = version;
        self
    }

    pub fn bs_version(&self) -> u8 {
        self.default_bs_version
    }

    /// Build a binding, degrading to a no-op binding when `spec` is
    /// malformed
    pub fn create(&self, spec: &BindingSpec, root: &Element) -> Box<dyn Binding> {
        match self.try_create(spec, root) {
            Ok(binding) => binding,
            Err(e) => {
                warn!("Ignoring binding {}: {}", spec.describe(), e);
                Box::new(NoopBinding)
            }
        }
    }

    pub fn try_create(&self, spec: &BindingSpec, root: &Element) -> Result<Box<dyn Binding>> {
        match spec {
            BindingSpec::StringDsl(text) => {
                let call = parse_binding_call(text)?;
                self.from_call(&call, root)
            }
            BindingSpec::LegacyAccessor { get, set } => Ok(Box::new(AccessorBinding::new(
                Some(root.clone()),
                Vocabulary::Legacy,
                get,
                set.as_deref(),
            )?)),
            BindingSpec::DirectAccessor { get_value, set_value } => {
                Ok(Box::new(AccessorBinding::new(
                    Some(root.clone()),
                    Vocabulary::Direct,
                    get_value,
                    set_value.as_deref(),
                )?))
            }
        }
    }

    pub fn from_call(&self, call: &BindingCall, root: &Element) -> Result<Box<dyn Binding>> {
        let primary = call.primary()?;
        let target = resolve_target(root, call.query().as_deref());
        let cast = call.cast();
        let negate = call.negate();
        let version = match call.kind {
            BindingKind::AttrBs | BindingKind::HasAttrBs => {
                call.bs_version()?.unwrap_or(self.default_bs_version)
            }
            _ => self.default_bs_version,
        };

        debug!(
            "Creating {} binding on '{}' (target found: {})",
            call.kind,
            primary,
            target.is_some()
        );

        let binding: Box<dyn Binding> = match call.kind {
            BindingKind::HasClass => Box::new(HasClassBinding::new(target, &primary, negate)),
            BindingKind::NotHasClass => Box::new(HasClassBinding::new(target, &primary, !negate)),
            BindingKind::ClassRegex => Box::new(ClassRegexBinding::new(target, &primary, cast)?),
            BindingKind::Attr => Box::new(AttrBinding::new(target, &primary, cast)),
            BindingKind::AttrBs => Box::new(AttrBsBinding::new(target, &primary, cast, version)),
            BindingKind::HasAttr => Box::new(HasAttrBinding::new(target, &primary, negate, None)),
            BindingKind::HasAttrBs => {
                Box::new(HasAttrBinding::new(target, &primary, negate, Some(version)))
            }
            BindingKind::NotHasAttr => {
                Box::new(HasAttrBinding::new(target, &primary, !negate, None))
            }
            BindingKind::AttrRegex => Box::new(AttrRegexBinding::new(target, &primary, cast)?),
            BindingKind::HasStyle => Box::new(HasStyleBinding::new(target, &primary, negate)),
            BindingKind::NotHasStyle => Box::new(HasStyleBinding::new(target, &primary, !negate)),
            BindingKind::StyleRegex => Box::new(StyleRegexBinding::new(target, &primary, cast)?),
        };
        Ok(binding)
    }
}

impl Default for BindingFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// The element a binding addresses: the first descendant matching `query`,
/// or the root itself when no query is given
pub(crate) fn resolve_target(root: &Element, query: Option<&str>) -> Option<Element> {
    let Some(query) = query else {
        return Some(root.clone());
    };
    match root.query_selector(query) {
        Ok(found) => found,
        Err(e) => {
            warn!("Binding query '{}' is not a valid selector: {}", query, e);
            None
        }
    }
}

/// Split `name=value` (or `name:value`) on the first separator
pub(crate) fn split_pair(text: &str, separator: char) -> (String, Option<String>) {
    match text.split_once(separator) {
        Some((name, value)) => (name.trim().to_string(), Some(value.trim().to_string())),
        None => (text.trim().to_string(), None),
    }
}

pub(crate) fn require_pair(kind: BindingKind, text: &str, separator: char) -> Result<(String, String)> {
    match split_pair(text, separator) {
        (name, Some(value)) if !name.is_empty() => Ok((name, value)),
        _ => Err(BindingError::InvalidArgument {
            kind: kind.to_string(),
            reason: format!("expected 'name{}pattern', got '{}'", separator, text),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Fragment;
    use crate::value::Value;

    fn root() -> Element {
        Fragment::parse(r#"<div class="box on"><a class="link" href="x.html">x</a></div>"#)
            .first_element()
            .unwrap()
    }

    #[test]
    fn test_query_resolution() {
        let root = root();
        assert!(resolve_target(&root, None).unwrap().ptr_eq(&root));
        assert_eq!(resolve_target(&root, Some("a")).unwrap().tag_name(), "a");
        assert!(resolve_target(&root, Some("span")).is_none());
        assert!(resolve_target(&root, Some("[[")).is_none());
    }

    #[test]
    fn test_malformed_spec_degrades_to_noop() {
        let factory = BindingFactory::new();
        let binding = factory.create(&BindingSpec::dsl("bogus('x')"), &root());
        assert_eq!(binding.kind(), "noop");
        assert_eq!(binding.get_value(), Value::Null);

        assert!(factory
            .try_create(&BindingSpec::dsl("attr("), &root())
            .is_err());
        assert!(matches!(
            factory.try_create(&BindingSpec::dsl("attrBS('x', '', '', 99999)"), &root()),
            Err(BindingError::InvalidArgument { .. })
        ));
        assert_eq!(
            factory
                .create(&BindingSpec::dsl("hasAttrBS('x', '', '', -1)"), &root())
                .kind(),
            "noop"
        );
    }

    #[test]
    fn test_dispatch() {
        let factory = BindingFactory::new();
        let root = root();
        let has = factory.create(&BindingSpec::dsl("hasClass('on')"), &root);
        assert_eq!(has.get_value(), Value::Bool(true));
        let not = factory.create(&BindingSpec::dsl("notHasClass('on')"), &root);
        assert_eq!(not.get_value(), Value::Bool(false));
        let href = factory.create(&BindingSpec::dsl("attr('href', 'a')"), &root);
        assert_eq!(href.get_value(), Value::from("x.html"));
    }

    #[test]
    fn test_split_pair() {
        assert_eq!(split_pair("target=_blank", '='), ("target".into(), Some("_blank".into())));
        assert_eq!(split_pair("hidden", '='), ("hidden".into(), None));
        assert_eq!(
            split_pair("width: (.*)px", ':'),
            ("width".into(), Some("(.*)px".into()))
        );
        assert!(require_pair(BindingKind::AttrRegex, "title", '=').is_err());
    }
}
