// ABOUTME: The bindings of one editing session, keyed by parameter name
// ABOUTME: Reads all values at once and writes a batch back non-transactionally

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use super::Binding;
use crate::value::Value;

#[derive(Default)]
pub struct BindingSet {
    bindings: IndexMap<String, Box<dyn Binding>>,
}

/// Outcome of applying a batch of values
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommitReport {
    /// Parameters whose binding received the value
    pub written: Vec<String>,
    /// Parameters in the batch that have no binding
    pub unbound: Vec<String>,
}

impl CommitReport {
    pub fn is_complete(&self) -> bool {
        self.unbound.is_empty()
    }
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, binding: Box<dyn Binding>) {
        self.bindings.insert(name.into(), binding);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Binding> {
        self.bindings.get(name).map(|b| b.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn get_values(&self) -> IndexMap<String, Value> {
        self.bindings
            .iter()
            .map(|(name, binding)| (name.clone(), binding.get_value()))
            .collect()
    }

    /// Write each value through its binding in order. A failing or missing
    /// binding does not stop the rest of the batch.
    pub fn apply<'a, I>(&self, values: I) -> CommitReport
    where
        I: IntoIterator<Item = (&'a String, &'a Value)>,
    {
        let mut report = CommitReport::default();
        for (name, value) in values {
            match self.bindings.get(name) {
                Some(binding) => {
                    debug!("Writing {} through {} binding", name, binding.kind());
                    binding.set_value(value);
                    report.written.push(name.clone());
                }
                None => report.unbound.push(name.clone()),
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{BindingFactory, BindingSpec};
    use crate::dom::Element;

    #[test]
    fn test_apply_reports_unbound() {
        let el = Element::new("div").with_attribute("title", "a");
        let factory = BindingFactory::new();
        let mut set = BindingSet::new();
        set.insert("title", factory.create(&BindingSpec::dsl("attr('title')"), &el));

        assert_eq!(set.get_values().get("title"), Some(&Value::from("a")));

        let mut values = IndexMap::new();
        values.insert("title".to_string(), Value::from("b"));
        values.insert("other".to_string(), Value::from(1));
        let report = set.apply(&values);

        assert_eq!(report.written, vec!["title"]);
        assert_eq!(report.unbound, vec!["other"]);
        assert!(!report.is_complete());
        assert_eq!(el.get_attribute("title").as_deref(), Some("b"));
    }
}
