// ABOUTME: Translation table for the I18n macro
// ABOUTME: Resolves a message key through exact locale, base language, English, then the key itself

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const FALLBACK_LOCALE: &str = "en";

/// `{ messageKey: { localeCode: text } }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Translations(IndexMap<String, IndexMap<String, String>>);

impl Translations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, locale: impl Into<String>, text: impl Into<String>) {
        self.0
            .entry(key.into())
            .or_default()
            .insert(locale.into(), text.into());
    }

    pub fn with(mut self, key: &str, locale: &str, text: &str) -> Self {
        self.insert(key, locale, text);
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn locales(&self, key: &str) -> Vec<&str> {
        self.0
            .get(key)
            .map(|entries| entries.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn lookup(&self, key: &str, locale: &str) -> String {
        let Some(entries) = self.0.get(key) else {
            return key.to_string();
        };
        let find = |code: &str| {
            entries
                .iter()
                .find(|(candidate, _)| candidate.eq_ignore_ascii_case(code))
                .map(|(_, text)| text.clone())
        };

        let base = locale.split(['-', '_']).next().unwrap_or(locale);
        find(locale)
            .or_else(|| find(base))
            .or_else(|| find(FALLBACK_LOCALE))
            .unwrap_or_else(|| key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Translations {
        Translations::new()
            .with("msg", "en", "Note")
            .with("msg", "ca", "Nota")
            .with("only_es", "es", "Solo")
    }

    #[test]
    fn test_lookup_fallbacks() {
        let t = table();
        assert_eq!(t.lookup("msg", "ca"), "Nota");
        assert_eq!(t.lookup("msg", "CA"), "Nota");
        assert_eq!(t.lookup("msg", "ca-ES"), "Nota");
        assert_eq!(t.lookup("msg", "fr"), "Note");
        assert_eq!(t.lookup("only_es", "fr"), "only_es");
        assert_eq!(t.lookup("missing", "ca"), "missing");
    }

    #[test]
    fn test_deserialize() {
        let t: Translations = serde_yaml::from_str("msg:\n  en: Hi\n  ca: Hola\n").unwrap();
        assert_eq!(t.locales("msg"), vec!["en", "ca"]);
    }
}
