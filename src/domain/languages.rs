//! Site languages and the explicit language arguments used by content operations.
//!
//! A site with no configured languages is a single-language site: its content
//! files carry no language suffix. Operations never infer the "current"
//! language from ambient state; callers pass a [`Lang`] or a [`LanguageScope`].

use std::collections::HashSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// A configured site language. Identity is the language code.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub name: Option<String>,
}

impl Language {
    pub fn new(code: impl Into<String>, default: bool) -> Self {
        Self {
            code: code.into(),
            default,
            name: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn is_default(&self) -> bool {
        self.default
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

/// The languages configured for a site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Languages {
    items: Vec<Language>,
}

impl Languages {
    /// A single-language site.
    pub fn single() -> Self {
        Self::default()
    }

    /// Validate and build a multi-language configuration.
    ///
    /// Codes must be unique, non-empty and safe to embed in a file name.
    /// Exactly one language must be marked as default.
    pub fn new(items: Vec<Language>) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Ok(Self::single());
        }

        let mut seen = HashSet::new();
        for language in &items {
            let code = language.code.as_str();
            if code.is_empty() {
                return Err(DomainError::validation("language code must not be empty"));
            }
            if !code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err(DomainError::validation(format!(
                    "language code `{code}` contains unsupported characters"
                )));
            }
            if !seen.insert(code) {
                return Err(DomainError::validation(format!(
                    "language code `{code}` is configured twice"
                )));
            }
        }

        match items.iter().filter(|language| language.default).count() {
            1 => Ok(Self { items }),
            0 => Err(DomainError::validation("no default language configured")),
            _ => Err(DomainError::validation(
                "more than one default language configured",
            )),
        }
    }

    pub fn is_multilingual(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn default_language(&self) -> Option<&Language> {
        self.items.iter().find(|language| language.default)
    }

    pub fn find(&self, code: &str) -> Option<&Language> {
        self.items.iter().find(|language| language.code == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Language> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Resolve a language argument to the file suffix code.
    ///
    /// Returns `None` for the suffix-less file of a single-language site.
    pub fn resolve(&self, lang: &Lang) -> Result<Option<String>, DomainError> {
        match (lang, self.default_language()) {
            (Lang::Default, Some(default)) => Ok(Some(default.code.clone())),
            (Lang::Default, None) => Ok(None),
            (Lang::Code(code), _) => self
                .find(code)
                .map(|language| Some(language.code.clone()))
                .ok_or_else(|| DomainError::invalid_language(code.clone())),
        }
    }

    /// Resolve a scope to every file suffix it covers, in configuration order.
    pub fn resolve_scope(&self, scope: &LanguageScope) -> Result<Vec<Option<String>>, DomainError> {
        match scope {
            LanguageScope::One(lang) => Ok(vec![self.resolve(lang)?]),
            LanguageScope::All if self.is_multilingual() => Ok(self
                .items
                .iter()
                .map(|language| Some(language.code.clone()))
                .collect()),
            LanguageScope::All => Ok(vec![None]),
        }
    }
}

/// A single language argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Lang {
    /// The site's default language, or the only content file of a
    /// single-language site.
    Default,
    /// A configured language code.
    Code(String),
}

impl Lang {
    pub fn code(code: impl Into<String>) -> Self {
        Self::Code(code.into())
    }
}

impl From<&Language> for Lang {
    fn from(language: &Language) -> Self {
        Self::Code(language.code.clone())
    }
}

impl FromStr for Lang {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "" | "default" => Ok(Self::Default),
            code => Ok(Self::Code(code.to_string())),
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lang::Default => f.write_str("default"),
            Lang::Code(code) => f.write_str(code),
        }
    }
}

/// One language, or every language the site has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageScope {
    One(Lang),
    All,
}

impl From<Lang> for LanguageScope {
    fn from(lang: Lang) -> Self {
        Self::One(lang)
    }
}
