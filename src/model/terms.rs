use std::collections::HashSet;
use std::fmt;

/// A trimmed, non-empty line of the input list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchTerm(String);

impl SearchTerm {
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SearchTerm {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Case-insensitive set of the run's input terms, used to keep discovery from
/// recording one of them again as a related business.
#[derive(Debug, Clone, Default)]
pub struct KnownTerms {
    terms: HashSet<String>,
}

impl KnownTerms {
    pub fn from_terms<'a, I>(terms: I) -> Self
    where
        I: IntoIterator<Item = &'a SearchTerm>,
    {
        Self {
            terms: terms.into_iter().map(|t| t.as_str().to_lowercase()).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.terms.contains(&name.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
