//! Key and text predicates for match expressions and key-based filters.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Predicate over annotation keys and text values.
///
/// Compares the whole candidate against a literal, or runs a regular
/// expression over it. The regex is compiled once at construction; cloned
/// matchers share the compiled program, so duplicating an expression tree
/// per worker stays cheap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Matcher {
    /// Equality against the full candidate string.
    Exact(String),
    /// Compiled regex. Not serializable; rebuild from `source` when reading
    /// a persisted expression back in.
    #[serde(skip)]
    Pattern {
        source: String,
        compiled: Arc<regex::Regex>,
    },
}

impl Matcher {
    pub fn exact(value: impl Into<String>) -> Self {
        Matcher::Exact(value.into())
    }

    /// Compiles `source` into a searching matcher; a hit anywhere inside the
    /// candidate counts.
    pub fn try_regex(source: impl Into<String>) -> Result<Self, regex::Error> {
        let source = source.into();
        let compiled = regex::Regex::new(&source)?;
        Ok(Matcher::Pattern {
            source,
            compiled: Arc::new(compiled),
        })
    }

    /// Compiles `source` anchored at both ends, so only the whole candidate
    /// can match. Key filtering wants this form, where `pos` and `pos_fine`
    /// are distinct keys.
    pub fn try_full_regex(source: impl Into<String>) -> Result<Self, regex::Error> {
        let source = source.into();
        let compiled = regex::Regex::new(&format!(r"\A(?:{source})\z"))?;
        Ok(Matcher::Pattern {
            source,
            compiled: Arc::new(compiled),
        })
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Matcher::Exact(value) => candidate == value,
            Matcher::Pattern { compiled, .. } => compiled.is_match(candidate),
        }
    }

    /// The literal value, or the regex source as the caller wrote it (without
    /// any anchoring added by [`Matcher::try_full_regex`]).
    pub fn source(&self) -> &str {
        match self {
            Matcher::Exact(value) => value,
            Matcher::Pattern { source, .. } => source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_matcher_compares_whole_candidate() {
        let m = Matcher::exact("nsubj");
        assert!(m.matches("nsubj"));
        assert!(!m.matches("nsubj:pass"));
        assert_eq!(m.source(), "nsubj");
    }

    #[test]
    fn test_regex_matcher_searches_anywhere() {
        let m = Matcher::try_regex("subj").unwrap();
        assert!(m.matches("nsubj"));
        assert!(m.matches("csubj:outer"));
        assert!(!m.matches("obj"));
    }

    #[test]
    fn test_full_regex_requires_whole_match() {
        let m = Matcher::try_full_regex("pos").unwrap();
        assert!(m.matches("pos"));
        assert!(!m.matches("pos_fine"));
        // Anchoring stays out of the reported source.
        assert_eq!(m.source(), "pos");
    }

    #[test]
    fn test_full_regex_anchors_alternations() {
        // Without the non-capturing group the alternation would bind looser
        // than the anchors.
        let m = Matcher::try_full_regex("pos|lemma").unwrap();
        assert!(m.matches("lemma"));
        assert!(!m.matches("xlemma"));
        assert!(!m.matches("posx"));
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        assert!(Matcher::try_regex("[unclosed").is_err());
        assert!(Matcher::try_full_regex("[unclosed").is_err());
    }
}
