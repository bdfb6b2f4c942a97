use crate::{FolioError, Result};
use regex::Regex;

/// Tests document text against a set of keyword patterns.
///
/// The keywords are joined into one alternation `k1|k2|...`. By default each
/// keyword is a regex fragment, so `"hotel|base load"` behaves as written;
/// with `literal` every keyword is escaped first. Matching is case-sensitive
/// and has no word boundaries: `"load"` matches inside `"overloaded"`.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    regex: Regex,
    keyword_count: usize,
}

impl KeywordMatcher {
    /// Build a matcher.
    ///
    /// # Errors
    ///
    /// `FolioError::Validation` if there are no keywords, a keyword is empty,
    /// or the combined pattern does not compile.
    pub fn new<S: AsRef<str>>(keywords: &[S], literal: bool) -> Result<Self> {
        if keywords.is_empty() {
            return Err(FolioError::validation("At least one keyword is required"));
        }

        let mut fragments = Vec::with_capacity(keywords.len());
        for (index, keyword) in keywords.iter().enumerate() {
            let keyword = keyword.as_ref();
            if keyword.is_empty() {
                return Err(FolioError::validation(format!(
                    "Keyword #{} is empty; an empty pattern would match every document",
                    index + 1
                )));
            }
            fragments.push(if literal {
                regex::escape(keyword)
            } else {
                keyword.to_string()
            });
        }

        let pattern = fragments.join("|");
        let regex = Regex::new(&pattern).map_err(|e| {
            FolioError::validation_with_source(format!("Invalid keyword pattern '{}'", pattern), e)
        })?;

        Ok(Self {
            regex,
            keyword_count: keywords.len(),
        })
    }

    /// Whether `text` contains at least one non-empty match.
    ///
    /// A pattern that can only match the empty string (`"x*"` on text
    /// without `x`) does not count.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.find_iter(text).any(|m| !m.is_empty())
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn keyword_count(&self) -> usize {
        self.keyword_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_keyword_matches() {
        let matcher = KeywordMatcher::new(&["hotel load", "base load"], false).unwrap();
        assert!(matcher.is_match("the hotel load analysis"));
        assert!(matcher.is_match("reducing base load"));
        assert!(!matcher.is_match("unrelated content"));
        assert_eq!(matcher.pattern(), "hotel load|base load");
        assert_eq!(matcher.keyword_count(), 2);
    }

    #[test]
    fn test_matching_is_case_sensitive_substring() {
        let matcher = KeywordMatcher::new(&["load"], false).unwrap();
        assert!(matcher.is_match("overloaded"));
        assert!(!matcher.is_match("Hotel LOAD"));
    }

    #[test]
    fn test_regex_fragments_by_default() {
        let matcher = KeywordMatcher::new(&["hotel\\s+load"], false).unwrap();
        assert!(matcher.is_match("hotel   load"));

        let literal = KeywordMatcher::new(&["hotel\\s+load"], true).unwrap();
        assert!(!literal.is_match("hotel   load"));
        assert!(literal.is_match("raw hotel\\s+load text"));
    }

    #[test]
    fn test_literal_escapes_metacharacters() {
        let matcher = KeywordMatcher::new(&["C++ (v2)"], true).unwrap();
        assert!(matcher.is_match("written in C++ (v2) only"));
        assert!(!matcher.is_match("written in C (v2)"));
    }

    #[test]
    fn test_empty_matches_do_not_count() {
        let matcher = KeywordMatcher::new(&["x*"], false).unwrap();
        assert!(!matcher.is_match("no such letter"));
        assert!(matcher.is_match("a box"));
    }

    #[test]
    fn test_rejects_empty_keyword_set() {
        let keywords: [&str; 0] = [];
        let err = KeywordMatcher::new(&keywords, false).unwrap_err();
        assert!(matches!(err, FolioError::Validation { .. }));
    }

    #[test]
    fn test_rejects_empty_keyword() {
        let err = KeywordMatcher::new(&["hotel", ""], false).unwrap_err();
        assert!(err.to_string().contains("#2"));
    }

    #[test]
    fn test_rejects_invalid_pattern() {
        let err = KeywordMatcher::new(&["(unclosed"], false).unwrap_err();
        assert!(matches!(err, FolioError::Validation { .. }));
        assert!(KeywordMatcher::new(&["(unclosed"], true).is_ok());
    }
}
