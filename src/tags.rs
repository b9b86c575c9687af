//! Tag normalization shared by the record store, the CLI, and query parsing.
//!
//! Tags keep the spelling the user typed. Normalization only trims
//! surrounding whitespace, drops empty entries, and removes duplicates
//! while preserving the order of first occurrence.

use std::collections::HashSet;

/// Post-processing layer applied to every tag list before it is stored or matched.
pub struct TagNormalizer;

impl TagNormalizer {
    /// Normalizes a single tag by trimming surrounding whitespace.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagloom::tags::TagNormalizer;
    ///
    /// assert_eq!(TagNormalizer::normalize_tag("  rust "), "rust");
    /// assert_eq!(TagNormalizer::normalize_tag("Deep Work"), "Deep Work");
    /// ```
    #[must_use]
    pub fn normalize_tag(tag: &str) -> String {
        tag.trim().to_string()
    }

    /// Normalizes a collection of tags, removing duplicates and empty strings.
    ///
    /// Deduplication is exact after trimming, keeping the first occurrence.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagloom::tags::TagNormalizer;
    ///
    /// let tags = ["work", " work", "", "home"];
    /// assert_eq!(TagNormalizer::normalize_tags(tags), vec!["work", "home"]);
    /// ```
    #[must_use]
    pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        tags.into_iter()
            .map(|tag| Self::normalize_tag(tag.as_ref()))
            .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
            .collect()
    }

    /// Splits a comma-separated tag list and normalizes the result.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagloom::tags::TagNormalizer;
    ///
    /// assert_eq!(TagNormalizer::parse_list("rust, learning, "), vec!["rust", "learning"]);
    /// ```
    #[must_use]
    pub fn parse_list(input: &str) -> Vec<String> {
        Self::normalize_tags(input.split(','))
    }
}
