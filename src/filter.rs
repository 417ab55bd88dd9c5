//! Include/exclude glob filtering over resource paths (C2, §4.2).
use crate::types::ResourcePath;
use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A parsed, comma-separated glob list, matched case-insensitively against both
/// the prefixed and unprefixed forms of a [`ResourcePath`].
#[derive(Debug, Clone, Default)]
pub struct GlobList {
    patterns: Vec<Pattern>,
}

impl GlobList {
    /// Parses a comma-separated list such as `*.wav,*.ogg,res://private/*`.
    ///
    /// Invalid glob syntax in any one entry is skipped rather than rejecting the
    /// whole list, matching the forgiving behavior of the editor's export dialog.
    pub fn parse(list: &str) -> Self {
        let patterns = crate::types::split_comma_list(list)
            .into_iter()
            .filter_map(|entry| Pattern::new(&entry).ok())
            .collect();
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether `path` matches any pattern in this list, trying both the prefixed
    /// and unprefixed forms of the path.
    pub fn matches(&self, path: &ResourcePath) -> bool {
        self.patterns.iter().any(|pattern| {
            pattern.matches_with(path.prefixed(), MATCH_OPTIONS)
                || pattern.matches_with(path.unprefixed(), MATCH_OPTIONS)
        })
    }
}

/// The include/exclude filter engine described in §4.2.
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    include: GlobList,
    exclude: GlobList,
}

impl FilterEngine {
    pub fn new(include: &str, exclude: &str) -> Self {
        Self {
            include: GlobList::parse(include),
            exclude: GlobList::parse(exclude),
        }
    }

    /// A path is kept when it matches no exclude pattern, and either the include
    /// list is empty or it matches at least one include pattern.
    pub fn keep(&self, path: &ResourcePath) -> bool {
        if self.exclude.matches(path) {
            return false;
        }
        self.include.is_empty() || self.include.matches(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_both_prefixed_and_unprefixed() {
        let list = GlobList::parse("*.png, *.wav");
        assert!(list.matches(&ResourcePath::new("res://art/hero.png")));
        assert!(list.matches(&ResourcePath::new("art/hero.png")));
        assert!(!list.matches(&ResourcePath::new("art/hero.ogg")));
    }

    #[test]
    fn empty_include_list_keeps_everything_not_excluded() {
        let engine = FilterEngine::new("", "*.psd");
        assert!(engine.keep(&ResourcePath::new("res://a.png")));
        assert!(!engine.keep(&ResourcePath::new("res://source.psd")));
    }

    #[test]
    fn exclude_wins_over_include() {
        let engine = FilterEngine::new("*.png", "*secret*");
        assert!(engine.keep(&ResourcePath::new("res://art/hero.png")));
        assert!(!engine.keep(&ResourcePath::new("res://art/secret_hero.png")));
    }

    #[test]
    fn invalid_glob_entries_are_skipped_not_fatal() {
        let list = GlobList::parse("[unterminated,*.png");
        assert!(list.matches(&ResourcePath::new("res://a.png")));
    }
}
