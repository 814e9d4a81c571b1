//! Values derived from the filter and search cells.

use crate::types::TodoFilter;
use serde::{Deserialize, Serialize};

/// Header information for the visible list
///
/// Recomputed whenever the filter or the keyword changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    /// Active completion filter
    pub current_filter: TodoFilter,
    /// Keyword as typed
    pub search_keyword: String,
    /// True when the trimmed keyword is non-empty
    pub is_searching: bool,
    /// `"<keyword>" search results` while searching, otherwise the filter label
    pub display_text: String,
}

impl FilterStats {
    /// Derive stats from the current filter and keyword
    #[must_use]
    pub fn derive(filter: TodoFilter, keyword: &str) -> Self {
        let is_searching = !keyword.trim().is_empty();
        let display_text = if is_searching {
            format!("\"{keyword}\" search results")
        } else {
            filter.label().to_string()
        };

        Self {
            current_filter: filter,
            search_keyword: keyword.to_string(),
            is_searching,
            display_text,
        }
    }
}

impl Default for FilterStats {
    fn default() -> Self {
        Self::derive(TodoFilter::default(), "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_without_search() {
        assert_eq!(FilterStats::derive(TodoFilter::All, "").display_text, "All todos");
        assert_eq!(FilterStats::derive(TodoFilter::Active, "").display_text, "Active todos");
        assert_eq!(
            FilterStats::derive(TodoFilter::Completed, " ").display_text,
            "Completed todos"
        );
    }

    #[test]
    fn search_label_quotes_keyword() {
        let stats = FilterStats::derive(TodoFilter::Active, "milk");
        assert!(stats.is_searching);
        assert_eq!(stats.display_text, "\"milk\" search results");
        assert_eq!(stats.current_filter, TodoFilter::Active);
    }

    #[test]
    fn unrecognized_filter_text_falls_back_to_all() {
        let stats = FilterStats::derive(TodoFilter::parse_lenient("archived"), "");
        assert_eq!(stats.display_text, "All todos");
    }

    #[test]
    fn default_matches_initial_cells() {
        let stats = FilterStats::default();
        assert!(!stats.is_searching);
        assert_eq!(stats.display_text, "All todos");
    }
}
