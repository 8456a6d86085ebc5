//! Web search and fetch value types

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Provider-level date restriction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "date")]
pub enum DateWindow {
    /// Published within the last month
    PastMonth,
    /// Published within the last year
    PastYear,
    /// Published on or after a date
    Since(NaiveDate),
}

impl DateWindow {
    /// Earliest admissible publication date relative to `as_of`
    pub fn earliest(&self, as_of: NaiveDate) -> NaiveDate {
        match self {
            DateWindow::PastMonth => as_of.checked_sub_months(Months::new(1)).unwrap_or(as_of),
            DateWindow::PastYear => as_of
                .with_year(as_of.year() - 1)
                .or_else(|| as_of.checked_sub_months(Months::new(12)))
                .unwrap_or(as_of),
            DateWindow::Since(date) => *date,
        }
    }
}

/// Filters passed to the search provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Maximum results to return
    pub max_results: usize,
    /// Optional date restriction
    pub date_window: Option<DateWindow>,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            max_results: 8,
            date_window: None,
        }
    }
}

/// A single search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Result URL
    pub url: String,
    /// Result title
    #[serde(default)]
    pub title: String,
    /// Snippet shown by the provider
    #[serde(default)]
    pub snippet: String,
    /// Publication date, when the provider knows it
    #[serde(default)]
    pub published: Option<NaiveDate>,
}

impl SearchResult {
    /// Create a result with only a URL and title
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            snippet: String::new(),
            published: None,
        }
    }
}

/// Text and title of a fetched page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedPage {
    /// Page title
    #[serde(default)]
    pub title: String,
    /// Extracted text
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_past_year_window() {
        let as_of = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert_eq!(
            DateWindow::PastYear.earliest(as_of),
            NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
        );
    }

    #[test]
    fn test_past_year_leap_day() {
        let as_of = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            DateWindow::PastYear.earliest(as_of),
            NaiveDate::from_ymd_opt(2023, 2, 28).unwrap()
        );
    }

    #[test]
    fn test_past_month_and_since() {
        let as_of = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        assert_eq!(
            DateWindow::PastMonth.earliest(as_of),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
        let since = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(DateWindow::Since(since).earliest(as_of), since);
    }
}
