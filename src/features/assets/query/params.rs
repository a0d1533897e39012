use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;
use utoipa::IntoParams;

use crate::shared::types::PaginationQuery;

/// Optional search filters. Blank values impose no constraint.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct SearchParams {
    /// Case-insensitive substring over name, description, file reference and tags
    pub keyword: Option<String>,
    /// Comma-separated tag names
    pub tag: Option<String>,
    /// Category id or exact name; `all` disables the filter
    pub category: Option<String>,
    /// One of image, video, document, other
    pub file_type: Option<String>,
    /// Substring of the last modifier's username
    pub user: Option<String>,
    /// Earliest upload date, `YYYY-MM-DD`, inclusive
    pub date_from: Option<String>,
    /// Latest upload date, `YYYY-MM-DD`, inclusive
    pub date_to: Option<String>,
    /// Page number (1-indexed, default: 1)
    #[param(minimum = 1)]
    pub page: Option<i64>,
    /// Number of items per page (default: 20, max: 100)
    #[param(minimum = 1, maximum = 100)]
    pub page_size: Option<i64>,
}

impl SearchParams {
    pub fn pagination(&self) -> PaginationQuery {
        let defaults = PaginationQuery::default();
        PaginationQuery::new(
            self.page.unwrap_or(defaults.page),
            self.page_size.unwrap_or(defaults.page_size),
        )
    }
}

/// Trimmed value, `None` when absent or blank
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parse `YYYY-MM-DD`, ignoring anything malformed
pub fn lenient_date(field: &str, value: &Option<String>) -> Option<NaiveDate> {
    let raw = non_blank(value)?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            debug!("Ignoring malformed {} '{}': {}", field, raw, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(&Some("  cat ".to_string())), Some("cat"));
        assert_eq!(non_blank(&Some("   ".to_string())), None);
        assert_eq!(non_blank(&None), None);
    }

    #[test]
    fn test_lenient_date() {
        assert_eq!(
            lenient_date("date_from", &Some("2024-01-15".to_string())),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
        assert_eq!(lenient_date("date_from", &Some("15/01/2024".to_string())), None);
        assert_eq!(lenient_date("date_to", &Some("2024-02-30".to_string())), None);
    }

    #[test]
    fn test_pagination_defaults() {
        let params = SearchParams::default();
        assert_eq!(params.pagination().page, 1);
        assert_eq!(params.pagination().limit(), 20);

        let params = SearchParams {
            page: Some(2),
            page_size: Some(500),
            ..Default::default()
        };
        assert_eq!(params.pagination().limit(), 100);
        assert_eq!(params.pagination().offset(), 100);
    }
}
