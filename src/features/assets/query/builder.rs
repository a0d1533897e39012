use std::sync::Arc;

use super::filter::{AssetFilter, AssetQuery, Condition};
use super::params::{lenient_date, non_blank, SearchParams};
use super::tag_source::{split_tag_list, TagSemantics, TagSource};
use crate::core::error::{AppError, Result};
use crate::features::assets::models::AssetType;
use crate::shared::constants::{CATEGORY_ALL, QUICK_SEARCH_LIMIT, QUICK_SEARCH_MIN_LENGTH};

/// Turns request parameters into an [`AssetQuery`] without touching storage
#[derive(Clone)]
pub struct QueryBuilder {
    tags: Arc<dyn TagSource>,
}

impl QueryBuilder {
    pub fn new(tags: Arc<dyn TagSource>) -> Self {
        Self { tags }
    }

    pub fn build(&self, params: &SearchParams) -> AssetQuery {
        let mut filter = AssetFilter::live();

        if let Some(keyword) = non_blank(&params.keyword) {
            filter.push(Condition::Keyword(keyword.to_string()));
        }

        if let Some(raw) = non_blank(&params.tag) {
            let wanted = split_tag_list(raw);
            if !wanted.is_empty() {
                filter.push(match self.tags.semantics() {
                    TagSemantics::All => Condition::TagsContainAll(wanted),
                    TagSemantics::Any => Condition::TagsAnyOf(wanted),
                });
            }
        }

        if let Some(category) = non_blank(&params.category) {
            if !category.eq_ignore_ascii_case(CATEGORY_ALL) {
                filter.push(Condition::Category(category.to_string()));
            }
        }

        if let Some(file_type) = non_blank(&params.file_type).and_then(AssetType::parse) {
            filter.push(Condition::AssetType(file_type));
        }

        if let Some(user) = non_blank(&params.user) {
            filter.push(Condition::ModifiedByUsername(user.to_string()));
        }

        if let Some(from) = lenient_date("date_from", &params.date_from) {
            filter.push(Condition::UploadedFrom(from));
        }

        if let Some(to) = lenient_date("date_to", &params.date_to) {
            filter.push(Condition::UploadedTo(to));
        }

        let page = params.pagination();
        AssetQuery {
            filter,
            limit: Some(page.limit()),
            offset: page.offset(),
        }
    }

    /// Short free-text lookup over name, description and tags
    pub fn quick_search(&self, q: &str) -> Result<AssetQuery> {
        let q = q.trim();
        if q.chars().count() < QUICK_SEARCH_MIN_LENGTH {
            return Err(AppError::Validation(format!(
                "Minimum {} characters required for search",
                QUICK_SEARCH_MIN_LENGTH
            )));
        }

        Ok(AssetQuery {
            filter: AssetFilter::live().and(Condition::QuickText(q.to_string())),
            limit: Some(QUICK_SEARCH_LIMIT),
            offset: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::assets::query::tag_source::{DelimitedTags, LinkedTags};
    use chrono::NaiveDate;

    fn linked() -> QueryBuilder {
        QueryBuilder::new(Arc::new(LinkedTags))
    }

    fn delimited() -> QueryBuilder {
        QueryBuilder::new(Arc::new(DelimitedTags))
    }

    fn params() -> SearchParams {
        SearchParams::default()
    }

    #[test]
    fn test_empty_params_only_exclude_deleted() {
        let query = linked().build(&params());
        assert_eq!(query.filter.conditions, vec![Condition::NotDeleted]);
        assert_eq!(query.limit, Some(20));
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn test_blank_values_impose_nothing() {
        let query = linked().build(&SearchParams {
            keyword: Some("   ".to_string()),
            tag: Some(" , ,".to_string()),
            user: Some(String::new()),
            ..params()
        });
        assert_eq!(query.filter.conditions, vec![Condition::NotDeleted]);
    }

    #[test]
    fn test_tag_semantics_follow_tag_source() {
        let p = SearchParams {
            tag: Some("x, y".to_string()),
            ..params()
        };
        let wanted = vec!["x".to_string(), "y".to_string()];

        assert!(delimited()
            .build(&p)
            .filter
            .conditions
            .contains(&Condition::TagsContainAll(wanted.clone())));
        assert!(linked()
            .build(&p)
            .filter
            .conditions
            .contains(&Condition::TagsAnyOf(wanted)));
    }

    #[test]
    fn test_category_all_disables_filter() {
        for value in ["all", "ALL", " All "] {
            let query = linked().build(&SearchParams {
                category: Some(value.to_string()),
                ..params()
            });
            assert_eq!(query.filter.conditions, vec![Condition::NotDeleted]);
        }
    }

    #[test]
    fn test_unknown_file_type_and_bad_dates_are_ignored() {
        let query = linked().build(&SearchParams {
            file_type: Some("spreadsheet".to_string()),
            date_from: Some("yesterday".to_string()),
            date_to: Some("2024-13-01".to_string()),
            ..params()
        });
        assert_eq!(query.filter.conditions, vec![Condition::NotDeleted]);
    }

    #[test]
    fn test_all_dimensions_combine() {
        let query = linked().build(&SearchParams {
            keyword: Some("beach".to_string()),
            category: Some("Photos".to_string()),
            file_type: Some("image".to_string()),
            user: Some("ali".to_string()),
            date_from: Some("2024-01-01".to_string()),
            date_to: Some("2024-01-31".to_string()),
            ..params()
        });

        assert_eq!(
            query.filter.conditions,
            vec![
                Condition::NotDeleted,
                Condition::Keyword("beach".to_string()),
                Condition::Category("Photos".to_string()),
                Condition::AssetType(AssetType::Image),
                Condition::ModifiedByUsername("ali".to_string()),
                Condition::UploadedFrom(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
                Condition::UploadedTo(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()),
            ]
        );
    }

    #[test]
    fn test_quick_search_requires_two_characters() {
        assert!(matches!(
            linked().quick_search(" a "),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(linked().quick_search(""), Err(AppError::Validation(_))));

        let query = linked().quick_search("  ab ").unwrap();
        assert_eq!(query.limit, Some(10));
        assert!(query
            .filter
            .conditions
            .contains(&Condition::QuickText("ab".to_string())));
    }
}
