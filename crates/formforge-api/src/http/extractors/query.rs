//! Query parameter extractors for list endpoints.

use serde::Deserialize;

use formforge_core::repository::SortOrder;
use formforge_core::repository::form::FormFilter;

/// Query parameters for the form list endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct FormListQuery {
    /// Case-insensitive title substring.
    pub title: Option<String>,
    /// Only forms bound to this target model.
    pub model: Option<String>,
    /// Sort order on creation time (asc, desc).
    #[serde(default = "default_order")]
    pub order: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn default_order() -> String {
    "desc".to_string()
}

impl FormListQuery {
    pub fn into_filter(self) -> FormFilter {
        let sort_order = match self.order.to_lowercase().as_str() {
            "asc" => SortOrder::Asc,
            _ => SortOrder::Desc,
        };
        FormFilter {
            title_contains: self.title,
            target_model: self.model,
            sort_order: Some(sort_order),
            limit: self.limit,
            offset: self.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_descending() {
        let filter = FormListQuery {
            order: default_order(),
            ..Default::default()
        }
        .into_filter();
        assert!(matches!(filter.sort_order, Some(SortOrder::Desc)));
        assert!(filter.title_contains.is_none());
    }

    #[test]
    fn test_asc_is_case_insensitive() {
        let filter = FormListQuery {
            order: "ASC".to_string(),
            limit: Some(5),
            ..Default::default()
        }
        .into_filter();
        assert!(matches!(filter.sort_order, Some(SortOrder::Asc)));
        assert_eq!(filter.limit, Some(5));
    }
}
