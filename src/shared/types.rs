use serde::de::{value::StringDeserializer, DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub meta: Option<Meta>,
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Standard pagination query parameters for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PaginationQuery {
    /// Page number (1-indexed, default: 1)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Number of items per page (default: 20, max: 100)
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationQuery {
    /// Calculate SQL OFFSET from page number
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }

    /// Get clamped page_size (respects MAX_PAGE_SIZE)
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

// =============================================================================
// QUERY FILTERS
// =============================================================================

/// Deserializes an optional query filter, treating `?key=` as absent.
///
/// Use with `#[serde(default, deserialize_with = "empty_as_none")]`.
pub fn empty_as_none<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => {
            let value: StringDeserializer<D::Error> = raw.into_deserializer();
            T::deserialize(value).map(Some)
        }
        _ => Ok(None),
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            data,
            message,
            meta,
            errors: None,
        }
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            meta: None,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_offset_and_clamp() {
        let page = PaginationQuery {
            page: 3,
            page_size: 10,
        };
        assert_eq!(page.offset(), 20);
        assert_eq!(page.limit(), 10);

        let oversized = PaginationQuery {
            page: 0,
            page_size: 1_000,
        };
        assert_eq!(oversized.offset(), 0);
        assert_eq!(oversized.limit(), MAX_PAGE_SIZE);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    enum Colour {
        #[serde(rename = "Dark Blue")]
        DarkBlue,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Filter {
        #[serde(default, deserialize_with = "empty_as_none")]
        owner_id: Option<String>,
        #[serde(default, deserialize_with = "empty_as_none")]
        colour: Option<Colour>,
    }

    #[test]
    fn test_empty_filters_are_absent() {
        let filter: Filter = serde_json::from_str(r#"{"ownerId": "", "colour": " "}"#).unwrap();
        assert_eq!(filter.owner_id, None);
        assert_eq!(filter.colour, None);

        let filter: Filter = serde_json::from_str("{}").unwrap();
        assert_eq!(filter.owner_id, None);
        assert_eq!(filter.colour, None);
    }

    #[test]
    fn test_non_empty_filters_parse() {
        let filter: Filter =
            serde_json::from_str(r#"{"ownerId": "usr_1", "colour": "Dark Blue"}"#).unwrap();
        assert_eq!(filter.owner_id.as_deref(), Some("usr_1"));
        assert_eq!(filter.colour, Some(Colour::DarkBlue));

        assert!(serde_json::from_str::<Filter>(r#"{"colour": "Green"}"#).is_err());
    }
}
