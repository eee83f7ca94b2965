//! Offset pagination shared by the list endpoints.
//!
//! Lists take `skip` and `limit` query parameters. `limit` is clamped to `1..=MAX_LIMIT` so a
//! caller can neither request an empty page nor the whole table.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    /// Number of items to skip (default: 0)
    #[param(default = 0, minimum = 0)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub skip: Option<i64>,

    /// Maximum number of items to return (default: 20, max: 100)
    #[param(default = 20, minimum = 1, maximum = 100)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn skip(&self) -> i64 {
        self.skip.map_or(0, |skip| skip.max(0))
    }

    pub fn limit(&self) -> i64 {
        self.limit.map_or(DEFAULT_LIMIT, |limit| limit.clamp(1, MAX_LIMIT))
    }

    /// `(skip, limit)` ready to bind as `OFFSET` and `LIMIT`
    pub fn params(&self) -> (i64, i64) {
        (self.skip(), self.limit())
    }
}

/// One page of a list, with the number of rows the unpaged query would return.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T: ToSchema> {
    pub data: Vec<T>,
    pub total_count: i64,
    pub skip: i64,
    pub limit: i64,
}

impl<T: ToSchema> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total_count: i64, skip: i64, limit: i64) -> Self {
        Self { data, total_count, skip, limit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(skip: Option<i64>, limit: Option<i64>) -> Pagination {
        Pagination { skip, limit }
    }

    #[test]
    fn test_first_page_by_default() {
        assert_eq!(Pagination::default().params(), (0, DEFAULT_LIMIT));
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        assert_eq!(page(Some(-10), Some(0)).params(), (0, 1));
        assert_eq!(page(None, Some(-5)).limit(), 1);
        assert_eq!(page(Some(200), Some(1000)).params(), (200, MAX_LIMIT));
        assert_eq!(page(None, Some(50)).limit(), 50);
    }

    #[test]
    fn test_query_string_numbers_are_parsed() {
        // Query strings arrive as text
        let p: Pagination = serde_json::from_value(serde_json::json!({ "skip": "40", "limit": "10" })).unwrap();
        assert_eq!(p.params(), (40, 10));

        let bad = serde_json::from_value::<Pagination>(serde_json::json!({ "limit": "ten" }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_paginated_response_shape() {
        let response = PaginatedResponse::<String>::new(vec!["a".into(), "b".into()], 12, 10, 2);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["total_count"], 12);
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
        assert_eq!((json["skip"].as_i64(), json["limit"].as_i64()), (Some(10), Some(2)));
    }
}
