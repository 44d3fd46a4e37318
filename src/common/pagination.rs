// src/common/pagination.rs

use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

/// `?limit=&offset=` of the scoped list endpoints.
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Page size, 1 to 200 (default 50)
    #[validate(range(min = 1, max = 200))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn limit_offset(&self) -> (i64, i64) {
        (
            self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            self.offset.unwrap_or(0).max(0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_bounds() {
        assert_eq!(Pagination::default().limit_offset(), (50, 0));
        let page = Pagination { limit: Some(1000), offset: Some(-3) };
        assert_eq!(page.limit_offset(), (200, 0));
        assert!(page.validate().is_err());
    }
}
