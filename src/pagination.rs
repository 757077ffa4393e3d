//! Offset pagination for list endpoints

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::store::Page;

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

/// `?page=&limit=` as sent by clients. Pages are 1-based.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl PageRequest {
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Resolve defaults and bounds into `(page, limit)`
    pub fn resolve(&self) -> AppResult<(usize, usize)> {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 {
            return Err(AppError::validation("limit must be at least 1"));
        }
        let page = self.page.unwrap_or(1).max(1);
        let limit = limit.min(MAX_LIMIT);

        // The offset must fit the stores' signed 64-bit OFFSET
        let in_range = (page - 1)
            .checked_mul(limit)
            .is_some_and(|skip| i64::try_from(skip).is_ok());
        if !in_range {
            return Err(AppError::validation("page is out of range"));
        }
        Ok((page, limit))
    }

    pub fn window(&self) -> AppResult<(usize, Page)> {
        let (page, limit) = self.resolve()?;
        Ok((page, Page::new(page, limit)))
    }
}

/// Pagination block returned next to a list
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub total: u64,
    pub page: usize,
    pub pages: u64,
}

impl Pagination {
    pub fn new(total: u64, page: usize, limit: usize) -> Self {
        Self {
            total,
            page,
            pages: total.div_ceil(limit as u64),
        }
    }
}
