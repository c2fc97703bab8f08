// paysync-server/src/models/page.rs

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A 1-based page request with its size already clamped to `1..=MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub page: u32,
  pub limit: u32,
}

impl Default for PageRequest {
  fn default() -> Self {
    Self {
      page: 1,
      limit: DEFAULT_PAGE_SIZE,
    }
  }
}

impl PageRequest {
  pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
    Self {
      page: page.unwrap_or(1).max(1),
      limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
    }
  }

  pub fn offset(&self) -> u64 {
    u64::from(self.page - 1) * u64::from(self.limit)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub page: u32,
  pub limit: u32,
  pub total: i64,
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
    Self {
      items,
      page: request.page,
      limit: request.limit,
      total,
    }
  }

  /// Cuts one page out of an already filtered and sorted list.
  pub fn slice(all: Vec<T>, request: PageRequest) -> Self {
    let total = all.len() as i64;
    let items = all
      .into_iter()
      .skip(request.offset() as usize)
      .take(request.limit as usize)
      .collect();
    Self::new(items, request, total)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_and_clamping() {
    assert_eq!(PageRequest::new(None, None), PageRequest { page: 1, limit: 20 });
    assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest { page: 1, limit: 1 });
    assert_eq!(PageRequest::new(Some(3), Some(500)).limit, MAX_PAGE_SIZE);
    assert_eq!(PageRequest::new(Some(3), Some(10)).offset(), 20);
  }

  #[test]
  fn slice_reports_total_and_window() {
    let page = Page::slice((1..=25).collect::<Vec<_>>(), PageRequest::new(Some(2), Some(10)));
    assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
    assert_eq!(page.total, 25);
  }
}
