/// Page requests and page envelopes for list endpoints
///
/// Sorting is restricted to a per-entity whitelist of columns; anything else
/// falls back to the entity's default column. The whitelist is the only
/// source of identifiers that reach the SQL text.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "ASC")]
    Asc,
    #[serde(alias = "DESC")]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("Unknown sort direction: {}", other)),
        }
    }
}

/// Query parameters of a paginated list (`page`, `size`, `sortBy`, `sortDir`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageRequest {
    /// Zero-based page index
    pub page: u32,
    pub size: u32,
    pub sort_by: String,
    pub sort_dir: SortDirection,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort_by: "name".to_string(),
            sort_dir: SortDirection::Asc,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            ..Default::default()
        }
    }

    pub fn sorted(mut self, sort_by: &str, sort_dir: SortDirection) -> Self {
        self.sort_by = sort_by.to_string();
        self.sort_dir = sort_dir;
        self
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`; zero means the default
    pub fn effective_size(&self) -> u32 {
        match self.size {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.effective_size())
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page) * self.limit()
    }

    /// Builds an `ORDER BY` clause from the whitelist
    ///
    /// `sortBy` is accepted in camelCase or snake_case. Unknown columns fall
    /// back to `allowed[0]`. `id` is appended as a tiebreaker so pages are
    /// stable.
    pub fn order_by(&self, allowed: &[&'static str]) -> String {
        let requested = to_snake_case(self.sort_by.trim());
        let column = allowed
            .iter()
            .copied()
            .find(|c| *c == requested)
            .or_else(|| allowed.first().copied())
            .unwrap_or("id");

        if column == "id" {
            format!("ORDER BY id {}", self.sort_dir.as_sql())
        } else {
            format!("ORDER BY {} {}, id ASC", column, self.sort_dir.as_sql())
        }
    }
}

fn to_snake_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    for (i, ch) in input.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: i64) -> Self {
        let size = request.effective_size();
        let total_pages = if total_elements <= 0 {
            0
        } else {
            (total_elements + i64::from(size) - 1) / i64::from(size)
        };

        Self {
            content,
            page: request.page,
            size,
            total_elements,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[&str] = &["name", "created_at", "id"];

    #[test]
    fn test_defaults() {
        let req = PageRequest::default();
        assert_eq!(req.page, 0);
        assert_eq!(req.limit(), 10);
        assert_eq!(req.offset(), 0);
        assert_eq!(req.order_by(COLUMNS), "ORDER BY name ASC, id ASC");
    }

    #[test]
    fn test_size_clamped() {
        assert_eq!(PageRequest::new(0, 0).limit(), 10);
        assert_eq!(PageRequest::new(0, 500).limit(), 100);
        assert_eq!(PageRequest::new(3, 20).offset(), 60);
    }

    #[test]
    fn test_order_by_accepts_camel_case() {
        let req = PageRequest::default().sorted("createdAt", SortDirection::Desc);
        assert_eq!(req.order_by(COLUMNS), "ORDER BY created_at DESC, id ASC");
    }

    #[test]
    fn test_order_by_rejects_unknown_column() {
        let req = PageRequest::default().sorted("password_hash; DROP TABLE users", SortDirection::Asc);
        assert_eq!(req.order_by(COLUMNS), "ORDER BY name ASC, id ASC");
    }

    #[test]
    fn test_order_by_id_has_no_tiebreaker() {
        let req = PageRequest::default().sorted("id", SortDirection::Desc);
        assert_eq!(req.order_by(COLUMNS), "ORDER BY id DESC");
    }

    #[test]
    fn test_query_deserialization() {
        let req: PageRequest =
            serde_json::from_str(r#"{"page":2,"size":5,"sortBy":"name","sortDir":"DESC"}"#).unwrap();
        assert_eq!(req.page, 2);
        assert_eq!(req.size, 5);
        assert_eq!(req.sort_dir, SortDirection::Desc);

        let empty: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, PageRequest::default());
    }

    #[test]
    fn test_page_totals() {
        let req = PageRequest::new(0, 10);
        let page = Page::new(vec![1, 2, 3], &req, 21);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.map(|n| n * 2).content, vec![2, 4, 6]);

        let empty: Page<i32> = Page::new(vec![], &req, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
