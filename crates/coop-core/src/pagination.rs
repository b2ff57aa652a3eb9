//! # Pagination
//!
//! Offset pagination over projected records.
//!
//! The query string carries `pageIndex` (zero-based), `pageSize`, `sort` and
//! `search`. Sorting and searching operate on the JSON projection of each
//! record, so the same code serves every entity type:
//!
//! - `sort=name:asc,created_at:desc` orders by `name`, then newest first.
//!   Numbers compare numerically. A column whose strings all parse as RFC 3339
//!   compares them as instants, any other column compares strings lexically.
//!   Nulls and missing fields sort first.
//! - `search=main` keeps records with any top-level string field containing
//!   `main`, case-insensitively.
//!
//! Without a `sort` parameter records come newest first.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    pub order: SortOrder,
}

/// Raw pagination parameters as they appear in the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    #[serde(rename = "pageIndex")]
    pub page_index: Option<usize>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<usize>,
    pub sort: Option<String>,
    pub search: Option<String>,
}

/// Validated pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page_index: usize,
    pub page_size: usize,
    pub sort: Vec<SortField>,
    pub search: Option<String>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
            sort: default_sort(),
            search: None,
        }
    }
}

fn default_sort() -> Vec<SortField> {
    vec![SortField {
        field: "created_at".to_string(),
        order: SortOrder::Desc,
    }]
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("pageSize must be between 1 and {max}, got {size}")]
    InvalidPageSize { size: usize, max: usize },

    #[error("invalid sort expression: {0}")]
    InvalidSort(String),

    #[error("record projection failed: {0}")]
    Projection(String),
}

impl PageQuery {
    pub fn into_request(self) -> Result<PageRequest, PaginationError> {
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(PaginationError::InvalidPageSize {
                size: page_size,
                max: MAX_PAGE_SIZE,
            });
        }

        let sort = match self.sort.as_deref().map(str::trim) {
            None | Some("") => default_sort(),
            Some(expr) => parse_sort(expr)?,
        };

        let search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(PageRequest {
            page_index: self.page_index.unwrap_or(0),
            page_size,
            sort,
            search,
        })
    }
}

/// Parse `field:asc,other:desc`. A field without an order sorts ascending.
pub fn parse_sort(expr: &str) -> Result<Vec<SortField>, PaginationError> {
    let mut fields = Vec::new();
    for part in expr.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (field, order) = match part.split_once(':') {
            Some((f, o)) => (f.trim(), o.trim()),
            None => (part, "asc"),
        };
        let valid_name = !field.is_empty()
            && field
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_name {
            return Err(PaginationError::InvalidSort(part.to_string()));
        }
        let order = match order.to_ascii_lowercase().as_str() {
            "asc" => SortOrder::Asc,
            "desc" => SortOrder::Desc,
            _ => return Err(PaginationError::InvalidSort(part.to_string())),
        };
        fields.push(SortField {
            field: field.to_string(),
            order,
        });
    }
    if fields.is_empty() {
        return Err(PaginationError::InvalidSort(expr.to_string()));
    }
    Ok(fields)
}

/// One page of projected records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page_index: usize,
    pub total_page: usize,
    pub page_size: usize,
    pub total_size: usize,
    pub sort: Vec<SortField>,
}

/// Filter, sort and slice `items` according to `request`.
pub fn paginate<T: Serialize>(items: Vec<T>, request: &PageRequest) -> Result<Page<T>, PaginationError> {
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let value =
            serde_json::to_value(&item).map_err(|e| PaginationError::Projection(e.to_string()))?;
        rows.push((value, item));
    }

    if let Some(needle) = request.search.as_deref() {
        let needle = needle.to_lowercase();
        rows.retain(|(value, _)| matches_search(value, &needle));
    }

    let values: Vec<&Value> = rows.iter().map(|(value, _)| value).collect();
    let keys = sort_keys(&values, &request.sort);
    let mut keyed: Vec<(Vec<SortKey>, T)> = keys
        .into_iter()
        .zip(rows.into_iter().map(|(_, item)| item))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, &request.sort));

    let total_size = keyed.len();
    let total_page = total_size.div_ceil(request.page_size).max(1);
    let data = keyed
        .into_iter()
        .skip(request.page_index.saturating_mul(request.page_size))
        .take(request.page_size)
        .map(|(_, item)| item)
        .collect();

    Ok(Page {
        data,
        page_index: request.page_index,
        total_page,
        page_size: request.page_size,
        total_size,
        sort: request.sort.clone(),
    })
}

fn matches_search(value: &Value, needle: &str) -> bool {
    match value {
        Value::Object(map) => map.values().any(|v| match v {
            Value::String(s) => s.to_lowercase().contains(needle),
            _ => false,
        }),
        Value::String(s) => s.to_lowercase().contains(needle),
        _ => false,
    }
}

/// Sort key for one field of one row.
///
/// Variants are ordered by rank first, so keys of different kinds never
/// compare by content and the order stays total.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Null,
    Bool(bool),
    Number(f64),
    Instant(DateTime<Utc>),
    Text(String),
}

impl SortKey {
    fn rank(&self) -> u8 {
        match self {
            SortKey::Null => 0,
            SortKey::Bool(_) => 1,
            SortKey::Number(_) => 2,
            SortKey::Instant(_) => 3,
            SortKey::Text(_) => 4,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Bool(x), SortKey::Bool(y)) => x.cmp(y),
            (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(y),
            (SortKey::Instant(x), SortKey::Instant(y)) => x.cmp(y),
            (SortKey::Text(x), SortKey::Text(y)) => x.cmp(y),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Build one key per sort field for every row.
///
/// A column compares its strings as instants only when every string in it
/// parses as RFC 3339; otherwise the whole column compares as text.
fn sort_keys(values: &[&Value], sort: &[SortField]) -> Vec<Vec<SortKey>> {
    let mut keys: Vec<Vec<SortKey>> = vec![Vec::with_capacity(sort.len()); values.len()];
    for field in sort {
        let column: Vec<&Value> = values
            .iter()
            .map(|v| v.get(&field.field).unwrap_or(&Value::Null))
            .collect();
        let instants = column.iter().all(|v| match v {
            Value::String(s) => s.parse::<DateTime<Utc>>().is_ok(),
            _ => true,
        });
        for (row, value) in keys.iter_mut().zip(column) {
            row.push(sort_key(value, instants));
        }
    }
    keys
}

fn sort_key(value: &Value, instants: bool) -> SortKey {
    match value {
        Value::Null => SortKey::Null,
        Value::Bool(b) => SortKey::Bool(*b),
        Value::Number(n) => SortKey::Number(n.as_f64().unwrap_or(0.0)),
        Value::String(s) if instants => s
            .parse::<DateTime<Utc>>()
            .map(SortKey::Instant)
            .unwrap_or_else(|_| SortKey::Text(s.clone())),
        Value::String(s) => SortKey::Text(s.clone()),
        other => SortKey::Text(other.to_string()),
    }
}

fn compare_keys(a: &[SortKey], b: &[SortKey], sort: &[SortField]) -> Ordering {
    for ((left, right), field) in a.iter().zip(b).zip(sort) {
        let ord = left.compare(right);
        let ord = match field.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
