use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pagination::{paginate, PageWindow, MAX_PAGE_SIZE};
use crate::querystring;

/// Which consumer a query is built for. Surfaces differ in default sort,
/// allowed sort keys and searched columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Storefront,
    Admin,
}

impl Surface {
    #[must_use]
    pub fn default_sort(self) -> SortKey {
        match self {
            Self::Storefront => SortKey::Name,
            Self::Admin => SortKey::Code,
        }
    }

    #[must_use]
    pub fn allows(self, key: SortKey) -> bool {
        match self {
            Self::Storefront => matches!(key, SortKey::Name | SortKey::Price | SortKey::CreatedAt),
            Self::Admin => true,
        }
    }

    /// Columns the search text is matched against.
    #[must_use]
    pub fn search_columns(self) -> &'static [&'static str] {
        match self {
            Self::Storefront => &["name"],
            Self::Admin => &["name", "code", "description"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    Price,
    CreatedAt,
    Code,
    Category,
}

impl SortKey {
    /// Parse a client-supplied sort key. Legacy Spanish column names from
    /// older links are accepted.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "name" | "nombre" => Some(Self::Name),
            "price" | "precio" => Some(Self::Price),
            "created_at" | "createdAt" => Some(Self::CreatedAt),
            "code" | "codigo" => Some(Self::Code),
            "category" | "categoria" => Some(Self::Category),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Price => "price",
            Self::CreatedAt => "created_at",
            Self::Code => "code",
            Self::Category => "category",
        }
    }

    /// Column this key orders by. Only ever one of a fixed set of names.
    #[must_use]
    pub fn column(self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    #[must_use]
    pub fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Malformed filter input. Always recovered by coercion; recorded on the
/// plan so callers can log it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is not a number: '{value}'")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} is negative ({value}); clamped to 0")]
    Negative { field: &'static str, value: Decimal },

    #[error("price_min {min} exceeds price_max {max}; bounds swapped")]
    InvertedPriceRange { min: Decimal, max: Decimal },

    #[error("unknown sort key '{0}'; using default")]
    UnknownSortKey(String),

    #[error("unknown sort direction '{0}'; using ascending")]
    UnknownDirection(String),

    #[error("invalid page '{0}'; using 1")]
    InvalidPage(String),

    #[error("invalid page size '{0}'")]
    InvalidPageSize(String),
}

/// One query intent as received from a client. Values are raw and may be
/// malformed; [`build_query`] coerces them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRequest {
    pub search: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl FilterRequest {
    /// Parse a URL query string.
    ///
    /// `categories` is comma-separated with each element percent-encoded;
    /// repeated `category` keys and the legacy single `categoria` key are
    /// merged into the same set. `q` is accepted for `search`, `dir` for
    /// `direction`.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut request = Self::default();
        for (key, raw) in querystring::raw_pairs(query) {
            match key.as_str() {
                "categories" => request.categories.extend(
                    raw.split(',')
                        .map(querystring::decode)
                        .filter(|c| !c.trim().is_empty()),
                ),
                "category" | "categoria" => {
                    let value = querystring::decode(raw);
                    if !value.trim().is_empty() {
                        request.categories.push(value);
                    }
                }
                "search" | "q" => request.search = Some(querystring::decode(raw)),
                "price_min" => request.price_min = Some(querystring::decode(raw)),
                "price_max" => request.price_max = Some(querystring::decode(raw)),
                "sort" => request.sort = Some(querystring::decode(raw)),
                "direction" | "dir" => request.direction = Some(querystring::decode(raw)),
                "page" => request.page = Some(querystring::decode(raw)),
                "page_size" => request.page_size = Some(querystring::decode(raw)),
                _ => {}
            }
        }
        request
    }

    /// Render as a query string, omitting absent fields.
    #[must_use]
    pub fn to_query(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        let mut push = |key: &'static str, value: Option<&String>| {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                pairs.push((key, querystring::encode(v)));
            }
        };
        push("search", self.search.as_ref());
        push("price_min", self.price_min.as_ref());
        push("price_max", self.price_max.as_ref());
        push("sort", self.sort.as_ref());
        push("direction", self.direction.as_ref());
        push("page", self.page.as_ref());
        push("page_size", self.page_size.as_ref());
        if !self.categories.is_empty() {
            let joined = self
                .categories
                .iter()
                .map(String::as_str)
                .map(querystring::encode)
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("categories", joined));
        }
        querystring::join(&pairs)
    }
}

/// Substring match against a fixed set of columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPredicate {
    /// `ILIKE` pattern with metacharacters escaped, e.g. `%usb\_c%`.
    pub pattern: String,
    pub columns: &'static [&'static str],
}

/// Validated, store-agnostic predicate set. Every predicate is ANDed and the
/// executing layer always adds the tenant scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub surface: Surface,
    pub search: Option<SearchPredicate>,
    /// Exact category labels; empty means unconstrained.
    pub categories: Vec<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub sort: SortKey,
    pub direction: SortDirection,
    /// Requested page, at least 1. Clamped against the total at execution.
    pub page: u32,
    pub page_size: u32,
    /// Input problems that were coerced away.
    pub coercions: Vec<ValidationError>,
}

impl QueryPlan {
    /// `ORDER BY` body built only from whitelisted columns, with `code` as a
    /// tiebreaker so equal requests return equal pages.
    #[must_use]
    pub fn order_by(&self) -> String {
        let primary = format!("{} {}", self.sort.column(), self.direction.sql());
        if self.sort == SortKey::Code {
            primary
        } else {
            format!("{primary}, code ASC")
        }
    }

    #[must_use]
    pub fn window(&self, total: u64) -> PageWindow {
        paginate(total, self.page, self.page_size)
    }

    /// Same plan restricted to a single category. Used for facet counts.
    #[must_use]
    pub fn for_category(&self, category: &str) -> Self {
        Self {
            categories: vec![category.to_string()],
            coercions: Vec::new(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn has_filters(&self) -> bool {
        self.search.is_some()
            || !self.categories.is_empty()
            || self.price_min.is_some()
            || self.price_max.is_some()
    }
}

/// Escape `\`, `%` and `_` so `text` matches literally inside a `LIKE`
/// pattern using the default `\` escape character.
#[must_use]
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Translate a raw filter request into a validated plan.
///
/// Never fails: malformed values are dropped or replaced by defaults and
/// recorded in [`QueryPlan::coercions`].
#[must_use]
pub fn build_query(request: &FilterRequest, surface: Surface, default_page_size: u32) -> QueryPlan {
    let mut coercions = Vec::new();

    let search = request
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| SearchPredicate {
            pattern: format!("%{}%", escape_like(s)),
            columns: surface.search_columns(),
        });

    let mut categories: Vec<String> = Vec::new();
    for category in &request.categories {
        let category = category.trim();
        if !category.is_empty() && !categories.iter().any(|c| c == category) {
            categories.push(category.to_string());
        }
    }

    let mut price_min = parse_price("price_min", request.price_min.as_deref(), &mut coercions);
    let mut price_max = parse_price("price_max", request.price_max.as_deref(), &mut coercions);
    if let (Some(min), Some(max)) = (price_min, price_max) {
        if min > max {
            coercions.push(ValidationError::InvertedPriceRange { min, max });
            price_min = Some(max);
            price_max = Some(min);
        }
    }

    let sort = match request.sort.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => surface.default_sort(),
        Some(raw) => match SortKey::parse(raw).filter(|k| surface.allows(*k)) {
            Some(key) => key,
            None => {
                coercions.push(ValidationError::UnknownSortKey(raw.to_string()));
                surface.default_sort()
            }
        },
    };

    let direction = match request
        .direction
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        None => SortDirection::Asc,
        Some(raw) => SortDirection::parse(raw).unwrap_or_else(|| {
            coercions.push(ValidationError::UnknownDirection(raw.to_string()));
            SortDirection::Asc
        }),
    };

    let page = match request.page.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => 1,
        Some(raw) => match raw.parse::<u32>() {
            Ok(n) if n >= 1 => n,
            _ => {
                coercions.push(ValidationError::InvalidPage(raw.to_string()));
                1
            }
        },
    };

    let default_page_size = default_page_size.clamp(1, MAX_PAGE_SIZE);
    let page_size = match request
        .page_size
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        None => default_page_size,
        Some(raw) => match raw.parse::<u32>() {
            Ok(n) if (1..=MAX_PAGE_SIZE).contains(&n) => n,
            Ok(n) if n > MAX_PAGE_SIZE => {
                coercions.push(ValidationError::InvalidPageSize(raw.to_string()));
                MAX_PAGE_SIZE
            }
            _ => {
                coercions.push(ValidationError::InvalidPageSize(raw.to_string()));
                default_page_size
            }
        },
    };

    QueryPlan {
        surface,
        search,
        categories,
        price_min,
        price_max,
        sort,
        direction,
        page,
        page_size,
        coercions,
    }
}

fn parse_price(
    field: &'static str,
    raw: Option<&str>,
    coercions: &mut Vec<ValidationError>,
) -> Option<Decimal> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match Decimal::from_str(raw) {
        Ok(value) if value.is_sign_negative() && !value.is_zero() => {
            coercions.push(ValidationError::Negative { field, value });
            Some(Decimal::ZERO)
        }
        Ok(value) => Some(value),
        Err(_) => {
            coercions.push(ValidationError::NotANumber {
                field,
                value: raw.to_string(),
            });
            None
        }
    }
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
