use std::fmt::Write as _;

use rust_decimal::Decimal;

use crate::catalog::{CategoryFacet, Product};
use crate::pagination::{page_sequence, PageEntry};

use super::{url, BrowseState, Phase};

const SUMMARY_CHARS: usize = 120;
const PLACEHOLDER_IMAGE: &str = "/images/placeholder.png";

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub code: String,
    pub name: String,
    pub price_label: String,
    pub image_url: String,
    pub summary: String,
    pub category_label: String,
    pub detail_path: String,
}

impl Card {
    fn from_product(product: &Product) -> Self {
        Self {
            code: product.code.clone(),
            name: product.name.clone(),
            price_label: product.price_label(),
            image_url: product
                .image_url
                .clone()
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            summary: product.summary(SUMMARY_CHARS),
            category_label: product.category_label().to_string(),
            detail_path: format!("/products/{}", crate::querystring::encode(&product.code)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Grid {
    /// First load, nothing to show yet.
    Loading,
    Empty,
    Cards(Vec<Card>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationView {
    pub current: u32,
    pub prev: Option<u32>,
    pub next: Option<u32>,
    pub entries: Vec<PageEntry>,
}

/// A removable chip describing one active filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterTag {
    Search(String),
    Category(String),
    Price {
        min: Option<Decimal>,
        max: Option<Decimal>,
    },
}

impl FilterTag {
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Search(text) => format!("Search: \"{text}\""),
            Self::Category(name) => name.clone(),
            Self::Price { min, max } => match (min, max) {
                (Some(min), Some(max)) => format!("${min} - ${max}"),
                (Some(min), None) => format!("From ${min}"),
                (None, Some(max)) => format!("Up to ${max}"),
                (None, None) => "Any price".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetView {
    pub name: String,
    pub count: Option<u64>,
    pub checked: bool,
}

/// Everything a storefront page shows, in render order: grid, pagination,
/// filter tags, result count, URL.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub phase: Phase,
    pub grid: Grid,
    /// Absent when everything fits on one page.
    pub pagination: Option<PaginationView>,
    pub tags: Vec<FilterTag>,
    pub result_count: String,
    pub url_query: String,
    pub facets: Vec<FacetView>,
    /// Message shown next to the retry control after a failed fetch.
    pub retry: Option<String>,
}

/// Pure projection of `state` into a [`View`].
#[must_use]
pub fn render(state: &BrowseState) -> View {
    let filters = state.filters();

    let (grid, pagination, result_count) = match state.last_page() {
        None => (Grid::Loading, None, String::new()),
        Some(page) => {
            let grid = if page.items.is_empty() {
                Grid::Empty
            } else {
                Grid::Cards(page.items.iter().map(Card::from_product).collect())
            };
            let pagination = (page.total_pages > 1).then(|| PaginationView {
                current: page.page,
                prev: (page.page > 1).then(|| page.page - 1),
                next: (page.page < page.total_pages).then(|| page.page + 1),
                entries: page_sequence(page.page, page.total_pages),
            });
            let count = if page.total == 0 {
                "No products found".to_string()
            } else {
                format!(
                    "Showing {}-{} of {} products",
                    page.first_position(),
                    page.last_position(),
                    page.total
                )
            };
            (grid, pagination, count)
        }
    };

    let mut tags = Vec::new();
    let search = filters.search.trim();
    if !search.is_empty() {
        tags.push(FilterTag::Search(search.to_string()));
    }
    tags.extend(filters.categories.iter().cloned().map(FilterTag::Category));
    if filters.price_min.is_some() || filters.price_max.is_some() {
        tags.push(FilterTag::Price {
            min: filters.price_min,
            max: filters.price_max,
        });
    }

    View {
        phase: state.phase(),
        grid,
        pagination,
        tags,
        result_count,
        url_query: url::to_query_string(filters),
        facets: facet_views(state.facets(), filters),
        retry: state.error().map(ToString::to_string),
    }
}

fn facet_views(facets: &[CategoryFacet], filters: &super::FilterState) -> Vec<FacetView> {
    facets
        .iter()
        .map(|f| FacetView {
            name: f.name.clone(),
            count: f.count,
            checked: filters.categories.contains(&f.name),
        })
        .collect()
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.grid {
            Grid::Loading => writeln!(f, "(loading)")?,
            Grid::Empty => writeln!(f, "(no products)")?,
            Grid::Cards(cards) => {
                for card in cards {
                    writeln!(
                        f,
                        "{:<16} {:<40} {:>14}  [{}]",
                        card.code, card.name, card.price_label, card.category_label
                    )?;
                }
            }
        }

        if let Some(pagination) = &self.pagination {
            let mut line = String::new();
            for entry in &pagination.entries {
                match entry {
                    PageEntry::Page(n) if *n == pagination.current => {
                        let _ = write!(line, "[{n}] ");
                    }
                    PageEntry::Page(n) => {
                        let _ = write!(line, "{n} ");
                    }
                    PageEntry::Gap => line.push_str("… "),
                }
            }
            writeln!(f, "pages: {}", line.trim_end())?;
        }

        if !self.tags.is_empty() {
            let labels: Vec<_> = self.tags.iter().map(FilterTag::label).collect();
            writeln!(f, "filters: {}", labels.join(" | "))?;
        }
        if !self.result_count.is_empty() {
            writeln!(f, "{}", self.result_count)?;
        }
        if !self.url_query.is_empty() {
            writeln!(f, "url: ?{}", self.url_query)?;
        }
        if let Some(message) = &self.retry {
            writeln!(f, "error: {message} (retry available)")?;
        }
        Ok(())
    }
}
