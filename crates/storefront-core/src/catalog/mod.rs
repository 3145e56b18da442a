//! Catalog domain: products, the filter-to-query translation and facet
//! ranking. Everything here is pure; execution lives in `storefront-db`.

mod facets;
mod product;
mod query;

pub use facets::{rank_facets, CategoryFacet};
pub use product::{Product, DEFAULT_CATEGORY_LABEL};
pub use query::{
    build_query, escape_like, FilterRequest, QueryPlan, SearchPredicate, SortDirection, SortKey,
    Surface, ValidationError,
};
