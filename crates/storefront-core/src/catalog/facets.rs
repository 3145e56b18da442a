use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Per-category count for the filter sidebar.
///
/// `count` is `None` when aggregation failed; the sidebar still lists the
/// category so filtering keeps working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFacet {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl CategoryFacet {
    #[must_use]
    pub fn counted(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count: Some(count),
        }
    }

    #[must_use]
    pub fn uncounted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: None,
        }
    }
}

/// Sort facets by count descending, ties by name ascending. Uncounted facets
/// go last in name order.
#[must_use]
pub fn rank_facets(mut facets: Vec<CategoryFacet>) -> Vec<CategoryFacet> {
    facets.sort_by(|a, b| match (a.count, b.count) {
        (Some(x), Some(y)) => y.cmp(&x).then_with(|| a.name.cmp(&b.name)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    });
    facets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_count_then_name() {
        let ranked = rank_facets(vec![
            CategoryFacet::counted("Video", 3),
            CategoryFacet::counted("Audio", 3),
            CategoryFacet::counted("Cables", 12),
            CategoryFacet::counted("Adapters", 0),
        ]);
        let names: Vec<_> = ranked.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Cables", "Audio", "Video", "Adapters"]);
    }

    #[test]
    fn uncounted_facets_sort_last_by_name() {
        let ranked = rank_facets(vec![
            CategoryFacet::uncounted("Zeta"),
            CategoryFacet::uncounted("Alpha"),
            CategoryFacet::counted("Mid", 1),
        ]);
        let names: Vec<_> = ranked.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Mid", "Alpha", "Zeta"]);
    }

    #[test]
    fn uncounted_facet_omits_count_in_json() {
        let json = serde_json::to_value(CategoryFacet::uncounted("Audio")).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "Audio" }));
    }
}
