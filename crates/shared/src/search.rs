use serde::{Deserialize, Serialize};

use crate::models::Restaurant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBy {
    Name,
    Tags,
    #[default]
    #[serde(other)]
    All,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourSearchQuery {
    #[serde(default)]
    pub query_text: String,
    #[serde(default)]
    pub search_by: SearchBy,
}

/// A catalog entry plus the field the query matched ("name", "tags", or
/// empty for a blank query).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub match_field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourSearchResponse {
    pub query: String,
    pub search_by: SearchBy,
    pub count: usize,
    pub results: Vec<SearchHit>,
}

/// Case-insensitive substring search over names and tags, in catalog order.
pub fn search_catalog(catalog: &[Restaurant], query: &TourSearchQuery) -> Vec<SearchHit> {
    let needle = query.query_text.to_lowercase();
    catalog
        .iter()
        .filter_map(|r| {
            let field = match_field(r, &needle, query.search_by)?;
            Some(SearchHit {
                restaurant: r.clone(),
                match_field: field.to_string(),
            })
        })
        .collect()
}

fn match_field(r: &Restaurant, needle: &str, by: SearchBy) -> Option<&'static str> {
    if needle.is_empty() {
        return Some("");
    }
    let in_name = || r.name.to_lowercase().contains(needle);
    let in_tags = || r.tags.iter().any(|t| t.to_lowercase().contains(needle));

    match by {
        SearchBy::Name => in_name().then_some("name"),
        SearchBy::Tags => in_tags().then_some("tags"),
        SearchBy::All if in_name() => Some("name"),
        SearchBy::All => in_tags().then_some("tags"),
    }
}
