use serde::{Deserialize, Serialize};

/// Subset of the Bing `SearchResponse` envelope the fetcher reads.
///
/// Every field is optional so answers without a `webPages` section (news-only,
/// spelling suggestions, empty result sets) still decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "_type", default)]
    pub kind: Option<String>,
    #[serde(rename = "webPages", default)]
    pub web_pages: Option<WebAnswer>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebAnswer {
    #[serde(rename = "totalEstimatedMatches", default)]
    pub total_estimated_matches: Option<u64>,
    #[serde(default)]
    pub value: Vec<WebPage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebPage {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

impl WebPage {
    /// `"<name>: <snippet>"`, or `None` when either part is missing.
    pub fn fragment(&self) -> Option<String> {
        match (&self.name, &self.snippet) {
            (Some(name), Some(snippet)) => Some(format!("{name}: {snippet}")),
            _ => None,
        }
    }
}

impl SearchResponse {
    /// Fragments for the first `limit` results, skipping incomplete ones.
    pub fn fragments(&self, limit: usize) -> Vec<String> {
        self.web_pages
            .as_ref()
            .map(|wp| {
                wp.value
                    .iter()
                    .take(limit)
                    .filter_map(WebPage::fragment)
                    .collect()
            })
            .unwrap_or_default()
    }
}
