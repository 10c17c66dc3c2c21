use serde::{Deserialize, Serialize};

/// Reddit kind tag for submissions ("links").
pub const KIND_SUBMISSION: &str = "t3";
/// Reddit kind tag for comments.
pub const KIND_COMMENT: &str = "t1";

/// Token endpoint reply. Reddit may answer 200 with only `{"error": ...}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// `{"kind": "Listing", "data": {...}}` wrapper used by search and comments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub data: ListingData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Vec<Thing>,
}

/// A listing child. `kind` is `t3` for submissions, `t1` for comments and
/// `more` for collapsed comment stubs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thing {
    pub kind: String,
    #[serde(default)]
    pub data: ThingData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThingData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub selftext: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// A search hit reduced to the fields the review extractor reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: String,
    pub title: String,
    pub selftext: String,
}

impl Submission {
    /// Keep `t3` children that carry an id; absent text fields become empty.
    pub fn from_thing(thing: &Thing) -> Option<Self> {
        if thing.kind != KIND_SUBMISSION {
            return None;
        }
        let id = thing.data.id.clone().filter(|id| !id.is_empty())?;
        Some(Self {
            id,
            title: thing.data.title.clone().unwrap_or_default(),
            selftext: thing.data.selftext.clone().unwrap_or_default(),
        })
    }
}

impl Listing {
    pub fn submissions(&self) -> Vec<Submission> {
        self.data
            .children
            .iter()
            .filter_map(Submission::from_thing)
            .collect()
    }

    /// Bodies of the `t1` children in listing order; `more` stubs are skipped.
    pub fn comment_bodies(&self) -> Vec<&str> {
        self.data
            .children
            .iter()
            .filter(|c| c.kind == KIND_COMMENT)
            .map(|c| c.data.body.as_deref().unwrap_or(""))
            .collect()
    }
}
