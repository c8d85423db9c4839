use serde::{Deserialize, Serialize};

use super::slugify;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportantLink {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ImportantLink {
    pub fn id(&self) -> String {
        format!("link:{}", slugify(&self.title))
    }
}

/// One entry of `links.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkEntry {
    #[serde(alias = "name", alias = "label")]
    pub title: Option<String>,
    #[serde(alias = "href")]
    pub url: Option<String>,
    pub description: Option<String>,
}
