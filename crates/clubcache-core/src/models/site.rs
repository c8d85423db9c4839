use serde::{Deserialize, Serialize};

/// Free text shown on the home and history pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteContent {
    pub title: String,
    pub tagline: String,
    pub about: String,
    pub history: Vec<String>,
    pub contact_email: Option<String>,
}

impl Default for SiteContent {
    fn default() -> Self {
        Self {
            title: "International Students Association".to_string(),
            tagline: "A home away from home on campus".to_string(),
            about: "We bring together students from every corner of the world through \
                    cultural nights, mentoring and community service."
                .to_string(),
            history: vec![
                "Founded by a handful of first-year students who wanted a place to share \
                 food, music and stories from home."
                    .to_string(),
                "Today the association runs events every semester and welcomes members \
                 of every background."
                    .to_string(),
            ],
            contact_email: None,
        }
    }
}
