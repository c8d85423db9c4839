use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{EventGallery, ImportantLink, Officer, SiteContent};

/// Everything the site renders, captured at one point in time.
///
/// Snapshots are never patched; a refresh builds a new one and replaces the
/// old one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSnapshot {
    pub officers: Vec<Officer>,
    pub links: Vec<ImportantLink>,
    pub galleries: Vec<EventGallery>,
    pub site: SiteContent,
}

impl ContentSnapshot {
    pub fn find_officer(&self, name: &str) -> Option<&Officer> {
        self.officers.iter().find(|o| o.matches_name(name))
    }

    pub fn find_gallery(&self, id: &str) -> Option<&EventGallery> {
        self.galleries.iter().find(|g| g.id == id)
    }

    /// Ids of records that are new or different in `newer`.
    ///
    /// Removed records are not listed; there is nothing left to highlight.
    pub fn changed_ids(&self, newer: &ContentSnapshot) -> Vec<String> {
        let mut changed = Vec::new();
        changed.extend(diff_by_key(&self.officers, &newer.officers, Officer::id));
        changed.extend(diff_by_key(&self.links, &newer.links, ImportantLink::id));
        changed.extend(diff_by_key(&self.galleries, &newer.galleries, EventGallery::record_id));
        if self.site != newer.site {
            changed.push("site".to_string());
        }
        changed
    }
}

fn diff_by_key<T: PartialEq>(old: &[T], new: &[T], key: impl Fn(&T) -> String) -> Vec<String> {
    let previous: HashMap<String, &T> = old.iter().map(|item| (key(item), item)).collect();
    new.iter()
        .filter(|item| previous.get(&key(*item)).map_or(true, |prev| *prev != *item))
        .map(&key)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::ImageRef;

    fn officer(name: &str, role: &str) -> Officer {
        Officer {
            name: name.into(),
            role: role.into(),
            year: "Senior".into(),
            image: ImageRef::default(),
            major: String::new(),
            country: String::new(),
            flag: String::new(),
            quote: String::new(),
        }
    }

    #[test]
    fn test_changed_ids_added_and_modified() {
        let old = ContentSnapshot {
            officers: vec![officer("Ada", "President"), officer("Ben", "Treasurer")],
            ..Default::default()
        };
        let new = ContentSnapshot {
            officers: vec![
                officer("Ada", "President"),
                officer("Ben", "Secretary"),
                officer("Cy", "Historian"),
            ],
            ..Default::default()
        };
        assert_eq!(old.changed_ids(&new), vec!["officer:ben", "officer:cy"]);
    }

    #[test]
    fn test_changed_ids_identical_is_empty() {
        let snap = ContentSnapshot {
            officers: vec![officer("Ada", "President")],
            ..Default::default()
        };
        assert!(snap.changed_ids(&snap.clone()).is_empty());
    }

    #[test]
    fn test_changed_ids_site_text() {
        let old = ContentSnapshot::default();
        let mut new = ContentSnapshot::default();
        new.site.tagline = "New tagline".into();
        assert_eq!(old.changed_ids(&new), vec!["site"]);
    }

    #[test]
    fn test_find_officer_is_case_insensitive() {
        let snap = ContentSnapshot {
            officers: vec![officer("Ada Lovelace", "President")],
            ..Default::default()
        };
        assert!(snap.find_officer("ada lovelace").is_some());
        assert!(snap.find_officer("Grace").is_none());
    }
}
