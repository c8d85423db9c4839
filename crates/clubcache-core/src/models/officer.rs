use serde::{Deserialize, Serialize};

use super::slugify;
use crate::images::ImageRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Officer {
    pub name: String,
    pub role: String,
    pub year: String,
    pub image: ImageRef,
    pub major: String,
    pub country: String,
    pub flag: String,
    pub quote: String,
}

impl Officer {
    /// Stable identifier derived from the name, which is the natural key.
    pub fn id(&self) -> String {
        format!("officer:{}", slugify(&self.name))
    }

    /// Case-insensitive match against a name taken from a URL parameter.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

/// One entry of `officers.json` as authored by the club.
///
/// Everything is optional here; `name` and `role` are checked when the entry
/// is converted so a single bad entry can be skipped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficerEntry {
    pub name: Option<String>,
    #[serde(alias = "position")]
    pub role: Option<String>,
    #[serde(alias = "class")]
    pub year: Option<String>,
    #[serde(alias = "photo")]
    pub image: Option<String>,
    pub major: Option<String>,
    #[serde(alias = "homeCountry")]
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub flag: Option<String>,
    pub quote: Option<String>,
}

impl OfficerEntry {
    /// Flag glyph: explicit value first, then one derived from the ISO code.
    pub fn flag_glyph(&self) -> String {
        if let Some(flag) = self.flag.as_deref().filter(|f| !f.trim().is_empty()) {
            return flag.trim().to_string();
        }
        self.country_code
            .as_deref()
            .and_then(flag_from_country_code)
            .unwrap_or_default()
    }
}

/// Turn an ISO 3166 alpha-2 code ("us", "NG") into its regional-indicator flag.
pub fn flag_from_country_code(code: &str) -> Option<String> {
    let code = code.trim();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    code.to_ascii_uppercase()
        .chars()
        .map(|c| char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_from_country_code() {
        assert_eq!(flag_from_country_code("us").as_deref(), Some("\u{1F1FA}\u{1F1F8}"));
        assert_eq!(flag_from_country_code("NG").as_deref(), Some("\u{1F1F3}\u{1F1EC}"));
        assert_eq!(flag_from_country_code("USA"), None);
        assert_eq!(flag_from_country_code("1a"), None);
    }

    #[test]
    fn test_flag_glyph_prefers_explicit_flag() {
        let entry = OfficerEntry {
            flag: Some("🇰🇪".into()),
            country_code: Some("us".into()),
            ..Default::default()
        };
        assert_eq!(entry.flag_glyph(), "🇰🇪");

        let entry = OfficerEntry {
            country_code: Some("ke".into()),
            ..Default::default()
        };
        assert_eq!(entry.flag_glyph(), "🇰🇪");
    }

    #[test]
    fn test_entry_accepts_aliases() {
        let json = r#"{"name": "Ada", "position": "President", "photo": "ada.jpg", "homeCountry": "Ghana"}"#;
        let entry: OfficerEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.role.as_deref(), Some("President"));
        assert_eq!(entry.image.as_deref(), Some("ada.jpg"));
        assert_eq!(entry.country.as_deref(), Some("Ghana"));
    }

    #[test]
    fn test_officer_id_and_name_match() {
        let officer = Officer {
            name: "Jane  Doe".into(),
            role: "Treasurer".into(),
            year: String::new(),
            image: ImageRef::default(),
            major: String::new(),
            country: String::new(),
            flag: String::new(),
            quote: String::new(),
        };
        assert_eq!(officer.id(), "officer:jane-doe");
        assert!(officer.matches_name(" jane  doe "));
    }
}
