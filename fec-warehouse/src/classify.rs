//! Keyword-based industry tagging
//!
//! Keywords match at the start of a word, case-insensitively, so "Oil" and
//! "Oilfield" match `oil` while "Toilet" does not. The first tag in table
//! order with a matching keyword wins.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndustryTag {
    Pharma,
    Fossil,
    Defense,
    Finance,
    Tech,
    Aipac,
}

impl IndustryTag {
    pub fn key(self) -> &'static str {
        match self {
            IndustryTag::Pharma => "pharma",
            IndustryTag::Fossil => "fossil",
            IndustryTag::Defense => "defense",
            IndustryTag::Finance => "finance",
            IndustryTag::Tech => "tech",
            IndustryTag::Aipac => "aipac",
        }
    }
}

impl fmt::Display for IndustryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

const KEYWORDS: &[(IndustryTag, &[&str])] = &[
    (IndustryTag::Pharma, &["pharma", "biotech"]),
    (IndustryTag::Fossil, &["oil", "gas", "petroleum", "energy", "coal"]),
    (IndustryTag::Defense, &["defense", "aerospace"]),
    (IndustryTag::Finance, &["bank", "finance", "financial", "hedge"]),
    (IndustryTag::Tech, &["tech", "software", "internet"]),
    (IndustryTag::Aipac, &["aipac", "israel"]),
];

fn starts_word(haystack: &str, keyword: &str) -> bool {
    haystack.match_indices(keyword).any(|(i, _)| {
        haystack[..i]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}

/// Industry for a piece of free text, if any keyword matches
pub fn classify(text: &str) -> Option<IndustryTag> {
    let lowered = text.to_lowercase();
    if lowered.trim().is_empty() {
        return None;
    }
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| starts_word(&lowered, w)))
        .map(|(tag, _)| *tag)
}

/// First field that classifies, tried in the order given
pub fn classify_first<'a>(fields: impl IntoIterator<Item = Option<&'a str>>) -> Option<IndustryTag> {
    fields.into_iter().flatten().find_map(classify)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_table() {
        let cases = [
            ("Pfizer Pharmaceuticals", Some(IndustryTag::Pharma)),
            ("Amgen Biotech", Some(IndustryTag::Pharma)),
            ("EXXON OIL CORP", Some(IndustryTag::Fossil)),
            ("Natural Gas Partners", Some(IndustryTag::Fossil)),
            ("Lockheed Martin Aerospace", Some(IndustryTag::Defense)),
            ("Department of Defense", Some(IndustryTag::Defense)),
            ("First National Bank", Some(IndustryTag::Finance)),
            ("Bridgewater Hedge Fund", Some(IndustryTag::Finance)),
            ("Acme Software LLC", Some(IndustryTag::Tech)),
            ("Big Tech Inc", Some(IndustryTag::Tech)),
            ("AIPAC", Some(IndustryTag::Aipac)),
            ("Friends of Israel PAC", Some(IndustryTag::Aipac)),
            ("Retired", None),
            ("", None),
        ];
        for (text, expected) in cases {
            assert_eq!(classify(text), expected, "{}", text);
        }
    }

    #[test]
    fn test_keywords_match_at_word_start_only() {
        assert_eq!(classify("Las Vegas Sands"), None);
        assert_eq!(classify("Toilet Supply Co"), None);
        assert_eq!(classify("Oilfield Services"), Some(IndustryTag::Fossil));
    }

    #[test]
    fn test_table_order_breaks_ties() {
        // Both pharma and tech keywords present
        assert_eq!(classify("Biotech Software"), Some(IndustryTag::Pharma));
        assert_eq!(classify("Energy Bank"), Some(IndustryTag::Fossil));
    }

    #[test]
    fn test_classify_first_uses_field_order() {
        assert_eq!(
            classify_first([None, Some("Nurse"), Some("Acme Software")]),
            Some(IndustryTag::Tech)
        );
        assert_eq!(
            classify_first([Some("earmarked via AIPAC"), Some("Exxon Oil")]),
            Some(IndustryTag::Aipac)
        );
        assert_eq!(classify_first([None, None]), None);
    }

    #[test]
    fn test_tag_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&IndustryTag::Fossil).unwrap(), "\"fossil\"");
    }
}
