//! The two category strategies.
//!
//! [`load_time_category`] is computed once at ingestion and stored in the
//! `category` column. [`keyword_category`] is a display-time view over the
//! description text and is never persisted. They disagree on purpose and are
//! not interchangeable.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::constants::{OTHER_CATEGORY, UNCLASSIFIED_CATEGORY, UNKNOWN};

/// Stored category: first tag, else the price type, else `"Other"`.
pub fn load_time_category(tags: &[String], price_type: Option<&str>) -> String {
    match tags.first() {
        Some(first) if first != UNKNOWN => first.clone(),
        _ => price_type.unwrap_or(OTHER_CATEGORY).to_string(),
    }
}

/// One keyword bucket. Keywords are lowercase substrings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordBucket {
    pub name: String,
    pub keywords: Vec<String>,
}

impl KeywordBucket {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

/// Outcome of a keyword scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub category: String,
    /// Keywords of the winning bucket found in the text, in table order
    pub keywords: Vec<String>,
}

impl KeywordMatch {
    pub fn unclassified() -> Self {
        Self {
            category: UNCLASSIFIED_CATEGORY.to_string(),
            keywords: Vec::new(),
        }
    }

    pub fn is_unclassified(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// Keyword-count classifier over free text. Bucket order matters: on equal
/// counts the earlier bucket wins.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordClassifier {
    buckets: Vec<KeywordBucket>,
}

impl KeywordClassifier {
    pub fn new(buckets: Vec<KeywordBucket>) -> Self {
        let buckets = buckets
            .into_iter()
            .map(|b| KeywordBucket {
                keywords: b.keywords.iter().map(|k| k.to_lowercase()).collect(),
                name: b.name,
            })
            .collect();
        Self { buckets }
    }

    pub fn buckets(&self) -> &[KeywordBucket] {
        &self.buckets
    }

    pub fn classify(&self, description: Option<&str>) -> KeywordMatch {
        let text = match description {
            Some(text) if !text.trim().is_empty() => text.to_lowercase(),
            _ => return KeywordMatch::unclassified(),
        };

        let mut best = KeywordMatch::unclassified();
        for bucket in &self.buckets {
            let matches: Vec<String> = bucket
                .keywords
                .iter()
                .filter(|kw| text.contains(kw.as_str()))
                .cloned()
                .collect();
            if matches.len() > best.keywords.len() {
                best = KeywordMatch {
                    category: bucket.name.clone(),
                    keywords: matches,
                };
            }
        }
        best
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(default_buckets())
    }
}

/// Default French keyword table: cultural, sports, then family/workshop.
pub fn default_buckets() -> Vec<KeywordBucket> {
    vec![
        KeywordBucket::new(
            "Culturel",
            &[
                "exposition", "concert", "théâtre", "theatre", "musée", "musee", "spectacle",
                "festival", "cinema", "projection", "opéra", "opera", "danse", "vernissage",
                "lecture", "expo", "art",
            ],
        ),
        KeywordBucket::new(
            "Sportif",
            &[
                "match", "tournoi", "course", "marathon", "compétition", "competition", "sport",
                "randonnée", "randonnee", "yoga", "football", "basket", "tennis", "gym",
            ],
        ),
        KeywordBucket::new(
            "Famille",
            &[
                "atelier", "famille", "enfant", "jeunesse", "kids", "conte", "animation",
                "atelier enfant",
            ],
        ),
    ]
}

static DEFAULT_CLASSIFIER: Lazy<KeywordClassifier> = Lazy::new(KeywordClassifier::default);

/// Display-time category inferred from the description with the default table.
pub fn keyword_category(description: Option<&str>) -> KeywordMatch {
    DEFAULT_CLASSIFIER.classify(description)
}
