//! Weighted multi-field fuzzy search over `SearchRecord`s.
//!
//! Per field we take the skim score and normalize it against the keyword's
//! self-match, which gives a distance in `0.0 (perfect) ..= 1.0 (no match)`.
//! Fields combine multiplicatively, each raised to its normalized weight times
//! a field-length norm, so a hit in a heavy, short field pulls the record
//! closer than the same hit in a long menu blob.

use canteen_core::SearchRecord;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Default per-field distance cut. A field scoring worse than this is ignored.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Location,
    Tags,
    Menu,
}

impl Field {
    /// Non-empty values of this field on `r`. Tags yield one value per tag.
    pub fn values<'a>(&self, r: &'a SearchRecord) -> SmallVec<[&'a str; 4]> {
        match self {
            Field::Name => std::iter::once(r.name.as_str()).filter(|s| !s.is_empty()).collect(),
            Field::Location => r.location().into_iter().collect(),
            Field::Tags => r.tags.iter().map(String::as_str).filter(|s| !s.is_empty()).collect(),
            Field::Menu => r.menu().into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldWeight {
    pub field: Field,
    pub weight: f64,
}

pub fn default_field_weights() -> Vec<FieldWeight> {
    vec![
        FieldWeight { field: Field::Name, weight: 2.0 },
        FieldWeight { field: Field::Location, weight: 1.5 },
        FieldWeight { field: Field::Tags, weight: 1.0 },
        FieldWeight { field: Field::Menu, weight: 1.2 },
    ]
}

/// One fuzzy hit: caller-supplied record index and combined distance (0 best, 1 worst).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyHit {
    pub index: usize,
    pub distance: f64,
}

struct Scorer {
    matcher: SkimMatcherV2,
    pattern: String,
    best: f64,
}

impl Scorer {
    fn new(keyword: &str) -> Option<Self> {
        let pattern = keyword.trim().to_lowercase();
        if pattern.is_empty() { return None; }
        let matcher = SkimMatcherV2::default().ignore_case();
        let best = matcher.fuzzy_match(&pattern, &pattern).unwrap_or(0) as f64;
        if best <= 0.0 { return None; }
        Some(Self { matcher, pattern, best })
    }

    fn distance(&self, text: &str) -> Option<f64> {
        let s = self.matcher.fuzzy_match(text, &self.pattern)? as f64;
        Some(1.0 - (s / self.best).clamp(0.0, 1.0))
    }
}

// 1/sqrt(token count), rounded to 3 decimals
fn field_norm(text: &str) -> f64 {
    let tokens = text.split_whitespace().count().max(1) as f64;
    (1000.0 / tokens.sqrt()).round() / 1000.0
}

/// Run the weighted fuzzy search over `(index, record)` pairs; best hits first.
pub fn weighted_fuzzy_search<'a, I>(records: I, fields: &[FieldWeight], keyword: &str, threshold: f64) -> Vec<FuzzyHit>
where
    I: IntoIterator<Item = (usize, &'a SearchRecord)>,
{
    let Some(scorer) = Scorer::new(keyword) else { return Vec::new(); };
    let total_weight: f64 = fields.iter().map(|f| f.weight.max(0.0)).sum();
    if total_weight <= 0.0 { return Vec::new(); }

    let mut hits: Vec<FuzzyHit> = Vec::new();
    for (index, rec) in records {
        let mut combined = 1.0f64;
        let mut matched = false;
        for fw in fields {
            let w = fw.weight.max(0.0) / total_weight;
            let best_value = fw
                .field
                .values(rec)
                .into_iter()
                .filter_map(|v| scorer.distance(v).map(|d| (d, field_norm(v))))
                .filter(|(d, _)| *d <= threshold)
                .min_by(|a, b| a.0.total_cmp(&b.0));
            if let Some((d, norm)) = best_value {
                matched = true;
                combined *= d.max(f64::EPSILON).powf(w * norm);
            }
        }
        if matched {
            hits.push(FuzzyHit { index, distance: combined });
        }
    }
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, name: &str) -> SearchRecord {
        SearchRecord::new(id, name, "mainfood")
    }

    #[test]
    fn exact_name_is_near_zero_distance() {
        let rs = vec![rec("1", "noodles")];
        let hits = weighted_fuzzy_search(rs.iter().enumerate(), &default_field_weights(), "noodles", DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].distance < 0.01, "got {}", hits[0].distance);
    }

    #[test]
    fn unrelated_records_do_not_hit() {
        let rs = vec![rec("1", "coffee"), rec("2", "bubble tea")];
        let hits = weighted_fuzzy_search(rs.iter().enumerate(), &default_field_weights(), "noodles", DEFAULT_FUZZY_THRESHOLD);
        assert!(hits.is_empty());
    }

    #[test]
    fn subsequence_hits_rank_below_exact() {
        let rs = vec![rec("1", "n o o d l e s shop"), rec("2", "noodles")];
        let hits = weighted_fuzzy_search(rs.iter().enumerate(), &default_field_weights(), "noodles", 1.0);
        assert_eq!(hits.first().map(|h| h.index), Some(1));
    }

    #[test]
    fn empty_keyword_or_weights_yield_nothing() {
        let rs = vec![rec("1", "noodles")];
        assert!(weighted_fuzzy_search(rs.iter().enumerate(), &default_field_weights(), "  ", 1.0).is_empty());
        assert!(weighted_fuzzy_search(rs.iter().enumerate(), &[], "noodles", 1.0).is_empty());
    }

    #[test]
    fn tags_take_best_element() {
        let r = rec("1", "x").with_tags(["spicy", "noodles"]);
        let hits = weighted_fuzzy_search([(0usize, &r)], &default_field_weights(), "noodles", DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].distance < 1.0);
    }

    #[test]
    fn norm_rounds_to_three_decimals() {
        assert_eq!(field_norm("one"), 1.0);
        assert_eq!(field_norm("one two three"), 0.577);
        assert_eq!(field_norm(""), 1.0);
    }
}
