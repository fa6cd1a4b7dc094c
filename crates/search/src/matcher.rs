//! Four-tier matcher: literal > pinyin > homophone > fuzzy.
//!
//! Each record is scored by the first tier (and, within a tier, the first
//! field) it qualifies for; later tiers only look at unclaimed records.
//! Score bands never overlap across tiers except at their shared edge, so an
//! exact name hit always outranks a fuzzy menu hit.

use canteen_core::{RecordId, ScoredMatch, SearchRecord};
use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::debug;

use crate::config::SearchConfig;
use crate::fuzzy::weighted_fuzzy_search;
use crate::normalize::approximately_equal_with;
use crate::phonetic::romanized_substring_match;

/// Upper bound of the fuzzy tier's score band.
pub const FUZZY_SCORE_CEILING: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Literal,
    Phonetic,
    Homophone,
    Fuzzy,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Literal => "literal",
            Tier::Phonetic => "phonetic",
            Tier::Homophone => "homophone",
            Tier::Fuzzy => "fuzzy",
        }
    }
}

/// A scored match together with the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchExplain {
    pub id: RecordId,
    pub score: u8,
    pub tier: Tier,
}

// Claimed records and their scores, in first-encountered order.
struct Claims {
    taken: FxHashSet<usize>,
    order: Vec<(usize, u8, Tier)>,
}

impl Claims {
    fn new() -> Self { Self { taken: FxHashSet::default(), order: Vec::new() } }

    fn is_claimed(&self, i: usize) -> bool { self.taken.contains(&i) }

    fn claim(&mut self, i: usize, score: u8, tier: Tier) {
        if self.taken.insert(i) {
            self.order.push((i, score, tier));
        }
    }
}

pub struct Matcher {
    cfg: SearchConfig,
}

impl Default for Matcher {
    fn default() -> Self { Self::new(SearchConfig::default()) }
}

impl Matcher {
    pub fn new(cfg: SearchConfig) -> Self { Self { cfg } }

    pub fn config(&self) -> &SearchConfig { &self.cfg }

    /// Ranked ids, most relevant first. Blank keyword -> empty.
    pub fn search(&self, keyword: &str, records: &[SearchRecord]) -> Vec<RecordId> {
        self.explain(keyword, records).into_iter().map(|m| m.id).collect()
    }

    pub fn search_scored(&self, keyword: &str, records: &[SearchRecord]) -> Vec<ScoredMatch> {
        self.explain(keyword, records)
            .into_iter()
            .map(|m| ScoredMatch { id: m.id, score: m.score })
            .collect()
    }

    pub fn explain(&self, keyword: &str, records: &[SearchRecord]) -> Vec<MatchExplain> {
        let kw = keyword.trim().to_lowercase();
        if kw.is_empty() || records.is_empty() {
            return Vec::new();
        }
        let started = std::time::Instant::now();
        let mut claims = Claims::new();

        for (i, r) in records.iter().enumerate() {
            if let Some(s) = literal_score(r, &kw) { claims.claim(i, s, Tier::Literal); }
        }
        for (i, r) in records.iter().enumerate() {
            if claims.is_claimed(i) { continue; }
            if let Some(s) = phonetic_score(r, &kw) { claims.claim(i, s, Tier::Phonetic); }
        }
        for (i, r) in records.iter().enumerate() {
            if claims.is_claimed(i) { continue; }
            if let Some(s) = homophone_score(r, &kw, self.cfg.similarity_threshold) { claims.claim(i, s, Tier::Homophone); }
        }
        // Per-record fuzzy distance does not depend on the other records, so
        // feeding only unclaimed ones gives the same hits as a full rescan.
        let unclaimed = records.iter().enumerate().filter(|(i, _)| !claims.is_claimed(*i));
        for hit in weighted_fuzzy_search(unclaimed, &self.cfg.field_weights, &kw, self.cfg.fuzzy_threshold) {
            claims.claim(hit.index, fuzzy_score(hit.distance), Tier::Fuzzy);
        }

        record_tier_metrics(&claims.order);
        let mut ranked = claims.order;
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        let elapsed = started.elapsed();
        metrics::histogram!("search_eval_ms", elapsed.as_secs_f64() * 1_000.0);
        debug!(keyword = %kw, records = records.len(), hits = ranked.len(), took_us = %elapsed.as_micros(), "search evaluated");

        ranked
            .into_iter()
            .map(|(i, score, tier)| MatchExplain { id: records[i].id.clone(), score, tier })
            .collect()
    }
}

/// Default-configured matcher entry point.
pub fn search(keyword: &str, records: &[SearchRecord]) -> Vec<RecordId> {
    Matcher::default().search(keyword, records)
}

fn literal_score(r: &SearchRecord, kw: &str) -> Option<u8> {
    let hit = |s: &str| s.to_lowercase().contains(kw);
    if hit(&r.name) { return Some(100); }
    if r.location().is_some_and(hit) { return Some(95); }
    if r.tags.iter().any(|t| hit(t)) { return Some(90); }
    if r.menu().is_some_and(hit) { return Some(85); }
    None
}

fn phonetic_score(r: &SearchRecord, kw: &str) -> Option<u8> {
    let hit = |s: &str| romanized_substring_match(s, kw);
    if hit(&r.name) { return Some(85); }
    if r.location().is_some_and(hit) { return Some(80); }
    if r.tags.iter().any(|t| hit(t)) { return Some(75); }
    if r.menu().is_some_and(hit) { return Some(70); }
    None
}

fn homophone_score(r: &SearchRecord, kw: &str, threshold: f64) -> Option<u8> {
    // a blank field's comparable form is "", which every key contains
    if !r.name.trim().is_empty() && approximately_equal_with(&r.name, kw, threshold) { return Some(70); }
    if r.location().is_some_and(|l| approximately_equal_with(l, kw, threshold)) { return Some(65); }
    None
}

fn fuzzy_score(distance: f64) -> u8 {
    ((1.0 - distance.clamp(0.0, 1.0)) * FUZZY_SCORE_CEILING).round() as u8
}

fn record_tier_metrics(order: &[(usize, u8, Tier)]) {
    for tier in [Tier::Literal, Tier::Phonetic, Tier::Homophone, Tier::Fuzzy] {
        let n = order.iter().filter(|(_, _, t)| *t == tier).count();
        if n > 0 {
            metrics::counter!("search_tier_hits_total", n as u64, "tier" => tier.as_str());
        }
    }
}
