//! Pinyin-aware substring matching.
//!
//! Text is split into syllable units: a Han character yields its tone-free
//! pinyin, any other visible character yields itself. A keyword matches when
//! a contiguous run of units consumes it, each unit taking either its whole
//! syllable or a non-empty prefix of it. That admits full pinyin
//! (`lanzhou`), initials (`lzlm`), mixtures (`lanzlm`) and a trailing partial
//! syllable (`lanzh`) against 兰州拉面.

use pinyin::ToPinyin;
use rustc_hash::FxHashSet;

use crate::normalize::{fold_umlaut, to_comparable_form};

#[derive(Debug, Clone)]
struct Unit {
    ch: char,
    han: bool,
    syllable: Vec<char>,
}

fn units(text: &str) -> Vec<Unit> {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c.to_pinyin() {
            Some(py) => Unit { ch: c, han: true, syllable: py.plain().chars().map(fold_umlaut).collect() },
            None => Unit { ch: c, han: false, syllable: c.to_lowercase().map(fold_umlaut).collect() },
        })
        .collect()
}

fn normalize_keyword(keyword: &str) -> Vec<char> {
    keyword
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .map(fold_umlaut)
        .collect()
}

/// Tone-free romanization of `text` (same key the normalizer compares on).
pub fn to_romanized(text: &str) -> String {
    to_comparable_form(text)
}

/// Does `keyword` match a contiguous run of `text`'s pinyin syllables?
pub fn romanized_substring_match(text: &str, keyword: &str) -> bool {
    let kw = normalize_keyword(keyword);
    if kw.is_empty() { return false; }
    let us = units(text);
    if us.is_empty() { return false; }
    let mut failed: FxHashSet<(usize, usize)> = FxHashSet::default();
    (0..us.len()).any(|start| consume(&us, start, &kw, 0, &mut failed))
}

fn consume(us: &[Unit], u: usize, kw: &[char], k: usize, failed: &mut FxHashSet<(usize, usize)>) -> bool {
    if k == kw.len() { return true; }
    if u == us.len() { return false; }
    if failed.contains(&(u, k)) { return false; }

    let unit = &us[u];
    if unit.han && kw[k] == unit.ch && consume(us, u + 1, kw, k + 1, failed) {
        return true;
    }

    let common = unit
        .syllable
        .iter()
        .zip(&kw[k..])
        // on Han syllables a typed `u` also stands for `ü` (lu -> 绿)
        .take_while(|(a, b)| a == b || (unit.han && **a == 'v' && **b == 'u'))
        .count();
    if common > 0 {
        if k + common == kw.len() { return true; }
        // longest take first: whole syllables are the common case
        for take in (1..=common).rev() {
            if consume(us, u + 1, kw, k + take, failed) { return true; }
        }
    }

    failed.insert((u, k));
    false
}
