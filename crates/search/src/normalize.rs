//! Comparable phonetic keys and edit distance.
//!
//! Han characters become tone-free pinyin, everything else is lower-cased,
//! whitespace is dropped. Two strings that sound alike ("南门" / "nan men")
//! share a comparable form.

use pinyin::ToPinyin;

/// Default similarity cut for [`approximately_equal`].
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

/// Romanize `text` into its comparable form. Total: `""` maps to `""`.
pub fn to_comparable_form(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_whitespace() { continue; }
        match c.to_pinyin() {
            Some(py) => out.extend(py.plain().chars().map(fold_umlaut)),
            None => out.extend(c.to_lowercase().map(fold_umlaut)),
        }
    }
    out
}

/// `ü` is typed as `v` on pinyin keyboards; `lü` and `lv` share a key.
pub(crate) fn fold_umlaut(c: char) -> char {
    if c == 'ü' { 'v' } else { c }
}

/// Homophone / near-spelling equality with the default threshold.
pub fn approximately_equal(a: &str, b: &str) -> bool {
    approximately_equal_with(a, b, DEFAULT_SIMILARITY_THRESHOLD)
}

/// `true` when the comparable forms are equal, nest, or are more than `threshold` similar.
pub fn approximately_equal_with(a: &str, b: &str, threshold: f64) -> bool {
    let ca = to_comparable_form(a);
    let cb = to_comparable_form(b);
    if ca.is_empty() && cb.is_empty() {
        return true;
    }
    if ca == cb || ca.contains(&cb) || cb.contains(&ca) {
        return true;
    }
    let max_len = ca.chars().count().max(cb.chars().count());
    let distance = edit_distance(&ca, &cb);
    let similarity = 1.0 - distance as f64 / max_len as f64;
    similarity > threshold
}

/// Levenshtein distance over Unicode scalar values, unit costs. No case folding.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() { return b.len(); }
    if b.is_empty() { return a.len(); }

    // dp[i][j] = distance between a[..i] and b[..j]
    let mut dp = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in dp.iter_mut().enumerate() { row[0] = i; }
    for j in 0..=b.len() { dp[0][j] = j; }
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            dp[i][j] = (dp[i - 1][j] + 1)
                .min(dp[i][j - 1] + 1)
                .min(dp[i - 1][j - 1] + cost);
        }
    }
    dp[a.len()][b.len()]
}
