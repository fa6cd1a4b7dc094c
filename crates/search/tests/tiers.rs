#![forbid(unsafe_code)]

use canteen_core::SearchRecord;
use canteen_search::{search, Matcher, Tier};

fn scenario() -> Vec<SearchRecord> {
    let raw = serde_json::json!([
        { "id": "1", "name": "兰州拉面", "type": "mainfood", "locationDescription": "南门", "tags": ["面食"], "menuText": "牛肉面" },
        { "id": "2", "name": "Lanzhou Noodles", "type": "mainfood", "locationDescription": "", "tags": [], "menuText": "" }
    ]);
    serde_json::from_value(raw).unwrap()
}

#[test]
fn exact_chinese_substring() {
    assert_eq!(search("拉面", &scenario()), vec!["1"]);
}

#[test]
fn latin_literal_before_pinyin() {
    let ids = search("lanzhou", &scenario());
    assert_eq!(ids.first().map(String::as_str), Some("2"));
    if let Some(pos) = ids.iter().position(|id| id == "1") {
        assert!(pos > 0);
    }
}

#[test]
fn pinyin_location_only() {
    let rs: Vec<SearchRecord> = serde_json::from_value(serde_json::json!([
        { "id": "3", "name": "X", "locationDescription": "南门", "tags": [], "menuText": "" }
    ]))
    .unwrap();
    let m = Matcher::default();
    let got = m.explain("nanmen", &rs);
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].id, "3");
    assert_eq!(got[0].score, 80);
    assert_eq!(got[0].tier, Tier::Phonetic);
}

#[test]
fn name_substring_always_in_literal_band_above_fuzzy() {
    let mut rs = scenario();
    rs.push(SearchRecord::new("9", "N.o.o.d.l.e.s", "mainfood"));
    rs.push(SearchRecord::new("10", "Hand-pulled NOODLES", "mainfood"));
    let m = Matcher::default();
    let got = m.explain("noodles", &rs);
    let literal_pos = got.iter().position(|x| x.id == "10").unwrap();
    assert!(got[literal_pos].score >= 85);
    for (pos, x) in got.iter().enumerate() {
        if x.tier == Tier::Fuzzy {
            assert!(pos > literal_pos);
            assert!(x.score <= 60);
        }
    }
}

#[test]
fn blank_keywords() {
    let rs = scenario();
    for kw in ["", " ", "\n\t "] {
        assert!(search(kw, &rs).is_empty());
    }
}
