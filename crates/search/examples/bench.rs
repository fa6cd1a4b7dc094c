use canteen_core::SearchRecord;
use canteen_search::{Matcher, SearchConfig};
use std::time::Instant;

const NAMES: [&str; 8] = ["兰州拉面", "沙县小吃", "黄焖鸡米饭", "Lanzhou Noodles", "Bubble Tea", "麻辣烫", "煎饼果子", "Campus Cafe"];
const LOCATIONS: [&str; 4] = ["南门", "北门", "二食堂", "East Gate"];
const KINDS: [&str; 3] = ["mainfood", "drinks", "snacks"];

fn gen_record(i: usize) -> SearchRecord {
    SearchRecord::new(
        format!("{i}"),
        format!("{} {}", NAMES[i % NAMES.len()], i),
        KINDS[i % KINDS.len()],
    )
    .with_location(LOCATIONS[i % LOCATIONS.len()])
    .with_tags([format!("tag{}", i % 20)])
    .with_menu(format!("{} 套餐 {}", NAMES[(i + 3) % NAMES.len()], i % 50))
}

fn percentile_us(xs: &mut [u128], p: f64) -> u128 {
    xs.sort_unstable();
    let idx = ((xs.len() as f64 - 1.0) * p).round() as usize;
    xs[idx]
}

fn main() {
    let n: usize = std::env::var("CANTEEN_BENCH_DOCS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2_000);
    let rounds: usize = std::env::var("CANTEEN_BENCH_ROUNDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(20);

    eprintln!("building records: {} docs", n);
    let records: Vec<SearchRecord> = (0..n).map(gen_record).collect();
    let matcher = Matcher::new(SearchConfig::from_env());

    let mut run = |label: &str, qs: &[&str]| {
        let mut times: Vec<u128> = Vec::with_capacity(qs.len() * rounds);
        let mut hits = 0usize;
        for _ in 0..rounds {
            for q in qs {
                let t = Instant::now();
                hits = matcher.search(q, &records).len();
                times.push(t.elapsed().as_micros());
            }
        }
        let p50 = percentile_us(&mut times.clone(), 0.50) as f64 / 1000.0;
        let p99 = percentile_us(&mut times, 0.99) as f64 / 1000.0;
        println!("{}: p50={:.3}ms p99={:.3}ms ({} queries x {} rounds, last hits={})", label, p50, p99, qs.len(), rounds, hits);
    };

    run("literal", &["拉面", "cafe", "南门"]);
    run("pinyin", &["lamian", "shaxian", "lzlm"]);
    run("fuzzy", &["bbltea", "cmpcf"]);
}
