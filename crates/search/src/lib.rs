//! Canteen search: in-process multi-tier matching over the lightweight venue index.
//!
//! Pure and synchronous. Callers debounce keystrokes before calling
//! [`search`]; every call scans the full record list.

#![forbid(unsafe_code)]

pub mod config;
pub mod fuzzy;
pub mod matcher;
pub mod normalize;
pub mod phonetic;

pub use config::SearchConfig;
pub use fuzzy::{weighted_fuzzy_search, Field, FieldWeight, FuzzyHit};
pub use matcher::{search, MatchExplain, Matcher, Tier};
pub use normalize::{approximately_equal, edit_distance, to_comparable_form};
pub use phonetic::{romanized_substring_match, to_romanized};
