//! Intent resolution against the normalized record set.
//!
//! Structured intents are direct predicates. Free text runs through a tiered
//! cascade — exact word, word prefix, substring, stemmed containment, bounded
//! fuzzy — stopping at the first tier with any hits. Exact matches must
//! outrank partial ones when both exist, but an empty exact tier must not
//! mask a reasonable partial match, so tiers are escalated only on a
//! genuinely empty result and never merged.
//!
//! Every tier requires all query tokens to be satisfiable (AND across
//! tokens, OR across the words of a record's search blob).

use log::debug;

use crate::{
    index::NormalizedRecord,
    intent::{Modifiers, QueryIntent},
    normalize::{leading_number, normalize_text, stem},
};

/// Maximum length-difference-plus-mismatch distance tolerated by the fuzzy
/// tier.
const FUZZY_DISTANCE_MAX: usize = 2;

/// Resolves an intent to the matching records. Empty result means "no
/// matches", never an error.
pub fn resolve<'a>(
    intent: &QueryIntent,
    modifiers: &Modifiers,
    records: &'a [NormalizedRecord],
) -> Vec<&'a NormalizedRecord> {
    let matched: Vec<&NormalizedRecord> = match intent {
        QueryIntent::CodeLookup { code } => records
            .iter()
            .filter(|r| r.code.eq_ignore_ascii_case(code))
            .collect(),
        QueryIntent::SizeFilter { size } => records
            .iter()
            .filter(|r| size_matches(&r.size, size))
            .collect(),
        QueryIntent::BrandFilter { brand } => records
            .iter()
            .filter(|r| normalize_text(&r.brand) == *brand)
            .collect(),
        QueryIntent::CategoryFilter { category } => records
            .iter()
            .filter(|r| normalize_text(&r.category) == *category)
            .collect(),
        QueryIntent::PriceRange { min, max } => records
            .iter()
            .filter(|r| r.price_public >= *min && r.price_public <= *max)
            .collect(),
        QueryIntent::FreeText { tokens } => resolve_free_text(tokens, records),
    };
    matched
        .into_iter()
        .filter(|r| passes_modifiers(r, modifiers))
        .collect()
}

/// A stored size matches a wanted size when they are equal or when the wanted
/// value is one endpoint of a half-size range ("26" matches "26-27").
fn size_matches(stored: &str, wanted: &str) -> bool {
    stored == wanted || stored.split('-').any(|part| part == wanted)
}

fn passes_modifiers(record: &NormalizedRecord, modifiers: &Modifiers) -> bool {
    if modifiers.stock_only && record.quantity <= 0 {
        return false;
    }
    if modifiers.negative_only && record.quantity >= 0 {
        return false;
    }
    if modifiers.single_unit_only && record.quantity != 1 {
        return false;
    }
    if let Some(brand) = &modifiers.brand
        && normalize_text(&record.brand) != normalize_text(brand)
    {
        return false;
    }
    if let Some(category) = &modifiers.category
        && normalize_text(&record.category) != normalize_text(category)
    {
        return false;
    }
    if modifiers.size_min.is_some() || modifiers.size_max.is_some() {
        let Some(value) = leading_number(&record.size) else {
            return false;
        };
        if modifiers.size_min.is_some_and(|min| value < min) {
            return false;
        }
        if modifiers.size_max.is_some_and(|max| value > max) {
            return false;
        }
    }
    true
}

type TokenPredicate = fn(&NormalizedRecord, &str) -> bool;

/// Tier predicates in precision order.
const TIERS: &[(&str, TokenPredicate)] = &[
    ("exact-word", token_as_word),
    ("word-prefix", token_as_prefix),
    ("substring", token_as_substring),
    ("stemmed", token_as_stem),
    ("fuzzy", token_fuzzy),
];

fn resolve_free_text<'a>(
    tokens: &[String],
    records: &'a [NormalizedRecord],
) -> Vec<&'a NormalizedRecord> {
    if tokens.is_empty() {
        return Vec::new();
    }
    for (name, predicate) in TIERS {
        let matched: Vec<&NormalizedRecord> = records
            .iter()
            .filter(|record| tokens.iter().all(|token| predicate(record, token)))
            .collect();
        if !matched.is_empty() {
            debug!("Free-text tier '{name}' matched {} record(s)", matched.len());
            return matched;
        }
    }
    Vec::new()
}

fn token_as_word(record: &NormalizedRecord, token: &str) -> bool {
    record.search_blob.split_whitespace().any(|word| word == token)
}

fn token_as_prefix(record: &NormalizedRecord, token: &str) -> bool {
    record
        .search_blob
        .split_whitespace()
        .any(|word| word.starts_with(token))
}

fn token_as_substring(record: &NormalizedRecord, token: &str) -> bool {
    record.search_blob.contains(token)
}

fn token_as_stem(record: &NormalizedRecord, token: &str) -> bool {
    let root = stem(token);
    record
        .search_blob
        .split_whitespace()
        .any(|word| stem(word).contains(root))
}

fn token_fuzzy(record: &NormalizedRecord, token: &str) -> bool {
    let root = stem(token);
    record
        .search_blob
        .split_whitespace()
        .any(|word| bounded_distance(stem(word), root) <= FUZZY_DISTANCE_MAX)
}

/// Cheap distance: absolute length difference plus positional mismatches over
/// the shared prefix length. Not Levenshtein; good enough to absorb a typo or
/// a swapped vowel in short inventory words.
fn bounded_distance(a: &str, b: &str) -> usize {
    let length_gap = a.chars().count().abs_diff(b.chars().count());
    let mismatches = a
        .chars()
        .zip(b.chars())
        .filter(|(x, y)| x != y)
        .count();
    length_gap + mismatches
}
