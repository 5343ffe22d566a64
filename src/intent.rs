//! Free-text question classification.
//!
//! `classify` maps a question (plus whatever the caller already knows about
//! the dataset) onto one [`QueryIntent`] using ordered first-match-wins
//! rules. The query vocabulary is narrow — inventory lookups in Spanish — so
//! cheap, explainable rules beat anything statistical here, and determinism
//! keeps every rule independently testable.

use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    index::NormalizedRecord,
    normalize::{normalize_text, parse_locale_number, tokenize},
    roles::{Role, RoleMap},
};

/// Question words carrying no search signal.
const STOP_WORDS: &[&str] = &[
    "que", "hay", "tengo", "de", "el", "la", "los", "las", "un", "una", "stock", "en",
    "para", "con", "por", "sobre", "del", "al", "y", "o", "a",
];

static PRICE_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"entre\s+([0-9][0-9.,]*)\s+y\s+([0-9][0-9.,]*)").expect("price range regex")
});
static BARE_SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}(?:\.\d+)?$").expect("bare size regex"));
static DECIMAL_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d),(\d)").expect("decimal comma regex"));

/// Closed set of recognized question shapes, in classification order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryIntent {
    CodeLookup { code: String },
    SizeFilter { size: String },
    BrandFilter { brand: String },
    CategoryFilter { category: String },
    PriceRange { min: f64, max: f64 },
    FreeText { tokens: Vec<String> },
}

/// Orthogonal post-resolution filters. These never change which intent is
/// chosen; they narrow the resolved set afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub stock_only: bool,
    pub negative_only: bool,
    pub single_unit_only: bool,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub size_min: Option<f64>,
    pub size_max: Option<f64>,
}

/// Classifies a question. Rule order matters; the first rule that fires wins.
pub fn classify(question: &str, roles: &RoleMap, records: &[NormalizedRecord]) -> QueryIntent {
    // Spanish decimal commas ("10,5") must survive normalization, which
    // strips commas outright; rewrite them as dots up front.
    let question = DECIMAL_COMMA_RE.replace_all(question, "$1.$2");
    let normalized = normalize_text(&question);

    if let Some(code) = records
        .iter()
        .map(|r| r.code.as_str())
        .find(|code| !code.is_empty() && code.eq_ignore_ascii_case(normalized.trim()))
    {
        return QueryIntent::CodeLookup { code: code.to_string() };
    }

    if let Some(caps) = PRICE_RANGE_RE.captures(&normalized) {
        let a = parse_locale_number(&caps[1]);
        let b = parse_locale_number(&caps[2]);
        return QueryIntent::PriceRange { min: a.min(b), max: a.max(b) };
    }

    let tokens = tokenize(&question);

    if roles.column(Role::Size).is_some()
        && let Some(size) = tokens.iter().find(|t| BARE_SIZE_RE.is_match(t))
    {
        return QueryIntent::SizeFilter { size: size.clone() };
    }

    let brands: HashSet<String> = records
        .iter()
        .map(|r| normalize_text(&r.brand))
        .filter(|b| !b.is_empty())
        .collect();
    if let Some(brand) = tokens.iter().find(|t| brands.contains(*t)) {
        return QueryIntent::BrandFilter { brand: brand.clone() };
    }

    let categories: HashSet<String> = records
        .iter()
        .map(|r| normalize_text(&r.category))
        .filter(|c| !c.is_empty())
        .collect();
    if let Some(category) = tokens.iter().find(|t| categories.contains(*t)) {
        return QueryIntent::CategoryFilter { category: category.clone() };
    }

    let tokens: Vec<String> = tokens
        .into_iter()
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect();
    QueryIntent::FreeText { tokens }
}
