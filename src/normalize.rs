//! Canonicalization of raw cell text: search text, locale numbers, sizes,
//! colors, and descriptions.
//!
//! Every function here is total: malformed input degrades to a best-effort
//! canonical value (empty string, `0.0`), never an error. The inventory
//! exports this crate consumes are Spanish-locale spreadsheets, so numeric
//! parsing assumes `.` thousands separators and `,` decimals, and the
//! stemmer strips Spanish plural/diminutive suffixes only.

use heck::ToTitleCase;

/// Characters allowed through [`normalize_text`] besides alphanumerics.
const TEXT_ALLOW_LIST: &[char] = &['/', '.', '-'];

/// Suffixes stripped by [`stem`], longest first so `itas` wins over `s`.
const STEM_SUFFIXES: &[&str] = &["itas", "itos", "ita", "ito", "es", "s"];

/// Color abbreviations as they appear in supplier exports.
const COLOR_ABBREVIATIONS: &[(&str, &str)] = &[
    ("AM", "AMARILLO"),
    ("AZ", "AZUL"),
    ("BE", "BEIGE"),
    ("BL", "BLANCO"),
    ("CE", "CELESTE"),
    ("FU", "FUCSIA"),
    ("GR", "GRIS"),
    ("MA", "MARRON"),
    ("NA", "NARANJA"),
    ("NE", "NEGRO"),
    ("RO", "ROJO"),
    ("RS", "ROSA"),
    ("VE", "VERDE"),
    ("VI", "VIOLETA"),
];

/// Lowercases, strips accents, collapses whitespace, and removes characters
/// outside the alphanumeric-plus-`/.-` allow-list.
pub fn normalize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;
    for c in input.chars().flat_map(strip_accent) {
        let c = c.to_ascii_lowercase();
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if !c.is_ascii_alphanumeric() && !TEXT_ALLOW_LIST.contains(&c) {
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }
    out
}

fn strip_accent(c: char) -> Option<char> {
    let mapped = match c {
        'á' | 'à' | 'ä' | 'â' | 'Á' | 'À' | 'Ä' | 'Â' => 'a',
        'é' | 'è' | 'ë' | 'ê' | 'É' | 'È' | 'Ë' | 'Ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' | 'Í' | 'Ì' | 'Ï' | 'Î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'Ó' | 'Ò' | 'Ö' | 'Ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' | 'Ú' | 'Ù' | 'Ü' | 'Û' => 'u',
        'ñ' | 'Ñ' => 'n',
        other if other.is_ascii() => other,
        _ => return None,
    };
    Some(mapped)
}

/// Parses a Spanish-locale number (`30.000,50` → `30000.5`).
///
/// `.` is treated as a thousands separator and removed outright; `,` becomes
/// the decimal point. Returns `0.0` on any failure, including NaN/infinite
/// results, so callers never see a non-finite value.
pub fn parse_locale_number(input: &str) -> f64 {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Canonicalizes a shoe size token.
///
/// `26/7` means "26 and a half size up" in the source data, so it becomes the
/// range `26-27`. The second token is a units digit, not a full size; the
/// upper bound is always `first + 1` regardless of what the digit says. Any
/// input not shaped like `DIGITS/DIGITS`, or whose first token is too large
/// to be a size, passes through trimmed.
pub fn normalize_size(input: &str) -> String {
    let trimmed = input.trim();
    if let Some((first, second)) = trimmed.split_once('/')
        && !first.is_empty()
        && first.bytes().all(|b| b.is_ascii_digit())
        && !second.is_empty()
        && second.bytes().all(|b| b.is_ascii_digit())
        && let Ok(base) = first.parse::<u32>()
        && let Some(upper) = base.checked_add(1)
    {
        return format!("{base}-{upper}");
    }
    trimmed.to_string()
}

/// Uppercases color tokens and expands supplier abbreviations, rejoining
/// multi-color values with `-` (`ne/bl` → `NEGRO-BLANCO`).
pub fn normalize_color(input: &str) -> String {
    input
        .split(['/', '-'])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            let upper = token.to_uppercase();
            COLOR_ABBREVIATIONS
                .iter()
                .find(|(abbr, _)| *abbr == upper)
                .map(|(_, full)| (*full).to_string())
                .unwrap_or(upper)
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Trims, collapses internal whitespace, and title-cases a description.
pub fn normalize_description(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ").to_title_case()
}

/// Leading numeric value of a size token (`"26-27"` → `26.0`), or `None`
/// when the token does not start with a digit. Non-numeric sizes sort after
/// numeric ones everywhere this is used.
pub fn leading_number(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(trimmed.len());
    trimmed[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Approximate Spanish stemmer: strips one plural/diminutive suffix when the
/// remainder keeps at least 3 characters. Not a linguistic stemmer; just
/// enough to let "zapatillas" find "zapatilla".
pub fn stem(word: &str) -> &str {
    for suffix in STEM_SUFFIXES {
        if let Some(root) = word.strip_suffix(suffix)
            && root.chars().count() >= 3
        {
            return root;
        }
    }
    word
}

/// Splits a normalized question into word tokens, dropping punctuation.
pub fn tokenize(input: &str) -> Vec<String> {
    normalize_text(input)
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '/' && c != '.')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
