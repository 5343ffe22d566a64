//! Semantic role assignment for physical spreadsheet columns.
//!
//! Inventory exports arrive with unstable layouts: header names vary, repeat
//! (several "Descripción" columns), or are missing entirely. [`infer_roles`]
//! maps each semantic role to at most one physical column using a header
//! keyword lexicon first and content sniffing second. It is deterministic and
//! total: ambiguous input yields a partial map, never an error. Downstream
//! components treat an unset role as "filter/aggregate unavailable".

use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::{normalize::normalize_text, table::RawTable};

/// Rows sampled per column when sniffing content.
const SNIFF_SAMPLE_ROWS: usize = 50;
/// Minimum share of sampled values that must look code- or size-shaped.
const SNIFF_MATCH_RATIO: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Code,
    Description,
    Brand,
    Category,
    Color,
    Size,
    Quantity,
    PricePublic,
    PriceCost,
    Valuation,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Code => "code",
            Role::Description => "description",
            Role::Brand => "brand",
            Role::Category => "category",
            Role::Color => "color",
            Role::Size => "size",
            Role::Quantity => "quantity",
            Role::PricePublic => "price_public",
            Role::PriceCost => "price_cost",
            Role::Valuation => "valuation",
        }
    }
}

/// Header keyword lexicon, in claim-priority order. An earlier role claims a
/// column and later roles skip it, so a header like "precio costo" lands on
/// cost price rather than the public list price.
const ROLE_KEYWORDS: &[(Role, &[&str])] = &[
    (Role::Code, &["codigo", "cod.", "art", "sku"]),
    (Role::Quantity, &["cant", "stock"]),
    (Role::PriceCost, &["costo"]),
    (Role::PricePublic, &["lista", "precio", "publico"]),
    (Role::Valuation, &["valoriz"]),
    (Role::Size, &["talle"]),
    (Role::Color, &["color"]),
    (Role::Category, &["rubro", "categoria"]),
    (Role::Brand, &["marca"]),
];

const DESCRIPTION_KEYWORDS: &[&str] = &["descripcion", "detalle", "denominacion", "producto"];

/// Brand names seen in supplier exports, used when no header says "marca".
const KNOWN_BRANDS: &[&str] = &[
    "adidas", "nike", "reebok", "atomik", "kioshi", "prominent", "maraton", "limited",
    "authentic", "puma", "fila", "topper",
];

/// Category values seen in supplier exports, used when no header says "rubro".
const KNOWN_CATEGORIES: &[&str] = &[
    "ojotas", "calzado", "indumentaria", "zapatilla", "bermuda", "remera", "buzo",
    "campera", "pantalon", "short",
];

static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]{2,20}$").expect("code regex"));
static SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d{1,2}|\d+/\d+)$").expect("size regex"));

/// Role → physical column mapping. A role maps to at most one column; a
/// column belongs to at most one role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleMap {
    assignments: BTreeMap<Role, usize>,
}

impl RoleMap {
    pub fn column(&self, role: Role) -> Option<usize> {
        self.assignments.get(&role).copied()
    }

    pub fn is_claimed(&self, column: usize) -> bool {
        self.assignments.values().any(|c| *c == column)
    }

    pub fn entries(&self) -> impl Iterator<Item = (Role, usize)> + '_ {
        self.assignments.iter().map(|(role, col)| (*role, *col))
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    fn assign(&mut self, role: Role, column: usize) {
        if !self.assignments.contains_key(&role) && !self.is_claimed(column) {
            self.assignments.insert(role, column);
        }
    }
}

/// Infers the role map for a raw table. Deterministic; an empty table yields
/// an empty map.
pub fn infer_roles(table: &RawTable) -> RoleMap {
    let mut map = RoleMap::default();
    if table.column_count() == 0 {
        return map;
    }
    let headers: Vec<String> = table.headers().iter().map(|h| normalize_text(h)).collect();

    for (role, keywords) in ROLE_KEYWORDS {
        for (idx, header) in headers.iter().enumerate() {
            if map.is_claimed(idx) || header.is_empty() {
                continue;
            }
            if keywords.iter().any(|kw| header.contains(kw)) {
                map.assign(*role, idx);
                break;
            }
        }
    }

    if map.column(Role::Code).is_none()
        && let Some(idx) = sniff_code_column(table, &map)
    {
        map.assign(Role::Code, idx);
    }
    if map.column(Role::Size).is_none()
        && let Some(idx) = sniff_size_column(table, &map)
    {
        map.assign(Role::Size, idx);
    }
    if map.column(Role::Brand).is_none()
        && let Some(idx) = sniff_known_values(table, &map, KNOWN_BRANDS)
    {
        map.assign(Role::Brand, idx);
    }
    if map.column(Role::Category).is_none()
        && let Some(idx) = sniff_known_values(table, &map, KNOWN_CATEGORIES)
    {
        map.assign(Role::Category, idx);
    }

    resolve_description(table, &headers, &mut map);
    map
}

/// Picks the column whose sampled values best match an alphanumeric code
/// shape. Values must carry at least one digit so brand/category words do not
/// qualify.
fn sniff_code_column(table: &RawTable, map: &RoleMap) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for column in 0..table.column_count() {
        if map.is_claimed(column) {
            continue;
        }
        let mut matched = 0usize;
        let mut counted = 0usize;
        for value in table.column_values(column).take(SNIFF_SAMPLE_ROWS) {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                continue;
            }
            counted += 1;
            if CODE_RE.is_match(trimmed) && trimmed.bytes().any(|b| b.is_ascii_digit()) {
                matched += 1;
            }
        }
        if counted == 0 {
            continue;
        }
        let ratio = matched as f64 / counted as f64;
        if ratio >= SNIFF_MATCH_RATIO && best.is_none_or(|(_, r)| ratio > r) {
            best = Some((column, ratio));
        }
    }
    best.map(|(column, _)| column)
}

/// Picks the column whose sampled values look like sizes: 1-2 digit numbers
/// or the `int/int` half-size notation.
fn sniff_size_column(table: &RawTable, map: &RoleMap) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for column in 0..table.column_count() {
        if map.is_claimed(column) {
            continue;
        }
        let mut matched = 0usize;
        let mut counted = 0usize;
        for value in table.column_values(column).take(SNIFF_SAMPLE_ROWS) {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                continue;
            }
            counted += 1;
            if SIZE_RE.is_match(trimmed) {
                matched += 1;
            }
        }
        if counted == 0 {
            continue;
        }
        let ratio = matched as f64 / counted as f64;
        if ratio >= SNIFF_MATCH_RATIO && best.is_none_or(|(_, r)| ratio > r) {
            best = Some((column, ratio));
        }
    }
    best.map(|(column, _)| column)
}

/// First unclaimed column containing at least one sampled value from a fixed
/// vocabulary of known brands or categories.
fn sniff_known_values(table: &RawTable, map: &RoleMap, known: &[&str]) -> Option<usize> {
    (0..table.column_count()).find(|&column| {
        !map.is_claimed(column)
            && table
                .column_values(column)
                .take(SNIFF_SAMPLE_ROWS)
                .any(|value| known.contains(&normalize_text(value).as_str()))
    })
}

/// Resolves the description role, untangling the duplicated-header case.
///
/// Some exports carry three or more "Descripción" columns holding category,
/// brand, and product name in that physical order. With ≥3 candidates the
/// first two fill category/brand when those are still unset, and the longest
/// remaining column becomes the main description. With no header candidates
/// at all, the unclaimed column with the longest average cell length wins.
fn resolve_description(table: &RawTable, headers: &[String], map: &mut RoleMap) {
    let candidates: Vec<usize> = (0..table.column_count())
        .filter(|&idx| {
            !map.is_claimed(idx)
                && DESCRIPTION_KEYWORDS.iter().any(|kw| headers[idx].contains(kw))
        })
        .collect();

    match candidates.len() {
        0 => {
            let fallback = (0..table.column_count())
                .filter(|&idx| !map.is_claimed(idx))
                .map(|idx| (idx, table.average_cell_length(idx)))
                .filter(|(_, avg)| *avg > 0.0)
                .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)));
            if let Some((idx, _)) = fallback {
                map.assign(Role::Description, idx);
            }
        }
        1 | 2 => {
            let main = longest_column(table, &candidates);
            map.assign(Role::Description, main);
        }
        _ => {
            map.assign(Role::Category, candidates[0]);
            map.assign(Role::Brand, candidates[1]);
            let remainder: Vec<usize> = candidates[2..].to_vec();
            let main = longest_column(table, &remainder);
            map.assign(Role::Description, main);
        }
    }
}

fn longest_column(table: &RawTable, columns: &[usize]) -> usize {
    columns
        .iter()
        .copied()
        .max_by(|a, b| {
            table
                .average_cell_length(*a)
                .total_cmp(&table.average_cell_length(*b))
                .then(b.cmp(a))
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::RawRow;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| RawRow::new(row.iter().map(|c| c.to_string()).collect()))
                .collect(),
        )
    }

    #[test]
    fn headers_map_to_roles() {
        let t = table(
            &["Artículo", "Descripción", "Talle", "Cantidad", "Precio Lista", "Valorizado"],
            &[&["100000089", "zapatilla running", "42", "3", "15.000,00", "45.000,00"]],
        );
        let roles = infer_roles(&t);
        assert_eq!(roles.column(Role::Code), Some(0));
        assert_eq!(roles.column(Role::Description), Some(1));
        assert_eq!(roles.column(Role::Size), Some(2));
        assert_eq!(roles.column(Role::Quantity), Some(3));
        assert_eq!(roles.column(Role::PricePublic), Some(4));
        assert_eq!(roles.column(Role::Valuation), Some(5));
    }

    #[test]
    fn cost_price_claims_before_public_price() {
        let t = table(
            &["Precio Costo", "Precio Lista"],
            &[&["1.000,00", "2.000,00"]],
        );
        let roles = infer_roles(&t);
        assert_eq!(roles.column(Role::PriceCost), Some(0));
        assert_eq!(roles.column(Role::PricePublic), Some(1));
    }

    #[test]
    fn duplicated_description_headers_split_into_category_brand_main() {
        let t = table(
            &["Artículo", "Descripción", "Descripción", "Descripción"],
            &[
                &["A-1", "calzado", "nike", "zapatilla urbana negra"],
                &["A-2", "calzado", "puma", "botin de futbol cesped"],
            ],
        );
        let roles = infer_roles(&t);
        assert_eq!(roles.column(Role::Category), Some(1));
        assert_eq!(roles.column(Role::Brand), Some(2));
        assert_eq!(roles.column(Role::Description), Some(3));
    }

    #[test]
    fn code_column_sniffed_without_header() {
        let t = table(
            &["", "Descripción"],
            &[
                &["100000089", "zapatilla running"],
                &["100000090", "zapatilla urbana"],
            ],
        );
        let roles = infer_roles(&t);
        assert_eq!(roles.column(Role::Code), Some(0));
        assert_eq!(roles.column(Role::Description), Some(1));
    }

    #[test]
    fn short_word_column_is_not_sniffed_as_code() {
        // "adidas"/"calzado" fit the code shape but carry no digit; claiming
        // them as the code would shadow the brand/category sniffs.
        let t = table(
            &["", "", "Descripción"],
            &[
                &["adidas", "calzado", "zapatilla urbana negra"],
                &["puma", "calzado", "botin de futbol cesped"],
            ],
        );
        let roles = infer_roles(&t);
        assert_eq!(roles.column(Role::Code), None);
        assert_eq!(roles.column(Role::Brand), Some(0));
        assert_eq!(roles.column(Role::Category), Some(1));
    }

    #[test]
    fn size_column_sniffed_from_half_size_values() {
        let t = table(
            &["Artículo", "Descripción", ""],
            &[
                &["A-1", "zapatilla running", "26/7"],
                &["A-2", "zapatilla urbana", "41"],
            ],
        );
        let roles = infer_roles(&t);
        assert_eq!(roles.column(Role::Size), Some(2));
    }

    #[test]
    fn brand_column_sniffed_from_known_values() {
        let t = table(
            &["Artículo", "Descripción", ""],
            &[&["A-1", "pantufla avengers con luces", "Adidas"]],
        );
        let roles = infer_roles(&t);
        assert_eq!(roles.column(Role::Brand), Some(2));
    }

    #[test]
    fn description_falls_back_to_longest_column() {
        let t = table(
            &["col_a", "col_b"],
            &[&["x", "zapatilla urbana de lona"], &["y", "pantufla infantil"]],
        );
        let roles = infer_roles(&t);
        assert_eq!(roles.column(Role::Description), Some(1));
    }

    #[test]
    fn empty_table_yields_empty_map() {
        let roles = infer_roles(&RawTable::default());
        assert!(roles.is_empty());
    }

    #[test]
    fn inference_is_deterministic() {
        let t = table(
            &["Artículo", "Descripción", "Talle", "Cantidad"],
            &[&["A-1", "zapatilla running", "42", "3"]],
        );
        assert_eq!(infer_roles(&t), infer_roles(&t));
    }
}
