//! Dataset indexing: raw rows become [`NormalizedRecord`]s.
//!
//! `build_index` binds each semantic role to its physical column once, runs
//! every mapped cell through the normalizers, and precomputes a per-record
//! search blob. Rows with neither a code nor a description are sentinel "no
//! product" rows and are dropped. The result is immutable and shared
//! read-only by every concurrent query.

use log::debug;
use serde::Serialize;

use crate::{
    normalize::{
        normalize_color, normalize_description, normalize_size, normalize_text,
        parse_locale_number,
    },
    roles::{Role, RoleMap},
    table::{RawRow, RawTable},
};

/// One inventory row after normalization. Numeric fields are never NaN or
/// infinite; parse failures become zero.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NormalizedRecord {
    pub code: String,
    pub description: String,
    pub brand: String,
    pub category: String,
    pub color: String,
    pub size: String,
    pub quantity: i64,
    pub price_public: f64,
    pub price_cost: f64,
    pub valuation: f64,
    /// Lowercase, accent-stripped concatenation of the descriptive fields,
    /// the haystack for free-text matching.
    #[serde(skip)]
    pub search_blob: String,
}

impl NormalizedRecord {
    fn from_row(row: &RawRow, roles: &RoleMap) -> Self {
        let cell = |role: Role| roles.column(role).map(|col| row.cell(col)).unwrap_or("");

        let code = cell(Role::Code).trim().to_string();
        let description = normalize_description(cell(Role::Description));
        let brand = cell(Role::Brand).trim().to_string();
        let category = cell(Role::Category).trim().to_string();
        let color = normalize_color(cell(Role::Color));
        let size = normalize_size(cell(Role::Size));
        let quantity = parse_locale_number(cell(Role::Quantity)).round() as i64;
        let price_public = parse_locale_number(cell(Role::PricePublic));
        let price_cost = parse_locale_number(cell(Role::PriceCost));
        let valuation = parse_locale_number(cell(Role::Valuation));

        let search_blob = normalize_text(&format!(
            "{code} {description} {brand} {category} {color} {size}"
        ));

        Self {
            code,
            description,
            brand,
            category,
            color,
            size,
            quantity,
            price_public,
            price_cost,
            valuation,
            search_blob,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.code.is_empty() && self.description.is_empty()
    }
}

/// Normalizes every row of the table under the inferred roles, dropping
/// sentinel rows. O(rows × roles).
pub fn build_index(table: &RawTable, roles: &RoleMap) -> Vec<NormalizedRecord> {
    let mut records = Vec::with_capacity(table.row_count());
    let mut dropped = 0usize;
    for row in table.rows() {
        let record = NormalizedRecord::from_row(row, roles);
        if record.is_sentinel() {
            dropped += 1;
            continue;
        }
        records.push(record);
    }
    if dropped > 0 {
        debug!("Dropped {dropped} sentinel row(s) without code or description");
    }
    records
}
