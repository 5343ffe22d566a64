//! Aggregation of matched records into product-level groups.
//!
//! Records group by code, falling back to the normalized description when no
//! code survived normalization. Descriptive fields are first-wins, stock and
//! valuation sum, and the size breakdown sub-groups on size. Talles sort
//! ascending by leading numeric value (non-numeric sizes after all numeric
//! ones, in encounter order); groups sort by descending total stock so the
//! most available products lead any list response.

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    index::NormalizedRecord,
    normalize::{leading_number, normalize_text},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeStock {
    pub size: String,
    pub stock: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductGroup {
    pub code: String,
    pub description: String,
    pub brand: String,
    pub category: String,
    pub color: String,
    pub price: f64,
    pub stock_total: i64,
    pub talles: Vec<SizeStock>,
    pub valuation_total: f64,
}

/// Groups records into products. Invariant: `stock_total` equals the sum of
/// the per-size stocks.
pub fn group_products(records: &[&NormalizedRecord]) -> Vec<ProductGroup> {
    let mut order: Vec<String> = Vec::new();
    let mut accums: HashMap<String, GroupAccum> = HashMap::new();

    for record in records {
        let key = if record.code.is_empty() {
            normalize_text(&record.description)
        } else {
            record.code.clone()
        };
        let accum = accums.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            GroupAccum::seeded_from(record)
        });
        accum.absorb(record);
    }

    let mut groups: Vec<ProductGroup> = order
        .into_iter()
        .filter_map(|key| accums.remove(&key))
        .map(GroupAccum::finish)
        .collect();
    groups.sort_by(|a, b| b.stock_total.cmp(&a.stock_total));
    groups
}

struct GroupAccum {
    code: String,
    description: String,
    brand: String,
    category: String,
    color: String,
    price: f64,
    stock_total: i64,
    valuation_total: f64,
    size_order: Vec<String>,
    size_stock: HashMap<String, i64>,
}

impl GroupAccum {
    fn seeded_from(record: &NormalizedRecord) -> Self {
        Self {
            code: record.code.clone(),
            description: record.description.clone(),
            brand: record.brand.clone(),
            category: record.category.clone(),
            color: record.color.clone(),
            price: 0.0,
            stock_total: 0,
            valuation_total: 0.0,
            size_order: Vec::new(),
            size_stock: HashMap::new(),
        }
    }

    fn absorb(&mut self, record: &NormalizedRecord) {
        self.stock_total += record.quantity;
        self.valuation_total += record.valuation;
        if self.price == 0.0 && record.price_public != 0.0 {
            self.price = record.price_public;
        }
        if !record.size.is_empty() {
            if !self.size_stock.contains_key(&record.size) {
                self.size_order.push(record.size.clone());
            }
            *self.size_stock.entry(record.size.clone()).or_insert(0) += record.quantity;
        }
    }

    fn finish(mut self) -> ProductGroup {
        let mut talles: Vec<SizeStock> = self
            .size_order
            .drain(..)
            .map(|size| {
                let stock = self.size_stock.remove(&size).unwrap_or(0);
                SizeStock { size, stock }
            })
            .collect();
        talles.sort_by(|a, b| match (leading_number(&a.size), leading_number(&b.size)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        ProductGroup {
            code: self.code,
            description: self.description,
            brand: self.brand,
            category: self.category,
            color: self.color,
            price: self.price,
            stock_total: self.stock_total,
            talles,
            valuation_total: self.valuation_total,
        }
    }
}
