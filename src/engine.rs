//! Dataset lifecycle and the query entry point.
//!
//! A [`DatasetManager`] owns one [`TableSource`] and the current immutable
//! [`Snapshot`]. Queries capture the snapshot `Arc` at call time and never
//! block each other; reload rebuilds a fresh snapshot and swaps the reference
//! atomically, so in-flight queries keep the snapshot they started with.
//! Reload is single-flight: a caller that loses the race to the reload gate
//! reuses the snapshot the winner just built instead of fetching again.
//!
//! Error semantics follow a strict split: malformed *data* never errors
//! (normalizers and inference are total), while a source that cannot produce
//! a table at all surfaces as [`EngineError`], keeping "dataset unavailable"
//! distinguishable from "query matched nothing".

use std::{
    sync::{Arc, Mutex, PoisonError, RwLock},
    time::Instant,
};

use chrono::{DateTime, Utc};
use itertools::Itertools;
use log::info;
use serde::Serialize;
use thiserror::Error;

use crate::{
    group::{ProductGroup, group_products},
    index::{NormalizedRecord, build_index},
    intent::{Modifiers, QueryIntent, classify},
    normalize::{normalize_text, tokenize},
    resolve::resolve,
    roles::{RoleMap, infer_roles},
    table::RawTable,
};

const SUGGESTION_LIMIT: usize = 12;
const SUGGESTION_MIN_PREFIX: usize = 2;

/// Configuration-level failures. Per-row and per-cell anomalies never reach
/// this type; they are absorbed by the normalizers.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("table source '{name}' unavailable: {reason}")]
    SourceUnavailable { name: String, reason: String },
    #[error("table source produced a table with no columns")]
    EmptyTable,
}

/// Provenance of a loaded table: where it came from and when it changed.
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub name: String,
    pub modified: DateTime<Utc>,
}

/// One fetched table plus its provenance.
#[derive(Debug)]
pub struct TableFetch {
    pub table: RawTable,
    pub info: SourceInfo,
}

/// Supplies raw tables. Called only during reload, never per query.
pub trait TableSource: Send + Sync {
    fn fetch(&self) -> Result<TableFetch, EngineError>;
}

/// Outcome of one query call.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum QueryResult {
    Product(ProductGroup),
    ProductList(Vec<ProductGroup>),
    Empty { reason: String },
}

/// One immutable, fully-indexed view of the dataset at a point in time.
#[derive(Debug)]
pub struct Snapshot {
    roles: RoleMap,
    records: Vec<NormalizedRecord>,
    info: SourceInfo,
    vocabulary: Vec<String>,
    built_at: Instant,
}

impl Snapshot {
    pub fn build(table: &RawTable, info: SourceInfo) -> Self {
        let roles = infer_roles(table);
        let records = build_index(table, &roles);
        let vocabulary = build_vocabulary(&records);
        info!(
            "Built snapshot from '{}': {} record(s), {} role(s), {} vocabulary term(s)",
            info.name,
            records.len(),
            roles.len(),
            vocabulary.len()
        );
        Self {
            roles,
            records,
            info,
            vocabulary,
            built_at: Instant::now(),
        }
    }

    pub fn roles(&self) -> &RoleMap {
        &self.roles
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    pub fn info(&self) -> &SourceInfo {
        &self.info
    }

    /// Classifier → resolver → aggregator. A lone group from a code lookup
    /// comes back as a single product; anything else non-empty as a list.
    pub fn query(&self, question: &str, modifiers: &Modifiers) -> QueryResult {
        let intent = classify(question, &self.roles, &self.records);
        let matched = resolve(&intent, modifiers, &self.records);
        let mut groups = group_products(&matched);
        if groups.is_empty() {
            return QueryResult::Empty { reason: "no_results".to_string() };
        }
        if matches!(intent, QueryIntent::CodeLookup { .. }) && groups.len() == 1 {
            return QueryResult::Product(groups.remove(0));
        }
        QueryResult::ProductList(groups)
    }

    /// Vocabulary entries starting with the normalized prefix, at most
    /// twelve. Prefixes shorter than two characters yield nothing.
    pub fn suggest(&self, prefix: &str) -> Vec<String> {
        let normalized = normalize_text(prefix);
        if normalized.chars().count() < SUGGESTION_MIN_PREFIX {
            return Vec::new();
        }
        self.vocabulary
            .iter()
            .filter(|term| term.starts_with(&normalized))
            .take(SUGGESTION_LIMIT)
            .cloned()
            .collect()
    }
}

fn build_vocabulary(records: &[NormalizedRecord]) -> Vec<String> {
    records
        .iter()
        .flat_map(|record| {
            [
                &record.code,
                &record.description,
                &record.brand,
                &record.category,
                &record.color,
                &record.size,
            ]
        })
        .flat_map(|field| tokenize(field))
        .filter(|token| token.chars().count() >= 2)
        .sorted()
        .dedup()
        .collect()
}

/// Owns the current snapshot and coordinates reloads.
pub struct DatasetManager {
    source: Box<dyn TableSource>,
    current: RwLock<Option<Arc<Snapshot>>>,
    reload_gate: Mutex<()>,
}

impl DatasetManager {
    pub fn new(source: Box<dyn TableSource>) -> Self {
        Self {
            source,
            current: RwLock::new(None),
            reload_gate: Mutex::new(()),
        }
    }

    /// The snapshot reference as of this call, if one has been loaded.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fetches and indexes a fresh snapshot, swapping it in atomically.
    ///
    /// Single-flight: callers serialized on the gate re-check whether a
    /// snapshot was built while they waited and reuse it rather than hitting
    /// the source again.
    pub fn reload(&self) -> Result<Arc<Snapshot>, EngineError> {
        let requested_at = Instant::now();
        let _gate = self
            .reload_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = self.current()
            && existing.built_at >= requested_at
        {
            return Ok(existing);
        }
        let fetched = self.source.fetch()?;
        if fetched.table.column_count() == 0 {
            return Err(EngineError::EmptyTable);
        }
        let snapshot = Arc::new(Snapshot::build(&fetched.table, fetched.info));
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        Ok(snapshot)
    }

    fn ensure_loaded(&self) -> Result<Arc<Snapshot>, EngineError> {
        match self.current() {
            Some(snapshot) => Ok(snapshot),
            None => self.reload(),
        }
    }

    /// Answers a question against the snapshot captured at call time,
    /// loading one first if none exists yet.
    pub fn query(&self, question: &str, modifiers: &Modifiers) -> Result<QueryResult, EngineError> {
        let snapshot = self.ensure_loaded()?;
        Ok(snapshot.query(question, modifiers))
    }

    /// Autocompletion suggestions for a partial word.
    pub fn suggest(&self, prefix: &str) -> Result<Vec<String>, EngineError> {
        let snapshot = self.ensure_loaded()?;
        Ok(snapshot.suggest(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::RawRow;

    struct StaticSource {
        table: RawTable,
    }

    impl TableSource for StaticSource {
        fn fetch(&self) -> Result<TableFetch, EngineError> {
            Ok(TableFetch {
                table: self.table.clone(),
                info: SourceInfo {
                    name: "static".to_string(),
                    modified: Utc::now(),
                },
            })
        }
    }

    struct BrokenSource;

    impl TableSource for BrokenSource {
        fn fetch(&self) -> Result<TableFetch, EngineError> {
            Err(EngineError::SourceUnavailable {
                name: "broken".to_string(),
                reason: "offline".to_string(),
            })
        }
    }

    fn shoe_manager() -> DatasetManager {
        let table = RawTable::new(
            vec![
                "Artículo".into(),
                "Descripción".into(),
                "Talle".into(),
                "Cantidad".into(),
                "Precio Lista".into(),
            ],
            vec![
                RawRow::new(vec![
                    "100000089".into(),
                    "zapatilla running".into(),
                    "42".into(),
                    "3".into(),
                    "15.000,00".into(),
                ]),
                RawRow::new(vec![
                    "100000090".into(),
                    "pantufla avengers".into(),
                    "30".into(),
                    "5".into(),
                    "8.000,00".into(),
                ]),
            ],
        );
        DatasetManager::new(Box::new(StaticSource { table }))
    }

    #[test]
    fn code_lookup_returns_single_product() {
        let manager = shoe_manager();
        match manager.query("100000089", &Modifiers::default()).unwrap() {
            QueryResult::Product(group) => {
                assert_eq!(group.code, "100000089");
                assert_eq!(group.stock_total, 3);
            }
            other => panic!("expected a single product, got {other:?}"),
        }
    }

    #[test]
    fn free_text_returns_a_list() {
        let manager = shoe_manager();
        match manager.query("zapatilla", &Modifiers::default()).unwrap() {
            QueryResult::ProductList(groups) => assert_eq!(groups.len(), 1),
            other => panic!("expected a product list, got {other:?}"),
        }
    }

    #[test]
    fn no_match_is_empty_with_reason_not_an_error() {
        let manager = shoe_manager();
        match manager.query("heladera industrial", &Modifiers::default()).unwrap() {
            QueryResult::Empty { reason } => assert_eq!(reason, "no_results"),
            other => panic!("expected empty, got {other:?}"),
        }
    }

    #[test]
    fn unavailable_source_is_an_error_not_empty() {
        let manager = DatasetManager::new(Box::new(BrokenSource));
        let err = manager
            .query("zapatilla", &Modifiers::default())
            .expect_err("broken source should error");
        assert!(matches!(err, EngineError::SourceUnavailable { .. }));
    }

    #[test]
    fn empty_table_is_a_distinct_error() {
        let manager = DatasetManager::new(Box::new(StaticSource {
            table: RawTable::default(),
        }));
        let err = manager.reload().expect_err("empty table should error");
        assert!(matches!(err, EngineError::EmptyTable));
    }

    #[test]
    fn suggest_filters_by_prefix_and_caps_results() {
        let manager = shoe_manager();
        let suggestions = manager.suggest("zapa").unwrap();
        assert_eq!(suggestions, vec!["zapatilla".to_string()]);
        assert!(manager.suggest("z").unwrap().is_empty());
        assert!(manager.suggest("").unwrap().is_empty());
    }

    #[test]
    fn reload_swaps_snapshot_reference() {
        let manager = shoe_manager();
        let first = manager.reload().unwrap();
        let second = manager.reload().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&second, &manager.current().unwrap()));
    }
}
