use rustc_hash::FxHashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::filter::{RiskFilter, SearchMode};
use crate::node::FilterRange;
use crate::sort::{SortDir, SortKey, ViewMode};

/// Injected string-keyed persistence capability.
///
/// The reference transport is a URL query string, but any store with
/// get/set semantics satisfies the contract; the engine never talks to a
/// concrete storage mechanism.
pub trait StateStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store for tests and headless use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: FxHashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

/// Store keys, matching the report's URL parameter names.
pub mod keys {
    pub const QUERY: &str = "q";
    pub const QUERY_MODE: &str = "qMode";
    pub const RISK: &str = "risk";
    pub const RANGES: &str = "ranges";
    pub const SORT_KEY: &str = "sortKey";
    pub const SORT_DIR: &str = "sortDir";
    pub const VIEW: &str = "view";
    pub const PINNED: &str = "pinned";
    pub const COLS: &str = "cols";
}

/// A persisted value that failed to decode.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("invalid value for `{key}`")]
    Decode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid boolean for `{key}`: `{raw}`")]
    Bool { key: &'static str, raw: String },
}

/// Snapshot of the explorer settings that round-trip through a store.
///
/// Expansion state is deliberately not part of this set; it belongs to the
/// expansion store and its own snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct PersistedState {
    pub query: String,
    pub search_mode: SearchMode,
    pub risk: RiskFilter,
    pub ranges: FxHashMap<String, FilterRange>,
    pub sort_key: SortKey,
    pub sort_dir: SortDir,
    pub view_mode: ViewMode,
    pub name_column_pinned: bool,
    /// Enabled metric keys, or `None` to use the caller's default.
    pub active_metrics: Option<Vec<String>>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            query: String::new(),
            search_mode: SearchMode::Literal,
            risk: RiskFilter::All,
            ranges: FxHashMap::default(),
            sort_key: SortKey::Name,
            sort_dir: SortDir::Asc,
            view_mode: ViewMode::Tree,
            name_column_pinned: true,
            active_metrics: None,
        }
    }
}

impl PersistedState {
    /// Loads the persisted settings, falling back field by field to the
    /// defaults on missing or malformed values.
    pub fn load(store: &dyn StateStore) -> Self {
        let mut state = Self::default();
        if let Some(raw) = store.get(keys::QUERY) {
            state.query = raw;
        }
        load_field(store, keys::QUERY_MODE, &mut state.search_mode, decode_scalar);
        load_field(store, keys::RISK, &mut state.risk, decode_scalar);
        load_field(store, keys::RANGES, &mut state.ranges, decode_json);
        load_field(store, keys::SORT_KEY, &mut state.sort_key, decode_sort_key);
        load_field(store, keys::SORT_DIR, &mut state.sort_dir, decode_scalar);
        load_field(store, keys::VIEW, &mut state.view_mode, decode_scalar);
        load_field(store, keys::PINNED, &mut state.name_column_pinned, decode_bool);
        if let Some(raw) = store.get(keys::COLS) {
            state.active_metrics = Some(
                raw.split(',')
                    .filter(|part| !part.is_empty())
                    .map(ToString::to_string)
                    .collect(),
            );
        }
        state
    }

    /// Writes every setting to the store.
    pub fn save(&self, store: &mut dyn StateStore) {
        store.set(keys::QUERY, &self.query);
        store.set(keys::QUERY_MODE, &encode_scalar(&self.search_mode));
        store.set(keys::RISK, &encode_scalar(&self.risk));
        store.set(
            keys::RANGES,
            &serde_json::to_string(&self.ranges).unwrap_or_else(|_| "{}".to_string()),
        );
        store.set(keys::SORT_KEY, &encode_scalar(&self.sort_key));
        store.set(keys::SORT_DIR, &encode_scalar(&self.sort_dir));
        store.set(keys::VIEW, &encode_scalar(&self.view_mode));
        store.set(keys::PINNED, &self.name_column_pinned.to_string());
        if let Some(metrics) = &self.active_metrics {
            store.set(keys::COLS, &metrics.join(","));
        }
    }
}

fn load_field<T>(
    store: &dyn StateStore,
    key: &'static str,
    slot: &mut T,
    decode: fn(&'static str, &str) -> Result<T, PersistError>,
) {
    let Some(raw) = store.get(key) else {
        return;
    };
    match decode(key, &raw) {
        Ok(value) => *slot = value,
        Err(err) => tracing::debug!(%err, "ignoring malformed persisted value"),
    }
}

/// Decodes a bare string as if it were a JSON string, so plain enum tags
/// like `tree` or `danger` round-trip without quoting in the transport.
fn decode_scalar<T: DeserializeOwned>(key: &'static str, raw: &str) -> Result<T, PersistError> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|source| PersistError::Decode { key, source })
}

fn decode_json<T: DeserializeOwned>(key: &'static str, raw: &str) -> Result<T, PersistError> {
    serde_json::from_str(raw).map_err(|source| PersistError::Decode { key, source })
}

/// The sort key is either the bare string `name` or a JSON object.
fn decode_sort_key(key: &'static str, raw: &str) -> Result<SortKey, PersistError> {
    if raw.trim_start().starts_with('{') {
        decode_json(key, raw)
    } else {
        decode_scalar(key, raw)
    }
}

fn decode_bool(key: &'static str, raw: &str) -> Result<bool, PersistError> {
    raw.parse().map_err(|_| PersistError::Bool {
        key,
        raw: raw.to_string(),
    })
}

fn encode_scalar<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(text)) => text,
        Ok(other) => other.to_string(),
        Err(_) => String::new(),
    }
}
