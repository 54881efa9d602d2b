use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A row of the `users` table. The store owns the record; this crate only
/// ever rewrites the `username` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

impl User {
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

/// One resolution pass's id → new-username mapping. Keyed by id, so the
/// mapping is injective over ids by construction and iterates in a
/// deterministic order for reporting.
pub type RenameMap = BTreeMap<i64, String>;

/// A single reported rename (dry run and real apply use the same shape).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameEntry {
    pub id: i64,
    pub new_username: String,
}

/// A duplicated username and how many rows carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsernameCount {
    pub username: String,
    pub count: i64,
}

/// How colliding usernames are rewritten.
///
/// `Sequential` is deterministic and human-readable but may need several
/// passes; `Random` resolves in one pass with overwhelming probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    #[default]
    Sequential,
    Random,
}

pub const DEFAULT_MAX_PASSES: u32 = 10;

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub strategy: Strategy,
    /// Upper bound on Finder→Resolver→Updater passes before giving up.
    pub max_passes: u32,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::Sequential,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

/// Result of a resolution run.
#[derive(Debug, Clone, Default)]
pub struct ResolutionOutcome {
    /// Number of passes that computed a non-empty mapping.
    pub passes: u32,
    /// Every rename computed across all passes, in pass order.
    pub renamed: Vec<RenameEntry>,
    /// Whether any mapping was written to the store (always false on dry run).
    pub applied: bool,
}
