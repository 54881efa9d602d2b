//! Resolution manager — bounded find→resolve→apply passes.
//!
//! One pass reads the current snapshot, computes a rename mapping with the
//! configured strategy, and applies it in a single store transaction. The
//! sequential strategy can mint secondary collisions, so passes repeat until
//! the finder comes back empty or the pass bound is hit; hitting the bound is
//! a typed error, never a process abort.

use crate::error::{ResolveError, Result};
use crate::resolver;
use crate::store::traits::UserStore;
use crate::types::{RenameEntry, ResolutionOutcome, ResolveOptions, Strategy, User};

pub struct ResolutionManager<S> {
    store: S,
    options: ResolveOptions,
}

impl<S: UserStore> ResolutionManager<S> {
    pub fn new(store: S) -> Self {
        Self::with_options(store, ResolveOptions::default())
    }

    pub fn with_options(store: S, options: ResolveOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Public API
    // -----------------------------------------------------------------------

    /// Resolve duplicate usernames with the configured strategy.
    ///
    /// On dry run the first pass's mapping is computed and reported but
    /// nothing is written; later passes cannot be predicted without
    /// applying, so the report covers one pass.
    pub fn resolve_duplicates(&self, dry_run: bool) -> Result<ResolutionOutcome> {
        self.run_passes(dry_run, self.options.strategy, "duplicate", |store| {
            store.find_duplicate_usernames()
        })
    }

    /// Resolve usernames found in the denylist.
    ///
    /// Reuses the sequential group walk keyed on adjacent-username equality.
    /// Denylisted names are typically singleton matches, so in practice each
    /// affected user gets suffix `1`; only duplicate-named rows adjacent in
    /// sort order count upward. A rename may land on a name that is itself
    /// denylisted, so this loops like the duplicate path; a rename that
    /// collides with an unrelated existing user is left for the duplicate
    /// sweep.
    pub fn resolve_denylisted(&self, dry_run: bool) -> Result<ResolutionOutcome> {
        self.run_passes(dry_run, Strategy::Sequential, "denylisted", |store| {
            store.find_denylisted_usernames()
        })
    }

    // -----------------------------------------------------------------------
    // Pass loop
    // -----------------------------------------------------------------------

    fn run_passes<F>(
        &self,
        dry_run: bool,
        strategy: Strategy,
        kind: &'static str,
        find: F,
    ) -> Result<ResolutionOutcome>
    where
        F: Fn(&S) -> Result<Vec<User>>,
    {
        let mut outcome = ResolutionOutcome::default();

        for pass in 1..=self.options.max_passes {
            let users = find(&self.store)?;
            if users.is_empty() {
                return Ok(outcome);
            }
            tracing::debug!(kind, pass, affected = users.len(), "resolution pass");

            let renames = match strategy {
                Strategy::Sequential => resolver::assign_sequential_suffixes(&users),
                Strategy::Random => {
                    let mut rng = rand::rng();
                    resolver::assign_random_suffixes(&users, &mut rng)
                }
            };

            outcome.passes = pass;
            for (id, new_username) in &renames {
                tracing::info!(kind, pass, id = *id, new_username = %new_username, dry_run, "resolved username");
                outcome.renamed.push(RenameEntry {
                    id: *id,
                    new_username: new_username.clone(),
                });
            }

            if dry_run {
                return Ok(outcome);
            }

            self.store.apply_renames(&renames)?;
            outcome.applied = true;

            // Random suffixes resolve in one pass by design; re-verifying
            // uniqueness is deliberately skipped.
            if strategy == Strategy::Random {
                return Ok(outcome);
            }
        }

        if find(&self.store)?.is_empty() {
            Ok(outcome)
        } else {
            Err(ResolveError::PassLimitExceeded {
                passes: self.options.max_passes,
            }
            .into())
        }
    }
}
