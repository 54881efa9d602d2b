/// Store boundary for username hygiene.
///
/// `UserStore` is the narrow contract the resolution manager runs against.
/// Production code uses the SQLite implementation; tests may substitute an
/// in-memory fake. The handle is passed explicitly — there is no process-wide
/// connection.
use crate::error::Result;
use crate::types::{RenameMap, User, UsernameCount};

/// Finder and updater operations over the `users` table.
///
/// Implementors must be `Send + Sync` so a store can be shared across threads.
pub trait UserStore: Send + Sync {
    /// Every user whose username occurs more than once, ordered ascending by
    /// username (ties broken by id, matching insertion order). Read-only;
    /// reflects a single consistent snapshot. Never returns a partial
    /// result — a failed query surfaces as an error.
    fn find_duplicate_usernames(&self) -> Result<Vec<User>>;

    /// Every user whose username appears in the denylist, ordered ascending
    /// by username. Same read-only/snapshot contract as
    /// [`find_duplicate_usernames`](Self::find_duplicate_usernames).
    fn find_denylisted_usernames(&self) -> Result<Vec<User>>;

    /// Duplicated usernames and their occurrence counts (count > 1), for
    /// audit output and tests.
    fn duplicate_username_counts(&self) -> Result<Vec<UsernameCount>>;

    /// Apply an id → new-username mapping atomically: one transaction, one
    /// prepared statement executed per entry, commit. Any failure rolls the
    /// whole batch back and leaves every username unchanged.
    fn apply_renames(&self, renames: &RenameMap) -> Result<()>;
}
