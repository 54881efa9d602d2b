//! Sequential-suffix rename strategy.

use crate::types::{RenameMap, User};

/// Assign `name1 .. namek` within each run of equal usernames.
///
/// `users` must be sorted by username (the finder queries guarantee this);
/// a group boundary is any adjacent inequality. The counter is rendered as
/// its decimal string, so the tenth member of a group becomes `name10`, not
/// a raw code point.
///
/// A suffixed name may itself already be taken by an unrelated row (a
/// secondary collision), so one pass is not guaranteed collision-free; the
/// caller re-runs the find→resolve→apply cycle until the finder comes back
/// empty.
pub fn assign_sequential_suffixes(users: &[User]) -> RenameMap {
    let mut renames = RenameMap::new();
    let mut current_group: Option<&str> = None;
    let mut counter: u32 = 1;

    for user in users {
        if current_group != Some(user.username.as_str()) {
            current_group = Some(user.username.as_str());
            counter = 1;
        }
        renames.insert(user.id, format!("{}{}", user.username, counter));
        counter += 1;
    }

    renames
}
