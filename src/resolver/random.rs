//! Random-suffix rename strategy.

use rand::distr::Alphanumeric;
use rand::Rng;

use crate::types::{RenameMap, User};

/// Length of the random suffix. At 20 alphanumeric characters the collision
/// probability is negligible for any realistic table size, so a single pass
/// resolves everything with overwhelming probability and uniqueness is not
/// re-verified afterwards.
pub const TOKEN_LEN: usize = 20;

/// Assign `username + "-" + random token` to every user.
///
/// No grouping state is needed; the input order is irrelevant. The rng is
/// injected so tests can seed it.
pub fn assign_random_suffixes<R: Rng>(users: &[User], rng: &mut R) -> RenameMap {
    users
        .iter()
        .map(|user| {
            (
                user.id,
                format!("{}-{}", user.username, random_token(rng, TOKEN_LEN)),
            )
        })
        .collect()
}

/// Fixed-length random string drawn uniformly from `[A-Za-z0-9]`.
pub fn random_token<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| rng.sample(Alphanumeric) as char).collect()
}
