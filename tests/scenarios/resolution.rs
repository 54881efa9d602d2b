//! End-to-end resolution scenarios against the SQLite store.

use pretty_assertions::assert_eq;
use username_dedup::error::{DedupError, ResolveError};
use username_dedup::manager::ResolutionManager;
use username_dedup::store::sqlite::SqliteStore;
use username_dedup::store::traits::UserStore;
use username_dedup::types::{RenameEntry, ResolveOptions, Strategy};

// ============================================================================
// Test helpers
// ============================================================================

fn make_manager(
    users: &[(i64, &str)],
    denylist: &[&str],
) -> ResolutionManager<SqliteStore> {
    let store = SqliteStore::open_in_memory().expect("open in-memory store");
    store.initialize().expect("initialize schema");
    for (id, name) in users {
        store.add_user(*id, name).expect("insert user");
    }
    for name in denylist {
        store.add_denylisted_username(name).expect("insert denylist entry");
    }
    ResolutionManager::new(store)
}

fn sorted_usernames(store: &SqliteStore) -> Vec<String> {
    let mut names: Vec<String> = store
        .all_users()
        .expect("snapshot")
        .into_iter()
        .map(|u| u.username)
        .collect();
    names.sort();
    names
}

// ============================================================================
// Duplicate resolution
// ============================================================================

#[test]
fn sequential_dry_run_reports_mapping_and_leaves_store_untouched() {
    let manager = make_manager(&[(1, "abe"), (2, "abe")], &[]);
    let before = manager.store().all_users().expect("snapshot");

    let outcome = manager.resolve_duplicates(true).expect("dry run");

    assert!(!outcome.applied);
    assert_eq!(outcome.passes, 1);
    // Ties within a group follow id order, so the pairing is deterministic.
    assert_eq!(
        outcome.renamed,
        vec![
            RenameEntry { id: 1, new_username: "abe1".to_string() },
            RenameEntry { id: 2, new_username: "abe2".to_string() },
        ]
    );

    assert_eq!(manager.store().all_users().expect("snapshot"), before);
}

#[test]
fn sequential_apply_resolves_abe_collision() {
    let manager = make_manager(&[(1, "abe"), (2, "abe")], &[]);

    let outcome = manager.resolve_duplicates(false).expect("resolve");

    assert!(outcome.applied);
    assert_eq!(sorted_usernames(manager.store()), vec!["abe1", "abe2"]);
    assert!(manager.store().find_duplicate_usernames().expect("finder").is_empty());
}

#[test]
fn sequential_drains_secondary_collisions_across_passes() {
    // Renaming the bobs to bob1/bob2 collides with the pre-existing bob1;
    // the second pass clears that.
    let manager = make_manager(&[(1, "bob"), (2, "bob"), (3, "bob1")], &[]);

    let outcome = manager.resolve_duplicates(false).expect("resolve");

    assert_eq!(outcome.passes, 2);
    assert_eq!(sorted_usernames(manager.store()), vec!["bob11", "bob12", "bob2"]);
    assert!(manager.store().find_duplicate_usernames().expect("finder").is_empty());
    assert!(manager.store().duplicate_username_counts().expect("counts").is_empty());
}

#[test]
fn pass_limit_exceeded_surfaces_resolve_error() {
    let store = SqliteStore::open_in_memory().expect("open");
    store.initialize().expect("initialize");
    for (id, name) in [(1, "bob"), (2, "bob"), (3, "bob1")] {
        store.add_user(id, name).expect("insert");
    }
    let manager = ResolutionManager::with_options(
        store,
        ResolveOptions {
            strategy: Strategy::Sequential,
            max_passes: 1,
        },
    );

    let err = manager.resolve_duplicates(false).expect_err("must exceed");
    assert!(matches!(
        err,
        DedupError::Resolve(ResolveError::PassLimitExceeded { passes: 1 })
    ));
}

#[test]
fn random_strategy_resolves_in_a_single_pass() {
    let manager = ResolutionManager::with_options(
        {
            let store = SqliteStore::open_in_memory().expect("open");
            store.initialize().expect("initialize");
            for (id, name) in [(1, "abe"), (2, "abe"), (3, "bob"), (4, "bob"), (5, "bob")] {
                store.add_user(id, name).expect("insert");
            }
            store
        },
        ResolveOptions {
            strategy: Strategy::Random,
            max_passes: 10,
        },
    );

    let outcome = manager.resolve_duplicates(false).expect("resolve");

    assert!(outcome.applied);
    assert_eq!(outcome.passes, 1);
    assert_eq!(outcome.renamed.len(), 5);
    assert!(manager.store().find_duplicate_usernames().expect("finder").is_empty());
    for user in manager.store().all_users().expect("snapshot") {
        // original + "-" + 20-char token
        let (prefix, token) = user.username.split_at(user.username.len() - 21);
        assert!(prefix == "abe" || prefix == "bob", "unexpected prefix: {prefix}");
        assert!(token.starts_with('-'));
        assert!(token[1..].chars().all(|c| c.is_ascii_alphanumeric()));
    }
}

// ============================================================================
// Denylist resolution
// ============================================================================

#[test]
fn denylisted_admin_is_renamed_away() {
    let manager = make_manager(&[(5, "admin"), (6, "bob")], &["admin"]);

    let outcome = manager.resolve_denylisted(false).expect("resolve");

    assert_eq!(
        outcome.renamed,
        vec![RenameEntry { id: 5, new_username: "admin1".to_string() }]
    );
    assert_eq!(sorted_usernames(manager.store()), vec!["admin1", "bob"]);
    assert!(manager.store().find_denylisted_usernames().expect("finder").is_empty());
}

#[test]
fn denylist_singletons_each_get_suffix_one() {
    let manager = make_manager(&[(1, "admin"), (2, "root"), (3, "bob")], &["admin", "root"]);

    let outcome = manager.resolve_denylisted(false).expect("resolve");

    assert_eq!(
        outcome.renamed,
        vec![
            RenameEntry { id: 1, new_username: "admin1".to_string() },
            RenameEntry { id: 2, new_username: "root1".to_string() },
        ]
    );
}

#[test]
fn denylisted_rename_target_also_denylisted_resolves_within_bound() {
    // admin -> admin1, but admin1 is itself denylisted; a second pass
    // produces admin11.
    let manager = make_manager(&[(1, "admin")], &["admin", "admin1"]);

    let outcome = manager.resolve_denylisted(false).expect("resolve");

    assert_eq!(outcome.passes, 2);
    assert_eq!(sorted_usernames(manager.store()), vec!["admin11"]);
    assert!(manager.store().find_denylisted_usernames().expect("finder").is_empty());
}

#[test]
fn denylist_dry_run_does_not_mutate() {
    let manager = make_manager(&[(5, "admin")], &["admin"]);
    let before = manager.store().all_users().expect("snapshot");

    let outcome = manager.resolve_denylisted(true).expect("dry run");

    assert!(!outcome.applied);
    assert_eq!(
        outcome.renamed,
        vec![RenameEntry { id: 5, new_username: "admin1".to_string() }]
    );
    assert_eq!(manager.store().all_users().expect("snapshot"), before);
}

#[test]
fn denylist_rename_minting_a_duplicate_is_cleared_by_duplicate_sweep() {
    // Renaming admin -> admin1 collides with the existing admin1 row; the
    // duplicate sweep that follows clears it, mirroring the CLI's default
    // denylist-then-duplicates order.
    let manager = make_manager(&[(1, "admin"), (2, "admin1")], &["admin"]);

    manager.resolve_denylisted(false).expect("denylist sweep");
    assert_eq!(sorted_usernames(manager.store()), vec!["admin1", "admin1"]);

    manager.resolve_duplicates(false).expect("duplicate sweep");

    assert_eq!(sorted_usernames(manager.store()), vec!["admin11", "admin12"]);
    assert!(manager.store().find_duplicate_usernames().expect("finder").is_empty());
    assert!(manager.store().find_denylisted_usernames().expect("finder").is_empty());
}

// ============================================================================
// Repeated invocation
// ============================================================================

#[test]
fn resolving_twice_is_idempotent_once_clean() {
    let manager = make_manager(&[(1, "abe"), (2, "abe")], &[]);

    manager.resolve_duplicates(false).expect("first run");
    let after_first = manager.store().all_users().expect("snapshot");

    let outcome = manager.resolve_duplicates(false).expect("second run");

    assert!(!outcome.applied);
    assert!(outcome.renamed.is_empty());
    assert_eq!(manager.store().all_users().expect("snapshot"), after_first);
}
