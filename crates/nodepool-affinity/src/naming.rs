//! Deterministic affinity group names.

use nodepool_core::hash::{SHORT_HASH_LEN, short_hash};

/// `{owner}-{pool}-{hash(policy)}`.
///
/// The policy hash makes a policy change produce a new name, so drift is
/// visible from the name alone.
pub fn group_name(owner_id: &str, pool_name: &str, policy: &str) -> String {
    format!("{owner_id}-{pool_name}-{}", short_hash([policy]))
}

/// The pool a group name was generated for, if `name` has exactly the
/// shape `{owner}-{pool}-{hash}` for `owner_id`.
///
/// Owner ids may extend one another (`dev--a` and `dev--a-b`), so a bare
/// owner prefix does not establish ownership; callers must also check the
/// returned pool against the pools they know.
pub fn owned_pool<'a>(owner_id: &str, name: &'a str) -> Option<&'a str> {
    let rest = name.strip_prefix(owner_id)?.strip_prefix('-')?;
    let (pool, hash) = rest.rsplit_once('-')?;
    let is_hash = hash.len() == SHORT_HASH_LEN
        && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    (is_hash && !pool.is_empty()).then_some(pool)
}
