//! Deterministic naming for engine-side resources.
//!
//! Volume names and container aliases are derived by hashing stable
//! identifiers, so they can be recomputed anywhere instead of being
//! persisted. The owner of a volume is the parent deployment for
//! module-level volumes and the auxiliary deployment for aux-level ones.

use sha2::{Digest, Sha256};

/// Derive the engine volume name for `(owner_id, volume_ref)`.
pub fn volume_name(owner_id: &str, volume_ref: &str) -> String {
    let digest = Sha256::digest(format!("{owner_id}/{volume_ref}").as_bytes());
    format!("berth-vol-{}", &hex::encode(digest)[..24])
}

/// Derive the stable network alias for an auxiliary service container.
///
/// The alias survives Update: it depends only on the auxiliary ID and the
/// service ref, never on the engine container ID.
pub fn container_alias(aux_id: &str, service_ref: &str) -> String {
    let digest = Sha256::digest(format!("{aux_id}/{service_ref}").as_bytes());
    format!("berth-{service_ref}-{}", &hex::encode(digest)[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_names_are_deterministic() {
        assert_eq!(volume_name("dep-1", "data"), volume_name("dep-1", "data"));
    }

    #[test]
    fn volume_names_differ_by_owner_and_ref() {
        let a = volume_name("dep-1", "data");
        assert_ne!(a, volume_name("dep-2", "data"));
        assert_ne!(a, volume_name("dep-1", "cache"));
    }

    #[test]
    fn volume_name_is_bounded() {
        // "berth-vol-" + 24 hex chars, regardless of input length.
        let name = volume_name(&"x".repeat(500), &"y".repeat(500));
        assert_eq!(name.len(), "berth-vol-".len() + 24);
    }

    #[test]
    fn alias_is_stable_and_service_scoped() {
        let a = container_alias("aux-1", "redis");
        assert_eq!(a, container_alias("aux-1", "redis"));
        assert_ne!(a, container_alias("aux-1", "postgres"));
        assert_ne!(a, container_alias("aux-2", "redis"));
        assert!(a.starts_with("berth-redis-"));
    }

    #[test]
    fn owner_ref_concatenation_does_not_collide() {
        // ("ab", "c") and ("a", "bc") must hash differently.
        assert_ne!(volume_name("ab", "c"), volume_name("a", "bc"));
    }
}
