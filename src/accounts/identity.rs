use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use crate::models::AccountId;

/// Source of fresh account identities.
///
/// The store owns one of these; tests inject a deterministic implementation.
pub trait IdentityGenerator: Send + Sync {
    fn next_id(&self) -> AccountId;
}

/// Opaque `acc-<unix millis>-<counter>` identities.
///
/// The counter only ever grows, so two ids minted within the same
/// millisecond still differ.
#[derive(Debug, Default)]
pub struct OpaqueIdGenerator {
    counter: AtomicU64,
}

impl OpaqueIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityGenerator for OpaqueIdGenerator {
    fn next_id(&self) -> AccountId {
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("acc-{}-{}", Utc::now().timestamp_millis(), sequence)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Yields `id-1`, `id-2`, ...
    #[derive(Debug, Default)]
    pub struct SequentialIds {
        next: AtomicU64,
    }

    impl IdentityGenerator for SequentialIds {
        fn next_id(&self) -> AccountId {
            format!("id-{}", self.next.fetch_add(1, Ordering::Relaxed) + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn opaque_ids_are_unique_within_a_burst() {
        let generator = OpaqueIdGenerator::new();
        let ids: HashSet<_> = (0..1_000).map(|_| generator.next_id()).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn opaque_ids_follow_the_acc_prefix_format() {
        let generator = OpaqueIdGenerator::new();
        generator.next_id();
        let id = generator.next_id();

        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "acc");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2], "2");
    }
}
