//! Test helpers for reconciler tests

use std::collections::{HashMap, HashSet};

use reconciler::{IdentityResolver, InMemoryContactStore, ResolverConfig};
use shared::{ClusterView, Contact, ContactId, Submission};

/// Common helper functions for tests
pub struct TestHelpers;

impl TestHelpers {
    /// Resolver over an empty in-memory store
    pub fn resolver() -> IdentityResolver<InMemoryContactStore> {
        IdentityResolver::new(InMemoryContactStore::new())
    }

    /// Resolver over a store pre-populated with `contacts`
    pub fn seeded_resolver(contacts: Vec<Contact>) -> IdentityResolver<InMemoryContactStore> {
        IdentityResolver::new(InMemoryContactStore::with_contacts(contacts))
    }

    pub fn resolver_with_round_limit(contacts: Vec<Contact>, limit: usize) -> IdentityResolver<InMemoryContactStore> {
        IdentityResolver::with_config(
            InMemoryContactStore::with_contacts(contacts),
            ResolverConfig {
                closure_round_limit: limit,
            },
        )
    }

    /// Resolve and unwrap, panicking with context on failure
    pub async fn submit(resolver: &IdentityResolver<InMemoryContactStore>, submission: Submission) -> ClusterView {
        resolver
            .resolve(&submission)
            .await
            .unwrap_or_else(|e| panic!("resolving {submission:?} failed: {e}"))
    }

    pub fn ids(values: &[i64]) -> Vec<ContactId> {
        values.iter().copied().map(ContactId).collect()
    }

    /// Check every structural invariant over the committed rows
    pub async fn assert_invariants(store: &InMemoryContactStore) {
        let rows = store.snapshot().await;
        let by_id: HashMap<ContactId, &Contact> = rows.iter().map(|c| (c.id, c)).collect();

        for contact in &rows {
            if contact.is_primary() {
                assert_eq!(contact.linked_id, None, "primary {} must not be linked", contact.id);
                continue;
            }

            let parent_id = contact
                .linked_id
                .unwrap_or_else(|| panic!("secondary {} has no linked id", contact.id));
            let parent = by_id
                .get(&parent_id)
                .unwrap_or_else(|| panic!("secondary {} links to missing {}", contact.id, parent_id));

            // Flatness: depth exactly one
            assert!(parent.is_primary(), "secondary {} links to non-primary {}", contact.id, parent_id);
            assert_eq!(parent.linked_id, None);

            // Oldest wins
            assert!(
                parent.seniority() <= contact.seniority(),
                "primary {} is younger than its secondary {}",
                parent.id,
                contact.id
            );
        }

        let mut pairs = HashSet::new();
        for contact in &rows {
            assert!(
                pairs.insert((contact.email.clone(), contact.phone_number.clone())),
                "duplicate row for ({:?}, {:?})",
                contact.email,
                contact.phone_number
            );
        }
    }
}
