//! Flattening a cluster under its canonical primary

use chrono::{DateTime, Utc};

use shared::{Contact, ContactId};

use super::Cluster;

/// Rows that must change so every contact hangs directly off `primary_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    pub primary_id: ContactId,
    /// Former primaries, already rewritten as secondaries
    pub demoted: Vec<Contact>,
    /// Secondaries moved onto the canonical primary
    pub reparented: Vec<Contact>,
}

impl MergePlan {
    pub fn for_cluster(cluster: &Cluster, primary_id: ContactId, now: DateTime<Utc>) -> Self {
        let mut plan = Self {
            primary_id,
            demoted: Vec::new(),
            reparented: Vec::new(),
        };

        for contact in cluster.contacts().filter(|c| c.id != primary_id) {
            if contact.is_linked_to(primary_id) {
                continue;
            }
            let mut updated = contact.clone();
            updated.link_to(primary_id, now);
            if contact.is_primary() {
                plan.demoted.push(updated);
            } else {
                plan.reparented.push(updated);
            }
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.demoted.is_empty() && self.reparented.is_empty()
    }

    /// Every row to write, demotions first
    pub fn updates(&self) -> impl Iterator<Item = &Contact> {
        self.demoted.iter().chain(self.reparented.iter())
    }
}
