//! Closed set of contacts making up one identity
//!
//! A `Cluster` is keyed by contact id, so iteration is always in ascending id
//! order. That ordering drives the response layout.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use shared::{ClusterView, Contact, ContactId, Submission};

use crate::core::merge::MergePlan;
use crate::error::{ReconcilerError, ReconcilerResult};

#[derive(Debug, Clone, Default)]
pub struct Cluster {
    contacts: BTreeMap<ContactId, Contact>,
}

impl Cluster {
    pub fn from_contacts(contacts: impl IntoIterator<Item = Contact>) -> Self {
        let mut cluster = Self::default();
        cluster.absorb(contacts);
        cluster
    }

    /// Merge fetched rows into the set, returning the ones not seen before.
    ///
    /// Rows already present are overwritten, since a later fetch is never
    /// older than an earlier one.
    pub fn absorb(&mut self, contacts: impl IntoIterator<Item = Contact>) -> Vec<Contact> {
        let mut added = Vec::new();
        for contact in contacts {
            if self.contacts.insert(contact.id, contact.clone()).is_none() {
                added.push(contact);
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn get(&self, id: ContactId) -> Option<&Contact> {
        self.contacts.get(&id)
    }

    pub fn contacts(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.values()
    }

    pub fn primaries(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.values().filter(|c| c.is_primary())
    }

    /// The oldest primary: earliest `created_at`, then smallest id
    pub fn canonical_primary(&self) -> ReconcilerResult<&Contact> {
        self.primaries()
            .min_by_key(|c| c.seniority())
            .ok_or_else(|| ReconcilerError::InconsistentCluster {
                reason: format!(
                    "no primary among {} linked contacts (ids {:?})",
                    self.len(),
                    self.contacts.keys().map(|id| id.value()).collect::<Vec<_>>()
                ),
            })
    }

    /// Updates that put every row directly under `primary_id`
    pub fn merge_plan(&self, primary_id: ContactId, now: DateTime<Utc>) -> MergePlan {
        MergePlan::for_cluster(self, primary_id, now)
    }

    pub fn has_email(&self, email: &str) -> bool {
        self.contacts().any(|c| c.email.as_deref() == Some(email))
    }

    pub fn has_phone_number(&self, phone_number: &str) -> bool {
        self.contacts().any(|c| c.phone_number.as_deref() == Some(phone_number))
    }

    /// True when every field of the submission is already known to the cluster
    pub fn covers(&self, submission: &Submission) -> bool {
        let email_known = submission.email().is_none_or(|e| self.has_email(e));
        let phone_known = submission.phone_number().is_none_or(|p| self.has_phone_number(p));
        email_known && phone_known
    }

    /// Assemble the response view rooted at `primary_id`
    pub fn view(&self, primary_id: ContactId) -> ClusterView {
        let primary = self.get(primary_id);

        let emails = ordered_distinct(
            primary.and_then(|p| p.email.as_deref()),
            self.contacts().filter_map(|c| c.email.as_deref()),
        );
        let phone_numbers = ordered_distinct(
            primary.and_then(|p| p.phone_number.as_deref()),
            self.contacts().filter_map(|c| c.phone_number.as_deref()),
        );
        let secondary_ids = self
            .contacts()
            .filter(|c| !c.is_primary() && c.id != primary_id)
            .map(|c| c.id)
            .collect();

        ClusterView {
            primary_id,
            emails,
            phone_numbers,
            secondary_ids,
        }
    }
}

/// `first` leads, the rest follow in iteration order; duplicates dropped
fn ordered_distinct<'a>(first: Option<&'a str>, rest: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in first.into_iter().chain(rest) {
        if !out.iter().any(|seen| seen == value) {
            out.push(value.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use shared::LinkPrecedence;

    fn contact(id: i64, email: Option<&str>, phone: Option<&str>, linked: Option<i64>, age_secs: i64) -> Contact {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(age_secs);
        Contact {
            id: ContactId(id),
            email: email.map(str::to_string),
            phone_number: phone.map(str::to_string),
            linked_id: linked.map(ContactId),
            link_precedence: if linked.is_some() {
                LinkPrecedence::Secondary
            } else {
                LinkPrecedence::Primary
            },
            created_at: created,
            updated_at: created,
            deleted_at: None,
        }
    }

    #[test]
    fn test_absorb_reports_only_new_rows() {
        let mut cluster = Cluster::from_contacts(vec![contact(1, Some("a@x"), None, None, 0)]);

        let added = cluster.absorb(vec![
            contact(1, Some("a@x"), None, None, 0),
            contact(2, Some("a@x"), Some("111"), Some(1), 10),
        ]);

        assert_eq!(added.len(), 1);
        assert_eq!(added[0].id, ContactId(2));
        assert_eq!(cluster.len(), 2);
    }

    #[test]
    fn test_absorb_overwrites_stale_copy() {
        let mut cluster = Cluster::from_contacts(vec![contact(3, None, Some("222"), None, 5)]);
        let demoted = contact(3, None, Some("222"), Some(1), 5);

        let added = cluster.absorb(vec![demoted]);

        assert!(added.is_empty());
        assert!(cluster.get(ContactId(3)).unwrap().is_linked_to(ContactId(1)));
    }

    #[test]
    fn test_canonical_primary_is_oldest() {
        let cluster = Cluster::from_contacts(vec![
            contact(5, Some("b@x"), None, None, 100),
            contact(9, None, Some("222"), None, 50),
            contact(2, Some("c@x"), None, Some(9), 10),
        ]);

        // id 2 is the oldest row but secondary; only primaries compete
        assert_eq!(cluster.canonical_primary().unwrap().id, ContactId(9));
    }

    #[test]
    fn test_canonical_primary_tie_breaks_on_id() {
        let cluster = Cluster::from_contacts(vec![
            contact(8, Some("b@x"), None, None, 0),
            contact(4, None, Some("222"), None, 0),
        ]);

        assert_eq!(cluster.canonical_primary().unwrap().id, ContactId(4));
    }

    #[test]
    fn test_no_primary_is_inconsistent() {
        let cluster = Cluster::from_contacts(vec![contact(2, Some("a@x"), None, Some(1), 0)]);

        assert!(matches!(
            cluster.canonical_primary(),
            Err(ReconcilerError::InconsistentCluster { .. })
        ));
    }

    #[test]
    fn test_covers_requires_every_present_field() {
        let cluster = Cluster::from_contacts(vec![
            contact(1, Some("a@x"), None, None, 0),
            contact(2, None, Some("222"), Some(1), 1),
        ]);

        assert!(cluster.covers(&Submission::new(Some("a@x".into()), Some("222".into()))));
        assert!(cluster.covers(&Submission::new(None, Some("222".into()))));
        assert!(!cluster.covers(&Submission::new(Some("a@x".into()), Some("333".into()))));
        assert!(!cluster.covers(&Submission::new(Some("A@x".into()), None)));
    }

    #[test]
    fn test_view_orders_primary_first_then_by_id() {
        let cluster = Cluster::from_contacts(vec![
            contact(3, Some("z@x"), Some("300"), Some(7), 30),
            contact(7, Some("p@x"), None, None, 0),
            contact(11, Some("z@x"), Some("100"), Some(7), 40),
        ]);

        let view = cluster.view(ContactId(7));

        assert_eq!(view.primary_id, ContactId(7));
        assert_eq!(view.emails, vec!["p@x", "z@x"]);
        // primary has no phone, so phones follow id order
        assert_eq!(view.phone_numbers, vec!["300", "100"]);
        assert_eq!(view.secondary_ids, vec![ContactId(3), ContactId(11)]);
    }
}
