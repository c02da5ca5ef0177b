//! Identity resolver
//!
//! Matches a submission against stored contacts, expands the match to the
//! whole cluster, merges clusters bridged by the submission under the oldest
//! primary, and records any new contact detail as a secondary row. Every step
//! of one resolution runs inside a single store transaction.

use std::collections::HashSet;

use chrono::Utc;

use shared::{ClusterView, Contact, ContactId, NewContact, ProcessId, Submission, process_debug, process_info};

use crate::core::Cluster;
use crate::error::{ReconcilerError, ReconcilerResult};
use crate::traits::{ContactQuery, ContactStore, ContactTransaction};

/// Tunables for the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Maximum expansion rounds before the cluster is declared inconsistent
    pub closure_round_limit: usize,
}

impl ResolverConfig {
    pub const DEFAULT_CLOSURE_ROUND_LIMIT: usize = 1024;
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            closure_round_limit: Self::DEFAULT_CLOSURE_ROUND_LIMIT,
        }
    }
}

/// What a resolution changed in the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionOutcome {
    pub created_primary: Option<ContactId>,
    pub created_secondary: Option<ContactId>,
    pub demoted: Vec<ContactId>,
    pub reparented: Vec<ContactId>,
}

impl ResolutionOutcome {
    pub fn is_noop(&self) -> bool {
        self.created_primary.is_none()
            && self.created_secondary.is_none()
            && self.demoted.is_empty()
            && self.reparented.is_empty()
    }
}

/// Cluster view plus the mutations that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub view: ClusterView,
    pub outcome: ResolutionOutcome,
}

/// Resolves submissions into identity clusters
pub struct IdentityResolver<S>
where
    S: ContactStore + Send + Sync + 'static,
{
    store: S,
    config: ResolverConfig,
}

impl<S> IdentityResolver<S>
where
    S: ContactStore + Send + Sync + 'static,
{
    pub fn new(store: S) -> Self {
        Self::with_config(store, ResolverConfig::default())
    }

    pub fn with_config(store: S, config: ResolverConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a submission to its consolidated cluster view
    pub async fn resolve(&self, submission: &Submission) -> ReconcilerResult<ClusterView> {
        Ok(self.resolve_detailed(submission).await?.view)
    }

    /// Resolve a submission, also reporting which rows were created or relinked.
    ///
    /// Nothing is written unless the whole resolution succeeds.
    pub async fn resolve_detailed(&self, submission: &Submission) -> ReconcilerResult<Resolution> {
        submission.validate()?;

        let mut tx = self.store.begin().await?;
        let resolution = self.reconcile(tx.as_mut(), submission).await?;
        tx.commit().await?;

        log_resolution(&resolution);
        Ok(resolution)
    }

    async fn reconcile(
        &self,
        tx: &mut dyn ContactTransaction,
        submission: &Submission,
    ) -> ReconcilerResult<Resolution> {
        let mut outcome = ResolutionOutcome::default();

        let matched = tx
            .find_by_email_or_phone(&ContactQuery::from_submission(submission))
            .await?;

        if matched.is_empty() {
            let primary = tx
                .insert(NewContact::primary(
                    submission.email().map(str::to_string),
                    submission.phone_number().map(str::to_string),
                ))
                .await?;
            outcome.created_primary = Some(primary.id);
            let view = Cluster::from_contacts([primary.clone()]).view(primary.id);
            return Ok(Resolution { view, outcome });
        }

        let mut cluster = self.close(tx, matched).await?;
        let primary_id = cluster.canonical_primary()?.id;

        let plan = cluster.merge_plan(primary_id, Utc::now());
        for contact in plan.updates() {
            tx.update(contact).await?;
        }
        outcome.demoted = plan.demoted.iter().map(|c| c.id).collect();
        outcome.reparented = plan.reparented.iter().map(|c| c.id).collect();
        cluster.absorb(plan.updates().cloned());

        if !cluster.covers(submission) {
            let secondary = tx
                .insert(NewContact::secondary(
                    submission.email().map(str::to_string),
                    submission.phone_number().map(str::to_string),
                    primary_id,
                ))
                .await?;
            outcome.created_secondary = Some(secondary.id);
            cluster.absorb([secondary]);
        }

        // Re-read so the view reflects what the store now holds
        let seeds: Vec<Contact> = cluster.contacts().cloned().collect();
        let cluster = self.close(tx, seeds).await?;

        Ok(Resolution {
            view: cluster.view(primary_id),
            outcome,
        })
    }

    /// Expand `seeds` to every contact reachable through a shared email,
    /// a shared phone number, or a common primary.
    async fn close(&self, tx: &mut dyn ContactTransaction, seeds: Vec<Contact>) -> ReconcilerResult<Cluster> {
        let mut cluster = Cluster::default();
        cluster.absorb(seeds.iter().cloned());
        let mut seen_emails: HashSet<String> = HashSet::new();
        let mut seen_phones: HashSet<String> = HashSet::new();
        let mut seen_roots: HashSet<ContactId> = HashSet::new();
        let mut rounds = 0;

        // Every seed shows up in its own lookup, which refreshes any stale copy
        let mut pending = seeds;

        while !pending.is_empty() {
            rounds += 1;
            if rounds > self.config.closure_round_limit {
                return Err(ReconcilerError::InconsistentCluster {
                    reason: format!(
                        "closure did not settle within {} rounds ({} contacts reached)",
                        self.config.closure_round_limit,
                        cluster.len()
                    ),
                });
            }

            let mut next = Vec::new();
            for contact in pending.drain(..) {
                let query = ContactQuery::new(
                    contact.email.clone().filter(|e| seen_emails.insert(e.clone())),
                    contact.phone_number.clone().filter(|p| seen_phones.insert(p.clone())),
                );
                if !query.is_empty() {
                    let found = tx.find_by_email_or_phone(&query).await?;
                    next.extend(cluster.absorb(found));
                }

                let root = contact.root_id();
                if seen_roots.insert(root) {
                    let members = tx.find_cluster(root).await?;
                    next.extend(cluster.absorb(members));
                }
            }

            process_debug!(
                ProcessId::current(),
                "🔎 Closure round {}: {} contacts, {} newly reached",
                rounds,
                cluster.len(),
                next.len()
            );
            pending = next;
        }

        Ok(cluster)
    }
}

fn log_resolution(resolution: &Resolution) {
    let outcome = &resolution.outcome;
    let primary_id = resolution.view.primary_id;

    if let Some(id) = outcome.created_primary {
        process_info!(ProcessId::current(), contact_id = id.value(), "🆕 Created primary contact {}", id);
    }
    if !outcome.demoted.is_empty() {
        process_info!(
            ProcessId::current(),
            primary_id = primary_id.value(),
            demoted = outcome.demoted.len(),
            reparented = outcome.reparented.len(),
            "🔗 Merged {} cluster(s) into primary {}",
            outcome.demoted.len(),
            primary_id
        );
    }
    if let Some(id) = outcome.created_secondary {
        process_info!(
            ProcessId::current(),
            contact_id = id.value(),
            primary_id = primary_id.value(),
            "➕ Recorded new contact detail as secondary {} of {}",
            id,
            primary_id
        );
    }
    if outcome.is_noop() {
        process_debug!(ProcessId::current(), "Submission already known to cluster {}", primary_id);
    }
}
