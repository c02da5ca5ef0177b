//! In-memory contact store
//!
//! The whole table sits behind one async mutex. A transaction owns the lock
//! guard until it commits or is dropped and works on a staged copy of the
//! table, which replaces the live table on commit.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use shared::{Contact, ContactId, NewContact};

use crate::error::{ReconcilerError, ReconcilerResult};
use crate::traits::{ContactQuery, ContactStore, ContactTransaction};

#[derive(Debug, Clone, Default)]
struct ContactTable {
    rows: BTreeMap<ContactId, Contact>,
    last_id: i64,
    last_created: Option<DateTime<Utc>>,
}

impl ContactTable {
    fn live(&self) -> impl Iterator<Item = &Contact> {
        self.rows.values().filter(|c| c.deleted_at.is_none())
    }

    /// Creation times never go backwards, even if the wall clock does
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_created {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_created = Some(stamp);
        stamp
    }
}

/// Process-local contact store
#[derive(Clone, Default)]
pub struct InMemoryContactStore {
    table: Arc<Mutex<ContactTable>>,
}

impl InMemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the store with existing rows; ids continue after the largest one
    pub fn with_contacts(contacts: impl IntoIterator<Item = Contact>) -> Self {
        let mut table = ContactTable::default();
        for contact in contacts {
            table.last_id = table.last_id.max(contact.id.value());
            table.last_created = table.last_created.max(Some(contact.created_at));
            table.rows.insert(contact.id, contact);
        }
        Self {
            table: Arc::new(Mutex::new(table)),
        }
    }

    /// Committed rows, ascending by id
    pub async fn snapshot(&self) -> Vec<Contact> {
        self.table.lock().await.rows.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait::async_trait]
impl ContactStore for InMemoryContactStore {
    async fn begin(&self) -> ReconcilerResult<Box<dyn ContactTransaction>> {
        let guard = self.table.clone().lock_owned().await;
        let staged = (*guard).clone();
        Ok(Box::new(InMemoryTransaction {
            guard: Some(guard),
            staged: Some(staged),
        }))
    }
}

/// Exclusive transaction over the in-memory table
pub struct InMemoryTransaction {
    guard: Option<OwnedMutexGuard<ContactTable>>,
    staged: Option<ContactTable>,
}

impl InMemoryTransaction {
    fn staged(&mut self) -> ReconcilerResult<&mut ContactTable> {
        self.staged.as_mut().ok_or(ReconcilerError::TransactionClosed)
    }
}

#[async_trait::async_trait]
impl ContactTransaction for InMemoryTransaction {
    async fn find_by_email_or_phone(&mut self, query: &ContactQuery) -> ReconcilerResult<Vec<Contact>> {
        let table = self.staged()?;
        Ok(table.live().filter(|c| query.matches(c)).cloned().collect())
    }

    async fn find_cluster(&mut self, root_id: ContactId) -> ReconcilerResult<Vec<Contact>> {
        let table = self.staged()?;
        Ok(table
            .live()
            .filter(|c| c.id == root_id || c.linked_id == Some(root_id))
            .cloned()
            .collect())
    }

    async fn insert(&mut self, contact: NewContact) -> ReconcilerResult<Contact> {
        let table = self.staged()?;
        table.last_id += 1;
        let created_at = table.next_timestamp();
        let row = Contact {
            id: ContactId(table.last_id),
            email: contact.email,
            phone_number: contact.phone_number,
            linked_id: contact.linked_id,
            link_precedence: contact.link_precedence,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        };
        table.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&mut self, contact: &Contact) -> ReconcilerResult<()> {
        let table = self.staged()?;
        let row = table
            .rows
            .get_mut(&contact.id)
            .ok_or(ReconcilerError::ContactNotFound { id: contact.id })?;
        row.link_precedence = contact.link_precedence;
        row.linked_id = contact.linked_id;
        row.updated_at = contact.updated_at;
        Ok(())
    }

    async fn commit(&mut self) -> ReconcilerResult<()> {
        let (Some(mut guard), Some(staged)) = (self.guard.take(), self.staged.take()) else {
            return Err(ReconcilerError::TransactionClosed);
        };
        *guard = staged;
        // Lock released here; the transaction is closed from now on
        drop(guard);
        Ok(())
    }
}
