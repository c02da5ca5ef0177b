//! Store trait definitions with mockall annotations for testing
//!
//! The resolver only talks to persistence through these traits. Every
//! resolution runs inside one `ContactTransaction`, which holds exclusive
//! access to the rows it reads and writes until it commits or is dropped.

use shared::{Contact, ContactId, NewContact, Submission};

use crate::error::ReconcilerResult;

/// Lookup keys for an email-or-phone match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactQuery {
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

impl ContactQuery {
    pub fn new(email: Option<String>, phone_number: Option<String>) -> Self {
        Self {
            email: email.filter(|e| !e.is_empty()),
            phone_number: phone_number.filter(|p| !p.is_empty()),
        }
    }

    pub fn from_submission(submission: &Submission) -> Self {
        Self::new(
            submission.email().map(str::to_string),
            submission.phone_number().map(str::to_string),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone_number.is_none()
    }

    /// Whether a row matches on either present field
    pub fn matches(&self, contact: &Contact) -> bool {
        let email_hit = self.email.is_some() && contact.email == self.email;
        let phone_hit = self.phone_number.is_some() && contact.phone_number == self.phone_number;
        email_hit || phone_hit
    }
}

/// Durable record of contacts
#[mockall::automock]
#[async_trait::async_trait]
pub trait ContactStore: Send + Sync {
    /// Open an exclusive transactional scope for one resolution
    async fn begin(&self) -> ReconcilerResult<Box<dyn ContactTransaction>>;
}

/// Reads and writes made on behalf of a single resolution.
///
/// Writes become visible to other transactions only after `commit`; dropping
/// the transaction discards them.
#[mockall::automock]
#[async_trait::async_trait]
pub trait ContactTransaction: Send {
    /// All live rows whose email or phone equals the query's (absent keys
    /// are ignored), ascending by id
    async fn find_by_email_or_phone(&mut self, query: &ContactQuery) -> ReconcilerResult<Vec<Contact>>;

    /// The primary `root_id` plus every row linked to it, ascending by id
    async fn find_cluster(&mut self, root_id: ContactId) -> ReconcilerResult<Vec<Contact>>;

    /// Store a new row, assigning its id and timestamps
    async fn insert(&mut self, contact: NewContact) -> ReconcilerResult<Contact>;

    /// Persist precedence, link and `updated_at` of an existing row
    async fn update(&mut self, contact: &Contact) -> ReconcilerResult<()>;

    /// Make every write of this transaction visible
    async fn commit(&mut self) -> ReconcilerResult<()>;
}
